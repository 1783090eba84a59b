#[macro_use]
extern crate log;

mod image_io;
mod render;
mod scene;

use clap::Parser;
use rtcore::app::*;

fn main() {
    // Initialize `env_logger`.
    env_logger::init();

    let options = Options::parse();
    if let Err(e) = run(&options) {
        error!("{e}");
        std::process::exit(1);
    }
}

fn run(options: &Options) -> Result<(), String> {
    if options.width == 0 || options.height == 0 {
        return Err(format!("Invalid image size {}x{}", options.width, options.height));
    }

    let scene = scene::demo_scene(options.width, options.height);
    let pixels = render::render(&scene, options)?;
    image_io::write_png(&options.image_file, &pixels, options.width, options.height)
}
