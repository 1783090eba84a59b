//! Render passes

use crate::scene::*;
use indicatif::{ProgressBar, ProgressStyle};
use rtcore::app::*;
use rtcore::common::*;
use rtcore::error::*;
use rtcore::fragment::*;
use rtcore::geometry::*;
use rtcore::object::RTObject;
use rtcore::parallel::*;
use rtcore::photon::*;
use rtcore::raster::*;
use rtcore::spectrum::*;
use std::sync::Arc;

/// Scale applied to the photon pass's power to give the ambient term.
const AMBIENT_SCALE: Float = 4.0;

/// Render the scene and return linear RGB pixels in row order.
///
/// * `scene`   - The scene.
/// * `options` - Command line options.
pub fn render(scene: &Scene, options: &Options) -> Result<Vec<Spectrum>, String> {
    let threads = ThreadManager::with_threads(options.threads());
    let settings = options.render_settings();
    info!("Rendering with {} threads", threads.num_threads());

    let ambient = photon_pass(scene, options, &threads).map_err(|e| e.to_string())?;
    let frame = rasterize(scene, &settings, ambient);
    composite(&frame, scene.background, &threads, options.quiet)
}

/// Emit photons from every light and emissive object and turn the stored
/// power into a flat ambient term.
///
/// * `scene`   - The scene.
/// * `options` - Command line options.
/// * `threads` - Thread manager.
fn photon_pass(scene: &Scene, options: &Options, threads: &ThreadManager) -> Result<Spectrum, PhotonError> {
    let objects: Vec<Arc<RTObject>> = scene.objects.iter().map(|o| Arc::clone(&o.object)).collect();
    let registry = PhotonSourceRegistry::new();
    let sources = registry.build_sources(&scene.lights, &objects, &scene.bounds);

    let map = PhotonMap::new(scene.bounds, options.photon_intensity, options.seed);
    generate_photon_map(&sources, &map, options.photon_pass_intensity(), threads)?;

    let (_center, radius) = scene.bounds.bounding_sphere();
    let area = FOUR_PI * radius * radius;
    if area > 0.0 {
        Ok(map.total_power() * (AMBIENT_SCALE / area))
    } else {
        Ok(Spectrum::ZERO)
    }
}

/// Shade a point with a facing term towards every light.
///
/// * `p`        - The point.
/// * `n`        - Normal on the camera's side of the surface.
/// * `scene`    - The scene.
/// * `settings` - Render settings.
/// * `ambient`  - Ambient light.
fn irradiance(p: &Point3f, n: &Normal3f, scene: &Scene, settings: &RenderSettings, ambient: Spectrum) -> Spectrum {
    let mut total = ambient;
    let mut ray = Ray::default();
    for light in scene.lights.iter() {
        let count = settings.shadow_rays(light.soft_shadows());
        let mut facing = 0.0;
        for i in 0..count {
            let ray_number = if count > 1 { Some(i) } else { None };
            let distance = light.find_ray_to_light(p, &mut ray, settings, ray_number);
            let falloff = if distance.is_finite() {
                1.0 / max(distance * distance, 1.0)
            } else {
                1.0
            };
            facing += max(0.0, n.dot(&ray.d)) * falloff;
        }
        total += light.light().color() * (light.light().intensity() * facing / count as Float);
    }
    total
}

/// Rasterize every triangle into per-pixel fragment chains. Triangles are
/// flat shaded at their centroid.
///
/// * `scene`    - The scene.
/// * `settings` - Render settings.
/// * `ambient`  - Ambient light.
fn rasterize(scene: &Scene, settings: &RenderSettings, ambient: Spectrum) -> FrameBuffer {
    let (width, height) = (scene.camera.width(), scene.camera.height());
    let mut frame = FrameBuffer::new(width, height);
    let eye = scene.camera.position();

    for item in scene.objects.iter() {
        let object = &item.object;
        let mesh = object.world_mesh();
        let mut covered = 0;

        for tri in 0..mesh.triangles.len() {
            let vertices = mesh.triangle_vertices(tri);
            let projected: Option<Vec<Point3f>> = vertices.iter().map(|p| scene.camera.project(p)).collect();
            let Some(projected) = projected else {
                continue;
            };
            let screen = ScreenTriangle::new(projected[0], projected[1], projected[2]);
            if screen.is_degenerate() {
                continue;
            }

            let centroid = Point3f::from(
                (Vector3f::from(vertices[0]) + Vector3f::from(vertices[1]) + Vector3f::from(vertices[2])) / 3.0,
            );
            let mut n = mesh.face_normal(tri);
            let entering = n.dot(&(eye - centroid)) > 0.0;
            if !entering {
                n = -n;
            }

            let lit = item.surface.diffuse * irradiance(&centroid, &n, scene, settings, ambient);
            let shaded = if entering { lit + object.emission() } else { lit };

            rasterize_triangle(&screen, width, height, |x, y, depth| {
                if depth < frame.opaque_depth(x, y) {
                    covered += 1;
                    frame.insert(x, y, item.surface.fragment(shaded, depth, object.material(), entering));
                }
            });
        }
        debug!("Object '{}' covered {} pixels", object.name(), covered);
    }
    frame
}

/// Composite every pixel's fragment chain, one row per task.
///
/// * `frame`      - Fragment chains.
/// * `background` - Colour behind everything.
/// * `threads`    - Thread manager.
/// * `quiet`      - Suppress the progress bar.
fn composite(
    frame: &FrameBuffer,
    background: Spectrum,
    threads: &ThreadManager,
    quiet: bool,
) -> Result<Vec<Spectrum>, String> {
    let (width, height) = (frame.width(), frame.height());
    let progress = create_progress_bar(height as u64, quiet);
    progress.set_message("Compositing");

    let (tx, rx) = crossbeam_channel::unbounded::<(usize, Vec<Spectrum>)>();
    let task = |y: usize, _: &Worker<'_>| -> Result<(), TaskError> {
        tx.send((y, frame.resolve_row(y, background)))
            .map_err(|e| e.to_string())?;
        progress.inc(1);
        Ok(())
    };
    let status = threads.run_with(height, &task).map_err(|e| e.to_string())?;
    if status == RunStatus::Cancelled {
        return Err(String::from("Compositing cancelled"));
    }

    let mut pixels = vec![Spectrum::ZERO; width * height];
    for (y, row) in rx.try_iter() {
        pixels[y * width..(y + 1) * width].copy_from_slice(&row);
    }
    progress.finish_with_message("Composite complete");
    Ok(pixels)
}

/// Returns a progress bar, hidden when `quiet` is set.
///
/// * `len`   - Number of steps.
/// * `quiet` - Hide the bar.
fn create_progress_bar(len: u64, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }
    let progress = ProgressBar::new(len);
    match ProgressStyle::with_template("{msg} [{elapsed_precise}] {wide_bar} {pos}/{len}") {
        Ok(style) => progress.with_style(style),
        Err(e) => {
            warn!("Invalid progress template: {e}");
            progress
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn options(args: &[&str]) -> Options {
        use clap::Parser;
        let mut argv = vec!["rt-render", "--quiet"];
        argv.extend_from_slice(args);
        Options::parse_from(argv)
    }

    #[test]
    fn renders_demo_scene() {
        let options = options(&["-t", "2", "--width", "32", "--height", "24", "--photons", "2000"]);
        let scene = demo_scene(options.width, options.height);
        let pixels = render(&scene, &options).unwrap();
        assert_eq!(pixels.len(), 32 * 24);
        assert!(pixels.iter().all(|p| p.red().is_finite() && p.green().is_finite() && p.blue().is_finite()));
        assert!(pixels.iter().any(|p| *p != scene.background));
    }

    #[test]
    fn thread_count_does_not_change_image() {
        let one = options(&["-t", "1", "--width", "24", "--height", "16", "--photons", "500", "--soft-shadows"]);
        let two = options(&["-t", "2", "--width", "24", "--height", "16", "--photons", "500", "--soft-shadows"]);
        let scene = demo_scene(24, 16);
        assert_eq!(render(&scene, &one).unwrap(), render(&scene, &two).unwrap());
    }

    #[test]
    fn empty_frame_shows_background() {
        let frame = FrameBuffer::new(4, 3);
        let bg = Spectrum::from_rgb(0.1, 0.2, 0.3);
        let pixels = composite(&frame, bg, &ThreadManager::with_threads(2), true).unwrap();
        assert!(pixels.iter().all(|p| *p == bg));
    }
}
