//! Application related stuff

use crate::common::*;
use clap::Parser;

/// Default shadow strata per axis when soft shadows are enabled.
pub const DEFAULT_SHADOW_STRATA: usize = 3;

/// System wide options.
#[derive(Parser, Clone, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Options {
    /// Number of threads to use for rendering.
    #[arg(
        long = "nthreads",
        short = 't',
        value_name = "NUM",
        default_value_t = 0,
        help = "Use specified number of threads for rendering (0 = all logical CPUs)."
    )]
    n_threads: usize,

    /// Suppress all text output other than error messages.
    #[arg(long, help = "Suppress all text output other than error messages.")]
    pub quiet: bool,

    /// Path to the image file.
    #[arg(
        long = "outfile",
        short = 'o',
        value_name = "FILE",
        default_value = "render.png",
        help = "Write the final image to the given filename."
    )]
    pub image_file: String,

    /// Image width in pixels.
    #[arg(long, value_name = "NUM", default_value_t = 320, help = "Image width in pixels.")]
    pub width: usize,

    /// Image height in pixels.
    #[arg(long, value_name = "NUM", default_value_t = 240, help = "Image height in pixels.")]
    pub height: usize,

    /// Target number of photons for the photon pass.
    #[arg(
        long,
        value_name = "NUM",
        default_value_t = 20000,
        help = "Target number of photons emitted by the photon pass."
    )]
    pub photons: usize,

    /// Energy carried by each photon.
    #[arg(
        long = "photon-intensity",
        value_name = "FLOAT",
        default_value_t = 0.001,
        help = "Energy carried by each photon."
    )]
    pub photon_intensity: Float,

    /// Sample several shadow rays per light.
    #[arg(long = "soft-shadows", help = "Sample several shadow rays per light.")]
    pub soft_shadows: bool,

    /// Random seed.
    #[arg(long, value_name = "NUM", default_value_t = 0, help = "Seed for all random sampling.")]
    pub seed: u64,
}

impl Options {
    /// Returns the number of threads to use.
    pub fn threads(&self) -> usize {
        let max_threads = num_cpus::get();
        match self.n_threads {
            0 => max_threads,
            n if n > max_threads => {
                warn!("Num threads > max logical CPUs {}", max_threads);
                max_threads
            }
            n => n,
        }
    }

    /// Returns the render time settings selected by these options.
    pub fn render_settings(&self) -> RenderSettings {
        RenderSettings {
            soft_shadows: self.soft_shadows,
            shadow_strata: DEFAULT_SHADOW_STRATA,
            seed: self.seed,
        }
    }

    /// Returns the total energy the photon pass should emit.
    pub fn photon_pass_intensity(&self) -> Float {
        if self.photon_intensity > 0.0 {
            self.photons as Float * self.photon_intensity
        } else {
            warn!("Invalid photon-intensity {}; photon pass disabled", self.photon_intensity);
            0.0
        }
    }
}

/// Render time context for shadow ray sampling.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RenderSettings {
    /// Sample soft shadows for lights that support them.
    pub soft_shadows: bool,

    /// Shadow ray strata per axis; `shadow_strata^2` rays per light.
    pub shadow_strata: usize,

    /// Base random seed.
    pub seed: u64,
}

impl RenderSettings {
    /// Returns the number of shadow rays to trace per light and point.
    ///
    /// * `soft` - Whether the light supports soft shadows.
    pub fn shadow_rays(&self, soft: bool) -> usize {
        if self.soft_shadows && soft {
            self.shadow_strata.max(1).pow(2)
        } else {
            1
        }
    }
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            soft_shadows: false,
            shadow_strata: DEFAULT_SHADOW_STRATA,
            seed: 0,
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
