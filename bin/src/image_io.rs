//! Image output

use image::*;
use rtcore::common::*;
use rtcore::spectrum::*;

/// Writes the image as an 8-bit PNG.
///
/// * `path`   - Output file path.
/// * `pixels` - Linear RGB pixels in row order.
/// * `res_x`  - X resolution.
/// * `res_y`  - Y resolution.
pub fn write_png(path: &str, pixels: &[Spectrum], res_x: usize, res_y: usize) -> Result<(), String> {
    if pixels.len() != res_x * res_y {
        return Err(format!(
            "Expected {} pixels for {}x{} image, got {}",
            res_x * res_y,
            res_x,
            res_y,
            pixels.len()
        ));
    }
    info!("Writing image {path} with resolution {res_x}x{res_y}");

    let imgbuf = ImageBuffer::from_fn(res_x as u32, res_y as u32, |x, y| {
        Rgb(apply_gamma(&pixels[y as usize * res_x + x as usize]))
    });
    match imgbuf.save_with_format(path, ImageFormat::Png) {
        Ok(()) => Ok(()),
        Err(err) => Err(format!("Error saving output image {path}: {err}.")),
    }
}

/// Apply gamma and clamp to 8 bits.
///
/// * `s` - Linear colour.
fn apply_gamma(s: &Spectrum) -> [u8; 3] {
    [clamp_byte(s.red()), clamp_byte(s.green()), clamp_byte(s.blue())]
}

/// Clamp floating point value to 8-bit range [0, 255].
///
/// * `v` - Value to clamp.
#[inline]
fn clamp_byte(v: Float) -> u8 {
    clamp(255.0 * gamma_correct(v) + 0.5, 0.0, 255.0) as u8
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
