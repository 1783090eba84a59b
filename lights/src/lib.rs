//! Lights

#[macro_use]
extern crate log;

mod directional;
mod point;
mod spot;

// Re-export.
pub use directional::*;
pub use point::*;
pub use spot::*;

use rtcore::common::*;
use rtcore::geometry::*;
use rtcore::light::ShadowSample;
use rtcore::sampling::concentric_sample_disk;

/// Sample a point on a spherical light of the given radius as seen from
/// `origin`. Points are spread over the disk the sphere presents to `origin`.
///
/// * `center` - Centre of the light.
/// * `radius` - Radius of the light.
/// * `origin` - The shading point.
/// * `u`      - Optional sample point; `None` selects the centre.
pub(crate) fn sample_sphere_light(
    center: &Point3f,
    radius: Float,
    origin: &Point3f,
    u: Option<&Point2f>,
) -> ShadowSample {
    let to_center = *center - *origin;
    let target = match u {
        Some(u) if radius > 0.0 => {
            let axis = to_center.normalize();
            let (s, t) = axis.coordinate_system();
            let d = concentric_sample_disk(u);
            *center + (s * d.x + t * d.y) * radius
        }
        _ => *center,
    };
    let delta = target - *origin;
    ShadowSample {
        wi: delta.normalize(),
        distance: delta.length(),
    }
}
