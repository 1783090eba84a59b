//! Directional Light Source

use rtcore::common::*;
use rtcore::geometry::*;
use rtcore::light::*;
use rtcore::sampling::*;
use rtcore::spectrum::*;

/// Implements a light source that deposits illumination from the same
/// direction at every point in space. Light travels along the placement's
/// `+z` axis. A non-zero angular radius spreads the source over a cone of
/// directions, like the sun's disk, and softens shadows.
#[derive(Clone, Debug)]
pub struct DirectionalLight {
    /// Light source type.
    light_type: LightType,

    /// Colour.
    color: Spectrum,

    /// Intensity per unit area perpendicular to the light.
    intensity: Float,

    /// Cosine of the angular radius.
    cos_angular_radius: Float,
}

impl DirectionalLight {
    /// Returns a new `DirectionalLight`.
    ///
    /// * `color`          - Colour.
    /// * `intensity`      - Intensity per unit area.
    /// * `angular_radius` - Angular radius of the source in degrees.
    pub fn new(color: Spectrum, intensity: Float, angular_radius: Float) -> Self {
        let angular_radius = clamp(angular_radius, 0.0, 90.0);
        Self {
            light_type: if angular_radius > 0.0 {
                LightType::AREA_LIGHT
            } else {
                LightType::DELTA_DIRECTION_LIGHT
            },
            color,
            intensity,
            cos_angular_radius: radians(angular_radius).cos(),
        }
    }
}

impl Light for DirectionalLight {
    fn light_type(&self) -> LightType {
        self.light_type
    }

    fn color(&self) -> Spectrum {
        self.color
    }

    fn intensity(&self) -> Float {
        self.intensity
    }

    fn sample_shadow(&self, coords: &CoordinateSystem, _origin: &Point3f, u: Option<&Point2f>) -> ShadowSample {
        let wi = match u {
            Some(u) if self.cos_angular_radius < 1.0 => {
                -coords.to_world_dir(&uniform_sample_cone(u, self.cos_angular_radius)).normalize()
            }
            _ => -coords.z_dir(),
        };
        ShadowSample {
            wi,
            distance: INFINITY,
        }
    }

    fn total_intensity(&self, _coords: &CoordinateSystem, bounds: &Bounds3f) -> Float {
        let (_center, radius) = bounds.bounding_sphere();
        max(0.0, self.intensity * self.color.average() * PI * radius * radius)
    }

    fn sample_emission(
        &self,
        coords: &CoordinateSystem,
        bounds: &Bounds3f,
        u1: &Point2f,
        _u2: &Point2f,
    ) -> Option<Emission> {
        let (center, radius) = bounds.bounding_sphere();
        if !(radius > 0.0) {
            return None;
        }

        // Start on a disk behind the bounding sphere, facing along the light.
        let d = concentric_sample_disk(u1);
        let offset = coords.x_dir() * (d.x * radius) + coords.up_dir() * (d.y * radius);
        let origin = center + offset - coords.z_dir() * radius;
        Some(Emission {
            ray: Ray::new(origin, coords.z_dir(), INFINITY),
            weight: 1.0,
        })
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
