//! Spot Light Source

use crate::sample_sphere_light;
use rtcore::common::*;
use rtcore::geometry::*;
use rtcore::light::*;
use rtcore::sampling::*;
use rtcore::spectrum::*;

/// Implements a light source that emits light in a cone of directions around
/// the placement's `+z` axis. Intensity falls off as `cos^falloff` of the angle
/// from the axis.
#[derive(Clone, Debug)]
pub struct SpotLight {
    /// Light source type.
    light_type: LightType,

    /// Colour.
    color: Spectrum,

    /// Intensity.
    intensity: Float,

    /// Radius of the emitting sphere.
    radius: Float,

    /// Cosine of the cone's half angle.
    cos_cone: Float,

    /// Falloff exponent.
    falloff: Float,

    /// Mean of `cos^falloff` over the cone.
    mean_falloff: Float,
}

impl SpotLight {
    /// Returns a new `SpotLight`.
    ///
    /// * `color`      - Colour.
    /// * `intensity`  - Intensity on the axis.
    /// * `radius`     - Radius of the emitting sphere; 0 for a true point.
    /// * `cone_angle` - Half angle of the cone in degrees.
    /// * `falloff`    - Falloff exponent.
    pub fn new(color: Spectrum, intensity: Float, radius: Float, cone_angle: Float, falloff: Float) -> Self {
        let radius = max(0.0, radius);
        let falloff = if falloff < 0.0 {
            warn!("Negative spot light falloff {}; using 0", falloff);
            0.0
        } else {
            falloff
        };
        let cos_cone = radians(clamp(cone_angle, 0.0, 180.0)).cos();

        // Mean of cos^f over directions uniform in the cone:
        // (1 - cos_cone^(f + 1)) / ((f + 1) (1 - cos_cone)).
        // A zero exponent is isotropic; otherwise directions behind the light
        // get no energy.
        let solid = 1.0 - cos_cone;
        let mean_falloff = if solid > 0.0 {
            let integral = if falloff == 0.0 {
                solid
            } else if cos_cone >= 0.0 {
                (1.0 - cos_cone.powf(falloff + 1.0)) / (falloff + 1.0)
            } else {
                1.0 / (falloff + 1.0)
            };
            integral / solid
        } else {
            1.0
        };

        Self {
            light_type: if radius > 0.0 {
                LightType::AREA_LIGHT
            } else {
                LightType::DELTA_POSITION_LIGHT
            },
            color,
            intensity,
            radius,
            cos_cone,
            falloff,
            mean_falloff,
        }
    }

    /// Returns the relative intensity in a direction given in light space.
    ///
    /// * `w` - Normalized direction in light space.
    pub fn falloff(&self, w: &Vector3f) -> Float {
        if w.z < self.cos_cone {
            0.0
        } else if self.falloff == 0.0 {
            1.0
        } else if w.z <= 0.0 {
            0.0
        } else {
            w.z.powf(self.falloff)
        }
    }
}

impl Light for SpotLight {
    fn light_type(&self) -> LightType {
        self.light_type
    }

    fn color(&self) -> Spectrum {
        self.color
    }

    fn intensity(&self) -> Float {
        self.intensity
    }

    fn sample_shadow(&self, coords: &CoordinateSystem, origin: &Point3f, u: Option<&Point2f>) -> ShadowSample {
        sample_sphere_light(&coords.origin(), self.radius, origin, u)
    }

    fn total_intensity(&self, _coords: &CoordinateSystem, _bounds: &Bounds3f) -> Float {
        let fraction = 0.5 * (1.0 - self.cos_cone);
        max(0.0, self.intensity * self.color.average() * fraction * self.mean_falloff)
    }

    fn sample_emission(
        &self,
        coords: &CoordinateSystem,
        _bounds: &Bounds3f,
        u1: &Point2f,
        u2: &Point2f,
    ) -> Option<Emission> {
        if self.cos_cone >= 1.0 || self.mean_falloff <= 0.0 {
            return None;
        }
        let w = uniform_sample_cone(u2, self.cos_cone);
        let origin = coords.origin() + uniform_sample_sphere(u1) * self.radius;
        Some(Emission {
            ray: Ray::new(origin, coords.to_world_dir(&w).normalize(), INFINITY),
            weight: self.falloff(&w) / self.mean_falloff,
        })
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::*;
    use rtcore::rng::RNG;

    fn mean_weight(light: &SpotLight, samples: usize) -> Float {
        let coords = CoordinateSystem::default();
        let mut rng = RNG::new(8);
        let mut total = 0.0;
        for _ in 0..samples {
            let u1 = Point2f::new(rng.uniform_float(), rng.uniform_float());
            let u2 = Point2f::new(rng.uniform_float(), rng.uniform_float());
            let e = light.sample_emission(&coords, &Bounds3f::default(), &u1, &u2).unwrap();
            assert!(e.ray.d.z >= light.cos_cone - 0.0001);
            total += e.weight;
        }
        total / samples as Float
    }

    #[test]
    fn weights_average_to_one() {
        let light = SpotLight::new(Spectrum::ONE, 1.0, 0.0, 40.0, 8.0);
        let mean = mean_weight(&light, 20_000);
        assert!(approx_eq!(Float, mean, 1.0, epsilon = 0.02), "mean = {}", mean);
    }

    #[test]
    fn wide_flat_spot_matches_point_light() {
        let spot = SpotLight::new(Spectrum::ONE, 3.0, 0.0, 180.0, 0.0);
        let total = spot.total_intensity(&CoordinateSystem::default(), &Bounds3f::default());
        assert!(approx_eq!(Float, total, 3.0, epsilon = 0.0001));
    }

    #[test]
    fn narrower_cone_emits_less() {
        let bounds = Bounds3f::default();
        let coords = CoordinateSystem::default();
        let wide = SpotLight::new(Spectrum::ONE, 1.0, 0.0, 60.0, 2.0).total_intensity(&coords, &bounds);
        let narrow = SpotLight::new(Spectrum::ONE, 1.0, 0.0, 20.0, 2.0).total_intensity(&coords, &bounds);
        assert!(narrow < wide);
        assert!(narrow > 0.0);
    }

    #[test]
    fn falloff_is_zero_outside_cone() {
        let light = SpotLight::new(Spectrum::ONE, 1.0, 0.0, 30.0, 1.0);
        assert_eq!(light.falloff(&Vector3f::new(0.0, 0.0, 1.0)), 1.0);
        assert_eq!(light.falloff(&Vector3f::new(1.0, 0.0, 0.0)), 0.0);
    }
}
