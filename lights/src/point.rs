//! Point Light Source

use crate::sample_sphere_light;
use rtcore::common::*;
use rtcore::geometry::*;
use rtcore::light::*;
use rtcore::sampling::*;
use rtcore::spectrum::*;

/// Implements an isotropic light source that emits the same amount of light in
/// all directions. A non-zero radius turns it into a small spherical light that
/// casts soft shadows.
#[derive(Clone, Debug)]
pub struct PointLight {
    /// Light source type.
    light_type: LightType,

    /// Colour.
    color: Spectrum,

    /// Intensity.
    intensity: Float,

    /// Radius of the emitting sphere.
    radius: Float,
}

impl PointLight {
    /// Returns a new `PointLight`.
    ///
    /// * `color`     - Colour.
    /// * `intensity` - Intensity.
    /// * `radius`    - Radius of the emitting sphere; 0 for a true point.
    pub fn new(color: Spectrum, intensity: Float, radius: Float) -> Self {
        let radius = if radius < 0.0 {
            warn!("Negative point light radius {}; using 0", radius);
            0.0
        } else {
            radius
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
        }
    }

    /// Returns the radius of the emitting sphere.
    pub fn radius(&self) -> Float {
        self.radius
    }
}

impl Light for PointLight {
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
        max(0.0, self.intensity * self.color.average())
    }

    fn sample_emission(
        &self,
        coords: &CoordinateSystem,
        _bounds: &Bounds3f,
        u1: &Point2f,
        u2: &Point2f,
    ) -> Option<Emission> {
        let origin = coords.origin() + uniform_sample_sphere(u1) * self.radius;
        Some(Emission {
            ray: Ray::new(origin, uniform_sample_sphere(u2), INFINITY),
            weight: 1.0,
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
    use rtcore::app::RenderSettings;
    use rtcore::rng::RNG;
    use std::sync::Arc;

    fn placed(radius: Float) -> RTLight {
        RTLight::new(
            Arc::new(PointLight::new(Spectrum::ONE, 2.0, radius)),
            CoordinateSystem::at(Point3f::new(0.0, 0.0, 10.0)),
        )
    }

    #[test]
    fn hard_light_ignores_ray_number() {
        let light = placed(0.0);
        assert!(!light.soft_shadows());
        let settings = RenderSettings {
            soft_shadows: true,
            ..RenderSettings::default()
        };
        let mut a = Ray::default();
        let mut b = Ray::default();
        let d = light.find_ray_to_light(&Point3f::zero(), &mut a, &settings, Some(4));
        light.find_ray_to_light(&Point3f::zero(), &mut b, &settings, None);
        assert_eq!(a, b);
        assert!(approx_eq!(Float, d, 10.0, epsilon = 0.0001));
    }

    #[test]
    fn soft_samples_stay_on_the_silhouette() {
        let light = placed(1.0);
        assert!(light.soft_shadows());
        let settings = RenderSettings {
            soft_shadows: true,
            shadow_strata: 4,
            seed: 3,
        };
        let origin = Point3f::zero();
        let mut ray = Ray::default();
        for n in 0..16 {
            let d = light.find_ray_to_light(&origin, &mut ray, &settings, Some(n));
            let target = origin + ray.d * d;
            assert!(approx_eq!(Float, target.z, 10.0, epsilon = 0.001));
            assert!(target.x * target.x + target.y * target.y <= 1.0 + 0.001);
        }
    }

    #[test]
    fn emission_leaves_the_sphere() {
        let light = PointLight::new(Spectrum::from_rgb(1.0, 2.0, 3.0), 3.0, 0.5);
        let coords = CoordinateSystem::at(Point3f::new(1.0, 1.0, 1.0));
        assert!(approx_eq!(Float, light.total_intensity(&coords, &Bounds3f::default()), 6.0));

        let mut rng = RNG::new(1);
        for _ in 0..100 {
            let u1 = Point2f::new(rng.uniform_float(), rng.uniform_float());
            let u2 = Point2f::new(rng.uniform_float(), rng.uniform_float());
            let e = light.sample_emission(&coords, &Bounds3f::default(), &u1, &u2).unwrap();
            assert!(approx_eq!(Float, e.ray.o.distance(coords.origin()), 0.5, epsilon = 0.001));
            assert!(approx_eq!(Float, e.ray.d.length(), 1.0, epsilon = 0.001));
            assert_eq!(e.weight, 1.0);
        }
    }

    #[test]
    fn negative_radius_is_clamped() {
        let light = PointLight::new(Spectrum::ONE, 1.0, -1.0);
        assert_eq!(light.radius(), 0.0);
        assert!(light.light_type().is_delta_light());
    }
}
