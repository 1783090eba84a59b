//! Placed lights

use super::*;
use crate::app::RenderSettings;
use crate::rng::RNG;
use crate::sampling::stratified_sample_2d;
use std::fmt;

/// A scene light together with its placement, as the renderer sees it. Both
/// parts are fixed at construction.
#[derive(Clone)]
pub struct RTLight {
    /// The scene light.
    light: ArcLight,

    /// Where the light is placed.
    coords: CoordinateSystem,
}

impl RTLight {
    /// Returns a new `RTLight`.
    ///
    /// * `light`  - The scene light.
    /// * `coords` - Where the light is placed.
    pub fn new(light: ArcLight, coords: CoordinateSystem) -> Self {
        Self { light, coords }
    }

    /// Returns the scene light.
    pub fn light(&self) -> &ArcLight {
        &self.light
    }

    /// Returns the light's placement.
    pub fn coords(&self) -> &CoordinateSystem {
        &self.coords
    }

    /// Returns true if sampling more than one shadow ray per point is
    /// worthwhile.
    pub fn soft_shadows(&self) -> bool {
        self.light.soft_shadows()
    }

    /// Point `ray` from `origin` towards a sample point on the light and
    /// return the distance to that point.
    ///
    /// `ray_number` of `None` takes a single deterministic sample at the
    /// light's centre. `Some(n)` picks stratum `n` of the light's extent with
    /// a jitter seeded from the render seed, `n` and `origin`, so identical
    /// arguments always produce the identical ray. Soft shadow sampling also
    /// falls back to the centre when the light has none or the settings
    /// disable it.
    ///
    /// * `origin`     - The shading point.
    /// * `ray`        - Receives the shadow ray.
    /// * `settings`   - Render settings.
    /// * `ray_number` - Optional shadow ray index for stratified sampling.
    pub fn find_ray_to_light(
        &self,
        origin: &Point3f,
        ray: &mut Ray,
        settings: &RenderSettings,
        ray_number: Option<usize>,
    ) -> Float {
        let u = match ray_number {
            Some(n) if settings.soft_shadows && self.soft_shadows() => {
                let mut rng = RNG::with_seed(settings.seed ^ hash_point(origin), n as u64);
                Some(stratified_sample_2d(n, settings.shadow_strata, &mut rng))
            }
            _ => None,
        };

        let ShadowSample { wi, distance } = self.light.sample_shadow(&self.coords, origin, u.as_ref());
        ray.o = *origin + wi * SHADOW_EPSILON;
        ray.d = wi;
        ray.t_max = max(0.0, distance - SHADOW_EPSILON);
        distance
    }
}

impl fmt::Debug for RTLight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RTLight")
            .field("light_type", &self.light.light_type())
            .field("coords", &self.coords)
            .finish()
    }
}

/// Hash a point's bit pattern into a seed.
///
/// * `p` - The point.
fn hash_point(p: &Point3f) -> u64 {
    let (x, y, z) = (p.x.to_bits() as u64, p.y.to_bits() as u64, p.z.to_bits() as u64);
    x.wrapping_mul(73856093) ^ y.wrapping_mul(19349663) ^ z.wrapping_mul(83492791)
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::*;

    /// A square light of side 2 facing down, centred at its origin.
    struct SquareLight;

    impl Light for SquareLight {
        fn light_type(&self) -> LightType {
            LightType::AREA_LIGHT
        }

        fn color(&self) -> Spectrum {
            Spectrum::ONE
        }

        fn intensity(&self) -> Float {
            1.0
        }

        fn sample_shadow(&self, coords: &CoordinateSystem, origin: &Point3f, u: Option<&Point2f>) -> ShadowSample {
            let local = u.map_or(Point3f::zero(), |u| Point3f::new(2.0 * u.x - 1.0, 2.0 * u.y - 1.0, 0.0));
            let target = coords.to_world_point(&local);
            let delta = target - *origin;
            ShadowSample {
                wi: delta.normalize(),
                distance: delta.length(),
            }
        }

        fn total_intensity(&self, _coords: &CoordinateSystem, _bounds: &Bounds3f) -> Float {
            4.0
        }

        fn sample_emission(&self, _: &CoordinateSystem, _: &Bounds3f, _: &Point2f, _: &Point2f) -> Option<Emission> {
            None
        }
    }

    fn light() -> RTLight {
        RTLight::new(Arc::new(SquareLight), CoordinateSystem::at(Point3f::new(0.0, 10.0, 0.0)))
    }

    fn soft() -> RenderSettings {
        RenderSettings {
            soft_shadows: true,
            shadow_strata: 2,
            seed: 11,
        }
    }

    #[test]
    fn no_ray_number_samples_centre() {
        let mut ray = Ray::default();
        let d = light().find_ray_to_light(&Point3f::zero(), &mut ray, &soft(), None);
        assert!(approx_eq!(Float, d, 10.0, epsilon = 0.0001));
        assert_eq!(ray.d, Vector3f::new(0.0, 1.0, 0.0));
        assert!(ray.t_max < d);
    }

    #[test]
    fn ray_numbers_are_reproducible_and_stratified() {
        let l = light();
        let origin = Point3f::new(0.5, 0.0, 0.25);
        let mut a = Ray::default();
        let mut b = Ray::default();
        for n in 0..8 {
            l.find_ray_to_light(&origin, &mut a, &soft(), Some(n));
            l.find_ray_to_light(&origin, &mut b, &soft(), Some(n));
            assert_eq!(a, b);
        }

        let mut r0 = Ray::default();
        let mut r3 = Ray::default();
        l.find_ray_to_light(&origin, &mut r0, &soft(), Some(0));
        l.find_ray_to_light(&origin, &mut r3, &soft(), Some(3));
        assert_ne!(r0.d, r3.d);
    }

    #[test]
    fn soft_shadows_disabled_uses_centre() {
        let l = light();
        let settings = RenderSettings {
            soft_shadows: false,
            ..soft()
        };
        let mut a = Ray::default();
        let mut b = Ray::default();
        l.find_ray_to_light(&Point3f::zero(), &mut a, &settings, Some(3));
        l.find_ray_to_light(&Point3f::zero(), &mut b, &settings, None);
        assert_eq!(a, b);
    }
}
