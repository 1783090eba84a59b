//! Light Photon Source

use super::*;
use crate::common::*;
use crate::error::*;
use crate::geometry::*;
use crate::light::*;
use crate::parallel::ThreadManager;
use crate::rng::RNG;
use crate::spectrum::*;
use std::sync::Arc;

/// Emits photons from a placed light.
pub struct LightPhotonSource {
    /// The light.
    light: Arc<RTLight>,

    /// Scene bounds.
    bounds: Bounds3f,

    /// Light colour scaled to unit average.
    tint: Spectrum,
}

impl LightPhotonSource {
    /// Returns a new `LightPhotonSource`.
    ///
    /// * `light`  - The light.
    /// * `bounds` - Scene bounds.
    pub fn new(light: Arc<RTLight>, bounds: Bounds3f) -> Self {
        let color = light.light().color();
        let average = color.average();
        let tint = if average > 0.0 {
            color / average
        } else {
            Spectrum::ZERO
        };
        Self { light, bounds, tint }
    }
}

impl PhotonSampler for LightPhotonSource {
    fn sample_photon(&self, rng: &mut RNG, ray: &mut Ray) -> Option<Spectrum> {
        let u1 = Point2f::new(rng.uniform_float(), rng.uniform_float());
        let u2 = Point2f::new(rng.uniform_float(), rng.uniform_float());
        let emission = self
            .light
            .light()
            .sample_emission(self.light.coords(), &self.bounds, &u1, &u2)?;
        *ray = emission.ray;
        Some(self.tint * emission.weight)
    }
}

impl PhotonSource for LightPhotonSource {
    fn name(&self) -> &str {
        "light"
    }

    fn total_intensity(&self) -> Float {
        self.light.light().total_intensity(self.light.coords(), &self.bounds)
    }

    fn generate_photons(
        &self,
        map: &PhotonMap,
        intensity: Float,
        threads: &ThreadManager,
    ) -> Result<usize, PhotonError> {
        emit_photons(self, map, intensity, threads)
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampling::uniform_sample_sphere;
    use float_cmp::*;

    /// Isotropic light used by the photon tests.
    struct Bulb {
        color: Spectrum,
        intensity: Float,
    }

    impl Light for Bulb {
        fn light_type(&self) -> LightType {
            LightType::DELTA_POSITION_LIGHT
        }

        fn color(&self) -> Spectrum {
            self.color
        }

        fn intensity(&self) -> Float {
            self.intensity
        }

        fn sample_shadow(&self, coords: &CoordinateSystem, origin: &Point3f, _u: Option<&Point2f>) -> ShadowSample {
            let delta = coords.origin() - *origin;
            ShadowSample {
                wi: delta.normalize(),
                distance: delta.length(),
            }
        }

        fn total_intensity(&self, _coords: &CoordinateSystem, _bounds: &Bounds3f) -> Float {
            self.intensity * self.color.average()
        }

        fn sample_emission(&self, coords: &CoordinateSystem, _: &Bounds3f, _u1: &Point2f, u2: &Point2f) -> Option<Emission> {
            Some(Emission {
                ray: Ray::new(coords.origin(), uniform_sample_sphere(u2), INFINITY),
                weight: 1.0,
            })
        }
    }

    fn source(color: Spectrum, intensity: Float) -> LightPhotonSource {
        let light = RTLight::new(Arc::new(Bulb { color, intensity }), CoordinateSystem::at(Point3f::new(1.0, 2.0, 3.0)));
        LightPhotonSource::new(Arc::new(light), Bounds3f::default())
    }

    #[test]
    fn repeated_calls_converge_to_target() {
        let src = source(Spectrum::from_rgb(1.0, 0.5, 0.0), 4.0);
        assert!(approx_eq!(Float, src.total_intensity(), 2.0));

        let map = PhotonMap::new(Bounds3f::default(), 0.01, 3);
        let threads = ThreadManager::with_threads(2);
        let target = src.total_intensity();
        for _ in 0..5 {
            src.generate_photons(&map, target, &threads).unwrap();
        }
        let emitted = map.total_power().average();
        assert!((emitted - 5.0 * target).abs() <= 0.2 * 5.0 * target, "emitted = {}", emitted);

        let power = map.total_power();
        assert!(approx_eq!(Float, power.red() / power.green(), 2.0, epsilon = 0.001));
        assert_eq!(power.blue(), 0.0);

        for photon in map.into_photons() {
            assert_eq!(photon.position, Point3f::new(1.0, 2.0, 3.0));
        }
    }

    #[test]
    fn black_light_emits_nothing() {
        let src = source(Spectrum::ZERO, 4.0);
        assert_eq!(src.total_intensity(), 0.0);
        let map = PhotonMap::new(Bounds3f::default(), 0.01, 3);
        let n = src
            .generate_photons(&map, src.total_intensity(), &ThreadManager::with_threads(2))
            .unwrap();
        assert_eq!(n, 0);
        assert!(map.is_empty());
    }
}
