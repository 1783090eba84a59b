//! Photon Source Factories

use super::*;
use crate::common::*;
use crate::error::*;
use crate::geometry::*;
use crate::light::RTLight;
use crate::object::RTObject;
use crate::parallel::ThreadManager;
use std::sync::Arc;

/// Builds photon sources for specific kinds of lights or objects.
pub trait PhotonSourceFactory: Send + Sync {
    /// Offer a light to the factory. Returns true if the factory handled it,
    /// in which case no other factory nor the default sees it.
    ///
    /// * `light`   - The light.
    /// * `bounds`  - Scene bounds.
    /// * `sources` - Receives any sources built.
    fn process_light(&self, _light: &Arc<RTLight>, _bounds: &Bounds3f, _sources: &mut Vec<BoxPhotonSource>) -> bool {
        false
    }

    /// Offer an object to the factory. Returns true if the factory handled it,
    /// in which case no other factory nor the default sees it.
    ///
    /// * `object`  - The object.
    /// * `sources` - Receives any sources built.
    fn process_object(&self, _object: &Arc<RTObject>, _sources: &mut Vec<BoxPhotonSource>) -> bool {
        false
    }
}

/// Ordered list of photon source factories. The first factory that handles a
/// light or object wins; anything no factory handles gets a default source.
#[derive(Default)]
pub struct PhotonSourceRegistry {
    factories: Vec<Box<dyn PhotonSourceFactory>>,
}

impl PhotonSourceRegistry {
    /// Returns an empty registry; every light and object gets the default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a factory. Earlier factories take precedence.
    ///
    /// * `factory` - The factory.
    pub fn register(&mut self, factory: Box<dyn PhotonSourceFactory>) {
        self.factories.push(factory);
    }

    /// Returns the number of registered factories.
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Returns true if no factories are registered.
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Build the photon sources for a scene.
    ///
    /// Lights no factory handles become `LightPhotonSource`s. Objects no
    /// factory handles become `MeshPhotonSource`s if they emit light.
    ///
    /// * `lights`  - Scene lights.
    /// * `objects` - Scene objects.
    /// * `bounds`  - Scene bounds.
    pub fn build_sources(
        &self,
        lights: &[Arc<RTLight>],
        objects: &[Arc<RTObject>],
        bounds: &Bounds3f,
    ) -> Vec<BoxPhotonSource> {
        let mut sources: Vec<BoxPhotonSource> = Vec::new();

        for light in lights {
            if !self.factories.iter().any(|f| f.process_light(light, bounds, &mut sources)) {
                sources.push(Box::new(LightPhotonSource::new(Arc::clone(light), *bounds)));
            }
        }

        for object in objects {
            if !self.factories.iter().any(|f| f.process_object(object, &mut sources)) {
                if let Some(source) = MeshPhotonSource::new(object) {
                    sources.push(Box::new(source));
                }
            }
        }

        debug!(
            "Built {} photon sources from {} lights and {} objects",
            sources.len(),
            lights.len(),
            objects.len()
        );
        sources
    }
}

/// Fill `map` with photons carrying `total_intensity` in all, split across
/// `sources` in proportion to their own total intensity. Returns the number of
/// photons added.
///
/// * `sources`         - Photon sources.
/// * `map`             - The photon map.
/// * `total_intensity` - Target energy summed over all sources.
/// * `threads`         - Thread manager for large batches.
pub fn generate_photon_map(
    sources: &[BoxPhotonSource],
    map: &PhotonMap,
    total_intensity: Float,
    threads: &ThreadManager,
) -> Result<usize, PhotonError> {
    let scene_intensity: Float = sources.iter().map(|s| max(0.0, s.total_intensity())).sum();
    if !(scene_intensity > 0.0) {
        info!("Scene emits no light; photon map left empty");
        return Ok(0);
    }

    let mut total = 0;
    for source in sources {
        let share = total_intensity * max(0.0, source.total_intensity()) / scene_intensity;
        let n = source.generate_photons(map, share, threads)?;
        debug!("Photon source '{}' emitted {} photons", source.name(), n);
        total += n;
    }
    info!("Photon map holds {} photons", total);
    Ok(total)
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
