//! Photon Map

use crate::common::*;
use crate::geometry::*;
use crate::parallel::AtomicFloat;
use crate::spectrum::*;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// A photon leaving a light source.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Photon {
    /// Position the photon was emitted from.
    pub position: Point3f,

    /// Direction of travel.
    pub direction: Vector3f,

    /// Power carried by the photon.
    pub power: Spectrum,
}

impl Photon {
    /// Returns a new `Photon`.
    ///
    /// * `position`  - Position.
    /// * `direction` - Direction of travel.
    /// * `power`     - Power carried.
    pub fn new(position: Point3f, direction: Vector3f, power: Spectrum) -> Self {
        Self {
            position,
            direction,
            power,
        }
    }
}

/// Shared store for emitted photons. Sources add to it concurrently.
#[derive(Debug)]
pub struct PhotonMap {
    /// Scene bounds photons are emitted into.
    bounds: Bounds3f,

    /// Energy carried by one photon.
    photon_intensity: Float,

    /// Base seed for emission streams.
    seed: u64,

    /// Next emission stream to hand out.
    next_stream: AtomicU64,

    /// Stored photons.
    photons: Mutex<Vec<Photon>>,

    /// Running total of stored power per channel.
    power: [AtomicFloat; SPECTRUM_SAMPLES],
}

impl PhotonMap {
    /// Returns a new empty `PhotonMap`.
    ///
    /// * `bounds`           - Scene bounds.
    /// * `photon_intensity` - Energy carried by one photon.
    /// * `seed`             - Base seed for emission streams.
    pub fn new(bounds: Bounds3f, photon_intensity: Float, seed: u64) -> Self {
        Self {
            bounds,
            photon_intensity,
            seed,
            next_stream: AtomicU64::new(0),
            photons: Mutex::new(Vec::new()),
            power: Default::default(),
        }
    }

    /// Returns the scene bounds.
    pub fn bounds(&self) -> &Bounds3f {
        &self.bounds
    }

    /// Returns the energy carried by one photon.
    pub fn photon_intensity(&self) -> Float {
        self.photon_intensity
    }

    /// Set the energy carried by one photon. Only allowed while the map is not
    /// shared.
    ///
    /// * `photon_intensity` - Energy per photon.
    pub fn set_photon_intensity(&mut self, photon_intensity: Float) {
        self.photon_intensity = photon_intensity;
    }

    /// Returns the seed of a fresh emission stream. Every call hands out a
    /// different stream so repeated emission calls draw new photons.
    pub fn next_stream_seed(&self) -> u64 {
        let stream = self.next_stream.fetch_add(1, Ordering::Relaxed);
        self.seed ^ stream.wrapping_mul(0xbf58476d1ce4e5b9)
    }

    /// Add a single photon.
    ///
    /// * `photon` - The photon.
    pub fn add_photon(&self, photon: Photon) {
        self.add_photons(&mut vec![photon]);
    }

    /// Add a batch of photons, draining `photons`.
    ///
    /// * `photons` - Photons to add.
    pub fn add_photons(&self, photons: &mut Vec<Photon>) {
        if photons.is_empty() {
            return;
        }
        for photon in photons.iter() {
            for (i, total) in self.power.iter().enumerate() {
                total.add(photon.power[i]);
            }
        }
        match self.photons.lock() {
            Ok(mut stored) => stored.append(photons),
            Err(poisoned) => poisoned.into_inner().append(photons),
        }
    }

    /// Returns the number of stored photons.
    pub fn len(&self) -> usize {
        match self.photons.lock() {
            Ok(stored) => stored.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    /// Returns true if no photons are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the total stored power.
    pub fn total_power(&self) -> Spectrum {
        let mut s = Spectrum::ZERO;
        for (i, total) in self.power.iter().enumerate() {
            s[i] = total.load();
        }
        s
    }

    /// Consume the map and return the stored photons.
    pub fn into_photons(self) -> Vec<Photon> {
        match self.photons.into_inner() {
            Ok(stored) => stored,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::*;

    #[test]
    fn add_photons_tracks_power() {
        let map = PhotonMap::new(Bounds3f::default(), 0.5, 1);
        let mut batch = vec![
            Photon::new(Point3f::zero(), Vector3f::new(0.0, 0.0, 1.0), Spectrum::new(0.5)),
            Photon::new(Point3f::zero(), Vector3f::new(0.0, 1.0, 0.0), Spectrum::from_rgb(1.0, 0.0, 0.5)),
        ];
        map.add_photons(&mut batch);
        assert!(batch.is_empty());
        assert_eq!(map.len(), 2);
        let power = map.total_power();
        assert!(approx_eq!(Float, power.red(), 1.5));
        assert!(approx_eq!(Float, power.green(), 0.5));
        assert!(approx_eq!(Float, power.blue(), 1.0));
        assert_eq!(map.into_photons().len(), 2);
    }

    #[test]
    fn concurrent_inserts_keep_every_photon() {
        let mut map = PhotonMap::new(Bounds3f::default(), 1.0, 3);
        map.set_photon_intensity(0.25);
        assert!(approx_eq!(Float, map.photon_intensity(), 0.25));

        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    for _ in 0..250 {
                        map.add_photon(Photon::new(
                            Point3f::zero(),
                            Vector3f::new(0.0, 0.0, 1.0),
                            Spectrum::new(map.photon_intensity()),
                        ));
                    }
                });
            }
        });
        assert_eq!(map.len(), 1000);
        assert!(approx_eq!(Float, map.total_power().green(), 250.0, epsilon = 1e-3));
    }

    #[test]
    fn streams_differ() {
        let map = PhotonMap::new(Bounds3f::default(), 1.0, 7);
        let a = map.next_stream_seed();
        let b = map.next_stream_seed();
        assert_ne!(a, b);
    }
}
