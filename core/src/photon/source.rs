//! Photon Sources

use super::*;
use crate::common::*;
use crate::error::*;
use crate::geometry::*;
use crate::memory::ResourcePool;
use crate::parallel::*;
use crate::rng::RNG;
use crate::spectrum::*;
use std::sync::{Mutex, PoisonError};

/// Emission runs on the thread manager once a call emits at least this many
/// photons.
pub const PARALLEL_PHOTON_THRESHOLD: usize = 4096;

/// Photons per emission batch. Each batch has its own random stream.
pub const PHOTON_BATCH_SIZE: usize = 1024;

/// Initial number of scratch rays per worker.
const SCRATCH_RAYS: usize = 64;

/// Something that emits light energy into a photon map.
pub trait PhotonSource: Send + Sync {
    /// Returns a descriptive name.
    fn name(&self) -> &str;

    /// Returns the total energy this source emits.
    fn total_intensity(&self) -> Float;

    /// Add photons to `map` whose energies sum to approximately `intensity`.
    /// Returns the number of photons added.
    ///
    /// * `map`       - The photon map.
    /// * `intensity` - Target total energy.
    /// * `threads`   - Thread manager for large batches.
    fn generate_photons(
        &self,
        map: &PhotonMap,
        intensity: Float,
        threads: &ThreadManager,
    ) -> Result<usize, PhotonError>;
}

/// Boxed `PhotonSource`.
pub type BoxPhotonSource = Box<dyn PhotonSource>;

/// Draws single photons for `emit_photons`.
pub trait PhotonSampler: Sync {
    /// Sample one photon. Writes its origin and direction into `ray` and
    /// returns its power relative to an average photon, or `None` if nothing
    /// was emitted.
    ///
    /// * `rng` - Random stream.
    /// * `ray` - Receives the origin and direction.
    fn sample_photon(&self, rng: &mut RNG, ray: &mut Ray) -> Option<Spectrum>;
}

/// Returns how many photons of energy `photon_intensity` carry `intensity`.
/// The fractional remainder becomes one more photon with matching
/// probability, so the expected total is exact.
///
/// * `intensity`        - Target total energy.
/// * `photon_intensity` - Energy per photon.
/// * `rng`              - Random stream for the remainder.
pub fn photon_count(intensity: Float, photon_intensity: Float, rng: &mut RNG) -> usize {
    if !(intensity > 0.0 && photon_intensity > 0.0) || !intensity.is_finite() {
        return 0;
    }
    let expected = intensity / photon_intensity;
    let whole = expected.floor();
    let extra = usize::from(rng.uniform_float() < expected - whole);
    whole as usize + extra
}

/// Emit `intensity` worth of photons drawn from `sampler` into `map`. Returns
/// the number of photons added.
///
/// Photons are drawn in batches of `PHOTON_BATCH_SIZE`, each from its own
/// random stream, so the same photons are produced whether the batches run
/// serially or on `threads`. Emission runs serially when `threads` is busy,
/// for example when called from one of its own tasks. If a parallel run
/// fails nothing is added to `map`.
///
/// * `sampler`   - Draws single photons.
/// * `map`       - The photon map.
/// * `intensity` - Target total energy.
/// * `threads`   - Thread manager for large batches.
pub fn emit_photons(
    sampler: &dyn PhotonSampler,
    map: &PhotonMap,
    intensity: Float,
    threads: &ThreadManager,
) -> Result<usize, PhotonError> {
    let seed = map.next_stream_seed();
    let mut rng = RNG::with_seed(seed, u64::MAX);
    let n = photon_count(intensity, map.photon_intensity(), &mut rng);
    if n == 0 {
        return Ok(0);
    }

    let job = EmissionJob {
        sampler,
        map,
        n,
        seed,
    };
    let batches = (n + PHOTON_BATCH_SIZE - 1) / PHOTON_BATCH_SIZE;

    if n < PARALLEL_PHOTON_THRESHOLD || threads.num_threads() == 1 || threads.is_running() {
        return emit_serial(&job, batches);
    }

    let task = EmissionTask::new(job, threads.num_threads());
    match threads.run_with(batches, &task) {
        Ok(status) => {
            if status == RunStatus::Cancelled {
                warn!("Photon emission cancelled");
            }
            Ok(task.flush())
        }
        Err(ThreadError::AlreadyRunning) => {
            debug!("Thread manager busy; emitting {} photons serially", n);
            emit_serial(&task.job, batches)
        }
        Err(err) => Err(err.into()),
    }
}

/// Emit every batch of `job` on the caller's thread.
///
/// * `job`     - The emission job.
/// * `batches` - Number of batches.
fn emit_serial(job: &EmissionJob<'_>, batches: usize) -> Result<usize, PhotonError> {
    let mut scratch = Scratch::new();
    for batch in 0..batches {
        job.emit_batch(batch, &mut scratch)?;
    }
    Ok(scratch.flush(job.map))
}

/// Per-worker scratch storage.
struct Scratch {
    /// Reusable rays for the current batch.
    rays: ResourcePool<Ray>,

    /// Photons not yet added to the map.
    photons: Vec<Photon>,
}

impl Scratch {
    fn new() -> Self {
        Self {
            rays: ResourcePool::new(SCRATCH_RAYS),
            photons: Vec::new(),
        }
    }

    /// Move buffered photons to the map and return how many were moved.
    ///
    /// * `map` - The photon map.
    fn flush(&mut self, map: &PhotonMap) -> usize {
        let count = self.photons.len();
        map.add_photons(&mut self.photons);
        count
    }
}

/// One call's worth of emission.
struct EmissionJob<'a> {
    sampler: &'a dyn PhotonSampler,
    map: &'a PhotonMap,
    n: usize,
    seed: u64,
}

impl EmissionJob<'_> {
    /// Draw the photons of one batch into `scratch`.
    ///
    /// * `batch`   - Batch index.
    /// * `scratch` - Worker scratch storage.
    fn emit_batch(&self, batch: usize, scratch: &mut Scratch) -> Result<(), PoolError> {
        let start = batch * PHOTON_BATCH_SIZE;
        let end = self.n.min(start + PHOTON_BATCH_SIZE);
        let photon_intensity = self.map.photon_intensity();
        let mut rng = RNG::with_seed(self.seed, batch as u64);

        scratch.rays.reset();
        for _ in start..end {
            let ray = scratch.rays.get_object_mut()?;
            if let Some(relative) = self.sampler.sample_photon(&mut rng, ray) {
                let photon = Photon::new(ray.o, ray.d, relative * photon_intensity);
                scratch.photons.push(photon);
            }
        }
        Ok(())
    }
}

/// Runs emission batches on a thread manager. Each worker buffers photons in
/// its own scratch; `flush` adds them to the map after a successful run.
struct EmissionTask<'a> {
    job: EmissionJob<'a>,
    scratch: Vec<Mutex<Scratch>>,
}

impl<'a> EmissionTask<'a> {
    fn new(job: EmissionJob<'a>, num_workers: usize) -> Self {
        Self {
            job,
            scratch: (0..num_workers).map(|_| Mutex::new(Scratch::new())).collect(),
        }
    }

    /// Add every worker's photons to the map and return how many were added.
    fn flush(self) -> usize {
        let map = self.job.map;
        self.scratch
            .into_iter()
            .map(|scratch| {
                scratch
                    .into_inner()
                    .unwrap_or_else(PoisonError::into_inner)
                    .flush(map)
            })
            .sum()
    }
}

impl Task for EmissionTask<'_> {
    fn execute(&self, index: usize, worker: &Worker<'_>) -> Result<(), TaskError> {
        let mut scratch = match self.scratch[worker.id()].lock() {
            Ok(scratch) => scratch,
            Err(poisoned) => poisoned.into_inner(),
        };
        self.job.emit_batch(index, &mut scratch)?;
        Ok(())
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

    /// Emits from the origin in uniformly random directions.
    struct SphereSampler;

    impl PhotonSampler for SphereSampler {
        fn sample_photon(&self, rng: &mut RNG, ray: &mut Ray) -> Option<Spectrum> {
            let u = Point2f::new(rng.uniform_float(), rng.uniform_float());
            ray.o = Point3f::zero();
            ray.d = uniform_sample_sphere(&u);
            Some(Spectrum::ONE)
        }
    }

    fn sorted(map: PhotonMap) -> Vec<(u32, u32, u32)> {
        let mut keys: Vec<_> = map
            .into_photons()
            .iter()
            .map(|p| (p.direction.x.to_bits(), p.direction.y.to_bits(), p.direction.z.to_bits()))
            .collect();
        keys.sort_unstable();
        keys
    }

    #[test]
    fn photon_count_rounds_stochastically() {
        let mut rng = RNG::new(3);
        assert_eq!(photon_count(10.0, 1.0, &mut rng), 10);
        assert_eq!(photon_count(0.0, 1.0, &mut rng), 0);
        assert_eq!(photon_count(-1.0, 1.0, &mut rng), 0);
        assert_eq!(photon_count(1.0, 0.0, &mut rng), 0);
        assert_eq!(photon_count(Float::NAN, 1.0, &mut rng), 0);

        let trials = 10_000;
        let total: usize = (0..trials).map(|_| photon_count(2.25, 1.0, &mut rng)).sum();
        let mean = total as Float / trials as Float;
        assert!(approx_eq!(Float, mean, 2.25, epsilon = 0.05), "mean = {}", mean);
    }

    #[test]
    fn zero_intensity_emits_nothing() {
        let map = PhotonMap::new(Bounds3f::default(), 1.0, 5);
        let threads = ThreadManager::with_threads(4);
        assert_eq!(emit_photons(&SphereSampler, &map, 0.0, &threads), Ok(0));
        assert!(map.is_empty());
    }

    #[test]
    fn total_power_matches_target() {
        let map = PhotonMap::new(Bounds3f::default(), 0.01, 5);
        let threads = ThreadManager::with_threads(1);
        let n = emit_photons(&SphereSampler, &map, 20.0, &threads).unwrap();
        assert!((1999..=2001).contains(&n), "n = {}", n);
        assert!(approx_eq!(Float, map.total_power().average(), 20.0, epsilon = 0.05));
    }

    #[test]
    fn thread_count_does_not_change_photons() {
        let serial = PhotonMap::new(Bounds3f::default(), 0.001, 9);
        let parallel = PhotonMap::new(Bounds3f::default(), 0.001, 9);
        let n_serial = emit_photons(&SphereSampler, &serial, 10.0, &ThreadManager::with_threads(1)).unwrap();
        let n_parallel = emit_photons(&SphereSampler, &parallel, 10.0, &ThreadManager::with_threads(4)).unwrap();
        assert!(n_serial >= PARALLEL_PHOTON_THRESHOLD);
        assert_eq!(n_serial, n_parallel);
        assert_eq!(sorted(serial), sorted(parallel));
    }

    #[test]
    fn emission_from_a_busy_manager_runs_serially() {
        let serial = PhotonMap::new(Bounds3f::default(), 0.001, 9);
        let n_serial = emit_photons(&SphereSampler, &serial, 10.0, &ThreadManager::with_threads(1)).unwrap();
        assert!(n_serial >= PARALLEL_PHOTON_THRESHOLD);
        let expected = sorted(serial);

        let threads = ThreadManager::with_threads(2);
        let maps: Vec<_> = (0..2).map(|_| PhotonMap::new(Bounds3f::default(), 0.001, 9)).collect();
        let results = Mutex::new(Vec::new());
        let task = |index: usize, _: &Worker<'_>| -> Result<(), TaskError> {
            let result = emit_photons(&SphereSampler, &maps[index], 10.0, &threads);
            results.lock().unwrap().push(result);
            Ok(())
        };
        assert_eq!(threads.run_with(2, &task).unwrap(), RunStatus::Completed);

        let results = results.into_inner().unwrap();
        assert_eq!(results, vec![Ok(n_serial), Ok(n_serial)]);
        for map in maps {
            assert_eq!(sorted(map), expected);
        }
    }

    #[test]
    fn failed_parallel_run_adds_nothing() {
        /// Emits normally until it is asked to panic.
        struct FailingSampler {
            calls: std::sync::atomic::AtomicUsize,
        }

        impl PhotonSampler for FailingSampler {
            fn sample_photon(&self, rng: &mut RNG, ray: &mut Ray) -> Option<Spectrum> {
                let call = self.calls.fetch_add(1, std::sync::atomic::Ordering::AcqRel);
                if call == 3 * PHOTON_BATCH_SIZE {
                    panic!("sampler failed");
                }
                SphereSampler.sample_photon(rng, ray)
            }
        }

        let map = PhotonMap::new(Bounds3f::default(), 0.001, 9);
        let sampler = FailingSampler {
            calls: std::sync::atomic::AtomicUsize::new(0),
        };
        let result = emit_photons(&sampler, &map, 10.0, &ThreadManager::with_threads(4));
        assert!(matches!(
            result,
            Err(PhotonError::Thread(ThreadError::TaskPanicked { .. }))
        ));
        assert!(map.is_empty());
        assert!(approx_eq!(Float, map.total_power().average(), 0.0));
    }

    #[test]
    fn repeated_calls_draw_new_photons() {
        let map = PhotonMap::new(Bounds3f::default(), 1.0, 1);
        let threads = ThreadManager::with_threads(1);
        emit_photons(&SphereSampler, &map, 1.0, &threads).unwrap();
        emit_photons(&SphereSampler, &map, 1.0, &threads).unwrap();
        let photons = map.into_photons();
        assert_eq!(photons.len(), 2);
        assert_ne!(photons[0].direction, photons[1].direction);
    }
}
