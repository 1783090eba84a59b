//! Mesh Photon Source

use super::*;
use crate::common::*;
use crate::error::*;
use crate::geometry::*;
use crate::object::RTObject;
use crate::parallel::ThreadManager;
use crate::rng::RNG;
use crate::sampling::*;
use crate::spectrum::*;

/// Emits photons from the front faces of an emissive object's triangles.
pub struct MeshPhotonSource {
    /// Name of the object.
    name: String,

    /// World space triangle vertices.
    triangles: Vec<[Point3f; 3]>,

    /// World space face normals.
    normals: Vec<Normal3f>,

    /// Selects triangles in proportion to their area.
    distribution: Distribution1D,

    /// Total emitting area.
    area: Float,

    /// Emitted radiant exitance per unit area.
    emission: Spectrum,

    /// Emission colour scaled to unit average.
    tint: Spectrum,
}

impl MeshPhotonSource {
    /// Returns a new `MeshPhotonSource`, or `None` if the object emits no
    /// light or has no area.
    ///
    /// * `object` - The object.
    pub fn new(object: &RTObject) -> Option<Self> {
        if !object.is_emissive() {
            return None;
        }

        let mesh = object.world_mesh();
        let count = mesh.triangles.len();
        let areas: Vec<Float> = (0..count).map(|t| mesh.triangle_area(t)).collect();
        let area: Float = areas.iter().sum();
        if !(area > 0.0) {
            return None;
        }

        let emission = object.emission();
        let average = emission.average();
        if !(average > 0.0) {
            return None;
        }

        Some(Self {
            name: String::from(object.name()),
            triangles: (0..count).map(|t| mesh.triangle_vertices(t)).collect(),
            normals: (0..count).map(|t| mesh.face_normal(t)).collect(),
            distribution: Distribution1D::new(areas),
            area,
            emission,
            tint: emission / average,
        })
    }

    /// Returns the total emitting area.
    pub fn area(&self) -> Float {
        self.area
    }
}

impl PhotonSampler for MeshPhotonSource {
    fn sample_photon(&self, rng: &mut RNG, ray: &mut Ray) -> Option<Spectrum> {
        let (tri, _pdf, _u) = self.distribution.sample_discrete(rng.uniform_float());
        let [p0, p1, p2] = self.triangles[tri];
        let n = self.normals[tri];

        let b = uniform_sample_triangle(&Point2f::new(rng.uniform_float(), rng.uniform_float()));
        let p = p0 + (p1 - p0) * b[1] + (p2 - p0) * (1.0 - b[0] - b[1]);

        let local = cosine_sample_hemisphere(&Point2f::new(rng.uniform_float(), rng.uniform_float()));
        let (s, t) = n.coordinate_system();
        ray.d = (s * local.x + t * local.y + n * local.z).normalize();
        ray.o = p + n * SHADOW_EPSILON;
        ray.t_max = INFINITY;
        Some(self.tint)
    }
}

impl PhotonSource for MeshPhotonSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn total_intensity(&self) -> Float {
        self.emission.average() * self.area
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
