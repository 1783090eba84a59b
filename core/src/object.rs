//! Scene Objects

use crate::common::*;
use crate::geometry::*;
use crate::material::*;
use crate::spectrum::*;
use std::fmt;

/// A triangle mesh placed in the scene, as the renderer sees it.
#[derive(Clone)]
pub struct RTObject {
    /// Name.
    name: String,

    /// Geometry in object space.
    mesh: TriangleMesh,

    /// Placement of the object.
    coords: CoordinateSystem,

    /// Material filling the object's interior.
    material: Option<ArcMaterial>,

    /// Emitted radiant exitance per unit area.
    emission: Spectrum,
}

impl RTObject {
    /// Returns a new non-emissive `RTObject` with no interior material.
    ///
    /// * `name`   - Name.
    /// * `mesh`   - Geometry in object space.
    /// * `coords` - Placement of the object.
    pub fn new(name: &str, mesh: TriangleMesh, coords: CoordinateSystem) -> Self {
        Self {
            name: String::from(name),
            mesh,
            coords,
            material: None,
            emission: Spectrum::ZERO,
        }
    }

    /// Set the material filling the object's interior.
    ///
    /// * `material` - The material.
    pub fn with_material(mut self, material: ArcMaterial) -> Self {
        self.material = Some(material);
        self
    }

    /// Make the object emit light from the front face of every triangle.
    /// Negative colour channels are treated as zero.
    ///
    /// * `color`     - Emitted colour.
    /// * `intensity` - Scale applied to `color`.
    pub fn with_emission(mut self, color: Spectrum, intensity: Float) -> Self {
        self.emission = color.clamp(0.0, INFINITY) * max(0.0, intensity);
        self
    }

    /// Returns the name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the geometry in object space.
    pub fn mesh(&self) -> &TriangleMesh {
        &self.mesh
    }

    /// Returns the placement.
    pub fn coords(&self) -> &CoordinateSystem {
        &self.coords
    }

    /// Returns the interior material.
    pub fn material(&self) -> Option<&ArcMaterial> {
        self.material.as_ref()
    }

    /// Returns the emitted radiant exitance per unit area.
    pub fn emission(&self) -> Spectrum {
        self.emission
    }

    /// Returns true if the object emits light.
    pub fn is_emissive(&self) -> bool {
        !self.emission.is_black()
    }

    /// Returns the mesh vertices transformed to world space.
    pub fn world_vertices(&self) -> Vec<Point3f> {
        self.mesh.vertices.iter().map(|p| self.coords.to_world_point(p)).collect()
    }

    /// Returns the mesh transformed to world space.
    pub fn world_mesh(&self) -> TriangleMesh {
        let normals = self.mesh.normals.iter().map(|n| self.coords.to_world_dir(n)).collect();
        TriangleMesh::new(self.world_vertices(), self.mesh.triangles.clone(), normals)
    }

    /// Returns the world space bounds.
    pub fn world_bounds(&self) -> Bounds3f {
        self.world_vertices()
            .iter()
            .fold(Bounds3f::default(), |b, p| b.union_point(p))
    }
}

impl fmt::Debug for RTObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RTObject")
            .field("name", &self.name)
            .field("triangles", &self.mesh.triangles.len())
            .field("coords", &self.coords)
            .field("material", &self.material.as_ref().map(|m| m.name().to_string()))
            .field("emission", &self.emission)
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> TriangleMesh {
        TriangleMesh::new(
            vec![
                Point3f::new(-1.0, -1.0, 0.0),
                Point3f::new(1.0, -1.0, 0.0),
                Point3f::new(1.0, 1.0, 0.0),
                Point3f::new(-1.0, 1.0, 0.0),
            ],
            vec![[0, 1, 2], [0, 2, 3]],
            vec![],
        )
    }

    #[test]
    fn world_bounds_follow_placement() {
        let obj = RTObject::new("quad", quad(), CoordinateSystem::at(Point3f::new(0.0, 5.0, 0.0)));
        let b = obj.world_bounds();
        assert_eq!(b.p_min, Point3f::new(-1.0, 4.0, 0.0));
        assert_eq!(b.p_max, Point3f::new(1.0, 6.0, 0.0));
    }

    #[test]
    fn emission_is_clamped() {
        let obj = RTObject::new("quad", quad(), CoordinateSystem::default());
        assert!(!obj.is_emissive());
        assert!(!obj.clone().with_emission(Spectrum::ONE, -2.0).is_emissive());
        assert_eq!(obj.clone().with_emission(Spectrum::ONE, 2.0).emission(), Spectrum::new(2.0));

        let signed = obj.clone().with_emission(Spectrum::from_rgb(1.0, -1.0, 0.0), 1.0);
        assert_eq!(signed.emission(), Spectrum::from_rgb(1.0, 0.0, 0.0));
        assert!(!obj.with_emission(Spectrum::from_rgb(0.0, -1.0, 0.0), 1.0).is_emissive());
    }
}
