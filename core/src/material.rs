//! Material

use crate::common::*;
use crate::spectrum::*;
use std::sync::Arc;

/// Volumetric properties of the material filling a closed surface, applied
/// between the fragment where a view ray enters the surface and the fragment
/// where it leaves.
pub trait Material {
    /// Returns a descriptive name.
    fn name(&self) -> &str;

    /// Returns the fraction of light transmitted through `distance` units of
    /// the material.
    ///
    /// * `distance` - Distance travelled inside the material.
    fn transmittance(&self, distance: Float) -> Spectrum;
}

/// Atomic reference counted `Material`.
pub type ArcMaterial = Arc<dyn Material + Send + Sync>;

/// A homogeneous absorbing material following the Beer-Lambert law.
#[derive(Clone, Debug)]
pub struct UniformMaterial {
    /// Name.
    name: String,

    /// Absorption coefficient per unit distance.
    absorption: Spectrum,
}

impl UniformMaterial {
    /// Returns a new `UniformMaterial`.
    ///
    /// * `name`       - Name.
    /// * `absorption` - Absorption coefficient per unit distance.
    pub fn new(name: &str, absorption: Spectrum) -> Self {
        Self {
            name: name.to_owned(),
            absorption,
        }
    }
}

impl Material for UniformMaterial {
    fn name(&self) -> &str {
        &self.name
    }

    fn transmittance(&self, distance: Float) -> Spectrum {
        (self.absorption * max(0.0, distance)).exp_neg()
    }
}
