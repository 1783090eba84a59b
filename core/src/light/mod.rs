//! Light

use crate::common::*;
use crate::geometry::*;
use crate::spectrum::*;
use std::sync::Arc;

mod light_type;
mod rt_light;

/// Direction and distance from a point to a sampled point on a light.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ShadowSample {
    /// Unit direction from the shading point towards the light.
    pub wi: Vector3f,

    /// Distance to the sampled point; `INFINITY` for lights at infinity.
    pub distance: Float,
}

/// A photon leaving a light.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Emission {
    /// Origin and direction of the photon.
    pub ray: Ray,

    /// Power relative to the light's average photon. Its expected value over
    /// all samples is 1.
    pub weight: Float,
}

/// A scene light: its physical parameters and how to sample it, given the
/// placement the scene gives it. Lights hold no placement of their own, so a
/// single light description can be instanced at several places.
pub trait Light {
    /// Returns the type of light.
    fn light_type(&self) -> LightType;

    /// Returns the emitted colour.
    fn color(&self) -> Spectrum;

    /// Returns the scalar intensity that scales `color()`.
    fn intensity(&self) -> Float;

    /// Returns true if multiple shadow rays per point produce a penumbra.
    fn soft_shadows(&self) -> bool {
        !self.light_type().is_delta_light()
    }

    /// Sample a point on the light as seen from `origin`. `u` is `None` for
    /// the light's centre, or a point in `[0, 1)^2` selecting a point spread
    /// over the light's extent.
    ///
    /// * `coords` - Placement of the light.
    /// * `origin` - The shading point.
    /// * `u`      - Optional sample point.
    fn sample_shadow(&self, coords: &CoordinateSystem, origin: &Point3f, u: Option<&Point2f>) -> ShadowSample;

    /// Returns the total light energy emitted into a scene with the given
    /// bounds.
    ///
    /// * `coords` - Placement of the light.
    /// * `bounds` - Scene bounds.
    fn total_intensity(&self, coords: &CoordinateSystem, bounds: &Bounds3f) -> Float;

    /// Sample a photon leaving the light. Returns `None` if no photon can be
    /// emitted, e.g. for a directional light in an empty scene.
    ///
    /// * `coords` - Placement of the light.
    /// * `bounds` - Scene bounds.
    /// * `u1`     - Sample point for the origin.
    /// * `u2`     - Sample point for the direction.
    fn sample_emission(
        &self,
        coords: &CoordinateSystem,
        bounds: &Bounds3f,
        u1: &Point2f,
        u2: &Point2f,
    ) -> Option<Emission>;
}

/// Atomic reference counted `Light`.
pub type ArcLight = Arc<dyn Light + Send + Sync>;

// Re-export
pub use light_type::*;
pub use rt_light::*;
