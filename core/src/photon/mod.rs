//! Photon Mapping

mod factory;
mod light_source;
mod mesh_source;
mod photon_map;
mod source;

// Re-export
pub use factory::*;
pub use light_source::*;
pub use mesh_source::*;
pub use photon_map::*;
pub use source::*;
