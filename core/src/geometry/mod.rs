//! Geometry

mod bounds3;
mod coordinate_system;
mod mesh;
mod point2;
mod point3;
mod ray;
mod vector3;

// Re-export
pub use bounds3::*;
pub use coordinate_system::*;
pub use mesh::*;
pub use point2::*;
pub use point3::*;
pub use ray::*;
pub use vector3::*;
