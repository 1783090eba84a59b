//! Coordinate System

use super::*;

/// Placement of an object in the scene: an origin plus an orthonormal frame.
/// Local `+z` is the object's forward direction and local `+y` its up
/// direction.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CoordinateSystem {
    /// Origin in world space.
    origin: Point3f,

    /// Local x-axis in world space.
    x_dir: Vector3f,

    /// Local y-axis in world space.
    up_dir: Vector3f,

    /// Local z-axis in world space.
    z_dir: Vector3f,
}

impl CoordinateSystem {
    /// Returns a new `CoordinateSystem`. The up direction is re-orthogonalized
    /// against the z direction; if the two are parallel an arbitrary
    /// perpendicular up direction is chosen.
    ///
    /// * `origin` - Origin in world space.
    /// * `z_dir`  - Forward direction.
    /// * `up_dir` - Approximate up direction.
    pub fn new(origin: Point3f, z_dir: Vector3f, up_dir: Vector3f) -> Self {
        let z_dir = z_dir.normalize();
        let x_dir = up_dir.cross(&z_dir);
        let (x_dir, up_dir) = if x_dir.length_squared() > 1e-12 {
            let x_dir = x_dir.normalize();
            (x_dir, z_dir.cross(&x_dir))
        } else {
            let (a, b) = z_dir.coordinate_system();
            (a, b)
        };
        Self {
            origin,
            x_dir,
            up_dir,
            z_dir,
        }
    }

    /// Returns a frame at the given origin aligned with the world axes.
    ///
    /// * `origin` - Origin in world space.
    pub fn at(origin: Point3f) -> Self {
        Self {
            origin,
            x_dir: Vector3f::new(1.0, 0.0, 0.0),
            up_dir: Vector3f::new(0.0, 1.0, 0.0),
            z_dir: Vector3f::new(0.0, 0.0, 1.0),
        }
    }

    /// Returns the origin.
    pub fn origin(&self) -> Point3f {
        self.origin
    }

    /// Returns the forward (local z) direction.
    pub fn z_dir(&self) -> Vector3f {
        self.z_dir
    }

    /// Returns the up (local y) direction.
    pub fn up_dir(&self) -> Vector3f {
        self.up_dir
    }

    /// Returns the local x direction.
    pub fn x_dir(&self) -> Vector3f {
        self.x_dir
    }

    /// Transforms a direction from local to world space.
    ///
    /// * `v` - Direction in local space.
    pub fn to_world_dir(&self, v: &Vector3f) -> Vector3f {
        self.x_dir * v.x + self.up_dir * v.y + self.z_dir * v.z
    }

    /// Transforms a point from local to world space.
    ///
    /// * `p` - Point in local space.
    pub fn to_world_point(&self, p: &Point3f) -> Point3f {
        self.origin + self.to_world_dir(&Vector3f::from(*p))
    }

    /// Transforms a direction from world to local space.
    ///
    /// * `v` - Direction in world space.
    pub fn to_local_dir(&self, v: &Vector3f) -> Vector3f {
        Vector3f::new(v.dot(&self.x_dir), v.dot(&self.up_dir), v.dot(&self.z_dir))
    }

    /// Transforms a point from world to local space.
    ///
    /// * `p` - Point in world space.
    pub fn to_local_point(&self, p: &Point3f) -> Point3f {
        Point3f::from(self.to_local_dir(&(*p - self.origin)))
    }
}

impl Default for CoordinateSystem {
    fn default() -> Self {
        Self::at(Point3f::zero())
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
