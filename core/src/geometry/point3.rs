//! 3-D Points

use super::vector3::*;
use crate::common::*;
use num_traits::Num;
use std::ops::{Add, Index, Sub};

/// A 3-D point containing numeric values.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Point3<T> {
    /// X-coordinate.
    pub x: T,

    /// Y-coordinate.
    pub y: T,

    /// Z-coordinate.
    pub z: T,
}

/// 3-D point containing `Float` values.
pub type Point3f = Point3<Float>;

impl<T: Num + Copy> Point3<T> {
    /// Creates a new 3-D point.
    ///
    /// * `x` - X-coordinate.
    /// * `y` - Y-coordinate.
    /// * `z` - Z-coordinate.
    pub fn new(x: T, y: T, z: T) -> Self {
        Self { x, y, z }
    }

    /// Creates a point at the origin.
    pub fn zero() -> Self {
        Self::new(T::zero(), T::zero(), T::zero())
    }
}

impl Point3f {
    /// Returns the distance to another point.
    ///
    /// * `p` - The other point.
    pub fn distance(&self, p: Self) -> Float {
        (*self - p).length()
    }

    /// Returns the component-wise minimum with another point.
    ///
    /// * `p` - The other point.
    pub fn min(&self, p: &Self) -> Self {
        Self::new(min(self.x, p.x), min(self.y, p.y), min(self.z, p.z))
    }

    /// Returns the component-wise maximum with another point.
    ///
    /// * `p` - The other point.
    pub fn max(&self, p: &Self) -> Self {
        Self::new(max(self.x, p.x), max(self.y, p.y), max(self.z, p.z))
    }

    /// Returns a point interpolated between this point and another.
    ///
    /// * `t` - Interpolation parameter.
    /// * `p` - The other point.
    pub fn lerp(&self, t: Float, p: &Self) -> Self {
        *self + (*p - *self) * t
    }
}

impl<T: Num + Copy> Add<Vector3<T>> for Point3<T> {
    type Output = Self;

    fn add(self, v: Vector3<T>) -> Self::Output {
        Self::new(self.x + v.x, self.y + v.y, self.z + v.z)
    }
}

impl<T: Num + Copy> Sub<Vector3<T>> for Point3<T> {
    type Output = Self;

    fn sub(self, v: Vector3<T>) -> Self::Output {
        Self::new(self.x - v.x, self.y - v.y, self.z - v.z)
    }
}

impl<T: Num + Copy> Sub for Point3<T> {
    type Output = Vector3<T>;

    fn sub(self, p: Self) -> Self::Output {
        Vector3::new(self.x - p.x, self.y - p.y, self.z - p.z)
    }
}

impl<T> Index<usize> for Point3<T> {
    type Output = T;

    fn index(&self, i: usize) -> &Self::Output {
        match i {
            0 => &self.x,
            1 => &self.y,
            2 => &self.z,
            _ => panic!("Invalid index {i} for Point3"),
        }
    }
}

impl From<Vector3f> for Point3f {
    fn from(v: Vector3f) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

impl From<Point3f> for Vector3f {
    fn from(p: Point3f) -> Self {
        Self::new(p.x, p.y, p.z)
    }
}
