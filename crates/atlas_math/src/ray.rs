//! 3D ray for picking and intersection queries

use crate::vector::Vec3;

/// 3D ray with normalized direction
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ray {
    /// Ray origin point
    pub origin: Vec3,
    /// Ray direction (normalized by the constructor)
    pub direction: Vec3,
}

impl Ray {
    /// Create a new ray, normalizing the direction
    #[inline]
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// Create a ray from two points
    #[inline]
    pub fn from_points(start: Vec3, end: Vec3) -> Self {
        Self::new(start, end - start)
    }

    /// Point at distance t along the ray
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Check the direction has non-zero length
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.direction.length_squared() > 1e-10
    }
}
