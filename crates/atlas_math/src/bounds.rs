//! Axis-aligned bounding boxes for spatial queries and picking

use crate::rotation::rotate_euler_xyz_degrees;
use crate::vector::Vec3;

/// Epsilon below which a ray direction component is treated as parallel
/// to the corresponding slab.
const RAY_PARALLEL_EPSILON: f32 = 1e-8;

/// Axis-Aligned Bounding Box
///
/// Either both corners are finite with `min <= max` on every axis, or
/// the box is the canonical empty sentinel (`min = +inf`, `max = -inf`),
/// which expands to any first point.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// The empty (inverted) box
    pub const EMPTY: Self = Self {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    /// Create from min and max corners
    #[inline]
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// The empty box - function form
    #[inline]
    pub fn empty() -> Self {
        Self::EMPTY
    }

    /// Box spanning `[-0.5, 0.5]` on every axis
    #[inline]
    pub fn unit_cube() -> Self {
        Self {
            min: Vec3::splat(-0.5),
            max: Vec3::splat(0.5),
        }
    }

    /// Create from center and half-extents
    #[inline]
    pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    /// Smallest box containing a set of points
    pub fn from_points(points: &[Vec3]) -> Self {
        let mut aabb = Self::EMPTY;
        for &point in points {
            aabb.expand(point);
        }
        aabb
    }

    /// Check that the box is a real volume rather than the empty sentinel
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y && self.min.z <= self.max.z
    }

    /// Grow in place to include a point
    #[inline]
    pub fn expand(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    /// Smallest box containing both operands
    ///
    /// Merging with an empty box is the identity when the other operand
    /// is valid; merging two empty boxes stays empty.
    #[inline]
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Midpoint of the box (garbage, but finite arithmetic, on empty)
    #[inline]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Per-axis extent
    #[inline]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    #[inline]
    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// The 8 corners of the box
    pub fn corners(&self) -> [Vec3; 8] {
        [
            Vec3::new(self.min.x, self.min.y, self.min.z),
            Vec3::new(self.max.x, self.min.y, self.min.z),
            Vec3::new(self.min.x, self.max.y, self.min.z),
            Vec3::new(self.max.x, self.max.y, self.min.z),
            Vec3::new(self.min.x, self.min.y, self.max.z),
            Vec3::new(self.max.x, self.min.y, self.max.z),
            Vec3::new(self.min.x, self.max.y, self.max.z),
            Vec3::new(self.max.x, self.max.y, self.max.z),
        ]
    }

    /// Check if a point is inside (closed intervals)
    #[inline]
    pub fn contains_point(&self, point: Vec3) -> bool {
        point.x >= self.min.x && point.x <= self.max.x
            && point.y >= self.min.y && point.y <= self.max.y
            && point.z >= self.min.z && point.z <= self.max.z
    }

    /// World-space box of this local-space box under the editor transform
    ///
    /// Each corner is scaled componentwise, rotated about X then Y then Z
    /// (angles in degrees), and translated; the result is the merge over
    /// the 8 transformed corners. Conservative for rotated boxes: the
    /// enclosing box grows rather than staying tight.
    pub fn transform(&self, position: Vec3, rotation_degrees: Vec3, scale: Vec3) -> Self {
        if !self.is_valid() {
            return Self::EMPTY;
        }

        let mut result = Self::EMPTY;
        for corner in self.corners() {
            let p = rotate_euler_xyz_degrees(corner * scale, rotation_degrees) + position;
            result.expand(p);
        }
        result
    }

    /// Slab-method ray intersection
    ///
    /// Returns the first non-negative hit distance along `direction`, or
    /// `None` when the box is missed or lies entirely behind the origin.
    /// A direction component below the parallel epsilon rejects outright
    /// unless the origin lies within that axis' slab.
    pub fn intersects_ray(&self, origin: Vec3, direction: Vec3) -> Option<f32> {
        let o = origin.to_array();
        let d = direction.to_array();
        let lo = self.min.to_array();
        let hi = self.max.to_array();

        let mut tmin = f32::NEG_INFINITY;
        let mut tmax = f32::INFINITY;

        for axis in 0..3 {
            if d[axis].abs() < RAY_PARALLEL_EPSILON {
                if o[axis] < lo[axis] || o[axis] > hi[axis] {
                    return None;
                }
                continue;
            }

            let inv = 1.0 / d[axis];
            let mut t0 = (lo[axis] - o[axis]) * inv;
            let mut t1 = (hi[axis] - o[axis]) * inv;
            if inv < 0.0 {
                core::mem::swap(&mut t0, &mut t1);
            }

            tmin = tmin.max(t0);
            tmax = tmax.min(t1);
            if tmax < tmin {
                return None;
            }
        }

        if tmin >= 0.0 {
            Some(tmin)
        } else if tmax >= 0.0 {
            Some(tmax)
        } else {
            None
        }
    }

    /// Check if two boxes overlap (closed intervals: touching counts)
    #[inline]
    pub fn intersects(&self, other: &Self) -> bool {
        self.min.x <= other.max.x && self.max.x >= other.min.x
            && self.min.y <= other.max.y && self.max.y >= other.min.y
            && self.min.z <= other.max.z && self.max.z >= other.min.z
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::EMPTY
    }
}
