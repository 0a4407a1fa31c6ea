//! # atlas_math - Spatial Math Primitives
//!
//! Vectors, bounding boxes, and rays for the Atlas scene editor core.
//! Everything here is a plain value type; the spatial index in
//! `atlas_spatial` builds on these.

#![cfg_attr(not(feature = "std"), no_std)]

pub mod vector;
pub mod rotation;
pub mod bounds;
pub mod ray;

pub use vector::*;
pub use rotation::*;
pub use bounds::*;
pub use ray::*;

/// Common math constants
pub mod consts {
    pub const PI: f32 = core::f32::consts::PI;
    pub const DEG_TO_RAD: f32 = PI / 180.0;
    pub const RAD_TO_DEG: f32 = 180.0 / PI;
    pub const EPSILON: f32 = 1e-6;
}

/// Convert degrees to radians
#[inline]
pub fn radians(degrees: f32) -> f32 {
    degrees * consts::DEG_TO_RAD
}

/// Convert radians to degrees
#[inline]
pub fn degrees(radians: f32) -> f32 {
    radians * consts::RAD_TO_DEG
}

pub mod prelude {
    pub use crate::vector::Vec3;
    pub use crate::rotation::{rotate_euler_xyz, rotate_euler_xyz_degrees};
    pub use crate::bounds::Aabb;
    pub use crate::ray::Ray;
    pub use crate::{radians, degrees};
}
