//! # atlas_spatial - Scene Spatial Index
//!
//! Answers two questions cheaply over a changing set of transformed
//! scene objects: "which object does this ray hit first?" and "which
//! objects overlap this region?" Backs click-to-select picking and
//! marquee/culling queries in the Atlas editor.
//!
//! Hits resolve to bounding-box granularity; a picking layer wanting
//! per-triangle precision refines the result itself.
//!
//! # Example
//!
//! ```
//! use atlas_math::Vec3;
//! use atlas_spatial::{NodeDesc, SpatialIndex};
//!
//! let mut index: SpatialIndex<()> = SpatialIndex::new();
//! index.add("crate", NodeDesc::new()).unwrap();
//! index.add("lamp", NodeDesc::new().with_position(Vec3::new(4.0, 0.0, 0.0))).unwrap();
//!
//! let hit = index.cast_ray(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z).unwrap();
//! assert_eq!(hit.node.id(), "crate");
//! ```

mod bvh;
pub mod index;
pub mod node;

pub use index::{RayHit, SpatialError, SpatialIndex};
pub use node::{NodeDesc, NodePatch, SceneNode};
