//! Spatial index over scene nodes
//!
//! Owns the node set, keeps a BVH over their world bounds, and answers
//! ray picks and region queries against it. Structural mutations mark
//! the hierarchy stale; the next query (or an explicit [`rebuild`])
//! reconstructs it in full. There is no incremental refit.
//!
//! [`rebuild`]: SpatialIndex::rebuild

use std::collections::HashMap;

use atlas_math::{Aabb, Ray, Vec3};
use thiserror::Error;

use crate::bvh::Bvh;
use crate::node::{NodeDesc, NodePatch, SceneNode};

/// Errors reported by [`SpatialIndex`]
#[derive(Debug, Error)]
pub enum SpatialError {
    /// A node with this id is already tracked
    #[error("node id already in use: {0}")]
    DuplicateId(String),
}

/// Hierarchy freshness relative to the node set
///
/// Every structural mutation forces `Fresh -> Stale`; the only way back
/// is a full rebuild.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Freshness {
    Fresh,
    Stale,
}

/// Closest node whose world bounds a ray hits
#[derive(Debug)]
pub struct RayHit<'a, T> {
    pub node: &'a SceneNode<T>,
    /// Distance from the ray origin to the entry point
    pub distance: f32,
    /// `origin + direction * distance`
    pub point: Vec3,
}

/// Spatial index accelerating picking and region queries
///
/// Single-threaded by design: the index is owned and driven by the
/// editor's UI loop. The first query after a batch of edits pays for a
/// full rebuild; calling [`rebuild`](Self::rebuild) once per frame
/// amortizes that cost predictably.
pub struct SpatialIndex<T> {
    nodes: HashMap<String, SceneNode<T>>,
    bvh: Bvh,
    freshness: Freshness,
}

impl<T> SpatialIndex<T> {
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            bvh: Bvh::new(),
            freshness: Freshness::Fresh,
        }
    }

    /// Create and store a node
    ///
    /// Fails with [`SpatialError::DuplicateId`] when the id is already
    /// tracked; ids are immutable for a node's lifetime.
    pub fn add(
        &mut self,
        id: impl Into<String>,
        desc: NodeDesc<T>,
    ) -> Result<&SceneNode<T>, SpatialError> {
        let id = id.into();
        if self.nodes.contains_key(&id) {
            return Err(SpatialError::DuplicateId(id));
        }

        let node = SceneNode::new(id.clone(), desc);
        self.freshness = Freshness::Stale;
        Ok(self.nodes.entry(id).or_insert(node))
    }

    /// Remove a node, reporting whether anything was removed
    pub fn remove(&mut self, id: &str) -> bool {
        let removed = self.nodes.remove(id).is_some();
        if removed {
            self.freshness = Freshness::Stale;
        }
        removed
    }

    /// Look up a node; absence is not an error
    pub fn get(&self, id: &str) -> Option<&SceneNode<T>> {
        self.nodes.get(id)
    }

    /// Apply a partial update to a node
    ///
    /// Only supplied fields are touched. The hierarchy is marked stale
    /// only when a geometric field changed; payload-only patches leave
    /// it fresh. Returns `None` for an unknown id.
    pub fn update(&mut self, id: &str, patch: NodePatch<T>) -> Option<&SceneNode<T>> {
        let node = self.nodes.get_mut(id)?;
        let geometry_changed = patch.changes_geometry();

        if let Some(position) = patch.position {
            node.set_position(position);
        }
        if let Some(rotation) = patch.rotation {
            node.set_rotation(rotation);
        }
        if let Some(scale) = patch.scale {
            node.set_scale(scale);
        }
        if let Some(local_bounds) = patch.local_bounds {
            node.set_local_bounds(local_bounds);
        }
        if let Some(payload) = patch.payload {
            node.set_payload(payload);
        }

        if geometry_changed {
            self.freshness = Freshness::Stale;
        }
        self.nodes.get(id)
    }

    /// Iterate over all current nodes (order stable for a given map)
    pub fn nodes(&self) -> impl Iterator<Item = &SceneNode<T>> {
        self.nodes.values()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Force a full hierarchy reconstruction regardless of freshness
    ///
    /// With zero nodes this clears the hierarchy and the stale flag.
    pub fn rebuild(&mut self) {
        if self.nodes.is_empty() {
            self.bvh.clear();
            self.freshness = Freshness::Fresh;
            return;
        }

        let mut items: Vec<(String, Aabb, Vec3)> = self
            .nodes
            .iter()
            .map(|(id, node)| {
                let bounds = node.world_bounds();
                (id.clone(), bounds, bounds.center())
            })
            .collect();

        self.bvh.build(&mut items);
        log::debug!(
            "rebuilt scene BVH: {} leaves, {} arena entries",
            items.len(),
            self.bvh.node_count()
        );
        self.freshness = Freshness::Fresh;
    }

    /// Closest node hit by the ray, or `None`
    ///
    /// Rebuilds first when stale. The direction is normalized, so the
    /// returned distance is in world units.
    pub fn cast_ray(&mut self, origin: Vec3, direction: Vec3) -> Option<RayHit<'_, T>> {
        self.ensure_fresh();

        let ray = Ray::new(origin, direction);
        if !ray.is_valid() {
            return None;
        }

        let nodes = &self.nodes;
        let (key, distance) = self
            .bvh
            .cast_ray(&ray, |id| nodes.get(id).map(|n| n.world_bounds()))?;
        let node = nodes.get(key)?;

        Some(RayHit {
            node,
            distance,
            point: ray.at(distance),
        })
    }

    /// Every node whose world bounds overlap the box, without duplicates
    pub fn query_bounds(&mut self, bounds: &Aabb) -> Vec<&SceneNode<T>> {
        self.ensure_fresh();

        let nodes = &self.nodes;
        self.bvh
            .query_bounds(bounds, |id| nodes.get(id).map(|n| n.world_bounds()))
            .into_iter()
            .filter_map(|id| nodes.get(id))
            .collect()
    }

    /// Union of all node bounds, or `None` when the index is empty
    pub fn root_bounds(&mut self) -> Option<Aabb> {
        self.ensure_fresh();
        self.bvh.root_bounds()
    }

    /// Drop all nodes and the hierarchy
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.bvh.clear();
        self.freshness = Freshness::Fresh;
    }

    fn ensure_fresh(&mut self) {
        if self.freshness == Freshness::Stale {
            self.rebuild();
        }
    }
}

impl<T> Default for SpatialIndex<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> SpatialIndex<u32> {
        SpatialIndex::new()
    }

    fn desc() -> NodeDesc<u32> {
        NodeDesc::new()
    }

    #[test]
    fn test_empty_scene_queries() {
        let mut index = index();
        assert!(index.cast_ray(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z).is_none());
        assert!(index.query_bounds(&Aabb::new(Vec3::splat(-100.0), Vec3::splat(100.0))).is_empty());
        assert!(index.root_bounds().is_none());
        assert!(index.is_empty());
    }

    #[test]
    fn test_single_node_ray_hit() {
        let mut index = index();
        index.add("cube", desc()).unwrap();

        let hit = index.cast_ray(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z).unwrap();
        assert_eq!(hit.node.id(), "cube");
        assert!((hit.distance - 4.5).abs() < 1e-5);
        assert!((hit.point - Vec3::new(0.0, 0.0, 0.5)).length() < 1e-5);
    }

    #[test]
    fn test_single_node_ray_miss() {
        let mut index = index();
        index.add("cube", desc()).unwrap();
        assert!(index.cast_ray(Vec3::new(10.0, 10.0, 10.0), Vec3::X).is_none());
    }

    #[test]
    fn test_unnormalized_direction_still_gives_world_distance() {
        let mut index = index();
        index.add("cube", desc()).unwrap();

        let hit = index.cast_ray(Vec3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 0.0, -10.0)).unwrap();
        assert!((hit.distance - 4.5).abs() < 1e-5);
    }

    #[test]
    fn test_degenerate_direction_misses() {
        let mut index = index();
        index.add("cube", desc()).unwrap();
        assert!(index.cast_ray(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO).is_none());
    }

    #[test]
    fn test_duplicate_id_is_rejected() {
        let mut index = index();
        index.add("a", desc()).unwrap();
        let err = index.add("a", desc()).unwrap_err();
        assert!(matches!(err, SpatialError::DuplicateId(id) if id == "a"));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_get_unknown_is_none() {
        let index = index();
        assert!(index.get("ghost").is_none());
    }

    #[test]
    fn test_region_completeness() {
        let mut index = index();
        index.add("a", desc()).unwrap();
        index.add("b", desc().with_position(Vec3::new(5.0, 0.0, 0.0))).unwrap();
        index.add("c", desc().with_position(Vec3::new(0.0, -7.0, 3.0))).unwrap();
        index.add("d", desc().with_position(Vec3::new(-2.0, 4.0, -9.0))).unwrap();

        let everything = Aabb::new(Vec3::splat(-100.0), Vec3::splat(100.0));
        let mut hits: Vec<&str> = index
            .query_bounds(&everything)
            .into_iter()
            .map(|n| n.id())
            .collect();
        hits.sort_unstable();
        hits.dedup();
        assert_eq!(hits, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_query_bounds_touching_counts() {
        let mut index = index();
        index.add("a", desc()).unwrap();

        // Query box touching the node's face at x = 0.5
        let query = Aabb::new(Vec3::new(0.5, -0.5, -0.5), Vec3::new(2.0, 0.5, 0.5));
        let hits = index.query_bounds(&query);
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_removal() {
        let mut index = index();
        index.add("a", desc()).unwrap();
        index.add("b", desc().with_position(Vec3::new(5.0, 0.0, 0.0))).unwrap();

        assert!(index.remove("a"));
        assert!(!index.remove("a"));
        assert!(index.get("a").is_none());

        let everything = Aabb::new(Vec3::splat(-100.0), Vec3::splat(100.0));
        let hits: Vec<&str> = index.query_bounds(&everything).into_iter().map(|n| n.id()).collect();
        assert_eq!(hits, vec!["b"]);

        let hit = index.cast_ray(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z);
        assert!(hit.is_none());
    }

    #[test]
    fn test_update_moves_node() {
        let mut index = index();
        index.add("a", desc()).unwrap();
        assert!(index.cast_ray(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z).is_some());

        let updated = index
            .update("a", NodePatch::new().with_position(Vec3::new(10.0, 0.0, 0.0)))
            .unwrap();
        assert!((updated.world_bounds().center().x - 10.0).abs() < 1e-5);

        assert!(index.cast_ray(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z).is_none());
        let hit = index.cast_ray(Vec3::new(10.0, 0.0, 5.0), Vec3::NEG_Z).unwrap();
        assert_eq!(hit.node.id(), "a");
    }

    #[test]
    fn test_update_unknown_is_none() {
        let mut index = index();
        assert!(index.update("ghost", NodePatch::new().with_position(Vec3::ZERO)).is_none());
    }

    #[test]
    fn test_update_payload_only() {
        let mut index = index();
        index.add("a", desc().with_payload(1)).unwrap();
        index.rebuild();

        let updated = index.update("a", NodePatch::new().with_payload(2)).unwrap();
        assert_eq!(updated.payload(), Some(&2));

        // Geometry untouched, queries unchanged
        let hit = index.cast_ray(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z).unwrap();
        assert_eq!(hit.node.payload(), Some(&2));
    }

    #[test]
    fn test_rebuild_idempotence() {
        let mut index = index();
        index.add("a", desc()).unwrap();
        index.add("b", desc().with_position(Vec3::new(3.0, 1.0, 0.0))).unwrap();
        index.add("c", desc().with_position(Vec3::new(-2.0, 0.0, 4.0))).unwrap();

        let battery = |index: &mut SpatialIndex<u32>| {
            let ray_hit = index
                .cast_ray(Vec3::new(0.0, 0.0, 10.0), Vec3::NEG_Z)
                .map(|h| (h.node.id().to_string(), h.distance));
            let everything = Aabb::new(Vec3::splat(-50.0), Vec3::splat(50.0));
            let mut region: Vec<String> = index
                .query_bounds(&everything)
                .into_iter()
                .map(|n| n.id().to_string())
                .collect();
            region.sort_unstable();
            let root = index.root_bounds();
            (ray_hit, region, root)
        };

        index.rebuild();
        let first = battery(&mut index);
        index.rebuild();
        let second = battery(&mut index);
        assert_eq!(first, second);
    }

    #[test]
    fn test_overlapping_nodes_split_across_branches() {
        let mut index = index();
        // World bounds [-1, 1] and [0, 1] on X: overlapping, but their
        // centers differ so the median split separates them
        index.add("wide", desc().with_scale(Vec3::new(2.0, 2.0, 2.0))).unwrap();
        index.add("offset", desc().with_position(Vec3::new(0.5, 0.0, 0.0))).unwrap();

        let query = Aabb::new(Vec3::new(-0.1, -0.1, -0.1), Vec3::new(0.1, 0.1, 0.1));
        let mut hits: Vec<&str> = index.query_bounds(&query).into_iter().map(|n| n.id()).collect();
        hits.sort_unstable();
        assert_eq!(hits, vec!["offset", "wide"]);

        // Ray along +X enters "wide" at x = -1 before "offset" at x = 0
        let hit = index.cast_ray(Vec3::new(-5.0, 0.0, 0.0), Vec3::X).unwrap();
        assert_eq!(hit.node.id(), "wide");
        assert!((hit.distance - 4.0).abs() < 1e-5);
    }

    #[test]
    fn test_root_bounds_is_union_of_world_bounds() {
        let mut index = index();
        index.add("a", desc()).unwrap();
        index.add("b", desc().with_position(Vec3::new(10.0, 0.0, 0.0))).unwrap();

        let root = index.root_bounds().unwrap();
        assert!((root.min.x - -0.5).abs() < 1e-5);
        assert!((root.max.x - 10.5).abs() < 1e-5);
    }

    #[test]
    fn test_clear() {
        let mut index = index();
        index.add("a", desc()).unwrap();
        index.clear();
        assert!(index.is_empty());
        assert!(index.root_bounds().is_none());
        assert!(index.cast_ray(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z).is_none());
    }

    #[test]
    fn test_add_returns_node_with_world_bounds() {
        let mut index = index();
        let node = index
            .add("a", desc().with_position(Vec3::new(2.0, 0.0, 0.0)))
            .unwrap();
        assert_eq!(node.id(), "a");
        assert!((node.world_bounds().center().x - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_nodes_snapshot() {
        let mut index = index();
        index.add("b", desc()).unwrap();
        index.add("a", desc()).unwrap();
        let ids: Vec<&str> = index.nodes().map(|n| n.id()).collect();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&"a") && ids.contains(&"b"));
    }
}
