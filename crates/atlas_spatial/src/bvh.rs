//! Bounding volume hierarchy over node world bounds
//!
//! Flat arena of nodes with index links, rebuilt in full on demand.
//! Construction is a median split: sort by world-bounds center on an
//! axis that cycles X, Y, Z with tree depth, divide at the midpoint.

use atlas_math::{Aabb, Ray, Vec3};

/// Arena node; leaves carry the scene node's id
#[derive(Clone, Debug)]
struct BvhNode {
    bounds: Aabb,
    key: Option<String>,
    left: Option<usize>,
    right: Option<usize>,
}

/// Binary BVH stored in one contiguous buffer
#[derive(Clone, Debug, Default)]
pub(crate) struct Bvh {
    nodes: Vec<BvhNode>,
    root: Option<usize>,
}

impl Bvh {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
    }

    pub(crate) fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Box of the whole hierarchy, the union of every leaf's bounds
    pub(crate) fn root_bounds(&self) -> Option<Aabb> {
        self.root.map(|r| self.nodes[r].bounds)
    }

    /// Rebuild from scratch over `(id, world bounds, bounds center)` items
    pub(crate) fn build(&mut self, items: &mut [(String, Aabb, Vec3)]) {
        self.nodes.clear();

        if items.is_empty() {
            self.root = None;
            return;
        }

        let root = self.build_recursive(items, 0);
        self.root = Some(root);
    }

    fn build_recursive(&mut self, items: &mut [(String, Aabb, Vec3)], depth: usize) -> usize {
        let node_index = self.nodes.len();

        if items.len() == 1 {
            let (key, bounds, _) = &items[0];
            self.nodes.push(BvhNode {
                bounds: *bounds,
                key: Some(key.clone()),
                left: None,
                right: None,
            });
            return node_index;
        }

        let bounds = items
            .iter()
            .fold(Aabb::EMPTY, |acc, (_, b, _)| acc.merge(b));

        // Split axis cycles with depth rather than following extent
        let axis = depth % 3;
        items.sort_by(|a, b| {
            a.2.axis(axis)
                .partial_cmp(&b.2.axis(axis))
                .unwrap_or(core::cmp::Ordering::Equal)
        });

        let mid = items.len() / 2;
        let (left_items, right_items) = items.split_at_mut(mid);

        // Reserve the slot, then patch the child links in
        self.nodes.push(BvhNode {
            bounds,
            key: None,
            left: None,
            right: None,
        });

        let left = self.build_recursive(left_items, depth + 1);
        let right = self.build_recursive(right_items, depth + 1);

        self.nodes[node_index].left = Some(left);
        self.nodes[node_index].right = Some(right);

        node_index
    }

    /// Closest ray hit over live node bounds
    ///
    /// Depth-first, front-to-back: children are visited nearer-first and
    /// a subtree is pruned once its entry distance cannot beat the
    /// running closest hit. Leaves re-test the live bounds supplied by
    /// `live_bounds`, not the cached box.
    pub(crate) fn cast_ray<F>(&self, ray: &Ray, live_bounds: F) -> Option<(&str, f32)>
    where
        F: Fn(&str) -> Option<Aabb>,
    {
        let root = self.root?;
        let mut best: Option<(&str, f32)> = None;
        self.cast_ray_recursive(root, ray, &live_bounds, &mut best);
        best
    }

    fn cast_ray_recursive<'a, F>(
        &'a self,
        node_idx: usize,
        ray: &Ray,
        live_bounds: &F,
        best: &mut Option<(&'a str, f32)>,
    ) where
        F: Fn(&str) -> Option<Aabb>,
    {
        let node = &self.nodes[node_idx];

        let entry = match node.bounds.intersects_ray(ray.origin, ray.direction) {
            Some(t) => t,
            None => return,
        };
        if let Some((_, closest)) = *best {
            if entry > closest {
                return;
            }
        }

        if let Some(key) = &node.key {
            if let Some(bounds) = live_bounds(key) {
                if let Some(t) = bounds.intersects_ray(ray.origin, ray.direction) {
                    if best.map_or(true, |(_, closest)| t < closest) {
                        *best = Some((key.as_str(), t));
                    }
                }
            }
            return;
        }

        let (left, right) = match (node.left, node.right) {
            (Some(l), Some(r)) => (l, r),
            _ => return,
        };

        let t_left = self.nodes[left].bounds.intersects_ray(ray.origin, ray.direction);
        let t_right = self.nodes[right].bounds.intersects_ray(ray.origin, ray.direction);

        match (t_left, t_right) {
            (Some(tl), Some(tr)) => {
                // Strict < so an equal-distance pair descends right first
                if tl < tr {
                    self.cast_ray_recursive(left, ray, live_bounds, best);
                    self.cast_ray_recursive(right, ray, live_bounds, best);
                } else {
                    self.cast_ray_recursive(right, ray, live_bounds, best);
                    self.cast_ray_recursive(left, ray, live_bounds, best);
                }
            }
            (Some(_), None) => self.cast_ray_recursive(left, ray, live_bounds, best),
            (None, Some(_)) => self.cast_ray_recursive(right, ray, live_bounds, best),
            (None, None) => {}
        }
    }

    /// All leaves whose live bounds overlap the query box
    pub(crate) fn query_bounds<'a, F>(&'a self, query: &Aabb, live_bounds: F) -> Vec<&'a str>
    where
        F: Fn(&str) -> Option<Aabb>,
    {
        let mut results = Vec::new();
        if let Some(root) = self.root {
            self.query_recursive(root, query, &live_bounds, &mut results);
        }
        results
    }

    fn query_recursive<'a, F>(
        &'a self,
        node_idx: usize,
        query: &Aabb,
        live_bounds: &F,
        results: &mut Vec<&'a str>,
    ) where
        F: Fn(&str) -> Option<Aabb>,
    {
        let node = &self.nodes[node_idx];

        if !node.bounds.intersects(query) {
            return;
        }

        if let Some(key) = &node.key {
            if let Some(bounds) = live_bounds(key) {
                if bounds.intersects(query) {
                    results.push(key.as_str());
                }
            }
            return;
        }

        if let Some(left) = node.left {
            self.query_recursive(left, query, live_bounds, results);
        }
        if let Some(right) = node.right {
            self.query_recursive(right, query, live_bounds, results);
        }
    }
}
