//! Scene nodes tracked by the spatial index

use atlas_math::{Aabb, Vec3};

/// Construction options for a scene node
///
/// Defaults to an identity transform, unit-cube local bounds, and no
/// payload.
#[derive(Clone, Debug)]
pub struct NodeDesc<T> {
    pub position: Vec3,
    /// Euler angles in degrees, applied about X, then Y, then Z
    pub rotation: Vec3,
    /// Non-uniform scale; zero or negative components are not validated
    pub scale: Vec3,
    /// Object-space bounds, typically reduced from mesh vertex data
    pub local_bounds: Aabb,
    pub payload: Option<T>,
}

impl<T> Default for NodeDesc<T> {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
            local_bounds: Aabb::unit_cube(),
            payload: None,
        }
    }
}

impl<T> NodeDesc<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn with_rotation(mut self, rotation: Vec3) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_local_bounds(mut self, local_bounds: Aabb) -> Self {
        self.local_bounds = local_bounds;
        self
    }

    pub fn with_payload(mut self, payload: T) -> Self {
        self.payload = Some(payload);
        self
    }
}

/// Partial update applied by [`SpatialIndex::update`]
///
/// Only the supplied fields are touched. Supplying a payload replaces
/// the previous one.
///
/// [`SpatialIndex::update`]: crate::index::SpatialIndex::update
#[derive(Clone, Debug)]
pub struct NodePatch<T> {
    pub position: Option<Vec3>,
    pub rotation: Option<Vec3>,
    pub scale: Option<Vec3>,
    pub local_bounds: Option<Aabb>,
    pub payload: Option<T>,
}

impl<T> Default for NodePatch<T> {
    fn default() -> Self {
        Self {
            position: None,
            rotation: None,
            scale: None,
            local_bounds: None,
            payload: None,
        }
    }
}

impl<T> NodePatch<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = Some(position);
        self
    }

    pub fn with_rotation(mut self, rotation: Vec3) -> Self {
        self.rotation = Some(rotation);
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = Some(scale);
        self
    }

    pub fn with_local_bounds(mut self, local_bounds: Aabb) -> Self {
        self.local_bounds = Some(local_bounds);
        self
    }

    pub fn with_payload(mut self, payload: T) -> Self {
        self.payload = Some(payload);
        self
    }

    /// True if any field affecting world bounds is present
    pub(crate) fn changes_geometry(&self) -> bool {
        self.position.is_some()
            || self.rotation.is_some()
            || self.scale.is_some()
            || self.local_bounds.is_some()
    }
}

/// A scene object tracked by the spatial index
///
/// The world bounds are derived state and are recomputed eagerly on
/// every transform or local-bounds change; there is no dirty window
/// between a setter call and the next read. The payload is opaque to
/// the index and owned by the caller.
#[derive(Clone, Debug)]
pub struct SceneNode<T> {
    id: String,
    position: Vec3,
    rotation: Vec3,
    scale: Vec3,
    local_bounds: Aabb,
    world_bounds: Aabb,
    payload: Option<T>,
}

impl<T> SceneNode<T> {
    pub(crate) fn new(id: String, desc: NodeDesc<T>) -> Self {
        let world_bounds = desc
            .local_bounds
            .transform(desc.position, desc.rotation, desc.scale);
        Self {
            id,
            position: desc.position,
            rotation: desc.rotation,
            scale: desc.scale,
            local_bounds: desc.local_bounds,
            world_bounds,
            payload: desc.payload,
        }
    }

    /// Caller-supplied identifier, unique within one index
    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[inline]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Euler angles in degrees
    #[inline]
    pub fn rotation(&self) -> Vec3 {
        self.rotation
    }

    #[inline]
    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    #[inline]
    pub fn local_bounds(&self) -> Aabb {
        self.local_bounds
    }

    /// Local bounds under the current transform, always consistent
    #[inline]
    pub fn world_bounds(&self) -> Aabb {
        self.world_bounds
    }

    #[inline]
    pub fn payload(&self) -> Option<&T> {
        self.payload.as_ref()
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.refresh_world_bounds();
    }

    pub fn set_rotation(&mut self, rotation: Vec3) {
        self.rotation = rotation;
        self.refresh_world_bounds();
    }

    pub fn set_scale(&mut self, scale: Vec3) {
        self.scale = scale;
        self.refresh_world_bounds();
    }

    pub fn set_local_bounds(&mut self, local_bounds: Aabb) {
        self.local_bounds = local_bounds;
        self.refresh_world_bounds();
    }

    pub fn set_payload(&mut self, payload: T) {
        self.payload = Some(payload);
    }

    fn refresh_world_bounds(&mut self) {
        self.world_bounds = self
            .local_bounds
            .transform(self.position, self.rotation, self.scale);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(desc: NodeDesc<()>) -> SceneNode<()> {
        SceneNode::new("n".into(), desc)
    }

    #[test]
    fn test_default_world_bounds_is_unit_cube_at_origin() {
        let n = node(NodeDesc::new());
        let wb = n.world_bounds();
        assert!((wb.min - Vec3::splat(-0.5)).length() < 1e-6);
        assert!((wb.max - Vec3::splat(0.5)).length() < 1e-6);
    }

    #[test]
    fn test_world_bounds_computed_at_construction() {
        let n = node(NodeDesc::new().with_position(Vec3::new(4.0, 0.0, 0.0)));
        assert!((n.world_bounds().center().x - 4.0).abs() < 1e-6);
    }

    #[test]
    fn test_setters_refresh_world_bounds_eagerly() {
        let mut n = node(NodeDesc::new());
        n.set_position(Vec3::new(0.0, 10.0, 0.0));
        assert!((n.world_bounds().center().y - 10.0).abs() < 1e-6);

        n.set_scale(Vec3::new(2.0, 2.0, 2.0));
        assert!((n.world_bounds().size().x - 2.0).abs() < 1e-5);

        n.set_local_bounds(Aabb::new(Vec3::ZERO, Vec3::ONE));
        assert!((n.world_bounds().size().x - 2.0).abs() < 1e-5);
        assert!((n.world_bounds().min.y - 10.0).abs() < 1e-5);
    }

    #[test]
    fn test_rotation_produces_conservative_world_bounds() {
        let mut n = node(NodeDesc::new());
        n.set_rotation(Vec3::new(0.0, 45.0, 0.0));
        let expected = core::f32::consts::SQRT_2;
        assert!((n.world_bounds().size().x - expected).abs() < 1e-5);
        assert!((n.world_bounds().size().y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_payload_round_trip() {
        let mut n = SceneNode::new("n".into(), NodeDesc::new().with_payload(7u32));
        assert_eq!(n.payload(), Some(&7));
        n.set_payload(9);
        assert_eq!(n.payload(), Some(&9));
    }

    #[test]
    fn test_patch_geometry_detection() {
        let patch: NodePatch<()> = NodePatch::new().with_position(Vec3::ZERO);
        assert!(patch.changes_geometry());
        let patch: NodePatch<u32> = NodePatch::new().with_payload(1);
        assert!(!patch.changes_geometry());
    }
}
