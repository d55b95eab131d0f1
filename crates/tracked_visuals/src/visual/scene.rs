//! In-memory scene arena
//!
//! [`SceneArena`] is a [`VisualBackend`] that keeps every visual instance and
//! attachment point in slot maps. It stands in for a renderer-owned scene
//! graph: hosts without one can read node state back for drawing, and tests
//! use it to observe exactly what the manager did.

use super::{Color, VisualBackend, VisualError, VisualResult};
use crate::foundation::collections::{AttachmentPoint, HandleMap, VisualHandle};
use crate::foundation::math::{Pose, Transform, Vec3};
use crate::templates::VisualTemplate;
use log::trace;

/// State of one visual instance
#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    /// Name of the template the node was created from
    pub template_name: String,
    /// Parent attachment point
    pub attachment: AttachmentPoint,
    /// Pose relative to the attachment point
    pub pose: Pose,
    /// Local scale
    pub scale: Vec3,
    /// Whether the node is rendered
    pub visible: bool,
    /// Material colour
    pub color: Color,
    /// Info label
    pub label: Option<String>,
}

impl SceneNode {
    /// Local transform relative to the attachment point
    pub fn local_transform(&self) -> Transform {
        Transform::from_pose(&self.pose, self.scale)
    }
}

#[derive(Debug, Clone)]
struct AttachmentNode {
    parent: Option<AttachmentPoint>,
    transform: Transform,
}

/// Slot-map backed scene holding visual instances under attachment points
#[derive(Debug)]
pub struct SceneArena {
    nodes: HandleMap<VisualHandle, SceneNode>,
    attachments: HandleMap<AttachmentPoint, AttachmentNode>,
    root: AttachmentPoint,
    capacity: Option<usize>,
    instantiated: u64,
    destroyed: u64,
}

impl SceneArena {
    /// Create an empty scene with a root attachment point and no capacity limit
    pub fn new() -> Self {
        let mut attachments = HandleMap::with_key();
        let root = attachments.insert(AttachmentNode {
            parent: None,
            transform: Transform::identity(),
        });
        Self {
            nodes: HandleMap::with_key(),
            attachments,
            root,
            capacity: None,
            instantiated: 0,
            destroyed: 0,
        }
    }

    /// Create a scene that refuses to hold more than `capacity` instances
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: Some(capacity),
            ..Self::new()
        }
    }

    /// The root attachment point (session origin)
    pub fn root(&self) -> AttachmentPoint {
        self.root
    }

    /// Create a child attachment point with a local transform
    pub fn create_attachment(&mut self, parent: AttachmentPoint, transform: Transform) -> VisualResult<AttachmentPoint> {
        if !self.attachments.contains_key(parent) {
            return Err(VisualError::UnknownAttachment(parent));
        }
        Ok(self.attachments.insert(AttachmentNode {
            parent: Some(parent),
            transform,
        }))
    }

    /// State of a live node
    pub fn node(&self, handle: VisualHandle) -> Option<&SceneNode> {
        self.nodes.get(handle)
    }

    /// Whether `handle` refers to a live node
    pub fn contains(&self, handle: VisualHandle) -> bool {
        self.nodes.contains_key(handle)
    }

    /// Iterate over live nodes
    pub fn nodes(&self) -> impl Iterator<Item = (VisualHandle, &SceneNode)> {
        self.nodes.iter()
    }

    /// Number of live nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether no nodes are alive
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of live nodes that are visible
    pub fn visible_count(&self) -> usize {
        self.nodes.values().filter(|node| node.visible).count()
    }

    /// Total nodes ever instantiated
    pub fn instantiated_count(&self) -> u64 {
        self.instantiated
    }

    /// Total nodes ever destroyed
    pub fn destroyed_count(&self) -> u64 {
        self.destroyed
    }

    /// World transform of a node, composed through its attachment chain
    pub fn world_transform(&self, handle: VisualHandle) -> Option<Transform> {
        let node = self.nodes.get(handle)?;
        let mut transform = node.local_transform();
        let mut current = Some(node.attachment);
        while let Some(point) = current {
            let attachment = self.attachments.get(point)?;
            transform = attachment.transform.combine(&transform);
            current = attachment.parent;
        }
        Some(transform)
    }

    fn node_mut(&mut self, handle: VisualHandle) -> VisualResult<&mut SceneNode> {
        self.nodes.get_mut(handle).ok_or(VisualError::StaleHandle(handle))
    }
}

impl Default for SceneArena {
    fn default() -> Self {
        Self::new()
    }
}

impl VisualBackend for SceneArena {
    fn instantiate(&mut self, template: &VisualTemplate, attachment: AttachmentPoint) -> VisualResult<VisualHandle> {
        if !self.attachments.contains_key(attachment) {
            return Err(VisualError::UnknownAttachment(attachment));
        }
        if let Some(capacity) = self.capacity {
            if self.nodes.len() >= capacity {
                return Err(VisualError::CapacityExhausted {
                    active: self.nodes.len(),
                    capacity,
                });
            }
        }

        let handle = self.nodes.insert(SceneNode {
            template_name: template.name.clone(),
            attachment,
            pose: Pose::identity(),
            scale: template.base_scale,
            visible: true,
            color: template.tint.unwrap_or_default(),
            label: None,
        });
        self.instantiated += 1;
        trace!("Instantiated '{}' as {:?}", template.name, handle);
        Ok(handle)
    }

    fn set_pose(&mut self, handle: VisualHandle, pose: &Pose) -> VisualResult<()> {
        self.node_mut(handle)?.pose = *pose;
        Ok(())
    }

    fn set_scale(&mut self, handle: VisualHandle, scale: Vec3) -> VisualResult<()> {
        self.node_mut(handle)?.scale = scale;
        Ok(())
    }

    fn set_visible(&mut self, handle: VisualHandle, visible: bool) -> VisualResult<()> {
        self.node_mut(handle)?.visible = visible;
        Ok(())
    }

    fn set_color(&mut self, handle: VisualHandle, color: Color) -> VisualResult<()> {
        self.node_mut(handle)?.color = color;
        Ok(())
    }

    fn set_label(&mut self, handle: VisualHandle, label: Option<&str>) -> VisualResult<()> {
        self.node_mut(handle)?.label = label.map(str::to_owned);
        Ok(())
    }

    fn destroy(&mut self, handle: VisualHandle) -> VisualResult<()> {
        self.nodes.remove(handle).ok_or(VisualError::StaleHandle(handle))?;
        self.destroyed += 1;
        trace!("Destroyed {:?}", handle);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_instantiate_uses_template_defaults() {
        let mut scene = SceneArena::new();
        let template = VisualTemplate::new("quad").with_base_scale(Vec3::new(2.0, 2.0, 2.0));
        let handle = scene.instantiate(&template, scene.root()).expect("instantiate");

        let node = scene.node(handle).expect("live node");
        assert_eq!(node.template_name, "quad");
        assert_eq!(node.scale, Vec3::new(2.0, 2.0, 2.0));
        assert!(node.visible);
        assert_eq!(scene.len(), 1);
        assert_eq!(scene.instantiated_count(), 1);
    }

    #[test]
    fn test_destroyed_handle_is_stale() {
        let mut scene = SceneArena::new();
        let handle = scene.instantiate(&VisualTemplate::new("quad"), scene.root()).expect("instantiate");

        scene.destroy(handle).expect("destroy");
        assert!(!scene.contains(handle));
        assert_eq!(scene.destroy(handle), Err(VisualError::StaleHandle(handle)));
        assert_eq!(scene.set_visible(handle, false), Err(VisualError::StaleHandle(handle)));
        assert_eq!(scene.destroyed_count(), 1);
    }

    #[test]
    fn test_capacity_limit() {
        let mut scene = SceneArena::with_capacity(1);
        let template = VisualTemplate::new("quad");
        scene.instantiate(&template, scene.root()).expect("first fits");

        let err = scene.instantiate(&template, scene.root()).expect_err("second exceeds capacity");
        assert_eq!(err, VisualError::CapacityExhausted { active: 1, capacity: 1 });
    }

    #[test]
    fn test_unknown_attachment_rejected() {
        let mut scene = SceneArena::new();
        let mut other = SceneArena::new();
        let foreign = other
            .create_attachment(other.root(), Transform::identity())
            .expect("attachment");

        let result = scene.instantiate(&VisualTemplate::new("quad"), foreign);
        assert_eq!(result, Err(VisualError::UnknownAttachment(foreign)));
    }

    #[test]
    fn test_world_transform_follows_attachment_chain() {
        let mut scene = SceneArena::new();
        let offset = Transform {
            position: Vec3::new(0.0, 0.0, 5.0),
            ..Transform::identity()
        };
        let attachment = scene.create_attachment(scene.root(), offset).expect("attachment");
        let handle = scene.instantiate(&VisualTemplate::new("quad"), attachment).expect("instantiate");
        scene
            .set_pose(handle, &Pose::from_position(Vec3::new(1.0, 0.0, 0.0)))
            .expect("set pose");

        let world = scene.world_transform(handle).expect("world transform");
        assert_relative_eq!(world.position, Vec3::new(1.0, 0.0, 5.0));
    }

    #[test]
    fn test_setters_update_node() {
        let mut scene = SceneArena::new();
        let handle = scene.instantiate(&VisualTemplate::new("quad"), scene.root()).expect("instantiate");
        let red = Color::new(1.0, 0.0, 0.0, 1.0);

        scene.set_scale(handle, Vec3::new(0.5, 1.0, 0.5)).expect("scale");
        scene.set_color(handle, red).expect("color");
        scene.set_label(handle, Some("hello")).expect("label");
        scene.set_visible(handle, false).expect("visible");

        let node = scene.node(handle).expect("live node");
        assert_eq!(node.scale, Vec3::new(0.5, 1.0, 0.5));
        assert_eq!(node.color, red);
        assert_eq!(node.label.as_deref(), Some("hello"));
        assert!(!node.visible);
        assert_eq!(scene.visible_count(), 0);
    }
}
