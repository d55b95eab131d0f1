//! Tracking data model
//!
//! Types describing what an external tracking runtime reports about the
//! entities it recognises, and the batched change notification it delivers
//! once per tracking frame.

pub mod source;

pub use source::{
    BatchSender, ChannelTrackingSource, ScriptedTrackingSource, TrackablesObserver,
    TrackingSession, TrackingSource,
};

use crate::foundation::math::{Pose, Vec2};
use crate::templates::TemplateKey;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier for a tracked entity, assigned by the tracking source
///
/// Ids are never reused within a session, so equality is identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct TrackableId {
    /// Upper 64 bits
    pub sub_id1: u64,
    /// Lower 64 bits
    pub sub_id2: u64,
}

impl TrackableId {
    /// Create an id from both halves
    pub const fn new(sub_id1: u64, sub_id2: u64) -> Self {
        Self { sub_id1, sub_id2 }
    }
}

impl From<u64> for TrackableId {
    fn from(value: u64) -> Self {
        Self::new(0, value)
    }
}

impl fmt::Display for TrackableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016X}-{:016X}", self.sub_id1, self.sub_id2)
    }
}

/// How well the tracking source currently knows an entity's pose
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TrackingState {
    /// Not tracked; pose and extent are stale
    None,
    /// Tracked with reduced quality
    Limited,
    /// Fully tracked
    #[default]
    Tracking,
}

impl TrackingState {
    /// Whether the entity's attributes can be trusted for display
    pub fn is_tracked(self) -> bool {
        !matches!(self, Self::None)
    }
}

impl fmt::Display for TrackingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::None => "None",
            Self::Limited => "Limited",
            Self::Tracking => "Tracking",
        };
        f.write_str(name)
    }
}

/// Category tag reported for an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Classification {
    /// Unclassified
    #[default]
    None,
    /// Vertical plane classified as a wall
    Wall,
    /// Horizontal plane classified as a floor
    Floor,
    /// Horizontal plane classified as a ceiling
    Ceiling,
    /// Horizontal plane classified as a table
    Table,
    /// Horizontal plane classified as a seat
    Seat,
    /// Vertical plane classified as a door
    Door,
    /// Vertical plane classified as a window
    Window,
    /// Detected reference image
    Image,
    /// Tracked face
    Face,
    /// User or session anchor
    Anchor,
    /// Hand joint
    HandJoint,
}

/// Identifier of the session that created an entity (anchors in shared sessions)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SessionId(pub [u8; 16]);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// Attributes reported for one entity at one update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackableRecord {
    /// Entity identifier
    pub id: TrackableId,
    /// Pose in session space
    #[serde(default)]
    pub pose: Pose,
    /// Width and height on the entity's tangent plane, when it has one
    #[serde(default)]
    pub extent: Option<Vec2>,
    /// Category tag
    #[serde(default)]
    pub classification: Classification,
    /// Tracking quality
    #[serde(default)]
    pub tracking_state: TrackingState,
    /// Template identifier (e.g. reference image GUID) used to pick a visual
    #[serde(default)]
    pub template_key: Option<TemplateKey>,
    /// Session that created the entity
    #[serde(default)]
    pub session_id: Option<SessionId>,
}

impl TrackableRecord {
    /// Create a tracked record with the given pose and no other attributes
    pub fn new(id: impl Into<TrackableId>, pose: Pose) -> Self {
        Self {
            id: id.into(),
            pose,
            extent: None,
            classification: Classification::None,
            tracking_state: TrackingState::Tracking,
            template_key: None,
            session_id: None,
        }
    }

    /// Set the 2D extent
    pub fn with_extent(mut self, width: f32, height: f32) -> Self {
        self.extent = Some(Vec2::new(width, height));
        self
    }

    /// Set the tracking state
    pub fn with_state(mut self, state: TrackingState) -> Self {
        self.tracking_state = state;
        self
    }

    /// Set the classification
    pub fn with_classification(mut self, classification: Classification) -> Self {
        self.classification = classification;
        self
    }

    /// Set the template key
    pub fn with_template(mut self, key: impl Into<TemplateKey>) -> Self {
        self.template_key = Some(key.into());
        self
    }

    /// Set the originating session
    pub fn with_session(mut self, session_id: SessionId) -> Self {
        self.session_id = Some(session_id);
        self
    }
}

/// One batched change notification from a tracking source
///
/// Sources are expected to keep the three collections disjoint; the manager
/// resolves violations with removed > added > updated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackablesChanged {
    /// Entities seen for the first time
    #[serde(default)]
    pub added: Vec<TrackableRecord>,
    /// Entities whose attributes changed
    #[serde(default)]
    pub updated: Vec<TrackableRecord>,
    /// Entities no longer tracked
    #[serde(default)]
    pub removed: Vec<TrackableId>,
}

impl TrackablesChanged {
    /// Create an empty batch
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record to `added`
    pub fn with_added(mut self, record: TrackableRecord) -> Self {
        self.added.push(record);
        self
    }

    /// Add a record to `updated`
    pub fn with_updated(mut self, record: TrackableRecord) -> Self {
        self.updated.push(record);
        self
    }

    /// Add an id to `removed`
    pub fn with_removed(mut self, id: impl Into<TrackableId>) -> Self {
        self.removed.push(id.into());
        self
    }

    /// Whether the batch carries no changes
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }

    /// Total number of entries across the three collections
    pub fn len(&self) -> usize {
        self.added.len() + self.updated.len() + self.removed.len()
    }
}
