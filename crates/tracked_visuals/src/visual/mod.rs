//! Visual instance backend
//!
//! The manager never touches renderable objects directly. It asks a
//! [`VisualBackend`] to instantiate a template under an attachment point and
//! then drives the resulting instance through its [`VisualHandle`]. Handles
//! are arena indices with generation checks, so a destroyed instance can
//! never be confused with a later one.

pub mod scene;
pub mod style;

pub use crate::foundation::collections::{AttachmentPoint, VisualHandle};
pub use scene::{SceneArena, SceneNode};
pub use style::{Color, VisualStyle};

use crate::foundation::math::{Pose, Vec3};
use crate::templates::VisualTemplate;
use thiserror::Error;

/// Errors reported by a visual backend
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VisualError {
    /// The handle refers to a destroyed or never-created instance
    #[error("Visual handle {0:?} is stale")]
    StaleHandle(VisualHandle),

    /// The attachment point does not exist
    #[error("Attachment point {0:?} does not exist")]
    UnknownAttachment(AttachmentPoint),

    /// The backend cannot hold more instances
    #[error("Visual capacity exhausted: {active}/{capacity} instances active")]
    CapacityExhausted {
        /// Instances currently alive
        active: usize,
        /// Maximum instances
        capacity: usize,
    },

    /// Backend specific failure
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Result type for backend operations
pub type VisualResult<T> = Result<T, VisualError>;

/// Factory and owner of renderable visual instances
///
/// Implementations wrap whatever scene representation the host uses. Every
/// operation is synchronous and runs on the thread that owns the backend.
pub trait VisualBackend {
    /// Create an instance of `template` as a child of `attachment`
    fn instantiate(&mut self, template: &VisualTemplate, attachment: AttachmentPoint) -> VisualResult<VisualHandle>;

    /// Set the instance's pose relative to its attachment point
    fn set_pose(&mut self, handle: VisualHandle, pose: &Pose) -> VisualResult<()>;

    /// Set the instance's local scale
    fn set_scale(&mut self, handle: VisualHandle, scale: Vec3) -> VisualResult<()>;

    /// Enable or disable rendering of the instance
    fn set_visible(&mut self, handle: VisualHandle, visible: bool) -> VisualResult<()>;

    /// Set the instance's material colour
    fn set_color(&mut self, handle: VisualHandle, color: Color) -> VisualResult<()>;

    /// Set or clear the instance's info label
    fn set_label(&mut self, handle: VisualHandle, label: Option<&str>) -> VisualResult<()>;

    /// Destroy the instance; its handle becomes stale
    fn destroy(&mut self, handle: VisualHandle) -> VisualResult<()>;
}
