//! # Tracked Visuals
//!
//! Keeps a set of owned visual instances in sync with entities reported by
//! an external tracking subsystem (detected planes, reference images,
//! anchors, faces).
//!
//! ## Features
//!
//! - **Batched lifecycle**: added/updated/removed notifications applied in one pass
//! - **Template selection**: keyed templates with a default fallback
//! - **Template swapping**: replace a template at runtime without losing entity state
//! - **Pluggable backends**: anything implementing [`visual::VisualBackend`]
//! - **File configuration**: TOML or RON manager configuration
//!
//! ## Quick Start
//!
//! ```rust
//! use tracked_visuals::prelude::*;
//!
//! let scene = SceneArena::new();
//! let root = scene.root();
//! let config = ManagerConfig::new()
//!     .with_template("plane", VisualTemplate::new("plane_quad"))
//!     .with_default_template("plane");
//! let manager = TrackedEntityVisualManager::from_config(scene, &config, root)?;
//!
//! let source = ScriptedTrackingSource::new([TrackablesChanged::new()
//!     .with_added(TrackableRecord::new(7, Pose::identity()).with_extent(1.0, 2.0))]);
//! let mut session = TrackingSession::new(source);
//! session.attach(manager);
//! session.pump();
//!
//! let manager = session.observer().expect("attached");
//! assert_eq!(manager.len(), 1);
//! # Ok::<(), ConfigError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod foundation;
pub mod manager;
pub mod templates;
pub mod tracking;
pub mod visual;

/// Common imports for crate users
pub mod prelude {
    pub use crate::{
        config::{Config, ConfigError, ManagerConfig},
        foundation::math::{Pose, Transform, Vec2, Vec3},
        manager::{ManagerStats, TrackedEntityVisualManager, VisualBinding},
        templates::{PrefabSelector, ScaleMode, TemplateKey, VisualTemplate},
        tracking::{
            Classification, ScriptedTrackingSource, SessionId, TrackableId, TrackableRecord, TrackablesChanged,
            TrackablesObserver, TrackingSession, TrackingSource, TrackingState,
        },
        visual::{AttachmentPoint, Color, SceneArena, VisualBackend, VisualError, VisualHandle, VisualStyle},
    };
}
