//! Pure derivations from a tracked record to visual attributes
//!
//! Everything here is a function of the record, the template and the style
//! configuration; the manager applies the results to the backend.

use crate::foundation::math::{Vec2, Vec3};
use crate::templates::ScaleMode;
use crate::tracking::{Classification, SessionId, TrackableRecord, TrackingState};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// Scale on the axis perpendicular to an entity's tangent plane
pub const PERPENDICULAR_SCALE: f32 = 1.0;

/// Linear RGBA colour
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    /// Red
    pub r: f32,
    /// Green
    pub g: f32,
    /// Blue
    pub b: f32,
    /// Alpha
    pub a: f32,
}

impl Color {
    /// Opaque white
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);

    /// Create a colour from float channels
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Create a colour from 8-bit channels
    pub fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self::new(
            f32::from(r) / 255.0,
            f32::from(g) / 255.0,
            f32::from(b) / 255.0,
            f32::from(a) / 255.0,
        )
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

/// Colour override for one classification
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassificationColor {
    /// Classification the colour applies to
    pub classification: Classification,
    /// Colour used while the entity is tracked
    pub color: Color,
}

/// Colours and overlays applied to every bound visual
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualStyle {
    /// Colour while fully tracked
    pub tracking_color: Color,
    /// Colour while tracking is limited
    pub limited_color: Color,
    /// Colour while not tracked
    pub none_color: Color,
    /// Per-classification overrides, applied while tracked
    pub classification_colors: Vec<ClassificationColor>,
    /// Whether to write an info label onto each visual
    pub show_labels: bool,
}

impl Default for VisualStyle {
    fn default() -> Self {
        Self {
            tracking_color: Color::from_rgba8(253, 184, 19, 84),
            limited_color: Color::from_rgba8(75, 75, 75, 84),
            none_color: Color::from_rgba8(75, 75, 75, 84),
            classification_colors: Vec::new(),
            show_labels: false,
        }
    }
}

impl VisualStyle {
    /// Enable or disable info labels
    pub fn with_labels(mut self, show_labels: bool) -> Self {
        self.show_labels = show_labels;
        self
    }

    /// Add a classification colour override
    pub fn with_classification_color(mut self, classification: Classification, color: Color) -> Self {
        self.classification_colors.retain(|entry| entry.classification != classification);
        self.classification_colors.push(ClassificationColor { classification, color });
        self
    }

    /// Colour for an entity in the given state
    ///
    /// Classification overrides only apply while the entity is tracked.
    pub fn color_for(&self, state: TrackingState, classification: Classification) -> Color {
        if state.is_tracked() {
            if let Some(entry) = self
                .classification_colors
                .iter()
                .find(|entry| entry.classification == classification)
            {
                return entry.color;
            }
        }
        match state {
            TrackingState::Tracking => self.tracking_color,
            TrackingState::Limited => self.limited_color,
            TrackingState::None => self.none_color,
        }
    }
}

/// Derive a visual's local scale from a tracked extent
///
/// Missing or degenerate extents (non-finite or not positive) keep the base
/// scale.
pub fn extent_to_scale(extent: Option<Vec2>, mode: ScaleMode, base_scale: Vec3) -> Vec3 {
    let Some(extent) = extent.filter(|e| e.iter().all(|v| v.is_finite() && *v > 0.0)) else {
        return base_scale;
    };

    match mode {
        ScaleMode::PlanarExtent => Vec3::new(extent.x, PERPENDICULAR_SCALE, extent.y),
        ScaleMode::UniformFromExtent => {
            let side = extent.x.min(extent.y) / 2.0;
            Vec3::new(side, side, side)
        }
        ScaleMode::Fixed => base_scale,
    }
}

/// Whether an entity was created by this device's session or a peer's
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOrigin {
    /// Created locally
    Local,
    /// Created by a remote participant
    Remote,
}

impl SessionOrigin {
    /// Classify `session` against the local session id
    ///
    /// Without a known local session everything counts as remote.
    pub fn classify(session: SessionId, local: Option<SessionId>) -> Self {
        if local == Some(session) {
            Self::Local
        } else {
            Self::Remote
        }
    }

    /// Label text
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Local => "Local",
            Self::Remote => "Remote",
        }
    }
}

/// Stable colour derived from a session id (bytes 0, 4, 8 and 12)
pub fn session_color(session: SessionId) -> Color {
    let bytes = session.0;
    Color::from_rgba8(bytes[0], bytes[4], bytes[8], bytes[12])
}

/// Multi-line info text for a tracked entity
pub fn info_label(record: &TrackableRecord, origin: Option<SessionOrigin>) -> String {
    let mut label = format!(
        "trackableId\n{}\ntrackingState: {}",
        record.id, record.tracking_state
    );
    if let Some(key) = &record.template_key {
        let _ = write!(label, "\ntemplate: {key}");
    }
    if let Some(extent) = record.extent {
        let _ = write!(label, "\nDetected size: {:.4}x{:.4}", extent.x, extent.y);
    }
    if let Some(origin) = origin {
        let _ = write!(label, "\nsession: {}", origin.as_str());
    }
    label
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Pose;
    use approx::assert_relative_eq;

    fn base() -> Vec3 {
        Vec3::new(0.01, 1.0, 0.01)
    }

    #[test]
    fn test_planar_extent_maps_to_xz() {
        let scale = extent_to_scale(Some(Vec2::new(0.3, 0.2)), ScaleMode::PlanarExtent, base());
        assert_relative_eq!(scale, Vec3::new(0.3, PERPENDICULAR_SCALE, 0.2));
    }

    #[test]
    fn test_uniform_extent_uses_half_of_smaller_side() {
        let scale = extent_to_scale(Some(Vec2::new(0.3, 0.2)), ScaleMode::UniformFromExtent, base());
        assert_relative_eq!(scale, Vec3::new(0.1, 0.1, 0.1));
    }

    #[test]
    fn test_fixed_and_missing_extent_keep_base() {
        assert_eq!(extent_to_scale(Some(Vec2::new(0.3, 0.2)), ScaleMode::Fixed, base()), base());
        assert_eq!(extent_to_scale(None, ScaleMode::PlanarExtent, base()), base());
    }

    #[test]
    fn test_degenerate_extent_keeps_base() {
        for extent in [
            Vec2::new(0.0, 1.0),
            Vec2::new(-1.0, 1.0),
            Vec2::new(f32::NAN, 1.0),
            Vec2::new(1.0, f32::INFINITY),
        ] {
            assert_eq!(extent_to_scale(Some(extent), ScaleMode::PlanarExtent, base()), base());
        }
    }

    #[test]
    fn test_color_for_state() {
        let style = VisualStyle::default();
        assert_eq!(style.color_for(TrackingState::Tracking, Classification::None), style.tracking_color);
        assert_eq!(style.color_for(TrackingState::Limited, Classification::None), style.limited_color);
        assert_eq!(style.color_for(TrackingState::None, Classification::None), style.none_color);
    }

    #[test]
    fn test_classification_override_only_while_tracked() {
        let red = Color::new(1.0, 0.0, 0.0, 1.0);
        let style = VisualStyle::default().with_classification_color(Classification::Floor, red);

        assert_eq!(style.color_for(TrackingState::Tracking, Classification::Floor), red);
        assert_eq!(style.color_for(TrackingState::Limited, Classification::Floor), red);
        assert_eq!(style.color_for(TrackingState::None, Classification::Floor), style.none_color);
        assert_eq!(style.color_for(TrackingState::Tracking, Classification::Wall), style.tracking_color);
    }

    #[test]
    fn test_session_color_and_origin() {
        let mut bytes = [0u8; 16];
        bytes[0] = 255;
        bytes[4] = 0;
        bytes[8] = 51;
        bytes[12] = 255;
        let session = SessionId(bytes);

        let color = session_color(session);
        assert_relative_eq!(color.r, 1.0);
        assert_relative_eq!(color.g, 0.0);
        assert_relative_eq!(color.b, 0.2);
        assert_relative_eq!(color.a, 1.0);

        assert_eq!(SessionOrigin::classify(session, Some(session)), SessionOrigin::Local);
        assert_eq!(SessionOrigin::classify(session, None), SessionOrigin::Remote);
    }

    #[test]
    fn test_info_label() {
        let record = TrackableRecord::new(1, Pose::identity())
            .with_extent(0.5, 0.25)
            .with_template("poster");
        let label = info_label(&record, Some(SessionOrigin::Remote));

        assert_eq!(
            label,
            "trackableId\n0000000000000000-0000000000000001\ntrackingState: Tracking\n\
             template: poster\nDetected size: 0.5000x0.2500\nsession: Remote"
        );
    }
}
