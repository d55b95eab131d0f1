//! Visual binding: one tracked entity paired with the instance that shows it

use crate::foundation::collections::{AttachmentPoint, VisualHandle};
use crate::foundation::math::{Pose, Vec2, Vec3};
use crate::templates::{TemplateKey, VisualTemplate};
use crate::tracking::{SessionId, TrackableId, TrackableRecord, TrackingState};
use crate::visual::style::{self, SessionOrigin};
use crate::visual::{Color, VisualBackend, VisualResult, VisualStyle};
use log::debug;
use std::sync::Arc;

/// Owned pairing of a trackable id and its visual instance
///
/// Holds the last record applied so a swapped-in instance can be brought to
/// the same state, and mirrors what was last pushed to the backend.
#[derive(Debug, Clone)]
pub struct VisualBinding {
    id: TrackableId,
    handle: VisualHandle,
    attachment: AttachmentPoint,
    template: Arc<VisualTemplate>,
    uses_default: bool,
    record: TrackableRecord,
    tracked_extent: Option<Vec2>,
    scale: Vec3,
    color: Color,
    visible: bool,
    label: Option<String>,
}

impl VisualBinding {
    /// Binding for a freshly instantiated visual, before any record is applied
    pub(crate) fn new(
        record: TrackableRecord,
        handle: VisualHandle,
        attachment: AttachmentPoint,
        template: Arc<VisualTemplate>,
        uses_default: bool,
    ) -> Self {
        Self {
            id: record.id,
            handle,
            attachment,
            scale: template.base_scale,
            color: template.tint.unwrap_or_default(),
            template,
            uses_default,
            record,
            tracked_extent: None,
            visible: true,
            label: None,
        }
    }

    /// Trackable this binding represents
    pub fn id(&self) -> TrackableId {
        self.id
    }

    /// Handle of the owned visual instance
    pub fn handle(&self) -> VisualHandle {
        self.handle
    }

    /// Attachment point the instance was created under
    pub fn attachment(&self) -> AttachmentPoint {
        self.attachment
    }

    /// Template the instance was created from
    pub fn template(&self) -> &Arc<VisualTemplate> {
        &self.template
    }

    /// Whether the instance came from the default template
    pub fn uses_default_template(&self) -> bool {
        self.uses_default
    }

    /// Template key carried by the entity, if any
    pub fn template_key(&self) -> Option<&TemplateKey> {
        self.record.template_key.as_ref()
    }

    /// Last applied record
    pub fn record(&self) -> &TrackableRecord {
        &self.record
    }

    /// Last applied pose
    pub fn pose(&self) -> &Pose {
        &self.record.pose
    }

    /// Last applied tracking state
    pub fn tracking_state(&self) -> TrackingState {
        self.record.tracking_state
    }

    /// Last applied scale
    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    /// Last applied colour
    pub fn color(&self) -> Color {
        self.color
    }

    /// Whether the instance is currently shown
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Last applied info label
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Push `record` to the instance
    ///
    /// The pose is always written. Scale, colour and label only follow while
    /// the entity is tracked; an untracked entity is hidden in place.
    pub(crate) fn apply<B: VisualBackend>(
        &mut self,
        record: &TrackableRecord,
        backend: &mut B,
        style: &VisualStyle,
        local_session: Option<SessionId>,
    ) -> VisualResult<()> {
        if !record.pose.is_finite() {
            debug!("Non-finite pose for {}: {:?}", record.id, record.pose);
        }
        self.record = record.clone();
        backend.set_pose(self.handle, &record.pose)?;

        if !record.tracking_state.is_tracked() {
            if self.visible {
                backend.set_visible(self.handle, false)?;
                self.visible = false;
            }
            return Ok(());
        }

        if !self.visible {
            backend.set_visible(self.handle, true)?;
            self.visible = true;
        }

        let scale = style::extent_to_scale(record.extent, self.template.scale_mode, self.template.base_scale);
        backend.set_scale(self.handle, scale)?;
        self.scale = scale;
        self.tracked_extent = record.extent;

        let origin = record
            .session_id
            .map(|session| SessionOrigin::classify(session, local_session));
        let color = self
            .template
            .tint
            .or_else(|| record.session_id.map(style::session_color))
            .unwrap_or_else(|| style.color_for(record.tracking_state, record.classification));
        backend.set_color(self.handle, color)?;
        self.color = color;

        if style.show_labels {
            let label = style::info_label(record, origin);
            backend.set_label(self.handle, Some(&label))?;
            self.label = Some(label);
        }

        Ok(())
    }

    /// Point the binding at a replacement instance, returning the old handle
    ///
    /// The scale is rederived for `template` from the last extent seen while
    /// tracked, so a hidden entity keeps its size across the swap. Colour,
    /// label and visibility reset to what a fresh instance starts with; the
    /// caller pushes the scale and re-applies the last record afterwards.
    pub(crate) fn replace_instance(
        &mut self,
        handle: VisualHandle,
        template: Arc<VisualTemplate>,
        uses_default: bool,
    ) -> VisualHandle {
        let old = std::mem::replace(&mut self.handle, handle);
        self.scale = style::extent_to_scale(self.tracked_extent, template.scale_mode, template.base_scale);
        self.color = template.tint.unwrap_or_default();
        self.template = template;
        self.uses_default = uses_default;
        self.visible = true;
        self.label = None;
        old
    }
}
