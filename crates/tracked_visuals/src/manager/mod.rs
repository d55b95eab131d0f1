//! # Tracked Entity Visual Manager
//!
//! Keeps one visual instance per live trackable. The manager consumes the
//! batched add/update/remove notifications of a tracking source and keeps
//! its association table equal to the set of ids the source considers live.
//!
//! ## Batch rules
//!
//! - **added**: instantiate the selected template and apply the record. An
//!   id that is already bound is treated as an update.
//! - **updated**: apply the record to the existing instance. An unknown id
//!   is bound as if it had been added.
//! - **removed**: destroy the instance and forget the id. Unknown ids are
//!   ignored.
//!
//! Ids appearing in more than one collection are resolved with
//! removed > added > updated. None of these anomalies are errors: the source
//! is outside our control and a bad batch must not break the session. They
//! are counted in [`ManagerStats`] and logged.
//!
//! ## Usage
//!
//! ```rust
//! use tracked_visuals::prelude::*;
//!
//! let scene = SceneArena::new();
//! let root = scene.root();
//! let selector = PrefabSelector::with_default(VisualTemplate::new("plane_quad"));
//! let mut manager = TrackedEntityVisualManager::new(scene, selector, root);
//!
//! let batch = TrackablesChanged::new()
//!     .with_added(TrackableRecord::new(1, Pose::identity()).with_extent(0.5, 0.25));
//! manager.on_trackables_changed(&batch);
//!
//! let handle = manager.get_visual(TrackableId::from(1)).expect("bound");
//! assert!(manager.backend().node(handle).is_some());
//! manager.dispose();
//! ```

mod batch;
mod binding;

pub use binding::VisualBinding;

use crate::config::{ConfigError, ManagerConfig};
use crate::foundation::collections::{AttachmentPoint, VisualHandle};
use crate::templates::{PrefabSelector, TemplateKey, VisualTemplate};
use crate::tracking::{SessionId, TrackableId, TrackableRecord, TrackablesChanged, TrackablesObserver};
use crate::visual::{VisualBackend, VisualStyle};
use log::{debug, info, trace, warn};
use std::collections::HashMap;
use std::sync::Arc;

/// Counters describing what the manager has done
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManagerStats {
    /// Batches applied
    pub batches_applied: u64,
    /// Visual instances created (including swaps)
    pub total_instantiated: u64,
    /// Visual instances destroyed (including swaps and dispose)
    pub total_destroyed: u64,
    /// Adds for ids that were already bound
    pub duplicate_adds: u64,
    /// Updates for unbound ids, bound on the spot
    pub implicit_adds: u64,
    /// Removes for ids that were not bound
    pub unknown_removals: u64,
    /// Records dropped by the removed > added > updated tie-break
    pub conflicting_entries: u64,
    /// Adds skipped because no template (not even a default) was available
    pub skipped_without_template: u64,
    /// Instantiations the backend refused
    pub instantiation_failures: u64,
    /// Other backend operations that failed
    pub backend_errors: u64,
    /// Instances replaced after a template change
    pub template_swaps: u64,
    /// Ids currently bound
    pub active_bindings: usize,
    /// Largest number of ids bound at once
    pub peak_bindings: usize,
}

/// Maintains the association between tracked entities and visual instances
pub struct TrackedEntityVisualManager<B> {
    backend: B,
    selector: PrefabSelector,
    style: VisualStyle,
    local_session: Option<SessionId>,
    attachment: AttachmentPoint,
    bindings: HashMap<TrackableId, VisualBinding>,
    stats: ManagerStats,
}

impl<B: VisualBackend> TrackedEntityVisualManager<B> {
    /// Create a manager that instantiates visuals under `attachment`
    pub fn new(backend: B, selector: PrefabSelector, attachment: AttachmentPoint) -> Self {
        Self {
            backend,
            selector,
            style: VisualStyle::default(),
            local_session: None,
            attachment,
            bindings: HashMap::new(),
            stats: ManagerStats::default(),
        }
    }

    /// Create a manager from a persisted configuration
    pub fn from_config(backend: B, config: &ManagerConfig, attachment: AttachmentPoint) -> Result<Self, ConfigError> {
        let selector = config.build_selector()?;
        info!(
            "Visual manager configured with {} template(s), default: {}",
            selector.len(),
            config
                .default_template
                .as_ref()
                .map_or_else(|| "none".to_string(), ToString::to_string)
        );

        let mut manager = Self::new(backend, selector, attachment).with_style(config.style.clone());
        manager.local_session = config.local_session;
        Ok(manager)
    }

    /// Set the visual style
    pub fn with_style(mut self, style: VisualStyle) -> Self {
        self.style = style;
        self
    }

    /// Set the local session id used to tell local anchors from remote ones
    pub fn with_local_session(mut self, session: SessionId) -> Self {
        self.local_session = Some(session);
        self
    }

    /// Apply one batch of tracking changes
    ///
    /// Never fails; anomalies are absorbed and counted.
    pub fn on_trackables_changed(&mut self, batch: &TrackablesChanged) {
        let normalized = batch::normalize(batch);
        if normalized.conflicts > 0 {
            warn!(
                "Batch listed {} id(s) in more than one collection; resolved as removed > added > updated",
                normalized.conflicts
            );
            self.stats.conflicting_entries += normalized.conflicts as u64;
        }

        for record in normalized.added {
            if self.bindings.contains_key(&record.id) {
                debug!("Duplicate add for {}, treating as update", record.id);
                self.stats.duplicate_adds += 1;
                self.update_bound(record);
            } else {
                self.bind(record);
            }
        }

        for record in normalized.updated {
            if self.bindings.contains_key(&record.id) {
                self.update_bound(record);
            } else {
                debug!("Update for unbound {}, binding it now", record.id);
                self.stats.implicit_adds += 1;
                self.bind(record);
            }
        }

        for id in normalized.removed {
            self.unbind(*id);
        }

        self.stats.batches_applied += 1;
        self.stats.active_bindings = self.bindings.len();
    }

    /// Handle of the visual bound to `id`
    pub fn get_visual(&self, id: TrackableId) -> Option<VisualHandle> {
        self.bindings.get(&id).map(VisualBinding::handle)
    }

    /// Binding for `id`
    pub fn binding(&self, id: TrackableId) -> Option<&VisualBinding> {
        self.bindings.get(&id)
    }

    /// Whether `id` is bound
    pub fn contains(&self, id: TrackableId) -> bool {
        self.bindings.contains_key(&id)
    }

    /// Iterate over bound ids
    pub fn bound_ids(&self) -> impl Iterator<Item = TrackableId> + '_ {
        self.bindings.keys().copied()
    }

    /// Iterate over bindings
    pub fn bindings(&self) -> impl Iterator<Item = &VisualBinding> {
        self.bindings.values()
    }

    /// Number of bound ids
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Whether nothing is bound
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Template registered for `key`
    pub fn get_template(&self, key: &TemplateKey) -> Option<Arc<VisualTemplate>> {
        self.selector.get(key)
    }

    /// Register `template` for `key`, returning the previous template
    ///
    /// Entities already bound with this key get a new instance of the new
    /// template under the same attachment point, with their last record
    /// re-applied; the old instance is destroyed afterwards. If the backend
    /// refuses the new instance the old one stays.
    pub fn set_template(
        &mut self,
        key: impl Into<TemplateKey>,
        template: impl Into<Arc<VisualTemplate>>,
    ) -> Option<Arc<VisualTemplate>> {
        let key = key.into();
        let template = template.into();
        let previous = self.selector.set(key.clone(), Arc::clone(&template));

        let swapped = self.swap_instances(&template, false, |binding| binding.template_key() == Some(&key));
        debug!("Template for '{}' set to '{}', {} instance(s) swapped", key, template.name, swapped);
        previous
    }

    /// The default template
    pub fn default_template(&self) -> Option<Arc<VisualTemplate>> {
        self.selector.default_template()
    }

    /// Replace the default template, returning the previous one
    ///
    /// Bindings created from the old default are swapped like in
    /// [`set_template`](Self::set_template). Clearing the default leaves
    /// existing instances in place.
    pub fn set_default_template(
        &mut self,
        template: Option<Arc<VisualTemplate>>,
    ) -> Option<Arc<VisualTemplate>> {
        let previous = self.selector.set_default(template.clone());

        if let Some(template) = template {
            let swapped = self.swap_instances(&template, true, VisualBinding::uses_default_template);
            debug!("Default template set to '{}', {} instance(s) swapped", template.name, swapped);
        }
        previous
    }

    /// Destroy every owned visual and clear the table
    ///
    /// Safe to call more than once; later calls find nothing to destroy.
    pub fn dispose(&mut self) {
        if self.bindings.is_empty() {
            return;
        }

        let count = self.bindings.len();
        for (id, binding) in self.bindings.drain() {
            match self.backend.destroy(binding.handle()) {
                Ok(()) => self.stats.total_destroyed += 1,
                Err(err) => {
                    warn!("Failed to destroy visual for {id}: {err}");
                    self.stats.backend_errors += 1;
                }
            }
        }
        self.stats.active_bindings = 0;
        info!("Visual manager disposed {count} visual(s)");
    }

    /// Counters
    pub fn stats(&self) -> &ManagerStats {
        &self.stats
    }

    /// Attachment point new visuals are created under
    pub fn attachment(&self) -> AttachmentPoint {
        self.attachment
    }

    /// Visual style
    pub fn style(&self) -> &VisualStyle {
        &self.style
    }

    /// The backend
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The backend, mutably
    ///
    /// Instances owned by bindings must not be destroyed through this.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    fn bind(&mut self, record: &TrackableRecord) {
        let Some(template) = self.selector.select(record.template_key.as_ref()) else {
            debug!(
                "No template for {} (key: {:?}), leaving it unbound",
                record.id, record.template_key
            );
            self.stats.skipped_without_template += 1;
            return;
        };
        let uses_default = record
            .template_key
            .as_ref()
            .map_or(true, |key| self.selector.get(key).is_none());

        let handle = match self.backend.instantiate(&template, self.attachment) {
            Ok(handle) => handle,
            Err(err) => {
                warn!("Could not instantiate '{}' for {}: {}", template.name, record.id, err);
                self.stats.instantiation_failures += 1;
                return;
            }
        };

        let mut binding = VisualBinding::new(record.clone(), handle, self.attachment, template, uses_default);
        if let Err(err) = binding.apply(record, &mut self.backend, &self.style, self.local_session) {
            warn!("Failed to apply initial state for {}: {}", record.id, err);
            self.stats.backend_errors += 1;
        }

        debug!("Bound {} to {:?} ('{}')", record.id, handle, binding.template().name);
        self.bindings.insert(record.id, binding);
        self.stats.total_instantiated += 1;
        self.stats.peak_bindings = self.stats.peak_bindings.max(self.bindings.len());
    }

    fn update_bound(&mut self, record: &TrackableRecord) {
        let Some(binding) = self.bindings.get_mut(&record.id) else {
            return;
        };
        trace!("Updating {} ({})", record.id, record.tracking_state);
        if let Err(err) = binding.apply(record, &mut self.backend, &self.style, self.local_session) {
            warn!("Failed to update visual for {}: {}", record.id, err);
            self.stats.backend_errors += 1;
        }
    }

    fn unbind(&mut self, id: TrackableId) {
        let Some(binding) = self.bindings.remove(&id) else {
            debug!("Remove for unbound {id} ignored");
            self.stats.unknown_removals += 1;
            return;
        };

        match self.backend.destroy(binding.handle()) {
            Ok(()) => {
                debug!("Unbound {} and destroyed {:?}", id, binding.handle());
                self.stats.total_destroyed += 1;
            }
            Err(err) => {
                warn!("Failed to destroy visual for {id}: {err}");
                self.stats.backend_errors += 1;
            }
        }
    }

    fn swap_instances(
        &mut self,
        template: &Arc<VisualTemplate>,
        uses_default: bool,
        matches: impl Fn(&VisualBinding) -> bool,
    ) -> usize {
        let mut swapped = 0;
        for binding in self.bindings.values_mut().filter(|binding| matches(binding)) {
            let handle = match self.backend.instantiate(template, binding.attachment()) {
                Ok(handle) => handle,
                Err(err) => {
                    warn!(
                        "Could not swap {} to '{}', keeping current instance: {}",
                        binding.id(),
                        template.name,
                        err
                    );
                    self.stats.instantiation_failures += 1;
                    continue;
                }
            };
            self.stats.total_instantiated += 1;

            let old = binding.replace_instance(handle, Arc::clone(template), uses_default);
            let record = binding.record().clone();
            let applied = self
                .backend
                .set_scale(handle, binding.scale())
                .and_then(|()| binding.apply(&record, &mut self.backend, &self.style, self.local_session));
            if let Err(err) = applied {
                warn!("Failed to apply state to swapped visual for {}: {}", binding.id(), err);
                self.stats.backend_errors += 1;
            }

            match self.backend.destroy(old) {
                Ok(()) => self.stats.total_destroyed += 1,
                Err(err) => {
                    warn!("Failed to destroy replaced visual for {}: {}", binding.id(), err);
                    self.stats.backend_errors += 1;
                }
            }
            swapped += 1;
        }
        self.stats.template_swaps += swapped as u64;
        swapped
    }
}

impl<B: VisualBackend> TrackablesObserver for TrackedEntityVisualManager<B> {
    fn on_trackables_changed(&mut self, batch: &TrackablesChanged) {
        Self::on_trackables_changed(self, batch);
    }
}
