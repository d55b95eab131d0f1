//! # Manager Configuration
//!
//! Persisted form of the template table and visual style a
//! [`TrackedEntityVisualManager`](crate::manager::TrackedEntityVisualManager)
//! is constructed from. Reference-image GUIDs and other template keys are
//! stored as plain strings.

use super::{Config, ConfigError};
use crate::templates::{PrefabSelector, TemplateKey, VisualTemplate};
use crate::tracking::SessionId;
use crate::visual::VisualStyle;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

/// One template table row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateEntry {
    /// Template key, e.g. a reference image GUID
    pub key: TemplateKey,
    /// Template used for entities carrying `key`
    pub template: VisualTemplate,
}

/// Configuration for a tracked entity visual manager
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Keyed templates
    pub templates: Vec<TemplateEntry>,
    /// Key of the template used when an entity's key has no entry
    pub default_template: Option<TemplateKey>,
    /// Colours and overlays
    pub style: VisualStyle,
    /// This device's session, used to tell local anchors from remote ones
    pub local_session: Option<SessionId>,
}

impl ManagerConfig {
    /// Create an empty configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a keyed template
    pub fn with_template(mut self, key: impl Into<TemplateKey>, template: VisualTemplate) -> Self {
        self.templates.push(TemplateEntry {
            key: key.into(),
            template,
        });
        self
    }

    /// Set the default template key
    pub fn with_default_template(mut self, key: impl Into<TemplateKey>) -> Self {
        self.default_template = Some(key.into());
        self
    }

    /// Set the visual style
    pub fn with_style(mut self, style: VisualStyle) -> Self {
        self.style = style;
        self
    }

    /// Set the local session id
    pub fn with_local_session(mut self, session: SessionId) -> Self {
        self.local_session = Some(session);
        self
    }

    /// Validate the configuration
    ///
    /// Keys must be unique and the default key, when set, must name an entry.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for entry in &self.templates {
            if !seen.insert(&entry.key) {
                return Err(ConfigError::Invalid(format!("Duplicate template key '{}'", entry.key)));
            }
            if entry.template.name.is_empty() {
                return Err(ConfigError::Invalid(format!("Template for key '{}' has no name", entry.key)));
            }
        }

        if let Some(default_key) = &self.default_template {
            if !seen.contains(default_key) {
                return Err(ConfigError::Invalid(format!(
                    "Default template key '{default_key}' has no template entry"
                )));
            }
        }

        Ok(())
    }

    /// Build the template selector described by this configuration
    pub fn build_selector(&self) -> Result<PrefabSelector, ConfigError> {
        self.validate()?;

        let mut selector = PrefabSelector::new();
        for entry in &self.templates {
            let template = Arc::new(entry.template.clone());
            if self.default_template.as_ref() == Some(&entry.key) {
                selector.set_default(Some(Arc::clone(&template)));
            }
            selector.set(entry.key.clone(), template);
        }
        Ok(selector)
    }
}

impl Config for ManagerConfig {}
