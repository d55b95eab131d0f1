//! Visual templates and template selection
//!
//! A [`VisualTemplate`] describes what kind of visual instance to create for
//! a tracked entity. The [`PrefabSelector`] maps stable template keys (for
//! example reference-image GUIDs) to templates and falls back to a default.
//! Templates are shared read-only resources; the selector hands out `Arc`s
//! and never owns the instances created from them.

use crate::foundation::math::Vec3;
use crate::visual::style::Color;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Stable identifier of a template, e.g. a reference image GUID
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateKey(String);

impl TemplateKey {
    /// Create a key
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The key text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TemplateKey {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TemplateKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for TemplateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How a visual's scale follows the tracked extent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ScaleMode {
    /// Extent maps onto the local X/Z plane, Y stays fixed
    #[default]
    PlanarExtent,
    /// Uniform scale of half the smaller extent side
    UniformFromExtent,
    /// Always the template's base scale
    Fixed,
}

/// Description of a visual instance to create for a tracked entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualTemplate {
    /// Human readable name, also used by backends to pick assets
    pub name: String,

    /// Scale used before a tracked extent is known
    #[serde(default = "VisualTemplate::default_base_scale")]
    pub base_scale: Vec3,

    /// How the scale follows the tracked extent
    #[serde(default)]
    pub scale_mode: ScaleMode,

    /// Overrides the style colour when set
    #[serde(default)]
    pub tint: Option<Color>,
}

impl VisualTemplate {
    /// Create a template with default scaling
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_scale: Self::default_base_scale(),
            scale_mode: ScaleMode::default(),
            tint: None,
        }
    }

    /// Set the base scale
    pub fn with_base_scale(mut self, base_scale: Vec3) -> Self {
        self.base_scale = base_scale;
        self
    }

    /// Set the scale mode
    pub fn with_scale_mode(mut self, scale_mode: ScaleMode) -> Self {
        self.scale_mode = scale_mode;
        self
    }

    /// Set a fixed tint
    pub fn with_tint(mut self, tint: Color) -> Self {
        self.tint = Some(tint);
        self
    }

    /// Thin quad until the real extent arrives
    fn default_base_scale() -> Vec3 {
        Vec3::new(0.01, 1.0, 0.01)
    }
}

/// Maps template keys to shared templates, with an optional default
#[derive(Debug, Clone, Default)]
pub struct PrefabSelector {
    templates: HashMap<TemplateKey, Arc<VisualTemplate>>,
    default_template: Option<Arc<VisualTemplate>>,
}

impl PrefabSelector {
    /// Create an empty selector
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a selector that always yields `template`
    pub fn with_default(template: VisualTemplate) -> Self {
        Self {
            templates: HashMap::new(),
            default_template: Some(Arc::new(template)),
        }
    }

    /// Replace the template for `key`, returning the previous one
    pub fn set(&mut self, key: TemplateKey, template: Arc<VisualTemplate>) -> Option<Arc<VisualTemplate>> {
        self.templates.insert(key, template)
    }

    /// Template registered for `key`
    pub fn get(&self, key: &TemplateKey) -> Option<Arc<VisualTemplate>> {
        self.templates.get(key).cloned()
    }

    /// Remove the template for `key`
    pub fn remove(&mut self, key: &TemplateKey) -> Option<Arc<VisualTemplate>> {
        self.templates.remove(key)
    }

    /// Replace the default template
    pub fn set_default(&mut self, template: Option<Arc<VisualTemplate>>) -> Option<Arc<VisualTemplate>> {
        std::mem::replace(&mut self.default_template, template)
    }

    /// The default template
    pub fn default_template(&self) -> Option<Arc<VisualTemplate>> {
        self.default_template.clone()
    }

    /// Pick the template for an entity: its key if registered, else the default
    pub fn select(&self, key: Option<&TemplateKey>) -> Option<Arc<VisualTemplate>> {
        key.and_then(|key| self.templates.get(key))
            .or(self.default_template.as_ref())
            .cloned()
    }

    /// Number of keyed templates (the default is not counted)
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Whether no keyed templates are registered
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Registered keys
    pub fn keys(&self) -> impl Iterator<Item = &TemplateKey> {
        self.templates.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_prefers_keyed_template() {
        let mut selector = PrefabSelector::with_default(VisualTemplate::new("fallback"));
        selector.set("poster".into(), Arc::new(VisualTemplate::new("poster_frame")));

        let keyed = selector.select(Some(&"poster".into())).expect("keyed template");
        assert_eq!(keyed.name, "poster_frame");

        let fallback = selector.select(Some(&"unknown".into())).expect("default template");
        assert_eq!(fallback.name, "fallback");

        let unkeyed = selector.select(None).expect("default template");
        assert_eq!(unkeyed.name, "fallback");
    }

    #[test]
    fn test_select_without_default_misses() {
        let mut selector = PrefabSelector::new();
        selector.set("poster".into(), Arc::new(VisualTemplate::new("poster_frame")));

        assert!(selector.select(Some(&"unknown".into())).is_none());
        assert!(selector.select(None).is_none());
    }

    #[test]
    fn test_set_returns_previous() {
        let mut selector = PrefabSelector::new();
        assert!(selector.set("a".into(), Arc::new(VisualTemplate::new("one"))).is_none());

        let previous = selector.set("a".into(), Arc::new(VisualTemplate::new("two")));
        assert_eq!(previous.map(|t| t.name.clone()), Some("one".to_string()));
        assert_eq!(selector.len(), 1);
    }

    #[test]
    fn test_template_defaults() {
        let template = VisualTemplate::new("quad");
        assert_eq!(template.scale_mode, ScaleMode::PlanarExtent);
        assert_eq!(template.base_scale, Vec3::new(0.01, 1.0, 0.01));
        assert!(template.tint.is_none());
    }
}
