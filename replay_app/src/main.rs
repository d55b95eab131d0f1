//! Tracking replay
//!
//! Replays a recorded tracking scenario through a visual manager backed by
//! the in-memory scene and logs what the scene looks like afterwards.
//!
//! ```text
//! tracking_replay [config.toml|config.ron]
//! ```

mod scenario;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracked_visuals::config::{Config, ManagerConfig};
use tracked_visuals::foundation::logging;
use tracked_visuals::manager::TrackedEntityVisualManager;
use tracked_visuals::tracking::{ScriptedTrackingSource, TrackingSession};
use tracked_visuals::visual::SceneArena;

const DEFAULT_CONFIG_PATH: &str = "replay_app/replay.toml";

/// Replay settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
struct ReplayConfig {
    /// Log level name
    log_level: String,
    /// Visual manager configuration
    manager: ManagerConfig,
    /// Scenario file, relative to the config file
    scenario_path: PathBuf,
    /// Upper bound on live visuals in the scene
    max_visuals: Option<usize>,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            manager: ManagerConfig::default(),
            scenario_path: PathBuf::from("scenarios/planes.ron"),
            max_visuals: None,
        }
    }
}

impl Config for ReplayConfig {}

impl ReplayConfig {
    fn resolve_scenario(&self, config_path: &Path) -> PathBuf {
        if self.scenario_path.is_absolute() {
            return self.scenario_path.clone();
        }
        config_path
            .parent()
            .map_or_else(|| self.scenario_path.clone(), |dir| dir.join(&self.scenario_path))
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    let config = ReplayConfig::load_from_file(&config_path)?;
    logging::init_with_level(&config.log_level);

    info!("Starting tracking replay with {}", config_path.display());

    let scenario_path = config.resolve_scenario(&config_path);
    let batches = scenario::load(&scenario_path)?;
    info!("Loaded {} batch(es) from {}", batches.len(), scenario_path.display());

    let scene = config.max_visuals.map_or_else(SceneArena::new, SceneArena::with_capacity);
    let root = scene.root();
    let manager = TrackedEntityVisualManager::from_config(scene, &config.manager, root)?;

    let mut session = TrackingSession::new(ScriptedTrackingSource::new(batches));
    session.attach(manager);
    let delivered = session.pump();
    info!("Delivered {delivered} batch(es)");

    let Some(mut manager) = session.detach() else {
        warn!("Observer vanished before the replay finished");
        return Ok(());
    };

    let mut ids: Vec<_> = manager.bound_ids().collect();
    ids.sort();
    for id in ids {
        let Some(binding) = manager.binding(id) else {
            continue;
        };
        debug!(
            "{} -> '{}' at {:?}, scale {:?}, {}",
            id,
            binding.template().name,
            binding.pose().position.as_slice(),
            binding.scale().as_slice(),
            if binding.is_visible() { "visible" } else { "hidden" }
        );
    }

    let stats = manager.stats().clone();
    info!(
        "Replay finished: {} live, peak {}, {} created, {} destroyed, {} visible",
        stats.active_bindings,
        stats.peak_bindings,
        stats.total_instantiated,
        stats.total_destroyed,
        manager.backend().visible_count()
    );
    if stats.conflicting_entries + stats.unknown_removals + stats.skipped_without_template > 0 {
        warn!(
            "Scenario anomalies: {} conflicting, {} unknown removals, {} without template",
            stats.conflicting_entries, stats.unknown_removals, stats.skipped_without_template
        );
    }

    manager.dispose();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenario_path_is_relative_to_config() {
        let config = ReplayConfig::default();
        let resolved = config.resolve_scenario(Path::new("replay_app/replay.toml"));
        assert_eq!(resolved, Path::new("replay_app").join("scenarios/planes.ron"));
    }

    #[test]
    fn test_bundled_config_is_valid() {
        let config = ReplayConfig::parse(include_str!("../replay.toml"), "replay.toml").expect("bundled config");
        assert_eq!(config.max_visuals, Some(64));
        assert!(config.manager.style.show_labels);
        assert_eq!(config.manager.build_selector().map(|s| s.len()).ok(), Some(2));
    }

    #[test]
    fn test_replay_config_parses_with_defaults() {
        let text = r#"
            log_level = "debug"

            [manager]
            default_template = "plane"

            [[manager.templates]]
            key = "plane"
            template = { name = "plane_quad" }
        "#;
        let config = ReplayConfig::parse(text, "replay.toml").expect("valid config");

        assert_eq!(config.log_level, "debug");
        assert_eq!(config.scenario_path, PathBuf::from("scenarios/planes.ron"));
        assert!(config.max_visuals.is_none());
        assert!(config.manager.build_selector().is_ok());
    }
}
