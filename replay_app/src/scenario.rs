//! Recorded tracking scenarios
//!
//! A scenario is a RON list of batches, in delivery order:
//!
//! ```ron
//! [
//!     (added: [(id: (sub_id1: 0, sub_id2: 1), extent: Some((0.5, 0.5)))]),
//!     (removed: [(sub_id1: 0, sub_id2: 1)]),
//! ]
//! ```

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracked_visuals::tracking::TrackablesChanged;

/// Errors loading a scenario file
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// The file could not be read
    #[error("Failed to read scenario {path}: {source}")]
    Io {
        /// Scenario path
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// The file is not a valid batch list
    #[error("Failed to parse scenario {path}: {message}")]
    Parse {
        /// Scenario path
        path: PathBuf,
        /// Parser message
        message: String,
    },
}

/// Load the batches of a scenario file
pub fn load(path: &Path) -> Result<Vec<TrackablesChanged>, ScenarioError> {
    let text = std::fs::read_to_string(path).map_err(|source| ScenarioError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&text).map_err(|message| ScenarioError::Parse {
        path: path.to_path_buf(),
        message,
    })
}

fn parse(text: &str) -> Result<Vec<TrackablesChanged>, String> {
    ron::from_str(text).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracked_visuals::tracking::{TrackableId, TrackingState};

    #[test]
    fn test_parse_scenario() {
        let text = r#"[
            (added: [(id: (sub_id1: 0, sub_id2: 1), extent: Some((0.5, 0.25)))]),
            (updated: [(id: (sub_id1: 0, sub_id2: 1), tracking_state: Limited)]),
            (removed: [(sub_id1: 0, sub_id2: 1)]),
        ]"#;
        let batches = parse(text).expect("valid scenario");

        assert_eq!(batches.len(), 3);
        assert_eq!(batches[0].added[0].id, TrackableId::from(1));
        assert_eq!(batches[1].updated[0].tracking_state, TrackingState::Limited);
        assert_eq!(batches[2].removed, vec![TrackableId::from(1)]);
    }

    #[test]
    fn test_bundled_scenario_parses() {
        let batches = parse(include_str!("../scenarios/planes.ron")).expect("bundled scenario");
        assert_eq!(batches.len(), 5);
        assert_eq!(
            batches[1].added[0].template_key.as_ref().map(|k| k.as_str()),
            Some("a7f3c1e0-poster")
        );
    }

    #[test]
    fn test_missing_file() {
        let path = std::env::temp_dir().join("tracking_replay_missing_scenario.ron");
        let _ = std::fs::remove_file(&path);
        assert!(matches!(load(&path), Err(ScenarioError::Io { .. })));
    }

    #[test]
    fn test_malformed_scenario() {
        assert!(parse("(added: 5)").is_err());
    }
}
