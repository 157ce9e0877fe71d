// SPDX-License-Identifier: MIT OR Apache-2.0
//! Player configuration.

use crate::PlayerError;
use serde::{Deserialize, Serialize};
use stagehand_timeline::OrchestratorSettings;
use std::path::Path;

/// Player settings file name looked up next to the timeline
pub const SETTINGS_FILE_NAME: &str = "player.ron";

/// Settings for a player run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerSettings {
    /// Engine settings
    pub orchestrator: OrchestratorSettings,
    /// Stop after this many seconds even if playback has not completed
    pub max_run_seconds: f64,
    /// Visibility ratio reported for scroll-triggered timelines
    pub visibility: f64,
    /// Start playback explicitly for click-triggered timelines
    pub click: bool,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            orchestrator: OrchestratorSettings::default(),
            max_run_seconds: 30.0,
            visibility: 1.0,
            click: true,
        }
    }
}

impl PlayerSettings {
    /// Load settings, falling back to defaults when the file does not exist
    pub async fn load_or_default(path: &Path) -> Result<Self, PlayerError> {
        if !tokio::fs::try_exists(path).await? {
            tracing::debug!("No player settings at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        let content = tokio::fs::read_to_string(path).await?;
        Ok(ron::from_str(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = PlayerSettings::default();
        assert_eq!(settings.max_run_seconds, 30.0);
        assert!(settings.click);
        assert_eq!(settings.orchestrator, OrchestratorSettings::default());
    }

    #[test]
    fn test_partial_document() {
        let settings: PlayerSettings =
            ron::from_str("(max_run_seconds: 5.0, orchestrator: (await_completion: false))").unwrap();
        assert_eq!(settings.max_run_seconds, 5.0);
        assert!(!settings.orchestrator.await_completion);
        assert_eq!(settings.orchestrator.enter_state, "visible");
    }

    #[tokio::test]
    async fn test_missing_file_uses_defaults() {
        let settings = PlayerSettings::load_or_default(Path::new("does/not/exist.ron"))
            .await
            .unwrap();
        assert_eq!(settings, PlayerSettings::default());
    }
}
