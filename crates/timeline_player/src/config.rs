// SPDX-License-Identifier: MIT OR Apache-2.0
//! Player configuration.
//!
//! Everything is optional in the RON file; missing fields fall back to the
//! defaults below.

use serde::{Deserialize, Serialize};
use std::path::Path;
use timeline_engine::{ConfigError, EngineConfig, PlayOptions, Track};

/// Player settings loaded from a RON file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Engine tunables
    pub engine: EngineConfig,
    /// Frames delivered per second of wall time
    pub frame_rate: f64,
    /// Where playback starts
    pub start_time: f64,
    /// Play rate applied before starting
    pub play_rate: f64,
    /// Options passed to play/record
    pub play: PlayOptions,
    /// Record instead of play
    pub record: bool,
    /// Wall-clock limit in seconds for runs that never end on their own
    pub run_for: Option<f64>,
    /// Tracing filter used when `RUST_LOG` is unset
    pub log_filter: String,
    /// Timeline to play; the built-in demo when empty
    pub tracks: Vec<Track>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            frame_rate: 60.0,
            start_time: 0.0,
            play_rate: 1.0,
            play: PlayOptions::default(),
            record: false,
            run_for: None,
            log_filter: Self::DEFAULT_LOG_FILTER.to_string(),
            tracks: Vec::new(),
        }
    }
}

impl PlayerConfig {
    /// Filter used when nothing else is configured
    pub const DEFAULT_LOG_FILTER: &'static str = "timeline_player=info,timeline_engine=debug";

    /// Parse a RON document and validate it
    pub fn from_ron_str(content: &str) -> Result<Self, ConfigError> {
        let config: PlayerConfig = ron::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a RON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_ron_str(&content)?;
        tracing::debug!("Loaded player config from {:?}", path);
        Ok(config)
    }

    /// Save as pretty-printed RON
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let config = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);

        let content = ron::ser::to_string_pretty(self, config).map_err(|e| ConfigError::Invalid {
            field: "player",
            reason: e.to_string(),
        })?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject values the player cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.engine.validate()?;
        if !(self.frame_rate.is_finite() && self.frame_rate > 0.0) {
            return Err(ConfigError::Invalid {
                field: "frame_rate",
                reason: format!("must be a positive number, got {}", self.frame_rate),
            });
        }
        if !(self.play_rate.is_finite() && self.play_rate > 0.0) {
            return Err(ConfigError::Invalid {
                field: "play_rate",
                reason: format!("must be a positive number, got {}", self.play_rate),
            });
        }
        if !self.start_time.is_finite() {
            return Err(ConfigError::Invalid {
                field: "start_time",
                reason: "must be finite".to_string(),
            });
        }
        if self.run_for.is_some_and(|secs| !(secs.is_finite() && secs > 0.0)) {
            return Err(ConfigError::Invalid {
                field: "run_for",
                reason: "must be a positive number of seconds".to_string(),
            });
        }
        Ok(())
    }

    /// Wall-clock interval between frames
    pub fn frame_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(1.0 / self.frame_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let config = PlayerConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.play.auto_end);
        assert!(config.tracks.is_empty());
        assert_eq!(config.frame_interval().as_millis(), 16);
    }

    #[test]
    fn test_nested_engine_section() {
        let config = PlayerConfig::from_ron_str(
            "(frame_rate: 30.0, record: true, engine: (max_frame_step_ms: 250.0), \
             play: (to_time: Some(4.0)))",
        )
        .unwrap();
        assert!(config.record);
        assert_eq!(config.play.to_time, Some(4.0));
        assert!((config.engine.max_frame_step_ms - 250.0).abs() < f64::EPSILON);
        assert_eq!(config.engine.max_listeners, 20);
    }

    #[test]
    fn test_rejects_zero_frame_rate() {
        let err = PlayerConfig::from_ron_str("(frame_rate: 0.0)").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "frame_rate", .. }));
    }

    #[test]
    fn test_rejects_invalid_engine_section() {
        let err = PlayerConfig::from_ron_str("(engine: (renderer_role: \"\"))").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "renderer_role", .. }));
    }

    #[test]
    fn test_tracks_from_ron() {
        let config = PlayerConfig::from_ron_str(
            r#"(tracks: [(
                id: "t1",
                name: "Video",
                controller: Some("video"),
                actions: [(id: "clip", start: 0.0, end: 2.0)],
            )])"#,
        )
        .unwrap();
        assert_eq!(config.tracks.len(), 1);
        assert_eq!(config.tracks[0].actions[0].id.as_str(), "clip");
    }

    #[test]
    fn test_serialization() {
        let config = PlayerConfig {
            run_for: Some(5.0),
            ..PlayerConfig::default()
        };
        let ron_str =
            ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::default()).unwrap();
        let loaded = PlayerConfig::from_ron_str(&ron_str).unwrap();
        assert_eq!(loaded, config);
    }
}
