// SPDX-License-Identifier: MIT OR Apache-2.0
//! Engine configuration.

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tunables for an [`Engine`](crate::Engine) instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Largest wall-clock gap (ms) a single tick may advance by
    pub max_frame_step_ms: f64,
    /// Listener count per event above which a leak warning is logged
    pub max_listeners: usize,
    /// Play rate the clock starts with
    pub default_play_rate: f64,
    /// Render width used until the view layer sets one
    pub render_width: u32,
    /// Render height used until the view layer sets one
    pub render_height: u32,
    /// Viewer role of the required renderer element
    pub renderer_role: String,
    /// Viewer role of the optional screener element
    pub screener_role: String,
    /// Viewer role of the optional stage element
    pub stage_role: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_frame_step_ms: 1000.0,
            max_listeners: 20,
            default_play_rate: 1.0,
            render_width: 1920,
            render_height: 1080,
            renderer_role: "renderer".to_string(),
            screener_role: "screener".to_string(),
            stage_role: "stage".to_string(),
        }
    }
}

impl EngineConfig {
    /// Parse a RON document and validate it
    pub fn from_ron_str(content: &str) -> Result<Self> {
        let config: EngineConfig = ron::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a RON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_ron_str(&content)
    }

    /// Reject values the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if !(self.max_frame_step_ms.is_finite() && self.max_frame_step_ms > 0.0) {
            return Err(ConfigError::Invalid {
                field: "max_frame_step_ms",
                reason: format!("must be a positive number, got {}", self.max_frame_step_ms),
            });
        }
        if !(self.default_play_rate.is_finite() && self.default_play_rate > 0.0) {
            return Err(ConfigError::Invalid {
                field: "default_play_rate",
                reason: format!("must be a positive number, got {}", self.default_play_rate),
            });
        }
        if self.renderer_role.is_empty() {
            return Err(ConfigError::Invalid {
                field: "renderer_role",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.max_listeners, 20);
        assert_eq!(config.renderer_role, "renderer");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_ron_uses_defaults() {
        let config = EngineConfig::from_ron_str("(max_listeners: 4, render_width: 640)").unwrap();
        assert_eq!(config.max_listeners, 4);
        assert_eq!(config.render_width, 640);
        assert_eq!(config.render_height, 1080);
        assert!((config.max_frame_step_ms - 1000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_rejects_non_positive_rate() {
        let err = EngineConfig::from_ron_str("(default_play_rate: 0.0)").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "default_play_rate", .. }));
    }

    #[test]
    fn test_serialization() {
        let config = EngineConfig::default();
        let ron_str =
            ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::default()).unwrap();
        let loaded = EngineConfig::from_ron_str(&ron_str).unwrap();
        assert_eq!(loaded, config);
    }
}
