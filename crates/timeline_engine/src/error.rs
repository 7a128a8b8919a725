// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error types for the playback engine.

use thiserror::Error;

/// Structural misconfiguration detected while wiring the engine
#[derive(Debug, Error)]
pub enum EngineError {
    /// The viewer does not expose the element the engine renders into
    #[error("viewer has no element with role '{role}'; expected a renderer surface to draw into")]
    ViewerMisconfigured {
        /// Role that could not be located
        role: String,
    },

    /// The located renderer cannot be drawn into
    #[error("renderer '{id}' has an empty surface ({width}x{height})")]
    EmptyRenderer {
        /// Surface id
        id: String,
        /// Reported width
        width: u32,
        /// Reported height
        height: u32,
    },
}

/// Errors raised while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// RON parse error
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// A value is outside its allowed range
    #[error("Invalid value for {field}: {reason}")]
    Invalid {
        /// Offending field
        field: &'static str,
        /// Why it was rejected
        reason: String,
    },
}

/// Result type for configuration loading
pub type Result<T> = std::result::Result<T, ConfigError>;
