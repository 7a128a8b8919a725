// SPDX-License-Identifier: MIT OR Apache-2.0
//! Player errors.

use thiserror::Error;
use timeline_engine::{ConfigError, EngineError};

/// Errors that stop the player
#[derive(Debug, Error)]
pub enum PlayerError {
    /// Configuration could not be loaded or saved
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// The engine could not be wired to the viewer
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// The engine refused a transition the player depends on
    #[error("Engine rejected {operation} at {time}s")]
    Rejected {
        /// Operation that was refused
        operation: &'static str,
        /// Engine time when it was refused
        time: f64,
    },
}
