// SPDX-License-Identifier: MIT OR Apache-2.0
//! Headless timeline player.
//!
//! Loads a RON config (written with defaults when the path does not exist),
//! plays its timeline or the built-in demo against tracing controllers and
//! paces frames in real time until playback ends.
//!
//! ```text
//! timeline_player [config.ron]
//! ```

mod config;
mod demo;
mod error;
mod pacer;
mod player;
mod trace;

use config::PlayerConfig;
use error::PlayerError;
use player::Player;
use std::path::{Path, PathBuf};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

fn main() {
    let path = std::env::args_os().nth(1).map(PathBuf::from);
    let loaded = load_config(path.as_deref());

    let filter = loaded
        .as_ref()
        .map_or(PlayerConfig::DEFAULT_LOG_FILTER, |config| config.log_filter.as_str());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting timeline player v{}", env!("CARGO_PKG_VERSION"));

    let config = match loaded {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load config: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&config) {
        tracing::error!("Player failed: {e}");
        std::process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> Result<PlayerConfig, PlayerError> {
    match path {
        None => Ok(PlayerConfig::default()),
        Some(path) if !path.exists() => {
            let config = PlayerConfig::default();
            config.save(path)?;
            Ok(config)
        }
        Some(path) => Ok(PlayerConfig::load(path)?),
    }
}

fn run(config: &PlayerConfig) -> Result<(), PlayerError> {
    let mut player = Player::new(config)?;
    let (width, height) = player.engine().render_size();
    tracing::debug!(width, height, "Rendering headless");
    let summary = player.run(config)?;
    tracing::info!(
        frames = summary.frames,
        requested = summary.requested,
        time = summary.final_time,
        ended = summary.ended,
        "Playback finished"
    );

    for (kind, stats) in player.shutdown() {
        tracing::info!(
            controller = %kind,
            entered = stats.entered,
            left = stats.left,
            updates = stats.updates,
            started = stats.started,
            stopped = stats.stopped,
            "Controller summary"
        );
    }
    Ok(())
}
