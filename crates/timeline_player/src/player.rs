// SPDX-License-Identifier: MIT OR Apache-2.0
//! Headless host: wires the engine to a paced frame loop.

use crate::config::PlayerConfig;
use crate::demo;
use crate::error::PlayerError;
use crate::pacer::IntervalFrames;
use crate::trace::{HookStats, TraceController};
use std::cell::Cell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use timeline_engine::{
    shared, ControllerRegistry, Engine, EngineEvent, Event, EventKind, HeadlessViewer, Shared,
};

/// Outcome of a run
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    /// Frames delivered to the engine
    pub frames: u64,
    /// Frames requested by the engine
    pub requested: u64,
    /// Engine time when the loop stopped
    pub final_time: f64,
    /// Playback reached its end rather than the run limit
    pub ended: bool,
}

/// Engine plus the host side of its ports
pub struct Player {
    engine: Engine,
    frames: IntervalFrames,
    controllers: Vec<Shared<TraceController>>,
    ended: Rc<Cell<bool>>,
}

impl Player {
    /// Build an engine for `config`, attach a headless viewer and load the timeline
    pub fn new(config: &PlayerConfig) -> Result<Self, PlayerError> {
        let frames = IntervalFrames::new(config.frame_interval());

        let mut registry = ControllerRegistry::new();
        let mut controllers = Vec::with_capacity(demo::EFFECT_KINDS.len());
        for kind in demo::EFFECT_KINDS {
            let controller = shared(TraceController::new(kind));
            registry.register(kind, Arc::clone(&controller));
            controllers.push(controller);
        }

        let mut engine = Engine::new(config.engine.clone(), registry).with_frames(frames.clone());
        engine.attach_viewer(HeadlessViewer::new(
            config.engine.render_width,
            config.engine.render_height,
        ))?;

        for &kind in EventKind::all() {
            engine.on(kind, move |event: &EngineEvent| {
                if kind == EventKind::SetTimeByTick {
                    tracing::trace!(event = kind.name(), time = ?event.time(), "Engine event");
                } else {
                    tracing::info!(event = kind.name(), payload = ?event, "Engine event");
                }
            });
        }
        let ended = Rc::new(Cell::new(false));
        let flag = Rc::clone(&ended);
        engine.on(EventKind::Ended, move |_: &EngineEvent| flag.set(true));

        if config.tracks.is_empty() {
            tracing::info!("No tracks configured, loading the demo timeline");
            engine.set_tracks(&demo::timeline());
        } else {
            engine.set_tracks(&config.tracks);
        }
        tracing::info!(
            actions = engine.actions().count(),
            duration = engine.duration(),
            "Timeline loaded"
        );

        Ok(Self {
            engine,
            frames,
            controllers,
            ended,
        })
    }

    /// The wrapped engine
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Seek, start and pace frames until playback ends or the run limit hits
    pub fn run(&mut self, config: &PlayerConfig) -> Result<Summary, PlayerError> {
        self.ended.set(false);
        if !self.engine.set_time(config.start_time) {
            return Err(self.rejected("seek"));
        }
        if !self.engine.set_play_rate(config.play_rate) {
            return Err(self.rejected("play rate change"));
        }
        let started = if config.record {
            self.engine.record(config.play)
        } else {
            self.engine.play(config.play)
        };
        if !started {
            return Err(self.rejected(if config.record { "record" } else { "play" }));
        }

        let origin = Instant::now();
        let deadline = config.run_for.map(|secs| origin + Duration::from_secs_f64(secs));
        let mut delivered = 0;

        while let Some(frame) = self.engine.pending_frame() {
            let Some(due) = self.frames.due(frame) else {
                tracing::warn!(frame = frame.0, "Pending frame unknown to the pacer");
                break;
            };
            if deadline.is_some_and(|deadline| due >= deadline) {
                tracing::info!("Run limit reached at {:.3}s", self.engine.time());
                self.engine.pause();
                break;
            }

            let now = Instant::now();
            if due > now {
                std::thread::sleep(due - now);
            }
            let now_ms = origin.elapsed().as_secs_f64() * 1000.0;
            self.engine.run_frame(frame, now_ms);
            delivered += 1;
        }

        Ok(Summary {
            frames: delivered,
            requested: self.frames.counts().0,
            final_time: self.engine.time(),
            ended: self.ended.get(),
        })
    }

    /// Destroy the engine and report per-controller counters
    pub fn shutdown(mut self) -> Vec<(String, HookStats)> {
        self.engine.destroy();
        self.controllers
            .iter()
            .map(|controller| {
                let controller = controller.lock();
                tracing::debug!(
                    controller = controller.kind(),
                    surface = ?controller.surface(),
                    destroyed = controller.is_destroyed(),
                    "Controller released"
                );
                (controller.kind().to_string(), controller.stats())
            })
            .collect()
    }

    fn rejected(&self, operation: &'static str) -> PlayerError {
        PlayerError::Rejected {
            operation,
            time: self.engine.time(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use timeline_engine::{Action, PlayOptions, Track};

    fn quick(tracks: Vec<Track>) -> PlayerConfig {
        PlayerConfig {
            frame_rate: 500.0,
            tracks,
            ..PlayerConfig::default()
        }
    }

    fn clip(id: &str, start: f64, end: f64) -> Action {
        Action::new(id, start, end).with_data(json!({ "src": id }))
    }

    #[test]
    fn test_plays_until_drained() {
        let config = quick(vec![Track::new("V")
            .with_controller("video")
            .with_action(clip("a", 0.0, 0.03))]);
        let mut player = Player::new(&config).unwrap();
        let summary = player.run(&config).unwrap();

        assert!(summary.ended);
        assert!(summary.frames >= 2);
        assert!(summary.final_time >= 0.03);
        assert!(player.engine().is_paused());

        let stats = player.shutdown();
        let video = stats.iter().find(|(kind, _)| kind == "video").unwrap().1;
        assert_eq!(video.entered, 1);
        assert_eq!(video.left, 1);
        assert!(video.updates >= 1);
    }

    #[test]
    fn test_run_limit_pauses_endless_playback() {
        let config = PlayerConfig {
            play: PlayOptions::endless(),
            run_for: Some(0.03),
            record: true,
            ..quick(vec![Track::new("A")
                .with_controller("audio")
                .with_action(clip("bed", 0.0, 60.0))])
        };
        let mut player = Player::new(&config).unwrap();
        let summary = player.run(&config).unwrap();

        assert!(!summary.ended);
        assert!(player.engine().is_paused());
        assert!(summary.final_time < 60.0);
        assert!(summary.requested >= summary.frames);
    }

    #[test]
    fn test_start_past_target_is_rejected() {
        let config = PlayerConfig {
            start_time: 5.0,
            play: PlayOptions::until(2.0),
            ..quick(Vec::new())
        };
        let mut player = Player::new(&config).unwrap();
        let err = player.run(&config).unwrap_err();
        assert!(matches!(err, PlayerError::Rejected { operation: "play", .. }));
    }

    #[test]
    fn test_demo_timeline_when_no_tracks() {
        let player = Player::new(&quick(Vec::new())).unwrap();
        assert!(player.engine().actions().count() > 0);
        assert!(!player.engine().is_loading());
    }
}
