// SPDX-License-Identifier: MIT OR Apache-2.0
//! Playback clock and the frame port.

use serde::{Deserialize, Serialize};

/// Playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlayState {
    /// Not advancing
    #[default]
    Paused,
    /// Advancing on every frame
    Playing,
    /// Advancing on every frame while a host captures output
    Recording,
}

impl PlayState {
    /// Playing or recording; both share the tick path
    pub fn is_running(&self) -> bool {
        matches!(self, PlayState::Playing | PlayState::Recording)
    }

    /// Get the display name
    pub fn name(&self) -> &'static str {
        match self {
            PlayState::Paused => "paused",
            PlayState::Playing => "playing",
            PlayState::Recording => "recording",
        }
    }
}

/// Time, rate and play state
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Clock {
    /// Current time in seconds
    pub(crate) time: f64,
    /// Rate multiplier, always positive
    pub(crate) rate: f64,
    /// Play state
    pub(crate) state: PlayState,
}

impl Clock {
    /// Create a paused clock at zero
    pub fn new(rate: f64) -> Self {
        Self {
            time: 0.0,
            rate,
            state: PlayState::Paused,
        }
    }

    /// Current time in seconds
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Current play rate
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Current play state
    pub fn state(&self) -> PlayState {
        self.state
    }

    /// Time reached after `elapsed_ms` of wall time, capped at `max_step_ms`.
    ///
    /// Negative gaps (out-of-order timestamps) count as zero.
    pub fn advance(&self, elapsed_ms: f64, max_step_ms: f64) -> f64 {
        let step = if elapsed_ms.is_finite() {
            elapsed_ms.max(0.0).min(max_step_ms)
        } else {
            0.0
        };
        self.time + step / 1000.0 * self.rate
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new(1.0)
    }
}

/// Options for [`Engine::play`](crate::Engine::play) and
/// [`Engine::record`](crate::Engine::record)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayOptions {
    /// Stop exactly here; takes priority over `auto_end`
    pub to_time: Option<f64>,
    /// End once nothing is active and nothing is left to start
    pub auto_end: bool,
}

impl Default for PlayOptions {
    fn default() -> Self {
        Self {
            to_time: None,
            auto_end: true,
        }
    }
}

impl PlayOptions {
    /// Play until `to_time`
    pub fn until(to_time: f64) -> Self {
        Self {
            to_time: Some(to_time),
            ..Self::default()
        }
    }

    /// Play without ending on exhaustion
    pub fn endless() -> Self {
        Self {
            to_time: None,
            auto_end: false,
        }
    }
}

/// Handle of a requested frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameId(pub u64);

/// Host frame scheduling primitive.
///
/// The engine asks for a frame while playing and cancels it on pause. The
/// host answers each request by calling
/// [`Engine::run_frame`](crate::Engine::run_frame) with the id and a
/// millisecond timestamp.
pub trait FrameScheduler {
    /// Request the next frame
    fn request_frame(&mut self) -> FrameId;

    /// Drop a pending request
    fn cancel_frame(&mut self, frame: FrameId);
}

/// Frame port that only hands out ids; the host polls
/// [`Engine::pending_frame`](crate::Engine::pending_frame).
#[derive(Debug, Default)]
pub struct ManualFrames {
    next: u64,
}

impl ManualFrames {
    /// Create a new frame port
    pub fn new() -> Self {
        Self::default()
    }
}

impl FrameScheduler for ManualFrames {
    fn request_frame(&mut self) -> FrameId {
        self.next = self.next.wrapping_add(1);
        FrameId(self.next)
    }

    fn cancel_frame(&mut self, _frame: FrameId) {}
}
