// SPDX-License-Identifier: MIT OR Apache-2.0
//! Notifications published by the engine.

use crate::emitter::Event;
use serde::{Deserialize, Serialize};

/// Tag for every [`EngineEvent`] variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// Cancellable, before a seek
    BeforeSetTime,
    /// After a seek
    AfterSetTime,
    /// After a tick advanced the time
    SetTimeByTick,
    /// Cancellable, before the play rate changes
    BeforeSetPlayRate,
    /// After the play rate changed
    AfterSetPlayRate,
    /// Playback started
    Play,
    /// Recording started
    Record,
    /// Playback paused
    Paused,
    /// Playback ran out of work or reached its target
    Ended,
}

impl EventKind {
    /// All event kinds
    pub fn all() -> &'static [EventKind] {
        &[
            EventKind::BeforeSetTime,
            EventKind::AfterSetTime,
            EventKind::SetTimeByTick,
            EventKind::BeforeSetPlayRate,
            EventKind::AfterSetPlayRate,
            EventKind::Play,
            EventKind::Record,
            EventKind::Paused,
            EventKind::Ended,
        ]
    }

    /// Get the display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::BeforeSetTime => "beforeSetTime",
            Self::AfterSetTime => "afterSetTime",
            Self::SetTimeByTick => "setTimeByTick",
            Self::BeforeSetPlayRate => "beforeSetPlayRate",
            Self::AfterSetPlayRate => "afterSetPlayRate",
            Self::Play => "play",
            Self::Record => "record",
            Self::Paused => "paused",
            Self::Ended => "ended",
        }
    }

    /// Whether a listener may veto the operation
    pub fn is_cancellable(&self) -> bool {
        matches!(self, Self::BeforeSetTime | Self::BeforeSetPlayRate)
    }
}

/// Engine notification with its payload
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EngineEvent {
    /// A seek to `time` is about to happen
    BeforeSetTime {
        /// Requested time
        time: f64,
    },
    /// A seek to `time` happened
    AfterSetTime {
        /// New time
        time: f64,
    },
    /// A tick moved the time to `time`
    SetTimeByTick {
        /// New time
        time: f64,
    },
    /// The play rate is about to change
    BeforeSetPlayRate {
        /// Requested rate
        rate: f64,
    },
    /// The play rate changed
    AfterSetPlayRate {
        /// New rate
        rate: f64,
    },
    /// Playback started at `time`
    Play {
        /// Time playback started from
        time: f64,
    },
    /// Recording started at `time`
    Record {
        /// Time recording started from
        time: f64,
    },
    /// Playback paused at `time`
    Paused {
        /// Time playback stopped at
        time: f64,
    },
    /// Playback ended at `time`
    Ended {
        /// Final time
        time: f64,
    },
}

impl EngineEvent {
    /// Time carried by the event, if any
    pub fn time(&self) -> Option<f64> {
        match *self {
            Self::BeforeSetTime { time }
            | Self::AfterSetTime { time }
            | Self::SetTimeByTick { time }
            | Self::Play { time }
            | Self::Record { time }
            | Self::Paused { time }
            | Self::Ended { time } => Some(time),
            Self::BeforeSetPlayRate { .. } | Self::AfterSetPlayRate { .. } => None,
        }
    }
}

impl Event for EngineEvent {
    type Kind = EventKind;

    fn kind(&self) -> EventKind {
        match self {
            Self::BeforeSetTime { .. } => EventKind::BeforeSetTime,
            Self::AfterSetTime { .. } => EventKind::AfterSetTime,
            Self::SetTimeByTick { .. } => EventKind::SetTimeByTick,
            Self::BeforeSetPlayRate { .. } => EventKind::BeforeSetPlayRate,
            Self::AfterSetPlayRate { .. } => EventKind::AfterSetPlayRate,
            Self::Play { .. } => EventKind::Play,
            Self::Record { .. } => EventKind::Record,
            Self::Paused { .. } => EventKind::Paused,
            Self::Ended { .. } => EventKind::Ended,
        }
    }
}
