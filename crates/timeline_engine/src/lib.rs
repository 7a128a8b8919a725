// SPDX-License-Identifier: MIT OR Apache-2.0
//! Timeline playback engine.
//!
//! This crate drives playback of time-bounded actions laid out on
//! parallel tracks:
//! - Action/track indexing with a start-sorted schedule
//! - Wall-clock driven ticks through an injected frame port
//! - Enter/leave/update dispatch to per-effect controllers
//! - Typed event emission for view layers
//!
//! ## Architecture
//!
//! The engine is built on:
//! - [`ActionIndex`], rebuilt on every structural change
//! - [`Scheduler`], owning the clock, the cursor and the active set
//! - [`ControllerRegistry`], resolving effect keys to [`Controller`]s
//! - [`Emitter`], publishing [`EngineEvent`]s
//!
//! [`Engine`] ties these together behind the public surface.

pub mod clock;
pub mod config;
pub mod controller;
pub mod emitter;
pub mod engine;
pub mod error;
pub mod events;
pub mod index;
pub mod model;
pub mod scheduler;
pub mod viewer;

pub use clock::{Clock, FrameId, FrameScheduler, ManualFrames, PlayOptions, PlayState};
pub use config::EngineConfig;
pub use controller::{shared, Controller, ControllerRegistry, EngineView, HookContext, Shared};
pub use emitter::{Emitter, Event, ListenOptions, Listener, Verdict};
pub use engine::Engine;
pub use error::{ConfigError, EngineError};
pub use events::{EngineEvent, EventKind};
pub use index::ActionIndex;
pub use model::{Action, ActionId, Track, TrackId};
pub use scheduler::Scheduler;
pub use viewer::{HeadlessViewer, Surface, Viewer};
