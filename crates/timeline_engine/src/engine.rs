// SPDX-License-Identifier: MIT OR Apache-2.0
//! Engine facade.
//!
//! Every mutator funnels through the [`Scheduler`] for membership changes
//! and through the [`Emitter`] for notifications, so a view layer can stay
//! in sync without polling.

use crate::clock::{FrameId, FrameScheduler, ManualFrames, PlayOptions, PlayState};
use crate::config::EngineConfig;
use crate::controller::{ControllerRegistry, EngineView};
use crate::emitter::{Emitter, Event, ListenOptions, Listener, Verdict};
use crate::error::EngineError;
use crate::events::{EngineEvent, EventKind};
use crate::index::ActionIndex;
use crate::model::{Action, ActionId, Track};
use crate::scheduler::{Hook, Scheduler};
use crate::viewer::{Attachment, Surface, Viewer};
use std::fmt;

/// Parameters of the current play/record run
#[derive(Debug, Clone, Copy)]
struct Run {
    to_time: Option<f64>,
    auto_end: bool,
    last_frame_ms: Option<f64>,
}

/// Timeline player
pub struct Engine {
    config: EngineConfig,
    scheduler: Scheduler,
    controllers: ControllerRegistry,
    emitter: Emitter<EngineEvent>,
    attachment: Option<Attachment>,
    frames: Box<dyn FrameScheduler>,
    pending_frame: Option<FrameId>,
    run: Option<Run>,
}

impl Engine {
    /// Create a paused engine at time zero with no tracks
    pub fn new(config: EngineConfig, controllers: ControllerRegistry) -> Self {
        let scheduler = Scheduler::new(
            config.default_play_rate,
            (config.render_width, config.render_height),
        );
        let emitter = Emitter::with_max_listeners(config.max_listeners);
        Self {
            config,
            scheduler,
            controllers,
            emitter,
            attachment: None,
            frames: Box::new(ManualFrames::new()),
            pending_frame: None,
            run: None,
        }
    }

    /// Replace the frame port
    pub fn with_frames(mut self, frames: impl FrameScheduler + 'static) -> Self {
        self.frames = Box::new(frames);
        self
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Clock, cursor and active set
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Read-only view as handed to controllers
    pub fn view(&self) -> EngineView<'_> {
        EngineView::new(&self.scheduler, self.scheduler.render_size())
    }

    // ---- viewer ----

    /// Wire the engine to its viewer and leave the loading state.
    ///
    /// Fails without side effects when the renderer cannot be located.
    pub fn attach_viewer(&mut self, viewer: impl Viewer + 'static) -> Result<(), EngineError> {
        let attachment = Attachment::locate(Box::new(viewer), &self.config)?;
        tracing::debug!(renderer = %attachment.renderer.id, "Viewer attached");
        self.attachment = Some(attachment);

        let view = EngineView::new(&self.scheduler, self.scheduler.render_size());
        self.controllers.for_each_mut(|_, controller| controller.viewer_update(view));
        Ok(())
    }

    /// Still waiting for a viewer
    pub fn is_loading(&self) -> bool {
        self.attachment.is_none()
    }

    /// The attached viewer
    pub fn viewer(&self) -> Option<&dyn Viewer> {
        self.attachment.as_ref().map(Attachment::viewer)
    }

    /// The located renderer surface
    pub fn renderer(&self) -> Option<&Surface> {
        self.attachment.as_ref().map(|a| &a.renderer)
    }

    /// The located screener surface
    pub fn screener(&self) -> Option<&Surface> {
        self.attachment.as_ref().and_then(|a| a.screener.as_ref())
    }

    /// The located stage surface
    pub fn stage(&self) -> Option<&Surface> {
        self.attachment.as_ref().and_then(|a| a.stage.as_ref())
    }

    /// Set the render target size
    pub fn set_render_view(&mut self, width: u32, height: u32) {
        self.scheduler.set_render_size((width, height));
    }

    /// Render target size (width, height)
    pub fn render_size(&self) -> (u32, u32) {
        self.scheduler.render_size()
    }

    fn verify_loaded(&self, operation: &str) -> bool {
        if self.is_loading() {
            tracing::error!("Cannot {} before the viewer has finished loading", operation);
            return false;
        }
        true
    }

    // ---- time ----

    /// Current time in seconds
    pub fn time(&self) -> f64 {
        self.scheduler.clock().time()
    }

    /// Seek to `time`.
    ///
    /// Returns `false` if a `BeforeSetTime` listener vetoed the seek.
    pub fn set_time(&mut self, time: f64) -> bool {
        if !time.is_finite() {
            tracing::error!("Rejected seek to non-finite time {}", time);
            return false;
        }
        if !self.emit(EngineEvent::BeforeSetTime { time }).proceeds() {
            tracing::debug!(time, "Seek cancelled");
            return false;
        }
        self.scheduler.set_time(time, &mut self.controllers);
        self.emit(EngineEvent::AfterSetTime { time });
        true
    }

    /// Current play rate
    pub fn play_rate(&self) -> f64 {
        self.scheduler.clock().rate()
    }

    /// Change the play rate.
    ///
    /// Returns `false` for non-positive rates or when vetoed.
    pub fn set_play_rate(&mut self, rate: f64) -> bool {
        if !(rate.is_finite() && rate > 0.0) {
            tracing::error!("Play rate must be a positive number, got {}", rate);
            return false;
        }
        if !self.emit(EngineEvent::BeforeSetPlayRate { rate }).proceeds() {
            tracing::debug!(rate, "Play rate change cancelled");
            return false;
        }
        self.scheduler.set_rate(rate);
        self.emit(EngineEvent::AfterSetPlayRate { rate });
        true
    }

    // ---- transport ----

    /// Current play state
    pub fn play_state(&self) -> PlayState {
        self.scheduler.clock().state()
    }

    /// Playing or recording
    pub fn is_playing(&self) -> bool {
        self.play_state().is_running()
    }

    /// Recording
    pub fn is_recording(&self) -> bool {
        self.play_state() == PlayState::Recording
    }

    /// Paused
    pub fn is_paused(&self) -> bool {
        self.play_state() == PlayState::Paused
    }

    /// Start playback from the current time
    pub fn play(&mut self, options: PlayOptions) -> bool {
        self.begin(PlayState::Playing, options)
    }

    /// Start playback with capture semantics for observers
    pub fn record(&mut self, options: PlayOptions) -> bool {
        self.begin(PlayState::Recording, options)
    }

    fn begin(&mut self, state: PlayState, options: PlayOptions) -> bool {
        if self.is_playing() {
            return false;
        }
        let time = self.time();
        if let Some(to) = options.to_time {
            if !to.is_finite() {
                tracing::error!("Rejected {} until non-finite time {}", state.name(), to);
                return false;
            }
            if to <= time {
                return false;
            }
        }
        if !self.verify_loaded(state.name()) {
            return false;
        }

        self.scheduler.set_state(state);
        self.scheduler.broadcast(Hook::Start, &mut self.controllers);
        let event = if state == PlayState::Recording {
            EngineEvent::Record { time }
        } else {
            EngineEvent::Play { time }
        };
        self.emit(event);

        self.run = Some(Run {
            to_time: options.to_time,
            auto_end: options.auto_end,
            last_frame_ms: None,
        });
        self.request_frame();
        tracing::debug!(time, state = state.name(), to_time = ?options.to_time, "Playback started");
        true
    }

    /// Pause playback. Does nothing when already paused.
    pub fn pause(&mut self) {
        if self.is_playing() {
            self.scheduler.set_state(PlayState::Paused);
            self.scheduler.broadcast(Hook::Stop, &mut self.controllers);
            let time = self.time();
            self.emit(EngineEvent::Paused { time });
            tracing::debug!(time, "Playback paused");
        }
        self.cancel_frame();
        self.run = None;
    }

    fn end(&mut self) {
        self.pause();
        let time = self.time();
        self.emit(EngineEvent::Ended { time });
        tracing::debug!(time, "Playback ended");
    }

    // ---- frames ----

    /// Frame the engine is waiting for
    pub fn pending_frame(&self) -> Option<FrameId> {
        self.pending_frame
    }

    /// Deliver a requested frame at host time `now_ms`.
    ///
    /// Stale or cancelled frames are ignored.
    pub fn run_frame(&mut self, frame: FrameId, now_ms: f64) {
        if self.pending_frame != Some(frame) {
            tracing::trace!(frame = frame.0, "Ignoring stale frame");
            return;
        }
        self.pending_frame = None;
        if !self.verify_loaded("tick") || !self.is_playing() {
            return;
        }
        let Some(run) = self.run.as_mut() else {
            return;
        };

        let elapsed = run.last_frame_ms.map_or(0.0, |last| now_ms - last);
        run.last_frame_ms = Some(now_ms);
        let Run { to_time, auto_end, .. } = *run;

        let mut time = self
            .scheduler
            .clock()
            .advance(elapsed, self.config.max_frame_step_ms);
        let reached = to_time.is_some_and(|to| to <= time);
        if let (true, Some(to)) = (reached, to_time) {
            time = to;
        }

        self.scheduler.set_time(time, &mut self.controllers);
        self.emit(EngineEvent::SetTimeByTick { time });
        self.scheduler.execute(time, &mut self.controllers);

        if to_time.is_none() && auto_end && self.scheduler.is_drained() {
            self.end();
            return;
        }
        if reached {
            self.end();
            return;
        }
        self.request_frame();
    }

    fn request_frame(&mut self) {
        self.cancel_frame();
        self.pending_frame = Some(self.frames.request_frame());
    }

    fn cancel_frame(&mut self) {
        if let Some(frame) = self.pending_frame.take() {
            self.frames.cancel_frame(frame);
        }
    }

    /// Run `update` for the active set at the current time while paused
    pub fn re_render(&mut self) {
        if self.is_playing() || !self.verify_loaded("re-render") {
            return;
        }
        let time = self.time();
        self.scheduler.execute(time, &mut self.controllers);
    }

    // ---- structure ----

    /// Replace the track set: clear, re-index, re-enter at the current time
    pub fn set_tracks(&mut self, tracks: &[Track]) {
        if self.is_playing() {
            self.pause();
        }
        let index = ActionIndex::build(tracks);
        self.scheduler.reindex(index, &mut self.controllers);
    }

    /// Replace the controller registry, returning the previous one.
    ///
    /// The active set is cleared against the old controllers and rebuilt
    /// against the new ones.
    pub fn set_controllers(&mut self, controllers: ControllerRegistry) -> ControllerRegistry {
        self.scheduler.clear(&mut self.controllers);
        let previous = std::mem::replace(&mut self.controllers, controllers);
        let time = self.time();
        self.scheduler.enter(time, &mut self.controllers);
        previous
    }

    /// The controller registry
    pub fn controllers(&self) -> &ControllerRegistry {
        &self.controllers
    }

    /// Mutable access to the registry.
    ///
    /// Changes take effect at the next time change: actions whose key now
    /// resolves enter, actions whose controller was removed leave without a
    /// `leave` hook.
    pub fn controllers_mut(&mut self) -> &mut ControllerRegistry {
        &mut self.controllers
    }

    /// Edit the engine's copy of an action.
    ///
    /// Membership is re-evaluated at the current time. Returns `false` for
    /// unknown ids.
    pub fn update_action(&mut self, id: &ActionId, edit: impl FnOnce(&mut Action)) -> bool {
        self.scheduler.edit_action(id, edit, &mut self.controllers)
    }

    /// Look up an action
    pub fn action(&self, id: &ActionId) -> Option<&Action> {
        self.scheduler.index().action(id)
    }

    /// Track owning an action
    pub fn action_track(&self, id: &ActionId) -> Option<&Track> {
        self.scheduler.index().track_of(id)
    }

    /// All indexed actions
    pub fn actions(&self) -> impl Iterator<Item = &Action> {
        self.scheduler.index().actions()
    }

    /// All indexed tracks (metadata only)
    pub fn tracks(&self) -> impl Iterator<Item = &Track> {
        self.scheduler.index().tracks()
    }

    /// End of the last-finishing action
    pub fn duration(&self) -> f64 {
        self.scheduler.index().duration()
    }

    // ---- active set ----

    /// Active action ids in activation order
    pub fn active_action_ids(&self) -> impl Iterator<Item = &ActionId> {
        self.scheduler.active_ids()
    }

    /// Active actions with their tracks
    pub fn active_actions(&self) -> impl Iterator<Item = (&Action, &Track)> {
        let index = self.scheduler.index();
        self.scheduler
            .active_ids()
            .filter_map(move |id| Some((index.action(id)?, index.track_of(id)?)))
    }

    /// Whether an action is active
    pub fn is_active(&self, id: &ActionId) -> bool {
        self.scheduler.is_active(id)
    }

    /// Active actions flagged as selected by the view layer
    pub fn selected_actions(&self) -> Vec<(&Action, &Track)> {
        self.active_actions()
            .filter(|(action, _)| action.selected)
            .collect()
    }

    // ---- events ----

    /// Subscribe to an event kind
    pub fn on<F, R>(&mut self, kind: EventKind, handler: F) -> Listener<EngineEvent>
    where
        F: Fn(&EngineEvent) -> R + 'static,
        R: Into<Verdict>,
    {
        self.emitter.on(kind, handler)
    }

    /// Subscribe with options
    pub fn on_with<F, R>(
        &mut self,
        kind: EventKind,
        handler: F,
        options: ListenOptions,
    ) -> Listener<EngineEvent>
    where
        F: Fn(&EngineEvent) -> R + 'static,
        R: Into<Verdict>,
    {
        self.emitter.on_with(kind, handler, options)
    }

    /// Subscribe for a single delivery
    pub fn once<F, R>(&mut self, kind: EventKind, handler: F) -> Listener<EngineEvent>
    where
        F: Fn(&EngineEvent) -> R + 'static,
        R: Into<Verdict>,
    {
        self.emitter.once(kind, handler)
    }

    /// Unsubscribe a listener
    pub fn remove_listener(&mut self, kind: EventKind, listener: &Listener<EngineEvent>) -> bool {
        self.emitter.remove_listener(kind, listener)
    }

    /// Direct access to the emitter
    pub fn emitter_mut(&mut self) -> &mut Emitter<EngineEvent> {
        &mut self.emitter
    }

    fn emit(&mut self, event: EngineEvent) -> Verdict {
        tracing::trace!(event = event.kind().name(), "Emitting");
        self.emitter.emit(&event)
    }

    // ---- teardown ----

    /// Pause, leave everything and let every controller release resources
    pub fn destroy(&mut self) {
        self.pause();
        self.scheduler.clear(&mut self.controllers);
        self.controllers.for_each_mut(|key, controller| {
            tracing::trace!(controller = key, "Destroying controller");
            controller.destroy();
        });
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("time", &self.time())
            .field("rate", &self.play_rate())
            .field("state", &self.play_state())
            .field("loading", &self.is_loading())
            .field("actions", &self.scheduler.index().len())
            .field("active", &self.scheduler.active_len())
            .field("controllers", &self.controllers)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::Controller;
    use crate::viewer::HeadlessViewer;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Inert;

    impl Controller for Inert {}

    fn engine() -> Engine {
        let controllers = ControllerRegistry::new().with("fx", Inert);
        let mut engine = Engine::new(EngineConfig::default(), controllers);
        engine.attach_viewer(HeadlessViewer::new(320, 240)).unwrap();
        engine.set_tracks(&[Track::new("T")
            .with_controller("fx")
            .with_action(Action::new("a", 0.0, 2.0))]);
        engine
    }

    #[test]
    fn test_play_requires_viewer() {
        let mut engine = Engine::new(EngineConfig::default(), ControllerRegistry::new());
        assert!(engine.is_loading());
        assert!(!engine.play(PlayOptions::default()));
        assert!(engine.is_paused());
        assert!(engine.pending_frame().is_none());
    }

    #[test]
    fn test_failed_attach_keeps_loading() {
        let mut engine = Engine::new(EngineConfig::default(), ControllerRegistry::new());
        assert!(engine.attach_viewer(HeadlessViewer::empty()).is_err());
        assert!(engine.is_loading());
    }

    #[test]
    fn test_record_shares_tick_path() {
        let mut engine = engine();
        assert!(engine.record(PlayOptions::until(1.0)));
        assert!(engine.is_recording());
        assert!(engine.is_playing());
        assert!(!engine.play(PlayOptions::default()));

        let frame = engine.pending_frame().unwrap();
        engine.run_frame(frame, 0.0);
        let frame = engine.pending_frame().unwrap();
        engine.run_frame(frame, 1000.0);
        assert!(engine.is_paused());
        assert!((engine.time() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_non_finite_target_is_rejected() {
        let mut engine = engine();
        assert!(!engine.play(PlayOptions::until(f64::NAN)));
        assert!(!engine.record(PlayOptions::until(f64::INFINITY)));
        assert!(engine.is_paused());
        assert!(engine.pending_frame().is_none());
    }

    #[test]
    fn test_stale_frame_is_ignored() {
        let mut engine = engine();
        engine.play(PlayOptions::default());
        let frame = engine.pending_frame().unwrap();
        engine.pause();
        engine.run_frame(frame, 500.0);
        assert!(engine.time().abs() < 1e-9);
    }

    #[test]
    fn test_cancelled_rate_change_is_rejected() {
        let mut engine = engine();
        engine.on(EventKind::BeforeSetPlayRate, |event: &EngineEvent| {
            !matches!(event, EngineEvent::BeforeSetPlayRate { rate } if *rate > 4.0)
        });
        assert!(engine.set_play_rate(2.0));
        assert!(!engine.set_play_rate(8.0));
        assert!((engine.play_rate() - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_selected_actions_filter_active_set() {
        let mut engine = engine();
        assert!(engine.selected_actions().is_empty());
        assert!(engine.update_action(&ActionId::from("a"), |a| a.selected = true));
        let selected = engine.selected_actions();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].0.id.as_str(), "a");
    }

    #[test]
    fn test_set_tracks_pauses_running_playback() {
        let mut engine = engine();
        let paused = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&paused);
        engine.on(EventKind::Paused, move |_: &EngineEvent| *counter.borrow_mut() += 1);

        engine.play(PlayOptions::default());
        engine.set_tracks(&[]);
        assert!(engine.is_paused());
        assert_eq!(*paused.borrow(), 1);
        assert!(engine.pending_frame().is_none());
    }
}
