// SPDX-License-Identifier: MIT OR Apache-2.0
//! Controller contract and registry.
//!
//! A controller renders one effect type (video, audio, image, animation...).
//! The engine looks controllers up by the action's effect key and calls the
//! lifecycle hooks below; every hook defaults to a no-op.

use crate::clock::PlayState;
use crate::model::{Action, ActionId, Track};
use crate::scheduler::Scheduler;
use indexmap::IndexMap;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

/// Read-only view of engine state handed to controllers
#[derive(Clone, Copy)]
pub struct EngineView<'a> {
    scheduler: &'a Scheduler,
    render_size: (u32, u32),
}

impl<'a> EngineView<'a> {
    pub(crate) fn new(scheduler: &'a Scheduler, render_size: (u32, u32)) -> Self {
        Self {
            scheduler,
            render_size,
        }
    }

    /// Current time in seconds
    pub fn time(&self) -> f64 {
        self.scheduler.clock().time()
    }

    /// Current play rate
    pub fn play_rate(&self) -> f64 {
        self.scheduler.clock().rate()
    }

    /// Current play state
    pub fn play_state(&self) -> PlayState {
        self.scheduler.clock().state()
    }

    /// Look up an action
    pub fn action(&self, id: &ActionId) -> Option<&'a Action> {
        self.scheduler.index().action(id)
    }

    /// Track owning an action
    pub fn track_of(&self, id: &ActionId) -> Option<&'a Track> {
        self.scheduler.index().track_of(id)
    }

    /// Whether an action is in the active set
    pub fn is_active(&self, id: &ActionId) -> bool {
        self.scheduler.is_active(id)
    }

    /// Active action ids in activation order
    pub fn active_ids(&self) -> impl Iterator<Item = &'a ActionId> {
        self.scheduler.active_ids()
    }

    /// End of the last-finishing action
    pub fn duration(&self) -> f64 {
        self.scheduler.index().duration()
    }

    /// Render target size (width, height)
    pub fn render_size(&self) -> (u32, u32) {
        self.render_size
    }
}

impl fmt::Debug for EngineView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineView")
            .field("time", &self.time())
            .field("play_state", &self.play_state())
            .finish()
    }
}

/// Arguments of a per-action hook
#[derive(Debug, Clone, Copy)]
pub struct HookContext<'a> {
    /// The engine's copy of the action
    pub action: &'a Action,
    /// The action's track
    pub track: &'a Track,
    /// Time of the dispatch
    pub time: f64,
    /// Engine state at dispatch
    pub engine: EngineView<'a>,
}

/// Lifecycle hooks for one effect type
pub trait Controller {
    /// Playback started with this action active
    fn start(&mut self, _ctx: &HookContext<'_>) {}

    /// Playback paused with this action active
    fn stop(&mut self, _ctx: &HookContext<'_>) {}

    /// The action joined the active set
    fn enter(&mut self, _ctx: &HookContext<'_>) {}

    /// Per-tick update of an active action
    fn update(&mut self, _ctx: &HookContext<'_>) {}

    /// The action left the active set
    fn leave(&mut self, _ctx: &HookContext<'_>) {}

    /// A viewer was attached
    fn viewer_update(&mut self, _engine: EngineView<'_>) {}

    /// Release cached resources. May race a final `leave`.
    fn destroy(&mut self) {}
}

/// A controller instance shared by several registries
pub type Shared<C> = Arc<Mutex<C>>;

/// Wrap a controller for explicit sharing between engines
pub fn shared<C: Controller>(controller: C) -> Shared<C> {
    Arc::new(Mutex::new(controller))
}

impl<C: Controller> Controller for Arc<Mutex<C>> {
    fn start(&mut self, ctx: &HookContext<'_>) {
        self.lock().start(ctx);
    }

    fn stop(&mut self, ctx: &HookContext<'_>) {
        self.lock().stop(ctx);
    }

    fn enter(&mut self, ctx: &HookContext<'_>) {
        self.lock().enter(ctx);
    }

    fn update(&mut self, ctx: &HookContext<'_>) {
        self.lock().update(ctx);
    }

    fn leave(&mut self, ctx: &HookContext<'_>) {
        self.lock().leave(ctx);
    }

    fn viewer_update(&mut self, engine: EngineView<'_>) {
        self.lock().viewer_update(engine);
    }

    fn destroy(&mut self) {
        self.lock().destroy();
    }
}

/// Effect key → controller mapping owned by one engine
#[derive(Default)]
pub struct ControllerRegistry {
    controllers: IndexMap<String, Box<dyn Controller>>,
}

impl ControllerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a controller, returning the one it replaced
    pub fn register(
        &mut self,
        key: impl Into<String>,
        controller: impl Controller + 'static,
    ) -> Option<Box<dyn Controller>> {
        self.controllers.insert(key.into(), Box::new(controller))
    }

    /// Builder-style [`register`](Self::register)
    pub fn with(mut self, key: impl Into<String>, controller: impl Controller + 'static) -> Self {
        self.register(key, controller);
        self
    }

    /// Remove a controller
    pub fn remove(&mut self, key: &str) -> Option<Box<dyn Controller>> {
        self.controllers.shift_remove(key)
    }

    /// Whether a key is registered
    pub fn contains(&self, key: &str) -> bool {
        self.controllers.contains_key(key)
    }

    /// Get a controller by key
    pub fn get_mut(&mut self, key: &str) -> Option<&mut (dyn Controller + 'static)> {
        self.controllers.get_mut(key).map(|c| c.as_mut())
    }

    /// Registered keys in registration order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.controllers.keys().map(String::as_str)
    }

    /// Number of registered controllers
    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }

    /// Whether an action on `track` resolves to a registered controller
    pub fn resolves(&self, action: &Action, track: &Track) -> bool {
        track.effect_for(action).is_some_and(|key| self.contains(key))
    }

    /// Controller governing an action on `track`
    pub fn resolve_mut(
        &mut self,
        action: &Action,
        track: &Track,
    ) -> Option<&mut (dyn Controller + 'static)> {
        let key = track.effect_for(action)?;
        self.get_mut(key)
    }

    pub(crate) fn for_each_mut(&mut self, mut f: impl FnMut(&str, &mut dyn Controller)) {
        for (key, controller) in self.controllers.iter_mut() {
            f(key, controller.as_mut());
        }
    }
}

impl fmt::Debug for ControllerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerRegistry")
            .field("keys", &self.controllers.keys().collect::<Vec<_>>())
            .finish()
    }
}
