// SPDX-License-Identifier: MIT OR Apache-2.0
//! Active-set maintenance and controller dispatch.
//!
//! Entry is cursor driven: every time change rewinds the cursor and walks
//! the start-sorted schedule until the first action that has not started.
//! Exit is driven by the active set itself, which handles seeks and
//! overlapping windows independently of sort order. Within one evaluation
//! leave always runs before enter.

use crate::clock::{Clock, PlayState};
use crate::controller::{ControllerRegistry, EngineView, HookContext};
use crate::index::ActionIndex;
use crate::model::{Action, ActionId};
use indexmap::IndexSet;

/// Controller hook selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Hook {
    Start,
    Stop,
    Enter,
    Update,
    Leave,
}

/// Clock, schedule cursor and active set
#[derive(Debug, Clone)]
pub struct Scheduler {
    clock: Clock,
    index: ActionIndex,
    active: IndexSet<ActionId>,
    cursor: usize,
    render_size: (u32, u32),
}

impl Scheduler {
    /// Create a scheduler with an empty schedule
    pub fn new(rate: f64, render_size: (u32, u32)) -> Self {
        Self {
            clock: Clock::new(rate),
            index: ActionIndex::default(),
            active: IndexSet::new(),
            cursor: 0,
            render_size,
        }
    }

    /// The playback clock
    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    /// The action index
    pub fn index(&self) -> &ActionIndex {
        &self.index
    }

    /// Whether an action is active
    pub fn is_active(&self, id: &ActionId) -> bool {
        self.active.contains(id)
    }

    /// Active action ids in activation order
    pub fn active_ids(&self) -> impl Iterator<Item = &ActionId> {
        self.active.iter()
    }

    /// Number of active actions
    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    /// Position of the next unvisited action in the schedule
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Every scheduled action has been reached
    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.index.sorted_ids().len()
    }

    /// Nothing is active now and nothing remains to start
    pub fn is_drained(&self) -> bool {
        self.is_exhausted() && self.active.is_empty()
    }

    pub(crate) fn render_size(&self) -> (u32, u32) {
        self.render_size
    }

    pub(crate) fn set_render_size(&mut self, size: (u32, u32)) {
        self.render_size = size;
    }

    pub(crate) fn set_rate(&mut self, rate: f64) {
        self.clock.rate = rate;
    }

    pub(crate) fn set_state(&mut self, state: PlayState) {
        self.clock.state = state;
    }

    /// Move the clock and re-evaluate membership, leave first.
    ///
    /// Seeks and ticks share this path, so both yield the same active set.
    pub(crate) fn set_time(&mut self, time: f64, controllers: &mut ControllerRegistry) {
        self.cursor = 0;
        self.clock.time = time;
        self.leave(time, controllers);
        self.enter(time, controllers);
    }

    /// Swap in a new schedule: clear against the old one, then re-enter
    pub(crate) fn reindex(&mut self, index: ActionIndex, controllers: &mut ControllerRegistry) {
        self.clear(controllers);
        self.index = index;
        self.enter(self.clock.time, controllers);
    }

    /// Edit the engine's copy of an action and re-evaluate at the current time
    pub(crate) fn edit_action(
        &mut self,
        id: &ActionId,
        edit: impl FnOnce(&mut Action),
        controllers: &mut ControllerRegistry,
    ) -> bool {
        let Some(action) = self.index.action_mut(id) else {
            return false;
        };
        let (start, end) = (action.start, action.end);
        edit(action);
        if action.id != *id {
            tracing::warn!("Action ids are immutable; keeping {}", id);
            action.id = id.clone();
        }
        let retimed = action.start != start || action.end != end;

        if retimed {
            self.index.resort();
        }
        self.cursor = 0;
        let time = self.clock.time;
        self.leave(time, controllers);
        self.enter(time, controllers);
        true
    }

    /// Admit every reached, eligible action not yet active
    pub(crate) fn enter(&mut self, time: f64, controllers: &mut ControllerRegistry) {
        while let Some(id) = self.index.sorted_ids().get(self.cursor).cloned() {
            let Some(action) = self.index.action(&id) else {
                self.cursor += 1;
                continue;
            };
            if action.start > time {
                break;
            }
            self.cursor += 1;

            let Some(track) = self.index.track_of(&id) else {
                continue;
            };
            if action.disable
                || track.hidden
                || action.end <= time
                || self.active.contains(&id)
                || !controllers.resolves(action, track)
            {
                continue;
            }

            if action.data.is_some() {
                self.dispatch(Hook::Enter, &id, controllers);
            }
            tracing::trace!(action = %id, time, "Action entered");
            self.active.insert(id);
        }
    }

    /// Drop every active action whose window no longer holds `time`
    pub(crate) fn leave(&mut self, time: f64, controllers: &mut ControllerRegistry) {
        let mut i = 0;
        while i < self.active.len() {
            if self.is_live(&self.active[i], time, controllers) {
                i += 1;
                continue;
            }
            if let Some(id) = self.active.shift_remove_index(i) {
                self.dispatch(Hook::Leave, &id, controllers);
                tracing::trace!(action = %id, time, "Action left");
            }
        }
    }

    /// Leave everything and rewind the cursor
    pub(crate) fn clear(&mut self, controllers: &mut ControllerRegistry) {
        while let Some(id) = self.active.shift_remove_index(0) {
            self.dispatch(Hook::Leave, &id, controllers);
        }
        self.cursor = 0;
    }

    /// Leave, enter, then `update` every active action
    pub(crate) fn execute(&mut self, time: f64, controllers: &mut ControllerRegistry) {
        self.leave(time, controllers);
        self.enter(time, controllers);
        self.broadcast(Hook::Update, controllers);
    }

    /// Call `hook` for every active action in activation order
    pub(crate) fn broadcast(&self, hook: Hook, controllers: &mut ControllerRegistry) {
        for id in &self.active {
            self.dispatch(hook, id, controllers);
        }
    }

    fn is_live(&self, id: &ActionId, time: f64, controllers: &ControllerRegistry) -> bool {
        match (self.index.action(id), self.index.track_of(id)) {
            (Some(action), Some(track)) => {
                !action.disable
                    && !track.hidden
                    && action.contains(time)
                    && controllers.resolves(action, track)
            }
            _ => false,
        }
    }

    fn dispatch(&self, hook: Hook, id: &ActionId, controllers: &mut ControllerRegistry) {
        let (Some(action), Some(track)) = (self.index.action(id), self.index.track_of(id)) else {
            return;
        };
        let Some(controller) = controllers.resolve_mut(action, track) else {
            return;
        };

        let ctx = HookContext {
            action,
            track,
            time: self.clock.time,
            engine: EngineView::new(self, self.render_size),
        };
        match hook {
            Hook::Start => controller.start(&ctx),
            Hook::Stop => controller.stop(&ctx),
            Hook::Enter => controller.enter(&ctx),
            Hook::Update => controller.update(&ctx),
            Hook::Leave => controller.leave(&ctx),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::Controller;
    use crate::model::Track;

    struct Inert;

    impl Controller for Inert {}

    fn build(tracks: &[Track]) -> (Scheduler, ControllerRegistry) {
        let mut controllers = ControllerRegistry::new().with("fx", Inert);
        let mut scheduler = Scheduler::new(1.0, (1920, 1080));
        scheduler.reindex(ActionIndex::build(tracks), &mut controllers);
        (scheduler, controllers)
    }

    fn active(scheduler: &Scheduler) -> Vec<&str> {
        scheduler.active_ids().map(ActionId::as_str).collect()
    }

    #[test]
    fn test_cursor_rescans_on_every_time_change() {
        let track = Track::new("T")
            .with_controller("fx")
            .with_action(Action::new("a", 0.0, 1.0))
            .with_action(Action::new("b", 2.0, 3.0));
        let (mut scheduler, mut controllers) = build(&[track]);
        assert_eq!(scheduler.cursor(), 1);

        scheduler.set_time(2.5, &mut controllers);
        assert_eq!(scheduler.cursor(), 2);
        assert!(scheduler.is_exhausted());
        assert_eq!(active(&scheduler), vec!["b"]);

        scheduler.set_time(0.5, &mut controllers);
        assert_eq!(scheduler.cursor(), 1);
        assert_eq!(active(&scheduler), vec!["a"]);
    }

    #[test]
    fn test_disabled_and_hidden_are_skipped_but_passed() {
        let mut hidden = Track::new("H")
            .with_controller("fx")
            .with_action(Action::new("h", 0.0, 5.0));
        hidden.hidden = true;
        let track = Track::new("T")
            .with_controller("fx")
            .with_action(Action::new("d", 0.0, 5.0).disabled())
            .with_action(Action::new("ok", 0.0, 5.0));
        let (scheduler, _) = build(&[hidden, track]);

        assert_eq!(active(&scheduler), vec!["ok"]);
        assert_eq!(scheduler.cursor(), 3);
    }

    #[test]
    fn test_unresolved_controller_is_inert() {
        let track = Track::new("T").with_action(Action::new("a", 0.0, 5.0).with_effect("missing"));
        let (scheduler, _) = build(&[track]);
        assert!(scheduler.is_drained());
    }

    #[test]
    fn test_registry_changes_apply_on_next_time_change() {
        let track = Track::new("T")
            .with_controller("late")
            .with_action(Action::new("x", 0.0, 10.0));
        let (mut scheduler, mut controllers) = build(&[track]);
        scheduler.set_time(1.0, &mut controllers);
        assert!(active(&scheduler).is_empty());

        controllers.register("late", Inert);
        scheduler.set_time(1.1, &mut controllers);
        assert_eq!(active(&scheduler), vec!["x"]);

        controllers.remove("late");
        scheduler.set_time(1.2, &mut controllers);
        assert!(active(&scheduler).is_empty());
    }

    #[test]
    fn test_edit_action_retimes_membership() {
        let track = Track::new("T")
            .with_controller("fx")
            .with_action(Action::new("a", 0.0, 5.0))
            .with_action(Action::new("b", 6.0, 8.0));
        let (mut scheduler, mut controllers) = build(&[track]);
        assert_eq!(active(&scheduler), vec!["a"]);

        let edited = scheduler.edit_action(
            &ActionId::from("b"),
            |b| {
                b.start = 0.0;
                b.end = 2.0;
            },
            &mut controllers,
        );
        assert!(edited);
        assert_eq!(active(&scheduler), vec!["a", "b"]);
        assert_eq!(scheduler.index().sorted_ids()[1].as_str(), "b");

        scheduler.edit_action(&ActionId::from("a"), |a| a.disable = true, &mut controllers);
        assert_eq!(active(&scheduler), vec!["b"]);
        assert!(!scheduler.edit_action(&ActionId::from("nope"), |_| {}, &mut controllers));
    }
}
