// SPDX-License-Identifier: MIT OR Apache-2.0
//! Typed publish/subscribe.
//!
//! Listeners are grouped per event kind into two buckets:
//! - "first" listeners, invoked newest-first ahead of everything else
//! - regular listeners, invoked in registration order
//!
//! Any listener may veto a cancellable event by returning `false` or
//! [`Verdict::Cancel`]; every listener still runs.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::Hash;
use std::rc::Rc;

/// An event that can be routed by its kind
pub trait Event {
    /// Tag used to group listeners
    type Kind: Copy + Eq + Hash + fmt::Debug;

    /// The tag of this event
    fn kind(&self) -> Self::Kind;
}

/// Outcome of a listener or of a whole emission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verdict {
    /// Let the operation go ahead
    #[default]
    Proceed,
    /// Veto the operation
    Cancel,
}

impl Verdict {
    /// Whether the operation may go ahead
    pub fn proceeds(self) -> bool {
        self == Verdict::Proceed
    }

    fn and(self, other: Verdict) -> Verdict {
        if self == Verdict::Cancel || other == Verdict::Cancel {
            Verdict::Cancel
        } else {
            Verdict::Proceed
        }
    }
}

impl From<()> for Verdict {
    fn from(_: ()) -> Self {
        Verdict::Proceed
    }
}

impl From<bool> for Verdict {
    fn from(proceed: bool) -> Self {
        if proceed {
            Verdict::Proceed
        } else {
            Verdict::Cancel
        }
    }
}

/// A registered handler. Clones share identity.
pub struct Listener<E>(Rc<dyn Fn(&E) -> Verdict>);

impl<E> Listener<E> {
    /// Wrap a handler returning `()`, `bool` or [`Verdict`]
    pub fn new<F, R>(handler: F) -> Self
    where
        F: Fn(&E) -> R + 'static,
        R: Into<Verdict>,
    {
        Self(Rc::new(move |event: &E| handler(event).into()))
    }

    /// Whether both handles refer to the same handler
    pub fn same(&self, other: &Listener<E>) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    fn call(&self, event: &E) -> Verdict {
        (self.0)(event)
    }
}

impl<E> Clone for Listener<E> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<E> fmt::Debug for Listener<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Listener").field(&Rc::as_ptr(&self.0)).finish()
    }
}

/// Registration options
#[derive(Debug, Clone, Copy, Default)]
pub struct ListenOptions {
    /// Route into the high-priority bucket
    pub first: bool,
}

impl ListenOptions {
    /// High-priority registration
    pub fn first() -> Self {
        Self { first: true }
    }
}

struct Slot<E> {
    listener: Listener<E>,
    once: bool,
}

impl<E> Clone for Slot<E> {
    fn clone(&self) -> Self {
        Self {
            listener: self.listener.clone(),
            once: self.once,
        }
    }
}

struct Buckets<E> {
    first: Vec<Slot<E>>,
    regular: Vec<Slot<E>>,
}

impl<E> Default for Buckets<E> {
    fn default() -> Self {
        Self {
            first: Vec::new(),
            regular: Vec::new(),
        }
    }
}

impl<E> Buckets<E> {
    fn len(&self) -> usize {
        self.first.len() + self.regular.len()
    }

    fn bucket_mut(&mut self, first: bool) -> &mut Vec<Slot<E>> {
        if first {
            &mut self.first
        } else {
            &mut self.regular
        }
    }

    /// Invocation order: first bucket newest-first, then regular oldest-first
    fn ordered(&self) -> Vec<Slot<E>> {
        self.first
            .iter()
            .rev()
            .chain(self.regular.iter())
            .cloned()
            .collect()
    }
}

/// Event dispatcher keyed by [`Event::Kind`]
pub struct Emitter<E: Event> {
    listeners: HashMap<E::Kind, Buckets<E>>,
    max_listeners: usize,
    warned: HashSet<E::Kind>,
}

impl<E: Event> Emitter<E> {
    /// Default leak-warning threshold
    pub const DEFAULT_MAX_LISTENERS: usize = 20;

    /// Create an emitter with the default leak-warning threshold
    pub fn new() -> Self {
        Self::with_max_listeners(Self::DEFAULT_MAX_LISTENERS)
    }

    /// Create an emitter that warns above `max_listeners` per event
    pub fn with_max_listeners(max_listeners: usize) -> Self {
        Self {
            listeners: HashMap::new(),
            max_listeners,
            warned: HashSet::new(),
        }
    }

    /// Change the leak-warning threshold
    pub fn set_max_listeners(&mut self, max_listeners: usize) {
        self.max_listeners = max_listeners;
    }

    /// Register a regular listener
    pub fn on<F, R>(&mut self, kind: E::Kind, handler: F) -> Listener<E>
    where
        F: Fn(&E) -> R + 'static,
        R: Into<Verdict>,
    {
        self.on_with(kind, handler, ListenOptions::default())
    }

    /// Register a listener with options
    pub fn on_with<F, R>(
        &mut self,
        kind: E::Kind,
        handler: F,
        options: ListenOptions,
    ) -> Listener<E>
    where
        F: Fn(&E) -> R + 'static,
        R: Into<Verdict>,
    {
        let listener = Listener::new(handler);
        self.insert(kind, listener.clone(), options, false);
        listener
    }

    /// Register a listener that is dropped before its first call
    pub fn once<F, R>(&mut self, kind: E::Kind, handler: F) -> Listener<E>
    where
        F: Fn(&E) -> R + 'static,
        R: Into<Verdict>,
    {
        let listener = Listener::new(handler);
        self.insert(kind, listener.clone(), ListenOptions::default(), true);
        listener
    }

    /// Register an existing handle.
    ///
    /// Returns `false` when the handle is already in the target bucket.
    pub fn add_listener(
        &mut self,
        kind: E::Kind,
        listener: Listener<E>,
        options: ListenOptions,
    ) -> bool {
        self.insert(kind, listener, options, false)
    }

    fn insert(
        &mut self,
        kind: E::Kind,
        listener: Listener<E>,
        options: ListenOptions,
        once: bool,
    ) -> bool {
        let buckets = self.listeners.entry(kind).or_default();
        let bucket = buckets.bucket_mut(options.first);
        if bucket.iter().any(|slot| slot.listener.same(&listener)) {
            return false;
        }
        bucket.push(Slot { listener, once });

        let count = buckets.len();
        if cfg!(debug_assertions) && count > self.max_listeners && self.warned.insert(kind) {
            tracing::warn!(
                "Possible listener leak: {} listeners registered for {:?} (threshold {})",
                count,
                kind,
                self.max_listeners
            );
        }
        true
    }

    /// Remove a handle from both buckets of `kind`
    pub fn remove_listener(&mut self, kind: E::Kind, listener: &Listener<E>) -> bool {
        let Some(buckets) = self.listeners.get_mut(&kind) else {
            return false;
        };
        let before = buckets.len();
        buckets.first.retain(|slot| !slot.listener.same(listener));
        buckets.regular.retain(|slot| !slot.listener.same(listener));
        buckets.len() != before
    }

    /// Remove every listener of `kind`, or of every kind when `None`
    pub fn remove_all_listeners(&mut self, kind: Option<E::Kind>) {
        match kind {
            Some(kind) => {
                self.listeners.remove(&kind);
                self.warned.remove(&kind);
            }
            None => {
                self.listeners.clear();
                self.warned.clear();
            }
        }
    }

    /// Number of listeners registered for `kind`
    pub fn listener_count(&self, kind: E::Kind) -> usize {
        self.listeners.get(&kind).map_or(0, Buckets::len)
    }

    /// Dispatch `event` to its listeners.
    ///
    /// Returns [`Verdict::Cancel`] if any listener vetoed it.
    pub fn emit(&mut self, event: &E) -> Verdict {
        let Some(buckets) = self.listeners.get_mut(&event.kind()) else {
            return Verdict::Proceed;
        };
        let ordered = buckets.ordered();
        if ordered.iter().any(|slot| slot.once) {
            buckets.first.retain(|slot| !slot.once);
            buckets.regular.retain(|slot| !slot.once);
        }

        ordered
            .iter()
            .fold(Verdict::Proceed, |verdict, slot| verdict.and(slot.listener.call(event)))
    }
}

impl<E: Event> Default for Emitter<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Event> fmt::Debug for Emitter<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: Vec<_> = self
            .listeners
            .iter()
            .map(|(kind, buckets)| (*kind, buckets.len()))
            .collect();
        f.debug_struct("Emitter")
            .field("listeners", &counts)
            .field("max_listeners", &self.max_listeners)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Kind {
        Ping,
        Pong,
    }

    struct Msg(Kind, u32);

    impl Event for Msg {
        type Kind = Kind;

        fn kind(&self) -> Kind {
            self.0
        }
    }

    fn recorder() -> (Rc<RefCell<Vec<&'static str>>>, impl Fn(&'static str) -> Box<dyn Fn(&Msg)>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        let make = move |name: &'static str| {
            let sink = Rc::clone(&sink);
            Box::new(move |_: &Msg| sink.borrow_mut().push(name)) as Box<dyn Fn(&Msg)>
        };
        (log, make)
    }

    #[test]
    fn test_first_bucket_runs_reversed_before_regular() {
        let (log, make) = recorder();
        let mut emitter = Emitter::new();
        emitter.on(Kind::Ping, make("r1"));
        emitter.on_with(Kind::Ping, make("f1"), ListenOptions::first());
        emitter.on(Kind::Ping, make("r2"));
        emitter.on_with(Kind::Ping, make("f2"), ListenOptions::first());

        emitter.emit(&Msg(Kind::Ping, 0));
        assert_eq!(*log.borrow(), vec!["f2", "f1", "r1", "r2"]);
    }

    #[test]
    fn test_emit_without_listeners_proceeds() {
        let mut emitter: Emitter<Msg> = Emitter::new();
        assert_eq!(emitter.emit(&Msg(Kind::Pong, 1)), Verdict::Proceed);
    }

    #[test]
    fn test_any_false_cancels_but_all_run() {
        let calls = Rc::new(RefCell::new(0));
        let mut emitter = Emitter::new();
        let c = Rc::clone(&calls);
        emitter.on(Kind::Ping, move |_: &Msg| {
            *c.borrow_mut() += 1;
            false
        });
        let c = Rc::clone(&calls);
        emitter.on(Kind::Ping, move |msg: &Msg| {
            *c.borrow_mut() += 1;
            msg.1 > 0
        });

        assert_eq!(emitter.emit(&Msg(Kind::Ping, 5)), Verdict::Cancel);
        assert_eq!(*calls.borrow(), 2);
    }

    #[test]
    fn test_once_fires_a_single_time() {
        let (log, make) = recorder();
        let mut emitter = Emitter::new();
        emitter.once(Kind::Ping, make("once"));
        emitter.on(Kind::Ping, make("always"));

        emitter.emit(&Msg(Kind::Ping, 0));
        emitter.emit(&Msg(Kind::Ping, 0));
        assert_eq!(*log.borrow(), vec!["once", "always", "always"]);
        assert_eq!(emitter.listener_count(Kind::Ping), 1);
    }

    #[test]
    fn test_duplicate_handle_is_ignored_per_bucket() {
        let (log, make) = recorder();
        let mut emitter = Emitter::new();
        let listener = Listener::new(make("dup"));

        assert!(emitter.add_listener(Kind::Ping, listener.clone(), ListenOptions::default()));
        assert!(!emitter.add_listener(Kind::Ping, listener.clone(), ListenOptions::default()));
        assert!(emitter.add_listener(Kind::Ping, listener.clone(), ListenOptions::first()));
        assert_eq!(emitter.listener_count(Kind::Ping), 2);

        emitter.emit(&Msg(Kind::Ping, 0));
        assert_eq!(log.borrow().len(), 2);
    }

    #[test]
    fn test_remove_listener_and_remove_all() {
        let (log, make) = recorder();
        let mut emitter = Emitter::new();
        let ping = emitter.on(Kind::Ping, make("ping"));
        emitter.on(Kind::Pong, make("pong"));

        assert!(emitter.remove_listener(Kind::Ping, &ping));
        assert!(!emitter.remove_listener(Kind::Ping, &ping));
        emitter.emit(&Msg(Kind::Ping, 0));
        emitter.emit(&Msg(Kind::Pong, 0));
        assert_eq!(*log.borrow(), vec!["pong"]);

        emitter.remove_all_listeners(None);
        assert_eq!(emitter.listener_count(Kind::Pong), 0);
    }

    #[test]
    fn test_threshold_is_not_a_hard_limit() {
        let mut emitter = Emitter::with_max_listeners(2);
        for _ in 0..5 {
            emitter.on(Kind::Ping, |_: &Msg| {});
        }
        assert_eq!(emitter.listener_count(Kind::Ping), 5);
    }
}
