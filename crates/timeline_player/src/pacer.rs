// SPDX-License-Identifier: MIT OR Apache-2.0
//! Fixed-interval frame port.
//!
//! The engine owns one handle and requests frames through it; the host loop
//! keeps a clone and asks when the pending frame is due.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};
use timeline_engine::{FrameId, FrameScheduler};

#[derive(Debug)]
struct PacerState {
    interval: Duration,
    next_id: u64,
    pending: Option<(FrameId, Instant)>,
    last_due: Option<Instant>,
    requested: u64,
    cancelled: u64,
}

/// Frame port that spaces frames `interval` apart
#[derive(Debug, Clone)]
pub struct IntervalFrames {
    state: Rc<RefCell<PacerState>>,
}

impl IntervalFrames {
    /// Create a port delivering frames every `interval`
    pub fn new(interval: Duration) -> Self {
        Self {
            state: Rc::new(RefCell::new(PacerState {
                interval,
                next_id: 0,
                pending: None,
                last_due: None,
                requested: 0,
                cancelled: 0,
            })),
        }
    }

    /// When `frame` should be delivered, if it is still pending
    pub fn due(&self, frame: FrameId) -> Option<Instant> {
        let state = self.state.borrow();
        state.pending.filter(|(id, _)| *id == frame).map(|(_, due)| due)
    }

    /// Frames requested and cancelled so far
    pub fn counts(&self) -> (u64, u64) {
        let state = self.state.borrow();
        (state.requested, state.cancelled)
    }
}

impl FrameScheduler for IntervalFrames {
    fn request_frame(&mut self) -> FrameId {
        let mut state = self.state.borrow_mut();
        let now = Instant::now();
        let interval = state.interval;
        // Missed deadlines are dropped rather than replayed in a burst
        let due = state.last_due.map_or(now, |last| last + interval).max(now);

        state.next_id += 1;
        state.requested += 1;
        let frame = FrameId(state.next_id);
        state.pending = Some((frame, due));
        state.last_due = Some(due);
        frame
    }

    fn cancel_frame(&mut self, frame: FrameId) {
        let mut state = self.state.borrow_mut();
        if state.pending.is_some_and(|(id, _)| id == frame) {
            state.pending = None;
            state.last_due = None;
            state.cancelled += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frames_are_spaced() {
        let interval = Duration::from_millis(20);
        let mut frames = IntervalFrames::new(interval);
        let handle = frames.clone();

        let first = frames.request_frame();
        let first_due = handle.due(first).unwrap();
        let second = frames.request_frame();
        let second_due = handle.due(second).unwrap();

        assert!(second_due >= first_due + interval);
        assert!(handle.due(first).is_none());
    }

    #[test]
    fn test_cancel_drops_pending() {
        let mut frames = IntervalFrames::new(Duration::from_millis(5));
        let handle = frames.clone();
        let frame = frames.request_frame();

        frames.cancel_frame(FrameId(frame.0 + 1));
        assert!(handle.due(frame).is_some());

        frames.cancel_frame(frame);
        assert!(handle.due(frame).is_none());
        assert_eq!(handle.counts(), (1, 1));
    }
}
