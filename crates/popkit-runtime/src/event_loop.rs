#![forbid(unsafe_code)]

//! Cooperative single-threaded event loop with a virtual clock.
//!
//! Browsers run overlay logic on one thread: nothing blocks, and "waiting" is
//! a scheduled callback (a timer or the next animation frame). [`EventLoop`]
//! models exactly that, with time that only moves when the host says so.
//! A browser binding advances it from `requestAnimationFrame` / `setTimeout`
//! callbacks; tests advance it explicitly, which makes every interleaving of
//! timers reproducible.
//!
//! # Ordering
//!
//! - Timers fire in order of due time, ties broken by scheduling order.
//! - [`advance`](EventLoop::advance) runs one render pass (queued frame
//!   callbacks) first, then every timer due within the window, then a second
//!   render pass for frames queued by those timers.
//! - Frame callbacks queued while a render pass runs wait for the next pass.
//!
//! # Re-entrancy
//!
//! Callbacks run with no internal borrow held, so they may schedule, cancel,
//! or query the loop freely. Cancelling a timer that is already due but not
//! yet fired guarantees it never fires.
//!
//! # Failure Modes
//!
//! - Cancelling an unknown or already-fired timer returns `false`.
//! - [`run_until_idle`](EventLoop::run_until_idle) stops after
//!   [`MAX_IDLE_STEPS`] callbacks so a self-rescheduling callback cannot hang
//!   the caller; a warning is logged when the cap is hit.

use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::rc::Rc;

use ahash::AHashMap;
use web_time::Duration;

/// Upper bound on callbacks executed by one `run_until_idle` call.
pub const MAX_IDLE_STEPS: usize = 10_000;

type Task = Box<dyn FnOnce()>;

/// Token identifying a scheduled timer or frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

impl TimerId {
    /// Raw sequence number (monotonic per loop).
    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Shared handle to the loop. Clones refer to the same loop.
#[derive(Clone, Default)]
pub struct EventLoop {
    inner: Rc<RefCell<LoopState>>,
}

#[derive(Default)]
struct LoopState {
    now: Duration,
    next_id: u64,
    timers: BTreeMap<(Duration, u64), Task>,
    due: AHashMap<u64, Duration>,
    frames: VecDeque<(u64, Task)>,
    fired: u64,
}

impl LoopState {
    fn alloc_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

impl EventLoop {
    /// Create an idle loop at time zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time since the loop was created.
    #[must_use]
    pub fn now(&self) -> Duration {
        self.inner.borrow().now
    }

    /// Run `task` once `delay` has elapsed.
    pub fn schedule(&self, delay: Duration, task: impl FnOnce() + 'static) -> TimerId {
        let mut state = self.inner.borrow_mut();
        let id = state.alloc_id();
        let due = state.now + delay;
        state.timers.insert((due, id), Box::new(task));
        state.due.insert(id, due);
        tracing::trace!(message = "loop.schedule", timer = id, delay_ms = delay.as_millis() as u64);
        TimerId(id)
    }

    /// Like [`schedule`](Self::schedule), but `task` receives its own token.
    ///
    /// Lets a callback verify it is still the timer its owner expects.
    pub fn schedule_with_token(
        &self,
        delay: Duration,
        task: impl FnOnce(TimerId) + 'static,
    ) -> TimerId {
        let mut state = self.inner.borrow_mut();
        let id = state.alloc_id();
        let due = state.now + delay;
        state.timers.insert((due, id), Box::new(move || task(TimerId(id))));
        state.due.insert(id, due);
        tracing::trace!(message = "loop.schedule", timer = id, delay_ms = delay.as_millis() as u64);
        TimerId(id)
    }

    /// Run `task` on the next render pass.
    pub fn next_frame(&self, task: impl FnOnce() + 'static) -> TimerId {
        let mut state = self.inner.borrow_mut();
        let id = state.alloc_id();
        state.frames.push_back((id, Box::new(task)));
        TimerId(id)
    }

    /// Cancel a pending timer or frame callback.
    ///
    /// Returns `true` if something was removed.
    pub fn cancel(&self, id: TimerId) -> bool {
        let mut state = self.inner.borrow_mut();
        if let Some(due) = state.due.remove(&id.0) {
            state.timers.remove(&(due, id.0));
            tracing::trace!(message = "loop.cancel", timer = id.0);
            return true;
        }
        if let Some(pos) = state.frames.iter().position(|(fid, _)| *fid == id.0) {
            state.frames.remove(pos);
            return true;
        }
        false
    }

    /// Whether `id` is still waiting to run.
    #[must_use]
    pub fn is_pending(&self, id: TimerId) -> bool {
        let state = self.inner.borrow();
        state.due.contains_key(&id.0) || state.frames.iter().any(|(fid, _)| *fid == id.0)
    }

    /// Number of outstanding timers (frame callbacks excluded).
    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.inner.borrow().timers.len()
    }

    /// Number of queued frame callbacks.
    #[must_use]
    pub fn pending_frames(&self) -> usize {
        self.inner.borrow().frames.len()
    }

    /// Total callbacks executed so far.
    #[must_use]
    pub fn fired(&self) -> u64 {
        self.inner.borrow().fired
    }

    /// Run one render pass: every frame callback queued before this call.
    ///
    /// Returns the number of callbacks run.
    pub fn run_frame(&self) -> usize {
        let limit = self.inner.borrow().next_id;
        let mut ran = 0;
        loop {
            let task = {
                let mut state = self.inner.borrow_mut();
                match state.frames.front() {
                    Some((id, _)) if *id <= limit => {
                        state.fired += 1;
                        state.frames.pop_front().map(|(_, task)| task)
                    }
                    _ => None,
                }
            };
            let Some(task) = task else { break };
            task();
            ran += 1;
        }
        ran
    }

    /// Move time forward by `by`, running everything that comes due.
    ///
    /// Returns the number of callbacks run.
    pub fn advance(&self, by: Duration) -> usize {
        let mut ran = self.run_frame();
        let target = self.now() + by;
        while let Some(task) = self.pop_due(target) {
            task();
            ran += 1;
        }
        self.inner.borrow_mut().now = target;
        ran + self.run_frame()
    }

    /// Run frames and timers until nothing is pending, jumping the clock to
    /// each timer's due time.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        while ran < MAX_IDLE_STEPS {
            if self.pending_frames() > 0 {
                ran += self.run_frame();
                continue;
            }
            let next_due = self.inner.borrow().timers.keys().next().map(|(due, _)| *due);
            let Some(due) = next_due else {
                return ran;
            };
            if let Some(task) = self.pop_due(due) {
                task();
                ran += 1;
            }
        }
        tracing::warn!(message = "loop.idle_cap", steps = ran);
        ran
    }

    fn pop_due(&self, limit: Duration) -> Option<Task> {
        let mut state = self.inner.borrow_mut();
        let key = *state.timers.keys().next()?;
        if key.0 > limit {
            return None;
        }
        let task = state.timers.remove(&key)?;
        state.due.remove(&key.1);
        if key.0 > state.now {
            state.now = key.0;
        }
        state.fired += 1;
        tracing::trace!(message = "loop.fire", timer = key.1);
        Some(task)
    }
}

impl fmt::Debug for EventLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.borrow();
        f.debug_struct("EventLoop")
            .field("now", &state.now)
            .field("timers", &state.timers.len())
            .field("frames", &state.frames.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn recorder() -> (Rc<RefCell<Vec<&'static str>>>, impl Fn(&'static str) -> Box<dyn FnOnce()>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        let make = move |name: &'static str| -> Box<dyn FnOnce()> {
            let sink = Rc::clone(&sink);
            Box::new(move || sink.borrow_mut().push(name))
        };
        (log, make)
    }

    #[test]
    fn timers_fire_in_due_order() {
        let lp = EventLoop::new();
        let (log, make) = recorder();
        lp.schedule(ms(30), make("c"));
        lp.schedule(ms(10), make("a"));
        lp.schedule(ms(20), make("b"));
        assert_eq!(lp.advance(ms(100)), 3);
        assert_eq!(*log.borrow(), vec!["a", "b", "c"]);
        assert_eq!(lp.now(), ms(100));
    }

    #[test]
    fn ties_fire_in_schedule_order() {
        let lp = EventLoop::new();
        let (log, make) = recorder();
        lp.schedule(ms(5), make("first"));
        lp.schedule(ms(5), make("second"));
        lp.advance(ms(5));
        assert_eq!(*log.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn timer_not_due_does_not_fire() {
        let lp = EventLoop::new();
        let (log, make) = recorder();
        let id = lp.schedule(ms(50), make("late"));
        lp.advance(ms(49));
        assert!(log.borrow().is_empty());
        assert!(lp.is_pending(id));
        lp.advance(ms(1));
        assert_eq!(*log.borrow(), vec!["late"]);
        assert!(!lp.is_pending(id));
    }

    #[test]
    fn cancelled_timer_never_fires() {
        let lp = EventLoop::new();
        let (log, make) = recorder();
        let id = lp.schedule(ms(10), make("x"));
        assert!(lp.cancel(id));
        assert!(!lp.cancel(id));
        lp.advance(ms(20));
        assert!(log.borrow().is_empty());
        assert_eq!(lp.pending_timers(), 0);
    }

    #[test]
    fn callback_can_cancel_a_timer_due_in_same_window() {
        let lp = EventLoop::new();
        let (log, make) = recorder();
        let victim = lp.schedule(ms(20), make("victim"));
        let handle = lp.clone();
        lp.schedule(ms(10), move || {
            handle.cancel(victim);
        });
        lp.advance(ms(50));
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn callback_can_reschedule() {
        let lp = EventLoop::new();
        let (log, make) = recorder();
        let handle = lp.clone();
        let follow = make("follow");
        lp.schedule(ms(10), move || {
            handle.schedule(ms(10), follow);
        });
        lp.advance(ms(15));
        assert!(log.borrow().is_empty());
        lp.advance(ms(5));
        assert_eq!(*log.borrow(), vec!["follow"]);
    }

    #[test]
    fn frames_queued_during_pass_wait_for_next_pass() {
        let lp = EventLoop::new();
        let (log, make) = recorder();
        let handle = lp.clone();
        let inner = make("inner");
        lp.next_frame(move || {
            handle.next_frame(inner);
        });
        assert_eq!(lp.run_frame(), 1);
        assert!(log.borrow().is_empty());
        assert_eq!(lp.run_frame(), 1);
        assert_eq!(*log.borrow(), vec!["inner"]);
    }

    #[test]
    fn frame_can_be_cancelled() {
        let lp = EventLoop::new();
        let (log, make) = recorder();
        let id = lp.next_frame(make("f"));
        assert!(lp.is_pending(id));
        assert!(lp.cancel(id));
        lp.run_frame();
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn advance_runs_frames_queued_by_timers() {
        let lp = EventLoop::new();
        let (log, make) = recorder();
        let handle = lp.clone();
        let frame = make("frame");
        lp.schedule(ms(10), move || {
            handle.next_frame(frame);
        });
        lp.advance(ms(10));
        assert_eq!(*log.borrow(), vec!["frame"]);
    }

    #[test]
    fn run_until_idle_drains_everything() {
        let lp = EventLoop::new();
        let (log, make) = recorder();
        lp.schedule(ms(500), make("t"));
        lp.next_frame(make("f"));
        let ran = lp.run_until_idle();
        assert_eq!(ran, 2);
        assert_eq!(*log.borrow(), vec!["f", "t"]);
        assert_eq!(lp.now(), ms(500));
    }

    #[test]
    fn run_until_idle_caps_runaway_rescheduling() {
        fn forever(lp: EventLoop) {
            let next = lp.clone();
            lp.schedule(Duration::from_millis(1), move || forever(next));
        }
        let lp = EventLoop::new();
        forever(lp.clone());
        assert_eq!(lp.run_until_idle(), MAX_IDLE_STEPS);
        assert_eq!(lp.pending_timers(), 1);
    }

    #[test]
    fn fired_counts_callbacks() {
        let lp = EventLoop::new();
        lp.schedule(ms(1), || {});
        lp.next_frame(|| {});
        lp.advance(ms(1));
        assert_eq!(lp.fired(), 2);
    }

    #[test]
    fn token_matches_returned_id() {
        let lp = EventLoop::new();
        let seen = Rc::new(std::cell::Cell::new(None));
        let sink = Rc::clone(&seen);
        let id = lp.schedule_with_token(ms(5), move |token| sink.set(Some(token)));
        assert!(lp.is_pending(id));
        lp.advance(ms(5));
        assert_eq!(seen.get(), Some(id));
    }
}
