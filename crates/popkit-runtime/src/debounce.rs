#![forbid(unsafe_code)]

//! Debounced invocation: collapse bursts of calls into one delayed call.
//!
//! [`DebouncedSignal`] wraps a callback so that every [`call`] restarts a
//! quiet-period timer and replaces the pending arguments. Only when `delay`
//! passes with no further call does the callback run, once, with the most
//! recent arguments.
//!
//! # Invariants
//!
//! 1. At most one invocation is pending at any time.
//! 2. The callback receives the arguments of the last `call` before firing.
//! 3. `cancel()` drops the pending invocation without running it.
//! 4. Nothing runs synchronously inside `call`.
//!
//! [`call`]: DebouncedSignal::call

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use web_time::Duration;

use crate::event_loop::{EventLoop, TimerId};

/// Default quiet period for debounced "show" requests.
pub const DEFAULT_SHOW_DEBOUNCE: Duration = Duration::from_millis(100);

/// A callback whose invocations are debounced on an [`EventLoop`].
///
/// Clones share the same pending state.
pub struct DebouncedSignal<A: 'static> {
    inner: Rc<DebounceInner<A>>,
}

struct DebounceInner<A> {
    event_loop: EventLoop,
    delay: Cell<Duration>,
    pending: RefCell<Option<Pending<A>>>,
    callback: Box<dyn Fn(A)>,
}

struct Pending<A> {
    timer: TimerId,
    args: A,
}

impl<A: 'static> Clone for DebouncedSignal<A> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<A: 'static> DebouncedSignal<A> {
    /// Wrap `callback` with a quiet period of `delay`.
    pub fn new(event_loop: EventLoop, delay: Duration, callback: impl Fn(A) + 'static) -> Self {
        Self {
            inner: Rc::new(DebounceInner {
                event_loop,
                delay: Cell::new(delay),
                pending: RefCell::new(None),
                callback: Box::new(callback),
            }),
        }
    }

    /// Schedule the callback with `args`, superseding any pending call.
    pub fn call(&self, args: A) {
        let inner = &self.inner;
        if let Some(prev) = inner.pending.borrow_mut().take() {
            inner.event_loop.cancel(prev.timer);
        }
        let weak: Weak<DebounceInner<A>> = Rc::downgrade(inner);
        let timer = inner.event_loop.schedule(inner.delay.get(), move || {
            if let Some(inner) = weak.upgrade() {
                fire(&inner);
            }
        });
        *inner.pending.borrow_mut() = Some(Pending { timer, args });
    }

    /// Drop the pending invocation, if any. Returns whether one was pending.
    pub fn cancel(&self) -> bool {
        match self.inner.pending.borrow_mut().take() {
            Some(prev) => {
                self.inner.event_loop.cancel(prev.timer);
                true
            }
            None => false,
        }
    }

    /// Run the pending invocation now instead of waiting.
    ///
    /// Returns whether anything ran.
    pub fn flush(&self) -> bool {
        let pending = self.inner.pending.borrow_mut().take();
        match pending {
            Some(prev) => {
                self.inner.event_loop.cancel(prev.timer);
                (self.inner.callback)(prev.args);
                true
            }
            None => false,
        }
    }

    /// Whether an invocation is waiting to fire.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.inner.pending.borrow().is_some()
    }

    /// Timer backing the pending invocation.
    #[must_use]
    pub fn pending_timer(&self) -> Option<TimerId> {
        self.inner.pending.borrow().as_ref().map(|p| p.timer)
    }

    /// Current quiet period.
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.inner.delay.get()
    }

    /// Change the quiet period for subsequent calls.
    pub fn set_delay(&self, delay: Duration) {
        self.inner.delay.set(delay);
    }
}

fn fire<A>(inner: &DebounceInner<A>) {
    let pending = inner.pending.borrow_mut().take();
    if let Some(pending) = pending {
        (inner.callback)(pending.args);
    }
}

impl<A: 'static> fmt::Debug for DebouncedSignal<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DebouncedSignal")
            .field("delay", &self.delay())
            .field("pending", &self.is_pending())
            .finish()
    }
}
