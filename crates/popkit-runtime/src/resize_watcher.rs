#![forbid(unsafe_code)]

//! Debounced box-size observation for a single node.
//!
//! [`ResizeWatcher`] subscribes to a node's resize notifications and forwards
//! them through a [`DebouncedSignal`]. A flurry of reflows (window drag, web
//! font swap, tags wrapping) inside one latency window yields exactly one
//! callback carrying the final measurement.
//!
//! The watcher holds no application state. It is a notifier whose lifetime is
//! tied to the owning widget: `observe` on mount, `unobserve` (or drop) on
//! unmount.
//!
//! # Invariants
//!
//! 1. At most one node is observed; observing another replaces the first.
//! 2. `unobserve` detaches the observation and cancels a pending callback.
//! 3. `unobserve` is idempotent.

use std::fmt;

use popkit_core::{Measurable, Measurement, Subscription};
use std::rc::Rc;
use web_time::Duration;

use crate::debounce::DebouncedSignal;
use crate::event_loop::EventLoop;

/// Default latency between the last size change and the callback.
pub const DEFAULT_RESIZE_LATENCY: Duration = Duration::from_millis(120);

/// Debounced observer of one node's size.
pub struct ResizeWatcher {
    event_loop: EventLoop,
    latency: Duration,
    signal: Option<DebouncedSignal<Measurement>>,
    subscription: Option<Subscription>,
}

impl ResizeWatcher {
    /// Create an idle watcher.
    #[must_use]
    pub fn new(event_loop: EventLoop, latency: Duration) -> Self {
        Self {
            event_loop,
            latency,
            signal: None,
            subscription: None,
        }
    }

    /// Create an idle watcher with [`DEFAULT_RESIZE_LATENCY`].
    #[must_use]
    pub fn with_default_latency(event_loop: EventLoop) -> Self {
        Self::new(event_loop, DEFAULT_RESIZE_LATENCY)
    }

    /// Start observing `node`. Replaces any previous observation.
    pub fn observe<M: Measurable + ?Sized>(
        &mut self,
        node: &M,
        on_change: impl Fn(Measurement) + 'static,
    ) {
        self.unobserve();
        let signal = DebouncedSignal::new(self.event_loop.clone(), self.latency, on_change);
        let forward = signal.clone();
        self.subscription = Some(node.observe_resize(Rc::new(move |m: Measurement| forward.call(m))));
        self.signal = Some(signal);
        tracing::debug!(
            message = "resize.observe",
            latency_ms = self.latency.as_millis() as u64
        );
    }

    /// Stop observing. Safe to call any number of times.
    pub fn unobserve(&mut self) {
        if let Some(mut sub) = self.subscription.take() {
            sub.cancel();
            tracing::debug!(message = "resize.unobserve");
        }
        if let Some(signal) = self.signal.take() {
            signal.cancel();
        }
    }

    /// Whether a node is currently observed.
    #[must_use]
    pub fn is_observing(&self) -> bool {
        self.subscription.as_ref().is_some_and(Subscription::is_active)
    }

    /// Whether a debounced callback is waiting to fire.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.signal.as_ref().is_some_and(DebouncedSignal::is_pending)
    }

    /// Latency applied to notifications.
    #[must_use]
    pub fn latency(&self) -> Duration {
        self.latency
    }
}

impl Drop for ResizeWatcher {
    fn drop(&mut self) {
        self.unobserve();
    }
}

impl fmt::Debug for ResizeWatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResizeWatcher")
            .field("latency", &self.latency)
            .field("observing", &self.is_observing())
            .field("pending", &self.has_pending())
            .finish()
    }
}
