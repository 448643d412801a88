#![forbid(unsafe_code)]

//! Owned listener/observer registrations.
//!
//! Every listener a collaborator hands out (DOM event listeners, resize
//! observations, document-level click handlers) comes back as a
//! [`Subscription`]. Holding the value keeps the registration alive;
//! cancelling or dropping it detaches exactly once.
//!
//! Storing a subscription in an `Option<Subscription>` turns "at most one
//! listener attached" into a property of the type: attaching a second one
//! means replacing the first, which drops (and detaches) it.
//!
//! # Invariants
//!
//! 1. The teardown closure runs at most once.
//! 2. `cancel()` after `cancel()` (or after drop of a clone of the state) is a
//!    no-op.
//! 3. Dropping an active subscription detaches it.

use std::fmt;

/// Handle to an attached listener or observer.
#[must_use = "dropping a Subscription detaches the listener immediately"]
pub struct Subscription {
    label: &'static str,
    teardown: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Wrap a teardown action.
    pub fn new(label: &'static str, teardown: impl FnOnce() + 'static) -> Self {
        Self {
            label,
            teardown: Some(Box::new(teardown)),
        }
    }

    /// A subscription with nothing to detach.
    ///
    /// Collaborators that cannot observe a node (e.g. a detached element)
    /// return this instead of failing.
    pub fn inert(label: &'static str) -> Self {
        Self {
            label,
            teardown: None,
        }
    }

    /// Short description used in logs.
    #[inline]
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Whether the registration is still attached.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.teardown.is_some()
    }

    /// Detach now. Safe to call repeatedly.
    pub fn cancel(&mut self) {
        if let Some(teardown) = self.teardown.take() {
            teardown();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("label", &self.label)
            .field("active", &self.is_active())
            .finish()
    }
}
