#![forbid(unsafe_code)]

//! A single-line tag row that collapses trailing tags into a "+N" badge.
//!
//! [`TagOverflowList`] binds a container node and its measured tag nodes to
//! an [`OverflowLayoutEngine`]. The container is watched for resizes
//! (debounced), tag changes recompute after the next render pass so the new
//! tags have been laid out, and editing mode drops all overflow state so
//! every tag is visible while the user edits.
//!
//! An optional badge [`OverlayController`] (typically hover-triggered) lists
//! the hidden tags. It is hidden whenever nothing overflows.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use popkit_core::NodeRef;
use popkit_layout::{MeasuredItem, OverflowLayoutEngine, OverflowState};
use popkit_runtime::{Duration, EventLoop, ResizeWatcher, TimerId, DEFAULT_RESIZE_LATENCY};

use crate::overlay::OverlayController;

type ChangeHandler<K> = Rc<dyn Fn(&OverflowState<K>)>;

struct TagInner<K> {
    event_loop: EventLoop,
    container: NodeRef,
    tags: Vec<(K, NodeRef)>,
    engine: OverflowLayoutEngine<K>,
    editing: bool,
    watcher: ResizeWatcher,
    pending_frame: Option<TimerId>,
    badge: Option<OverlayController>,
    on_change: Option<ChangeHandler<K>>,
}

/// Overflow-aware tag row. Clones share the same row.
pub struct TagOverflowList<K: Clone + 'static> {
    inner: Rc<RefCell<TagInner<K>>>,
}

impl<K: Clone + 'static> Clone for TagOverflowList<K> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<K: Clone + 'static> TagOverflowList<K> {
    /// Row inside `container`, reserving `badge_width` for the "+N" badge.
    pub fn new(event_loop: EventLoop, container: NodeRef, badge_width: f64) -> Self {
        Self::with_resize_latency(event_loop, container, badge_width, DEFAULT_RESIZE_LATENCY)
    }

    pub fn with_resize_latency(
        event_loop: EventLoop,
        container: NodeRef,
        badge_width: f64,
        latency: Duration,
    ) -> Self {
        Self {
            inner: Rc::new(RefCell::new(TagInner {
                watcher: ResizeWatcher::new(event_loop.clone(), latency),
                event_loop,
                container,
                tags: Vec::new(),
                engine: OverflowLayoutEngine::new(badge_width),
                editing: false,
                pending_frame: None,
                badge: None,
                on_change: None,
            })),
        }
    }

    /// Keep the first `n` tags visible (at least one).
    #[must_use]
    pub fn min_visible(self, n: usize) -> Self {
        {
            let mut inner = self.inner.borrow_mut();
            let engine = OverflowLayoutEngine::new(inner.engine.reserved_width()).with_min_visible(n);
            inner.engine = engine;
        }
        self
    }

    /// Overlay listing hidden tags.
    #[must_use]
    pub fn badge_overlay(self, overlay: OverlayController) -> Self {
        self.inner.borrow_mut().badge = Some(overlay);
        self
    }

    /// Called after every recompute.
    #[must_use]
    pub fn on_change(self, f: impl Fn(&OverflowState<K>) + 'static) -> Self {
        self.inner.borrow_mut().on_change = Some(Rc::new(f));
        self
    }

    fn downgrade(&self) -> Weak<RefCell<TagInner<K>>> {
        Rc::downgrade(&self.inner)
    }

    fn upgrade(weak: &Weak<RefCell<TagInner<K>>>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }

    /// Start watching the container and schedule the first layout pass.
    pub fn mount(&self) {
        let weak = self.downgrade();
        {
            let mut inner = self.inner.borrow_mut();
            let container = Rc::clone(&inner.container);
            inner.watcher.observe(container.as_ref(), move |_| {
                if let Some(list) = Self::upgrade(&weak) {
                    list.recompute();
                }
            });
        }
        self.schedule_recompute();
    }

    /// Replace the tags. Layout runs after the next render pass.
    pub fn set_tags(&self, tags: Vec<(K, NodeRef)>) {
        self.inner.borrow_mut().tags = tags;
        self.schedule_recompute();
    }

    /// Enter or leave editing mode. Editing shows every tag.
    pub fn set_editing(&self, editing: bool) {
        let was = std::mem::replace(&mut self.inner.borrow_mut().editing, editing);
        if was == editing {
            return;
        }
        if editing {
            self.cancel_pending();
            self.recompute();
        } else {
            self.schedule_recompute();
        }
    }

    #[must_use]
    pub fn is_editing(&self) -> bool {
        self.inner.borrow().editing
    }

    fn schedule_recompute(&self) {
        let weak = self.downgrade();
        let mut inner = self.inner.borrow_mut();
        if let Some(frame) = inner.pending_frame.take() {
            inner.event_loop.cancel(frame);
        }
        let frame = inner.event_loop.next_frame(move || {
            if let Some(list) = Self::upgrade(&weak) {
                list.inner.borrow_mut().pending_frame = None;
                list.recompute();
            }
        });
        inner.pending_frame = Some(frame);
    }

    fn cancel_pending(&self) {
        let mut inner = self.inner.borrow_mut();
        if let Some(frame) = inner.pending_frame.take() {
            inner.event_loop.cancel(frame);
        }
    }

    /// Measure and recompute from scratch now.
    pub fn recompute(&self) {
        let (state, badge, on_change) = {
            let mut inner = self.inner.borrow_mut();
            if inner.editing {
                inner.engine.reset();
            } else {
                let available = inner.container.measure().offset_width;
                let items: Vec<MeasuredItem<K>> = inner
                    .tags
                    .iter()
                    .map(|(id, node)| MeasuredItem::new(id.clone(), node.measure().offset_width))
                    .collect();
                inner.engine.recompute(available, &items);
            }
            (
                inner.engine.state().clone(),
                inner.badge.clone(),
                inner.on_change.clone(),
            )
        };
        tracing::debug!(
            message = "tags.recompute",
            hidden = state.hidden_count,
            available = state.available_width,
            badge = state.show_badge
        );
        if let Some(badge) = badge {
            if !state.show_badge {
                badge.hide(None);
            }
        }
        if let Some(on_change) = on_change {
            on_change(&state);
        }
    }

    #[must_use]
    pub fn state(&self) -> OverflowState<K> {
        self.inner.borrow().engine.state().clone()
    }

    #[must_use]
    pub fn hidden_ids(&self) -> Vec<K> {
        self.inner.borrow().engine.hidden_ids().to_vec()
    }

    #[must_use]
    pub fn hidden_count(&self) -> usize {
        self.inner.borrow().engine.hidden_count()
    }

    /// "+N" when the badge should render.
    #[must_use]
    pub fn badge_label(&self) -> Option<String> {
        let inner = self.inner.borrow();
        inner
            .engine
            .show_badge()
            .then(|| format!("+{}", inner.engine.hidden_count()))
    }

    #[must_use]
    pub fn passes(&self) -> u64 {
        self.inner.borrow().engine.passes()
    }

    /// Stop watching, drop pending work, and uninstall the badge overlay.
    pub fn unmount(&self) {
        let badge = {
            let mut inner = self.inner.borrow_mut();
            inner.watcher.unobserve();
            if let Some(frame) = inner.pending_frame.take() {
                inner.event_loop.cancel(frame);
            }
            inner.badge.clone()
        };
        if let Some(badge) = badge {
            badge.uninstall();
        }
        tracing::debug!(message = "tags.unmount");
    }
}

impl<K: Clone + fmt::Debug + 'static> fmt::Debug for TagOverflowList<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("TagOverflowList")
            .field("tags", &inner.tags.len())
            .field("editing", &inner.editing)
            .field("hidden", &inner.engine.hidden_ids())
            .finish()
    }
}
