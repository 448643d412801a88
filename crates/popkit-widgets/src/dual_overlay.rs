#![forbid(unsafe_code)]

//! Two coordinated panels for inline tag editing.
//!
//! The editable region of a tag field is cloned into a floating panel (the
//! *clone overlay*) positioned over the original, and a second panel (the
//! *dropdown*) is anchored to that clone. The two must behave as one unit:
//!
//! 1. opening shows the clone, then the dropdown against the clone, then
//!    focuses the clone's input;
//! 2. hiding the dropdown (click outside, explicit close) hides the clone;
//! 3. the clone is rebuilt whenever the underlying data changes, and
//!    reopened on the next render pass if it was visible;
//! 4. the clone's height is watched so the dropdown follows it as the
//!    input wraps.
//!
//! The clone is a deep copy and has no listeners of its own. Every listener
//! the synchronizer attaches is released when the clone is destroyed.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use popkit_core::{DomEvent, DomEventKind, Key, NodeRef, Subscription};
use popkit_runtime::{EventLoop, ResizeWatcher, TimerId, TimingConfig};

use crate::overlay::{
    Content, ContentProvider, OverlayConfig, OverlayController, OverlayEnv, ShowOptions,
    TriggerKind,
};

/// Default role of the clone's text input.
pub const DEFAULT_INPUT_ROLE: &str = "input";

/// User-facing hooks. All optional.
#[derive(Clone, Default)]
pub struct DualOverlayCallbacks {
    /// An item inside the clone was clicked.
    pub on_item_click: Option<Rc<dyn Fn(usize)>>,
    /// Enter pressed in the clone's input.
    pub on_commit: Option<Rc<dyn Fn(String)>>,
    /// Backspace pressed in an empty input.
    pub on_delete_last: Option<Rc<dyn Fn()>>,
    /// The input's value changed.
    pub on_input: Option<Rc<dyn Fn(String)>>,
    /// An item was removed via [`DualOverlaySynchronizer::delete_in_place`].
    pub on_delete: Option<Rc<dyn Fn(usize)>>,
}

struct CloneState {
    node: NodeRef,
    listeners: Vec<Subscription>,
    watcher: ResizeWatcher,
}

struct SyncInner {
    event_loop: EventLoop,
    live_region: NodeRef,
    clone_overlay: OverlayController,
    dropdown: OverlayController,
    clone: Option<CloneState>,
    last_known_height: Option<f64>,
    clone_generation: u64,
    reopen_frame: Option<TimerId>,
    callbacks: DualOverlayCallbacks,
    input_role: String,
    timing: TimingConfig,
}

/// Keeps a cloned editing region and its dropdown in lockstep.
#[derive(Clone)]
pub struct DualOverlaySynchronizer {
    inner: Rc<RefCell<SyncInner>>,
}

/// Builder for [`DualOverlaySynchronizer`].
pub struct DualOverlayBuilder {
    env: OverlayEnv,
    live_region: NodeRef,
    trigger: NodeRef,
    dropdown_content: Option<ContentProvider>,
    input_role: String,
    timing: TimingConfig,
    callbacks: DualOverlayCallbacks,
}

impl DualOverlayBuilder {
    /// Dropdown body.
    #[must_use]
    pub fn dropdown_content(mut self, provider: impl Fn() -> Option<Content> + 'static) -> Self {
        self.dropdown_content = Some(Rc::new(provider));
        self
    }

    /// Role of the node to focus inside the clone.
    #[must_use]
    pub fn input_role(mut self, role: impl Into<String>) -> Self {
        self.input_role = role.into();
        self
    }

    #[must_use]
    pub fn timing(mut self, timing: TimingConfig) -> Self {
        self.timing = timing;
        self
    }

    #[must_use]
    pub fn on_item_click(mut self, f: impl Fn(usize) + 'static) -> Self {
        self.callbacks.on_item_click = Some(Rc::new(f));
        self
    }

    #[must_use]
    pub fn on_commit(mut self, f: impl Fn(String) + 'static) -> Self {
        self.callbacks.on_commit = Some(Rc::new(f));
        self
    }

    #[must_use]
    pub fn on_delete_last(mut self, f: impl Fn() + 'static) -> Self {
        self.callbacks.on_delete_last = Some(Rc::new(f));
        self
    }

    #[must_use]
    pub fn on_input(mut self, f: impl Fn(String) + 'static) -> Self {
        self.callbacks.on_input = Some(Rc::new(f));
        self
    }

    #[must_use]
    pub fn on_delete(mut self, f: impl Fn(usize) + 'static) -> Self {
        self.callbacks.on_delete = Some(Rc::new(f));
        self
    }

    pub fn build(self) -> DualOverlaySynchronizer {
        let Self {
            env,
            live_region,
            trigger,
            dropdown_content,
            input_role,
            timing,
            callbacks,
        } = self;
        let event_loop = env.event_loop.clone();
        let inner = Rc::new_cyclic(|weak: &Weak<RefCell<SyncInner>>| {
            let clone_weak = weak.clone();
            let clone_overlay = OverlayController::builder(env.clone())
                .label("clone")
                .anchor(trigger)
                .config(OverlayConfig {
                    trigger: TriggerKind::Manual,
                    hide_on_click_outside: false,
                    fixed_position: true,
                    new_instance_per_show: true,
                    timing,
                })
                .content(move || {
                    let inner = clone_weak.upgrade()?;
                    let inner = inner.borrow();
                    inner.clone.as_ref().map(|c| Content::Node(Rc::clone(&c.node)))
                })
                .build();

            let hidden_weak = weak.clone();
            let mut dropdown = OverlayController::builder(env)
                .label("dropdown")
                .config(OverlayConfig {
                    trigger: TriggerKind::Manual,
                    timing,
                    ..OverlayConfig::default()
                })
                .on_hidden(move || {
                    if let Some(sync) = DualOverlaySynchronizer::upgrade(&hidden_weak) {
                        sync.cancel_reopen();
                        sync.clone_overlay().hide(None);
                    }
                });
            if let Some(provider) = dropdown_content {
                dropdown = dropdown.content_provider(provider);
            }

            RefCell::new(SyncInner {
                event_loop,
                live_region,
                clone_overlay,
                dropdown: dropdown.build(),
                clone: None,
                last_known_height: None,
                clone_generation: 0,
                reopen_frame: None,
                callbacks,
                input_role,
                timing,
            })
        });
        DualOverlaySynchronizer { inner }
    }
}

impl DualOverlaySynchronizer {
    /// Clone `live_region` over `trigger` when opened.
    pub fn builder(env: OverlayEnv, live_region: NodeRef, trigger: NodeRef) -> DualOverlayBuilder {
        DualOverlayBuilder {
            env,
            live_region,
            trigger,
            dropdown_content: None,
            input_role: DEFAULT_INPUT_ROLE.to_owned(),
            timing: TimingConfig::default(),
            callbacks: DualOverlayCallbacks::default(),
        }
    }

    fn downgrade(&self) -> Weak<RefCell<SyncInner>> {
        Rc::downgrade(&self.inner)
    }

    fn upgrade(weak: &Weak<RefCell<SyncInner>>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }

    // -- queries ------------------------------------------------------------

    #[must_use]
    pub fn clone_overlay(&self) -> OverlayController {
        self.inner.borrow().clone_overlay.clone()
    }

    #[must_use]
    pub fn dropdown(&self) -> OverlayController {
        self.inner.borrow().dropdown.clone()
    }

    /// The current clone, if one exists.
    #[must_use]
    pub fn clone_node(&self) -> Option<NodeRef> {
        self.inner.borrow().clone.as_ref().map(|c| Rc::clone(&c.node))
    }

    /// How many clones have been built.
    #[must_use]
    pub fn clone_generation(&self) -> u64 {
        self.inner.borrow().clone_generation
    }

    #[must_use]
    pub fn last_known_height(&self) -> Option<f64> {
        self.inner.borrow().last_known_height
    }

    /// Whether the clone overlay is visible.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.clone_overlay().phase().is_visible()
    }

    #[must_use]
    pub fn has_pending_reopen(&self) -> bool {
        self.inner.borrow().reopen_frame.is_some()
    }

    // -- open / close -------------------------------------------------------

    /// Show the clone, then the dropdown anchored to it, then focus the
    /// clone's input.
    pub fn open(&self) {
        self.cancel_reopen();
        let clone = self.ensure_clone();
        let (clone_overlay, dropdown, role) = {
            let inner = self.inner.borrow();
            (
                inner.clone_overlay.clone(),
                inner.dropdown.clone(),
                inner.input_role.clone(),
            )
        };
        clone_overlay.show(ShowOptions::immediate());
        dropdown.set_anchor(Rc::clone(&clone));
        dropdown.show(ShowOptions::immediate().cancel_pending_hide());
        let focused = clone.focus_descendant(&role);
        tracing::debug!(
            message = "dual.open",
            clone = clone.node_id().0,
            generation = self.clone_generation(),
            focused
        );
    }

    /// Hide both panels. The clone itself is kept for the next open.
    pub fn close(&self) {
        self.cancel_reopen();
        let (clone_overlay, dropdown) = {
            let inner = self.inner.borrow();
            (inner.clone_overlay.clone(), inner.dropdown.clone())
        };
        dropdown.hide(None);
        clone_overlay.hide(None);
        tracing::debug!(message = "dual.close");
    }

    fn cancel_reopen(&self) {
        let mut inner = self.inner.borrow_mut();
        if let Some(frame) = inner.reopen_frame.take() {
            inner.event_loop.cancel(frame);
        }
    }

    // -- clone management ---------------------------------------------------

    fn ensure_clone(&self) -> NodeRef {
        let live = {
            let inner = self.inner.borrow();
            if let Some(clone) = inner.clone.as_ref() {
                return Rc::clone(&clone.node);
            }
            Rc::clone(&inner.live_region)
        };
        let node = live.deep_clone();
        let listeners = self.wire_clone(&node);
        let latency = self.inner.borrow().timing.resize_latency();
        let mut watcher = ResizeWatcher::new(self.inner.borrow().event_loop.clone(), latency);
        let weak = self.downgrade();
        watcher.observe(node.as_ref(), move |m| {
            if let Some(sync) = Self::upgrade(&weak) {
                sync.height_changed(m.offset_height);
            }
        });
        let height = node.measure().offset_height;
        let mut inner = self.inner.borrow_mut();
        inner.clone_generation += 1;
        inner.last_known_height = Some(height);
        inner.clone = Some(CloneState {
            node: Rc::clone(&node),
            listeners,
            watcher,
        });
        tracing::debug!(
            message = "dual.clone.create",
            clone = node.node_id().0,
            generation = inner.clone_generation,
            height
        );
        node
    }

    fn wire_clone(&self, node: &NodeRef) -> Vec<Subscription> {
        let click = self.downgrade();
        let key = self.downgrade();
        let input = self.downgrade();
        vec![
            node.listen(
                DomEventKind::Click,
                Rc::new(move |event: &DomEvent| {
                    let (Some(sync), Some(item)) = (Self::upgrade(&click), event.item) else {
                        return;
                    };
                    let callback = sync.inner.borrow().callbacks.on_item_click.clone();
                    if let Some(callback) = callback {
                        callback(item);
                    }
                }),
            ),
            node.listen(
                DomEventKind::KeyDown,
                Rc::new(move |event: &DomEvent| {
                    if let Some(sync) = Self::upgrade(&key) {
                        sync.on_key(event);
                    }
                }),
            ),
            node.listen(
                DomEventKind::Input,
                Rc::new(move |event: &DomEvent| {
                    let Some(sync) = Self::upgrade(&input) else {
                        return;
                    };
                    let callback = sync.inner.borrow().callbacks.on_input.clone();
                    if let Some(callback) = callback {
                        callback(event.value.clone().unwrap_or_default());
                    }
                    sync.sync_height();
                }),
            ),
        ]
    }

    fn on_key(&self, event: &DomEvent) {
        let value = event.value.clone().unwrap_or_default();
        let callbacks = self.inner.borrow().callbacks.clone();
        match event.key {
            Some(Key::Enter) => {
                if let Some(commit) = callbacks.on_commit {
                    commit(value);
                }
            }
            Some(Key::Backspace) if value.is_empty() => {
                if let Some(delete_last) = callbacks.on_delete_last {
                    delete_last();
                }
            }
            _ => {}
        }
    }

    fn destroy_clone(&self) -> bool {
        let state = {
            let mut inner = self.inner.borrow_mut();
            inner.last_known_height = None;
            inner.clone.take()
        };
        let Some(mut state) = state else {
            return false;
        };
        state.watcher.unobserve();
        tracing::debug!(
            message = "dual.clone.destroy",
            clone = state.node.node_id().0,
            listeners = state.listeners.len()
        );
        drop(state);
        true
    }

    /// The underlying data changed: discard the clone and, if it was
    /// visible, rebuild and reopen after the next render pass.
    ///
    /// Until then the dropdown stays up against the trigger. Hiding it in
    /// that window cancels the reopen.
    pub fn data_changed(&self) {
        let (clone_overlay, dropdown) = {
            let inner = self.inner.borrow();
            (inner.clone_overlay.clone(), inner.dropdown.clone())
        };
        let was_open = clone_overlay.phase().is_visible();
        self.cancel_reopen();
        self.destroy_clone();
        if let Some(trigger) = clone_overlay.anchor() {
            dropdown.set_anchor(trigger);
        }
        clone_overlay.uninstall();
        if was_open {
            let weak = self.downgrade();
            let frame = self.inner.borrow().event_loop.next_frame(move || {
                if let Some(sync) = Self::upgrade(&weak) {
                    sync.inner.borrow_mut().reopen_frame = None;
                    sync.open();
                }
            });
            self.inner.borrow_mut().reopen_frame = Some(frame);
        }
        tracing::debug!(message = "dual.data_changed", was_open);
    }

    /// Remove item `index` while the clone is up. No-op without a clone.
    pub fn delete_in_place(&self, index: usize) -> bool {
        let (has_clone, on_delete) = {
            let inner = self.inner.borrow();
            (inner.clone.is_some(), inner.callbacks.on_delete.clone())
        };
        if !has_clone {
            tracing::debug!(message = "dual.delete.skip", index);
            return false;
        }
        if let Some(on_delete) = on_delete {
            on_delete(index);
        }
        self.data_changed();
        true
    }

    // -- height tracking ----------------------------------------------------

    /// Record a new clone height and reposition the dropdown if it moved.
    pub fn height_changed(&self, height: f64) {
        let (changed, dropdown) = {
            let mut inner = self.inner.borrow_mut();
            if inner.clone.is_none() {
                return;
            }
            let changed = inner.last_known_height != Some(height);
            inner.last_known_height = Some(height);
            (changed, inner.dropdown.clone())
        };
        if changed {
            dropdown.reposition_if_shown(false);
            tracing::trace!(message = "dual.height", height);
        }
    }

    /// Measure the clone now. On drift, force the dropdown to reposition.
    /// Returns whether the height had drifted.
    pub fn sync_height(&self) -> bool {
        let Some(node) = self.clone_node() else {
            return false;
        };
        let height = node.measure().offset_height;
        let (drifted, dropdown) = {
            let mut inner = self.inner.borrow_mut();
            let drifted = inner.last_known_height != Some(height);
            inner.last_known_height = Some(height);
            (drifted, inner.dropdown.clone())
        };
        if drifted {
            dropdown.reposition_if_shown(true);
            tracing::trace!(message = "dual.height.drift", height);
        }
        drifted
    }

    /// Tear down both panels and the clone.
    pub fn uninstall(&self) {
        self.cancel_reopen();
        self.destroy_clone();
        let (clone_overlay, dropdown) = {
            let inner = self.inner.borrow();
            (inner.clone_overlay.clone(), inner.dropdown.clone())
        };
        dropdown.uninstall();
        clone_overlay.uninstall();
        tracing::debug!(message = "dual.uninstall");
    }
}

impl fmt::Debug for DualOverlaySynchronizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("DualOverlaySynchronizer")
            .field("clone_generation", &inner.clone_generation)
            .field("has_clone", &inner.clone.is_some())
            .field("last_known_height", &inner.last_known_height)
            .finish_non_exhaustive()
    }
}
