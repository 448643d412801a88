#![forbid(unsafe_code)]

//! Lifecycle coordinator for one floating panel.
//!
//! [`OverlayController`] owns a floating panel attached to an anchor node and
//! drives it through show/hide transitions that stay correct under rapid,
//! repeated triggers: double clicks, hover flicker between trigger and
//! panel, synthetic event replays, resize storms.
//!
//! # State machine
//!
//! ```text
//! Hidden ──show(immediate)──────────────▶ Shown
//! Hidden ──show()──▶ PendingShow ──fire──▶ Shown
//! PendingShow ──hide()──▶ Hidden
//! Shown ──hide(None | 0)──▶ Hidden
//! Shown ──hide(d)──▶ PendingHide ──fire──▶ Hidden
//! PendingHide ──cancel_hide() | show()──▶ Shown
//! ```
//!
//! Pending phases carry the [`TimerId`] that completes them. A timer whose
//! token no longer matches the phase is stale and does nothing.
//!
//! # Lifecycle notifications
//!
//! `on_show` runs before the panel becomes visible, `on_shown` one render
//! pass later, `on_hide` before the panel hides and `on_hidden` after it.
//! Callbacks run with no internal borrow held and may call back into the
//! controller. The document-level "click outside" listener is attached
//! while handling `on_shown` so the click that opened the panel cannot
//! close it.
//!
//! # Failure Modes
//!
//! Nothing here returns an error. A missing anchor or content provider (or a
//! provider yielding `None`) turns `show` into a logged no-op. Calls on an
//! uninstalled controller are no-ops; a later `show` rebuilds the panel.
//!
//! Panel implementations must not call back into their controller from
//! inside a [`FloatingPanel`] method.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use popkit_core::{
    Document, DomEvent, DomEventKind, Node, NodeId, NodeRef, OverlayEvent, Subscription,
};
use popkit_runtime::{
    DebouncedSignal, Duration, EventLoop, ResizeWatcher, TimerId, TimingConfig, ZIndexAllocator,
};

// ---------------------------------------------------------------------------
// Collaborator seams
// ---------------------------------------------------------------------------

/// Where to place the panel relative to its anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Placement {
    /// Above the anchor, aligned to its left edge.
    Above,
    /// Below the anchor, aligned to its left edge.
    #[default]
    Below,
    /// Left of the anchor, aligned to its top edge.
    Left,
    /// Right of the anchor, aligned to its top edge.
    Right,
    /// Above the anchor, horizontally centered.
    AboveCentered,
    /// Below the anchor, horizontally centered.
    BelowCentered,
}

impl Placement {
    /// The placement a positioning primitive falls back to when this one
    /// does not fit.
    #[must_use]
    pub fn flip(self) -> Self {
        match self {
            Self::Above => Self::Below,
            Self::AboveCentered => Self::BelowCentered,
            Self::Below => Self::Above,
            Self::BelowCentered => Self::AboveCentered,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }

    /// Whether this is an above/below placement.
    #[must_use]
    pub fn is_vertical(self) -> bool {
        matches!(
            self,
            Self::Above | Self::Below | Self::AboveCentered | Self::BelowCentered
        )
    }
}

/// Presentation options forwarded to the panel.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayProps {
    pub placement: Placement,
    /// `(skidding, distance)` from the anchor, in pixels.
    pub offset: (f64, f64),
    pub max_width: Option<f64>,
    /// Whether pointer interaction inside the panel is allowed.
    pub interactive: bool,
    pub arrow: bool,
    pub theme: Option<String>,
    /// Fixed stacking order. `None` takes a fresh value from the
    /// [`ZIndexAllocator`] on every show.
    pub z_index: Option<u32>,
}

impl Default for OverlayProps {
    fn default() -> Self {
        Self {
            placement: Placement::Below,
            offset: (0.0, 8.0),
            max_width: None,
            interactive: true,
            arrow: false,
            theme: None,
            z_index: None,
        }
    }
}

impl OverlayProps {
    /// Merge `patch` into these props.
    pub fn apply(&mut self, patch: &OverlayPropsPatch) {
        if let Some(placement) = patch.placement {
            self.placement = placement;
        }
        if let Some(offset) = patch.offset {
            self.offset = offset;
        }
        if let Some(max_width) = patch.max_width {
            self.max_width = max_width;
        }
        if let Some(interactive) = patch.interactive {
            self.interactive = interactive;
        }
        if let Some(arrow) = patch.arrow {
            self.arrow = arrow;
        }
        if let Some(theme) = &patch.theme {
            self.theme = theme.clone();
        }
        if let Some(z) = patch.z_index {
            self.z_index = Some(z);
        }
    }
}

/// A partial update of [`OverlayProps`]. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverlayPropsPatch {
    pub placement: Option<Placement>,
    pub offset: Option<(f64, f64)>,
    pub max_width: Option<Option<f64>>,
    pub interactive: Option<bool>,
    pub arrow: Option<bool>,
    pub theme: Option<Option<String>>,
    pub z_index: Option<u32>,
}

impl OverlayPropsPatch {
    #[must_use]
    pub fn placement(mut self, placement: Placement) -> Self {
        self.placement = Some(placement);
        self
    }

    #[must_use]
    pub fn offset(mut self, skidding: f64, distance: f64) -> Self {
        self.offset = Some((skidding, distance));
        self
    }

    #[must_use]
    pub fn max_width(mut self, max_width: Option<f64>) -> Self {
        self.max_width = Some(max_width);
        self
    }

    #[must_use]
    pub fn interactive(mut self, interactive: bool) -> Self {
        self.interactive = Some(interactive);
        self
    }

    #[must_use]
    pub fn arrow(mut self, arrow: bool) -> Self {
        self.arrow = Some(arrow);
        self
    }

    #[must_use]
    pub fn theme(mut self, theme: Option<String>) -> Self {
        self.theme = Some(theme);
        self
    }

    #[must_use]
    pub fn z_index(mut self, z: u32) -> Self {
        self.z_index = Some(z);
        self
    }

    /// Whether the patch changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// What a panel displays.
#[derive(Clone)]
pub enum Content {
    Text(String),
    Node(NodeRef),
}

impl Content {
    /// The content node, if any.
    #[must_use]
    pub fn node(&self) -> Option<&NodeRef> {
        match self {
            Self::Node(node) => Some(node),
            Self::Text(_) => None,
        }
    }
}

impl fmt::Debug for Content {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Self::Node(node) => f.debug_tuple("Node").field(&node.node_id()).finish(),
        }
    }
}

/// Produces panel content on demand. `None` means "not ready yet".
pub type ContentProvider = Rc<dyn Fn() -> Option<Content>>;

/// Lifecycle callback.
pub type Callback = Rc<dyn Fn()>;

/// Everything a factory needs to build a panel.
#[derive(Clone)]
pub struct PanelSpec {
    pub anchor: NodeRef,
    pub content: Content,
    pub props: OverlayProps,
    /// Position relative to the viewport instead of the anchor's scroll
    /// container.
    pub fixed_position: bool,
}

impl fmt::Debug for PanelSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PanelSpec")
            .field("anchor", &self.anchor.node_id())
            .field("content", &self.content)
            .field("props", &self.props)
            .field("fixed_position", &self.fixed_position)
            .finish()
    }
}

/// The positioning primitive: a floating panel instance.
pub trait FloatingPanel {
    fn show(&mut self);
    fn hide(&mut self);
    fn is_shown(&self) -> bool;
    /// Apply a live props update.
    fn set_props(&mut self, patch: &OverlayPropsPatch);
    /// Re-target the panel at a different anchor.
    fn set_anchor(&mut self, anchor: NodeRef);
    /// Recompute the on-screen position.
    fn reposition(&mut self);
    /// Whether `node` lies inside the panel.
    fn contains(&self, node: NodeId) -> bool;
    fn unmount(&mut self);
    fn destroy(&mut self);
}

/// Builds floating panels.
pub trait PanelFactory {
    fn create(&self, spec: PanelSpec) -> Box<dyn FloatingPanel>;
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// What opens and closes the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TriggerKind {
    /// Clicking the anchor toggles the panel.
    #[default]
    Click,
    /// Pointer over the anchor shows; leaving it hides after a delay.
    Hover,
    /// Only explicit `show`/`hide` calls.
    Manual,
}

/// Behavioral options for one controller.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayConfig {
    pub trigger: TriggerKind,
    pub hide_on_click_outside: bool,
    pub fixed_position: bool,
    /// Destroy and rebuild the panel on every show so content is re-read.
    pub new_instance_per_show: bool,
    pub timing: TimingConfig,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            trigger: TriggerKind::Click,
            hide_on_click_outside: true,
            fixed_position: false,
            new_instance_per_show: false,
            timing: TimingConfig::default(),
        }
    }
}

/// Arguments to [`OverlayController::show`].
#[derive(Clone, Default)]
pub struct ShowOptions {
    /// Anchor to use instead of the configured one. Becomes the new anchor.
    pub anchor: Option<NodeRef>,
    /// Cancel a pending hide before showing. `show` always cancels a
    /// pending hide (`PendingHide --show()--> Shown`), so this only records
    /// the caller's intent.
    pub cancel_pending_hide: bool,
    /// Skip the show debounce.
    pub immediate: bool,
}

impl ShowOptions {
    /// Show without debouncing.
    #[must_use]
    pub fn immediate() -> Self {
        Self {
            immediate: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_anchor(mut self, anchor: NodeRef) -> Self {
        self.anchor = Some(anchor);
        self
    }

    #[must_use]
    pub fn cancel_pending_hide(mut self) -> Self {
        self.cancel_pending_hide = true;
        self
    }
}

impl fmt::Debug for ShowOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShowOptions")
            .field("anchor", &self.anchor.as_ref().map(|a| a.node_id()))
            .field("cancel_pending_hide", &self.cancel_pending_hide)
            .field("immediate", &self.immediate)
            .finish()
    }
}

/// Shared services every controller on a page uses.
#[derive(Clone)]
pub struct OverlayEnv {
    pub event_loop: EventLoop,
    pub factory: Rc<dyn PanelFactory>,
    pub z_index: ZIndexAllocator,
    pub document: Rc<dyn Document>,
}

impl OverlayEnv {
    /// Environment with a default z-index allocator.
    pub fn new(event_loop: EventLoop, factory: Rc<dyn PanelFactory>, document: Rc<dyn Document>) -> Self {
        Self {
            event_loop,
            factory,
            z_index: ZIndexAllocator::default(),
            document,
        }
    }

    #[must_use]
    pub fn with_z_index(mut self, z_index: ZIndexAllocator) -> Self {
        self.z_index = z_index;
        self
    }
}

impl fmt::Debug for OverlayEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverlayEnv")
            .field("event_loop", &self.event_loop)
            .field("z_index", &self.z_index)
            .finish_non_exhaustive()
    }
}

/// Lifecycle notifications.
#[derive(Clone, Default)]
pub struct OverlayCallbacks {
    pub on_show: Option<Callback>,
    pub on_shown: Option<Callback>,
    pub on_hide: Option<Callback>,
    pub on_hidden: Option<Callback>,
}

impl OverlayCallbacks {
    fn get(&self, event: OverlayEvent) -> Option<Callback> {
        match event {
            OverlayEvent::Show => self.on_show.clone(),
            OverlayEvent::Shown => self.on_shown.clone(),
            OverlayEvent::Hide => self.on_hide.clone(),
            OverlayEvent::Hidden => self.on_hidden.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

/// Where the controller is in its show/hide lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlayPhase {
    #[default]
    Hidden,
    /// A debounced show is waiting on this timer.
    PendingShow(TimerId),
    Shown,
    /// A delayed hide is waiting on this timer.
    PendingHide(TimerId),
}

impl OverlayPhase {
    /// Whether the panel is on screen (possibly about to hide).
    #[must_use]
    pub fn is_visible(self) -> bool {
        matches!(self, Self::Shown | Self::PendingHide(_))
    }

    /// Whether a transition is waiting on a timer.
    #[must_use]
    pub fn is_pending(self) -> bool {
        matches!(self, Self::PendingShow(_) | Self::PendingHide(_))
    }
}

struct Inner {
    label: &'static str,
    env: OverlayEnv,
    config: OverlayConfig,
    props: OverlayProps,
    anchor: Option<NodeRef>,
    content: Option<ContentProvider>,
    callbacks: OverlayCallbacks,
    phase: OverlayPhase,
    instance: Option<Box<dyn FloatingPanel>>,
    show_signal: DebouncedSignal<ShowOptions>,
    shown_frame: Option<TimerId>,
    document_listener: Option<Subscription>,
    trigger_listeners: Vec<Subscription>,
    content_listeners: Vec<Subscription>,
    resize: ResizeWatcher,
    z_index: Option<u32>,
    instances_created: u64,
}

/// Coordinates one floating panel. Clones share the same controller.
#[derive(Clone)]
pub struct OverlayController {
    inner: Rc<RefCell<Inner>>,
}

/// Builder for [`OverlayController`].
pub struct OverlayBuilder {
    env: OverlayEnv,
    label: &'static str,
    anchor: Option<NodeRef>,
    content: Option<ContentProvider>,
    config: OverlayConfig,
    props: OverlayProps,
    callbacks: OverlayCallbacks,
    watch: Option<NodeRef>,
}

impl OverlayBuilder {
    /// Name used in log events.
    #[must_use]
    pub fn label(mut self, label: &'static str) -> Self {
        self.label = label;
        self
    }

    #[must_use]
    pub fn anchor(mut self, anchor: NodeRef) -> Self {
        self.anchor = Some(anchor);
        self
    }

    #[must_use]
    pub fn content(mut self, provider: impl Fn() -> Option<Content> + 'static) -> Self {
        self.content = Some(Rc::new(provider));
        self
    }

    #[must_use]
    pub fn content_provider(mut self, provider: ContentProvider) -> Self {
        self.content = Some(provider);
        self
    }

    /// Static text content.
    #[must_use]
    pub fn text(self, text: impl Into<String>) -> Self {
        let text = text.into();
        self.content(move || Some(Content::Text(text.clone())))
    }

    #[must_use]
    pub fn config(mut self, config: OverlayConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn trigger(mut self, trigger: TriggerKind) -> Self {
        self.config.trigger = trigger;
        self
    }

    #[must_use]
    pub fn props(mut self, props: OverlayProps) -> Self {
        self.props = props;
        self
    }

    /// Reposition the panel whenever `node` resizes.
    #[must_use]
    pub fn watch_resize(mut self, node: NodeRef) -> Self {
        self.watch = Some(node);
        self
    }

    #[must_use]
    pub fn on_show(mut self, f: impl Fn() + 'static) -> Self {
        self.callbacks.on_show = Some(Rc::new(f));
        self
    }

    #[must_use]
    pub fn on_shown(mut self, f: impl Fn() + 'static) -> Self {
        self.callbacks.on_shown = Some(Rc::new(f));
        self
    }

    #[must_use]
    pub fn on_hide(mut self, f: impl Fn() + 'static) -> Self {
        self.callbacks.on_hide = Some(Rc::new(f));
        self
    }

    #[must_use]
    pub fn on_hidden(mut self, f: impl Fn() + 'static) -> Self {
        self.callbacks.on_hidden = Some(Rc::new(f));
        self
    }

    pub fn build(self) -> OverlayController {
        let event_loop = self.env.event_loop.clone();
        let timing = self.config.timing;
        let inner = Rc::new_cyclic(|weak: &Weak<RefCell<Inner>>| {
            let weak = weak.clone();
            let show_signal = DebouncedSignal::new(
                event_loop.clone(),
                timing.show_debounce(),
                move |opts: ShowOptions| {
                    if let Some(ctl) = OverlayController::upgrade(&weak) {
                        ctl.fire_debounced_show(opts);
                    }
                },
            );
            RefCell::new(Inner {
                label: self.label,
                env: self.env,
                config: self.config,
                props: self.props,
                anchor: self.anchor,
                content: self.content,
                callbacks: self.callbacks,
                phase: OverlayPhase::Hidden,
                instance: None,
                show_signal,
                shown_frame: None,
                document_listener: None,
                trigger_listeners: Vec::new(),
                content_listeners: Vec::new(),
                resize: ResizeWatcher::new(event_loop, timing.resize_latency()),
                z_index: None,
                instances_created: 0,
            })
        });
        let controller = OverlayController { inner };
        if let Some(node) = self.watch {
            controller.watch_resize(node.as_ref());
        }
        controller
    }
}

impl OverlayController {
    /// Start building a controller.
    pub fn builder(env: OverlayEnv) -> OverlayBuilder {
        OverlayBuilder {
            env,
            label: "overlay",
            anchor: None,
            content: None,
            config: OverlayConfig::default(),
            props: OverlayProps::default(),
            callbacks: OverlayCallbacks::default(),
            watch: None,
        }
    }

    fn upgrade(weak: &Weak<RefCell<Inner>>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }

    fn downgrade(&self) -> Weak<RefCell<Inner>> {
        Rc::downgrade(&self.inner)
    }

    // -- queries ------------------------------------------------------------

    #[must_use]
    pub fn phase(&self) -> OverlayPhase {
        self.inner.borrow().phase
    }

    /// Whether the panel instance reports itself shown. `false` before the
    /// first show and after uninstall.
    #[must_use]
    pub fn is_shown(&self) -> bool {
        self.inner
            .borrow()
            .instance
            .as_ref()
            .is_some_and(|panel| panel.is_shown())
    }

    /// Whether a panel instance currently exists.
    #[must_use]
    pub fn has_instance(&self) -> bool {
        self.inner.borrow().instance.is_some()
    }

    /// Panels built over this controller's lifetime.
    #[must_use]
    pub fn instances_created(&self) -> u64 {
        self.inner.borrow().instances_created
    }

    #[must_use]
    pub fn props(&self) -> OverlayProps {
        self.inner.borrow().props.clone()
    }

    #[must_use]
    pub fn config(&self) -> OverlayConfig {
        self.inner.borrow().config.clone()
    }

    #[must_use]
    pub fn anchor(&self) -> Option<NodeRef> {
        self.inner.borrow().anchor.clone()
    }

    /// Stacking order assigned by the most recent show.
    #[must_use]
    pub fn z_index(&self) -> Option<u32> {
        self.inner.borrow().z_index
    }

    /// Whether the document click-outside listener is attached.
    #[must_use]
    pub fn has_document_listener(&self) -> bool {
        self.inner.borrow().document_listener.is_some()
    }

    #[must_use]
    pub fn is_watching_resize(&self) -> bool {
        self.inner.borrow().resize.is_observing()
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        self.inner.borrow().label
    }

    // -- show ---------------------------------------------------------------

    /// Request the panel.
    ///
    /// Already shown: no-op. Pending hide: the hide is cancelled and the
    /// panel stays. Otherwise shows immediately or after the show debounce.
    pub fn show(&self, opts: ShowOptions) {
        let phase = self.phase();
        if let OverlayPhase::PendingHide(_) = phase {
            if let Some(anchor) = opts.anchor {
                self.set_anchor(anchor);
            }
            self.cancel_hide();
            return;
        }
        if phase == OverlayPhase::Shown {
            tracing::trace!(message = "overlay.show.skip", overlay = self.label(), reason = "shown");
            return;
        }
        if opts.immediate {
            self.show_now(opts);
            return;
        }
        let signal = self.inner.borrow().show_signal.clone();
        signal.call(opts);
        if let Some(timer) = signal.pending_timer() {
            self.inner.borrow_mut().phase = OverlayPhase::PendingShow(timer);
            tracing::trace!(message = "overlay.show.pending", overlay = self.label(), timer = timer.get());
        }
    }

    /// Show if hidden, hide if visible.
    pub fn toggle(&self) {
        if self.phase().is_visible() {
            self.hide(None);
        } else {
            self.show(ShowOptions::default());
        }
    }

    fn fire_debounced_show(&self, opts: ShowOptions) {
        if matches!(self.phase(), OverlayPhase::PendingShow(_)) {
            self.show_now(opts);
        } else {
            tracing::trace!(message = "overlay.show.stale", overlay = self.label());
        }
    }

    fn show_now(&self, opts: ShowOptions) {
        let label = self.label();
        let (signal, stale, anchor) = {
            let mut inner = self.inner.borrow_mut();
            if let Some(anchor) = opts.anchor {
                inner.anchor = Some(anchor);
            }
            let stale = if inner.config.new_instance_per_show {
                let listeners = std::mem::take(&mut inner.content_listeners);
                inner.instance.take().map(|panel| (panel, listeners))
            } else {
                None
            };
            (inner.show_signal.clone(), stale, inner.anchor.clone())
        };
        signal.cancel();
        if let Some((mut stale, listeners)) = stale {
            drop(listeners);
            stale.unmount();
            stale.destroy();
            tracing::debug!(message = "overlay.instance.replace", overlay = label);
        }
        let Some(anchor) = anchor else {
            self.abandon_show("no_anchor");
            return;
        };

        let z = if self.has_instance() {
            let z = self.allocate_z_index();
            let mut inner = self.inner.borrow_mut();
            if let Some(panel) = inner.instance.as_mut() {
                panel.set_anchor(Rc::clone(&anchor));
                panel.set_props(&OverlayPropsPatch::default().z_index(z));
            }
            z
        } else {
            match self.create_instance(anchor) {
                Some(z) => z,
                None => return,
            }
        };

        {
            let mut inner = self.inner.borrow_mut();
            inner.phase = OverlayPhase::Shown;
            inner.z_index = Some(z);
        }
        tracing::debug!(message = "overlay.show", overlay = label, z_index = z);
        self.emit(OverlayEvent::Show);

        let weak = self.downgrade();
        let mut inner = self.inner.borrow_mut();
        if inner.phase != OverlayPhase::Shown {
            return;
        }
        if let Some(panel) = inner.instance.as_mut() {
            panel.show();
        }
        if let Some(frame) = inner.shown_frame.take() {
            inner.env.event_loop.cancel(frame);
        }
        let frame = inner.env.event_loop.next_frame(move || {
            if let Some(ctl) = OverlayController::upgrade(&weak) {
                ctl.settle_shown();
            }
        });
        inner.shown_frame = Some(frame);
    }

    fn abandon_show(&self, reason: &'static str) {
        let mut inner = self.inner.borrow_mut();
        if !inner.phase.is_visible() {
            inner.phase = OverlayPhase::Hidden;
        }
        tracing::debug!(message = "overlay.show.skip", overlay = inner.label, reason);
    }

    fn allocate_z_index(&self) -> u32 {
        let inner = self.inner.borrow();
        inner.props.z_index.unwrap_or_else(|| inner.env.z_index.allocate())
    }

    /// Build the panel and return its z-index. `None` when content is not
    /// ready; no stacking value is consumed then.
    fn create_instance(&self, anchor: NodeRef) -> Option<u32> {
        let provider = self.inner.borrow().content.clone();
        let Some(provider) = provider else {
            self.abandon_show("no_content");
            return None;
        };
        let Some(content) = provider() else {
            self.abandon_show("content_not_ready");
            return None;
        };
        let z = self.allocate_z_index();
        let (factory, spec) = {
            let inner = self.inner.borrow();
            let mut props = inner.props.clone();
            props.z_index = Some(z);
            let spec = PanelSpec {
                anchor,
                content: content.clone(),
                props,
                fixed_position: inner.config.fixed_position,
            };
            (Rc::clone(&inner.env.factory), spec)
        };
        let panel = factory.create(spec);
        let listeners = self.content_hover_listeners(&content);
        let mut inner = self.inner.borrow_mut();
        inner.instance = Some(panel);
        inner.content_listeners = listeners;
        inner.instances_created += 1;
        tracing::debug!(
            message = "overlay.instance.create",
            overlay = inner.label,
            count = inner.instances_created
        );
        Some(z)
    }

    fn content_hover_listeners(&self, content: &Content) -> Vec<Subscription> {
        let (trigger, delay) = {
            let inner = self.inner.borrow();
            (inner.config.trigger, inner.config.timing.hover_hide_delay())
        };
        let Some(node) = content.node() else {
            return Vec::new();
        };
        if trigger != TriggerKind::Hover {
            return Vec::new();
        }
        let enter = self.downgrade();
        let leave = self.downgrade();
        vec![
            node.listen(
                DomEventKind::MouseEnter,
                Rc::new(move |_: &DomEvent| {
                    if let Some(ctl) = OverlayController::upgrade(&enter) {
                        ctl.cancel_hide();
                    }
                }),
            ),
            node.listen(
                DomEventKind::MouseLeave,
                Rc::new(move |_: &DomEvent| {
                    if let Some(ctl) = OverlayController::upgrade(&leave) {
                        ctl.hide(Some(delay));
                    }
                }),
            ),
        ]
    }

    /// One render pass after show: attach click-outside, emit `on_shown`.
    fn settle_shown(&self) {
        let document = {
            let mut inner = self.inner.borrow_mut();
            inner.shown_frame = None;
            if !inner.phase.is_visible() {
                return;
            }
            if inner.config.hide_on_click_outside && inner.document_listener.is_none() {
                Some(Rc::clone(&inner.env.document))
            } else {
                None
            }
        };
        if let Some(document) = document {
            let weak = self.downgrade();
            let sub = document.listen_click(Rc::new(move |event: &DomEvent| {
                if let Some(ctl) = OverlayController::upgrade(&weak) {
                    ctl.on_document_click(event);
                }
            }));
            self.inner.borrow_mut().document_listener = Some(sub);
        }
        tracing::debug!(message = "overlay.shown", overlay = self.label());
        self.emit(OverlayEvent::Shown);
    }

    fn on_document_click(&self, event: &DomEvent) {
        let inside = {
            let inner = self.inner.borrow();
            if !inner.phase.is_visible() {
                return;
            }
            let in_anchor = inner.anchor.as_ref().is_some_and(|a| a.contains(event.target));
            let in_panel = inner
                .instance
                .as_ref()
                .is_some_and(|panel| panel.contains(event.target));
            in_anchor || in_panel
        };
        if inside {
            return;
        }
        tracing::debug!(message = "overlay.click_outside", overlay = self.label(), target = event.target.0);
        self.hide(None);
    }

    // -- hide ---------------------------------------------------------------

    /// Hide now (`None` or zero) or after `delay`.
    ///
    /// Always cancels a pending show first; if the show had not fired the
    /// controller simply returns to `Hidden`. Re-issuing a delayed hide
    /// replaces the outstanding hide timer.
    pub fn hide(&self, delay: Option<Duration>) {
        let (signal, phase) = {
            let inner = self.inner.borrow();
            (inner.show_signal.clone(), inner.phase)
        };
        signal.cancel();
        match phase {
            OverlayPhase::Hidden => {}
            OverlayPhase::PendingShow(_) => {
                self.inner.borrow_mut().phase = OverlayPhase::Hidden;
                tracing::debug!(message = "overlay.show.cancelled", overlay = self.label());
            }
            OverlayPhase::Shown | OverlayPhase::PendingHide(_) => match delay {
                Some(delay) if !delay.is_zero() => self.schedule_hide(delay),
                _ => self.hide_now(),
            },
        }
    }

    fn schedule_hide(&self, delay: Duration) {
        let weak = self.downgrade();
        let mut inner = self.inner.borrow_mut();
        if let OverlayPhase::PendingHide(prev) = inner.phase {
            inner.env.event_loop.cancel(prev);
        }
        let timer = inner.env.event_loop.schedule_with_token(delay, move |token| {
            if let Some(ctl) = OverlayController::upgrade(&weak) {
                ctl.fire_pending_hide(token);
            }
        });
        inner.phase = OverlayPhase::PendingHide(timer);
        tracing::debug!(
            message = "overlay.hide.scheduled",
            overlay = inner.label,
            delay_ms = delay.as_millis() as u64,
            timer = timer.get()
        );
    }

    fn fire_pending_hide(&self, token: TimerId) {
        if self.phase() == OverlayPhase::PendingHide(token) {
            self.hide_now();
        } else {
            tracing::trace!(message = "overlay.hide.stale", overlay = self.label(), timer = token.get());
        }
    }

    fn hide_now(&self) {
        {
            let mut inner = self.inner.borrow_mut();
            if let OverlayPhase::PendingHide(timer) = inner.phase {
                inner.env.event_loop.cancel(timer);
            }
            inner.phase = OverlayPhase::Shown;
        }
        self.emit(OverlayEvent::Hide);
        let listener = {
            let mut inner = self.inner.borrow_mut();
            if let Some(frame) = inner.shown_frame.take() {
                inner.env.event_loop.cancel(frame);
            }
            if let Some(panel) = inner.instance.as_mut() {
                panel.hide();
            }
            inner.phase = OverlayPhase::Hidden;
            inner.document_listener.take()
        };
        drop(listener);
        tracing::debug!(message = "overlay.hide", overlay = self.label());
        self.emit(OverlayEvent::Hidden);
    }

    /// Cancel a pending delayed hide. Returns whether one was pending.
    pub fn cancel_hide(&self) -> bool {
        let mut inner = self.inner.borrow_mut();
        let OverlayPhase::PendingHide(timer) = inner.phase else {
            return false;
        };
        inner.env.event_loop.cancel(timer);
        inner.phase = OverlayPhase::Shown;
        tracing::debug!(message = "overlay.hide.cancelled", overlay = inner.label, timer = timer.get());
        true
    }

    // -- updates ------------------------------------------------------------

    /// Merge `patch` into the stored props and forward it to a live panel.
    pub fn set_props(&self, patch: OverlayPropsPatch) {
        let mut inner = self.inner.borrow_mut();
        inner.props.apply(&patch);
        if let Some(panel) = inner.instance.as_mut() {
            panel.set_props(&patch);
        }
    }

    /// Replace the content provider. Takes effect on the next panel build.
    pub fn set_content(&self, provider: ContentProvider) {
        self.inner.borrow_mut().content = Some(provider);
    }

    /// Re-target the panel. Trigger listeners move to the new anchor.
    pub fn set_anchor(&self, anchor: NodeRef) {
        let rebind = {
            let mut inner = self.inner.borrow_mut();
            inner.anchor = Some(Rc::clone(&anchor));
            if let Some(panel) = inner.instance.as_mut() {
                panel.set_anchor(anchor);
            }
            !inner.trigger_listeners.is_empty()
        };
        if rebind {
            self.bind_trigger();
        }
    }

    /// Ask the panel to recompute its position if it is shown (or `force`).
    /// Returns whether a reposition happened.
    pub fn reposition_if_shown(&self, force: bool) -> bool {
        let mut inner = self.inner.borrow_mut();
        let label = inner.label;
        let Some(panel) = inner.instance.as_mut() else {
            return false;
        };
        if !force && !panel.is_shown() {
            return false;
        }
        panel.reposition();
        tracing::trace!(message = "overlay.reposition", overlay = label, force);
        true
    }

    // -- wiring -------------------------------------------------------------

    /// Attach anchor listeners for the configured trigger. Replaces earlier
    /// bindings.
    pub fn bind_trigger(&self) {
        let (anchor, trigger, delay) = {
            let mut inner = self.inner.borrow_mut();
            inner.trigger_listeners.clear();
            (
                inner.anchor.clone(),
                inner.config.trigger,
                inner.config.timing.hover_hide_delay(),
            )
        };
        let Some(anchor) = anchor else {
            return;
        };
        let listeners = match trigger {
            TriggerKind::Manual => Vec::new(),
            TriggerKind::Click => {
                let weak = self.downgrade();
                vec![anchor.listen(
                    DomEventKind::Click,
                    Rc::new(move |_: &DomEvent| {
                        if let Some(ctl) = OverlayController::upgrade(&weak) {
                            ctl.toggle();
                        }
                    }),
                )]
            }
            TriggerKind::Hover => {
                let enter = self.downgrade();
                let leave = self.downgrade();
                vec![
                    anchor.listen(
                        DomEventKind::MouseEnter,
                        Rc::new(move |_: &DomEvent| {
                            if let Some(ctl) = OverlayController::upgrade(&enter) {
                                ctl.show(ShowOptions::default());
                            }
                        }),
                    ),
                    anchor.listen(
                        DomEventKind::MouseLeave,
                        Rc::new(move |_: &DomEvent| {
                            if let Some(ctl) = OverlayController::upgrade(&leave) {
                                ctl.hide(Some(delay));
                            }
                        }),
                    ),
                ]
            }
        };
        tracing::trace!(message = "overlay.bind", overlay = self.label(), listeners = listeners.len());
        self.inner.borrow_mut().trigger_listeners = listeners;
    }

    /// Reposition the panel whenever `node` resizes (debounced).
    pub fn watch_resize(&self, node: &dyn Node) {
        let weak = self.downgrade();
        self.inner.borrow_mut().resize.observe(node, move |_| {
            if let Some(ctl) = OverlayController::upgrade(&weak) {
                ctl.reposition_if_shown(false);
            }
        });
    }

    /// Tear everything down: resize observation, timers, listeners, panel.
    ///
    /// Safe to call repeatedly. Emits no lifecycle callbacks. A later
    /// `show` builds a fresh panel.
    pub fn uninstall(&self) {
        let (panel, subscriptions) = {
            let mut inner = self.inner.borrow_mut();
            inner.resize.unobserve();
            inner.show_signal.cancel();
            if let OverlayPhase::PendingHide(timer) = inner.phase {
                inner.env.event_loop.cancel(timer);
            }
            if let Some(frame) = inner.shown_frame.take() {
                inner.env.event_loop.cancel(frame);
            }
            let mut subscriptions: Vec<Subscription> = inner.trigger_listeners.drain(..).collect();
            subscriptions.append(&mut inner.content_listeners);
            subscriptions.extend(inner.document_listener.take());
            inner.phase = OverlayPhase::Hidden;
            (inner.instance.take(), subscriptions)
        };
        drop(subscriptions);
        let had_panel = panel.is_some();
        if let Some(mut panel) = panel {
            panel.hide();
            panel.unmount();
            panel.destroy();
        }
        tracing::debug!(message = "overlay.uninstall", overlay = self.label(), had_panel);
    }

    fn emit(&self, event: OverlayEvent) {
        let callback = self.inner.borrow().callbacks.get(event);
        if let Some(callback) = callback {
            callback();
        }
    }
}

impl fmt::Debug for OverlayController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("OverlayController")
            .field("label", &inner.label)
            .field("phase", &inner.phase)
            .field("has_instance", &inner.instance.is_some())
            .field("document_listener", &inner.document_listener.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{HeadlessDom, HeadlessNode};
    use std::cell::Cell;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    struct Fixture {
        dom: HeadlessDom,
        lp: EventLoop,
        anchor: HeadlessNode,
        z: ZIndexAllocator,
    }

    impl Fixture {
        fn new() -> Self {
            let dom = HeadlessDom::new();
            let anchor = dom.node("button");
            Self {
                lp: EventLoop::new(),
                dom,
                anchor,
                z: ZIndexAllocator::default(),
            }
        }

        fn builder(&self) -> OverlayBuilder {
            let env = OverlayEnv::new(self.lp.clone(), self.dom.panel_factory(), self.dom.document())
                .with_z_index(self.z.clone());
            OverlayController::builder(env)
                .anchor(self.anchor.as_node_ref())
                .text("hello")
        }
    }

    fn counter() -> (Rc<Cell<u32>>, impl Fn() + 'static) {
        let count = Rc::new(Cell::new(0));
        let c = Rc::clone(&count);
        (count, move || c.set(c.get() + 1))
    }

    #[test]
    fn placement_flip_round_trips() {
        for p in [Placement::Above, Placement::BelowCentered, Placement::Left] {
            assert_eq!(p.flip().flip(), p);
            assert_eq!(p.flip().is_vertical(), p.is_vertical());
        }
    }

    #[test]
    fn props_patch_merges() {
        let mut props = OverlayProps::default();
        let patch = OverlayPropsPatch::default()
            .placement(Placement::Right)
            .max_width(Some(320.0))
            .theme(Some("dark".into()));
        assert!(!patch.is_empty());
        props.apply(&patch);
        assert_eq!(props.placement, Placement::Right);
        assert_eq!(props.max_width, Some(320.0));
        assert_eq!(props.theme.as_deref(), Some("dark"));
        assert!(props.interactive);
    }

    #[test]
    fn immediate_show_builds_once() {
        let fx = Fixture::new();
        let (shows, on_show) = counter();
        let ctl = fx.builder().on_show(on_show).build();
        assert!(!ctl.is_shown());
        ctl.show(ShowOptions::immediate());
        ctl.show(ShowOptions::immediate());
        assert_eq!(ctl.phase(), OverlayPhase::Shown);
        assert!(ctl.is_shown());
        assert_eq!(shows.get(), 1);
        assert_eq!(fx.dom.panels().created(), 1);
    }

    #[test]
    fn debounced_show_waits_for_quiet_period() {
        let fx = Fixture::new();
        let ctl = fx.builder().build();
        ctl.show(ShowOptions::default());
        assert!(matches!(ctl.phase(), OverlayPhase::PendingShow(_)));
        fx.lp.advance(ms(50));
        ctl.show(ShowOptions::default());
        fx.lp.advance(ms(99));
        assert!(!ctl.is_shown());
        fx.lp.advance(ms(1));
        assert!(ctl.is_shown());
        assert_eq!(fx.dom.panels().created(), 1);
    }

    #[test]
    fn hide_cancels_pending_show() {
        let fx = Fixture::new();
        let (hidden, on_hidden) = counter();
        let ctl = fx.builder().on_hidden(on_hidden).build();
        ctl.show(ShowOptions::default());
        ctl.hide(None);
        assert_eq!(ctl.phase(), OverlayPhase::Hidden);
        fx.lp.run_until_idle();
        assert!(!ctl.has_instance());
        assert_eq!(hidden.get(), 0);
    }

    #[test]
    fn delayed_hide_replaces_previous_timer() {
        let fx = Fixture::new();
        let ctl = fx.builder().build();
        ctl.show(ShowOptions::immediate());
        ctl.hide(Some(ms(300)));
        ctl.hide(Some(ms(300)));
        assert_eq!(fx.lp.pending_timers(), 1);
        fx.lp.advance(ms(300));
        assert_eq!(ctl.phase(), OverlayPhase::Hidden);
        assert!(!ctl.is_shown());
    }

    #[test]
    fn zero_delay_hides_immediately() {
        let fx = Fixture::new();
        let ctl = fx.builder().build();
        ctl.show(ShowOptions::immediate());
        ctl.hide(Some(Duration::ZERO));
        assert_eq!(ctl.phase(), OverlayPhase::Hidden);
    }

    #[test]
    fn cancel_hide_keeps_panel() {
        let fx = Fixture::new();
        let ctl = fx.builder().build();
        ctl.show(ShowOptions::immediate());
        ctl.hide(Some(ms(300)));
        fx.lp.advance(ms(100));
        assert!(ctl.cancel_hide());
        assert!(!ctl.cancel_hide());
        fx.lp.advance(ms(1000));
        assert!(ctl.is_shown());
        assert_eq!(ctl.phase(), OverlayPhase::Shown);
    }

    #[test]
    fn show_during_pending_hide_cancels_it() {
        let fx = Fixture::new();
        let ctl = fx.builder().build();
        ctl.show(ShowOptions::immediate());
        ctl.hide(Some(ms(120)));
        ctl.show(ShowOptions::default());
        fx.lp.advance(ms(500));
        assert_eq!(ctl.phase(), OverlayPhase::Shown);
        assert_eq!(fx.lp.pending_timers(), 0);
    }

    #[test]
    fn lifecycle_callbacks_in_order() {
        let fx = Fixture::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let push = |name: &'static str| {
            let log = Rc::clone(&log);
            move || log.borrow_mut().push(name)
        };
        let ctl = fx
            .builder()
            .on_show(push("show"))
            .on_shown(push("shown"))
            .on_hide(push("hide"))
            .on_hidden(push("hidden"))
            .build();
        ctl.show(ShowOptions::immediate());
        assert_eq!(*log.borrow(), vec!["show"]);
        fx.lp.run_frame();
        ctl.hide(None);
        assert_eq!(*log.borrow(), vec!["show", "shown", "hide", "hidden"]);
    }

    #[test]
    fn missing_content_is_a_noop() {
        let fx = Fixture::new();
        let env = OverlayEnv::new(fx.lp.clone(), fx.dom.panel_factory(), fx.dom.document());
        let ctl = OverlayController::builder(env)
            .anchor(fx.anchor.as_node_ref())
            .build();
        ctl.show(ShowOptions::immediate());
        assert_eq!(ctl.phase(), OverlayPhase::Hidden);
        assert!(!ctl.has_instance());

        ctl.set_content(Rc::new(|| None));
        ctl.show(ShowOptions::immediate());
        assert!(!ctl.has_instance());

        ctl.set_content(Rc::new(|| Some(Content::Text("ready".into()))));
        ctl.show(ShowOptions::immediate());
        assert!(ctl.is_shown());
    }

    #[test]
    fn missing_anchor_is_a_noop() {
        let fx = Fixture::new();
        let env = OverlayEnv::new(fx.lp.clone(), fx.dom.panel_factory(), fx.dom.document());
        let ctl = OverlayController::builder(env).text("x").build();
        ctl.show(ShowOptions::immediate());
        assert_eq!(ctl.phase(), OverlayPhase::Hidden);
        ctl.show(ShowOptions::immediate().with_anchor(fx.anchor.as_node_ref()));
        assert!(ctl.is_shown());
    }

    #[test]
    fn click_outside_hides_after_settle() {
        let fx = Fixture::new();
        let ctl = fx.builder().build();
        ctl.bind_trigger();
        let doc = fx.dom.document();
        doc.click(fx.anchor.id());
        fx.lp.advance(ms(100));
        assert!(ctl.is_shown());
        assert!(ctl.has_document_listener());
        assert_eq!(doc.listener_count(), 1);

        let outside = fx.dom.node("body");
        doc.click(outside.id());
        assert_eq!(ctl.phase(), OverlayPhase::Hidden);
        assert!(!ctl.has_document_listener());
        assert_eq!(doc.listener_count(), 0);
    }

    #[test]
    fn click_inside_panel_keeps_it_open() {
        let fx = Fixture::new();
        let content = fx.dom.node("menu");
        let item = fx.dom.node("item");
        content.append(&item);
        let node = content.as_node_ref();
        let ctl = fx
            .builder()
            .content(move || Some(Content::Node(Rc::clone(&node))))
            .build();
        ctl.show(ShowOptions::immediate());
        fx.lp.run_frame();
        fx.dom.document().click(item.id());
        assert!(ctl.is_shown());
    }

    #[test]
    fn click_trigger_toggles() {
        let fx = Fixture::new();
        let ctl = fx.builder().build();
        ctl.bind_trigger();
        let doc = fx.dom.document();
        doc.click(fx.anchor.id());
        fx.lp.advance(ms(100));
        assert!(ctl.is_shown());
        doc.click(fx.anchor.id());
        assert_eq!(ctl.phase(), OverlayPhase::Hidden);
    }

    #[test]
    fn hover_intent() {
        let fx = Fixture::new();
        let content = fx.dom.node("tooltip");
        let node = content.as_node_ref();
        let ctl = fx
            .builder()
            .trigger(TriggerKind::Hover)
            .content(move || Some(Content::Node(Rc::clone(&node))))
            .build();
        ctl.bind_trigger();
        fx.anchor.dispatch(&DomEvent::new(DomEventKind::MouseEnter, fx.anchor.id()));
        fx.lp.advance(ms(100));
        assert!(ctl.is_shown());

        fx.anchor.dispatch(&DomEvent::new(DomEventKind::MouseLeave, fx.anchor.id()));
        fx.lp.advance(ms(60));
        content.dispatch(&DomEvent::new(DomEventKind::MouseEnter, content.id()));
        fx.lp.advance(ms(500));
        assert_eq!(ctl.phase(), OverlayPhase::Shown);

        content.dispatch(&DomEvent::new(DomEventKind::MouseLeave, content.id()));
        fx.lp.advance(ms(120));
        assert_eq!(ctl.phase(), OverlayPhase::Hidden);
    }

    #[test]
    fn new_instance_per_show_rebuilds() {
        let fx = Fixture::new();
        let config = OverlayConfig {
            new_instance_per_show: true,
            ..OverlayConfig::default()
        };
        let ctl = fx.builder().config(config).build();
        ctl.show(ShowOptions::immediate());
        ctl.hide(None);
        ctl.show(ShowOptions::immediate());
        assert_eq!(ctl.instances_created(), 2);
        assert_eq!(fx.dom.panels().destroyed(), 1);
        assert_eq!(fx.dom.panels().live(), 1);
    }

    #[test]
    fn z_index_increases_per_show() {
        let fx = Fixture::new();
        let a = fx.builder().build();
        let b = fx.builder().build();
        a.show(ShowOptions::immediate());
        b.show(ShowOptions::immediate());
        let (za, zb) = (a.z_index().unwrap_or(0), b.z_index().unwrap_or(0));
        assert!(zb > za);
        a.hide(None);
        a.show(ShowOptions::immediate());
        assert!(a.z_index().unwrap_or(0) > zb);
    }

    #[test]
    fn unready_show_consumes_no_z_index() {
        let fx = Fixture::new();
        let env = OverlayEnv::new(fx.lp.clone(), fx.dom.panel_factory(), fx.dom.document())
            .with_z_index(fx.z.clone());
        let pending = OverlayController::builder(env)
            .anchor(fx.anchor.as_node_ref())
            .content(|| None)
            .build();
        let before = fx.z.peek();
        pending.show(ShowOptions::immediate());
        pending.show(ShowOptions::immediate());
        assert_eq!(fx.z.peek(), before);
        assert_eq!(pending.z_index(), None);

        let ready = fx.builder().build();
        ready.show(ShowOptions::immediate());
        assert_eq!(ready.z_index(), Some(before));
    }

    #[test]
    fn failed_rebuild_releases_old_content_listeners() {
        let fx = Fixture::new();
        let tooltip = fx.dom.node("tooltip");
        let node = tooltip.as_node_ref();
        let ready = Rc::new(Cell::new(true));
        let gate = Rc::clone(&ready);
        let ctl = fx
            .builder()
            .config(OverlayConfig {
                trigger: TriggerKind::Hover,
                new_instance_per_show: true,
                ..OverlayConfig::default()
            })
            .content(move || gate.get().then(|| Content::Node(Rc::clone(&node))))
            .build();
        ctl.show(ShowOptions::immediate());
        assert_eq!(tooltip.listener_count(DomEventKind::MouseEnter), 1);
        assert_eq!(tooltip.listener_count(DomEventKind::MouseLeave), 1);

        ctl.hide(None);
        ready.set(false);
        ctl.show(ShowOptions::immediate());
        assert!(!ctl.has_instance());
        assert_eq!(tooltip.total_listener_count(), 0);
    }

    #[test]
    fn show_cancels_pending_hide_with_or_without_flag() {
        for opts in [
            ShowOptions::immediate(),
            ShowOptions::immediate().cancel_pending_hide(),
        ] {
            let fx = Fixture::new();
            let ctl = fx.builder().build();
            ctl.show(ShowOptions::immediate());
            ctl.hide(Some(ms(120)));
            ctl.show(opts);
            assert_eq!(ctl.phase(), OverlayPhase::Shown);
            fx.lp.advance(ms(500));
            assert!(ctl.is_shown());
        }
    }

    #[test]
    fn set_props_forwards_to_live_panel() {
        let fx = Fixture::new();
        let ctl = fx.builder().build();
        ctl.set_props(OverlayPropsPatch::default().arrow(true));
        ctl.show(ShowOptions::immediate());
        ctl.set_props(OverlayPropsPatch::default().placement(Placement::Above));
        assert!(ctl.props().arrow);
        let last = fx.dom.panels().last_props();
        assert_eq!(last.map(|p| (p.arrow, p.placement)), Some((true, Placement::Above)));
    }

    #[test]
    fn reposition_requires_shown_unless_forced() {
        let fx = Fixture::new();
        let ctl = fx.builder().build();
        assert!(!ctl.reposition_if_shown(true));
        ctl.show(ShowOptions::immediate());
        ctl.hide(None);
        assert!(!ctl.reposition_if_shown(false));
        assert!(ctl.reposition_if_shown(true));
        ctl.show(ShowOptions::immediate());
        assert!(ctl.reposition_if_shown(false));
        assert_eq!(fx.dom.panels().repositions(), 2);
    }

    #[test]
    fn resize_of_watched_node_repositions() {
        let fx = Fixture::new();
        let target = fx.dom.sized("content", 100.0, 40.0);
        let ctl = fx.builder().watch_resize(target.as_node_ref()).build();
        ctl.show(ShowOptions::immediate());
        for h in 0..5 {
            target.resize(100.0, 40.0 + f64::from(h));
        }
        fx.lp.advance(ms(120));
        assert_eq!(fx.dom.panels().repositions(), 1);
    }

    #[test]
    fn uninstall_twice_is_safe() {
        let fx = Fixture::new();
        let target = fx.dom.sized("content", 100.0, 40.0);
        let ctl = fx.builder().watch_resize(target.as_node_ref()).build();
        ctl.bind_trigger();
        ctl.show(ShowOptions::immediate());
        ctl.hide(Some(ms(300)));
        ctl.uninstall();
        ctl.uninstall();
        assert_eq!(ctl.phase(), OverlayPhase::Hidden);
        assert!(!ctl.has_instance());
        assert!(!ctl.is_watching_resize());
        assert_eq!(fx.lp.pending_timers(), 0);
        assert_eq!(fx.lp.pending_frames(), 0);
        assert_eq!(fx.anchor.listener_count(DomEventKind::Click), 0);
        assert_eq!(target.resize_observer_count(), 0);
        assert_eq!(fx.dom.panels().live(), 0);
    }

    #[test]
    fn show_after_uninstall_rebuilds() {
        let fx = Fixture::new();
        let ctl = fx.builder().build();
        ctl.show(ShowOptions::immediate());
        ctl.uninstall();
        ctl.show(ShowOptions::immediate());
        assert!(ctl.is_shown());
        assert_eq!(ctl.instances_created(), 2);
    }

    #[test]
    fn reentrant_show_from_on_show_is_ignored() {
        let fx = Fixture::new();
        let slot: Rc<RefCell<Option<OverlayController>>> = Rc::new(RefCell::new(None));
        let again = Rc::clone(&slot);
        let ctl = fx
            .builder()
            .on_show(move || {
                if let Some(c) = again.borrow().as_ref() {
                    c.show(ShowOptions::immediate());
                }
            })
            .build();
        *slot.borrow_mut() = Some(ctl.clone());
        ctl.show(ShowOptions::immediate());
        assert_eq!(fx.dom.panels().created(), 1);
        assert_eq!(fx.dom.panels().shows(), 1);
        slot.borrow_mut().take();
    }

    #[test]
    fn hide_from_on_show_wins() {
        let fx = Fixture::new();
        let slot: Rc<RefCell<Option<OverlayController>>> = Rc::new(RefCell::new(None));
        let again = Rc::clone(&slot);
        let ctl = fx
            .builder()
            .on_show(move || {
                if let Some(c) = again.borrow().as_ref() {
                    c.hide(None);
                }
            })
            .build();
        *slot.borrow_mut() = Some(ctl.clone());
        ctl.show(ShowOptions::immediate());
        assert_eq!(ctl.phase(), OverlayPhase::Hidden);
        assert!(!ctl.is_shown());
        assert_eq!(fx.lp.pending_frames(), 0);
        slot.borrow_mut().take();
    }
}
