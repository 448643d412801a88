#![forbid(unsafe_code)]

//! In-memory DOM, document, and floating-panel fakes.
//!
//! Everything in popkit talks to the page through the `popkit-core` traits.
//! This module implements those traits without a browser so controllers can
//! be driven deterministically from tests (and from non-browser hosts that
//! only need the state machines).
//!
//! - [`HeadlessDom`] hands out nodes with unique ids and owns the shared
//!   [`HeadlessDocument`] and [`HeadlessPanelFactory`].
//! - [`HeadlessNode`] stores a role, text, size, children, and listeners.
//!   Events dispatched at a node bubble from the target up to that node.
//! - A [`Journal`] records panel operations and focus changes in order.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use ahash::AHashMap;
use popkit_core::{
    Clonable, Document, DomEvent, DomEventKind, EventHandler, EventTarget, Measurable,
    Measurement, Node, NodeId, NodeRef, Rect, ResizeListener, Subscription,
};

use crate::overlay::{Content, FloatingPanel, OverlayProps, OverlayPropsPatch, PanelFactory, PanelSpec};

// ---------------------------------------------------------------------------
// Journal
// ---------------------------------------------------------------------------

/// Ordered log of side effects, shared by everything one [`HeadlessDom`]
/// creates.
#[derive(Debug, Clone, Default)]
pub struct Journal(Rc<RefCell<Vec<String>>>);

impl Journal {
    pub fn record(&self, entry: impl Into<String>) {
        self.0.borrow_mut().push(entry.into());
    }

    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.0.borrow().clone()
    }

    /// Index of the first entry equal to `entry`.
    #[must_use]
    pub fn position(&self, entry: &str) -> Option<usize> {
        self.0.borrow().iter().position(|e| e == entry)
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

// ---------------------------------------------------------------------------
// DOM
// ---------------------------------------------------------------------------

type Registry = Rc<RefCell<AHashMap<NodeId, Weak<NodeData>>>>;

#[derive(Clone)]
struct Shared {
    ids: Rc<Cell<u64>>,
    registry: Registry,
    journal: Journal,
}

impl Shared {
    fn next_id(&self) -> NodeId {
        let id = self.ids.get() + 1;
        self.ids.set(id);
        NodeId(id)
    }
}

/// Factory and registry for headless nodes.
#[derive(Clone)]
pub struct HeadlessDom {
    shared: Shared,
    document: Rc<HeadlessDocument>,
    panels: Rc<HeadlessPanelFactory>,
}

impl HeadlessDom {
    #[must_use]
    pub fn new() -> Self {
        let shared = Shared {
            ids: Rc::new(Cell::new(0)),
            registry: Rc::default(),
            journal: Journal::default(),
        };
        let document = Rc::new(HeadlessDocument {
            registry: Rc::clone(&shared.registry),
            listeners: Rc::default(),
            next_listener: Cell::new(0),
        });
        let panels = Rc::new(HeadlessPanelFactory {
            shared: shared.clone(),
            stats: Rc::default(),
        });
        Self {
            shared,
            document,
            panels,
        }
    }

    /// A zero-sized node.
    #[must_use]
    pub fn node(&self, role: &str) -> HeadlessNode {
        self.sized(role, 0.0, 0.0)
    }

    /// A node with a fixed box.
    #[must_use]
    pub fn sized(&self, role: &str, width: f64, height: f64) -> HeadlessNode {
        HeadlessNode::create(&self.shared, role, width, height)
    }

    /// Look up a live node by id.
    #[must_use]
    pub fn find(&self, id: NodeId) -> Option<HeadlessNode> {
        find_in(&self.shared.registry, id)
    }

    #[must_use]
    pub fn document(&self) -> Rc<HeadlessDocument> {
        Rc::clone(&self.document)
    }

    #[must_use]
    pub fn panel_factory(&self) -> Rc<HeadlessPanelFactory> {
        Rc::clone(&self.panels)
    }

    /// Alias of [`panel_factory`](Self::panel_factory) for reading stats.
    #[must_use]
    pub fn panels(&self) -> Rc<HeadlessPanelFactory> {
        Rc::clone(&self.panels)
    }

    #[must_use]
    pub fn journal(&self) -> Journal {
        self.shared.journal.clone()
    }
}

impl Default for HeadlessDom {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HeadlessDom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeadlessDom")
            .field("nodes", &self.shared.ids.get())
            .finish_non_exhaustive()
    }
}

fn find_in(registry: &Registry, id: NodeId) -> Option<HeadlessNode> {
    registry
        .borrow()
        .get(&id)
        .and_then(Weak::upgrade)
        .map(HeadlessNode)
}

struct NodeData {
    id: NodeId,
    role: String,
    shared: Shared,
    text: RefCell<String>,
    value: RefCell<String>,
    width: Cell<f64>,
    height: Cell<f64>,
    scroll_width: Cell<Option<f64>>,
    children: RefCell<Vec<HeadlessNode>>,
    listeners: RefCell<AHashMap<DomEventKind, Vec<(u64, EventHandler)>>>,
    resize_listeners: RefCell<Vec<(u64, ResizeListener)>>,
    next_listener: Cell<u64>,
    connected: Cell<bool>,
    focused: Cell<bool>,
}

impl Drop for NodeData {
    fn drop(&mut self) {
        if let Ok(mut registry) = self.shared.registry.try_borrow_mut() {
            registry.remove(&self.id);
        }
    }
}

/// A node in the headless DOM. Clones are handles to the same node.
#[derive(Clone)]
pub struct HeadlessNode(Rc<NodeData>);

impl HeadlessNode {
    fn create(shared: &Shared, role: &str, width: f64, height: f64) -> Self {
        let id = shared.next_id();
        let node = Self(Rc::new(NodeData {
            id,
            role: role.to_owned(),
            shared: shared.clone(),
            text: RefCell::default(),
            value: RefCell::default(),
            width: Cell::new(width),
            height: Cell::new(height),
            scroll_width: Cell::new(None),
            children: RefCell::default(),
            listeners: RefCell::default(),
            resize_listeners: RefCell::default(),
            next_listener: Cell::new(0),
            connected: Cell::new(true),
            focused: Cell::new(false),
        }));
        shared.registry.borrow_mut().insert(id, Rc::downgrade(&node.0));
        node
    }

    #[must_use]
    pub fn id(&self) -> NodeId {
        self.0.id
    }

    #[must_use]
    pub fn role(&self) -> &str {
        &self.0.role
    }

    /// Shareable trait-object handle to this node.
    #[must_use]
    pub fn as_node_ref(&self) -> NodeRef {
        Rc::new(self.clone())
    }

    #[must_use]
    pub fn text(&self) -> String {
        self.0.text.borrow().clone()
    }

    pub fn set_text(&self, text: impl Into<String>) {
        *self.0.text.borrow_mut() = text.into();
    }

    #[must_use]
    pub fn value(&self) -> String {
        self.0.value.borrow().clone()
    }

    pub fn set_value(&self, value: impl Into<String>) {
        *self.0.value.borrow_mut() = value.into();
    }

    pub fn append(&self, child: &HeadlessNode) {
        self.0.children.borrow_mut().push(child.clone());
    }

    /// Remove every child.
    pub fn clear_children(&self) {
        self.0.children.borrow_mut().clear();
    }

    #[must_use]
    pub fn children(&self) -> Vec<HeadlessNode> {
        self.0.children.borrow().clone()
    }

    /// First node in this subtree (self included) with `role`.
    #[must_use]
    pub fn find_role(&self, role: &str) -> Option<HeadlessNode> {
        if self.0.role == role {
            return Some(self.clone());
        }
        self.children().iter().find_map(|c| c.find_role(role))
    }

    /// Set the box size and notify resize observers.
    pub fn resize(&self, width: f64, height: f64) {
        self.0.width.set(width);
        self.0.height.set(height);
        self.notify_resize();
    }

    /// Set the content width independently of the box width and notify.
    pub fn set_scroll_width(&self, scroll_width: Option<f64>) {
        self.0.scroll_width.set(scroll_width);
        self.notify_resize();
    }

    fn notify_resize(&self) {
        let measurement = self.measure();
        let snapshot: Vec<ResizeListener> = self
            .0
            .resize_listeners
            .borrow()
            .iter()
            .map(|(_, l)| Rc::clone(l))
            .collect();
        for listener in snapshot {
            listener(measurement);
        }
    }

    pub fn set_connected(&self, connected: bool) {
        self.0.connected.set(connected);
    }

    #[must_use]
    pub fn is_focused(&self) -> bool {
        self.0.focused.get()
    }

    #[must_use]
    pub fn listener_count(&self, kind: DomEventKind) -> usize {
        self.0.listeners.borrow().get(&kind).map_or(0, Vec::len)
    }

    #[must_use]
    pub fn total_listener_count(&self) -> usize {
        self.0.listeners.borrow().values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn resize_observer_count(&self) -> usize {
        self.0.resize_listeners.borrow().len()
    }

    /// Deliver `event` to its target and every ancestor up to this node.
    ///
    /// Returns the number of handlers run. Handlers attached during
    /// dispatch do not see the event.
    pub fn dispatch(&self, event: &DomEvent) -> usize {
        let Some(path) = self.path_to(event.target) else {
            return 0;
        };
        let mut handlers: Vec<EventHandler> = Vec::new();
        for node in path.iter().rev() {
            if let Some(list) = node.0.listeners.borrow().get(&event.kind) {
                handlers.extend(list.iter().map(|(_, h)| Rc::clone(h)));
            }
        }
        for handler in &handlers {
            handler(event);
        }
        handlers.len()
    }

    fn path_to(&self, target: NodeId) -> Option<Vec<HeadlessNode>> {
        if self.0.id == target {
            return Some(vec![self.clone()]);
        }
        for child in self.children() {
            if let Some(mut path) = child.path_to(target) {
                path.insert(0, self.clone());
                return Some(path);
            }
        }
        None
    }

    fn clone_subtree(&self) -> HeadlessNode {
        let shared = &self.0.shared;
        let copy = HeadlessNode::create(shared, &self.0.role, self.0.width.get(), self.0.height.get());
        copy.set_text(self.text());
        copy.set_value(self.value());
        copy.0.scroll_width.set(self.0.scroll_width.get());
        for child in self.children() {
            copy.append(&child.clone_subtree());
        }
        copy
    }
}

impl Measurable for HeadlessNode {
    fn measure(&self) -> Measurement {
        let width = self.0.width.get();
        Measurement {
            offset_width: width,
            scroll_width: self.0.scroll_width.get().unwrap_or(width),
            offset_height: self.0.height.get(),
        }
    }

    fn observe_resize(&self, listener: ResizeListener) -> Subscription {
        let id = self.0.next_listener.get() + 1;
        self.0.next_listener.set(id);
        self.0.resize_listeners.borrow_mut().push((id, listener));
        let weak = Rc::downgrade(&self.0);
        Subscription::new("dom.resize", move || {
            if let Some(data) = weak.upgrade() {
                data.resize_listeners.borrow_mut().retain(|(lid, _)| *lid != id);
            }
        })
    }
}

impl EventTarget for HeadlessNode {
    fn node_id(&self) -> NodeId {
        self.0.id
    }

    fn listen(&self, kind: DomEventKind, handler: EventHandler) -> Subscription {
        let id = self.0.next_listener.get() + 1;
        self.0.next_listener.set(id);
        self.0
            .listeners
            .borrow_mut()
            .entry(kind)
            .or_default()
            .push((id, handler));
        let weak = Rc::downgrade(&self.0);
        Subscription::new("dom.listen", move || {
            if let Some(data) = weak.upgrade() {
                if let Some(list) = data.listeners.borrow_mut().get_mut(&kind) {
                    list.retain(|(lid, _)| *lid != id);
                }
            }
        })
    }

    fn contains(&self, node: NodeId) -> bool {
        self.path_to(node).is_some()
    }

    fn is_connected(&self) -> bool {
        self.0.connected.get()
    }
}

impl Clonable for HeadlessNode {
    /// Copy the subtree with fresh ids. Listeners are not copied and the copy
    /// starts detached.
    fn deep_clone(&self) -> NodeRef {
        let copy = self.clone_subtree();
        copy.set_connected(false);
        copy.as_node_ref()
    }
}

impl Node for HeadlessNode {
    fn bounds(&self) -> Rect {
        Rect::from_size(self.0.width.get(), self.0.height.get())
    }

    fn focus_descendant(&self, role: &str) -> bool {
        match self.find_role(role) {
            Some(node) => {
                node.0.focused.set(true);
                self.0.shared.journal.record(format!("focus:{role}"));
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for HeadlessNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeadlessNode")
            .field("id", &self.0.id)
            .field("role", &self.0.role)
            .field("children", &self.0.children.borrow().len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// Document-level click listeners.
pub struct HeadlessDocument {
    registry: Registry,
    listeners: Rc<RefCell<Vec<(u64, EventHandler)>>>,
    next_listener: Cell<u64>,
}

impl HeadlessDocument {
    /// Click `target`: its own handlers run first, then document listeners
    /// attached before the click.
    pub fn click(&self, target: NodeId) {
        let event = DomEvent::click(target);
        if let Some(node) = find_in(&self.registry, target) {
            node.dispatch(&event);
        }
        let snapshot: Vec<EventHandler> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, h)| Rc::clone(h))
            .collect();
        for handler in snapshot {
            handler(&event);
        }
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }
}

impl Document for HeadlessDocument {
    fn listen_click(&self, handler: EventHandler) -> Subscription {
        let id = self.next_listener.get() + 1;
        self.next_listener.set(id);
        self.listeners.borrow_mut().push((id, handler));
        let listeners = Rc::downgrade(&self.listeners);
        Subscription::new("document.click", move || {
            if let Some(listeners) = listeners.upgrade() {
                listeners.borrow_mut().retain(|(lid, _)| *lid != id);
            }
        })
    }
}

impl fmt::Debug for HeadlessDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeadlessDocument")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Floating panels
// ---------------------------------------------------------------------------

#[derive(Default)]
struct PanelStats {
    created: Cell<u32>,
    destroyed: Cell<u32>,
    shows: Cell<u32>,
    hides: Cell<u32>,
    repositions: Cell<u32>,
    last_props: RefCell<Option<OverlayProps>>,
    last_content: RefCell<Option<String>>,
    roots: RefCell<Vec<NodeId>>,
}

/// Builds [`HeadlessPanel`]s and counts what happens to them.
pub struct HeadlessPanelFactory {
    shared: Shared,
    stats: Rc<PanelStats>,
}

impl HeadlessPanelFactory {
    #[must_use]
    pub fn created(&self) -> u32 {
        self.stats.created.get()
    }

    #[must_use]
    pub fn destroyed(&self) -> u32 {
        self.stats.destroyed.get()
    }

    /// Panels created and not yet destroyed.
    #[must_use]
    pub fn live(&self) -> u32 {
        self.created() - self.destroyed()
    }

    #[must_use]
    pub fn shows(&self) -> u32 {
        self.stats.shows.get()
    }

    #[must_use]
    pub fn hides(&self) -> u32 {
        self.stats.hides.get()
    }

    #[must_use]
    pub fn repositions(&self) -> u32 {
        self.stats.repositions.get()
    }

    /// Props of the most recently created or updated panel.
    #[must_use]
    pub fn last_props(&self) -> Option<OverlayProps> {
        self.stats.last_props.borrow().clone()
    }

    /// Text of the most recently built panel (`node#<id>` for node content).
    #[must_use]
    pub fn last_content(&self) -> Option<String> {
        self.stats.last_content.borrow().clone()
    }

    /// Root node id of the most recently built panel.
    #[must_use]
    pub fn last_root(&self) -> Option<NodeId> {
        self.stats.roots.borrow().last().copied()
    }
}

impl PanelFactory for HeadlessPanelFactory {
    fn create(&self, spec: PanelSpec) -> Box<dyn FloatingPanel> {
        let root = self.shared.next_id();
        let stats = &self.stats;
        stats.created.set(stats.created.get() + 1);
        *stats.last_props.borrow_mut() = Some(spec.props.clone());
        *stats.last_content.borrow_mut() = Some(match &spec.content {
            Content::Text(text) => text.clone(),
            Content::Node(node) => format!("node#{}", node.node_id().0),
        });
        stats.roots.borrow_mut().push(root);
        self.shared
            .journal
            .record(format!("create@{}", spec.anchor.node_id().0));
        Box::new(HeadlessPanel {
            root,
            spec,
            shown: false,
            mounted: true,
            destroyed: false,
            stats: Rc::clone(&self.stats),
            journal: self.shared.journal.clone(),
        })
    }
}

impl fmt::Debug for HeadlessPanelFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeadlessPanelFactory")
            .field("created", &self.created())
            .field("destroyed", &self.destroyed())
            .finish()
    }
}

/// A floating panel that records operations instead of rendering.
pub struct HeadlessPanel {
    root: NodeId,
    spec: PanelSpec,
    shown: bool,
    mounted: bool,
    destroyed: bool,
    stats: Rc<PanelStats>,
    journal: Journal,
}

impl HeadlessPanel {
    fn record(&self, op: &str) {
        self.journal
            .record(format!("{op}@{}", self.spec.anchor.node_id().0));
    }
}

impl FloatingPanel for HeadlessPanel {
    fn show(&mut self) {
        if self.destroyed {
            return;
        }
        self.shown = true;
        self.stats.shows.set(self.stats.shows.get() + 1);
        self.record("show");
    }

    fn hide(&mut self) {
        if !self.shown {
            return;
        }
        self.shown = false;
        self.stats.hides.set(self.stats.hides.get() + 1);
        self.record("hide");
    }

    fn is_shown(&self) -> bool {
        self.shown
    }

    fn set_props(&mut self, patch: &OverlayPropsPatch) {
        self.spec.props.apply(patch);
        *self.stats.last_props.borrow_mut() = Some(self.spec.props.clone());
    }

    fn set_anchor(&mut self, anchor: NodeRef) {
        self.spec.anchor = anchor;
    }

    fn reposition(&mut self) {
        self.stats.repositions.set(self.stats.repositions.get() + 1);
        self.record("reposition");
    }

    fn contains(&self, node: NodeId) -> bool {
        node == self.root || self.spec.content.node().is_some_and(|c| c.contains(node))
    }

    fn unmount(&mut self) {
        self.mounted = false;
    }

    fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        self.shown = false;
        self.stats.destroyed.set(self.stats.destroyed.get() + 1);
        self.record("destroy");
    }
}

impl fmt::Debug for HeadlessPanel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeadlessPanel")
            .field("root", &self.root)
            .field("shown", &self.shown)
            .field("mounted", &self.mounted)
            .field("destroyed", &self.destroyed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        let dom = HeadlessDom::new();
        let a = dom.node("a");
        let b = dom.node("b");
        assert_ne!(a.id(), b.id());
        assert_eq!(dom.find(b.id()).map(|n| n.role().to_owned()), Some("b".into()));
    }

    #[test]
    fn dropped_nodes_leave_registry() {
        let dom = HeadlessDom::new();
        let id = dom.node("tmp").id();
        assert!(dom.find(id).is_none());
    }

    #[test]
    fn events_bubble_to_root() {
        let dom = HeadlessDom::new();
        let root = dom.node("list");
        let item = dom.node("item");
        root.append(&item);
        let hits = Rc::new(RefCell::new(Vec::new()));
        let (h1, h2) = (Rc::clone(&hits), Rc::clone(&hits));
        let _a = root.listen(DomEventKind::Click, Rc::new(move |_: &DomEvent| h1.borrow_mut().push("root")));
        let _b = item.listen(DomEventKind::Click, Rc::new(move |_: &DomEvent| h2.borrow_mut().push("item")));
        assert_eq!(root.dispatch(&DomEvent::click(item.id())), 2);
        assert_eq!(*hits.borrow(), vec!["item", "root"]);
    }

    #[test]
    fn dispatch_outside_subtree_is_ignored() {
        let dom = HeadlessDom::new();
        let root = dom.node("list");
        let other = dom.node("other");
        let _sub = root.listen(DomEventKind::Click, Rc::new(|_: &DomEvent| panic!("should not run")));
        assert_eq!(root.dispatch(&DomEvent::click(other.id())), 0);
    }

    #[test]
    fn listener_subscription_detaches() {
        let dom = HeadlessDom::new();
        let node = dom.node("n");
        let sub = node.listen(DomEventKind::Input, Rc::new(|_: &DomEvent| {}));
        assert_eq!(node.listener_count(DomEventKind::Input), 1);
        drop(sub);
        assert_eq!(node.listener_count(DomEventKind::Input), 0);
    }

    #[test]
    fn deep_clone_copies_structure_not_listeners() {
        let dom = HeadlessDom::new();
        let root = dom.sized("editor", 200.0, 30.0);
        let input = dom.node("input");
        input.set_value("abc");
        root.append(&input);
        let _sub = root.listen(DomEventKind::Click, Rc::new(|_: &DomEvent| {}));
        let copy = root.deep_clone();
        let copy = dom.find(copy.node_id()).map(|n| {
            assert_ne!(n.id(), root.id());
            assert_eq!(n.total_listener_count(), 0);
            assert!(!n.is_connected());
            assert_eq!(n.bounds().width, 200.0);
            n.find_role("input").map(|i| i.value())
        });
        assert_eq!(copy, Some(Some("abc".to_owned())));
    }

    #[test]
    fn resize_notifies_observers() {
        let dom = HeadlessDom::new();
        let node = dom.node("box");
        let seen = Rc::new(Cell::new(0.0));
        let sink = Rc::clone(&seen);
        let sub = node.observe_resize(Rc::new(move |m: Measurement| sink.set(m.offset_height)));
        node.resize(10.0, 42.0);
        assert_eq!(seen.get(), 42.0);
        drop(sub);
        assert_eq!(node.resize_observer_count(), 0);
    }

    #[test]
    fn scroll_width_defaults_to_width() {
        let dom = HeadlessDom::new();
        let node = dom.sized("row", 100.0, 20.0);
        assert!(!node.measure().overflows());
        node.set_scroll_width(Some(150.0));
        assert_eq!(node.measure().horizontal_overflow(), 50.0);
    }

    #[test]
    fn focus_descendant_records() {
        let dom = HeadlessDom::new();
        let root = dom.node("editor");
        let input = dom.node("input");
        root.append(&input);
        assert!(root.focus_descendant("input"));
        assert!(input.is_focused());
        assert!(!root.focus_descendant("missing"));
        assert_eq!(dom.journal().entries(), vec!["focus:input".to_owned()]);
    }

    #[test]
    fn document_runs_target_handlers_first() {
        let dom = HeadlessDom::new();
        let doc = dom.document();
        let node = dom.node("btn");
        let order = Rc::new(RefCell::new(Vec::new()));
        let (o1, o2) = (Rc::clone(&order), Rc::clone(&order));
        let _a = doc.listen_click(Rc::new(move |_: &DomEvent| o1.borrow_mut().push("document")));
        let _b = node.listen(DomEventKind::Click, Rc::new(move |_: &DomEvent| o2.borrow_mut().push("target")));
        doc.click(node.id());
        assert_eq!(*order.borrow(), vec!["target", "document"]);
    }

    #[test]
    fn panel_stats_track_lifecycle() {
        let dom = HeadlessDom::new();
        let anchor = dom.node("anchor");
        let factory = dom.panel_factory();
        let mut panel = factory.create(PanelSpec {
            anchor: anchor.as_node_ref(),
            content: Content::Text("hi".into()),
            props: OverlayProps::default(),
            fixed_position: false,
        });
        panel.show();
        panel.reposition();
        panel.hide();
        panel.destroy();
        panel.destroy();
        assert_eq!((factory.shows(), factory.hides(), factory.repositions()), (1, 1, 1));
        assert_eq!(factory.live(), 0);
        assert_eq!(factory.last_content().as_deref(), Some("hi"));
        let a = anchor.id().0;
        assert_eq!(
            dom.journal().entries(),
            vec![
                format!("create@{a}"),
                format!("show@{a}"),
                format!("reposition@{a}"),
                format!("hide@{a}"),
                format!("destroy@{a}"),
            ]
        );
        assert!(panel.contains(factory.last_root().unwrap_or(NodeId(0))));
    }
}
