#![forbid(unsafe_code)]

//! Narrow seams over the host document.
//!
//! The overlay state machines never touch a real DOM. They see nodes through
//! three small capabilities, combined as [`Node`]:
//!
//! - [`Measurable`]: box measurements and resize observation
//! - [`EventTarget`]: identity, event listeners, containment
//! - [`Clonable`]: detached deep copies (no listeners carried over)
//!
//! plus a [`Document`] for page-level click listeners. A browser binding
//! implements these over `web-sys`; the headless fakes in `popkit-widgets`
//! implement them in memory for tests.

use std::rc::Rc;

use crate::event::{DomEvent, DomEventKind};
use crate::geometry::{Measurement, Rect};
use crate::subscription::Subscription;

/// Stable identity of a node within one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

/// Callback receiving fresh measurements of an observed node.
pub type ResizeListener = Rc<dyn Fn(Measurement)>;

/// Callback receiving dispatched DOM events.
pub type EventHandler = Rc<dyn Fn(&DomEvent)>;

/// Shared handle to a node.
pub type NodeRef = Rc<dyn Node>;

/// Something the layout engine has measured.
pub trait Measurable {
    /// Current box measurements.
    fn measure(&self) -> Measurement;

    /// Observe size changes. Every change invokes `listener` with the new
    /// measurement; the subscription detaches the observation.
    fn observe_resize(&self, listener: ResizeListener) -> Subscription;
}

/// Something that receives DOM events.
pub trait EventTarget {
    /// Identity of this node.
    fn node_id(&self) -> NodeId;

    /// Attach a listener for `kind`.
    fn listen(&self, kind: DomEventKind, handler: EventHandler) -> Subscription;

    /// Whether `node` is this node or one of its descendants.
    fn contains(&self, node: NodeId) -> bool;

    /// Whether the node is attached to the document.
    fn is_connected(&self) -> bool;
}

/// Something that can be deep-copied into a detached subtree.
pub trait Clonable {
    /// Copy this subtree. Listeners are not copied and the copy shares no
    /// state with the original.
    fn deep_clone(&self) -> NodeRef;
}

/// A full DOM node.
pub trait Node: Measurable + EventTarget + Clonable {
    /// Page-relative bounding box.
    fn bounds(&self) -> Rect;

    /// Move keyboard focus to the first descendant (or self) with `role`.
    /// Returns whether anything received focus.
    fn focus_descendant(&self, role: &str) -> bool;
}

/// The page-level event target.
pub trait Document {
    /// Attach a click listener on the document. Clicks reach it after the
    /// target's own handlers have run.
    fn listen_click(&self, handler: EventHandler) -> Subscription;
}
