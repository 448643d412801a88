#![forbid(unsafe_code)]

//! Core: geometry, DOM seams, and listener handles.
//!
//! # Role in popkit
//! `popkit-core` is the boundary layer. It defines how the overlay machinery
//! sees the host document ([`dom::Node`], [`dom::Document`]), the events it
//! consumes ([`event::DomEvent`]), and the owned [`Subscription`] handles that
//! make listener lifetimes explicit.
//!
//! # How it fits in the system
//! `popkit-runtime` schedules work against these seams, `popkit-layout`
//! consumes measurements, and `popkit-widgets` composes everything into
//! overlay controllers.

pub mod dom;
pub mod event;
pub mod geometry;
pub mod subscription;

pub use dom::{
    Clonable, Document, EventHandler, EventTarget, Measurable, Node, NodeId, NodeRef,
    ResizeListener,
};
pub use event::{DomEvent, DomEventKind, Key, OverlayEvent};
pub use geometry::{Measurement, Rect};
pub use subscription::Subscription;
