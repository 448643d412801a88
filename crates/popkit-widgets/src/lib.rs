#![forbid(unsafe_code)]

//! popkit widgets
//!
//! Floating-overlay coordination and overflow-aware tag rows.
//!
//! # Key Components
//!
//! - [`OverlayController`] - Show/hide state machine for one floating panel
//! - [`TagOverflowList`] - Tag row that collapses trailing tags into "+N"
//! - [`DualOverlaySynchronizer`] - Cloned editing region plus its dropdown
//! - [`headless`] - In-memory DOM, document, and panel fakes
//!
//! # Role in popkit
//! This crate is where time (`popkit-runtime`), geometry (`popkit-layout`)
//! and the page (`popkit-core` traits) meet. Controllers never touch a real
//! DOM: hosts supply a [`PanelFactory`] and a [`popkit_core::Document`].
//!
//! # How it fits in the system
//! The `popkit` facade re-exports everything here. Tests and non-browser
//! hosts drive the controllers through [`headless::HeadlessDom`].

pub mod dual_overlay;
pub mod headless;
pub mod overlay;
pub mod tag_list;

pub use dual_overlay::{
    DEFAULT_INPUT_ROLE, DualOverlayBuilder, DualOverlayCallbacks, DualOverlaySynchronizer,
};
pub use overlay::{
    Callback, Content, ContentProvider, FloatingPanel, OverlayBuilder, OverlayCallbacks,
    OverlayConfig, OverlayController, OverlayEnv, OverlayPhase, OverlayProps, OverlayPropsPatch,
    PanelFactory, PanelSpec, Placement, ShowOptions, TriggerKind,
};
pub use tag_list::TagOverflowList;
