#![forbid(unsafe_code)]

//! popkit public facade crate.
//!
//! Re-exports the overlay controllers, overflow layout, and scheduling
//! primitives from the internal crates, plus a prelude for day-to-day use.

use std::fmt;

// --- Core re-exports -------------------------------------------------------

pub use popkit_core::{
    Clonable, Document, DomEvent, DomEventKind, EventHandler, EventTarget, Key, Measurable,
    Measurement, Node, NodeId, NodeRef, OverlayEvent, Rect, ResizeListener, Subscription,
};

// --- Runtime re-exports ----------------------------------------------------

pub use popkit_runtime::{
    DEFAULT_HOVER_HIDE_DELAY, DEFAULT_RESIZE_LATENCY, DEFAULT_SHOW_DEBOUNCE,
    DEFAULT_Z_INDEX_BASE, DebouncedSignal, Duration, EventLoop, ResizeWatcher, TimerId,
    TimingConfig, TimingConfigError, ZIndexAllocator,
};

// --- Layout re-exports -----------------------------------------------------

pub use popkit_layout::{
    MeasuredItem, OverflowLayout, OverflowLayoutEngine, OverflowState, compute, compute_measured,
};

// --- Widget re-exports -----------------------------------------------------

pub use popkit_widgets::headless::HeadlessDom;
pub use popkit_widgets::{
    Content, DualOverlaySynchronizer, FloatingPanel, OverlayConfig, OverlayController, OverlayEnv,
    OverlayPhase, OverlayProps, OverlayPropsPatch, PanelFactory, Placement, ShowOptions,
    TagOverflowList, TriggerKind,
};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for popkit hosts.
#[derive(Debug)]
pub enum Error {
    /// Timing configuration could not be loaded or failed validation.
    Config(TimingConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(err) => write!(f, "timing config: {err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
        }
    }
}

impl From<TimingConfigError> for Error {
    fn from(err: TimingConfigError) -> Self {
        Self::Config(err)
    }
}

/// Standard result type for popkit APIs.
pub type Result<T> = std::result::Result<T, Error>;

/// Load overlay timing from a TOML file.
#[cfg(feature = "config")]
pub fn load_timing(path: impl AsRef<std::path::Path>) -> Result<TimingConfig> {
    Ok(TimingConfig::from_toml_file(path)?)
}

/// An environment backed by a fresh headless DOM.
///
/// Convenient for tests and non-browser hosts that only need the state
/// machines.
#[must_use]
pub fn headless_env(dom: &HeadlessDom, event_loop: &EventLoop) -> OverlayEnv {
    OverlayEnv::new(event_loop.clone(), dom.panel_factory(), dom.document())
}

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        Content, Duration, Error, EventLoop, Measurement, NodeRef, OverlayConfig,
        OverlayController, OverlayEnv, OverlayPhase, Placement, Result, ShowOptions,
        TagOverflowList, TimingConfig, TriggerKind,
    };

    pub use crate::{core, layout, runtime, widgets};
}

pub use popkit_core as core;
pub use popkit_layout as layout;
pub use popkit_runtime as runtime;
pub use popkit_widgets as widgets;
