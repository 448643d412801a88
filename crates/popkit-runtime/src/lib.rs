#![forbid(unsafe_code)]

//! popkit runtime
//!
//! Scheduling primitives the overlay controllers are built on.
//!
//! # Key Components
//!
//! - [`EventLoop`] - Single-threaded cooperative loop with a virtual clock
//! - [`DebouncedSignal`] - Collapse bursts of calls into one delayed call
//! - [`ResizeWatcher`] - Debounced observation of one node's box size
//! - [`ZIndexAllocator`] - Shared stacking-order counter
//! - [`TimingConfig`] - Latency knobs, optionally loaded from TOML/JSON
//!
//! # Role in popkit
//! `popkit-runtime` owns time. Every delay in the system (show debounce,
//! hover-out hide, resize latency, deferred "next frame" work) is a task on
//! an [`EventLoop`]. Cancelling a pending task is always possible through
//! the [`TimerId`] it returned.
//!
//! # How it fits in the system
//! It consumes the DOM seams from `popkit-core` and is consumed by
//! `popkit-widgets`. `popkit-layout` does not depend on it: overflow
//! computation is pure.

pub mod debounce;
pub mod event_loop;
pub mod resize_watcher;
pub mod timing_config;
pub mod z_index;

pub use debounce::{DEFAULT_SHOW_DEBOUNCE, DebouncedSignal};
pub use event_loop::{EventLoop, MAX_IDLE_STEPS, TimerId};
pub use resize_watcher::{DEFAULT_RESIZE_LATENCY, ResizeWatcher};
pub use timing_config::{
    DEFAULT_HOVER_HIDE_DELAY, MAX_LATENCY_MS, TimingConfig, TimingConfigError,
};
pub use z_index::{DEFAULT_Z_INDEX_BASE, ZIndexAllocator};

pub use web_time::Duration;
