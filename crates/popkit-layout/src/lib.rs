#![forbid(unsafe_code)]

//! Overflow layout for horizontally constrained item lists.
//!
//! Given the measured widths of a row of items and the width available to
//! them, [`compute`] decides which trailing items hide behind a "+N" badge.
//! [`OverflowLayoutEngine`] wraps the pure function with the per-widget state
//! (hidden identities, badge flag) that callers read back.
//!
//! # Role in popkit
//! Pure computation. No clocks, no DOM: callers measure, this crate decides.

pub mod overflow;

pub use overflow::{
    DEFAULT_MIN_VISIBLE, MeasuredItem, OverflowLayout, OverflowLayoutEngine, OverflowState,
    compute, compute_measured,
};
pub use popkit_core::Measurement;
