#![forbid(unsafe_code)]

//! Greedy "+N" overflow computation.
//!
//! Items hide strictly from the end of the row backward, accumulating their
//! widths, until the accumulated hidden width exceeds the overflow amount.
//! The badge is laid out in flow after the last visible item, so the space it
//! reserves counts both toward the content width and against the available
//! width.
//!
//! # Usage
//!
//! ```
//! use popkit_layout::compute;
//!
//! let layout = compute(300.0, &[80.0, 80.0, 80.0, 80.0], 30.0, 1);
//! assert_eq!(layout.hidden_indices, vec![2, 3]);
//! assert!(layout.show_badge);
//! ```
//!
//! # Invariants
//!
//! 1. Indices below `min_visible` (and always index 0) are never hidden.
//! 2. Hidden indices form a contiguous suffix, reported in ascending order.
//! 3. A row that fits hides nothing, regardless of prior results.
//! 4. The badge shows only when something is hidden and the row has more
//!    than one item.
//! 5. Results depend only on the inputs; recomputation is idempotent.
//!
//! # Failure Modes
//!
//! None. Negative and NaN widths count as zero.

use popkit_core::Measurement;

/// Leading items that always stay visible unless a caller asks for more.
pub const DEFAULT_MIN_VISIBLE: usize = 1;

/// Result of one overflow pass.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct OverflowLayout {
    /// Indices of hidden items, ascending.
    pub hidden_indices: Vec<usize>,
    /// `hidden_indices.len()`.
    pub hidden_count: usize,
    /// Whether the "+N" badge should render.
    pub show_badge: bool,
}

impl OverflowLayout {
    /// Nothing hidden.
    #[must_use]
    pub fn fits() -> Self {
        Self::default()
    }

    /// Whether `index` is hidden.
    #[must_use]
    pub fn is_hidden(&self, index: usize) -> bool {
        self.hidden_indices.binary_search(&index).is_ok()
    }
}

#[inline]
fn sanitize(width: f64) -> f64 {
    if width.is_nan() { 0.0 } else { width.max(0.0) }
}

/// Compute hidden items from an abstract container width.
///
/// `reserved_width` is the badge's footprint. Nothing overflows when
/// `container_width >= sum(child_widths) + reserved_width`.
#[must_use]
pub fn compute(
    container_width: f64,
    child_widths: &[f64],
    reserved_width: f64,
    min_visible: usize,
) -> OverflowLayout {
    let container = sanitize(container_width);
    let reserved = sanitize(reserved_width);
    let content: f64 = child_widths.iter().copied().map(sanitize).sum::<f64>() + reserved;
    if container >= content {
        return OverflowLayout::fits();
    }
    let overflow = content - (container - reserved);
    hide_from_end(child_widths, overflow, min_visible)
}

/// Compute hidden items from live box measurements.
///
/// The overflow amount is `scroll_width - offset_width + reserved_width`.
/// A box whose content does not scroll hides nothing.
#[must_use]
pub fn compute_measured(
    offset_width: f64,
    scroll_width: f64,
    child_widths: &[f64],
    reserved_width: f64,
    min_visible: usize,
) -> OverflowLayout {
    let offset = sanitize(offset_width);
    let scroll = sanitize(scroll_width);
    if scroll <= offset {
        return OverflowLayout::fits();
    }
    let overflow = scroll - offset + sanitize(reserved_width);
    hide_from_end(child_widths, overflow, min_visible)
}

fn hide_from_end(child_widths: &[f64], overflow: f64, min_visible: usize) -> OverflowLayout {
    let floor = min_visible.max(DEFAULT_MIN_VISIBLE);
    let mut hidden = Vec::new();
    let mut accumulated = 0.0;
    for index in (floor..child_widths.len()).rev() {
        if accumulated > overflow {
            break;
        }
        accumulated += sanitize(child_widths[index]);
        hidden.push(index);
    }
    hidden.reverse();
    let hidden_count = hidden.len();
    OverflowLayout {
        hidden_indices: hidden,
        hidden_count,
        show_badge: hidden_count > 0 && child_widths.len() > 1,
    }
}

// ---------------------------------------------------------------------------
// Stateful engine
// ---------------------------------------------------------------------------

/// An item with a caller-chosen identity and its measured width.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasuredItem<K> {
    pub id: K,
    pub width: f64,
}

impl<K> MeasuredItem<K> {
    pub fn new(id: K, width: f64) -> Self {
        Self { id, width }
    }
}

/// Overflow state held between passes.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct OverflowState<K> {
    pub hidden_indices: Vec<usize>,
    pub hidden_ids: Vec<K>,
    pub hidden_count: usize,
    pub show_badge: bool,
    /// Container width used by the last pass.
    pub available_width: f64,
}

impl<K> Default for OverflowState<K> {
    fn default() -> Self {
        Self {
            hidden_indices: Vec::new(),
            hidden_ids: Vec::new(),
            hidden_count: 0,
            show_badge: false,
            available_width: 0.0,
        }
    }
}

/// Keeps the overflow state of one item row.
///
/// Every `recompute` replaces the state wholesale; nothing from an earlier
/// narrower layout survives a wider one.
#[derive(Debug, Clone)]
pub struct OverflowLayoutEngine<K> {
    reserved_width: f64,
    min_visible: usize,
    state: OverflowState<K>,
    passes: u64,
}

impl<K: Clone> OverflowLayoutEngine<K> {
    /// Engine reserving `reserved_width` for the badge.
    #[must_use]
    pub fn new(reserved_width: f64) -> Self {
        Self {
            reserved_width: sanitize(reserved_width),
            min_visible: DEFAULT_MIN_VISIBLE,
            state: OverflowState::default(),
            passes: 0,
        }
    }

    /// Keep the first `min_visible` items visible (at least one).
    #[must_use]
    pub fn with_min_visible(mut self, min_visible: usize) -> Self {
        self.min_visible = min_visible.max(DEFAULT_MIN_VISIBLE);
        self
    }

    pub fn set_reserved_width(&mut self, reserved_width: f64) {
        self.reserved_width = sanitize(reserved_width);
    }

    #[must_use]
    pub fn reserved_width(&self) -> f64 {
        self.reserved_width
    }

    #[must_use]
    pub fn min_visible(&self) -> usize {
        self.min_visible
    }

    /// Recompute against an abstract container width.
    pub fn recompute(&mut self, container_width: f64, items: &[MeasuredItem<K>]) -> &OverflowState<K> {
        let widths: Vec<f64> = items.iter().map(|item| item.width).collect();
        let layout = compute(container_width, &widths, self.reserved_width, self.min_visible);
        self.apply(layout, items, container_width)
    }

    /// Recompute against the container's live measurement.
    pub fn recompute_measured(
        &mut self,
        container: Measurement,
        items: &[MeasuredItem<K>],
    ) -> &OverflowState<K> {
        let widths: Vec<f64> = items.iter().map(|item| item.width).collect();
        let layout = compute_measured(
            container.offset_width,
            container.scroll_width,
            &widths,
            self.reserved_width,
            self.min_visible,
        );
        self.apply(layout, items, container.offset_width)
    }

    fn apply(
        &mut self,
        layout: OverflowLayout,
        items: &[MeasuredItem<K>],
        available_width: f64,
    ) -> &OverflowState<K> {
        let hidden_ids = layout
            .hidden_indices
            .iter()
            .map(|&i| items[i].id.clone())
            .collect();
        self.state = OverflowState {
            hidden_ids,
            hidden_count: layout.hidden_count,
            show_badge: layout.show_badge,
            hidden_indices: layout.hidden_indices,
            available_width: sanitize(available_width),
        };
        self.passes += 1;
        &self.state
    }

    /// Drop all overflow state. Used when the row switches to editing and
    /// every item must show.
    pub fn reset(&mut self) {
        self.state = OverflowState::default();
    }

    #[must_use]
    pub fn state(&self) -> &OverflowState<K> {
        &self.state
    }

    #[must_use]
    pub fn hidden_ids(&self) -> &[K] {
        &self.state.hidden_ids
    }

    #[must_use]
    pub fn hidden_count(&self) -> usize {
        self.state.hidden_count
    }

    #[must_use]
    pub fn show_badge(&self) -> bool {
        self.state.show_badge
    }

    /// Number of recompute passes run so far.
    #[must_use]
    pub fn passes(&self) -> u64 {
        self.passes
    }
}
