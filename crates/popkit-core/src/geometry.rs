#![forbid(unsafe_code)]

//! Pixel geometry and box measurements.
//!
//! Values are CSS pixels as reported by the host layout engine. Fractional
//! widths are common (sub-pixel text layout), so everything is `f64`.

/// A rectangle in page coordinates (origin at top-left).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    /// Left edge (inclusive).
    pub x: f64,
    /// Top edge (inclusive).
    pub y: f64,
    /// Width in pixels.
    pub width: f64,
    /// Height in pixels.
    pub height: f64,
}

impl Rect {
    /// Create a new rectangle.
    #[inline]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a rectangle from origin with given size.
    #[inline]
    pub const fn from_size(width: f64, height: f64) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    /// Right edge (exclusive).
    #[inline]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge (exclusive).
    #[inline]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Check if the rectangle has zero (or negative) area.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Check if a point is inside the rectangle.
    #[inline]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }
}

/// Box measurements of a laid-out node.
///
/// Mirrors the DOM's `offsetWidth` / `scrollWidth` / `offsetHeight` triple:
/// `scroll_width` exceeds `offset_width` exactly when inline content
/// overflows the box horizontally.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Measurement {
    /// Rendered border-box width.
    pub offset_width: f64,
    /// Width of the content including any horizontally overflowing part.
    pub scroll_width: f64,
    /// Rendered border-box height.
    pub offset_height: f64,
}

impl Measurement {
    /// Measurement of a box whose content fits exactly.
    #[must_use]
    pub const fn fitted(width: f64, height: f64) -> Self {
        Self {
            offset_width: width,
            scroll_width: width,
            offset_height: height,
        }
    }

    /// Horizontal overflow in pixels (zero when the content fits).
    #[inline]
    pub fn horizontal_overflow(&self) -> f64 {
        (self.scroll_width - self.offset_width).max(0.0)
    }

    /// Whether content overflows the box horizontally.
    #[inline]
    pub fn overflows(&self) -> bool {
        self.scroll_width > self.offset_width
    }
}
