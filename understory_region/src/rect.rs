// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Integer pixel rectangles.

use core::fmt;

/// An axis-aligned rectangle on the integer pixel grid.
///
/// The rectangle is half-open: it covers every pixel `(x, y)` with
/// `x0 <= x < x1` and `y0 <= y < y1`. A rectangle with `x0 >= x1` or
/// `y0 >= y1` covers no pixels and is considered empty; all empty rectangles
/// behave identically in set operations regardless of their coordinates.
///
/// ```
/// use understory_region::PixelRect;
///
/// let r = PixelRect::from_origin_size(20, 20, 100, 50);
/// assert_eq!((r.x1, r.y1), (120, 70));
/// assert_eq!(r.width(), 100);
/// assert!(PixelRect::new(5, 5, 5, 10).is_empty());
/// ```
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct PixelRect {
    /// Left edge (inclusive).
    pub x0: i32,
    /// Top edge (inclusive).
    pub y0: i32,
    /// Right edge (exclusive).
    pub x1: i32,
    /// Bottom edge (exclusive).
    pub y1: i32,
}

impl PixelRect {
    /// The empty rectangle at the origin.
    pub const ZERO: Self = Self::new(0, 0, 0, 0);

    /// Creates a rectangle from its edges.
    #[inline]
    #[must_use]
    pub const fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Creates a rectangle from an origin and a size.
    ///
    /// The far edges saturate at `i32::MAX`.
    #[inline]
    #[must_use]
    pub const fn from_origin_size(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x0: x,
            y0: y,
            x1: x.saturating_add(width),
            y1: y.saturating_add(height),
        }
    }

    /// Creates a rectangle at the origin with the given size.
    #[inline]
    #[must_use]
    pub const fn from_size(width: i32, height: i32) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Width in pixels; never negative.
    #[inline]
    #[must_use]
    pub const fn width(&self) -> i32 {
        if self.x1 > self.x0 {
            self.x1.saturating_sub(self.x0)
        } else {
            0
        }
    }

    /// Height in pixels; never negative.
    #[inline]
    #[must_use]
    pub const fn height(&self) -> i32 {
        if self.y1 > self.y0 {
            self.y1.saturating_sub(self.y0)
        } else {
            0
        }
    }

    /// Number of pixels covered.
    #[inline]
    #[must_use]
    pub const fn area(&self) -> i64 {
        self.width() as i64 * self.height() as i64
    }

    /// Returns `true` if the rectangle covers no pixels.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.x0 >= self.x1 || self.y0 >= self.y1
    }

    /// Returns the top-left corner as `(x, y)`.
    #[inline]
    #[must_use]
    pub const fn origin(&self) -> (i32, i32) {
        (self.x0, self.y0)
    }

    /// Returns the same-sized rectangle with its origin at `(0, 0)`.
    #[inline]
    #[must_use]
    pub const fn at_origin(&self) -> Self {
        Self::from_size(self.width(), self.height())
    }

    /// Returns the overlap of two rectangles.
    ///
    /// The result may be empty.
    #[must_use]
    pub fn intersect(&self, other: &Self) -> Self {
        Self {
            x0: self.x0.max(other.x0),
            y0: self.y0.max(other.y0),
            x1: self.x1.min(other.x1),
            y1: self.y1.min(other.y1),
        }
    }

    /// Returns the smallest rectangle containing both rectangles.
    ///
    /// Empty rectangles are ignored.
    #[must_use]
    pub fn union_bounds(&self, other: &Self) -> Self {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        Self {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    /// Returns `true` if the rectangles share at least one pixel.
    #[inline]
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        !self.intersect(other).is_empty()
    }

    /// Returns `true` if the pixel `(x, y)` lies inside the rectangle.
    #[inline]
    #[must_use]
    pub const fn contains_point(&self, x: i32, y: i32) -> bool {
        x >= self.x0 && x < self.x1 && y >= self.y0 && y < self.y1
    }

    /// Returns `true` if every pixel of `other` lies inside `self`.
    ///
    /// An empty `other` is contained in every rectangle.
    #[must_use]
    pub fn contains_rect(&self, other: &Self) -> bool {
        other.is_empty()
            || (other.x0 >= self.x0
                && other.y0 >= self.y0
                && other.x1 <= self.x1
                && other.y1 <= self.y1)
    }

    /// Returns the rectangle shifted by `(dx, dy)`, saturating at the `i32` limits.
    #[inline]
    #[must_use]
    pub const fn translated(&self, dx: i32, dy: i32) -> Self {
        Self {
            x0: self.x0.saturating_add(dx),
            y0: self.y0.saturating_add(dy),
            x1: self.x1.saturating_add(dx),
            y1: self.y1.saturating_add(dy),
        }
    }

    /// Converts to a floating-point [`kurbo::Rect`].
    #[must_use]
    pub fn to_kurbo(&self) -> kurbo::Rect {
        kurbo::Rect::new(
            f64::from(self.x0),
            f64::from(self.y0),
            f64::from(self.x1),
            f64::from(self.y1),
        )
    }

    /// Converts a [`kurbo::Rect`] to the smallest pixel rectangle covering it.
    ///
    /// Coordinates outside the `i32` range saturate; NaN maps to zero.
    #[must_use]
    pub fn from_kurbo_expand(rect: kurbo::Rect) -> Self {
        let r = rect.abs().expand();
        Self::new(
            saturate(r.x0),
            saturate(r.y0),
            saturate(r.x1),
            saturate(r.y1),
        )
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "float to int `as` casts saturate and the input is already integral"
)]
fn saturate(v: f64) -> i32 {
    v as i32
}

impl fmt::Debug for PixelRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PixelRect({}, {}, {}x{})",
            self.x0,
            self.y0,
            self.width(),
            self.height()
        )
    }
}

impl From<PixelRect> for kurbo::Rect {
    fn from(r: PixelRect) -> Self {
        r.to_kurbo()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_of_inverted_rect_is_zero() {
        let r = PixelRect::new(10, 10, 5, 20);
        assert!(r.is_empty());
        assert_eq!(r.width(), 0);
        assert_eq!(r.height(), 10);
        assert_eq!(r.area(), 0);
    }

    #[test]
    fn intersect_and_union_bounds() {
        let a = PixelRect::from_origin_size(0, 0, 10, 10);
        let b = PixelRect::from_origin_size(5, 5, 10, 10);
        assert_eq!(a.intersect(&b), PixelRect::new(5, 5, 10, 10));
        assert_eq!(a.union_bounds(&b), PixelRect::new(0, 0, 15, 15));
        assert_eq!(a.union_bounds(&PixelRect::ZERO), a);
        assert!(!a.overlaps(&PixelRect::from_origin_size(10, 0, 5, 5)));
    }

    #[test]
    fn contains_edges_are_half_open() {
        let r = PixelRect::from_origin_size(0, 0, 4, 4);
        assert!(r.contains_point(0, 0));
        assert!(r.contains_point(3, 3));
        assert!(!r.contains_point(4, 0));
        assert!(r.contains_rect(&PixelRect::new(1, 1, 4, 4)));
        assert!(!r.contains_rect(&PixelRect::new(1, 1, 5, 4)));
        assert!(r.contains_rect(&PixelRect::new(100, 100, 100, 100)));
    }

    #[test]
    fn translation_saturates() {
        let r = PixelRect::new(0, 0, 10, 10).translated(i32::MAX, 0);
        assert_eq!(r.x1, i32::MAX);
        assert!(r.is_empty());
    }

    #[test]
    fn kurbo_round_trip_expands_fractional_edges() {
        let r = PixelRect::from_kurbo_expand(kurbo::Rect::new(0.5, 1.2, 9.1, 9.0));
        assert_eq!(r, PixelRect::new(0, 1, 10, 9));
        let k = PixelRect::new(1, 2, 3, 4).to_kurbo();
        assert_eq!(k, kurbo::Rect::new(1.0, 2.0, 3.0, 4.0));
    }
}
