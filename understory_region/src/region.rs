// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The [`Region`] type.

use alloc::vec::Vec;
use core::fmt;
use core::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, BitXor, BitXorAssign, Sub, SubAssign};

use smallvec::smallvec;

use crate::band::{self, Band, Op, Span};
use crate::rect::PixelRect;

/// A set of pixels described as a union of rectangles.
///
/// Regions are values: every operation returns a new region and leaves its
/// inputs untouched. Storage is canonical, so two regions compare equal exactly
/// when they cover the same pixels, whatever rectangles they were built from.
///
/// ```
/// use understory_region::{PixelRect, Region};
///
/// let left = Region::from(PixelRect::from_origin_size(0, 0, 10, 20));
/// let right = Region::from(PixelRect::from_origin_size(10, 0, 10, 20));
/// let whole = Region::from(PixelRect::from_origin_size(0, 0, 20, 20));
///
/// assert_eq!(left.union(&right), whole);
/// assert_eq!(whole.subtract(&left), right);
/// assert!(left.intersect(&right).is_empty());
/// ```
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Region {
    bands: Vec<Band>,
}

impl Region {
    /// Creates an empty region.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self { bands: Vec::new() }
    }

    /// Creates a region covering a single rectangle.
    ///
    /// An empty rectangle yields an empty region.
    #[must_use]
    pub fn from_rect(rect: PixelRect) -> Self {
        if rect.is_empty() {
            return Self::new();
        }
        let mut bands = Vec::with_capacity(1);
        bands.push(Band {
            y0: rect.y0,
            y1: rect.y1,
            spans: smallvec![Span {
                x0: rect.x0,
                x1: rect.x1,
            }],
        });
        Self { bands }
    }

    /// Creates a region covering the union of the given rectangles.
    #[must_use]
    pub fn from_rects<I>(rects: I) -> Self
    where
        I: IntoIterator<Item = PixelRect>,
    {
        rects.into_iter().collect()
    }

    /// Returns `true` if the region covers no pixels.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    /// Returns the pixels in `self` or `other`.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        if self.is_empty() {
            return other.clone();
        }
        if other.is_empty() {
            return self.clone();
        }
        self.combine(other, Op::Union)
    }

    /// Returns the pixels in both `self` and `other`.
    #[must_use]
    pub fn intersect(&self, other: &Self) -> Self {
        if !self.bounds().overlaps(&other.bounds()) {
            return Self::new();
        }
        self.combine(other, Op::Intersect)
    }

    /// Returns the pixels in `self` that are not in `other`.
    #[must_use]
    pub fn subtract(&self, other: &Self) -> Self {
        if !self.bounds().overlaps(&other.bounds()) {
            return self.clone();
        }
        self.combine(other, Op::Subtract)
    }

    /// Returns the pixels in exactly one of `self` and `other`.
    #[must_use]
    pub fn xor(&self, other: &Self) -> Self {
        self.combine(other, Op::Xor)
    }

    /// Intersects with a single rectangle.
    #[must_use]
    pub fn intersect_rect(&self, rect: PixelRect) -> Self {
        self.intersect(&Self::from_rect(rect))
    }

    /// Subtracts a single rectangle.
    #[must_use]
    pub fn subtract_rect(&self, rect: PixelRect) -> Self {
        self.subtract(&Self::from_rect(rect))
    }

    /// Returns the region shifted by `(dx, dy)`.
    ///
    /// Coordinates saturate at the `i32` limits; anything pushed entirely past
    /// a limit disappears.
    #[must_use]
    pub fn translated(&self, dx: i32, dy: i32) -> Self {
        if dx == 0 && dy == 0 {
            return self.clone();
        }
        let mut bands = Vec::with_capacity(self.bands.len());
        for b in &self.bands {
            let spans = b
                .spans
                .iter()
                .map(|s| Span {
                    x0: s.x0.saturating_add(dx),
                    x1: s.x1.saturating_add(dx),
                })
                .filter(|s| s.x0 < s.x1)
                .collect();
            band::push_band(
                &mut bands,
                b.y0.saturating_add(dy),
                b.y1.saturating_add(dy),
                spans,
            );
        }
        Self { bands }
    }

    /// Returns the smallest rectangle containing the region.
    ///
    /// Returns [`PixelRect::ZERO`] for an empty region.
    #[must_use]
    pub fn bounds(&self) -> PixelRect {
        let (Some(first), Some(last)) = (self.bands.first(), self.bands.last()) else {
            return PixelRect::ZERO;
        };
        let mut x0 = i32::MAX;
        let mut x1 = i32::MIN;
        for b in &self.bands {
            // Spans are sorted, so the extremes sit at the ends.
            if let (Some(s0), Some(s1)) = (b.spans.first(), b.spans.last()) {
                x0 = x0.min(s0.x0);
                x1 = x1.max(s1.x1);
            }
        }
        PixelRect::new(x0, first.y0, x1, last.y1)
    }

    /// Returns the bounds as a [`kurbo::Rect`], or `None` if the region is empty.
    #[must_use]
    pub fn bounding_box(&self) -> Option<kurbo::Rect> {
        (!self.is_empty()).then(|| self.bounds().to_kurbo())
    }

    /// Returns `true` if the pixel `(x, y)` is in the region.
    #[must_use]
    pub fn contains_point(&self, x: i32, y: i32) -> bool {
        self.bands
            .iter()
            .find(|b| y >= b.y0 && y < b.y1)
            .is_some_and(|b| b.spans.iter().any(|s| x >= s.x0 && x < s.x1))
    }

    /// Returns `true` if every pixel of `rect` is in the region.
    #[must_use]
    pub fn contains_rect(&self, rect: PixelRect) -> bool {
        Self::from_rect(rect).subtract(self).is_empty()
    }

    /// Returns `true` if `rect` shares at least one pixel with the region.
    #[must_use]
    pub fn intersects_rect(&self, rect: PixelRect) -> bool {
        !self.intersect_rect(rect).is_empty()
    }

    /// Number of pixels covered.
    #[must_use]
    pub fn area(&self) -> i64 {
        self.rects().map(|r| r.area()).sum()
    }

    /// Number of rectangles in the canonical decomposition.
    #[must_use]
    pub fn rect_count(&self) -> usize {
        self.bands.iter().map(|b| b.spans.len()).sum()
    }

    /// Iterates the canonical rectangles, top to bottom then left to right.
    ///
    /// The rectangles are disjoint and their union is exactly the region.
    pub fn rects(&self) -> impl Iterator<Item = PixelRect> + '_ {
        self.bands.iter().flat_map(|b| {
            b.spans
                .iter()
                .map(move |s| PixelRect::new(s.x0, b.y0, s.x1, b.y1))
        })
    }

    /// Adds a rectangle in place.
    pub fn add_rect(&mut self, rect: PixelRect) {
        if !rect.is_empty() {
            *self = self.union(&Self::from_rect(rect));
        }
    }

    /// Removes every pixel.
    pub fn clear(&mut self) {
        self.bands.clear();
    }

    fn combine(&self, other: &Self, op: Op) -> Self {
        Self {
            bands: band::combine(&self.bands, &other.bands, op),
        }
    }
}

impl From<PixelRect> for Region {
    fn from(rect: PixelRect) -> Self {
        Self::from_rect(rect)
    }
}

impl FromIterator<PixelRect> for Region {
    fn from_iter<I: IntoIterator<Item = PixelRect>>(iter: I) -> Self {
        let mut region = Self::new();
        region.extend(iter);
        region
    }
}

impl Extend<PixelRect> for Region {
    fn extend<I: IntoIterator<Item = PixelRect>>(&mut self, iter: I) {
        for rect in iter {
            self.add_rect(rect);
        }
    }
}

impl fmt::Debug for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Region")?;
        f.debug_list().entries(self.rects()).finish()
    }
}

macro_rules! region_op {
    ($tr:ident, $method:ident, $assign_tr:ident, $assign_method:ident, $op:ident) => {
        impl $tr for &Region {
            type Output = Region;

            fn $method(self, rhs: Self) -> Region {
                self.$op(rhs)
            }
        }

        impl $tr for Region {
            type Output = Self;

            fn $method(self, rhs: Self) -> Self {
                Self::$op(&self, &rhs)
            }
        }

        impl $assign_tr<&Self> for Region {
            fn $assign_method(&mut self, rhs: &Self) {
                *self = Self::$op(self, rhs);
            }
        }

        impl $assign_tr for Region {
            fn $assign_method(&mut self, rhs: Self) {
                *self = Self::$op(self, &rhs);
            }
        }
    };
}

region_op!(BitOr, bitor, BitOrAssign, bitor_assign, union);
region_op!(BitAnd, bitand, BitAndAssign, bitand_assign, intersect);
region_op!(Sub, sub, SubAssign, sub_assign, subtract);
region_op!(BitXor, bitxor, BitXorAssign, bitxor_assign, xor);
