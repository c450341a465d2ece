// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_region --heading-base-level=0

//! Understory Region: exact integer pixel regions.
//!
//! A [`Region`] is a set of pixels on the integer grid, described as a union
//! of axis-aligned [`PixelRect`]s. It is the value type used for damage and
//! repaint bookkeeping in [`understory_repaint`], but has no dependency on any
//! tree or scene structure.
//!
//! - Set operations: [`Region::union`], [`Region::intersect`], [`Region::subtract`],
//!   [`Region::xor`], also available as `|`, `&`, `-` and `^`.
//! - [`Region::translated`] for moving between coordinate spaces.
//! - [`Region::rects`] yields a disjoint decomposition for consumers that
//!   need rectangles (scissor lists, damage hints to a compositor).
//!
//! ## Canonical storage
//!
//! Regions are stored as y-sorted bands of x-sorted spans, and every
//! operation normalizes its output. Two regions compare equal exactly when
//! they cover the same pixels, so tests can assert on `Region` values
//! directly:
//!
//! ```rust
//! use understory_region::{PixelRect, Region};
//!
//! let old = Region::from(PixelRect::from_origin_size(20, 20, 100, 100));
//! let new = Region::from(PixelRect::from_origin_size(20, 30, 100, 100));
//!
//! // Old and new position together form one taller rectangle.
//! assert_eq!(&old | &new, Region::from(PixelRect::from_origin_size(20, 20, 100, 110)));
//! // What the new position no longer covers.
//! assert_eq!(&old - &new, Region::from(PixelRect::from_origin_size(20, 20, 100, 10)));
//! ```
//!
//! ## Kurbo interop
//!
//! [`PixelRect::to_kurbo`] and [`PixelRect::from_kurbo_expand`] convert to and
//! from [`kurbo::Rect`]; the latter rounds outward so the pixel rectangle
//! covers every partially touched pixel.
//!
//! [`understory_repaint`]: https://docs.rs/understory_repaint
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod band;
mod rect;
mod region;

pub use rect::PixelRect;
pub use region::Region;
