// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_repaint --heading-base-level=0

//! Understory Repaint: damage tracking and repaint scheduling for surface trees.
//!
//! Given a tree of overlapping rectangular surfaces (a window and its nested
//! widgets), this crate works out which pixels of which surface must be
//! redrawn after a change, and hands each affected surface exactly one paint
//! request per frame.
//!
//! - Surfaces live in an [`Engine`] and are addressed by generational [`SurfaceId`] handles.
//! - Mutations (move, resize, show/hide, scroll, raise/lower, explicit invalidation)
//!   record damage as exact integer [`Region`]s.
//! - [`Engine::flush`] clips, propagates and occludes that damage, then dispatches it
//!   to [`PaintHandler`]s and returns it as a [`PaintBatch`].
//!
//! It does not rasterize anything. Drawing, compositing and presentation are
//! the caller's business; this crate only answers *what* to repaint and *when*.
//!
//! ## Damage model
//!
//! - Damage is always clipped to the surface's own rect and to every ancestor.
//! - Damage on a transparent surface also repaints whatever shows through it:
//!   the parent and any lower siblings underneath.
//! - Opaque surfaces ([`SurfaceFlags::OPAQUE`]) hide what lies beneath them, so
//!   ancestors and lower siblings never repaint under them.
//! - Hidden surfaces are never painted. Damage they receive is kept and
//!   delivered when they are shown again.
//!
//! Several operations narrow damage when retained pixels are known to be
//! valid: scrolling an opaque surface damages only the revealed strip, and
//! resizing a [`SurfaceFlags::STATIC_CONTENTS`] surface damages only the new
//! area. See [`RepaintOptions`] to tune these.
//!
//! ## Example
//!
//! ```rust
//! use understory_repaint::{Engine, PixelRect, Region};
//!
//! let mut engine = Engine::new();
//! let window = engine.create_surface(None).unwrap();
//! engine.set_bounds(window, PixelRect::from_size(200, 200)).unwrap();
//! engine.show(window).unwrap();
//!
//! let child = engine.create_surface(Some(window)).unwrap();
//! engine.set_bounds(child, PixelRect::from_origin_size(20, 20, 160, 160)).unwrap();
//! engine.set_opaque(child, true).unwrap();
//! engine.show(child).unwrap();
//!
//! // First exposure paints everything once.
//! let batch = engine.flush();
//! assert_eq!(batch.region(child), Region::from(PixelRect::from_size(160, 160)));
//!
//! // Scrolling an opaque child only repaints the strip that scrolled into view,
//! // and the window behind it is left alone.
//! engine.scroll_by(child, 10, 0).unwrap();
//! let batch = engine.flush();
//! assert_eq!(batch.region(child), Region::from(PixelRect::from_size(10, 160)));
//! assert!(batch.get(window).is_none());
//!
//! // Nothing changed since the last flush.
//! assert!(engine.flush().is_empty());
//! ```
//!
//! ## Paint handlers
//!
//! Handlers can be registered per surface with [`Engine::set_paint_handler`] and
//! for every surface with [`Engine::set_global_paint_handler`]. Any
//! `FnMut(SurfaceId, &Region)` closure works. Handlers are called in paint
//! order (parents before children, lower siblings before higher ones) with
//! regions in the surface's own coordinates.
//!
//! This crate is `no_std` and uses `alloc`. Diagnostics go through the
//! [`log`] facade.

#![no_std]

extern crate alloc;

mod engine;
mod error;
mod options;
mod paint;
mod propagate;
mod tracker;
mod tree;
mod types;

pub use engine::Engine;
pub use error::RepaintError;
pub use options::RepaintOptions;
pub use paint::{PaintBatch, PaintHandler};
pub use tracker::DamageTracker;
pub use types::{SurfaceFlags, SurfaceId};

pub use understory_region::{PixelRect, Region};
