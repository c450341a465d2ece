// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Engine configuration.

/// Tunables for an [`Engine`](crate::Engine).
///
/// The defaults describe the guaranteed contract: every optimization below
/// narrows damage only where retained pixels are known to be valid, and
/// falls back to full repaint otherwise.
///
/// ```
/// use understory_repaint::{Engine, RepaintOptions};
///
/// let engine = Engine::with_options(RepaintOptions {
///     retain_moved_opaque_contents: true,
///     ..RepaintOptions::default()
/// });
/// assert!(engine.options().retain_moved_opaque_contents);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RepaintOptions {
    /// Move an opaque surface's existing pixels with it instead of repainting it.
    ///
    /// When set, moving an opaque surface that no sibling overlaps damages
    /// only the area it uncovers in its parent; the surface itself is not
    /// painted. When unset (the default), a moved surface always repaints its
    /// full rect.
    pub retain_moved_opaque_contents: bool,
    /// Shift retained content on scroll of an effectively opaque surface.
    ///
    /// When set (the default), scrolling an opaque surface that no sibling
    /// overlaps damages only the revealed strip. When unset, every scroll is
    /// a full repaint.
    pub retain_scrolled_contents: bool,
    /// Honor [`SurfaceFlags::STATIC_CONTENTS`](crate::SurfaceFlags::STATIC_CONTENTS) on resize.
    ///
    /// When set (the default), growing a static-contents surface damages only
    /// the newly exposed area. When unset, resizes always repaint fully.
    pub honor_static_contents: bool,
    /// Treat surfaces without a parent as opaque.
    ///
    /// A root has nothing behind it, so it can always retain scrolled content.
    /// Defaults to `true`.
    pub roots_are_opaque: bool,
}

impl Default for RepaintOptions {
    fn default() -> Self {
        Self {
            retain_moved_opaque_contents: false,
            retain_scrolled_contents: true,
            honor_static_contents: true,
            roots_are_opaque: true,
        }
    }
}
