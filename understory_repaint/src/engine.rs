// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The engine facade: surface lifecycle, mutation handlers, and flush.

use alloc::boxed::Box;
use core::fmt;

use hashbrown::HashMap;
use kurbo::{Point, Vec2};
use understory_region::{PixelRect, Region};

use crate::error::RepaintError;
use crate::options::RepaintOptions;
use crate::paint::{PaintBatch, PaintHandler};
use crate::propagate::{self, Resolution};
use crate::tracker::DamageTracker;
use crate::tree::{Node, SurfaceTree};
use crate::types::{SurfaceFlags, SurfaceId};

/// Owns a surface tree and decides what needs repainting after each change.
///
/// Mutations update the tree and record damage; nothing is painted until
/// [`flush`](Self::flush), which resolves all damage recorded since the
/// previous flush and dispatches one paint per affected surface.
///
/// All entry points taking a [`SurfaceId`] fail with
/// [`RepaintError::InvalidSurface`] for stale handles and leave the engine
/// unchanged when they fail.
pub struct Engine {
    tree: SurfaceTree,
    tracker: DamageTracker,
    options: RepaintOptions,
    handlers: HashMap<SurfaceId, Box<dyn PaintHandler>>,
    global_handler: Option<Box<dyn PaintHandler>>,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("tree", &self.tree)
            .field("tracker", &self.tracker)
            .field("options", &self.options)
            .field("handlers", &self.handlers.len())
            .field("global_handler", &self.global_handler.is_some())
            .finish()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Creates an empty engine with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(RepaintOptions::default())
    }

    /// Creates an empty engine with the given options.
    #[must_use]
    pub fn with_options(options: RepaintOptions) -> Self {
        Self {
            tree: SurfaceTree::new(),
            tracker: DamageTracker::new(),
            options,
            handlers: HashMap::new(),
            global_handler: None,
        }
    }

    /// Returns the active options.
    #[must_use]
    pub fn options(&self) -> &RepaintOptions {
        &self.options
    }

    /// Replaces the options. Takes effect for subsequent mutations.
    pub fn set_options(&mut self, options: RepaintOptions) {
        self.options = options;
    }

    /// Pending damage that has not been flushed yet.
    #[must_use]
    pub fn tracker(&self) -> &DamageTracker {
        &self.tracker
    }

    fn node(&self, id: SurfaceId) -> Result<&Node, RepaintError> {
        self.tree.get(id).ok_or(RepaintError::InvalidSurface(id))
    }

    fn node_mut(&mut self, id: SurfaceId) -> Result<&mut Node, RepaintError> {
        self.tree.get_mut(id).ok_or(RepaintError::InvalidSurface(id))
    }

    // --- lifecycle ---

    /// Creates a surface under `parent`, or a new root when `parent` is `None`.
    ///
    /// The surface starts hidden, with empty bounds and no damage, stacked
    /// above its existing siblings.
    pub fn create_surface(&mut self, parent: Option<SurfaceId>) -> Result<SurfaceId, RepaintError> {
        if let Some(p) = parent {
            self.node(p)?;
        }
        let id = self
            .tree
            .insert(parent)
            .ok_or(RepaintError::CapacityExceeded)?;
        log::trace!("create {id:?} under {parent:?}");
        Ok(id)
    }

    /// Destroys `id` and its whole subtree.
    ///
    /// If the surface was on screen, the area it covered is damaged on its
    /// parent. Pending damage and paint handlers of every removed surface are
    /// dropped, and their handles become stale.
    pub fn destroy_surface(&mut self, id: SurfaceId) -> Result<(), RepaintError> {
        let node = self.node(id)?;
        let (parent, bounds) = (node.parent, node.bounds);
        if let Some(parent) = parent
            && self.tree.is_effectively_visible(id)
        {
            self.tracker.enqueue(parent, &Region::from(bounds));
        }
        let removed = self.tree.remove_subtree(id);
        for gone in &removed {
            self.tracker.discard(*gone);
            self.handlers.remove(gone);
        }
        log::trace!("destroy {id:?} ({} surfaces removed)", removed.len());
        Ok(())
    }

    /// Returns `true` if `id` refers to a live surface.
    #[must_use]
    pub fn is_alive(&self, id: SurfaceId) -> bool {
        self.tree.is_alive(id)
    }

    // --- geometry ---

    /// Sets position and size of `id` in its parent's coordinate space.
    ///
    /// The parent is damaged where the surface used to be and where it is
    /// now. The surface itself is damaged in full, except for these cases:
    ///
    /// - A resize of a surface with [`SurfaceFlags::STATIC_CONTENTS`] damages
    ///   only the newly exposed area, and only the area that changed coverage
    ///   on the parent.
    /// - A pure move of an opaque surface that no sibling overlaps, with
    ///   [`RepaintOptions::retain_moved_opaque_contents`] set, damages only the
    ///   part of the parent it uncovered and the part of itself that was
    ///   clipped away before the move.
    ///
    /// Rects with `x1 < x0` or `y1 < y0` are rejected with
    /// [`RepaintError::InvalidGeometry`].
    pub fn set_bounds(&mut self, id: SurfaceId, bounds: PixelRect) -> Result<(), RepaintError> {
        if bounds.x1 < bounds.x0 || bounds.y1 < bounds.y0 {
            return Err(RepaintError::InvalidGeometry {
                width: bounds.x1.saturating_sub(bounds.x0),
                height: bounds.y1.saturating_sub(bounds.y0),
            });
        }
        let node = self.node(id)?;
        let old = node.bounds;
        if old == bounds {
            return Ok(());
        }
        let parent = node.parent;
        let flags = node.flags;
        let was_overlapped = self.is_overlapped(id);
        let was_on_screen = self.on_screen(id);
        self.node_mut(id)?.bounds = bounds;
        log::trace!("set_bounds {id:?}: {old:?} -> {bounds:?}");

        if !self.tree.is_effectively_visible(id) {
            return Ok(());
        }

        let moved = old.origin() != bounds.origin();
        let resized = old.width() != bounds.width() || old.height() != bounds.height();
        let keeps_pixels =
            self.options.honor_static_contents && flags.contains(SurfaceFlags::STATIC_CONTENTS);
        let retain_move = moved
            && !resized
            && self.options.retain_moved_opaque_contents
            && flags.contains(SurfaceFlags::OPAQUE)
            && !was_overlapped
            && !self.is_overlapped(id);

        let Some(parent) = parent else {
            // A root's contents do not move within its own space.
            if resized {
                let own = if keeps_pixels {
                    Region::from(bounds.at_origin()).subtract_rect(old.at_origin())
                } else {
                    Region::from(bounds.at_origin())
                };
                self.tracker.enqueue(id, &own);
            }
            return Ok(());
        };

        let old_region = Region::from(old);
        let new_region = Region::from(bounds);
        let parent_damage = if retain_move {
            old_region - new_region
        } else if !moved && keeps_pixels {
            old_region ^ new_region
        } else {
            old_region | new_region
        };
        self.tracker.enqueue(parent, &parent_damage);

        let own = if retain_move {
            // Only pixels that were on screen moved along with the surface.
            Region::from(bounds.at_origin()) - was_on_screen
        } else if !moved && keeps_pixels {
            Region::from(bounds.at_origin()).subtract_rect(old.at_origin())
        } else {
            Region::from(bounds.at_origin())
        };
        self.tracker.enqueue(id, &own);
        Ok(())
    }

    /// Moves `id` so its top-left corner is at `(x, y)` in parent space.
    pub fn move_to(&mut self, id: SurfaceId, x: i32, y: i32) -> Result<(), RepaintError> {
        let b = self.node(id)?.bounds;
        self.set_bounds(id, PixelRect::from_origin_size(x, y, b.width(), b.height()))
    }

    /// Resizes `id`, keeping its top-left corner in place.
    pub fn resize(&mut self, id: SurfaceId, width: i32, height: i32) -> Result<(), RepaintError> {
        if width < 0 || height < 0 {
            return Err(RepaintError::InvalidGeometry { width, height });
        }
        let b = self.node(id)?.bounds;
        self.set_bounds(id, PixelRect::from_origin_size(b.x0, b.y0, width, height))
    }

    /// Scrolls the contents of `id` by `(dx, dy)`.
    ///
    /// Children move with the content. An effectively opaque surface that no
    /// sibling overlaps keeps its shifted pixels: pending damage shifts along
    /// and everything not covered by the shifted on-screen pixels is damaged.
    /// Any other surface is damaged in full.
    pub fn scroll_by(&mut self, id: SurfaceId, dx: i32, dy: i32) -> Result<(), RepaintError> {
        let node = self.node(id)?;
        if dx == 0 && dy == 0 {
            return Ok(());
        }
        let rect = node.rect();
        let effectively_opaque =
            node.is_opaque() || (node.parent.is_none() && self.options.roots_are_opaque);
        let children = node.children.clone();
        let was_on_screen = self.on_screen(id);
        for child in children {
            if let Some(c) = self.tree.get_mut(child) {
                c.bounds = c.bounds.translated(dx, dy);
            }
        }
        log::trace!("scroll {id:?} by ({dx}, {dy})");

        if !self.tree.is_effectively_visible(id) {
            return Ok(());
        }
        if self.options.retain_scrolled_contents && effectively_opaque && !self.is_overlapped(id) {
            let shifted = self
                .tracker
                .discard(id)
                .map(|pending| pending.translated(dx, dy).intersect_rect(rect))
                .unwrap_or_default();
            let revealed = Region::from(rect) - was_on_screen.translated(dx, dy);
            self.tracker.enqueue(id, &(shifted | revealed));
        } else {
            self.tracker.enqueue(id, &Region::from(rect));
        }
        Ok(())
    }

    /// The part of `id` its ancestors leave on screen, in its own coordinates.
    fn on_screen(&self, id: SurfaceId) -> Region {
        let (dx, dy) = self.tree.offset_to_root(id);
        Region::from(self.tree.clip_in_root(id).translated(-dx, -dy))
    }

    /// Returns `true` if a visible sibling stacked above `id`, at its own level
    /// or any ancestor level, intersects it on screen.
    fn is_overlapped(&self, id: SurfaceId) -> bool {
        let clip = self.tree.clip_in_root(id);
        if clip.is_empty() {
            return false;
        }
        let mut level = id;
        while let Some(parent) = self.tree.get(level).and_then(|n| n.parent) {
            let siblings = self.tree.siblings(level);
            if let Some(pos) = siblings.iter().position(|s| *s == level) {
                let hit = siblings[pos + 1..].iter().any(|s| {
                    self.tree.get(*s).is_some_and(Node::is_visible)
                        && self.tree.clip_in_root(*s).overlaps(&clip)
                });
                if hit {
                    return true;
                }
            }
            level = parent;
        }
        false
    }

    // --- visibility and attributes ---

    /// Shows or hides `id`.
    pub fn set_visible(&mut self, id: SurfaceId, visible: bool) -> Result<(), RepaintError> {
        if visible { self.show(id) } else { self.hide(id) }
    }

    /// Shows `id`. No-op if it is already visible.
    ///
    /// If that puts it on screen, its full rect is damaged together with any
    /// damage deferred while it and its descendants were hidden.
    pub fn show(&mut self, id: SurfaceId) -> Result<(), RepaintError> {
        let node = self.node_mut(id)?;
        if node.is_visible() {
            return Ok(());
        }
        node.flags.insert(SurfaceFlags::VISIBLE);
        log::trace!("show {id:?}");
        if !self.tree.is_effectively_visible(id) {
            return Ok(());
        }
        for surface in self.tree.paint_order(id) {
            let Some(node) = self.tree.get_mut(surface) else {
                continue;
            };
            let mut damage = core::mem::take(&mut node.deferred);
            if surface == id {
                damage.add_rect(node.rect());
            }
            self.tracker.enqueue(surface, &damage);
        }
        Ok(())
    }

    /// Hides `id`. No-op if it is already hidden.
    ///
    /// If it was on screen, the area it covered is damaged on its parent, and
    /// its own pending damage is kept until it is shown again.
    pub fn hide(&mut self, id: SurfaceId) -> Result<(), RepaintError> {
        let node = self.node(id)?;
        if !node.is_visible() {
            return Ok(());
        }
        let (parent, bounds) = (node.parent, node.bounds);
        if let Some(parent) = parent
            && self.tree.is_effectively_visible(id)
        {
            self.tracker.enqueue(parent, &Region::from(bounds));
        }
        let pending = self.tracker.discard(id);
        let node = self.node_mut(id)?;
        if let Some(pending) = pending {
            node.deferred |= pending;
        }
        node.flags.remove(SurfaceFlags::VISIBLE);
        log::trace!("hide {id:?}");
        Ok(())
    }

    /// Marks `id` as painting every pixel of its bounds. Records no damage.
    pub fn set_opaque(&mut self, id: SurfaceId, opaque: bool) -> Result<(), RepaintError> {
        self.node_mut(id)?.flags.set(SurfaceFlags::OPAQUE, opaque);
        Ok(())
    }

    /// Marks `id` as keeping its pixels across resizes. Records no damage.
    pub fn set_static_contents(&mut self, id: SurfaceId, on: bool) -> Result<(), RepaintError> {
        self.node_mut(id)?
            .flags
            .set(SurfaceFlags::STATIC_CONTENTS, on);
        Ok(())
    }

    // --- stacking ---

    /// Stacks `id` above all its siblings.
    ///
    /// The parts of `id` that were covered by the siblings it passed are
    /// damaged on `id`.
    pub fn raise(&mut self, id: SurfaceId) -> Result<(), RepaintError> {
        let bounds = self.node(id)?.bounds;
        let passed = self.tree.restack(id, true);
        log::trace!("raise {id:?} over {} siblings", passed.len());
        if !self.tree.is_effectively_visible(id) {
            return Ok(());
        }
        let mut uncovered = Region::new();
        for sibling in passed {
            if let Some(s) = self.tree.get(sibling).filter(|s| s.is_visible()) {
                uncovered.add_rect(s.bounds.intersect(&bounds));
            }
        }
        let uncovered = uncovered.translated(-bounds.x0, -bounds.y0);
        self.tracker.enqueue(id, &uncovered);
        Ok(())
    }

    /// Stacks `id` below all its siblings.
    ///
    /// Each sibling it passed is damaged where it overlaps `id`.
    pub fn lower(&mut self, id: SurfaceId) -> Result<(), RepaintError> {
        let bounds = self.node(id)?.bounds;
        let passed = self.tree.restack(id, false);
        log::trace!("lower {id:?} under {} siblings", passed.len());
        if !self.tree.is_effectively_visible(id) {
            return Ok(());
        }
        for sibling in passed {
            let Some(s) = self.tree.get(sibling).filter(|s| s.is_visible()) else {
                continue;
            };
            let overlap = s.bounds.intersect(&bounds);
            if overlap.is_empty() {
                continue;
            }
            let damage = Region::from(overlap.translated(-s.bounds.x0, -s.bounds.y0));
            self.tracker.enqueue(sibling, &damage);
        }
        Ok(())
    }

    // --- invalidation ---

    /// Requests a repaint of `region` (own coordinates) of `id`.
    ///
    /// The region is clipped to the surface's rect. If the surface is not on
    /// screen the damage is kept until it is shown.
    pub fn invalidate_region(&mut self, id: SurfaceId, region: &Region) -> Result<(), RepaintError> {
        let node = self.node(id)?;
        let clipped = region.intersect_rect(node.rect());
        if clipped.is_empty() {
            return Ok(());
        }
        if self.tree.is_effectively_visible(id) {
            self.tracker.enqueue(id, &clipped);
        } else {
            self.node_mut(id)?.deferred |= clipped;
        }
        Ok(())
    }

    /// Requests a repaint of the whole of `id`.
    pub fn invalidate_all(&mut self, id: SurfaceId) -> Result<(), RepaintError> {
        let rect = self.node(id)?.rect();
        self.invalidate_region(id, &Region::from(rect))
    }

    /// Requests a repaint of a fractional rect, rounded out to whole pixels.
    pub fn invalidate_kurbo(&mut self, id: SurfaceId, rect: kurbo::Rect) -> Result<(), RepaintError> {
        self.invalidate_region(id, &Region::from(PixelRect::from_kurbo_expand(rect)))
    }

    /// Invalidates `region` of `id` and flushes immediately.
    pub fn repaint(&mut self, id: SurfaceId, region: &Region) -> Result<PaintBatch, RepaintError> {
        self.invalidate_region(id, region)?;
        Ok(self.flush())
    }

    // --- dispatch ---

    /// Registers the paint handler for `id`, replacing any previous one.
    ///
    /// The handler is dropped when the surface is destroyed.
    pub fn set_paint_handler(
        &mut self,
        id: SurfaceId,
        handler: impl PaintHandler + 'static,
    ) -> Result<(), RepaintError> {
        self.node(id)?;
        self.handlers.insert(id, Box::new(handler));
        Ok(())
    }

    /// Removes the paint handler for `id`. Returns `true` if one was set.
    pub fn clear_paint_handler(&mut self, id: SurfaceId) -> Result<bool, RepaintError> {
        self.node(id)?;
        Ok(self.handlers.remove(&id).is_some())
    }

    /// Registers a handler called for every painted surface, after that
    /// surface's own handler.
    pub fn set_global_paint_handler(&mut self, handler: impl PaintHandler + 'static) {
        self.global_handler = Some(Box::new(handler));
    }

    /// Removes the engine-wide paint handler.
    pub fn clear_global_paint_handler(&mut self) {
        self.global_handler = None;
    }

    /// Resolves all damage recorded since the last flush and dispatches it.
    ///
    /// Every affected surface is painted exactly once, in paint order, with a
    /// region in its own coordinates. Pending damage is cleared as a unit, so
    /// a second flush with no mutations in between returns an empty batch.
    pub fn flush(&mut self) -> PaintBatch {
        if self.tracker.is_empty() {
            return PaintBatch::default();
        }
        let pending = self.tracker.take_all();
        let Resolution { batch, deferred } = propagate::resolve(&self.tree, pending);
        for (id, region) in deferred {
            if let Some(node) = self.tree.get_mut(id) {
                node.deferred |= region;
            }
        }
        for (id, region) in batch.iter() {
            if let Some(handler) = self.handlers.get_mut(&id) {
                handler.paint(id, region);
            }
            if let Some(handler) = self.global_handler.as_mut() {
                handler.paint(id, region);
            }
        }
        log::debug!("flush: painted {} surfaces", batch.len());
        batch
    }

    // --- queries ---

    /// Top-level surfaces, in creation order.
    #[must_use]
    pub fn roots(&self) -> &[SurfaceId] {
        self.tree.roots()
    }

    /// Position and size of `id` in its parent's coordinate space.
    pub fn bounds(&self, id: SurfaceId) -> Result<PixelRect, RepaintError> {
        Ok(self.node(id)?.bounds)
    }

    /// Same as [`bounds`](Self::bounds).
    pub fn geometry(&self, id: SurfaceId) -> Result<PixelRect, RepaintError> {
        self.bounds(id)
    }

    /// The surface's own rect, `(0, 0, width, height)`.
    pub fn rect(&self, id: SurfaceId) -> Result<PixelRect, RepaintError> {
        Ok(self.node(id)?.rect())
    }

    /// All flags of `id`.
    pub fn flags(&self, id: SurfaceId) -> Result<SurfaceFlags, RepaintError> {
        Ok(self.node(id)?.flags)
    }

    /// Whether `id` itself is marked visible.
    pub fn is_visible(&self, id: SurfaceId) -> Result<bool, RepaintError> {
        Ok(self.node(id)?.is_visible())
    }

    /// Whether `id` and all its ancestors are visible.
    pub fn is_effectively_visible(&self, id: SurfaceId) -> Result<bool, RepaintError> {
        self.node(id)?;
        Ok(self.tree.is_effectively_visible(id))
    }

    /// Whether `id` is marked opaque.
    pub fn is_opaque(&self, id: SurfaceId) -> Result<bool, RepaintError> {
        Ok(self.node(id)?.is_opaque())
    }

    /// Whether `id` is marked as having static contents.
    pub fn has_static_contents(&self, id: SurfaceId) -> Result<bool, RepaintError> {
        Ok(self.node(id)?.flags.contains(SurfaceFlags::STATIC_CONTENTS))
    }

    /// Parent of `id`, or `None` for a root.
    pub fn parent(&self, id: SurfaceId) -> Result<Option<SurfaceId>, RepaintError> {
        Ok(self.node(id)?.parent)
    }

    /// Children of `id`, bottom-most first.
    pub fn children(&self, id: SurfaceId) -> Result<&[SurfaceId], RepaintError> {
        Ok(self.node(id)?.children.as_slice())
    }

    /// Damage recorded on `id` and not yet flushed, in own coordinates.
    ///
    /// Damage kept while the surface is hidden is not included.
    pub fn pending_damage(&self, id: SurfaceId) -> Result<Region, RepaintError> {
        self.node(id)?;
        Ok(self.tracker.pending(id).cloned().unwrap_or_default())
    }

    /// Returns `true` if any surface has damage awaiting a flush.
    #[must_use]
    pub fn has_pending_damage(&self) -> bool {
        !self.tracker.is_empty()
    }

    /// The part of `id` that ends up on screen, in own coordinates.
    ///
    /// Empty when the surface is not effectively visible.
    pub fn visible_region(&self, id: SurfaceId) -> Result<Region, RepaintError> {
        self.node(id)?;
        if !self.tree.is_effectively_visible(id) {
            return Ok(Region::new());
        }
        let (dx, dy) = self.tree.offset_to_root(id);
        Ok(propagate::visible_region(&self.tree, id).translated(-dx, -dy))
    }

    /// Maps a point from `id`'s coordinates to its parent's.
    pub fn map_to_parent(&self, id: SurfaceId, point: Point) -> Result<Point, RepaintError> {
        Ok(point + self.origin_offset(id)?)
    }

    /// Maps a point from the parent's coordinates to `id`'s.
    pub fn map_from_parent(&self, id: SurfaceId, point: Point) -> Result<Point, RepaintError> {
        Ok(point - self.origin_offset(id)?)
    }

    /// `id`'s rect in its root's coordinate space, before ancestor clipping.
    pub fn rect_in_root(&self, id: SurfaceId) -> Result<kurbo::Rect, RepaintError> {
        let rect = self.node(id)?.rect();
        let (dx, dy) = self.tree.offset_to_root(id);
        Ok(rect.translated(dx, dy).to_kurbo())
    }

    fn origin_offset(&self, id: SurfaceId) -> Result<Vec2, RepaintError> {
        let (x, y) = self.node(id)?.bounds.origin();
        Ok(Vec2::new(f64::from(x), f64::from(y)))
    }
}
