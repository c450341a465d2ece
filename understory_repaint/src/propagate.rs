// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Propagation and clipping: turns pending damage into per-surface paint regions.
//!
//! Resolution works in the coordinate space of each root surface:
//!
//! 1. Pending damage is clipped to its surface's rect and to every ancestor's
//!    rect, then mapped into root space. The union over a root is its *exposed*
//!    region: the pixels whose composited result may have changed.
//! 2. Every visible surface under the root is painted where the exposed region
//!    meets its *visible* region: its rect clipped by its ancestors, minus what
//!    opaque surfaces stacked above it cover, minus what its own opaque
//!    descendants cover.
//!
//! Damage on a transparent surface therefore reaches the ancestors and lower
//! siblings that show through it, while damage on an opaque surface stays
//! with that surface (and with anything stacked above it, which is painted
//! after it and must be redrawn on top).

use alloc::vec::Vec;

use understory_region::{PixelRect, Region};

use crate::paint::PaintBatch;
use crate::tree::SurfaceTree;
use crate::types::SurfaceId;

/// The outcome of resolving one flush.
#[derive(Debug, Default)]
pub(crate) struct Resolution {
    pub(crate) batch: PaintBatch,
    /// Damage on surfaces that cannot be painted right now, in own coordinates.
    pub(crate) deferred: Vec<(SurfaceId, Region)>,
}

/// Resolves taken pending damage against the current tree.
pub(crate) fn resolve(tree: &SurfaceTree, pending: Vec<(SurfaceId, Region)>) -> Resolution {
    let mut out = Resolution::default();
    let mut exposed: Vec<(SurfaceId, Region)> = Vec::new();

    for (id, damage) in pending {
        let Some(node) = tree.get(id) else {
            log::trace!("dropping damage for destroyed surface {id:?}");
            continue;
        };
        let damage = damage.intersect_rect(node.rect());
        if damage.is_empty() {
            continue;
        }
        if !tree.is_effectively_visible(id) {
            out.deferred.push((id, damage));
            continue;
        }
        let (dx, dy) = tree.offset_to_root(id);
        let in_root = damage
            .translated(dx, dy)
            .intersect_rect(tree.clip_in_root(id));
        if in_root.is_empty() {
            continue;
        }
        let root = tree.root_of(id);
        match exposed.iter_mut().find(|(r, _)| *r == root) {
            Some((_, region)) => *region |= &in_root,
            None => exposed.push((root, in_root)),
        }
    }

    // Walk roots in tree order so the batch order is deterministic.
    for &root in tree.roots() {
        let Some((_, world)) = exposed.iter().find(|(r, _)| *r == root) else {
            continue;
        };
        let mut stack = alloc::vec![root];
        while let Some(id) = stack.pop() {
            let Some(node) = tree.get(id) else { continue };
            if !node.is_visible() {
                continue;
            }
            // Descendants are clipped to this surface, so a miss prunes the subtree.
            let clip = tree.clip_in_root(id);
            if !world.intersects_rect(clip) {
                continue;
            }
            let paint = unoccluded(tree, id, world.intersect_rect(clip));
            if !paint.is_empty() {
                let (dx, dy) = tree.offset_to_root(id);
                out.batch.push(id, paint.translated(-dx, -dy));
            }
            // Reverse so the bottom-most child is painted first.
            stack.extend(node.children.iter().rev().copied());
        }
    }
    out
}

/// The pixels of `id` that end up on screen, in root coordinates.
///
/// Assumes `id` is effectively visible.
pub(crate) fn visible_region(tree: &SurfaceTree, id: SurfaceId) -> Region {
    unoccluded(tree, id, Region::from(tree.clip_in_root(id)))
}

/// Removes from `area` (root coordinates, within `id`'s clip) everything that
/// opaque surfaces paint over `id`.
fn unoccluded(tree: &SurfaceTree, id: SurfaceId, mut area: Region) -> Region {
    // Opaque content stacked above `id` at its own level and at every ancestor level.
    let mut level = id;
    while let Some(parent) = tree.get(level).and_then(|n| n.parent) {
        let siblings = tree.siblings(level);
        if let Some(pos) = siblings.iter().position(|s| *s == level) {
            for &above in &siblings[pos + 1..] {
                if area.is_empty() {
                    return area;
                }
                area = area.subtract(&opaque_cover(tree, above, area.bounds()));
            }
        }
        level = parent;
    }
    // Opaque descendants paint over `id`.
    if let Some(node) = tree.get(id) {
        for &child in &node.children {
            if area.is_empty() {
                break;
            }
            area = area.subtract(&opaque_cover(tree, child, area.bounds()));
        }
    }
    area
}

/// Root-space pixels fully painted by opaque surfaces in the visible subtree
/// of `id`, limited to subtrees that reach into `within`.
pub(crate) fn opaque_cover(tree: &SurfaceTree, id: SurfaceId, within: PixelRect) -> Region {
    let Some(node) = tree.get(id) else {
        return Region::new();
    };
    if !node.is_visible() {
        return Region::new();
    }
    let clip = tree.clip_in_root(id);
    if !clip.overlaps(&within) {
        return Region::new();
    }
    if node.is_opaque() {
        // Descendants are clipped to this rect, so they cannot add to it.
        return Region::from(clip);
    }
    let mut cover = Region::new();
    for &child in &node.children {
        cover |= opaque_cover(tree, child, within);
    }
    cover
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SurfaceFlags;
    use alloc::vec;

    fn r(x: i32, y: i32, w: i32, h: i32) -> Region {
        Region::from(PixelRect::from_origin_size(x, y, w, h))
    }

    fn add(
        tree: &mut SurfaceTree,
        parent: Option<SurfaceId>,
        bounds: PixelRect,
        opaque: bool,
    ) -> SurfaceId {
        let id = tree.insert(parent).unwrap();
        let node = tree.get_mut(id).unwrap();
        node.bounds = bounds;
        node.flags = SurfaceFlags::VISIBLE;
        node.flags.set(SurfaceFlags::OPAQUE, opaque);
        id
    }

    #[test]
    fn opaque_sibling_above_occludes() {
        let mut tree = SurfaceTree::new();
        let root = add(&mut tree, None, PixelRect::from_size(200, 200), false);
        let low = add(&mut tree, Some(root), PixelRect::from_origin_size(0, 0, 100, 100), false);
        let high = add(&mut tree, Some(root), PixelRect::from_origin_size(50, 0, 100, 100), true);

        assert_eq!(visible_region(&tree, low), r(0, 0, 50, 100));
        assert_eq!(visible_region(&tree, high), r(50, 0, 100, 100));
        assert_eq!(
            visible_region(&tree, root),
            r(0, 0, 200, 200) - r(50, 0, 100, 100)
        );
    }

    #[test]
    fn opaque_grandchild_of_transparent_sibling_occludes() {
        let mut tree = SurfaceTree::new();
        let root = add(&mut tree, None, PixelRect::from_size(200, 200), false);
        let low = add(&mut tree, Some(root), PixelRect::from_size(100, 100), false);
        let high = add(&mut tree, Some(root), PixelRect::from_origin_size(40, 40, 100, 100), false);
        // Sticks out of `high`; only the clipped part covers anything.
        add(&mut tree, Some(high), PixelRect::from_origin_size(-20, -20, 40, 40), true);

        assert_eq!(visible_region(&tree, low), r(0, 0, 100, 100) - r(40, 40, 20, 20));
    }

    #[test]
    fn hidden_subtree_does_not_cover() {
        let mut tree = SurfaceTree::new();
        let root = add(&mut tree, None, PixelRect::from_size(100, 100), false);
        let child = add(&mut tree, Some(root), PixelRect::from_size(100, 100), true);
        tree.get_mut(child).unwrap().flags.remove(SurfaceFlags::VISIBLE);
        assert_eq!(visible_region(&tree, root), r(0, 0, 100, 100));
    }

    #[test]
    fn transparent_damage_reaches_parent_and_lower_sibling() {
        let mut tree = SurfaceTree::new();
        let root = add(&mut tree, None, PixelRect::from_size(200, 200), false);
        let low = add(&mut tree, Some(root), PixelRect::from_origin_size(0, 0, 100, 100), false);
        let high = add(&mut tree, Some(root), PixelRect::from_origin_size(50, 50, 100, 100), false);

        let res = resolve(&tree, vec![(high, r(0, 0, 100, 100))]);
        assert_eq!(res.batch.region(root), r(50, 50, 100, 100));
        assert_eq!(res.batch.region(low), r(50, 50, 50, 50));
        assert_eq!(res.batch.region(high), r(0, 0, 100, 100));
        assert_eq!(res.batch.surfaces().collect::<Vec<_>>(), [root, low, high]);
    }

    #[test]
    fn opaque_damage_stays_local() {
        let mut tree = SurfaceTree::new();
        let root = add(&mut tree, None, PixelRect::from_size(200, 200), false);
        let child = add(&mut tree, Some(root), PixelRect::from_origin_size(20, 20, 100, 100), true);

        let res = resolve(&tree, vec![(child, r(0, 0, 10, 100))]);
        assert_eq!(res.batch.len(), 1);
        assert_eq!(res.batch.region(child), r(0, 0, 10, 100));
        assert!(res.batch.get(root).is_none());
    }

    #[test]
    fn damage_outside_bounds_is_discarded() {
        let mut tree = SurfaceTree::new();
        let root = add(&mut tree, None, PixelRect::from_size(50, 50), false);
        let res = resolve(&tree, vec![(root, r(40, 40, 100, 100))]);
        assert_eq!(res.batch.region(root), r(40, 40, 10, 10));
    }

    #[test]
    fn hidden_damage_is_deferred() {
        let mut tree = SurfaceTree::new();
        let root = add(&mut tree, None, PixelRect::from_size(50, 50), false);
        let child = add(&mut tree, Some(root), PixelRect::from_size(10, 10), false);
        tree.get_mut(root).unwrap().flags.remove(SurfaceFlags::VISIBLE);

        let res = resolve(&tree, vec![(child, r(0, 0, 5, 5))]);
        assert!(res.batch.is_empty());
        assert_eq!(res.deferred, [(child, r(0, 0, 5, 5))]);
    }
}
