// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Arena-backed surface tree: allocation, topology, stacking, and coordinate mapping.

use alloc::vec::Vec;

use smallvec::SmallVec;
use understory_region::{PixelRect, Region};

use crate::types::{SurfaceFlags, SurfaceId};

pub(crate) type Children = SmallVec<[SurfaceId; 4]>;

/// One surface's state.
#[derive(Clone, Debug)]
pub(crate) struct Node {
    pub(crate) parent: Option<SurfaceId>,
    /// Bottom-most first; later entries are stacked above earlier ones.
    pub(crate) children: Children,
    /// Position and size in the parent's coordinate space.
    pub(crate) bounds: PixelRect,
    pub(crate) flags: SurfaceFlags,
    /// Damage accumulated while the surface could not be painted, in own coordinates.
    pub(crate) deferred: Region,
}

impl Node {
    fn new(parent: Option<SurfaceId>) -> Self {
        Self {
            parent,
            children: Children::new(),
            bounds: PixelRect::ZERO,
            flags: SurfaceFlags::default(),
            deferred: Region::new(),
        }
    }

    /// The surface's own rect, `(0, 0, width, height)`.
    #[inline]
    pub(crate) fn rect(&self) -> PixelRect {
        self.bounds.at_origin()
    }

    #[inline]
    pub(crate) fn is_visible(&self) -> bool {
        self.flags.contains(SurfaceFlags::VISIBLE)
    }

    #[inline]
    pub(crate) fn is_opaque(&self) -> bool {
        self.flags.contains(SurfaceFlags::OPAQUE)
    }
}

/// Slot storage for surfaces with generational handles.
#[derive(Clone, Debug, Default)]
pub(crate) struct SurfaceTree {
    nodes: Vec<Option<Node>>,
    generations: Vec<u32>,
    free_list: Vec<usize>,
    /// Top-level surfaces in creation order.
    roots: Vec<SurfaceId>,
}

impl SurfaceTree {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Allocates a surface stacked above its existing siblings.
    ///
    /// `parent` must be alive. Returns `None` once every slot index a
    /// [`SurfaceId`] can address is taken.
    pub(crate) fn insert(&mut self, parent: Option<SurfaceId>) -> Option<SurfaceId> {
        let id = if let Some(idx) = self.free_list.pop() {
            // Freed slots were issued before, so their index fits.
            let slot = slot_index(idx)?;
            self.generations[idx] = self.generations[idx].wrapping_add(1);
            self.nodes[idx] = Some(Node::new(parent));
            SurfaceId::new(slot, self.generations[idx])
        } else {
            let idx = self.nodes.len();
            let slot = slot_index(idx)?;
            self.nodes.push(Some(Node::new(parent)));
            self.generations.push(1);
            SurfaceId::new(slot, 1)
        };
        match parent.and_then(|p| self.get_mut(p)) {
            Some(p) => p.children.push(id),
            None => self.roots.push(id),
        }
        Some(id)
    }

    /// Removes a surface and its whole subtree, returning every removed handle.
    pub(crate) fn remove_subtree(&mut self, id: SurfaceId) -> Vec<SurfaceId> {
        let mut removed = Vec::new();
        let Some(parent) = self.get(id).map(|n| n.parent) else {
            return removed;
        };
        match parent {
            Some(p) => {
                if let Some(parent) = self.get_mut(p) {
                    parent.children.retain(|c| *c != id);
                }
            }
            None => self.roots.retain(|r| *r != id),
        }
        let mut stack = alloc::vec![id];
        while let Some(cur) = stack.pop() {
            if let Some(node) = self.nodes.get_mut(cur.idx()).and_then(Option::take) {
                stack.extend(node.children.iter().copied());
                self.free_list.push(cur.idx());
                removed.push(cur);
            }
        }
        removed
    }

    #[inline]
    pub(crate) fn is_alive(&self, id: SurfaceId) -> bool {
        self.get(id).is_some()
    }

    pub(crate) fn get(&self, id: SurfaceId) -> Option<&Node> {
        if self.generations.get(id.idx()).copied() != Some(id.generation()) {
            return None;
        }
        self.nodes.get(id.idx())?.as_ref()
    }

    pub(crate) fn get_mut(&mut self, id: SurfaceId) -> Option<&mut Node> {
        if self.generations.get(id.idx()).copied() != Some(id.generation()) {
            return None;
        }
        self.nodes.get_mut(id.idx())?.as_mut()
    }

    pub(crate) fn roots(&self) -> &[SurfaceId] {
        &self.roots
    }

    /// Siblings of `id` in stacking order, including `id` itself.
    pub(crate) fn siblings(&self, id: SurfaceId) -> &[SurfaceId] {
        match self.get(id).and_then(|n| n.parent) {
            Some(p) => self.get(p).map_or(&[][..], |n| n.children.as_slice()),
            None => self.roots.as_slice(),
        }
    }

    /// Iterates `id`'s ancestors, nearest first.
    pub(crate) fn ancestors(&self, id: SurfaceId) -> impl Iterator<Item = SurfaceId> + '_ {
        let mut cur = self.get(id).and_then(|n| n.parent);
        core::iter::from_fn(move || {
            let here = cur?;
            cur = self.get(here).and_then(|n| n.parent);
            Some(here)
        })
    }

    /// Returns the top-level ancestor of `id` (or `id` itself for a root).
    pub(crate) fn root_of(&self, id: SurfaceId) -> SurfaceId {
        self.ancestors(id).last().unwrap_or(id)
    }

    /// Returns `true` if `id` and all its ancestors are visible.
    pub(crate) fn is_effectively_visible(&self, id: SurfaceId) -> bool {
        self.get(id).is_some_and(Node::is_visible)
            && self
                .ancestors(id)
                .all(|a| self.get(a).is_some_and(Node::is_visible))
    }

    /// Offset from `id`'s own coordinates to its root's coordinates.
    ///
    /// A root's own origin is its root space origin, so roots map to `(0, 0)`.
    pub(crate) fn offset_to_root(&self, id: SurfaceId) -> (i32, i32) {
        let mut off = (0_i32, 0_i32);
        let mut cur = id;
        while let Some(node) = self.get(cur) {
            let Some(parent) = node.parent else {
                break;
            };
            off.0 = off.0.saturating_add(node.bounds.x0);
            off.1 = off.1.saturating_add(node.bounds.y0);
            cur = parent;
        }
        off
    }

    /// The part of `id`'s rect not clipped away by any ancestor, in root coordinates.
    pub(crate) fn clip_in_root(&self, id: SurfaceId) -> PixelRect {
        let Some(node) = self.get(id) else {
            return PixelRect::ZERO;
        };
        let (dx, dy) = self.offset_to_root(id);
        let mut clip = node.rect().translated(dx, dy);
        for a in self.ancestors(id) {
            let Some(anc) = self.get(a) else { break };
            let (ax, ay) = self.offset_to_root(a);
            clip = clip.intersect(&anc.rect().translated(ax, ay));
        }
        clip
    }

    /// Visible surfaces under `root` (inclusive) in paint order.
    ///
    /// Hidden surfaces and their subtrees are skipped.
    pub(crate) fn paint_order(&self, root: SurfaceId) -> Vec<SurfaceId> {
        let mut out = Vec::new();
        let mut stack = alloc::vec![root];
        while let Some(id) = stack.pop() {
            let Some(node) = self.get(id) else { continue };
            if !node.is_visible() {
                continue;
            }
            out.push(id);
            // Reverse so the bottom-most child is popped (and painted) first.
            stack.extend(node.children.iter().rev().copied());
        }
        out
    }

    /// Moves `id` to the top (`raise = true`) or bottom of its siblings.
    ///
    /// Returns the siblings it passed over, i.e. those that swapped stacking
    /// order with `id`.
    pub(crate) fn restack(&mut self, id: SurfaceId, raise: bool) -> Children {
        let parent = self.get(id).and_then(|n| n.parent);
        let list = match parent {
            Some(p) => match self.get_mut(p) {
                Some(n) => &mut n.children,
                None => return Children::new(),
            },
            None => {
                // Roots are separate windows; only their order changes.
                let Some(pos) = self.roots.iter().position(|r| *r == id) else {
                    return Children::new();
                };
                let r = self.roots.remove(pos);
                if raise {
                    self.roots.push(r);
                } else {
                    self.roots.insert(0, r);
                }
                return Children::new();
            }
        };
        let Some(pos) = list.iter().position(|c| *c == id) else {
            return Children::new();
        };
        let passed: Children = if raise {
            list[pos + 1..].iter().copied().collect()
        } else {
            list[..pos].iter().copied().collect()
        };
        list.remove(pos);
        if raise {
            list.push(id);
        } else {
            list.insert(0, id);
        }
        passed
    }
}

fn slot_index(idx: usize) -> Option<u32> {
    u32::try_from(idx).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn show(tree: &mut SurfaceTree, id: SurfaceId, bounds: PixelRect) {
        let node = tree.get_mut(id).unwrap();
        node.bounds = bounds;
        node.flags |= SurfaceFlags::VISIBLE;
    }

    #[test]
    fn stale_handles_are_rejected_after_reuse() {
        let mut tree = SurfaceTree::new();
        let a = tree.insert(None).unwrap();
        tree.remove_subtree(a);
        assert!(!tree.is_alive(a));
        let b = tree.insert(None).unwrap();
        assert_eq!(a.index(), b.index());
        assert_ne!(a, b);
        assert!(tree.get(a).is_none());
        assert!(tree.is_alive(b));
    }

    #[test]
    fn remove_subtree_detaches_and_frees_descendants() {
        let mut tree = SurfaceTree::new();
        let root = tree.insert(None).unwrap();
        let child = tree.insert(Some(root)).unwrap();
        let grandchild = tree.insert(Some(child)).unwrap();
        let other = tree.insert(Some(root)).unwrap();
        let removed = tree.remove_subtree(child);
        assert_eq!(removed.len(), 2);
        assert!(!tree.is_alive(grandchild));
        assert_eq!(tree.siblings(other), &[other]);
        assert_eq!(tree.roots(), &[root]);
    }

    #[test]
    fn offsets_and_clips_accumulate_through_ancestors() {
        let mut tree = SurfaceTree::new();
        let root = tree.insert(None).unwrap();
        let child = tree.insert(Some(root)).unwrap();
        let grandchild = tree.insert(Some(child)).unwrap();
        show(&mut tree, root, PixelRect::from_origin_size(500, 500, 200, 200));
        show(&mut tree, child, PixelRect::from_origin_size(20, 20, 100, 100));
        show(&mut tree, grandchild, PixelRect::from_origin_size(90, 5, 50, 50));

        assert_eq!(tree.offset_to_root(root), (0, 0));
        assert_eq!(tree.offset_to_root(grandchild), (110, 25));
        assert_eq!(tree.root_of(grandchild), root);
        // The grandchild sticks out of its parent on the right.
        assert_eq!(tree.clip_in_root(grandchild), PixelRect::new(110, 25, 120, 75));
    }

    #[test]
    fn visibility_requires_every_ancestor() {
        let mut tree = SurfaceTree::new();
        let root = tree.insert(None).unwrap();
        let child = tree.insert(Some(root)).unwrap();
        show(&mut tree, child, PixelRect::from_size(10, 10));
        assert!(!tree.is_effectively_visible(child));
        show(&mut tree, root, PixelRect::from_size(10, 10));
        assert!(tree.is_effectively_visible(child));
        assert_eq!(tree.paint_order(root), [root, child]);
    }

    #[test]
    fn paint_order_is_preorder_bottom_first() {
        let mut tree = SurfaceTree::new();
        let root = tree.insert(None).unwrap();
        let a = tree.insert(Some(root)).unwrap();
        let a1 = tree.insert(Some(a)).unwrap();
        let b = tree.insert(Some(root)).unwrap();
        for id in [root, a, a1, b] {
            show(&mut tree, id, PixelRect::from_size(10, 10));
        }
        assert_eq!(tree.paint_order(root), [root, a, a1, b]);
    }

    #[test]
    fn restack_reports_passed_siblings() {
        let mut tree = SurfaceTree::new();
        let root = tree.insert(None).unwrap();
        let a = tree.insert(Some(root)).unwrap();
        let b = tree.insert(Some(root)).unwrap();
        let c = tree.insert(Some(root)).unwrap();
        assert_eq!(tree.restack(a, true).as_slice(), &[b, c]);
        assert_eq!(tree.siblings(a), &[b, c, a]);
        assert_eq!(tree.restack(a, false).as_slice(), &[b, c]);
        assert_eq!(tree.siblings(a), &[a, b, c]);
        assert!(tree.restack(a, false).is_empty());
    }

    #[test]
    fn slot_index_stops_at_u32_range() {
        assert_eq!(slot_index(0), Some(0));
        assert_eq!(slot_index(u32::MAX as usize), Some(u32::MAX));
        #[cfg(target_pointer_width = "64")]
        assert_eq!(slot_index(1_usize << 32), None);
    }
}
