// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Damage tracker: pending damage per surface.

use alloc::vec::Vec;

use hashbrown::HashMap;
use understory_region::Region;

use crate::types::SurfaceId;

/// Accumulated pending damage, one [`Region`] per surface.
///
/// Regions are unioned on enqueue, so repeated invalidation of the same area
/// never leads to repeated painting. [`take_all`](Self::take_all) hands out
/// every entry and empties the table in one step, so no damage is visible to
/// two consecutive takes.
///
/// Regions are expressed in each surface's own coordinate space.
#[derive(Clone, Debug, Default)]
pub struct DamageTracker {
    pending: HashMap<SurfaceId, Region>,
    /// Incremented on every mutation.
    generation: u64,
}

impl DamageTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current generation.
    ///
    /// The generation is incremented on every mutation (enqueue, discard,
    /// take). Compare two observations to detect whether anything changed in
    /// between.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Unions `region` into the pending damage of `surface`.
    ///
    /// Empty regions are ignored. Returns `true` if the pending damage grew.
    pub fn enqueue(&mut self, surface: SurfaceId, region: &Region) -> bool {
        if region.is_empty() {
            return false;
        }
        self.generation = self.generation.wrapping_add(1);
        let entry = self.pending.entry(surface).or_default();
        let merged = entry.union(region);
        let grew = merged != *entry;
        *entry = merged;
        grew
    }

    /// Returns the pending damage of `surface`, if any.
    #[must_use]
    pub fn pending(&self, surface: SurfaceId) -> Option<&Region> {
        self.pending.get(&surface)
    }

    /// Removes and returns the pending damage of `surface`.
    pub fn discard(&mut self, surface: SurfaceId) -> Option<Region> {
        let removed = self.pending.remove(&surface);
        if removed.is_some() {
            self.generation = self.generation.wrapping_add(1);
        }
        removed
    }

    /// Returns `true` if no surface has pending damage.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Number of surfaces with pending damage.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Iterates the surfaces with pending damage, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (SurfaceId, &Region)> + '_ {
        self.pending.iter().map(|(id, r)| (*id, r))
    }

    /// Takes every pending entry and leaves the tracker empty.
    pub fn take_all(&mut self) -> Vec<(SurfaceId, Region)> {
        self.generation = self.generation.wrapping_add(1);
        self.pending.drain().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use understory_region::PixelRect;

    fn r(x: i32, y: i32, w: i32, h: i32) -> Region {
        Region::from(PixelRect::from_origin_size(x, y, w, h))
    }

    #[test]
    fn enqueue_coalesces_overlaps() {
        let mut tracker = DamageTracker::new();
        let id = SurfaceId::new(0, 1);
        assert!(tracker.enqueue(id, &r(0, 0, 10, 10)));
        assert!(!tracker.enqueue(id, &r(2, 2, 5, 5)));
        assert!(tracker.enqueue(id, &r(10, 0, 10, 10)));
        assert_eq!(tracker.pending(id), Some(&r(0, 0, 20, 10)));
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn empty_region_is_ignored() {
        let mut tracker = DamageTracker::new();
        let before = tracker.generation();
        assert!(!tracker.enqueue(SurfaceId::new(0, 1), &Region::new()));
        assert!(tracker.is_empty());
        assert_eq!(tracker.generation(), before);
    }

    #[test]
    fn take_all_clears_as_a_unit() {
        let mut tracker = DamageTracker::new();
        tracker.enqueue(SurfaceId::new(0, 1), &r(0, 0, 1, 1));
        tracker.enqueue(SurfaceId::new(1, 1), &r(0, 0, 1, 1));
        let taken = tracker.take_all();
        assert_eq!(taken.len(), 2);
        assert!(tracker.is_empty());
        assert!(tracker.take_all().is_empty());
    }

    #[test]
    fn discard_drops_one_surface() {
        let mut tracker = DamageTracker::new();
        let a = SurfaceId::new(0, 1);
        let b = SurfaceId::new(1, 1);
        tracker.enqueue(a, &r(0, 0, 1, 1));
        tracker.enqueue(b, &r(0, 0, 1, 1));
        let g = tracker.generation();
        assert_eq!(tracker.discard(a), Some(r(0, 0, 1, 1)));
        assert_eq!(tracker.discard(a), None);
        assert_eq!(tracker.generation(), g + 1);
        assert_eq!(tracker.iter().map(|(id, _)| id).collect::<Vec<_>>(), [b]);
    }
}
