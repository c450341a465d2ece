// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Paint dispatch: handler hookup and the per-flush batch.

use alloc::vec::Vec;

use understory_region::Region;

use crate::types::SurfaceId;

/// Receives paint requests during [`Engine::flush`](crate::Engine::flush).
///
/// `region` is in the surface's own coordinate space, already clipped to its
/// bounds and with occluded parts removed. A handler is called at most once
/// per surface per flush.
///
/// Any `FnMut(SurfaceId, &Region)` closure is a handler:
///
/// ```
/// use understory_region::Region;
/// use understory_repaint::{PaintHandler, SurfaceId};
///
/// let mut painted = 0;
/// let mut handler = |_id: SurfaceId, region: &Region| painted += region.rect_count();
/// # let _ = &mut handler as &mut dyn PaintHandler;
/// ```
pub trait PaintHandler {
    /// Paints `region` of `surface`.
    fn paint(&mut self, surface: SurfaceId, region: &Region);
}

impl<F> PaintHandler for F
where
    F: FnMut(SurfaceId, &Region),
{
    fn paint(&mut self, surface: SurfaceId, region: &Region) {
        self(surface, region);
    }
}

/// Everything painted by one flush, in paint order.
///
/// Parents come before their children and lower siblings before higher ones,
/// matching the order handlers were invoked in. Each surface appears at most
/// once.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PaintBatch {
    entries: Vec<(SurfaceId, Region)>,
}

impl PaintBatch {
    /// Callers visit each surface once per flush.
    pub(crate) fn push(&mut self, surface: SurfaceId, region: Region) {
        self.entries.push((surface, region));
    }

    /// Returns `true` if nothing was painted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of surfaces painted.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Iterates `(surface, region)` pairs in paint order.
    pub fn iter(&self) -> impl Iterator<Item = (SurfaceId, &Region)> + '_ {
        self.entries.iter().map(|(id, r)| (*id, r))
    }

    /// Returns the region painted for `surface`, if it was painted.
    #[must_use]
    pub fn get(&self, surface: SurfaceId) -> Option<&Region> {
        self.entries
            .iter()
            .find_map(|(id, r)| (*id == surface).then_some(r))
    }

    /// Returns the region painted for `surface`, or an empty region.
    #[must_use]
    pub fn region(&self, surface: SurfaceId) -> Region {
        self.get(surface).cloned().unwrap_or_default()
    }

    /// Surfaces painted, in paint order.
    pub fn surfaces(&self) -> impl Iterator<Item = SurfaceId> + '_ {
        self.entries.iter().map(|(id, _)| *id)
    }
}

impl IntoIterator for PaintBatch {
    type Item = (SurfaceId, Region);
    type IntoIter = alloc::vec::IntoIter<(SurfaceId, Region)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
