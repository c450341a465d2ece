// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types for the surface tree: handles and per-surface flags.

use core::fmt;

/// Handle to a surface in an [`Engine`](crate::Engine).
///
/// A small copyable handle made of a slot index and a generation counter.
///
/// ## Semantics
///
/// - On creation, a fresh slot is allocated with generation `1`.
/// - On destruction, the slot is freed; any `SurfaceId` pointing at it is now stale.
/// - On reuse of a freed slot, its generation is incremented, producing a new, distinct `SurfaceId`.
///
/// Stale handles never alias a different live surface because the generation
/// must match. Every engine entry point rejects them with
/// [`RepaintError::InvalidSurface`](crate::RepaintError::InvalidSurface).
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct SurfaceId(pub(crate) u32, pub(crate) u32);

impl SurfaceId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }

    /// Returns the raw slot index (for diagnostics only).
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }

    /// Returns the generation counter.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.1
    }
}

impl fmt::Debug for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SurfaceId({}@gen{})", self.0, self.1)
    }
}

bitflags::bitflags! {
    /// Per-surface attribute flags.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct SurfaceFlags: u8 {
        /// The surface is shown. A surface is only painted when it and all of its
        /// ancestors carry this flag.
        const VISIBLE = 0b0000_0001;
        /// The surface paints every pixel of its bounds, so nothing beneath it
        /// shows through.
        const OPAQUE = 0b0000_0010;
        /// The surface keeps its pixels across a resize; only newly exposed
        /// area needs painting.
        const STATIC_CONTENTS = 0b0000_0100;
    }
}

impl Default for SurfaceFlags {
    /// New surfaces start hidden, possibly transparent, without static contents.
    fn default() -> Self {
        Self::empty()
    }
}
