// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Errors reported by engine entry points.

use core::fmt;

use crate::types::SurfaceId;

/// Error returned by fallible [`Engine`](crate::Engine) operations.
///
/// A failed call leaves the engine untouched: no state changes and no damage
/// is enqueued.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RepaintError {
    /// The handle refers to a destroyed surface, or was never issued by this engine.
    InvalidSurface(SurfaceId),
    /// The requested geometry has a negative width or height.
    InvalidGeometry {
        /// Requested width.
        width: i32,
        /// Requested height.
        height: i32,
    },
    /// Every surface handle the engine can issue is in use.
    CapacityExceeded,
}

impl fmt::Display for RepaintError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSurface(id) => write!(f, "surface {id:?} does not exist"),
            Self::InvalidGeometry { width, height } => {
                write!(f, "negative surface size {width}x{height}")
            }
            Self::CapacityExceeded => f.write_str("surface capacity exhausted"),
        }
    }
}

impl core::error::Error for RepaintError {}
