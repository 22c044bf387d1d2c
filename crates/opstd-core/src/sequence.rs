//! # Sequence Numbers
//!
//! The registry has no wall clock. Every record is stamped with the
//! [`BlockHeight`] the host reports for the call that produced it. Heights
//! are totally ordered and the host guarantees they never move backwards.

use serde::{Deserialize, Serialize};

/// A host-supplied, monotonically non-decreasing logical timestamp.
///
/// Serializes as a bare integer.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct BlockHeight(u64);

impl BlockHeight {
    /// Height zero, before any block has been produced.
    pub const GENESIS: Self = Self(0);

    /// Wrap a raw height.
    pub const fn new(height: u64) -> Self {
        Self(height)
    }

    /// The raw height value.
    pub const fn get(self) -> u64 {
        self.0
    }

    /// The height `blocks` later, or `None` on overflow.
    pub fn checked_add(self, blocks: u64) -> Option<Self> {
        self.0.checked_add(blocks).map(Self)
    }
}

impl From<u64> for BlockHeight {
    fn from(height: u64) -> Self {
        Self(height)
    }
}

impl std::fmt::Display for BlockHeight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
