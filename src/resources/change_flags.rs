use std::sync::atomic::{AtomicU32, Ordering};

use bitflags::bitflags;

bitflags! {
    /// "Changed since last sync" bits of a skinned mesh renderer.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct SkinChanges: u32 {
        /// Mesh binding replaced.
        const MESH                 = 1 << 0;
        /// Bone list or root bone edited.
        const BONES                = 1 << 1;
        const BLEND_SHAPE_WEIGHTS  = 1 << 2;
        const PROXY_SOURCE         = 1 << 3;
        const EXPLICIT_BOUNDS      = 1 << 4;
    }
}

/// Dirty-flag cell shared between producer-side writers.
///
/// Marking and taking are single atomic read-modify-write operations, so a
/// bit set after [`take`](Self::take) has read it stays set for the next take.
#[derive(Debug, Default)]
pub struct ChangeFlags {
    bits: AtomicU32,
}

impl ChangeFlags {
    #[must_use]
    pub fn new(initial: SkinChanges) -> Self {
        Self { bits: AtomicU32::new(initial.bits()) }
    }

    /// Sets `changes`.
    pub fn mark(&self, changes: SkinChanges) {
        self.bits.fetch_or(changes.bits(), Ordering::AcqRel);
    }

    /// Clears the `consulted` bits and returns which of them were set.
    pub fn take(&self, consulted: SkinChanges) -> SkinChanges {
        let prev = self.bits.fetch_and(!consulted.bits(), Ordering::AcqRel);
        SkinChanges::from_bits_truncate(prev) & consulted
    }

    /// Current bits without consuming them.
    #[must_use]
    pub fn peek(&self) -> SkinChanges {
        SkinChanges::from_bits_truncate(self.bits.load(Ordering::Acquire))
    }
}
