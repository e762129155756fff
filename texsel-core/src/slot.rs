//! Texture slot indices.
//!
//! A slot is a position in the bound texture array. Fragments address
//! slots through a raw `u32` id; only ids below the configured capacity
//! resolve to a slot, everything else means "no source".

use std::fmt;

use thiserror::Error;

/// Number of texture slots when no capacity is configured.
pub const DEFAULT_CAPACITY: u32 = 32;

/// Upper bound for a configured capacity.
///
/// The case-dispatch variant emits one branch per slot, so the capacity
/// also bounds the size of the generated shader.
pub const MAX_CAPACITY: u32 = 256;

/// Reserved id for fragments with no associated graphic.
pub const NO_TEXTURE: u32 = u32::MAX;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotError {
    #[error("Slot {slot} is outside the texture array (capacity {capacity})")]
    OutOfRange { slot: u32, capacity: u32 },
}

/// A validated position in a texture array.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotIndex(u32);

impl SlotIndex {
    /// Address slot `slot` of an array with `capacity` entries.
    pub fn new(slot: u32, capacity: u32) -> Result<Self, SlotError> {
        Self::resolve(slot, capacity).ok_or(SlotError::OutOfRange { slot, capacity })
    }

    /// Map a fragment's `tex_id` to a slot, or `None` if it selects nothing.
    #[inline]
    pub fn resolve(tex_id: u32, capacity: u32) -> Option<Self> {
        (tex_id < capacity).then_some(Self(tex_id))
    }

    /// Slot number as uploaded to the GPU.
    #[inline]
    pub fn get(self) -> u32 {
        self.0
    }

    #[inline]
    pub fn as_usize(self) -> usize {
        self.0 as usize
    }

    /// All slots of an array with `capacity` entries, in slot order.
    pub fn all(capacity: u32) -> impl Iterator<Item = SlotIndex> {
        (0..capacity).map(SlotIndex)
    }
}

impl fmt::Display for SlotIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slot {}", self.0)
    }
}

impl From<SlotIndex> for u32 {
    fn from(slot: SlotIndex) -> u32 {
        slot.0
    }
}

// ===================================================================
// Tests
// ===================================================================
