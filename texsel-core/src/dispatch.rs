//! Case-dispatch generator.
//!
//! Targets that forbid runtime indexing into a sampler array still allow
//! a `switch` whose arms each touch one slot through a literal index. The
//! [`DispatchTable`] is the single source of those arms: the shader
//! emitters in [`crate::codegen`] print it, and the CPU backend in
//! [`crate::stage`] walks it. Changing the capacity means regenerating
//! the table, never editing arms by hand.

use thiserror::Error;

use crate::slot::SlotIndex;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("Dispatch table has {arms} arms for {capacity} slots")]
    ArmCount { arms: usize, capacity: u32 },
    #[error("Duplicate case label {0}")]
    DuplicateLabel(u32),
    #[error("Missing case label {0}")]
    MissingLabel(u32),
    #[error("Case label {label} samples {slot}")]
    LabelMismatch { label: u32, slot: SlotIndex },
    #[error("Arm {position} has label {label}, expected {position}")]
    OutOfOrder { position: u32, label: u32 },
}

/// One labeled branch: `case label: sample(textures[slot])`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DispatchArm {
    pub label: u32,
    pub slot: SlotIndex,
}

/// Ordered list of case arms covering every slot of a texture array.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DispatchTable {
    capacity: u32,
    arms: Vec<DispatchArm>,
}

impl DispatchTable {
    /// Generate one arm per slot, in slot order.
    pub fn generate(capacity: u32) -> Self {
        let arms = SlotIndex::all(capacity)
            .map(|slot| DispatchArm {
                label: slot.get(),
                slot,
            })
            .collect();
        Self { capacity, arms }
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn arms(&self) -> &[DispatchArm] {
        &self.arms
    }

    /// Find the arm whose label equals `tex_id`, in arm order.
    ///
    /// `None` is the `default` branch.
    pub fn lookup(&self, tex_id: u32) -> Option<SlotIndex> {
        self.arms
            .iter()
            .find(|arm| arm.label == tex_id)
            .map(|arm| arm.slot)
    }

    /// Verify that every slot has exactly one arm, labels run `0..capacity`
    /// in slot order without gaps or duplicates, and each arm samples its
    /// own label.
    pub fn check(&self) -> Result<(), DispatchError> {
        if self.arms.len() != self.capacity as usize {
            return Err(DispatchError::ArmCount {
                arms: self.arms.len(),
                capacity: self.capacity,
            });
        }

        let mut seen = vec![false; self.capacity as usize];
        for arm in &self.arms {
            if arm.label != arm.slot.get() {
                return Err(DispatchError::LabelMismatch {
                    label: arm.label,
                    slot: arm.slot,
                });
            }
            match seen.get_mut(arm.label as usize) {
                Some(true) => return Err(DispatchError::DuplicateLabel(arm.label)),
                Some(flag) => *flag = true,
                // Label past the end: the count check above guarantees a
                // hole elsewhere, reported below.
                None => {}
            }
        }

        if let Some(missing) = seen.iter().position(|&s| !s) {
            return Err(DispatchError::MissingLabel(missing as u32));
        }

        // Complete and duplicate-free, so any misplaced arm is a permutation.
        for (position, arm) in (0u32..).zip(&self.arms) {
            if arm.label != position {
                return Err(DispatchError::OutOfOrder {
                    position,
                    label: arm.label,
                });
            }
        }
        Ok(())
    }
}

// ===================================================================
// Tests
// ===================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn arm(label: u32, slot: u32) -> DispatchArm {
        DispatchArm {
            label,
            slot: SlotIndex::new(slot, u32::MAX).unwrap(),
        }
    }

    #[test]
    fn test_generate_default_capacity() {
        let table = DispatchTable::generate(32);
        assert_eq!(table.arms().len(), 32);
        assert_eq!(table.arms()[0], arm(0, 0));
        assert_eq!(table.arms()[31], arm(31, 31));
        assert!(table.check().is_ok());
    }

    #[test]
    fn test_labels_in_slot_order() {
        let table = DispatchTable::generate(9);
        let labels: Vec<u32> = table.arms().iter().map(|a| a.label).collect();
        assert_eq!(labels, (0..9).collect::<Vec<_>>());
    }

    #[test]
    fn test_regenerate_keeps_one_to_one_mapping() {
        for capacity in [1, 2, 16, 32, 33, 64, 256] {
            let table = DispatchTable::generate(capacity);
            assert!(table.check().is_ok(), "capacity {capacity}");
            for tex_id in 0..capacity {
                let hits = table.arms().iter().filter(|a| a.label == tex_id).count();
                assert_eq!(hits, 1, "tex_id {tex_id} at capacity {capacity}");
                assert_eq!(table.lookup(tex_id).map(SlotIndex::get), Some(tex_id));
            }
            assert_eq!(table.lookup(capacity), None);
        }
    }

    #[test]
    fn test_lookup_out_of_range_is_default() {
        let table = DispatchTable::generate(32);
        assert_eq!(table.lookup(32), None);
        assert_eq!(table.lookup(u32::MAX), None);
    }

    #[test]
    fn test_check_detects_duplicate() {
        let table = DispatchTable {
            capacity: 3,
            arms: vec![arm(0, 0), arm(1, 1), arm(1, 1)],
        };
        assert_eq!(table.check(), Err(DispatchError::DuplicateLabel(1)));
    }

    #[test]
    fn test_check_detects_gap() {
        let table = DispatchTable {
            capacity: 3,
            arms: vec![arm(0, 0), arm(2, 2), arm(5, 5)],
        };
        assert_eq!(table.check(), Err(DispatchError::MissingLabel(1)));
    }

    #[test]
    fn test_check_detects_out_of_order() {
        let rotated = DispatchTable {
            capacity: 3,
            arms: vec![arm(2, 2), arm(0, 0), arm(1, 1)],
        };
        assert_eq!(
            rotated.check(),
            Err(DispatchError::OutOfOrder { position: 0, label: 2 })
        );

        let swapped = DispatchTable {
            capacity: 4,
            arms: vec![arm(0, 0), arm(1, 1), arm(3, 3), arm(2, 2)],
        };
        assert_eq!(
            swapped.check(),
            Err(DispatchError::OutOfOrder { position: 2, label: 3 })
        );
    }

    #[test]
    fn test_check_detects_count_and_mismatch() {
        let short = DispatchTable {
            capacity: 3,
            arms: vec![arm(0, 0)],
        };
        assert!(matches!(short.check(), Err(DispatchError::ArmCount { arms: 1, capacity: 3 })));

        let crossed = DispatchTable {
            capacity: 2,
            arms: vec![arm(0, 1), arm(1, 0)],
        };
        assert!(matches!(crossed.check(), Err(DispatchError::LabelMismatch { label: 0, .. })));
    }
}
