//! Placement → GPU bridge: converts positioned graphics into
//! `GraphicInstance` arrays for the graphics pipeline.

use texsel_core::{SlotIndex, NO_TEXTURE};

use crate::vertex::GraphicInstance;

/// A graphic placed on screen, in pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GraphicPlacement {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Region of the slot texture shown by this placement.
    pub uv_min: [f32; 2],
    pub uv_max: [f32; 2],
    /// Slot holding the texture; `None` draws nothing.
    pub slot: Option<SlotIndex>,
}

impl GraphicPlacement {
    /// Place the whole texture of `slot` at `(x, y)`.
    pub fn new(x: f32, y: f32, width: f32, height: f32, slot: Option<SlotIndex>) -> Self {
        Self {
            x,
            y,
            width,
            height,
            uv_min: [0.0, 0.0],
            uv_max: [1.0, 1.0],
            slot,
        }
    }
}

/// Build the instance list for one draw, in placement order.
///
/// Placements without a slot get `NO_TEXTURE`, which every tier discards.
pub fn collect_instances(placements: &[GraphicPlacement]) -> Vec<GraphicInstance> {
    placements
        .iter()
        .map(|p| {
            let tex_id = p.slot.map_or(NO_TEXTURE, u32::from);
            GraphicInstance::new(p.x, p.y, p.width, p.height, tex_id).with_uv(p.uv_min, p.uv_max)
        })
        .collect()
}

// ===================================================================
// Tests
// ===================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_instances_maps_slots() {
        let placements = [
            GraphicPlacement::new(0.0, 0.0, 16.0, 16.0, Some(SlotIndex::new(0, 32).unwrap())),
            GraphicPlacement::new(20.0, 0.0, 16.0, 8.0, Some(SlotIndex::new(31, 32).unwrap())),
        ];
        let instances = collect_instances(&placements);

        assert_eq!(instances.len(), 2);
        assert_eq!(instances[0].tex_id, 0);
        assert_eq!(instances[1].tex_id, 31);
        assert_eq!(instances[1].position, [20.0, 0.0]);
        assert_eq!(instances[1].size, [16.0, 8.0]);
    }

    #[test]
    fn test_missing_slot_becomes_sentinel() {
        let instances = collect_instances(&[GraphicPlacement::new(1.0, 2.0, 3.0, 4.0, None)]);
        assert_eq!(instances[0].tex_id, NO_TEXTURE);
    }

    #[test]
    fn test_uv_region_carried_through() {
        let mut placement = GraphicPlacement::new(0.0, 0.0, 8.0, 8.0, None);
        placement.uv_min = [0.5, 0.25];
        placement.uv_max = [1.0, 0.75];

        let instances = collect_instances(&[placement]);
        assert_eq!(instances[0].uv_min, [0.5, 0.25]);
        assert_eq!(instances[0].uv_max, [1.0, 0.75]);
    }

    #[test]
    fn test_collect_empty() {
        assert!(collect_instances(&[]).is_empty());
    }
}
