//! CPU reference of the texture-select stage.
//!
//! The operation is written once against [`SamplerArray`], an indexed
//! array of samplable slots, and lowered twice:
//!
//! - [`DirectIndex`] checks the range and samples `array[tex_id]`.
//! - [`CaseDispatch`] walks a generated [`DispatchTable`]; each arm samples
//!   its own constant slot, and an id that matches no arm is discarded.
//!
//! Neither backend logs, allocates, or keeps state between fragments.

use log::trace;

use crate::config::{ConfigError, SelectConfig};
use crate::dispatch::DispatchTable;
use crate::slot::{SlotError, SlotIndex};
use crate::texture::Texture;
use crate::tier::CapabilityTier;

/// Normalized RGBA color.
pub type Rgba = [f32; 4];

/// Per-fragment inputs produced by the vertex stage.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Fragment {
    /// Flat-interpolated slot selector.
    pub tex_id: u32,
    /// Sampling coordinate in the selected texture.
    pub tex_coords: [f32; 2],
}

impl Fragment {
    pub fn new(tex_id: u32, tex_coords: [f32; 2]) -> Self {
        Self { tex_id, tex_coords }
    }
}

/// Result of shading one fragment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FragmentOutput {
    Color(Rgba),
    /// Nothing is written for this fragment.
    Discard,
}

impl FragmentOutput {
    pub fn color(self) -> Option<Rgba> {
        match self {
            FragmentOutput::Color(c) => Some(c),
            FragmentOutput::Discard => None,
        }
    }

    pub fn is_discard(self) -> bool {
        matches!(self, FragmentOutput::Discard)
    }
}

/// A fixed-capacity array of samplable slots.
pub trait SamplerArray {
    fn capacity(&self) -> u32;

    /// Sample `slot` at `coord` with that slot's sampler configuration.
    fn sample(&self, slot: SlotIndex, coord: [f32; 2]) -> Rgba;
}

/// Host-populated texture slots.
///
/// Callers must only send in-range ids for slots that are bound. Sampling
/// an unbound slot returns transparent black.
#[derive(Clone, Debug)]
pub struct TextureArrayBinding {
    slots: Vec<Option<Texture>>,
}

impl TextureArrayBinding {
    pub fn new(capacity: u32) -> Self {
        Self {
            slots: vec![None; capacity as usize],
        }
    }

    /// Put `texture` into `slot`, returning the texture it replaced.
    pub fn bind(&mut self, slot: u32, texture: Texture) -> Result<Option<Texture>, SlotError> {
        let slot = SlotIndex::new(slot, self.capacity())?;
        trace!("Binding {}x{} texture to {slot}", texture.width(), texture.height());
        Ok(self.slots[slot.as_usize()].replace(texture))
    }

    pub fn unbind(&mut self, slot: u32) -> Result<Option<Texture>, SlotError> {
        let slot = SlotIndex::new(slot, self.capacity())?;
        trace!("Unbinding {slot}");
        Ok(self.slots[slot.as_usize()].take())
    }

    pub fn get(&self, slot: SlotIndex) -> Option<&Texture> {
        self.slots.get(slot.as_usize()).and_then(Option::as_ref)
    }

    pub fn is_bound(&self, slot: u32) -> bool {
        SlotIndex::resolve(slot, self.capacity()).is_some_and(|s| self.get(s).is_some())
    }

    pub fn bound_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|s| *s = None);
    }
}

impl SamplerArray for TextureArrayBinding {
    fn capacity(&self) -> u32 {
        self.slots.len() as u32
    }

    fn sample(&self, slot: SlotIndex, coord: [f32; 2]) -> Rgba {
        match self.get(slot) {
            Some(texture) => texture.sample(coord),
            None => [0.0; 4],
        }
    }
}

/// One lowering of the texture-select stage.
pub trait TextureSelect {
    fn tier(&self) -> CapabilityTier;

    /// Number of slots the stage was built for.
    fn capacity(&self) -> u32;

    fn shade(&self, array: &dyn SamplerArray, fragment: Fragment) -> FragmentOutput;
}

/// Runtime-indexed lowering.
#[derive(Clone, Copy, Debug)]
pub struct DirectIndex {
    capacity: u32,
}

impl DirectIndex {
    /// Fails for a capacity that [`SelectConfig::validate`] rejects.
    pub fn new(capacity: u32) -> Result<Self, ConfigError> {
        SelectConfig::new(capacity, CapabilityTier::DirectIndex).validate()?;
        Ok(Self { capacity })
    }
}

impl TextureSelect for DirectIndex {
    fn tier(&self) -> CapabilityTier {
        CapabilityTier::DirectIndex
    }

    fn capacity(&self) -> u32 {
        self.capacity
    }

    #[inline]
    fn shade(&self, array: &dyn SamplerArray, fragment: Fragment) -> FragmentOutput {
        match SlotIndex::resolve(fragment.tex_id, self.capacity) {
            Some(slot) => FragmentOutput::Color(array.sample(slot, fragment.tex_coords)),
            None => FragmentOutput::Discard,
        }
    }
}

/// Lowering through an explicit branch per slot.
#[derive(Clone, Debug)]
pub struct CaseDispatch {
    table: DispatchTable,
}

impl CaseDispatch {
    /// Fails for a capacity that [`SelectConfig::validate`] rejects, before
    /// any arm is generated.
    pub fn new(capacity: u32) -> Result<Self, ConfigError> {
        SelectConfig::new(capacity, CapabilityTier::CaseDispatch).validate()?;
        Ok(Self {
            table: DispatchTable::generate(capacity),
        })
    }

    pub fn table(&self) -> &DispatchTable {
        &self.table
    }
}

impl TextureSelect for CaseDispatch {
    fn tier(&self) -> CapabilityTier {
        CapabilityTier::CaseDispatch
    }

    fn capacity(&self) -> u32 {
        self.table.capacity()
    }

    fn shade(&self, array: &dyn SamplerArray, fragment: Fragment) -> FragmentOutput {
        match self.table.lookup(fragment.tex_id) {
            Some(slot) => FragmentOutput::Color(array.sample(slot, fragment.tex_coords)),
            None => FragmentOutput::Discard,
        }
    }
}

/// Build the stage for `config.tier`. Called once per program build.
pub fn build_stage(config: &SelectConfig) -> Result<Box<dyn TextureSelect>, ConfigError> {
    Ok(match config.tier {
        CapabilityTier::DirectIndex => Box::new(DirectIndex::new(config.capacity)?),
        CapabilityTier::CaseDispatch => Box::new(CaseDispatch::new(config.capacity)?),
    })
}

// ===================================================================
// Tests
// ===================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slot::MAX_CAPACITY;
    use crate::texture::{ColorType, SamplerConfig};

    /// One solid color per slot; the color encodes the slot number.
    fn slot_colors(capacity: u32) -> TextureArrayBinding {
        let mut binding = TextureArrayBinding::new(capacity);
        for slot in 0..capacity {
            binding
                .bind(slot, Texture::solid([slot as u8, 255 - slot as u8, 7, 255]))
                .unwrap();
        }
        binding
    }

    fn stages(capacity: u32) -> Vec<Box<dyn TextureSelect>> {
        CapabilityTier::ALL
            .iter()
            .map(|&tier| build_stage(&SelectConfig::new(capacity, tier)).unwrap())
            .collect()
    }

    #[test]
    fn test_boundaries_at_default_capacity() {
        let binding = slot_colors(32);
        for stage in stages(32) {
            let first = stage.shade(&binding, Fragment::new(0, [0.5, 0.5]));
            assert_eq!(first, FragmentOutput::Color([0.0, 1.0, 7.0 / 255.0, 1.0]));

            let last = stage.shade(&binding, Fragment::new(31, [0.5, 0.5]));
            assert_eq!(last.color().unwrap()[0], 31.0 / 255.0);

            assert!(stage.shade(&binding, Fragment::new(32, [0.5, 0.5])).is_discard());
            assert!(stage
                .shade(&binding, Fragment::new(4_294_967_295, [0.5, 0.5]))
                .is_discard());
        }
    }

    #[test]
    fn test_variants_equal_direct_sampling() {
        let mut binding = TextureArrayBinding::new(32);
        for slot in 0..32u32 {
            let pixels: Vec<u8> = (0..4 * 4 * 4).map(|i| (i as u32 * 13 + slot * 29) as u8).collect();
            let texture =
                Texture::from_pixels(4, 4, ColorType::Rgba, &pixels, SamplerConfig::default()).unwrap();
            binding.bind(slot, texture).unwrap();
        }

        let coords = [[0.0, 0.0], [0.3, 0.8], [0.5, 0.5], [1.0, 1.0], [0.12, 0.97]];
        for stage in stages(32) {
            for tex_id in 0..32 {
                for &coord in &coords {
                    let expected = binding.get(SlotIndex::resolve(tex_id, 32).unwrap()).unwrap().sample(coord);
                    assert_eq!(
                        stage.shade(&binding, Fragment::new(tex_id, coord)),
                        FragmentOutput::Color(expected),
                        "{} tex_id {tex_id}",
                        stage.tier()
                    );
                }
            }
        }
    }

    #[test]
    fn test_discard_is_total_above_capacity() {
        let binding = slot_colors(32);
        for stage in stages(32) {
            for tex_id in (32..2048).chain([u32::MAX - 1, u32::MAX]) {
                assert!(stage.shade(&binding, Fragment::new(tex_id, [0.5, 0.5])).is_discard());
            }
        }
    }

    #[test]
    fn test_stage_capacity_follows_config() {
        let binding = slot_colors(8);
        for stage in stages(4) {
            assert_eq!(stage.capacity(), 4);
            // Slot 5 is bound in the array but outside the stage.
            assert!(stage.shade(&binding, Fragment::new(5, [0.5, 0.5])).is_discard());
        }
    }

    #[test]
    fn test_build_stage_tiers() {
        let direct = build_stage(&SelectConfig::new(32, CapabilityTier::DirectIndex)).unwrap();
        let case = build_stage(&SelectConfig::new(32, CapabilityTier::CaseDispatch)).unwrap();
        assert_eq!(direct.tier(), CapabilityTier::DirectIndex);
        assert_eq!(case.tier(), CapabilityTier::CaseDispatch);
        assert!(build_stage(&SelectConfig::new(0, CapabilityTier::DirectIndex)).is_err());
    }

    #[test]
    fn test_case_dispatch_table_is_complete() {
        let stage = CaseDispatch::new(32).unwrap();
        assert_eq!(stage.table().arms().len(), 32);
        assert!(stage.table().check().is_ok());
    }

    #[test]
    fn test_constructors_reject_invalid_capacity() {
        assert!(matches!(CaseDispatch::new(u32::MAX), Err(ConfigError::CapacityTooLarge(u32::MAX))));
        assert!(matches!(DirectIndex::new(u32::MAX), Err(ConfigError::CapacityTooLarge(u32::MAX))));
        assert!(matches!(CaseDispatch::new(0), Err(ConfigError::ZeroCapacity)));
        assert!(matches!(DirectIndex::new(0), Err(ConfigError::ZeroCapacity)));
        assert_eq!(DirectIndex::new(MAX_CAPACITY).unwrap().capacity(), MAX_CAPACITY);
    }

    #[test]
    fn test_binding_slots() {
        let mut binding = TextureArrayBinding::new(4);
        assert_eq!(binding.bound_count(), 0);
        assert!(binding.bind(2, Texture::solid([1, 2, 3, 4])).unwrap().is_none());
        assert!(binding.is_bound(2));
        assert!(!binding.is_bound(3));
        assert!(!binding.is_bound(99));

        let replaced = binding.bind(2, Texture::solid([9, 9, 9, 9])).unwrap();
        assert_eq!(replaced, Some(Texture::solid([1, 2, 3, 4])));

        assert!(binding.bind(4, Texture::solid([0; 4])).is_err());
        assert!(binding.unbind(2).unwrap().is_some());
        assert_eq!(binding.bound_count(), 0);

        binding.bind(0, Texture::solid([0; 4])).unwrap();
        binding.clear();
        assert_eq!(binding.bound_count(), 0);
    }

    #[test]
    fn test_unbound_slot_samples_transparent() {
        let binding = TextureArrayBinding::new(4);
        let stage = DirectIndex::new(4).unwrap();
        assert_eq!(
            stage.shade(&binding, Fragment::new(1, [0.5, 0.5])),
            FragmentOutput::Color([0.0; 4])
        );
    }
}
