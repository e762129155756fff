//! GPU texture array, the host side of the slot binding.
//!
//! Holds up to `capacity` textures, each with its own sampler. The whole
//! array is bound as two `binding_array`s (views at binding 0, samplers at
//! binding 1). Empty slots point at a 1×1 transparent placeholder so the
//! array is always fully bound; fragments must still never select them.
//!
//! The bind group is rebuilt lazily by [`GpuTextureArray::prepare`] after
//! any `bind`/`unbind`, never while a pass is being recorded.

use std::num::NonZeroU32;

use log::{debug, trace};
use texsel_core::{SamplerConfig, SlotError, SlotIndex, Texture};
use thiserror::Error;
use wgpu::{
    BindGroup, BindGroupDescriptor, BindGroupEntry, BindGroupLayout, BindGroupLayoutDescriptor,
    BindGroupLayoutEntry, BindingResource, BindingType, Device, Extent3d, Queue, Sampler,
    SamplerBindingType, SamplerDescriptor, ShaderStages, TextureDescriptor, TextureDimension,
    TextureFormat, TextureSampleType, TextureUsages, TextureView, TextureViewDimension,
};

/// Format of every slot texture. Texel values are used as-is (no sRGB decode).
pub const SLOT_TEXTURE_FORMAT: TextureFormat = TextureFormat::Rgba8Unorm;

#[derive(Error, Debug)]
pub enum BindingError {
    #[error(transparent)]
    Slot(#[from] SlotError),
    #[error("Texture array capacity must be at least 1")]
    ZeroCapacity,
}

/// One uploaded texture with its view and sampler.
struct GpuSlot {
    texture: wgpu::Texture,
    view: TextureView,
    sampler: Sampler,
    size: (u32, u32),
}

/// GPU-side texture slots plus the bind group that exposes them.
pub struct GpuTextureArray {
    capacity: u32,
    layout: BindGroupLayout,
    slots: Vec<Option<GpuSlot>>,
    placeholder: GpuSlot,
    bind_group: Option<BindGroup>,
}

impl GpuTextureArray {
    /// Create an empty array of `capacity` slots.
    pub fn new(device: &Device, capacity: u32) -> Result<Self, BindingError> {
        let count = NonZeroU32::new(capacity).ok_or(BindingError::ZeroCapacity)?;

        let layout = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("texsel_texture_array_bgl"),
            entries: &[
                BindGroupLayoutEntry {
                    binding: 0,
                    visibility: ShaderStages::FRAGMENT,
                    ty: BindingType::Texture {
                        sample_type: TextureSampleType::Float { filterable: true },
                        view_dimension: TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: Some(count),
                },
                BindGroupLayoutEntry {
                    binding: 1,
                    visibility: ShaderStages::FRAGMENT,
                    ty: BindingType::Sampler(SamplerBindingType::Filtering),
                    count: Some(count),
                },
            ],
        });

        // Textures are zero-initialised, so the placeholder is transparent black.
        let placeholder = create_slot(device, 1, 1, SamplerConfig::default(), "texsel_placeholder");

        let slots = (0..capacity).map(|_| None).collect();

        debug!("Created GPU texture array with {capacity} slots");

        Ok(Self {
            capacity,
            layout,
            slots,
            placeholder,
            bind_group: None,
        })
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Layout of the bind group (texture array + sampler array).
    pub fn layout(&self) -> &BindGroupLayout {
        &self.layout
    }

    /// Upload `texture` into `slot`, replacing whatever was there.
    pub fn bind(
        &mut self,
        device: &Device,
        queue: &Queue,
        slot: u32,
        texture: &Texture,
    ) -> Result<(), BindingError> {
        let slot = SlotIndex::new(slot, self.capacity)?;
        let (width, height) = (texture.width(), texture.height());

        let gpu_slot = create_slot(device, width, height, texture.sampler(), "texsel_slot_texture");
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &gpu_slot.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            texture.data(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(width * 4), // RGBA = 4 bytes per pixel
                rows_per_image: Some(height),
            },
            Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );

        trace!("Uploaded {width}x{height} texture to {slot}");
        self.slots[slot.as_usize()] = Some(gpu_slot);
        self.bind_group = None;
        Ok(())
    }

    /// Release the texture in `slot`. Returns whether the slot was bound.
    pub fn unbind(&mut self, slot: u32) -> Result<bool, BindingError> {
        let slot = SlotIndex::new(slot, self.capacity)?;
        let was_bound = self.slots[slot.as_usize()].take().is_some();
        if was_bound {
            trace!("Released texture in {slot}");
            self.bind_group = None;
        }
        Ok(was_bound)
    }

    pub fn is_bound(&self, slot: u32) -> bool {
        SlotIndex::resolve(slot, self.capacity)
            .is_some_and(|s| self.slots[s.as_usize()].is_some())
    }

    /// Size of the texture in `slot`, if any.
    pub fn slot_size(&self, slot: u32) -> Option<(u32, u32)> {
        let slot = SlotIndex::resolve(slot, self.capacity)?;
        self.slots[slot.as_usize()].as_ref().map(|s| s.size)
    }

    pub fn bound_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Rebuild the bind group if the slots changed since the last call.
    pub fn prepare(&mut self, device: &Device) {
        if self.bind_group.is_some() {
            return;
        }

        let views: Vec<&TextureView> = self
            .slots
            .iter()
            .map(|s| &s.as_ref().unwrap_or(&self.placeholder).view)
            .collect();
        let samplers: Vec<&Sampler> = self
            .slots
            .iter()
            .map(|s| &s.as_ref().unwrap_or(&self.placeholder).sampler)
            .collect();

        let bind_group = device.create_bind_group(&BindGroupDescriptor {
            label: Some("texsel_texture_array_bg"),
            layout: &self.layout,
            entries: &[
                BindGroupEntry {
                    binding: 0,
                    resource: BindingResource::TextureViewArray(&views),
                },
                BindGroupEntry {
                    binding: 1,
                    resource: BindingResource::SamplerArray(&samplers),
                },
            ],
        });

        debug!("Rebuilt texture array bind group ({} of {} slots bound)", self.bound_count(), self.capacity);
        self.bind_group = Some(bind_group);
    }

    /// The bind group built by the last [`prepare`](Self::prepare).
    pub fn bind_group(&self) -> Option<&BindGroup> {
        self.bind_group.as_ref()
    }
}

fn create_slot(
    device: &Device,
    width: u32,
    height: u32,
    sampler: SamplerConfig,
    label: &'static str,
) -> GpuSlot {
    let texture = device.create_texture(&TextureDescriptor {
        label: Some(label),
        size: Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: TextureDimension::D2,
        format: SLOT_TEXTURE_FORMAT,
        usage: TextureUsages::TEXTURE_BINDING | TextureUsages::COPY_DST,
        view_formats: &[],
    });
    let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
    let sampler = device.create_sampler(&sampler_descriptor(sampler));

    GpuSlot {
        texture,
        view,
        sampler,
        size: (width, height),
    }
}

/// Translate a slot's sampler configuration to wgpu.
pub fn sampler_descriptor(config: SamplerConfig) -> SamplerDescriptor<'static> {
    let filter = match config.filter {
        texsel_core::FilterMode::Nearest => wgpu::FilterMode::Nearest,
        texsel_core::FilterMode::Linear => wgpu::FilterMode::Linear,
    };
    let address = match config.address_mode {
        texsel_core::AddressMode::ClampToEdge => wgpu::AddressMode::ClampToEdge,
        texsel_core::AddressMode::Repeat => wgpu::AddressMode::Repeat,
        texsel_core::AddressMode::MirrorRepeat => wgpu::AddressMode::MirrorRepeat,
    };

    SamplerDescriptor {
        label: Some("texsel_slot_sampler"),
        address_mode_u: address,
        address_mode_v: address,
        address_mode_w: address,
        mag_filter: filter,
        min_filter: filter,
        ..Default::default()
    }
}

// ===================================================================
// Tests
// ===================================================================
