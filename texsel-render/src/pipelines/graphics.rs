//! Graphics render pipeline: instanced textured quads, one texture array.
//!
//! Each instance names its texture slot; the generated fragment stage picks
//! the slot per fragment, so graphics from any number of sources (up to
//! the array capacity) go out in one draw call.

use log::debug;
use texsel_core::{generate_fragment_stage, ConfigError, SelectConfig, ShaderLanguage, Texture};
use thiserror::Error;
use wgpu::{
    BindGroup, BindGroupDescriptor, BindGroupEntry, BindGroupLayoutDescriptor, BindGroupLayoutEntry,
    BindingType, BlendState, Buffer, BufferBindingType, BufferDescriptor, BufferUsages,
    ColorTargetState, ColorWrites, Device, FragmentState, FrontFace, IndexFormat, MultisampleState,
    PipelineCompilationOptions, PipelineLayoutDescriptor, PolygonMode, PrimitiveState,
    PrimitiveTopology, Queue, RenderPass, RenderPipeline, RenderPipelineDescriptor,
    ShaderModuleDescriptor, ShaderStages, TextureFormat, VertexState,
};

use crate::binding::{BindingError, GpuTextureArray};
use crate::vertex::{CameraUniform, GraphicInstance, QuadVertex};

/// Maximum graphic instances per draw call (64K × 48B = 3 MB of GPU memory).
pub const MAX_GRAPHIC_INSTANCES: usize = 65_536;

const VERTEX_STAGE: &str = include_str!("../shaders/graphics_vs.wgsl");

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Invalid stage configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("Texture array: {0}")]
    Binding(#[from] BindingError),
}

/// Full WGSL module: the vertex stage followed by the generated fragment
/// stage for `config.tier`.
pub fn compose_shader(config: &SelectConfig) -> Result<String, ConfigError> {
    let fragment = generate_fragment_stage(config, ShaderLanguage::Wgsl)?;
    Ok(format!("{VERTEX_STAGE}\n{fragment}"))
}

/// Owns the wgpu pipeline, buffers, texture array, and bind groups.
pub struct TextureSelectPipeline {
    pipeline: RenderPipeline,
    config: SelectConfig,

    // Geometry (shared unit quad).
    vertex_buffer: Buffer,
    index_buffer: Buffer,

    // Instancing.
    instance_buffer: Buffer,
    instance_count: u32,

    // Camera.
    camera_buffer: Buffer,
    camera_bind_group: BindGroup,

    // Texture slots.
    textures: GpuTextureArray,
}

impl TextureSelectPipeline {
    /// Build the pipeline for `config` and allocate GPU buffers.
    ///
    /// The device must have been created with the tier's features (see
    /// [`crate::capabilities`]).
    pub fn new(
        device: &Device,
        surface_format: TextureFormat,
        config: &SelectConfig,
    ) -> Result<Self, PipelineError> {
        // ── Shader ──────────────────────────────────────────────
        let source = compose_shader(config)?;
        let shader = device.create_shader_module(ShaderModuleDescriptor {
            label: Some("texsel_graphics_shader"),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });

        // ── Camera bind group layout (group 0) ──────────────────
        let camera_bgl = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("texsel_camera_bgl"),
            entries: &[BindGroupLayoutEntry {
                binding: 0,
                visibility: ShaderStages::VERTEX,
                ty: BindingType::Buffer {
                    ty: BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        // ── Texture array (group 1) ─────────────────────────────
        let textures = GpuTextureArray::new(device, config.capacity)?;

        // ── Pipeline layout ─────────────────────────────────────
        let pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("texsel_pipeline_layout"),
            bind_group_layouts: &[&camera_bgl, textures.layout()],
            push_constant_ranges: &[],
        });

        // ── Render pipeline ─────────────────────────────────────
        let pipeline = device.create_render_pipeline(&RenderPipelineDescriptor {
            label: Some("texsel_graphics_pipeline"),
            layout: Some(&pipeline_layout),
            vertex: VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: PipelineCompilationOptions::default(),
                buffers: &[QuadVertex::layout(), GraphicInstance::layout()],
            },
            fragment: Some(FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: PipelineCompilationOptions::default(),
                targets: &[Some(ColorTargetState {
                    format: surface_format,
                    blend: Some(BlendState::ALPHA_BLENDING),
                    write_mask: ColorWrites::ALL,
                })],
            }),
            primitive: PrimitiveState {
                topology: PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        // ── Vertex buffer (unit quad) ───────────────────────────
        let vertex_buffer = device.create_buffer(&BufferDescriptor {
            label: Some("texsel_quad_vb"),
            size: std::mem::size_of::<[QuadVertex; 4]>() as u64,
            usage: BufferUsages::VERTEX | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        // ── Index buffer ────────────────────────────────────────
        let index_buffer = device.create_buffer(&BufferDescriptor {
            label: Some("texsel_quad_ib"),
            size: std::mem::size_of::<[u16; 6]>() as u64,
            usage: BufferUsages::INDEX | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        // ── Instance buffer ─────────────────────────────────────
        let instance_buffer = device.create_buffer(&BufferDescriptor {
            label: Some("texsel_graphic_instances"),
            size: (MAX_GRAPHIC_INSTANCES * std::mem::size_of::<GraphicInstance>()) as u64,
            usage: BufferUsages::VERTEX | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        // ── Camera uniform buffer ───────────────────────────────
        let camera_buffer = device.create_buffer(&BufferDescriptor {
            label: Some("texsel_camera_ub"),
            size: std::mem::size_of::<CameraUniform>() as u64,
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let camera_bind_group = device.create_bind_group(&BindGroupDescriptor {
            label: Some("texsel_camera_bg"),
            layout: &camera_bgl,
            entries: &[BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        debug!(
            "Built texture-select pipeline: {} tier, {} slots, format {:?}",
            config.tier, config.capacity, surface_format
        );

        Ok(Self {
            pipeline,
            config: *config,
            vertex_buffer,
            index_buffer,
            instance_buffer,
            instance_count: 0,
            camera_buffer,
            camera_bind_group,
            textures,
        })
    }

    // ───────────────────── Upload ─────────────────────────────────

    /// Upload the static quad geometry. Call once after creation.
    pub fn upload_quad(&self, queue: &Queue) {
        queue.write_buffer(
            &self.vertex_buffer,
            0,
            bytemuck::cast_slice(&QuadVertex::VERTICES),
        );
        queue.write_buffer(
            &self.index_buffer,
            0,
            bytemuck::cast_slice(&QuadVertex::INDICES),
        );
    }

    /// Upload graphic instances for this frame. Returns the number kept.
    pub fn upload_instances(&mut self, queue: &Queue, instances: &[GraphicInstance]) -> u32 {
        let count = instances.len().min(MAX_GRAPHIC_INSTANCES);
        if count < instances.len() {
            log::warn!(
                "Dropping {} graphic instances past the per-draw limit of {MAX_GRAPHIC_INSTANCES}",
                instances.len() - count
            );
        }
        if count == 0 {
            self.instance_count = 0;
            return 0;
        }

        queue.write_buffer(
            &self.instance_buffer,
            0,
            bytemuck::cast_slice(&instances[..count]),
        );
        self.instance_count = count as u32;
        self.instance_count
    }

    /// Upload the camera uniform for this frame.
    pub fn upload_camera(&self, queue: &Queue, camera: &CameraUniform) {
        queue.write_buffer(&self.camera_buffer, 0, bytemuck::bytes_of(camera));
    }

    /// Upload `texture` into texture slot `slot`.
    pub fn bind_texture(
        &mut self,
        device: &Device,
        queue: &Queue,
        slot: u32,
        texture: &Texture,
    ) -> Result<(), BindingError> {
        self.textures.bind(device, queue, slot, texture)
    }

    pub fn unbind_texture(&mut self, slot: u32) -> Result<bool, BindingError> {
        self.textures.unbind(slot)
    }

    /// Rebuild the texture bind group if slots changed. Call before drawing.
    pub fn prepare_textures(&mut self, device: &Device) {
        self.textures.prepare(device);
    }

    // ───────────────────── Draw ───────────────────────────────────

    /// Record draw commands into the render pass.
    ///
    /// **One draw call** for all graphic instances, whatever slots they use.
    pub fn draw<'a>(&'a self, pass: &mut RenderPass<'a>) {
        if self.instance_count == 0 {
            return;
        }
        let Some(texture_bind_group) = self.textures.bind_group() else {
            log::warn!("Texture array not prepared; skipping graphics draw");
            return;
        };

        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.camera_bind_group, &[]);
        pass.set_bind_group(1, texture_bind_group, &[]);
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_vertex_buffer(1, self.instance_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), IndexFormat::Uint16);
        pass.draw_indexed(0..6, 0, 0..self.instance_count);
    }

    /// Number of graphic instances that will be drawn.
    pub fn instance_count(&self) -> u32 {
        self.instance_count
    }

    pub fn config(&self) -> &SelectConfig {
        &self.config
    }

    pub fn textures(&self) -> &GpuTextureArray {
        &self.textures
    }
}

// ===================================================================
// Tests
// ===================================================================
