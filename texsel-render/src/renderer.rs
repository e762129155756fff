//! High-level renderer that ties GPU context, texture slots, and the
//! texture-select pipeline together into a single draw per frame.

use log::debug;
use texsel_core::{CapabilityTier, SelectConfig, Texture};
use thiserror::Error;
use wgpu::{
    Color, CommandEncoderDescriptor, Extent3d, LoadOp, Operations, RenderPassColorAttachment,
    RenderPassDescriptor, StoreOp, TextureDescriptor, TextureDimension, TextureFormat,
    TextureUsages, TextureViewDescriptor,
};

use crate::binding::BindingError;
use crate::capabilities::check_support;
use crate::context::{GpuContext, GpuError};
use crate::pipelines::graphics::{PipelineError, TextureSelectPipeline};
use crate::vertex::{CameraUniform, GraphicInstance};

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),
    #[error("No surface configured (headless mode)")]
    NoSurface,
    #[error(transparent)]
    Gpu(#[from] GpuError),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error(transparent)]
    Binding(#[from] BindingError),
    #[error("Off-screen target must be at least 1x1, got {width}x{height}")]
    EmptyTarget { width: u32, height: u32 },
    #[error("Cannot read back pixels in format {0:?}")]
    ReadbackFormat(TextureFormat),
    #[error("Failed to map readback buffer: {0}")]
    Readback(#[from] wgpu::BufferAsyncError),
    #[error("Readback was dropped before the buffer was mapped")]
    ReadbackAborted,
}

/// Frame statistics returned after each render.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameStats {
    /// Number of graphic instances drawn.
    pub graphic_count: u32,
    /// Number of draw calls.
    pub draw_calls: u32,
    /// Tier the fragment stage was built for.
    pub tier: CapabilityTier,
}

/// Renderer for textured graphics selected per fragment.
///
/// # Usage
///
/// ```ignore
/// let mut renderer = Renderer::new(&gpu, &config)?;
/// renderer.bind_texture(&gpu, 0, &texture)?;
/// renderer.prepare(&gpu, &instances, &camera);
/// let stats = renderer.render_to_surface(&gpu)?;
/// ```
pub struct Renderer {
    pipeline: TextureSelectPipeline,
    target_format: TextureFormat,
    clear_color: Color,
    quad_uploaded: bool,
}

impl Renderer {
    /// Create a renderer for `config` on a device that supports its tier.
    pub fn new(gpu: &GpuContext, config: &SelectConfig) -> Result<Self, RenderError> {
        check_support(gpu.device.features(), &gpu.device.limits(), config)?;
        let pipeline = TextureSelectPipeline::new(&gpu.device, gpu.surface_format, config)?;

        Ok(Self {
            pipeline,
            target_format: gpu.surface_format,
            clear_color: Color::TRANSPARENT,
            quad_uploaded: false,
        })
    }

    /// Set the background clear color.
    pub fn set_clear_color(&mut self, r: f64, g: f64, b: f64, a: f64) {
        self.clear_color = Color { r, g, b, a };
    }

    /// Upload `texture` into texture slot `slot`.
    pub fn bind_texture(
        &mut self,
        gpu: &GpuContext,
        slot: u32,
        texture: &Texture,
    ) -> Result<(), RenderError> {
        self.pipeline
            .bind_texture(&gpu.device, &gpu.queue, slot, texture)
            .map_err(RenderError::from)
    }

    /// Release texture slot `slot`. Returns whether it was bound.
    pub fn unbind_texture(&mut self, slot: u32) -> Result<bool, RenderError> {
        self.pipeline.unbind_texture(slot).map_err(RenderError::from)
    }

    /// Upload per-frame data (instances + camera) and refresh the texture
    /// bindings.
    ///
    /// Call this once per frame before `render_to_surface()` or
    /// `render_to_texture()`.
    pub fn prepare(&mut self, gpu: &GpuContext, instances: &[GraphicInstance], camera: &CameraUniform) {
        // Upload static quad geometry on first frame.
        if !self.quad_uploaded {
            self.pipeline.upload_quad(&gpu.queue);
            self.quad_uploaded = true;
        }

        self.pipeline.upload_instances(&gpu.queue, instances);
        self.pipeline.upload_camera(&gpu.queue, camera);
        self.pipeline.prepare_textures(&gpu.device);
    }

    /// Render to the window surface.  Returns frame statistics.
    pub fn render_to_surface(&self, gpu: &GpuContext) -> Result<FrameStats, RenderError> {
        let surface = gpu.surface.as_ref().ok_or(RenderError::NoSurface)?;
        let output = surface.get_current_texture()?;
        let view = output.texture.create_view(&TextureViewDescriptor::default());

        let stats = self.render_to_texture(gpu, &view);
        output.present();
        Ok(stats)
    }

    /// Render to an off-screen texture (headless mode).
    ///
    /// `target_view` must have the format the renderer was created with.
    pub fn render_to_texture(&self, gpu: &GpuContext, target_view: &wgpu::TextureView) -> FrameStats {
        let mut encoder = gpu.device.create_command_encoder(&CommandEncoderDescriptor {
            label: Some("texsel_frame_encoder"),
        });

        {
            let mut pass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("texsel_render_pass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: target_view,
                    resolve_target: None,
                    ops: Operations {
                        load: LoadOp::Clear(self.clear_color),
                        store: StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            self.pipeline.draw(&mut pass);
        }

        gpu.queue.submit(std::iter::once(encoder.finish()));
        self.frame_stats()
    }

    /// Render a `width × height` frame and read it back as tightly packed
    /// RGBA8 rows, top row first.
    pub fn render_offscreen(
        &self,
        gpu: &GpuContext,
        width: u32,
        height: u32,
    ) -> Result<Vec<u8>, RenderError> {
        if width == 0 || height == 0 {
            return Err(RenderError::EmptyTarget { width, height });
        }
        let swap_red_blue = match self.target_format {
            TextureFormat::Rgba8Unorm | TextureFormat::Rgba8UnormSrgb => false,
            TextureFormat::Bgra8Unorm | TextureFormat::Bgra8UnormSrgb => true,
            other => return Err(RenderError::ReadbackFormat(other)),
        };

        let size = Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let target = gpu.device.create_texture(&TextureDescriptor {
            label: Some("texsel_offscreen_target"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: TextureDimension::D2,
            format: self.target_format,
            usage: TextureUsages::RENDER_ATTACHMENT | TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = target.create_view(&TextureViewDescriptor::default());
        self.render_to_texture(gpu, &view);

        // Buffer copies need rows aligned to 256 bytes.
        let row_bytes = width * 4;
        let padded_row_bytes = row_bytes.div_ceil(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT)
            * wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;

        let readback = gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("texsel_readback"),
            size: u64::from(padded_row_bytes) * u64::from(height),
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = gpu.device.create_command_encoder(&CommandEncoderDescriptor {
            label: Some("texsel_readback_encoder"),
        });
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &target,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &readback,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_row_bytes),
                    rows_per_image: Some(height),
                },
            },
            size,
        );
        gpu.queue.submit(std::iter::once(encoder.finish()));

        let slice = readback.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        gpu.device.poll(wgpu::Maintain::Wait);
        rx.recv().map_err(|_| RenderError::ReadbackAborted)??;

        let mut pixels = Vec::with_capacity((row_bytes * height) as usize);
        {
            let mapped = slice.get_mapped_range();
            for row in mapped.chunks_exact(padded_row_bytes as usize) {
                pixels.extend_from_slice(&row[..row_bytes as usize]);
            }
        }
        readback.unmap();

        if swap_red_blue {
            for px in pixels.chunks_exact_mut(4) {
                px.swap(0, 2);
            }
        }

        debug!("Read back {width}x{height} off-screen frame");
        Ok(pixels)
    }

    fn frame_stats(&self) -> FrameStats {
        let graphic_count = self.pipeline.instance_count();
        let drawn = graphic_count > 0 && self.pipeline.textures().bind_group().is_some();
        FrameStats {
            graphic_count,
            draw_calls: u32::from(drawn),
            tier: self.pipeline.config().tier,
        }
    }

    /// Access the graphics pipeline (for advanced usage).
    pub fn pipeline(&self) -> &TextureSelectPipeline {
        &self.pipeline
    }
}

// ===================================================================
// Tests
// ===================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use texsel_core::NO_TEXTURE;

    fn headless(config: &SelectConfig) -> Option<(GpuContext, Renderer)> {
        let gpu = pollster::block_on(GpuContext::new_headless(config)).ok()?;
        let renderer = Renderer::new(&gpu, config).ok()?;
        Some((gpu, renderer))
    }

    #[test]
    fn test_frame_stats_fields() {
        let stats = FrameStats {
            graphic_count: 42,
            draw_calls: 1,
            tier: CapabilityTier::CaseDispatch,
        };
        assert_eq!(stats.graphic_count, 42);
        assert_eq!(stats.draw_calls, 1);
        assert_eq!(stats.tier, CapabilityTier::CaseDispatch);
    }

    #[test]
    fn test_renderer_creation_headless() {
        // May fail in CI without GPU, skip gracefully.
        if let Some((_gpu, renderer)) = headless(&SelectConfig::default()) {
            assert_eq!(renderer.pipeline.instance_count(), 0);
            assert!(!renderer.quad_uploaded);
        }
    }

    #[test]
    fn test_prepare_uploads_instances() {
        let config = SelectConfig::new(4, CapabilityTier::CaseDispatch);
        if let Some((gpu, mut renderer)) = headless(&config) {
            renderer
                .bind_texture(&gpu, 0, &Texture::solid([255, 0, 0, 255]))
                .unwrap();
            let instances = vec![
                GraphicInstance::new(0.0, 0.0, 100.0, 50.0, 0),
                GraphicInstance::empty(200.0, 100.0, 80.0, 80.0),
            ];
            renderer.prepare(&gpu, &instances, &CameraUniform::orthographic(800.0, 600.0));

            assert_eq!(renderer.pipeline.instance_count(), 2);
            assert!(renderer.quad_uploaded);
            assert_eq!(renderer.frame_stats().draw_calls, 1);
        }
    }

    #[test]
    fn test_bind_out_of_range_slot() {
        let config = SelectConfig::new(4, CapabilityTier::CaseDispatch);
        if let Some((gpu, mut renderer)) = headless(&config) {
            let err = renderer.bind_texture(&gpu, 4, &Texture::solid([0; 4]));
            assert!(matches!(err, Err(RenderError::Binding(_))));
            assert!(!renderer.unbind_texture(0).unwrap());
        }
    }

    #[test]
    fn test_render_to_surface_headless_fails() {
        if let Some((gpu, renderer)) = headless(&SelectConfig::default()) {
            assert!(matches!(renderer.render_to_surface(&gpu), Err(RenderError::NoSurface)));
        }
    }

    #[test]
    fn test_offscreen_empty_target() {
        if let Some((gpu, renderer)) = headless(&SelectConfig::default()) {
            assert!(matches!(
                renderer.render_offscreen(&gpu, 0, 4),
                Err(RenderError::EmptyTarget { width: 0, height: 4 })
            ));
        }
    }

    #[test]
    fn test_offscreen_selected_and_discarded() {
        for tier in CapabilityTier::ALL {
            let config = SelectConfig::new(32, tier);
            let Some((gpu, mut renderer)) = headless(&config) else {
                continue;
            };
            renderer.set_clear_color(0.0, 0.0, 1.0, 1.0);
            renderer
                .bind_texture(&gpu, 31, &Texture::solid([255, 0, 0, 255]))
                .unwrap();

            // Left half samples slot 31; right half carries the sentinel.
            let instances = [
                GraphicInstance::new(0.0, 0.0, 2.0, 4.0, 31),
                GraphicInstance::new(2.0, 0.0, 2.0, 4.0, NO_TEXTURE),
            ];
            renderer.prepare(&gpu, &instances, &CameraUniform::orthographic(4.0, 4.0));
            let pixels = renderer.render_offscreen(&gpu, 4, 4).unwrap();

            assert_eq!(pixels.len(), 4 * 4 * 4);
            for row in pixels.chunks_exact(16) {
                assert_eq!(&row[0..4], &[255, 0, 0, 255], "{tier}: selected");
                assert_eq!(&row[12..16], &[0, 0, 255, 255], "{tier}: discarded");
            }
        }
    }
}
