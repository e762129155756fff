//! GPU vertex and instance data types for the graphics pipeline.
//!
//! All types derive `bytemuck::Pod` + `Zeroable` for zero-copy upload
//! to GPU buffers.

use bytemuck::{Pod, Zeroable};
use texsel_core::NO_TEXTURE;
use wgpu::{BufferAddress, VertexAttribute, VertexBufferLayout, VertexFormat, VertexStepMode};

// ───────────────────────────────────────────────────────────────────
// Vertex (unit quad)
// ───────────────────────────────────────────────────────────────────

/// A single vertex of the unit quad (0,0)→(1,1).
///
/// The quad is shared across ALL graphic instances.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct QuadVertex {
    /// Position in [0, 1] space.
    pub position: [f32; 2],
}

impl QuadVertex {
    /// The 4 vertices of a unit quad.
    pub const VERTICES: [QuadVertex; 4] = [
        QuadVertex { position: [0.0, 0.0] }, // top-left
        QuadVertex { position: [1.0, 0.0] }, // top-right
        QuadVertex { position: [0.0, 1.0] }, // bottom-left
        QuadVertex { position: [1.0, 1.0] }, // bottom-right
    ];

    /// Two triangles covering the unit quad.
    pub const INDICES: [u16; 6] = [0, 1, 2, 2, 1, 3];

    pub fn layout() -> VertexBufferLayout<'static> {
        static ATTRS: &[VertexAttribute] = &[
            // location(0) = position
            VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: VertexFormat::Float32x2,
            },
        ];
        VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadVertex>() as BufferAddress,
            step_mode: VertexStepMode::Vertex,
            attributes: ATTRS,
        }
    }
}

// ───────────────────────────────────────────────────────────────────
// Instance data
// ───────────────────────────────────────────────────────────────────

/// Per-instance data for one graphic quad.
///
/// 48 bytes per instance. `tex_id` selects the texture slot and reaches
/// the fragment stage flat (never interpolated).
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct GraphicInstance {
    /// World-space position of the quad top-left, in pixels.
    pub position: [f32; 2],
    /// Width and height in pixels.
    pub size: [f32; 2],
    /// Texture coordinate at the top-left corner.
    pub uv_min: [f32; 2],
    /// Texture coordinate at the bottom-right corner.
    pub uv_max: [f32; 2],
    /// Texture slot, or any id past the array (e.g. `NO_TEXTURE`) to discard.
    pub tex_id: u32,
    /// Padding for 16-byte alignment.
    pub _pad: [u32; 3],
}

impl GraphicInstance {
    /// A quad showing the whole texture in `tex_id`.
    pub fn new(x: f32, y: f32, w: f32, h: f32, tex_id: u32) -> Self {
        Self {
            position: [x, y],
            size: [w, h],
            uv_min: [0.0, 0.0],
            uv_max: [1.0, 1.0],
            tex_id,
            _pad: [0; 3],
        }
    }

    /// A quad whose fragments are all discarded.
    pub fn empty(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self::new(x, y, w, h, NO_TEXTURE)
    }

    pub fn with_uv(mut self, uv_min: [f32; 2], uv_max: [f32; 2]) -> Self {
        self.uv_min = uv_min;
        self.uv_max = uv_max;
        self
    }

    pub fn layout() -> VertexBufferLayout<'static> {
        static ATTRS: &[VertexAttribute] = &[
            // location(1) = position
            VertexAttribute {
                offset: 0,
                shader_location: 1,
                format: VertexFormat::Float32x2,
            },
            // location(2) = size
            VertexAttribute {
                offset: 8,
                shader_location: 2,
                format: VertexFormat::Float32x2,
            },
            // location(3) = uv_min
            VertexAttribute {
                offset: 16,
                shader_location: 3,
                format: VertexFormat::Float32x2,
            },
            // location(4) = uv_max
            VertexAttribute {
                offset: 24,
                shader_location: 4,
                format: VertexFormat::Float32x2,
            },
            // location(5) = tex_id
            VertexAttribute {
                offset: 32,
                shader_location: 5,
                format: VertexFormat::Uint32,
            },
        ];
        VertexBufferLayout {
            array_stride: std::mem::size_of::<GraphicInstance>() as BufferAddress,
            step_mode: VertexStepMode::Instance,
            attributes: ATTRS,
        }
    }
}

// ───────────────────────────────────────────────────────────────────
// Camera uniform
// ───────────────────────────────────────────────────────────────────

/// Camera/viewport uniform sent to the GPU once per frame.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct CameraUniform {
    /// 4×4 orthographic projection matrix (column-major).
    pub view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
    /// Orthographic projection for a `width × height` pixel viewport.
    ///
    /// Maps (0,0) to top-left, (width, height) to bottom-right.
    pub fn orthographic(width: f32, height: f32) -> Self {
        let sx = 2.0 / width;
        let sy = -2.0 / height; // flip Y for top-left origin

        Self {
            view_proj: [
                [sx,   0.0, 0.0, 0.0],
                [0.0,  sy,  0.0, 0.0],
                [0.0,  0.0, 1.0, 0.0],
                [-1.0, 1.0, 0.0, 1.0],
            ],
        }
    }
}

// ===================================================================
// Tests
// ===================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn project(cam: &CameraUniform, x: f32, y: f32) -> (f32, f32) {
        let vp = cam.view_proj;
        (
            x * vp[0][0] + y * vp[1][0] + vp[3][0],
            x * vp[0][1] + y * vp[1][1] + vp[3][1],
        )
    }

    #[test]
    fn test_graphic_instance_size() {
        assert_eq!(std::mem::size_of::<GraphicInstance>(), 48);
        assert_eq!(std::mem::size_of::<QuadVertex>(), 8);
        assert_eq!(std::mem::size_of::<CameraUniform>(), 64);
    }

    #[test]
    fn test_graphic_instance_builder() {
        let inst = GraphicInstance::new(10.0, 20.0, 64.0, 32.0, 7).with_uv([0.25, 0.0], [0.75, 0.5]);
        assert_eq!(inst.position, [10.0, 20.0]);
        assert_eq!(inst.size, [64.0, 32.0]);
        assert_eq!(inst.uv_min, [0.25, 0.0]);
        assert_eq!(inst.uv_max, [0.75, 0.5]);
        assert_eq!(inst.tex_id, 7);
        assert_eq!(GraphicInstance::empty(0.0, 0.0, 1.0, 1.0).tex_id, NO_TEXTURE);
    }

    #[test]
    fn test_instance_layout_locations() {
        let layout = GraphicInstance::layout();
        assert_eq!(layout.attributes.len(), 5);
        assert_eq!(layout.attributes[0].shader_location, 1); // position
        assert_eq!(layout.attributes[3].shader_location, 4); // uv_max
        assert_eq!(layout.attributes[4].shader_location, 5); // tex_id
        assert_eq!(layout.attributes[4].format, VertexFormat::Uint32);
        assert_eq!(layout.step_mode, VertexStepMode::Instance);
    }

    #[test]
    fn test_tex_id_offset_matches_layout() {
        let inst = GraphicInstance::new(0.0, 0.0, 0.0, 0.0, 0xDEAD_BEEF);
        let bytes = bytemuck::bytes_of(&inst);
        let offset = GraphicInstance::layout().attributes[4].offset as usize;
        let tex_id = u32::from_ne_bytes(bytes[offset..offset + 4].try_into().unwrap());
        assert_eq!(tex_id, 0xDEAD_BEEF);
    }

    #[test]
    fn test_camera_maps_viewport_corners() {
        let cam = CameraUniform::orthographic(800.0, 600.0);
        let (x, y) = project(&cam, 0.0, 0.0);
        assert!((x + 1.0).abs() < 1e-5 && (y - 1.0).abs() < 1e-5);
        let (x, y) = project(&cam, 800.0, 600.0);
        assert!((x - 1.0).abs() < 1e-5 && (y + 1.0).abs() < 1e-5);
        let (x, y) = project(&cam, 400.0, 300.0);
        assert!(x.abs() < 1e-5 && y.abs() < 1e-5);
    }

    #[test]
    fn test_quad_layout() {
        let layout = QuadVertex::layout();
        assert_eq!(layout.attributes.len(), 1);
        assert_eq!(layout.attributes[0].shader_location, 0);
        assert_eq!(layout.step_mode, VertexStepMode::Vertex);
        assert_eq!(QuadVertex::INDICES.len(), 6);
    }
}
