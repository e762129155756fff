//! # texsel-render
//!
//! wgpu host for the texture-select stage: many independently-sourced
//! graphics, one draw call.
//!
//! ## Architecture
//!
//! ```text
//!  SelectConfig (texsel-core)
//!       │
//!       ▼
//!  GpuContext::new_headless / new_with_surface   ◀─── requests tier features
//!       │
//!       ▼
//!  Renderer.bind_texture(slot, texture)          ◀─── fills GpuTextureArray
//!       │
//!       ▼
//!  bridge::collect_instances()                   ◀─── placements → GraphicInstance
//!       │
//!       ▼
//!  Renderer.prepare(instances)                   ◀─── uploads to GPU
//!       │
//!       ▼
//!  Renderer.render_to_surface()                  ◀─── single draw call
//! ```
//!
//! ## Crate modules
//!
//! - [`capabilities`]: tier → wgpu features and limits
//! - [`context`]: GPU device/queue/surface initialisation
//! - [`vertex`]: vertex, instance, and camera data types
//! - [`binding`]: the GPU texture array
//! - [`pipelines`]: the texture-select render pipeline
//! - [`renderer`]: high-level frame orchestration
//! - [`bridge`]: graphic placements → GPU instances

pub mod binding;
pub mod bridge;
pub mod capabilities;
pub mod context;
pub mod pipelines;
pub mod renderer;
pub mod vertex;

// Re-exports for convenience
pub use binding::{BindingError, GpuTextureArray};
pub use bridge::{collect_instances, GraphicPlacement};
pub use context::{GpuContext, GpuError};
pub use pipelines::{PipelineError, TextureSelectPipeline};
pub use renderer::{FrameStats, RenderError, Renderer};
pub use vertex::{CameraUniform, GraphicInstance};
