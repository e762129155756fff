//! wgpu render pipelines.
pub mod graphics;
pub use graphics::{compose_shader, PipelineError, TextureSelectPipeline, MAX_GRAPHIC_INSTANCES};
