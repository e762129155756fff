//! # texsel-core
//!
//! Texture-select stage for batched graphics rendering.
//!
//! Every fragment of a batched draw carries a small integer (`tex_id`) that
//! picks its source image out of a bound array of textures. In-range ids
//! sample that slot; anything else is discarded. Two capability tiers lower
//! the same operation:
//!
//! ```text
//!  SelectConfig { capacity, tier }
//!       │
//!       ├── DirectIndex   ── textures[tex_id]            (runtime index)
//!       │
//!       └── CaseDispatch  ── DispatchTable::generate()   (one arm per slot)
//!                                 │
//!                                 ├── codegen  → WGSL / GLSL switch
//!                                 └── stage    → CPU reference backend
//! ```
//!
//! ## Crate modules
//!
//! - [`slot`]: slot indices, capacity constants, the "no texture" sentinel
//! - [`tier`]: capability tiers
//! - [`config`]: stage configuration and validation
//! - [`dispatch`]: the case-dispatch generator
//! - [`codegen`]: shader source emitters
//! - [`texture`]: CPU-side images and sampling
//! - [`stage`]: CPU reference of both variants
//! - [`raster`]: CPU framebuffer used for cross-tier comparisons

pub mod codegen;
pub mod config;
pub mod dispatch;
pub mod raster;
pub mod slot;
pub mod stage;
pub mod texture;
pub mod tier;

// Re-exports for convenience
pub use codegen::{generate_fragment_stage, ShaderLanguage};
pub use config::{ConfigError, SelectConfig};
pub use dispatch::{DispatchArm, DispatchError, DispatchTable};
pub use raster::{DrawStats, Framebuffer};
pub use slot::{SlotError, SlotIndex, DEFAULT_CAPACITY, MAX_CAPACITY, NO_TEXTURE};
pub use stage::{
    build_stage, CaseDispatch, DirectIndex, Fragment, FragmentOutput, Rgba, SamplerArray,
    TextureArrayBinding, TextureSelect,
};
pub use texture::{AddressMode, ColorType, FilterMode, SamplerConfig, Texture, TextureError};
pub use tier::CapabilityTier;
