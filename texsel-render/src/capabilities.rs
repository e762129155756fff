//! What a capability tier asks of the wgpu device.
//!
//! Both tiers bind the textures as a `binding_array`. Indexing it with a
//! per-fragment value is what needs the non-uniform indexing feature; the
//! case-dispatch tier only ever uses literal indices.

use texsel_core::{CapabilityTier, SelectConfig};
use wgpu::{Features, Limits};

use crate::context::GpuError;

/// Device features the stage needs for `tier`.
pub fn required_features(tier: CapabilityTier) -> Features {
    match tier {
        CapabilityTier::CaseDispatch => Features::TEXTURE_BINDING_ARRAY,
        CapabilityTier::DirectIndex => {
            Features::TEXTURE_BINDING_ARRAY
                | Features::SAMPLED_TEXTURE_AND_STORAGE_BUFFER_ARRAY_NON_UNIFORM_INDEXING
        }
    }
}

/// Limits to request for `capacity` slots, starting from `base`.
///
/// Every slot is one sampled texture and one sampler in the fragment stage.
pub fn required_limits(capacity: u32, base: Limits) -> Limits {
    Limits {
        max_sampled_textures_per_shader_stage: base
            .max_sampled_textures_per_shader_stage
            .max(capacity),
        max_samplers_per_shader_stage: base.max_samplers_per_shader_stage.max(capacity),
        ..base
    }
}

/// Check that an adapter with `features` and `limits` can build the stage
/// described by `config`.
pub fn check_support(features: Features, limits: &Limits, config: &SelectConfig) -> Result<(), GpuError> {
    let missing = required_features(config.tier) - features;
    if !missing.is_empty() {
        return Err(GpuError::MissingFeatures {
            tier: config.tier,
            missing,
        });
    }

    if limits.max_sampled_textures_per_shader_stage < config.capacity {
        return Err(GpuError::LimitTooLow {
            limit: "max_sampled_textures_per_shader_stage",
            available: limits.max_sampled_textures_per_shader_stage,
            required: config.capacity,
        });
    }
    if limits.max_samplers_per_shader_stage < config.capacity {
        return Err(GpuError::LimitTooLow {
            limit: "max_samplers_per_shader_stage",
            available: limits.max_samplers_per_shader_stage,
            required: config.capacity,
        });
    }

    Ok(())
}

// ===================================================================
// Tests
// ===================================================================
