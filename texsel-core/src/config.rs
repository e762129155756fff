//! Stage configuration.
//!
//! `SelectConfig` is shared by everything that must agree on the texture
//! array: the shader emitters, the CPU reference, and the host binding
//! logic in `texsel-render`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::slot::{DEFAULT_CAPACITY, MAX_CAPACITY};
use crate::tier::CapabilityTier;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Texture array capacity must be at least 1")]
    ZeroCapacity,
    #[error("Texture array capacity {0} exceeds the maximum of {max}", max = MAX_CAPACITY)]
    CapacityTooLarge(u32),
    #[error("Invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Build-time parameters of the texture-select stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectConfig {
    /// Number of texture slots (`N_MAX`).
    pub capacity: u32,
    /// Lowering used when the stage is built.
    pub tier: CapabilityTier,
}

impl Default for SelectConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            tier: CapabilityTier::default(),
        }
    }
}

impl SelectConfig {
    pub fn new(capacity: u32, tier: CapabilityTier) -> Self {
        Self { capacity, tier }
    }

    /// Same capacity, different tier.
    pub fn with_tier(self, tier: CapabilityTier) -> Self {
        Self { tier, ..self }
    }

    /// Parse a JSON document such as `{"capacity": 16, "tier": "case-dispatch"}`.
    ///
    /// Missing fields take their defaults. The result is validated.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: SelectConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match self.capacity {
            0 => Err(ConfigError::ZeroCapacity),
            n if n > MAX_CAPACITY => Err(ConfigError::CapacityTooLarge(n)),
            _ => Ok(()),
        }
    }
}

// ===================================================================
// Tests
// ===================================================================
