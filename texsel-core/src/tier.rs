//! Capability tiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Which lowering of the texture-select stage a target can compile.
///
/// The tier is chosen once per shader build. Both tiers produce identical
/// output for identical inputs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CapabilityTier {
    /// Target allows indexing a sampler array with a runtime value.
    #[default]
    DirectIndex,
    /// Target only allows constant indices; every slot gets its own branch.
    CaseDispatch,
}

impl CapabilityTier {
    pub const ALL: [CapabilityTier; 2] = [CapabilityTier::DirectIndex, CapabilityTier::CaseDispatch];

    pub fn as_str(self) -> &'static str {
        match self {
            CapabilityTier::DirectIndex => "direct-index",
            CapabilityTier::CaseDispatch => "case-dispatch",
        }
    }
}

impl fmt::Display for CapabilityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CapabilityTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "direct-index" | "direct" => Ok(CapabilityTier::DirectIndex),
            "case-dispatch" | "case" => Ok(CapabilityTier::CaseDispatch),
            other => Err(format!("unknown capability tier `{other}`")),
        }
    }
}
