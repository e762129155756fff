//! Shader source emitters for the texture-select fragment stage.
//!
//! Both tiers are emitted from the same [`SelectConfig`], so they always
//! agree on the slot count and the discard rule. The case-dispatch body is
//! printed from a [`DispatchTable`].
//!
//! Derivatives are computed once, before any divergent branch, and every
//! sample uses explicit gradients. Implicit-derivative sampling is not
//! allowed inside a branch that depends on a per-fragment value.

use std::fmt;
use std::str::FromStr;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, SelectConfig};
use crate::dispatch::DispatchTable;
use crate::tier::CapabilityTier;

/// Target shading language.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShaderLanguage {
    /// WGSL for wgpu. Texture and sampler arrays live at `@group(1)`.
    #[default]
    Wgsl,
    /// Desktop GLSL with combined `sampler2D` arrays.
    Glsl,
}

impl fmt::Display for ShaderLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ShaderLanguage::Wgsl => "wgsl",
            ShaderLanguage::Glsl => "glsl",
        })
    }
}

impl FromStr for ShaderLanguage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "wgsl" => Ok(ShaderLanguage::Wgsl),
            "glsl" => Ok(ShaderLanguage::Glsl),
            other => Err(format!("unknown shader language `{other}`")),
        }
    }
}

/// Bind group holding the texture and sampler arrays in WGSL output.
pub const WGSL_TEXTURE_GROUP: u32 = 1;

/// Emit the fragment stage for `config.tier` in `language`.
pub fn generate_fragment_stage(
    config: &SelectConfig,
    language: ShaderLanguage,
) -> Result<String, ConfigError> {
    config.validate()?;

    let source = match (language, config.tier) {
        (ShaderLanguage::Wgsl, CapabilityTier::DirectIndex) => wgsl_direct(config.capacity),
        (ShaderLanguage::Wgsl, CapabilityTier::CaseDispatch) => {
            wgsl_case(&DispatchTable::generate(config.capacity))
        }
        (ShaderLanguage::Glsl, CapabilityTier::DirectIndex) => glsl_direct(config.capacity),
        (ShaderLanguage::Glsl, CapabilityTier::CaseDispatch) => {
            glsl_case(&DispatchTable::generate(config.capacity))
        }
    };

    debug!(
        "Generated {} fragment stage ({}, {} slots, {} bytes)",
        language,
        config.tier,
        config.capacity,
        source.len()
    );

    Ok(source)
}

fn banner(comment: &str, tier: CapabilityTier, capacity: u32) -> String {
    format!(
        "{comment} texsel fragment stage: {tier}, {capacity} slots.\n\
         {comment} Generated by texsel-core; regenerate instead of editing.\n"
    )
}

// ───────────────────────────────────────────────────────────────────
// WGSL
// ───────────────────────────────────────────────────────────────────

fn wgsl_prelude(tier: CapabilityTier, capacity: u32) -> String {
    let mut out = banner("//", tier, capacity);
    out.push('\n');
    out.push_str(&format!(
        "@group({WGSL_TEXTURE_GROUP}) @binding(0) var textures: binding_array<texture_2d<f32>, {capacity}>;\n\
         @group({WGSL_TEXTURE_GROUP}) @binding(1) var samplers: binding_array<sampler, {capacity}>;\n\
         \n\
         const TEXTURE_SLOTS: u32 = {capacity}u;\n\
         \n\
         struct FragmentInput {{\n\
         \x20   @location(0) tex_coords: vec2<f32>,\n\
         \x20   @location(1) @interpolate(flat) tex_id: u32,\n\
         }};\n\
         \n\
         @fragment\n\
         fn fs_main(in: FragmentInput) -> @location(0) vec4<f32> {{\n\
         \x20   let ddx = dpdx(in.tex_coords);\n\
         \x20   let ddy = dpdy(in.tex_coords);\n"
    ));
    out
}

fn wgsl_direct(capacity: u32) -> String {
    let mut out = wgsl_prelude(CapabilityTier::DirectIndex, capacity);
    out.push_str(
        "    if (in.tex_id >= TEXTURE_SLOTS) {\n\
         \x20       discard;\n\
         \x20   }\n\
         \x20   return textureSampleGrad(textures[in.tex_id], samplers[in.tex_id], in.tex_coords, ddx, ddy);\n\
         }\n",
    );
    out
}

fn wgsl_case(table: &DispatchTable) -> String {
    let mut out = wgsl_prelude(CapabilityTier::CaseDispatch, table.capacity());
    out.push_str("    var color: vec4<f32>;\n    switch in.tex_id {\n");
    for arm in table.arms() {
        let slot = arm.slot.get();
        out.push_str(&format!(
            "        case {label}u: {{\n\
             \x20           color = textureSampleGrad(textures[{slot}], samplers[{slot}], in.tex_coords, ddx, ddy);\n\
             \x20       }}\n",
            label = arm.label,
        ));
    }
    out.push_str(
        "        default: {\n\
         \x20           discard;\n\
         \x20       }\n\
         \x20   }\n\
         \x20   return color;\n\
         }\n",
    );
    out
}

// ───────────────────────────────────────────────────────────────────
// GLSL
// ───────────────────────────────────────────────────────────────────

/// Dynamically indexing a sampler array needs GLSL 4.00.
const GLSL_DIRECT_VERSION: &str = "#version 400 core";
const GLSL_CASE_VERSION: &str = "#version 330 core";

/// GLSL 4.00 only allows dynamically uniform sampler-array indices. A
/// per-fragment id is wrapped in `nonuniformEXT` when the driver has the
/// extension; otherwise the direct tier needs uniform ids per draw.
const GLSL_NONUNIFORM_EXTENSION: &str = "#extension GL_EXT_nonuniform_qualifier : enable";
const GLSL_SLOT_INDEX_MACRO: &str = "\
#ifdef GL_EXT_nonuniform_qualifier
#define SLOT_INDEX(i) nonuniformEXT(i)
#else
#define SLOT_INDEX(i) (i)
#endif
";

fn glsl_prelude(tier: CapabilityTier, capacity: u32) -> String {
    let version = match tier {
        CapabilityTier::DirectIndex => GLSL_DIRECT_VERSION,
        CapabilityTier::CaseDispatch => GLSL_CASE_VERSION,
    };

    let mut out = format!("{version}\n");
    if tier == CapabilityTier::DirectIndex {
        out.push_str(GLSL_NONUNIFORM_EXTENSION);
        out.push('\n');
    }
    out.push('\n');
    out.push_str(&banner("//", tier, capacity));
    out.push_str(&format!("\n#define TEXTURE_SLOTS {capacity}u\n"));
    if tier == CapabilityTier::DirectIndex {
        out.push_str(GLSL_SLOT_INDEX_MACRO);
    }
    out.push_str(&format!(
        "\n\
         flat in uint texId;\n\
         in vec2 texCoords;\n\
         \n\
         out vec4 fragColor;\n\
         \n\
         uniform sampler2D textures[{capacity}];\n\
         \n\
         void main() {{\n\
         \x20   vec2 ddx = dFdx(texCoords);\n\
         \x20   vec2 ddy = dFdy(texCoords);\n"
    ));
    out
}

fn glsl_direct(capacity: u32) -> String {
    let mut out = glsl_prelude(CapabilityTier::DirectIndex, capacity);
    out.push_str(
        "    if (texId >= TEXTURE_SLOTS) {\n\
         \x20       discard;\n\
         \x20   }\n\
         \x20   fragColor = textureGrad(textures[SLOT_INDEX(texId)], texCoords, ddx, ddy);\n\
         }\n",
    );
    out
}

fn glsl_case(table: &DispatchTable) -> String {
    let mut out = glsl_prelude(CapabilityTier::CaseDispatch, table.capacity());
    out.push_str("    switch (texId) {\n");
    for arm in table.arms() {
        out.push_str(&format!(
            "        case {label}u:\n\
             \x20           fragColor = textureGrad(textures[{slot}], texCoords, ddx, ddy);\n\
             \x20           break;\n",
            label = arm.label,
            slot = arm.slot.get(),
        ));
    }
    out.push_str(
        "        default:\n\
         \x20           discard;\n\
         \x20   }\n\
         }\n",
    );
    out
}

// ===================================================================
// Tests
// ===================================================================
