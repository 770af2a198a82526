//! Texture binding resolver.
//!
//! Turns the captured textures of one material into an ordered list of
//! texture → shader input bindings, optionally adding textures derived by
//! suffix substitution from a captured one.

use serde::Serialize;
use standard_surface::DEFAULT_DISPLACEMENT_SCALE;

use super::{EnrichmentTables, ShaderStage, SlotBindings};
use crate::metadata::TextureMap;
use crate::util::naming::patch_texture;

/// Which optional enrichment passes to run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ResolveFlags {
    /// Derive extra surface textures (e.g. ambient occlusion).
    pub add_extra_textures: bool,
    /// Derive displacement textures and set the displacement scale.
    pub add_displacement: bool,
}

/// Where a bound texture came from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BindingOrigin {
    /// Captured from the source material under this slot name.
    Captured { slot: String },
    /// Synthesized by swapping the suffix of `from` for `key`.
    Synthesized { key: String, from: String },
}

/// One texture to wire into one shader input.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BindingAction {
    /// Texture file path.
    pub texture: String,
    /// Canonical input name on the stage node.
    pub input: String,
    /// Stage node receiving the texture.
    pub stage: ShaderStage,
    /// Provenance.
    pub origin: BindingOrigin,
}

impl BindingAction {
    /// Check if the texture path was derived rather than captured.
    pub fn is_synthesized(&self) -> bool {
        matches!(self.origin, BindingOrigin::Synthesized { .. })
    }
}

/// Ordered bindings for one material.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct BindingPlan {
    /// Captured bindings, then extra surface bindings, then displacement.
    pub actions: Vec<BindingAction>,
    /// Captured slots with no mapping in the scheme.
    pub skipped: Vec<String>,
    /// Scale to set on the displacement stage, if displacement was bound.
    pub displacement_scale: Option<f64>,
}

impl BindingPlan {
    /// Bindings targeting one stage.
    pub fn stage_actions(&self, stage: ShaderStage) -> impl Iterator<Item = &BindingAction> {
        self.actions.iter().filter(move |a| a.stage == stage)
    }

    /// Check if nothing will be bound.
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

/// Resolve the bindings of one material.
///
/// Unmapped slots are skipped and logged. Enrichment needs at least one
/// captured texture to derive from and is skipped otherwise.
pub fn resolve(
    textures: &TextureMap,
    bindings: &SlotBindings,
    enrichment: Option<&EnrichmentTables>,
    flags: ResolveFlags,
) -> BindingPlan {
    let mut plan = BindingPlan::default();

    for (slot, path) in textures {
        match bindings.input_for(slot) {
            Some(input) => {
                tracing::debug!("bind {} -> {}", path, input);
                plan.actions.push(BindingAction {
                    texture: path.clone(),
                    input: input.to_string(),
                    stage: ShaderStage::Surface,
                    origin: BindingOrigin::Captured { slot: slot.clone() },
                });
            }
            None => {
                tracing::warn!("texture skipped {} (no mapping for slot {})", path, slot);
                plan.skipped.push(slot.clone());
            }
        }
    }

    let passes = [
        (flags.add_extra_textures, ShaderStage::Surface),
        (flags.add_displacement, ShaderStage::Displacement),
    ];
    if !passes.iter().any(|(on, _)| *on) {
        return plan;
    }

    let Some(tables) = enrichment else {
        tracing::warn!("no enrichment tables for library, extra textures skipped");
        return plan;
    };
    let Some((_, representative)) = textures.first() else {
        tracing::warn!("material has no textures to derive extra textures from");
        return plan;
    };

    for (enabled, stage) in passes {
        if !enabled {
            continue;
        }
        for (key, input) in tables.table(stage) {
            let texture = patch_texture(representative, key);
            tracing::debug!("derive {} -> {} ({})", texture, input, stage);
            plan.actions.push(BindingAction {
                texture,
                input: input.clone(),
                stage,
                origin: BindingOrigin::Synthesized {
                    key: key.clone(),
                    from: representative.clone(),
                },
            });
            if stage == ShaderStage::Displacement {
                plan.displacement_scale = Some(DEFAULT_DISPLACEMENT_SCALE);
            }
        }
    }

    plan
}
