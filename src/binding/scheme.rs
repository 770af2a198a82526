//! Binding and enrichment schemes.
//!
//! Both are immutable lookup tables loaded from JSON. Every canonical input
//! named by a table is checked against the MaterialX node it targets when
//! the table is loaded, so a typo in a scheme fails at load time instead of
//! silently dropping textures later.

use std::fmt;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use standard_surface::ShaderNode;

use crate::metadata::LibraryTag;
use crate::util::{Error, Result};

/// Default binding scheme shipped with the crate.
pub const BUILTIN_PARAMETERS_SCHEMA: &str = include_str!("../../schemas/parameters_schema.json");

/// Default enrichment scheme shipped with the crate.
pub const BUILTIN_INPUTS_SCHEMA: &str = include_str!("../../schemas/inputs_schema.json");

/// Shading stage a texture is wired into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShaderStage {
    /// `mtlxstandard_surface`, material output 0
    Surface,
    /// `mtlxdisplacement`, material output 1
    Displacement,
}

impl ShaderStage {
    /// MaterialX node backing this stage.
    pub fn shader_node(self) -> ShaderNode {
        match self {
            Self::Surface => ShaderNode::StandardSurface,
            Self::Displacement => ShaderNode::Displacement,
        }
    }

    /// Input of the material output node this stage feeds.
    pub fn output_index(self) -> usize {
        match self {
            Self::Surface => 0,
            Self::Displacement => 1,
        }
    }

    /// Lowercase name, as used in scheme files.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Surface => "surface",
            Self::Displacement => "displacement",
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

fn validate_inputs<'a>(
    stage: ShaderStage,
    inputs: impl IntoIterator<Item = &'a String>,
) -> Result<()> {
    let node = stage.shader_node();
    for input in inputs {
        if !node.has_input(input) {
            return Err(Error::UnknownInput {
                stage: stage.to_string(),
                input: input.clone(),
            });
        }
    }
    Ok(())
}

/// Vendor slot → canonical surface input, for one render target.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotBindings {
    slots: IndexMap<String, String>,
}

impl SlotBindings {
    /// Build from `(slot, input)` pairs, validating inputs.
    pub fn from_pairs<S: Into<String>, I: Into<String>>(
        pairs: impl IntoIterator<Item = (S, I)>,
    ) -> Result<Self> {
        let slots: IndexMap<String, String> = pairs
            .into_iter()
            .map(|(s, i)| (s.into(), i.into()))
            .collect();
        validate_inputs(ShaderStage::Surface, slots.values())?;
        Ok(Self { slots })
    }

    /// Canonical input for a vendor slot.
    pub fn input_for(&self, slot: &str) -> Option<&str> {
        self.slots.get(slot).map(|s| s.as_str())
    }

    /// Iterate `(slot, input)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.slots.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of mapped slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Render target id → slot bindings.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BindingScheme {
    targets: IndexMap<String, SlotBindings>,
}

impl BindingScheme {
    /// Parse and validate a scheme document.
    pub fn from_json(text: &str) -> Result<Self> {
        let scheme: Self = serde_json::from_str(text)?;
        for bindings in scheme.targets.values() {
            validate_inputs(ShaderStage::Surface, bindings.slots.values())?;
        }
        Ok(scheme)
    }

    /// Load from a file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::FileNotFound(path.to_path_buf()),
            _ => e.into(),
        })?;
        Self::from_json(&text)
    }

    /// Scheme embedded in the crate.
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_PARAMETERS_SCHEMA)
    }

    /// Load from `path` if given, otherwise the built-in scheme.
    pub fn load_or_builtin(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Self::builtin(),
        }
    }

    /// Add or replace the bindings of a render target, validating inputs.
    pub fn insert(&mut self, target: impl Into<String>, bindings: SlotBindings) -> Result<()> {
        validate_inputs(ShaderStage::Surface, bindings.slots.values())?;
        self.targets.insert(target.into(), bindings);
        Ok(())
    }

    /// Bindings for a render target.
    pub fn target(&self, target: &str) -> Result<&SlotBindings> {
        self.targets
            .get(target)
            .ok_or_else(|| Error::UnknownRenderTarget(target.to_string()))
    }

    /// Known render target ids.
    pub fn targets(&self) -> impl Iterator<Item = &str> {
        self.targets.keys().map(|k| k.as_str())
    }
}

/// Synthetic slot key → input, per stage, for one library.
///
/// Keys are filename suffix tokens (e.g. `height`) substituted into a known
/// texture path of the same material.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentTables {
    /// Extra surface textures (ambient occlusion and the like).
    #[serde(default)]
    pub surface: IndexMap<String, String>,
    /// Displacement textures.
    #[serde(default)]
    pub displacement: IndexMap<String, String>,
}

impl EnrichmentTables {
    /// Table for a stage.
    pub fn table(&self, stage: ShaderStage) -> &IndexMap<String, String> {
        match stage {
            ShaderStage::Surface => &self.surface,
            ShaderStage::Displacement => &self.displacement,
        }
    }

    fn validate(&self) -> Result<()> {
        validate_inputs(ShaderStage::Surface, self.surface.values())?;
        validate_inputs(ShaderStage::Displacement, self.displacement.values())
    }
}

/// Library tag → enrichment tables.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnrichmentScheme {
    libraries: IndexMap<LibraryTag, EnrichmentTables>,
}

impl EnrichmentScheme {
    /// Parse and validate a scheme document.
    pub fn from_json(text: &str) -> Result<Self> {
        let scheme: Self = serde_json::from_str(text)?;
        for tables in scheme.libraries.values() {
            tables.validate()?;
        }
        Ok(scheme)
    }

    /// Load from a file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::FileNotFound(path.to_path_buf()),
            _ => e.into(),
        })?;
        Self::from_json(&text)
    }

    /// Scheme embedded in the crate.
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_INPUTS_SCHEMA)
    }

    /// Load from `path` if given, otherwise the built-in scheme.
    pub fn load_or_builtin(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Self::builtin(),
        }
    }

    /// Add or replace the tables of a library, validating inputs.
    pub fn insert(&mut self, tag: impl Into<LibraryTag>, tables: EnrichmentTables) -> Result<()> {
        tables.validate()?;
        self.libraries.insert(tag.into(), tables);
        Ok(())
    }

    /// Tables for a library, if it has any.
    pub fn library(&self, tag: &LibraryTag) -> Option<&EnrichmentTables> {
        self.libraries.get(tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_schemes_load() {
        let bindings = BindingScheme::builtin().unwrap();
        let kb = bindings.target("KB").unwrap();
        assert_eq!(kb.input_for("basecolor_texture"), Some("base_color"));
        assert_eq!(kb.input_for("unknown_texture"), None);
        assert!(bindings.targets().any(|t| t == "MS"));

        let enrich = EnrichmentScheme::builtin().unwrap();
        let kb = enrich.library(&LibraryTag::new("KB")).unwrap();
        assert_eq!(kb.displacement.get("height").map(String::as_str), Some("displacement"));
    }

    #[test]
    fn test_unknown_target() {
        let bindings = BindingScheme::builtin().unwrap();
        assert!(matches!(bindings.target("arnold"), Err(Error::UnknownRenderTarget(_))));
    }

    #[test]
    fn test_unknown_surface_input_rejected() {
        let err = BindingScheme::from_json(r#"{"KB": {"basecolor_texture": "albedo"}}"#)
            .unwrap_err();
        match err {
            Error::UnknownInput { stage, input } => {
                assert_eq!(stage, "surface");
                assert_eq!(input, "albedo");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_insert_validates_target_bindings() {
        let mut bindings = BindingScheme::builtin().unwrap();
        let bad: SlotBindings = serde_json::from_str(r#"{"basecolor_texture": "albedo"}"#).unwrap();
        let err = bindings.insert("arnold", bad).unwrap_err();
        assert!(matches!(err, Error::UnknownInput { ref input, .. } if input == "albedo"));
        assert!(bindings.target("arnold").is_err());

        let good = SlotBindings::from_pairs([("basecolor_texture", "base_color")]).unwrap();
        bindings.insert("arnold", good).unwrap();
        assert_eq!(bindings.target("arnold").unwrap().input_for("basecolor_texture"), Some("base_color"));
    }

    #[test]
    fn test_displacement_inputs_checked_against_displacement_node() {
        // base_color is a surface input, not a displacement one
        let err = EnrichmentScheme::from_json(
            r#"{"KB": {"displacement": {"height": "base_color"}}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, Error::UnknownInput { ref stage, .. } if stage == "displacement"));
    }

    #[test]
    fn test_enrichment_tables_default_empty() {
        let scheme = EnrichmentScheme::from_json(r#"{"XX": {}}"#).unwrap();
        let tables = scheme.library(&"XX".into()).unwrap();
        assert!(tables.table(ShaderStage::Surface).is_empty());
        assert!(tables.table(ShaderStage::Displacement).is_empty());
        assert!(scheme.library(&"KB".into()).is_none());
    }

    #[test]
    fn test_slot_bindings_from_pairs() {
        let b = SlotBindings::from_pairs([("basecolor_texture", "base_color")]).unwrap();
        assert_eq!(b.len(), 1);
        assert!(SlotBindings::from_pairs([("x", "nope")]).is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = BindingScheme::load(dir.path().join("none.json")).unwrap_err();
        assert!(matches!(err, Error::FileNotFound(_)));
    }

    #[test]
    fn test_stage_helpers() {
        assert_eq!(ShaderStage::Surface.output_index(), 0);
        assert_eq!(ShaderStage::Displacement.output_index(), 1);
        assert_eq!(ShaderStage::Displacement.to_string(), "displacement");
    }
}
