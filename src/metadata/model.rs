//! Asset, material and library-tag records stored in the metadata document.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Identifier partitioning metadata by source vendor or library.
///
/// Tags are typed in by users, so any string is accepted. The two shipped
/// libraries have constants.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LibraryTag(String);

impl LibraryTag {
    /// KitBash3D library.
    pub const KB: &'static str = "KB";
    /// Megascans library.
    pub const MS: &'static str = "MS";

    /// Create a tag.
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// Tag as string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LibraryTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LibraryTag {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for LibraryTag {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Texture slot name → texture path, in capture order.
pub type TextureMap = IndexMap<String, String>;

/// Textures captured from one material of an asset.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MaterialEntry {
    /// Material node path inside the source scene graph.
    #[serde(default)]
    pub shop_materialpath: String,
    /// Raw vendor slot name (e.g. `basecolor_texture`) → file path.
    #[serde(default)]
    pub textures: TextureMap,
}

impl MaterialEntry {
    /// Create an entry with no textures.
    pub fn new(shop_materialpath: impl Into<String>) -> Self {
        Self {
            shop_materialpath: shop_materialpath.into(),
            textures: TextureMap::new(),
        }
    }

    /// Builder-style texture insert.
    pub fn with_texture(mut self, slot: impl Into<String>, path: impl Into<String>) -> Self {
        self.textures.insert(slot.into(), path.into());
        self
    }
}

/// Everything recorded for one geometry source file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetMetadata {
    /// Display / node name of the asset.
    pub asset_name: String,
    /// Review image found next to the source file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    /// Material name → captured textures, in discovery order.
    #[serde(default)]
    pub materials: IndexMap<String, MaterialEntry>,
}

impl AssetMetadata {
    /// Create an asset record with no materials.
    pub fn new(asset_name: impl Into<String>) -> Self {
        Self {
            asset_name: asset_name.into(),
            thumbnail: None,
            materials: IndexMap::new(),
        }
    }

    /// Material names in discovery order.
    pub fn material_names(&self) -> impl Iterator<Item = &str> {
        self.materials.keys().map(|k| k.as_str())
    }

    /// Total texture count across all materials.
    pub fn texture_count(&self) -> usize {
        self.materials.values().map(|m| m.textures.len()).sum()
    }
}
