//! JSON metadata store shared by all assets of all library tags.
//!
//! Layout: `{tag: {source_path: AssetMetadata}}`. The whole document is read,
//! mutated in memory and rewritten on save. Saves go through a temporary
//! file in the target directory followed by a rename, so a reader never sees
//! a partially written document. Concurrent writers still race: the last
//! save wins.

use std::io::Write;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use super::{AssetMetadata, LibraryTag};
use crate::util::{Error, Result};

/// Source path → asset record for one library.
pub type LibraryAssets = IndexMap<String, AssetMetadata>;

/// In-memory form of the metadata document.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetadataDocument {
    libraries: IndexMap<LibraryTag, LibraryAssets>,
}

impl MetadataDocument {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from JSON text. Blank text is an empty document.
    pub fn from_json(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::new());
        }
        Ok(serde_json::from_str(text)?)
    }

    /// Serialize with 4-space indentation.
    pub fn to_json(&self) -> Result<String> {
        let mut buf = Vec::new();
        let fmt = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, fmt);
        self.serialize(&mut ser)?;
        buf.push(b'\n');
        String::from_utf8(buf).map_err(|e| Error::other(e.to_string()))
    }

    /// Library tags in document order.
    pub fn tags(&self) -> impl Iterator<Item = &LibraryTag> {
        self.libraries.keys()
    }

    /// Check if a tag has an entry.
    pub fn contains_tag(&self, tag: &LibraryTag) -> bool {
        self.libraries.contains_key(tag)
    }

    /// Number of top-level tags.
    pub fn len(&self) -> usize {
        self.libraries.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.libraries.is_empty()
    }

    /// Assets of a library.
    pub fn library(&self, tag: &LibraryTag) -> Result<&LibraryAssets> {
        self.libraries
            .get(tag)
            .ok_or_else(|| Error::TagNotFound(tag.to_string()))
    }

    /// Assets of a library, created empty on first use.
    pub fn library_mut(&mut self, tag: &LibraryTag) -> &mut LibraryAssets {
        self.libraries.entry(tag.clone()).or_default()
    }

    /// Look up one asset.
    pub fn asset(&self, tag: &LibraryTag, source_path: &str) -> Result<&AssetMetadata> {
        self.library(tag)?
            .get(source_path)
            .ok_or_else(|| Error::AssetNotFound {
                tag: tag.to_string(),
                source_path: source_path.to_string(),
            })
    }

    /// Replace the record for a source path. Returns the previous record.
    ///
    /// Nothing from a previous record survives: materials missing from the
    /// new record are gone.
    pub fn upsert(
        &mut self,
        tag: &LibraryTag,
        source_path: impl Into<String>,
        asset: AssetMetadata,
    ) -> Option<AssetMetadata> {
        self.library_mut(tag).insert(source_path.into(), asset)
    }

    /// Remove an asset record.
    pub fn remove(&mut self, tag: &LibraryTag, source_path: &str) -> Option<AssetMetadata> {
        self.libraries.get_mut(tag)?.shift_remove(source_path)
    }
}

/// Metadata document bound to a file on disk.
#[derive(Debug)]
pub struct MetadataStore {
    path: PathBuf,
    doc: MetadataDocument,
}

impl MetadataStore {
    /// Open a store. A missing file is an empty store; it is created on save.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let doc = match std::fs::read_to_string(&path) {
            Ok(text) => MetadataDocument::from_json(&text)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("metadata store {} missing, starting empty", path.display());
                MetadataDocument::new()
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, doc })
    }

    /// Open a store that must already exist.
    pub fn open_existing(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }
        Self::open(path)
    }

    /// Backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current document.
    pub fn document(&self) -> &MetadataDocument {
        &self.doc
    }

    /// Mutable document. Changes are not written until [`save`](Self::save).
    pub fn document_mut(&mut self) -> &mut MetadataDocument {
        &mut self.doc
    }

    /// Rewrite the whole document atomically.
    pub fn save(&self) -> Result<()> {
        let json = self.doc.to_json()?;
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(json.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| Error::Persist {
            path: self.path.clone(),
            source: e.error,
        })?;

        tracing::debug!("saved metadata store {}", self.path.display());
        Ok(())
    }

    /// Re-read the document from disk, dropping unsaved changes.
    pub fn reload(&mut self) -> Result<()> {
        *self = Self::open(&self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::MaterialEntry;

    fn asset(name: &str, materials: &[&str]) -> AssetMetadata {
        let mut a = AssetMetadata::new(name);
        for m in materials {
            a.materials.insert(m.to_string(), MaterialEntry::new(format!("/mat/{m}")));
        }
        a
    }

    #[test]
    fn test_missing_tag_is_initialized() {
        let mut doc = MetadataDocument::new();
        let tag = LibraryTag::new("KB");
        assert!(matches!(doc.library(&tag), Err(Error::TagNotFound(_))));

        doc.upsert(&tag, "/lib/a.bgeo", asset("a", &["wood"]));
        assert_eq!(doc.len(), 1);
        assert!(doc.contains_tag(&tag));
        assert_eq!(doc.library(&tag).unwrap().len(), 1);
    }

    #[test]
    fn test_upsert_overwrites_not_merges() {
        let mut doc = MetadataDocument::new();
        let tag = LibraryTag::new("KB");
        doc.upsert(&tag, "/lib/a.bgeo", asset("a", &["wood", "metal"]));
        let prev = doc.upsert(&tag, "/lib/a.bgeo", asset("a", &["wood"]));

        assert_eq!(prev.unwrap().materials.len(), 2);
        let stored = doc.asset(&tag, "/lib/a.bgeo").unwrap();
        assert_eq!(stored.material_names().collect::<Vec<_>>(), vec!["wood"]);
    }

    #[test]
    fn test_asset_not_found() {
        let mut doc = MetadataDocument::new();
        let tag = LibraryTag::new("MS");
        doc.library_mut(&tag);
        let err = doc.asset(&tag, "/nope").unwrap_err();
        assert!(matches!(err, Error::AssetNotFound { .. }));
    }

    #[test]
    fn test_json_indent_and_order() {
        let mut doc = MetadataDocument::new();
        doc.upsert(&"MS".into(), "/z.fbx", asset("z", &[]));
        doc.upsert(&"KB".into(), "/a.bgeo", asset("a", &[]));
        let json = doc.to_json().unwrap();

        assert!(json.starts_with("{\n    \"MS\""));
        assert!(json.find("\"MS\"").unwrap() < json.find("\"KB\"").unwrap());

        let back = MetadataDocument::from_json(&json).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn test_blank_document() {
        assert!(MetadataDocument::from_json("  \n").unwrap().is_empty());
        assert!(MetadataDocument::from_json("{}").unwrap().is_empty());
        assert!(MetadataDocument::from_json("[1]").is_err());
    }

    #[test]
    fn test_store_save_and_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meta").join("assets_metadata.json");

        let mut store = MetadataStore::open(&path).unwrap();
        assert!(store.document().is_empty());
        store
            .document_mut()
            .upsert(&"KB".into(), "/lib/a.bgeo", asset("a", &["wood"]));
        store.save().unwrap();

        let reopened = MetadataStore::open_existing(&path).unwrap();
        assert_eq!(reopened.document(), store.document());
    }

    #[test]
    fn test_open_existing_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = MetadataStore::open_existing(dir.path().join("none.json")).unwrap_err();
        assert!(matches!(err, Error::FileNotFound(_)));
    }

    #[test]
    fn test_reload_drops_unsaved() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("m.json");
        let mut store = MetadataStore::open(&path).unwrap();
        store.save().unwrap();
        store.document_mut().upsert(&"KB".into(), "/x", asset("x", &[]));
        store.reload().unwrap();
        assert!(store.document().is_empty());
    }
}
