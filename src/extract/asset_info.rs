//! Asset names and thumbnails derived from the files next to a source.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::metadata::LibraryTag;
use crate::util::naming::{asset_name_from_path, parent_dir, sidecar_key};
use crate::util::Result;

/// Token marking review images (thumbnails) next to a source file.
pub const REVIEW_TOKEN: &str = "review";

/// Key holding the display name in a sidecar record.
pub const SIDECAR_NAME_KEY: &str = "name";

/// How asset names are derived.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NameSource {
    /// File name without directory and extension.
    #[default]
    Path,
    /// `"name"` of `<dir>/<first token>.json`, falling back to the path.
    Sidecar,
}

impl NameSource {
    /// Default for a library: Megascans ships sidecar records, others don't.
    pub fn for_tag(tag: &LibraryTag) -> Self {
        if tag.as_str() == LibraryTag::MS {
            Self::Sidecar
        } else {
            Self::Path
        }
    }
}

/// Why a sidecar record could not provide a name.
#[derive(Error, Debug)]
pub enum SidecarError {
    /// No sidecar file next to the source
    #[error("sidecar not found: {0}")]
    NotFound(PathBuf),

    /// Sidecar exists but is not valid JSON
    #[error("sidecar {path} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Sidecar has no string `name` entry
    #[error("sidecar {0} has no \"name\" string")]
    MissingKey(PathBuf),

    /// Any other I/O failure; not recovered
    #[error("sidecar {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Sidecar location for a source file: `<dir>/<first underscore token>.json`.
pub fn sidecar_path(source: &str) -> PathBuf {
    let dir = parent_dir(source);
    let file = format!("{}.json", sidecar_key(source));
    if dir.is_empty() {
        PathBuf::from(file)
    } else {
        Path::new(dir).join(file)
    }
}

/// Read the display name from the sidecar record of a source file.
pub fn read_sidecar_name(source: &str) -> std::result::Result<String, SidecarError> {
    let path = sidecar_path(source);
    let text = match std::fs::read_to_string(&path) {
        Ok(t) => t,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(SidecarError::NotFound(path));
        }
        Err(source) => return Err(SidecarError::Io { path, source }),
    };
    let value: serde_json::Value = match serde_json::from_str(&text) {
        Ok(v) => v,
        Err(source) => return Err(SidecarError::Parse { path, source }),
    };
    value
        .get(SIDECAR_NAME_KEY)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or(SidecarError::MissingKey(path))
}

/// Asset name for a source file.
///
/// A missing sidecar, an unparsable one, or one without a name falls back to
/// the path-derived name with a warning. Other I/O errors are returned.
pub fn asset_name(source: &str, name_source: NameSource) -> Result<String> {
    let fallback = asset_name_from_path(source).to_string();
    if name_source == NameSource::Path {
        return Ok(fallback);
    }
    match read_sidecar_name(source) {
        Ok(name) => Ok(name),
        Err(SidecarError::Io { source, .. }) => Err(source.into()),
        Err(e @ SidecarError::NotFound(_)) => {
            tracing::warn!("{}, using {}", e, fallback);
            Ok(fallback)
        }
        Err(e @ SidecarError::Parse { .. }) => {
            tracing::warn!("{}, using {}", e, fallback);
            Ok(fallback)
        }
        Err(e @ SidecarError::MissingKey(_)) => {
            tracing::warn!("{}, using {}", e, fallback);
            Ok(fallback)
        }
    }
}

/// First review image in the directory of a source file.
///
/// Matches file names containing `review` in any case. Candidates are taken
/// in file-name order so the pick does not depend on directory listing order.
/// A missing or unreadable directory has no thumbnail.
pub fn find_thumbnail(source: &str) -> Option<String> {
    let dir = parent_dir(source);
    let dir = if dir.is_empty() { Path::new(".") } else { Path::new(dir) };
    find_review_image(dir).map(|p| p.to_string_lossy().into_owned())
}

/// First file in `dir` whose name contains `review` in any case.
pub fn find_review_image(dir: &Path) -> Option<PathBuf> {
    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(e) => {
            tracing::debug!("no thumbnail scan in {}: {}", dir.display(), e);
            return None;
        }
    };
    let mut candidates: Vec<String> = entries
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
        .filter_map(|e| e.file_name().into_string().ok())
        .filter(|name| name.to_lowercase().contains(REVIEW_TOKEN))
        .collect();
    candidates.sort();
    candidates.into_iter().next().map(|name| dir.join(name))
}
