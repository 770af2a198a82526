//! Persistent tool settings

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::template::{TemplateOptions, DEFAULT_RENDER_TARGET, DEFAULT_STAGE_PATH};

/// Settings that persist between runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Metadata store used when none is given
    pub metadata_file: Option<PathBuf>,

    // Scheme overrides (embedded defaults when unset)
    pub parameters_schema: Option<PathBuf>,
    pub inputs_schema: Option<PathBuf>,

    // Template
    pub stage_path: String,
    pub render_target: String,
    pub add_displacement: bool,
    pub add_extra_textures: bool,
    pub execute_rop: bool,
    pub remove_template: bool,

    // Recent stores (most recent first, max 10)
    pub recent_stores: Vec<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            metadata_file: None,
            parameters_schema: None,
            inputs_schema: None,
            stage_path: DEFAULT_STAGE_PATH.to_string(),
            render_target: DEFAULT_RENDER_TARGET.to_string(),
            add_displacement: true,
            add_extra_textures: false,
            execute_rop: false,
            remove_template: true,
            recent_stores: Vec::new(),
        }
    }
}

const MAX_RECENT_STORES: usize = 10;

impl Settings {
    /// Get settings file path
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut p| {
            p.push("usd-template");
            std::fs::create_dir_all(&p).ok();
            p.push("settings.json");
            p
        })
    }

    /// Load settings from file; defaults when missing or unreadable
    pub fn load() -> Self {
        let mut settings: Self = Self::path()
            .and_then(|p| std::fs::read_to_string(&p).ok())
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default();

        if settings.stage_path.is_empty() {
            settings.stage_path = DEFAULT_STAGE_PATH.to_string();
        }
        settings.recent_stores.truncate(MAX_RECENT_STORES);

        settings
    }

    /// Save settings to file
    pub fn save(&self) {
        let Some(path) = Self::path() else {
            return;
        };
        match serde_json::to_string_pretty(self) {
            Ok(json) => {
                if let Err(e) = std::fs::write(&path, json) {
                    tracing::warn!("failed to save settings to {}: {}", path.display(), e);
                }
            }
            Err(e) => tracing::warn!("failed to serialize settings: {}", e),
        }
    }

    /// Add store to recent list (moves to top if already present)
    pub fn add_recent(&mut self, path: PathBuf) {
        self.recent_stores.retain(|p| p != &path);
        self.recent_stores.insert(0, path.clone());
        self.recent_stores.truncate(MAX_RECENT_STORES);
        self.metadata_file = Some(path);
    }

    /// Get recent stores (filters out non-existent)
    pub fn recent_stores(&self) -> Vec<&PathBuf> {
        self.recent_stores.iter().filter(|p| p.exists()).collect()
    }

    /// Template options from the saved defaults
    pub fn template_options(&self) -> TemplateOptions {
        TemplateOptions {
            variant: None,
            render_target: self.render_target.clone(),
            add_displacement: self.add_displacement,
            add_extra_textures: self.add_extra_textures,
            execute_rop: self.execute_rop,
            stage_path: self.stage_path.clone(),
        }
    }
}
