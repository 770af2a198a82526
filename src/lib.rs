//! # USD Template
//!
//! Metadata-driven USD import templates for vendor geometry and material
//! libraries.
//!
//! Geometry libraries ship materials with vendor-specific texture slots.
//! This crate captures those slots per asset into a JSON metadata store,
//! maps them onto MaterialX Standard Surface inputs, and assembles a
//! node-graph template in the host that reads the geometry, rebuilds the
//! materials, assigns them and exports a USD file.
//!
//! ## Modules
//!
//! - [`metadata`] - Asset records and the JSON metadata store
//! - [`extract`] - Scene traversal and metadata capture
//! - [`binding`] - Slot → shader input schemes and the binding resolver
//! - [`template`] - KB / MS template assembly
//! - [`host`] - Node-graph trait and the in-memory graph
//! - [`batch`] - Progress and cancellation for batches
//! - [`settings`] - Persistent defaults
//! - [`util`] - Errors and naming conventions
//!
//! ## Example
//!
//! ```ignore
//! use usd_template::prelude::*;
//!
//! let store = MetadataStore::open("assets_metadata.json")?;
//! let bindings = BindingScheme::builtin()?;
//! let enrichment = EnrichmentScheme::builtin()?;
//! let mut graph = MemoryGraph::with_contexts();
//!
//! let mut builder = TemplateBuilder::new(&mut graph, &bindings, &enrichment, TemplateOptions::default());
//! builder.convert_all(store.document(), &LibraryTag::new("KB"), true, &mut LogMonitor::default())?;
//! ```

pub mod util;
pub mod metadata;
pub mod host;
pub mod binding;
pub mod extract;
pub mod template;
pub mod batch;
pub mod settings;

// Re-export commonly used types
pub use util::{Error, Result};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::util::{Error, Result};
    pub use crate::metadata::{AssetMetadata, LibraryTag, MaterialEntry, MetadataDocument, MetadataStore};
    pub use crate::host::{MemoryGraph, NodeGraph, NodeId, ParmValue};
    pub use crate::binding::{resolve, BindingPlan, BindingScheme, EnrichmentScheme, ResolveFlags, ShaderStage};
    pub use crate::extract::{ExtractOptions, Extractor, NameSource};
    pub use crate::template::{LibraryVariant, Template, TemplateBuilder, TemplateOptions};
    pub use crate::batch::{BatchMonitor, BatchReport, CancelFlag, LogMonitor, NoMonitor};
    pub use crate::settings::Settings;
}
