//! Asset metadata records and the JSON store that holds them.
//!
//! ## Key Concepts
//!
//! - **AssetMetadata**: one geometry source file, its name and materials
//! - **MaterialEntry**: raw vendor texture slots captured from one material
//! - **MetadataStore**: whole-document JSON file keyed by library tag, then
//!   by source path
//!
//! ## Example
//!
//! ```ignore
//! use usd_template::metadata::{MetadataStore, LibraryTag};
//!
//! let store = MetadataStore::open("assets_metadata.json")?;
//! for (source, asset) in store.document().library(&LibraryTag::new("KB"))? {
//!     println!("{} -> {}", source, asset.asset_name);
//! }
//! ```

mod model;
mod store;

pub use model::*;
pub use store::*;
