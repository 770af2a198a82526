//! Utility types and functions shared across the crate.
//!
//! - [`Error`] / [`Result`] - Error handling
//! - [`naming`] - Path and naming conventions for assets, materials and textures

mod error;
pub mod naming;

pub use error::*;
