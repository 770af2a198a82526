//! Texture-to-shader binding.
//!
//! - [`BindingScheme`] maps vendor slot names onto MaterialX inputs per
//!   render target
//! - [`EnrichmentScheme`] lists textures that can be derived from a
//!   captured one by suffix substitution, per library
//! - [`resolve`] produces the ordered [`BindingPlan`] for one material

mod resolve;
mod scheme;

pub use resolve::*;
pub use scheme::*;
