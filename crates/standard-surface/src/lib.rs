//! Autodesk Standard Surface input schema
//!
//! Port tables for the MaterialX nodes an import template wires textures
//! into, with lookups by name and by host node type.
//!
//! ## References
//! - [Autodesk Standard Surface](https://autodesk.github.io/standard-surface/)
//! - [MaterialX](https://github.com/AcademySoftwareFoundation/MaterialX)
//!
//! ## Usage
//!
//! ```
//! use standard_surface::ShaderNode;
//!
//! let idx = ShaderNode::StandardSurface.input_index("base_color");
//! assert_eq!(idx, Some(1));
//! ```

mod inputs;

pub use inputs::{
    InputType, ShaderInput, DEFAULT_DISPLACEMENT_SCALE, DISPLACEMENT_INPUTS,
    STANDARD_SURFACE_INPUTS,
};

/// Host node type of the surface shader.
pub const STANDARD_SURFACE_NODE: &str = "mtlxstandard_surface";

/// Host node type of the displacement shader.
pub const DISPLACEMENT_NODE: &str = "mtlxdisplacement";

/// Host node type of a texture reader.
pub const IMAGE_NODE: &str = "mtlximage";

/// MaterialX shading node with a known input layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShaderNode {
    /// `mtlxstandard_surface`
    StandardSurface,
    /// `mtlxdisplacement`
    Displacement,
}

impl ShaderNode {
    /// Resolve from a host node type name.
    pub fn from_node_type(node_type: &str) -> Option<Self> {
        match node_type {
            STANDARD_SURFACE_NODE => Some(Self::StandardSurface),
            DISPLACEMENT_NODE => Some(Self::Displacement),
            _ => None,
        }
    }

    /// Host node type name.
    pub fn node_type(self) -> &'static str {
        match self {
            Self::StandardSurface => STANDARD_SURFACE_NODE,
            Self::Displacement => DISPLACEMENT_NODE,
        }
    }

    /// All inputs in port order.
    pub fn inputs(self) -> &'static [ShaderInput] {
        match self {
            Self::StandardSurface => STANDARD_SURFACE_INPUTS,
            Self::Displacement => DISPLACEMENT_INPUTS,
        }
    }

    /// Port index of a named input.
    pub fn input_index(self, name: &str) -> Option<usize> {
        self.inputs().iter().position(|i| i.name == name)
    }

    /// Look up an input by name.
    pub fn input(self, name: &str) -> Option<&'static ShaderInput> {
        self.inputs().iter().find(|i| i.name == name)
    }

    /// Check whether the node exposes the named input.
    pub fn has_input(self, name: &str) -> bool {
        self.input_index(name).is_some()
    }
}

/// Port index of `name` on a host node type, if the type is known.
pub fn input_index(node_type: &str, name: &str) -> Option<usize> {
    ShaderNode::from_node_type(node_type)?.input_index(name)
}
