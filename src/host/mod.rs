//! Host node-graph collaborator.
//!
//! Extraction and template assembly only talk to the host through
//! [`NodeGraph`]. [`MemoryGraph`] is an in-process implementation used for
//! dry runs, tests and serialized scenes.

mod memory;

pub use memory::*;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::util::{Error, Result};

/// Handle of a node inside one graph.
pub type NodeId = usize;

/// Typed parameter value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParmValue {
    /// Toggle
    Bool(bool),
    /// Integer / menu index
    Int(i64),
    /// Float
    Float(f64),
    /// String / file path / expression
    String(String),
}

impl ParmValue {
    /// Value as the host would evaluate it to a string.
    pub fn eval_string(&self) -> String {
        match self {
            Self::Bool(b) => (if *b { "1" } else { "0" }).to_string(),
            Self::Int(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::String(s) => s.clone(),
        }
    }

    /// Get as float if possible.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f64),
            Self::String(s) => s.parse().ok(),
            Self::Bool(_) => None,
        }
    }

    /// Get as bool if possible.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Int(i) => Some(*i != 0),
            _ => None,
        }
    }
}

impl fmt::Display for ParmValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "{:?}", s),
            other => f.write_str(&other.eval_string()),
        }
    }
}

impl From<bool> for ParmValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for ParmValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<usize> for ParmValue {
    fn from(v: usize) -> Self {
        Self::Int(v as i64)
    }
}

impl From<f64> for ParmValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<f32> for ParmValue {
    fn from(v: f32) -> Self {
        Self::Float(v as f64)
    }
}

impl From<&str> for ParmValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for ParmValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

/// Node-graph operations consumed from the host.
///
/// Every mutating call blocks until the host has applied it. Failures are
/// reported as [`Error::Host`] and are never retried.
pub trait NodeGraph {
    /// Resolve an absolute node path.
    fn node(&self, path: &str) -> Option<NodeId>;

    /// Absolute path of a node.
    fn node_path(&self, id: NodeId) -> Result<String>;

    /// Name of a node (last path segment).
    fn node_name(&self, id: NodeId) -> Result<String>;

    /// Operator type name (e.g. `file`, `principledshader::2.0`).
    fn node_type(&self, id: NodeId) -> Result<String>;

    /// Connected input nodes, in input order.
    fn inputs(&self, id: NodeId) -> Result<Vec<NodeId>>;

    /// Child nodes.
    fn children(&self, id: NodeId) -> Result<Vec<NodeId>>;

    /// Create a node under `parent`. Without a name the host picks one.
    fn create_node(&mut self, parent: NodeId, node_type: &str, name: Option<&str>) -> Result<NodeId>;

    /// Parent of a node, `None` for the root.
    fn parent(&self, id: NodeId) -> Result<Option<NodeId>>;

    /// Wire `source` into input `index` of `id`.
    fn set_input(&mut self, id: NodeId, index: usize, source: NodeId) -> Result<()>;

    /// Wire `source` into the first free input of `id`.
    fn set_next_input(&mut self, id: NodeId, source: NodeId) -> Result<()>;

    /// Index of a named input, if the node has it.
    fn input_index(&self, id: NodeId, input_name: &str) -> Result<Option<usize>>;

    /// Set a parameter.
    fn set_parm(&mut self, id: NodeId, name: &str, value: ParmValue) -> Result<()>;

    /// Evaluate a parameter as a string. Unset parameters evaluate empty.
    fn eval_parm(&self, id: NodeId, name: &str) -> Result<String>;

    /// Names of all parameters on a node.
    fn parm_names(&self, id: NodeId) -> Result<Vec<String>>;

    /// Press a button parameter (e.g. `execute` on a ROP). Runs synchronously.
    fn press_button(&mut self, id: NodeId, name: &str) -> Result<()>;

    /// Mark a subnet as a material.
    fn set_material_flag(&mut self, id: NodeId, on: bool) -> Result<()>;

    /// Set the display flag.
    fn set_display_flag(&mut self, id: NodeId, on: bool) -> Result<()>;

    /// Destroy a node and everything below it.
    fn destroy(&mut self, id: NodeId) -> Result<()>;

    /// Per-primitive values of a string attribute on the node's cooked geometry.
    fn prim_string_attrib_values(&self, id: NodeId, attrib: &str) -> Result<Vec<String>>;

    /// Resolve a path or fail.
    fn require(&self, path: &str) -> Result<NodeId> {
        self.node(path)
            .ok_or_else(|| Error::host(format!("node not found: {}", path)))
    }

    /// Child by name.
    fn child(&self, id: NodeId, name: &str) -> Result<Option<NodeId>> {
        for c in self.children(id)? {
            if self.node_name(c)? == name {
                return Ok(Some(c));
            }
        }
        Ok(None)
    }

    /// Create a sibling of `source` wired to its output.
    fn create_output_node(&mut self, source: NodeId, node_type: &str) -> Result<NodeId> {
        let parent = self
            .parent(source)?
            .ok_or_else(|| Error::host("cannot create a sibling of the root node"))?;
        let node = self.create_node(parent, node_type, None)?;
        self.set_input(node, 0, source)?;
        Ok(node)
    }

    /// Create a sibling of `target` wired into its input `index`.
    fn create_input_node(&mut self, target: NodeId, index: usize, node_type: &str) -> Result<NodeId> {
        let parent = self
            .parent(target)?
            .ok_or_else(|| Error::host("cannot create a sibling of the root node"))?;
        let node = self.create_node(parent, node_type, None)?;
        self.set_input(target, index, node)?;
        Ok(node)
    }

    /// Set several parameters in order.
    fn set_parms(&mut self, id: NodeId, parms: &[(&str, ParmValue)]) -> Result<()> {
        for (name, value) in parms {
            self.set_parm(id, name, value.clone())?;
        }
        Ok(())
    }
}
