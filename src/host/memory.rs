//! In-memory node graph.
//!
//! Models the subset of host behavior templates and extraction depend on:
//! path addressing, automatic naming, input wiring, default children of
//! container nodes, named MaterialX inputs, and cooking of per-primitive
//! string attributes through `pack` and `merge` nodes.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::{NodeGraph, NodeId, ParmValue};
use crate::util::{Error, Result};

/// Per-primitive string attributes: attribute name → one value per primitive.
pub type PrimAttribs = IndexMap<String, Vec<String>>;

#[derive(Clone, Debug, Serialize, Deserialize)]
struct MemNode {
    name: String,
    node_type: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    inputs: SmallVec<[Option<NodeId>; 4]>,
    parms: IndexMap<String, ParmValue>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    prim_attribs: PrimAttribs,
    material_flag: bool,
    display_flag: bool,
}

impl MemNode {
    fn new(name: &str, node_type: &str, parent: Option<NodeId>) -> Self {
        Self {
            name: name.to_string(),
            node_type: node_type.to_string(),
            parent,
            children: Vec::new(),
            inputs: SmallVec::new(),
            parms: IndexMap::new(),
            prim_attribs: PrimAttribs::new(),
            material_flag: false,
            display_flag: false,
        }
    }
}

/// One node of a serialized scene.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneNode {
    /// Absolute path. Missing parents are created as plain networks.
    pub path: String,
    /// Operator type name.
    #[serde(rename = "type")]
    pub node_type: String,
    /// Parameter values.
    #[serde(default)]
    pub parms: IndexMap<String, ParmValue>,
    /// Absolute paths of input nodes, in input order.
    #[serde(default)]
    pub inputs: Vec<String>,
    /// Geometry the node cooks to, for source nodes.
    #[serde(default)]
    pub prim_attribs: PrimAttribs,
}

/// Serialized scene: a flat node list. Inputs may refer to later nodes.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneDescription {
    /// Nodes to create.
    pub nodes: Vec<SceneNode>,
}

/// Node graph held entirely in memory.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MemoryGraph {
    nodes: Vec<Option<MemNode>>,
    /// Paths of ROPs executed through `press_button("execute")`, in order.
    executed: Vec<String>,
}

impl Default for MemoryGraph {
    fn default() -> Self {
        Self::new()
    }
}

/// Root network contexts created by [`MemoryGraph::with_contexts`].
pub const CONTEXTS: &[(&str, &str)] = &[("obj", "objnet"), ("stage", "lopnet"), ("mat", "matnet")];

impl MemoryGraph {
    /// Empty graph with only the root node `/`.
    pub fn new() -> Self {
        Self {
            nodes: vec![Some(MemNode::new("", "root", None))],
            executed: Vec::new(),
        }
    }

    /// Graph with the standard `/obj`, `/stage` and `/mat` networks.
    pub fn with_contexts() -> Self {
        let mut g = Self::new();
        for (name, ty) in CONTEXTS {
            g.insert(0, ty, name);
        }
        g
    }

    /// Build a graph from a scene description.
    pub fn from_scene(scene: &SceneDescription) -> Result<Self> {
        let mut g = Self::with_contexts();
        let mut created = Vec::with_capacity(scene.nodes.len());
        for node in &scene.nodes {
            let id = g.ensure_path(&node.path, &node.node_type)?;
            let n = g.get_mut(id)?;
            n.parms = node.parms.clone();
            n.prim_attribs = node.prim_attribs.clone();
            created.push(id);
        }
        for (node, id) in scene.nodes.iter().zip(created) {
            for (index, input) in node.inputs.iter().enumerate() {
                let source = g.require(input)?;
                g.set_input(id, index, source)?;
            }
        }
        Ok(g)
    }

    /// Parse a scene description from JSON and build the graph.
    pub fn from_scene_json(text: &str) -> Result<Self> {
        let scene: SceneDescription = serde_json::from_str(text)?;
        Self::from_scene(&scene)
    }

    /// ROPs executed so far, as node paths.
    pub fn executed(&self) -> &[String] {
        &self.executed
    }

    /// Number of live nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    /// Check if only the root is left.
    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }

    /// Root node id.
    pub fn root(&self) -> NodeId {
        0
    }

    /// Attach per-primitive string attributes to a node.
    pub fn set_prim_attrib(&mut self, id: NodeId, attrib: &str, values: Vec<String>) -> Result<()> {
        self.get_mut(id)?.prim_attribs.insert(attrib.to_string(), values);
        Ok(())
    }

    /// Raw parameter value.
    pub fn parm(&self, id: NodeId, name: &str) -> Option<&ParmValue> {
        self.get(id).ok()?.parms.get(name)
    }

    /// Material flag state.
    pub fn material_flag(&self, id: NodeId) -> bool {
        self.get(id).map(|n| n.material_flag).unwrap_or(false)
    }

    /// Display flag state.
    pub fn display_flag(&self, id: NodeId) -> bool {
        self.get(id).map(|n| n.display_flag).unwrap_or(false)
    }

    /// Input slot contents, including unconnected gaps.
    pub fn input_slots(&self, id: NodeId) -> Vec<Option<NodeId>> {
        self.get(id).map(|n| n.inputs.to_vec()).unwrap_or_default()
    }

    /// Create (or find) a node at an absolute path. Missing parents become
    /// `network` nodes.
    pub fn ensure_path(&mut self, path: &str, node_type: &str) -> Result<NodeId> {
        if !path.starts_with('/') {
            return Err(Error::host(format!("node path must be absolute: {}", path)));
        }
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut current = self.root();
        for (i, seg) in segments.iter().enumerate() {
            let last = i + 1 == segments.len();
            current = match self.find_child(current, seg) {
                Some(id) => id,
                None => {
                    let ty = if last { node_type } else { "network" };
                    self.insert(current, ty, seg)
                }
            };
        }
        Ok(current)
    }

    /// Indented dump of the tree under `id`, one node per line.
    pub fn dump(&self, id: NodeId) -> Result<String> {
        let mut out = String::new();
        self.dump_into(id, 0, &mut out)?;
        Ok(out)
    }

    fn dump_into(&self, id: NodeId, depth: usize, out: &mut String) -> Result<()> {
        let node = self.get(id)?;
        let indent = "  ".repeat(depth);
        let name = if node.parent.is_none() { "/" } else { node.name.as_str() };
        out.push_str(&format!("{}{} [{}]", indent, name, node.node_type));

        let wired: Vec<String> = node
            .inputs
            .iter()
            .enumerate()
            .filter_map(|(i, src)| {
                let src = (*src)?;
                let name = self.get(src).ok()?.name.clone();
                Some(format!("{}<-{}", i, name))
            })
            .collect();
        if !wired.is_empty() {
            out.push_str(&format!(" inputs({})", wired.join(", ")));
        }
        out.push('\n');

        for (k, v) in &node.parms {
            out.push_str(&format!("{}    {} = {}\n", indent, k, v));
        }
        for &child in &node.children {
            self.dump_into(child, depth + 1, out)?;
        }
        Ok(())
    }

    fn get(&self, id: NodeId) -> Result<&MemNode> {
        self.nodes
            .get(id)
            .and_then(|n| n.as_ref())
            .ok_or_else(|| Error::host(format!("node {} does not exist", id)))
    }

    fn get_mut(&mut self, id: NodeId) -> Result<&mut MemNode> {
        self.nodes
            .get_mut(id)
            .and_then(|n| n.as_mut())
            .ok_or_else(|| Error::host(format!("node {} does not exist", id)))
    }

    fn find_child(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        let node = self.get(parent).ok()?;
        node.children
            .iter()
            .copied()
            .find(|&c| self.get(c).map(|n| n.name == name).unwrap_or(false))
    }

    fn insert(&mut self, parent: NodeId, node_type: &str, name: &str) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Some(MemNode::new(name, node_type, Some(parent))));
        if let Some(Some(p)) = self.nodes.get_mut(parent) {
            p.children.push(id);
        }
        id
    }

    /// First free `<base><n>` name under a parent.
    fn auto_name(&self, parent: NodeId, node_type: &str) -> String {
        let base = node_type.split("::").next().unwrap_or(node_type);
        (1..)
            .map(|n| format!("{}{}", base, n))
            .find(|name| self.find_child(parent, name).is_none())
            .unwrap_or_else(|| base.to_string())
    }

    /// Children a host creates along with certain container nodes.
    fn spawn_defaults(&mut self, id: NodeId, node_type: &str) {
        match node_type {
            "subnet" => {
                self.insert(id, "subinput", "subinput1");
                self.insert(id, "suboutput", "suboutput1");
            }
            "sopcreate" => {
                let sopnet = self.insert(id, "sopnet", "sopnet");
                self.insert(sopnet, "geo", "create");
            }
            _ => {}
        }
    }

    fn check_live(&self, id: NodeId) -> Result<()> {
        self.get(id).map(|_| ())
    }

    /// Cooked per-primitive attributes of a node.
    fn cook(&self, id: NodeId, depth: usize) -> Result<PrimAttribs> {
        if depth > self.nodes.len() {
            return Err(Error::CycleDetected(self.node_path(id)?));
        }
        let node = self.get(id)?;
        if !node.prim_attribs.is_empty() {
            return Ok(node.prim_attribs.clone());
        }
        let inputs: Vec<NodeId> = node.inputs.iter().flatten().copied().collect();

        match node.node_type.as_str() {
            "pack" => {
                let Some(&src) = inputs.first() else {
                    return Ok(PrimAttribs::new());
                };
                let upstream = self.cook(src, depth + 1)?;
                let by_name = node.parms.get("packbyname").and_then(|v| v.as_bool()).unwrap_or(false);
                if !by_name {
                    // One packed primitive for the whole input.
                    return Ok(upstream
                        .into_iter()
                        .map(|(k, v)| (k, v.into_iter().take(1).collect::<Vec<_>>()))
                        .collect());
                }
                let name_attr = node
                    .parms
                    .get("nameattribute")
                    .map(|v| v.eval_string())
                    .unwrap_or_else(|| "name".to_string());
                let mut packed: Vec<String> = Vec::new();
                for value in upstream.get(&name_attr).into_iter().flatten() {
                    if !packed.contains(value) {
                        packed.push(value.clone());
                    }
                }
                let mut out = PrimAttribs::new();
                out.insert(name_attr, packed);
                Ok(out)
            }
            "merge" => {
                let mut out = PrimAttribs::new();
                for src in inputs {
                    for (k, mut v) in self.cook(src, depth + 1)? {
                        out.entry(k).or_default().append(&mut v);
                    }
                }
                Ok(out)
            }
            _ => match inputs.first() {
                Some(&src) => self.cook(src, depth + 1),
                None => Ok(PrimAttribs::new()),
            },
        }
    }
}

impl NodeGraph for MemoryGraph {
    fn node(&self, path: &str) -> Option<NodeId> {
        if !path.starts_with('/') {
            return None;
        }
        path.split('/')
            .filter(|s| !s.is_empty())
            .try_fold(self.root(), |cur, seg| self.find_child(cur, seg))
    }

    fn node_path(&self, id: NodeId) -> Result<String> {
        let mut parts = Vec::new();
        let mut cur = Some(id);
        while let Some(c) = cur {
            let node = self.get(c)?;
            if node.parent.is_some() {
                parts.push(node.name.as_str());
            }
            cur = node.parent;
        }
        parts.reverse();
        Ok(format!("/{}", parts.join("/")))
    }

    fn node_name(&self, id: NodeId) -> Result<String> {
        Ok(self.get(id)?.name.clone())
    }

    fn node_type(&self, id: NodeId) -> Result<String> {
        Ok(self.get(id)?.node_type.clone())
    }

    fn inputs(&self, id: NodeId) -> Result<Vec<NodeId>> {
        Ok(self.get(id)?.inputs.iter().flatten().copied().collect())
    }

    fn children(&self, id: NodeId) -> Result<Vec<NodeId>> {
        Ok(self.get(id)?.children.clone())
    }

    fn create_node(&mut self, parent: NodeId, node_type: &str, name: Option<&str>) -> Result<NodeId> {
        self.check_live(parent)?;
        if node_type.is_empty() {
            return Err(Error::host("node type must not be empty"));
        }
        let name = match name {
            Some(n) if n.is_empty() || n.contains('/') => {
                return Err(Error::host(format!("invalid node name: {:?}", n)));
            }
            Some(n) => {
                if self.find_child(parent, n).is_some() {
                    return Err(Error::host(format!(
                        "node name already in use: {}/{}",
                        self.node_path(parent)?,
                        n
                    )));
                }
                n.to_string()
            }
            None => self.auto_name(parent, node_type),
        };
        let id = self.insert(parent, node_type, &name);
        self.spawn_defaults(id, node_type);
        tracing::trace!("created {} [{}]", self.node_path(id)?, node_type);
        Ok(id)
    }

    fn parent(&self, id: NodeId) -> Result<Option<NodeId>> {
        Ok(self.get(id)?.parent)
    }

    fn set_input(&mut self, id: NodeId, index: usize, source: NodeId) -> Result<()> {
        self.check_live(source)?;
        if id == source {
            return Err(Error::host("cannot wire a node into itself"));
        }
        let node = self.get_mut(id)?;
        if node.inputs.len() <= index {
            node.inputs.resize(index + 1, None);
        }
        node.inputs[index] = Some(source);
        Ok(())
    }

    fn set_next_input(&mut self, id: NodeId, source: NodeId) -> Result<()> {
        let index = {
            let node = self.get(id)?;
            node.inputs
                .iter()
                .position(|i| i.is_none())
                .unwrap_or(node.inputs.len())
        };
        self.set_input(id, index, source)
    }

    fn input_index(&self, id: NodeId, input_name: &str) -> Result<Option<usize>> {
        let node = self.get(id)?;
        Ok(standard_surface::input_index(&node.node_type, input_name))
    }

    fn set_parm(&mut self, id: NodeId, name: &str, value: ParmValue) -> Result<()> {
        self.get_mut(id)?.parms.insert(name.to_string(), value);
        Ok(())
    }

    fn eval_parm(&self, id: NodeId, name: &str) -> Result<String> {
        Ok(self
            .get(id)?
            .parms
            .get(name)
            .map(|v| v.eval_string())
            .unwrap_or_default())
    }

    fn parm_names(&self, id: NodeId) -> Result<Vec<String>> {
        Ok(self.get(id)?.parms.keys().cloned().collect())
    }

    fn press_button(&mut self, id: NodeId, name: &str) -> Result<()> {
        let node_type = self.node_type(id)?;
        match (node_type.as_str(), name) {
            ("usd_rop", "execute") => {
                let output = self.eval_parm(id, "lopoutput")?;
                if output.is_empty() {
                    return Err(Error::host(format!(
                        "{}: no output file set",
                        self.node_path(id)?
                    )));
                }
                if self.inputs(id)?.is_empty() {
                    return Err(Error::host(format!("{}: no input", self.node_path(id)?)));
                }
                let path = self.node_path(id)?;
                tracing::info!("executed {} -> {}", path, output);
                self.executed.push(path);
                Ok(())
            }
            _ => Err(Error::host(format!(
                "{} [{}] has no button {}",
                self.node_path(id)?,
                node_type,
                name
            ))),
        }
    }

    fn set_material_flag(&mut self, id: NodeId, on: bool) -> Result<()> {
        self.get_mut(id)?.material_flag = on;
        Ok(())
    }

    fn set_display_flag(&mut self, id: NodeId, on: bool) -> Result<()> {
        let parent = self.get(id)?.parent;
        if on {
            if let Some(p) = parent {
                for sibling in self.children(p)? {
                    self.get_mut(sibling)?.display_flag = false;
                }
            }
        }
        self.get_mut(id)?.display_flag = on;
        Ok(())
    }

    fn destroy(&mut self, id: NodeId) -> Result<()> {
        let parent = self.get(id)?.parent;
        if parent.is_none() {
            return Err(Error::host("cannot destroy the root node"));
        }

        let mut doomed = vec![id];
        let mut i = 0;
        while i < doomed.len() {
            let children = self.get(doomed[i])?.children.clone();
            doomed.extend(children);
            i += 1;
        }

        for &d in &doomed {
            self.nodes[d] = None;
        }
        for node in self.nodes.iter_mut().flatten() {
            node.children.retain(|c| !doomed.contains(c));
            for input in node.inputs.iter_mut() {
                if input.is_some_and(|src| doomed.contains(&src)) {
                    *input = None;
                }
            }
        }
        Ok(())
    }

    fn prim_string_attrib_values(&self, id: NodeId, attrib: &str) -> Result<Vec<String>> {
        let cooked = self.cook(id, 0)?;
        cooked.get(attrib).cloned().ok_or_else(|| {
            let path = self.node_path(id).unwrap_or_default();
            Error::host(format!("no primitive attribute {} on {}", attrib, path))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_and_auto_names() {
        let mut g = MemoryGraph::with_contexts();
        let stage = g.require("/stage").unwrap();
        let a = g.create_node(stage, "graftstages", None).unwrap();
        let b = g.create_node(stage, "graftstages", None).unwrap();
        assert_eq!(g.node_path(a).unwrap(), "/stage/graftstages1");
        assert_eq!(g.node_path(b).unwrap(), "/stage/graftstages2");
        assert_eq!(g.node("/stage/graftstages2"), Some(b));
        assert_eq!(g.node("stage"), None);

        let shader = g.create_node(stage, "principledshader::2.0", None).unwrap();
        assert_eq!(g.node_name(shader).unwrap(), "principledshader1");
    }

    #[test]
    fn test_duplicate_name_fails() {
        let mut g = MemoryGraph::with_contexts();
        let stage = g.require("/stage").unwrap();
        g.create_node(stage, "sopcreate", Some("crate")).unwrap();
        let err = g.create_node(stage, "sopcreate", Some("crate")).unwrap_err();
        assert!(matches!(err, Error::Host(_)));
    }

    #[test]
    fn test_default_children() {
        let mut g = MemoryGraph::with_contexts();
        let stage = g.require("/stage").unwrap();
        let sop = g.create_node(stage, "sopcreate", Some("crate")).unwrap();
        assert!(g.node("/stage/crate/sopnet/create").is_some());
        let sub = g.create_node(sop, "subnet", Some("wood")).unwrap();
        assert!(g.child(sub, "suboutput1").unwrap().is_some());
    }

    #[test]
    fn test_output_and_input_nodes() {
        let mut g = MemoryGraph::with_contexts();
        let stage = g.require("/stage").unwrap();
        let sub = g.create_node(stage, "subnet", Some("m")).unwrap();
        let out = g.child(sub, "suboutput1").unwrap().unwrap();
        let surf = g.create_input_node(out, 0, "mtlxstandard_surface").unwrap();
        let disp = g.create_input_node(out, 1, "mtlxdisplacement").unwrap();
        assert_eq!(g.input_slots(out), vec![Some(surf), Some(disp)]);
        assert_eq!(g.input_index(surf, "base_color").unwrap(), Some(1));
        assert_eq!(g.input_index(disp, "displacement").unwrap(), Some(0));
        assert_eq!(g.input_index(out, "base_color").unwrap(), None);

        let next = g.create_output_node(surf, "null").unwrap();
        assert_eq!(g.inputs(next).unwrap(), vec![surf]);
    }

    #[test]
    fn test_next_input_fills_gaps() {
        let mut g = MemoryGraph::with_contexts();
        let stage = g.require("/stage").unwrap();
        let a = g.create_node(stage, "null", None).unwrap();
        let b = g.create_node(stage, "null", None).unwrap();
        let graft = g.create_node(stage, "graftstages", None).unwrap();
        g.set_input(graft, 1, a).unwrap();
        g.set_next_input(graft, b).unwrap();
        assert_eq!(g.input_slots(graft), vec![Some(b), Some(a)]);
    }

    #[test]
    fn test_destroy_disconnects() {
        let mut g = MemoryGraph::with_contexts();
        let stage = g.require("/stage").unwrap();
        let sop = g.create_node(stage, "sopcreate", Some("a")).unwrap();
        let graft = g.create_node(stage, "graftstages", None).unwrap();
        g.set_input(graft, 0, sop).unwrap();
        let before = g.len();

        g.destroy(sop).unwrap();

        assert_eq!(g.len(), before - 3);
        assert!(g.node("/stage/a/sopnet/create").is_none());
        assert!(g.inputs(graft).unwrap().is_empty());
        assert!(g.destroy(g.root()).is_err());
        assert!(g.node_type(sop).is_err());
    }

    #[test]
    fn test_pack_cooks_distinct_names() {
        let mut g = MemoryGraph::with_contexts();
        let geo = g.ensure_path("/obj/geo1", "geo").unwrap();
        let file = g.create_node(geo, "file", None).unwrap();
        g.set_prim_attrib(
            file,
            "shop_materialpath",
            vec!["/mat/wood".into(), "/mat/metal".into(), "/mat/wood".into()],
        )
        .unwrap();
        let pack = g.create_output_node(file, "pack").unwrap();
        g.set_parm(pack, "packbyname", true.into()).unwrap();
        g.set_parm(pack, "nameattribute", "shop_materialpath".into()).unwrap();

        assert_eq!(
            g.prim_string_attrib_values(pack, "shop_materialpath").unwrap(),
            vec!["/mat/wood".to_string(), "/mat/metal".to_string()]
        );
        assert_eq!(g.prim_string_attrib_values(file, "shop_materialpath").unwrap().len(), 3);
        assert!(g.prim_string_attrib_values(pack, "name").is_err());
    }

    #[test]
    fn test_merge_concatenates() {
        let mut g = MemoryGraph::with_contexts();
        let geo = g.ensure_path("/obj/geo1", "geo").unwrap();
        let a = g.create_node(geo, "file", None).unwrap();
        let b = g.create_node(geo, "file", None).unwrap();
        g.set_prim_attrib(a, "name", vec!["x".into()]).unwrap();
        g.set_prim_attrib(b, "name", vec!["y".into()]).unwrap();
        let merge = g.create_node(geo, "merge", None).unwrap();
        g.set_next_input(merge, a).unwrap();
        g.set_next_input(merge, b).unwrap();
        assert_eq!(g.prim_string_attrib_values(merge, "name").unwrap(), vec!["x", "y"]);
    }

    #[test]
    fn test_rop_execute() {
        let mut g = MemoryGraph::with_contexts();
        let stage = g.require("/stage").unwrap();
        let rop = g.create_node(stage, "usd_rop", None).unwrap();
        assert!(g.press_button(rop, "execute").is_err());

        let src = g.create_node(stage, "null", None).unwrap();
        g.set_input(rop, 0, src).unwrap();
        g.set_parm(rop, "lopoutput", "/out/a.usd".into()).unwrap();
        g.press_button(rop, "execute").unwrap();
        assert_eq!(g.executed(), &["/stage/usd_rop1".to_string()]);
        assert!(g.press_button(src, "execute").is_err());
    }

    #[test]
    fn test_display_flag_is_exclusive() {
        let mut g = MemoryGraph::with_contexts();
        let stage = g.require("/stage").unwrap();
        let a = g.create_node(stage, "null", None).unwrap();
        let b = g.create_node(stage, "null", None).unwrap();
        g.set_display_flag(a, true).unwrap();
        g.set_display_flag(b, true).unwrap();
        assert!(!g.display_flag(a));
        assert!(g.display_flag(b));
    }

    #[test]
    fn test_scene_json() {
        let scene = r#"{
            "nodes": [
                {"path": "/obj/geo1/merge1", "type": "merge", "inputs": ["/obj/geo1/file1"]},
                {"path": "/obj/geo1/file1", "type": "file",
                 "parms": {"file": "/lib/a.bgeo"},
                 "prim_attribs": {"shop_materialpath": ["/mat/wood"]}}
            ]
        }"#;
        let g = MemoryGraph::from_scene_json(scene).unwrap();
        let merge = g.require("/obj/geo1/merge1").unwrap();
        let file = g.require("/obj/geo1/file1").unwrap();
        assert_eq!(g.inputs(merge).unwrap(), vec![file]);
        assert_eq!(g.eval_parm(file, "file").unwrap(), "/lib/a.bgeo");
        assert_eq!(g.eval_parm(file, "missing").unwrap(), "");
        assert_eq!(g.node_type(g.require("/obj/geo1").unwrap()).unwrap(), "network");
    }

    #[test]
    fn test_scene_with_dangling_input() {
        let scene = r#"{"nodes": [{"path": "/obj/a", "type": "null", "inputs": ["/obj/b"]}]}"#;
        assert!(matches!(MemoryGraph::from_scene_json(scene), Err(Error::Host(_))));
    }

    #[test]
    fn test_dump_lists_parms() {
        let mut g = MemoryGraph::with_contexts();
        let stage = g.require("/stage").unwrap();
        let prim = g.create_node(stage, "primitive", None).unwrap();
        g.set_parm(prim, "primpath", "/main".into()).unwrap();
        let dump = g.dump(stage).unwrap();
        assert!(dump.contains("primitive1 [primitive]"));
        assert!(dump.contains("primpath = \"/main\""));
    }
}
