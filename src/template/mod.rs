//! USD import templates.
//!
//! A template is a chain of stage nodes that reads one geometry file, builds
//! a MaterialX network per material, assigns the materials and writes a USD
//! file:
//!
//! ```text
//! primitive ──┐
//!             graftstages → materiallibrary → assignmaterial [→ xform] → usd_rop
//! sopcreate ──┘
//! ```
//!
//! [`LibraryVariant`] selects the per-library differences (wrangle snippet,
//! primitive pattern, unit scale).

mod builder;

pub use builder::*;

use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;

use crate::binding::{BindingPlan, ResolveFlags};
use crate::host::NodeId;
use crate::metadata::LibraryTag;
use crate::util::naming::ROOT_PRIM;

/// Default stage network templates are built in.
pub const DEFAULT_STAGE_PATH: &str = "/stage";

/// Default binding scheme target.
pub const DEFAULT_RENDER_TARGET: &str = "KB";

/// Centimeter to meter scale applied to MS geometry.
pub const MS_UNIT_SCALE: f64 = 0.01;

const KB_WRANGLE: &str = "string split[] = split(s@shop_materialpath, '/');\ns@path = split[-1];";
const MS_WRANGLE: &str = "s@path = s@name;";

/// Template topology of a library.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum LibraryVariant {
    /// Kitbash: one prim per material, assigned by material name prefix.
    Kb,
    /// Megascans: every material assigned to all prims, scaled to meters.
    Ms,
}

impl LibraryVariant {
    /// Variant for a known library tag.
    pub fn from_tag(tag: &LibraryTag) -> Option<Self> {
        match tag.as_str() {
            LibraryTag::KB => Some(Self::Kb),
            LibraryTag::MS => Some(Self::Ms),
            _ => None,
        }
    }

    /// Primitive wrangle setting `s@path` before partitioning.
    pub fn wrangle_code(self) -> &'static str {
        match self {
            Self::Kb => KB_WRANGLE,
            Self::Ms => MS_WRANGLE,
        }
    }

    /// Prim pattern a material is assigned to.
    ///
    /// `container` is the name of the SOP import node, which is also the
    /// name of the two prim levels it creates under the root prim.
    pub fn prim_pattern(self, container: &str, material: &str) -> String {
        let base = format!("{}/{}/{}", ROOT_PRIM, container, container);
        match self {
            Self::Kb => format!("{}/{}*", base, material),
            Self::Ms => format!("{}/*", base),
        }
    }

    /// Uniform scale applied after material assignment, if any.
    pub fn unit_scale(self) -> Option<f64> {
        match self {
            Self::Kb => None,
            Self::Ms => Some(MS_UNIT_SCALE),
        }
    }
}

impl fmt::Display for LibraryVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Kb => LibraryTag::KB,
            Self::Ms => LibraryTag::MS,
        })
    }
}

/// Template assembly settings.
#[derive(Clone, Debug, PartialEq)]
pub struct TemplateOptions {
    /// Topology override; derived from the library tag when `None`.
    pub variant: Option<LibraryVariant>,
    /// Binding scheme target used to map captured slots.
    pub render_target: String,
    /// Bind derived displacement textures.
    pub add_displacement: bool,
    /// Bind derived extra surface textures.
    pub add_extra_textures: bool,
    /// Write the USD file and remove the template afterwards.
    pub execute_rop: bool,
    /// Network the template nodes are created in.
    pub stage_path: String,
}

impl Default for TemplateOptions {
    fn default() -> Self {
        Self {
            variant: None,
            render_target: DEFAULT_RENDER_TARGET.to_string(),
            add_displacement: true,
            add_extra_textures: false,
            execute_rop: false,
            stage_path: DEFAULT_STAGE_PATH.to_string(),
        }
    }
}

impl TemplateOptions {
    /// Resolver flags for these options.
    pub fn resolve_flags(&self) -> ResolveFlags {
        ResolveFlags {
            add_extra_textures: self.add_extra_textures,
            add_displacement: self.add_displacement,
        }
    }
}

/// Nodes and decisions of one assembled template.
///
/// After an executed build the node ids are stale: the template has been
/// destroyed.
#[derive(Clone, Debug, Serialize)]
pub struct Template {
    /// Asset name from the metadata record.
    pub asset_name: String,
    /// Library variant the template was built as.
    pub variant: LibraryVariant,
    /// SOP import container holding the geometry read.
    pub sop_create: NodeId,
    /// Root primitive definition.
    pub primitive: NodeId,
    /// Grafts the geometry under the root primitive.
    pub graft: NodeId,
    /// Material library holding one subnet per material.
    pub material_library: NodeId,
    /// Material assignment by primitive pattern.
    pub assign: NodeId,
    /// Unit scale transform, present for variants that need one.
    pub transform: Option<NodeId>,
    /// USD output driver.
    pub usd_rop: NodeId,
    /// USD file the ROP writes.
    pub output_path: String,
    /// Binding plan per material, in material order.
    pub plans: IndexMap<String, BindingPlan>,
    /// ROP was executed and the nodes destroyed.
    pub executed: bool,
}

impl Template {
    /// Top-level stage nodes in creation order.
    pub fn nodes(&self) -> Vec<NodeId> {
        let mut nodes = vec![
            self.sop_create,
            self.primitive,
            self.graft,
            self.material_library,
            self.assign,
        ];
        nodes.extend(self.transform);
        nodes.push(self.usd_rop);
        nodes
    }

    /// Captured slots skipped across all materials.
    pub fn skipped_slots(&self) -> impl Iterator<Item = (&str, &str)> {
        self.plans
            .iter()
            .flat_map(|(mat, plan)| plan.skipped.iter().map(move |s| (mat.as_str(), s.as_str())))
    }
}
