//! Template assembly against a host graph.

use indexmap::IndexMap;
use standard_surface::IMAGE_NODE;

use super::{LibraryVariant, Template, TemplateOptions};
use crate::batch::{BatchMonitor, BatchReport};
use crate::binding::{
    resolve, BindingAction, BindingPlan, BindingScheme, EnrichmentScheme, EnrichmentTables,
    ShaderStage, SlotBindings,
};
use crate::host::{NodeGraph, NodeId, ParmValue};
use crate::metadata::{AssetMetadata, LibraryTag, MaterialEntry, MetadataDocument};
use crate::util::naming::{
    material_spec_path, sanitize_node_name, usd_output_path, MATERIAL_ATTRIB, MATERIAL_PREFIX,
    ROOT_PRIM,
};
use crate::util::{Error, Result};

/// Node type carrying render properties on material output 2.
pub const MATERIAL_PROPERTIES_NODE: &str = "kma_material_properties";

/// Builds import templates in a stage network.
pub struct TemplateBuilder<'a, G: NodeGraph> {
    graph: &'a mut G,
    bindings: &'a BindingScheme,
    enrichment: &'a EnrichmentScheme,
    options: TemplateOptions,
}

impl<'a, G: NodeGraph> TemplateBuilder<'a, G> {
    /// Builder writing into `graph` with the given schemes.
    pub fn new(
        graph: &'a mut G,
        bindings: &'a BindingScheme,
        enrichment: &'a EnrichmentScheme,
        options: TemplateOptions,
    ) -> Self {
        Self {
            graph,
            bindings,
            enrichment,
            options,
        }
    }

    /// Options every template is built with.
    pub fn options(&self) -> &TemplateOptions {
        &self.options
    }

    /// Host graph the builder writes to.
    pub fn graph(&self) -> &G {
        self.graph
    }

    /// Build the template of one asset.
    ///
    /// The render target and variant are checked before any node is
    /// created. A host failure aborts the asset and leaves the nodes created
    /// so far in place.
    pub fn build(
        &mut self,
        tag: &LibraryTag,
        geometry_file: &str,
        asset: &AssetMetadata,
    ) -> Result<Template> {
        let variant = match self.options.variant {
            Some(v) => v,
            None => LibraryVariant::from_tag(tag)
                .ok_or_else(|| Error::other(format!("no template variant for library {}", tag)))?,
        };
        let (scheme, enrichment) = (self.bindings, self.enrichment);
        let bindings = scheme.target(&self.options.render_target)?;
        let enrichment = enrichment.library(tag);
        let stage = self.graph.require(&self.options.stage_path)?;

        tracing::debug!("building {} template for {}", variant, geometry_file);

        let sop_create = self.create_sop_read(stage, geometry_file, &asset.asset_name, variant)?;
        let container = self.graph.node_name(sop_create)?;
        let primitive = self.create_prim(stage)?;

        let graft = self.graph.create_node(stage, "graftstages", None)?;
        self.graph.set_input(graft, 0, primitive)?;
        self.graph.set_next_input(graft, sop_create)?;

        let material_library = self.graph.create_node(stage, "materiallibrary", None)?;
        self.graph
            .set_parm(material_library, "matpathprefix", MATERIAL_PREFIX.into())?;
        self.graph.set_input(material_library, 0, graft)?;

        let mut plans = IndexMap::new();
        for (name, entry) in &asset.materials {
            let plan = self.create_material(material_library, name, entry, bindings, enrichment)?;
            plans.insert(name.clone(), plan);
        }

        let assign = self
            .graph
            .create_output_node(material_library, "assignmaterial")?;
        self.graph
            .set_parm(assign, "nummaterials", asset.materials.len().into())?;
        for (i, name) in asset.materials.keys().enumerate() {
            let n = i + 1;
            self.graph.set_parm(
                assign,
                &format!("primpattern{}", n),
                variant.prim_pattern(&container, name).into(),
            )?;
            self.graph.set_parm(
                assign,
                &format!("matspecpath{}", n),
                material_spec_path(name).into(),
            )?;
        }

        let mut last = assign;
        let transform = match variant.unit_scale() {
            Some(scale) => {
                let xform = self.graph.create_output_node(assign, "xform")?;
                self.graph.set_parm(xform, "scale", scale.into())?;
                last = xform;
                Some(xform)
            }
            None => None,
        };
        self.graph.set_display_flag(last, true)?;

        let output_path = usd_output_path(geometry_file, &asset.asset_name);
        let usd_rop = self.graph.create_node(stage, "usd_rop", None)?;
        self.graph
            .set_parm(usd_rop, "lopoutput", output_path.as_str().into())?;
        self.graph.set_input(usd_rop, 0, last)?;

        let mut template = Template {
            asset_name: asset.asset_name.clone(),
            variant,
            sop_create,
            primitive,
            graft,
            material_library,
            assign,
            transform,
            usd_rop,
            output_path,
            plans,
            executed: false,
        };

        if self.options.execute_rop {
            self.graph.press_button(usd_rop, "execute")?;
            for node in template.nodes() {
                self.graph.destroy(node)?;
            }
            template.executed = true;
            tracing::info!("{} converted to usd", geometry_file);
        }

        Ok(template)
    }

    /// Build templates for every asset of a library.
    ///
    /// With `remove_template`, every node in the stage network is destroyed
    /// after each asset. Cancellation is checked between assets.
    pub fn convert_all(
        &mut self,
        doc: &MetadataDocument,
        tag: &LibraryTag,
        remove_template: bool,
        monitor: &mut dyn BatchMonitor,
    ) -> Result<BatchReport> {
        let assets = doc.library(tag)?;
        let stage = self.graph.require(&self.options.stage_path)?;
        let mut report = BatchReport {
            total: assets.len(),
            ..Default::default()
        };

        for (i, (source, asset)) in assets.iter().enumerate() {
            if monitor.is_cancelled() {
                tracing::info!("conversion cancelled after {} assets", report.processed);
                report.cancelled = true;
                break;
            }
            monitor.update(i, assets.len(), source);
            self.build(tag, source, asset)?;
            if remove_template {
                for child in self.graph.children(stage)? {
                    self.graph.destroy(child)?;
                }
            }
            report.processed += 1;
        }

        Ok(report)
    }

    fn create_sop_read(
        &mut self,
        stage: NodeId,
        geometry_file: &str,
        asset_name: &str,
        variant: LibraryVariant,
    ) -> Result<NodeId> {
        let name = self.free_child_name(stage, asset_name)?;
        let sop = self.graph.create_node(stage, "sopcreate", name.as_deref())?;
        let parms: [(&str, ParmValue); 8] = [
            ("enable_partitionattribs", true.into()),
            ("partitionattribs", "path".into()),
            ("enable_pathattr", true.into()),
            ("enable_group", true.into()),
            ("group", "*".into()),
            ("enable_grouptype", true.into()),
            ("enable_subsetgroups", true.into()),
            ("subsetgroups", "*".into()),
        ];
        self.graph.set_parms(sop, &parms)?;

        let create_path = format!("{}/sopnet/create", self.graph.node_path(sop)?);
        let create = self.graph.require(&create_path)?;

        let file = self.graph.create_node(create, "file", None)?;
        self.graph.set_parm(file, "file", geometry_file.into())?;

        let wrangle = self.graph.create_output_node(file, "attribwrangle")?;
        self.graph.set_parm(wrangle, "class", 1i64.into())?;
        self.graph
            .set_parm(wrangle, "snippet", variant.wrangle_code().into())?;

        let delete = self.graph.create_output_node(wrangle, "attribdelete")?;
        self.graph.set_parm(delete, "primdel", MATERIAL_ATTRIB.into())?;

        self.graph.create_output_node(delete, "output")?;
        Ok(sop)
    }

    /// Sanitized `wanted`, numbered until no child of `parent` uses it.
    fn free_child_name(&self, parent: NodeId, wanted: &str) -> Result<Option<String>> {
        let Some(base) = sanitize_node_name(wanted) else {
            tracing::warn!("empty asset name, host picks the node name");
            return Ok(None);
        };
        let mut name = base.clone();
        let mut n = 1;
        while self.graph.child(parent, &name)?.is_some() {
            name = format!("{}{}", base, n);
            n += 1;
        }
        if name != wanted {
            tracing::debug!("asset {:?} placed as node {}", wanted, name);
        }
        Ok(Some(name))
    }

    fn create_prim(&mut self, stage: NodeId) -> Result<NodeId> {
        let prim = self.graph.create_node(stage, "primitive", None)?;
        self.graph.set_parm(prim, "primpath", ROOT_PRIM.into())?;
        self.graph.set_parm(prim, "primkind", "assembly".into())?;
        Ok(prim)
    }

    /// Material subnet with its shader nodes and texture readers.
    fn create_material(
        &mut self,
        material_library: NodeId,
        name: &str,
        entry: &MaterialEntry,
        bindings: &SlotBindings,
        enrichment: Option<&EnrichmentTables>,
    ) -> Result<BindingPlan> {
        let subnet = self.graph.create_node(material_library, "subnet", Some(name))?;
        self.graph.set_material_flag(subnet, true)?;
        let output = self.graph.child(subnet, "suboutput1")?.ok_or_else(|| {
            Error::host(format!("material {} has no suboutput1", name))
        })?;

        let surface = self.graph.create_input_node(
            output,
            ShaderStage::Surface.output_index(),
            ShaderStage::Surface.shader_node().node_type(),
        )?;
        let displacement = self.graph.create_input_node(
            output,
            ShaderStage::Displacement.output_index(),
            ShaderStage::Displacement.shader_node().node_type(),
        )?;
        self.graph
            .create_input_node(output, 2, MATERIAL_PROPERTIES_NODE)?;

        let plan = resolve(
            &entry.textures,
            bindings,
            enrichment,
            self.options.resolve_flags(),
        );

        for action in &plan.actions {
            let target = match action.stage {
                ShaderStage::Surface => surface,
                ShaderStage::Displacement => displacement,
            };
            self.bind_texture(subnet, target, action)?;
        }

        if let Some(scale) = plan.displacement_scale {
            self.graph.set_parm(displacement, "scale", scale.into())?;
        }

        tracing::debug!(
            "material {}: {} textures bound, {} skipped",
            name,
            plan.actions.len(),
            plan.skipped.len()
        );
        Ok(plan)
    }

    /// Create an image reader for one binding and wire it into `target`.
    fn bind_texture(&mut self, subnet: NodeId, target: NodeId, action: &BindingAction) -> Result<()> {
        let Some(index) = self.graph.input_index(target, &action.input)? else {
            if action.is_synthesized() {
                return Err(Error::host(format!(
                    "{} has no input {}",
                    self.graph.node_path(target)?,
                    action.input
                )));
            }
            tracing::warn!("texture skipped {} (no input {})", action.texture, action.input);
            return Ok(());
        };

        let image = self.graph.create_node(subnet, IMAGE_NODE, None)?;
        self.graph
            .set_parm(image, "file", action.texture.as_str().into())?;
        self.graph.set_input(target, index, image)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::{CancelFlag, NoMonitor};
    use crate::host::MemoryGraph;

    fn wood_asset() -> AssetMetadata {
        let mut asset = AssetMetadata::new("crate");
        asset.materials.insert(
            "wood".into(),
            MaterialEntry::new("/mat/wood")
                .with_texture("basecolor_texture", "/t/wood_basecolor.png")
                .with_texture("unknown_texture", "/t/wood_mystery.png"),
        );
        asset.materials.insert(
            "metal".into(),
            MaterialEntry::new("/mat/metal").with_texture("metallic_texture", "/t/metal_metallic.png"),
        );
        asset
    }

    fn schemes() -> (BindingScheme, EnrichmentScheme) {
        (BindingScheme::builtin().unwrap(), EnrichmentScheme::builtin().unwrap())
    }

    #[test]
    fn test_kb_topology() {
        let (bindings, enrichment) = schemes();
        let mut g = MemoryGraph::with_contexts();
        let opts = TemplateOptions {
            add_displacement: false,
            ..Default::default()
        };
        let t = TemplateBuilder::new(&mut g, &bindings, &enrichment, opts)
            .build(&"KB".into(), "/lib/kb/geo/crate.bgeo.sc", &wood_asset())
            .unwrap();

        assert_eq!(g.node_path(t.sop_create).unwrap(), "/stage/crate");
        assert!(g.node("/stage/crate/sopnet/create/file1").is_some());
        let wrangle = g.require("/stage/crate/sopnet/create/attribwrangle1").unwrap();
        assert_eq!(g.eval_parm(wrangle, "snippet").unwrap(), LibraryVariant::Kb.wrangle_code());
        assert_eq!(g.eval_parm(wrangle, "class").unwrap(), "1");
        assert!(g.node("/stage/crate/sopnet/create/output1").is_some());

        assert_eq!(g.input_slots(t.graft), vec![Some(t.primitive), Some(t.sop_create)]);
        assert_eq!(g.inputs(t.material_library).unwrap(), vec![t.graft]);
        assert_eq!(g.inputs(t.usd_rop).unwrap(), vec![t.assign]);
        assert!(t.transform.is_none());
        assert!(g.display_flag(t.assign));

        assert_eq!(g.eval_parm(t.assign, "nummaterials").unwrap(), "2");
        assert_eq!(g.eval_parm(t.assign, "primpattern1").unwrap(), "/main/crate/crate/wood*");
        assert_eq!(g.eval_parm(t.assign, "matspecpath2").unwrap(), "/main/materials/metal");
        assert_eq!(g.eval_parm(t.usd_rop, "lopoutput").unwrap(), "/lib/kb/usd/crate.usd");
        assert_eq!(t.skipped_slots().collect::<Vec<_>>(), vec![("wood", "unknown_texture")]);
    }

    #[test]
    fn test_material_network_wiring() {
        let (bindings, enrichment) = schemes();
        let mut g = MemoryGraph::with_contexts();
        let opts = TemplateOptions {
            add_extra_textures: true,
            ..Default::default()
        };
        TemplateBuilder::new(&mut g, &bindings, &enrichment, opts)
            .build(&"KB".into(), "/lib/kb/geo/crate.bgeo.sc", &wood_asset())
            .unwrap();

        let wood = g.require("/stage/materiallibrary1/wood").unwrap();
        assert!(g.material_flag(wood));
        let surface = g.require("/stage/materiallibrary1/wood/mtlxstandard_surface1").unwrap();
        let disp = g.require("/stage/materiallibrary1/wood/mtlxdisplacement1").unwrap();
        let out = g.require("/stage/materiallibrary1/wood/suboutput1").unwrap();
        assert_eq!(g.input_slots(out).len(), 3);

        // basecolor -> base_color (1), derived ao -> base (0)
        let slots = g.input_slots(surface);
        let base_color = slots[1].unwrap();
        assert_eq!(g.eval_parm(base_color, "file").unwrap(), "/t/wood_basecolor.png");
        let base = slots[0].unwrap();
        assert_eq!(g.eval_parm(base, "file").unwrap(), "/t/wood_ao.png");

        let height = g.input_slots(disp)[0].unwrap();
        assert_eq!(g.eval_parm(height, "file").unwrap(), "/t/wood_height.png");
        assert_eq!(g.parm(disp, "scale"), Some(&ParmValue::Float(0.01)));
    }

    #[test]
    fn test_ms_adds_unit_scale() {
        let (bindings, enrichment) = schemes();
        let mut g = MemoryGraph::with_contexts();
        let opts = TemplateOptions {
            render_target: "MS".into(),
            ..Default::default()
        };
        let mut asset = AssetMetadata::new("rock");
        asset.materials.insert(
            "rock_mat".into(),
            MaterialEntry::new("/mat/rock_mat").with_texture("basecolor_texture", "/ms/rock_Albedo.jpg"),
        );
        let t = TemplateBuilder::new(&mut g, &bindings, &enrichment, opts)
            .build(&"MS".into(), "/ms/rock/lod/rock_LOD0.bgeo", &asset)
            .unwrap();

        let xform = t.transform.unwrap();
        assert_eq!(g.parm(xform, "scale"), Some(&ParmValue::Float(0.01)));
        assert_eq!(g.inputs(xform).unwrap(), vec![t.assign]);
        assert_eq!(g.inputs(t.usd_rop).unwrap(), vec![xform]);
        assert!(g.display_flag(xform));
        assert_eq!(g.eval_parm(t.assign, "primpattern1").unwrap(), "/main/rock/rock/*");
    }

    #[test]
    fn test_execute_destroys_template() {
        let (bindings, enrichment) = schemes();
        let mut g = MemoryGraph::with_contexts();
        let before = g.len();
        let opts = TemplateOptions {
            execute_rop: true,
            ..Default::default()
        };
        let t = TemplateBuilder::new(&mut g, &bindings, &enrichment, opts)
            .build(&"KB".into(), "/lib/kb/geo/crate.bgeo.sc", &wood_asset())
            .unwrap();

        assert!(t.executed);
        assert_eq!(g.executed(), &["/stage/usd_rop1".to_string()]);
        assert_eq!(g.len(), before);
    }

    #[test]
    fn test_unknown_target_creates_nothing() {
        let (bindings, enrichment) = schemes();
        let mut g = MemoryGraph::with_contexts();
        let before = g.len();
        let opts = TemplateOptions {
            render_target: "RenderMan".into(),
            ..Default::default()
        };
        let err = TemplateBuilder::new(&mut g, &bindings, &enrichment, opts)
            .build(&"KB".into(), "/lib/kb/geo/crate.bgeo.sc", &wood_asset())
            .unwrap_err();
        assert!(matches!(err, Error::UnknownRenderTarget(_)));
        assert_eq!(g.len(), before);
    }

    #[test]
    fn test_convert_all_with_cleanup() {
        let (bindings, enrichment) = schemes();
        let mut doc = MetadataDocument::new();
        let tag = LibraryTag::new("KB");
        doc.upsert(&tag, "/lib/kb/geo/crate.bgeo.sc", wood_asset());
        doc.upsert(&tag, "/lib/kb/geo/barrel.bgeo.sc", AssetMetadata::new("barrel"));

        let mut g = MemoryGraph::with_contexts();
        let mut builder = TemplateBuilder::new(&mut g, &bindings, &enrichment, TemplateOptions::default());
        let report = builder.convert_all(&doc, &tag, true, &mut NoMonitor).unwrap();
        assert_eq!(report.processed, 2);
        assert!(!report.cancelled);

        let stage = g.require("/stage").unwrap();
        assert!(g.children(stage).unwrap().is_empty());
    }

    #[test]
    fn test_awkward_asset_names_get_valid_nodes() {
        let (bindings, enrichment) = schemes();
        let mut g = MemoryGraph::with_contexts();
        let kb = LibraryTag::new("KB");
        let mut builder = TemplateBuilder::new(&mut g, &bindings, &enrichment, TemplateOptions::default());

        let first = builder.build(&kb, "/lib/kb/geo/crate.bgeo.sc", &wood_asset()).unwrap();
        let second = builder.build(&kb, "/lib/kb/geo/crate_v2.bgeo.sc", &wood_asset()).unwrap();
        let mut slashed = wood_asset();
        slashed.asset_name = "a/b rock".into();
        let slashed = builder.build(&kb, "/lib/kb/geo/rock.bgeo.sc", &slashed).unwrap();
        let unnamed = builder
            .build(&kb, "/lib/kb/geo/x.bgeo.sc", &AssetMetadata::new(""))
            .unwrap();

        assert_eq!(g.node_path(first.sop_create).unwrap(), "/stage/crate");
        assert_eq!(g.node_path(second.sop_create).unwrap(), "/stage/crate1");
        assert_eq!(g.eval_parm(second.assign, "primpattern1").unwrap(), "/main/crate1/crate1/wood*");
        assert_eq!(g.node_path(slashed.sop_create).unwrap(), "/stage/a_b_rock");
        assert_eq!(g.node_path(unnamed.sop_create).unwrap(), "/stage/sopcreate1");
    }

    #[test]
    fn test_convert_all_keeps_duplicate_names() {
        let (bindings, enrichment) = schemes();
        let mut doc = MetadataDocument::new();
        let tag = LibraryTag::new("KB");
        doc.upsert(&tag, "/lib/kb/geo/crate.bgeo.sc", wood_asset());
        doc.upsert(&tag, "/lib/kb/geo/crate_old.bgeo.sc", wood_asset());

        let mut g = MemoryGraph::with_contexts();
        let report = TemplateBuilder::new(&mut g, &bindings, &enrichment, TemplateOptions::default())
            .convert_all(&doc, &tag, false, &mut NoMonitor)
            .unwrap();
        assert_eq!(report.processed, 2);
        assert!(g.node("/stage/crate").is_some());
        assert!(g.node("/stage/crate1").is_some());
    }

    #[test]
    fn test_convert_all_cancelled() {
        let (bindings, enrichment) = schemes();
        let mut doc = MetadataDocument::new();
        let tag = LibraryTag::new("KB");
        doc.upsert(&tag, "/lib/kb/geo/crate.bgeo.sc", wood_asset());

        let mut g = MemoryGraph::with_contexts();
        let mut flag = CancelFlag::new();
        flag.cancel();
        let report = TemplateBuilder::new(&mut g, &bindings, &enrichment, TemplateOptions::default())
            .convert_all(&doc, &tag, false, &mut flag)
            .unwrap();
        assert_eq!(report.processed, 0);
        assert!(report.cancelled);
        assert_eq!(report.total, 1);
    }
}
