//! Metadata extraction from a host scene.
//!
//! Starting from a node, every upstream `file` node is treated as one asset.
//! For each asset the geometry is packed by `shop_materialpath`, the
//! principled shader of every material is read, and all non-empty
//! `*texture` parameters are recorded. The asset record replaces any earlier
//! record for the same source file and the store is saved after every asset.

mod asset_info;
mod traverse;

pub use asset_info::*;
pub use traverse::*;

use indexmap::IndexMap;

use crate::batch::{BatchMonitor, BatchReport};
use crate::host::{NodeGraph, NodeId};
use crate::metadata::{AssetMetadata, LibraryTag, MaterialEntry, MetadataStore};
use crate::util::naming::{material_name, MATERIAL_ATTRIB};
use crate::util::Result;

/// Principled shader operator type addressed directly by a shop path.
pub const PRINCIPLED_SHADER: &str = "principledshader::2.0";

/// Shader looked up inside a material network when the shop path is not a
/// shader itself.
pub const PRINCIPLED_SHADER_CHILD: &str = "principledshader1";

/// Suffix of shader parameters holding texture paths.
pub const TEXTURE_PARM_SUFFIX: &str = "texture";

/// Extraction settings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Asset name derivation.
    pub name_source: NameSource,
    /// Look for review images next to each source file.
    pub thumbnails: bool,
}

impl ExtractOptions {
    /// Defaults for a library tag, thumbnails on.
    pub fn for_tag(tag: &LibraryTag) -> Self {
        Self {
            name_source: NameSource::for_tag(tag),
            thumbnails: true,
        }
    }
}

/// Extracts asset metadata from a host graph into a store.
pub struct Extractor<'a> {
    store: &'a mut MetadataStore,
    tag: LibraryTag,
    options: ExtractOptions,
}

impl<'a> Extractor<'a> {
    /// Extractor writing under `tag`.
    pub fn new(store: &'a mut MetadataStore, tag: impl Into<LibraryTag>) -> Self {
        let tag = tag.into();
        let options = ExtractOptions::for_tag(&tag);
        Self { store, tag, options }
    }

    /// Override options.
    pub fn with_options(mut self, options: ExtractOptions) -> Self {
        self.options = options;
        self
    }

    /// Library tag records are written under.
    pub fn tag(&self) -> &LibraryTag {
        &self.tag
    }

    /// Extract every file node upstream of `start`.
    ///
    /// Host failures abort the batch; assets saved before the failure stay
    /// in the store.
    pub fn extract<G: NodeGraph>(
        &mut self,
        graph: &mut G,
        start: NodeId,
        monitor: &mut dyn BatchMonitor,
    ) -> Result<BatchReport> {
        let files = collect_file_nodes(graph, start)?;
        let mut report = BatchReport {
            total: files.len(),
            ..Default::default()
        };

        for (i, &file) in files.iter().enumerate() {
            if monitor.is_cancelled() {
                tracing::info!("extraction cancelled after {} assets", report.processed);
                report.cancelled = true;
                break;
            }
            let geometry_file = graph.eval_parm(file, "file")?;
            monitor.update(i, files.len(), &geometry_file);

            let pack_source = branch_source(graph, start, file, files.len())?;
            let asset = self.scan_asset(graph, pack_source, &geometry_file)?;
            tracing::info!(
                "{}: {} ({} materials, {} textures)",
                self.tag,
                asset.asset_name,
                asset.materials.len(),
                asset.texture_count()
            );
            self.store
                .document_mut()
                .upsert(&self.tag, geometry_file, asset);
            self.store.save()?;
            report.processed += 1;
        }

        tracing::info!("{}", report.metadata_summary());
        Ok(report)
    }

    /// Build the record of one asset without touching the store.
    pub fn scan_asset<G: NodeGraph>(
        &self,
        graph: &mut G,
        pack_source: NodeId,
        geometry_file: &str,
    ) -> Result<AssetMetadata> {
        let mut asset = AssetMetadata::new(asset_name(geometry_file, self.options.name_source)?);
        if self.options.thumbnails {
            asset.thumbnail = find_thumbnail(geometry_file);
        }
        asset.materials = scan_materials(graph, pack_source)?;
        Ok(asset)
    }
}

/// Materials of the geometry cooked by `source`, keyed by material name.
///
/// A temporary `pack` node groups primitives by material; it is removed
/// again whether or not the scan succeeds.
pub fn scan_materials<G: NodeGraph>(
    graph: &mut G,
    source: NodeId,
) -> Result<IndexMap<String, MaterialEntry>> {
    let pack = graph.create_output_node(source, "pack")?;
    let scanned = pack_and_scan(graph, pack);
    let destroyed = graph.destroy(pack);
    let materials = scanned?;
    destroyed?;
    Ok(materials)
}

fn pack_and_scan<G: NodeGraph>(graph: &mut G, pack: NodeId) -> Result<IndexMap<String, MaterialEntry>> {
    graph.set_parm(pack, "packbyname", true.into())?;
    graph.set_parm(pack, "nameattribute", MATERIAL_ATTRIB.into())?;
    graph.set_parm(pack, "transfer_attributes", MATERIAL_ATTRIB.into())?;

    let mut materials = IndexMap::new();
    for shop_path in graph.prim_string_attrib_values(pack, MATERIAL_ATTRIB)? {
        if shop_path.is_empty() {
            tracing::debug!("primitives without material skipped");
            continue;
        }
        let shader = principled_shader(graph, &shop_path)?;
        let mut entry = MaterialEntry::new(shop_path.as_str());
        entry.textures = texture_parms(graph, shader)?;
        tracing::debug!("{}: {} textures", shop_path, entry.textures.len());
        materials.insert(material_name(&shop_path).to_string(), entry);
    }
    Ok(materials)
}

/// Shader node of a material: the node itself when it is a principled
/// shader, otherwise its `principledshader1` child.
pub fn principled_shader<G: NodeGraph + ?Sized>(graph: &G, shop_path: &str) -> Result<NodeId> {
    let node = graph.require(shop_path)?;
    if graph.node_type(node)? == PRINCIPLED_SHADER {
        return Ok(node);
    }
    graph.require(&format!("{}/{}", shop_path, PRINCIPLED_SHADER_CHILD))
}

/// Non-empty `*texture` parameters of a shader, in parameter order.
pub fn texture_parms<G: NodeGraph + ?Sized>(
    graph: &G,
    shader: NodeId,
) -> Result<IndexMap<String, String>> {
    let mut textures = IndexMap::new();
    for parm in graph.parm_names(shader)? {
        if !parm.ends_with(TEXTURE_PARM_SUFFIX) {
            continue;
        }
        let value = graph.eval_parm(shader, &parm)?;
        if !value.is_empty() {
            textures.insert(parm, value);
        }
    }
    Ok(textures)
}
