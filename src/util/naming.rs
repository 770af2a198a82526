//! Naming and path conventions shared by extraction and template assembly.
//!
//! Paths handled here are host-style strings with `/` separators, as stored
//! in the metadata document. They are never normalized through `std::path`
//! so that Windows-authored libraries round-trip unchanged.

/// Root primitive every template grafts its geometry under.
pub const ROOT_PRIM: &str = "/main";

/// Prefix of material prims created by the material library stage.
pub const MATERIAL_PREFIX: &str = "/main/materials/";

/// Primitive attribute naming the material of each primitive.
pub const MATERIAL_ATTRIB: &str = "shop_materialpath";

/// Last `/` segment of a path.
pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Asset name derived from a geometry path: file name up to the first dot.
///
/// `"/lib/kb/geo/Building_A.bgeo.sc"` yields `"Building_A"`.
pub fn asset_name_from_path(path: &str) -> &str {
    let name = file_name(path);
    name.split('.').next().unwrap_or(name)
}

/// Material name addressed by a shop material path (its last segment).
pub fn material_name(shop_materialpath: &str) -> &str {
    file_name(shop_materialpath)
}

/// First underscore-delimited token of the file name.
///
/// Used to locate sidecar records: `"rlsvt_LOD0.fbx"` yields `"rlsvt"`.
pub fn sidecar_key(path: &str) -> &str {
    let stem = asset_name_from_path(path);
    stem.split('_').next().unwrap_or(stem)
}

/// Last underscore-delimited token of the file stem.
///
/// `"/tex/wood_basecolor.png"` yields `"basecolor"`.
pub fn suffix_token(path: &str) -> &str {
    let stem = asset_name_from_path(path);
    stem.rsplit('_').next().unwrap_or(stem)
}

/// Derive a sibling texture path by swapping the suffix token.
///
/// The replacement is textual over the whole path, so a token that also
/// appears in a directory name is replaced there as well.
pub fn patch_texture(source_texture: &str, target_token: &str) -> String {
    let token = suffix_token(source_texture);
    if token.is_empty() {
        return source_texture.to_string();
    }
    source_texture.replace(token, target_token)
}

/// USD output for an asset: two levels above the geometry, in a `usd` folder.
///
/// `"/lib/kb/geo/a.bgeo"` with asset `a` yields `"/lib/kb/usd/a.usd"`.
pub fn usd_output_path(geometry_file: &str, asset_name: &str) -> String {
    let parts: Vec<&str> = geometry_file.split('/').collect();
    let keep = parts.len().saturating_sub(2);
    let mut out = parts[..keep].join("/");
    out.push_str("/usd/");
    out.push_str(asset_name);
    out.push_str(".usd");
    out
}

/// Material prim path inside the material library.
pub fn material_spec_path(material: &str) -> String {
    format!("{}{}", MATERIAL_PREFIX, material)
}

/// Directory part of a host path, without the trailing separator.
pub fn parent_dir(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) => "/",
        Some(pos) => &path[..pos],
        None => "",
    }
}

/// Asset name made usable as a node name.
///
/// Characters other than ASCII letters, digits and `_` become `_`. An empty
/// name yields `None` so the host can pick one.
pub fn sanitize_node_name(name: &str) -> Option<String> {
    if name.is_empty() {
        return None;
    }
    let clean = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    Some(clean)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_name_from_path() {
        assert_eq!(asset_name_from_path("/lib/kb/geo/Building_A.bgeo.sc"), "Building_A");
        assert_eq!(asset_name_from_path("plain"), "plain");
        assert_eq!(asset_name_from_path("/a/b/"), "");
    }

    #[test]
    fn test_material_name() {
        assert_eq!(material_name("/mat/KB3D_Wood"), "KB3D_Wood");
        assert_eq!(material_name("Wood"), "Wood");
    }

    #[test]
    fn test_sidecar_key() {
        assert_eq!(sidecar_key("/ms/rock/rlsvt_LOD0.fbx"), "rlsvt");
        assert_eq!(sidecar_key("/ms/rock/rock.fbx"), "rock");
    }

    #[test]
    fn test_patch_texture_swaps_suffix() {
        assert_eq!(
            patch_texture("/tex/wood_basecolor.png", "height"),
            "/tex/wood_height.png"
        );
    }

    #[test]
    fn test_patch_texture_same_token_is_identity() {
        let path = "/tex/wood/wood_basecolor.png";
        assert_eq!(patch_texture(path, "basecolor"), path);
    }

    #[test]
    fn test_patch_texture_replaces_every_occurrence() {
        // Recurring token in a directory is rewritten too.
        assert_eq!(
            patch_texture("/normal/brick_normal.png", "ao"),
            "/ao/brick_ao.png"
        );
    }

    #[test]
    fn test_patch_texture_without_underscore() {
        // Whole stem is the token.
        assert_eq!(patch_texture("/tex/wood.png", "height"), "/tex/height.png");
    }

    #[test]
    fn test_usd_output_path() {
        assert_eq!(usd_output_path("/lib/kb/geo/a.bgeo", "a"), "/lib/kb/usd/a.usd");
        assert_eq!(usd_output_path("a.bgeo", "a"), "/usd/a.usd");
    }

    #[test]
    fn test_sanitize_node_name() {
        assert_eq!(sanitize_node_name("crate").as_deref(), Some("crate"));
        assert_eq!(sanitize_node_name("a/b rock").as_deref(), Some("a_b_rock"));
        assert_eq!(sanitize_node_name("Mossy Rock-01").as_deref(), Some("Mossy_Rock_01"));
        assert_eq!(sanitize_node_name(""), None);
    }

    #[test]
    fn test_parent_dir() {
        assert_eq!(parent_dir("/lib/geo/a.bgeo"), "/lib/geo");
        assert_eq!(parent_dir("/a.bgeo"), "/");
        assert_eq!(parent_dir("a.bgeo"), "");
    }
}
