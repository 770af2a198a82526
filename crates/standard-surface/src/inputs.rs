//! Input tables for the MaterialX shading nodes used by import templates.
//!
//! Order matches the node's input ports, so the position of an entry is the
//! index a host uses when wiring a texture into that input.

/// Value type carried by a shader input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InputType {
    /// Scalar float
    Float,
    /// RGB color
    Color3,
    /// 3-component vector (normals, tangents)
    Vector3,
    /// Boolean toggle
    Boolean,
}

/// A named input port.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShaderInput {
    /// Port name as exposed by the node
    pub name: &'static str,
    /// Value type
    pub ty: InputType,
}

const fn input(name: &'static str, ty: InputType) -> ShaderInput {
    ShaderInput { name, ty }
}

use InputType::*;

/// Inputs of `mtlxstandard_surface` (Autodesk Standard Surface 1.0.1).
pub const STANDARD_SURFACE_INPUTS: &[ShaderInput] = &[
    input("base", Float),
    input("base_color", Color3),
    input("diffuse_roughness", Float),
    input("metalness", Float),
    input("specular", Float),
    input("specular_color", Color3),
    input("specular_roughness", Float),
    input("specular_IOR", Float),
    input("specular_anisotropy", Float),
    input("specular_rotation", Float),
    input("transmission", Float),
    input("transmission_color", Color3),
    input("transmission_depth", Float),
    input("transmission_scatter", Color3),
    input("transmission_scatter_anisotropy", Float),
    input("transmission_dispersion", Float),
    input("transmission_extra_roughness", Float),
    input("subsurface", Float),
    input("subsurface_color", Color3),
    input("subsurface_radius", Color3),
    input("subsurface_scale", Float),
    input("subsurface_anisotropy", Float),
    input("sheen", Float),
    input("sheen_color", Color3),
    input("sheen_roughness", Float),
    input("coat", Float),
    input("coat_color", Color3),
    input("coat_roughness", Float),
    input("coat_anisotropy", Float),
    input("coat_rotation", Float),
    input("coat_IOR", Float),
    input("coat_normal", Vector3),
    input("coat_affect_color", Float),
    input("coat_affect_roughness", Float),
    input("thin_film_thickness", Float),
    input("thin_film_IOR", Float),
    input("emission", Float),
    input("emission_color", Color3),
    input("opacity", Color3),
    input("thin_walled", Boolean),
    input("normal", Vector3),
    input("tangent", Vector3),
];

/// Inputs of `mtlxdisplacement`.
pub const DISPLACEMENT_INPUTS: &[ShaderInput] = &[
    input("displacement", Float),
    input("scale", Float),
];

/// Default displacement scale applied to vendor height maps (scene units).
pub const DEFAULT_DISPLACEMENT_SCALE: f64 = 0.01;
