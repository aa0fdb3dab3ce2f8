use super::{GpuProgram, RenderError, RenderResult, UniformValue};

/// Lighting response for lit programs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub name: &'static str,
    pub ambient: f32,
    pub diffuse: f32,
    pub specular: f32,
    pub shininess: f32,
}

pub const DEFAULT_MATERIAL: &str = "wax";

pub const MATERIALS: &[Material] = &[
    Material {
        name: "wax",
        ambient: 0.25,
        diffuse: 0.65,
        specular: 0.35,
        shininess: 12.0,
    },
    Material {
        name: "clay",
        ambient: 0.3,
        diffuse: 0.7,
        specular: 0.05,
        shininess: 4.0,
    },
    Material {
        name: "candy",
        ambient: 0.2,
        diffuse: 0.55,
        specular: 0.8,
        shininess: 48.0,
    },
    Material {
        name: "flat",
        ambient: 1.0,
        diffuse: 0.0,
        specular: 0.0,
        shininess: 1.0,
    },
];

pub fn material(name: &str) -> Option<&'static Material> {
    MATERIALS.iter().find(|material| material.name == name)
}

pub fn material_names() -> impl Iterator<Item = &'static str> {
    MATERIALS.iter().map(|material| material.name)
}

/// Binds the named material's lighting parameters on `program`.
pub fn apply_material(program: &mut dyn GpuProgram, name: &str) -> RenderResult<()> {
    let material = material(name).ok_or_else(|| RenderError::UnknownMaterial(name.to_string()))?;
    program.set_uniform("u_matAmbient", UniformValue::Float(material.ambient))?;
    program.set_uniform("u_matDiffuse", UniformValue::Float(material.diffuse))?;
    program.set_uniform("u_matSpecular", UniformValue::Float(material.specular))?;
    program.set_uniform("u_matShininess", UniformValue::Float(material.shininess))?;
    Ok(())
}
