//! Shader stage catalog for point rendering.
//!
//! Each stage declares the uniforms and attributes it consumes so that a
//! backend can validate bindings before a draw is issued. Programs are
//! assembled from a vertex / geometry / fragment triple.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    Vertex,
    Geometry,
    Fragment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrawMode {
    Points,
    Triangles,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformKind {
    Int,
    Float,
    Vec2,
    Vec3,
    Vec4,
    Mat4,
}

impl fmt::Display for UniformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            UniformKind::Int => "int",
            UniformKind::Float => "float",
            UniformKind::Vec2 => "vec2",
            UniformKind::Vec3 => "vec3",
            UniformKind::Vec4 => "vec4",
            UniformKind::Mat4 => "mat4",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeKind {
    Float,
    Vec3,
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeKind::Float => f.write_str("float"),
            AttributeKind::Vec3 => f.write_str("vec3"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformDecl {
    pub name: &'static str,
    pub kind: UniformKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeDecl {
    pub name: &'static str,
    pub kind: AttributeKind,
}

const fn uniform(name: &'static str, kind: UniformKind) -> UniformDecl {
    UniformDecl { name, kind }
}

const fn attribute(name: &'static str, kind: AttributeKind) -> AttributeDecl {
    AttributeDecl { name, kind }
}

#[derive(Debug)]
pub struct ShaderStage {
    pub kind: StageKind,
    pub label: &'static str,
    pub uniforms: &'static [UniformDecl],
    pub attributes: &'static [AttributeDecl],
    pub source: &'static str,
}

/// A complete program recipe: the stages to link and the primitive mode.
#[derive(Debug)]
pub struct ProgramDesc {
    pub label: &'static str,
    pub stages: &'static [&'static ShaderStage],
    pub draw_mode: DrawMode,
}

impl ProgramDesc {
    pub fn uniforms(&self) -> impl Iterator<Item = &'static UniformDecl> + '_ {
        let mut seen: Vec<&'static str> = Vec::new();
        self.stages
            .iter()
            .flat_map(|stage| stage.uniforms.iter())
            .filter(move |decl| {
                if seen.contains(&decl.name) {
                    false
                } else {
                    seen.push(decl.name);
                    true
                }
            })
    }

    /// Attributes are only ever consumed by the vertex stage.
    pub fn attributes(&self) -> impl Iterator<Item = &'static AttributeDecl> + '_ {
        self.stages
            .iter()
            .filter(|stage| stage.kind == StageKind::Vertex)
            .flat_map(|stage| stage.attributes.iter())
    }

    pub fn uniform(&self, name: &str) -> Option<&'static UniformDecl> {
        self.uniforms().find(|decl| decl.name == name)
    }

    pub fn attribute(&self, name: &str) -> Option<&'static AttributeDecl> {
        self.attributes().find(|decl| decl.name == name)
    }
}

const BILLBOARD_UNIFORMS: &[UniformDecl] = &[
    uniform("u_modelView", UniformKind::Mat4),
    uniform("u_projMatrix", UniformKind::Mat4),
    uniform("u_camZ", UniformKind::Vec3),
    uniform("u_camUp", UniformKind::Vec3),
    uniform("u_camRight", UniformKind::Vec3),
    uniform("u_pointRadius", UniformKind::Float),
];

const MATERIAL_UNIFORMS: &[UniformDecl] = &[
    uniform("u_matAmbient", UniformKind::Float),
    uniform("u_matDiffuse", UniformKind::Float),
    uniform("u_matSpecular", UniformKind::Float),
    uniform("u_matShininess", UniformKind::Float),
];

const PLAIN_FRAG_UNIFORMS: &[UniformDecl] = &[
    uniform("u_baseColor", UniformKind::Vec3),
    uniform("u_matAmbient", UniformKind::Float),
    uniform("u_matDiffuse", UniformKind::Float),
    uniform("u_matSpecular", UniformKind::Float),
    uniform("u_matShininess", UniformKind::Float),
];

const VALUE_FRAG_UNIFORMS: &[UniformDecl] = &[
    uniform("u_rangeLow", UniformKind::Float),
    uniform("u_rangeHigh", UniformKind::Float),
    uniform("u_colormap", UniformKind::Int),
    uniform("u_matAmbient", UniformKind::Float),
    uniform("u_matDiffuse", UniformKind::Float),
    uniform("u_matSpecular", UniformKind::Float),
    uniform("u_matShininess", UniformKind::Float),
];

const VECTOR_GEOM_UNIFORMS: &[UniformDecl] = &[
    uniform("u_modelView", UniformKind::Mat4),
    uniform("u_projMatrix", UniformKind::Mat4),
    uniform("u_lengthMult", UniformKind::Float),
    uniform("u_radius", UniformKind::Float),
];

pub static SPHERE_VERT_SHADER: ShaderStage = ShaderStage {
    kind: StageKind::Vertex,
    label: "sphere vert",
    uniforms: &[],
    attributes: &[attribute("a_position", AttributeKind::Vec3)],
    source: r#"
        in vec3 a_position;
        void main() {
            gl_Position = vec4(a_position, 1.0);
        }
    "#,
};

pub static SPHERE_BILLBOARD_GEOM_SHADER: ShaderStage = ShaderStage {
    kind: StageKind::Geometry,
    label: "sphere billboard geom",
    uniforms: BILLBOARD_UNIFORMS,
    attributes: &[],
    source: r#"
        layout(points) in;
        layout(triangle_strip, max_vertices=4) out;
        uniform mat4 u_modelView;
        uniform mat4 u_projMatrix;
        uniform vec3 u_camRight;
        uniform vec3 u_camUp;
        uniform vec3 u_camZ;
        uniform float u_pointRadius;
        out vec3 sphereCenterView;
        out vec3 boxCoord;
        void main() {
            vec4 center = u_modelView * gl_in[0].gl_Position;
            sphereCenterView = center.xyz / center.w;
            for (int i = 0; i < 4; i++) {
                vec2 corner = vec2(i & 1, i >> 1) * 2.0 - 1.0;
                boxCoord = vec3(corner, 0.0);
                vec4 offset = vec4(corner.x * u_pointRadius, corner.y * u_pointRadius, 0.0, 0.0);
                gl_Position = u_projMatrix * (center + offset);
                EmitVertex();
            }
            EndPrimitive();
        }
    "#,
};

pub static SPHERE_BILLBOARD_FRAG_SHADER: ShaderStage = ShaderStage {
    kind: StageKind::Fragment,
    label: "sphere billboard frag",
    uniforms: PLAIN_FRAG_UNIFORMS,
    attributes: &[],
    source: r#"
        uniform vec3 u_baseColor;
        in vec3 boxCoord;
        out vec4 outputF;
        vec3 lightSurface(vec3 normal, vec3 color);
        void main() {
            float r2 = dot(boxCoord.xy, boxCoord.xy);
            if (r2 > 1.0) discard;
            vec3 normal = vec3(boxCoord.xy, sqrt(1.0 - r2));
            outputF = vec4(lightSurface(normal, u_baseColor), 1.0);
        }
    "#,
};

pub static SPHERE_COLOR_VERT_SHADER: ShaderStage = ShaderStage {
    kind: StageKind::Vertex,
    label: "sphere color vert",
    uniforms: &[],
    attributes: &[
        attribute("a_position", AttributeKind::Vec3),
        attribute("a_color", AttributeKind::Vec3),
    ],
    source: r#"
        in vec3 a_position;
        in vec3 a_color;
        out vec3 Color;
        void main() {
            Color = a_color;
            gl_Position = vec4(a_position, 1.0);
        }
    "#,
};

pub static SPHERE_COLOR_BILLBOARD_GEOM_SHADER: ShaderStage = ShaderStage {
    kind: StageKind::Geometry,
    label: "sphere color billboard geom",
    uniforms: BILLBOARD_UNIFORMS,
    attributes: &[],
    source: r#"
        layout(points) in;
        layout(triangle_strip, max_vertices=4) out;
        in vec3 Color[];
        out vec3 colorToFrag;
        // body shared with the plain billboard expansion
    "#,
};

pub static SPHERE_COLOR_BILLBOARD_FRAG_SHADER: ShaderStage = ShaderStage {
    kind: StageKind::Fragment,
    label: "sphere color billboard frag",
    uniforms: MATERIAL_UNIFORMS,
    attributes: &[],
    source: r#"
        in vec3 colorToFrag;
        in vec3 boxCoord;
        out vec4 outputF;
        vec3 lightSurface(vec3 normal, vec3 color);
        void main() {
            float r2 = dot(boxCoord.xy, boxCoord.xy);
            if (r2 > 1.0) discard;
            vec3 normal = vec3(boxCoord.xy, sqrt(1.0 - r2));
            outputF = vec4(lightSurface(normal, colorToFrag), 1.0);
        }
    "#,
};

/// Unlit: emits the interpolated color exactly, as the pick pass requires.
pub static SPHERE_COLOR_PLAIN_BILLBOARD_FRAG_SHADER: ShaderStage = ShaderStage {
    kind: StageKind::Fragment,
    label: "sphere color plain billboard frag",
    uniforms: &[],
    attributes: &[],
    source: r#"
        in vec3 colorToFrag;
        in vec3 boxCoord;
        out vec4 outputF;
        void main() {
            if (dot(boxCoord.xy, boxCoord.xy) > 1.0) discard;
            outputF = vec4(colorToFrag, 1.0);
        }
    "#,
};

pub static SPHERE_VALUE_VERT_SHADER: ShaderStage = ShaderStage {
    kind: StageKind::Vertex,
    label: "sphere value vert",
    uniforms: &[],
    attributes: &[
        attribute("a_position", AttributeKind::Vec3),
        attribute("a_value", AttributeKind::Float),
    ],
    source: r#"
        in vec3 a_position;
        in float a_value;
        out float Value;
        void main() {
            Value = a_value;
            gl_Position = vec4(a_position, 1.0);
        }
    "#,
};

pub static SPHERE_VALUE_BILLBOARD_GEOM_SHADER: ShaderStage = ShaderStage {
    kind: StageKind::Geometry,
    label: "sphere value billboard geom",
    uniforms: BILLBOARD_UNIFORMS,
    attributes: &[],
    source: r#"
        layout(points) in;
        layout(triangle_strip, max_vertices=4) out;
        in float Value[];
        out float valueToFrag;
    "#,
};

pub static SPHERE_VALUE_BILLBOARD_FRAG_SHADER: ShaderStage = ShaderStage {
    kind: StageKind::Fragment,
    label: "sphere value billboard frag",
    uniforms: VALUE_FRAG_UNIFORMS,
    attributes: &[],
    source: r#"
        uniform float u_rangeLow;
        uniform float u_rangeHigh;
        uniform int u_colormap;
        in float valueToFrag;
        in vec3 boxCoord;
        out vec4 outputF;
        vec3 sampleColormap(int map, float t);
        vec3 lightSurface(vec3 normal, vec3 color);
        void main() {
            float r2 = dot(boxCoord.xy, boxCoord.xy);
            if (r2 > 1.0) discard;
            float t = clamp((valueToFrag - u_rangeLow) / (u_rangeHigh - u_rangeLow), 0.0, 1.0);
            vec3 normal = vec3(boxCoord.xy, sqrt(1.0 - r2));
            outputF = vec4(lightSurface(normal, sampleColormap(u_colormap, t)), 1.0);
        }
    "#,
};

pub static PASSTHRU_VECTOR_VERT_SHADER: ShaderStage = ShaderStage {
    kind: StageKind::Vertex,
    label: "passthru vector vert",
    uniforms: &[],
    attributes: &[
        attribute("a_position", AttributeKind::Vec3),
        attribute("a_vector", AttributeKind::Vec3),
    ],
    source: r#"
        in vec3 a_position;
        in vec3 a_vector;
        out vec3 vector;
        void main() {
            vector = a_vector;
            gl_Position = vec4(a_position, 1.0);
        }
    "#,
};

pub static VECTOR_GEOM_SHADER: ShaderStage = ShaderStage {
    kind: StageKind::Geometry,
    label: "vector geom",
    uniforms: VECTOR_GEOM_UNIFORMS,
    attributes: &[],
    source: r#"
        layout(points) in;
        layout(triangle_strip, max_vertices=100) out;
        in vec3 vector[];
        uniform mat4 u_modelView;
        uniform mat4 u_projMatrix;
        uniform float u_lengthMult;
        uniform float u_radius;
    "#,
};

pub static SHINY_VECTOR_FRAG_SHADER: ShaderStage = ShaderStage {
    kind: StageKind::Fragment,
    label: "shiny vector frag",
    uniforms: PLAIN_FRAG_UNIFORMS,
    attributes: &[],
    source: r#"
        uniform vec3 u_baseColor;
        in vec3 Normal;
        out vec4 outputF;
        vec3 lightSurface(vec3 normal, vec3 color);
        void main() {
            outputF = vec4(lightSurface(normalize(Normal), u_baseColor), 1.0);
        }
    "#,
};

pub static SPHERE_PROGRAM: ProgramDesc = ProgramDesc {
    label: "point sphere",
    stages: &[
        &SPHERE_VERT_SHADER,
        &SPHERE_BILLBOARD_GEOM_SHADER,
        &SPHERE_BILLBOARD_FRAG_SHADER,
    ],
    draw_mode: DrawMode::Points,
};

pub static SPHERE_COLOR_PROGRAM: ProgramDesc = ProgramDesc {
    label: "point sphere color",
    stages: &[
        &SPHERE_COLOR_VERT_SHADER,
        &SPHERE_COLOR_BILLBOARD_GEOM_SHADER,
        &SPHERE_COLOR_BILLBOARD_FRAG_SHADER,
    ],
    draw_mode: DrawMode::Points,
};

pub static SPHERE_VALUE_PROGRAM: ProgramDesc = ProgramDesc {
    label: "point sphere value",
    stages: &[
        &SPHERE_VALUE_VERT_SHADER,
        &SPHERE_VALUE_BILLBOARD_GEOM_SHADER,
        &SPHERE_VALUE_BILLBOARD_FRAG_SHADER,
    ],
    draw_mode: DrawMode::Points,
};

pub static SPHERE_PICK_PROGRAM: ProgramDesc = ProgramDesc {
    label: "point sphere pick",
    stages: &[
        &SPHERE_COLOR_VERT_SHADER,
        &SPHERE_COLOR_BILLBOARD_GEOM_SHADER,
        &SPHERE_COLOR_PLAIN_BILLBOARD_FRAG_SHADER,
    ],
    draw_mode: DrawMode::Points,
};

pub static VECTOR_PROGRAM: ProgramDesc = ProgramDesc {
    label: "point vector",
    stages: &[
        &PASSTHRU_VECTOR_VERT_SHADER,
        &VECTOR_GEOM_SHADER,
        &SHINY_VECTOR_FRAG_SHADER,
    ],
    draw_mode: DrawMode::Points,
};
