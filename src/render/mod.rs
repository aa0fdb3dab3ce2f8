pub mod colormap;
pub mod material;
pub mod shaders;

use crate::view::ViewParameters;
use glam::{Mat4, Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};
use shaders::{AttributeKind, ProgramDesc, UniformDecl, UniformKind};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;

pub use shaders::DrawMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackendKind {
    /// Validates and records every call without touching a GPU.
    Headless,
    /// Like `Headless`, but tolerates uniforms left unset at draw time.
    HeadlessPermissive,
}

impl Default for BackendKind {
    fn default() -> Self {
        BackendKind::Headless
    }
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("program '{program}' has no attribute named '{name}'")]
    UnknownAttribute { program: String, name: String },
    #[error("program '{program}' has no uniform named '{name}'")]
    UnknownUniform { program: String, name: String },
    #[error("uniform '{name}' expects {expected} but received {got}")]
    UniformTypeMismatch {
        name: String,
        expected: UniformKind,
        got: UniformKind,
    },
    #[error("attribute '{name}' expects {expected} but received {got}")]
    AttributeTypeMismatch {
        name: String,
        expected: AttributeKind,
        got: AttributeKind,
    },
    #[error("program '{program}' attribute '{name}' has {got} elements, expected {expected}")]
    AttributeLengthMismatch {
        program: String,
        name: String,
        expected: usize,
        got: usize,
    },
    #[error("program '{program}' cannot draw: attribute '{name}' was never set")]
    MissingAttribute { program: String, name: String },
    #[error("program '{program}' cannot draw: uniform '{name}' was never set")]
    MissingUniform { program: String, name: String },
    #[error("no material named '{0}'")]
    UnknownMaterial(String),
    #[error("a program rebuild is already in progress")]
    RebuildInProgress,
    #[error("no program has been prepared for '{0}'")]
    ProgramNotReady(String),
    #[error("gpu backend failure: {0}")]
    Backend(String),
}

pub type RenderResult<T> = Result<T, RenderError>;

/// Borrowed per-element data handed to a program attribute.
#[derive(Debug, Clone, Copy)]
pub enum AttributeData<'a> {
    Float(&'a [f32]),
    Vec3(&'a [Vec3]),
}

impl AttributeData<'_> {
    pub fn kind(&self) -> AttributeKind {
        match self {
            AttributeData::Float(_) => AttributeKind::Float,
            AttributeData::Vec3(_) => AttributeKind::Vec3,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            AttributeData::Float(values) => values.len(),
            AttributeData::Vec3(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Raw bytes as they would be uploaded to a vertex buffer.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            AttributeData::Float(values) => bytemuck::cast_slice(values),
            AttributeData::Vec3(values) => bytemuck::cast_slice(values),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Int(i32),
    Float(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat4(Mat4),
}

impl UniformValue {
    pub fn kind(&self) -> UniformKind {
        match self {
            UniformValue::Int(_) => UniformKind::Int,
            UniformValue::Float(_) => UniformKind::Float,
            UniformValue::Vec2(_) => UniformKind::Vec2,
            UniformValue::Vec3(_) => UniformKind::Vec3,
            UniformValue::Vec4(_) => UniformKind::Vec4,
            UniformValue::Mat4(_) => UniformKind::Mat4,
        }
    }

    pub fn as_float(&self) -> Option<f32> {
        match self {
            UniformValue::Float(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_vec3(&self) -> Option<Vec3> {
        match self {
            UniformValue::Vec3(value) => Some(*value),
            _ => None,
        }
    }
}

impl From<f32> for UniformValue {
    fn from(value: f32) -> Self {
        UniformValue::Float(value)
    }
}

impl From<i32> for UniformValue {
    fn from(value: i32) -> Self {
        UniformValue::Int(value)
    }
}

impl From<Vec3> for UniformValue {
    fn from(value: Vec3) -> Self {
        UniformValue::Vec3(value)
    }
}

impl From<Mat4> for UniformValue {
    fn from(value: Mat4) -> Self {
        UniformValue::Mat4(value)
    }
}

/// A linked graphics program. Dropping the program releases its GPU-side
/// resources.
pub trait GpuProgram: Send {
    fn label(&self) -> &str;
    fn has_uniform(&self, name: &str) -> bool;
    fn has_attribute(&self, name: &str) -> bool;
    fn set_attribute(&mut self, name: &str, data: AttributeData<'_>) -> RenderResult<()>;
    fn set_uniform(&mut self, name: &str, value: UniformValue) -> RenderResult<()>;
    fn draw(&mut self) -> RenderResult<()>;
}

pub trait GraphicsBackend: Send {
    fn label(&self) -> &'static str;
    fn create_program(&mut self, desc: &ProgramDesc) -> RenderResult<Box<dyn GpuProgram>>;
}

/// Everything a structure needs to render one frame.
pub struct FrameContext<'a> {
    pub backend: &'a mut dyn GraphicsBackend,
    pub view: &'a ViewParameters,
}

impl<'a> FrameContext<'a> {
    pub fn new(backend: &'a mut dyn GraphicsBackend, view: &'a ViewParameters) -> Self {
        Self { backend, view }
    }
}

/// Lifecycle of a lazily built program: nothing yet, mid-rebuild, or usable.
#[derive(Default)]
pub enum ProgramState {
    #[default]
    Absent,
    Building,
    Ready(Box<dyn GpuProgram>),
}

impl ProgramState {
    pub fn is_ready(&self) -> bool {
        matches!(self, ProgramState::Ready(_))
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, ProgramState::Absent)
    }

    pub fn ready_mut(&mut self) -> Option<&mut (dyn GpuProgram + 'static)> {
        match self {
            ProgramState::Ready(program) => Some(program.as_mut()),
            _ => None,
        }
    }

    pub fn label(&self) -> Option<&str> {
        match self {
            ProgramState::Ready(program) => Some(program.label()),
            _ => None,
        }
    }

    /// Releases the current program, if any.
    pub fn discard(&mut self) {
        *self = ProgramState::Absent;
    }

    /// Releases any current program and marks a rebuild as started.
    pub fn begin_build(&mut self) -> RenderResult<()> {
        if matches!(self, ProgramState::Building) {
            return Err(RenderError::RebuildInProgress);
        }
        *self = ProgramState::Building;
        Ok(())
    }

    pub fn finish_build(&mut self, program: Box<dyn GpuProgram>) {
        *self = ProgramState::Ready(program);
    }

    pub fn abort_build(&mut self) {
        *self = ProgramState::Absent;
    }
}

impl std::fmt::Debug for ProgramState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProgramState::Absent => f.write_str("Absent"),
            ProgramState::Building => f.write_str("Building"),
            ProgramState::Ready(program) => write!(f, "Ready({})", program.label()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawRecord {
    pub program: String,
    pub element_count: usize,
    pub uniforms: BTreeMap<String, UniformValue>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BackendCounters {
    pub created_programs: usize,
    pub live_programs: usize,
    pub draw_calls: usize,
}

/// Counters and draw log shared between a headless backend and the programs
/// it hands out.
#[derive(Debug, Default)]
pub struct BackendStats {
    created_programs: AtomicUsize,
    live_programs: AtomicUsize,
    draw_calls: AtomicUsize,
    draws: Mutex<Vec<DrawRecord>>,
}

impl BackendStats {
    pub fn counters(&self) -> BackendCounters {
        BackendCounters {
            created_programs: self.created_programs.load(Ordering::Acquire),
            live_programs: self.live_programs.load(Ordering::Acquire),
            draw_calls: self.draw_calls.load(Ordering::Acquire),
        }
    }

    pub fn draws(&self) -> Vec<DrawRecord> {
        self.draws.lock().expect("draw log mutex poisoned").clone()
    }

    pub fn last_draw(&self) -> Option<DrawRecord> {
        self.draws
            .lock()
            .expect("draw log mutex poisoned")
            .last()
            .cloned()
    }

    pub fn clear_draws(&self) {
        self.draws.lock().expect("draw log mutex poisoned").clear();
    }

    fn record_draw(&self, record: DrawRecord) {
        self.draw_calls.fetch_add(1, Ordering::AcqRel);
        self.draws
            .lock()
            .expect("draw log mutex poisoned")
            .push(record);
    }
}

pub struct HeadlessBackend {
    strict: bool,
    stats: Arc<BackendStats>,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self {
            strict: true,
            stats: Arc::new(BackendStats::default()),
        }
    }

    pub fn permissive() -> Self {
        Self {
            strict: false,
            ..Self::new()
        }
    }

    pub fn from_kind(kind: BackendKind) -> Self {
        match kind {
            BackendKind::Headless => Self::new(),
            BackendKind::HeadlessPermissive => Self::permissive(),
        }
    }

    pub fn stats(&self) -> Arc<BackendStats> {
        Arc::clone(&self.stats)
    }
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphicsBackend for HeadlessBackend {
    fn label(&self) -> &'static str {
        "Headless Backend"
    }

    fn create_program(&mut self, desc: &ProgramDesc) -> RenderResult<Box<dyn GpuProgram>> {
        if desc.stages.is_empty() {
            return Err(RenderError::Backend(format!(
                "program '{}' has no shader stages",
                desc.label
            )));
        }

        self.stats.created_programs.fetch_add(1, Ordering::AcqRel);
        self.stats.live_programs.fetch_add(1, Ordering::AcqRel);
        log::debug!("[render] created program '{}'", desc.label);

        Ok(Box::new(HeadlessProgram {
            label: desc.label.to_string(),
            uniform_decls: desc.uniforms().copied().collect(),
            attribute_decls: desc
                .attributes()
                .map(|decl| (decl.name, decl.kind))
                .collect(),
            attributes: HashMap::new(),
            uniforms: BTreeMap::new(),
            strict: self.strict,
            stats: Arc::clone(&self.stats),
        }))
    }
}

struct AttributeBuffer {
    element_count: usize,
    bytes: Vec<u8>,
}

struct HeadlessProgram {
    label: String,
    uniform_decls: Vec<UniformDecl>,
    attribute_decls: Vec<(&'static str, AttributeKind)>,
    attributes: HashMap<String, AttributeBuffer>,
    uniforms: BTreeMap<String, UniformValue>,
    strict: bool,
    stats: Arc<BackendStats>,
}

impl HeadlessProgram {
    fn element_count(&self) -> RenderResult<usize> {
        let mut count = None;
        for (name, _) in &self.attribute_decls {
            let buffer =
                self.attributes
                    .get(*name)
                    .ok_or_else(|| RenderError::MissingAttribute {
                        program: self.label.clone(),
                        name: name.to_string(),
                    })?;
            debug_assert_eq!(buffer.bytes.is_empty(), buffer.element_count == 0);
            match count {
                None => count = Some(buffer.element_count),
                Some(expected) if expected != buffer.element_count => {
                    return Err(RenderError::AttributeLengthMismatch {
                        program: self.label.clone(),
                        name: name.to_string(),
                        expected,
                        got: buffer.element_count,
                    });
                }
                Some(_) => {}
            }
        }
        Ok(count.unwrap_or(0))
    }
}

impl GpuProgram for HeadlessProgram {
    fn label(&self) -> &str {
        &self.label
    }

    fn has_uniform(&self, name: &str) -> bool {
        self.uniform_decls.iter().any(|decl| decl.name == name)
    }

    fn has_attribute(&self, name: &str) -> bool {
        self.attribute_decls.iter().any(|(decl, _)| *decl == name)
    }

    fn set_attribute(&mut self, name: &str, data: AttributeData<'_>) -> RenderResult<()> {
        let (_, expected) = self
            .attribute_decls
            .iter()
            .find(|(decl, _)| *decl == name)
            .ok_or_else(|| RenderError::UnknownAttribute {
                program: self.label.clone(),
                name: name.to_string(),
            })?;
        if *expected != data.kind() {
            return Err(RenderError::AttributeTypeMismatch {
                name: name.to_string(),
                expected: *expected,
                got: data.kind(),
            });
        }

        self.attributes.insert(
            name.to_string(),
            AttributeBuffer {
                element_count: data.len(),
                bytes: data.as_bytes().to_vec(),
            },
        );
        Ok(())
    }

    fn set_uniform(&mut self, name: &str, value: UniformValue) -> RenderResult<()> {
        let decl = self
            .uniform_decls
            .iter()
            .find(|decl| decl.name == name)
            .ok_or_else(|| RenderError::UnknownUniform {
                program: self.label.clone(),
                name: name.to_string(),
            })?;
        if decl.kind != value.kind() {
            return Err(RenderError::UniformTypeMismatch {
                name: name.to_string(),
                expected: decl.kind,
                got: value.kind(),
            });
        }

        self.uniforms.insert(name.to_string(), value);
        Ok(())
    }

    fn draw(&mut self) -> RenderResult<()> {
        let element_count = self.element_count()?;
        if self.strict {
            if let Some(missing) = self
                .uniform_decls
                .iter()
                .find(|decl| !self.uniforms.contains_key(decl.name))
            {
                return Err(RenderError::MissingUniform {
                    program: self.label.clone(),
                    name: missing.name.to_string(),
                });
            }
        }

        self.stats.record_draw(DrawRecord {
            program: self.label.clone(),
            element_count,
            uniforms: self.uniforms.clone(),
        });
        Ok(())
    }
}

impl Drop for HeadlessProgram {
    fn drop(&mut self) {
        self.stats.live_programs.fetch_sub(1, Ordering::AcqRel);
        log::trace!("[render] released program '{}'", self.label);
    }
}
