use super::quantity::{PointCloudQuantity, QuantityDrawContext, QuantityUiAction};
use crate::render::material::{self, DEFAULT_MATERIAL};
use crate::render::shaders::VECTOR_PROGRAM;
use crate::render::{AttributeData, GpuProgram, GraphicsBackend, RenderResult, UniformValue};
use crate::ui::Ui;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::any::Any;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VectorType {
    /// Rescaled so the longest vector spans a fraction of the scene.
    #[default]
    Standard,
    /// Drawn at face value, in world units.
    Ambient,
}

const DEFAULT_LENGTH_MULT: f32 = 0.02;
const DEFAULT_RADIUS: f32 = 0.0025;

/// Per-point vector drawn as arrows on top of the points. Never takes over
/// point rendering; owns its own program.
pub struct VectorQuantity {
    name: String,
    parent: String,
    vectors: Vec<Vec3>,
    /// Vectors as uploaded, normalized by the longest one for `Standard`.
    mapped: Vec<Vec3>,
    vector_type: VectorType,
    color: Vec3,
    length_mult: f32,
    radius: f32,
    material: String,
    program: Option<Box<dyn GpuProgram>>,
}

impl VectorQuantity {
    pub fn new(
        name: impl Into<String>,
        parent: impl Into<String>,
        vectors: Vec<Vec3>,
        vector_type: VectorType,
        color: Vec3,
    ) -> Self {
        let mapped = match vector_type {
            VectorType::Standard => {
                let longest = vectors
                    .iter()
                    .map(|vector| vector.length())
                    .filter(|length| length.is_finite())
                    .fold(0.0_f32, f32::max);
                if longest > 0.0 {
                    vectors.iter().map(|vector| *vector / longest).collect()
                } else {
                    vectors.clone()
                }
            }
            VectorType::Ambient => vectors.clone(),
        };

        Self {
            name: name.into(),
            parent: parent.into(),
            vectors,
            mapped,
            vector_type,
            color,
            length_mult: DEFAULT_LENGTH_MULT,
            radius: DEFAULT_RADIUS,
            material: DEFAULT_MATERIAL.to_string(),
            program: None,
        }
    }

    pub fn vectors(&self) -> &[Vec3] {
        &self.vectors
    }

    pub fn vector_type(&self) -> VectorType {
        self.vector_type
    }

    pub fn color(&self) -> Vec3 {
        self.color
    }

    pub fn set_color(&mut self, color: Vec3) {
        self.color = color;
    }

    pub fn length_mult(&self) -> f32 {
        self.length_mult
    }

    pub fn set_length_mult(&mut self, length_mult: f32) {
        self.length_mult = length_mult.max(0.0);
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn set_radius(&mut self, radius: f32) {
        self.radius = radius.max(0.0);
    }

    pub fn has_program(&self) -> bool {
        self.program.is_some()
    }

    fn build_program(
        &self,
        backend: &mut dyn GraphicsBackend,
        points: &[Vec3],
    ) -> RenderResult<Box<dyn GpuProgram>> {
        let mut program = backend.create_program(&VECTOR_PROGRAM)?;
        program.set_attribute("a_position", AttributeData::Vec3(points))?;
        program.set_attribute("a_vector", AttributeData::Vec3(&self.mapped))?;
        material::apply_material(program.as_mut(), &self.material)?;
        Ok(program)
    }
}

impl PointCloudQuantity for VectorQuantity {
    fn name(&self) -> &str {
        &self.name
    }

    fn parent_name(&self) -> &str {
        &self.parent
    }

    fn value_count(&self) -> usize {
        self.vectors.len()
    }

    fn draw(&mut self, ctx: &mut QuantityDrawContext<'_>) -> RenderResult<()> {
        if self.program.is_none() {
            self.program = Some(self.build_program(&mut *ctx.backend, ctx.points)?);
        }
        let length_mult = match self.vector_type {
            VectorType::Standard => self.length_mult * ctx.view.length_scale,
            VectorType::Ambient => 1.0,
        };
        let radius = self.radius * ctx.view.length_scale;
        let color = self.color;
        let Some(program) = self.program.as_mut() else {
            return Ok(());
        };

        program.set_uniform("u_modelView", UniformValue::Mat4(ctx.model_view))?;
        program.set_uniform("u_projMatrix", UniformValue::Mat4(ctx.view.projection))?;
        program.set_uniform("u_lengthMult", UniformValue::Float(length_mult))?;
        program.set_uniform("u_radius", UniformValue::Float(radius))?;
        program.set_uniform("u_baseColor", UniformValue::Vec3(color))?;
        program.draw()
    }

    fn build_ui(&mut self, ui: &mut dyn Ui, enabled: bool) -> Option<QuantityUiAction> {
        let mut action = None;
        if ui.tree_node(&self.name) {
            let mut enabled = enabled;
            if ui.checkbox("Enabled", &mut enabled) {
                action = Some(QuantityUiAction::SetEnabled(enabled));
            }
            ui.same_line();
            ui.color_edit3("Color", &mut self.color);

            if self.vector_type == VectorType::Standard {
                let mut length_mult = self.length_mult;
                if ui.slider_float("Length", &mut length_mult, 0.0, 0.1) {
                    self.set_length_mult(length_mult);
                }
            }
            let mut radius = self.radius;
            if ui.slider_float("Radius", &mut radius, 0.0, 0.1) {
                self.set_radius(radius);
            }
            ui.tree_pop();
        }
        action
    }

    fn build_info_ui(&self, ui: &mut dyn Ui, point_index: usize) {
        let Some(vector) = self.vectors.get(point_index) else {
            return;
        };
        ui.text(&self.name);
        ui.next_column();
        ui.text(&format!("<{}, {}, {}>", vector.x, vector.y, vector.z));
        ui.next_column();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::HeadlessBackend;
    use crate::view::ViewParameters;
    use glam::Mat4;

    #[test]
    fn standard_vectors_are_normalized_by_longest() {
        let quantity = VectorQuantity::new(
            "flow",
            "cloud",
            vec![Vec3::new(2.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0)],
            VectorType::Standard,
            Vec3::ONE,
        );
        assert_eq!(quantity.mapped, vec![Vec3::X, Vec3::new(0.0, 0.5, 0.0)]);
        assert_eq!(quantity.vectors()[0], Vec3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn draw_builds_program_once_and_scales_uniforms() {
        let mut backend = HeadlessBackend::new();
        let stats = backend.stats();
        let points = [Vec3::ZERO, Vec3::ONE];
        let mut quantity = VectorQuantity::new(
            "flow",
            "cloud",
            vec![Vec3::X, Vec3::Y],
            VectorType::Standard,
            Vec3::new(0.1, 0.2, 0.3),
        );
        let view = ViewParameters {
            length_scale: 10.0,
            ..ViewParameters::default()
        };

        for _ in 0..2 {
            let mut ctx = QuantityDrawContext {
                backend: &mut backend,
                view: &view,
                model_view: Mat4::IDENTITY,
                points: &points,
            };
            quantity.draw(&mut ctx).unwrap();
        }

        assert_eq!(stats.counters().created_programs, 1);
        let draw = stats.last_draw().unwrap();
        assert_eq!(draw.program, "point vector");
        assert_eq!(draw.element_count, 2);
        assert_eq!(
            draw.uniforms["u_lengthMult"],
            UniformValue::Float(DEFAULT_LENGTH_MULT * 10.0)
        );
        assert_eq!(
            draw.uniforms["u_radius"],
            UniformValue::Float(DEFAULT_RADIUS * 10.0)
        );
    }

    #[test]
    fn dropping_quantity_releases_its_program() {
        let mut backend = HeadlessBackend::new();
        let stats = backend.stats();
        let points = [Vec3::ZERO];
        let mut quantity =
            VectorQuantity::new("flow", "cloud", vec![Vec3::X], VectorType::Ambient, Vec3::ONE);
        let view = ViewParameters::default();
        let mut ctx = QuantityDrawContext {
            backend: &mut backend,
            view: &view,
            model_view: Mat4::IDENTITY,
            points: &points,
        };
        quantity.draw(&mut ctx).unwrap();
        assert!(quantity.has_program());
        assert_eq!(stats.counters().live_programs, 1);

        drop(quantity);
        assert_eq!(stats.counters().live_programs, 0);
    }
}
