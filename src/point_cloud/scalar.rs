use super::quantity::{DrawsPoints, PointCloudQuantity, QuantityUiAction};
use crate::render::colormap::Colormap;
use crate::render::shaders::SPHERE_VALUE_PROGRAM;
use crate::render::{AttributeData, GpuProgram, GraphicsBackend, RenderResult, UniformValue};
use crate::ui::Ui;
use serde::{Deserialize, Serialize};
use std::any::Any;

/// How a scalar's default visualization range is derived from its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DataType {
    /// Data minimum to data maximum.
    #[default]
    Standard,
    /// Centered on zero, extending to the largest magnitude.
    Symmetric,
    /// Zero to the data maximum.
    Magnitude,
}

/// Per-point scalar, drawn by mapping each value through a colormap.
pub struct ScalarQuantity {
    name: String,
    parent: String,
    values: Vec<f32>,
    data_type: DataType,
    data_range: (f32, f32),
    viz_range: (f32, f32),
    colormap: Colormap,
}

impl ScalarQuantity {
    pub fn new(
        name: impl Into<String>,
        parent: impl Into<String>,
        values: Vec<f32>,
        data_type: DataType,
    ) -> Self {
        let data_range = finite_range(&values);
        Self {
            name: name.into(),
            parent: parent.into(),
            values,
            data_type,
            data_range,
            viz_range: default_viz_range(data_range, data_type),
            colormap: Colormap::default(),
        }
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn data_range(&self) -> (f32, f32) {
        self.data_range
    }

    pub fn viz_range(&self) -> (f32, f32) {
        self.viz_range
    }

    pub fn set_viz_range(&mut self, low: f32, high: f32) {
        self.viz_range = (low.min(high), low.max(high));
    }

    pub fn reset_viz_range(&mut self) {
        self.viz_range = default_viz_range(self.data_range, self.data_type);
    }

    pub fn colormap(&self) -> Colormap {
        self.colormap
    }

    pub fn set_colormap(&mut self, colormap: Colormap) {
        self.colormap = colormap;
    }
}

/// Min and max over the finite values; `(0, 0)` when there are none.
fn finite_range(values: &[f32]) -> (f32, f32) {
    values
        .iter()
        .copied()
        .filter(|value| value.is_finite())
        .fold(None, |range: Option<(f32, f32)>, value| match range {
            None => Some((value, value)),
            Some((low, high)) => Some((low.min(value), high.max(value))),
        })
        .unwrap_or((0.0, 0.0))
}

fn default_viz_range((low, high): (f32, f32), data_type: DataType) -> (f32, f32) {
    match data_type {
        DataType::Standard => (low, high),
        DataType::Symmetric => {
            let extent = low.abs().max(high.abs());
            (-extent, extent)
        }
        DataType::Magnitude => (0.0, high.max(0.0)),
    }
}

impl PointCloudQuantity for ScalarQuantity {
    fn name(&self) -> &str {
        &self.name
    }

    fn parent_name(&self) -> &str {
        &self.parent
    }

    fn value_count(&self) -> usize {
        self.values.len()
    }

    fn build_ui(&mut self, ui: &mut dyn Ui, enabled: bool) -> Option<QuantityUiAction> {
        let mut action = None;
        if ui.tree_node(&self.name) {
            let mut enabled = enabled;
            if ui.checkbox("Enabled", &mut enabled) {
                action = Some(QuantityUiAction::SetEnabled(enabled));
            }
            ui.same_line();

            let mut selected = self.colormap.position();
            if ui.combo("Colormap", &mut selected, &Colormap::names()) {
                if let Some(colormap) = Colormap::ALL.get(selected) {
                    self.colormap = *colormap;
                }
            }

            let (data_low, data_high) = default_viz_range(self.data_range, self.data_type);
            let (mut low, mut high) = self.viz_range;
            let low_changed = ui.slider_float("Range low", &mut low, data_low, data_high);
            let high_changed = ui.slider_float("Range high", &mut high, data_low, data_high);
            if low_changed || high_changed {
                self.set_viz_range(low, high);
            }
            if ui.button("Reset range") {
                self.reset_viz_range();
            }
            ui.tree_pop();
        }
        action
    }

    fn build_info_ui(&self, ui: &mut dyn Ui, point_index: usize) {
        let Some(value) = self.values.get(point_index) else {
            return;
        };
        ui.text(&self.name);
        ui.next_column();
        ui.text(&value.to_string());
        ui.next_column();
    }

    fn as_point_drawer(&self) -> Option<&dyn DrawsPoints> {
        Some(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl DrawsPoints for ScalarQuantity {
    fn create_program(
        &self,
        backend: &mut dyn GraphicsBackend,
    ) -> RenderResult<Box<dyn GpuProgram>> {
        let mut program = backend.create_program(&SPHERE_VALUE_PROGRAM)?;
        program.set_attribute("a_value", AttributeData::Float(&self.values))?;
        Ok(program)
    }

    fn set_program_values(&self, program: &mut dyn GpuProgram) -> RenderResult<()> {
        program.set_uniform("u_rangeLow", UniformValue::Float(self.viz_range.0))?;
        program.set_uniform("u_rangeHigh", UniformValue::Float(self.viz_range.1))?;
        program.set_uniform(
            "u_colormap",
            UniformValue::Int(self.colormap.shader_index()),
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::{RecordingUi, UiEvent};

    fn scalar(values: Vec<f32>, data_type: DataType) -> ScalarQuantity {
        ScalarQuantity::new("height", "cloud", values, data_type)
    }

    #[test]
    fn viz_range_follows_data_type() {
        let values = vec![-2.0, 0.5, 1.0];
        assert_eq!(scalar(values.clone(), DataType::Standard).viz_range(), (-2.0, 1.0));
        assert_eq!(scalar(values.clone(), DataType::Symmetric).viz_range(), (-2.0, 2.0));
        assert_eq!(scalar(values, DataType::Magnitude).viz_range(), (0.0, 1.0));
    }

    #[test]
    fn non_finite_values_are_ignored_for_ranges() {
        let quantity = scalar(vec![f32::NAN, 3.0, f32::INFINITY, -1.0], DataType::Standard);
        assert_eq!(quantity.data_range(), (-1.0, 3.0));
        assert_eq!(scalar(Vec::new(), DataType::Standard).data_range(), (0.0, 0.0));
    }

    #[test]
    fn program_values_carry_range_and_colormap() {
        let mut backend = crate::render::HeadlessBackend::permissive();
        let stats = backend.stats();
        let mut quantity = scalar(vec![0.0, 4.0], DataType::Standard);
        quantity.set_colormap(Colormap::Reds);
        quantity.set_viz_range(3.0, 1.0);

        let mut program = quantity.create_program(&mut backend).unwrap();
        program
            .set_attribute(
                "a_position",
                AttributeData::Vec3(&[glam::Vec3::ZERO, glam::Vec3::ONE]),
            )
            .unwrap();
        quantity.set_program_values(program.as_mut()).unwrap();
        program.draw().unwrap();

        let draw = stats.last_draw().unwrap();
        assert_eq!(draw.element_count, 2);
        assert_eq!(draw.uniforms["u_rangeLow"], UniformValue::Float(1.0));
        assert_eq!(draw.uniforms["u_rangeHigh"], UniformValue::Float(3.0));
        assert_eq!(
            draw.uniforms["u_colormap"],
            UniformValue::Int(Colormap::Reds.shader_index())
        );
    }

    #[test]
    fn toggling_the_checkbox_requests_enable() {
        let mut quantity = scalar(vec![1.0], DataType::Standard);
        let mut ui = RecordingUi::new();
        ui.set_checkbox("height", "Enabled", true);

        ui.push_id("height");
        let action = quantity.build_ui(&mut ui, false);
        ui.pop_id();

        assert_eq!(action, Some(QuantityUiAction::SetEnabled(true)));
        assert!(ui.events().contains(&UiEvent::Checkbox {
            label: "Enabled".to_string(),
            value: true,
        }));
    }

    #[test]
    fn colormap_combo_switches_colormap() {
        let mut quantity = scalar(vec![1.0], DataType::Standard);
        let mut ui = RecordingUi::new();
        ui.set_combo("height", "Colormap", Colormap::Coolwarm.position());

        ui.push_id("height");
        assert_eq!(quantity.build_ui(&mut ui, true), None);
        ui.pop_id();

        assert_eq!(quantity.colormap(), Colormap::Coolwarm);
    }
}
