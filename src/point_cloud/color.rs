use super::quantity::{DrawsPoints, PointCloudQuantity, QuantityUiAction};
use crate::render::shaders::SPHERE_COLOR_PROGRAM;
use crate::render::{AttributeData, GpuProgram, GraphicsBackend, RenderResult};
use crate::ui::Ui;
use glam::Vec3;
use std::any::Any;

/// Per-point RGB color drawn directly onto the spheres.
pub struct ColorQuantity {
    name: String,
    parent: String,
    colors: Vec<Vec3>,
}

impl ColorQuantity {
    pub fn new(name: impl Into<String>, parent: impl Into<String>, colors: Vec<Vec3>) -> Self {
        Self {
            name: name.into(),
            parent: parent.into(),
            colors,
        }
    }

    pub fn colors(&self) -> &[Vec3] {
        &self.colors
    }
}

impl PointCloudQuantity for ColorQuantity {
    fn name(&self) -> &str {
        &self.name
    }

    fn parent_name(&self) -> &str {
        &self.parent
    }

    fn value_count(&self) -> usize {
        self.colors.len()
    }

    fn build_ui(&mut self, ui: &mut dyn Ui, enabled: bool) -> Option<QuantityUiAction> {
        let mut action = None;
        if ui.tree_node(&self.name) {
            let mut enabled = enabled;
            if ui.checkbox("Enabled", &mut enabled) {
                action = Some(QuantityUiAction::SetEnabled(enabled));
            }
            ui.tree_pop();
        }
        action
    }

    fn build_info_ui(&self, ui: &mut dyn Ui, point_index: usize) {
        let Some(color) = self.colors.get(point_index) else {
            return;
        };
        ui.text(&self.name);
        ui.next_column();
        ui.color_swatch(&self.name, *color);
        ui.same_line();
        ui.text(&format!("<{}, {}, {}>", color.x, color.y, color.z));
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

impl DrawsPoints for ColorQuantity {
    fn create_program(
        &self,
        backend: &mut dyn GraphicsBackend,
    ) -> RenderResult<Box<dyn GpuProgram>> {
        let mut program = backend.create_program(&SPHERE_COLOR_PROGRAM)?;
        program.set_attribute("a_color", AttributeData::Vec3(&self.colors))?;
        Ok(program)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::HeadlessBackend;
    use crate::ui::{RecordingUi, UiEvent};

    #[test]
    fn program_binds_colors() {
        let mut backend = HeadlessBackend::permissive();
        let quantity = ColorQuantity::new("rgb", "cloud", vec![Vec3::X, Vec3::Y]);
        let program = quantity.create_program(&mut backend).unwrap();
        assert_eq!(program.label(), "point sphere color");
        assert!(program.has_attribute("a_position"));
        assert!(!program.has_uniform("u_baseColor"));
    }

    #[test]
    fn info_row_shows_swatch_for_index() {
        let quantity = ColorQuantity::new("rgb", "cloud", vec![Vec3::X, Vec3::Y]);
        let mut ui = RecordingUi::new();
        quantity.build_info_ui(&mut ui, 1);
        quantity.build_info_ui(&mut ui, 7);

        assert_eq!(ui.texts(), vec!["rgb", "<0, 1, 0>"]);
        assert!(ui.events().contains(&UiEvent::ColorSwatch {
            label: "rgb".to_string(),
            color: Vec3::Y,
        }));
    }
}
