use super::Ui;
use glam::Vec3;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    Text(String),
    TreeNode(String),
    Checkbox { label: String, value: bool },
    Button(String),
    MenuItem(String),
    Slider { label: String, value: f32 },
    Combo { label: String, selected: usize },
    ColorSwatch { label: String, color: Vec3 },
}

/// Headless [`Ui`] that expands every tree node, answers interactions from a
/// script, and records what was shown.
///
/// Scripted interactions are consumed the first time the matching widget is
/// drawn, mimicking a single click.
#[derive(Debug, Default)]
pub struct RecordingUi {
    events: Vec<UiEvent>,
    id_stack: Vec<String>,
    open_popups: HashSet<String>,
    clicks: HashSet<String>,
    toggles: HashMap<String, bool>,
    slider_values: HashMap<String, f32>,
    combo_choices: HashMap<String, usize>,
    colors: HashMap<String, Vec3>,
}

impl RecordingUi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules a click on the button or menu item with `label`.
    pub fn click(&mut self, label: &str) -> &mut Self {
        self.clicks.insert(label.to_string());
        self
    }

    /// Schedules a checkbox change. `scope` is the innermost pushed id (the
    /// owning structure or quantity name).
    pub fn set_checkbox(&mut self, scope: &str, label: &str, value: bool) -> &mut Self {
        self.toggles.insert(scoped(scope, label), value);
        self
    }

    pub fn set_slider(&mut self, scope: &str, label: &str, value: f32) -> &mut Self {
        self.slider_values.insert(scoped(scope, label), value);
        self
    }

    pub fn set_combo(&mut self, scope: &str, label: &str, selected: usize) -> &mut Self {
        self.combo_choices.insert(scoped(scope, label), selected);
        self
    }

    pub fn set_color(&mut self, scope: &str, label: &str, color: Vec3) -> &mut Self {
        self.colors.insert(scoped(scope, label), color);
        self
    }

    pub fn events(&self) -> &[UiEvent] {
        &self.events
    }

    pub fn texts(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|event| match event {
                UiEvent::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    fn scope_key(&self, label: &str) -> String {
        scoped(
            self.id_stack.last().map(String::as_str).unwrap_or_default(),
            label,
        )
    }
}

fn scoped(scope: &str, label: &str) -> String {
    format!("{scope}/{label}")
}

impl Ui for RecordingUi {
    fn push_id(&mut self, id: &str) {
        self.id_stack.push(id.to_string());
    }

    fn pop_id(&mut self) {
        self.id_stack.pop();
    }

    fn tree_node(&mut self, label: &str) -> bool {
        self.events.push(UiEvent::TreeNode(label.to_string()));
        true
    }

    fn tree_pop(&mut self) {}

    fn text(&mut self, text: &str) {
        self.events.push(UiEvent::Text(text.to_string()));
    }

    fn same_line(&mut self) {}

    fn spacing(&mut self) {}

    fn indent(&mut self, _amount: f32) {}

    fn columns(&mut self, _count: usize) {}

    fn next_column(&mut self) {}

    fn checkbox(&mut self, label: &str, value: &mut bool) -> bool {
        let key = self.scope_key(label);
        let changed = match self.toggles.remove(&key) {
            Some(next) if next != *value => {
                *value = next;
                true
            }
            _ => false,
        };
        self.events.push(UiEvent::Checkbox {
            label: label.to_string(),
            value: *value,
        });
        changed
    }

    fn color_edit3(&mut self, label: &str, color: &mut Vec3) -> bool {
        let key = self.scope_key(label);
        match self.colors.remove(&key) {
            Some(next) => {
                *color = next;
                true
            }
            None => false,
        }
    }

    fn color_swatch(&mut self, label: &str, color: Vec3) {
        self.events.push(UiEvent::ColorSwatch {
            label: label.to_string(),
            color,
        });
    }

    fn slider_float(&mut self, label: &str, value: &mut f32, min: f32, max: f32) -> bool {
        let key = self.scope_key(label);
        let changed = match self.slider_values.remove(&key) {
            Some(next) => {
                *value = next.clamp(min, max);
                true
            }
            None => false,
        };
        self.events.push(UiEvent::Slider {
            label: label.to_string(),
            value: *value,
        });
        changed
    }

    fn combo(&mut self, label: &str, selected: &mut usize, items: &[&str]) -> bool {
        let key = self.scope_key(label);
        let changed = match self.combo_choices.remove(&key) {
            Some(next) if next < items.len() && next != *selected => {
                *selected = next;
                true
            }
            _ => false,
        };
        self.events.push(UiEvent::Combo {
            label: label.to_string(),
            selected: *selected,
        });
        changed
    }

    fn button(&mut self, label: &str) -> bool {
        self.events.push(UiEvent::Button(label.to_string()));
        self.clicks.remove(label)
    }

    fn open_popup(&mut self, id: &str) {
        self.open_popups.insert(id.to_string());
    }

    fn begin_popup(&mut self, id: &str) -> bool {
        self.open_popups.contains(id)
    }

    fn end_popup(&mut self) {}

    fn menu_item(&mut self, label: &str) -> bool {
        self.events.push(UiEvent::MenuItem(label.to_string()));
        let clicked = self.clicks.remove(label);
        if clicked {
            self.open_popups.clear();
        }
        clicked
    }
}
