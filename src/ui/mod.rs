//! Narrow interface onto an immediate-mode widget library.
//!
//! Structures and quantities describe their controls through [`Ui`] each
//! frame; the widget library itself lives outside this crate.

mod recording;

pub use recording::{RecordingUi, UiEvent};

use glam::Vec3;

pub trait Ui {
    fn push_id(&mut self, id: &str);
    fn pop_id(&mut self);

    /// Returns true while the node is expanded; pair with [`Ui::tree_pop`].
    fn tree_node(&mut self, label: &str) -> bool;
    fn tree_pop(&mut self);

    fn text(&mut self, text: &str);
    fn same_line(&mut self);
    fn spacing(&mut self);
    fn indent(&mut self, amount: f32);
    fn columns(&mut self, count: usize);
    fn next_column(&mut self);

    fn checkbox(&mut self, label: &str, value: &mut bool) -> bool;
    fn color_edit3(&mut self, label: &str, color: &mut Vec3) -> bool;
    fn color_swatch(&mut self, label: &str, color: Vec3);
    fn slider_float(&mut self, label: &str, value: &mut f32, min: f32, max: f32) -> bool;
    fn combo(&mut self, label: &str, selected: &mut usize, items: &[&str]) -> bool;
    fn button(&mut self, label: &str) -> bool;

    fn open_popup(&mut self, id: &str);
    /// Returns true while the popup is open; pair with [`Ui::end_popup`].
    fn begin_popup(&mut self, id: &str) -> bool;
    fn end_popup(&mut self);
    fn menu_item(&mut self, label: &str) -> bool;
}

/// Asks the user for an output path. `None` or an empty string means the
/// user cancelled.
pub trait FilenamePrompt {
    fn prompt_for_filename(&mut self) -> Option<String>;
}

impl<F> FilenamePrompt for F
where
    F: FnMut() -> Option<String>,
{
    fn prompt_for_filename(&mut self) -> Option<String> {
        self()
    }
}

/// A prompt that always cancels.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPrompt;

impl FilenamePrompt for NoPrompt {
    fn prompt_for_filename(&mut self) -> Option<String> {
        None
    }
}
