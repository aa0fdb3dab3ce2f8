//! Quantities attached to a point cloud, the registry that owns them, and the
//! slot recording which one currently draws the points.

use crate::render::{GpuProgram, GraphicsBackend, ProgramState, RenderResult};
use crate::ui::Ui;
use crate::view::ViewParameters;
use glam::{Mat4, Vec3};
use std::any::Any;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QuantityError {
    #[error(
        "quantity '{name}' has {actual} values but point cloud '{cloud}' has {expected} points"
    )]
    SizeMismatch {
        cloud: String,
        name: String,
        expected: usize,
        actual: usize,
    },
    #[error("quantity '{name}' was built for '{parent}', not point cloud '{cloud}'")]
    ForeignParent {
        cloud: String,
        name: String,
        parent: String,
    },
    #[error("no quantity named '{0}' registered")]
    NotFound(String),
    #[error("quantity '{0}' does not draw points")]
    NotPointDrawing(String),
}

pub type QuantityResult<T> = Result<T, QuantityError>;

/// What a quantity's own draw step may use.
pub struct QuantityDrawContext<'a> {
    pub backend: &'a mut dyn GraphicsBackend,
    pub view: &'a ViewParameters,
    pub model_view: Mat4,
    pub points: &'a [Vec3],
}

/// Requests a quantity's controls make of its owner. Quantities never flip
/// their own enabled state; the owning point cloud applies these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityUiAction {
    SetEnabled(bool),
    /// Settings baked into the point program changed.
    RebuildProgram,
}

pub trait PointCloudQuantity: Any + Send {
    fn name(&self) -> &str;

    /// Name of the point cloud this quantity was built for.
    fn parent_name(&self) -> &str;

    /// Number of per-point values; must match the parent's point count.
    fn value_count(&self) -> usize;

    /// Supplemental per-frame drawing. Only called while enabled.
    fn draw(&mut self, _ctx: &mut QuantityDrawContext<'_>) -> RenderResult<()> {
        Ok(())
    }

    fn build_ui(&mut self, ui: &mut dyn Ui, enabled: bool) -> Option<QuantityUiAction>;

    /// Contribution to the info panel for a picked point.
    fn build_info_ui(&self, _ui: &mut dyn Ui, _point_index: usize) {}

    /// Quantities able to take over point rendering return themselves here.
    fn as_point_drawer(&self) -> Option<&dyn DrawsPoints> {
        None
    }

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Capability of quantities that shade the points themselves.
pub trait DrawsPoints {
    /// Builds a program ready for the shared point uniforms; the caller binds
    /// positions and the material.
    fn create_program(&self, backend: &mut dyn GraphicsBackend)
    -> RenderResult<Box<dyn GpuProgram>>;

    /// Per-frame values, applied after the shared point uniforms.
    fn set_program_values(&self, _program: &mut dyn GpuProgram) -> RenderResult<()> {
        Ok(())
    }
}

struct QuantityEntry {
    quantity: Box<dyn PointCloudQuantity>,
    enabled: bool,
}

/// Non-owning reference, by name, to the quantity drawing the points.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ActiveSlot {
    name: Option<String>,
}

impl ActiveSlot {
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn is(&self, name: &str) -> bool {
        self.name.as_deref() == Some(name)
    }
}

/// Name-keyed quantity store.
///
/// Operations that change which quantity draws the points take the owner's
/// program so it can be discarded and rebuilt on next use.
#[derive(Default)]
pub struct QuantityRegistry {
    entries: BTreeMap<String, QuantityEntry>,
    active: ActiveSlot,
}

impl QuantityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn is_enabled(&self, name: &str) -> Option<bool> {
        self.entries.get(name).map(|entry| entry.enabled)
    }

    pub fn active(&self) -> &ActiveSlot {
        &self.active
    }

    pub fn get(&self, name: &str, error_if_absent: bool) -> Option<&dyn PointCloudQuantity> {
        match self.entries.get(name) {
            Some(entry) => Some(entry.quantity.as_ref()),
            None => {
                if error_if_absent {
                    log::error!("[point_cloud] no quantity named {name} registered");
                }
                None
            }
        }
    }

    pub fn get_typed<T: PointCloudQuantity>(&self, name: &str) -> Option<&T> {
        self.entries
            .get(name)?
            .quantity
            .as_any()
            .downcast_ref::<T>()
    }

    pub fn get_typed_mut<T: PointCloudQuantity>(&mut self, name: &str) -> Option<&mut T> {
        self.entries
            .get_mut(name)?
            .quantity
            .as_any_mut()
            .downcast_mut::<T>()
    }

    pub fn active_drawer(&self) -> Option<&dyn DrawsPoints> {
        let name = self.active.name()?;
        self.entries.get(name)?.quantity.as_point_drawer()
    }

    /// Inserts `quantity`, replacing any entry of the same name. A replaced
    /// entry's enabled state carries over to the newcomer.
    pub fn add(&mut self, quantity: Box<dyn PointCloudQuantity>, program: &mut ProgramState) {
        let name = quantity.name().to_string();
        let was_enabled = self.is_enabled(&name).unwrap_or(false);
        if self.remove(&name, program) {
            log::debug!("[point_cloud] replaced quantity {name}");
        }

        let draws_points = quantity.as_point_drawer().is_some();
        self.entries.insert(
            name.clone(),
            QuantityEntry {
                quantity,
                enabled: false,
            },
        );

        if !was_enabled {
            return;
        }
        if draws_points {
            // Cannot fail: the entry was just inserted and draws points.
            let _ = self.set_active(&name, program);
        } else if let Some(entry) = self.entries.get_mut(&name) {
            entry.enabled = true;
        }
    }

    /// Drops the named quantity, clearing the active slot first when it held
    /// it. Returns false if nothing was registered under `name`.
    pub fn remove(&mut self, name: &str, program: &mut ProgramState) -> bool {
        let Some(entry) = self.entries.remove(name) else {
            return false;
        };
        if self.active.is(name) {
            program.discard();
            self.active.name = None;
        }
        drop(entry);
        true
    }

    pub fn remove_all(&mut self, program: &mut ProgramState) {
        self.clear_active(program);
        let drained = std::mem::take(&mut self.entries);
        log::debug!("[point_cloud] dropping {} quantities", drained.len());
    }

    pub fn set_active(&mut self, name: &str, program: &mut ProgramState) -> QuantityResult<()> {
        let entry = self
            .entries
            .get(name)
            .ok_or_else(|| QuantityError::NotFound(name.to_string()))?;
        if entry.quantity.as_point_drawer().is_none() {
            return Err(QuantityError::NotPointDrawing(name.to_string()));
        }

        self.clear_active(program);
        if let Some(entry) = self.entries.get_mut(name) {
            entry.enabled = true;
        }
        self.active.name = Some(name.to_string());
        Ok(())
    }

    /// Discards the point program and disables the active quantity, if any.
    pub fn clear_active(&mut self, program: &mut ProgramState) {
        program.discard();
        if let Some(name) = self.active.name.take() {
            if let Some(entry) = self.entries.get_mut(&name) {
                entry.enabled = false;
            }
        }
    }

    /// Point-drawing quantities are enabled through the active slot; passive
    /// ones just flip their flag.
    pub fn set_enabled(
        &mut self,
        name: &str,
        enabled: bool,
        program: &mut ProgramState,
    ) -> QuantityResult<()> {
        let entry = self
            .entries
            .get_mut(name)
            .ok_or_else(|| QuantityError::NotFound(name.to_string()))?;

        if entry.quantity.as_point_drawer().is_none() {
            entry.enabled = enabled;
            return Ok(());
        }

        if enabled {
            self.set_active(name, program)
        } else {
            if self.active.is(name) {
                self.clear_active(program);
            }
            Ok(())
        }
    }

    pub fn apply_action(
        &mut self,
        name: &str,
        action: QuantityUiAction,
        program: &mut ProgramState,
    ) -> QuantityResult<()> {
        match action {
            QuantityUiAction::SetEnabled(enabled) => self.set_enabled(name, enabled, program),
            QuantityUiAction::RebuildProgram => {
                if self.active.is(name) {
                    program.discard();
                }
                Ok(())
            }
        }
    }

    pub fn draw_enabled(&mut self, ctx: &mut QuantityDrawContext<'_>) -> RenderResult<()> {
        for entry in self.entries.values_mut().filter(|entry| entry.enabled) {
            entry.quantity.draw(ctx)?;
        }
        Ok(())
    }

    /// Builds every quantity's controls and returns the actions they request,
    /// to be applied once iteration is over.
    pub fn build_ui(&mut self, ui: &mut dyn Ui) -> Vec<(String, QuantityUiAction)> {
        let mut actions = Vec::new();
        for (name, entry) in self.entries.iter_mut() {
            ui.push_id(name);
            if let Some(action) = entry.quantity.build_ui(ui, entry.enabled) {
                actions.push((name.clone(), action));
            }
            ui.pop_id();
        }
        actions
    }

    pub fn build_info_ui(&self, ui: &mut dyn Ui, point_index: usize) {
        for entry in self.entries.values() {
            entry.quantity.build_info_ui(ui, point_index);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::shaders::SPHERE_COLOR_PROGRAM;
    use crate::render::HeadlessBackend;

    struct Passive {
        name: String,
    }

    struct Drawer {
        name: String,
        tag: u32,
    }

    impl PointCloudQuantity for Passive {
        fn name(&self) -> &str {
            &self.name
        }
        fn parent_name(&self) -> &str {
            "cloud"
        }
        fn value_count(&self) -> usize {
            0
        }
        fn build_ui(&mut self, _ui: &mut dyn Ui, _enabled: bool) -> Option<QuantityUiAction> {
            None
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    impl PointCloudQuantity for Drawer {
        fn name(&self) -> &str {
            &self.name
        }
        fn parent_name(&self) -> &str {
            "cloud"
        }
        fn value_count(&self) -> usize {
            0
        }
        fn build_ui(&mut self, _ui: &mut dyn Ui, _enabled: bool) -> Option<QuantityUiAction> {
            None
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

    impl DrawsPoints for Drawer {
        fn create_program(
            &self,
            backend: &mut dyn GraphicsBackend,
        ) -> RenderResult<Box<dyn GpuProgram>> {
            backend.create_program(&SPHERE_COLOR_PROGRAM)
        }
    }

    fn passive(name: &str) -> Box<dyn PointCloudQuantity> {
        Box::new(Passive {
            name: name.to_string(),
        })
    }

    fn drawer(name: &str, tag: u32) -> Box<dyn PointCloudQuantity> {
        Box::new(Drawer {
            name: name.to_string(),
            tag,
        })
    }

    fn ready_program(backend: &mut HeadlessBackend) -> ProgramState {
        let mut program = ProgramState::default();
        program.finish_build(backend.create_program(&SPHERE_COLOR_PROGRAM).unwrap());
        program
    }

    #[test]
    fn quantities_start_disabled() {
        let mut registry = QuantityRegistry::new();
        let mut program = ProgramState::default();
        registry.add(passive("p"), &mut program);
        registry.add(drawer("d", 0), &mut program);
        assert_eq!(registry.is_enabled("p"), Some(false));
        assert_eq!(registry.is_enabled("d"), Some(false));
        assert_eq!(registry.active().name(), None);
    }

    #[test]
    fn same_name_replaces_entry() {
        let mut registry = QuantityRegistry::new();
        let mut program = ProgramState::default();
        registry.add(drawer("x", 1), &mut program);
        registry.add(drawer("x", 2), &mut program);

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get_typed::<Drawer>("x").map(|d| d.tag), Some(2));
    }

    #[test]
    fn replacing_active_drawer_keeps_it_active() {
        let mut backend = HeadlessBackend::new();
        let stats = backend.stats();
        let mut registry = QuantityRegistry::new();
        let mut program = ready_program(&mut backend);

        registry.add(drawer("x", 1), &mut program);
        registry.set_active("x", &mut program).unwrap();
        assert!(program.is_absent());

        program = ready_program(&mut backend);
        registry.add(drawer("x", 2), &mut program);
        assert!(program.is_absent());
        assert_eq!(stats.counters().live_programs, 0);
        assert_eq!(registry.active().name(), Some("x"));
        assert_eq!(registry.is_enabled("x"), Some(true));
        assert_eq!(registry.get_typed::<Drawer>("x").map(|d| d.tag), Some(2));
    }

    #[test]
    fn replacing_enabled_passive_keeps_it_enabled() {
        let mut registry = QuantityRegistry::new();
        let mut program = ProgramState::default();
        registry.add(passive("v"), &mut program);
        registry.set_enabled("v", true, &mut program).unwrap();
        registry.add(passive("v"), &mut program);

        assert_eq!(registry.is_enabled("v"), Some(true));
        assert_eq!(registry.active().name(), None);
    }

    #[test]
    fn enabled_passive_replaced_by_drawer_becomes_active() {
        let mut registry = QuantityRegistry::new();
        let mut program = ProgramState::default();
        registry.add(passive("q"), &mut program);
        registry.set_enabled("q", true, &mut program).unwrap();
        registry.add(drawer("q", 3), &mut program);

        assert_eq!(registry.active().name(), Some("q"));
        assert!(registry.active_drawer().is_some());
    }

    #[test]
    fn switching_active_disables_previous() {
        let mut registry = QuantityRegistry::new();
        let mut program = ProgramState::default();
        registry.add(drawer("q", 0), &mut program);
        registry.add(drawer("r", 0), &mut program);

        registry.set_active("q", &mut program).unwrap();
        registry.set_active("r", &mut program).unwrap();

        assert_eq!(registry.is_enabled("q"), Some(false));
        assert_eq!(registry.is_enabled("r"), Some(true));
        assert_eq!(registry.active().name(), Some("r"));
        let enabled = registry
            .names()
            .filter(|name| registry.is_enabled(name) == Some(true))
            .count();
        assert_eq!(enabled, 1);
    }

    #[test]
    fn passive_quantities_cannot_be_active() {
        let mut registry = QuantityRegistry::new();
        let mut program = ProgramState::default();
        registry.add(passive("p"), &mut program);
        assert_eq!(
            registry.set_active("p", &mut program),
            Err(QuantityError::NotPointDrawing("p".to_string()))
        );
        assert_eq!(
            registry.set_active("missing", &mut program),
            Err(QuantityError::NotFound("missing".to_string()))
        );
    }

    #[test]
    fn clear_active_is_idempotent() {
        let mut registry = QuantityRegistry::new();
        let mut program = ProgramState::default();
        registry.clear_active(&mut program);
        registry.clear_active(&mut program);
        assert_eq!(registry.active().name(), None);
        assert!(program.is_absent());
    }

    #[test]
    fn removing_active_clears_slot_and_program() {
        let mut backend = HeadlessBackend::new();
        let mut registry = QuantityRegistry::new();
        let mut program = ProgramState::default();
        registry.add(drawer("x", 0), &mut program);
        registry.set_active("x", &mut program).unwrap();

        program = ready_program(&mut backend);
        assert!(registry.remove("x", &mut program));
        assert!(program.is_absent());
        assert_eq!(registry.active().name(), None);
        assert!(!registry.remove("x", &mut program));
    }

    #[test]
    fn remove_all_empties_registry_and_slot() {
        let mut registry = QuantityRegistry::new();
        let mut program = ProgramState::default();
        registry.add(drawer("a", 0), &mut program);
        registry.add(passive("b"), &mut program);
        registry.add(drawer("c", 0), &mut program);
        registry.set_active("c", &mut program).unwrap();
        registry.set_enabled("b", true, &mut program).unwrap();

        registry.remove_all(&mut program);
        assert!(registry.is_empty());
        assert_eq!(registry.active().name(), None);
        assert!(registry.active_drawer().is_none());
    }

    #[test]
    fn rebuild_action_only_discards_for_active_quantity() {
        let mut backend = HeadlessBackend::new();
        let mut registry = QuantityRegistry::new();
        let mut program = ProgramState::default();
        registry.add(drawer("a", 0), &mut program);
        registry.add(drawer("b", 0), &mut program);
        registry.set_active("a", &mut program).unwrap();

        program = ready_program(&mut backend);
        registry
            .apply_action("b", QuantityUiAction::RebuildProgram, &mut program)
            .unwrap();
        assert!(program.is_ready());
        registry
            .apply_action("a", QuantityUiAction::RebuildProgram, &mut program)
            .unwrap();
        assert!(program.is_absent());
    }
}
