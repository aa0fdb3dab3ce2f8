//! Point cloud structure: points, attached quantities, and the render and
//! pick state derived from them.

mod color;
mod io;
mod quantity;
mod scalar;
mod vector;

pub use color::ColorQuantity;
pub use io::{
    PersistenceError, PersistenceResult, PointFile, format_point, read_points,
    read_points_from_file, write_points,
};
pub use quantity::{
    ActiveSlot, DrawsPoints, PointCloudQuantity, QuantityDrawContext, QuantityError,
    QuantityRegistry, QuantityResult, QuantityUiAction,
};
pub use scalar::{DataType, ScalarQuantity};
pub use vector::{VectorQuantity, VectorType};

use crate::color::SubColorManager;
use crate::pick::{self, PickOwner, PickRegistry};
use crate::render::material::{self, DEFAULT_MATERIAL};
use crate::render::shaders::{SPHERE_PICK_PROGRAM, SPHERE_PROGRAM};
use crate::render::{
    AttributeData, FrameContext, GpuProgram, GraphicsBackend, ProgramState, RenderError,
    RenderResult, UniformValue,
};
use crate::standardize::{Point3Source, standardize_points, standardize_scalars};
use crate::structure::{Structure, UiContext};
use crate::ui::Ui;
use crate::view::{CameraFrame, ViewParameters};
use glam::{Mat4, Vec3};
use rayon::prelude::*;
use std::any::Any;
use std::ops::Range;

pub const POINT_CLOUD_TYPE: &str = "Point Cloud";

pub const DEFAULT_POINT_RADIUS: f32 = 0.005;
const MAX_POINT_RADIUS: f32 = 0.1;

#[derive(Debug, Clone, PartialEq)]
pub struct PointCloudOptions {
    pub base_color: Vec3,
    /// Relative to the scene length scale.
    pub point_radius: f32,
    pub material: String,
}

impl Default for PointCloudOptions {
    fn default() -> Self {
        Self {
            base_color: Vec3::new(0.216, 0.494, 0.722),
            point_radius: DEFAULT_POINT_RADIUS,
            material: DEFAULT_MATERIAL.to_string(),
        }
    }
}

struct PickBuffer {
    start: u64,
    colors: Vec<Vec3>,
    program: Box<dyn GpuProgram>,
}

/// Uniforms shared by the shaded and pick passes.
#[derive(Debug, Clone, Copy)]
struct PointUniforms {
    model_view: Mat4,
    projection: Mat4,
    frame: CameraFrame,
    point_radius: f32,
    base_color: Vec3,
}

impl PointUniforms {
    fn apply(&self, program: &mut dyn GpuProgram) -> RenderResult<()> {
        program.set_uniform("u_modelView", UniformValue::Mat4(self.model_view))?;
        program.set_uniform("u_projMatrix", UniformValue::Mat4(self.projection))?;
        program.set_uniform("u_camZ", UniformValue::Vec3(self.frame.look))?;
        program.set_uniform("u_camUp", UniformValue::Vec3(self.frame.up))?;
        program.set_uniform("u_camRight", UniformValue::Vec3(self.frame.right))?;
        program.set_uniform("u_pointRadius", UniformValue::Float(self.point_radius))?;
        if program.has_uniform("u_baseColor") {
            program.set_uniform("u_baseColor", UniformValue::Vec3(self.base_color))?;
        }
        Ok(())
    }
}

pub struct PointCloud {
    name: String,
    points: Vec<Vec3>,
    enabled: bool,
    transform: Mat4,
    quantities: QuantityRegistry,
    program: ProgramState,
    pick: Option<PickBuffer>,
    initial_base_color: Vec3,
    base_color: Vec3,
    color_manager: SubColorManager,
    point_radius: f32,
    material: String,
}

impl PointCloud {
    pub fn new<I>(name: impl Into<String>, points: I, options: PointCloudOptions) -> Self
    where
        I: IntoIterator,
        I::Item: Point3Source,
    {
        Self {
            name: name.into(),
            points: standardize_points(points),
            enabled: true,
            transform: Mat4::IDENTITY,
            quantities: QuantityRegistry::new(),
            program: ProgramState::default(),
            pick: None,
            initial_base_color: options.base_color,
            base_color: options.base_color,
            color_manager: SubColorManager::new(options.base_color),
            point_radius: options.point_radius,
            material: options.material,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    pub fn n_points(&self) -> usize {
        self.points.len()
    }

    pub fn base_color(&self) -> Vec3 {
        self.base_color
    }

    pub fn set_base_color(&mut self, color: Vec3) {
        self.base_color = color;
    }

    /// Color assigned at construction, before any edits.
    pub fn initial_base_color(&self) -> Vec3 {
        self.initial_base_color
    }

    pub fn point_radius(&self) -> f32 {
        self.point_radius
    }

    pub fn set_point_radius(&mut self, radius: f32) {
        self.point_radius = radius.max(0.0);
    }

    pub fn material(&self) -> &str {
        &self.material
    }

    /// Materials are baked in at prepare time, so this drops the program.
    pub fn set_material(&mut self, material: impl Into<String>) -> RenderResult<()> {
        let material = material.into();
        if material::material(&material).is_none() {
            return Err(RenderError::UnknownMaterial(material));
        }
        self.material = material;
        self.program.discard();
        Ok(())
    }

    /// Label of the current point program, if one is built.
    pub fn program_label(&self) -> Option<&str> {
        self.program.label()
    }

    pub fn program_state(&self) -> &ProgramState {
        &self.program
    }

    // Quantities

    pub fn quantities(&self) -> &QuantityRegistry {
        &self.quantities
    }

    pub fn add_quantity(&mut self, quantity: Box<dyn PointCloudQuantity>) -> QuantityResult<()> {
        if quantity.parent_name() != self.name {
            return Err(self.reject(QuantityError::ForeignParent {
                cloud: self.name.clone(),
                name: quantity.name().to_string(),
                parent: quantity.parent_name().to_string(),
            }));
        }
        if quantity.value_count() != self.points.len() {
            return Err(self.reject(QuantityError::SizeMismatch {
                cloud: self.name.clone(),
                name: quantity.name().to_string(),
                expected: self.points.len(),
                actual: quantity.value_count(),
            }));
        }
        self.quantities.add(quantity, &mut self.program);
        Ok(())
    }

    pub fn add_scalar_quantity<I>(
        &mut self,
        name: impl Into<String>,
        values: I,
        data_type: DataType,
    ) -> QuantityResult<()>
    where
        I: IntoIterator,
        I::Item: Into<f64>,
    {
        let quantity = ScalarQuantity::new(
            name,
            self.name.clone(),
            standardize_scalars(values),
            data_type,
        );
        self.add_quantity(Box::new(quantity))
    }

    pub fn add_color_quantity<I>(&mut self, name: impl Into<String>, colors: I) -> QuantityResult<()>
    where
        I: IntoIterator,
        I::Item: Point3Source,
    {
        let quantity = ColorQuantity::new(name, self.name.clone(), standardize_points(colors));
        self.add_quantity(Box::new(quantity))
    }

    pub fn add_vector_quantity<I>(
        &mut self,
        name: impl Into<String>,
        vectors: I,
        vector_type: VectorType,
    ) -> QuantityResult<()>
    where
        I: IntoIterator,
        I::Item: Point3Source,
    {
        let vectors = standardize_points(vectors);
        if vectors.len() != self.points.len() {
            // Checked before a sub-color is consumed.
            return Err(self.reject(QuantityError::SizeMismatch {
                cloud: self.name.clone(),
                name: name.into(),
                expected: self.points.len(),
                actual: vectors.len(),
            }));
        }
        let color = self.color_manager.next_sub_color();
        let quantity = VectorQuantity::new(name, self.name.clone(), vectors, vector_type, color);
        self.add_quantity(Box::new(quantity))
    }

    pub fn quantity(&self, name: &str, error_if_absent: bool) -> Option<&dyn PointCloudQuantity> {
        self.quantities.get(name, error_if_absent)
    }

    pub fn quantity_typed<T: PointCloudQuantity>(&self, name: &str) -> Option<&T> {
        self.quantities.get_typed(name)
    }

    pub fn quantity_typed_mut<T: PointCloudQuantity>(&mut self, name: &str) -> Option<&mut T> {
        self.quantities.get_typed_mut(name)
    }

    pub fn is_quantity_enabled(&self, name: &str) -> Option<bool> {
        self.quantities.is_enabled(name)
    }

    pub fn remove_quantity(&mut self, name: &str) -> bool {
        self.quantities.remove(name, &mut self.program)
    }

    pub fn remove_all_quantities(&mut self) {
        self.quantities.remove_all(&mut self.program);
    }

    pub fn set_active_quantity(&mut self, name: &str) -> QuantityResult<()> {
        let result = self.quantities.set_active(name, &mut self.program);
        result.map_err(|err| self.reject(err))
    }

    pub fn clear_active_quantity(&mut self) {
        self.quantities.clear_active(&mut self.program);
    }

    pub fn active_quantity_name(&self) -> Option<&str> {
        self.quantities.active().name()
    }

    pub fn set_quantity_enabled(&mut self, name: &str, enabled: bool) -> QuantityResult<()> {
        let result = self.quantities.set_enabled(name, enabled, &mut self.program);
        result.map_err(|err| self.reject(err))
    }

    fn reject(&self, err: QuantityError) -> QuantityError {
        log::error!("[point_cloud] {}: {err}", self.name);
        err
    }

    // Picking

    pub fn pick_owner(&self) -> PickOwner {
        PickOwner::new(POINT_CLOUD_TYPE, self.name.clone())
    }

    /// Global pick identifiers currently assigned to this cloud's points.
    pub fn pick_ids(&self) -> Option<Range<u64>> {
        self.pick
            .as_ref()
            .map(|pick| pick.start..pick.start + pick.colors.len() as u64)
    }

    pub fn pick_colors(&self) -> Option<&[Vec3]> {
        self.pick.as_ref().map(|pick| pick.colors.as_slice())
    }

    /// Point index encoded by a global pick identifier, if it is one of ours.
    pub fn local_pick_index(&self, id: u64) -> Option<usize> {
        let ids = self.pick_ids()?;
        ids.contains(&id).then(|| (id - ids.start) as usize)
    }

    // Geometry

    /// Axis-aligned bounds of the transformed points. An empty cloud returns
    /// `(+inf, -inf)`.
    pub fn bounding_box(&self) -> (Vec3, Vec3) {
        bounds_of(&self.points, self.transform)
    }

    /// Twice the largest distance from a point to the center of the points'
    /// own bounding box; zero for an empty cloud.
    pub fn length_scale(&self) -> f32 {
        if self.points.is_empty() {
            return 0.0;
        }
        let (low, high) = bounds_of(&self.points, Mat4::IDENTITY);
        let center = 0.5 * (low + high);
        let farthest = self
            .points
            .par_iter()
            .map(|point| point.distance_squared(center))
            .reduce(|| 0.0, f32::max);
        2.0 * farthest.sqrt()
    }

    fn uniforms(&self, view: &ViewParameters) -> PointUniforms {
        PointUniforms {
            model_view: view.view * self.transform,
            projection: view.projection,
            frame: view.frame,
            point_radius: self.point_radius * view.length_scale,
            base_color: self.base_color,
        }
    }

    fn build_program(&self, backend: &mut dyn GraphicsBackend) -> RenderResult<Box<dyn GpuProgram>> {
        let mut program = match self.quantities.active_drawer() {
            Some(drawer) => drawer.create_program(backend)?,
            None => backend.create_program(&SPHERE_PROGRAM)?,
        };
        material::apply_material(program.as_mut(), &self.material)?;
        program.set_attribute("a_position", AttributeData::Vec3(&self.points))?;
        Ok(program)
    }
}

impl std::fmt::Debug for PointCloud {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PointCloud")
            .field("name", &self.name)
            .field("points", &self.points.len())
            .field("enabled", &self.enabled)
            .field("quantities", &self.quantities.names().collect::<Vec<_>>())
            .field("active", &self.quantities.active().name())
            .field("program", &self.program)
            .field("pick_ids", &self.pick_ids())
            .finish()
    }
}

fn bounds_of(points: &[Vec3], transform: Mat4) -> (Vec3, Vec3) {
    let seed = (Vec3::splat(f32::INFINITY), Vec3::splat(f32::NEG_INFINITY));
    points
        .par_iter()
        .map(|point| transform.transform_point3(*point))
        .fold(|| seed, |(low, high), point| (low.min(point), high.max(point)))
        .reduce(
            || seed,
            |(low_a, high_a), (low_b, high_b)| (low_a.min(low_b), high_a.max(high_b)),
        )
}

impl Structure for PointCloud {
    fn name(&self) -> &str {
        &self.name
    }

    fn type_name(&self) -> &'static str {
        POINT_CLOUD_TYPE
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn transform(&self) -> Mat4 {
        self.transform
    }

    fn set_transform(&mut self, transform: Mat4) {
        self.transform = transform;
    }

    fn prepare(&mut self, backend: &mut dyn GraphicsBackend) -> RenderResult<()> {
        self.program.begin_build()?;
        match self.build_program(backend) {
            Ok(program) => {
                log::debug!(
                    "[point_cloud] {} prepared program '{}'",
                    self.name,
                    program.label()
                );
                self.program.finish_build(program);
                Ok(())
            }
            Err(err) => {
                self.program.abort_build();
                log::error!("[point_cloud] {} failed to build program: {err}", self.name);
                Err(err)
            }
        }
    }

    fn prepare_pick(
        &mut self,
        backend: &mut dyn GraphicsBackend,
        picks: &mut PickRegistry,
    ) -> RenderResult<()> {
        self.pick = None;
        let start = picks.request_range(self.pick_owner(), self.points.len());
        let colors: Vec<Vec3> = (0..self.points.len() as u64)
            .into_par_iter()
            .map(|offset| pick::id_to_color(start + offset))
            .collect();

        let mut program = backend.create_program(&SPHERE_PICK_PROGRAM)?;
        program.set_attribute("a_position", AttributeData::Vec3(&self.points))?;
        program.set_attribute("a_color", AttributeData::Vec3(&colors))?;
        self.pick = Some(PickBuffer {
            start,
            colors,
            program,
        });
        Ok(())
    }

    fn draw(&mut self, ctx: &mut FrameContext<'_>) -> RenderResult<()> {
        if !self.enabled {
            return Ok(());
        }
        if !self.program.is_ready() {
            self.prepare(&mut *ctx.backend)?;
        }

        let uniforms = self.uniforms(ctx.view);
        let program = self
            .program
            .ready_mut()
            .ok_or_else(|| RenderError::ProgramNotReady(self.name.clone()))?;
        uniforms.apply(program)?;
        if let Some(drawer) = self.quantities.active_drawer() {
            drawer.set_program_values(program)?;
        }
        program.draw()?;

        let mut quantity_ctx = QuantityDrawContext {
            backend: &mut *ctx.backend,
            view: ctx.view,
            model_view: uniforms.model_view,
            points: &self.points,
        };
        self.quantities.draw_enabled(&mut quantity_ctx)
    }

    fn draw_pick(&mut self, ctx: &mut FrameContext<'_>) -> RenderResult<()> {
        if !self.enabled {
            return Ok(());
        }
        let uniforms = self.uniforms(ctx.view);
        let Some(pick) = self.pick.as_mut() else {
            log::warn!("[point_cloud] {} has no pick buffer", self.name);
            return Ok(());
        };
        uniforms.apply(pick.program.as_mut())?;
        pick.program.draw()
    }

    fn build_ui(&mut self, ui: &mut dyn Ui, ctx: &mut UiContext<'_>) {
        ui.push_id(&self.name);
        if ui.tree_node(&self.name) {
            ui.text(&format!("# points: {}", self.points.len()));
            ui.checkbox("Enabled", &mut self.enabled);
            ui.same_line();
            ui.color_edit3("Point color", &mut self.base_color);
            ui.same_line();

            if ui.button("Options") {
                ui.open_popup("OptionsPopup");
            }
            if ui.begin_popup("OptionsPopup") {
                if ui.menu_item("Clear Quantities") {
                    self.remove_all_quantities();
                }
                if ui.menu_item("Write points to file") {
                    if let Err(err) =
                        self.write_points_to_file(None, ctx.prompt, ctx.app_name, ctx.length_scale)
                    {
                        log::error!("[point_cloud] {} export failed: {err}", self.name);
                    }
                }
                ui.end_popup();
            }

            let mut radius = self.point_radius;
            if ui.slider_float("Point Radius", &mut radius, 0.0, MAX_POINT_RADIUS) {
                self.set_point_radius(radius);
            }

            for (name, action) in self.quantities.build_ui(ui) {
                if let Err(err) = self.quantities.apply_action(&name, action, &mut self.program) {
                    log::error!("[point_cloud] {}: {err}", self.name);
                }
            }
            ui.tree_pop();
        }
        ui.pop_id();
    }

    fn build_pick_ui(&self, ui: &mut dyn Ui, local_index: usize) {
        let Some(point) = self.points.get(local_index) else {
            log::warn!(
                "[point_cloud] {} has no point {local_index} to describe",
                self.name
            );
            return;
        };
        ui.text(&format!("#{local_index}  "));
        ui.same_line();
        ui.text(&format_point(*point));

        ui.spacing();
        ui.spacing();
        ui.spacing();
        ui.indent(20.0);

        ui.columns(2);
        self.quantities.build_info_ui(ui, local_index);
        ui.columns(1);

        ui.indent(-20.0);
    }

    fn length_scale(&self) -> f32 {
        PointCloud::length_scale(self)
    }

    fn bounding_box(&self) -> (Vec3, Vec3) {
        PointCloud::bounding_box(self)
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
    use crate::ui::{NoPrompt, RecordingUi, UiEvent};

    fn cloud(points: Vec<Vec3>) -> PointCloud {
        PointCloud::new("cloud", points, PointCloudOptions::default())
    }

    fn square() -> PointCloud {
        cloud(vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ])
    }

    fn draw(cloud: &mut PointCloud, backend: &mut HeadlessBackend) -> RenderResult<()> {
        let view = ViewParameters::default();
        let mut ctx = FrameContext::new(backend, &view);
        cloud.draw(&mut ctx)
    }

    #[test]
    fn accepts_any_coordinate_source() {
        let from_arrays = PointCloud::new("a", [[1.0_f64, 2.0, 3.0]], PointCloudOptions::default());
        let from_tuples = PointCloud::new("b", vec![(1.0_f32, 2.0, 3.0)], PointCloudOptions::default());
        assert_eq!(from_arrays.points(), from_tuples.points());
        assert_eq!(from_arrays.n_points(), 1);
    }

    #[test]
    fn size_mismatch_leaves_registry_untouched() {
        let mut cloud = square();
        let err = cloud
            .add_scalar_quantity("short", [1.0_f32, 2.0], DataType::Standard)
            .unwrap_err();
        assert_eq!(
            err,
            QuantityError::SizeMismatch {
                cloud: "cloud".to_string(),
                name: "short".to_string(),
                expected: 4,
                actual: 2,
            }
        );
        assert!(cloud.quantities().is_empty());
        assert!(cloud.add_vector_quantity("v", [Vec3::X], VectorType::Standard).is_err());
        assert!(cloud.quantities().is_empty());
    }

    #[test]
    fn foreign_quantities_are_rejected() {
        let mut cloud = square();
        let stray = ScalarQuantity::new("s", "other", vec![0.0; 4], DataType::Standard);
        assert!(matches!(
            cloud.add_quantity(Box::new(stray)),
            Err(QuantityError::ForeignParent { .. })
        ));
    }

    #[test]
    fn default_program_is_plain_sphere() {
        let mut backend = HeadlessBackend::new();
        let stats = backend.stats();
        let mut cloud = square();
        draw(&mut cloud, &mut backend).unwrap();

        assert_eq!(cloud.program_label(), Some("point sphere"));
        let record = stats.last_draw().unwrap();
        assert_eq!(record.element_count, 4);
        assert_eq!(
            record.uniforms["u_pointRadius"],
            UniformValue::Float(DEFAULT_POINT_RADIUS)
        );
        assert_eq!(
            record.uniforms["u_baseColor"],
            UniformValue::Vec3(cloud.base_color())
        );
    }

    #[test]
    fn active_quantity_supplies_program() {
        let mut backend = HeadlessBackend::new();
        let stats = backend.stats();
        let mut cloud = square();
        cloud
            .add_scalar_quantity("height", [0.0_f32, 1.0, 2.0, 3.0], DataType::Standard)
            .unwrap();
        draw(&mut cloud, &mut backend).unwrap();
        assert_eq!(cloud.program_label(), Some("point sphere"));

        cloud.set_active_quantity("height").unwrap();
        assert_eq!(cloud.program_label(), None);
        draw(&mut cloud, &mut backend).unwrap();
        assert_eq!(cloud.program_label(), Some("point sphere value"));
        let record = stats.last_draw().unwrap();
        assert_eq!(record.uniforms["u_rangeHigh"], UniformValue::Float(3.0));

        cloud.remove_quantity("height");
        draw(&mut cloud, &mut backend).unwrap();
        assert_eq!(cloud.program_label(), Some("point sphere"));
        assert_eq!(stats.counters().live_programs, 1);
    }

    #[test]
    fn disabled_cloud_draws_nothing() {
        let mut backend = HeadlessBackend::new();
        let stats = backend.stats();
        let mut cloud = square();
        cloud.set_enabled(false);
        draw(&mut cloud, &mut backend).unwrap();
        assert!(stats.draws().is_empty());
        assert_eq!(cloud.program_label(), None);
    }

    #[test]
    fn enabled_vectors_draw_after_points() {
        let mut backend = HeadlessBackend::new();
        let stats = backend.stats();
        let mut cloud = square();
        cloud
            .add_vector_quantity("normals", vec![Vec3::Z; 4], VectorType::Standard)
            .unwrap();
        draw(&mut cloud, &mut backend).unwrap();
        assert_eq!(stats.draws().len(), 1);

        cloud.set_quantity_enabled("normals", true).unwrap();
        stats.clear_draws();
        draw(&mut cloud, &mut backend).unwrap();
        let programs: Vec<_> = stats.draws().into_iter().map(|draw| draw.program).collect();
        assert_eq!(programs, vec!["point sphere", "point vector"]);
        assert_eq!(cloud.active_quantity_name(), None);
    }

    #[test]
    fn vector_colors_avoid_base_color() {
        let mut cloud = square();
        cloud
            .add_vector_quantity("v", vec![Vec3::X; 4], VectorType::Ambient)
            .unwrap();
        let vectors = cloud.quantity_typed::<VectorQuantity>("v").unwrap();
        assert!(vectors.color().distance(cloud.base_color()) > 0.1);
    }

    #[test]
    fn pick_colors_encode_point_indices() {
        let mut backend = HeadlessBackend::new();
        let mut picks = PickRegistry::new();
        picks.request_range(PickOwner::new("Other", "first"), 10);

        let mut cloud = square();
        cloud.prepare_pick(&mut backend, &mut picks).unwrap();
        let ids = cloud.pick_ids().unwrap();
        assert_eq!(ids, 11..15);

        let colors = cloud.pick_colors().unwrap();
        for (index, color) in colors.iter().enumerate() {
            let id = pick::color_to_id(*color);
            assert_eq!(cloud.local_pick_index(id), Some(index));
        }
        assert_eq!(cloud.local_pick_index(5), None);
    }

    #[test]
    fn pick_pass_omits_base_color() {
        let mut backend = HeadlessBackend::new();
        let stats = backend.stats();
        let mut picks = PickRegistry::new();
        let mut cloud = square();
        cloud.prepare_pick(&mut backend, &mut picks).unwrap();

        let view = ViewParameters::default();
        let mut ctx = FrameContext::new(&mut backend, &view);
        cloud.draw_pick(&mut ctx).unwrap();

        let record = stats.last_draw().unwrap();
        assert_eq!(record.program, "point sphere pick");
        assert!(!record.uniforms.contains_key("u_baseColor"));
    }

    #[test]
    fn rebuilding_pick_releases_previous_program() {
        let mut backend = HeadlessBackend::new();
        let stats = backend.stats();
        let mut picks = PickRegistry::new();
        let mut cloud = square();
        cloud.prepare_pick(&mut backend, &mut picks).unwrap();
        cloud.prepare_pick(&mut backend, &mut picks).unwrap();
        assert_eq!(stats.counters().live_programs, 1);
        assert_eq!(picks.ranges().count(), 1);
    }

    #[test]
    fn empty_cloud_degrades_gracefully() {
        let mut backend = HeadlessBackend::new();
        let mut cloud = cloud(Vec::new());
        let (low, high) = cloud.bounding_box();
        assert_eq!(low, Vec3::splat(f32::INFINITY));
        assert_eq!(high, Vec3::splat(f32::NEG_INFINITY));
        assert_eq!(cloud.length_scale(), 0.0);
        draw(&mut cloud, &mut backend).unwrap();
    }

    #[test]
    fn bounding_box_applies_transform_but_length_scale_does_not() {
        let mut cloud = square();
        let before = cloud.length_scale();
        cloud.set_transform(Mat4::from_translation(Vec3::new(10.0, 0.0, 0.0)));
        let (low, high) = cloud.bounding_box();
        assert_eq!(low, Vec3::new(10.0, 0.0, 0.0));
        assert_eq!(high, Vec3::new(11.0, 1.0, 0.0));
        assert_eq!(cloud.length_scale(), before);
        assert!((before - 2.0_f32.sqrt()).abs() < 1e-6);
    }

    #[test]
    fn ui_enables_quantity_through_active_slot() {
        let mut cloud = square();
        cloud
            .add_color_quantity("rgb", vec![Vec3::X; 4])
            .unwrap();
        let mut ui = RecordingUi::new();
        ui.set_checkbox("rgb", "Enabled", true);
        let mut prompt = NoPrompt;
        let mut ctx = UiContext {
            prompt: &mut prompt,
            app_name: "cloudscope",
            length_scale: 1.0,
        };
        cloud.build_ui(&mut ui, &mut ctx);

        assert_eq!(cloud.active_quantity_name(), Some("rgb"));
        assert!(ui.texts().contains(&"# points: 4"));
    }

    #[test]
    fn clear_quantities_menu_item_empties_registry() {
        let mut cloud = square();
        cloud
            .add_scalar_quantity("s", [1.0_f32; 4], DataType::Magnitude)
            .unwrap();
        cloud.set_active_quantity("s").unwrap();
        let mut ui = RecordingUi::new();
        ui.click("Options").click("Clear Quantities");
        let mut prompt = NoPrompt;
        let mut ctx = UiContext {
            prompt: &mut prompt,
            app_name: "cloudscope",
            length_scale: 1.0,
        };
        cloud.build_ui(&mut ui, &mut ctx);

        assert!(cloud.quantities().is_empty());
        assert_eq!(cloud.active_quantity_name(), None);
        assert!(ui
            .events()
            .contains(&UiEvent::MenuItem("Clear Quantities".to_string())));
    }

    #[test]
    fn pick_ui_lists_point_and_quantities() {
        let mut cloud = square();
        cloud
            .add_scalar_quantity("height", [0.0_f32, 1.0, 2.0, 3.0], DataType::Standard)
            .unwrap();
        let mut ui = RecordingUi::new();
        cloud.build_pick_ui(&mut ui, 2);
        assert_eq!(ui.texts(), vec!["#2  ", "<1, 1, 0>", "height", "2"]);
    }
}
