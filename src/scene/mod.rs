//! The scene: every registered structure plus the services they share
//! (graphics backend, pick allocator, camera, scene extents).

use crate::color::StructureColorCycle;
use crate::config::{ConfigError, SceneConfig};
use crate::pick::{PickOwner, PickRegistry};
use crate::point_cloud::{
    POINT_CLOUD_TYPE, PersistenceError, PointCloud, PointCloudOptions, QuantityError,
};
use crate::render::{FrameContext, GraphicsBackend, HeadlessBackend, RenderError};
use crate::standardize::Point3Source;
use crate::structure::{RegistryError, Structure, StructureRegistry, UiContext};
use crate::ui::{FilenamePrompt, NoPrompt, Ui};
use crate::view::{Camera, ViewParameters};
use glam::Vec3;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SceneError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Quantity(#[from] QuantityError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("the scene has not been initialized")]
    NotInitialized,
    #[error("the scene is already initialized")]
    AlreadyInitialized,
}

pub type SceneResult<T> = Result<T, SceneError>;

/// Structure and element under a pick identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickHit {
    pub type_name: &'static str,
    pub name: String,
    pub local_index: usize,
}

pub struct Scene {
    config: SceneConfig,
    backend: Box<dyn GraphicsBackend>,
    structures: StructureRegistry,
    picks: PickRegistry,
    camera: Camera,
    colors: StructureColorCycle,
    length_scale: f32,
    bounding_box: Option<(Vec3, Vec3)>,
}

impl Scene {
    /// Builds a scene on the headless backend selected by `config.backend`.
    pub fn new(config: SceneConfig) -> SceneResult<Self> {
        let backend = HeadlessBackend::from_kind(config.backend);
        Self::with_backend(config, Box::new(backend))
    }

    pub fn with_backend(
        config: SceneConfig,
        backend: Box<dyn GraphicsBackend>,
    ) -> SceneResult<Self> {
        config.validate()?;
        log::info!(
            "[scene] starting '{}' on the {} backend",
            config.app_name,
            backend.label()
        );
        Ok(Self {
            length_scale: config.initial_length_scale,
            config,
            backend,
            structures: StructureRegistry::new(),
            picks: PickRegistry::new(),
            camera: Camera::default(),
            colors: StructureColorCycle::new(),
            bounding_box: None,
        })
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn backend_label(&self) -> &'static str {
        self.backend.label()
    }

    pub fn structures(&self) -> &StructureRegistry {
        &self.structures
    }

    pub fn picks(&self) -> &PickRegistry {
        &self.picks
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    pub fn length_scale(&self) -> f32 {
        self.length_scale
    }

    /// Union of all structures' bounds; `None` while nothing has extent.
    pub fn bounding_box(&self) -> Option<(Vec3, Vec3)> {
        self.bounding_box
    }

    pub fn view_parameters(&self) -> ViewParameters {
        self.camera.parameters(self.length_scale)
    }

    /// Creates a point cloud, builds its programs and reserves its pick
    /// identifiers. A name already in use leaves the scene untouched.
    pub fn register_point_cloud<I>(
        &mut self,
        name: impl Into<String>,
        points: I,
    ) -> SceneResult<&mut PointCloud>
    where
        I: IntoIterator,
        I::Item: Point3Source,
    {
        let name = name.into();
        if self.structures.contains(POINT_CLOUD_TYPE, &name) {
            log::error!("[scene] a point cloud named '{name}' is already registered");
            return Err(RegistryError::AlreadyExists {
                type_name: POINT_CLOUD_TYPE,
                name,
            }
            .into());
        }

        let options = PointCloudOptions {
            base_color: self.colors.next_color(),
            point_radius: self.config.default_point_radius,
            material: self.config.default_material.clone(),
        };
        let mut cloud = PointCloud::new(name.clone(), points, options);
        let setup = cloud
            .prepare(self.backend.as_mut())
            .and_then(|()| cloud.prepare_pick(self.backend.as_mut(), &mut self.picks));
        if let Err(err) = setup {
            self.picks.release(&cloud.pick_owner());
            return Err(err.into());
        }

        log::info!(
            "[scene] registered point cloud '{name}' with {} points",
            cloud.n_points()
        );
        self.structures.register(Box::new(cloud))?;
        if self.config.auto_scene_extents {
            self.update_extents();
        }
        self.try_point_cloud_mut(Some(name.as_str()))
    }

    /// `None` selects the most recently registered point cloud.
    pub fn point_cloud(&self, name: Option<&str>) -> Option<&PointCloud> {
        self.structures.get_typed(POINT_CLOUD_TYPE, name)
    }

    pub fn point_cloud_mut(&mut self, name: Option<&str>) -> Option<&mut PointCloud> {
        self.structures.get_typed_mut(POINT_CLOUD_TYPE, name)
    }

    pub fn try_point_cloud_mut(&mut self, name: Option<&str>) -> SceneResult<&mut PointCloud> {
        let resolved = self.structures.resolve_name(POINT_CLOUD_TYPE, name)?;
        self.structures
            .get_typed_mut::<PointCloud>(POINT_CLOUD_TYPE, Some(resolved.as_str()))
            .ok_or_else(|| {
                SceneError::Registry(RegistryError::NotFound {
                    type_name: POINT_CLOUD_TYPE,
                    name: resolved.clone(),
                })
            })
    }

    /// Drops a structure along with its programs and pick identifiers.
    pub fn remove_structure(&mut self, type_name: &str, name: &str) -> bool {
        let Some(structure) = self.structures.remove(type_name, name) else {
            log::warn!("[scene] no {type_name} named '{name}' to remove");
            return false;
        };
        self.picks
            .release(&PickOwner::new(structure.type_name(), structure.name()));
        drop(structure);
        if self.config.auto_scene_extents {
            self.update_extents();
        }
        true
    }

    pub fn remove_all_structures(&mut self) {
        let removed = self.structures.remove_all();
        for structure in &removed {
            self.picks
                .release(&PickOwner::new(structure.type_name(), structure.name()));
        }
        log::info!("[scene] removed {} structures", removed.len());
        if self.config.auto_scene_extents {
            self.update_extents();
        }
    }

    /// Recomputes the length scale and bounds from all structures and
    /// re-aims the camera at them.
    pub fn update_extents(&mut self) {
        let mut length_scale = 0.0_f32;
        let mut bounds: Option<(Vec3, Vec3)> = None;
        for structure in self.structures.iter() {
            length_scale = length_scale.max(structure.length_scale());
            let (low, high) = structure.bounding_box();
            if !(low.is_finite() && high.is_finite()) {
                continue;
            }
            bounds = Some(match bounds {
                Some((scene_low, scene_high)) => (scene_low.min(low), scene_high.max(high)),
                None => (low, high),
            });
        }

        self.length_scale = if length_scale > 0.0 && length_scale.is_finite() {
            length_scale
        } else {
            self.config.initial_length_scale
        };
        self.bounding_box = bounds;

        let center = bounds.map_or(Vec3::ZERO, |(low, high)| 0.5 * (low + high));
        self.camera.frame_scene(center, self.length_scale);
        log::debug!(
            "[scene] length scale {} centered at {center}",
            self.length_scale
        );
    }

    /// Draws every structure. A failing structure does not stop the others;
    /// the first failure is returned.
    pub fn draw(&mut self) -> SceneResult<()> {
        let view = self.view_parameters();
        let mut ctx = FrameContext::new(self.backend.as_mut(), &view);
        let mut first_error = None;
        for structure in self.structures.iter_mut() {
            if let Err(err) = structure.draw(&mut ctx) {
                log::error!(
                    "[scene] failed to draw {} '{}': {err}",
                    structure.type_name(),
                    structure.name()
                );
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), |err| Err(err.into()))
    }

    pub fn draw_pick(&mut self) -> SceneResult<()> {
        let view = self.view_parameters();
        let mut ctx = FrameContext::new(self.backend.as_mut(), &view);
        let mut first_error = None;
        for structure in self.structures.iter_mut() {
            if let Err(err) = structure.draw_pick(&mut ctx) {
                log::error!(
                    "[scene] failed to draw pick buffer of {} '{}': {err}",
                    structure.type_name(),
                    structure.name()
                );
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), |err| Err(err.into()))
    }

    pub fn resolve_pick(&self, id: u64) -> Option<PickHit> {
        let (owner, local_index) = self.picks.lookup(id)?;
        Some(PickHit {
            type_name: owner.type_name,
            name: owner.name.clone(),
            local_index,
        })
    }

    pub fn resolve_pick_color(&self, color: Vec3) -> Option<PickHit> {
        self.resolve_pick(crate::pick::color_to_id(color))
    }

    /// Shows the info panel for whatever `id` refers to. Returns false for
    /// the background or stale identifiers.
    pub fn build_pick_ui(&self, ui: &mut dyn Ui, id: u64) -> bool {
        let Some(hit) = self.resolve_pick(id) else {
            return false;
        };
        match self.structures.get(hit.type_name, Some(hit.name.as_str())) {
            Some(structure) => {
                structure.build_pick_ui(ui, hit.local_index);
                true
            }
            None => false,
        }
    }

    pub fn build_ui(&mut self, ui: &mut dyn Ui, prompt: &mut dyn FilenamePrompt) {
        let mut ctx = UiContext {
            prompt,
            app_name: &self.config.app_name,
            length_scale: self.length_scale,
        };
        for structure in self.structures.iter_mut() {
            structure.build_ui(ui, &mut ctx);
        }
    }

    /// Writes a point cloud's points to `path` using the scene's app name and
    /// length scale.
    pub fn export_point_cloud(&self, name: Option<&str>, path: &Path) -> SceneResult<PathBuf> {
        let resolved = self.structures.resolve_name(POINT_CLOUD_TYPE, name)?;
        let cloud = self
            .point_cloud(Some(resolved.as_str()))
            .ok_or(SceneError::Registry(RegistryError::NotFound {
                type_name: POINT_CLOUD_TYPE,
                name: resolved.clone(),
            }))?;
        let written = cloud.write_points_to_file(
            Some(path),
            &mut NoPrompt,
            &self.config.app_name,
            self.length_scale,
        )?;
        Ok(written.unwrap_or_else(|| path.to_path_buf()))
    }
}
