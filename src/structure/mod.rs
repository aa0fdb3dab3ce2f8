//! Named, top-level visual entities and the registry that owns them.

use crate::pick::PickRegistry;
use crate::render::{FrameContext, GraphicsBackend, RenderResult};
use crate::ui::{FilenamePrompt, Ui};
use glam::{Mat4, Vec3};
use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

/// Services available to a structure while it builds its controls.
pub struct UiContext<'a> {
    pub prompt: &'a mut dyn FilenamePrompt,
    pub app_name: &'a str,
    pub length_scale: f32,
}

pub trait Structure: Any + Send {
    fn name(&self) -> &str;
    fn type_name(&self) -> &'static str;

    fn is_enabled(&self) -> bool;
    fn set_enabled(&mut self, enabled: bool);
    fn transform(&self) -> Mat4;
    fn set_transform(&mut self, transform: Mat4);

    /// Builds the program used for regular drawing.
    fn prepare(&mut self, backend: &mut dyn GraphicsBackend) -> RenderResult<()>;
    /// Reserves pick identifiers and builds the pick program.
    fn prepare_pick(
        &mut self,
        backend: &mut dyn GraphicsBackend,
        picks: &mut PickRegistry,
    ) -> RenderResult<()>;
    fn draw(&mut self, ctx: &mut FrameContext<'_>) -> RenderResult<()>;
    fn draw_pick(&mut self, ctx: &mut FrameContext<'_>) -> RenderResult<()>;

    fn build_ui(&mut self, ui: &mut dyn Ui, ctx: &mut UiContext<'_>);
    fn build_pick_ui(&self, ui: &mut dyn Ui, local_index: usize);

    fn length_scale(&self) -> f32;
    fn bounding_box(&self) -> (Vec3, Vec3);

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("a {type_name} named '{name}' is already registered")]
    AlreadyExists {
        type_name: &'static str,
        name: String,
    },
    #[error("no {type_name} named '{name}' is registered")]
    NotFound {
        type_name: &'static str,
        name: String,
    },
    #[error("no {0} has been registered")]
    NoneRegistered(&'static str),
}

pub type RegistryResult<T> = Result<T, RegistryError>;

#[derive(Default)]
struct TypeBucket {
    structures: BTreeMap<String, Box<dyn Structure>>,
    registration_order: Vec<String>,
}

/// Structures grouped by type, unique by name within a type.
#[derive(Default)]
pub struct StructureRegistry {
    buckets: HashMap<&'static str, TypeBucket>,
}

impl StructureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, type_name: &str, name: &str) -> bool {
        self.buckets
            .get(type_name)
            .is_some_and(|bucket| bucket.structures.contains_key(name))
    }

    /// Takes ownership of `structure`. On a name conflict the structure is
    /// dropped and the registry is left untouched.
    pub fn register(&mut self, structure: Box<dyn Structure>) -> RegistryResult<()> {
        let type_name = structure.type_name();
        let name = structure.name().to_string();
        if self.contains(type_name, &name) {
            log::error!(
                "[scene] cannot register {type_name} '{name}': a structure with that name already exists"
            );
            return Err(RegistryError::AlreadyExists { type_name, name });
        }

        let bucket = self.buckets.entry(type_name).or_default();
        bucket.registration_order.push(name.clone());
        bucket.structures.insert(name, structure);
        Ok(())
    }

    /// Resolves `name`, or the most recently registered structure of the type
    /// when `name` is `None`.
    pub fn resolve_name(&self, type_name: &'static str, name: Option<&str>) -> RegistryResult<String> {
        let bucket = self.buckets.get(type_name);
        match name {
            Some(name) => {
                if bucket.is_some_and(|bucket| bucket.structures.contains_key(name)) {
                    Ok(name.to_string())
                } else {
                    Err(RegistryError::NotFound {
                        type_name,
                        name: name.to_string(),
                    })
                }
            }
            None => bucket
                .and_then(|bucket| bucket.registration_order.last().cloned())
                .ok_or(RegistryError::NoneRegistered(type_name)),
        }
    }

    pub fn get(&self, type_name: &'static str, name: Option<&str>) -> Option<&dyn Structure> {
        let resolved = self.resolve_logged(type_name, name)?;
        self.buckets
            .get(type_name)?
            .structures
            .get(&resolved)
            .map(|structure| structure.as_ref())
    }

    pub fn get_mut(
        &mut self,
        type_name: &'static str,
        name: Option<&str>,
    ) -> Option<&mut (dyn Structure + 'static)> {
        let resolved = self.resolve_logged(type_name, name)?;
        self.buckets
            .get_mut(type_name)?
            .structures
            .get_mut(&resolved)
            .map(|structure| structure.as_mut())
    }

    pub fn get_typed<T: Structure>(&self, type_name: &'static str, name: Option<&str>) -> Option<&T> {
        self.get(type_name, name)?.as_any().downcast_ref::<T>()
    }

    pub fn get_typed_mut<T: Structure>(
        &mut self,
        type_name: &'static str,
        name: Option<&str>,
    ) -> Option<&mut T> {
        self.get_mut(type_name, name)?
            .as_any_mut()
            .downcast_mut::<T>()
    }

    pub fn remove(&mut self, type_name: &str, name: &str) -> Option<Box<dyn Structure>> {
        let bucket = self.buckets.get_mut(type_name)?;
        let removed = bucket.structures.remove(name)?;
        bucket.registration_order.retain(|entry| entry != name);
        Some(removed)
    }

    pub fn remove_all(&mut self) -> Vec<Box<dyn Structure>> {
        self.buckets
            .drain()
            .flat_map(|(_, bucket)| bucket.structures.into_values())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.buckets
            .values()
            .map(|bucket| bucket.structures.len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn count_of(&self, type_name: &str) -> usize {
        self.buckets
            .get(type_name)
            .map(|bucket| bucket.structures.len())
            .unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Structure> {
        self.buckets
            .values()
            .flat_map(|bucket| bucket.structures.values())
            .map(|structure| structure.as_ref())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut (dyn Structure + 'static)> {
        self.buckets
            .values_mut()
            .flat_map(|bucket| bucket.structures.values_mut())
            .map(|structure| structure.as_mut())
    }

    fn resolve_logged(&self, type_name: &'static str, name: Option<&str>) -> Option<String> {
        match self.resolve_name(type_name, name) {
            Ok(resolved) => Some(resolved),
            Err(err) => {
                log::error!("[scene] {err}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point_cloud::{POINT_CLOUD_TYPE, PointCloud, PointCloudOptions};

    fn cloud(name: &str) -> Box<dyn Structure> {
        Box::new(PointCloud::new(
            name,
            vec![Vec3::ZERO, Vec3::ONE],
            PointCloudOptions::default(),
        ))
    }

    #[test]
    fn register_rejects_duplicate_names() {
        let mut registry = StructureRegistry::new();
        registry.register(cloud("a")).unwrap();
        let err = registry.register(cloud("a")).unwrap_err();
        assert_eq!(
            err,
            RegistryError::AlreadyExists {
                type_name: POINT_CLOUD_TYPE,
                name: "a".to_string()
            }
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn unnamed_lookup_returns_most_recent() {
        let mut registry = StructureRegistry::new();
        assert_eq!(
            registry.resolve_name(POINT_CLOUD_TYPE, None),
            Err(RegistryError::NoneRegistered(POINT_CLOUD_TYPE))
        );

        registry.register(cloud("first")).unwrap();
        registry.register(cloud("second")).unwrap();
        let latest = registry
            .get_typed::<PointCloud>(POINT_CLOUD_TYPE, None)
            .expect("latest cloud");
        assert_eq!(latest.name(), "second");

        registry.remove(POINT_CLOUD_TYPE, "second").expect("removed");
        let latest = registry
            .get_typed::<PointCloud>(POINT_CLOUD_TYPE, None)
            .expect("latest cloud");
        assert_eq!(latest.name(), "first");
    }

    #[test]
    fn missing_names_return_none() {
        let mut registry = StructureRegistry::new();
        registry.register(cloud("a")).unwrap();
        assert!(registry.get(POINT_CLOUD_TYPE, Some("b")).is_none());
        assert!(registry.get("Surface Mesh", None).is_none());
        assert!(registry.remove(POINT_CLOUD_TYPE, "b").is_none());
        assert_eq!(registry.count_of(POINT_CLOUD_TYPE), 1);
    }
}
