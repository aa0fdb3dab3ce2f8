//! Process-wide scene, explicitly initialized and shut down.

use crate::config::SceneConfig;
use crate::point_cloud::PointCloud;
use crate::render::GraphicsBackend;
use crate::scene::{Scene, SceneError, SceneResult};
use crate::standardize::Point3Source;
use once_cell::sync::Lazy;
use std::sync::{Mutex, MutexGuard};

static SCENE: Lazy<Mutex<Option<Scene>>> = Lazy::new(|| Mutex::new(None));

fn lock() -> MutexGuard<'static, Option<Scene>> {
    SCENE.lock().expect("scene mutex poisoned")
}

pub fn init(config: SceneConfig) -> SceneResult<()> {
    let mut guard = lock();
    if guard.is_some() {
        return Err(SceneError::AlreadyInitialized);
    }
    *guard = Some(Scene::new(config)?);
    Ok(())
}

pub fn init_with_backend(
    config: SceneConfig,
    backend: Box<dyn GraphicsBackend>,
) -> SceneResult<()> {
    let mut guard = lock();
    if guard.is_some() {
        return Err(SceneError::AlreadyInitialized);
    }
    *guard = Some(Scene::with_backend(config, backend)?);
    Ok(())
}

/// Drops the scene and everything registered in it. Returns false if there
/// was nothing to shut down.
pub fn shutdown() -> bool {
    let scene = lock().take();
    if scene.is_some() {
        log::info!("[scene] shut down");
    }
    scene.is_some()
}

pub fn is_initialized() -> bool {
    lock().is_some()
}

pub fn with_scene<R>(f: impl FnOnce(&mut Scene) -> R) -> SceneResult<R> {
    let mut guard = lock();
    let scene = guard.as_mut().ok_or(SceneError::NotInitialized)?;
    Ok(f(scene))
}

pub fn register_point_cloud<I>(name: impl Into<String>, points: I) -> SceneResult<()>
where
    I: IntoIterator,
    I::Item: Point3Source,
{
    with_scene(|scene| scene.register_point_cloud(name, points).map(|_| ()))?
}

/// Runs `f` on the named point cloud, or the most recently registered one
/// when `name` is `None`.
pub fn with_point_cloud<R>(
    name: Option<&str>,
    f: impl FnOnce(&mut PointCloud) -> R,
) -> SceneResult<R> {
    with_scene(|scene| scene.try_point_cloud_mut(name).map(f))?
}
