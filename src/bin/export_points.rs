use cloudscope::{DataType, Scene, SceneConfig, VectorType};
use glam::Vec3;
use std::env;
use std::path::PathBuf;

const SAMPLES: usize = 512;

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("[export] error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = env::args().skip(1);
    let output_path = args
        .next()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("helix.txt"));
    let config = match args.next() {
        Some(path) => SceneConfig::load(&PathBuf::from(path))?,
        None => SceneConfig::default(),
    };

    let mut scene = Scene::new(config)?;
    let points: Vec<Vec3> = (0..SAMPLES)
        .map(|i| {
            let t = i as f32 / SAMPLES as f32 * std::f32::consts::TAU * 3.0;
            Vec3::new(t.cos(), t.sin(), t * 0.1)
        })
        .collect();
    let heights: Vec<f32> = points.iter().map(|point| point.z).collect();
    let tangents: Vec<Vec3> = points
        .iter()
        .map(|point| Vec3::new(-point.y, point.x, 0.1))
        .collect();

    let cloud = scene.register_point_cloud("helix", points)?;
    cloud.add_scalar_quantity("height", heights, DataType::Standard)?;
    cloud.add_vector_quantity("tangent", tangents, VectorType::Standard)?;
    cloud.set_active_quantity("height")?;
    cloud.set_quantity_enabled("tangent", true)?;
    scene.draw()?;

    let written = scene.export_point_cloud(Some("helix"), &output_path)?;
    println!("[export] wrote {SAMPLES} points to {}", written.display());
    Ok(())
}
