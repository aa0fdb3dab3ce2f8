//! Plain-text export of point positions.
//!
//! ```text
//! #<app-name> point cloud <name>
//! #displayradius <radius>
//! <x, y, z>
//! ```

use super::PointCloud;
use crate::ui::FilenamePrompt;
use glam::Vec3;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

const CLOUD_MARKER: &str = " point cloud ";
const RADIUS_MARKER: &str = "displayradius ";

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("point file i/o failed: {0}")]
    Io(#[from] io::Error),
    #[error("malformed point on line {line}: '{content}'")]
    Parse { line: usize, content: String },
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;

/// Contents of a point file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointFile {
    pub app_name: Option<String>,
    pub name: Option<String>,
    pub display_radius: Option<f32>,
    pub points: Vec<Vec3>,
}

pub fn format_point(point: Vec3) -> String {
    format!("<{}, {}, {}>", point.x, point.y, point.z)
}

pub fn write_points<W: Write>(
    writer: &mut W,
    app_name: &str,
    cloud_name: &str,
    display_radius: f32,
    points: &[Vec3],
) -> io::Result<()> {
    writeln!(writer, "#{app_name}{CLOUD_MARKER}{cloud_name}")?;
    writeln!(writer, "#{RADIUS_MARKER}{display_radius}")?;
    for point in points {
        writeln!(writer, "{}", format_point(*point))?;
    }
    Ok(())
}

pub fn read_points<R: BufRead>(reader: R) -> PersistenceResult<PointFile> {
    let mut file = PointFile::default();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if let Some(header) = trimmed.strip_prefix('#') {
            if let Some(radius) = header.strip_prefix(RADIUS_MARKER) {
                file.display_radius = radius.trim().parse().ok();
            } else if let Some((app, name)) = header.split_once(CLOUD_MARKER) {
                file.app_name = Some(app.to_string());
                file.name = Some(name.to_string());
            }
            continue;
        }

        let point = parse_point(trimmed).ok_or_else(|| PersistenceError::Parse {
            line: index + 1,
            content: line.clone(),
        })?;
        file.points.push(point);
    }
    Ok(file)
}

pub fn read_points_from_file(path: &Path) -> PersistenceResult<PointFile> {
    let file = File::open(path)?;
    read_points(BufReader::new(file))
}

fn parse_point(line: &str) -> Option<Vec3> {
    let inner = line.strip_prefix('<')?.strip_suffix('>')?;
    let mut coords = inner.split(',').map(|part| part.trim().parse::<f32>());
    let x = coords.next()?.ok()?;
    let y = coords.next()?.ok()?;
    let z = coords.next()?.ok()?;
    if coords.next().is_some() {
        return None;
    }
    Some(Vec3::new(x, y, z))
}

impl PointCloud {
    /// Writes this cloud's points to `path`, or to a path obtained from
    /// `prompt` when none is given. Returns `Ok(None)` when the prompt is
    /// cancelled.
    pub fn write_points_to_file(
        &self,
        path: Option<&Path>,
        prompt: &mut dyn FilenamePrompt,
        app_name: &str,
        length_scale: f32,
    ) -> PersistenceResult<Option<PathBuf>> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match prompt.prompt_for_filename() {
                Some(filename) if !filename.is_empty() => PathBuf::from(filename),
                _ => return Ok(None),
            },
        };

        log::info!(
            "[point_cloud] writing point cloud {} to file {}",
            self.name(),
            path.display()
        );
        let mut writer = BufWriter::new(File::create(&path)?);
        write_points(
            &mut writer,
            app_name,
            self.name(),
            self.point_radius() * length_scale,
            self.points(),
        )?;
        writer.flush()?;
        Ok(Some(path))
    }
}
