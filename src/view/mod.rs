use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// Orthonormal camera basis in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraFrame {
    pub look: Vec3,
    pub up: Vec3,
    pub right: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_y_degrees: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 0.0, 3.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_y_degrees: 45.0,
            aspect: 16.0 / 9.0,
            near: 0.01,
            far: 100.0,
        }
    }
}

impl Camera {
    pub fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Self {
        Self {
            eye,
            target,
            up,
            ..Self::default()
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh_gl(
            self.fov_y_degrees.to_radians(),
            self.aspect,
            self.near,
            self.far,
        )
    }

    pub fn frame(&self) -> CameraFrame {
        let look = (self.target - self.eye).normalize_or_zero();
        let right = look.cross(self.up).normalize_or_zero();
        let up = right.cross(look);
        CameraFrame { look, up, right }
    }

    /// Re-aims the camera so a sphere of `length_scale` around `center` fills
    /// the view.
    pub fn frame_scene(&mut self, center: Vec3, length_scale: f32) {
        let direction = (self.eye - self.target).normalize_or_zero();
        let direction = if direction == Vec3::ZERO {
            Vec3::Z
        } else {
            direction
        };
        self.target = center;
        self.eye = center + direction * length_scale * 1.5;
        self.near = (length_scale * 0.005).max(f32::EPSILON);
        self.far = length_scale * 20.0;
    }

    pub fn parameters(&self, length_scale: f32) -> ViewParameters {
        ViewParameters {
            view: self.view_matrix(),
            projection: self.projection_matrix(),
            frame: self.frame(),
            length_scale,
        }
    }
}

/// Per-frame snapshot of the view state handed to structures while drawing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewParameters {
    pub view: Mat4,
    pub projection: Mat4,
    pub frame: CameraFrame,
    pub length_scale: f32,
}

impl Default for ViewParameters {
    fn default() -> Self {
        Camera::default().parameters(1.0)
    }
}
