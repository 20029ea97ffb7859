use camera::{Camera, ProjectionMode};
use glam::{Quat, Vec2, Vec3};

const WORLD_UP: Vec3 = Vec3::Y;
const MAX_PITCH_RAD: f32 = 1.55;
const ORBIT_SENSITIVITY: f32 = 0.005;

/// Turntable camera rig circling a target point.
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    target: Vec3,
    radius: f32,

    yaw: f32,   // around WORLD_UP
    pitch: f32, // above the horizon

    projection: ProjectionMode,
    fov_y_deg: f32,
    viewport_size: (u32, u32),
}

impl OrbitCamera {
    pub fn new(projection: ProjectionMode, viewport_size: (u32, u32)) -> Self {
        Self {
            target: Vec3::ZERO,
            radius: 8.0,
            yaw: 45.0_f32.to_radians(),
            pitch: 30.0_f32.to_radians(),
            projection,
            fov_y_deg: 50.0,
            viewport_size,
        }
    }

    /// Recenter on a bounding sphere.
    pub fn reset_to_fit(&mut self, center: Vec3, radius_hint: f32) {
        self.target = center;
        self.radius = radius_hint.max(1.0) * 2.5;
    }

    pub fn orbit(&mut self, delta: Vec2) {
        self.yaw -= delta.x * ORBIT_SENSITIVITY;
        self.pitch = (self.pitch + delta.y * ORBIT_SENSITIVITY).clamp(-MAX_PITCH_RAD, MAX_PITCH_RAD);
    }

    pub fn zoom(&mut self, amount: f32) {
        self.radius = (self.radius - amount).max(0.5);
    }

    fn orientation(&self) -> Quat {
        let yaw_q = Quat::from_axis_angle(WORLD_UP, self.yaw);
        let pitch_q = Quat::from_axis_angle(Vec3::X, -self.pitch);
        (yaw_q * pitch_q).normalize()
    }

    fn eye(&self) -> Vec3 {
        let forward = self.orientation() * Vec3::NEG_Z;
        self.target - forward * self.radius
    }

    pub fn camera(&self) -> Camera {
        let camera = match self.projection {
            ProjectionMode::Perspective => Camera::perspective(self.fov_y_deg, self.viewport_size),
            ProjectionMode::Orthographic => {
                let half_height = self.radius * (self.fov_y_deg.to_radians() * 0.5).tan();
                Camera::orthographic(half_height, self.viewport_size)
            }
        };
        camera.with_pose(self.eye(), self.orientation())
    }
}
