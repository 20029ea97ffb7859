//! Read-only description of the viewing camera and the projection helpers the
//! gizmo needs: world/screen conversion, picking rays, screen-space size
//! estimation and the visibility metrics used to break picking ties.
//!
//! Screen coordinates are viewport pixels with the origin in the top-left
//! corner and Y growing downward.

use geometry::Ray;
use glam::{Mat3, Mat4, Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};

const DEFAULT_NEAR: f32 = 0.05;
const DEFAULT_FAR: f32 = 10_000.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ProjectionMode {
    Perspective,
    Orthographic,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    position: Vec3,
    orientation: Quat,

    projection: ProjectionMode,
    fov_y_deg: f32,
    /// Half of the visible height in world units (orthographic only).
    orthographic_size: f32,
    near: f32,
    far: f32,

    viewport_size: (u32, u32),
}

impl Camera {
    pub fn perspective(fov_y_deg: f32, viewport_size: (u32, u32)) -> Self {
        Self {
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            projection: ProjectionMode::Perspective,
            fov_y_deg,
            orthographic_size: 5.0,
            near: DEFAULT_NEAR,
            far: DEFAULT_FAR,
            viewport_size,
        }
    }

    pub fn orthographic(orthographic_size: f32, viewport_size: (u32, u32)) -> Self {
        Self {
            projection: ProjectionMode::Orthographic,
            orthographic_size,
            ..Self::perspective(50.0, viewport_size)
        }
    }

    pub fn with_pose(mut self, position: Vec3, orientation: Quat) -> Self {
        self.position = position;
        self.orientation = orientation.normalize();
        self
    }

    pub fn with_clip_planes(mut self, near: f32, far: f32) -> Self {
        self.near = near;
        self.far = far;
        self
    }

    /// Places the camera at `eye` looking toward `target` without roll.
    pub fn looking_at(mut self, eye: Vec3, target: Vec3, up: Vec3) -> Self {
        self.position = eye;
        self.orientation = look_rotation(target - eye, up);
        self
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    pub fn orientation(&self) -> Quat {
        self.orientation
    }

    pub fn set_orientation(&mut self, orientation: Quat) {
        self.orientation = orientation.normalize();
    }

    pub fn projection(&self) -> ProjectionMode {
        self.projection
    }

    pub fn is_orthographic(&self) -> bool {
        self.projection == ProjectionMode::Orthographic
    }

    pub fn fov_y_deg(&self) -> f32 {
        self.fov_y_deg
    }

    pub fn orthographic_size(&self) -> f32 {
        self.orthographic_size
    }

    pub fn set_orthographic_size(&mut self, size: f32) {
        self.orthographic_size = size;
    }

    pub fn near(&self) -> f32 {
        self.near
    }

    pub fn far(&self) -> f32 {
        self.far
    }

    pub fn viewport_size(&self) -> (u32, u32) {
        self.viewport_size
    }

    pub fn set_viewport_size(&mut self, size: (u32, u32)) {
        self.viewport_size = size;
    }

    pub fn viewport_height(&self) -> f32 {
        self.viewport_size.1.max(1) as f32
    }

    fn aspect(&self) -> f32 {
        let (w, h) = self.viewport_size;
        if w == 0 || h == 0 {
            1.0
        } else {
            w as f32 / h as f32
        }
    }

    pub fn forward_vec(&self) -> Vec3 {
        self.orientation * Vec3::NEG_Z
    }

    pub fn up_vec(&self) -> Vec3 {
        self.orientation * Vec3::Y
    }

    pub fn right_vec(&self) -> Vec3 {
        self.orientation * Vec3::X
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_to_rh(self.position, self.forward_vec(), self.up_vec())
    }

    pub fn projection_matrix(&self) -> Mat4 {
        let aspect = self.aspect();
        match self.projection {
            ProjectionMode::Perspective => Mat4::perspective_rh(
                self.fov_y_deg.to_radians(),
                aspect.max(0.001),
                self.near,
                self.far,
            ),
            ProjectionMode::Orthographic => {
                let half_height = self.orthographic_size;
                let half_width = half_height * aspect;
                Mat4::orthographic_rh(
                    -half_width,
                    half_width,
                    -half_height,
                    half_height,
                    self.near,
                    self.far,
                )
            }
        }
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Project a world position to viewport pixels.
    /// Returns None if the point is behind a perspective camera.
    pub fn world_to_screen(&self, world_pos: Vec3) -> Option<Vec2> {
        let clip = self.view_projection() * world_pos.extend(1.0);
        if clip.w <= 0.0 {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        let (w, h) = self.viewport_size;
        Some(Vec2::new(
            (ndc.x + 1.0) * 0.5 * w as f32,
            (1.0 - ndc.y) * 0.5 * h as f32,
        ))
    }

    /// World-space ray from the near plane through the given viewport pixel.
    pub fn screen_point_to_ray(&self, screen: Vec2) -> Ray {
        let (w, h) = self.viewport_size;
        let ndc_x = screen.x / w.max(1) as f32 * 2.0 - 1.0;
        let ndc_y = 1.0 - screen.y / h.max(1) as f32 * 2.0;

        let inv = self.view_projection().inverse();
        let near = inv.project_point3(Vec3::new(ndc_x, ndc_y, 0.0));
        let far = inv.project_point3(Vec3::new(ndc_x, ndc_y, 1.0));
        Ray::new(near, far - near)
    }

    /// Approximate on-screen radius of a world-space sphere, measured by
    /// projecting a point offset along the camera's up vector. Perspective
    /// foreshortening away from the screen centre is not accounted for.
    pub fn screen_space_radius(&self, world_center: Vec3, world_radius: f32) -> f32 {
        let offset = world_center + self.up_vec() * world_radius;
        match (self.world_to_screen(world_center), self.world_to_screen(offset)) {
            (Some(center), Some(edge)) => center.distance(edge),
            _ => 0.0,
        }
    }

    /// Distance metric used to decide which of several hits is frontmost:
    /// depth past the near plane for orthographic cameras, Euclidean distance
    /// from the eye for perspective ones.
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        match self.projection {
            ProjectionMode::Orthographic => {
                self.forward_vec().dot(point - self.position) - self.near
            }
            ProjectionMode::Perspective => self.position.distance(point),
        }
    }

    /// True when `point` is no farther from the camera than `reference_distance`,
    /// which is the sphere centre's distance when testing points on a ring.
    pub fn is_point_visible_relative_to_sphere(&self, point: Vec3, reference_distance: f32) -> bool {
        self.distance_to_point(point) <= reference_distance
    }

    /// False only when the whole sphere lies in front of the near plane or
    /// beyond the far plane.
    pub fn is_sphere_within_clip_range(&self, center: Vec3, radius: f32) -> bool {
        let depth = self.forward_vec().dot(center - self.position);
        !(depth + radius < self.near || depth - radius > self.far)
    }
}

fn look_rotation(forward: Vec3, up: Vec3) -> Quat {
    let forward = forward.normalize_or_zero();
    if forward == Vec3::ZERO {
        return Quat::IDENTITY;
    }
    let mut right = forward.cross(up);
    if right.length_squared() < 1e-6 {
        right = if forward.y.abs() < 0.9 {
            forward.cross(Vec3::Y)
        } else {
            forward.cross(Vec3::Z)
        };
    }
    let right = right.normalize();
    let up = right.cross(forward).normalize();
    Quat::from_mat3(&Mat3::from_cols(right, up, -forward)).normalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn front_camera(projection: ProjectionMode) -> Camera {
        let base = match projection {
            ProjectionMode::Perspective => Camera::perspective(60.0, (800, 600)),
            ProjectionMode::Orthographic => Camera::orthographic(5.0, (800, 600)),
        };
        base.looking_at(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, Vec3::Y)
    }

    #[test]
    fn looking_at_points_forward_at_target() {
        let camera = Camera::perspective(60.0, (800, 600)).looking_at(
            Vec3::new(5.0, 5.0, 5.0),
            Vec3::ZERO,
            Vec3::Y,
        );
        let expected = (Vec3::ZERO - Vec3::new(5.0, 5.0, 5.0)).normalize();
        assert!(camera.forward_vec().abs_diff_eq(expected, 1e-5));
        assert!(camera.right_vec().y.abs() < 1e-5);
    }

    #[test]
    fn target_projects_to_viewport_centre() {
        for mode in [ProjectionMode::Perspective, ProjectionMode::Orthographic] {
            let camera = front_camera(mode);
            let screen = camera.world_to_screen(Vec3::ZERO).unwrap();
            assert!(screen.abs_diff_eq(Vec2::new(400.0, 300.0), 1e-3));
        }
    }

    #[test]
    fn screen_y_grows_downward() {
        let camera = front_camera(ProjectionMode::Perspective);
        let above = camera.world_to_screen(Vec3::new(0.0, 1.0, 0.0)).unwrap();
        assert!(above.y < 300.0);
    }

    #[test]
    fn points_behind_perspective_camera_do_not_project() {
        let camera = front_camera(ProjectionMode::Perspective);
        assert!(camera.world_to_screen(Vec3::new(0.0, 0.0, 20.0)).is_none());
    }

    #[test]
    fn screen_ray_passes_through_projected_point() {
        for mode in [ProjectionMode::Perspective, ProjectionMode::Orthographic] {
            let camera = front_camera(mode);
            let world = Vec3::new(1.5, -0.75, 0.5);
            let screen = camera.world_to_screen(world).unwrap();
            let ray = camera.screen_point_to_ray(screen);
            let to_point = world - ray.origin;
            let along = to_point.dot(ray.direction);
            let closest = ray.point_at(along);
            assert!(closest.distance(world) < 1e-3, "{mode:?}");
        }
    }

    #[test]
    fn orthographic_screen_radius_is_linear_in_size() {
        let camera = front_camera(ProjectionMode::Orthographic);
        // 5 world units of half-height across 300 pixels.
        let radius = camera.screen_space_radius(Vec3::ZERO, 1.0);
        assert!((radius - 60.0).abs() < 1e-2);
        let mut zoomed = camera.clone();
        zoomed.set_orthographic_size(10.0);
        assert!((zoomed.screen_space_radius(Vec3::ZERO, 1.0) - 30.0).abs() < 1e-2);
    }

    #[test]
    fn distance_metric_depends_on_projection() {
        let persp = front_camera(ProjectionMode::Perspective);
        let ortho = front_camera(ProjectionMode::Orthographic);
        let point = Vec3::new(3.0, 0.0, 6.0);
        assert!((persp.distance_to_point(point) - 5.0).abs() < 1e-4);
        assert!((ortho.distance_to_point(point) - (4.0 - ortho.near())).abs() < 1e-4);
    }

    #[test]
    fn near_hemisphere_points_are_visible() {
        let camera = front_camera(ProjectionMode::Perspective);
        let reference = camera.distance_to_point(Vec3::ZERO);
        assert!(camera.is_point_visible_relative_to_sphere(Vec3::new(0.0, 0.0, 1.0), reference));
        assert!(!camera.is_point_visible_relative_to_sphere(Vec3::new(0.0, 0.0, -1.0), reference));
    }

    #[test]
    fn clip_range_classification() {
        let camera = front_camera(ProjectionMode::Perspective).with_clip_planes(1.0, 50.0);
        assert!(camera.is_sphere_within_clip_range(Vec3::ZERO, 1.0));
        // Entirely between the eye and the near plane.
        assert!(!camera.is_sphere_within_clip_range(Vec3::new(0.0, 0.0, 9.7), 0.1));
        // Straddling the near plane is still in range.
        assert!(camera.is_sphere_within_clip_range(Vec3::new(0.0, 0.0, 9.0), 0.5));
        assert!(!camera.is_sphere_within_clip_range(Vec3::new(0.0, 0.0, -100.0), 5.0));
    }
}
