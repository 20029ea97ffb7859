//! Rotation gizmo: three axis rings, a free-rotation sphere and a
//! screen-space look ring for rotating about the view direction.
//!
//! Axis rings are hit tested as thin annuli in their own plane, falling back
//! to a short cylinder around the ring so they stay pickable edge-on. Only the
//! half of each ring facing the camera can be picked or is drawn. Axis-ring
//! drags can snap to a fixed angular step; the look ring and the sphere always
//! rotate freely.

use axes::Axis;
use camera::Camera;
use geometry::{
    closest_point_on_circle, ray_intersects_circle, ray_intersects_cylinder,
    ray_intersects_sphere, Plane, Ray,
};
use glam::{Quat, Vec2, Vec3};
use settings::{GizmoSettings, Rgba, RotationSnapSettings, MIN_SPHERE_RADIUS};
use tracing::{debug, trace, warn};

use crate::base::{Gizmo, GizmoBase, GizmoKind};
use crate::input::PointerState;
use crate::render::{RenderPrimitive, RenderSink};
use crate::scene::{EntityId, SceneObjects};

/// Points used to tessellate each axis ring.
pub const RING_SAMPLE_COUNT: usize = 100;
/// Degrees of rotation per pixel of pointer travel along the drag tangent.
pub const DEGREES_PER_PIXEL: f32 = 0.45;
/// Maximum pixel distance between the cursor and the look ring for a pick.
pub const LOOK_RING_PICK_TOLERANCE: f32 = 5.0;

/// Ring pick half-width relative to the gizmo scale, per projection. The gizmo
/// scale follows the orthographic size, so the orthographic width is a fixed
/// fraction of the ring and stays pickable at any zoom.
const PERSPECTIVE_PICK_EPSILON: f32 = 0.07;
const ORTHOGRAPHIC_PICK_EPSILON: f32 = 0.05;
/// Absorbs float error when counting whole snap steps.
const SNAP_EPSILON: f32 = 1e-4;
const GUIDE_ARC_DEGREES_PER_SEGMENT: f32 = 3.0;

/// Handle of the rotation gizmo under the pointer or being dragged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RotationHandle {
    #[default]
    None,
    Axis(Axis),
    Sphere,
    LookRing,
}

impl RotationHandle {
    pub fn is_some(self) -> bool {
        self != RotationHandle::None
    }
}

/// Start and current end of the arc swept during a drag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RotationGuide {
    /// World-space points on an axis ring.
    Ring {
        center: Vec3,
        normal: Vec3,
        start: Vec3,
        end: Vec3,
    },
    /// Viewport points on the look ring.
    Screen { center: Vec2, start: Vec2, end: Vec2 },
}

#[derive(Debug, Clone)]
struct RotationDrag {
    handle: RotationHandle,
    /// Unapplied snap remainder, in degrees.
    accumulated_degrees: f32,
    /// Total rotation applied this session, in degrees.
    applied_degrees: f32,
    guide: Option<RotationGuide>,
}

pub struct RotationGizmo {
    base: GizmoBase,

    sphere_radius: f32,
    look_ring_enabled: bool,
    look_ring_scale: f32,
    snap: RotationSnapSettings,

    sphere_color: Rgba,
    look_ring_color: Rgba,
    guide_color: Rgba,

    /// Unit circles in gizmo-local space, indexed by axis.
    rings: [Vec<Vec3>; 3],

    selection: RotationHandle,
    drag: Option<RotationDrag>,
}

impl std::fmt::Debug for RotationGizmo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RotationGizmo")
            .field("base", &self.base)
            .field("sphere_radius", &self.sphere_radius)
            .field("selection", &self.selection)
            .field("drag", &self.drag)
            .finish_non_exhaustive()
    }
}

impl RotationGizmo {
    pub fn new(settings: &GizmoSettings) -> Self {
        let rotation = &settings.rotation;
        Self {
            base: GizmoBase::new(GizmoKind::Rotation, settings),
            sphere_radius: rotation.sphere_radius.max(MIN_SPHERE_RADIUS),
            look_ring_enabled: rotation.look_ring_enabled,
            look_ring_scale: rotation.look_ring_scale.max(0.0),
            snap: rotation.snap,
            sphere_color: settings.sphere_color,
            look_ring_color: settings.look_ring_color,
            guide_color: settings.guide_color,
            rings: Axis::PRIMARY.map(unit_ring),
            selection: RotationHandle::None,
            drag: None,
        }
    }

    pub fn with_camera(mut self, camera: Camera) -> Self {
        self.base.set_camera(Some(camera));
        self
    }

    // ---- Selection --------------------------------------------------------

    pub fn selection(&self) -> RotationHandle {
        self.selection
    }

    /// Selected axis ring, or [`Axis::None`].
    pub fn selected_axis(&self) -> Axis {
        match self.selection {
            RotationHandle::Axis(axis) => axis,
            _ => Axis::None,
        }
    }

    pub fn is_sphere_selected(&self) -> bool {
        self.selection == RotationHandle::Sphere
    }

    pub fn is_look_ring_selected(&self) -> bool {
        self.selection == RotationHandle::LookRing
    }

    // ---- Drag session -----------------------------------------------------

    /// Snap remainder of the current drag in degrees; zero outside a drag.
    pub fn accumulated_rotation(&self) -> f32 {
        self.drag
            .as_ref()
            .map_or(0.0, |drag| drag.accumulated_degrees)
    }

    /// Total rotation applied by the current drag in degrees.
    pub fn applied_rotation(&self) -> f32 {
        self.drag.as_ref().map_or(0.0, |drag| drag.applied_degrees)
    }

    pub fn rotation_guide(&self) -> Option<RotationGuide> {
        self.drag.as_ref().and_then(|drag| drag.guide)
    }

    // ---- Settings ---------------------------------------------------------

    pub fn snap(&self) -> &RotationSnapSettings {
        &self.snap
    }

    pub fn snap_mut(&mut self) -> &mut RotationSnapSettings {
        &mut self.snap
    }

    pub fn sphere_radius(&self) -> f32 {
        self.sphere_radius
    }

    pub fn set_sphere_radius(&mut self, radius: f32) {
        if radius < MIN_SPHERE_RADIUS {
            warn!(requested = radius, "sphere radius below minimum, clamping");
        }
        self.sphere_radius = radius.max(MIN_SPHERE_RADIUS);
    }

    /// Sphere and ring radius in world units after scaling.
    pub fn world_radius(&self) -> f32 {
        self.sphere_radius * self.base.scale()
    }

    pub fn look_ring_enabled(&self) -> bool {
        self.look_ring_enabled
    }

    pub fn set_look_ring_enabled(&mut self, enabled: bool) {
        self.look_ring_enabled = enabled;
        if !enabled && self.is_look_ring_selected() && self.drag.is_none() {
            self.selection = RotationHandle::None;
        }
    }

    pub fn look_ring_scale(&self) -> f32 {
        self.look_ring_scale
    }

    pub fn set_look_ring_scale(&mut self, scale: f32) {
        self.look_ring_scale = scale.max(0.0);
    }

    pub fn sphere_color(&self) -> Rgba {
        self.sphere_color
    }

    pub fn set_sphere_color(&mut self, color: Rgba) {
        self.sphere_color = color;
    }

    pub fn look_ring_color(&self) -> Rgba {
        self.look_ring_color
    }

    pub fn set_look_ring_color(&mut self, color: Rgba) {
        self.look_ring_color = color;
    }

    pub fn guide_color(&self) -> Rgba {
        self.guide_color
    }

    pub fn set_guide_color(&mut self, color: Rgba) {
        self.guide_color = color;
    }

    /// Ring tessellation for `axis` in gizmo-local unit space.
    pub fn ring_points(&self, axis: Axis) -> &[Vec3] {
        match axis.index() {
            Some(index) => &self.rings[index],
            None => &[],
        }
    }

    /// Ring points in world space at the current pose and scale.
    pub fn world_ring_points(&self, axis: Axis) -> Vec<Vec3> {
        let center = self.base.position();
        let rotation = self.base.rotation();
        let radius = self.world_radius();
        self.ring_points(axis)
            .iter()
            .map(|point| center + rotation * (*point * radius))
            .collect()
    }

    /// Look ring radius in pixels.
    pub fn look_ring_screen_radius(&self, camera: &Camera) -> f32 {
        camera.screen_space_radius(self.base.position(), self.world_radius()) * self.look_ring_scale
    }

    /// False when the whole sphere lies outside the camera's near/far range;
    /// screen-space handles are neither picked nor drawn then.
    pub fn is_within_camera_clip_range(&self) -> bool {
        self.base.camera().is_some_and(|camera| {
            camera.is_sphere_within_clip_range(self.base.position(), self.world_radius())
        })
    }

    fn pick_epsilon(&self, camera: &Camera) -> f32 {
        let factor = if camera.is_orthographic() {
            ORTHOGRAPHIC_PICK_EPSILON
        } else {
            PERSPECTIVE_PICK_EPSILON
        };
        factor * self.base.scale()
    }

    // ---- Hit testing ------------------------------------------------------

    /// Intersects `ray` with the ring for `axis`: circle first, cylinder on a miss.
    fn ring_hit(&self, camera: &Camera, ray: &Ray, axis: Axis) -> Option<Vec3> {
        let center = self.base.position();
        let radius = self.world_radius();
        let epsilon = self.pick_epsilon(camera);
        let normal = self.base.basis().vector(axis);

        ray_intersects_circle(ray, center, radius, normal, true, epsilon)
            .or_else(|| {
                ray_intersects_cylinder(
                    ray,
                    center - normal * epsilon,
                    center + normal * epsilon,
                    radius,
                )
            })
            .map(|t| ray.point_at(t))
    }

    /// Frontmost visible axis ring under the ray.
    fn pick_axis_ring(&self, camera: &Camera, ray: &Ray) -> Option<Axis> {
        let reference = camera.distance_to_point(self.base.position());
        let mut best: Option<(Axis, f32)> = None;
        for axis in Axis::PRIMARY {
            let Some(hit) = self.ring_hit(camera, ray, axis) else {
                continue;
            };
            if !camera.is_point_visible_relative_to_sphere(hit, reference) {
                continue;
            }
            let distance = camera.distance_to_point(hit);
            if best.map_or(true, |(_, closest)| distance < closest) {
                best = Some((axis, distance));
            }
        }
        best.map(|(axis, _)| axis)
    }

    fn pick_look_ring(&self, camera: &Camera, cursor: Vec2) -> bool {
        if !self.look_ring_enabled || !self.is_within_camera_clip_range() {
            return false;
        }
        let Some(center) = camera.world_to_screen(self.base.position()) else {
            return false;
        };
        let radius = self.look_ring_screen_radius(camera);
        (cursor.distance(center) - radius).abs() <= LOOK_RING_PICK_TOLERANCE
    }

    fn pick_handle(&self, camera: &Camera, ray: &Ray, cursor: Vec2) -> RotationHandle {
        let axis = self.pick_axis_ring(camera, ray);
        if self.pick_look_ring(camera, cursor) {
            RotationHandle::LookRing
        } else if let Some(axis) = axis {
            RotationHandle::Axis(axis)
        } else if ray_intersects_sphere(ray, self.base.position(), self.world_radius()).is_some() {
            RotationHandle::Sphere
        } else {
            RotationHandle::None
        }
    }

    // ---- Dragging ---------------------------------------------------------

    fn apply_rotation(
        &mut self,
        rotation: Quat,
        degrees: f32,
        scene: &mut dyn SceneObjects,
        controlled: &[EntityId],
    ) {
        self.base.rotate(rotation);
        self.base.rotate_objects(scene, controlled, rotation);
        if let Some(drag) = self.drag.as_mut() {
            drag.applied_degrees += degrees;
        }
    }

    fn drag_axis_ring(
        &mut self,
        camera: &Camera,
        pointer: &PointerState,
        scene: &mut dyn SceneObjects,
        controlled: &[EntityId],
    ) {
        let Some(RotationGuide::Ring {
            center,
            normal,
            end,
            ..
        }) = self.rotation_guide()
        else {
            return;
        };

        let radial = end - center;
        let tangent = normal.cross(radial).normalize_or_zero();
        if tangent == Vec3::ZERO {
            return;
        }
        let (Some(from), Some(to)) = (
            camera.world_to_screen(end),
            camera.world_to_screen(end + tangent * radial.length()),
        ) else {
            return;
        };
        let screen_tangent = (to - from).normalize_or_zero();
        if screen_tangent == Vec2::ZERO {
            return;
        }

        let relative = pointer.delta.dot(screen_tangent) * DEGREES_PER_PIXEL;
        let step = self.snap.step_degrees();
        let snapping = self.snap.enabled();
        let degrees = match self.drag.as_mut() {
            Some(drag) if snapping => consume_snap_steps(&mut drag.accumulated_degrees, relative, step),
            Some(_) => relative,
            None => return,
        };
        if degrees == 0.0 {
            return;
        }
        if snapping {
            debug!(
                degrees,
                remainder = self.accumulated_rotation(),
                "rotation snapped"
            );
        }

        let rotation = Quat::from_axis_angle(normal, degrees.to_radians());
        self.apply_rotation(rotation, degrees, scene, controlled);
        if let Some(RotationGuide::Ring { end, .. }) =
            self.drag.as_mut().and_then(|drag| drag.guide.as_mut())
        {
            *end = center + rotation * radial;
        }
    }

    fn drag_look_ring(
        &mut self,
        camera: &Camera,
        pointer: &PointerState,
        scene: &mut dyn SceneObjects,
        controlled: &[EntityId],
    ) {
        let Some(RotationGuide::Screen { center, end, .. }) = self.rotation_guide() else {
            return;
        };
        let radial = end - center;
        let tangent = Vec2::new(-radial.y, radial.x).normalize_or_zero();
        if tangent == Vec2::ZERO {
            return;
        }
        let degrees = pointer.delta.dot(tangent) * DEGREES_PER_PIXEL;
        if degrees == 0.0 {
            return;
        }

        // Positive angles about the view direction turn clockwise on screen.
        let rotation = Quat::from_axis_angle(camera.forward_vec(), degrees.to_radians());
        self.apply_rotation(rotation, degrees, scene, controlled);
        if let Some(RotationGuide::Screen { end, .. }) =
            self.drag.as_mut().and_then(|drag| drag.guide.as_mut())
        {
            *end = center + Vec2::from_angle(degrees.to_radians()).rotate(radial);
        }
    }

    fn drag_sphere(
        &mut self,
        camera: &Camera,
        pointer: &PointerState,
        scene: &mut dyn SceneObjects,
        controlled: &[EntityId],
    ) {
        let yaw = pointer.delta.x * DEGREES_PER_PIXEL;
        let pitch = pointer.delta.y * DEGREES_PER_PIXEL;
        if yaw == 0.0 && pitch == 0.0 {
            return;
        }
        let rotation = Quat::from_axis_angle(camera.up_vec(), yaw.to_radians())
            * Quat::from_axis_angle(camera.right_vec(), pitch.to_radians());
        let degrees = yaw.hypot(pitch);
        self.apply_rotation(rotation, degrees, scene, controlled);
    }

    fn start_guide(&self, camera: &Camera, ray: &Ray, cursor: Vec2) -> Option<RotationGuide> {
        let center = self.base.position();
        let radius = self.world_radius();
        match self.selection {
            RotationHandle::Axis(axis) => {
                let normal = self.base.basis().vector(axis);
                let hit = self
                    .ring_hit(camera, ray, axis)
                    .or_else(|| {
                        Plane::from_normal_and_point(normal, center)
                            .raycast(ray)
                            .map(|t| ray.point_at(t))
                    })
                    .unwrap_or(center + normal.any_orthonormal_vector() * radius);
                let start = closest_point_on_circle(hit, center, radius, normal);
                Some(RotationGuide::Ring {
                    center,
                    normal,
                    start,
                    end: start,
                })
            }
            RotationHandle::LookRing => {
                let screen_center = camera.world_to_screen(center)?;
                let direction = (cursor - screen_center).normalize_or(Vec2::X);
                let start = screen_center + direction * self.look_ring_screen_radius(camera);
                Some(RotationGuide::Screen {
                    center: screen_center,
                    start,
                    end: start,
                })
            }
            RotationHandle::Sphere | RotationHandle::None => None,
        }
    }

    // ---- Rendering --------------------------------------------------------

    fn render_rings(&self, camera: &Camera, sink: &mut dyn RenderSink) {
        let reference = camera.distance_to_point(self.base.position());
        for axis in self.base.draw_order() {
            let selected = self.selected_axis() == axis;
            let color = self.base.handle_color(axis, selected);
            let points = self.world_ring_points(axis);
            let runs = visible_runs(&points, |point| {
                camera.is_point_visible_relative_to_sphere(point, reference)
            });
            for points in runs {
                sink.submit(RenderPrimitive::LineStrip { points, color });
            }
        }
    }

    fn render_screen_circles(&self, camera: &Camera, sink: &mut dyn RenderSink) {
        let center = self.base.position();
        if !self.is_within_camera_clip_range() {
            return;
        }
        let Some(screen_center) = camera.world_to_screen(center) else {
            return;
        };
        let selected = self.base.selected_axis_color();

        sink.submit(RenderPrimitive::ScreenCircle {
            center: screen_center,
            radius: camera.screen_space_radius(center, self.world_radius()),
            color: if self.is_sphere_selected() {
                selected
            } else {
                self.sphere_color
            },
        });
        if self.look_ring_enabled {
            sink.submit(RenderPrimitive::ScreenCircle {
                center: screen_center,
                radius: self.look_ring_screen_radius(camera),
                color: if self.is_look_ring_selected() {
                    selected
                } else {
                    self.look_ring_color
                },
            });
        }
    }

    fn render_guide(&self, sink: &mut dyn RenderSink) {
        let Some(drag) = self.drag.as_ref() else {
            return;
        };
        let color = self.guide_color;
        match drag.guide {
            Some(RotationGuide::Ring {
                center,
                normal,
                start,
                end,
            }) => {
                sink.submit(RenderPrimitive::Line {
                    from: center,
                    to: start,
                    color,
                });
                sink.submit(RenderPrimitive::Line {
                    from: center,
                    to: end,
                    color,
                });
                let sweep = drag.applied_degrees.clamp(-360.0, 360.0);
                let segments = (sweep.abs() / GUIDE_ARC_DEGREES_PER_SEGMENT).ceil().max(1.0) as usize;
                let radial = start - center;
                let rim = (0..=segments)
                    .map(|i| {
                        let angle = sweep * i as f32 / segments as f32;
                        center + Quat::from_axis_angle(normal, angle.to_radians()) * radial
                    })
                    .collect();
                sink.submit(RenderPrimitive::TriangleFan {
                    center,
                    rim,
                    color: color.with_alpha(color.alpha() * 0.5),
                });
            }
            Some(RotationGuide::Screen { center, start, end }) => {
                sink.submit(RenderPrimitive::ScreenLine {
                    from: center,
                    to: start,
                    color,
                });
                sink.submit(RenderPrimitive::ScreenLine {
                    from: center,
                    to: end,
                    color,
                });
            }
            None => {}
        }
    }
}

impl Gizmo for RotationGizmo {
    fn base(&self) -> &GizmoBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut GizmoBase {
        &mut self.base
    }

    fn has_selected_handle(&self) -> bool {
        self.selection.is_some()
    }

    fn update_hover(&mut self, ray: &Ray, pointer: &PointerState) {
        let selection = match self.base.camera() {
            Some(camera) => self.pick_handle(camera, ray, pointer.position),
            None => RotationHandle::None,
        };
        if selection != self.selection {
            trace!(?selection, "rotation gizmo hover changed");
        }
        self.selection = selection;
    }

    fn clear_selection(&mut self) {
        self.selection = RotationHandle::None;
    }

    fn begin_drag(&mut self, ray: &Ray, pointer: &PointerState) {
        let guide = self
            .base
            .camera()
            .and_then(|camera| self.start_guide(camera, ray, pointer.position));
        debug!(handle = ?self.selection, "rotation drag started");
        self.drag = Some(RotationDrag {
            handle: self.selection,
            accumulated_degrees: 0.0,
            applied_degrees: 0.0,
            guide,
        });
    }

    fn drag(
        &mut self,
        _ray: &Ray,
        pointer: &PointerState,
        scene: &mut dyn SceneObjects,
        controlled: &[EntityId],
    ) {
        let Some(handle) = self.drag.as_ref().map(|drag| drag.handle) else {
            return;
        };
        let Some(camera) = self.base.camera().cloned() else {
            return;
        };
        if pointer.delta == Vec2::ZERO {
            return;
        }
        match handle {
            RotationHandle::Axis(_) => self.drag_axis_ring(&camera, pointer, scene, controlled),
            RotationHandle::LookRing => self.drag_look_ring(&camera, pointer, scene, controlled),
            RotationHandle::Sphere => self.drag_sphere(&camera, pointer, scene, controlled),
            RotationHandle::None => {}
        }
    }

    fn end_drag(&mut self) {
        if let Some(drag) = self.drag.take() {
            debug!(
                applied = drag.applied_degrees,
                discarded = drag.accumulated_degrees,
                "rotation drag ended"
            );
        }
    }

    fn render(&self, sink: &mut dyn RenderSink) {
        let Some(camera) = self.base.camera() else {
            return;
        };
        if !self.base.is_visible() {
            return;
        }
        self.render_screen_circles(camera, sink);
        self.render_rings(camera, sink);
        self.render_guide(sink);
    }
}

/// Unit circle perpendicular to `axis`, starting on the next axis in XYZ order.
fn unit_ring(axis: Axis) -> Vec<Vec3> {
    (0..RING_SAMPLE_COUNT)
        .map(|i| {
            let angle = std::f32::consts::TAU * i as f32 / RING_SAMPLE_COUNT as f32;
            let (sin, cos) = angle.sin_cos();
            match axis {
                Axis::X => Vec3::new(0.0, cos, sin),
                Axis::Y => Vec3::new(sin, 0.0, cos),
                Axis::Z | Axis::None => Vec3::new(cos, sin, 0.0),
            }
        })
        .collect()
}

/// Folds `relative` degrees into `accumulated` and returns the rotation to
/// apply now: a whole number of snap steps signed like the accumulator, or
/// zero while less than one step has built up.
pub fn consume_snap_steps(accumulated: &mut f32, relative: f32, step: f32) -> f32 {
    *accumulated += relative;
    let steps = ((accumulated.abs() + SNAP_EPSILON) / step).floor();
    if steps < 1.0 {
        return 0.0;
    }
    let applied = step * steps * accumulated.signum();
    *accumulated -= applied;
    applied
}

/// Splits a closed polyline into runs of consecutive visible points.
fn visible_runs(points: &[Vec3], is_visible: impl Fn(Vec3) -> bool) -> Vec<Vec<Vec3>> {
    let flags: Vec<bool> = points.iter().map(|point| is_visible(*point)).collect();
    let Some(first_hidden) = flags.iter().position(|visible| !visible) else {
        let mut closed = points.to_vec();
        if let Some(first) = points.first() {
            closed.push(*first);
        }
        return if closed.len() >= 2 { vec![closed] } else { Vec::new() };
    };

    // Walk once around the loop starting after a hidden point, so no run
    // straddles the seam between the last and first samples.
    let count = points.len();
    let mut runs = Vec::new();
    let mut current = Vec::new();
    for offset in 1..=count {
        let index = (first_hidden + offset) % count;
        if flags[index] {
            current.push(points[index]);
        } else if !current.is_empty() {
            runs.push(std::mem::take(&mut current));
        }
    }
    runs.retain(|run: &Vec<Vec3>| run.len() >= 2);
    runs
}
