//! State and behaviour shared by every gizmo kind: pose, screen-constant
//! scale, axis draw order, object/layer masking, pivot policy and the
//! press/drag/release lifecycle that drives the concrete gizmo.

use std::collections::HashSet;

use axes::{Axis, AxisBasis};
use camera::{Camera, ProjectionMode};
use geometry::Ray;
use glam::{Quat, Vec3};
use settings::{GizmoSettings, Rgba, TransformPivot, MIN_BASE_SCALE};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::events::{GizmoEvent, GizmoObserver};
use crate::input::PointerState;
use crate::render::RenderSink;
use crate::scene::{top_level_objects, EntityId, Layer, Pose, SceneObjects};

/// Scale factor applied to the orthographic half-height.
pub const ORTHOGRAPHIC_SCALE_FACTOR: f32 = 75.0;
/// Scale factor applied to the camera-to-gizmo distance.
pub const PERSPECTIVE_SCALE_FACTOR: f32 = 45.0;

const POSE_CHANGE_TOLERANCE: f32 = 1e-6;
/// Oldest queued events are dropped past this many.
const MAX_QUEUED_EVENTS: usize = 256;
const LAYER_COUNT: Layer = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GizmoId(Uuid);

impl GizmoId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for GizmoId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for GizmoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GizmoKind {
    Rotation,
}

impl GizmoKind {
    pub const fn label(self) -> &'static str {
        match self {
            GizmoKind::Rotation => "rotation",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DragPhase {
    #[default]
    Idle,
    Hovering,
    Dragging,
}

pub struct GizmoBase {
    id: GizmoId,
    kind: GizmoKind,
    camera: Option<Camera>,

    position: Vec3,
    rotation: Quat,
    scale: f32,
    base_scale: f32,
    preserve_screen_size: bool,
    draw_order: [Axis; 3],
    visible: bool,

    axis_colors: [Rgba; 3],
    selected_axis_color: Rgba,
    pivot: TransformPivot,

    masked_objects: HashSet<EntityId>,
    masked_layers: u32,

    phase: DragPhase,
    pre_drag_poses: Vec<(EntityId, Pose)>,

    observers: Vec<Box<dyn GizmoObserver>>,
    events: Vec<GizmoEvent>,
}

impl std::fmt::Debug for GizmoBase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GizmoBase")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("position", &self.position)
            .field("rotation", &self.rotation)
            .field("scale", &self.scale)
            .field("phase", &self.phase)
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}

impl GizmoBase {
    pub fn new(kind: GizmoKind, settings: &GizmoSettings) -> Self {
        Self {
            id: GizmoId::new(),
            kind,
            camera: None,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: settings.base_scale.max(MIN_BASE_SCALE),
            base_scale: settings.base_scale.max(MIN_BASE_SCALE),
            preserve_screen_size: settings.preserve_screen_size,
            draw_order: Axis::PRIMARY,
            visible: true,
            axis_colors: settings.axis_colors,
            selected_axis_color: settings.selected_axis_color,
            pivot: settings.pivot,
            masked_objects: HashSet::new(),
            masked_layers: 0,
            phase: DragPhase::Idle,
            pre_drag_poses: Vec::new(),
            observers: Vec::new(),
            events: Vec::new(),
        }
    }

    pub fn id(&self) -> GizmoId {
        self.id
    }

    pub fn kind(&self) -> GizmoKind {
        self.kind
    }

    pub fn camera(&self) -> Option<&Camera> {
        self.camera.as_ref()
    }

    /// Replaces the viewing camera and immediately refreshes the scale and
    /// axis draw order. Passing None disables picking and rendering.
    pub fn set_camera(&mut self, camera: Option<Camera>) {
        self.camera = camera;
        self.refresh_view_dependent_state();
    }

    pub fn camera_mut(&mut self) -> Option<&mut Camera> {
        self.camera.as_mut()
    }

    // ---- Pose -------------------------------------------------------------

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.refresh_view_dependent_state();
    }

    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    pub fn set_rotation(&mut self, rotation: Quat) {
        self.rotation = rotation.normalize();
        self.refresh_draw_order();
    }

    pub fn basis(&self) -> AxisBasis {
        AxisBasis::from_rotation(self.rotation)
    }

    /// Moves the gizmo to the mean position of the manipulable controlled
    /// objects. Leaves it in place when there are none.
    pub fn move_to_controlled_center(&mut self, scene: &dyn SceneObjects, controlled: &[EntityId]) {
        let positions: Vec<Vec3> = self
            .manipulable_objects(scene, controlled)
            .into_iter()
            .filter_map(|id| scene.pose(id).map(|pose| pose.position))
            .collect();
        if positions.is_empty() {
            return;
        }
        let sum: Vec3 = positions.iter().copied().sum();
        self.set_position(sum / positions.len() as f32);
    }

    // ---- Scale and draw order --------------------------------------------

    /// Uniform world-space scale applied to every handle.
    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn base_scale(&self) -> f32 {
        self.base_scale
    }

    pub fn set_base_scale(&mut self, base_scale: f32) {
        if base_scale < MIN_BASE_SCALE {
            warn!(requested = base_scale, "base scale below minimum, clamping");
        }
        self.base_scale = base_scale.max(MIN_BASE_SCALE);
        self.refresh_scale();
    }

    pub fn preserve_screen_size(&self) -> bool {
        self.preserve_screen_size
    }

    pub fn set_preserve_screen_size(&mut self, preserve: bool) {
        self.preserve_screen_size = preserve;
        self.refresh_scale();
    }

    /// Recomputes the scale so the gizmo keeps a constant on-screen size.
    /// Without a camera, or with size preservation off, the base scale is used.
    pub fn refresh_scale(&mut self) {
        self.scale = match (&self.camera, self.preserve_screen_size) {
            (Some(camera), true) => {
                let measure = match camera.projection() {
                    ProjectionMode::Orthographic => {
                        ORTHOGRAPHIC_SCALE_FACTOR * camera.orthographic_size()
                    }
                    ProjectionMode::Perspective => {
                        PERSPECTIVE_SCALE_FACTOR * camera.position().distance(self.position)
                    }
                };
                self.base_scale * measure / camera.viewport_height()
            }
            _ => self.base_scale,
        };
    }

    /// Axes sorted so the one most aligned with the view direction comes first.
    pub fn draw_order(&self) -> [Axis; 3] {
        self.draw_order
    }

    pub fn refresh_draw_order(&mut self) {
        if let Some(camera) = &self.camera {
            self.draw_order = axes::draw_order(&self.basis(), camera.forward_vec());
        }
    }

    fn refresh_view_dependent_state(&mut self) {
        self.refresh_scale();
        self.refresh_draw_order();
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    // ---- Colours ----------------------------------------------------------

    /// Colour of the handle for `axis`; [`Axis::None`] maps to black.
    pub fn axis_color(&self, axis: Axis) -> Rgba {
        axis.index()
            .map(|index| self.axis_colors[index])
            .unwrap_or(Rgba::BLACK)
    }

    /// Setting a colour for [`Axis::None`] has no effect.
    pub fn set_axis_color(&mut self, axis: Axis, color: Rgba) {
        if let Some(index) = axis.index() {
            self.axis_colors[index] = color;
        }
    }

    pub fn selected_axis_color(&self) -> Rgba {
        self.selected_axis_color
    }

    pub fn set_selected_axis_color(&mut self, color: Rgba) {
        self.selected_axis_color = color;
    }

    pub fn handle_color(&self, axis: Axis, selected: bool) -> Rgba {
        if selected {
            self.selected_axis_color
        } else {
            self.axis_color(axis)
        }
    }

    // ---- Pivot ------------------------------------------------------------

    pub fn pivot(&self) -> TransformPivot {
        self.pivot
    }

    pub fn set_pivot(&mut self, pivot: TransformPivot) {
        self.pivot = pivot;
    }

    // ---- Masking ----------------------------------------------------------

    pub fn mask_object(&mut self, id: EntityId) {
        self.masked_objects.insert(id);
    }

    pub fn unmask_object(&mut self, id: EntityId) {
        self.masked_objects.remove(&id);
    }

    pub fn is_object_masked(&self, id: EntityId) -> bool {
        self.masked_objects.contains(&id)
    }

    pub fn mask_layer(&mut self, layer: Layer) {
        if layer >= LAYER_COUNT {
            warn!(layer, "layer index out of range, ignoring mask");
            return;
        }
        self.masked_layers |= 1 << layer;
    }

    pub fn unmask_layer(&mut self, layer: Layer) {
        if layer < LAYER_COUNT {
            self.masked_layers &= !(1 << layer);
        }
    }

    pub fn is_layer_masked(&self, layer: Layer) -> bool {
        layer < LAYER_COUNT && self.masked_layers & (1 << layer) != 0
    }

    /// Bit set of masked layers.
    pub fn masked_layers(&self) -> u32 {
        self.masked_layers
    }

    /// False when the object itself or its layer is masked.
    pub fn can_object_be_manipulated(&self, scene: &dyn SceneObjects, id: EntityId) -> bool {
        !self.is_object_masked(id) && !self.is_layer_masked(scene.layer(id))
    }

    /// Top-level controlled objects that are not masked, in list order.
    pub fn manipulable_objects(
        &self,
        scene: &dyn SceneObjects,
        controlled: &[EntityId],
    ) -> Vec<EntityId> {
        top_level_objects(scene, controlled)
            .into_iter()
            .filter(|id| self.can_object_be_manipulated(scene, *id))
            .collect()
    }

    /// True when a camera is bound, the gizmo is visible and at least one
    /// controlled object would move under a drag.
    pub fn is_ready_for_object_manipulation(
        &self,
        scene: &dyn SceneObjects,
        controlled: &[EntityId],
    ) -> bool {
        self.camera.is_some()
            && self.visible
            && controlled
                .iter()
                .any(|id| scene.pose(*id).is_some() && self.can_object_be_manipulated(scene, *id))
    }

    // ---- Transformation ---------------------------------------------------

    /// Rotates the gizmo's own orientation by `rotation` (world space).
    pub fn rotate(&mut self, rotation: Quat) {
        self.rotation = (rotation * self.rotation).normalize();
        self.refresh_draw_order();
    }

    /// Applies `rotation` to every manipulable controlled object according to
    /// the pivot policy. Masked objects and children of controlled parents are
    /// left untouched.
    pub fn rotate_objects(
        &self,
        scene: &mut dyn SceneObjects,
        controlled: &[EntityId],
        rotation: Quat,
    ) {
        for id in self.manipulable_objects(&*scene, controlled) {
            let Some(pose) = scene.pose(id) else {
                continue;
            };
            let rotated = match self.pivot {
                TransformPivot::Center => pose.rotated_about(self.position, rotation),
                TransformPivot::MeshPivot => pose.rotated_in_place(rotation),
            };
            scene.set_pose(id, rotated);
        }
    }

    // ---- Drag lifecycle ---------------------------------------------------

    pub fn phase(&self) -> DragPhase {
        self.phase
    }

    pub fn is_dragging(&self) -> bool {
        self.phase == DragPhase::Dragging
    }

    /// Picking ray under the pointer, or None without a camera.
    pub fn pointer_ray(&self, pointer: &PointerState) -> Option<Ray> {
        self.camera
            .as_ref()
            .map(|camera| camera.screen_point_to_ray(pointer.position))
            .filter(|ray| !ray.is_degenerate())
    }

    fn set_hover_phase(&mut self, hovering: bool) {
        self.phase = if hovering {
            DragPhase::Hovering
        } else {
            DragPhase::Idle
        };
    }

    fn begin_session(&mut self, scene: &dyn SceneObjects, controlled: &[EntityId]) {
        self.pre_drag_poses = self
            .manipulable_objects(scene, controlled)
            .into_iter()
            .filter_map(|id| scene.pose(id).map(|pose| (id, pose)))
            .collect();
        self.phase = DragPhase::Dragging;
        debug!(
            gizmo = %self.id,
            kind = self.kind.label(),
            objects = self.pre_drag_poses.len(),
            "drag started"
        );
        self.notify(GizmoEvent::DragStarted { gizmo: self.id });
    }

    fn end_session(&mut self, scene: &dyn SceneObjects) {
        let transformed = self.pre_drag_poses.iter().any(|(id, before)| {
            scene
                .pose(*id)
                .is_some_and(|now| !now.approx_eq(before, POSE_CHANGE_TOLERANCE))
        });
        self.pre_drag_poses.clear();
        self.phase = DragPhase::Idle;
        debug!(gizmo = %self.id, transformed, "drag ended");
        self.notify(GizmoEvent::DragEnded {
            gizmo: self.id,
            transformed,
        });
    }

    // ---- Notifications ----------------------------------------------------

    pub fn add_observer(&mut self, observer: Box<dyn GizmoObserver>) {
        self.observers.push(observer);
    }

    /// Takes the events queued since the last call, oldest first. Hosts that
    /// only use observers may never drain; the queue keeps the most recent
    /// events then.
    pub fn drain_events(&mut self) -> Vec<GizmoEvent> {
        std::mem::take(&mut self.events)
    }

    fn notify(&mut self, event: GizmoEvent) {
        let mut observers = std::mem::take(&mut self.observers);
        for observer in observers.iter_mut() {
            match event {
                GizmoEvent::DragStarted { .. } => observer.on_drag_start(self),
                GizmoEvent::DragUpdated { .. } => observer.on_drag_update(self),
                GizmoEvent::DragEnded { transformed, .. } => observer.on_drag_end(self, transformed),
            }
        }
        self.observers = observers;

        // Consecutive updates collapse into one queued event.
        if matches!(event, GizmoEvent::DragUpdated { .. })
            && self.events.last() == Some(&event)
        {
            return;
        }
        self.events.push(event);
        if self.events.len() > MAX_QUEUED_EVENTS {
            let overflow = self.events.len() - MAX_QUEUED_EVENTS;
            self.events.drain(0..overflow);
        }
    }
}

/// A manipulator driven once per frame by [`Gizmo::update`].
///
/// Implementors provide hit testing, drag behaviour and drawing; the provided
/// `update` sequences them through the hover/press/drag/release lifecycle.
pub trait Gizmo {
    fn base(&self) -> &GizmoBase;

    fn base_mut(&mut self) -> &mut GizmoBase;

    /// Whether some handle is currently selected (hovered or being dragged).
    fn has_selected_handle(&self) -> bool;

    /// Re-runs hit testing for every handle. Never called while dragging.
    fn update_hover(&mut self, ray: &Ray, pointer: &PointerState);

    fn clear_selection(&mut self);

    /// Starts a drag session on the selected handle.
    fn begin_drag(&mut self, ray: &Ray, pointer: &PointerState);

    /// Applies one frame of pointer movement to the gizmo and the objects.
    fn drag(
        &mut self,
        ray: &Ray,
        pointer: &PointerState,
        scene: &mut dyn SceneObjects,
        controlled: &[EntityId],
    );

    /// Ends the drag session and resets per-drag accumulators.
    fn end_drag(&mut self);

    fn render(&self, sink: &mut dyn RenderSink);

    fn is_transforming_objects(&self) -> bool {
        self.base().is_dragging() && self.has_selected_handle()
    }

    fn is_ready_for_object_manipulation(
        &self,
        scene: &dyn SceneObjects,
        controlled: &[EntityId],
    ) -> bool {
        self.base().is_ready_for_object_manipulation(scene, controlled)
    }

    /// Processes one frame of pointer input.
    ///
    /// While dragging, hit testing is suspended and every frame is routed to
    /// [`Gizmo::drag`] until the button is released. Otherwise the handles are
    /// hit tested while the button is up, and a press over a selected handle
    /// starts a drag. The scale
    /// and draw order are refreshed last so they track camera changes.
    fn update(
        &mut self,
        pointer: &PointerState,
        scene: &mut dyn SceneObjects,
        controlled: &[EntityId],
    ) {
        let ray = self.base().pointer_ray(pointer);

        if self.base().is_dragging() {
            if pointer.held && !pointer.released {
                if let Some(ray) = ray {
                    self.drag(&ray, pointer, scene, controlled);
                }
                let id = self.base().id();
                self.base_mut().notify(GizmoEvent::DragUpdated { gizmo: id });
            } else {
                self.end_drag();
                self.clear_selection();
                self.base_mut().end_session(&*scene);
            }
        } else {
            // A press that missed every handle keeps hover off until release.
            let button_free = !pointer.held || pointer.pressed;
            match ray {
                Some(ray) if self.base().is_visible() && button_free => {
                    self.update_hover(&ray, pointer);
                    let hovering = self.has_selected_handle();
                    if pointer.pressed && hovering {
                        self.begin_drag(&ray, pointer);
                        self.base_mut().begin_session(&*scene, controlled);
                    } else {
                        self.base_mut().set_hover_phase(hovering);
                    }
                }
                _ => {
                    self.clear_selection();
                    self.base_mut().set_hover_phase(false);
                }
            }
        }

        self.base_mut().refresh_view_dependent_state();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::InMemoryScene;

    fn ortho_camera(size: f32) -> Camera {
        Camera::orthographic(size, (800, 600)).looking_at(
            Vec3::new(0.0, 0.0, 10.0),
            Vec3::ZERO,
            Vec3::Y,
        )
    }

    #[test]
    fn scale_tracks_orthographic_size() {
        let mut base = GizmoBase::new(GizmoKind::Rotation, &GizmoSettings::default());
        base.set_camera(Some(ortho_camera(4.0)));
        let small = base.scale();
        assert!((small - 75.0 * 4.0 / 600.0).abs() < 1e-5);

        base.set_camera(Some(ortho_camera(8.0)));
        assert!((base.scale() - 2.0 * small).abs() < 1e-5);
    }

    #[test]
    fn scale_tracks_perspective_distance() {
        let mut base = GizmoBase::new(GizmoKind::Rotation, &GizmoSettings::default());
        let camera = Camera::perspective(60.0, (800, 600)).looking_at(
            Vec3::new(0.0, 0.0, 12.0),
            Vec3::ZERO,
            Vec3::Y,
        );
        base.set_camera(Some(camera));
        assert!((base.scale() - 45.0 * 12.0 / 600.0).abs() < 1e-4);

        base.set_preserve_screen_size(false);
        assert_eq!(base.scale(), 1.0);
    }

    #[test]
    fn no_camera_uses_base_scale() {
        let mut settings = GizmoSettings::default();
        settings.base_scale = 2.5;
        let mut base = GizmoBase::new(GizmoKind::Rotation, &settings);
        base.refresh_scale();
        assert_eq!(base.scale(), 2.5);
        assert!(base.pointer_ray(&PointerState::default()).is_none());
    }

    #[test]
    fn masking_by_object_and_layer() {
        let mut scene = InMemoryScene::new();
        let a = scene.spawn_with(Pose::IDENTITY, 0, None);
        let b = scene.spawn_with(Pose::IDENTITY, 3, None);
        let mut base = GizmoBase::new(GizmoKind::Rotation, &GizmoSettings::default());
        base.set_camera(Some(ortho_camera(5.0)));

        base.mask_object(a);
        assert!(!base.can_object_be_manipulated(&scene, a));
        assert!(base.can_object_be_manipulated(&scene, b));

        base.mask_layer(3);
        assert_eq!(base.masked_layers(), 1 << 3);
        assert!(!base.can_object_be_manipulated(&scene, b));
        assert!(!base.is_ready_for_object_manipulation(&scene, &[a, b]));

        base.unmask_object(a);
        base.unmask_layer(3);
        assert!(base.is_ready_for_object_manipulation(&scene, &[a, b]));

        base.mask_layer(40);
        assert_eq!(base.masked_layers(), 0);
    }

    #[test]
    fn colors_default_and_update() {
        let mut base = GizmoBase::new(GizmoKind::Rotation, &GizmoSettings::default());
        assert_eq!(base.axis_color(Axis::X), Rgba::RED);
        assert_eq!(base.axis_color(Axis::None), Rgba::BLACK);
        base.set_axis_color(Axis::Y, Rgba::WHITE);
        base.set_axis_color(Axis::None, Rgba::WHITE);
        assert_eq!(base.axis_color(Axis::Y), Rgba::WHITE);
        assert_eq!(base.axis_color(Axis::None), Rgba::BLACK);
        assert_eq!(base.handle_color(Axis::Z, true), Rgba::YELLOW);
    }

    #[test]
    fn rotate_objects_honours_pivot() {
        let mut scene = InMemoryScene::new();
        let id = scene.spawn(Pose::new(Vec3::new(2.0, 0.0, 0.0), Quat::IDENTITY));
        let mut base = GizmoBase::new(GizmoKind::Rotation, &GizmoSettings::default());
        let quarter = Quat::from_rotation_z(std::f32::consts::FRAC_PI_2);

        base.rotate_objects(&mut scene, &[id], quarter);
        let pose = scene.pose(id).unwrap();
        assert!(pose.position.abs_diff_eq(Vec3::new(0.0, 2.0, 0.0), 1e-5));

        base.set_pivot(TransformPivot::MeshPivot);
        base.rotate_objects(&mut scene, &[id], quarter);
        let pose = scene.pose(id).unwrap();
        assert!(pose.position.abs_diff_eq(Vec3::new(0.0, 2.0, 0.0), 1e-5));
        assert!(pose.rotation.abs_diff_eq(quarter * quarter, 1e-5));
    }

    #[test]
    fn move_to_controlled_center_averages_manipulable_objects() {
        let mut scene = InMemoryScene::new();
        let a = scene.spawn(Pose::new(Vec3::new(2.0, 0.0, 0.0), Quat::IDENTITY));
        let b = scene.spawn(Pose::new(Vec3::new(0.0, 4.0, 0.0), Quat::IDENTITY));
        let masked = scene.spawn(Pose::new(Vec3::splat(100.0), Quat::IDENTITY));
        let mut base = GizmoBase::new(GizmoKind::Rotation, &GizmoSettings::default());
        base.mask_object(masked);

        base.move_to_controlled_center(&scene, &[a, b, masked]);
        assert!(base.position().abs_diff_eq(Vec3::new(1.0, 2.0, 0.0), 1e-5));

        base.move_to_controlled_center(&scene, &[masked]);
        assert!(base.position().abs_diff_eq(Vec3::new(1.0, 2.0, 0.0), 1e-5));
    }

    #[test]
    fn undrained_event_queue_stays_bounded() {
        let scene = InMemoryScene::new();
        let mut base = GizmoBase::new(GizmoKind::Rotation, &GizmoSettings::default());
        for _ in 0..1000 {
            base.begin_session(&scene, &[]);
            base.notify(GizmoEvent::DragUpdated { gizmo: base.id() });
            base.end_session(&scene);
        }

        let events = base.drain_events();
        assert_eq!(events.len(), MAX_QUEUED_EVENTS);
        assert_eq!(
            events.last(),
            Some(&GizmoEvent::DragEnded {
                gizmo: base.id(),
                transformed: false
            })
        );
        assert!(base.drain_events().is_empty());
    }
}
