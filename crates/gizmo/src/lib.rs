//! Interactive 3D rotation gizmo core.
//!
//! The host owns the camera, the entities and the renderer. Each frame it
//! samples the pointer into a [`PointerState`], calls [`Gizmo::update`] with
//! its scene and the controlled entity ids, then asks the gizmo to
//! [`Gizmo::render`] into a [`RenderSink`].

mod base;
mod events;
mod input;
mod render;
mod rotation;
mod scene;

pub use base::{
    DragPhase, Gizmo, GizmoBase, GizmoId, GizmoKind, ORTHOGRAPHIC_SCALE_FACTOR,
    PERSPECTIVE_SCALE_FACTOR,
};
pub use events::{GizmoEvent, GizmoObserver};
pub use input::PointerState;
pub use render::{RecordingSink, RenderPrimitive, RenderSink};
pub use rotation::{
    consume_snap_steps, RotationGizmo, RotationGuide, RotationHandle, DEGREES_PER_PIXEL,
    LOOK_RING_PICK_TOLERANCE, RING_SAMPLE_COUNT,
};
pub use scene::{top_level_objects, EntityId, InMemoryScene, Layer, Pose, SceneObjects};
