use crate::base::{GizmoBase, GizmoId};

/// Drag notifications, queued on the gizmo until the host drains them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GizmoEvent {
    DragStarted { gizmo: GizmoId },
    DragUpdated { gizmo: GizmoId },
    /// `transformed` is true when a controlled object's pose differs from the
    /// snapshot taken when the drag started.
    DragEnded { gizmo: GizmoId, transformed: bool },
}

impl GizmoEvent {
    pub fn gizmo(&self) -> GizmoId {
        match *self {
            GizmoEvent::DragStarted { gizmo }
            | GizmoEvent::DragUpdated { gizmo }
            | GizmoEvent::DragEnded { gizmo, .. } => gizmo,
        }
    }
}

/// Synchronous drag callbacks, invoked from inside `Gizmo::update`.
pub trait GizmoObserver {
    fn on_drag_start(&mut self, _gizmo: &GizmoBase) {}

    fn on_drag_update(&mut self, _gizmo: &GizmoBase) {}

    /// Called once per drag, after the pointer button is released.
    fn on_drag_end(&mut self, _gizmo: &GizmoBase, _transformed: bool) {}
}
