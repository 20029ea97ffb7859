use std::{
    fmt,
    sync::{Arc, Mutex},
    time::{SystemTime, UNIX_EPOCH},
};

use gizmo::{GizmoBase, GizmoId, GizmoObserver};
use glam::Quat;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragStage {
    Started,
    Updated,
    Ended { transformed: bool },
}

impl DragStage {
    pub fn label(self) -> &'static str {
        match self {
            DragStage::Started => "START",
            DragStage::Updated => "UPDATE",
            DragStage::Ended { .. } => "END",
        }
    }
}

impl fmt::Display for DragStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone)]
pub struct DragLogEntry {
    pub timestamp_secs: u64,
    pub gizmo: GizmoId,
    pub stage: DragStage,
    /// Gizmo orientation when the entry was recorded.
    pub rotation: Quat,
}

const MAX_ENTRIES: usize = 500;

/// Gizmo observer keeping a bounded history of drag notifications.
///
/// Clones share the same buffer, so one clone can be registered on a gizmo
/// while another is kept for reading.
#[derive(Debug, Clone, Default)]
pub struct DragLog {
    entries: Arc<Mutex<Vec<DragLogEntry>>>,
}

impl DragLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<DragLogEntry> {
        self.entries.lock().map(|v| v.clone()).unwrap_or_default()
    }

    fn push(&self, gizmo: &GizmoBase, stage: DragStage) {
        let Ok(mut guard) = self.entries.lock() else {
            return;
        };
        guard.push(DragLogEntry {
            timestamp_secs: now_secs(),
            gizmo: gizmo.id(),
            stage,
            rotation: gizmo.rotation(),
        });
        if guard.len() > MAX_ENTRIES {
            let overflow = guard.len() - MAX_ENTRIES;
            guard.drain(0..overflow);
        }
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

impl GizmoObserver for DragLog {
    fn on_drag_start(&mut self, gizmo: &GizmoBase) {
        tracing::info!(gizmo = %gizmo.id(), "drag started");
        self.push(gizmo, DragStage::Started);
    }

    fn on_drag_update(&mut self, gizmo: &GizmoBase) {
        self.push(gizmo, DragStage::Updated);
    }

    fn on_drag_end(&mut self, gizmo: &GizmoBase, transformed: bool) {
        tracing::info!(gizmo = %gizmo.id(), transformed, "drag finished");
        self.push(gizmo, DragStage::Ended { transformed });
    }
}
