mod drag_log;
mod gesture;
mod orbit;

use std::path::PathBuf;

use anyhow::{Context, Result};
use axes::Axis;
use camera::ProjectionMode;
use drag_log::DragLog;
use gesture::{ring_grab_point, Gesture};
use gizmo::{Gizmo, InMemoryScene, Pose, RecordingSink, RotationGizmo, SceneObjects};
use glam::{Quat, Vec2, Vec3};
use orbit::OrbitCamera;
use settings::{GizmoSettings, SettingsStore};
use tracing::{debug, info, warn};

const VIEWPORT: (u32, u32) = (1280, 720);
const DRAG_PIXELS: f32 = 100.0;
const DRAG_FRAMES: usize = 10;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let settings_store = match std::env::args_os().nth(1) {
        Some(path) => SettingsStore::at(PathBuf::from(path)),
        None => SettingsStore::new().context("settings store init failed")?,
    };
    let settings = match settings_store.load() {
        Ok(settings) => settings,
        Err(err) => {
            warn!("Using default gizmo settings (failed to load): {err}");
            GizmoSettings::default()
        }
    };
    info!(
        path = %settings_store.path().display(),
        snap = settings.rotation.snap.enabled(),
        step = settings.rotation.snap.step_degrees(),
        "gizmo settings loaded"
    );

    let mut scene = InMemoryScene::new();
    let controlled = vec![
        scene.spawn(Pose::new(Vec3::new(-1.5, 0.0, 0.0), Quat::IDENTITY)),
        scene.spawn(Pose::new(Vec3::new(1.5, 0.5, 0.0), Quat::IDENTITY)),
    ];

    let mut rig = OrbitCamera::new(ProjectionMode::Perspective, VIEWPORT);
    rig.reset_to_fit(Vec3::ZERO, 2.0);

    let log = DragLog::new();
    let mut gizmo = RotationGizmo::new(&settings).with_camera(rig.camera());
    gizmo.base_mut().add_observer(Box::new(log.clone()));
    gizmo.base_mut().move_to_controlled_center(&scene, &controlled);

    for axis in Axis::PRIMARY {
        let (start, direction) = ring_grab_point(&gizmo, axis)
            .with_context(|| format!("{} ring has no visible grab point", axis.label()))?;
        let gesture = Gesture::starting_at(start)
            .hover_to(start)
            .press()
            .drag_by(direction * DRAG_PIXELS, DRAG_FRAMES)
            .release();
        for pointer in gesture.frames() {
            gizmo.update(pointer, &mut scene, &controlled);
        }
        info!(
            axis = axis.label(),
            rotation = ?gizmo.base().rotation(),
            "gesture finished"
        );

        rig.orbit(Vec2::new(60.0, 0.0));
        rig.zoom(-0.5);
        gizmo.base_mut().set_camera(Some(rig.camera()));
    }

    for event in gizmo.base_mut().drain_events() {
        debug!(?event, "gizmo event");
    }

    let mut sink = RecordingSink::new();
    gizmo.render(&mut sink);
    info!(
        primitives = sink.primitives.len(),
        ring_segments = sink.line_strips().count(),
        "rendered final frame"
    );

    for id in &controlled {
        if let Some(pose) = scene.pose(*id) {
            info!(%id, position = ?pose.position, rotation = ?pose.rotation, "final pose");
        }
    }
    let entries = log.entries();
    if let Some(last) = entries.last() {
        info!(
            entries = entries.len(),
            gizmo = %last.gizmo,
            stage = %last.stage,
            at = last.timestamp_secs,
            rotation = ?last.rotation,
            "drag log recorded"
        );
    }

    Ok(())
}
