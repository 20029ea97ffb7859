use axes::Axis;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, File},
    io::BufReader,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::warn;

const QUALIFIER: &str = "com";
const ORGANIZATION: &str = "gizmo";
const APPLICATION: &str = "gizmo";
const SETTINGS_FILE: &str = "gizmo.json";

/// Smallest accepted snap increment, in degrees.
pub const MIN_SNAP_STEP_DEGREES: f32 = 0.1;
/// Smallest accepted rotation sphere radius, in world units before scaling.
pub const MIN_SPHERE_RADIUS: f32 = 0.1;
pub const MIN_BASE_SCALE: f32 = 1e-3;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("unable to resolve platform config directory")]
    MissingProjectDirs,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid settings file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid value for `{field}`: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Linear RGBA colour, components in 0.0 - 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba(pub [f32; 4]);

impl Rgba {
    pub const BLACK: Rgba = Rgba([0.0, 0.0, 0.0, 1.0]);
    pub const WHITE: Rgba = Rgba([1.0, 1.0, 1.0, 1.0]);
    pub const RED: Rgba = Rgba([0.86, 0.2, 0.2, 1.0]);
    pub const GREEN: Rgba = Rgba([0.35, 0.78, 0.25, 1.0]);
    pub const BLUE: Rgba = Rgba([0.2, 0.4, 0.9, 1.0]);
    pub const YELLOW: Rgba = Rgba([0.95, 0.85, 0.15, 1.0]);

    pub const fn with_alpha(self, alpha: f32) -> Self {
        let [r, g, b, _] = self.0;
        Rgba([r, g, b, alpha])
    }

    pub const fn alpha(self) -> f32 {
        self.0[3]
    }
}

/// Point about which rotations are applied to the controlled objects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransformPivot {
    /// Rotate every object about the gizmo's position.
    #[default]
    Center,
    /// Rotate every object about its own origin.
    MeshPivot,
}

/// Step snapping for the axis rings of the rotation gizmo.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationSnapSettings {
    enabled: bool,
    step_degrees: f32,
}

impl Default for RotationSnapSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            step_degrees: 15.0,
        }
    }
}

impl RotationSnapSettings {
    pub fn new(enabled: bool, step_degrees: f32) -> Self {
        let mut snap = Self {
            enabled,
            step_degrees: MIN_SNAP_STEP_DEGREES,
        };
        snap.set_step_degrees(step_degrees);
        snap
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Snap increment, never below [`MIN_SNAP_STEP_DEGREES`] even when the
    /// stored value came from an unvalidated file.
    pub fn step_degrees(&self) -> f32 {
        self.step_degrees.max(MIN_SNAP_STEP_DEGREES)
    }

    pub fn set_step_degrees(&mut self, step_degrees: f32) {
        if step_degrees < MIN_SNAP_STEP_DEGREES {
            warn!(
                requested = step_degrees,
                min = MIN_SNAP_STEP_DEGREES,
                "snap step below minimum, clamping"
            );
        }
        self.step_degrees = step_degrees.max(MIN_SNAP_STEP_DEGREES);
    }
}

/// Settings specific to the rotation gizmo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationGizmoSettings {
    pub sphere_radius: f32,
    /// Whether the screen-space ring for rotating about the view direction is shown.
    pub look_ring_enabled: bool,
    /// Look ring radius relative to the sphere's on-screen radius.
    pub look_ring_scale: f32,
    pub snap: RotationSnapSettings,
}

impl Default for RotationGizmoSettings {
    fn default() -> Self {
        Self {
            sphere_radius: 1.0,
            look_ring_enabled: true,
            look_ring_scale: 1.25,
            snap: RotationSnapSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GizmoSettings {
    pub axis_colors: [Rgba; 3],
    pub selected_axis_color: Rgba,
    pub sphere_color: Rgba,
    pub look_ring_color: Rgba,
    pub guide_color: Rgba,
    pub base_scale: f32,
    /// Keep the gizmo at a constant on-screen size regardless of camera distance.
    pub preserve_screen_size: bool,
    pub pivot: TransformPivot,
    pub rotation: RotationGizmoSettings,
}

impl Default for GizmoSettings {
    fn default() -> Self {
        Self {
            axis_colors: [Rgba::RED, Rgba::GREEN, Rgba::BLUE],
            selected_axis_color: Rgba::YELLOW,
            sphere_color: Rgba::WHITE.with_alpha(0.15),
            look_ring_color: Rgba::WHITE,
            guide_color: Rgba::YELLOW.with_alpha(0.35),
            base_scale: 1.0,
            preserve_screen_size: true,
            pivot: TransformPivot::Center,
            rotation: RotationGizmoSettings::default(),
        }
    }
}

impl GizmoSettings {
    /// Colour configured for `axis`; [`Axis::None`] maps to black.
    pub fn axis_color(&self, axis: Axis) -> Rgba {
        axis.index()
            .map(|index| self.axis_colors[index])
            .unwrap_or(Rgba::BLACK)
    }

    /// Rejects non-finite numbers and clamps values below their minimums.
    pub fn validated(mut self) -> Result<Self, SettingsError> {
        for (field, value) in [
            ("base_scale", self.base_scale),
            ("rotation.sphere_radius", self.rotation.sphere_radius),
            ("rotation.look_ring_scale", self.rotation.look_ring_scale),
            ("rotation.snap.step_degrees", self.rotation.snap.step_degrees),
        ] {
            if !value.is_finite() {
                return Err(SettingsError::InvalidValue {
                    field,
                    reason: format!("expected a finite number, got {value}"),
                });
            }
        }

        if self.base_scale < MIN_BASE_SCALE {
            warn!(value = self.base_scale, "base_scale below minimum, clamping");
            self.base_scale = MIN_BASE_SCALE;
        }
        if self.rotation.sphere_radius < MIN_SPHERE_RADIUS {
            warn!(
                value = self.rotation.sphere_radius,
                "sphere_radius below minimum, clamping"
            );
            self.rotation.sphere_radius = MIN_SPHERE_RADIUS;
        }
        if self.rotation.look_ring_scale < 0.0 {
            warn!(
                value = self.rotation.look_ring_scale,
                "look_ring_scale is negative, clamping"
            );
            self.rotation.look_ring_scale = 0.0;
        }
        let step = self.rotation.snap.step_degrees;
        self.rotation.snap.set_step_degrees(step);
        Ok(self)
    }
}

pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new() -> Result<Self, SettingsError> {
        let dirs = ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION)
            .ok_or(SettingsError::MissingProjectDirs)?;
        let config_dir = dirs.config_dir();
        fs::create_dir_all(config_dir)?;
        let path = config_dir.join(SETTINGS_FILE);
        Ok(Self { path })
    }

    /// Store backed by an explicit file path.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn load(&self) -> Result<GizmoSettings, SettingsError> {
        if !self.path.exists() {
            return Ok(GizmoSettings::default());
        }
        let file = File::open(&self.path)?;
        let reader = BufReader::new(file);
        let settings: GizmoSettings = serde_json::from_reader(reader)?;
        settings.validated()
    }

    pub fn save(&self, settings: &GizmoSettings) -> Result<(), SettingsError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(&self.path)?;
        serde_json::to_writer_pretty(file, settings)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Clone for SettingsStore {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
        }
    }
}
