//! Backend-neutral draw description emitted by `Gizmo::render`.
//!
//! The host turns these primitives into draw calls; world-space primitives
//! are expected to be drawn in the order they are submitted.

use glam::{Vec2, Vec3};
use settings::Rgba;

#[derive(Debug, Clone, PartialEq)]
pub enum RenderPrimitive {
    /// Connected world-space polyline.
    LineStrip { points: Vec<Vec3>, color: Rgba },
    /// Single world-space segment.
    Line { from: Vec3, to: Vec3, color: Rgba },
    /// Filled fan from `center` through consecutive `rim` points.
    TriangleFan {
        center: Vec3,
        rim: Vec<Vec3>,
        color: Rgba,
    },
    /// Circle outline in viewport pixels.
    ScreenCircle {
        center: Vec2,
        radius: f32,
        color: Rgba,
    },
    /// Segment in viewport pixels.
    ScreenLine { from: Vec2, to: Vec2, color: Rgba },
}

pub trait RenderSink {
    fn submit(&mut self, primitive: RenderPrimitive);
}

/// Sink that keeps every primitive, for tests and debugging overlays.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub primitives: Vec<RenderPrimitive>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.primitives.clear();
    }

    pub fn line_strips(&self) -> impl Iterator<Item = (&[Vec3], Rgba)> + '_ {
        self.primitives.iter().filter_map(|primitive| match primitive {
            RenderPrimitive::LineStrip { points, color } => Some((points.as_slice(), *color)),
            _ => None,
        })
    }

    pub fn screen_circles(&self) -> impl Iterator<Item = (Vec2, f32, Rgba)> + '_ {
        self.primitives.iter().filter_map(|primitive| match primitive {
            RenderPrimitive::ScreenCircle {
                center,
                radius,
                color,
            } => Some((*center, *radius, *color)),
            _ => None,
        })
    }
}

impl RenderSink for RecordingSink {
    fn submit(&mut self, primitive: RenderPrimitive) {
        self.primitives.push(primitive);
    }
}
