use axes::Axis;
use gizmo::{Gizmo, PointerState, RotationGizmo};
use glam::{Vec2, Vec3};

/// Scripted sequence of per-frame pointer samples.
#[derive(Debug, Clone)]
pub struct Gesture {
    frames: Vec<PointerState>,
}

impl Gesture {
    pub fn starting_at(position: Vec2) -> Self {
        Self {
            frames: vec![PointerState::at(position)],
        }
    }

    fn last(&self) -> PointerState {
        self.frames.last().copied().unwrap_or_default()
    }

    fn push(mut self, position: Vec2, button_down: bool) -> Self {
        let next = self.last().advance(position, button_down);
        self.frames.push(next);
        self
    }

    pub fn hover_to(self, position: Vec2) -> Self {
        self.push(position, false)
    }

    pub fn press(self) -> Self {
        let position = self.last().position;
        self.push(position, true)
    }

    /// Moves by `delta` in `steps` equal frames with the button held.
    pub fn drag_by(mut self, delta: Vec2, steps: usize) -> Self {
        let steps = steps.max(1);
        let start = self.last().position;
        for i in 1..=steps {
            self = self.push(start + delta * (i as f32 / steps as f32), true);
        }
        self
    }

    pub fn release(self) -> Self {
        let position = self.last().position;
        self.push(position, false)
    }

    pub fn frames(&self) -> &[PointerState] {
        &self.frames
    }
}

/// Pixel on the visible half of `axis`'s ring, with the screen direction that
/// turns the ring forward.
pub fn ring_grab_point(gizmo: &RotationGizmo, axis: Axis) -> Option<(Vec2, Vec2)> {
    let camera = gizmo.base().camera()?;
    let center = gizmo.base().position();
    let normal = gizmo.base().basis().vector(axis);
    let reference = camera.distance_to_point(center);

    gizmo
        .world_ring_points(axis)
        .into_iter()
        .filter(|point| camera.distance_to_point(*point) < reference)
        .min_by(|a, b| {
            camera
                .distance_to_point(*a)
                .total_cmp(&camera.distance_to_point(*b))
        })
        .and_then(|point| {
            let radial: Vec3 = point - center;
            let tangent = normal.cross(radial).normalize_or_zero();
            let from = camera.world_to_screen(point)?;
            let to = camera.world_to_screen(point + tangent * radial.length())?;
            let direction = (to - from).normalize_or_zero();
            (direction != Vec2::ZERO).then_some((from, direction))
        })
}
