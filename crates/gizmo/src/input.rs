use glam::Vec2;

/// Primary pointer button and cursor, sampled once per frame by the host.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointerState {
    /// Cursor position in viewport pixels, origin top-left.
    pub position: Vec2,
    /// Movement since the previous sample.
    pub delta: Vec2,
    /// Button went down this frame.
    pub pressed: bool,
    /// Button is currently down (including the frame it was pressed).
    pub held: bool,
    /// Button went up this frame.
    pub released: bool,
}

impl PointerState {
    /// Pointer resting at `position` with the button up.
    pub fn at(position: Vec2) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Next sample, deriving delta and button transitions from this one.
    pub fn advance(&self, position: Vec2, button_down: bool) -> Self {
        Self {
            position,
            delta: position - self.position,
            pressed: button_down && !self.held,
            held: button_down,
            released: !button_down && self.held,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_derives_transitions() {
        let idle = PointerState::at(Vec2::new(10.0, 10.0));
        let press = idle.advance(Vec2::new(10.0, 10.0), true);
        assert!(press.pressed && press.held && !press.released);

        let drag = press.advance(Vec2::new(14.0, 7.0), true);
        assert!(!drag.pressed && drag.held);
        assert_eq!(drag.delta, Vec2::new(4.0, -3.0));

        let release = drag.advance(Vec2::new(14.0, 7.0), false);
        assert!(release.released && !release.held && !release.pressed);
        assert_eq!(release.delta, Vec2::ZERO);

        let rest = release.advance(Vec2::new(15.0, 7.0), false);
        assert!(!rest.released && !rest.pressed && !rest.held);
    }
}
