use glam::{Mat3, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Two directions closer than this are treated as identical when searching
/// for the axis that points along the camera's line of sight.
pub const EXACT_ALIGNMENT_EPSILON: f32 = 1e-4;

/// One of the gizmo's primary handles, or no handle at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
    #[default]
    None,
}

impl Axis {
    /// The three pickable axes in their fixed index order.
    pub const PRIMARY: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    pub const fn label(self) -> &'static str {
        match self {
            Axis::X => "X",
            Axis::Y => "Y",
            Axis::Z => "Z",
            Axis::None => "None",
        }
    }

    pub const fn index(self) -> Option<usize> {
        match self {
            Axis::X => Some(0),
            Axis::Y => Some(1),
            Axis::Z => Some(2),
            Axis::None => None,
        }
    }

    pub const fn from_index(index: usize) -> Self {
        match index {
            0 => Axis::X,
            1 => Axis::Y,
            2 => Axis::Z,
            _ => Axis::None,
        }
    }

    pub const fn is_some(self) -> bool {
        !matches!(self, Axis::None)
    }

    /// Unit vector of this axis in the gizmo's local frame. `None` has no direction.
    pub fn unit_vector(self) -> Vec3 {
        match self {
            Axis::X => Vec3::X,
            Axis::Y => Vec3::Y,
            Axis::Z => Vec3::Z,
            Axis::None => Vec3::ZERO,
        }
    }

    /// World-space direction of this axis for a gizmo with the given orientation.
    pub fn world_vector(self, rotation: Quat) -> Vec3 {
        (rotation * self.unit_vector()).normalize_or_zero()
    }
}

/// Local right/up/forward vectors of an oriented gizmo, expressed in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisBasis {
    right: Vec3,
    up: Vec3,
    forward: Vec3,
}

impl AxisBasis {
    pub fn from_rotation(rotation: Quat) -> Self {
        Self {
            right: Axis::X.world_vector(rotation),
            up: Axis::Y.world_vector(rotation),
            forward: Axis::Z.world_vector(rotation),
        }
    }

    pub fn right_vec(&self) -> Vec3 {
        self.right
    }

    pub fn up_vec(&self) -> Vec3 {
        self.up
    }

    pub fn forward_vec(&self) -> Vec3 {
        self.forward
    }

    /// Direction of `axis`, or the zero vector for [`Axis::None`].
    pub fn vector(&self, axis: Axis) -> Vec3 {
        match axis {
            Axis::X => self.right,
            Axis::Y => self.up,
            Axis::Z => self.forward,
            Axis::None => Vec3::ZERO,
        }
    }

    pub fn as_mat3(&self) -> Mat3 {
        Mat3::from_cols(self.right, self.up, self.forward)
    }

    pub fn local_to_world(&self, local: Vec3) -> Vec3 {
        self.as_mat3() * local
    }
}

impl Default for AxisBasis {
    fn default() -> Self {
        Self::from_rotation(Quat::IDENTITY)
    }
}

/// Finds the axis that points most directly away from the viewer.
///
/// Axes are visited in index order; an axis replaces the current best only if
/// its dot product with `camera_forward` is non-negative and strictly greater.
/// When every axis faces the viewer the default index order wins and `X` is
/// returned.
pub fn most_aligned_axis(basis: &AxisBasis, camera_forward: Vec3) -> Axis {
    let forward = camera_forward.normalize_or_zero();
    let mut best = Axis::X;
    let mut best_dot = f32::NEG_INFINITY;

    for axis in Axis::PRIMARY {
        let dot = basis.vector(axis).dot(forward);
        if (1.0 - dot).abs() < EXACT_ALIGNMENT_EPSILON {
            return axis;
        }
        if dot >= 0.0 && dot > best_dot {
            best = axis;
            best_dot = dot;
        }
    }

    best
}

/// Draw order for the three primary axes: the axis pointing away from the
/// viewer first, the remaining two after it in index order.
pub fn draw_order(basis: &AxisBasis, camera_forward: Vec3) -> [Axis; 3] {
    let first = most_aligned_axis(basis, camera_forward);
    let mut order = [first, Axis::None, Axis::None];
    let mut slot = 1;
    for axis in Axis::PRIMARY {
        if axis != first {
            order[slot] = axis;
            slot += 1;
        }
    }
    order
}
