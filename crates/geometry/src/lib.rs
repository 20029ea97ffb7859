//! Stateless intersection and proximity tests used for gizmo picking.
//!
//! Every intersection returns the ray parameter `t` (distance along a
//! normalized ray) of the hit, or `None` when the shapes do not meet.

mod intersect;
mod ray;
mod triangle;

pub use intersect::{
    closest_point_on_circle, ray_intersects_circle, ray_intersects_cylinder,
    ray_intersects_sphere,
};
pub use ray::{Plane, Ray};
pub use triangle::{closest_point_on_segment, point_in_triangle_2d, point_inside_triangle};

/// Threshold for treating vectors as zero-length or rays as parallel.
pub const EPSILON: f32 = 1e-6;
