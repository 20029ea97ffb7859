use glam::{Vec2, Vec3};

use crate::EPSILON;

/// Half-plane test for a 2D point against a triangle of either winding.
pub fn point_in_triangle_2d(p: Vec2, a: Vec2, b: Vec2, c: Vec2) -> bool {
    let d1 = (b - a).perp_dot(p - a);
    let d2 = (c - b).perp_dot(p - b);
    let d3 = (a - c).perp_dot(p - c);

    let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
    !(has_neg && has_pos)
}

/// Barycentric containment test for a point assumed to lie in the triangle's
/// plane. Degenerate triangles contain nothing.
pub fn point_inside_triangle(point: Vec3, verts: [Vec3; 3]) -> bool {
    let [a, b, c] = verts;
    let v0 = c - a;
    let v1 = b - a;
    let v2 = point - a;

    let dot00 = v0.dot(v0);
    let dot01 = v0.dot(v1);
    let dot02 = v0.dot(v2);
    let dot11 = v1.dot(v1);
    let dot12 = v1.dot(v2);

    let denom = dot00 * dot11 - dot01 * dot01;
    if denom.abs() < EPSILON {
        return false;
    }
    let inv = 1.0 / denom;
    let u = (dot11 * dot02 - dot01 * dot12) * inv;
    let v = (dot00 * dot12 - dot01 * dot02) * inv;
    u >= 0.0 && v >= 0.0 && u + v <= 1.0
}

pub fn closest_point_on_segment(point: Vec3, a: Vec3, b: Vec3) -> Vec3 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq < EPSILON {
        return a;
    }
    let t = ((point - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    a + ab * t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triangle_2d_ignores_winding() {
        let (a, b, c) = (Vec2::ZERO, Vec2::new(4.0, 0.0), Vec2::new(0.0, 4.0));
        assert!(point_in_triangle_2d(Vec2::new(1.0, 1.0), a, b, c));
        assert!(point_in_triangle_2d(Vec2::new(1.0, 1.0), a, c, b));
        assert!(!point_in_triangle_2d(Vec2::new(3.0, 3.0), a, b, c));
    }

    #[test]
    fn triangle_3d_containment() {
        let verts = [Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 2.0)];
        assert!(point_inside_triangle(Vec3::new(0.5, 0.0, 0.5), verts));
        assert!(point_inside_triangle(Vec3::new(1.0, 0.0, 1.0), verts));
        assert!(!point_inside_triangle(Vec3::new(1.5, 0.0, 1.5), verts));
        let flat = [Vec3::ZERO, Vec3::X, Vec3::X * 2.0];
        assert!(!point_inside_triangle(Vec3::X, flat));
    }

    #[test]
    fn segment_projection_clamps_to_endpoints() {
        let (a, b) = (Vec3::ZERO, Vec3::new(4.0, 0.0, 0.0));
        assert_eq!(closest_point_on_segment(Vec3::new(2.0, 3.0, 0.0), a, b), Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(closest_point_on_segment(Vec3::new(-5.0, 1.0, 0.0), a, b), a);
        assert_eq!(closest_point_on_segment(Vec3::new(9.0, 1.0, 0.0), a, b), b);
    }
}
