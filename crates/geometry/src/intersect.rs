use glam::Vec3;

use crate::{Plane, Ray, EPSILON};

/// Intersects a ray with a circle treated as an annulus of half-width `epsilon`.
///
/// The ray is first intersected with the circle's plane; the hit is accepted
/// only when it lies within `epsilon` of the circumference. One-sided circles
/// reject rays arriving from behind (travelling along `normal`).
pub fn ray_intersects_circle(
    ray: &Ray,
    center: Vec3,
    radius: f32,
    normal: Vec3,
    two_sided: bool,
    epsilon: f32,
) -> Option<f32> {
    if ray.is_degenerate() {
        return None;
    }
    let plane = Plane::from_normal_and_point(normal, center);
    if !two_sided && plane.normal().dot(ray.direction) > 0.0 {
        return None;
    }
    let t = plane.raycast(ray)?;
    let distance_from_center = (ray.point_at(t) - center).length();
    if (distance_from_center - radius).abs() <= epsilon {
        Some(t)
    } else {
        None
    }
}

/// Intersects a ray with the lateral surface of the finite cylinder whose axis
/// runs from `p0` to `p1`. Caps are not part of the surface.
pub fn ray_intersects_cylinder(ray: &Ray, p0: Vec3, p1: Vec3, radius: f32) -> Option<f32> {
    if ray.is_degenerate() {
        return None;
    }
    let axis = p1 - p0;
    let height = axis.length();
    if height < EPSILON {
        return None;
    }
    let axis = axis / height;

    let offset = ray.origin - p0;
    let dir_perp = ray.direction - axis * ray.direction.dot(axis);
    let offset_perp = offset - axis * offset.dot(axis);

    let a = dir_perp.dot(dir_perp);
    if a < EPSILON {
        // Parallel to the axis: the ray can only graze the wall.
        return None;
    }
    let b = 2.0 * offset_perp.dot(dir_perp);
    let c = offset_perp.dot(offset_perp) - radius * radius;
    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return None;
    }

    let sqrt_d = discriminant.sqrt();
    let t_near = (-b - sqrt_d) / (2.0 * a);
    let t_far = (-b + sqrt_d) / (2.0 * a);
    [t_near, t_far].into_iter().find(|&t| {
        if t < 0.0 {
            return false;
        }
        let along = (offset + ray.direction * t).dot(axis);
        (0.0..=height).contains(&along)
    })
}

/// Intersects a ray with a sphere. A ray starting inside the sphere hits at `t = 0`.
pub fn ray_intersects_sphere(ray: &Ray, center: Vec3, radius: f32) -> Option<f32> {
    if ray.is_degenerate() {
        return None;
    }
    let m = ray.origin - center;
    let b = m.dot(ray.direction);
    let c = m.length_squared() - radius * radius;

    // Outside the sphere and pointing away from it.
    if c > 0.0 && b > 0.0 {
        return None;
    }
    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }
    Some((-b - discriminant.sqrt()).max(0.0))
}

/// Point on the circumference closest to `point`. A point on the circle's
/// axis projects onto an arbitrary but stable point of the circle.
pub fn closest_point_on_circle(point: Vec3, center: Vec3, radius: f32, normal: Vec3) -> Vec3 {
    let plane = Plane::from_normal_and_point(normal, center);
    let in_plane = plane.closest_point(point) - center;
    let direction = if in_plane.length_squared() > EPSILON {
        in_plane.normalize()
    } else {
        plane.normal().any_orthonormal_vector()
    };
    center + direction * radius
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f32 = 1e-4;

    #[test]
    fn ray_through_circumference_hits_at_plane_distance() {
        let center = Vec3::new(0.0, 0.0, -5.0);
        let ray = Ray::new(Vec3::new(1.0, 0.0, 0.0), Vec3::NEG_Z);
        let t = ray_intersects_circle(&ray, center, 1.0, Vec3::Z, true, 0.01).unwrap();
        assert!((t - 5.0).abs() < TOLERANCE);
    }

    #[test]
    fn oblique_ray_through_circumference_matches_analytic_distance() {
        let center = Vec3::ZERO;
        let target = Vec3::new(0.0, 2.0, 0.0);
        let origin = Vec3::new(3.0, 6.0, 4.0);
        let ray = Ray::new(origin, target - origin);
        let t = ray_intersects_circle(&ray, center, 2.0, Vec3::Z, true, 0.05).unwrap();
        assert!((t - (target - origin).length()).abs() < TOLERANCE);
    }

    #[test]
    fn circle_band_has_finite_width() {
        let ray_inside = Ray::new(Vec3::new(0.95, 0.0, 3.0), Vec3::NEG_Z);
        let ray_center = Ray::new(Vec3::new(0.0, 0.0, 3.0), Vec3::NEG_Z);
        assert!(ray_intersects_circle(&ray_inside, Vec3::ZERO, 1.0, Vec3::Z, true, 0.1).is_some());
        assert!(ray_intersects_circle(&ray_center, Vec3::ZERO, 1.0, Vec3::Z, true, 0.1).is_none());
    }

    #[test]
    fn one_sided_circle_rejects_back_hits() {
        let from_back = Ray::new(Vec3::new(1.0, 0.0, -3.0), Vec3::Z);
        assert!(ray_intersects_circle(&from_back, Vec3::ZERO, 1.0, Vec3::Z, false, 0.01).is_none());
        assert!(ray_intersects_circle(&from_back, Vec3::ZERO, 1.0, Vec3::Z, true, 0.01).is_some());
    }

    #[test]
    fn edge_on_ring_is_recovered_by_cylinder() {
        // Ray lies in the ring's plane, so the disc test cannot hit.
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z);
        let circle = ray_intersects_circle(&ray, Vec3::ZERO, 1.0, Vec3::X, true, 0.05);
        assert!(circle.is_none());

        let half = 0.05 * Vec3::X;
        let t = ray_intersects_cylinder(&ray, -half, half, 1.0).unwrap();
        assert!((t - 4.0).abs() < TOLERANCE);
    }

    #[test]
    fn cylinder_respects_segment_bounds() {
        let ray = Ray::new(Vec3::new(0.0, 2.0, 5.0), Vec3::NEG_Z);
        assert!(ray_intersects_cylinder(&ray, Vec3::ZERO, Vec3::Y, 1.0).is_none());
        let within = Ray::new(Vec3::new(0.0, 0.5, 5.0), Vec3::NEG_Z);
        let t = ray_intersects_cylinder(&within, Vec3::ZERO, Vec3::Y, 1.0).unwrap();
        assert!((t - 4.0).abs() < TOLERANCE);
    }

    #[test]
    fn ray_missing_band_and_cylinder_misses() {
        let ray = Ray::new(Vec3::new(3.0, 3.0, 5.0), Vec3::NEG_Z);
        let normal = Vec3::Z;
        let eps = 0.05;
        assert!(ray_intersects_circle(&ray, Vec3::ZERO, 1.0, normal, true, eps).is_none());
        let half = normal * eps;
        assert!(ray_intersects_cylinder(&ray, -half, half, 1.0).is_none());
    }

    #[test]
    fn sphere_hit_and_miss() {
        let hit = Ray::new(Vec3::new(0.0, 0.0, 10.0), Vec3::NEG_Z);
        let miss = Ray::new(Vec3::new(0.0, 3.0, 10.0), Vec3::NEG_Z);
        let away = Ray::new(Vec3::new(0.0, 0.0, 10.0), Vec3::Z);
        let inside = Ray::new(Vec3::ZERO, Vec3::X);
        assert!((ray_intersects_sphere(&hit, Vec3::ZERO, 2.0).unwrap() - 8.0).abs() < TOLERANCE);
        assert!(ray_intersects_sphere(&miss, Vec3::ZERO, 2.0).is_none());
        assert!(ray_intersects_sphere(&away, Vec3::ZERO, 2.0).is_none());
        assert_eq!(ray_intersects_sphere(&inside, Vec3::ZERO, 2.0), Some(0.0));
    }

    #[test]
    fn closest_point_on_circle_snaps_to_circumference() {
        let p = closest_point_on_circle(Vec3::new(3.0, 4.0, 9.0), Vec3::ZERO, 2.0, Vec3::Z);
        assert!(p.abs_diff_eq(Vec3::new(1.2, 1.6, 0.0), 1e-5));

        let on_axis = closest_point_on_circle(Vec3::new(0.0, 0.0, 4.0), Vec3::ZERO, 2.0, Vec3::Z);
        assert!((on_axis.length() - 2.0).abs() < 1e-5);
        assert!(on_axis.z.abs() < 1e-5);
    }
}
