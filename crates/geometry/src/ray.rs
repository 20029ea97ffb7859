use glam::Vec3;

use crate::EPSILON;

/// Half-line with a unit-length direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    /// Builds a ray, normalizing `direction`. A zero direction stays zero and
    /// intersects nothing.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    pub fn is_degenerate(&self) -> bool {
        self.direction.length_squared() < EPSILON
    }
}

/// Infinite plane `normal · x + distance = 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    normal: Vec3,
    distance: f32,
}

impl Plane {
    pub fn from_normal_and_point(normal: Vec3, point: Vec3) -> Self {
        let normal = normal.normalize_or_zero();
        Self {
            normal,
            distance: -normal.dot(point),
        }
    }

    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    /// Signed distance; positive on the side the normal points to.
    pub fn signed_distance(&self, point: Vec3) -> f32 {
        self.normal.dot(point) + self.distance
    }

    pub fn closest_point(&self, point: Vec3) -> Vec3 {
        point - self.normal * self.signed_distance(point)
    }

    /// Distance along `ray` to the plane. Either side of the plane may be hit;
    /// rays parallel to the plane or pointing away from it miss.
    pub fn raycast(&self, ray: &Ray) -> Option<f32> {
        let denom = self.normal.dot(ray.direction);
        if denom.abs() < EPSILON {
            return None;
        }
        let t = -self.signed_distance(ray.origin) / denom;
        if t < 0.0 {
            None
        } else {
            Some(t)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ray_direction_is_normalized() {
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 3.0, 4.0));
        assert!((ray.direction.length() - 1.0).abs() < 1e-6);
        assert!(ray.point_at(5.0).abs_diff_eq(Vec3::new(0.0, 3.0, 4.0), 1e-5));
        assert!(Ray::new(Vec3::ONE, Vec3::ZERO).is_degenerate());
    }

    #[test]
    fn plane_raycast_hits_from_both_sides() {
        let plane = Plane::from_normal_and_point(Vec3::Y, Vec3::new(0.0, 2.0, 0.0));
        let above = Ray::new(Vec3::new(1.0, 5.0, 0.0), Vec3::NEG_Y);
        let below = Ray::new(Vec3::new(1.0, -1.0, 0.0), Vec3::Y);
        assert!((plane.raycast(&above).unwrap() - 3.0).abs() < 1e-5);
        assert!((plane.raycast(&below).unwrap() - 3.0).abs() < 1e-5);
    }

    #[test]
    fn plane_raycast_misses_parallel_and_receding_rays() {
        let plane = Plane::from_normal_and_point(Vec3::Y, Vec3::ZERO);
        let parallel = Ray::new(Vec3::new(0.0, 1.0, 0.0), Vec3::X);
        let receding = Ray::new(Vec3::new(0.0, 1.0, 0.0), Vec3::Y);
        assert_eq!(plane.raycast(&parallel), None);
        assert_eq!(plane.raycast(&receding), None);
    }

    #[test]
    fn closest_point_lies_on_plane() {
        let plane = Plane::from_normal_and_point(Vec3::Z, Vec3::new(0.0, 0.0, 1.0));
        let projected = plane.closest_point(Vec3::new(3.0, -2.0, 7.0));
        assert!(projected.abs_diff_eq(Vec3::new(3.0, -2.0, 1.0), 1e-5));
        assert!(plane.signed_distance(projected).abs() < 1e-5);
    }
}
