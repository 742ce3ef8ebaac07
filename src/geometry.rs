use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Half-line starting at `origin`. `direction` is expected to be normalized.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec2,
    pub direction: Vec2,
}

impl Ray {
    pub fn new(origin: Vec2, direction: Vec2) -> Self {
        Self { origin, direction }
    }

    pub fn at(&self, distance: f32) -> Vec2 {
        self.origin + self.direction * distance
    }
}

/// Where a ray meets a surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub point: Vec2,
    pub normal: Vec2,
    pub distance: f32,
}

/// Axis-aligned rectangle described by its center and size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub center: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub fn new(center: Vec2, size: Vec2) -> Self {
        Self { center, size }
    }

    pub fn from_top_left(x: f32, y: f32, width: f32, height: f32) -> Self {
        let size = Vec2::new(width, height);
        Self {
            center: Vec2::new(x, y) + size * 0.5,
            size,
        }
    }

    pub fn min(&self) -> Vec2 {
        self.center - self.size * 0.5
    }

    pub fn max(&self) -> Vec2 {
        self.center + self.size * 0.5
    }

    pub fn contains(&self, point: Vec2) -> bool {
        let (min, max) = (self.min(), self.max());
        point.x >= min.x && point.x < max.x && point.y >= min.y && point.y < max.y
    }

    pub fn closest_point(&self, point: Vec2) -> Vec2 {
        point.clamp(self.min(), self.max())
    }
}

/// Intersects a ray with the segment `a`-`b`.
///
/// The ray is treated as a segment of `max_length`; hits exactly at the ray
/// origin are rejected. The returned normal is left for the caller to fill in
/// when the surface has its own orientation.
pub fn intersect_segment(ray: &Ray, a: Vec2, b: Vec2, max_length: f32) -> Option<Hit> {
    let far = ray.at(max_length);
    let (x1, y1, x2, y2) = (a.x, a.y, b.x, b.y);
    let (x3, y3, x4, y4) = (ray.origin.x, ray.origin.y, far.x, far.y);

    let den = (y4 - y3) * (x2 - x1) - (x4 - x3) * (y2 - y1);
    if den == 0.0 {
        return None;
    }
    let ua = ((x4 - x3) * (y1 - y3) - (y4 - y3) * (x1 - x3)) / den;
    let ub = ((x2 - x1) * (y1 - y3) - (y2 - y1) * (x1 - x3)) / den;
    if !(0.0..=1.0).contains(&ua) || ub <= 0.0 {
        return None;
    }

    let point = a + (b - a) * ua;
    let edge = (b - a).normalize_or_zero();
    Some(Hit {
        point,
        normal: edge.perp(),
        distance: point.distance(ray.origin),
    })
}

/// Intersects a ray with a circle, preferring the entry point and falling
/// back to the exit point when the origin lies inside the circle.
pub fn intersect_circle(ray: &Ray, center: Vec2, radius: f32) -> Option<Hit> {
    let direction = ray.direction.normalize_or_zero();
    if direction == Vec2::ZERO || radius <= 0.0 {
        return None;
    }
    let projection = (center - ray.origin).dot(direction);
    if projection < 0.0 {
        return None;
    }
    let closest = ray.origin + direction * projection;
    let distance = closest.distance(center);
    if distance > radius {
        return None;
    }
    let half_chord = (radius * radius - distance * distance).max(0.0).sqrt();

    let mut point = closest - direction * half_chord;
    if (point - ray.origin).dot(direction) < 0.0 {
        point = closest + direction * half_chord;
        if (point - ray.origin).dot(direction) < 0.0 {
            return None;
        }
    }
    Some(Hit {
        point,
        normal: (point - center) / radius,
        distance: point.distance(ray.origin),
    })
}

/// `r = d - 2(d·n)n`, renormalized.
pub fn reflect(direction: Vec2, normal: Vec2) -> Vec2 {
    let reflected = direction - 2.0 * direction.dot(normal) * normal;
    reflected.normalize_or_zero()
}

/// Unit vector for an angle in radians, measured in screen space (y down).
pub fn direction_from_angle(angle: f32) -> Vec2 {
    Vec2::new(angle.cos(), angle.sin())
}

pub fn circle_intersects_rect(center: Vec2, radius: f32, rect: &Rect) -> bool {
    let closest = rect.closest_point(center);
    center.distance_squared(closest) < radius * radius
}

pub fn circle_intersects_circle(a: Vec2, radius_a: f32, b: Vec2, radius_b: f32) -> bool {
    a.distance(b) < radius_a + radius_b
}

/// Distance from `point` to the segment `a`-`b`.
pub fn distance_to_segment(point: Vec2, a: Vec2, b: Vec2) -> f32 {
    let edge = b - a;
    let length_squared = edge.length_squared();
    if length_squared <= f32::EPSILON {
        return point.distance(a);
    }
    let t = ((point - a).dot(edge) / length_squared).clamp(0.0, 1.0);
    point.distance(a + edge * t)
}
