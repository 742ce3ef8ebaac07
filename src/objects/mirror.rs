use glam::Vec2;

use crate::geometry::{self, Hit, Ray};

use super::{Emission, EmissionKind, IncomingLight, Optic};

const ROTATION_STEP_DEGREES: f32 = 5.0;

/// Flat two-sided mirror that the player rotates by clicking on it.
#[derive(Debug, Clone, PartialEq)]
pub struct Mirror {
    position: Vec2,
    angle: f32,
    width: f32,
    thickness: f32,
    start: Vec2,
    end: Vec2,
    normal: Vec2,
}

impl Mirror {
    /// `angle` is in degrees, measured clockwise on screen from the x axis.
    pub fn new(position: Vec2, angle: f32, width: f32, thickness: f32) -> Self {
        let mut mirror = Self {
            position,
            angle: angle.rem_euclid(360.0),
            width,
            thickness,
            start: position,
            end: position,
            normal: Vec2::Y,
        };
        mirror.update_geometry();
        mirror
    }

    fn update_geometry(&mut self) {
        let radians = self.angle.to_radians();
        let half = geometry::direction_from_angle(radians) * (self.width / 2.0);
        self.start = self.position - half;
        self.end = self.position + half;
        self.normal = geometry::direction_from_angle(radians + std::f32::consts::FRAC_PI_2);
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn set_angle(&mut self, angle: f32) {
        self.angle = angle.rem_euclid(360.0);
        self.update_geometry();
    }

    pub fn endpoints(&self) -> (Vec2, Vec2) {
        (self.start, self.end)
    }

    pub fn normal(&self) -> Vec2 {
        self.normal
    }

    pub fn thickness(&self) -> f32 {
        self.thickness
    }
}

impl Optic for Mirror {
    fn position(&self) -> Vec2 {
        self.position
    }

    fn intersect(&self, ray: &Ray, max_length: f32) -> Option<Hit> {
        geometry::intersect_segment(ray, self.start, self.end, max_length).map(|hit| Hit {
            normal: self.normal,
            ..hit
        })
    }

    fn respond(&self, light: &IncomingLight) -> Vec<Emission> {
        vec![Emission {
            kind: EmissionKind::Reflect,
            direction: geometry::reflect(light.direction, light.hit.normal),
            color: light.color,
            attenuation: None,
        }]
    }

    fn contains_point(&self, point: Vec2) -> bool {
        let grab = (self.thickness / 2.0).max(6.0);
        geometry::distance_to_segment(point, self.start, self.end) <= grab
    }

    fn collides_with_circle(&self, center: Vec2, radius: f32) -> bool {
        geometry::distance_to_segment(center, self.start, self.end) < radius + self.thickness / 2.0
    }

    fn is_interactive(&self) -> bool {
        true
    }

    fn interact(&mut self) {
        self.set_angle(self.angle + ROTATION_STEP_DEGREES);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;

    fn mirror(angle: f32) -> Mirror {
        Mirror::new(Vec2::new(100.0, 0.0), angle, 80.0, 8.0)
    }

    #[test]
    fn diagonal_mirror_turns_beam_downward() {
        let mirror = mirror(45.0);
        let ray = Ray::new(Vec2::ZERO, Vec2::X);
        let hit = mirror.intersect(&ray, 2000.0).unwrap();
        assert!(hit.point.distance(Vec2::new(100.0, 0.0)) < 1e-3);

        let emitted = mirror.respond(&IncomingLight {
            color: Color::GREEN,
            direction: Vec2::X,
            hit,
        });
        assert_eq!(emitted.len(), 1);
        assert_eq!(emitted[0].kind, EmissionKind::Reflect);
        assert_eq!(emitted[0].color, Color::GREEN);
        assert!(emitted[0].direction.distance(Vec2::Y) < 1e-4);
    }

    #[test]
    fn beam_parallel_to_mirror_misses() {
        let mirror = mirror(0.0);
        let ray = Ray::new(Vec2::ZERO, Vec2::X);
        assert!(mirror.intersect(&ray, 2000.0).is_none());
    }

    #[test]
    fn interaction_rotates_and_wraps() {
        let mut mirror = mirror(355.0);
        mirror.interact();
        assert_eq!(mirror.angle(), 0.0);
        mirror.interact();
        assert_eq!(mirror.angle(), 5.0);
    }

    #[test]
    fn click_and_collision_follow_the_rotated_surface() {
        let mirror = mirror(90.0);
        assert!(mirror.contains_point(Vec2::new(100.0, 35.0)));
        assert!(!mirror.contains_point(Vec2::new(135.0, 0.0)));
        assert!(mirror.collides_with_circle(Vec2::new(110.0, 0.0), 10.0));
        assert!(!mirror.collides_with_circle(Vec2::new(130.0, 0.0), 10.0));
    }
}
