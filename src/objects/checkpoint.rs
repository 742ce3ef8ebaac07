use glam::Vec2;

use crate::color::Color;
use crate::geometry::{self, Hit, Ray};

use super::{Emission, EmissionKind, IncomingLight, Optic};

/// Largest per-channel difference still accepted as the required color.
pub const COLOR_MATCH_THRESHOLD: u8 = 30;
const PASS_ATTENUATION: f32 = 0.95;
const PULSE_RATE: f32 = 0.05;
pub const PULSE_AMPLITUDE: f32 = 10.0;

/// Target that switches on when lit with the required color. Once active it
/// stays active for the rest of the level.
#[derive(Debug, Clone, PartialEq)]
pub struct Checkpoint {
    position: Vec2,
    size: f32,
    required_color: Color,
    activated: bool,
    newly_activated: bool,
    pulse_timer: f32,
}

impl Checkpoint {
    pub fn new(position: Vec2, required_color: Color, size: f32) -> Self {
        Self {
            position,
            size,
            required_color,
            activated: false,
            newly_activated: false,
            pulse_timer: 0.0,
        }
    }

    pub fn required_color(&self) -> Color {
        self.required_color
    }

    pub fn is_activated(&self) -> bool {
        self.activated
    }

    /// True only during the frame the checkpoint switched on.
    pub fn is_newly_activated(&self) -> bool {
        self.newly_activated
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    pub fn pulse_timer(&self) -> f32 {
        self.pulse_timer
    }

    /// Applies light of `color`. Returns true when this activated the checkpoint.
    pub fn illuminate(&mut self, color: Color) -> bool {
        if self.activated || !color.matches(self.required_color, COLOR_MATCH_THRESHOLD) {
            return false;
        }
        self.activated = true;
        self.newly_activated = true;
        true
    }
}

impl Optic for Checkpoint {
    fn position(&self) -> Vec2 {
        self.position
    }

    fn intersect(&self, ray: &Ray, _max_length: f32) -> Option<Hit> {
        geometry::intersect_circle(ray, self.position, self.size / 2.0)
    }

    fn respond(&self, light: &IncomingLight) -> Vec<Emission> {
        vec![Emission {
            kind: EmissionKind::Transmit,
            direction: light.direction,
            color: light.color,
            attenuation: Some(PASS_ATTENUATION),
        }]
    }

    fn contains_point(&self, point: Vec2) -> bool {
        point.distance(self.position) <= self.size / 2.0
    }

    fn collides_with_circle(&self, _center: Vec2, _radius: f32) -> bool {
        false
    }

    fn is_collidable(&self) -> bool {
        false
    }

    fn update(&mut self) {
        self.pulse_timer += PULSE_RATE;
        self.newly_activated = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activation_requires_matching_color() {
        let mut checkpoint = Checkpoint::new(Vec2::ZERO, Color::RED, 40.0);
        assert!(!checkpoint.illuminate(Color::WHITE));
        assert!(!checkpoint.is_activated());
        assert!(checkpoint.illuminate(Color::rgb(240, 10, 0)));
        assert!(checkpoint.is_activated());
        assert!(checkpoint.is_newly_activated());
    }

    #[test]
    fn newly_activated_lasts_one_update_and_activation_sticks() {
        let mut checkpoint = Checkpoint::new(Vec2::ZERO, Color::WHITE, 40.0);
        checkpoint.illuminate(Color::WHITE);
        checkpoint.update();
        assert!(!checkpoint.is_newly_activated());
        assert!(checkpoint.is_activated());
        assert!(!checkpoint.illuminate(Color::WHITE));
    }

    #[test]
    fn light_passes_through_unchanged() {
        let checkpoint = Checkpoint::new(Vec2::new(50.0, 0.0), Color::BLUE, 40.0);
        let ray = Ray::new(Vec2::ZERO, Vec2::X);
        let hit = checkpoint.intersect(&ray, 2000.0).unwrap();
        let emitted = checkpoint.respond(&IncomingLight {
            color: Color::GREEN,
            direction: Vec2::X,
            hit,
        });
        assert_eq!(emitted[0].kind, EmissionKind::Transmit);
        assert_eq!(emitted[0].color, Color::GREEN);
    }
}
