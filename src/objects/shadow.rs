use glam::Vec2;

use crate::geometry::{self, Hit, Ray};

use super::{Emission, IncomingLight, Optic};

const TENTACLE_SPEED: f32 = 0.1;
const PULSE_RATE: f32 = 0.03;
pub const TENTACLE_COUNT: usize = 5;

/// Light-eating creature patrolling a closed path of waypoints.
#[derive(Debug, Clone, PartialEq)]
pub struct ShadowCreature {
    position: Vec2,
    size: f32,
    path: Vec<Vec2>,
    speed: f32,
    current_target: usize,
    tentacle_phase: f32,
    pulse_timer: f32,
}

impl ShadowCreature {
    pub fn new(position: Vec2, path: Vec<Vec2>, speed: f32, size: f32) -> Self {
        Self {
            position,
            size,
            path,
            speed,
            current_target: 0,
            tentacle_phase: 0.0,
            pulse_timer: 0.0,
        }
    }

    pub fn radius(&self) -> f32 {
        self.size / 2.0
    }

    pub fn current_target(&self) -> usize {
        self.current_target
    }

    pub fn tentacle_phase(&self) -> f32 {
        self.tentacle_phase
    }

    pub fn pulse_timer(&self) -> f32 {
        self.pulse_timer
    }

    fn patrol(&mut self) {
        if self.path.len() < 2 {
            return;
        }
        let target = self.path[self.current_target];
        let offset = target - self.position;
        let distance = offset.length();
        if distance < self.speed {
            self.current_target = (self.current_target + 1) % self.path.len();
        } else {
            self.position += offset / distance * self.speed;
        }
    }
}

impl Optic for ShadowCreature {
    fn position(&self) -> Vec2 {
        self.position
    }

    fn intersect(&self, ray: &Ray, _max_length: f32) -> Option<Hit> {
        geometry::intersect_circle(ray, self.position, self.radius())
    }

    fn respond(&self, _light: &IncomingLight) -> Vec<Emission> {
        Vec::new()
    }

    fn contains_point(&self, point: Vec2) -> bool {
        point.distance_squared(self.position) <= self.radius() * self.radius()
    }

    fn collides_with_circle(&self, center: Vec2, radius: f32) -> bool {
        geometry::circle_intersects_circle(self.position, self.radius(), center, radius)
    }

    fn update(&mut self) {
        self.patrol();
        self.tentacle_phase += TENTACLE_SPEED;
        self.pulse_timer += PULSE_RATE;
    }
}
