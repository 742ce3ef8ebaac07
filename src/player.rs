use glam::Vec2;

use crate::config::GameConfig;
use crate::input::Movement;
use crate::objects::LevelObject;

const DIAGONAL_FACTOR: f32 = 0.7071;
const PULSE_RATE: f32 = 0.05;
pub const PULSE_AMPLITUDE: f32 = 5.0;

/// The glowing orb controlled by the player.
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    position: Vec2,
    radius: f32,
    speed: f32,
    pulse_timer: f32,
}

impl Player {
    pub fn new(position: Vec2, config: &GameConfig) -> Self {
        Self {
            position,
            radius: config.player_radius,
            speed: config.player_speed,
            pulse_timer: 0.0,
        }
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn pulse_timer(&self) -> f32 {
        self.pulse_timer
    }

    /// Moves the orb one frame. Blocked diagonal moves slide along whichever
    /// axis is still free.
    pub fn update(&mut self, movement: Movement, objects: &[LevelObject], bounds: Vec2) {
        let mut delta = movement.axis() * self.speed;
        if delta.x != 0.0 && delta.y != 0.0 {
            delta *= DIAGONAL_FACTOR;
        }

        if delta != Vec2::ZERO {
            let candidates = [
                self.position + delta,
                Vec2::new(self.position.x + delta.x, self.position.y),
                Vec2::new(self.position.x, self.position.y + delta.y),
            ];
            if let Some(next) = candidates
                .into_iter()
                .find(|candidate| self.is_valid_position(*candidate, objects, bounds))
            {
                self.position = next;
            }
        }

        self.pulse_timer += PULSE_RATE;
    }

    pub fn is_valid_position(&self, position: Vec2, objects: &[LevelObject], bounds: Vec2) -> bool {
        let r = self.radius;
        if position.x - r < 0.0
            || position.x + r > bounds.x
            || position.y - r < 0.0
            || position.y + r > bounds.y
        {
            return false;
        }
        !objects.iter().map(LevelObject::optic).any(|object| {
            object.is_collidable() && object.collides_with_circle(position, r)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::objects::{Checkpoint, ColorFilter};

    const BOUNDS: Vec2 = Vec2::new(1280.0, 720.0);

    fn player_at(x: f32, y: f32) -> Player {
        Player::new(Vec2::new(x, y), &GameConfig::default())
    }

    #[test]
    fn diagonal_movement_is_normalized() {
        let mut player = player_at(100.0, 100.0);
        let movement = Movement {
            right: true,
            down: true,
            ..Movement::NONE
        };
        player.update(movement, &[], BOUNDS);
        let moved = player.position() - Vec2::new(100.0, 100.0);
        assert!((moved.x - 5.0 * DIAGONAL_FACTOR).abs() < 1e-4);
        assert!((moved.y - 5.0 * DIAGONAL_FACTOR).abs() < 1e-4);
    }

    #[test]
    fn stays_inside_the_screen() {
        let mut player = player_at(17.0, 100.0);
        let left = Movement {
            left: true,
            ..Movement::NONE
        };
        player.update(left, &[], BOUNDS);
        assert_eq!(player.position(), Vec2::new(17.0, 100.0));
    }

    #[test]
    fn slides_along_blocking_objects() {
        // filter directly to the right blocks x movement but not y
        let objects = vec![LevelObject::Filter(ColorFilter::new(
            Vec2::new(140.0, 100.0),
            Color::RED,
            40.0,
        ))];
        let mut player = player_at(104.0, 100.0);
        let movement = Movement {
            right: true,
            down: true,
            ..Movement::NONE
        };
        player.update(movement, &objects, BOUNDS);
        assert_eq!(player.position().x, 104.0);
        assert!(player.position().y > 100.0);
    }

    #[test]
    fn checkpoints_do_not_block() {
        let objects = vec![LevelObject::Checkpoint(Checkpoint::new(
            Vec2::new(110.0, 100.0),
            Color::WHITE,
            40.0,
        ))];
        let mut player = player_at(100.0, 100.0);
        let right = Movement {
            right: true,
            ..Movement::NONE
        };
        player.update(right, &objects, BOUNDS);
        assert_eq!(player.position(), Vec2::new(105.0, 100.0));
        assert!(player.pulse_timer() > 0.0);
    }
}
