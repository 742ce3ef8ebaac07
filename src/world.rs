use std::time::Duration;

use glam::Vec2;
use log::{debug, info};

use crate::color::Color;
use crate::config::GameConfig;
use crate::input::Movement;
use crate::level::Level;
use crate::light::{LightBeam, TraceSettings, TracedBeam};
use crate::objects::{LevelObject, ObjectKind, Optic};
use crate::player::Player;

/// Something that happened during a world update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WorldEvent {
    CheckpointActivated { index: usize, position: Vec2 },
}

/// Result of clicking on an object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interaction {
    pub index: usize,
    pub kind: ObjectKind,
    pub position: Vec2,
}

/// A level being played: the orb, the objects and the beam.
#[derive(Debug, Clone)]
pub struct World {
    level_number: u32,
    player: Player,
    objects: Vec<LevelObject>,
    beam_on: bool,
    aim_target: Vec2,
    beam_direction: Vec2,
    traced: TracedBeam,
    settings: TraceSettings,
    bounds: Vec2,
    elapsed: Duration,
}

impl World {
    pub fn load(level: &Level, config: &GameConfig) -> Self {
        let objects: Vec<LevelObject> = level
            .objects
            .iter()
            .map(|spec| LevelObject::from_spec(spec, config))
            .collect();
        info!(
            "loaded level {} '{}' with {} objects",
            level.number,
            level.name,
            objects.len()
        );
        Self {
            level_number: level.number,
            player: Player::new(level.player_start, config),
            objects,
            beam_on: false,
            aim_target: level.player_start + Vec2::X,
            beam_direction: Vec2::X,
            traced: TracedBeam::default(),
            settings: TraceSettings::from_config(config),
            bounds: config.screen_size(),
            elapsed: Duration::ZERO,
        }
    }

    pub fn level_number(&self) -> u32 {
        self.level_number
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn objects(&self) -> &[LevelObject] {
        &self.objects
    }

    pub fn traced_beam(&self) -> &TracedBeam {
        &self.traced
    }

    pub fn is_beam_on(&self) -> bool {
        self.beam_on
    }

    pub fn beam_direction(&self) -> Vec2 {
        self.beam_direction
    }

    /// Time spent playing this level.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Points the beam at `target`. A target on top of the orb keeps the
    /// previous direction.
    pub fn aim(&mut self, target: Vec2) {
        self.aim_target = target;
        let direction = (target - self.player.position()).normalize_or_zero();
        if direction != Vec2::ZERO {
            self.beam_direction = direction;
        }
    }

    /// Switches the beam on or off, aiming at `target`. Returns the new state.
    pub fn toggle_beam(&mut self, target: Vec2) -> bool {
        self.beam_on = !self.beam_on;
        if self.beam_on {
            self.aim(target);
            self.retrace();
        } else {
            self.traced = TracedBeam::default();
        }
        debug!("beam {}", if self.beam_on { "on" } else { "off" });
        self.beam_on
    }

    /// Advances one frame.
    pub fn update(&mut self, movement: Movement, dt: Duration) -> Vec<WorldEvent> {
        self.elapsed += dt;
        for object in &mut self.objects {
            object.optic_mut().update();
        }
        self.player.update(movement, &self.objects, self.bounds);

        if !self.beam_on {
            return Vec::new();
        }
        self.aim(self.aim_target);
        self.retrace();
        self.apply_beam_hits()
    }

    fn retrace(&mut self) {
        let beam = LightBeam::new(self.player.position(), self.beam_direction, Color::WHITE);
        self.traced = beam.trace(&self.objects, &self.settings);
    }

    fn apply_beam_hits(&mut self) -> Vec<WorldEvent> {
        let mut events = Vec::new();
        for hit in &self.traced.hits {
            let Some(checkpoint) = self.objects[hit.object].as_checkpoint_mut() else {
                continue;
            };
            if checkpoint.illuminate(hit.color) {
                info!(
                    "checkpoint {} activated by {} light",
                    hit.object, hit.color
                );
                events.push(WorldEvent::CheckpointActivated {
                    index: hit.object,
                    position: checkpoint.position(),
                });
            }
        }
        events
    }

    /// Clicks at `point`: the first interactive object under it reacts.
    pub fn interact_at(&mut self, point: Vec2) -> Option<Interaction> {
        let (index, object) = self
            .objects
            .iter_mut()
            .enumerate()
            .find(|(_, object)| object.optic().contains_point(point))?;
        if !object.optic().is_interactive() {
            return None;
        }
        object.optic_mut().interact();
        debug!("interacted with {} {index}", object.kind().name());
        Some(Interaction {
            index,
            kind: object.kind(),
            position: object.optic().position(),
        })
    }

    pub fn checkpoint_count(&self) -> usize {
        self.objects
            .iter()
            .filter(|object| object.as_checkpoint().is_some())
            .count()
    }

    pub fn activated_checkpoint_count(&self) -> usize {
        self.objects
            .iter()
            .filter_map(LevelObject::as_checkpoint)
            .filter(|checkpoint| checkpoint.is_activated())
            .count()
    }

    /// True when the level has checkpoints and all of them are lit.
    pub fn is_complete(&self) -> bool {
        let total = self.checkpoint_count();
        total > 0 && self.activated_checkpoint_count() == total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::{LevelManager, ObjectSpec};

    const FRAME: Duration = Duration::from_millis(16);

    fn level(objects: Vec<ObjectSpec>) -> Level {
        Level {
            number: 1,
            name: "Test".to_string(),
            description: String::new(),
            player_start: Vec2::new(100.0, 100.0),
            objects,
            completed: false,
            best_time: None,
        }
    }

    #[test]
    fn beam_aimed_at_checkpoint_completes_level() {
        let config = GameConfig::default();
        let mut world = World::load(
            &level(vec![ObjectSpec::Checkpoint {
                position: Vec2::new(400.0, 100.0),
                required_color: Color::WHITE,
            }]),
            &config,
        );
        assert!(!world.is_complete());
        assert!(world.toggle_beam(Vec2::new(500.0, 100.0)));
        let events = world.update(Movement::NONE, FRAME);
        assert_eq!(
            events,
            vec![WorldEvent::CheckpointActivated {
                index: 0,
                position: Vec2::new(400.0, 100.0)
            }]
        );
        assert!(world.is_complete());
        assert!(world.update(Movement::NONE, FRAME).is_empty());
        assert_eq!(world.elapsed(), FRAME * 2);
    }

    #[test]
    fn beam_from_first_level_start_reaches_the_mirror() {
        let config = GameConfig::default();
        let manager = LevelManager::builtin().unwrap();
        let mut world = World::load(manager.level(1).unwrap(), &config);
        world.toggle_beam(Vec2::new(640.0, 360.0));
        world.update(Movement::NONE, FRAME);
        assert!(!world.traced_beam().hits.is_empty());
        assert_eq!(world.traced_beam().hits[0].object, 0);
    }

    #[test]
    fn toggling_off_clears_the_beam() {
        let config = GameConfig::default();
        let mut world = World::load(&level(Vec::new()), &config);
        world.toggle_beam(Vec2::new(200.0, 100.0));
        assert!(!world.traced_beam().segments.is_empty());
        assert!(!world.toggle_beam(Vec2::ZERO));
        assert!(world.traced_beam().segments.is_empty());
        world.update(Movement::NONE, FRAME);
        assert!(world.traced_beam().segments.is_empty());
    }

    #[test]
    fn aiming_at_the_orb_keeps_previous_direction() {
        let config = GameConfig::default();
        let mut world = World::load(&level(Vec::new()), &config);
        world.aim(Vec2::new(100.0, 300.0));
        assert_eq!(world.beam_direction(), Vec2::Y);
        world.aim(Vec2::new(100.0, 100.0));
        assert_eq!(world.beam_direction(), Vec2::Y);
    }

    #[test]
    fn clicking_rotates_mirrors_and_ignores_checkpoints() {
        let config = GameConfig::default();
        let mut world = World::load(
            &level(vec![
                ObjectSpec::Mirror {
                    position: Vec2::new(300.0, 300.0),
                    angle: 45.0,
                },
                ObjectSpec::Checkpoint {
                    position: Vec2::new(600.0, 300.0),
                    required_color: Color::WHITE,
                },
            ]),
            &config,
        );
        let interaction = world.interact_at(Vec2::new(300.0, 300.0)).unwrap();
        assert_eq!(interaction.kind, ObjectKind::Mirror);
        match &world.objects()[0] {
            LevelObject::Mirror(mirror) => assert_eq!(mirror.angle(), 50.0),
            other => panic!("unexpected object {other:?}"),
        }
        assert_eq!(world.interact_at(Vec2::new(600.0, 300.0)), None);
        assert_eq!(world.interact_at(Vec2::new(900.0, 600.0)), None);
    }

    #[test]
    fn level_without_checkpoints_never_completes() {
        let config = GameConfig::default();
        let world = World::load(&level(Vec::new()), &config);
        assert!(!world.is_complete());
    }
}
