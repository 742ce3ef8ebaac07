use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use glam::Vec2;
use log::debug;
use roxmltree::{Document, Node};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::color::Color;

/// Level pack bundled with the game.
pub const BUILTIN_LEVELS: &str = include_str!("../levels/levels.xml");

const DEFAULT_MIRROR_ANGLE: f32 = 45.0;
const DEFAULT_CREATURE_SPEED: f32 = 2.0;

/// Description of an object placed in a level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ObjectSpec {
    Mirror {
        position: Vec2,
        angle: f32,
    },
    Prism {
        position: Vec2,
    },
    Filter {
        position: Vec2,
        color: Color,
    },
    Checkpoint {
        position: Vec2,
        required_color: Color,
    },
    ShadowCreature {
        position: Vec2,
        path: Vec<Vec2>,
        speed: f32,
    },
}

/// Static layout of a level plus the player's record on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Level {
    pub number: u32,
    pub name: String,
    pub description: String,
    pub player_start: Vec2,
    pub objects: Vec<ObjectSpec>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub best_time: Option<Duration>,
}

impl Level {
    /// Records `time` if it beats the previous best. Returns true on a new record.
    pub fn update_best_time(&mut self, time: Duration) -> bool {
        match self.best_time {
            Some(best) if best <= time => false,
            _ => {
                self.best_time = Some(time);
                true
            }
        }
    }

    pub fn checkpoint_count(&self) -> usize {
        self.objects
            .iter()
            .filter(|spec| matches!(spec, ObjectSpec::Checkpoint { .. }))
            .count()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LevelError {
    #[error("level {0} does not exist")]
    UnknownLevel(u32),
    #[error("level {requested} is locked (highest unlocked level is {unlocked})")]
    Locked { requested: u32, unlocked: u32 },
    #[error("level pack contains no levels")]
    Empty,
    #[error("level numbers must run from 1 without gaps; level {0} is missing")]
    Missing(u32),
    #[error("level {0} is defined twice")]
    Duplicate(u32),
}

/// Ordered collection of levels and the player's progression through them.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelManager {
    levels: BTreeMap<u32, Level>,
    current_level: u32,
    max_level_reached: u32,
}

impl LevelManager {
    /// Loads the bundled levels.
    pub fn builtin() -> Result<Self> {
        Self::from_xml(BUILTIN_LEVELS).context("bundled level pack is invalid")
    }

    pub fn from_levels(levels: Vec<Level>) -> Result<Self, LevelError> {
        let mut by_number = BTreeMap::new();
        for level in levels {
            let number = level.number;
            if by_number.insert(number, level).is_some() {
                return Err(LevelError::Duplicate(number));
            }
        }
        if by_number.is_empty() {
            return Err(LevelError::Empty);
        }
        let count = by_number.len() as u32;
        if let Some(missing) = (1..=count).find(|number| !by_number.contains_key(number)) {
            return Err(LevelError::Missing(missing));
        }
        Ok(Self {
            levels: by_number,
            current_level: 1,
            max_level_reached: 1,
        })
    }

    /// Parses a `<levels>` pack.
    pub fn from_xml(xml: &str) -> Result<Self> {
        let document = Document::parse(xml).context("invalid level XML")?;
        let mut levels = Vec::new();
        for node in document.descendants().filter(|n| n.has_tag_name("level")) {
            let level = parse_level(&node).with_context(|| {
                format!(
                    "invalid level {}",
                    node.attribute("number").unwrap_or("<unnumbered>")
                )
            })?;
            debug!(
                "parsed level {} '{}' with {} objects",
                level.number,
                level.name,
                level.objects.len()
            );
            levels.push(level);
        }
        Ok(Self::from_levels(levels)?)
    }

    pub fn level(&self, number: u32) -> Option<&Level> {
        self.levels.get(&number)
    }

    pub fn level_mut(&mut self, number: u32) -> Option<&mut Level> {
        self.levels.get_mut(&number)
    }

    pub fn levels(&self) -> impl Iterator<Item = &Level> {
        self.levels.values()
    }

    pub fn current_number(&self) -> u32 {
        self.current_level
    }

    pub fn current(&self) -> Option<&Level> {
        self.level(self.current_level)
    }

    pub fn max_level_reached(&self) -> u32 {
        self.max_level_reached
    }

    /// Highest level number in the pack.
    pub fn max_level(&self) -> u32 {
        self.levels.keys().next_back().copied().unwrap_or(0)
    }

    pub fn is_unlocked(&self, number: u32) -> bool {
        number >= 1 && number <= self.max_level_reached && self.levels.contains_key(&number)
    }

    /// Moves to the next level, unlocking it. Returns false on the last level.
    pub fn advance_level(&mut self) -> bool {
        if self.current_level >= self.max_level() {
            return false;
        }
        self.current_level += 1;
        self.max_level_reached = self.max_level_reached.max(self.current_level);
        true
    }

    /// Jumps to an already unlocked level.
    pub fn set_level(&mut self, number: u32) -> Result<(), LevelError> {
        if !self.levels.contains_key(&number) {
            return Err(LevelError::UnknownLevel(number));
        }
        if !self.is_unlocked(number) {
            return Err(LevelError::Locked {
                requested: number,
                unlocked: self.max_level_reached,
            });
        }
        self.current_level = number;
        Ok(())
    }

    /// Makes every level up to `number` selectable.
    pub fn unlock_through(&mut self, number: u32) {
        self.max_level_reached = self.max_level_reached.max(number.min(self.max_level()));
    }

    /// Flags the current level as completed and records the time. Returns
    /// true when the time is a new best.
    pub fn mark_completed(&mut self, time: Duration) -> bool {
        let current = self.current_level;
        match self.level_mut(current) {
            Some(level) => {
                level.completed = true;
                level.update_best_time(time)
            }
            None => false,
        }
    }
}

fn parse_level(node: &Node<'_, '_>) -> Result<Level> {
    let number = required_attribute(node, "number")?
        .parse::<u32>()
        .context("level number must be a positive integer")?;
    if number == 0 {
        return Err(anyhow!("level numbers start at 1"));
    }
    let name = node
        .attribute("name")
        .map(str::to_string)
        .unwrap_or_else(|| format!("Level {number}"));
    let description = child_text(node, "description").unwrap_or_default();
    let player_start = child_text(node, "player_start")
        .ok_or_else(|| anyhow!("<player_start> tag is missing"))
        .and_then(|text| parse_point(&text))?;

    let mut objects = Vec::new();
    for child in node.children().filter(Node::is_element) {
        let tag = child.tag_name().name();
        if matches!(tag, "description" | "player_start") {
            continue;
        }
        let spec = parse_object(&child, tag).with_context(|| format!("invalid <{tag}>"))?;
        objects.push(spec);
    }

    Ok(Level {
        number,
        name,
        description,
        player_start,
        objects,
        completed: false,
        best_time: None,
    })
}

fn parse_object(node: &Node<'_, '_>, tag: &str) -> Result<ObjectSpec> {
    let position = parse_point(required_attribute(node, "position")?)?;
    let spec = match tag {
        "mirror" => ObjectSpec::Mirror {
            position,
            angle: optional_f32(node, "angle")?.unwrap_or(DEFAULT_MIRROR_ANGLE),
        },
        "prism" => ObjectSpec::Prism { position },
        "filter" => ObjectSpec::Filter {
            position,
            color: optional_color(node, "color")?.unwrap_or(Color::RED),
        },
        "checkpoint" => ObjectSpec::Checkpoint {
            position,
            required_color: optional_color(node, "color")?.unwrap_or(Color::WHITE),
        },
        "shadow_creature" => ObjectSpec::ShadowCreature {
            position,
            path: node
                .attribute("path")
                .map(parse_path)
                .transpose()?
                .unwrap_or_default(),
            speed: optional_f32(node, "speed")?.unwrap_or(DEFAULT_CREATURE_SPEED),
        },
        other => return Err(anyhow!("unknown object type {other:?}")),
    };
    Ok(spec)
}

fn required_attribute<'a>(node: &Node<'a, '_>, name: &str) -> Result<&'a str> {
    node.attribute(name)
        .ok_or_else(|| anyhow!("{name} attribute is missing"))
}

fn child_text(node: &Node<'_, '_>, tag: &str) -> Option<String> {
    node.children()
        .find(|child| child.has_tag_name(tag))
        .and_then(|child| child.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(|text| text.to_string())
}

fn optional_f32(node: &Node<'_, '_>, name: &str) -> Result<Option<f32>> {
    node.attribute(name)
        .map(|value| {
            value
                .trim()
                .parse::<f32>()
                .map_err(|err| anyhow!("failed to parse {name}: {err}"))
        })
        .transpose()
}

fn optional_color(node: &Node<'_, '_>, name: &str) -> Result<Option<Color>> {
    node.attribute(name).map(Color::parse).transpose()
}

fn parse_point(value: &str) -> Result<Vec2> {
    let mut numbers = value.split_whitespace().map(|component| {
        component
            .parse::<f32>()
            .map_err(|err| anyhow!("invalid coordinate {component:?}: {err}"))
    });
    let x = numbers
        .next()
        .ok_or_else(|| anyhow!("point is missing components"))??;
    let y = numbers
        .next()
        .ok_or_else(|| anyhow!("point is missing components"))??;
    if numbers.next().is_some() {
        return Err(anyhow!("point has more than two components: {value:?}"));
    }
    Ok(Vec2::new(x, y))
}

/// `"x y; x y; ..."`
fn parse_path(value: &str) -> Result<Vec<Vec2>> {
    value
        .split(';')
        .map(str::trim)
        .filter(|point| !point.is_empty())
        .map(parse_point)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PACK: &str = r#"
    <levels>
        <level number="2" name="Second">
            <player_start>10 20</player_start>
            <prism position="5 5"/>
        </level>
        <level number="1">
            <description>Intro</description>
            <player_start>1 2</player_start>
            <mirror position="100 100"/>
            <checkpoint position="200 200" color="255 0 0"/>
            <shadow_creature position="50 50" speed="3" path="50 50; 80 50"/>
        </level>
    </levels>
    "#;

    #[test]
    fn builtin_pack_has_ten_levels() {
        let manager = LevelManager::builtin().unwrap();
        assert_eq!(manager.max_level(), 10);
        let first = manager.level(1).unwrap();
        assert_eq!(first.name, "First Reflections");
        assert_eq!(first.player_start, Vec2::new(200.0, 360.0));
        assert_eq!(first.checkpoint_count(), 1);
        let last = manager.level(10).unwrap();
        assert_eq!(last.name, "Master Weaver");
        assert_eq!(last.checkpoint_count(), 3);
    }

    #[test]
    fn parses_objects_and_defaults() {
        let manager = LevelManager::from_xml(PACK).unwrap();
        let level = manager.level(1).unwrap();
        assert_eq!(level.name, "Level 1");
        assert_eq!(level.description, "Intro");
        assert_eq!(
            level.objects[0],
            ObjectSpec::Mirror {
                position: Vec2::new(100.0, 100.0),
                angle: 45.0
            }
        );
        assert_eq!(
            level.objects[1],
            ObjectSpec::Checkpoint {
                position: Vec2::new(200.0, 200.0),
                required_color: Color::RED
            }
        );
        match &level.objects[2] {
            ObjectSpec::ShadowCreature { path, speed, .. } => {
                assert_eq!(path, &vec![Vec2::new(50.0, 50.0), Vec2::new(80.0, 50.0)]);
                assert_eq!(*speed, 3.0);
            }
            other => panic!("unexpected object {other:?}"),
        }
    }

    #[test]
    fn invalid_packs_are_rejected() {
        assert!(LevelManager::from_xml("<levels/>").is_err());
        let gap = r#"<levels><level number="2"><player_start>0 0</player_start></level></levels>"#;
        let err = LevelManager::from_xml(gap).unwrap_err();
        assert_eq!(
            err.downcast_ref::<LevelError>(),
            Some(&LevelError::Missing(1))
        );
        let unknown = r#"<levels><level number="1"><player_start>0 0</player_start><laser position="1 1"/></level></levels>"#;
        assert!(LevelManager::from_xml(unknown).is_err());
    }

    #[test]
    fn progression_unlocks_levels_in_order() {
        let mut manager = LevelManager::from_xml(PACK).unwrap();
        assert!(manager.is_unlocked(1));
        assert!(!manager.is_unlocked(0));
        assert!(!manager.is_unlocked(2));
        assert_eq!(
            manager.set_level(2),
            Err(LevelError::Locked {
                requested: 2,
                unlocked: 1
            })
        );
        assert!(manager.advance_level());
        assert_eq!(manager.current_number(), 2);
        assert_eq!(manager.max_level_reached(), 2);
        assert!(manager.is_unlocked(2));
        assert!(!manager.advance_level());
        assert_eq!(manager.set_level(1), Ok(()));
        assert_eq!(manager.set_level(7), Err(LevelError::UnknownLevel(7)));
    }

    #[test]
    fn best_time_only_improves() {
        let mut manager = LevelManager::from_xml(PACK).unwrap();
        assert!(manager.mark_completed(Duration::from_secs(30)));
        assert!(!manager.mark_completed(Duration::from_secs(45)));
        assert!(manager.mark_completed(Duration::from_secs(12)));
        let level = manager.level(1).unwrap();
        assert!(level.completed);
        assert_eq!(level.best_time, Some(Duration::from_secs(12)));
    }
}
