//! Interactive level objects and the way each of them treats light.
//!
//! Every object implements [`Optic`]; [`LevelObject`] is the closed set of
//! objects a level can contain and forwards to the concrete type.

mod checkpoint;
mod filter;
mod mirror;
mod prism;
mod shadow;

pub use checkpoint::{Checkpoint, PULSE_AMPLITUDE as CHECKPOINT_PULSE_AMPLITUDE};
pub use filter::ColorFilter;
pub use mirror::Mirror;
pub use prism::Prism;
pub use shadow::{ShadowCreature, TENTACLE_COUNT};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::config::GameConfig;
use crate::geometry::{Hit, Ray};
use crate::level::ObjectSpec;

/// Light arriving at an object surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IncomingLight {
    pub color: Color,
    pub direction: Vec2,
    pub hit: Hit,
}

/// How an emitted ray left the object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmissionKind {
    Reflect,
    Refract,
    /// Passes straight through; the next cast ignores the emitting object.
    Transmit,
}

/// A ray produced by an object in response to incoming light.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Emission {
    pub kind: EmissionKind,
    pub direction: Vec2,
    pub color: Color,
    /// Multiplier applied to the incoming intensity. `None` falls back to the
    /// beam fade rate.
    pub attenuation: Option<f32>,
}

/// Shared behavior of everything placed in a level.
pub trait Optic {
    fn position(&self) -> Vec2;

    /// Nearest point where `ray` meets the object within `max_length`.
    fn intersect(&self, ray: &Ray, max_length: f32) -> Option<Hit>;

    /// Rays leaving the object. An empty list means the light was absorbed.
    fn respond(&self, light: &IncomingLight) -> Vec<Emission>;

    fn contains_point(&self, point: Vec2) -> bool;

    fn collides_with_circle(&self, center: Vec2, radius: f32) -> bool;

    fn is_collidable(&self) -> bool {
        true
    }

    fn is_interactive(&self) -> bool {
        false
    }

    /// Per-frame animation and movement.
    fn update(&mut self) {}

    /// Reaction to the player clicking on the object.
    fn interact(&mut self) {}
}

/// Kind tag used for sounds, logging and summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    Mirror,
    Prism,
    Filter,
    Checkpoint,
    ShadowCreature,
}

impl ObjectKind {
    pub fn name(self) -> &'static str {
        match self {
            ObjectKind::Mirror => "mirror",
            ObjectKind::Prism => "prism",
            ObjectKind::Filter => "filter",
            ObjectKind::Checkpoint => "checkpoint",
            ObjectKind::ShadowCreature => "shadow_creature",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LevelObject {
    Mirror(Mirror),
    Prism(Prism),
    Filter(ColorFilter),
    Checkpoint(Checkpoint),
    ShadowCreature(ShadowCreature),
}

impl LevelObject {
    /// Instantiates an object description with the sizes from `config`.
    pub fn from_spec(spec: &ObjectSpec, config: &GameConfig) -> Self {
        match spec {
            ObjectSpec::Mirror { position, angle } => LevelObject::Mirror(Mirror::new(
                *position,
                *angle,
                config.mirror_width,
                config.mirror_height,
            )),
            ObjectSpec::Prism { position } => {
                LevelObject::Prism(Prism::new(*position, config.prism_size))
            }
            ObjectSpec::Filter { position, color } => {
                LevelObject::Filter(ColorFilter::new(*position, *color, config.filter_size))
            }
            ObjectSpec::Checkpoint {
                position,
                required_color,
            } => LevelObject::Checkpoint(Checkpoint::new(
                *position,
                *required_color,
                config.checkpoint_size,
            )),
            ObjectSpec::ShadowCreature {
                position,
                path,
                speed,
            } => LevelObject::ShadowCreature(ShadowCreature::new(
                *position,
                path.clone(),
                *speed,
                config.shadow_creature_size,
            )),
        }
    }

    pub fn kind(&self) -> ObjectKind {
        match self {
            LevelObject::Mirror(_) => ObjectKind::Mirror,
            LevelObject::Prism(_) => ObjectKind::Prism,
            LevelObject::Filter(_) => ObjectKind::Filter,
            LevelObject::Checkpoint(_) => ObjectKind::Checkpoint,
            LevelObject::ShadowCreature(_) => ObjectKind::ShadowCreature,
        }
    }

    pub fn optic(&self) -> &dyn Optic {
        match self {
            LevelObject::Mirror(object) => object,
            LevelObject::Prism(object) => object,
            LevelObject::Filter(object) => object,
            LevelObject::Checkpoint(object) => object,
            LevelObject::ShadowCreature(object) => object,
        }
    }

    pub fn optic_mut(&mut self) -> &mut dyn Optic {
        match self {
            LevelObject::Mirror(object) => object,
            LevelObject::Prism(object) => object,
            LevelObject::Filter(object) => object,
            LevelObject::Checkpoint(object) => object,
            LevelObject::ShadowCreature(object) => object,
        }
    }

    pub fn as_checkpoint(&self) -> Option<&Checkpoint> {
        match self {
            LevelObject::Checkpoint(checkpoint) => Some(checkpoint),
            _ => None,
        }
    }

    pub fn as_checkpoint_mut(&mut self) -> Option<&mut Checkpoint> {
        match self {
            LevelObject::Checkpoint(checkpoint) => Some(checkpoint),
            _ => None,
        }
    }
}
