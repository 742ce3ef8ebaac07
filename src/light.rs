use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::config::GameConfig;
use crate::geometry::{Hit, Ray};
use crate::objects::{EmissionKind, IncomingLight, LevelObject};

/// Child rays are cast from slightly past the surface they left so the
/// surface itself is not hit again.
const SURFACE_NUDGE: f32 = 0.01;

/// Hits closer than this to the ray origin are ignored.
const HIT_EPSILON: f32 = 1e-3;

/// Straight piece of a traced beam.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BeamSegment {
    pub start: Vec2,
    pub end: Vec2,
    pub color: Color,
    pub intensity: f32,
    /// Number of interactions the light went through before this segment.
    pub depth: u32,
}

/// An object struck by the beam during a trace.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeamHit {
    pub object: usize,
    pub color: Color,
    pub point: Vec2,
}

/// Result of tracing a beam through a level.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TracedBeam {
    pub segments: Vec<BeamSegment>,
    pub hits: Vec<BeamHit>,
}

impl TracedBeam {
    pub fn hit_objects(&self) -> impl Iterator<Item = usize> + '_ {
        self.hits.iter().map(|hit| hit.object)
    }
}

/// Limits applied while tracing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceSettings {
    pub max_length: f32,
    pub max_reflections: u32,
    /// Intensity kept by emissions that carry no attenuation of their own.
    pub fade_rate: f32,
}

impl TraceSettings {
    pub fn from_config(config: &GameConfig) -> Self {
        Self {
            max_length: config.beam_max_length,
            max_reflections: config.max_reflections,
            fade_rate: config.beam_fade_rate,
        }
    }
}

/// Beam emitted by the orb.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightBeam {
    pub origin: Vec2,
    pub direction: Vec2,
    pub color: Color,
    pub intensity: f32,
}

struct PendingRay {
    start: Vec2,
    ray: Ray,
    color: Color,
    intensity: f32,
    depth: u32,
    skip: Option<usize>,
}

impl LightBeam {
    pub fn new(origin: Vec2, direction: Vec2, color: Color) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
            color,
            intensity: 1.0,
        }
    }

    /// Follows the beam and every ray it spawns, depth first.
    pub fn trace(&self, objects: &[LevelObject], settings: &TraceSettings) -> TracedBeam {
        let mut traced = TracedBeam::default();
        if self.direction == Vec2::ZERO {
            return traced;
        }

        let mut pending = vec![PendingRay {
            start: self.origin,
            ray: Ray::new(self.origin, self.direction),
            color: self.color,
            intensity: self.intensity,
            depth: 0,
            skip: None,
        }];

        while let Some(current) = pending.pop() {
            let segment = |end: Vec2| BeamSegment {
                start: current.start,
                end,
                color: current.color,
                intensity: current.intensity,
                depth: current.depth,
            };

            if current.depth >= settings.max_reflections {
                traced
                    .segments
                    .push(segment(current.ray.at(settings.max_length)));
                continue;
            }

            let Some((index, hit)) = nearest_hit(objects, &current.ray, settings, current.skip)
            else {
                traced
                    .segments
                    .push(segment(current.ray.at(settings.max_length)));
                continue;
            };

            traced.segments.push(segment(hit.point));
            traced.hits.push(BeamHit {
                object: index,
                color: current.color,
                point: hit.point,
            });

            let emissions = objects[index].optic().respond(&IncomingLight {
                color: current.color,
                direction: current.ray.direction,
                hit,
            });

            // reversed so the first emission is traced first
            for emission in emissions.into_iter().rev() {
                let direction = emission.direction.normalize_or_zero();
                if direction == Vec2::ZERO {
                    continue;
                }
                let skip = match emission.kind {
                    EmissionKind::Transmit | EmissionKind::Reflect => Some(index),
                    EmissionKind::Refract => None,
                };
                pending.push(PendingRay {
                    start: hit.point,
                    ray: Ray::new(hit.point + direction * SURFACE_NUDGE, direction),
                    color: emission.color,
                    intensity: current.intensity
                        * emission.attenuation.unwrap_or(settings.fade_rate),
                    depth: current.depth + 1,
                    skip,
                });
            }
        }

        traced
    }
}

fn nearest_hit(
    objects: &[LevelObject],
    ray: &Ray,
    settings: &TraceSettings,
    skip: Option<usize>,
) -> Option<(usize, Hit)> {
    objects
        .iter()
        .enumerate()
        .filter(|(index, _)| Some(*index) != skip)
        .filter_map(|(index, object)| {
            object
                .optic()
                .intersect(ray, settings.max_length)
                .filter(|hit| hit.distance > HIT_EPSILON && hit.distance <= settings.max_length)
                .map(|hit| (index, hit))
        })
        .min_by(|(_, a), (_, b)| a.distance.total_cmp(&b.distance))
}
