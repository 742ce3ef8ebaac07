use glam::Vec2;

use crate::color::Color;
use crate::geometry::{self, Hit, Ray, Rect};

use super::{Emission, EmissionKind, IncomingLight, Optic};

/// Angular spread, in radians, between the split red/green/blue rays.
const DISPERSION: f32 = 0.1;
const SPLIT_ATTENUATION: f32 = 0.9;
const PASS_ATTENUATION: f32 = 0.95;

/// Triangular prism that disperses white light into red, green and blue.
#[derive(Debug, Clone, PartialEq)]
pub struct Prism {
    position: Vec2,
    size: f32,
    points: [Vec2; 3],
    normals: [Vec2; 3],
}

impl Prism {
    pub fn new(position: Vec2, size: f32) -> Self {
        let half = size / 2.0;
        let points = [
            Vec2::new(position.x, position.y - half),
            Vec2::new(position.x - half, position.y + half),
            Vec2::new(position.x + half, position.y + half),
        ];
        let mut normals = [Vec2::ZERO; 3];
        for (index, normal) in normals.iter_mut().enumerate() {
            let (a, b) = (points[index], points[(index + 1) % 3]);
            let mut candidate = (b - a).normalize_or_zero().perp();
            // flip toward the outside of the triangle
            if candidate.dot(position - a) > 0.0 {
                candidate = -candidate;
            }
            *normal = candidate;
        }
        Self {
            position,
            size,
            points,
            normals,
        }
    }

    pub fn points(&self) -> [Vec2; 3] {
        self.points
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    fn bounds(&self) -> Rect {
        Rect::new(self.position, Vec2::splat(self.size))
    }
}

impl Optic for Prism {
    fn position(&self) -> Vec2 {
        self.position
    }

    fn intersect(&self, ray: &Ray, max_length: f32) -> Option<Hit> {
        (0..3)
            .filter_map(|index| {
                let (a, b) = (self.points[index], self.points[(index + 1) % 3]);
                geometry::intersect_segment(ray, a, b, max_length).map(|hit| Hit {
                    normal: self.normals[index],
                    ..hit
                })
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }

    fn respond(&self, light: &IncomingLight) -> Vec<Emission> {
        let entering = light.direction.dot(light.hit.normal) < 0.0;
        let heading = light.direction.y.atan2(light.direction.x);

        if light.color == Color::WHITE && entering {
            return [
                (Color::RED, DISPERSION),
                (Color::GREEN, 0.0),
                (Color::BLUE, -DISPERSION),
            ]
            .into_iter()
            .map(|(color, offset)| Emission {
                kind: EmissionKind::Refract,
                direction: geometry::direction_from_angle(heading + offset),
                color,
                attenuation: Some(SPLIT_ATTENUATION),
            })
            .collect();
        }

        vec![Emission {
            kind: EmissionKind::Refract,
            direction: geometry::direction_from_angle(heading),
            color: light.color,
            attenuation: Some(PASS_ATTENUATION),
        }]
    }

    fn contains_point(&self, point: Vec2) -> bool {
        self.bounds().contains(point)
    }

    fn collides_with_circle(&self, center: Vec2, radius: f32) -> bool {
        geometry::circle_intersects_rect(center, radius, &self.bounds())
    }

    /// Clickable, but the crystal itself does not change.
    fn is_interactive(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prism() -> Prism {
        Prism::new(Vec2::new(100.0, 0.0), 60.0)
    }

    #[test]
    fn normals_point_outward() {
        let prism = prism();
        for (index, normal) in prism.normals.iter().enumerate() {
            let a = prism.points[index];
            let b = prism.points[(index + 1) % 3];
            let midpoint = (a + b) / 2.0;
            let centroid = prism.points.iter().copied().sum::<Vec2>() / 3.0;
            assert!(normal.dot(midpoint - centroid) > 0.0);
        }
    }

    #[test]
    fn white_light_entering_splits_into_primaries() {
        let prism = prism();
        let ray = Ray::new(Vec2::new(0.0, 10.0), Vec2::X);
        let hit = prism.intersect(&ray, 2000.0).unwrap();
        assert!(hit.point.x < 100.0);

        let emitted = prism.respond(&IncomingLight {
            color: Color::WHITE,
            direction: Vec2::X,
            hit,
        });
        let colors: Vec<Color> = emitted.iter().map(|e| e.color).collect();
        assert_eq!(colors, vec![Color::RED, Color::GREEN, Color::BLUE]);
        assert!(emitted[0].direction.y > 0.0);
        assert!(emitted[2].direction.y < 0.0);
        assert!(emitted.iter().all(|e| e.attenuation == Some(SPLIT_ATTENUATION)));
    }

    #[test]
    fn colored_light_passes_unsplit() {
        let prism = prism();
        let ray = Ray::new(Vec2::new(0.0, 10.0), Vec2::X);
        let hit = prism.intersect(&ray, 2000.0).unwrap();
        let emitted = prism.respond(&IncomingLight {
            color: Color::RED,
            direction: Vec2::X,
            hit,
        });
        assert_eq!(emitted.len(), 1);
        assert_eq!(emitted[0].color, Color::RED);
        assert!(emitted[0].direction.distance(Vec2::X) < 1e-5);
    }

    #[test]
    fn white_light_exiting_is_not_split() {
        let prism = prism();
        let inside = Ray::new(Vec2::new(100.0, 10.0), Vec2::X);
        let hit = prism.intersect(&inside, 2000.0).unwrap();
        assert!(hit.normal.dot(Vec2::X) > 0.0);
        let emitted = prism.respond(&IncomingLight {
            color: Color::WHITE,
            direction: Vec2::X,
            hit,
        });
        assert_eq!(emitted.len(), 1);
        assert_eq!(emitted[0].color, Color::WHITE);
    }
}
