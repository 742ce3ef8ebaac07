use glam::Vec2;

use crate::color::Color;
use crate::geometry::{self, Hit, Ray, Rect};

use super::{Emission, EmissionKind, IncomingLight, Optic};

const FILTER_ATTENUATION: f32 = 0.9;

/// Order in which a filter cycles when clicked.
pub const FILTER_COLORS: [Color; 7] = [
    Color::RED,
    Color::GREEN,
    Color::BLUE,
    Color::YELLOW,
    Color::CYAN,
    Color::MAGENTA,
    Color::WHITE,
];

/// Colored glass that tints light passing through it.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorFilter {
    position: Vec2,
    size: f32,
    color: Color,
    color_index: usize,
}

impl ColorFilter {
    pub fn new(position: Vec2, color: Color, size: f32) -> Self {
        let color_index = FILTER_COLORS
            .iter()
            .position(|candidate| *candidate == color)
            .unwrap_or(0);
        Self {
            position,
            size,
            color,
            color_index,
        }
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn size(&self) -> f32 {
        self.size
    }

    fn bounds(&self) -> Rect {
        Rect::new(self.position, Vec2::splat(self.size))
    }

    /// Color of `incoming` light after crossing this filter.
    pub fn filtered(&self, incoming: Color) -> Color {
        filter_color(self.color, incoming)
    }
}

/// White filters are clear, white light takes the filter color, two
/// different primaries combine into their secondary, anything else is
/// reduced channel by channel.
pub fn filter_color(filter: Color, incoming: Color) -> Color {
    use Color as C;
    if filter == C::WHITE {
        return incoming;
    }
    if incoming == C::WHITE {
        return filter;
    }
    let primaries = [C::RED, C::GREEN, C::BLUE];
    if primaries.contains(&filter) {
        return match (filter, incoming) {
            (C::RED, C::BLUE) | (C::BLUE, C::RED) => C::MAGENTA,
            (C::RED, C::GREEN) | (C::GREEN, C::RED) => C::YELLOW,
            (C::GREEN, C::BLUE) | (C::BLUE, C::GREEN) => C::CYAN,
            _ => filter,
        };
    }
    incoming.component_min(filter)
}

impl Optic for ColorFilter {
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
            color: self.filtered(light.color),
            attenuation: Some(FILTER_ATTENUATION),
        }]
    }

    fn contains_point(&self, point: Vec2) -> bool {
        self.bounds().contains(point)
    }

    fn collides_with_circle(&self, center: Vec2, radius: f32) -> bool {
        geometry::circle_intersects_rect(center, radius, &self.bounds())
    }

    fn is_interactive(&self) -> bool {
        true
    }

    fn interact(&mut self) {
        self.color_index = (self.color_index + 1) % FILTER_COLORS.len();
        self.color = FILTER_COLORS[self.color_index];
    }
}
