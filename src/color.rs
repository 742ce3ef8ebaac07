use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// 8-bit RGB color as used by beams, filters and checkpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const RED: Self = Self::rgb(255, 0, 0);
    pub const GREEN: Self = Self::rgb(0, 255, 0);
    pub const BLUE: Self = Self::rgb(0, 0, 255);
    pub const YELLOW: Self = Self::rgb(255, 255, 0);
    pub const CYAN: Self = Self::rgb(0, 255, 255);
    pub const MAGENTA: Self = Self::rgb(255, 0, 255);
    pub const GRAY: Self = Self::rgb(128, 128, 128);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Returns true when every channel differs by at most `threshold`.
    pub fn matches(self, other: Color, threshold: u8) -> bool {
        self.r.abs_diff(other.r) <= threshold
            && self.g.abs_diff(other.g) <= threshold
            && self.b.abs_diff(other.b) <= threshold
    }

    /// Linear blend, `ratio` weighting `self`.
    pub fn mix(self, other: Color, ratio: f32) -> Color {
        let blend = |a: u8, b: u8| (a as f32 * ratio + b as f32 * (1.0 - ratio)) as u8;
        Color::rgb(
            blend(self.r, other.r),
            blend(self.g, other.g),
            blend(self.b, other.b),
        )
    }

    pub fn scaled(self, factor: f32) -> Color {
        let scale = |c: u8| (c as f32 * factor).clamp(0.0, 255.0) as u8;
        Color::rgb(scale(self.r), scale(self.g), scale(self.b))
    }

    pub fn component_min(self, other: Color) -> Color {
        Color::rgb(
            self.r.min(other.r),
            self.g.min(other.g),
            self.b.min(other.b),
        )
    }

    /// Normalized RGBA for the GPU.
    pub fn to_rgba(self, alpha: f32) -> [f32; 4] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            alpha.clamp(0.0, 1.0),
        ]
    }

    pub fn name(self) -> Option<&'static str> {
        NAMED_COLORS
            .iter()
            .find(|(_, color)| *color == self)
            .map(|(name, _)| *name)
    }

    /// Parses either a color name (`red`) or three 0-255 components (`255 128 0`).
    pub fn parse(value: &str) -> Result<Self> {
        let value = value.trim();
        if let Some((_, color)) = NAMED_COLORS
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(value))
        {
            return Ok(*color);
        }
        let components = value
            .split_whitespace()
            .map(|component| {
                component
                    .parse::<u8>()
                    .map_err(|err| anyhow!("invalid color component {component:?}: {err}"))
            })
            .collect::<Result<Vec<_>>>()?;
        match components.as_slice() {
            [r, g, b] => Ok(Color::rgb(*r, *g, *b)),
            _ => Err(anyhow!(
                "color must be a name or three components, got {value:?}"
            )),
        }
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "({}, {}, {})", self.r, self.g, self.b),
        }
    }
}

const NAMED_COLORS: &[(&str, Color)] = &[
    ("white", Color::WHITE),
    ("black", Color::BLACK),
    ("red", Color::RED),
    ("green", Color::GREEN),
    ("blue", Color::BLUE),
    ("yellow", Color::YELLOW),
    ("cyan", Color::CYAN),
    ("magenta", Color::MAGENTA),
    ("gray", Color::GRAY),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_within_threshold() {
        let near_red = Color::rgb(230, 20, 10);
        assert!(near_red.matches(Color::RED, 30));
        assert!(!Color::rgb(200, 0, 0).matches(Color::RED, 30));
    }

    #[test]
    fn mix_blends_channels() {
        assert_eq!(Color::RED.mix(Color::BLUE, 0.5), Color::rgb(127, 0, 127));
        assert_eq!(Color::RED.mix(Color::BLUE, 1.0), Color::RED);
    }

    #[test]
    fn parse_names_and_components() {
        assert_eq!(Color::parse("Magenta").unwrap(), Color::MAGENTA);
        assert_eq!(Color::parse(" 10 20 30 ").unwrap(), Color::rgb(10, 20, 30));
        assert!(Color::parse("10 20").is_err());
        assert!(Color::parse("purple").is_err());
    }

    #[test]
    fn display_prefers_names() {
        assert_eq!(Color::CYAN.to_string(), "cyan");
        assert_eq!(Color::rgb(1, 2, 3).to_string(), "(1, 2, 3)");
    }
}
