//! CPU side of drawing: turns the game into a list of colored triangles in
//! screen pixels.

use std::f32::consts::TAU;

use bytemuck::{Pod, Zeroable};
use glam::Vec2;

use super::font;
use crate::color::Color;
use crate::config::GameConfig;
use crate::game::{Game, GameState};
use crate::geometry::Rect;
use crate::light::TracedBeam;
use crate::objects::{
    Checkpoint, ColorFilter, LevelObject, Mirror, Optic, Prism, ShadowCreature,
    CHECKPOINT_PULSE_AMPLITUDE, TENTACLE_COUNT,
};
use crate::player::{Player, PULSE_AMPLITUDE as PLAYER_PULSE_AMPLITUDE};
use crate::ui::{self, Anchor, Button, Menu, TextLine};

const CIRCLE_SEGMENTS: u32 = 32;
const GLOW_LAYERS: u32 = 6;
const OVERLAY_ALPHA: f32 = 150.0 / 255.0;
const STAR_COUNT: u32 = 100;
const BUTTON_BORDER: f32 = 2.0;

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex {
    pub const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x4];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Collects triangles in submission order; later shapes draw on top.
#[derive(Debug, Default)]
pub struct FrameBuilder {
    vertices: Vec<Vertex>,
}

impl FrameBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn into_vertices(self) -> Vec<Vertex> {
        self.vertices
    }

    pub fn triangle(&mut self, a: Vec2, b: Vec2, c: Vec2, color: [f32; 4]) {
        for point in [a, b, c] {
            self.vertices.push(Vertex {
                position: point.to_array(),
                color,
            });
        }
    }

    pub fn quad(&mut self, corners: [Vec2; 4], color: [f32; 4]) {
        let [a, b, c, d] = corners;
        self.triangle(a, b, c, color);
        self.triangle(a, c, d, color);
    }

    pub fn rect(&mut self, rect: &Rect, color: [f32; 4]) {
        let (min, max) = (rect.min(), rect.max());
        self.quad(
            [min, Vec2::new(max.x, min.y), max, Vec2::new(min.x, max.y)],
            color,
        );
    }

    pub fn rect_outline(&mut self, rect: &Rect, thickness: f32, color: [f32; 4]) {
        let (min, max) = (rect.min(), rect.max());
        let corners = [min, Vec2::new(max.x, min.y), max, Vec2::new(min.x, max.y)];
        for index in 0..4 {
            self.line(corners[index], corners[(index + 1) % 4], thickness, color);
        }
    }

    /// Thick segment from `a` to `b`. Zero-length segments are skipped.
    pub fn line(&mut self, a: Vec2, b: Vec2, width: f32, color: [f32; 4]) {
        let direction = (b - a).normalize_or_zero();
        if direction == Vec2::ZERO || width <= 0.0 {
            return;
        }
        let offset = direction.perp() * (width / 2.0);
        self.quad([a + offset, b + offset, b - offset, a - offset], color);
    }

    pub fn circle(&mut self, center: Vec2, radius: f32, color: [f32; 4]) {
        if radius <= 0.0 {
            return;
        }
        for segment in 0..CIRCLE_SEGMENTS {
            let (start, end) = segment_angles(segment);
            self.triangle(
                center,
                center + Vec2::from_angle(start) * radius,
                center + Vec2::from_angle(end) * radius,
                color,
            );
        }
    }

    /// Soft disc fading from `alpha` at the center to transparent at the edge.
    pub fn glow(&mut self, center: Vec2, radius: f32, color: Color, alpha: f32) {
        for layer in (1..=GLOW_LAYERS).rev() {
            let fraction = layer as f32 / GLOW_LAYERS as f32;
            let layer_alpha = alpha * (1.0 - fraction) / GLOW_LAYERS as f32 * 2.0;
            self.circle(center, radius * fraction, color.to_rgba(layer_alpha));
        }
    }

    pub fn polygon(&mut self, points: &[Vec2], color: [f32; 4]) {
        let Some((&first, rest)) = points.split_first() else {
            return;
        };
        for pair in rest.windows(2) {
            self.triangle(first, pair[0], pair[1], color);
        }
    }

    pub fn text(&mut self, line: &TextLine) {
        let width = font::text_width(&line.text, line.size);
        let origin = match line.anchor {
            Anchor::TopLeft => line.position,
            Anchor::Center => line.position - Vec2::new(width, line.size) / 2.0,
            Anchor::BottomLeft => line.position - Vec2::new(0.0, line.size),
            Anchor::BottomRight => line.position - Vec2::new(width, line.size),
        };
        let cell = font::cell_size(line.size);
        let color = line.color.to_rgba(1.0);
        for (column, row) in font::cells(&line.text) {
            let min = origin + Vec2::new(column as f32, row as f32) * cell;
            self.rect(&Rect::new(min + Vec2::splat(cell / 2.0), Vec2::splat(cell)), color);
        }
    }

    pub fn button(&mut self, button: &Button, font_size: f32) {
        self.rect(&button.rect, button.fill_color().to_rgba(1.0));
        self.rect_outline(&button.rect, BUTTON_BORDER, Color::WHITE.to_rgba(1.0));
        self.text(&TextLine::new(
            button.label.clone(),
            button.rect.center,
            Anchor::Center,
            button.text_color,
            font_size * 0.75,
        ));
    }

    pub fn menu(&mut self, menu: &Menu, font_size: f32) {
        for button in menu.buttons() {
            self.button(button, font_size);
        }
    }

    pub fn beam(&mut self, traced: &TracedBeam, width: u32) {
        let width = width.max(1);
        for segment in &traced.segments {
            let intensity = segment.intensity.clamp(0.0, 1.0);
            let color = segment.color.scaled(intensity);
            for layer in 1..=width {
                let alpha = layer as f32 / width as f32 * intensity;
                // outer layers are wider and fainter
                let spread = (width - layer + 1) as f32 * 2.0 - 1.0;
                self.line(
                    segment.start,
                    segment.end,
                    spread,
                    color.to_rgba(alpha / (width - layer + 1) as f32),
                );
            }
        }
    }

    pub fn player(&mut self, player: &Player, config: &GameConfig) {
        let position = player.position();
        let glow_radius =
            config.player_glow_radius + player.pulse_timer().sin() * PLAYER_PULSE_AMPLITUDE;
        self.glow(position, glow_radius, config.player_glow_color, 100.0 / 255.0);
        self.circle(position, player.radius(), config.player_color.to_rgba(1.0));
        self.circle(
            position - Vec2::splat(player.radius() * 0.3),
            player.radius() * 0.4,
            Color::WHITE.to_rgba(1.0),
        );
    }

    pub fn object(&mut self, object: &LevelObject) {
        match object {
            LevelObject::Mirror(mirror) => self.mirror(mirror),
            LevelObject::Prism(prism) => self.prism(prism),
            LevelObject::Filter(filter) => self.filter(filter),
            LevelObject::Checkpoint(checkpoint) => self.checkpoint(checkpoint),
            LevelObject::ShadowCreature(creature) => self.shadow_creature(creature),
        }
    }

    fn mirror(&mut self, mirror: &Mirror) {
        let (start, end) = mirror.endpoints();
        self.line(start, end, mirror.thickness(), Color::rgb(200, 200, 255).to_rgba(1.0));
        // reflective face
        let face = mirror.normal() * (mirror.thickness() / 4.0);
        self.line(start + face, end + face, 2.0, Color::WHITE.to_rgba(1.0));
    }

    fn prism(&mut self, prism: &Prism) {
        let points = prism.points();
        self.polygon(&points, Color::rgb(200, 200, 255).to_rgba(0.5));
        for index in 0..3 {
            self.line(
                points[index],
                points[(index + 1) % 3],
                2.0,
                Color::WHITE.to_rgba(1.0),
            );
        }
    }

    fn filter(&mut self, filter: &ColorFilter) {
        let rect = Rect::new(filter.position(), Vec2::splat(filter.size()));
        self.rect(&rect, filter.color().to_rgba(0.6));
        self.rect_outline(&rect, 2.0, Color::WHITE.to_rgba(1.0));
    }

    fn checkpoint(&mut self, checkpoint: &Checkpoint) {
        let center = checkpoint.position();
        let size = if checkpoint.is_activated() {
            checkpoint.size()
        } else {
            checkpoint.size() + checkpoint.pulse_timer().sin() * CHECKPOINT_PULSE_AMPLITUDE
        };
        let required = checkpoint.required_color();
        if checkpoint.is_activated() {
            self.glow(center, size * 0.8, required, 100.0 / 255.0);
        }
        let base = if checkpoint.is_activated() {
            required
        } else {
            Color::GRAY
        };
        self.circle(center, size / 2.0, base.to_rgba(1.0));
        self.circle(center, size * 0.3, required.to_rgba(1.0));
    }

    fn shadow_creature(&mut self, creature: &ShadowCreature) {
        let center = creature.position();
        let size = creature.radius() * 2.0;
        let body = creature.radius() + creature.pulse_timer().sin() * 10.0;
        self.glow(center, body.max(1.0), Color::BLACK, 200.0 / 255.0);

        let phase = creature.tentacle_phase();
        let length = size * 0.6;
        for index in 0..TENTACLE_COUNT {
            let angle = index as f32 / TENTACLE_COUNT as f32 * TAU + phase;
            let wiggle = (phase * 2.0 + index as f32).sin() * 10.0;
            let end = center + Vec2::from_angle(angle) * (length + wiggle);
            for thickness in (1..=5).rev() {
                self.line(
                    center,
                    end,
                    thickness as f32,
                    Color::BLACK.to_rgba(150.0 / 255.0 * thickness as f32 / 5.0),
                );
            }
        }

        let eye_distance = size / 5.0;
        for side in [-1.0, 1.0] {
            let eye = center + Vec2::new(side * eye_distance, -eye_distance / 2.0);
            self.glow(eye, 6.0, Color::RED, 0.8);
            self.circle(eye, 2.0, Color::RED.to_rgba(1.0));
        }
    }

    /// Dims everything drawn so far.
    pub fn overlay(&mut self, config: &GameConfig, alpha: f32) {
        self.rect(
            &Rect::from_top_left(0.0, 0.0, config.screen_width, config.screen_height),
            Color::BLACK.to_rgba(alpha),
        );
    }

    fn stars(&mut self, config: &GameConfig, millis: f32) {
        for index in 0..STAR_COUNT {
            let i = index as f32;
            let x = (config.screen_width * (i / STAR_COUNT as f32) + millis / 50.0)
                .rem_euclid(config.screen_width);
            let y = (config.screen_height * ((index * index) % 100) as f32 / 100.0
                + millis / 100.0)
                .rem_euclid(config.screen_height);
            let twinkle = ((millis / 200.0 + i).sin() + 1.0) / 2.0;
            let brightness = (100.0 + 155.0 * twinkle) as u8;
            let size = 1.0 + 2.0 * (((millis / 300.0 + i).sin() + 1.0) / 2.0);
            self.circle(
                Vec2::new(x, y),
                size,
                Color::rgb(brightness, brightness, brightness).to_rgba(1.0),
            );
        }
    }

    fn lines(&mut self, lines: &[TextLine]) {
        for line in lines {
            self.text(line);
        }
    }
}

fn segment_angles(segment: u32) -> (f32, f32) {
    let step = TAU / CIRCLE_SEGMENTS as f32;
    (segment as f32 * step, (segment + 1) as f32 * step)
}

/// Oscillates between 0 and 1 with the given period divisor in milliseconds.
fn pulse(millis: f32, divisor: f32) -> f32 {
    ((millis / divisor).sin() + 1.0) / 2.0
}

fn blink_on(millis: f32) -> bool {
    (millis as u64 / 500) % 2 == 0
}

/// Tessellates the whole screen for the current game state.
pub fn build_frame(game: &Game) -> FrameBuilder {
    let config = game.config();
    let mut frame = FrameBuilder::new();
    let millis = game.clock().as_secs_f32() * 1000.0;
    let font_size = config.ui_font_size;

    if game.state().shows_world() {
        if let (Some(world), Some(level)) = (game.world(), game.current_level()) {
            for object in world.objects() {
                frame.object(object);
            }
            frame.beam(world.traced_beam(), config.beam_width);
            frame.player(world.player(), config);
            frame.lines(&ui::hud_lines(level, world, config));
        }
    }

    match game.state() {
        GameState::Menu => {
            frame.lines(&ui::main_menu_lines(config));
        }
        GameState::LevelSelect => {
            frame.lines(&ui::level_select_lines(config));
        }
        GameState::Playing => {}
        GameState::Paused => {
            frame.overlay(config, OVERLAY_ALPHA);
            frame.lines(&ui::pause_lines(config));
        }
        GameState::LevelComplete => {
            frame.overlay(config, OVERLAY_ALPHA);
            let pulse = pulse(millis, 200.0);
            let center = Vec2::new(config.screen_width / 2.0, config.screen_height / 3.0);
            let glow = ui::complete_glow(pulse);
            frame.glow(center, 300.0 + pulse * 50.0, glow, 0.4);
            if let Some(level) = game.current_level() {
                frame.lines(&ui::level_complete_lines(config, level, pulse, blink_on(millis)));
            }
        }
        GameState::GameOver => {
            frame.stars(config, millis);
            let pulse = pulse(millis, 300.0);
            let center = Vec2::new(config.screen_width / 2.0, config.screen_height / 3.0);
            let gold = ui::victory_gold(pulse);
            frame.glow(center, 350.0 + pulse * 50.0, gold, 0.3);
            frame.lines(&ui::game_over_lines(config, pulse, blink_on(millis)));
        }
    }

    if let Some(menu) = game.active_menu() {
        frame.menu(menu, font_size);
    }
    frame
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{AudioManager, LogBackend};
    use crate::level::LevelManager;

    fn game() -> Game {
        let audio = AudioManager::new("missing-audio-dir", Box::new(LogBackend), 0.5, 0.7);
        Game::new(GameConfig::default(), LevelManager::builtin().unwrap(), audio)
    }

    #[test]
    fn shapes_emit_whole_triangles() {
        let mut frame = FrameBuilder::new();
        frame.circle(Vec2::ZERO, 10.0, [1.0; 4]);
        assert_eq!(frame.vertices().len(), (CIRCLE_SEGMENTS * 3) as usize);
        frame.line(Vec2::ZERO, Vec2::ZERO, 3.0, [1.0; 4]);
        assert_eq!(frame.vertices().len(), (CIRCLE_SEGMENTS * 3) as usize);
        frame.line(Vec2::ZERO, Vec2::X * 10.0, 4.0, [1.0; 4]);
        let last = &frame.vertices()[frame.vertices().len() - 6..];
        assert!(last.iter().all(|v| v.position[1].abs() == 2.0));
    }

    #[test]
    fn centered_text_is_centered() {
        let mut frame = FrameBuilder::new();
        frame.text(&TextLine::new(
            "I",
            Vec2::new(100.0, 100.0),
            Anchor::Center,
            Color::WHITE,
            14.0,
        ));
        let xs: Vec<f32> = frame.vertices().iter().map(|v| v.position[0]).collect();
        let min = xs.iter().copied().fold(f32::MAX, f32::min);
        let max = xs.iter().copied().fold(f32::MIN, f32::max);
        assert!(((min + max) / 2.0 - 100.0).abs() < 1e-3);
    }

    #[test]
    fn menu_frame_contains_buttons() {
        let game = game();
        let frame = build_frame(&game).into_vertices();
        assert!(!frame.is_empty());
        // every vertex stays on screen
        assert!(frame
            .iter()
            .all(|v| v.position[0] >= 0.0 && v.position[0] <= 1280.0));
    }

    #[test]
    fn playing_frame_draws_beam() {
        let mut game = game();
        game.start_game().unwrap();
        let without_beam = build_frame(&game).vertices().len();
        if let Some(world) = game.world_mut() {
            world.toggle_beam(Vec2::new(640.0, 360.0));
        }
        let with_beam = build_frame(&game).vertices().len();
        assert!(with_beam > without_beam);
    }

    #[test]
    fn vertex_layout_matches_struct() {
        assert_eq!(std::mem::size_of::<Vertex>(), 24);
        assert_eq!(Vertex::layout().array_stride, 24);
    }
}
