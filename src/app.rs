use anyhow::{anyhow, Context, Result};
use glam::Vec2;
use log::info;
use parking_lot::RwLock;

use crate::game::{Game, GameState};
use crate::input::{InputEvent, InputState};
use crate::objects::{LevelObject, Optic};
use crate::ui::level_heading;

/// Tracks the physical window size and maps cursor positions into game
/// coordinates, which are stretched over the whole window.
#[derive(Debug)]
pub struct WindowViewport {
    size: RwLock<(u32, u32)>,
    screen: Vec2,
}

impl WindowViewport {
    pub fn new(width: u32, height: u32, screen: Vec2) -> Self {
        Self {
            size: RwLock::new((width.max(1), height.max(1))),
            screen,
        }
    }

    pub fn update(&self, width: u32, height: u32) {
        *self.size.write() = (width.max(1), height.max(1));
    }

    pub fn window_size(&self) -> (u32, u32) {
        *self.size.read()
    }

    pub fn to_game(&self, window_point: Vec2) -> Vec2 {
        let (width, height) = self.window_size();
        Vec2::new(
            window_point.x * self.screen.x / width as f32,
            window_point.y * self.screen.y / height as f32,
        )
    }
}

pub fn window_title(game: &Game) -> String {
    let mut title = game.config().title.clone();
    match game.state() {
        GameState::Playing | GameState::Paused | GameState::LevelComplete => {
            if let Some(level) = game.current_level() {
                title.push_str(" | ");
                title.push_str(&level_heading(level));
            }
            if game.state() != GameState::Playing {
                title.push_str(&format!(" [{}]", game.state().name()));
            }
        }
        state => {
            title.push_str(&format!(" [{}]", state.name()));
            if let Some(button) = game.active_menu().and_then(|menu| menu.hovered()) {
                title.push_str(&format!(" > {}", button.label));
            }
        }
    }
    title
}

/// Settings for a run without a window.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessOptions {
    pub level: u32,
    pub frames: u32,
    /// Cursor position the beam is switched on towards. No beam when unset.
    pub aim: Option<Vec2>,
}

impl Default for HeadlessOptions {
    fn default() -> Self {
        Self {
            level: 1,
            frames: 60,
            aim: None,
        }
    }
}

/// Starts the requested level and steps it at the configured frame rate
/// until it is complete or `frames` updates have run. Returns the number of
/// updates performed.
pub fn run_headless(game: &mut Game, options: &HeadlessOptions) -> Result<u32> {
    game.start_level(options.level)
        .with_context(|| format!("failed to start level {}", options.level))?;

    let input = InputState::new();
    if let Some(aim) = options.aim {
        input.set_mouse_position(aim);
        match game.config().controls.toggle_beam.first().copied() {
            Some(key) => game.handle_event(InputEvent::KeyPressed(key), &input),
            None => {
                let world = game
                    .world_mut()
                    .ok_or_else(|| anyhow!("level {} has no running world", options.level))?;
                world.toggle_beam(aim);
            }
        }
    }

    let dt = game.config().frame_duration();
    let mut frames = 0;
    while frames < options.frames && game.state() == GameState::Playing {
        game.update(dt, &input);
        frames += 1;
    }
    info!(
        "headless run stopped after {frames} frames in state {}",
        game.state().name()
    );
    Ok(frames)
}

/// Human readable report of the running level.
pub fn summary_lines(game: &Game, frames: u32) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(level) = game.current_level() {
        lines.push(level_heading(level));
    }
    lines.push(format!("State: {}", game.state().name()));
    lines.push(format!("Frames: {frames}"));

    let Some(world) = game.world() else {
        return lines;
    };
    let direction = world.beam_direction();
    if world.is_beam_on() {
        lines.push(format!(
            "Beam: on dir=({:.2}, {:.2}) segments={}",
            direction.x,
            direction.y,
            world.traced_beam().segments.len()
        ));
    } else {
        lines.push("Beam: off".to_string());
    }
    let player = world.player().position();
    lines.push(format!("Player: pos=({:.2}, {:.2})", player.x, player.y));
    lines.push(format!(
        "Checkpoints: {}/{} activated",
        world.activated_checkpoint_count(),
        world.checkpoint_count()
    ));
    lines.push("Objects:".to_string());
    for object in world.objects() {
        lines.push(object_line(object));
    }

    if game.state() == GameState::LevelComplete || game.state() == GameState::GameOver {
        lines.push(format!("Level complete in {:.2}s", world.elapsed().as_secs_f32()));
        if let Some(best) = game.current_level().and_then(|level| level.best_time) {
            lines.push(format!("Best time: {:.2}s", best.as_secs_f32()));
        }
    }
    lines
}

fn object_line(object: &LevelObject) -> String {
    let position = object.optic().position();
    let mut line = format!(
        " - {} pos=({:.2}, {:.2})",
        object.kind().name(),
        position.x,
        position.y
    );
    if let Some(checkpoint) = object.as_checkpoint() {
        line.push_str(&format!(
            " color={} {}",
            checkpoint.required_color(),
            if checkpoint.is_activated() { "active" } else { "inactive" }
        ));
    }
    line
}

pub fn print_summary(game: &Game, frames: u32) {
    for line in summary_lines(game, frames) {
        println!("{line}");
    }
}
