//! Menus, buttons and the text shown over the playfield.
//!
//! Layout only: screens are described as [`Button`]s and [`TextLine`]s in
//! screen pixels and drawn by the renderer.

use glam::Vec2;

use crate::color::Color;
use crate::config::GameConfig;
use crate::geometry::Rect;
use crate::level::Level;
use crate::world::World;

const LEVEL_BUTTONS_PER_ROW: u32 = 5;
const DESCRIPTION_COLOR: Color = Color::rgb(200, 200, 255);
const HUD_DESCRIPTION_COLOR: Color = Color::rgb(200, 200, 200);
const DISABLED_COLOR: Color = Color::rgb(30, 30, 30);
const COMPLETE_DIM: Color = Color::rgb(100, 255, 100);
const COMPLETE_BRIGHT: Color = Color::rgb(255, 255, 100);
const VICTORY_DIM: Color = Color::rgb(255, 255, 100);
pub const CONTROLS_HINT: &str =
    "WASD: Move | Mouse: Aim | Space: Toggle Beam | R: Reset | ESC: Pause";

/// What a button does when clicked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiAction {
    StartGame,
    ShowLevelSelect,
    Quit,
    Resume,
    RestartLevel,
    MainMenu,
    SelectLevel(u32),
    Back,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Palette {
    base: Color,
    hover: Color,
}

const GREEN_BUTTON: Palette = Palette {
    base: Color::rgb(50, 100, 50),
    hover: Color::rgb(70, 150, 70),
};
const BLUE_BUTTON: Palette = Palette {
    base: Color::rgb(50, 50, 100),
    hover: Color::rgb(70, 70, 150),
};
const RED_BUTTON: Palette = Palette {
    base: Color::rgb(100, 50, 50),
    hover: Color::rgb(150, 70, 70),
};

#[derive(Debug, Clone, PartialEq)]
pub struct Button {
    pub rect: Rect,
    pub label: String,
    pub action: UiAction,
    pub color: Color,
    pub hover_color: Color,
    pub text_color: Color,
    pub enabled: bool,
    pub hovered: bool,
}

impl Button {
    fn new(rect: Rect, label: impl Into<String>, action: UiAction, palette: Palette) -> Self {
        Self {
            rect,
            label: label.into(),
            action,
            color: palette.base,
            hover_color: palette.hover,
            text_color: Color::WHITE,
            enabled: true,
            hovered: false,
        }
    }

    fn disabled(mut self) -> Self {
        self.enabled = false;
        self.color = DISABLED_COLOR;
        self.hover_color = DISABLED_COLOR;
        self.text_color = Color::GRAY;
        self
    }

    pub fn fill_color(&self) -> Color {
        if self.hovered {
            self.hover_color
        } else {
            self.color
        }
    }
}

/// A set of buttons shown together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Menu {
    buttons: Vec<Button>,
}

impl Menu {
    /// Start Game, Level Select and Quit stacked below the screen center.
    pub fn main(config: &GameConfig) -> Self {
        Self::stacked(
            config,
            [
                ("Start Game", UiAction::StartGame, GREEN_BUTTON),
                ("Level Select", UiAction::ShowLevelSelect, BLUE_BUTTON),
                ("Quit", UiAction::Quit, RED_BUTTON),
            ],
        )
    }

    pub fn pause(config: &GameConfig) -> Self {
        Self::stacked(
            config,
            [
                ("Resume", UiAction::Resume, GREEN_BUTTON),
                ("Restart Level", UiAction::RestartLevel, BLUE_BUTTON),
                ("Main Menu", UiAction::MainMenu, RED_BUTTON),
            ],
        )
    }

    /// Grid of level buttons, five per row. Levels past `unlocked` are shown
    /// but cannot be clicked.
    pub fn level_select(config: &GameConfig, level_count: u32, unlocked: u32) -> Self {
        let width = config.ui_button_width / 2.0;
        let height = config.ui_button_height;
        let padding = config.ui_padding;
        let per_row = LEVEL_BUTTONS_PER_ROW as f32;
        let start_x = config.screen_width / 2.0 - (width * per_row + padding * (per_row - 1.0)) / 2.0;
        let start_y = config.screen_height / 3.0;

        let mut buttons: Vec<Button> = (1..=level_count)
            .map(|number| {
                let row = ((number - 1) / LEVEL_BUTTONS_PER_ROW) as f32;
                let col = ((number - 1) % LEVEL_BUTTONS_PER_ROW) as f32;
                let rect = Rect::from_top_left(
                    start_x + col * (width + padding),
                    start_y + row * (height + padding),
                    width,
                    height,
                );
                let button = Button::new(
                    rect,
                    number.to_string(),
                    UiAction::SelectLevel(number),
                    GREEN_BUTTON,
                );
                if number <= unlocked {
                    button
                } else {
                    button.disabled()
                }
            })
            .collect();

        buttons.push(Button::new(
            Rect::from_top_left(
                config.screen_width / 2.0 - width,
                config.screen_height - height - padding * 2.0,
                width * 2.0,
                height,
            ),
            "Back",
            UiAction::Back,
            RED_BUTTON,
        ));
        Self { buttons }
    }

    fn stacked<const N: usize>(config: &GameConfig, entries: [(&str, UiAction, Palette); N]) -> Self {
        let width = config.ui_button_width;
        let height = config.ui_button_height;
        let x = config.screen_width / 2.0 - width / 2.0;
        let buttons = entries
            .into_iter()
            .enumerate()
            .map(|(index, (label, action, palette))| {
                let y = config.screen_height / 2.0 + index as f32 * (height + config.ui_padding);
                Button::new(Rect::from_top_left(x, y, width, height), label, action, palette)
            })
            .collect();
        Self { buttons }
    }

    pub fn buttons(&self) -> &[Button] {
        &self.buttons
    }

    /// Updates hover flags for the cursor at `point`.
    pub fn hover(&mut self, point: Vec2) {
        for button in &mut self.buttons {
            button.hovered = button.enabled && button.rect.contains(point);
        }
    }

    pub fn hovered(&self) -> Option<&Button> {
        self.buttons.iter().find(|button| button.hovered)
    }

    /// Action of the enabled button under `point`.
    pub fn click(&mut self, point: Vec2) -> Option<UiAction> {
        self.hover(point);
        self.hovered().map(|button| button.action)
    }
}

/// How a [`TextLine`] is placed relative to its position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    TopLeft,
    Center,
    BottomLeft,
    BottomRight,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub text: String,
    pub position: Vec2,
    pub anchor: Anchor,
    pub color: Color,
    /// Cap height in pixels.
    pub size: f32,
}

impl TextLine {
    pub fn new(text: impl Into<String>, position: Vec2, anchor: Anchor, color: Color, size: f32) -> Self {
        Self {
            text: text.into(),
            position,
            anchor,
            color,
            size,
        }
    }
}

pub fn level_heading(level: &Level) -> String {
    format!("Level {}: {}", level.number, level.name)
}

/// Level name, description, checkpoint progress and the controls reminder.
pub fn hud_lines(level: &Level, world: &World, config: &GameConfig) -> Vec<TextLine> {
    let font = config.ui_font_size;
    let padding = config.ui_padding;
    vec![
        TextLine::new(
            level_heading(level),
            Vec2::splat(padding),
            Anchor::TopLeft,
            Color::WHITE,
            font,
        ),
        TextLine::new(
            level.description.clone(),
            Vec2::new(padding, padding + font + 5.0),
            Anchor::TopLeft,
            HUD_DESCRIPTION_COLOR,
            font * 0.75,
        ),
        TextLine::new(
            format!(
                "Checkpoints: {}/{}",
                world.activated_checkpoint_count(),
                world.checkpoint_count()
            ),
            Vec2::new(config.screen_width - padding, padding + font),
            Anchor::BottomRight,
            Color::WHITE,
            font * 0.75,
        ),
        TextLine::new(
            CONTROLS_HINT,
            Vec2::new(padding, config.screen_height - padding),
            Anchor::BottomLeft,
            Color::GRAY,
            font * 0.6,
        ),
    ]
}

pub fn main_menu_lines(config: &GameConfig) -> Vec<TextLine> {
    let center_x = config.screen_width / 2.0;
    let title_y = config.screen_height / 4.0;
    vec![
        TextLine::new(
            config.title.clone(),
            Vec2::new(center_x, title_y),
            Anchor::Center,
            Color::WHITE,
            config.ui_font_size * 2.0,
        ),
        TextLine::new(
            "A Puzzle Game of Light and Reflection",
            Vec2::new(center_x, title_y + 50.0),
            Anchor::Center,
            DESCRIPTION_COLOR,
            config.ui_font_size * 0.75,
        ),
        TextLine::new(
            concat!("v", env!("CARGO_PKG_VERSION")),
            config.screen_size() - Vec2::splat(config.ui_padding),
            Anchor::BottomRight,
            Color::GRAY,
            config.ui_font_size * 0.6,
        ),
    ]
}

pub fn pause_lines(config: &GameConfig) -> Vec<TextLine> {
    vec![title(config, "Paused", config.screen_height / 4.0, Color::WHITE)]
}

pub fn level_select_lines(config: &GameConfig) -> Vec<TextLine> {
    vec![title(config, "Select Level", config.screen_height / 6.0, Color::WHITE)]
}

/// Level complete highlight, green at `pulse` 0 and yellow at 1.
pub fn complete_glow(pulse: f32) -> Color {
    COMPLETE_BRIGHT.mix(COMPLETE_DIM, pulse.clamp(0.0, 1.0))
}

/// Game over highlight, yellow at `pulse` 0 and white at 1.
pub fn victory_gold(pulse: f32) -> Color {
    Color::WHITE.mix(VICTORY_DIM, pulse.clamp(0.0, 1.0))
}

/// `pulse` in [0, 1] brightens the title.
pub fn level_complete_lines(
    config: &GameConfig,
    level: &Level,
    pulse: f32,
    show_prompt: bool,
) -> Vec<TextLine> {
    let center_x = config.screen_width / 2.0;
    let base_y = config.screen_height / 3.0;
    let glow = complete_glow(pulse);
    let mut lines = vec![
        title(config, "Level Complete!", base_y, glow),
        TextLine::new(
            level_heading(level),
            Vec2::new(center_x, base_y + 80.0),
            Anchor::Center,
            Color::WHITE,
            config.ui_font_size,
        ),
        TextLine::new(
            level.description.clone(),
            Vec2::new(center_x, base_y + 120.0),
            Anchor::Center,
            DESCRIPTION_COLOR,
            config.ui_font_size * 0.75,
        ),
    ];
    if let Some(best) = level.best_time {
        lines.push(TextLine::new(
            format!("Best time: {:.1}s", best.as_secs_f32()),
            Vec2::new(center_x, base_y + 150.0),
            Anchor::Center,
            Color::GRAY,
            config.ui_font_size * 0.6,
        ));
    }
    if show_prompt {
        lines.push(TextLine::new(
            "Press any key to continue",
            Vec2::new(center_x, base_y + 180.0),
            Anchor::Center,
            Color::WHITE,
            config.ui_font_size * 0.75,
        ));
    }
    lines
}

pub fn game_over_lines(config: &GameConfig, pulse: f32, show_prompt: bool) -> Vec<TextLine> {
    let center_x = config.screen_width / 2.0;
    let base_y = config.screen_height / 3.0;
    let gold = victory_gold(pulse);
    let mut lines = vec![
        title(config, "Congratulations!", base_y, gold),
        TextLine::new(
            "You have mastered the Light Weaver!",
            Vec2::new(center_x, base_y + 80.0),
            Anchor::Center,
            Color::WHITE,
            config.ui_font_size,
        ),
        TextLine::new(
            "You have completed all levels and become a true Light Weaver.",
            Vec2::new(center_x, base_y + 120.0),
            Anchor::Center,
            DESCRIPTION_COLOR,
            config.ui_font_size * 0.6,
        ),
    ];
    if show_prompt {
        lines.push(TextLine::new(
            "Press any key to return to menu",
            Vec2::new(center_x, base_y + 180.0),
            Anchor::Center,
            Color::WHITE,
            config.ui_font_size * 0.75,
        ));
    }
    lines
}

fn title(config: &GameConfig, text: &str, y: f32, color: Color) -> TextLine {
    TextLine::new(
        text,
        Vec2::new(config.screen_width / 2.0, y),
        Anchor::Center,
        color,
        config.ui_font_size * 2.0,
    )
}
