use std::collections::HashSet;

use glam::Vec2;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Identifier for a physical keyboard key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyCode {
    Named(NamedKey),
    Character(char),
    Digit(u8),
    Function(u8),
}

impl KeyCode {
    pub fn from_name(name: &str) -> Option<Self> {
        if let Some(key) = parse_named_key(name) {
            return Some(key);
        }
        let mut chars = name.chars();
        if let (Some(ch), None) = (chars.next(), chars.next()) {
            if ch.is_ascii_alphabetic() {
                return Some(Self::Character(ch.to_ascii_uppercase()));
            }
            if ch.is_ascii_digit() {
                return Some(Self::Digit(ch as u8 - b'0'));
            }
        }
        if let Some(function) = name.strip_prefix('F').or_else(|| name.strip_prefix('f')) {
            if let Ok(index) = function.parse::<u8>() {
                if (1..=25).contains(&index) {
                    return Some(Self::Function(index));
                }
            }
        }
        None
    }

    pub const fn key(ch: char) -> Self {
        Self::Character(ch)
    }
}

fn parse_named_key(name: &str) -> Option<KeyCode> {
    use NamedKey::*;
    let key = match name {
        "Space" => Space,
        "Enter" | "Return" => Enter,
        "Tab" => Tab,
        "Left" => Left,
        "Right" => Right,
        "Up" => Up,
        "Down" => Down,
        "Escape" | "Esc" => Escape,
        "Backspace" => Backspace,
        "LeftShift" | "LShift" => LeftShift,
        "RightShift" | "RShift" => RightShift,
        "LeftCtrl" | "LControl" => LeftCtrl,
        "RightCtrl" | "RControl" => RightCtrl,
        _ => return None,
    };
    Some(KeyCode::Named(key))
}

/// Friendly names for the non-character keys the game understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NamedKey {
    Space,
    Enter,
    Tab,
    Left,
    Right,
    Up,
    Down,
    Escape,
    Backspace,
    LeftShift,
    RightShift,
    LeftCtrl,
    RightCtrl,
}

/// Identifier for a mouse button (left button is zero).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MouseButton(u8);

impl MouseButton {
    pub const LEFT: Self = Self(0);
    pub const RIGHT: Self = Self(1);

    pub fn new(index: u8) -> Self {
        Self(index)
    }

    pub fn index(self) -> u8 {
        self.0
    }
}

/// Discrete input edge delivered to the game state machine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    KeyPressed(KeyCode),
    MousePressed { button: MouseButton, position: Vec2 },
}

/// Thread-safe snapshot of held keys, buttons and the cursor position.
#[derive(Debug, Default)]
pub struct InputState {
    keys: RwLock<HashSet<KeyCode>>,
    mouse_buttons: RwLock<HashSet<MouseButton>>,
    mouse_position: RwLock<Vec2>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_key_down(&self, key: KeyCode) {
        self.keys.write().insert(key);
    }

    pub fn set_key_up(&self, key: KeyCode) {
        self.keys.write().remove(&key);
    }

    pub fn set_mouse_button_down(&self, button: MouseButton) {
        self.mouse_buttons.write().insert(button);
    }

    pub fn set_mouse_button_up(&self, button: MouseButton) {
        self.mouse_buttons.write().remove(&button);
    }

    pub fn set_mouse_position(&self, position: Vec2) {
        *self.mouse_position.write() = position;
    }

    pub fn is_key_down(&self, key: KeyCode) -> bool {
        self.keys.read().contains(&key)
    }

    pub fn is_any_key_down(&self, keys: &[KeyCode]) -> bool {
        let held = self.keys.read();
        keys.iter().any(|key| held.contains(key))
    }

    pub fn is_mouse_button_down(&self, button: MouseButton) -> bool {
        self.mouse_buttons.read().contains(&button)
    }

    pub fn mouse_position(&self) -> Vec2 {
        *self.mouse_position.read()
    }

    /// Movement requested by the currently held keys.
    pub fn movement(&self, controls: &Controls) -> Movement {
        Movement {
            left: self.is_any_key_down(&controls.left),
            right: self.is_any_key_down(&controls.right),
            up: self.is_any_key_down(&controls.up),
            down: self.is_any_key_down(&controls.down),
        }
    }
}

/// Directional keys held during a frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Movement {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
}

impl Movement {
    pub const NONE: Self = Self {
        left: false,
        right: false,
        up: false,
        down: false,
    };

    /// Unscaled axis values in screen space (y grows downward).
    pub fn axis(self) -> Vec2 {
        let mut axis = Vec2::ZERO;
        if self.left {
            axis.x -= 1.0;
        }
        if self.right {
            axis.x += 1.0;
        }
        if self.up {
            axis.y -= 1.0;
        }
        if self.down {
            axis.y += 1.0;
        }
        axis
    }
}

/// Actions a key can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    MoveLeft,
    MoveRight,
    MoveUp,
    MoveDown,
    ToggleBeam,
    Reset,
    Pause,
}

impl Action {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "move_left" => Self::MoveLeft,
            "move_right" => Self::MoveRight,
            "move_up" => Self::MoveUp,
            "move_down" => Self::MoveDown,
            "toggle_beam" => Self::ToggleBeam,
            "reset" => Self::Reset,
            "pause" => Self::Pause,
            _ => return None,
        })
    }
}

/// Key bindings. Every action accepts several keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Controls {
    pub left: Vec<KeyCode>,
    pub right: Vec<KeyCode>,
    pub up: Vec<KeyCode>,
    pub down: Vec<KeyCode>,
    pub toggle_beam: Vec<KeyCode>,
    pub reset: Vec<KeyCode>,
    pub pause: Vec<KeyCode>,
}

impl Default for Controls {
    fn default() -> Self {
        Self {
            left: vec![KeyCode::Named(NamedKey::Left), KeyCode::key('A')],
            right: vec![KeyCode::Named(NamedKey::Right), KeyCode::key('D')],
            up: vec![KeyCode::Named(NamedKey::Up), KeyCode::key('W')],
            down: vec![KeyCode::Named(NamedKey::Down), KeyCode::key('S')],
            toggle_beam: vec![KeyCode::Named(NamedKey::Space)],
            reset: vec![KeyCode::key('R')],
            pause: vec![KeyCode::Named(NamedKey::Escape)],
        }
    }
}

impl Controls {
    pub fn keys_mut(&mut self, action: Action) -> &mut Vec<KeyCode> {
        match action {
            Action::MoveLeft => &mut self.left,
            Action::MoveRight => &mut self.right,
            Action::MoveUp => &mut self.up,
            Action::MoveDown => &mut self.down,
            Action::ToggleBeam => &mut self.toggle_beam,
            Action::Reset => &mut self.reset,
            Action::Pause => &mut self.pause,
        }
    }

    /// Resolves a pressed key to the non-movement action it triggers.
    pub fn action_for(&self, key: KeyCode) -> Option<Action> {
        if self.pause.contains(&key) {
            Some(Action::Pause)
        } else if self.reset.contains(&key) {
            Some(Action::Reset)
        } else if self.toggle_beam.contains(&key) {
            Some(Action::ToggleBeam)
        } else {
            None
        }
    }
}
