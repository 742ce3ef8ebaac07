use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use roxmltree::{Document, Node};
use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::input::{Action, Controls, KeyCode};

/// Tunable game constants. Distances are in screen pixels, speeds in pixels
/// per frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    pub title: String,
    pub screen_width: f32,
    pub screen_height: f32,
    pub fps: u32,

    pub player_radius: f32,
    pub player_speed: f32,
    pub player_color: Color,
    pub player_glow_color: Color,
    pub player_glow_radius: f32,

    pub beam_width: u32,
    pub beam_max_length: f32,
    pub beam_fade_rate: f32,
    pub max_reflections: u32,

    pub mirror_width: f32,
    pub mirror_height: f32,
    pub prism_size: f32,
    pub filter_size: f32,
    pub checkpoint_size: f32,
    pub shadow_creature_size: f32,

    pub ui_font_size: f32,
    pub ui_button_width: f32,
    pub ui_button_height: f32,
    pub ui_padding: f32,

    pub level_transition_delay_ms: u64,
    pub volume_music: f32,
    pub volume_sfx: f32,

    pub controls: Controls,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            title: "Light Weaver".to_string(),
            screen_width: 1280.0,
            screen_height: 720.0,
            fps: 60,
            player_radius: 15.0,
            player_speed: 5.0,
            player_color: Color::rgb(255, 255, 200),
            player_glow_color: Color::rgb(255, 255, 150),
            player_glow_radius: 30.0,
            beam_width: 3,
            beam_max_length: 2000.0,
            beam_fade_rate: 0.95,
            max_reflections: 10,
            mirror_width: 80.0,
            mirror_height: 8.0,
            prism_size: 60.0,
            filter_size: 40.0,
            checkpoint_size: 40.0,
            shadow_creature_size: 50.0,
            ui_font_size: 24.0,
            ui_button_width: 200.0,
            ui_button_height: 50.0,
            ui_padding: 20.0,
            level_transition_delay_ms: 2000,
            volume_music: 0.5,
            volume_sfx: 0.7,
            controls: Controls::default(),
        }
    }
}

impl GameConfig {
    /// Parses a `<config>` document. Every child element overrides the field
    /// of the same name; omitted fields keep their defaults.
    pub fn from_xml(xml: &str) -> Result<Self> {
        let document = Document::parse(xml).context("invalid config XML")?;
        let root = document.root_element();
        if !root.has_tag_name("config") {
            return Err(anyhow!(
                "expected <config> root element, found <{}>",
                root.tag_name().name()
            ));
        }

        let mut config = Self::default();
        for node in root.children().filter(Node::is_element) {
            let tag = node.tag_name().name();
            if tag == "controls" {
                apply_controls(&node, &mut config.controls)?;
                continue;
            }
            let text = node.text().map(str::trim).unwrap_or_default();
            config
                .apply(tag, text)
                .with_context(|| format!("invalid value for <{tag}>"))?;
        }
        config.validate()?;
        Ok(config)
    }

    fn apply(&mut self, tag: &str, text: &str) -> Result<()> {
        match tag {
            "title" => self.title = text.to_string(),
            "screen_width" => self.screen_width = parse(text)?,
            "screen_height" => self.screen_height = parse(text)?,
            "fps" => self.fps = parse(text)?,
            "player_radius" => self.player_radius = parse(text)?,
            "player_speed" => self.player_speed = parse(text)?,
            "player_color" => self.player_color = Color::parse(text)?,
            "player_glow_color" => self.player_glow_color = Color::parse(text)?,
            "player_glow_radius" => self.player_glow_radius = parse(text)?,
            "beam_width" => self.beam_width = parse(text)?,
            "beam_max_length" => self.beam_max_length = parse(text)?,
            "beam_fade_rate" => self.beam_fade_rate = parse(text)?,
            "max_reflections" => self.max_reflections = parse(text)?,
            "mirror_width" => self.mirror_width = parse(text)?,
            "mirror_height" => self.mirror_height = parse(text)?,
            "prism_size" => self.prism_size = parse(text)?,
            "filter_size" => self.filter_size = parse(text)?,
            "checkpoint_size" => self.checkpoint_size = parse(text)?,
            "shadow_creature_size" => self.shadow_creature_size = parse(text)?,
            "ui_font_size" => self.ui_font_size = parse(text)?,
            "ui_button_width" => self.ui_button_width = parse(text)?,
            "ui_button_height" => self.ui_button_height = parse(text)?,
            "ui_padding" => self.ui_padding = parse(text)?,
            "level_transition_delay_ms" => self.level_transition_delay_ms = parse(text)?,
            "volume_music" => self.volume_music = parse::<f32>(text)?.clamp(0.0, 1.0),
            "volume_sfx" => self.volume_sfx = parse::<f32>(text)?.clamp(0.0, 1.0),
            other => return Err(anyhow!("unknown config element <{other}>")),
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.screen_width <= 0.0 || self.screen_height <= 0.0 {
            return Err(anyhow!("screen size must be positive"));
        }
        if self.fps == 0 {
            return Err(anyhow!("fps must be at least 1"));
        }
        if self.beam_max_length <= 0.0 {
            return Err(anyhow!("beam_max_length must be positive"));
        }
        Ok(())
    }

    pub fn frame_duration(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.fps))
    }

    pub fn level_transition_delay(&self) -> Duration {
        Duration::from_millis(self.level_transition_delay_ms)
    }

    pub fn screen_size(&self) -> glam::Vec2 {
        glam::Vec2::new(self.screen_width, self.screen_height)
    }
}

fn parse<T>(text: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    text.parse::<T>()
        .map_err(|err| anyhow!("failed to parse {text:?}: {err}"))
}

/// `<controls><bind action="toggle_beam">Enter</bind></controls>`. The first
/// binding of an action replaces its defaults; later ones add to it.
fn apply_controls(node: &Node<'_, '_>, controls: &mut Controls) -> Result<()> {
    let mut rebound = Vec::new();
    for bind in node.children().filter(|child| child.has_tag_name("bind")) {
        let action_name = bind
            .attribute("action")
            .ok_or_else(|| anyhow!("<bind> is missing the action attribute"))?;
        let action = Action::from_name(action_name)
            .ok_or_else(|| anyhow!("unknown action {action_name:?}"))?;
        let key_name = bind.text().map(str::trim).unwrap_or_default();
        let key = KeyCode::from_name(key_name)
            .ok_or_else(|| anyhow!("unknown key {key_name:?} for {action_name}"))?;

        let keys = controls.keys_mut(action);
        if !rebound.contains(&action) {
            keys.clear();
            rebound.push(action);
        }
        keys.push(key);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::NamedKey;

    #[test]
    fn overrides_selected_fields() {
        let config = GameConfig::from_xml(
            r#"<config>
                <fps>30</fps>
                <player_color>red</player_color>
                <volume_music>4.0</volume_music>
            </config>"#,
        )
        .unwrap();
        assert_eq!(config.fps, 30);
        assert_eq!(config.player_color, Color::RED);
        assert_eq!(config.volume_music, 1.0);
        assert_eq!(config.screen_width, 1280.0);
    }

    #[test]
    fn rebinds_controls() {
        let config = GameConfig::from_xml(
            r#"<config><controls>
                <bind action="toggle_beam">Enter</bind>
                <bind action="toggle_beam">F</bind>
            </controls></config>"#,
        )
        .unwrap();
        assert_eq!(
            config.controls.toggle_beam,
            vec![KeyCode::Named(NamedKey::Enter), KeyCode::Character('F')]
        );
        assert_eq!(config.controls.reset, vec![KeyCode::Character('R')]);
    }

    #[test]
    fn unknown_elements_are_rejected() {
        assert!(GameConfig::from_xml("<config><gravity>9.8</gravity></config>").is_err());
        assert!(GameConfig::from_xml("<settings/>").is_err());
        assert!(GameConfig::from_xml("<config><fps>0</fps></config>").is_err());
    }
}
