use std::time::Duration;

use anyhow::{anyhow, Result};
use glam::Vec2;
use log::{info, warn};

use crate::audio::{AudioManager, MusicTrack, SoundId, DEFAULT_FADE};
use crate::config::GameConfig;
use crate::input::{Action, InputEvent, InputState, MouseButton};
use crate::level::{Level, LevelManager};
use crate::objects::ObjectKind;
use crate::ui::{Menu, UiAction};
use crate::world::{World, WorldEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    Menu,
    LevelSelect,
    Playing,
    Paused,
    LevelComplete,
    GameOver,
}

impl GameState {
    pub fn name(self) -> &'static str {
        match self {
            GameState::Menu => "menu",
            GameState::LevelSelect => "level_select",
            GameState::Playing => "playing",
            GameState::Paused => "paused",
            GameState::LevelComplete => "level_complete",
            GameState::GameOver => "game_over",
        }
    }

    /// States that draw the playfield.
    pub fn shows_world(self) -> bool {
        matches!(
            self,
            GameState::Playing | GameState::Paused | GameState::LevelComplete
        )
    }
}

/// Top-level state machine tying levels, the running world, menus and audio
/// together.
#[derive(Debug)]
pub struct Game {
    config: GameConfig,
    levels: LevelManager,
    audio: AudioManager,
    state: GameState,
    world: Option<World>,
    main_menu: Menu,
    pause_menu: Menu,
    level_select: Menu,
    completed_for: Option<Duration>,
    clock: Duration,
    quit_requested: bool,
}

impl Game {
    pub fn new(config: GameConfig, levels: LevelManager, mut audio: AudioManager) -> Self {
        audio.play_music(MusicTrack::Menu);
        let main_menu = Menu::main(&config);
        let pause_menu = Menu::pause(&config);
        let level_select =
            Menu::level_select(&config, levels.max_level(), levels.max_level_reached());
        Self {
            config,
            levels,
            audio,
            state: GameState::Menu,
            world: None,
            main_menu,
            pause_menu,
            level_select,
            completed_for: None,
            clock: Duration::ZERO,
            quit_requested: false,
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn levels(&self) -> &LevelManager {
        &self.levels
    }

    pub fn audio(&self) -> &AudioManager {
        &self.audio
    }

    pub fn world(&self) -> Option<&World> {
        self.world.as_ref()
    }

    pub fn world_mut(&mut self) -> Option<&mut World> {
        self.world.as_mut()
    }

    /// Level the running world was loaded from.
    pub fn current_level(&self) -> Option<&Level> {
        self.world
            .as_ref()
            .and_then(|world| self.levels.level(world.level_number()))
    }

    /// Total time the game has been updated, used for animations.
    pub fn clock(&self) -> Duration {
        self.clock
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    /// Buttons shown in the current state, if any.
    pub fn active_menu(&self) -> Option<&Menu> {
        match self.state {
            GameState::Menu => Some(&self.main_menu),
            GameState::LevelSelect => Some(&self.level_select),
            GameState::Paused => Some(&self.pause_menu),
            _ => None,
        }
    }

    fn active_menu_mut(&mut self) -> Option<&mut Menu> {
        match self.state {
            GameState::Menu => Some(&mut self.main_menu),
            GameState::LevelSelect => Some(&mut self.level_select),
            GameState::Paused => Some(&mut self.pause_menu),
            _ => None,
        }
    }

    /// Starts playing level 1.
    pub fn start_game(&mut self) -> Result<()> {
        self.start_level(1)
    }

    /// Unlocks and starts `number` directly.
    pub fn start_level(&mut self, number: u32) -> Result<()> {
        if self.levels.level(number).is_none() {
            return Err(anyhow!(
                "level {number} does not exist (the pack has {} levels)",
                self.levels.max_level()
            ));
        }
        self.levels.unlock_through(number);
        self.levels.set_level(number)?;
        self.load_current_level();
        self.audio.fade_music(MusicTrack::Gameplay);
        Ok(())
    }

    fn load_current_level(&mut self) {
        let Some(level) = self.levels.current() else {
            warn!("no level {} to load", self.levels.current_number());
            return;
        };
        let world = World::load(level, &self.config);
        let haunted = world
            .objects()
            .iter()
            .any(|object| object.kind() == ObjectKind::ShadowCreature);
        if haunted {
            if self.audio.ambient() != Some(SoundId::ShadowCreature) {
                self.audio
                    .play_ambient_loop(SoundId::ShadowCreature, DEFAULT_FADE);
            }
        } else {
            self.audio.stop_ambient(DEFAULT_FADE);
        }
        self.world = Some(world);
        self.completed_for = None;
        self.state = GameState::Playing;
    }

    fn show_level_select(&mut self) {
        self.level_select = Menu::level_select(
            &self.config,
            self.levels.max_level(),
            self.levels.max_level_reached(),
        );
        self.state = GameState::LevelSelect;
    }

    fn return_to_menu(&mut self) {
        self.state = GameState::Menu;
        self.audio.unpause_music();
        self.audio.stop_ambient(DEFAULT_FADE);
        self.audio.fade_music(MusicTrack::Menu);
    }

    pub fn handle_event(&mut self, event: InputEvent, input: &InputState) {
        match self.state {
            GameState::Menu | GameState::LevelSelect | GameState::Paused => {
                self.handle_menu_event(event);
            }
            GameState::LevelComplete => self.try_level_transition(),
            GameState::GameOver => self.return_to_menu(),
            GameState::Playing => self.handle_play_event(event, input),
        }
    }

    fn handle_menu_event(&mut self, event: InputEvent) {
        match event {
            InputEvent::KeyPressed(key) => {
                if self.state == GameState::Paused
                    && self.config.controls.action_for(key) == Some(Action::Pause)
                {
                    self.resume();
                }
            }
            InputEvent::MousePressed { button, position } => {
                if button != MouseButton::LEFT {
                    return;
                }
                let Some(action) = self
                    .active_menu_mut()
                    .and_then(|menu| menu.click(position))
                else {
                    return;
                };
                self.audio.play_ui_sound(SoundId::ButtonClick);
                self.apply_ui_action(action);
            }
        }
    }

    fn apply_ui_action(&mut self, action: UiAction) {
        info!("menu action {action:?}");
        match action {
            UiAction::StartGame => {
                if let Err(err) = self.start_game() {
                    warn!("failed to start the game: {err:#}");
                }
            }
            UiAction::ShowLevelSelect => self.show_level_select(),
            UiAction::Quit => self.quit_requested = true,
            UiAction::Resume => self.resume(),
            UiAction::RestartLevel => {
                self.audio.unpause_music();
                self.load_current_level();
            }
            UiAction::MainMenu | UiAction::Back => self.return_to_menu(),
            UiAction::SelectLevel(number) => match self.levels.set_level(number) {
                Ok(()) => {
                    self.load_current_level();
                    self.audio.fade_music(MusicTrack::Gameplay);
                }
                Err(err) => warn!("cannot select level: {err}"),
            },
        }
    }

    fn resume(&mut self) {
        self.state = GameState::Playing;
        self.audio.unpause_music();
    }

    fn handle_play_event(&mut self, event: InputEvent, input: &InputState) {
        match event {
            InputEvent::KeyPressed(key) => match self.config.controls.action_for(key) {
                Some(Action::Pause) => {
                    self.state = GameState::Paused;
                    self.audio.pause_music();
                }
                Some(Action::Reset) => self.load_current_level(),
                Some(Action::ToggleBeam) => {
                    let Some(world) = self.world.as_mut() else {
                        return;
                    };
                    let sound = if world.toggle_beam(input.mouse_position()) {
                        SoundId::BeamOn
                    } else {
                        SoundId::BeamOff
                    };
                    self.audio.play_sound_with_context(sound, "beam");
                }
                _ => {}
            },
            InputEvent::MousePressed { button, position } => {
                if button != MouseButton::LEFT {
                    return;
                }
                let Some(world) = self.world.as_mut() else {
                    return;
                };
                let listener = world.player().position();
                let Some(interaction) = world.interact_at(position) else {
                    return;
                };
                self.audio
                    .play_beam_interaction(interaction.kind, interaction.position, listener);
            }
        }
    }

    /// Advances the game by one step of `dt`.
    pub fn update(&mut self, dt: Duration, input: &InputState) {
        self.clock += dt;
        self.audio.update(dt);
        let pointer = input.mouse_position();

        match self.state {
            GameState::Menu | GameState::LevelSelect | GameState::Paused => {
                if let Some(menu) = self.active_menu_mut() {
                    menu.hover(pointer);
                }
            }
            GameState::Playing => self.update_playing(dt, input),
            GameState::LevelComplete => {
                if let Some(elapsed) = self.completed_for.as_mut() {
                    *elapsed += dt;
                }
                self.try_level_transition();
            }
            GameState::GameOver => {}
        }
    }

    fn update_playing(&mut self, dt: Duration, input: &InputState) {
        let movement = input.movement(&self.config.controls);
        let Some(world) = self.world.as_mut() else {
            return;
        };
        world.aim(input.mouse_position());
        let events = world.update(movement, dt);
        let listener = world.player().position();
        let complete = world.is_complete();

        for event in events {
            match event {
                WorldEvent::CheckpointActivated { position, .. } => {
                    self.audio.play_checkpoint_activation(position, listener);
                }
            }
        }

        if complete {
            self.complete_level();
        }
    }

    fn complete_level(&mut self) {
        let Some(world) = self.world.as_ref() else {
            return;
        };
        let time = world.elapsed();
        let number = world.level_number();
        let new_best = self.levels.mark_completed(time);
        info!(
            "level {number} complete in {:.2}s{}",
            time.as_secs_f32(),
            if new_best { " (new best)" } else { "" }
        );

        self.state = GameState::LevelComplete;
        self.completed_for = Some(Duration::ZERO);
        self.audio.stop_ambient(DEFAULT_FADE);
        self.audio.play_sound(SoundId::LevelComplete);
        if number == self.levels.max_level() {
            self.audio.fade_music(MusicTrack::Victory);
        }
    }

    /// Time spent on the level complete screen, if it is showing.
    pub fn completed_for(&self) -> Option<Duration> {
        self.completed_for
    }

    /// Moves on from the level complete screen once the transition delay
    /// has passed.
    fn try_level_transition(&mut self) {
        let Some(elapsed) = self.completed_for else {
            return;
        };
        if elapsed < self.config.level_transition_delay() {
            return;
        }
        if self.levels.advance_level() {
            self.load_current_level();
        } else {
            info!("all levels complete");
            self.completed_for = None;
            self.state = GameState::GameOver;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::tests::{full_assets, recording_manager, Played, RecordingBackend};
    use crate::audio::Channel;
    use crate::input::{KeyCode, NamedKey};

    const FRAME: Duration = Duration::from_millis(16);

    const PACK: &str = r#"
    <levels>
        <level number="1" name="One">
            <player_start>100 100</player_start>
            <checkpoint position="400 100" color="white"/>
        </level>
        <level number="2" name="Two">
            <player_start>100 300</player_start>
            <mirror position="400 300" angle="45"/>
            <checkpoint position="400 600" color="white"/>
        </level>
    </levels>
    "#;

    fn game() -> (Game, RecordingBackend, tempfile::TempDir) {
        game_with(PACK)
    }

    fn game_with(pack: &str) -> (Game, RecordingBackend, tempfile::TempDir) {
        let dir = full_assets();
        let (audio, backend) = recording_manager(&dir);
        let levels = LevelManager::from_xml(pack).unwrap();
        (Game::new(GameConfig::default(), levels, audio), backend, dir)
    }

    fn key(key: KeyCode) -> InputEvent {
        InputEvent::KeyPressed(key)
    }

    fn click(position: Vec2) -> InputEvent {
        InputEvent::MousePressed {
            button: MouseButton::LEFT,
            position,
        }
    }

    fn space() -> InputEvent {
        key(KeyCode::Named(NamedKey::Space))
    }

    fn escape() -> InputEvent {
        key(KeyCode::Named(NamedKey::Escape))
    }

    #[test]
    fn start_button_begins_level_one() {
        let (mut game, backend, _dir) = game();
        let input = InputState::new();
        assert_eq!(game.state(), GameState::Menu);
        game.handle_event(click(Vec2::new(640.0, 380.0)), &input);
        assert_eq!(game.state(), GameState::Playing);
        assert_eq!(game.current_level().unwrap().name, "One");
        assert_eq!(backend.sounds(), vec![SoundId::ButtonClick]);
    }

    #[test]
    fn completing_a_level_waits_for_the_transition_delay() {
        let (mut game, backend, _dir) = game();
        let input = InputState::new();
        input.set_mouse_position(Vec2::new(500.0, 100.0));
        game.start_game().unwrap();
        game.handle_event(space(), &input);
        game.update(FRAME, &input);
        assert_eq!(game.state(), GameState::LevelComplete);
        assert!(game.levels().level(1).unwrap().completed);
        assert_eq!(game.levels().level(1).unwrap().best_time, Some(FRAME));
        assert!(backend.sounds().contains(&SoundId::CheckpointActivate));
        assert!(backend.sounds().contains(&SoundId::LevelComplete));

        // keys before the delay do not skip ahead
        game.handle_event(space(), &input);
        assert_eq!(game.state(), GameState::LevelComplete);

        game.update(Duration::from_millis(2000), &input);
        assert_eq!(game.state(), GameState::Playing);
        assert_eq!(game.current_level().unwrap().number, 2);
        assert_eq!(game.levels().max_level_reached(), 2);
    }

    #[test]
    fn finishing_the_last_level_ends_the_game() {
        let (mut game, backend, _dir) = game();
        let input = InputState::new();
        game.start_level(2).unwrap();
        // aim at the mirror, which sends the beam down into the checkpoint
        input.set_mouse_position(Vec2::new(400.0, 300.0));
        game.handle_event(space(), &input);
        game.update(FRAME, &input);
        assert_eq!(game.state(), GameState::LevelComplete);
        game.update(Duration::from_secs(3), &input);
        assert_eq!(game.state(), GameState::GameOver);
        assert_eq!(backend.tracks().last(), Some(&MusicTrack::Victory));
        assert_eq!(game.audio().current_music(), Some(MusicTrack::Victory));

        game.handle_event(space(), &input);
        assert_eq!(game.state(), GameState::Menu);
        game.update(Duration::from_secs(2), &input);
        assert_eq!(backend.tracks(), vec![MusicTrack::Menu, MusicTrack::Victory, MusicTrack::Menu]);
    }

    #[test]
    fn shadow_levels_loop_the_creature_ambience() {
        let (mut game, backend, _dir) = game_with(
            r#"
            <levels>
                <level number="1" name="Haunted">
                    <player_start>100 100</player_start>
                    <shadow_creature position="700 500" speed="1" path="700 500; 700 600"/>
                    <checkpoint position="400 100" color="white"/>
                </level>
                <level number="2" name="Calm">
                    <player_start>100 100</player_start>
                    <checkpoint position="400 400" color="white"/>
                </level>
            </levels>
            "#,
        );
        let input = InputState::new();
        game.start_level(1).unwrap();
        assert_eq!(backend.loops(), vec![SoundId::ShadowCreature]);
        assert_eq!(game.audio().ambient(), Some(SoundId::ShadowCreature));

        // restarting keeps the running loop
        game.handle_event(key(KeyCode::key('R')), &input);
        assert_eq!(backend.loops(), vec![SoundId::ShadowCreature]);

        input.set_mouse_position(Vec2::new(500.0, 100.0));
        game.handle_event(space(), &input);
        game.update(FRAME, &input);
        assert_eq!(game.state(), GameState::LevelComplete);
        game.update(Duration::from_secs(2), &input);
        assert_eq!(game.current_level().unwrap().number, 2);
        assert_eq!(backend.stopped_channels(), vec![Channel::Ambient]);
        assert_eq!(game.audio().ambient(), None);
    }

    #[test]
    fn menu_clicks_use_the_ui_channel() {
        let (mut game, backend, _dir) = game();
        let input = InputState::new();
        game.handle_event(click(Vec2::new(640.0, 380.0)), &input);
        let channel = backend.log.lock().iter().find_map(|played| match played {
            Played::Sound(playback) => playback.channel,
            _ => None,
        });
        assert_eq!(channel, Some(Channel::Ui));
    }

    #[test]
    fn escape_pauses_and_resumes() {
        let (mut game, _backend, _dir) = game();
        let input = InputState::new();
        game.start_game().unwrap();
        game.update(Duration::from_secs(2), &input);
        game.handle_event(escape(), &input);
        assert_eq!(game.state(), GameState::Paused);
        assert!(game.audio().is_music_paused());
        game.handle_event(escape(), &input);
        assert_eq!(game.state(), GameState::Playing);
        assert!(!game.audio().is_music_paused());
    }

    #[test]
    fn pause_menu_restarts_the_level() {
        let (mut game, _backend, _dir) = game();
        let input = InputState::new();
        game.start_game().unwrap();
        input.set_key_down(KeyCode::key('D'));
        game.update(FRAME, &input);
        input.set_key_up(KeyCode::key('D'));
        assert_ne!(game.world().unwrap().player().position(), Vec2::new(100.0, 100.0));

        game.handle_event(escape(), &input);
        game.handle_event(click(Vec2::new(640.0, 455.0)), &input);
        assert_eq!(game.state(), GameState::Playing);
        assert_eq!(game.world().unwrap().player().position(), Vec2::new(100.0, 100.0));
    }

    #[test]
    fn clicking_a_mirror_plays_a_spatial_sound() {
        let (mut game, backend, _dir) = game();
        let input = InputState::new();
        game.start_level(2).unwrap();
        game.handle_event(click(Vec2::new(400.0, 300.0)), &input);
        assert_eq!(backend.sounds(), vec![SoundId::MirrorRotate]);
    }

    #[test]
    fn locked_levels_stay_locked_in_level_select() {
        let (mut game, _backend, _dir) = game();
        let input = InputState::new();
        game.handle_event(click(Vec2::new(640.0, 455.0)), &input);
        assert_eq!(game.state(), GameState::LevelSelect);
        let second = game.active_menu().unwrap().buttons()[1].rect.center;
        game.handle_event(click(second), &input);
        assert_eq!(game.state(), GameState::LevelSelect);
        let first = game.active_menu().unwrap().buttons()[0].rect.center;
        game.handle_event(click(first), &input);
        assert_eq!(game.state(), GameState::Playing);
    }

    #[test]
    fn quit_button_requests_exit() {
        let (mut game, _backend, _dir) = game();
        let input = InputState::new();
        game.handle_event(click(Vec2::new(640.0, 525.0)), &input);
        assert!(game.quit_requested());
    }

    #[test]
    fn unknown_level_is_an_error() {
        let (mut game, _backend, _dir) = game();
        assert!(game.start_level(9).is_err());
        assert_eq!(game.state(), GameState::Menu);
    }
}
