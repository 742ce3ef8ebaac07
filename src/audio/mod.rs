//! Sound effects and music.
//!
//! [`AudioManager`] owns the mixing decisions (which channel, how loud, which
//! side, fades) and hands finished requests to an [`AudioBackend`].
//! `RodioBackend` plays them on the default output device when the
//! `device-audio` feature is enabled; [`LogBackend`] only reports them.

#[cfg(feature = "device-audio")]
mod device;

#[cfg(feature = "device-audio")]
pub use device::RodioBackend;

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use glam::Vec2;
use log::{debug, info, warn};

use crate::objects::ObjectKind;

/// Default location of sound and music files, relative to the working directory.
pub const DEFAULT_ASSETS_DIR: &str = "assets/audio";
/// Distance at which spatial sounds become silent.
pub const SPATIAL_MAX_DISTANCE: f32 = 500.0;
pub const DEFAULT_FADE: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundId {
    BeamOn,
    BeamOff,
    MirrorRotate,
    FilterChange,
    BeamSplit,
    CheckpointActivate,
    LevelComplete,
    ButtonClick,
    ShadowCreature,
}

impl SoundId {
    pub const ALL: [SoundId; 9] = [
        SoundId::BeamOn,
        SoundId::BeamOff,
        SoundId::MirrorRotate,
        SoundId::FilterChange,
        SoundId::BeamSplit,
        SoundId::CheckpointActivate,
        SoundId::LevelComplete,
        SoundId::ButtonClick,
        SoundId::ShadowCreature,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SoundId::BeamOn => "beam_on",
            SoundId::BeamOff => "beam_off",
            SoundId::MirrorRotate => "mirror_rotate",
            SoundId::FilterChange => "filter_change",
            SoundId::BeamSplit => "beam_split",
            SoundId::CheckpointActivate => "checkpoint_activate",
            SoundId::LevelComplete => "level_complete",
            SoundId::ButtonClick => "button_click",
            SoundId::ShadowCreature => "shadow_creature",
        }
    }

    pub fn file_name(self) -> String {
        format!("{}.wav", self.name())
    }
}

impl fmt::Display for SoundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MusicTrack {
    Menu,
    Gameplay,
    Victory,
}

impl MusicTrack {
    pub const ALL: [MusicTrack; 3] = [MusicTrack::Menu, MusicTrack::Gameplay, MusicTrack::Victory];

    pub fn name(self) -> &'static str {
        match self {
            MusicTrack::Menu => "menu",
            MusicTrack::Gameplay => "gameplay",
            MusicTrack::Victory => "victory",
        }
    }

    pub fn file_name(self) -> String {
        format!("{}_music.mp3", self.name())
    }
}

/// Mixer channel reserved for one family of sounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Ui,
    Player,
    Beam,
    Objects,
    Ambient,
    Checkpoint,
    Victory,
    Misc,
}

impl Channel {
    /// Maps a context name to its channel; unknown contexts share `Misc`.
    pub fn for_context(context: &str) -> Self {
        match context {
            "ui" => Channel::Ui,
            "player" => Channel::Player,
            "beam" => Channel::Beam,
            "object" => Channel::Objects,
            "ambient" => Channel::Ambient,
            "checkpoint" => Channel::Checkpoint,
            "victory" => Channel::Victory,
            _ => Channel::Misc,
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

/// A fully mixed sound effect request.
#[derive(Debug, Clone, PartialEq)]
pub struct SoundPlayback {
    pub sound: SoundId,
    pub path: PathBuf,
    pub channel: Option<Channel>,
    pub volume: f32,
    pub left: f32,
    pub right: f32,
}

/// Device that actually produces sound.
pub trait AudioBackend {
    /// Plays a one-shot effect. A sound on a channel cuts off whatever that
    /// channel was playing.
    fn play_sound(&mut self, playback: &SoundPlayback);
    /// Repeats a sound on its channel until the channel is stopped.
    fn play_looping(&mut self, playback: &SoundPlayback);
    fn set_channel_volume(&mut self, channel: Channel, volume: f32);
    fn stop_channel(&mut self, channel: Channel);
    fn play_music(&mut self, track: MusicTrack, path: &Path);
    fn set_music_volume(&mut self, volume: f32);
    fn pause_music(&mut self);
    fn resume_music(&mut self);
    fn stop_music(&mut self);
}

/// Backend that only reports what would be played.
#[derive(Debug, Default)]
pub struct LogBackend;

impl AudioBackend for LogBackend {
    fn play_sound(&mut self, playback: &SoundPlayback) {
        debug!(
            "sound {} on {:?} at volume {:.2} (L {:.2} / R {:.2})",
            playback.sound, playback.channel, playback.volume, playback.left, playback.right
        );
    }

    fn play_looping(&mut self, playback: &SoundPlayback) {
        debug!(
            "looping {} on {:?} at volume {:.2}",
            playback.sound, playback.channel, playback.volume
        );
    }

    fn set_channel_volume(&mut self, _channel: Channel, _volume: f32) {}

    fn stop_channel(&mut self, channel: Channel) {
        debug!("channel {channel:?} stopped");
    }

    fn play_music(&mut self, track: MusicTrack, path: &Path) {
        info!("music '{}' from {}", track.name(), path.display());
    }

    fn set_music_volume(&mut self, _volume: f32) {}

    fn pause_music(&mut self) {
        debug!("music paused");
    }

    fn resume_music(&mut self) {
        debug!("music resumed");
    }

    fn stop_music(&mut self) {
        debug!("music stopped");
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Fade {
    from: f32,
    to: f32,
    duration: Duration,
    elapsed: Duration,
    /// Track started once the fade out completes.
    next: Option<MusicTrack>,
}

impl Fade {
    fn volume(&self) -> f32 {
        let progress = if self.duration.is_zero() {
            1.0
        } else {
            (self.elapsed.as_secs_f32() / self.duration.as_secs_f32()).min(1.0)
        };
        self.from + (self.to - self.from) * progress
    }

    fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }
}

pub struct AudioManager {
    backend: Box<dyn AudioBackend>,
    sounds: HashMap<SoundId, PathBuf>,
    tracks: HashMap<MusicTrack, PathBuf>,
    sound_volumes: HashMap<SoundId, f32>,
    sfx_volume: f32,
    music_volume: f32,
    current_volume: f32,
    current_music: Option<MusicTrack>,
    music_paused: bool,
    fade: Option<Fade>,
    ambient: Option<SoundId>,
    ambient_volume: f32,
    ambient_fade: Option<Fade>,
}

impl AudioManager {
    /// Looks up every known sound and track under `assets_dir`. Missing
    /// files are reported once and stay silent.
    pub fn new(
        assets_dir: impl AsRef<Path>,
        backend: Box<dyn AudioBackend>,
        music_volume: f32,
        sfx_volume: f32,
    ) -> Self {
        let assets_dir = assets_dir.as_ref();
        let mut sounds = HashMap::new();
        for sound in SoundId::ALL {
            let path = assets_dir.join(sound.file_name());
            if path.is_file() {
                sounds.insert(sound, path);
            } else {
                warn!("sound file {} not found", path.display());
            }
        }
        let mut tracks = HashMap::new();
        for track in MusicTrack::ALL {
            let path = assets_dir.join(track.file_name());
            if path.is_file() {
                tracks.insert(track, path);
            } else {
                warn!("music file {} not found", path.display());
            }
        }

        let music_volume = music_volume.clamp(0.0, 1.0);
        Self {
            backend,
            sounds,
            tracks,
            sound_volumes: HashMap::new(),
            sfx_volume: sfx_volume.clamp(0.0, 1.0),
            music_volume,
            current_volume: music_volume,
            current_music: None,
            music_paused: false,
            fade: None,
            ambient: None,
            ambient_volume: 0.0,
            ambient_fade: None,
        }
    }

    pub fn has_sound(&self, sound: SoundId) -> bool {
        self.sounds.contains_key(&sound)
    }

    pub fn current_music(&self) -> Option<MusicTrack> {
        self.current_music
    }

    pub fn is_music_paused(&self) -> bool {
        self.music_paused
    }

    pub fn is_fading(&self) -> bool {
        self.fade.is_some()
    }

    /// Sound looping on the ambient channel, including one fading out.
    pub fn ambient(&self) -> Option<SoundId> {
        self.ambient
    }

    pub fn ambient_volume(&self) -> f32 {
        self.ambient_volume
    }

    pub fn music_volume(&self) -> f32 {
        self.current_volume
    }

    pub fn sfx_volume(&self) -> f32 {
        self.sfx_volume
    }

    fn sound_volume(&self, sound: SoundId) -> f32 {
        self.sound_volumes
            .get(&sound)
            .copied()
            .unwrap_or(self.sfx_volume)
    }

    fn emit(&mut self, sound: SoundId, channel: Option<Channel>, gain: f32, left: f32, right: f32) {
        let Some(path) = self.sounds.get(&sound) else {
            return;
        };
        let playback = SoundPlayback {
            sound,
            path: path.clone(),
            channel,
            volume: self.sound_volume(sound) * gain,
            left,
            right,
        };
        self.backend.play_sound(&playback);
    }

    pub fn play_sound(&mut self, sound: SoundId) {
        self.emit(sound, None, 1.0, 1.0, 1.0);
    }

    pub fn play_sound_on(&mut self, sound: SoundId, channel: Channel) {
        self.emit(sound, Some(channel), 1.0, 1.0, 1.0);
    }

    pub fn play_sound_with_context(&mut self, sound: SoundId, context: &str) {
        self.play_sound_on(sound, Channel::for_context(context));
    }

    pub fn play_ui_sound(&mut self, sound: SoundId) {
        self.play_sound_on(sound, Channel::Ui);
    }

    /// Plays `sound` quieter the farther `source` is from `listener`, panned
    /// toward the side it comes from.
    pub fn play_spatial_sound(&mut self, sound: SoundId, source: Vec2, listener: Vec2) {
        let (gain, pan) = spatial_mix(source, listener, SPATIAL_MAX_DISTANCE);
        let (left, right) = if pan < 0.0 {
            (1.0, 1.0 + pan)
        } else {
            (1.0 - pan, 1.0)
        };
        self.emit(sound, Some(Channel::Misc), gain, left, right);
    }

    pub fn play_checkpoint_activation(&mut self, checkpoint: Vec2, player: Vec2) {
        self.play_spatial_sound(SoundId::CheckpointActivate, checkpoint, player);
        self.play_sound_on(SoundId::LevelComplete, Channel::Victory);
    }

    /// Spatial cue for clicking an object at `position`. Objects without a
    /// cue stay silent. Returns the sound played.
    pub fn play_beam_interaction(
        &mut self,
        kind: ObjectKind,
        position: Vec2,
        listener: Vec2,
    ) -> Option<SoundId> {
        let sound = match kind {
            ObjectKind::Mirror => SoundId::MirrorRotate,
            ObjectKind::Filter => SoundId::FilterChange,
            ObjectKind::Prism => SoundId::BeamSplit,
            ObjectKind::Checkpoint | ObjectKind::ShadowCreature => return None,
        };
        self.play_spatial_sound(sound, position, listener);
        Some(sound)
    }

    /// Loops `sound` on the ambient channel, fading it in over `fade_in`.
    pub fn play_ambient_loop(&mut self, sound: SoundId, fade_in: Duration) {
        let Some(path) = self.sounds.get(&sound) else {
            return;
        };
        let target = self.sound_volume(sound);
        let start = if fade_in.is_zero() { target } else { 0.0 };
        let playback = SoundPlayback {
            sound,
            path: path.clone(),
            channel: Some(Channel::Ambient),
            volume: start,
            left: 1.0,
            right: 1.0,
        };
        self.backend.play_looping(&playback);
        self.ambient = Some(sound);
        self.ambient_volume = start;
        self.ambient_fade = (!fade_in.is_zero()).then_some(Fade {
            from: 0.0,
            to: target,
            duration: fade_in,
            elapsed: Duration::ZERO,
            next: None,
        });
    }

    /// Fades the ambient loop out over `fade_out`, then stops the channel.
    pub fn stop_ambient(&mut self, fade_out: Duration) {
        if self.ambient.is_none() {
            return;
        }
        if fade_out.is_zero() {
            self.finish_ambient();
            return;
        }
        if self.ambient_fade.is_some_and(|fade| fade.to == 0.0) {
            return;
        }
        self.ambient_fade = Some(Fade {
            from: self.ambient_volume,
            to: 0.0,
            duration: fade_out,
            elapsed: Duration::ZERO,
            next: None,
        });
    }

    fn finish_ambient(&mut self) {
        self.backend.stop_channel(Channel::Ambient);
        self.ambient = None;
        self.ambient_volume = 0.0;
        self.ambient_fade = None;
    }

    fn update_ambient(&mut self, dt: Duration) {
        let Some(mut fade) = self.ambient_fade.take() else {
            return;
        };
        fade.elapsed += dt;
        self.ambient_volume = fade.volume();
        self.backend
            .set_channel_volume(Channel::Ambient, self.ambient_volume);
        if !fade.is_finished() {
            self.ambient_fade = Some(fade);
        } else if fade.to == 0.0 {
            self.finish_ambient();
        }
    }

    /// Starts `track` immediately at the configured music volume.
    pub fn play_music(&mut self, track: MusicTrack) {
        let Some(path) = self.tracks.get(&track) else {
            return;
        };
        self.backend.play_music(track, path);
        self.current_music = Some(track);
        self.music_paused = false;
    }

    pub fn fade_music(&mut self, track: MusicTrack) {
        self.fade_music_over(track, DEFAULT_FADE);
    }

    /// Fades the current track out, then fades `track` in, each over
    /// `duration`. Progress is driven by [`AudioManager::update`].
    pub fn fade_music_over(&mut self, track: MusicTrack, duration: Duration) {
        let heading_to = self
            .fade
            .and_then(|fade| fade.next)
            .or(self.current_music);
        if heading_to == Some(track) {
            return;
        }
        if self.current_music.is_none() {
            self.start_fade_in(track, duration);
            return;
        }
        self.fade = Some(Fade {
            from: self.current_volume,
            to: 0.0,
            duration,
            elapsed: Duration::ZERO,
            next: Some(track),
        });
    }

    fn start_fade_in(&mut self, track: MusicTrack, duration: Duration) {
        self.play_music(track);
        self.set_current_volume(0.0);
        self.fade = Some(Fade {
            from: 0.0,
            to: self.music_volume,
            duration,
            elapsed: Duration::ZERO,
            next: None,
        });
    }

    fn set_current_volume(&mut self, volume: f32) {
        self.current_volume = volume;
        self.backend.set_music_volume(volume);
    }

    /// Advances fades by `dt`.
    pub fn update(&mut self, dt: Duration) {
        self.update_ambient(dt);
        let Some(mut fade) = self.fade.take() else {
            return;
        };
        fade.elapsed += dt;
        self.set_current_volume(fade.volume());
        if !fade.is_finished() {
            self.fade = Some(fade);
            return;
        }
        if let Some(next) = fade.next {
            self.start_fade_in(next, fade.duration);
        }
    }

    pub fn pause_music(&mut self) {
        if self.current_music.is_some() && !self.music_paused {
            self.music_paused = true;
            self.backend.pause_music();
        }
    }

    pub fn unpause_music(&mut self) {
        if self.music_paused {
            self.music_paused = false;
            self.backend.resume_music();
        }
    }

    pub fn stop_music(&mut self) {
        self.backend.stop_music();
        self.current_music = None;
        self.music_paused = false;
        self.fade = None;
    }

    pub fn set_music_volume(&mut self, volume: f32) {
        self.music_volume = volume.clamp(0.0, 1.0);
        if self.fade.is_none() {
            self.set_current_volume(self.music_volume);
        }
    }

    /// Sets the volume of every sound effect, dropping per-sound overrides.
    pub fn set_sfx_volume(&mut self, volume: f32) {
        self.sfx_volume = volume.clamp(0.0, 1.0);
        self.sound_volumes.clear();
    }

    pub fn set_sound_volume(&mut self, sound: SoundId, volume: f32) {
        self.sound_volumes.insert(sound, volume.clamp(0.0, 1.0));
    }
}

impl fmt::Debug for AudioManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioManager")
            .field("sounds", &self.sounds.len())
            .field("tracks", &self.tracks.len())
            .field("current_music", &self.current_music)
            .field("current_volume", &self.current_volume)
            .field("fade", &self.fade)
            .field("ambient", &self.ambient)
            .finish()
    }
}

/// Gain in [0, 1] and pan in [-1, 1] for a sound at `source` heard from
/// `listener`.
pub fn spatial_mix(source: Vec2, listener: Vec2, max_distance: f32) -> (f32, f32) {
    let offset = source - listener;
    let distance = offset.length();
    let gain = if distance <= 0.0 {
        1.0
    } else {
        (1.0 - distance / max_distance).clamp(0.0, 1.0)
    };
    let pan = if offset.x == 0.0 {
        0.0
    } else {
        (offset.x / (max_distance / 2.0)).clamp(-1.0, 1.0)
    };
    (gain, pan)
}

#[cfg(test)]
pub(crate) mod tests {
    use std::fs;
    use std::sync::Arc;

    use parking_lot::Mutex;
    use tempfile::TempDir;

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    pub(crate) enum Played {
        Sound(SoundPlayback),
        Loop(SoundPlayback),
        ChannelVolume(Channel, f32),
        StopChannel(Channel),
        Music(MusicTrack),
        Volume(f32),
        Pause,
        Resume,
        Stop,
    }

    /// Backend that records every request for inspection.
    #[derive(Debug, Clone, Default)]
    pub(crate) struct RecordingBackend {
        pub(crate) log: Arc<Mutex<Vec<Played>>>,
    }

    impl RecordingBackend {
        pub(crate) fn sounds(&self) -> Vec<SoundId> {
            self.log
                .lock()
                .iter()
                .filter_map(|played| match played {
                    Played::Sound(playback) => Some(playback.sound),
                    _ => None,
                })
                .collect()
        }

        pub(crate) fn loops(&self) -> Vec<SoundId> {
            self.log
                .lock()
                .iter()
                .filter_map(|played| match played {
                    Played::Loop(playback) => Some(playback.sound),
                    _ => None,
                })
                .collect()
        }

        pub(crate) fn stopped_channels(&self) -> Vec<Channel> {
            self.log
                .lock()
                .iter()
                .filter_map(|played| match played {
                    Played::StopChannel(channel) => Some(*channel),
                    _ => None,
                })
                .collect()
        }

        pub(crate) fn tracks(&self) -> Vec<MusicTrack> {
            self.log
                .lock()
                .iter()
                .filter_map(|played| match played {
                    Played::Music(track) => Some(*track),
                    _ => None,
                })
                .collect()
        }
    }

    impl AudioBackend for RecordingBackend {
        fn play_sound(&mut self, playback: &SoundPlayback) {
            self.log.lock().push(Played::Sound(playback.clone()));
        }

        fn play_looping(&mut self, playback: &SoundPlayback) {
            self.log.lock().push(Played::Loop(playback.clone()));
        }

        fn set_channel_volume(&mut self, channel: Channel, volume: f32) {
            self.log.lock().push(Played::ChannelVolume(channel, volume));
        }

        fn stop_channel(&mut self, channel: Channel) {
            self.log.lock().push(Played::StopChannel(channel));
        }

        fn play_music(&mut self, track: MusicTrack, _path: &Path) {
            self.log.lock().push(Played::Music(track));
        }

        fn set_music_volume(&mut self, volume: f32) {
            self.log.lock().push(Played::Volume(volume));
        }

        fn pause_music(&mut self) {
            self.log.lock().push(Played::Pause);
        }

        fn resume_music(&mut self) {
            self.log.lock().push(Played::Resume);
        }

        fn stop_music(&mut self) {
            self.log.lock().push(Played::Stop);
        }
    }

    /// Asset directory containing every sound and track.
    pub(crate) fn full_assets() -> TempDir {
        let dir = TempDir::new().unwrap();
        for sound in SoundId::ALL {
            fs::write(dir.path().join(sound.file_name()), b"").unwrap();
        }
        for track in MusicTrack::ALL {
            fs::write(dir.path().join(track.file_name()), b"").unwrap();
        }
        dir
    }

    pub(crate) fn recording_manager(dir: &TempDir) -> (AudioManager, RecordingBackend) {
        let backend = RecordingBackend::default();
        let manager = AudioManager::new(dir.path(), Box::new(backend.clone()), 0.5, 0.7);
        (manager, backend)
    }

    fn last_sound(backend: &RecordingBackend) -> SoundPlayback {
        backend
            .log
            .lock()
            .iter()
            .rev()
            .find_map(|played| match played {
                Played::Sound(playback) => Some(playback.clone()),
                _ => None,
            })
            .unwrap()
    }

    #[test]
    fn missing_files_are_silent() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("beam_on.wav"), b"").unwrap();
        let (mut audio, backend) = recording_manager(&dir);
        assert!(audio.has_sound(SoundId::BeamOn));
        assert!(!audio.has_sound(SoundId::BeamOff));
        audio.play_sound(SoundId::BeamOff);
        audio.play_sound(SoundId::BeamOn);
        audio.play_music(MusicTrack::Menu);
        assert_eq!(backend.sounds(), vec![SoundId::BeamOn]);
        assert!(backend.tracks().is_empty());
        assert_eq!(audio.current_music(), None);
    }

    #[test]
    fn context_selects_channel() {
        assert_eq!(Channel::for_context("beam"), Channel::Beam);
        assert_eq!(Channel::for_context("object"), Channel::Objects);
        assert_eq!(Channel::for_context("whatever"), Channel::Misc);

        let dir = full_assets();
        let (mut audio, backend) = recording_manager(&dir);
        audio.play_sound_with_context(SoundId::ButtonClick, "ui");
        let played = last_sound(&backend);
        assert_eq!(played.channel, Some(Channel::Ui));
        assert!((played.volume - 0.7).abs() < 1e-6);
    }

    #[test]
    fn spatial_sounds_fade_with_distance_and_pan() {
        assert_eq!(spatial_mix(Vec2::ZERO, Vec2::ZERO, 500.0), (1.0, 0.0));
        let (gain, pan) = spatial_mix(Vec2::new(-125.0, 0.0), Vec2::ZERO, 500.0);
        assert!((gain - 0.75).abs() < 1e-6);
        assert!((pan + 0.5).abs() < 1e-6);
        let (gain, pan) = spatial_mix(Vec2::new(900.0, 0.0), Vec2::ZERO, 500.0);
        assert_eq!(gain, 0.0);
        assert_eq!(pan, 1.0);

        let dir = full_assets();
        let (mut audio, backend) = recording_manager(&dir);
        audio.play_spatial_sound(SoundId::MirrorRotate, Vec2::new(-125.0, 0.0), Vec2::ZERO);
        let played = last_sound(&backend);
        assert_eq!(played.left, 1.0);
        assert!((played.right - 0.5).abs() < 1e-6);
        assert!((played.volume - 0.7 * 0.75).abs() < 1e-6);
    }

    #[test]
    fn checkpoint_activation_plays_two_sounds() {
        let dir = full_assets();
        let (mut audio, backend) = recording_manager(&dir);
        audio.play_checkpoint_activation(Vec2::new(10.0, 0.0), Vec2::ZERO);
        assert_eq!(
            backend.sounds(),
            vec![SoundId::CheckpointActivate, SoundId::LevelComplete]
        );
        assert_eq!(last_sound(&backend).channel, Some(Channel::Victory));
    }

    #[test]
    fn fade_switches_tracks_after_fading_out() {
        let dir = full_assets();
        let (mut audio, backend) = recording_manager(&dir);
        audio.play_music(MusicTrack::Menu);
        audio.fade_music_over(MusicTrack::Gameplay, Duration::from_millis(100));
        audio.update(Duration::from_millis(50));
        assert!((audio.music_volume() - 0.25).abs() < 1e-6);
        assert_eq!(audio.current_music(), Some(MusicTrack::Menu));
        audio.update(Duration::from_millis(50));
        assert_eq!(audio.current_music(), Some(MusicTrack::Gameplay));
        assert_eq!(audio.music_volume(), 0.0);
        audio.update(Duration::from_millis(100));
        assert!((audio.music_volume() - 0.5).abs() < 1e-6);
        assert!(!audio.is_fading());
        assert_eq!(backend.tracks(), vec![MusicTrack::Menu, MusicTrack::Gameplay]);

        audio.fade_music(MusicTrack::Gameplay);
        assert!(!audio.is_fading());
    }

    #[test]
    fn pause_and_volume_controls() {
        let dir = full_assets();
        let (mut audio, backend) = recording_manager(&dir);
        audio.pause_music();
        assert!(!audio.is_music_paused());
        audio.play_music(MusicTrack::Menu);
        audio.pause_music();
        audio.pause_music();
        audio.unpause_music();
        let pauses = backend
            .log
            .lock()
            .iter()
            .filter(|played| **played == Played::Pause)
            .count();
        assert_eq!(pauses, 1);

        audio.set_music_volume(3.0);
        assert_eq!(audio.music_volume(), 1.0);
        audio.set_sfx_volume(-1.0);
        assert_eq!(audio.sfx_volume(), 0.0);
        audio.set_sound_volume(SoundId::BeamOn, 0.4);
        audio.play_sound(SoundId::BeamOn);
        assert!((last_sound(&backend).volume - 0.4).abs() < 1e-6);

        audio.stop_music();
        assert_eq!(audio.current_music(), None);
    }

    #[test]
    fn repeated_fade_request_does_not_restart_the_track() {
        let dir = full_assets();
        let (mut audio, backend) = recording_manager(&dir);
        audio.play_music(MusicTrack::Menu);
        audio.fade_music_over(MusicTrack::Gameplay, Duration::from_millis(100));
        audio.update(Duration::from_millis(100));
        assert_eq!(audio.current_music(), Some(MusicTrack::Gameplay));
        assert!(audio.is_fading());

        audio.update(Duration::from_millis(40));
        audio.fade_music_over(MusicTrack::Gameplay, Duration::from_millis(100));
        audio.update(Duration::from_millis(60));
        assert!((audio.music_volume() - 0.5).abs() < 1e-6);
        assert!(!audio.is_fading());

        audio.fade_music_over(MusicTrack::Victory, Duration::from_millis(100));
        audio.fade_music_over(MusicTrack::Victory, Duration::from_millis(100));
        audio.update(Duration::from_millis(100));
        assert_eq!(
            backend.tracks(),
            vec![MusicTrack::Menu, MusicTrack::Gameplay, MusicTrack::Victory]
        );
    }

    #[test]
    fn ambient_loop_fades_in_and_out() {
        let dir = full_assets();
        let (mut audio, backend) = recording_manager(&dir);
        audio.play_ambient_loop(SoundId::ShadowCreature, Duration::from_millis(200));
        assert_eq!(backend.loops(), vec![SoundId::ShadowCreature]);
        assert_eq!(audio.ambient(), Some(SoundId::ShadowCreature));
        assert_eq!(audio.ambient_volume(), 0.0);

        audio.update(Duration::from_millis(100));
        assert!((audio.ambient_volume() - 0.35).abs() < 1e-6);
        audio.update(Duration::from_millis(100));
        assert!((audio.ambient_volume() - 0.7).abs() < 1e-6);
        assert!(backend
            .log
            .lock()
            .contains(&Played::ChannelVolume(Channel::Ambient, 0.7)));

        audio.stop_ambient(Duration::from_millis(100));
        audio.update(Duration::from_millis(50));
        assert!(backend.stopped_channels().is_empty());
        assert_eq!(audio.ambient(), Some(SoundId::ShadowCreature));
        audio.update(Duration::from_millis(50));
        assert_eq!(backend.stopped_channels(), vec![Channel::Ambient]);
        assert_eq!(audio.ambient(), None);

        audio.stop_ambient(Duration::ZERO);
        assert_eq!(backend.stopped_channels(), vec![Channel::Ambient]);
    }

    #[test]
    fn ambient_loop_without_fade_starts_at_full_volume() {
        let dir = TempDir::new().unwrap();
        let (mut audio, backend) = recording_manager(&dir);
        audio.play_ambient_loop(SoundId::ShadowCreature, Duration::ZERO);
        assert!(backend.loops().is_empty());
        assert_eq!(audio.ambient(), None);

        let dir = full_assets();
        let (mut audio, backend) = recording_manager(&dir);
        audio.play_ambient_loop(SoundId::ShadowCreature, Duration::ZERO);
        let looped = backend
            .log
            .lock()
            .iter()
            .find_map(|played| match played {
                Played::Loop(playback) => Some(playback.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(looped.channel, Some(Channel::Ambient));
        assert!((looped.volume - 0.7).abs() < 1e-6);
        audio.stop_ambient(Duration::ZERO);
        assert_eq!(backend.stopped_channels(), vec![Channel::Ambient]);
    }

    #[test]
    fn beam_interactions_pick_a_sound_per_object() {
        let dir = full_assets();
        let (mut audio, backend) = recording_manager(&dir);
        let at = Vec2::new(50.0, 0.0);
        assert_eq!(
            audio.play_beam_interaction(ObjectKind::Mirror, at, Vec2::ZERO),
            Some(SoundId::MirrorRotate)
        );
        assert_eq!(
            audio.play_beam_interaction(ObjectKind::Filter, at, Vec2::ZERO),
            Some(SoundId::FilterChange)
        );
        assert_eq!(
            audio.play_beam_interaction(ObjectKind::Prism, at, Vec2::ZERO),
            Some(SoundId::BeamSplit)
        );
        assert_eq!(
            audio.play_beam_interaction(ObjectKind::Checkpoint, at, Vec2::ZERO),
            None
        );
        assert_eq!(
            backend.sounds(),
            vec![SoundId::MirrorRotate, SoundId::FilterChange, SoundId::BeamSplit]
        );
        let played = last_sound(&backend);
        assert_eq!(played.channel, Some(Channel::Misc));
        assert!(played.right > played.left - 1e-6);

        audio.play_ui_sound(SoundId::ButtonClick);
        assert_eq!(last_sound(&backend).channel, Some(Channel::Ui));
    }
}
