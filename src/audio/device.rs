use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use log::{info, warn};
use rodio::source::ChannelVolume;
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};

use super::{AudioBackend, Channel, MusicTrack, SoundPlayback};

/// Plays sounds and music on the default output device.
///
/// Every channel owns one sink, so a new sound on a channel replaces the old
/// one. Sounds without a channel are detached and play to the end.
pub struct RodioBackend {
    // Dropping the stream silences every sink.
    _stream: OutputStream,
    handle: OutputStreamHandle,
    channels: HashMap<Channel, Sink>,
    music: Option<Sink>,
    music_volume: f32,
}

impl RodioBackend {
    pub fn open() -> Result<Self> {
        let (stream, handle) =
            OutputStream::try_default().context("no audio output device available")?;
        info!("audio output device opened");
        Ok(Self {
            _stream: stream,
            handle,
            channels: HashMap::new(),
            music: None,
            music_volume: 1.0,
        })
    }

    fn decode(path: &Path) -> Result<Decoder<BufReader<File>>> {
        let file =
            File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
        Decoder::new(BufReader::new(file))
            .with_context(|| format!("failed to decode {}", path.display()))
    }

    fn start(&mut self, playback: &SoundPlayback, looping: bool) -> Result<()> {
        let source = Self::decode(&playback.path)?.convert_samples::<f32>();
        let sink = Sink::try_new(&self.handle).context("failed to open an audio sink")?;
        sink.set_volume(playback.volume);
        let gains = vec![playback.left, playback.right];
        if looping {
            sink.append(ChannelVolume::new(source.buffered().repeat_infinite(), gains));
        } else {
            sink.append(ChannelVolume::new(source, gains));
        }
        match playback.channel {
            Some(channel) => {
                if let Some(previous) = self.channels.insert(channel, sink) {
                    previous.stop();
                }
            }
            None => sink.detach(),
        }
        Ok(())
    }
}

impl AudioBackend for RodioBackend {
    fn play_sound(&mut self, playback: &SoundPlayback) {
        if let Err(err) = self.start(playback, false) {
            warn!("sound {}: {err:#}", playback.sound);
        }
    }

    fn play_looping(&mut self, playback: &SoundPlayback) {
        if let Err(err) = self.start(playback, true) {
            warn!("looping sound {}: {err:#}", playback.sound);
        }
    }

    fn set_channel_volume(&mut self, channel: Channel, volume: f32) {
        if let Some(sink) = self.channels.get(&channel) {
            sink.set_volume(volume);
        }
    }

    fn stop_channel(&mut self, channel: Channel) {
        if let Some(sink) = self.channels.remove(&channel) {
            sink.stop();
        }
    }

    fn play_music(&mut self, track: MusicTrack, path: &Path) {
        self.stop_music();
        let started = File::open(path)
            .with_context(|| format!("failed to open {}", path.display()))
            .and_then(|file| {
                Decoder::new_looped(BufReader::new(file))
                    .with_context(|| format!("failed to decode {}", path.display()))
            })
            .and_then(|source| {
                let sink = Sink::try_new(&self.handle).context("failed to open an audio sink")?;
                sink.set_volume(self.music_volume);
                sink.append(source);
                Ok(sink)
            });
        match started {
            Ok(sink) => self.music = Some(sink),
            Err(err) => warn!("music '{}': {err:#}", track.name()),
        }
    }

    fn set_music_volume(&mut self, volume: f32) {
        self.music_volume = volume;
        if let Some(sink) = &self.music {
            sink.set_volume(volume);
        }
    }

    fn pause_music(&mut self) {
        if let Some(sink) = &self.music {
            sink.pause();
        }
    }

    fn resume_music(&mut self) {
        if let Some(sink) = &self.music {
            sink.play();
        }
    }

    fn stop_music(&mut self) {
        if let Some(sink) = self.music.take() {
            sink.stop();
        }
    }
}
