//! Light Weaver, a 2D puzzle game about steering a beam of light.
//!
//! The crate holds the whole game model: levels and their objects, the beam
//! tracer, the state machine driving menus and play, and audio cues behind a
//! pluggable backend. Rendering turns a game snapshot into plain triangles so
//! everything up to the GPU upload can be exercised headless.

pub mod app;
pub mod audio;
pub mod color;
pub mod config;
pub mod game;
pub mod geometry;
pub mod input;
pub mod level;
pub mod light;
pub mod objects;
pub mod player;
pub mod render;
pub mod ui;
pub mod world;

pub use audio::{AudioBackend, AudioManager, LogBackend, MusicTrack, SoundId};
pub use color::Color;
pub use config::GameConfig;
pub use game::{Game, GameState};
pub use input::{InputEvent, InputState, KeyCode, MouseButton, NamedKey};
pub use level::{Level, LevelManager};
pub use light::{BeamSegment, LightBeam, TracedBeam};
pub use objects::{LevelObject, ObjectKind};
pub use render::{build_frame, FrameBuilder, Renderer, Vertex};
pub use world::World;
