use std::any::Any;
use std::env;
use std::fmt;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use glam::Vec2;
use log::{info, warn};
use pollster::block_on;
use winit::dpi::LogicalSize;
use winit::event::{
    ElementState, Event, KeyboardInput, MouseButton as WinitMouseButton, WindowEvent,
};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::platform::run_return::EventLoopExtRunReturn;
use winit::window::WindowBuilder;

use light_weaver::app::{print_summary, run_headless, window_title, HeadlessOptions, WindowViewport};
use light_weaver::audio::{AudioBackend, AudioManager, LogBackend, DEFAULT_ASSETS_DIR};
use light_weaver::{
    build_frame, Game, GameConfig, InputEvent, InputState, KeyCode, LevelManager, MouseButton,
    NamedKey, Renderer,
};

/// Longest frame time fed to the fixed step after a stall.
const MAX_FRAME_BACKLOG: Duration = Duration::from_millis(250);

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = CliOptions::parse()?;
    let config = match &options.config {
        Some(path) => {
            let xml = fs::read_to_string(path)
                .with_context(|| format!("failed to read config {path}"))?;
            GameConfig::from_xml(&xml).with_context(|| format!("failed to parse config {path}"))?
        }
        None => GameConfig::default(),
    };
    let levels = match &options.levels {
        Some(path) => {
            let xml = fs::read_to_string(path)
                .with_context(|| format!("failed to read levels {path}"))?;
            LevelManager::from_xml(&xml)
                .with_context(|| format!("failed to parse levels {path}"))?
        }
        None => LevelManager::builtin().context("failed to parse the built-in levels")?,
    };

    println!(
        "Loaded {} levels ({} unlocked)",
        levels.max_level(),
        levels.max_level_reached()
    );

    let audio = AudioManager::new(
        DEFAULT_ASSETS_DIR,
        open_audio_backend(),
        config.volume_music,
        config.volume_sfx,
    );
    let mut game = Game::new(config, levels, audio);

    if options.summary_only {
        return headless(&mut game, &options);
    }
    match run_interactive(&mut game, &options) {
        Ok(()) => Ok(()),
        Err(err) => {
            if err.downcast_ref::<WindowInitError>().is_some() {
                eprintln!(
                    "{err}. Falling back to --summary-only mode (set DISPLAY or install X11 libs to enable rendering)."
                );
                headless(&mut game, &options)
            } else {
                Err(err)
            }
        }
    }
}

#[cfg(feature = "device-audio")]
fn open_audio_backend() -> Box<dyn AudioBackend> {
    match light_weaver::audio::RodioBackend::open() {
        Ok(backend) => Box::new(backend),
        Err(err) => {
            warn!("{err:#}, sounds will only be logged");
            Box::new(LogBackend)
        }
    }
}

#[cfg(not(feature = "device-audio"))]
fn open_audio_backend() -> Box<dyn AudioBackend> {
    warn!("built without the device-audio feature, sounds will only be logged");
    Box::new(LogBackend)
}

fn headless(game: &mut Game, options: &CliOptions) -> Result<()> {
    let frames = run_headless(game, &options.headless())?;
    print_summary(game, frames);
    Ok(())
}

fn run_interactive(game: &mut Game, options: &CliOptions) -> Result<()> {
    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(|_| {}));
    let event_loop = panic::catch_unwind(AssertUnwindSafe(EventLoop::new));
    panic::set_hook(default_hook);
    let event_loop =
        event_loop.map_err(|panic| WindowInitError::from_panic("event loop", panic))?;

    let screen = game.config().screen_size();
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(window_title(game))
            .with_inner_size(LogicalSize::new(screen.x, screen.y))
            .build(&event_loop)
            .map_err(|err| WindowInitError::from_error("window", err))?,
    );

    let renderer = block_on(Renderer::new(Arc::clone(&window), screen))
        .map_err(WindowInitError::from_renderer)?;
    let viewport = WindowViewport::new(
        window.inner_size().width,
        window.inner_size().height,
        screen,
    );

    if let Some(level) = options.level {
        game.start_level(level)?;
    }

    let mut app = AppState {
        renderer,
        game,
        input: InputState::new(),
        viewport,
        title: String::new(),
        last_tick: Instant::now(),
        accumulator: Duration::ZERO,
        last_error: None,
    };

    let mut event_loop = event_loop;
    event_loop.run_return(|event, _, control_flow| {
        *control_flow = ControlFlow::Poll;
        if let Err(err) = app.process_event(&event, control_flow) {
            app.last_error = Some(err);
            control_flow.set_exit();
        }
    });

    if let Some(err) = app.last_error {
        return Err(err);
    }
    info!("window closed in state {}", app.game.state().name());
    Ok(())
}

struct AppState<'a> {
    renderer: Renderer,
    game: &'a mut Game,
    input: InputState,
    viewport: WindowViewport,
    title: String,
    last_tick: Instant,
    accumulator: Duration,
    last_error: Option<anyhow::Error>,
}

#[derive(Debug)]
struct WindowInitError {
    message: String,
}

impl WindowInitError {
    fn from_panic(stage: &str, panic: Box<dyn Any + Send>) -> Self {
        Self {
            message: format!("failed to initialize {stage}: {}", panic_message(panic)),
        }
    }

    fn from_error(stage: &str, err: impl fmt::Display) -> Self {
        Self {
            message: format!("failed to initialize {stage}: {err}"),
        }
    }

    /// Adapter and device failures mean rendering is unavailable, like a
    /// missing display.
    fn from_renderer(err: anyhow::Error) -> Self {
        Self::from_error("renderer", format!("{err:#}"))
    }
}

impl fmt::Display for WindowInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for WindowInitError {}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    match panic.downcast::<String>() {
        Ok(msg) => *msg,
        Err(panic) => match panic.downcast::<&'static str>() {
            Ok(msg) => (*msg).to_string(),
            Err(_) => "unknown panic".into(),
        },
    }
}

impl AppState<'_> {
    fn process_event(&mut self, event: &Event<()>, control_flow: &mut ControlFlow) -> Result<()> {
        match event {
            Event::WindowEvent { event, window_id } if *window_id == self.renderer.window_id() => {
                match event {
                    WindowEvent::CloseRequested => {
                        control_flow.set_exit();
                    }
                    WindowEvent::Resized(size) => {
                        self.renderer.resize(*size);
                        self.viewport.update(size.width, size.height);
                    }
                    WindowEvent::ScaleFactorChanged { new_inner_size, .. } => {
                        self.renderer.resize(**new_inner_size);
                        self.viewport
                            .update(new_inner_size.width, new_inner_size.height);
                    }
                    WindowEvent::KeyboardInput { input, .. } => {
                        self.handle_keyboard(input);
                    }
                    WindowEvent::MouseInput { state, button, .. } => {
                        self.handle_mouse_button(*state, *button);
                    }
                    WindowEvent::CursorMoved { position, .. } => {
                        let pos = Vec2::new(position.x as f32, position.y as f32);
                        self.input.set_mouse_position(self.viewport.to_game(pos));
                    }
                    _ => {}
                }
            }
            Event::RedrawRequested(window_id) if *window_id == self.renderer.window_id() => {
                let frame = build_frame(&*self.game);
                if let Err(err) = self.renderer.render(frame.vertices()) {
                    match err {
                        wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => {
                            self.renderer.reconfigure();
                        }
                        wgpu::SurfaceError::OutOfMemory => {
                            return Err(anyhow!("GPU is out of memory"));
                        }
                        wgpu::SurfaceError::Timeout => {
                            info!("Surface timeout; retrying next frame");
                        }
                    }
                }
            }
            Event::MainEventsCleared => {
                self.step();
                if self.game.quit_requested() {
                    control_flow.set_exit();
                    return Ok(());
                }
                self.refresh_title();
                self.renderer.window().request_redraw();
            }
            _ => {}
        }
        Ok(())
    }

    /// Runs as many fixed updates as the elapsed wall time allows.
    fn step(&mut self) {
        let now = Instant::now();
        self.accumulator += (now - self.last_tick).min(MAX_FRAME_BACKLOG);
        self.last_tick = now;
        let dt = self.game.config().frame_duration();
        while self.accumulator >= dt {
            self.game.update(dt, &self.input);
            self.accumulator -= dt;
        }
    }

    fn refresh_title(&mut self) {
        let title = window_title(&*self.game);
        if title != self.title {
            self.renderer.window().set_title(&title);
            self.title = title;
        }
    }

    fn handle_keyboard(&mut self, input: &KeyboardInput) {
        let Some(keycode) = input.virtual_keycode.and_then(map_keycode) else {
            return;
        };
        match input.state {
            ElementState::Pressed => {
                let repeat = self.input.is_key_down(keycode);
                self.input.set_key_down(keycode);
                if !repeat {
                    self.game
                        .handle_event(InputEvent::KeyPressed(keycode), &self.input);
                }
            }
            ElementState::Released => self.input.set_key_up(keycode),
        }
    }

    fn handle_mouse_button(&mut self, state: ElementState, button: WinitMouseButton) {
        let Some(button) = map_mouse_button(button) else {
            return;
        };
        match state {
            ElementState::Pressed => {
                self.input.set_mouse_button_down(button);
                let position = self.input.mouse_position();
                self.game
                    .handle_event(InputEvent::MousePressed { button, position }, &self.input);
            }
            ElementState::Released => self.input.set_mouse_button_up(button),
        }
    }
}

/// Buttons beyond the `u8` range are ignored.
fn map_mouse_button(button: WinitMouseButton) -> Option<MouseButton> {
    match button {
        WinitMouseButton::Left => Some(MouseButton::LEFT),
        WinitMouseButton::Right => Some(MouseButton::RIGHT),
        WinitMouseButton::Middle => Some(MouseButton::new(2)),
        WinitMouseButton::Other(value) => u8::try_from(value).ok().map(MouseButton::new),
    }
}

/// Winit key names match the names accepted in config bindings, apart from
/// the digit row and backspace.
fn map_keycode(code: winit::event::VirtualKeyCode) -> Option<KeyCode> {
    use winit::event::VirtualKeyCode as Key;
    let digit = match code {
        Key::Key0 => 0,
        Key::Key1 => 1,
        Key::Key2 => 2,
        Key::Key3 => 3,
        Key::Key4 => 4,
        Key::Key5 => 5,
        Key::Key6 => 6,
        Key::Key7 => 7,
        Key::Key8 => 8,
        Key::Key9 => 9,
        Key::Back => return Some(KeyCode::Named(NamedKey::Backspace)),
        other => return KeyCode::from_name(&format!("{other:?}")),
    };
    Some(KeyCode::Digit(digit))
}

const USAGE: &str = "Usage: light-weaver [--levels <file>] [--config <file>] [--level <n>] [--frames <n>] [--aim <x> <y>] [--summary-only]";

#[derive(Debug, Default)]
struct CliOptions {
    levels: Option<String>,
    config: Option<String>,
    level: Option<u32>,
    frames: Option<u32>,
    aim: Option<Vec2>,
    summary_only: bool,
}

impl CliOptions {
    fn parse() -> Result<Self> {
        Self::parse_from(env::args().skip(1))
    }

    fn parse_from(args: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut args = args.into_iter();
        let mut options = Self::default();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--levels" => options.levels = Some(value(&mut args, "--levels")?),
                "--config" => options.config = Some(value(&mut args, "--config")?),
                "--level" => options.level = Some(number(&mut args, "--level")?),
                "--frames" => options.frames = Some(number(&mut args, "--frames")?),
                "--aim" => options.aim = Some(aim(&mut args)?),
                "--summary-only" => options.summary_only = true,
                "-h" | "--help" => return Err(anyhow!(USAGE)),
                other => {
                    return Err(anyhow!("Unknown argument: {other}\n{USAGE}"));
                }
            }
        }
        Ok(options)
    }

    fn headless(&self) -> HeadlessOptions {
        let defaults = HeadlessOptions::default();
        HeadlessOptions {
            level: self.level.unwrap_or(defaults.level),
            frames: self.frames.unwrap_or(defaults.frames),
            aim: self.aim,
        }
    }
}

fn value(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<String> {
    args.next()
        .ok_or_else(|| anyhow!("{flag} expects a value\n{USAGE}"))
}

fn number(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<u32> {
    let text = value(args, flag)?;
    text.parse()
        .map_err(|_| anyhow!("{flag} expects a whole number, got {text:?}\n{USAGE}"))
}

/// Accepts `--aim 400,100` as well as `--aim 400 100`.
fn aim(args: &mut impl Iterator<Item = String>) -> Result<Vec2> {
    let first = value(args, "--aim")?;
    let (x, y) = match first.split_once(',') {
        Some((x, y)) => (x.trim().to_string(), y.trim().to_string()),
        None => (first, value(args, "--aim")?),
    };
    let parse = |text: &str| {
        text.parse::<f32>()
            .map_err(|_| anyhow!("--aim expects numbers, got {text:?}\n{USAGE}"))
    };
    Ok(Vec2::new(parse(&x)?, parse(&y)?))
}
