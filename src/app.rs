use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use glam::Vec2;
use instant::Instant;
use winit::application::ApplicationHandler;
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowAttributes, WindowId, WindowLevel};

use crate::activity::ActivityRegistry;
use crate::audio;
use crate::calibration::{CalibrationStep, CalibrationWizard, EdgeCalibration};
use crate::config::{self, AppConfig};
use crate::frames::{self, DirFrameSource, FrameCache};
use crate::menu;
use crate::pet::{Bounds, Button, Effect, PetMachine, Trigger};
use crate::platform;

const WINDOW_TITLE: &str = "PetViewer";
/// Gap between the pet and the right screen edge at startup.
const START_OFFSET_X: f32 = 50.0;
/// Used when no monitor reports a size.
const FALLBACK_SCREEN: Vec2 = Vec2::new(1920.0, 1080.0);

type Frames = FrameCache<DirFrameSource>;

/// Events posted into the loop from other threads.
#[derive(Debug, Clone, Copy)]
pub enum UserEvent {
    Audio(bool),
}

enum Mode {
    /// Walking the user through the edge wizard; the pet is not running yet.
    Calibrating(CalibrationWizard),
    Running,
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

struct App {
    window: Option<Arc<Window>>,
    config_path: PathBuf,
    config: AppConfig,
    assets: PathBuf,
    registry: ActivityRegistry,
    mode: Mode,

    // Frames are warmed before the loop and handed to the pet once it starts.
    frames: Option<Frames>,
    pet: Option<PetMachine<Frames>>,

    // Virtual time zero
    clock: Instant,

    // Window-local cursor, physical pixels
    cursor: Vec2,
    // Window top-left while no pet owns it (calibration)
    window_pos: Vec2,
    // (screen at press, window at press) for the calibration drag
    calib_drag: Option<(Vec2, Vec2)>,
    screen: Bounds,
    // Last audio state, replayed to a pet that starts late
    audio_active: bool,
}

impl App {
    fn new(config_path: PathBuf, config: AppConfig, assets: PathBuf, frames: Frames) -> Self {
        Self {
            window: None,
            config_path,
            config,
            assets,
            registry: ActivityRegistry::builtin(),
            mode: Mode::Running,
            frames: Some(frames),
            pet: None,
            clock: Instant::now(),
            cursor: Vec2::ZERO,
            window_pos: Vec2::ZERO,
            calib_drag: None,
            screen: Bounds::from_origin_size(Vec2::ZERO, FALLBACK_SCREEN),
            audio_active: false,
        }
    }

    fn now(&self) -> Duration {
        self.clock.elapsed()
    }

    fn size(&self) -> Vec2 {
        self.config.window_size()
    }

    /// Where the window's top-left currently is.
    fn origin(&self) -> Vec2 {
        match &self.pet {
            Some(pet) => pet.position(),
            None => self.window_pos,
        }
    }

    fn movement_bounds(&self) -> Bounds {
        let cal = &self.config.edge_calibration;
        if self.config.use_calibration && cal.is_calibrated() {
            cal.bounds(self.size())
        } else {
            self.screen
        }
    }

    fn move_window(&mut self, pos: Vec2) {
        self.window_pos = pos;
        if let Some(window) = &self.window {
            window.set_outer_position(PhysicalPosition::new(pos.x.round() as i32, pos.y.round() as i32));
        }
    }

    fn send(&mut self, trigger: Trigger) {
        let now = self.now();
        if let Some(pet) = self.pet.as_mut() {
            pet.handle(now, trigger);
        }
    }

    // ---- Pet lifecycle ----

    fn start_pet(&mut self, event_loop: &ActiveEventLoop) {
        let Some(frames) = self.frames.take() else {
            return;
        };
        let bounds = self.movement_bounds();
        log::info!(
            "Movement bounds: ({:.0}, {:.0}) - ({:.0}, {:.0})",
            bounds.left,
            bounds.top,
            bounds.right,
            bounds.bottom
        );

        let mut pet = PetMachine::new(frames, self.config.tuning(), fastrand::Rng::new())
            .with_window(self.window_pos, self.size(), bounds)
            .with_dance_enabled(self.config.is_dance_enabled);
        let now = self.now();
        pet.start(now);
        if self.audio_active {
            pet.handle(now, Trigger::Audio { active: true });
        }
        self.pet = Some(pet);
        self.mode = Mode::Running;
        self.apply_effects(event_loop);
    }

    /// Carry out everything the pet asked for. Menu picks feed back in, so
    /// keep going until the queue is dry.
    ///
    /// There is no renderer: the window stays transparent and `ShowFrame`
    /// only puts the frame path in the title and the trace log.
    fn apply_effects(&mut self, event_loop: &ActiveEventLoop) {
        loop {
            let Some(pet) = self.pet.as_mut() else {
                return;
            };
            let effects = pet.drain_effects();
            if effects.is_empty() {
                return;
            }
            for effect in effects {
                match effect {
                    Effect::ShowFrame(path) => {
                        log::trace!("Frame {}", path.display());
                        if let Some(window) = &self.window {
                            window.set_title(&frame_title(&path));
                        }
                    }
                    Effect::MoveWindow(pos) => self.move_window(pos),
                    Effect::OpenMenu => self.open_menu(),
                    Effect::DanceEnabledChanged(enabled) => {
                        self.config.is_dance_enabled = enabled;
                        if let Err(e) = config::set_dance_enabled(&self.config_path, enabled) {
                            log::warn!("Could not save dance setting: {e}");
                        }
                    }
                    Effect::Exit => {
                        log::info!("Goodbye");
                        event_loop.exit();
                    }
                }
            }
        }
    }

    fn open_menu(&mut self) {
        let (Some(window), Some(pet)) = (&self.window, &self.pet) else {
            return;
        };
        let items = menu::build_items(&self.registry, pet.current_activity(), pet.dance_enabled());
        if let Some(command) = menu::show_popup(window, &items) {
            log::debug!("Menu: {:?}", command);
            self.send(command.into_trigger());
        }
    }

    // ---- Calibration ----

    fn begin_calibration(&mut self) {
        log::info!("Edge calibration required");
        // Drop any half-finished measurements from an earlier run.
        self.config.edge_calibration.reset();
        let wizard = CalibrationWizard::new();
        self.show_step(wizard.step());
        self.mode = Mode::Calibrating(wizard);
    }

    fn show_step(&self, step: CalibrationStep) {
        log::info!("Calibration: {}", step.instruction());
        if let Some(preview) = step.preview() {
            log::debug!("Calibration pose: {}", self.assets.join(preview).display());
        }
        if let Some(window) = &self.window {
            window.set_title(step.instruction());
        }
    }

    fn calibration_key(&mut self, event_loop: &ActiveEventLoop, key: &Key) {
        let centre = self.window_pos + self.size() * 0.5;
        let Mode::Calibrating(wizard) = &mut self.mode else {
            return;
        };
        let finished = match key {
            Key::Named(NamedKey::Enter) => match wizard.confirm(centre) {
                Some(done) => Some(done),
                None => {
                    let step = wizard.step();
                    self.show_step(step);
                    None
                }
            },
            Key::Named(NamedKey::Escape) => {
                log::info!("Calibration skipped, using the work area");
                Some(EdgeCalibration::from_work_area(self.screen))
            }
            _ => None,
        };

        if let Some(calibration) = finished {
            self.config.edge_calibration = calibration;
            if let Err(e) = config::save_atomic(&self.config_path, &self.config) {
                log::warn!("Could not save calibration: {e}");
            }
            self.calib_drag = None;
            if let Some(window) = &self.window {
                window.set_title(WINDOW_TITLE);
            }
            self.start_pet(event_loop);
        }
    }

    fn calibration_pointer(&mut self, button: MouseButton, state: ElementState) {
        if button != MouseButton::Left {
            return;
        }
        self.calib_drag = match state {
            ElementState::Pressed => Some((self.window_pos + self.cursor, self.window_pos)),
            ElementState::Released => None,
        };
    }

    // ---- Input ----

    fn pointer(&mut self, button: MouseButton, state: ElementState) {
        let button = match button {
            MouseButton::Left => Button::Left,
            MouseButton::Right => Button::Right,
            _ => return,
        };
        let local = self.cursor;
        let screen = self.origin() + local;
        self.send(match state {
            ElementState::Pressed => Trigger::PointerDown {
                button,
                local,
                screen,
            },
            ElementState::Released => Trigger::PointerUp {
                button,
                local,
                screen,
            },
        });
    }

    fn cursor_moved(&mut self, local: Vec2) {
        self.cursor = local;
        let screen = self.origin() + local;
        if let Mode::Calibrating(_) = self.mode {
            if let Some((press_screen, press_window)) = self.calib_drag {
                self.move_window(press_window + (screen - press_screen));
            }
            return;
        }
        self.send(Trigger::PointerMove { local, screen });
    }

    fn window_moved(&mut self, pos: Vec2) {
        if self.pet.is_none() {
            self.window_pos = pos;
            return;
        }
        self.send(Trigger::WindowMoved(pos));

        // Dragged onto another monitor?
        if let Some(window) = &self.window {
            let screen = screen_bounds(window);
            if screen != self.screen {
                self.screen = screen;
                let bounds = self.movement_bounds();
                self.send(Trigger::ScreenChanged(bounds));
            }
        }
    }
}

fn frame_title(path: &std::path::Path) -> String {
    format!("{WINDOW_TITLE} - {}", path.display())
}

/// Work area of the monitor the window is on, or the whole monitor where
/// the platform cannot tell.
fn screen_bounds(window: &Window) -> Bounds {
    if let Some(area) = platform::work_area() {
        return area;
    }
    window
        .current_monitor()
        .or_else(|| window.primary_monitor())
        .map(|m| {
            let p = m.position();
            let s = m.size();
            Bounds::from_origin_size(
                Vec2::new(p.x as f32, p.y as f32),
                Vec2::new(s.width as f32, s.height as f32),
            )
        })
        .unwrap_or_else(|| Bounds::from_origin_size(Vec2::ZERO, FALLBACK_SCREEN))
}

impl ApplicationHandler<UserEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let size = self.size();
        let attrs = WindowAttributes::default()
            .with_title(WINDOW_TITLE)
            .with_decorations(false)
            .with_transparent(true)
            .with_resizable(false)
            .with_window_level(WindowLevel::AlwaysOnTop)
            .with_inner_size(PhysicalSize::new(size.x as u32, size.y as u32));

        let window = match event_loop.create_window(attrs) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                log::error!("Failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };

        self.screen = screen_bounds(&window);
        self.window = Some(window);

        // Bottom edge, near the right.
        let start = Vec2::new(
            self.screen.right - size.x - START_OFFSET_X,
            self.screen.bottom - size.y,
        );
        self.move_window(start);
        log::info!(
            "Pet window {}x{} at ({:.0}, {:.0})",
            size.x,
            size.y,
            start.x,
            start.y
        );

        if self.config.use_calibration && !self.config.edge_calibration.is_calibrated() {
            self.begin_calibration();
        } else {
            self.start_pet(event_loop);
        }
    }

    fn user_event(&mut self, event_loop: &ActiveEventLoop, event: UserEvent) {
        match event {
            UserEvent::Audio(active) => {
                self.audio_active = active;
                self.send(Trigger::Audio { active });
            }
        }
        self.apply_effects(event_loop);
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        let now = self.now();
        if let Some(pet) = self.pet.as_mut() {
            pet.advance(now);
        }
        self.apply_effects(event_loop);

        let deadline = self.pet.as_ref().and_then(|p| p.next_deadline());
        event_loop.set_control_flow(match deadline {
            Some(at) => ControlFlow::WaitUntil(self.clock + at),
            None => ControlFlow::Wait,
        });
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                if self.pet.is_some() {
                    log::info!("Close requested, saying goodbye");
                    self.send(Trigger::Quit);
                } else {
                    log::info!("Close requested, exiting");
                    event_loop.exit();
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor_moved(Vec2::new(position.x as f32, position.y as f32));
            }
            WindowEvent::MouseInput { state, button, .. } => match self.mode {
                Mode::Calibrating(_) => self.calibration_pointer(button, state),
                Mode::Running => self.pointer(button, state),
            },
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key,
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => match self.mode {
                Mode::Calibrating(_) => self.calibration_key(event_loop, &logical_key),
                Mode::Running => {
                    if let Some(command) = menu::key_command(&logical_key, &self.registry) {
                        log::debug!("Key {:?} -> {:?}", logical_key, command);
                        self.send(command.into_trigger());
                    }
                }
            },
            WindowEvent::Moved(pos) => self.window_moved(Vec2::new(pos.x as f32, pos.y as f32)),
            _ => {}
        }
        self.apply_effects(event_loop);
    }
}

/// Entry point: load config, warm the frame cache, start the audio monitor
/// and run the event loop.
pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = config::config_path();
    log::info!("Config: {}", config_path.display());
    let config = config::load(&config_path);

    let assets = config.assets_root(&config_path);
    let mut cache = FrameCache::new(DirFrameSource::new(&assets));
    frames::precache(&assets, &mut cache);

    let event_loop = EventLoop::<UserEvent>::with_user_event().build()?;

    // The only cross-thread hand-off: audio edges become loop events.
    let proxy = event_loop.create_proxy();
    if let Err(e) = audio::spawn_monitor(audio::platform_probe(), config.audio_poll(), move |active| {
        proxy.send_event(UserEvent::Audio(active)).is_ok()
    }) {
        log::warn!("Audio monitor unavailable: {e}");
    }

    let mut app = App::new(config_path, config, assets, cache);
    event_loop.run_app(&mut app)?;
    Ok(())
}
