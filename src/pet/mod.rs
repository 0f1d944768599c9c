pub mod dance;
pub mod machine;
pub mod movement;
pub mod pointer;
pub mod state;
pub mod timers;

use std::path::PathBuf;
use std::time::Duration;

use glam::Vec2;

pub use machine::PetMachine;
pub use movement::{Bounds, MoveTuning};
pub use pointer::Button;

/// Timing knobs for the pet. Defaults match the stock config file.
#[derive(Debug, Clone, Copy)]
pub struct Tuning {
    pub frame_interval: Duration,
    /// Idle trigger interval is uniform in `[idle_min, idle_max)`.
    pub idle_min: Duration,
    pub idle_max: Duration,
    pub press_debounce: Duration,
    pub move_interval: Duration,
    pub dance_min: Duration,
    pub dance_retry: Duration,
    /// Audio gap tolerated before a dance winds down. Zero ends it at once.
    pub dance_stop_grace: Duration,
    pub cache_cleanup: Duration,
    pub drag_threshold: f32,
    pub movement: MoveTuning,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            frame_interval: Duration::from_millis(200),
            idle_min: Duration::from_millis(5000),
            idle_max: Duration::from_millis(15000),
            press_debounce: Duration::from_millis(500),
            move_interval: Duration::from_millis(50),
            dance_min: Duration::from_millis(3000),
            dance_retry: Duration::from_millis(1000),
            dance_stop_grace: Duration::from_millis(1000),
            cache_cleanup: Duration::from_secs(60),
            drag_threshold: 5.0,
            movement: MoveTuning::default(),
        }
    }
}

/// Everything the host can tell the pet.
#[derive(Debug, Clone, PartialEq)]
pub enum Trigger {
    /// `local` is window-relative, `screen` absolute.
    PointerDown {
        button: Button,
        local: Vec2,
        screen: Vec2,
    },
    PointerMove {
        local: Vec2,
        screen: Vec2,
    },
    PointerUp {
        button: Button,
        local: Vec2,
        screen: Vec2,
    },
    Audio {
        active: bool,
    },
    StartActivity(String),
    StopActivity,
    SetDanceEnabled(bool),
    ToggleDance,
    Quit,
    /// The window manager put the window somewhere.
    WindowMoved(Vec2),
    ScreenChanged(Bounds),
}

/// Everything the pet asks of the host.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    ShowFrame(PathBuf),
    /// New top-left corner for the pet window.
    MoveWindow(Vec2),
    OpenMenu,
    DanceEnabledChanged(bool),
    Exit,
}
