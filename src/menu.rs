//! Right-click context menu: activities, the dance toggle and quit.
//! Shown as a native popup on Windows; elsewhere the same commands are
//! bound to keys.

use winit::keyboard::{Key, NamedKey};
use winit::window::Window;

use crate::activity::{Activity, ActivityRegistry};
use crate::pet::Trigger;

/// Commands the menu can produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuCommand {
    StartActivity(String),
    StopActivity,
    /// The menu item carries the value it switches to.
    SetDanceEnabled(bool),
    ToggleDance,
    Quit,
}

impl MenuCommand {
    pub fn into_trigger(self) -> Trigger {
        match self {
            MenuCommand::StartActivity(id) => Trigger::StartActivity(id),
            MenuCommand::StopActivity => Trigger::StopActivity,
            MenuCommand::SetDanceEnabled(on) => Trigger::SetDanceEnabled(on),
            MenuCommand::ToggleDance => Trigger::ToggleDance,
            MenuCommand::Quit => Trigger::Quit,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuItem {
    Action {
        label: String,
        command: MenuCommand,
        checked: bool,
    },
    Separator,
}

fn action(label: &str, command: MenuCommand, checked: bool) -> MenuItem {
    MenuItem::Action {
        label: label.to_string(),
        command,
        checked,
    }
}

pub fn build_items(
    registry: &ActivityRegistry,
    current: Option<&Activity>,
    dance_enabled: bool,
) -> Vec<MenuItem> {
    let mut items: Vec<MenuItem> = registry
        .all()
        .iter()
        .map(|a| {
            if current.is_some_and(|c| c.id == a.id) {
                action(a.stop_label, MenuCommand::StopActivity, false)
            } else {
                action(a.start_label, MenuCommand::StartActivity(a.id.to_string()), false)
            }
        })
        .collect();

    items.push(MenuItem::Separator);
    items.push(action(
        "Dance to music",
        MenuCommand::SetDanceEnabled(!dance_enabled),
        dance_enabled,
    ));
    items.push(MenuItem::Separator);
    items.push(action("Quit", MenuCommand::Quit, false));
    items
}

/// Keyboard equivalents: `1`-`9` start an activity, `S` stops it, `D`
/// toggles dancing, `Q`/`Escape` quits.
pub fn key_command(key: &Key, registry: &ActivityRegistry) -> Option<MenuCommand> {
    match key {
        Key::Named(NamedKey::Escape) => Some(MenuCommand::Quit),
        Key::Character(s) => {
            let c = s.chars().next()?.to_ascii_lowercase();
            match c {
                '1'..='9' => {
                    let index = c as usize - '1' as usize;
                    let activity = registry.all().get(index)?;
                    Some(MenuCommand::StartActivity(activity.id.to_string()))
                }
                's' => Some(MenuCommand::StopActivity),
                'd' => Some(MenuCommand::ToggleDance),
                'q' => Some(MenuCommand::Quit),
                _ => None,
            }
        }
        _ => None,
    }
}

/// Pop the menu up at the cursor. Blocks until it closes.
#[cfg(windows)]
pub fn show_popup(window: &Window, items: &[MenuItem]) -> Option<MenuCommand> {
    let hwnd = crate::platform::win32::get_hwnd(window)?;
    let index = crate::platform::win32::track_popup(hwnd, items)?;
    match items.get(index)? {
        MenuItem::Action { command, .. } => Some(command.clone()),
        MenuItem::Separator => None,
    }
}

#[cfg(not(windows))]
pub fn show_popup(_window: &Window, items: &[MenuItem]) -> Option<MenuCommand> {
    let labels: Vec<&str> = items
        .iter()
        .filter_map(|item| match item {
            MenuItem::Action { label, .. } => Some(label.as_str()),
            MenuItem::Separator => None,
        })
        .collect();
    log::info!(
        "Menu: {} (keys: 1-9 activity, S stop, D dance, Q quit)",
        labels.join(" | ")
    );
    None
}
