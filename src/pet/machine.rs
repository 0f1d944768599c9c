use std::time::Duration;

use glam::Vec2;

use super::dance::{AudioEdge, DanceArbiter};
use super::movement::{Bounds, MoveDirection, MoveSession, MoveStep, MovementController};
use super::pointer::{Button, PressArbiter, PressOutcome};
use super::state::{
    AnimationState, Next, PathRule, Phase, AUTO_TRIGGERED, CLICK_BODY, CLICK_HEAD, DRAG_PREVIEW,
    RIGHT_DRAG_PREVIEW,
};
use super::timers::{TimerKind, Timers};
use super::{Effect, Trigger, Tuning};
use crate::activity::{Activity, ActivityRegistry};
use crate::frames::{empty_clip, Clip, FrameSource};

/// Guard against a runaway timer storm inside one `advance` call.
const MAX_FIRINGS_PER_ADVANCE: usize = 10_000;

const DEFAULT_SIZE: Vec2 = Vec2::new(300.0, 300.0);
const DEFAULT_SCREEN: Vec2 = Vec2::new(1920.0, 1080.0);

/// The pet's animation state machine.
///
/// Single-threaded and clock-free: the host passes the current monotonic time
/// into every call, runs [`advance`](Self::advance) when
/// [`next_deadline`](Self::next_deadline) comes due, and applies whatever
/// [`drain_effects`](Self::drain_effects) hands back.
pub struct PetMachine<F> {
    frames: F,
    tuning: Tuning,
    rng: fastrand::Rng,
    registry: ActivityRegistry,

    // Current clip
    state: AnimationState,
    path: String,
    clip: Clip,
    frame_index: usize,
    looping: bool,
    next: Next,

    timers: Timers,
    left: PressArbiter,
    right: PressArbiter,
    movement: MovementController,
    dance: DanceArbiter,
    activity: Option<&'static Activity>,

    // Window geometry, screen pixels
    pos: Vec2,
    size: Vec2,

    effects: Vec<Effect>,
    exited: bool,
}

impl<F: FrameSource> PetMachine<F> {
    pub fn new(frames: F, tuning: Tuning, rng: fastrand::Rng) -> Self {
        Self {
            frames,
            rng,
            registry: ActivityRegistry::builtin(),
            state: AnimationState::Startup,
            path: String::new(),
            clip: empty_clip(),
            frame_index: 0,
            looping: false,
            next: Next::Stay,
            timers: Timers::new(),
            left: PressArbiter::new(tuning.drag_threshold),
            right: PressArbiter::new(tuning.drag_threshold),
            movement: MovementController::new(
                Bounds::from_origin_size(Vec2::ZERO, DEFAULT_SCREEN),
                tuning.movement,
            ),
            dance: DanceArbiter::new(true, tuning.dance_min),
            activity: None,
            pos: Vec2::ZERO,
            size: DEFAULT_SIZE,
            effects: Vec::new(),
            exited: false,
            tuning,
        }
    }

    pub fn with_window(mut self, pos: Vec2, size: Vec2, bounds: Bounds) -> Self {
        self.pos = pos;
        self.size = size;
        self.movement.bounds = bounds;
        self
    }

    pub fn with_dance_enabled(mut self, enabled: bool) -> Self {
        self.dance.set_enabled(enabled);
        self
    }

    /// Play the startup clip and begin the periodic housekeeping.
    pub fn start(&mut self, now: Duration) {
        log::info!(
            "Pet starting at ({:.0}, {:.0}), {}x{}",
            self.pos.x,
            self.pos.y,
            self.size.x,
            self.size.y
        );
        self.timers
            .start_periodic(TimerKind::CacheCleanup, now, self.tuning.cache_cleanup);
        self.enter(now, AnimationState::Startup, None);
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn current_activity(&self) -> Option<&'static Activity> {
        self.activity
    }

    pub fn dance_enabled(&self) -> bool {
        self.dance.is_enabled()
    }

    pub fn position(&self) -> Vec2 {
        self.pos
    }

    /// When the host should next call [`advance`](Self::advance).
    pub fn next_deadline(&self) -> Option<Duration> {
        self.timers.next_deadline()
    }

    pub fn drain_effects(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.effects)
    }

    // -----------------------------------------------------------------------
    // Entry points
    // -----------------------------------------------------------------------

    /// Fire every timer that is due at `now`, earliest first.
    pub fn advance(&mut self, now: Duration) {
        let mut fired = 0;
        while let Some(kind) = self.timers.pop_due(now) {
            log::trace!("{} timer fired at {:?}", kind.label(), now);
            self.on_timer(now, kind);
            fired += 1;
            if fired >= MAX_FIRINGS_PER_ADVANCE {
                log::warn!("Timer storm: {} firings in one advance, yielding", fired);
                break;
            }
        }
    }

    pub fn handle(&mut self, now: Duration, trigger: Trigger) {
        if self.exited || self.state == AnimationState::Shutdown {
            log::trace!("Ignoring {:?} while shutting down", trigger);
            return;
        }

        match trigger {
            Trigger::PointerDown { button, screen, .. } => self.on_pointer_down(now, button, screen),
            Trigger::PointerMove { screen, .. } => self.on_pointer_move(now, screen),
            Trigger::PointerUp { button, local, .. } => self.on_pointer_up(now, button, local),
            Trigger::Audio { active } => self.on_audio(now, active),
            Trigger::StartActivity(id) => self.start_activity(now, &id),
            Trigger::StopActivity => self.stop_activity(now),
            Trigger::SetDanceEnabled(enabled) => self.set_dance_enabled(now, enabled),
            Trigger::ToggleDance => self.set_dance_enabled(now, !self.dance.is_enabled()),
            Trigger::Quit => self.quit(now),
            Trigger::WindowMoved(pos) => {
                // Our own moves echo back late; trust ourselves while driving.
                if !self.is_driving_window() {
                    self.pos = pos;
                }
            }
            Trigger::ScreenChanged(bounds) => {
                log::debug!("Movement bounds now {:?}", bounds);
                self.movement.bounds = bounds;
            }
        }
    }

    /// Switch to `state`. `path` overrides the state's own path rule.
    ///
    /// Stops the previous frame ticker (and movement, when leaving the move
    /// loop), loads the new clip and starts ticking it. A clip with no frames
    /// still becomes the current state; a looping one just sits there, a
    /// one-shot completes on the next [`advance`](Self::advance).
    pub fn enter(&mut self, now: Duration, state: AnimationState, path: Option<String>) {
        if self.exited {
            return;
        }

        self.timers.stop(TimerKind::Frame);
        if self.movement.is_moving() && state != AnimationState::MoveLoop {
            self.movement.halt();
            self.timers.stop(TimerKind::Movement);
        }
        if self.dance.is_dancing() && !state.is_music() {
            self.dance.interrupt();
            self.timers.stop(TimerKind::DanceStop);
        }
        if !state.is_move() && state != AnimationState::AutoTriggered {
            self.movement.set_session(None);
        }

        let path = self.resolve_path(state, path);
        let spec = state.spec();
        self.clip = if path.is_empty() {
            empty_clip()
        } else {
            self.frames.resolve(&path)
        };
        self.state = state;
        self.path = path;
        self.frame_index = 0;
        self.looping = spec.looping;
        self.next = spec.next;

        log::debug!(
            "Enter {:?} '{}' ({} frames)",
            state,
            self.path,
            self.clip.len()
        );

        if state == AnimationState::Idle {
            self.arm_idle(now);
        }
        if state == AnimationState::MoveLoop && self.movement.begin() {
            self.timers
                .start_periodic(TimerKind::Movement, now, self.tuning.move_interval);
        }

        if !self.clip.is_empty() {
            self.timers
                .start_periodic(TimerKind::Frame, now, self.tuning.frame_interval);
        } else if state == AnimationState::Shutdown {
            // Nothing to play on the way out.
            self.terminate();
        } else if !self.looping {
            // Nothing to play: finish on the next advance so the table still
            // moves on.
            self.timers.start_once(TimerKind::Frame, now, Duration::ZERO);
        }
    }

    // -----------------------------------------------------------------------
    // Clip playback
    // -----------------------------------------------------------------------

    fn resolve_path(&mut self, state: AnimationState, given: Option<String>) -> String {
        match state.spec().path {
            PathRule::Literal(p) | PathRule::Given(p) => given.unwrap_or_else(|| p.to_string()),
            PathRule::AutoPick => {
                let path = given.unwrap_or_else(|| self.pick(&AUTO_TRIGGERED).to_string());
                self.movement.set_session(MoveSession::from_path(&path));
                path
            }
            PathRule::Activity(phase) => given.unwrap_or_else(|| {
                self.activity
                    .map(|a| phase.apply(a.prefix))
                    .unwrap_or_default()
            }),
            PathRule::Move(Phase::Start) => {
                let session = given
                    .as_deref()
                    .and_then(MoveSession::from_path)
                    .or_else(|| {
                        let dir = self.default_direction(state)?;
                        MoveSession::from_path(&dir.default_prefix())
                    });
                let path = session
                    .as_ref()
                    .map(|s| s.prefix.clone())
                    .unwrap_or_default();
                self.movement.set_session(session);
                path
            }
            PathRule::Move(phase) => given.unwrap_or_else(|| {
                self.movement
                    .session()
                    .map(|s| phase.apply(&s.prefix))
                    .unwrap_or_default()
            }),
        }
    }

    fn on_timer(&mut self, now: Duration, kind: TimerKind) {
        match kind {
            TimerKind::Frame => self.on_frame_tick(now),
            TimerKind::Idle => self.on_idle_tick(now),
            TimerKind::LeftPress => self.on_press_timeout(now, Button::Left),
            TimerKind::RightPress => self.on_press_timeout(now, Button::Right),
            TimerKind::Movement => self.on_move_tick(now),
            TimerKind::DanceStart => self.on_dance_start(now),
            TimerKind::DanceStop => {
                if self.dance.is_dancing() {
                    self.end_dance(now);
                }
            }
            TimerKind::CacheCleanup => self.frames.housekeep(),
        }
    }

    /// Show the current frame and step. Looping clips wrap without
    /// re-showing, so the seam gets the same spacing as every other frame.
    fn on_frame_tick(&mut self, now: Duration) {
        if let Some(frame) = self.clip.get(self.frame_index) {
            self.effects.push(Effect::ShowFrame(frame.clone()));
        }
        self.frame_index += 1;
        if self.frame_index < self.clip.len() {
            return;
        }
        if self.looping {
            self.frame_index = 0;
        } else {
            self.timers.stop(TimerKind::Frame);
            self.complete(now);
        }
    }

    /// A one-shot clip ran out.
    fn complete(&mut self, now: Duration) {
        match self.next {
            Next::Stay => {}
            Next::State(next) => {
                if self.state == AnimationState::ActivityEnd {
                    self.finish_activity();
                }
                self.enter(now, next, None);
            }
            Next::IdleOrMoveLoop => {
                if self.movement.session().is_some() {
                    self.enter(now, AnimationState::MoveLoop, None);
                } else {
                    self.enter(now, AnimationState::Idle, None);
                }
            }
            Next::Terminate => self.terminate(),
        }
    }

    fn terminate(&mut self) {
        log::info!("Shutdown animation done, exiting");
        self.timers.stop_all();
        self.exited = true;
        self.effects.push(Effect::Exit);
    }

    fn pick<'a>(&mut self, set: &[&'a str]) -> &'a str {
        set[self.rng.usize(..set.len())]
    }

    // -----------------------------------------------------------------------
    // Idle trigger
    // -----------------------------------------------------------------------

    fn arm_idle(&mut self, now: Duration) {
        let span = self
            .tuning
            .idle_max
            .saturating_sub(self.tuning.idle_min)
            .as_millis() as u64;
        let jitter = if span == 0 { 0 } else { self.rng.u64(..span) };
        self.timers.start_once(
            TimerKind::Idle,
            now,
            self.tuning.idle_min + Duration::from_millis(jitter),
        );
    }

    fn idle_eligible(&self) -> bool {
        self.state == AnimationState::Idle
            && self.activity.is_none()
            && !self.movement.is_moving()
            && !self.left.is_engaged()
            && !self.right.is_engaged()
    }

    fn on_idle_tick(&mut self, now: Duration) {
        if self.idle_eligible() {
            self.auto_trigger(now);
        } else {
            log::trace!("Idle trigger skipped in {:?}", self.state);
        }
        // Always re-arm, busy or not, so the trigger can never go quiet.
        if !self.exited {
            self.arm_idle(now);
        }
    }

    fn auto_trigger(&mut self, now: Duration) {
        if self.rng.f32() < self.tuning.movement.move_chance {
            if let Some(session) = self.movement.select(self.pos, self.size, &mut self.rng) {
                log::debug!("Idle trigger: moving {:?}", session.direction);
                self.enter(now, start_state(session.direction), Some(session.prefix));
                return;
            }
        }
        let path = self.pick(&AUTO_TRIGGERED).to_string();
        self.enter(now, AnimationState::AutoTriggered, Some(path));
    }

    // -----------------------------------------------------------------------
    // Movement
    // -----------------------------------------------------------------------

    /// Direction for a move start state entered without an explicit path.
    fn default_direction(&self, state: AnimationState) -> Option<MoveDirection> {
        match state {
            AnimationState::MoveHorizontalLeftToRight => Some(MoveDirection::LeftToRight),
            AnimationState::MoveHorizontalRightToLeft => Some(MoveDirection::RightToLeft),
            AnimationState::MoveVerticalBottomToTop => Some(MoveDirection::BottomToTop),
            AnimationState::MoveVerticalTopToBottom => Some(MoveDirection::TopToBottom),
            AnimationState::MoveTopSwing => Some(MoveDirection::TopSwing {
                rightward: self.pos.x + self.size.x * 0.5 < self.movement.bounds.center_x(),
            }),
            _ => None,
        }
    }

    fn on_move_tick(&mut self, now: Duration) {
        match self.movement.tick(self.pos, self.size) {
            None => self.timers.stop(TimerKind::Movement),
            Some(MoveStep::Continue(pos)) => self.set_position(pos),
            Some(MoveStep::Arrived(pos)) => {
                self.set_position(pos);
                log::debug!("Reached edge at ({:.0}, {:.0})", pos.x, pos.y);
                self.movement.halt();
                self.timers.stop(TimerKind::Movement);
                self.enter(now, AnimationState::MoveEnd, None);
            }
        }
    }

    fn set_position(&mut self, pos: Vec2) {
        if pos != self.pos {
            self.pos = pos;
            self.effects.push(Effect::MoveWindow(pos));
        }
    }

    fn is_driving_window(&self) -> bool {
        self.movement.is_moving() || self.left.is_dragging() || self.right.is_dragging()
    }

    // -----------------------------------------------------------------------
    // Pointer
    // -----------------------------------------------------------------------

    fn arbiter_mut(&mut self, button: Button) -> &mut PressArbiter {
        match button {
            Button::Left => &mut self.left,
            Button::Right => &mut self.right,
        }
    }

    fn on_pointer_down(&mut self, now: Duration, button: Button, screen: Vec2) {
        let window = self.pos;
        self.arbiter_mut(button).press(screen, window);
        self.timers
            .start_once(press_timer(button), now, self.tuning.press_debounce);
    }

    fn on_pointer_move(&mut self, now: Duration, screen: Vec2) {
        for button in [Button::Left, Button::Right] {
            match self.arbiter_mut(button).moved(screen) {
                PressOutcome::DragStart => {
                    self.timers.stop(press_timer(button));
                    self.on_drag_start(now, button);
                    if let Some(target) = self.arbiter_mut(button).drag_target(screen) {
                        self.set_position(target);
                    }
                }
                PressOutcome::DragMove { window } => self.set_position(window),
                _ => {}
            }
        }
    }

    fn on_pointer_up(&mut self, now: Duration, button: Button, local: Vec2) {
        self.timers.stop(press_timer(button));
        match self.arbiter_mut(button).release(local) {
            PressOutcome::Click { local } => self.on_click(now, button, local),
            PressOutcome::DragEnd => self.on_drag_end(now, button),
            _ => {}
        }
    }

    fn on_press_timeout(&mut self, now: Duration, button: Button) {
        if self.arbiter_mut(button).timeout() == PressOutcome::DragStart {
            self.on_drag_start(now, button);
        }
    }

    fn on_click(&mut self, now: Duration, button: Button, local: Vec2) {
        if button == Button::Right {
            log::debug!("Right click, opening menu");
            self.effects.push(Effect::OpenMenu);
            return;
        }
        if let Some(activity) = self.activity {
            log::debug!("Click ignored during '{}'", activity.id);
            return;
        }

        // Top third of the window is the head.
        let path = if local.y <= self.size.y / 3.0 {
            CLICK_HEAD
        } else {
            self.pick(&CLICK_BODY)
        };
        self.enter(now, AnimationState::ClickTriggered, Some(path.to_string()));
    }

    fn on_drag_start(&mut self, now: Duration, button: Button) {
        // The window still follows the pointer; only the reaction is skipped.
        if self.activity.is_some() {
            return;
        }
        let (preview, state) = match button {
            Button::Left => (DRAG_PREVIEW, AnimationState::DragTriggered),
            Button::Right => (RIGHT_DRAG_PREVIEW, AnimationState::RightDragTriggered),
        };
        if let Some(frame) = self.frames.still(preview, 0) {
            self.effects.push(Effect::ShowFrame(frame));
        }
        self.enter(now, state, None);
    }

    fn on_drag_end(&mut self, now: Duration, button: Button) {
        let (triggered, looping, end) = match button {
            Button::Left => (
                AnimationState::DragTriggered,
                AnimationState::DragLoop,
                AnimationState::DragEnd,
            ),
            Button::Right => (
                AnimationState::RightDragTriggered,
                AnimationState::RightDragLoop,
                AnimationState::RightDragEnd,
            ),
        };
        if self.state == triggered || self.state == looping {
            self.enter(now, end, None);
        }
    }

    // -----------------------------------------------------------------------
    // Dancing
    // -----------------------------------------------------------------------

    fn dance_eligible(&self) -> bool {
        self.state == AnimationState::Idle
            && self.activity.is_none()
            && !self.movement.is_moving()
            && !self.left.is_engaged()
            && !self.right.is_engaged()
    }

    fn on_audio(&mut self, now: Duration, active: bool) {
        match self.dance.signal(active, now) {
            AudioEdge::Rose => {
                self.timers.stop(TimerKind::DanceStop);
                if !self.dance.is_dancing() && self.dance.is_enabled() {
                    self.timers
                        .start_once(TimerKind::DanceStart, now, self.tuning.dance_min);
                }
            }
            AudioEdge::Fell => {
                self.timers.stop(TimerKind::DanceStart);
                if self.dance.is_dancing() {
                    if self.tuning.dance_stop_grace.is_zero() {
                        self.end_dance(now);
                    } else {
                        self.timers.start_once(
                            TimerKind::DanceStop,
                            now,
                            self.tuning.dance_stop_grace,
                        );
                    }
                }
            }
            AudioEdge::Unchanged => {}
        }
    }

    fn on_dance_start(&mut self, now: Duration) {
        if !self.dance.is_counting() || !self.dance.is_enabled() {
            return;
        }
        if self.dance.sustained(now) && self.dance_eligible() {
            log::info!("Music has been playing a while, dancing");
            self.dance.begin_dance();
            self.enter(now, AnimationState::MusicTriggered, None);
        } else {
            // Still playing but the pet is busy; look again shortly.
            self.timers
                .start_once(TimerKind::DanceStart, now, self.tuning.dance_retry);
        }
    }

    fn end_dance(&mut self, now: Duration) {
        self.dance.end_dance();
        self.timers.stop(TimerKind::DanceStop);
        if matches!(
            self.state,
            AnimationState::MusicTriggered | AnimationState::MusicLoop
        ) {
            self.enter(now, AnimationState::MusicEnd, None);
        }
    }

    fn set_dance_enabled(&mut self, now: Duration, enabled: bool) {
        if enabled == self.dance.is_enabled() {
            return;
        }
        self.dance.set_enabled(enabled);
        log::info!("Dancing {}", if enabled { "enabled" } else { "disabled" });
        self.effects.push(Effect::DanceEnabledChanged(enabled));

        if enabled {
            if self.dance.restart_count(now) {
                self.timers
                    .start_once(TimerKind::DanceStart, now, self.tuning.dance_min);
            }
        } else {
            self.timers.stop(TimerKind::DanceStart);
            if self.dance.is_dancing() {
                self.end_dance(now);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Activities and shutdown
    // -----------------------------------------------------------------------

    fn start_activity(&mut self, now: Duration, id: &str) {
        let Some(activity) = self.registry.find(id) else {
            log::debug!("Unknown activity '{}' ignored", id);
            return;
        };
        log::info!("Starting activity '{}'", activity.id);
        self.activity = Some(activity);
        self.enter(now, AnimationState::ActivityStart, None);
    }

    fn stop_activity(&mut self, now: Duration) {
        let Some(activity) = self.activity else {
            return;
        };
        if self.state == AnimationState::ActivityEnd {
            // Asked again while winding down: don't wait on the clip.
            self.finish_activity();
            self.enter(now, AnimationState::Idle, None);
            return;
        }
        log::info!("Stopping activity '{}'", activity.id);
        self.enter(now, AnimationState::ActivityEnd, None);
    }

    fn finish_activity(&mut self) {
        if let Some(activity) = self.activity.take() {
            log::info!("Activity '{}' finished", activity.id);
        }
    }

    fn quit(&mut self, now: Duration) {
        log::info!("Shutting down");
        self.timers.stop_all();
        self.left.cancel();
        self.right.cancel();
        self.enter(now, AnimationState::Shutdown, None);
    }
}

#[cfg(test)]
impl<F: FrameSource> PetMachine<F> {
    pub fn state(&self) -> AnimationState {
        self.state
    }

    /// Animation path of the current state ("" when it has none).
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn clip_len(&self) -> usize {
        self.clip.len()
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    pub fn is_moving(&self) -> bool {
        self.movement.is_moving()
    }

    pub fn is_dancing(&self) -> bool {
        self.dance.is_dancing()
    }

    pub fn has_exited(&self) -> bool {
        self.exited
    }

    pub fn timer_armed(&self, kind: TimerKind) -> bool {
        self.timers.is_armed(kind)
    }

    pub fn timer_due(&self, kind: TimerKind) -> Option<Duration> {
        self.timers.due_at(kind)
    }
}

fn press_timer(button: Button) -> TimerKind {
    match button {
        Button::Left => TimerKind::LeftPress,
        Button::Right => TimerKind::RightPress,
    }
}

fn start_state(direction: MoveDirection) -> AnimationState {
    match direction {
        MoveDirection::LeftToRight => AnimationState::MoveHorizontalLeftToRight,
        MoveDirection::RightToLeft => AnimationState::MoveHorizontalRightToLeft,
        MoveDirection::BottomToTop => AnimationState::MoveVerticalBottomToTop,
        MoveDirection::TopToBottom => AnimationState::MoveVerticalTopToBottom,
        MoveDirection::TopSwing { .. } => AnimationState::MoveTopSwing,
    }
}
