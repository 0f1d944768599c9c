use glam::Vec2;

/// Root of every movement animation path.
const MOVE_ROOT: &str = "autoTriggered/move";

/// Rectangle the pet window must stay inside, in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl Bounds {
    pub fn from_origin_size(origin: Vec2, size: Vec2) -> Self {
        Self {
            left: origin.x,
            top: origin.y,
            right: origin.x + size.x,
            bottom: origin.y + size.y,
        }
    }

    pub fn center_x(&self) -> f32 {
        (self.left + self.right) * 0.5
    }

    /// Pull a window of `size` at `pos` back inside the bounds.
    /// If the window is larger than the bounds it is pinned to the top-left.
    pub fn clamp(&self, pos: Vec2, size: Vec2) -> Vec2 {
        Vec2::new(
            pos.x.min(self.right - size.x).max(self.left),
            pos.y.min(self.bottom - size.y).max(self.top),
        )
    }
}

/// Which screen edges the window is touching.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EdgeContact {
    pub left: bool,
    pub right: bool,
    pub top: bool,
    pub bottom: bool,
}

impl EdgeContact {
    pub fn measure(pos: Vec2, size: Vec2, bounds: &Bounds, margin: f32) -> Self {
        Self {
            left: pos.x <= bounds.left + margin,
            right: pos.x + size.x >= bounds.right - margin,
            top: pos.y <= bounds.top + margin,
            bottom: pos.y + size.y >= bounds.bottom - margin,
        }
    }

    pub fn any(&self) -> bool {
        self.left || self.right || self.top || self.bottom
    }
}

/// Axis and heading of a movement animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    LeftToRight,
    RightToLeft,
    /// Climbing.
    BottomToTop,
    /// Falling.
    TopToBottom,
    /// Hanging from the top edge, swinging sideways.
    TopSwing { rightward: bool },
}

impl MoveDirection {
    /// Read the direction back out of a movement path.
    pub fn from_path(path: &str) -> Option<Self> {
        let rest = path.strip_prefix(MOVE_ROOT)?.strip_prefix('/')?;
        let mut parts = rest.split('/');
        match (parts.next()?, parts.next()?) {
            ("horizontal", "top") => match parts.next()? {
                "leftToRight" => Some(Self::TopSwing { rightward: true }),
                "rightToLeft" => Some(Self::TopSwing { rightward: false }),
                _ => None,
            },
            ("horizontal", "leftToRight") => Some(Self::LeftToRight),
            ("horizontal", "rightToLeft") => Some(Self::RightToLeft),
            ("vertical", "bottomToTop") => Some(Self::BottomToTop),
            ("vertical", "topToBottom") => Some(Self::TopToBottom),
            _ => None,
        }
    }

    /// Path prefix used when a direction is requested without a concrete clip.
    pub fn default_prefix(self) -> String {
        match self {
            Self::LeftToRight => format!("{MOVE_ROOT}/horizontal/leftToRight/walk"),
            Self::RightToLeft => format!("{MOVE_ROOT}/horizontal/rightToLeft/walk"),
            Self::BottomToTop => format!("{MOVE_ROOT}/vertical/bottomToTop/climb.left"),
            Self::TopToBottom => format!("{MOVE_ROOT}/vertical/topToBottom/fall"),
            Self::TopSwing { rightward } => swing_prefix(rightward),
        }
    }
}

fn heading(rightward: bool) -> &'static str {
    if rightward {
        "leftToRight"
    } else {
        "rightToLeft"
    }
}

fn swing_prefix(rightward: bool) -> String {
    format!("{MOVE_ROOT}/horizontal/top/{}/swing", heading(rightward))
}

/// The movement that is currently driving the window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveSession {
    pub prefix: String,
    pub direction: MoveDirection,
}

impl MoveSession {
    pub fn from_path(prefix: &str) -> Option<Self> {
        Some(Self {
            prefix: prefix.to_string(),
            direction: MoveDirection::from_path(prefix)?,
        })
    }
}

/// Movement knobs, all read from config.
#[derive(Debug, Clone, Copy)]
pub struct MoveTuning {
    /// Pixels per movement tick.
    pub speed: f32,
    /// Chance an idle trigger becomes a movement.
    pub move_chance: f32,
    /// Horizontal share of movements (rest is vertical).
    pub horizontal_chance: f32,
    /// Distance within which the window counts as touching an edge.
    pub edge_margin: f32,
}

impl Default for MoveTuning {
    fn default() -> Self {
        Self {
            speed: 3.0,
            move_chance: 0.3,
            horizontal_chance: 0.7,
            edge_margin: 5.0,
        }
    }
}

/// Result of one movement tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MoveStep {
    Continue(Vec2),
    Arrived(Vec2),
}

/// Moves the pet window along screen edges while a move loop is playing.
pub struct MovementController {
    pub bounds: Bounds,
    pub tuning: MoveTuning,
    session: Option<MoveSession>,
    active: bool,
}

impl MovementController {
    pub fn new(bounds: Bounds, tuning: MoveTuning) -> Self {
        Self {
            bounds,
            tuning,
            session: None,
            active: false,
        }
    }

    pub fn session(&self) -> Option<&MoveSession> {
        self.session.as_ref()
    }

    pub fn set_session(&mut self, session: Option<MoveSession>) {
        self.session = session;
    }

    /// True while the window is actually being moved (move loop running).
    pub fn is_moving(&self) -> bool {
        self.active
    }

    pub fn begin(&mut self) -> bool {
        self.active = self.session.is_some();
        self.active
    }

    pub fn halt(&mut self) {
        self.active = false;
    }

    /// Advance the window one tick along the active direction.
    pub fn tick(&self, pos: Vec2, size: Vec2) -> Option<MoveStep> {
        if !self.active {
            return None;
        }
        let session = self.session.as_ref()?;
        Some(step(session.direction, pos, size, &self.bounds, &self.tuning))
    }

    /// Pick a movement that makes sense from where the pet is standing.
    pub fn select(&self, pos: Vec2, size: Vec2, rng: &mut fastrand::Rng) -> Option<MoveSession> {
        select_move(pos, size, &self.bounds, &self.tuning, rng)
    }
}

/// Choose a movement path for a pet at `pos`. `None` means nothing sensible
/// is possible and the caller should fall back to a stationary animation.
pub fn select_move(
    pos: Vec2,
    size: Vec2,
    bounds: &Bounds,
    tuning: &MoveTuning,
    rng: &mut fastrand::Rng,
) -> Option<MoveSession> {
    let contact = EdgeContact::measure(pos, size, bounds, tuning.edge_margin);
    let center_x = pos.x + size.x * 0.5;
    // Head toward the far half of the screen.
    let rightward = center_x < bounds.center_x();

    // Hanging from the top: swinging is the only option.
    if contact.top {
        return MoveSession::from_path(&swing_prefix(rightward));
    }

    if rng.f32() < tuning.horizontal_chance {
        let variant = if rng.bool() { "walk" } else { "crawl" };
        let prefix = format!("{MOVE_ROOT}/horizontal/{}/{variant}", heading(rightward));
        return MoveSession::from_path(&prefix);
    }

    if rng.bool() {
        return MoveSession::from_path(&format!("{MOVE_ROOT}/vertical/topToBottom/fall"));
    }

    // Nothing to climb in the middle of the screen.
    if !contact.any() {
        return None;
    }
    let side = if contact.left {
        "left"
    } else if contact.right {
        "right"
    } else if rightward {
        // left half of the screen, nearer the left wall
        "left"
    } else {
        "right"
    };
    MoveSession::from_path(&format!("{MOVE_ROOT}/vertical/bottomToTop/climb.{side}"))
}

/// One movement tick. Vertical moves clamp first: the window manager can
/// lag behind our position updates and let the window drift off-screen.
pub fn step(
    direction: MoveDirection,
    pos: Vec2,
    size: Vec2,
    bounds: &Bounds,
    tuning: &MoveTuning,
) -> MoveStep {
    let margin = tuning.edge_margin;
    let speed = tuning.speed;

    let (next, arrived) = match direction {
        MoveDirection::LeftToRight | MoveDirection::TopSwing { rightward: true } => {
            let next = Vec2::new(pos.x + speed, pos.y);
            (next, next.x + size.x >= bounds.right - margin)
        }
        MoveDirection::RightToLeft | MoveDirection::TopSwing { rightward: false } => {
            let next = Vec2::new(pos.x - speed, pos.y);
            (next, next.x <= bounds.left + margin)
        }
        MoveDirection::BottomToTop => {
            let start = bounds.clamp(pos, size);
            let next = Vec2::new(start.x, start.y - speed);
            (next, next.y <= bounds.top + margin)
        }
        MoveDirection::TopToBottom => {
            let start = bounds.clamp(pos, size);
            let next = Vec2::new(start.x, start.y + speed);
            (next, next.y + size.y >= bounds.bottom - margin)
        }
    };

    if arrived {
        MoveStep::Arrived(bounds.clamp(next, size))
    } else {
        MoveStep::Continue(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn screen() -> Bounds {
        Bounds::from_origin_size(Vec2::ZERO, Vec2::new(1920.0, 1080.0))
    }

    const PET: Vec2 = Vec2::new(300.0, 300.0);

    #[test]
    fn direction_round_trips_through_paths() {
        let cases = [
            MoveDirection::LeftToRight,
            MoveDirection::RightToLeft,
            MoveDirection::BottomToTop,
            MoveDirection::TopToBottom,
            MoveDirection::TopSwing { rightward: true },
            MoveDirection::TopSwing { rightward: false },
        ];
        for dir in cases {
            assert_eq!(MoveDirection::from_path(&dir.default_prefix()), Some(dir));
        }
        assert_eq!(MoveDirection::from_path("autoTriggered/meow"), None);
        assert_eq!(MoveDirection::from_path("autoTriggered/move"), None);
    }

    #[test]
    fn edge_contact_uses_margin() {
        let b = screen();
        let c = EdgeContact::measure(Vec2::new(4.0, 780.0), PET, &b, 5.0);
        assert!(c.left && c.bottom && !c.right && !c.top);
        let c = EdgeContact::measure(Vec2::new(700.0, 400.0), PET, &b, 5.0);
        assert!(!c.any());
    }

    #[test]
    fn top_edge_only_swings_toward_far_side() {
        let b = screen();
        let t = MoveTuning::default();
        let mut rng = fastrand::Rng::with_seed(1);
        for _ in 0..50 {
            let s = select_move(Vec2::new(100.0, 0.0), PET, &b, &t, &mut rng).unwrap();
            assert_eq!(s.direction, MoveDirection::TopSwing { rightward: true });
            assert!(s.prefix.ends_with("/swing"));
            let s = select_move(Vec2::new(1500.0, 2.0), PET, &b, &t, &mut rng).unwrap();
            assert_eq!(s.direction, MoveDirection::TopSwing { rightward: false });
        }
    }

    #[test]
    fn horizontal_walks_away_from_near_edge() {
        let b = screen();
        let t = MoveTuning {
            horizontal_chance: 1.0,
            ..MoveTuning::default()
        };
        let mut rng = fastrand::Rng::with_seed(7);
        let mut variants = std::collections::HashSet::new();
        for _ in 0..100 {
            let s = select_move(Vec2::new(0.0, 780.0), PET, &b, &t, &mut rng).unwrap();
            assert_eq!(s.direction, MoveDirection::LeftToRight);
            variants.insert(s.prefix.rsplit('/').next().unwrap().to_string());
            let s = select_move(Vec2::new(1620.0, 780.0), PET, &b, &t, &mut rng).unwrap();
            assert_eq!(s.direction, MoveDirection::RightToLeft);
        }
        assert!(variants.contains("walk") && variants.contains("crawl"));
    }

    #[test]
    fn never_climbs_when_floating() {
        let b = screen();
        let t = MoveTuning {
            horizontal_chance: 0.0,
            ..MoveTuning::default()
        };
        let mut rng = fastrand::Rng::with_seed(42);
        let mut saw_none = false;
        for _ in 0..500 {
            match select_move(Vec2::new(800.0, 400.0), PET, &b, &t, &mut rng) {
                Some(s) => {
                    assert!(!s.prefix.contains("bottomToTop/climb"));
                    assert_eq!(s.direction, MoveDirection::TopToBottom);
                }
                None => saw_none = true,
            }
        }
        assert!(saw_none);
    }

    #[test]
    fn climbs_the_wall_it_touches() {
        let b = screen();
        let t = MoveTuning {
            horizontal_chance: 0.0,
            ..MoveTuning::default()
        };
        let mut rng = fastrand::Rng::with_seed(3);
        let mut climbs = 0;
        for _ in 0..200 {
            if let Some(s) = select_move(Vec2::new(1620.0, 500.0), PET, &b, &t, &mut rng) {
                if s.direction == MoveDirection::BottomToTop {
                    assert!(s.prefix.ends_with("climb.right"));
                    climbs += 1;
                }
            }
        }
        assert!(climbs > 0);
    }

    #[test]
    fn walking_right_stops_at_right_edge() {
        let b = screen();
        let t = MoveTuning::default();
        let mut pos = Vec2::new(1600.0, 780.0);
        let mut ticks = 0;
        loop {
            ticks += 1;
            match step(MoveDirection::LeftToRight, pos, PET, &b, &t) {
                MoveStep::Continue(p) => pos = p,
                MoveStep::Arrived(p) => {
                    assert!(p.x + PET.x <= b.right);
                    assert!(p.x + PET.x >= b.right - t.edge_margin - t.speed);
                    break;
                }
            }
            assert!(ticks < 100);
        }
    }

    #[test]
    fn climbing_clamps_an_offscreen_window_first() {
        let b = screen();
        let t = MoveTuning::default();
        // window manager left us hanging below the screen
        match step(MoveDirection::BottomToTop, Vec2::new(0.0, 2000.0), PET, &b, &t) {
            MoveStep::Continue(p) => assert_eq!(p.y, 780.0 - t.speed),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn falling_lands_on_bottom() {
        let b = screen();
        let t = MoveTuning::default();
        match step(MoveDirection::TopToBottom, Vec2::new(10.0, 778.0), PET, &b, &t) {
            MoveStep::Arrived(p) => assert_eq!(p.y, 780.0),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn controller_only_ticks_while_active() {
        let mut mc = MovementController::new(screen(), MoveTuning::default());
        assert!(mc.tick(Vec2::ZERO, PET).is_none());
        assert!(!mc.begin());
        mc.set_session(MoveSession::from_path(&MoveDirection::LeftToRight.default_prefix()));
        assert!(mc.begin());
        assert!(matches!(mc.tick(Vec2::new(0.0, 780.0), PET), Some(MoveStep::Continue(_))));
        mc.halt();
        assert!(!mc.is_moving());
    }
}
