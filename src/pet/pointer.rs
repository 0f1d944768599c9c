use glam::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Left,
    Right,
}

/// What a pointer event turned out to mean.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PressOutcome {
    None,
    /// Released inside the debounce window without moving.
    Click { local: Vec2 },
    /// Promoted to a drag (moved past the threshold, or held past the window).
    DragStart,
    /// Still dragging; the window should sit here.
    DragMove { window: Vec2 },
    DragEnd,
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Released,
    /// Down, waiting to find out whether this is a click or a drag.
    Pending { screen: Vec2, window: Vec2 },
    Dragging { screen: Vec2, window: Vec2 },
}

/// Click-vs-drag arbitration for one mouse button. Each button gets its own
/// so a press on one never disturbs the other's debounce.
pub struct PressArbiter {
    phase: Phase,
    /// Movement beyond this on either axis promotes to a drag.
    threshold: f32,
}

impl PressArbiter {
    pub fn new(threshold: f32) -> Self {
        Self {
            phase: Phase::Released,
            threshold,
        }
    }

    /// Button went down. `window` is the window's top-left at press time.
    pub fn press(&mut self, screen: Vec2, window: Vec2) {
        self.phase = Phase::Pending { screen, window };
    }

    pub fn moved(&mut self, screen: Vec2) -> PressOutcome {
        match self.phase {
            Phase::Pending { screen: origin, window } => {
                let d = screen - origin;
                if d.x.abs() > self.threshold || d.y.abs() > self.threshold {
                    self.phase = Phase::Dragging {
                        screen: origin,
                        window,
                    };
                    PressOutcome::DragStart
                } else {
                    PressOutcome::None
                }
            }
            Phase::Dragging { screen: origin, window } => PressOutcome::DragMove {
                window: window + (screen - origin),
            },
            Phase::Released => PressOutcome::None,
        }
    }

    /// The debounce window ran out while the button is still held.
    pub fn timeout(&mut self) -> PressOutcome {
        match self.phase {
            Phase::Pending { screen, window } => {
                self.phase = Phase::Dragging { screen, window };
                PressOutcome::DragStart
            }
            _ => PressOutcome::None,
        }
    }

    pub fn release(&mut self, local: Vec2) -> PressOutcome {
        let outcome = match self.phase {
            Phase::Pending { .. } => PressOutcome::Click { local },
            Phase::Dragging { .. } => PressOutcome::DragEnd,
            Phase::Released => PressOutcome::None,
        };
        self.phase = Phase::Released;
        outcome
    }

    /// Where the window belongs for the given pointer position, if dragging.
    pub fn drag_target(&self, screen: Vec2) -> Option<Vec2> {
        match self.phase {
            Phase::Dragging { screen: origin, window } => Some(window + (screen - origin)),
            _ => None,
        }
    }

    #[cfg(test)]
    pub fn is_waiting(&self) -> bool {
        matches!(self.phase, Phase::Pending { .. })
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.phase, Phase::Dragging { .. })
    }

    pub fn is_engaged(&self) -> bool {
        !matches!(self.phase, Phase::Released)
    }

    pub fn cancel(&mut self) {
        self.phase = Phase::Released;
    }
}
