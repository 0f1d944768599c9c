use std::time::Duration;

/// Every timer the pet owns, keyed by what it is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TimerKind {
    Frame = 0,
    Idle = 1,
    LeftPress = 2,
    RightPress = 3,
    Movement = 4,
    DanceStart = 5,
    DanceStop = 6,
    CacheCleanup = 7,
}

impl TimerKind {
    pub const ALL: [TimerKind; 8] = [
        Self::Frame,
        Self::Idle,
        Self::LeftPress,
        Self::RightPress,
        Self::Movement,
        Self::DanceStart,
        Self::DanceStop,
        Self::CacheCleanup,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Frame => "Frame",
            Self::Idle => "Idle",
            Self::LeftPress => "Left press",
            Self::RightPress => "Right press",
            Self::Movement => "Movement",
            Self::DanceStart => "Dance start",
            Self::DanceStop => "Dance stop",
            Self::CacheCleanup => "Cache cleanup",
        }
    }
}

/// If a periodic timer is this far behind, restart it from `now` instead of
/// replaying the backlog.
const MAX_LAG: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy)]
struct Slot {
    due: Duration,
    period: Option<Duration>,
}

/// Registry of cancelable timers. Time is whatever monotonic clock the caller
/// passes in; nothing here reads the system clock.
pub struct Timers {
    slots: [Option<Slot>; 8],
}

impl Default for Timers {
    fn default() -> Self {
        Self::new()
    }
}

impl Timers {
    pub fn new() -> Self {
        Self { slots: [None; 8] }
    }

    /// Fire once, `delay` after `now`. Replaces any pending schedule.
    pub fn start_once(&mut self, kind: TimerKind, now: Duration, delay: Duration) {
        self.slots[kind as usize] = Some(Slot {
            due: now + delay,
            period: None,
        });
    }

    /// Fire every `period`, first at `now + period`. Replaces any pending schedule.
    pub fn start_periodic(&mut self, kind: TimerKind, now: Duration, period: Duration) {
        self.slots[kind as usize] = Some(Slot {
            due: now + period,
            period: Some(period),
        });
    }

    pub fn stop(&mut self, kind: TimerKind) {
        self.slots[kind as usize] = None;
    }

    pub fn stop_all(&mut self) {
        self.slots = [None; 8];
    }

    #[cfg(test)]
    pub fn is_armed(&self, kind: TimerKind) -> bool {
        self.slots[kind as usize].is_some()
    }

    #[cfg(test)]
    pub fn due_at(&self, kind: TimerKind) -> Option<Duration> {
        self.slots[kind as usize].map(|s| s.due)
    }

    /// Earliest pending deadline across all timers.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.slots.iter().flatten().map(|s| s.due).min()
    }

    /// Take the earliest timer that is due at `now`. One-shot timers are
    /// disarmed, periodic ones re-armed. Ties go to the lower `TimerKind`.
    pub fn pop_due(&mut self, now: Duration) -> Option<TimerKind> {
        let mut best: Option<(usize, Duration)> = None;
        for (idx, slot) in self.slots.iter().enumerate() {
            if let Some(slot) = slot {
                if slot.due <= now && best.map_or(true, |(_, due)| slot.due < due) {
                    best = Some((idx, slot.due));
                }
            }
        }

        let (idx, _) = best?;
        let slot = &mut self.slots[idx];
        match slot.and_then(|s| s.period.map(|p| (s.due, p))) {
            Some((due, period)) => {
                let mut next = due + period;
                if now.saturating_sub(next) > MAX_LAG {
                    next = now + period;
                }
                if let Some(s) = slot.as_mut() {
                    s.due = next;
                }
            }
            None => *slot = None,
        }
        Some(TimerKind::ALL[idx])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn kinds_index_their_slot() {
        for (i, kind) in TimerKind::ALL.iter().enumerate() {
            assert_eq!(*kind as usize, i);
        }
    }

    #[test]
    fn one_shot_fires_once() {
        let mut t = Timers::new();
        t.start_once(TimerKind::LeftPress, ms(0), ms(500));
        assert_eq!(t.pop_due(ms(499)), None);
        assert_eq!(t.pop_due(ms(500)), Some(TimerKind::LeftPress));
        assert_eq!(t.pop_due(ms(1000)), None);
        assert!(!t.is_armed(TimerKind::LeftPress));
    }

    #[test]
    fn periodic_rearms_and_keeps_cadence() {
        let mut t = Timers::new();
        t.start_periodic(TimerKind::Frame, ms(0), ms(200));
        assert_eq!(t.pop_due(ms(210)), Some(TimerKind::Frame));
        assert_eq!(t.due_at(TimerKind::Frame), Some(ms(400)));
        assert_eq!(t.pop_due(ms(390)), None);
    }

    #[test]
    fn periodic_skips_a_long_backlog() {
        let mut t = Timers::new();
        t.start_periodic(TimerKind::Movement, ms(0), ms(50));
        assert_eq!(t.pop_due(ms(10_000)), Some(TimerKind::Movement));
        assert_eq!(t.due_at(TimerKind::Movement), Some(ms(10_050)));
    }

    #[test]
    fn earliest_due_wins_then_kind_order() {
        let mut t = Timers::new();
        t.start_once(TimerKind::Idle, ms(0), ms(100));
        t.start_once(TimerKind::DanceStop, ms(0), ms(50));
        t.start_periodic(TimerKind::Frame, ms(0), ms(100));
        assert_eq!(t.next_deadline(), Some(ms(50)));
        assert_eq!(t.pop_due(ms(100)), Some(TimerKind::DanceStop));
        assert_eq!(t.pop_due(ms(100)), Some(TimerKind::Frame));
        assert_eq!(t.pop_due(ms(100)), Some(TimerKind::Idle));
        assert_eq!(t.pop_due(ms(100)), None);
    }

    #[test]
    fn stop_cancels_before_next_pop() {
        let mut t = Timers::new();
        t.start_periodic(TimerKind::Frame, ms(0), ms(200));
        t.stop(TimerKind::Frame);
        assert_eq!(t.pop_due(ms(1000)), None);
        assert_eq!(t.next_deadline(), None);
    }
}
