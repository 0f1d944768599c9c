use std::time::Duration;

/// Result of feeding a raw audio sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioEdge {
    Rose,
    Fell,
    Unchanged,
}

/// Turns a noisy "is anything playing" signal into a dance decision.
/// Timing is owned by the caller; this only keeps the bookkeeping.
pub struct DanceArbiter {
    enabled: bool,
    min_sustain: Duration,
    /// Last raw audio value.
    signal: bool,
    /// Start of the current unbroken run of audio, while still counting
    /// toward a dance. Cleared once the dance starts or is interrupted.
    counting_since: Option<Duration>,
    dancing: bool,
}

impl DanceArbiter {
    pub fn new(enabled: bool, min_sustain: Duration) -> Self {
        Self {
            enabled,
            min_sustain,
            signal: false,
            counting_since: None,
            dancing: false,
        }
    }

    pub fn signal(&mut self, active: bool, now: Duration) -> AudioEdge {
        if active == self.signal {
            return AudioEdge::Unchanged;
        }
        self.signal = active;
        if active {
            if !self.dancing {
                self.counting_since = Some(now);
            }
            AudioEdge::Rose
        } else {
            self.counting_since = None;
            AudioEdge::Fell
        }
    }

    /// Audio has been on, uninterrupted, for at least the minimum duration.
    pub fn sustained(&self, now: Duration) -> bool {
        self.signal
            && self
                .counting_since
                .is_some_and(|since| now.saturating_sub(since) >= self.min_sustain)
    }

    /// Still playing and waiting for the pet to become free.
    pub fn is_counting(&self) -> bool {
        self.signal && self.counting_since.is_some()
    }

    /// Start counting again from `now` if audio is playing and no dance is on.
    pub fn restart_count(&mut self, now: Duration) -> bool {
        if self.signal && !self.dancing {
            self.counting_since = Some(now);
            true
        } else {
            false
        }
    }

    pub fn begin_dance(&mut self) {
        self.dancing = true;
        self.counting_since = None;
    }

    pub fn end_dance(&mut self) {
        self.dancing = false;
    }

    /// User took over. Forget the dance and any partial count; the next
    /// audio-on edge starts from zero.
    pub fn interrupt(&mut self) {
        self.dancing = false;
        self.counting_since = None;
    }

    pub fn is_dancing(&self) -> bool {
        self.dancing
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}
