use std::time::Duration;

pub const MAX_ATTEMPTS: u32 = 12;
pub const INITIAL_DELAY: Duration = Duration::from_secs(2);
pub const POLL_INTERVAL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollPhase {
    Idle,
    Polling,
    Confirmed,
    TimedOut,
}

/// State machine behind the activation wait: counts attempts, caps
/// them at [`MAX_ATTEMPTS`], and latches both the loop start and the
/// one-shot session synchronization.
#[derive(Debug, Clone)]
pub struct PollState {
    phase: PollPhase,
    attempts: u32,
    synchronized: bool,
}

impl PollState {
    pub fn new() -> Self {
        Self {
            phase: PollPhase::Idle,
            attempts: 0,
            synchronized: false,
        }
    }

    /// One-shot start latch. Returns false on any call after the
    /// first, so a duplicate trigger can never run a second loop.
    pub fn begin(&mut self) -> bool {
        if self.phase == PollPhase::Idle {
            self.phase = PollPhase::Polling;
            true
        } else {
            false
        }
    }

    /// Records a negative tick: fetch unavailable or status still
    /// free. Increments the counter exactly once and trips the
    /// timeout when the cap is reached.
    pub fn record_negative(&mut self) {
        if self.phase != PollPhase::Polling {
            return;
        }

        self.attempts = self.attempts.saturating_add(1).min(MAX_ATTEMPTS);
        if self.attempts >= MAX_ATTEMPTS {
            self.phase = PollPhase::TimedOut;
        }
    }

    /// At-most-once confirmation latch. The first call from
    /// `Polling` wins and is the only one allowed to synchronize the
    /// session; every later call returns false.
    pub fn try_confirm(&mut self) -> bool {
        if self.synchronized || self.phase != PollPhase::Polling {
            return false;
        }

        self.synchronized = true;
        self.phase = PollPhase::Confirmed;
        true
    }

    /// Delay before the next fetch: 2s ahead of the first attempt,
    /// 3s between the rest.
    pub fn next_delay(&self) -> Duration {
        if self.attempts == 0 {
            INITIAL_DELAY
        } else {
            POLL_INTERVAL
        }
    }

    pub fn phase(&self) -> PollPhase {
        self.phase
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    #[allow(dead_code)]
    pub fn has_synchronized(&self) -> bool {
        self.synchronized
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.phase, PollPhase::Confirmed | PollPhase::TimedOut)
    }
}

impl Default for PollState {
    fn default() -> Self {
        Self::new()
    }
}
