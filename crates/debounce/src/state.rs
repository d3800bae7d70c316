use std::time::Duration;
use tokio::time::Instant;

/// Where a [`DebounceState`] currently is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DebouncePhase<T> {
    Idle,
    Pending { value: T, deadline: Instant },
}

/// Latest-wins debounce state machine.
///
/// Transitions:
///
/// | event | from | to |
/// |-------|------|----|
/// | `input(v, at)` | `Idle` | `Pending(v, at + quiet)` |
/// | `input(v, at)` before the deadline | `Pending(_, _)` | `Pending(v, at + quiet)` |
/// | `input(v, at)` at/after the deadline | `Pending(old, _)` | emits `old`, then `Pending(v, at + quiet)` |
/// | `poll(now)` with `now >= deadline` | `Pending(v, _)` | emits `v`, `Idle` |
/// | `cancel()` | any | `Idle` |
#[derive(Debug)]
pub struct DebounceState<T> {
    quiet_period: Duration,
    phase: DebouncePhase<T>,
    superseded: u64,
}

impl<T> DebounceState<T> {
    pub const fn new(quiet_period: Duration) -> Self {
        Self {
            quiet_period,
            phase: DebouncePhase::Idle,
            superseded: 0,
        }
    }

    /// Record a new input observed at `at`.
    ///
    /// Returns the previously pending value when its deadline had already
    /// passed at `at`: that timer elapsed before this input arrived, so the
    /// value settled and must still be emitted.
    pub fn input(&mut self, value: T, at: Instant) -> Option<T> {
        let deadline = at + self.quiet_period;
        let previous =
            std::mem::replace(&mut self.phase, DebouncePhase::Pending { value, deadline });
        match previous {
            DebouncePhase::Pending {
                value: settled,
                deadline: old_deadline,
            } if old_deadline <= at => Some(settled),
            DebouncePhase::Pending { .. } => {
                self.superseded += 1;
                None
            }
            DebouncePhase::Idle => None,
        }
    }

    /// Take the pending value once its deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        let due = matches!(
            &self.phase,
            DebouncePhase::Pending { deadline, .. } if *deadline <= now
        );
        if !due {
            return None;
        }
        self.cancel()
    }

    /// Drop the pending value, if any, without emitting it.
    pub fn cancel(&mut self) -> Option<T> {
        match std::mem::replace(&mut self.phase, DebouncePhase::Idle) {
            DebouncePhase::Pending { value, .. } => Some(value),
            DebouncePhase::Idle => None,
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        match &self.phase {
            DebouncePhase::Pending { deadline, .. } => Some(*deadline),
            DebouncePhase::Idle => None,
        }
    }

    pub const fn is_pending(&self) -> bool {
        matches!(self.phase, DebouncePhase::Pending { .. })
    }

    pub const fn phase(&self) -> &DebouncePhase<T> {
        &self.phase
    }

    pub const fn quiet_period(&self) -> Duration {
        self.quiet_period
    }

    /// Inputs replaced by a newer one before they could settle.
    pub const fn superseded(&self) -> u64 {
        self.superseded
    }
}
