//! Save scheduling state machine.
//!
//! ```text
//!   Idle ──mutation──▶ Dirty ──deadline──▶ Saving ──ok──▶ Idle
//!                       ▲  │                 │
//!        mutation resets│  │        mutation │
//!        the deadline ──┘  │                 ▼
//!                          │           PendingResave ──done──▶ Dirty (due now)
//! ```
//!
//! The scheduler never sleeps or does I/O. Callers pass the current
//! instant in and ask whether a save is due.

use std::time::Duration;
use tokio::time::Instant;

/// Save state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveState {
    Idle,
    /// Unsaved changes waiting for `deadline`.
    Dirty { deadline: Instant, priority: bool },
    /// A write is in flight.
    Saving,
    /// A write is in flight and newer changes arrived meanwhile.
    PendingResave,
}

impl SaveState {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Dirty { .. } => "dirty",
            Self::Saving => "saving",
            Self::PendingResave => "pending_resave",
        }
    }
}

/// Debounced save scheduler.
#[derive(Debug, Clone)]
pub struct SaveScheduler {
    state: SaveState,
    debounce: Duration,
}

impl SaveScheduler {
    #[must_use]
    pub const fn new(debounce: Duration) -> Self {
        Self {
            state: SaveState::Idle,
            debounce,
        }
    }

    #[must_use]
    pub const fn state(&self) -> SaveState {
        self.state
    }

    #[must_use]
    pub const fn debounce(&self) -> Duration {
        self.debounce
    }

    /// Whether there are changes no completed or in-flight write covers.
    #[must_use]
    pub const fn has_unsaved(&self) -> bool {
        matches!(
            self.state,
            SaveState::Dirty { .. } | SaveState::PendingResave
        )
    }

    /// Whether a write is in flight.
    #[must_use]
    pub const fn is_saving(&self) -> bool {
        matches!(self.state, SaveState::Saving | SaveState::PendingResave)
    }

    /// Record a mutation.
    ///
    /// A normal mutation restarts the debounce window. A priority mutation
    /// makes the save due immediately, and a pending priority save is never
    /// pushed back by a later normal mutation.
    pub fn mark_dirty(&mut self, now: Instant, priority: bool) {
        self.state = match self.state {
            SaveState::Saving | SaveState::PendingResave => SaveState::PendingResave,
            SaveState::Dirty {
                deadline,
                priority: true,
            } => SaveState::Dirty {
                deadline: deadline.min(now),
                priority: true,
            },
            SaveState::Idle | SaveState::Dirty { .. } if priority => SaveState::Dirty {
                deadline: now,
                priority: true,
            },
            SaveState::Idle | SaveState::Dirty { .. } => SaveState::Dirty {
                deadline: now + self.debounce,
                priority: false,
            },
        };
    }

    /// When the next save falls due, if one is waiting.
    #[must_use]
    pub const fn next_deadline(&self) -> Option<Instant> {
        match self.state {
            SaveState::Dirty { deadline, .. } => Some(deadline),
            _ => None,
        }
    }

    /// Whether a save should start at `now`.
    #[must_use]
    pub fn is_due(&self, now: Instant) -> bool {
        self.next_deadline().is_some_and(|d| d <= now)
    }

    /// Enter `Saving` if there is anything to save, regardless of the
    /// deadline. Returns whether a save should start.
    pub fn begin_save(&mut self) -> bool {
        if matches!(self.state, SaveState::Dirty { .. }) {
            self.state = SaveState::Saving;
            true
        } else {
            false
        }
    }

    /// Leave `Saving`.
    ///
    /// Changes that arrived mid-write make the next save due at once. A
    /// failed write is retried after another debounce window.
    pub fn finish_save(&mut self, now: Instant, ok: bool) {
        self.state = match (self.state, ok) {
            (SaveState::PendingResave, true) => SaveState::Dirty {
                deadline: now,
                priority: true,
            },
            (SaveState::Saving, true) => SaveState::Idle,
            (SaveState::Saving | SaveState::PendingResave, false) => SaveState::Dirty {
                deadline: now + self.debounce,
                priority: false,
            },
            (other, _) => other,
        };
    }

    /// Forget unsaved changes after the board was replaced from outside.
    /// An in-flight write is left to finish.
    pub fn clear(&mut self) {
        if !self.is_saving() {
            self.state = SaveState::Idle;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEBOUNCE: Duration = Duration::from_millis(400);

    #[test]
    fn test_burst_coalesces_into_one_due_save() {
        let mut s = SaveScheduler::new(DEBOUNCE);
        let t0 = Instant::now();

        for i in 0..5 {
            s.mark_dirty(t0 + Duration::from_millis(i * 50), false);
        }
        let last = t0 + Duration::from_millis(200);

        assert!(!s.is_due(last + Duration::from_millis(399)));
        assert!(s.is_due(last + DEBOUNCE));
        assert!(s.begin_save());
        assert!(!s.begin_save());
        s.finish_save(last + DEBOUNCE, true);
        assert_eq!(s.state(), SaveState::Idle);
    }

    #[test]
    fn test_priority_is_due_immediately_and_sticks() {
        let mut s = SaveScheduler::new(DEBOUNCE);
        let t0 = Instant::now();

        s.mark_dirty(t0, false);
        s.mark_dirty(t0, true);
        assert!(s.is_due(t0));

        s.mark_dirty(t0 + Duration::from_millis(10), false);
        assert!(s.is_due(t0 + Duration::from_millis(10)));
    }

    #[test]
    fn test_mutation_during_save_forces_resave() {
        let mut s = SaveScheduler::new(DEBOUNCE);
        let t0 = Instant::now();

        s.mark_dirty(t0, true);
        assert!(s.begin_save());
        s.mark_dirty(t0, false);
        assert_eq!(s.state(), SaveState::PendingResave);
        assert!(s.is_saving());
        assert!(s.has_unsaved());

        let t1 = t0 + Duration::from_millis(30);
        s.finish_save(t1, true);
        assert!(s.is_due(t1));
    }

    #[test]
    fn test_failed_save_retries_after_debounce() {
        let mut s = SaveScheduler::new(DEBOUNCE);
        let t0 = Instant::now();

        s.mark_dirty(t0, true);
        s.begin_save();
        s.finish_save(t0, false);

        assert!(s.has_unsaved());
        assert!(!s.is_due(t0));
        assert!(s.is_due(t0 + DEBOUNCE));
    }

    #[test]
    fn test_clear_keeps_in_flight_save() {
        let mut s = SaveScheduler::new(DEBOUNCE);
        let t0 = Instant::now();

        s.mark_dirty(t0, false);
        s.clear();
        assert_eq!(s.state(), SaveState::Idle);

        s.mark_dirty(t0, true);
        s.begin_save();
        s.clear();
        assert_eq!(s.state(), SaveState::Saving);
    }
}
