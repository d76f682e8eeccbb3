//! The single pending baseline reset shared by the listener and controller

use parking_lot::Mutex;
use std::time::Instant;

/// A reset that has been armed and is waiting for its capture time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingReset {
    pub due_at: Instant,
    /// Monotonic counter bumped on every arm.
    pub generation: u64,
}

#[derive(Debug, Default)]
struct ScheduleState {
    pending: Option<Instant>,
    generation: u64,
}

/// At most one pending reset. Arming again before the pending one fires
/// replaces it rather than queueing a second capture.
#[derive(Debug, Default)]
pub struct ResetSchedule {
    state: Mutex<ScheduleState>,
}

impl ResetSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm (or re-arm) the reset for `due_at`. Returns the new pending reset
    /// and whether a still-pending one was overwritten.
    pub fn arm(&self, due_at: Instant) -> (PendingReset, bool) {
        let mut state = self.state.lock();
        let replaced = state.pending.replace(due_at).is_some();
        state.generation += 1;
        (
            PendingReset {
                due_at,
                generation: state.generation,
            },
            replaced,
        )
    }

    /// Generation of the most recent arm; zero if never armed.
    pub fn generation(&self) -> u64 {
        self.state.lock().generation
    }

    pub fn pending(&self) -> Option<PendingReset> {
        let state = self.state.lock();
        state.pending.map(|due_at| PendingReset {
            due_at,
            generation: state.generation,
        })
    }

    /// Take the pending reset if it is due at `now`, clearing the schedule.
    /// A reset is handed out at most once.
    pub fn take_due(&self, now: Instant) -> Option<PendingReset> {
        let mut state = self.state.lock();
        match state.pending {
            Some(due_at) if now >= due_at => {
                state.pending = None;
                Some(PendingReset {
                    due_at,
                    generation: state.generation,
                })
            }
            _ => None,
        }
    }
}
