//! Edge-triggered health classification.
//!
//! Two states (last cycle failed or not), four outputs:
//!
//! | last failed | ok    | emits             |
//! |-------------|-------|-------------------|
//! | no          | yes   | Available         |
//! | yes         | yes   | Recovered         |
//! | no          | no    | NotAvailable      |
//! | yes         | no    | StillNotAvailable |

use avalio_core::ResourceState;

/// Tracks whether the previous check of a resource failed.
#[derive(Debug, Default)]
pub struct StateTracker {
    last_was_failure: bool,
}

impl StateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a check verdict and return the state to emit.
    pub fn record(&mut self, ok: bool) -> ResourceState {
        let state = match (self.last_was_failure, ok) {
            (false, true) => ResourceState::Available,
            (true, true) => ResourceState::Recovered,
            (false, false) => ResourceState::NotAvailable,
            (true, false) => ResourceState::StillNotAvailable,
        };
        self.last_was_failure = !ok;
        state
    }

    pub fn last_was_failure(&self) -> bool {
        self.last_was_failure
    }
}
