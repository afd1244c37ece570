//! Thread parking for `wait_capture`

use std::sync::{Condvar, Mutex, PoisonError};

use icu_core::TaskSuspend;

/// Blocks the waiting thread on a condition variable.
///
/// Holds a single wake-up token, so a resume that lands before the waiter
/// parks is not lost.
#[derive(Debug, Default)]
pub struct ParkSuspend {
    token: Mutex<bool>,
    wakeup: Condvar,
}

impl ParkSuspend {
    pub const fn new() -> Self {
        Self {
            token: Mutex::new(false),
            wakeup: Condvar::new(),
        }
    }
}

impl TaskSuspend for ParkSuspend {
    fn suspend(&self) {
        // Poisoning only means another waiter panicked; the flag is still valid.
        let mut token = self.token.lock().unwrap_or_else(PoisonError::into_inner);
        while !*token {
            token = self
                .wakeup
                .wait(token)
                .unwrap_or_else(PoisonError::into_inner);
        }
        *token = false;
    }

    fn resume(&self) {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = true;
        self.wakeup.notify_one();
    }
}
