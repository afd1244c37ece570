//! Interrupt dispatch entry points
//!
//! Called by the backend's interrupt layer with the critical section held.
//! None of them block. Edges that arrive while capture is not armed (a
//! stale interrupt after `stop_capture`) are dropped.

use critical_section::CriticalSection;

use crate::backend::CaptureBackend;
use crate::driver::IcuDriver;
use crate::state::{IcuState, IcuTrigger};
use crate::suspend::TaskSuspend;

impl<'a, B: CaptureBackend, S: TaskSuspend> IcuDriver<'a, B, S> {
    /// Stop edge: a pulse width has been latched.
    ///
    /// The width callback fires unless this is the trailing edge of the
    /// first, incomplete pulse (state `Waiting`). The state is unchanged.
    pub fn isr_width(&self, cs: CriticalSection<'_>) {
        let state = self.state_i(cs);
        if state.on(IcuTrigger::StopEdge).is_none() {
            log::trace!("icu: stop edge dropped in state {}", state);
            return;
        }
        if state == IcuState::Waiting {
            return;
        }
        if let Some(callback) = self.config_i(cs).and_then(|config| config.width_callback) {
            callback(self, cs);
        }
    }

    /// Start edge: a period has been latched.
    ///
    /// Moves the driver to `Active`. The first edge after arming only
    /// completes a pending `wait_capture`; later edges fire the period
    /// callback.
    pub fn isr_period(&self, cs: CriticalSection<'_>) {
        let previous = self.state_i(cs);
        let Some(next) = previous.on(IcuTrigger::StartEdge) else {
            log::trace!("icu: start edge dropped in state {}", previous);
            return;
        };
        self.state.borrow(cs).set(next);
        self.measured.borrow(cs).set(true);

        if previous == IcuState::Waiting {
            log::debug!("icu: first edge, {} -> {}", previous, next);
            self.complete_wait(cs, Ok(()));
            return;
        }
        if let Some(callback) = self.config_i(cs).and_then(|config| config.period_callback) {
            callback(self, cs);
        }
    }

    /// Counter overflow before a measurement completed.
    ///
    /// The configuration must provide an overflow callback whenever overflow
    /// notifications can occur.
    pub fn isr_overflow(&self, cs: CriticalSection<'_>) {
        match self.config_i(cs).and_then(|config| config.overflow_callback) {
            Some(callback) => callback(self, cs),
            None => {
                debug_assert!(false, "icu: overflow notification without overflow callback");
                log::warn!("icu: overflow dropped, no callback configured");
            }
        }
    }
}
