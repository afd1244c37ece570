#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![forbid(unsafe_code)]

//! # ICU Core
//!
//! Hardware-independent driver for an Input Capture Unit: a timer submodule
//! that latches a free-running counter on input edges so that the width and
//! period of a digital signal can be measured.
//!
//! The crate owns the driver state machine and the interrupt dispatch
//! protocol. Everything that touches real timer registers lives behind the
//! [`CaptureBackend`] trait.
//!
//! Every state-mutating operation comes in two flavours:
//! - `op_i(cs, ..)` for code that already holds a critical section
//!   (interrupt handlers, callbacks),
//! - `op(..)` for task code; it enters a critical section and delegates.

use core::cell::Cell;
use core::fmt;

use critical_section::{CriticalSection, Mutex};

pub mod backend;
pub mod config;
pub mod driver;
mod isr;
pub mod state;
pub mod suspend;

pub use backend::CaptureBackend;
pub use config::{IcuCallback, IcuConfig, IcuMode};
pub use driver::IcuDriver;
pub use state::{IcuState, IcuTrigger};
pub use suspend::{SpinSuspend, TaskSuspend};

#[cfg(all(feature = "cortex-m", target_arch = "arm"))]
pub use suspend::WfeSuspend;

#[cfg(test)]
mod tests;

/// ICU driver version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Result type used by the blocking driver operations
pub type IcuResult<T> = Result<T, IcuError>;

/// Runtime errors reported by the driver.
///
/// Misuse of the state machine is not an error: it is a precondition
/// violation and trips a debug assertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IcuError {
    /// The wait was cancelled by `stop_capture` before the first edge
    Aborted,
}

impl fmt::Display for IcuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IcuError::Aborted => write!(f, "capture stopped before the first edge"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for IcuError {}

#[cfg(feature = "defmt")]
impl defmt::Format for IcuError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            IcuError::Aborted => defmt::write!(fmt, "Aborted"),
        }
    }
}

static INITIALIZED: Mutex<Cell<bool>> = Mutex::new(Cell::new(false));

/// One-time setup of the ICU driver family.
///
/// Has no per-instance effect; calling it again is harmless.
pub fn init() {
    critical_section::with(init_i)
}

/// Locked-context variant of [`init`].
pub fn init_i(cs: CriticalSection<'_>) {
    if !INITIALIZED.borrow(cs).replace(true) {
        log::debug!("icu: driver family initialized (v{})", VERSION);
    }
}

/// Reports whether [`init`] has run.
pub fn is_initialized() -> bool {
    critical_section::with(|cs| INITIALIZED.borrow(cs).get())
}
