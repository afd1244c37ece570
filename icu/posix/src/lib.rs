//! ICU driver POSIX port
//!
//! Runs the hardware-independent ICU driver on a workstation:
//! - [`SimulatedCapture`]: a software capture channel whose latched
//!   width/period registers are shared with a [`SignalSource`], the host
//!   stand-in for the input pin and interrupt vector.
//! - [`ParkSuspend`]: a condition-variable task suspension so that
//!   `wait_capture` sleeps instead of spinning.
//!
//! Critical sections come from the `critical-section` std implementation,
//! a process-wide reentrant mutex.

pub mod capture;
pub mod suspend;

pub use capture::{CaptureRegisters, SignalSource, SimulatedCapture};
pub use suspend::ParkSuspend;

/// Driver type of this port
pub type PosixIcuDriver<'a> = icu_core::IcuDriver<'a, SimulatedCapture, ParkSuspend>;

/// Configuration type of this port
pub type PosixIcuConfig = icu_core::IcuConfig<SimulatedCapture, ParkSuspend>;

/// Create a driver and its signal source sharing one set of registers.
///
/// The driver is returned in `Uninit`; call `object_init` before use.
pub fn channel<'a>() -> (PosixIcuDriver<'a>, SignalSource) {
    icu_core::init();
    let capture = SimulatedCapture::new();
    let source = SignalSource::new(capture.registers());
    (
        icu_core::IcuDriver::with_suspend(capture, ParkSuspend::new()),
        source,
    )
}
