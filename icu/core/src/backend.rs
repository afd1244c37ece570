//! Capture backend abstraction
//!
//! A backend programs one hardware capture channel. It owns the interrupt
//! vector and forwards edge and overflow events to
//! [`IcuDriver::isr_width`](crate::IcuDriver::isr_width),
//! [`IcuDriver::isr_period`](crate::IcuDriver::isr_period) and
//! [`IcuDriver::isr_overflow`](crate::IcuDriver::isr_overflow), with the
//! critical section already held.

use crate::config::IcuMode;

/// Hardware capture channel
pub trait CaptureBackend {
    /// Power up the timer for a start/stop cycle
    fn start(&mut self, mode: IcuMode, frequency: u32);

    /// Power down the timer
    fn stop(&mut self);

    /// Arm edge capture (idempotent)
    fn start_capture(&mut self);

    /// Disarm edge capture (idempotent)
    fn stop_capture(&mut self);

    /// Unmask edge and overflow interrupts (idempotent)
    fn enable_notifications(&mut self);

    /// Mask edge and overflow interrupts (idempotent)
    fn disable_notifications(&mut self);

    /// Whether interrupts are currently unmasked
    fn notifications_enabled(&self) -> bool;

    /// Poll the armed channel until the first start edge is latched.
    ///
    /// Runs inside a critical section with notifications masked; the edge
    /// is consumed here and not delivered to dispatch.
    fn wait_capture(&mut self);

    /// Ticks between the latest start edge and stop edge
    fn width(&self) -> u32;

    /// Ticks between the two latest start edges
    fn period(&self) -> u32;
}
