//! Shared helpers for the precondition test binaries.
//!
//! Each violation gets its own binary: the assertion fires inside a
//! critical section, and no other test should share the host lock with it.

#![allow(dead_code)]

use icu_core::{CaptureBackend, IcuConfig, IcuDriver, IcuMode};

/// Backend with no hardware behind it
pub struct NullBackend;

impl CaptureBackend for NullBackend {
    fn start(&mut self, _mode: IcuMode, _frequency: u32) {}
    fn stop(&mut self) {}
    fn start_capture(&mut self) {}
    fn stop_capture(&mut self) {}
    fn enable_notifications(&mut self) {}
    fn disable_notifications(&mut self) {}
    fn notifications_enabled(&self) -> bool {
        false
    }
    fn wait_capture(&mut self) {}
    fn width(&self) -> u32 {
        0
    }
    fn period(&self) -> u32 {
        0
    }
}

pub type Driver<'a> = IcuDriver<'a, NullBackend>;

pub fn config() -> IcuConfig<NullBackend> {
    IcuConfig::new(IcuMode::ActiveHigh, 1_000_000)
}

/// Driver in `Stop`.
pub fn driver<'a>() -> Driver<'a> {
    let drv = IcuDriver::new(NullBackend);
    drv.object_init();
    drv
}
