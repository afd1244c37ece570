//! Task suspension used by `wait_capture`
//!
//! The driver parks the waiting task with [`TaskSuspend::suspend`] and the
//! interrupt dispatcher wakes it with [`TaskSuspend::resume`]. Implementations
//! must keep a wake-up token: a `resume` issued before the matching
//! `suspend` makes that `suspend` return immediately.

use core::cell::Cell;

use critical_section::Mutex;

/// Park/unpark primitive for one waiting task
pub trait TaskSuspend {
    /// Block until a resume token is available, then consume it.
    fn suspend(&self);

    /// Make a resume token available. Must not block; callable from
    /// interrupt context.
    fn resume(&self);
}

/// Busy-waiting suspension usable on any target.
pub struct SpinSuspend {
    token: Mutex<Cell<bool>>,
}

impl SpinSuspend {
    pub const fn new() -> Self {
        Self {
            token: Mutex::new(Cell::new(false)),
        }
    }

    fn take(&self) -> bool {
        critical_section::with(|cs| self.token.borrow(cs).replace(false))
    }
}

impl Default for SpinSuspend {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskSuspend for SpinSuspend {
    fn suspend(&self) {
        while !self.take() {
            #[cfg(any(test, feature = "std"))]
            std::thread::yield_now();
            #[cfg(not(any(test, feature = "std")))]
            core::hint::spin_loop();
        }
    }

    fn resume(&self) {
        critical_section::with(|cs| self.token.borrow(cs).set(true));
    }
}

/// Cortex-M suspension: sleeps with `WFE` between checks, woken by `SEV`.
#[cfg(all(feature = "cortex-m", target_arch = "arm"))]
pub struct WfeSuspend {
    token: Mutex<Cell<bool>>,
}

#[cfg(all(feature = "cortex-m", target_arch = "arm"))]
impl WfeSuspend {
    pub const fn new() -> Self {
        Self {
            token: Mutex::new(Cell::new(false)),
        }
    }
}

#[cfg(all(feature = "cortex-m", target_arch = "arm"))]
impl Default for WfeSuspend {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(all(feature = "cortex-m", target_arch = "arm"))]
impl TaskSuspend for WfeSuspend {
    fn suspend(&self) {
        while !critical_section::with(|cs| self.token.borrow(cs).replace(false)) {
            cortex_m::asm::wfe();
        }
    }

    fn resume(&self) {
        critical_section::with(|cs| self.token.borrow(cs).set(true));
        cortex_m::asm::sev();
    }
}
