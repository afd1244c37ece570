//! Simulated capture channel
//!
//! [`SimulatedCapture`] is the backend the driver owns. [`SignalSource`]
//! plays the input signal: it timestamps edges on a free-running counter,
//! latches width and period into the shared [`CaptureRegisters`] and, when
//! the channel is armed and unmasked, calls the driver's dispatch entry
//! points inside a critical section, as an interrupt vector would.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use icu_core::{CaptureBackend, IcuDriver, IcuMode, TaskSuspend};

/// Register file of one simulated capture channel
#[derive(Debug, Default)]
pub struct CaptureRegisters {
    powered: AtomicBool,
    active_low: AtomicBool,
    frequency: AtomicU32,
    armed: AtomicBool,
    /// Bumped on every arm; edges before it are not a period reference
    arm_count: AtomicU32,
    /// Start edge latched since the last arm, cleared by a poll
    captured: AtomicBool,
    interrupts: AtomicBool,
    width: AtomicU32,
    period: AtomicU32,
}

impl CaptureRegisters {
    pub fn is_powered(&self) -> bool {
        self.powered.load(Ordering::SeqCst)
    }

    pub fn mode(&self) -> IcuMode {
        if self.active_low.load(Ordering::SeqCst) {
            IcuMode::ActiveLow
        } else {
            IcuMode::ActiveHigh
        }
    }

    pub fn frequency(&self) -> u32 {
        self.frequency.load(Ordering::SeqCst)
    }

    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::SeqCst)
    }

    /// A start edge was latched and not yet consumed by a poll
    pub fn is_captured(&self) -> bool {
        self.captured.load(Ordering::SeqCst)
    }

    pub fn interrupts_enabled(&self) -> bool {
        self.interrupts.load(Ordering::SeqCst)
    }

    pub fn width(&self) -> u32 {
        self.width.load(Ordering::SeqCst)
    }

    pub fn period(&self) -> u32 {
        self.period.load(Ordering::SeqCst)
    }
}

/// Software capture backend
#[derive(Debug, Default)]
pub struct SimulatedCapture {
    regs: Arc<CaptureRegisters>,
}

impl SimulatedCapture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared handle to the register file
    pub fn registers(&self) -> Arc<CaptureRegisters> {
        Arc::clone(&self.regs)
    }
}

impl CaptureBackend for SimulatedCapture {
    fn start(&mut self, mode: IcuMode, frequency: u32) {
        self.regs
            .active_low
            .store(mode == IcuMode::ActiveLow, Ordering::SeqCst);
        self.regs.frequency.store(frequency, Ordering::SeqCst);
        self.regs.width.store(0, Ordering::SeqCst);
        self.regs.period.store(0, Ordering::SeqCst);
        self.regs.powered.store(true, Ordering::SeqCst);
        log::trace!("sim: timer on, {} at {} Hz", mode, frequency);
    }

    fn stop(&mut self) {
        self.regs.interrupts.store(false, Ordering::SeqCst);
        self.regs.armed.store(false, Ordering::SeqCst);
        self.regs.powered.store(false, Ordering::SeqCst);
        log::trace!("sim: timer off");
    }

    fn start_capture(&mut self) {
        self.regs.captured.store(false, Ordering::SeqCst);
        self.regs.arm_count.fetch_add(1, Ordering::SeqCst);
        self.regs.armed.store(true, Ordering::SeqCst);
    }

    fn stop_capture(&mut self) {
        self.regs.armed.store(false, Ordering::SeqCst);
    }

    fn enable_notifications(&mut self) {
        self.regs.interrupts.store(true, Ordering::SeqCst);
    }

    fn disable_notifications(&mut self) {
        self.regs.interrupts.store(false, Ordering::SeqCst);
    }

    fn notifications_enabled(&self) -> bool {
        self.regs.interrupts_enabled()
    }

    // The source latches masked edges without taking the host lock, so it
    // can feed this loop from another thread.
    fn wait_capture(&mut self) {
        debug_assert!(
            !self.regs.interrupts_enabled(),
            "sim: polled capture needs notifications masked"
        );
        while !self.regs.captured.swap(false, Ordering::SeqCst) {
            std::thread::yield_now();
        }
        log::trace!("sim: polled start edge, period {}", self.regs.period());
    }

    fn width(&self) -> u32 {
        self.regs.width()
    }

    fn period(&self) -> u32 {
        self.regs.period()
    }
}

/// Input signal generator driving one simulated channel.
///
/// Edge timestamps are counter ticks; differences wrap like a hardware
/// counter. Each edge method returns whether the driver was notified.
/// Re-arming the channel drops the period reference, so the first edge
/// after an arm latches a zero period.
#[derive(Debug)]
pub struct SignalSource {
    regs: Arc<CaptureRegisters>,
    last_start: Option<u32>,
    arm_seen: u32,
}

impl SignalSource {
    pub fn new(regs: Arc<CaptureRegisters>) -> Self {
        Self {
            regs,
            last_start: None,
            arm_seen: 0,
        }
    }

    pub fn registers(&self) -> &CaptureRegisters {
        &self.regs
    }

    /// Leading edge of a pulse at counter value `at`; latches the period.
    pub fn start_edge<S: TaskSuspend>(
        &mut self,
        driver: &IcuDriver<'_, SimulatedCapture, S>,
        at: u32,
    ) -> bool {
        if !self.armed() {
            return false;
        }
        let period = self.last_start.map_or(0, |start| at.wrapping_sub(start));
        self.last_start = Some(at);
        self.regs.period.store(period, Ordering::SeqCst);
        self.regs.captured.store(true, Ordering::SeqCst);
        self.raise(|cs| driver.isr_period(cs))
    }

    /// Trailing edge of a pulse at counter value `at`; latches the width.
    pub fn stop_edge<S: TaskSuspend>(
        &mut self,
        driver: &IcuDriver<'_, SimulatedCapture, S>,
        at: u32,
    ) -> bool {
        if !self.armed() {
            return false;
        }
        let width = self.last_start.map_or(0, |start| at.wrapping_sub(start));
        self.regs.width.store(width, Ordering::SeqCst);
        self.raise(|cs| driver.isr_width(cs))
    }

    /// Counter wrapped before a measurement completed.
    pub fn overflow<S: TaskSuspend>(&mut self, driver: &IcuDriver<'_, SimulatedCapture, S>) -> bool {
        if !self.armed() {
            return false;
        }
        self.last_start = None;
        self.raise(|cs| driver.isr_overflow(cs))
    }

    /// One pulse of `width` ticks starting at `at`.
    pub fn pulse<S: TaskSuspend>(
        &mut self,
        driver: &IcuDriver<'_, SimulatedCapture, S>,
        at: u32,
        width: u32,
    ) {
        self.start_edge(driver, at);
        self.stop_edge(driver, at.wrapping_add(width));
    }

    /// `cycles` pulses of `width` ticks, one every `period` ticks, starting
    /// at `at`. Returns the counter value of the next cycle start.
    pub fn pwm<S: TaskSuspend>(
        &mut self,
        driver: &IcuDriver<'_, SimulatedCapture, S>,
        at: u32,
        width: u32,
        period: u32,
        cycles: usize,
    ) -> u32 {
        debug_assert!(width < period, "sim: pulse wider than its period");
        let mut start = at;
        for _ in 0..cycles {
            self.pulse(driver, start, width);
            start = start.wrapping_add(period);
        }
        start
    }

    /// Whether the channel is armed, forgetting the last leading edge when
    /// it was armed again since the previous one.
    fn armed(&mut self) -> bool {
        if !self.regs.is_armed() {
            return false;
        }
        let arm = self.regs.arm_count.load(Ordering::SeqCst);
        if arm != self.arm_seen {
            self.arm_seen = arm;
            self.last_start = None;
        }
        true
    }

    fn raise(&self, isr: impl FnOnce(critical_section::CriticalSection<'_>)) -> bool {
        if !self.regs.interrupts_enabled() {
            return false;
        }
        critical_section::with(isr);
        true
    }
}
