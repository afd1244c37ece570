//! Unit tests for icu-core, run on the host with the `critical-section`
//! std implementation.

use critical_section::CriticalSection;

use crate::{CaptureBackend, IcuConfig, IcuDriver, IcuMode};


/// Backend double recording what the driver asked of it. The hit counters
/// are bumped by the test callbacks below.
#[derive(Debug, Default)]
pub(crate) struct MockBackend {
    pub started: bool,
    pub mode: Option<IcuMode>,
    pub frequency: u32,
    pub armed: bool,
    pub notifications: bool,
    pub polls: usize,
    pub width: u32,
    pub period: u32,
    pub width_hits: usize,
    pub period_hits: usize,
    pub overflow_hits: usize,
    pub seen_width: Option<u32>,
    pub seen_period: Option<u32>,
}

impl CaptureBackend for MockBackend {
    fn start(&mut self, mode: IcuMode, frequency: u32) {
        self.started = true;
        self.mode = Some(mode);
        self.frequency = frequency;
    }

    fn stop(&mut self) {
        self.started = false;
    }

    fn start_capture(&mut self) {
        self.armed = true;
    }

    fn stop_capture(&mut self) {
        self.armed = false;
    }

    fn enable_notifications(&mut self) {
        self.notifications = true;
    }

    fn disable_notifications(&mut self) {
        self.notifications = false;
    }

    fn notifications_enabled(&self) -> bool {
        self.notifications
    }

    // The edge is taken as already latched.
    fn wait_capture(&mut self) {
        assert!(self.armed, "polled a disarmed channel");
        self.polls += 1;
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn period(&self) -> u32 {
        self.period
    }
}

pub(crate) type Driver<'a> = IcuDriver<'a, MockBackend>;
pub(crate) type Config = IcuConfig<MockBackend>;

pub(crate) const FREQUENCY: u32 = 1_000_000;

pub(crate) fn config() -> Config {
    IcuConfig::new(IcuMode::ActiveHigh, FREQUENCY)
}

/// Driver in `Ready` with `config` bound.
pub(crate) fn started(config: &Config) -> Driver<'_> {
    let drv = IcuDriver::new(MockBackend::default());
    drv.object_init();
    drv.start(config);
    drv
}

/// Latch `period` ticks and deliver a start edge.
pub(crate) fn start_edge(drv: &Driver<'_>, period: u32) {
    critical_section::with(|cs| {
        drv.with_backend_i(cs, |b| b.period = period);
        drv.isr_period(cs);
    });
}

/// Latch `width` ticks and deliver a stop edge.
pub(crate) fn stop_edge(drv: &Driver<'_>, width: u32) {
    critical_section::with(|cs| {
        drv.with_backend_i(cs, |b| b.width = width);
        drv.isr_width(cs);
    });
}

pub(crate) fn overflow(drv: &Driver<'_>) {
    critical_section::with(|cs| drv.isr_overflow(cs));
}

pub(crate) fn count_width(drv: &Driver<'_>, cs: CriticalSection<'_>) {
    let width = drv.width_i(cs);
    drv.with_backend_i(cs, |b| {
        b.width_hits += 1;
        b.seen_width = Some(width);
    });
}

pub(crate) fn count_period(drv: &Driver<'_>, cs: CriticalSection<'_>) {
    let period = drv.period_i(cs);
    drv.with_backend_i(cs, |b| {
        b.period_hits += 1;
        b.seen_period = Some(period);
    });
}

pub(crate) fn count_overflow(drv: &Driver<'_>, cs: CriticalSection<'_>) {
    drv.with_backend_i(cs, |b| b.overflow_hits += 1);
}

pub(crate) fn hits(drv: &Driver<'_>) -> (usize, usize, usize) {
    drv.with_backend(|b| (b.width_hits, b.period_hits, b.overflow_hits))
}
