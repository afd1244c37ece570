//! End-to-end tests of the ICU driver on the simulated channel.

use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::thread;

use critical_section::CriticalSection;
use icu_core::{IcuConfig, IcuError, IcuMode, IcuState};
use icu_posix::{channel, PosixIcuConfig, PosixIcuDriver};

const FREQUENCY: u32 = 1_000_000;

fn base_config() -> PosixIcuConfig {
    IcuConfig::new(IcuMode::ActiveHigh, FREQUENCY)
}

static PWM_WIDTHS: AtomicUsize = AtomicUsize::new(0);
static PWM_PERIODS: AtomicUsize = AtomicUsize::new(0);
static PWM_LAST_WIDTH: AtomicU32 = AtomicU32::new(0);
static PWM_LAST_PERIOD: AtomicU32 = AtomicU32::new(0);

fn pwm_width(drv: &PosixIcuDriver<'_>, cs: CriticalSection<'_>) {
    PWM_WIDTHS.fetch_add(1, Ordering::SeqCst);
    PWM_LAST_WIDTH.store(drv.width_i(cs), Ordering::SeqCst);
}

fn pwm_period(drv: &PosixIcuDriver<'_>, cs: CriticalSection<'_>) {
    PWM_PERIODS.fetch_add(1, Ordering::SeqCst);
    PWM_LAST_PERIOD.store(drv.period_i(cs), Ordering::SeqCst);
}

#[test]
fn decodes_a_pwm_signal() {
    let config = base_config()
        .width_callback(pwm_width)
        .period_callback(pwm_period);
    let (drv, mut source) = channel();
    drv.object_init();
    drv.start(&config);
    drv.enable_notifications();
    drv.start_capture();

    source.pwm(&drv, 0xFFFF_FC00, 250, 1000, 5);

    assert_eq!(drv.state(), IcuState::Active);
    // The first leading edge only activates the driver.
    assert_eq!(PWM_PERIODS.load(Ordering::SeqCst), 4);
    assert_eq!(PWM_WIDTHS.load(Ordering::SeqCst), 5);
    assert_eq!(PWM_LAST_PERIOD.load(Ordering::SeqCst), 1000);
    assert_eq!(PWM_LAST_WIDTH.load(Ordering::SeqCst), 250);

    critical_section::with(|cs| {
        assert_eq!(drv.period_duration_i(cs), std::time::Duration::from_millis(1));
        assert_eq!(drv.width_duration_i(cs), std::time::Duration::from_micros(250));
    });

    drv.stop_capture();
    drv.stop();
    assert!(!source.registers().is_powered());
}

#[test]
fn wait_capture_parks_until_first_edge() {
    let config = base_config();
    let (drv, mut source) = channel();
    drv.object_init();
    drv.start(&config);
    drv.enable_notifications();

    thread::scope(|s| {
        let waiter = s.spawn(|| drv.wait_capture());
        while !source.registers().is_armed() {
            thread::yield_now();
        }
        assert!(source.stop_edge(&drv, 10));
        assert_eq!(drv.state(), IcuState::Waiting);

        assert!(source.start_edge(&drv, 20));
        assert_eq!(waiter.join().unwrap(), Ok(()));
    });
    assert_eq!(drv.state(), IcuState::Active);
}

#[test]
fn stop_capture_cancels_waiter() {
    let config = base_config();
    let (drv, source) = channel();
    drv.object_init();
    drv.start(&config);
    drv.enable_notifications();

    thread::scope(|s| {
        let waiter = s.spawn(|| drv.wait_capture());
        while !source.registers().is_armed() {
            thread::yield_now();
        }
        drv.stop_capture();
        assert_eq!(waiter.join().unwrap(), Err(IcuError::Aborted));
    });
    assert_eq!(drv.state(), IcuState::Ready);
    assert!(!source.registers().is_armed());
}

#[test]
fn masked_channel_latches_without_dispatch() {
    let config = base_config();
    let (drv, mut source) = channel();
    drv.object_init();
    drv.start(&config);
    drv.start_capture();

    assert!(!source.start_edge(&drv, 100));
    assert!(!source.stop_edge(&drv, 160));
    assert_eq!(drv.state(), IcuState::Waiting);
    assert_eq!(source.registers().width(), 60);

    drv.enable_notifications();
    assert!(source.start_edge(&drv, 300));
    assert_eq!(drv.state(), IcuState::Active);
    assert_eq!(drv.period(), 200);
}

#[test]
fn disarmed_channel_ignores_the_signal() {
    let config = base_config();
    let (drv, mut source) = channel();
    drv.object_init();
    drv.start(&config);
    drv.enable_notifications();

    assert!(!source.start_edge(&drv, 0));
    assert!(!source.stop_edge(&drv, 10));
    assert_eq!(drv.state(), IcuState::Ready);
}

static OVERFLOWS: AtomicUsize = AtomicUsize::new(0);

fn count_overflow(_drv: &PosixIcuDriver<'_>, _cs: CriticalSection<'_>) {
    OVERFLOWS.fetch_add(1, Ordering::SeqCst);
}

#[test]
fn overflow_reaches_callback() {
    let config = base_config().overflow_callback(count_overflow);
    let (drv, mut source) = channel();
    drv.object_init();
    drv.start(&config);
    drv.enable_notifications();
    drv.start_capture();

    assert!(source.overflow(&drv));
    assert_eq!(OVERFLOWS.load(Ordering::SeqCst), 1);
    assert_eq!(drv.state(), IcuState::Waiting);
}

#[test]
fn notification_toggles_are_idempotent() {
    let config = base_config();
    let (drv, source) = channel();
    drv.object_init();
    drv.start(&config);

    drv.enable_notifications();
    drv.enable_notifications();
    assert!(source.registers().interrupts_enabled());
    assert!(drv.are_notifications_enabled());

    drv.disable_notifications();
    drv.disable_notifications();
    assert!(!source.registers().interrupts_enabled());
    assert!(!drv.are_notifications_enabled());
}

#[test]
fn start_programs_mode_and_frequency() {
    let config: PosixIcuConfig = IcuConfig::new(IcuMode::ActiveLow, 72_000_000);
    let (drv, source) = channel();
    drv.object_init();
    drv.start(&config);

    let regs = source.registers();
    assert!(regs.is_powered());
    assert_eq!(regs.mode(), IcuMode::ActiveLow);
    assert_eq!(regs.frequency(), 72_000_000);
}

static REARMS: AtomicUsize = AtomicUsize::new(0);

// One-shot measurement: stop after each width, then re-arm for the next.
fn one_shot_width(drv: &PosixIcuDriver<'_>, cs: CriticalSection<'_>) {
    REARMS.fetch_add(1, Ordering::SeqCst);
    drv.stop_capture_i(cs);
    drv.start_capture_i(cs);
}

#[test]
fn callback_rearms_from_interrupt_context() {
    let config = base_config().width_callback(one_shot_width);
    let (drv, mut source) = channel();
    drv.object_init();
    drv.start(&config);
    drv.enable_notifications();
    drv.start_capture();

    source.pwm(&drv, 0, 100, 400, 3);
    // A re-arm only discards the next leading edge; its trailing edge still
    // closes a full pulse.
    assert_eq!(REARMS.load(Ordering::SeqCst), 3);
    assert_eq!(drv.state(), IcuState::Waiting);
}

#[test]
fn locked_wait_polls_a_masked_channel() {
    let config = base_config();
    let (drv, mut source) = channel();
    drv.object_init();
    drv.start(&config);
    drv.start_capture();

    thread::scope(|s| {
        let poller = s.spawn(|| critical_section::with(|cs| drv.wait_capture_i(cs)));
        // Masked edges latch without the host lock, so the poller sees this
        // one whether or not it already holds the lock.
        assert!(!source.start_edge(&drv, 100));
        poller.join().unwrap();
    });
    assert_eq!(drv.state(), IcuState::Active);
    assert!(!source.registers().is_captured());

    assert!(!source.start_edge(&drv, 350));
    assert_eq!(drv.period(), 250);
}

#[test]
fn rearming_drops_the_period_reference() {
    let config = base_config();
    let (drv, mut source) = channel();
    drv.object_init();
    drv.start(&config);
    drv.enable_notifications();
    drv.start_capture();

    source.pwm(&drv, 100, 50, 200, 2);
    assert_eq!(drv.period(), 200);

    drv.stop_capture();
    drv.start_capture();
    // The idle gap since the last pulse is not a period.
    assert!(source.start_edge(&drv, 10_000));
    assert_eq!(drv.state(), IcuState::Active);
    assert_eq!(drv.period(), 0);

    assert!(source.start_edge(&drv, 10_400));
    assert_eq!(drv.period(), 400);
}
