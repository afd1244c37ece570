//! ICU driver object and its public API
//!
//! All shared state lives in `critical_section::Mutex` cells. The `_i`
//! methods take the [`CriticalSection`] token as proof that the caller
//! already holds exclusion; the plain methods enter a critical section and
//! call their `_i` twin, so each transition is implemented once.

use core::cell::{Cell, RefCell};
use core::time::Duration;

use critical_section::{CriticalSection, Mutex};

use crate::backend::CaptureBackend;
use crate::config::IcuConfig;
use crate::state::{IcuState, IcuTrigger};
use crate::suspend::{SpinSuspend, TaskSuspend};
use crate::{IcuError, IcuResult};

/// Slot for the single task blocked in `wait_capture`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WaitSlot {
    Idle,
    Pending,
    Completed(IcuResult<()>),
}

/// Driver for one hardware capture channel.
///
/// The configuration is borrowed for `'a`, i.e. between `start` and `stop`.
pub struct IcuDriver<'a, B, S = SpinSuspend> {
    pub(crate) state: Mutex<Cell<IcuState>>,
    pub(crate) config: Mutex<Cell<Option<&'a IcuConfig<B, S>>>>,
    backend: Mutex<RefCell<B>>,
    /// `Active` has been reached since the last `start`
    pub(crate) measured: Mutex<Cell<bool>>,
    waiter: Mutex<Cell<WaitSlot>>,
    suspend: S,
}

impl<'a, B: CaptureBackend> IcuDriver<'a, B, SpinSuspend> {
    /// Create a driver in the `Uninit` state, waiting by spinning.
    pub const fn new(backend: B) -> Self {
        Self::with_suspend(backend, SpinSuspend::new())
    }
}

impl<'a, B: CaptureBackend, S: TaskSuspend> IcuDriver<'a, B, S> {
    /// Create a driver in the `Uninit` state with a custom suspension
    /// primitive for `wait_capture`.
    pub const fn with_suspend(backend: B, suspend: S) -> Self {
        Self {
            state: Mutex::new(Cell::new(IcuState::Uninit)),
            config: Mutex::new(Cell::new(None)),
            backend: Mutex::new(RefCell::new(backend)),
            measured: Mutex::new(Cell::new(false)),
            waiter: Mutex::new(Cell::new(WaitSlot::Idle)),
            suspend,
        }
    }

    /// Current state
    pub fn state(&self) -> IcuState {
        critical_section::with(|cs| self.state_i(cs))
    }

    pub fn state_i(&self, cs: CriticalSection<'_>) -> IcuState {
        self.state.borrow(cs).get()
    }

    /// Configuration bound by the last `start`, if still started
    pub fn config(&self) -> Option<&'a IcuConfig<B, S>> {
        critical_section::with(|cs| self.config_i(cs))
    }

    pub fn config_i(&self, cs: CriticalSection<'_>) -> Option<&'a IcuConfig<B, S>> {
        self.config.borrow(cs).get()
    }

    /// Run `f` with exclusive access to the backend.
    ///
    /// Intended for the backend's own interrupt layer (reading and clearing
    /// status flags) and for diagnostics.
    ///
    /// The backend stays borrowed until `f` returns. Call the `isr_*` entry
    /// points after the closure, never from inside it: callbacks reach the
    /// backend again through `width_i`, `period_i` or the capture
    /// operations, and a nested borrow panics.
    pub fn with_backend_i<R>(&self, cs: CriticalSection<'_>, f: impl FnOnce(&mut B) -> R) -> R {
        f(&mut *self.backend.borrow_ref_mut(cs))
    }

    pub fn with_backend<R>(&self, f: impl FnOnce(&mut B) -> R) -> R {
        critical_section::with(|cs| self.with_backend_i(cs, f))
    }

    /// Target state for an API trigger; `None` is a precondition violation.
    fn check(&self, cs: CriticalSection<'_>, trigger: IcuTrigger) -> Option<IcuState> {
        let from = self.state_i(cs);
        let to = from.on(trigger);
        debug_assert!(to.is_some(), "icu: {} is invalid in state {}", trigger, from);
        if to.is_none() {
            log::warn!("icu: ignoring {} in state {}", trigger, from);
        }
        to
    }

    fn enter(&self, cs: CriticalSection<'_>, to: IcuState) {
        let from = self.state.borrow(cs).replace(to);
        log::debug!("icu: {} -> {}", from, to);
    }

    /// Hand `result` to the task blocked in `wait_capture`, if any.
    pub(crate) fn complete_wait(&self, cs: CriticalSection<'_>, result: IcuResult<()>) {
        let slot = self.waiter.borrow(cs);
        if slot.get() == WaitSlot::Pending {
            slot.set(WaitSlot::Completed(result));
            self.suspend.resume();
        }
    }

    /// `Uninit` (or `Stop`) → `Stop`.
    pub fn object_init(&self) {
        critical_section::with(|cs| self.object_init_i(cs))
    }

    pub fn object_init_i(&self, cs: CriticalSection<'_>) {
        if let Some(to) = self.check(cs, IcuTrigger::ObjectInit) {
            self.config.borrow(cs).set(None);
            self.measured.borrow(cs).set(false);
            self.waiter.borrow(cs).set(WaitSlot::Idle);
            self.enter(cs, to);
        }
    }

    /// `Stop` → `Ready`, binding `config` until [`stop`](Self::stop).
    pub fn start(&self, config: &'a IcuConfig<B, S>) {
        critical_section::with(|cs| self.start_i(cs, config))
    }

    pub fn start_i(&self, cs: CriticalSection<'_>, config: &'a IcuConfig<B, S>) {
        if let Some(to) = self.check(cs, IcuTrigger::Start) {
            self.config.borrow(cs).set(Some(config));
            self.measured.borrow(cs).set(false);
            self.backend
                .borrow_ref_mut(cs)
                .start(config.mode, config.frequency);
            log::debug!(
                "icu: started, {} at {} Hz",
                config.mode,
                config.frequency
            );
            self.enter(cs, to);
        }
    }

    /// `Ready` → `Stop`, releasing the configuration.
    ///
    /// Capture must have been stopped first.
    pub fn stop(&self) {
        critical_section::with(|cs| self.stop_i(cs))
    }

    pub fn stop_i(&self, cs: CriticalSection<'_>) {
        if let Some(to) = self.check(cs, IcuTrigger::Stop) {
            self.backend.borrow_ref_mut(cs).stop();
            self.config.borrow(cs).set(None);
            self.enter(cs, to);
        }
    }

    /// `Ready` → `Waiting`, arming the backend.
    pub fn start_capture(&self) {
        critical_section::with(|cs| self.start_capture_i(cs))
    }

    pub fn start_capture_i(&self, cs: CriticalSection<'_>) {
        if let Some(to) = self.check(cs, IcuTrigger::StartCapture) {
            self.backend.borrow_ref_mut(cs).start_capture();
            self.enter(cs, to);
        }
    }

    /// `Waiting`/`Active` → `Ready`, disarming the backend.
    ///
    /// A task blocked in [`wait_capture`](Self::wait_capture) is woken with
    /// [`IcuError::Aborted`].
    pub fn stop_capture(&self) {
        critical_section::with(|cs| self.stop_capture_i(cs))
    }

    pub fn stop_capture_i(&self, cs: CriticalSection<'_>) {
        if let Some(to) = self.check(cs, IcuTrigger::StopCapture) {
            self.backend.borrow_ref_mut(cs).stop_capture();
            self.enter(cs, to);
            self.complete_wait(cs, Err(IcuError::Aborted));
        }
    }

    /// Block until the first start edge brings the driver to `Active`.
    ///
    /// Arms capture when called in `Ready` and returns at once when already
    /// `Active`. Only one task may wait at a time. There is no timeout;
    /// a concurrent [`stop_capture`](Self::stop_capture) cancels the wait.
    pub fn wait_capture(&self) -> IcuResult<()> {
        let early = critical_section::with(|cs| {
            match self.state_i(cs) {
                IcuState::Active => return Some(Ok(())),
                IcuState::Ready => self.start_capture_i(cs),
                IcuState::Waiting => {}
                state => {
                    debug_assert!(false, "icu: wait_capture is invalid in state {}", state);
                    return Some(Err(IcuError::Aborted));
                }
            }
            let slot = self.waiter.borrow(cs);
            debug_assert!(
                slot.get() != WaitSlot::Pending,
                "icu: another task is already waiting"
            );
            slot.set(WaitSlot::Pending);
            None
        });
        if let Some(result) = early {
            return result;
        }

        log::trace!("icu: waiting for first edge");
        loop {
            self.suspend.suspend();
            let done = critical_section::with(|cs| {
                let slot = self.waiter.borrow(cs);
                match slot.get() {
                    WaitSlot::Completed(result) => {
                        slot.set(WaitSlot::Idle);
                        Some(result)
                    }
                    _ => None,
                }
            });
            if let Some(result) = done {
                return result;
            }
        }
    }

    /// Locked twin of [`wait_capture`](Self::wait_capture): poll the backend
    /// for the first start edge instead of suspending.
    ///
    /// For callers that already hold the critical section, such as a
    /// run-to-completion main loop. Notifications should be masked, since the
    /// polled edge is consumed without dispatch and no callback fires for it.
    /// Arms capture when called in `Ready` and returns at once when already
    /// `Active`. A task blocked in `wait_capture` is released.
    pub fn wait_capture_i(&self, cs: CriticalSection<'_>) {
        match self.state_i(cs) {
            IcuState::Active => return,
            IcuState::Ready => self.start_capture_i(cs),
            IcuState::Waiting => {}
            state => {
                debug_assert!(false, "icu: wait_capture is invalid in state {}", state);
                log::warn!("icu: ignoring wait_capture in state {}", state);
                return;
            }
        }
        let Some(to) = self.check(cs, IcuTrigger::StartEdge) else {
            return;
        };
        self.backend.borrow_ref_mut(cs).wait_capture();
        self.measured.borrow(cs).set(true);
        self.enter(cs, to);
        self.complete_wait(cs, Ok(()));
    }

    /// Unmask backend notifications. Calling it twice equals calling it once.
    pub fn enable_notifications(&self) {
        critical_section::with(|cs| self.enable_notifications_i(cs))
    }

    pub fn enable_notifications_i(&self, cs: CriticalSection<'_>) {
        debug_assert!(
            self.state_i(cs).is_started(),
            "icu: notifications require a started driver"
        );
        self.backend.borrow_ref_mut(cs).enable_notifications();
    }

    /// Mask backend notifications. Calling it twice equals calling it once.
    pub fn disable_notifications(&self) {
        critical_section::with(|cs| self.disable_notifications_i(cs))
    }

    pub fn disable_notifications_i(&self, cs: CriticalSection<'_>) {
        debug_assert!(
            self.state_i(cs).is_started(),
            "icu: notifications require a started driver"
        );
        self.backend.borrow_ref_mut(cs).disable_notifications();
    }

    pub fn are_notifications_enabled(&self) -> bool {
        critical_section::with(|cs| self.are_notifications_enabled_i(cs))
    }

    pub fn are_notifications_enabled_i(&self, cs: CriticalSection<'_>) -> bool {
        self.backend.borrow_ref(cs).notifications_enabled()
    }

    /// Ticks between the latest start and stop edges.
    ///
    /// Meant to be called from the width callback, or once `Active` has been
    /// reached since the last `start`. Earlier reads are a precondition
    /// violation.
    pub fn width(&self) -> u32 {
        critical_section::with(|cs| self.width_i(cs))
    }

    pub fn width_i(&self, cs: CriticalSection<'_>) -> u32 {
        debug_assert!(self.measured.borrow(cs).get(), "icu: no measurement available");
        self.backend.borrow_ref(cs).width()
    }

    /// Ticks between the two latest start edges.
    ///
    /// Meant to be called from the period callback, or once `Active` has
    /// been reached.
    pub fn period(&self) -> u32 {
        critical_section::with(|cs| self.period_i(cs))
    }

    pub fn period_i(&self, cs: CriticalSection<'_>) -> u32 {
        debug_assert!(self.measured.borrow(cs).get(), "icu: no measurement available");
        self.backend.borrow_ref(cs).period()
    }

    /// Latest width converted with the configured counter frequency
    pub fn width_duration_i(&self, cs: CriticalSection<'_>) -> Duration {
        let ticks = self.width_i(cs);
        self.config_i(cs)
            .map_or(Duration::ZERO, |config| config.ticks_to_duration(ticks))
    }

    /// Latest period converted with the configured counter frequency
    pub fn period_duration_i(&self, cs: CriticalSection<'_>) -> Duration {
        let ticks = self.period_i(cs);
        self.config_i(cs)
            .map_or(Duration::ZERO, |config| config.ticks_to_duration(ticks))
    }
}
