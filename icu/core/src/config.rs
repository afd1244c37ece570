//! Driver configuration supplied at start time

use core::fmt;
use core::time::Duration;

use critical_section::CriticalSection;

use crate::driver::IcuDriver;
use crate::suspend::SpinSuspend;

/// Nanoseconds per second
const NSEC_PER_SEC: u64 = 1_000_000_000;

/// Notification callback.
///
/// Runs inside interrupt dispatch with the dispatcher's critical section,
/// so it may call the `_i` operations and the measurement getters.
pub type IcuCallback<B, S = SpinSuspend> = fn(&IcuDriver<'_, B, S>, CriticalSection<'_>);

/// Which input level counts as the active part of a pulse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IcuMode {
    /// Pulse starts on a rising edge
    #[default]
    ActiveHigh,
    /// Pulse starts on a falling edge
    ActiveLow,
}

impl fmt::Display for IcuMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IcuMode::ActiveHigh => write!(f, "active-high"),
            IcuMode::ActiveLow => write!(f, "active-low"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for IcuMode {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            IcuMode::ActiveHigh => defmt::write!(fmt, "ActiveHigh"),
            IcuMode::ActiveLow => defmt::write!(fmt, "ActiveLow"),
        }
    }
}

/// ICU driver configuration.
///
/// Immutable for the whole start/stop cycle; the driver only borrows it.
/// An overflow callback must be present whenever the backend can deliver
/// overflow notifications.
pub struct IcuConfig<B, S = SpinSuspend> {
    /// Input polarity
    pub mode: IcuMode,
    /// Counter frequency in Hz
    pub frequency: u32,
    /// Called after a stop edge once a full pulse width is known
    pub width_callback: Option<IcuCallback<B, S>>,
    /// Called after a start edge once a full period is known
    pub period_callback: Option<IcuCallback<B, S>>,
    /// Called when the counter wraps before a measurement completes
    pub overflow_callback: Option<IcuCallback<B, S>>,
}

impl<B, S> IcuConfig<B, S> {
    /// Creates a configuration with no callbacks.
    pub const fn new(mode: IcuMode, frequency: u32) -> Self {
        Self {
            mode,
            frequency,
            width_callback: None,
            period_callback: None,
            overflow_callback: None,
        }
    }

    /// Sets the width callback.
    pub const fn width_callback(self, callback: IcuCallback<B, S>) -> Self {
        Self {
            width_callback: Some(callback),
            ..self
        }
    }

    /// Sets the period callback.
    pub const fn period_callback(self, callback: IcuCallback<B, S>) -> Self {
        Self {
            period_callback: Some(callback),
            ..self
        }
    }

    /// Sets the overflow callback.
    pub const fn overflow_callback(self, callback: IcuCallback<B, S>) -> Self {
        Self {
            overflow_callback: Some(callback),
            ..self
        }
    }

    /// Converts a tick count of this configuration's counter to a duration.
    pub fn ticks_to_duration(&self, ticks: u32) -> Duration {
        debug_assert!(self.frequency > 0, "icu: counter frequency must be non-zero");
        if self.frequency == 0 {
            return Duration::ZERO;
        }
        Duration::from_nanos(u64::from(ticks) * NSEC_PER_SEC / u64::from(self.frequency))
    }
}

// Manual impls: a derive would demand `B: Copy` and `S: Copy`.
impl<B, S> Clone for IcuConfig<B, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<B, S> Copy for IcuConfig<B, S> {}

impl<B, S> fmt::Debug for IcuConfig<B, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IcuConfig")
            .field("mode", &self.mode)
            .field("frequency", &self.frequency)
            .field("width_callback", &self.width_callback.is_some())
            .field("period_callback", &self.period_callback.is_some())
            .field("overflow_callback", &self.overflow_callback.is_some())
            .finish()
    }
}
