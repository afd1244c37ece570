//! Driver states and the transition table

use core::fmt;

/// Driver state machine states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum IcuState {
    /// Not initialized
    #[default]
    Uninit = 0,
    /// Stopped
    Stop = 1,
    /// Started, capture not armed
    Ready = 2,
    /// Capture armed, waiting for the first start edge
    Waiting = 3,
    /// First start edge seen, measurements are valid
    Active = 4,
}

/// Events that drive the state machine.
///
/// `ObjectInit` through `StopCapture` come from the API, the edges come
/// from interrupt dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IcuTrigger {
    ObjectInit,
    Start,
    Stop,
    StartCapture,
    StopCapture,
    /// Leading edge of a pulse (period notification)
    StartEdge,
    /// Trailing edge of a pulse (width notification)
    StopEdge,
}

impl IcuState {
    /// Target state for `trigger`, or `None` when the trigger is not legal
    /// in this state.
    pub const fn on(self, trigger: IcuTrigger) -> Option<IcuState> {
        match (self, trigger) {
            (Self::Uninit | Self::Stop, IcuTrigger::ObjectInit) => Some(Self::Stop),
            (Self::Stop, IcuTrigger::Start) => Some(Self::Ready),
            (Self::Ready, IcuTrigger::Stop) => Some(Self::Stop),
            (Self::Ready, IcuTrigger::StartCapture) => Some(Self::Waiting),
            (Self::Waiting | Self::Active, IcuTrigger::StopCapture) => Some(Self::Ready),
            (Self::Waiting | Self::Active, IcuTrigger::StartEdge) => Some(Self::Active),
            (Self::Waiting, IcuTrigger::StopEdge) => Some(Self::Waiting),
            (Self::Active, IcuTrigger::StopEdge) => Some(Self::Active),
            _ => None,
        }
    }

    /// A configuration is bound in this state
    pub const fn is_started(self) -> bool {
        matches!(self, Self::Ready | Self::Waiting | Self::Active)
    }

    /// The backend is armed in this state
    pub const fn is_capturing(self) -> bool {
        matches!(self, Self::Waiting | Self::Active)
    }
}

impl fmt::Display for IcuState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IcuState::Uninit => write!(f, "UNINIT"),
            IcuState::Stop => write!(f, "STOP"),
            IcuState::Ready => write!(f, "READY"),
            IcuState::Waiting => write!(f, "WAITING"),
            IcuState::Active => write!(f, "ACTIVE"),
        }
    }
}

impl fmt::Display for IcuTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IcuTrigger::ObjectInit => write!(f, "object_init"),
            IcuTrigger::Start => write!(f, "start"),
            IcuTrigger::Stop => write!(f, "stop"),
            IcuTrigger::StartCapture => write!(f, "start_capture"),
            IcuTrigger::StopCapture => write!(f, "stop_capture"),
            IcuTrigger::StartEdge => write!(f, "start edge"),
            IcuTrigger::StopEdge => write!(f, "stop edge"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for IcuState {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            IcuState::Uninit => defmt::write!(fmt, "UNINIT"),
            IcuState::Stop => defmt::write!(fmt, "STOP"),
            IcuState::Ready => defmt::write!(fmt, "READY"),
            IcuState::Waiting => defmt::write!(fmt, "WAITING"),
            IcuState::Active => defmt::write!(fmt, "ACTIVE"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for IcuTrigger {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "IcuTrigger({=u8})", *self as u8);
    }
}
