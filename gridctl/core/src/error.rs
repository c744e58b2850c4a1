//! Error codes, severities and the packed status byte

use core::fmt;
use core::ops::BitOr;

use thiserror::Error;

/// Result type used throughout gridctl
pub type GridResult<T> = Result<T, ErrorCode>;

/// Error codes
///
/// Codes below `0x10` are runtime conditions; codes from `0x10` up are
/// programming errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[repr(u8)]
pub enum ErrorCode {
    /// Hardware failure, details are module specific
    #[error("hardware error")]
    HwError = 0x01,
    /// Error without any clear cause
    #[error("generic error")]
    Generic = 0x02,
    /// Not enough memory available
    #[error("out of memory")]
    Memory = 0x03,
    /// Asynchronous call took too long
    #[error("timeout")]
    Timeout = 0x04,
    /// Algorithm reached an impossible state
    #[error("invalid state")]
    InvalidState = 0x10,
    /// Method called when it should not be
    #[error("invalid call")]
    InvalidCall = 0x11,
    /// Method called with an out of domain argument
    #[error("invalid argument")]
    InvalidArgument = 0x12,
    /// Bounded iteration ran over its limit
    #[error("infinite loop")]
    InfiniteLoop = 0x13,
}

impl ErrorCode {
    /// Short static name, as printed in log headers
    pub const fn name(self) -> &'static str {
        match self {
            Self::HwError => "HWERROR",
            Self::Generic => "GENERIC_ERROR",
            Self::Memory => "MEMORY_ERROR",
            Self::Timeout => "TIMEOUT_ERROR",
            Self::InvalidState => "INVALID_STATE",
            Self::InvalidCall => "INVALID_CALL",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::InfiniteLoop => "INFINITE_LOOP",
        }
    }

    /// Raw code value
    pub const fn raw(self) -> u8 {
        self as u8
    }

    /// Decode a raw code, `0` and unknown values yield `None`
    pub const fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0x01 => Some(Self::HwError),
            0x02 => Some(Self::Generic),
            0x03 => Some(Self::Memory),
            0x04 => Some(Self::Timeout),
            0x10 => Some(Self::InvalidState),
            0x11 => Some(Self::InvalidCall),
            0x12 => Some(Self::InvalidArgument),
            0x13 => Some(Self::InfiniteLoop),
            _ => None,
        }
    }

    /// True for defects in calling code rather than runtime conditions
    pub const fn is_programming_error(self) -> bool {
        self.raw() >= 0x10
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ErrorCode {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "{=str}", self.name());
    }
}

/// Message severity, smaller is more severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Severity {
    /// System is unusable
    Emergency = 0,
    /// Action must be taken immediately
    Alert = 1,
    /// System only available in a degraded state
    Critical = 2,
    /// A single task failed, state is recoverable
    Error = 3,
    /// Non critical functions may be unavailable
    Warning = 4,
    /// Normal but significant condition
    Notice = 5,
    /// Program working as expected
    Info = 6,
    /// Debugging information
    Debug = 7,
}

impl Severity {
    /// Five character name, as printed in log headers
    pub const fn name(self) -> &'static str {
        match self {
            Self::Emergency => "EMERG",
            Self::Alert => "ALERT",
            Self::Critical => "CRIT!",
            Self::Error => "ERROR",
            Self::Warning => "WARN",
            Self::Notice => "NOTE",
            Self::Info => "INFO",
            Self::Debug => "DEBUG",
        }
    }

    /// Decode the 3-bit level field
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0x07 {
            0 => Self::Emergency,
            1 => Self::Alert,
            2 => Self::Critical,
            3 => Self::Error,
            4 => Self::Warning,
            5 => Self::Notice,
            6 => Self::Info,
            _ => Self::Debug,
        }
    }

    /// Closest `log` facade level
    pub const fn to_log_level(self) -> log::Level {
        match self {
            Self::Emergency | Self::Alert | Self::Critical | Self::Error => log::Level::Error,
            Self::Warning => log::Level::Warn,
            Self::Notice | Self::Info => log::Level::Info,
            Self::Debug => log::Level::Debug,
        }
    }

    /// Default filter level for the current build profile
    pub const fn build_default() -> Self {
        if cfg!(debug_assertions) {
            Self::Debug
        } else {
            Self::Info
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Severity {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "{=str}", self.name());
    }
}

/// Error code and severity packed in one byte
///
/// Low 5 bits hold the code (`0` meaning OK), high 3 bits the severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Status(u8);

impl Status {
    /// Success at `Info` level
    pub const OK: Self = Self((Severity::Info as u8) << 5);

    pub const fn new(code: ErrorCode, severity: Severity) -> Self {
        Self((code.raw() & 0x1F) | ((severity as u8) << 5))
    }

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn code(self) -> Option<ErrorCode> {
        ErrorCode::from_raw(self.0 & 0x1F)
    }

    pub const fn severity(self) -> Severity {
        Severity::from_bits(self.0 >> 5)
    }

    pub const fn is_ok(self) -> bool {
        self.0 & 0x1F == 0
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::OK
    }
}

impl BitOr<Severity> for ErrorCode {
    type Output = Status;

    fn bitor(self, rhs: Severity) -> Status {
        Status::new(self, rhs)
    }
}

impl From<ErrorCode> for Status {
    fn from(code: ErrorCode) -> Self {
        Status::new(code, Severity::Error)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code() {
            Some(code) => write!(f, "{}|{}", code.name(), self.severity()),
            None => write!(f, "OK|{}", self.severity()),
        }
    }
}
