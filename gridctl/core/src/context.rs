//! Injected runtime context
//!
//! Schedulers and drivers never reach for global state: they receive a
//! [`Context`] at construction and route logging, assertions and subsystem
//! availability through it.

use core::cell::Cell;
use core::fmt;

use critical_section::Mutex;

use crate::{ErrorCode, Severity};

/// Collaborator providing the logging sink, the error signal and flags
pub trait Context {
    /// Emit a message, returns false if it was filtered or dropped
    fn log(&self, facility: &str, severity: Severity, args: fmt::Arguments<'_>) -> bool;

    /// Report a programming error
    fn assert_error(&self, code: ErrorCode, msg: &str);

    /// True once any error has been raised and not cleared
    fn has_error(&self) -> bool;

    fn raise_error(&self);

    fn clear_error(&self);

    fn set_flag(&self, flag: Flag, value: bool);

    fn flag(&self, flag: Flag) -> bool;
}

impl<C: Context + ?Sized> Context for &C {
    fn log(&self, facility: &str, severity: Severity, args: fmt::Arguments<'_>) -> bool {
        (**self).log(facility, severity, args)
    }

    fn assert_error(&self, code: ErrorCode, msg: &str) {
        (**self).assert_error(code, msg)
    }

    fn has_error(&self) -> bool {
        (**self).has_error()
    }

    fn raise_error(&self) {
        (**self).raise_error()
    }

    fn clear_error(&self) {
        (**self).clear_error()
    }

    fn set_flag(&self, flag: Flag, value: bool) {
        (**self).set_flag(flag, value)
    }

    fn flag(&self, flag: Flag) -> bool {
        (**self).flag(flag)
    }
}

/// Subsystem availability flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flag {
    SerialAvailable,
    SdAvailable,
    LedsDriverAvailable,
}

impl Flag {
    const fn mask(self) -> u8 {
        match self {
            Self::SerialAvailable => 0x01,
            Self::SdAvailable => 0x02,
            Self::LedsDriverAvailable => 0x04,
        }
    }
}

/// Flag storage usable from a `static`
pub struct SystemFlags {
    bits: Mutex<Cell<u8>>,
}

impl SystemFlags {
    /// All subsystems unavailable
    pub const fn new() -> Self {
        Self {
            bits: Mutex::new(Cell::new(0)),
        }
    }

    pub fn set(&self, flag: Flag, value: bool) {
        critical_section::with(|cs| {
            let cell = self.bits.borrow(cs);
            let bits = cell.get();
            cell.set(if value { bits | flag.mask() } else { bits & !flag.mask() });
        })
    }

    pub fn get(&self, flag: Flag) -> bool {
        critical_section::with(|cs| self.bits.borrow(cs).get() & flag.mask() != 0)
    }

    /// Raw bitmask
    pub fn bits(&self) -> u8 {
        critical_section::with(|cs| self.bits.borrow(cs).get())
    }
}

impl Default for SystemFlags {
    fn default() -> Self {
        Self::new()
    }
}

/// Hardware signal raised alongside the error flag, e.g. an error LED
pub trait ErrorIndicator {
    fn set(&self, on: bool);
}

/// Indicator that does nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoIndicator;

impl ErrorIndicator for NoIndicator {
    fn set(&self, _on: bool) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_default_unavailable() {
        let flags = SystemFlags::new();
        assert!(!flags.get(Flag::SerialAvailable));
        assert!(!flags.get(Flag::LedsDriverAvailable));
        assert_eq!(flags.bits(), 0);
    }

    #[test]
    fn test_flags_are_independent() {
        let flags = SystemFlags::new();
        flags.set(Flag::LedsDriverAvailable, true);
        flags.set(Flag::SdAvailable, true);
        flags.set(Flag::SdAvailable, false);
        assert!(flags.get(Flag::LedsDriverAvailable));
        assert!(!flags.get(Flag::SdAvailable));
        assert!(!flags.get(Flag::SerialAvailable));
    }
}
