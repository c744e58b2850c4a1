//! Log headers, severity filtering and the `log` facade bridge

use core::cell::Cell;
use core::fmt;

use critical_section::Mutex;

use crate::{Clock, Context, ErrorCode, ErrorIndicator, Flag, NoIndicator, Severity, Status, SystemFlags};

/// Log through a [`Context`] with `format_args!` syntax
///
/// ```ignore
/// grid_log!(ctx, "LEDS", Severity::Warning, "column {} stale", col);
/// ```
#[macro_export]
macro_rules! grid_log {
    ($ctx:expr, $facility:expr, $severity:expr, $($arg:tt)+) => {
        $crate::Context::log(&$ctx, $facility, $severity, format_args!($($arg)+))
    };
}

/// Prefix printed in front of every message
///
/// Renders as `<ms>:<SEVERITY>: @<facility>: <ERRNAME>: `.
#[derive(Debug, Clone, Copy)]
pub struct LogHeader<'a> {
    pub timestamp_ms: u32,
    pub severity: Severity,
    pub facility: &'a str,
    pub code: Option<ErrorCode>,
}

impl fmt::Display for LogHeader<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.code.map_or("OK", ErrorCode::name);
        write!(
            f,
            "{}:{:<5}: @{:>5}: {}: ",
            self.timestamp_ms, self.severity, self.facility, name
        )
    }
}

/// Accepts messages at least as severe as `level`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeverityFilter {
    pub level: Severity,
}

impl SeverityFilter {
    pub const fn new(level: Severity) -> Self {
        Self { level }
    }

    pub const fn accepts(&self, severity: Severity) -> bool {
        severity as u8 <= self.level as u8
    }
}

impl Default for SeverityFilter {
    fn default() -> Self {
        Self::new(Severity::build_default())
    }
}

/// Production [`Context`] forwarding to the `log` facade
pub struct LogContext<K: Clock, I: ErrorIndicator = NoIndicator> {
    clock: K,
    indicator: I,
    filter: SeverityFilter,
    halt_on_assert: bool,
    flags: SystemFlags,
    error: Mutex<Cell<bool>>,
    last_error: Mutex<Cell<Status>>,
}

impl<K: Clock> LogContext<K, NoIndicator> {
    pub fn new(clock: K) -> Self {
        Self::with_indicator(clock, NoIndicator)
    }
}

impl<K: Clock, I: ErrorIndicator> LogContext<K, I> {
    pub fn with_indicator(clock: K, indicator: I) -> Self {
        Self {
            clock,
            indicator,
            filter: SeverityFilter::default(),
            halt_on_assert: cfg!(debug_assertions),
            flags: SystemFlags::new(),
            error: Mutex::new(Cell::new(false)),
            last_error: Mutex::new(Cell::new(Status::OK)),
        }
    }

    /// Drop messages less severe than `level`
    pub fn with_level(mut self, level: Severity) -> Self {
        self.filter = SeverityFilter::new(level);
        self
    }

    /// Panic on `assert_error` instead of logging and continuing
    pub fn halt_on_assert(mut self, halt: bool) -> Self {
        self.halt_on_assert = halt;
        self
    }

    pub fn filter(&self) -> SeverityFilter {
        self.filter
    }

    /// Status of the most recent assertion
    pub fn last_error(&self) -> Status {
        critical_section::with(|cs| self.last_error.borrow(cs).get())
    }

    pub fn flags(&self) -> &SystemFlags {
        &self.flags
    }

    fn emit(&self, facility: &str, severity: Severity, code: Option<ErrorCode>, args: fmt::Arguments<'_>) -> bool {
        let level = severity.to_log_level();
        if !log::log_enabled!(target: facility, level) {
            return false;
        }
        let header = LogHeader {
            timestamp_ms: self.clock.now_ms(),
            severity,
            facility,
            code,
        };
        log::log!(target: facility, level, "{}{}", header, args);
        true
    }
}

impl<K: Clock, I: ErrorIndicator> Context for LogContext<K, I> {
    fn log(&self, facility: &str, severity: Severity, args: fmt::Arguments<'_>) -> bool {
        if !self.filter.accepts(severity) {
            return false;
        }
        self.emit(facility, severity, None, args)
    }

    fn assert_error(&self, code: ErrorCode, msg: &str) {
        let status = code | Severity::Critical;
        critical_section::with(|cs| self.last_error.borrow(cs).set(status));
        self.raise_error();
        self.emit("ASSERT", Severity::Critical, Some(code), format_args!("{}", msg));
        if self.halt_on_assert {
            panic!("assert_error: {}: {}", code.name(), msg);
        }
    }

    fn has_error(&self) -> bool {
        critical_section::with(|cs| self.error.borrow(cs).get())
    }

    fn raise_error(&self) {
        critical_section::with(|cs| self.error.borrow(cs).set(true));
        self.indicator.set(true);
    }

    fn clear_error(&self) {
        critical_section::with(|cs| self.error.borrow(cs).set(false));
        self.indicator.set(false);
    }

    fn set_flag(&self, flag: Flag, value: bool) {
        self.flags.set(flag, value)
    }

    fn flag(&self, flag: Flag) -> bool {
        self.flags.get(flag)
    }
}
