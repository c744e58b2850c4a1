//! Test doubles for the context collaborators
//!
//! [`RecordingContext`] never panics on `assert_error`; it records the code
//! so tests can check which defects were reported.

use core::cell::{Cell, RefCell};
use core::fmt::{self, Write};

use heapless::{String, Vec};

use crate::{Clock, Context, ErrorCode, Flag, Severity, SystemFlags};

const MAX_RECORDS: usize = 64;
const MAX_MESSAGE: usize = 96;

/// One captured log line
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub facility: String<8>,
    pub severity: Severity,
    pub message: String<MAX_MESSAGE>,
}

#[derive(Default)]
struct Records {
    logs: Vec<LogRecord, MAX_RECORDS>,
    asserts: Vec<ErrorCode, MAX_RECORDS>,
}

/// [`Context`] that keeps everything in memory
pub struct RecordingContext {
    records: RefCell<Records>,
    accepting: Cell<bool>,
    error: Cell<bool>,
    flags: SystemFlags,
}

impl RecordingContext {
    pub fn new() -> Self {
        Self {
            records: RefCell::new(Records::default()),
            accepting: Cell::new(true),
            error: Cell::new(false),
            flags: SystemFlags::new(),
        }
    }

    /// Simulate a full log buffer
    pub fn set_accepting(&self, accepting: bool) {
        self.accepting.set(accepting);
    }

    pub fn asserts(&self) -> Vec<ErrorCode, MAX_RECORDS> {
        self.records.borrow().asserts.clone()
    }

    pub fn assert_count(&self) -> usize {
        self.records.borrow().asserts.len()
    }

    pub fn last_assert(&self) -> Option<ErrorCode> {
        self.records.borrow().asserts.last().copied()
    }

    pub fn log_count(&self) -> usize {
        self.records.borrow().logs.len()
    }

    /// Number of records at `severity` or more severe
    pub fn count_at_least(&self, severity: Severity) -> usize {
        self.records
            .borrow()
            .logs
            .iter()
            .filter(|r| r.severity <= severity)
            .count()
    }

    /// True if any captured message contains `needle`
    pub fn logged(&self, needle: &str) -> bool {
        self.records
            .borrow()
            .logs
            .iter()
            .any(|r| r.message.contains(needle))
    }

    pub fn clear(&self) {
        let mut records = self.records.borrow_mut();
        records.logs.clear();
        records.asserts.clear();
        self.error.set(false);
    }
}

impl Default for RecordingContext {
    fn default() -> Self {
        Self::new()
    }
}

impl Context for RecordingContext {
    fn log(&self, facility: &str, severity: Severity, args: fmt::Arguments<'_>) -> bool {
        if !self.accepting.get() {
            return false;
        }
        let mut record = LogRecord {
            facility: String::new(),
            severity,
            message: String::new(),
        };
        // truncated facility or message is still worth keeping
        let _ = record.facility.push_str(facility);
        let _ = record.message.write_fmt(args);
        self.records.borrow_mut().logs.push(record).is_ok()
    }

    fn assert_error(&self, code: ErrorCode, msg: &str) {
        self.raise_error();
        let mut records = self.records.borrow_mut();
        let _ = records.asserts.push(code);
        let mut message = String::new();
        let _ = message.push_str(msg);
        let _ = records.logs.push(LogRecord {
            facility: String::try_from("ASSERT").unwrap_or_default(),
            severity: Severity::Critical,
            message,
        });
    }

    fn has_error(&self) -> bool {
        self.error.get()
    }

    fn raise_error(&self) {
        self.error.set(true);
    }

    fn clear_error(&self) {
        self.error.set(false);
    }

    fn set_flag(&self, flag: Flag, value: bool) {
        self.flags.set(flag, value)
    }

    fn flag(&self, flag: Flag) -> bool {
        self.flags.get(flag)
    }
}

/// Clock advanced by hand
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<u32>,
}

impl ManualClock {
    pub const fn new(start_ms: u32) -> Self {
        Self {
            now: Cell::new(start_ms),
        }
    }

    pub fn advance(&self, ms: u32) {
        self.now.set(self.now.get().wrapping_add(ms));
    }

    pub fn set(&self, ms: u32) {
        self.now.set(ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u32 {
        self.now.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid_log;

    #[test]
    fn test_recording_context_captures_logs() {
        let ctx = RecordingContext::new();
        assert!(grid_log!(ctx, "LEDS", Severity::Warning, "column {} stale", 3));
        assert_eq!(ctx.log_count(), 1);
        assert!(ctx.logged("column 3 stale"));
        assert_eq!(ctx.count_at_least(Severity::Error), 0);
    }

    #[test]
    fn test_recording_context_rejects_when_full() {
        let ctx = RecordingContext::new();
        ctx.set_accepting(false);
        assert!(!grid_log!(ctx, "LEDS", Severity::Info, "dropped"));
        assert_eq!(ctx.log_count(), 0);
    }

    #[test]
    fn test_recording_context_asserts() {
        let ctx = RecordingContext::new();
        ctx.assert_error(ErrorCode::InfiniteLoop, "spin");
        assert!(ctx.has_error());
        assert_eq!(ctx.last_assert(), Some(ErrorCode::InfiniteLoop));
        ctx.clear();
        assert_eq!(ctx.assert_count(), 0);
        assert!(!ctx.has_error());
    }

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::new(10);
        clock.advance(5);
        assert_eq!(clock.now_ms(), 15);
        clock.set(1);
        assert_eq!(clock.now_ms(), 1);
    }
}
