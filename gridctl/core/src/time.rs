//! Millisecond clock and polled deadlines

use core::fmt;

/// Free-running millisecond counter, allowed to wrap
pub trait Clock {
    fn now_ms(&self) -> u32;
}

impl<K: Clock + ?Sized> Clock for &K {
    fn now_ms(&self) -> u32 {
        (**self).now_ms()
    }
}

/// Point in time compared against the clock at the point of use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    start: u32,
    duration: u32,
}

impl Deadline {
    /// Deadline `duration_ms` after `now`
    pub const fn after(now: u32, duration_ms: u32) -> Self {
        Self {
            start: now,
            duration: duration_ms,
        }
    }

    /// Time elapsed since the deadline was armed
    pub const fn elapsed(&self, now: u32) -> u32 {
        now.wrapping_sub(self.start)
    }

    pub const fn is_expired(&self, now: u32) -> bool {
        self.elapsed(now) >= self.duration
    }

    pub const fn remaining(&self, now: u32) -> u32 {
        self.duration.saturating_sub(self.elapsed(now))
    }
}

impl fmt::Display for Deadline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms+{}ms", self.start, self.duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deadline_expiry() {
        let deadline = Deadline::after(100, 20);
        assert!(!deadline.is_expired(100));
        assert!(!deadline.is_expired(119));
        assert!(deadline.is_expired(120));
        assert_eq!(deadline.remaining(110), 10);
    }

    #[test]
    fn test_deadline_survives_wrap() {
        let deadline = Deadline::after(u32::MAX - 5, 10);
        assert!(!deadline.is_expired(u32::MAX));
        assert!(!deadline.is_expired(3));
        assert!(deadline.is_expired(4));
    }

    #[test]
    fn test_zero_duration_is_expired() {
        assert!(Deadline::after(7, 0).is_expired(7));
    }
}
