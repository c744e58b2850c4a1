//! Scripted transport for tests
//!
//! Every write is recorded. A write completes when [`MockTransport::finish`]
//! is called, or right away in auto-complete mode, with the next scripted
//! [`Outcome`] (a full transfer when the script is empty).

use heapless::{Deque, Vec};

use crate::{I2cError, Transport, MAX_WRITE_LEN};

const HISTORY: usize = 64;
const SCRIPT: usize = 16;

/// How the next transaction ends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Every byte acknowledged
    Complete,
    /// The last `n` bytes were not sent, no error reported
    Short(usize),
    /// Transfer ends with an error
    Error(I2cError),
    /// Request refused before it started
    Reject(I2cError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedWrite {
    pub address: u8,
    pub bytes: Vec<u8, MAX_WRITE_LEN>,
    pub send_stop: bool,
}

#[derive(Debug)]
pub struct MockTransport {
    busy: bool,
    error: Option<I2cError>,
    transferred: usize,
    pending: Outcome,
    pending_len: usize,
    auto_complete: bool,
    script: Deque<Outcome, SCRIPT>,
    writes: Vec<RecordedWrite, HISTORY>,
    total: usize,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    pub const fn new() -> Self {
        Self {
            busy: false,
            error: None,
            transferred: 0,
            pending: Outcome::Complete,
            pending_len: 0,
            auto_complete: false,
            script: Deque::new(),
            writes: Vec::new(),
            total: 0,
        }
    }

    /// Writes complete as soon as they start
    pub fn auto_complete() -> Self {
        Self {
            auto_complete: true,
            ..Self::new()
        }
    }

    pub fn set_auto_complete(&mut self, on: bool) {
        self.auto_complete = on;
    }

    /// Queue the outcome of a future write; ignored once the script is full
    pub fn script(&mut self, outcome: Outcome) {
        let _ = self.script.push_back(outcome);
    }

    /// Complete the write in flight
    pub fn finish(&mut self) {
        if !self.busy {
            return;
        }
        self.busy = false;
        match self.pending {
            Outcome::Complete => self.transferred = self.pending_len,
            Outcome::Short(n) => self.transferred = self.pending_len.saturating_sub(n),
            Outcome::Error(err) | Outcome::Reject(err) => self.error = Some(err),
        }
    }

    /// Hold the bus as if another master owned it
    pub fn set_busy(&mut self, busy: bool) {
        self.busy = busy;
        self.pending = Outcome::Complete;
        self.pending_len = 0;
    }

    /// Most recent writes, oldest first
    pub fn writes(&self) -> &[RecordedWrite] {
        &self.writes
    }

    pub fn last_write(&self) -> Option<&RecordedWrite> {
        self.writes.last()
    }

    /// Writes started since creation, including dropped history
    pub fn write_count(&self) -> usize {
        self.total
    }

    pub fn clear_writes(&mut self) {
        self.writes.clear();
    }
}

impl Transport for MockTransport {
    fn is_finished(&self) -> bool {
        !self.busy
    }

    fn error(&self) -> Option<I2cError> {
        self.error
    }

    fn bytes_transferred(&self) -> usize {
        self.transferred
    }

    fn write_async(&mut self, address: u8, buffer: &[u8], send_stop: bool) {
        if self.writes.is_full() {
            self.writes.remove(0);
        }
        let mut bytes = Vec::new();
        let _ = bytes.extend_from_slice(&buffer[..buffer.len().min(MAX_WRITE_LEN)]);
        let _ = self.writes.push(RecordedWrite {
            address,
            bytes,
            send_stop,
        });
        self.total += 1;

        self.error = None;
        self.transferred = 0;
        let outcome = self.script.pop_front().unwrap_or(Outcome::Complete);
        if let Outcome::Reject(err) = outcome {
            self.error = Some(err);
            return;
        }
        self.busy = true;
        self.pending = outcome;
        self.pending_len = buffer.len();
        if self.auto_complete {
            self.finish();
        }
    }
}
