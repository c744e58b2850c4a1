//! Write transaction task

use core::fmt;

use gridctl_core::{ErrorCode, GridResult};
use gridctl_sched::{AsyncState, Prioritized, Task};
use heapless::Vec;

use crate::Transport;

/// Longest payload one [`BusWrite`] carries
pub const MAX_WRITE_LEN: usize = 8;

/// Highest valid 7 bit slave address
pub const MAX_ADDRESS: u8 = 0x7F;

/// One write transaction to a slave
///
/// The payload is owned by the task so it outlives the transfer; re-arm
/// the same task with [`set_payload`](Self::set_payload) instead of
/// allocating a new one every cycle.
#[derive(Clone, PartialEq, Eq)]
pub struct BusWrite {
    address: u8,
    payload: Vec<u8, MAX_WRITE_LEN>,
    send_stop: bool,
    priority: u8,
}

impl BusWrite {
    /// Write `bytes` to `address`, ending with a STOP condition
    pub fn new(address: u8, bytes: &[u8]) -> GridResult<Self> {
        if address > MAX_ADDRESS {
            return Err(ErrorCode::InvalidArgument);
        }
        let payload = Vec::from_slice(bytes).map_err(|_| ErrorCode::InvalidArgument)?;
        Ok(Self {
            address,
            payload,
            send_stop: true,
            priority: 0,
        })
    }

    /// Keep the bus for a following repeated START
    pub fn without_stop(mut self) -> Self {
        self.send_stop = false;
        self
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn sends_stop(&self) -> bool {
        self.send_stop
    }

    /// Replace the bytes sent on the next launch
    pub fn set_payload(&mut self, bytes: &[u8]) -> GridResult<()> {
        let payload = Vec::from_slice(bytes).map_err(|_| ErrorCode::InvalidArgument)?;
        self.payload = payload;
        Ok(())
    }

    /// Every byte was acknowledged
    ///
    /// An empty write only addresses the slave, so it has nothing to count.
    pub fn is_complete<T: Transport + ?Sized>(&self, bus: &T) -> bool {
        self.payload.is_empty() || bus.bytes_transferred() == self.payload.len()
    }

    /// Outcome of the transfer as seen on `bus`
    pub fn outcome<T: Transport + ?Sized>(&self, bus: &T) -> AsyncState {
        if !bus.is_finished() {
            return AsyncState::Launched;
        }
        match bus.error() {
            Some(err) => err.outcome(),
            None if self.is_complete(bus) => AsyncState::Finished,
            None => AsyncState::Failed,
        }
    }
}

impl<T: Transport + ?Sized> Task<T> for BusWrite {
    fn launch(&mut self, bus: &mut T) -> AsyncState {
        if !bus.is_finished() {
            return AsyncState::MasterBusy;
        }
        bus.write_async(self.address, &self.payload, self.send_stop);
        match bus.error() {
            Some(err) => err.outcome(),
            None => AsyncState::Launched,
        }
    }

    fn is_finished(&self, bus: &T) -> bool {
        bus.is_finished() && !bus.has_error() && self.is_complete(bus)
    }
}

impl Prioritized for BusWrite {
    fn priority(&self) -> u8 {
        self.priority
    }
}

impl fmt::Debug for BusWrite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BusWrite(0x{:02x} <- {:02x?}", self.address, &self.payload[..])?;
        if !self.send_stop {
            f.write_str(", no stop")?;
        }
        f.write_str(")")
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for BusWrite {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "BusWrite({=u8:#x} <- {=[u8]:x})", self.address, &self.payload[..]);
    }
}
