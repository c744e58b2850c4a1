//! Non-blocking I2C master interface

use crate::I2cError;

/// Asynchronous I2C master, one transaction at a time
///
/// Implementations copy the outgoing bytes into their own FIFO or DMA
/// buffer before `write_async` returns.
pub trait Transport {
    /// No transaction in flight
    fn is_finished(&self) -> bool;

    /// Error of the last transaction, or of a rejected request
    fn error(&self) -> Option<I2cError>;

    fn has_error(&self) -> bool {
        self.error().is_some()
    }

    /// Bytes acknowledged by the slave during the last transaction
    fn bytes_transferred(&self) -> usize;

    /// Start writing `buffer` to the 7 bit `address`
    fn write_async(&mut self, address: u8, buffer: &[u8], send_stop: bool);
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn is_finished(&self) -> bool {
        (**self).is_finished()
    }

    fn error(&self) -> Option<I2cError> {
        (**self).error()
    }

    fn bytes_transferred(&self) -> usize {
        (**self).bytes_transferred()
    }

    fn write_async(&mut self, address: u8, buffer: &[u8], send_stop: bool) {
        (**self).write_async(address, buffer, send_stop)
    }
}
