//! Bus error taxonomy

use gridctl_core::ErrorCode;
use gridctl_sched::AsyncState;
use thiserror::Error;

/// Errors reported by an I2C master
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum I2cError {
    #[error("arbitration lost")]
    ArbitrationLost,
    #[error("master not ready")]
    MasterNotReady,
    #[error("master FIFO error")]
    MasterFifoError,
    #[error("master FIFOs not empty")]
    MasterFifosNotEmpty,
    #[error("data NAK")]
    DataNak,
    #[error("bit error")]
    BitError,
    #[error("buffer overflow")]
    BufferOverflow,
    #[error("buffer underflow")]
    BufferUnderflow,
    #[error("invalid request")]
    InvalidRequest,
    #[error("address NAK")]
    AddressNak,
}

impl I2cError {
    /// Transient condition, the same request may succeed if sent again
    pub const fn is_recoverable(self) -> bool {
        match self {
            Self::ArbitrationLost
            | Self::MasterNotReady
            | Self::MasterFifoError
            | Self::MasterFifosNotEmpty
            | Self::DataNak
            | Self::BitError => true,
            Self::BufferOverflow | Self::BufferUnderflow | Self::InvalidRequest | Self::AddressNak => false,
        }
    }

    /// Task state this error leads to
    pub const fn outcome(self) -> AsyncState {
        if self.is_recoverable() {
            AsyncState::Recoverable
        } else {
            AsyncState::Failed
        }
    }
}

impl From<I2cError> for ErrorCode {
    fn from(_: I2cError) -> Self {
        ErrorCode::HwError
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for I2cError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::ArbitrationLost => defmt::write!(fmt, "ArbitrationLost"),
            Self::MasterNotReady => defmt::write!(fmt, "MasterNotReady"),
            Self::MasterFifoError => defmt::write!(fmt, "MasterFifoError"),
            Self::MasterFifosNotEmpty => defmt::write!(fmt, "MasterFifosNotEmpty"),
            Self::DataNak => defmt::write!(fmt, "DataNak"),
            Self::BitError => defmt::write!(fmt, "BitError"),
            Self::BufferOverflow => defmt::write!(fmt, "BufferOverflow"),
            Self::BufferUnderflow => defmt::write!(fmt, "BufferUnderflow"),
            Self::InvalidRequest => defmt::write!(fmt, "InvalidRequest"),
            Self::AddressNak => defmt::write!(fmt, "AddressNak"),
        }
    }
}
