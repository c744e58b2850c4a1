#![no_std]
#![forbid(unsafe_code)]

//! # Gridctl I2C
//!
//! One physical I2C master runs one transaction at a time. Writes are
//! queued as [`BusWrite`] tasks and driven by a scheduler bound to a
//! [`BusMaster`], which polls the [`Transport`] and retries transient bus
//! errors.

pub mod error;
pub mod master;
pub mod mcp23017;
pub mod mock;
pub mod transport;
pub mod write;

pub use error::*;
pub use master::*;
pub use transport::*;
pub use write::*;
