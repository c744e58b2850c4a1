#![no_std]
#![forbid(unsafe_code)]

//! # Gridctl LEDs
//!
//! The pad matrix and encoder rings share eight common-cathode columns.
//! Three MCP23017 expanders drive the anodes; a 3-to-8 decoder selects the
//! lit column. [`LedsDriver::update`] refreshes one column per step by
//! queuing GPIO writes on the I2C bus scheduler.

pub mod addr;
pub mod buffer;
pub mod config;
pub mod driver;
pub mod layout;
pub mod select;
pub mod types;

pub use addr::*;
pub use buffer::*;
pub use config::*;
pub use driver::*;
pub use select::*;
pub use types::*;
