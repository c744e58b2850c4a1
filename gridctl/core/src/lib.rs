#![no_std]
#![forbid(unsafe_code)]

//! # Gridctl Core
//!
//! Shared vocabulary for the controller firmware: error codes and severities,
//! the injected [`Context`] collaborator (logging sink, error signal, subsystem
//! flags), log header formatting and millisecond deadlines.

pub mod context;
pub mod error;
pub mod logging;
pub mod mock;
pub mod time;

pub use context::*;
pub use error::*;
pub use logging::*;
pub use time::*;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Upper bound on iterations for any loop whose trip count depends on
/// runtime data (queue walks, retire chains).
pub const UNTRUSTED_ITERATION_LIMIT: u16 = 1024;
