#![no_std]
#![forbid(unsafe_code)]

//! # Gridctl Scheduler
//!
//! Cooperative scheduling of pollable tasks. A task is a plain state object
//! with `is_ready`/`launch`/`is_finished`; a [`Master`] binds tasks to the
//! resource they run on; the [`Scheduler`] walks a queue of tasks one
//! bounded step at a time from [`Scheduler::update`].

pub mod scheduler;
pub mod state;
pub mod task;

pub use scheduler::*;
pub use state::*;
pub use task::*;
