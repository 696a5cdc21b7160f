//! # Availability Scheduler
//!
//! This crate restores a car's availability flag once its rental period
//! ends, without requiring any further client request. Each booking arms a
//! one-shot deferred reset; a reconciliation pass run at startup (and
//! periodically) corrects cars whose reset was lost to a restart.

/// Storage seam for availability resets and reconciliation queries.
mod store;
pub use store::*;

/// The deferred-reset scheduler and reconciliation pass.
mod scheduler;
pub use scheduler::*;
