//! Background tasks module
//!
//! This module contains background tasks that run alongside the HTTP server.

pub mod tick;
pub mod triggers;

// Re-export main functions
pub use tick::{reconcile_now, run_blocking, tick_task};
pub use triggers::{trigger_task, Trigger};
