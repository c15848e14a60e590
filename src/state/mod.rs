//! State management module
//!
//! This module contains the shared daemon state and the per-tab timer table.

pub mod app_state;
pub mod timer_table;

// Re-export main types
pub use app_state::AppState;
pub use timer_table::{TimerEntry, TimerSnapshot, TimerTable};
