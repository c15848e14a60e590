//! Tab Refresher - periodically reloads browser tabs matching URL rules
//!
//! This library tracks a countdown per matching tab, resets it whenever the tab
//! is viewed, and asks the browser to reload background tabs whose interval has
//! elapsed. The browser and rule storage are reached through the
//! [`services::TabInventory`] and [`rules::RuleStore`] traits.

pub mod api;
pub mod config;
pub mod error;
pub mod rules;
pub mod scheduler;
pub mod services;
pub mod state;
pub mod tasks;
pub mod utils;

// Re-export commonly used types
pub use api::create_router;
pub use config::Config;
pub use error::{RefreshError, Result};
pub use scheduler::Scheduler;
pub use state::AppState;
pub use utils::signals::shutdown_signal;
