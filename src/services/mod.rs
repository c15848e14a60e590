//! External collaborator module
//!
//! This module contains the browser tab inventory the scheduler drives and the
//! named keyboard commands forwarded by the browser.

pub mod commands;
pub mod tabs;

// Re-export main types
pub use commands::ShortcutCommand;
pub use tabs::{BridgeTabInventory, Tab, TabId, TabInventory, TabQuery, WindowId};
