//! Error types shared across the crate

use thiserror::Error;

/// All errors produced by the refresher.
#[derive(Error, Debug)]
pub enum RefreshError {
    /// A URL could not be parsed or normalized into a rule base.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// An interval was not a finite, positive number of minutes.
    #[error("Invalid interval: {0}")]
    InvalidInterval(f64),

    #[error("Rule not found: {0}")]
    RuleNotFound(String),

    /// Another rule already owns this base URL.
    #[error("A rule for {0} already exists")]
    DuplicateRule(String),

    #[error("Tab not found: {0}")]
    TabNotFound(u64),

    /// The tab exists but its page cannot be reloaded (privileged or non-web URL).
    #[error("Tab {0} cannot be reloaded")]
    NotReloadable(u64),

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    /// No active tab with a usable URL was found.
    #[error("No active tab")]
    NoActiveTab,

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Failed to serialize rules: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to lock {0}")]
    LockPoisoned(&'static str),

    /// A blocking scheduler job panicked or was cancelled.
    #[error("Background job failed: {0}")]
    TaskFailed(String),
}

impl RefreshError {
    /// Whether the error was caused by bad caller input rather than a collaborator failure
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Self::InvalidUrl(_)
                | Self::InvalidInterval(_)
                | Self::DuplicateRule(_)
                | Self::UnknownCommand(_)
                | Self::NoActiveTab
        )
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, RefreshError>;
