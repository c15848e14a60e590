//! API request and response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::rules::RuleMode;

/// Generic acknowledgement for mutating endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl ApiResponse {
    /// Create a new API response
    pub fn new(status: String, message: String) -> Self {
        Self {
            status,
            message,
            timestamp: Utc::now(),
        }
    }

    pub fn ok(message: String) -> Self {
        Self::new("ok".to_string(), message)
    }
}

/// Body for creating or editing a rule
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleInput {
    pub base_url: String,
    pub interval_minutes: f64,
}

/// Body for toggling a rule on a page URL
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToggleRequest {
    pub url: String,
    #[serde(default)]
    pub mode: RuleMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefaultInterval {
    pub default_interval_minutes: f64,
}

/// Status response with scheduler information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub rules: usize,
    pub timers: usize,
    pub tabs: usize,
    pub tick_seconds: u64,
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    /// Create a new health response
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
