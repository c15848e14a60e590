//! Refresh rules and URL matching
//!
//! A rule pairs a normalized base URL with a refresh interval. Rules are
//! persisted through a [`RuleStore`] and matched against live tab URLs by
//! [`pick_rule`].

pub mod matcher;
pub mod store;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use uuid::Uuid;

pub use matcher::{is_web_url, matches_rule, normalize_base_url, normalize_origin, parse_user_base_url, pick_rule};
pub use store::{JsonRuleStore, MemoryRuleStore, RuleStore};

/// Interval used when nothing valid has been configured
pub const DEFAULT_INTERVAL_MINUTES: f64 = 60.0;

/// Shortest refresh interval honored by the scheduler
pub const MIN_PERIOD_MINUTES: f64 = 1.0;

/// A persisted auto-refresh rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub id: String,
    pub base_url: String,
    /// Hand-edited files may hold null or text here; those read as 0 and fall back to the default
    #[serde(default, deserialize_with = "lenient_minutes")]
    pub interval_minutes: f64,
}

fn lenient_minutes<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let minutes = match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    };
    Ok(minutes)
}

impl Rule {
    /// Create a rule with a freshly generated id
    pub fn new(base_url: String, interval_minutes: f64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            base_url,
            interval_minutes,
        }
    }

    /// Refresh interval in milliseconds, floored at the minimum period
    pub fn interval_ms(&self) -> i64 {
        interval_ms(self.interval_minutes)
    }
}

/// Convert an interval in minutes to milliseconds.
///
/// Zero and non-finite values mean "unset" and use the default interval. Anything
/// else, negatives included, is floored at [`MIN_PERIOD_MINUTES`].
pub fn interval_ms(interval_minutes: f64) -> i64 {
    let minutes = if interval_minutes.is_finite() && interval_minutes != 0.0 {
        interval_minutes
    } else {
        DEFAULT_INTERVAL_MINUTES
    };
    (minutes.max(MIN_PERIOD_MINUTES) * 60_000.0).round() as i64
}

/// Validate a user-supplied interval and round it to two decimals
pub fn validate_interval(interval_minutes: f64) -> crate::Result<f64> {
    if !interval_minutes.is_finite() || interval_minutes <= 0.0 {
        return Err(crate::RefreshError::InvalidInterval(interval_minutes));
    }
    let rounded = (interval_minutes * 100.0).round() / 100.0;
    if rounded <= 0.0 {
        return Err(crate::RefreshError::InvalidInterval(interval_minutes));
    }
    Ok(rounded)
}

/// Granularity of a rule created from a page URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleMode {
    /// Whole path prefix
    #[default]
    Full,
    /// Origin only
    Base,
}

impl RuleMode {
    /// Normalize a page URL into a rule base for this mode
    pub fn normalize(self, url: &str) -> crate::Result<String> {
        match self {
            RuleMode::Full => normalize_base_url(url),
            RuleMode::Base => normalize_origin(url),
        }
    }
}
