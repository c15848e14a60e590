//! Rule storage and persistence
//!
//! Rules and the default interval live under separate keys of one JSON
//! document. Writing one key keeps the other as stored, and concurrent writers
//! resolve as last-write-wins.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use super::{Rule, DEFAULT_INTERVAL_MINUTES};
use crate::{RefreshError, Result};

/// Persistence provider for rules and the default interval
pub trait RuleStore: Send + Sync {
    /// Load all rules in their stored order
    fn get_rules(&self) -> Result<Vec<Rule>>;

    /// Replace the whole rule list
    fn set_rules(&self, rules: &[Rule]) -> Result<()>;

    /// Read the default interval, writing the built-in default back if the stored value is unusable
    fn get_default_interval_minutes(&self) -> Result<f64>;

    fn set_default_interval_minutes(&self, minutes: f64) -> Result<()>;
}

/// Interpret a stored default interval, accepting numbers and numeric strings
fn parse_interval(value: Option<&Value>) -> Option<f64> {
    let minutes = match value? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (minutes.is_finite() && minutes > 0.0).then_some(minutes)
}

fn check_interval(minutes: f64) -> Result<()> {
    if minutes.is_finite() && minutes > 0.0 {
        Ok(())
    } else {
        Err(RefreshError::InvalidInterval(minutes))
    }
}

/// On-disk layout of the rules file.
///
/// `rules` stays raw so a single bad entry never costs the others when the
/// document is written back. Unknown keys are carried through untouched.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RulesFile {
    #[serde(default, skip_serializing_if = "Value::is_null")]
    rules: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    default_interval_minutes: Option<Value>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl RulesFile {
    /// Decode the stored rules, skipping entries that are not rules at all
    fn decode_rules(&self) -> Vec<Rule> {
        let entries = match &self.rules {
            Value::Array(entries) => entries,
            Value::Null => return Vec::new(),
            other => {
                warn!("Ignoring rules field that is not a list: {}", other);
                return Vec::new();
            }
        };
        entries
            .iter()
            .filter_map(|entry| match Rule::deserialize(entry) {
                Ok(rule) => Some(rule),
                Err(e) => {
                    warn!("Skipping unreadable rule {}: {}", entry, e);
                    None
                }
            })
            .collect()
    }
}

/// Rule store backed by a JSON file
#[derive(Debug)]
pub struct JsonRuleStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles within this process
    io_lock: Mutex<()>,
}

impl JsonRuleStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            io_lock: Mutex::new(()),
        }
    }

    /// Default location under the user's data directory
    pub fn default_path() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tab-refresher")
            .join("rules.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<RulesFile> {
        match fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(RulesFile::default()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(RulesFile::default()),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, file: &RulesFile) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(file)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, content)?;
        fs::rename(&tmp, &self.path)?;
        debug!("Saved rules file {}", self.path.display());
        Ok(())
    }

    fn guard(&self) -> Result<std::sync::MutexGuard<'_, ()>> {
        self.io_lock.lock().map_err(|_| RefreshError::LockPoisoned("rules file"))
    }
}

impl RuleStore for JsonRuleStore {
    fn get_rules(&self) -> Result<Vec<Rule>> {
        let _guard = self.guard()?;
        Ok(self.load()?.decode_rules())
    }

    /// An unreadable document is replaced: the caller is handing over the full rule list
    fn set_rules(&self, rules: &[Rule]) -> Result<()> {
        let _guard = self.guard()?;
        let mut file = match self.load() {
            Ok(file) => file,
            Err(RefreshError::Serialization(e)) => {
                warn!("Rules file {} is corrupt, replacing it: {}", self.path.display(), e);
                RulesFile::default()
            }
            Err(e) => return Err(e),
        };
        file.rules = serde_json::to_value(rules)?;
        self.save(&file)
    }

    fn get_default_interval_minutes(&self) -> Result<f64> {
        let _guard = self.guard()?;
        let mut file = match self.load() {
            Ok(file) => file,
            Err(RefreshError::Serialization(e)) => {
                warn!("Rules file {} is corrupt, using the default interval: {}", self.path.display(), e);
                return Ok(DEFAULT_INTERVAL_MINUTES);
            }
            Err(e) => return Err(e),
        };
        if let Some(minutes) = parse_interval(file.default_interval_minutes.as_ref()) {
            return Ok(minutes);
        }
        info!("Default interval missing or invalid, resetting to {} minutes", DEFAULT_INTERVAL_MINUTES);
        file.default_interval_minutes = Some(Value::from(DEFAULT_INTERVAL_MINUTES));
        self.save(&file)?;
        Ok(DEFAULT_INTERVAL_MINUTES)
    }

    /// Refuses to touch a document it cannot read, so stored rules are never lost
    fn set_default_interval_minutes(&self, minutes: f64) -> Result<()> {
        check_interval(minutes)?;
        let _guard = self.guard()?;
        let mut file = self.load()?;
        file.default_interval_minutes = Some(Value::from(minutes));
        self.save(&file)
    }
}

/// In-memory rule store for tests and ephemeral runs
#[derive(Debug, Default)]
pub struct MemoryRuleStore {
    rules: Mutex<Vec<Rule>>,
    default_interval: Mutex<Option<f64>>,
}

impl MemoryRuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rules(rules: Vec<Rule>) -> Self {
        Self {
            rules: Mutex::new(rules),
            default_interval: Mutex::new(None),
        }
    }
}

impl RuleStore for MemoryRuleStore {
    fn get_rules(&self) -> Result<Vec<Rule>> {
        self.rules
            .lock()
            .map(|rules| rules.clone())
            .map_err(|_| RefreshError::LockPoisoned("rules"))
    }

    fn set_rules(&self, rules: &[Rule]) -> Result<()> {
        let mut stored = self.rules.lock().map_err(|_| RefreshError::LockPoisoned("rules"))?;
        *stored = rules.to_vec();
        Ok(())
    }

    fn get_default_interval_minutes(&self) -> Result<f64> {
        let mut stored = self
            .default_interval
            .lock()
            .map_err(|_| RefreshError::LockPoisoned("default interval"))?;
        match *stored {
            Some(minutes) if minutes.is_finite() && minutes > 0.0 => Ok(minutes),
            _ => {
                *stored = Some(DEFAULT_INTERVAL_MINUTES);
                Ok(DEFAULT_INTERVAL_MINUTES)
            }
        }
    }

    fn set_default_interval_minutes(&self, minutes: f64) -> Result<()> {
        check_interval(minutes)?;
        let mut stored = self
            .default_interval
            .lock()
            .map_err(|_| RefreshError::LockPoisoned("default interval"))?;
        *stored = Some(minutes);
        Ok(())
    }
}
