//! Rule mutations
//!
//! Every successful mutation replaces the stored rule list in one write and
//! then runs a reconciliation pass.

use serde::Serialize;
use tracing::info;

use super::Scheduler;
use crate::{
    rules::{parse_user_base_url, validate_interval, Rule, RuleMode},
    RefreshError, Result,
};

/// Result of toggling a rule for a page
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleOutcome {
    pub added: bool,
    pub base_url: String,
}

impl Scheduler {
    pub fn list_rules(&self) -> Result<Vec<Rule>> {
        self.rules.get_rules()
    }

    /// Add a rule for `url` at the given granularity, or remove it if it already exists
    pub fn toggle_rule(&self, url: &str, mode: RuleMode) -> Result<ToggleOutcome> {
        let base_url = mode.normalize(url)?;
        let mut rules = self.rules.get_rules()?;

        let added = match rules.iter().position(|r| r.base_url == base_url) {
            Some(index) => {
                let removed = rules.remove(index);
                info!("Toggled off rule {} for {}", removed.id, base_url);
                false
            }
            None => {
                let interval = self.rules.get_default_interval_minutes()?;
                let rule = Rule::new(base_url.clone(), interval);
                info!("Toggled on rule {} for {} every {} min", rule.id, base_url, interval);
                rules.push(rule);
                true
            }
        };

        self.rules.set_rules(&rules)?;
        self.reconcile();
        Ok(ToggleOutcome { added, base_url })
    }

    /// Add a rule, or update the interval of the rule that already owns this base
    pub fn add_rule(&self, base_url: &str, interval_minutes: f64) -> Result<Rule> {
        let base_url = parse_user_base_url(base_url)?;
        let interval_minutes = validate_interval(interval_minutes)?;
        let mut rules = self.rules.get_rules()?;

        let rule = match rules.iter_mut().find(|r| r.base_url == base_url) {
            Some(existing) => {
                existing.interval_minutes = interval_minutes;
                info!("Updated rule {} for {}", existing.id, base_url);
                existing.clone()
            }
            None => {
                let rule = Rule::new(base_url, interval_minutes);
                info!("Added rule {} for {}", rule.id, rule.base_url);
                rules.push(rule.clone());
                rule
            }
        };

        self.rules.set_rules(&rules)?;
        self.reconcile();
        Ok(rule)
    }

    pub fn update_rule(&self, id: &str, base_url: &str, interval_minutes: f64) -> Result<Rule> {
        let base_url = parse_user_base_url(base_url)?;
        let interval_minutes = validate_interval(interval_minutes)?;
        let mut rules = self.rules.get_rules()?;

        if rules.iter().any(|r| r.id != id && r.base_url == base_url) {
            return Err(RefreshError::DuplicateRule(base_url));
        }
        let rule = rules
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| RefreshError::RuleNotFound(id.to_string()))?;
        rule.base_url = base_url;
        rule.interval_minutes = interval_minutes;
        let updated = rule.clone();

        self.rules.set_rules(&rules)?;
        info!("Edited rule {}: {} every {} min", updated.id, updated.base_url, updated.interval_minutes);
        self.reconcile();
        Ok(updated)
    }

    pub fn delete_rule(&self, id: &str) -> Result<Rule> {
        let mut rules = self.rules.get_rules()?;
        let index = rules
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| RefreshError::RuleNotFound(id.to_string()))?;
        let removed = rules.remove(index);

        self.rules.set_rules(&rules)?;
        info!("Deleted rule {} for {}", removed.id, removed.base_url);
        self.reconcile();
        Ok(removed)
    }

    pub fn default_interval_minutes(&self) -> Result<f64> {
        self.rules.get_default_interval_minutes()
    }

    pub fn set_default_interval_minutes(&self, minutes: f64) -> Result<f64> {
        let minutes = validate_interval(minutes)?;
        self.rules.set_default_interval_minutes(minutes)?;
        info!("Default interval set to {} min", minutes);
        Ok(minutes)
    }
}
