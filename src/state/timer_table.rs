//! Per-tab countdown state

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    rules::{interval_ms, Rule},
    services::{Tab, TabId},
};

/// Countdown for one tab that currently matches a rule
#[derive(Debug, Clone, PartialEq)]
pub struct TimerEntry {
    pub tab_id: TabId,
    pub base_url: String,
    pub rule_id: String,
    pub interval_minutes: f64,
    pub started_at: DateTime<Utc>,
    pub title: String,
    pub url: String,
    pub is_active: bool,
}

impl TimerEntry {
    /// Start a countdown for a tab under the given rule
    pub fn new(tab: &Tab, rule: &Rule, now: DateTime<Utc>) -> Self {
        Self {
            tab_id: tab.id,
            base_url: rule.base_url.clone(),
            rule_id: rule.id.clone(),
            interval_minutes: rule.interval_minutes,
            started_at: now,
            title: tab.title.clone(),
            url: tab.url.clone(),
            is_active: false,
        }
    }

    /// Restart the countdown under `rule`
    pub fn reset(&mut self, rule: &Rule, now: DateTime<Utc>) {
        self.started_at = now;
        self.base_url = rule.base_url.clone();
        self.rule_id = rule.id.clone();
        self.interval_minutes = rule.interval_minutes;
    }

    /// Copy title, URL and focus from the live tab, keeping old values for empty fields
    pub fn observe(&mut self, tab: &Tab, is_active: bool) {
        if !tab.title.is_empty() {
            self.title = tab.title.clone();
        }
        if !tab.url.is_empty() {
            self.url = tab.url.clone();
        }
        self.is_active = is_active;
    }

    pub fn elapsed_ms(&self, now: DateTime<Utc>) -> i64 {
        (now - self.started_at).num_milliseconds()
    }

    pub fn snapshot(&self, now: DateTime<Utc>) -> TimerSnapshot {
        let elapsed = self.elapsed_ms(now);
        TimerSnapshot {
            tab_id: self.tab_id,
            title: self.title.clone(),
            url: self.url.clone(),
            base_url: self.base_url.clone(),
            interval_minutes: self.interval_minutes,
            elapsed_ms: elapsed.max(0),
            remaining_ms: (interval_ms(self.interval_minutes) - elapsed).max(0),
            is_active: self.is_active,
        }
    }
}

/// Read-only view of a timer for the UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    pub tab_id: TabId,
    pub title: String,
    pub url: String,
    pub base_url: String,
    pub interval_minutes: f64,
    pub elapsed_ms: i64,
    pub remaining_ms: i64,
    pub is_active: bool,
}

/// All live countdowns keyed by tab
#[derive(Debug, Clone, Default)]
pub struct TimerTable {
    entries: BTreeMap<TabId, TimerEntry>,
}

impl TimerTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, tab_id: TabId) -> Option<&TimerEntry> {
        self.entries.get(&tab_id)
    }

    /// Fetch the entry for a tab, creating it with `started_at = now` if missing
    pub fn entry_or_start(&mut self, tab: &Tab, rule: &Rule, now: DateTime<Utc>) -> &mut TimerEntry {
        self.entries
            .entry(tab.id)
            .or_insert_with(|| TimerEntry::new(tab, rule, now))
    }

    pub fn remove(&mut self, tab_id: TabId) -> Option<TimerEntry> {
        self.entries.remove(&tab_id)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Drop entries for tabs not seen in the latest pass. Returns how many were removed.
    pub fn retain_tabs(&mut self, live: &HashSet<TabId>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|id, _| live.contains(id));
        before - self.entries.len()
    }

    /// Drop entries whose rule no longer exists. Returns how many were removed.
    pub fn retain_rules(&mut self, rule_ids: &HashSet<&str>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| rule_ids.contains(entry.rule_id.as_str()));
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn snapshot(&self, now: DateTime<Utc>) -> Vec<TimerSnapshot> {
        self.entries.values().map(|entry| entry.snapshot(now)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn rule() -> Rule {
        Rule {
            id: "r1".into(),
            base_url: "https://example.com/".into(),
            interval_minutes: 2.0,
        }
    }

    fn tab(id: TabId) -> Tab {
        Tab {
            id,
            url: "https://example.com/page".into(),
            title: "Page".into(),
            active: false,
            highlighted: None,
            window_id: 0,
        }
    }

    #[test]
    fn snapshot_computes_elapsed_and_remaining() {
        let start = Utc::now();
        let entry = TimerEntry::new(&tab(1), &rule(), start);
        let snap = entry.snapshot(start + TimeDelta::seconds(30));

        assert_eq!(snap.elapsed_ms, 30_000);
        assert_eq!(snap.remaining_ms, 90_000);
    }

    #[test]
    fn snapshot_floors_at_zero() {
        let start = Utc::now();
        let entry = TimerEntry::new(&tab(1), &rule(), start);

        let late = entry.snapshot(start + TimeDelta::minutes(10));
        assert_eq!(late.remaining_ms, 0);

        let early = entry.snapshot(start - TimeDelta::seconds(5));
        assert_eq!(early.elapsed_ms, 0);
    }

    #[test]
    fn observe_keeps_previous_title_when_blank() {
        let mut entry = TimerEntry::new(&tab(1), &rule(), Utc::now());
        let mut blank = tab(1);
        blank.title.clear();
        entry.observe(&blank, true);

        assert_eq!(entry.title, "Page");
        assert!(entry.is_active);
    }

    #[test]
    fn entry_or_start_keeps_existing_start() {
        let mut table = TimerTable::new();
        let start = Utc::now();
        table.entry_or_start(&tab(1), &rule(), start);
        let later = table.entry_or_start(&tab(1), &rule(), start + TimeDelta::seconds(9));
        assert_eq!(later.started_at, start);
    }

    #[test]
    fn retain_prunes_by_tab_and_rule() {
        let mut table = TimerTable::new();
        let now = Utc::now();
        table.entry_or_start(&tab(1), &rule(), now);
        table.entry_or_start(&tab(2), &rule(), now);

        let live: HashSet<TabId> = [1].into_iter().collect();
        assert_eq!(table.retain_tabs(&live), 1);
        assert!(table.get(2).is_none());

        let rule_ids: HashSet<&str> = HashSet::new();
        assert_eq!(table.retain_rules(&rule_ids), 1);
        assert!(table.is_empty());
    }
}
