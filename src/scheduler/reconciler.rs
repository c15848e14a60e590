//! One reconciliation pass over the open tabs

use std::{
    collections::HashSet,
    sync::atomic::{AtomicBool, Ordering},
};

use tracing::{debug, info, warn};

use super::Scheduler;
use crate::{
    rules::pick_rule,
    services::{TabId, TabQuery},
    RefreshError,
};

/// Result of a call to [`Scheduler::reconcile`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Another pass was already running; nothing was touched
    Skipped,
    /// No rules exist, so every timer was dropped
    Cleared,
    /// A collaborator could not be read; timers were left as they were
    Aborted,
    Completed(ReconcileReport),
}

/// What a completed pass did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub tabs_seen: usize,
    pub timers: usize,
    /// Tabs whose reload was requested, successful or not
    pub refreshed: Vec<TabId>,
    pub pruned: usize,
}

/// Holds the reentrancy flag for the duration of a pass
struct PassGuard<'a>(&'a AtomicBool);

impl<'a> PassGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Scheduler {
    /// Run one tick.
    ///
    /// Overlapping calls collapse: if a pass is already running the call returns
    /// [`ReconcileOutcome::Skipped`] immediately. Collaborator failures are logged
    /// and never propagated.
    pub fn reconcile(&self) -> ReconcileOutcome {
        let Some(_guard) = PassGuard::acquire(&self.updating) else {
            debug!("Reconciliation already running, dropping trigger");
            return ReconcileOutcome::Skipped;
        };

        let rules = match self.rules.get_rules() {
            Ok(rules) => rules,
            Err(e) => {
                warn!("Failed to load rules, skipping tick: {}", e);
                return ReconcileOutcome::Aborted;
            }
        };

        if rules.is_empty() {
            let mut table = self.table();
            if !table.is_empty() {
                debug!("No rules configured, clearing {} timers", table.len());
                table.clear();
            }
            return ReconcileOutcome::Cleared;
        }

        let tabs = match self.tabs.query_tabs(&TabQuery::all()) {
            Ok(tabs) => tabs,
            Err(e) => {
                warn!("Failed to query tabs, skipping tick: {}", e);
                return ReconcileOutcome::Aborted;
            }
        };

        let now = self.clock.now();
        let mut table = self.table();
        let mut live = HashSet::new();
        let mut refreshed = Vec::new();

        for tab in &tabs {
            let Some(rule) = pick_rule(&rules, &tab.url) else {
                continue;
            };
            live.insert(tab.id);

            let entry = table.entry_or_start(tab, rule, now);
            let is_active = tab.is_focused();

            if is_active || entry.base_url != rule.base_url || entry.rule_id != rule.id {
                entry.reset(rule, now);
            } else {
                entry.interval_minutes = rule.interval_minutes;
            }
            entry.observe(tab, is_active);

            if !is_active && entry.elapsed_ms(now) >= rule.interval_ms() {
                match self.tabs.reload_tab(tab.id) {
                    Ok(()) => info!("Refreshing tab {} ({})", tab.id, tab.url),
                    Err(e @ RefreshError::NotReloadable(_)) => debug!("{}", e),
                    Err(e) => warn!("Failed to reload tab {}: {}", tab.id, e),
                }
                entry.started_at = self.clock.now();
                refreshed.push(tab.id);
            }
        }

        let mut pruned = table.retain_tabs(&live);
        let rule_ids: HashSet<&str> = rules.iter().map(|r| r.id.as_str()).collect();
        pruned += table.retain_rules(&rule_ids);
        if pruned > 0 {
            debug!("Pruned {} stale timers", pruned);
        }

        ReconcileOutcome::Completed(ReconcileReport {
            tabs_seen: tabs.len(),
            timers: table.len(),
            refreshed,
            pruned,
        })
    }
}
