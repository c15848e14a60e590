//! Tab refresh scheduler
//!
//! The [`Scheduler`] owns the timer table and the reentrancy flag. All timer
//! and rule mutation goes through it: [`Scheduler::reconcile`] runs one tick,
//! the rule operations in [`rule_ops`] mutate the rule set and then reconcile.

pub mod reconciler;
pub mod rule_ops;

use std::sync::{atomic::AtomicBool, Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::{
    rules::RuleStore,
    services::{TabId, TabInventory, TabQuery},
    state::{TimerSnapshot, TimerTable},
    utils::{Clock, SystemClock},
};

pub use reconciler::{ReconcileOutcome, ReconcileReport};
pub use rule_ops::ToggleOutcome;

/// Owns the per-tab timers and drives reconciliation against the collaborators
pub struct Scheduler {
    rules: Arc<dyn RuleStore>,
    tabs: Arc<dyn TabInventory>,
    clock: Arc<dyn Clock>,
    table: Mutex<TimerTable>,
    /// Set while a reconciliation pass is running
    updating: AtomicBool,
}

impl Scheduler {
    pub fn new(rules: Arc<dyn RuleStore>, tabs: Arc<dyn TabInventory>) -> Self {
        Self::with_clock(rules, tabs, Arc::new(SystemClock))
    }

    pub fn with_clock(rules: Arc<dyn RuleStore>, tabs: Arc<dyn TabInventory>, clock: Arc<dyn Clock>) -> Self {
        Self {
            rules,
            tabs,
            clock,
            table: Mutex::new(TimerTable::new()),
            updating: AtomicBool::new(false),
        }
    }

    /// The timer table survives a panic in another holder; its entries stay usable
    fn table(&self) -> MutexGuard<'_, TimerTable> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of the current timer table without reconciling
    pub fn timers(&self) -> TimerTable {
        self.table().clone()
    }

    pub fn timer_count(&self) -> usize {
        self.table().len()
    }

    /// Reconcile, then project every timer for display
    pub fn timer_snapshot(&self) -> Vec<TimerSnapshot> {
        self.reconcile();
        let now = self.clock.now();
        self.table().snapshot(now)
    }

    /// Drop the timer of a closed tab right away
    pub fn forget_tab(&self, tab_id: TabId) -> bool {
        let removed = self.table().remove(tab_id).is_some();
        if removed {
            debug!("Dropped timer for closed tab {}", tab_id);
        }
        removed
    }

    /// URL of the focused tab, if any
    pub fn active_tab_url(&self) -> crate::Result<String> {
        let tabs = self.tabs.query_tabs(&TabQuery::active())?;
        tabs.into_iter()
            .map(|tab| tab.url)
            .find(|url| !url.is_empty())
            .ok_or(crate::RefreshError::NoActiveTab)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::{
        rules::{MemoryRuleStore, Rule},
        services::{BridgeTabInventory, Tab},
        utils::ManualClock,
    };
    use chrono::{TimeZone, Utc};

    pub struct Harness {
        pub rules: Arc<MemoryRuleStore>,
        pub tabs: Arc<BridgeTabInventory>,
        pub clock: Arc<ManualClock>,
        pub scheduler: Scheduler,
    }

    pub fn harness(rules: Vec<Rule>) -> Harness {
        let store = Arc::new(MemoryRuleStore::with_rules(rules));
        let tabs = Arc::new(BridgeTabInventory::new());
        let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap()));
        let scheduler = Scheduler::with_clock(store.clone(), tabs.clone(), clock.clone());
        Harness {
            rules: store,
            tabs,
            clock,
            scheduler,
        }
    }

    pub fn rule(id: &str, base: &str, minutes: f64) -> Rule {
        Rule {
            id: id.to_string(),
            base_url: base.to_string(),
            interval_minutes: minutes,
        }
    }

    pub fn tab(id: TabId, url: &str, active: bool) -> Tab {
        Tab {
            id,
            url: url.to_string(),
            title: format!("Tab {}", id),
            active,
            highlighted: None,
            window_id: 0,
        }
    }
}
