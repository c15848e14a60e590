//! Main application state management

use std::{
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};
use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::{
    rules::RuleStore,
    scheduler::Scheduler,
    services::BridgeTabInventory,
    tasks::Trigger,
    utils::Clock,
};

/// Shared state of the daemon: the scheduler, the tab bridge and trigger plumbing
pub struct AppState {
    /// Owns the timer table and the reconciliation flag
    pub scheduler: Arc<Scheduler>,
    /// Tab snapshot pushed by the browser bridge
    pub tabs: Arc<BridgeTabInventory>,
    /// Period of the background tick
    pub tick_interval: Duration,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    pub last_action: Arc<Mutex<Option<String>>>,
    pub last_action_time: Arc<Mutex<Option<DateTime<Utc>>>>,
    /// Lifecycle triggers that should cause a reconciliation
    pub trigger_tx: broadcast::Sender<Trigger>,
}

impl AppState {
    /// Create a new AppState around a rule store, with an empty tab bridge
    pub fn new(port: u16, host: String, tick_interval: Duration, rules: Arc<dyn RuleStore>) -> Self {
        let tabs = Arc::new(BridgeTabInventory::new());
        let scheduler = Arc::new(Scheduler::new(rules, tabs.clone()));
        Self::from_parts(port, host, tick_interval, scheduler, tabs)
    }

    /// Like [`AppState::new`] but with an explicit clock
    pub fn with_clock(
        port: u16,
        host: String,
        tick_interval: Duration,
        rules: Arc<dyn RuleStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let tabs = Arc::new(BridgeTabInventory::new());
        let scheduler = Arc::new(Scheduler::with_clock(rules, tabs.clone(), clock));
        Self::from_parts(port, host, tick_interval, scheduler, tabs)
    }

    fn from_parts(
        port: u16,
        host: String,
        tick_interval: Duration,
        scheduler: Arc<Scheduler>,
        tabs: Arc<BridgeTabInventory>,
    ) -> Self {
        let (trigger_tx, _) = broadcast::channel(100);

        Self {
            scheduler,
            tabs,
            tick_interval,
            start_time: Instant::now(),
            port,
            host,
            last_action: Arc::new(Mutex::new(None)),
            last_action_time: Arc::new(Mutex::new(None)),
            trigger_tx,
        }
    }

    /// Ask the trigger task to reconcile. Dropped silently when nobody listens.
    pub fn notify(&self, trigger: Trigger) {
        debug!("Trigger: {:?}", trigger);
        if let Err(e) = self.trigger_tx.send(trigger) {
            debug!("No trigger listener: {}", e);
        }
    }

    /// Record a user-visible action for the status endpoint
    pub fn record_action(&self, action: &str) {
        match self.last_action.lock() {
            Ok(mut last_action) => *last_action = Some(action.to_string()),
            Err(e) => warn!("Failed to record last action: {}", e),
        }
        if let Ok(mut last_time) = self.last_action_time.lock() {
            *last_time = Some(Utc::now());
        }
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_action = self.last_action.lock().ok().and_then(|a| a.clone());
        let last_action_time = self.last_action_time.lock().ok().and_then(|t| *t);
        (last_action, last_action_time)
    }
}
