//! Lifecycle triggers
//!
//! Every trigger coalesces into "reconcile now". Ordering between triggers is
//! not meaningful; a trigger that arrives while a pass is running is dropped.

use std::sync::Arc;
use tokio::sync::broadcast::{error::RecvError, Receiver};
use tracing::{debug, info, warn};

use super::tick::reconcile_now;
use crate::{services::TabId, state::AppState};

/// Events that make the scheduler reconcile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Startup,
    /// The tab is gone; its timer was already dropped by whoever reported it
    TabClosed(TabId),
    TabUpdated(TabId),
    TabActivated(TabId),
    /// The bridge replaced its whole tab snapshot
    TabsSynced,
}

/// Background task that turns triggers into reconciliation passes
pub async fn trigger_task(state: Arc<AppState>, mut trigger_rx: Receiver<Trigger>) {
    info!("Starting trigger task");

    loop {
        match trigger_rx.recv().await {
            Ok(trigger) => {
                debug!("Reconciling after {:?}", trigger);
                reconcile_now(&state).await;
            }
            Err(RecvError::Lagged(skipped)) => {
                // Missed triggers collapse into the pass we are about to run
                debug!("Trigger receiver lagged by {}", skipped);
                reconcile_now(&state).await;
            }
            Err(RecvError::Closed) => {
                warn!("Trigger channel closed, stopping trigger task");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::{
        rules::{MemoryRuleStore, Rule},
        services::Tab,
    };

    #[tokio::test]
    async fn closed_tab_is_pruned_by_the_next_pass() {
        let rules = Arc::new(MemoryRuleStore::with_rules(vec![Rule::new("https://a.com/".into(), 1.0)]));
        let state = Arc::new(AppState::new(0, "127.0.0.1".into(), Duration::from_secs(2), rules));
        state
            .tabs
            .upsert(Tab {
                id: 5,
                url: "https://a.com/".into(),
                title: "A".into(),
                active: false,
                highlighted: None,
                window_id: 0,
            })
            .unwrap();
        state.scheduler.reconcile();
        assert_eq!(state.scheduler.timer_count(), 1);

        let rx = state.trigger_tx.subscribe();
        let handle = tokio::spawn(trigger_task(Arc::clone(&state), rx));

        state.tabs.remove(5).unwrap();
        state.notify(Trigger::TabClosed(5));

        for _ in 0..50 {
            if state.scheduler.timer_count() == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(state.scheduler.timer_count(), 0);
        handle.abort();
    }
}
