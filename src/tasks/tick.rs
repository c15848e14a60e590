//! Periodic reconciliation tick

use std::sync::Arc;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::{
    scheduler::{ReconcileOutcome, Scheduler},
    state::AppState,
    RefreshError, Result,
};

/// Run a scheduler job on the blocking pool.
///
/// Rule operations touch the rules file and hold the timer table lock, so they
/// never run on an async worker thread.
pub async fn run_blocking<T, F>(state: &AppState, job: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&Scheduler) -> Result<T> + Send + 'static,
{
    let scheduler = Arc::clone(&state.scheduler);
    tokio::task::spawn_blocking(move || job(&scheduler))
        .await
        .map_err(|e| RefreshError::TaskFailed(e.to_string()))?
}

/// Run one reconciliation pass off the async runtime.
///
/// Returns `None` only if the blocking task itself failed.
pub async fn reconcile_now(state: &AppState) -> Option<ReconcileOutcome> {
    match run_blocking(state, |scheduler| Ok(scheduler.reconcile())).await {
        Ok(outcome) => Some(outcome),
        Err(e) => {
            warn!("Reconciliation task failed: {}", e);
            None
        }
    }
}

/// Background task that reconciles on a fixed period, forever
pub async fn tick_task(state: Arc<AppState>) {
    info!("Starting tick task (every {:?})", state.tick_interval);

    let mut ticker = interval(state.tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;

        match reconcile_now(&state).await {
            Some(ReconcileOutcome::Completed(report)) if !report.refreshed.is_empty() => {
                info!("Tick refreshed {} tab(s): {:?}", report.refreshed.len(), report.refreshed);
            }
            Some(outcome) => debug!("Tick outcome: {:?}", outcome),
            None => {}
        }
    }
}
