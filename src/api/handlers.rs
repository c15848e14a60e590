//! HTTP endpoint handlers

use std::sync::Arc;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use tracing::{error, info, warn};

use crate::{
    rules::Rule,
    scheduler::ToggleOutcome,
    services::{ShortcutCommand, Tab, TabId},
    state::AppState,
    tasks::{run_blocking, Trigger},
    RefreshError,
};
use super::{
    messages::{dispatch, Request, Response},
    responses::{ApiResponse, DefaultInterval, HealthResponse, RuleInput, StatusResponse, ToggleRequest},
};

/// Map a failure to a status code, logging it at a level matching its cause
fn error_status(context: &str, e: &RefreshError) -> StatusCode {
    match e {
        RefreshError::RuleNotFound(_) | RefreshError::TabNotFound(_) => {
            warn!("{}: {}", context, e);
            StatusCode::NOT_FOUND
        }
        e if e.is_invalid_input() => {
            warn!("{}: {}", context, e);
            StatusCode::BAD_REQUEST
        }
        _ => {
            error!("{}: {}", context, e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Handle POST /message - Dispatch a tagged request
pub async fn message_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<Request>,
) -> Json<Response> {
    Json(dispatch(&state, request).await)
}

/// Handle GET /timers - Reconcile and return every timer
pub async fn timers_handler(State(state): State<Arc<AppState>>) -> Json<Response> {
    Json(dispatch(&state, Request::GetTimers).await)
}

/// Handle GET /rules - List rules in stored order
pub async fn list_rules_handler(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Rule>>, StatusCode> {
    run_blocking(&state, |scheduler| scheduler.list_rules())
        .await
        .map(Json)
        .map_err(|e| error_status("Failed to list rules", &e))
}

/// Handle POST /rules - Add a rule or update the one with the same base
pub async fn add_rule_handler(
    State(state): State<Arc<AppState>>,
    Json(input): Json<RuleInput>,
) -> Result<Json<Rule>, StatusCode> {
    let rule = run_blocking(&state, move |scheduler| scheduler.add_rule(&input.base_url, input.interval_minutes))
        .await
        .map_err(|e| error_status("Failed to add rule", &e))?;
    state.record_action("rule-saved");
    Ok(Json(rule))
}

/// Handle PUT /rules/:id - Edit a rule
pub async fn update_rule_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(input): Json<RuleInput>,
) -> Result<Json<Rule>, StatusCode> {
    let rule = run_blocking(&state, move |scheduler| {
        scheduler.update_rule(&id, &input.base_url, input.interval_minutes)
    })
    .await
    .map_err(|e| error_status("Failed to update rule", &e))?;
    state.record_action("rule-edited");
    Ok(Json(rule))
}

/// Handle DELETE /rules/:id - Delete a rule
pub async fn delete_rule_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Rule>, StatusCode> {
    let rule = run_blocking(&state, move |scheduler| scheduler.delete_rule(&id))
        .await
        .map_err(|e| error_status("Failed to delete rule", &e))?;
    state.record_action("rule-deleted");
    Ok(Json(rule))
}

/// Handle POST /rules/toggle - Toggle a rule for a page URL
pub async fn toggle_rule_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ToggleRequest>,
) -> Result<Json<ToggleOutcome>, StatusCode> {
    let outcome = run_blocking(&state, move |scheduler| scheduler.toggle_rule(&request.url, request.mode))
        .await
        .map_err(|e| error_status("Failed to toggle rule", &e))?;
    state.record_action(if outcome.added { "rule-added" } else { "rule-removed" });
    Ok(Json(outcome))
}

/// Handle GET /settings/default-interval
pub async fn get_default_interval_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DefaultInterval>, StatusCode> {
    let minutes = run_blocking(&state, |scheduler| scheduler.default_interval_minutes())
        .await
        .map_err(|e| error_status("Failed to read default interval", &e))?;
    Ok(Json(DefaultInterval {
        default_interval_minutes: minutes,
    }))
}

/// Handle PUT /settings/default-interval
pub async fn set_default_interval_handler(
    State(state): State<Arc<AppState>>,
    Json(body): Json<DefaultInterval>,
) -> Result<Json<DefaultInterval>, StatusCode> {
    let minutes = run_blocking(&state, move |scheduler| {
        scheduler.set_default_interval_minutes(body.default_interval_minutes)
    })
    .await
    .map_err(|e| error_status("Failed to set default interval", &e))?;
    state.record_action("default-interval");
    Ok(Json(DefaultInterval {
        default_interval_minutes: minutes,
    }))
}

/// Handle PUT /tabs - Replace the whole tab snapshot
pub async fn sync_tabs_handler(
    State(state): State<Arc<AppState>>,
    Json(tabs): Json<Vec<Tab>>,
) -> Result<Json<ApiResponse>, StatusCode> {
    let count = tabs.len();
    state
        .tabs
        .replace_all(tabs)
        .map_err(|e| error_status("Failed to sync tabs", &e))?;
    state.notify(Trigger::TabsSynced);
    Ok(Json(ApiResponse::ok(format!("Synced {} tabs", count))))
}

/// Handle POST /tabs/:id - A tab was created or its URL/content changed
pub async fn upsert_tab_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<TabId>,
    Json(mut tab): Json<Tab>,
) -> Result<Json<ApiResponse>, StatusCode> {
    tab.id = id;
    state
        .tabs
        .upsert(tab)
        .map_err(|e| error_status("Failed to update tab", &e))?;
    state.notify(Trigger::TabUpdated(id));
    Ok(Json(ApiResponse::ok(format!("Tab {} updated", id))))
}

/// Handle DELETE /tabs/:id - A tab was closed
pub async fn close_tab_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<TabId>,
) -> Result<Json<ApiResponse>, StatusCode> {
    state
        .tabs
        .remove(id)
        .map_err(|e| error_status("Failed to close tab", &e))?;
    state.scheduler.forget_tab(id);
    state.notify(Trigger::TabClosed(id));
    Ok(Json(ApiResponse::ok(format!("Tab {} closed", id))))
}

/// Handle POST /tabs/:id/activate - A tab became the active one
pub async fn activate_tab_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<TabId>,
) -> Result<Json<ApiResponse>, StatusCode> {
    state
        .tabs
        .activate(id)
        .map_err(|e| error_status("Failed to activate tab", &e))?;
    state.notify(Trigger::TabActivated(id));
    Ok(Json(ApiResponse::ok(format!("Tab {} activated", id))))
}

/// Handle POST /reloads/drain - Hand queued reloads to the bridge
pub async fn drain_reloads_handler(State(state): State<Arc<AppState>>) -> Result<Json<Vec<TabId>>, StatusCode> {
    state
        .tabs
        .drain_reloads()
        .map(Json)
        .map_err(|e| error_status("Failed to drain reloads", &e))
}

/// Handle POST /commands/:name - Toggle a rule for the focused tab
pub async fn command_handler(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<ToggleOutcome>, StatusCode> {
    let command = ShortcutCommand::from_name(&name).map_err(|e| error_status("Rejected command", &e))?;
    let url = state
        .scheduler
        .active_tab_url()
        .map_err(|e| error_status("Command has no target", &e))?;
    let mode = command.mode();
    let outcome = run_blocking(&state, move |scheduler| scheduler.toggle_rule(&url, mode))
        .await
        .map_err(|e| error_status("Failed to run command", &e))?;

    info!("Command {} toggled {} (added={})", command.name(), outcome.base_url, outcome.added);
    state.record_action(command.name());
    Ok(Json(outcome))
}

/// Handle GET /status - Return current scheduler status
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Result<Json<StatusResponse>, StatusCode> {
    let rules = run_blocking(&state, |scheduler| scheduler.list_rules())
        .await
        .map_err(|e| error_status("Failed to load rules", &e))?;
    let (last_action, last_action_time) = state.get_last_action();

    Ok(Json(StatusResponse {
        rules: rules.len(),
        timers: state.scheduler.timer_count(),
        tabs: state.tabs.len(),
        tick_seconds: state.tick_interval.as_secs(),
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    }))
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
