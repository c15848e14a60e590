//! HTTP API module
//!
//! This module contains all HTTP endpoint handlers, the message protocol and
//! response structures.

pub mod handlers;
pub mod messages;
pub mod responses;

use std::sync::Arc;
use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use handlers::*;

/// Create the HTTP router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/message", post(message_handler))
        .route("/timers", get(timers_handler))
        .route("/rules", get(list_rules_handler).post(add_rule_handler))
        .route("/rules/toggle", post(toggle_rule_handler))
        .route("/rules/:id", put(update_rule_handler).delete(delete_rule_handler))
        .route(
            "/settings/default-interval",
            get(get_default_interval_handler).put(set_default_interval_handler),
        )
        .route("/tabs", put(sync_tabs_handler))
        .route("/tabs/:id", post(upsert_tab_handler).delete(close_tab_handler))
        .route("/tabs/:id/activate", post(activate_tab_handler))
        .route("/reloads/drain", post(drain_reloads_handler))
        .route("/commands/:name", post(command_handler))
        .route("/status", get(status_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
