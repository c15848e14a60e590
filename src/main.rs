//! Tab Refresher - periodically reloads browser tabs matching URL rules
//!
//! This is the main entry point for the tab-refresher daemon.

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use tab_refresher::{
    api::create_router,
    config::Config,
    rules::JsonRuleStore,
    state::AppState,
    tasks::{tick_task, trigger_task, Trigger},
    utils::shutdown_signal,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing with appropriate log level
    tracing_subscriber::fmt()
        .with_env_filter(format!("tab_refresher={},tower_http=info", config.log_level()))
        .init();

    info!("Starting tab-refresher v{}", env!("CARGO_PKG_VERSION"));
    let rules_path = config.rules_path();
    info!("Configuration: host={}, port={}, tick={}s, rules={}",
          config.host, config.port, config.tick_seconds, rules_path.display());

    let store = Arc::new(JsonRuleStore::new(rules_path));
    let state = Arc::new(AppState::new(config.port, config.host.clone(), config.tick_interval(), store));

    // Subscribe before spawning so the startup trigger is not lost
    let trigger_rx = state.trigger_tx.subscribe();
    tokio::spawn(trigger_task(Arc::clone(&state), trigger_rx));
    tokio::spawn(tick_task(Arc::clone(&state)));
    state.notify(Trigger::Startup);

    let app = create_router(Arc::clone(&state));

    let addr = config.address();
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);
    info!("Endpoints:");
    info!("  POST /message              - Dispatch rulesUpdated / shortcutTriggered / getTimers");
    info!("  GET  /timers               - Current tab timers");
    info!("  GET|POST /rules            - List or add rules");
    info!("  PUT|DELETE /rules/:id      - Edit or delete a rule");
    info!("  POST /rules/toggle         - Toggle a rule for a URL");
    info!("  PUT  /tabs                 - Replace the tab snapshot");
    info!("  POST|DELETE /tabs/:id      - Tab updated or closed");
    info!("  POST /tabs/:id/activate    - Tab activated");
    info!("  POST /reloads/drain        - Take queued reloads");
    info!("  POST /commands/:name       - Run a keyboard command");
    info!("  GET  /status               - Scheduler status");
    info!("  GET  /health               - Health check");

    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                tracing::error!("Server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received");
        }
    }

    info!("Server shutdown complete");
    Ok(())
}
