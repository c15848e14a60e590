//! Request/response messages exchanged with the popup and content scripts

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    rules::RuleMode,
    state::{AppState, TimerSnapshot},
    tasks::{reconcile_now, run_blocking},
};

/// Inbound messages, tagged by their `type` field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Request {
    /// Rules were edited elsewhere; reconcile now
    RulesUpdated,
    /// A page shortcut asked to toggle a rule for `url`
    ShortcutTriggered {
        url: String,
        #[serde(default)]
        mode: RuleMode,
    },
    /// Fetch the current timers
    GetTimers,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timers: Option<Vec<TimerSnapshot>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Response {
    pub fn ok() -> Self {
        Self {
            ok: true,
            ..Self::default()
        }
    }

    pub fn failure(error: String) -> Self {
        Self {
            ok: false,
            error: Some(error),
            ..Self::default()
        }
    }
}

/// Handle one inbound message
pub async fn dispatch(state: &AppState, request: Request) -> Response {
    match request {
        Request::RulesUpdated => {
            reconcile_now(state).await;
            Response::ok()
        }
        Request::ShortcutTriggered { url, mode } => {
            let target = url.clone();
            match run_blocking(state, move |scheduler| scheduler.toggle_rule(&target, mode)).await {
                Ok(outcome) => {
                    info!("Shortcut toggled {} (added={})", outcome.base_url, outcome.added);
                    state.record_action(if outcome.added { "rule-added" } else { "rule-removed" });
                    Response {
                        added: Some(outcome.added),
                        ..Response::ok()
                    }
                }
                Err(e) => {
                    warn!("Shortcut toggle for {} failed: {}", url, e);
                    Response::failure(e.to_string())
                }
            }
        }
        Request::GetTimers => match run_blocking(state, |scheduler| Ok(scheduler.timer_snapshot())).await {
            Ok(timers) => Response {
                timers: Some(timers),
                ..Response::ok()
            },
            Err(e) => {
                warn!("Failed to collect timers: {}", e);
                Response::failure(e.to_string())
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{sync::Arc, time::Duration};

    use crate::rules::MemoryRuleStore;

    fn state() -> AppState {
        AppState::new(0, "127.0.0.1".into(), Duration::from_secs(2), Arc::new(MemoryRuleStore::new()))
    }

    #[test]
    fn requests_parse_from_tagged_json() {
        let req: Request = serde_json::from_str(r#"{"type":"shortcutTriggered","url":"https://a.com/"}"#).unwrap();
        assert_eq!(
            req,
            Request::ShortcutTriggered {
                url: "https://a.com/".into(),
                mode: RuleMode::Full
            }
        );

        let req: Request = serde_json::from_str(r#"{"type":"shortcutTriggered","url":"x","mode":"base"}"#).unwrap();
        assert!(matches!(req, Request::ShortcutTriggered { mode: RuleMode::Base, .. }));

        assert_eq!(serde_json::from_str::<Request>(r#"{"type":"getTimers"}"#).unwrap(), Request::GetTimers);
        assert!(serde_json::from_str::<Request>(r#"{"type":"launchRockets"}"#).is_err());
    }

    #[tokio::test]
    async fn shortcut_toggles_on_then_off() {
        let state = state();
        let request = Request::ShortcutTriggered {
            url: "https://a.com/page".into(),
            mode: RuleMode::Full,
        };

        let first = dispatch(&state, request.clone()).await;
        assert!(first.ok);
        assert_eq!(first.added, Some(true));

        let second = dispatch(&state, request).await;
        assert_eq!(second.added, Some(false));
        assert_eq!(state.get_last_action().0.as_deref(), Some("rule-removed"));
    }

    #[tokio::test]
    async fn invalid_shortcut_url_reports_failure() {
        let response = dispatch(
            &state(),
            Request::ShortcutTriggered {
                url: "nope".into(),
                mode: RuleMode::Base,
            },
        )
        .await;
        assert!(!response.ok);
        assert!(response.error.is_some());
    }

    #[tokio::test]
    async fn get_timers_returns_a_list() {
        let response = dispatch(&state(), Request::GetTimers).await;
        assert!(response.ok);
        assert_eq!(response.timers, Some(Vec::new()));

        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("added").is_none());
    }
}
