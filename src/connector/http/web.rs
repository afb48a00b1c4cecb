use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::HeaderMap;
use axum::response::{Html, IntoResponse};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;
use tracing::info;

use super::{ApiError, AppState};
use crate::application::SessionHandle;
use crate::connector::api::Container;
use crate::domain::{ChatOptions, DEFAULT_SCENARIO};

pub const SESSION_COOKIE: &str = "session_id";

type ApiResult = std::result::Result<Json<Value>, ApiError>;

#[derive(Debug, Deserialize)]
pub struct WebChatRequest {
    #[serde(default)]
    pub message: String,
    pub scenario: Option<String>,
    #[serde(default)]
    pub use_history: bool,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/scenarios", get(list_scenarios))
        .route("/api/chat", post(chat))
        .route("/api/history", get(get_history).delete(clear_history))
        .route("/api/status", get(status))
        .fallback(not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(container: Arc<Container>, addr: SocketAddr) -> Result<()> {
    info!("Starting web app for model {}", container.model_name());
    super::serve(router(AppState::new(container)), addr).await
}

/// Value of the session cookie, if the request carries a non-blank one.
pub fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

async fn session_for(
    state: &AppState,
    headers: &HeaderMap,
) -> std::result::Result<SessionHandle, ApiError> {
    let token = session_cookie(headers).ok_or_else(|| ApiError::bad_request("No session"))?;
    Ok(state.sessions.get_or_create(Some(&token)).await)
}

async fn index(State(state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let existing = session_cookie(&headers);
    let handle = state.sessions.get_or_create(existing.as_deref()).await;

    let mut response_headers = HeaderMap::new();
    if existing.is_none() {
        let cookie = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax",
            SESSION_COOKIE,
            handle.session.id()
        );
        if let Ok(value) = cookie.parse() {
            response_headers.insert(SET_COOKIE, value);
        }
    }

    (response_headers, Html(INDEX_HTML))
}

async fn list_scenarios(State(state): State<AppState>) -> ApiResult {
    let scenarios = state.container.scenarios_use_case().list().await?;
    Ok(Json(json!({ "success": true, "scenarios": scenarios })))
}

async fn chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: std::result::Result<Json<WebChatRequest>, JsonRejection>,
) -> ApiResult {
    let handle = session_for(&state, &headers).await?;
    let Json(request) = payload?;

    let message = request.message.trim();
    if message.is_empty() {
        return Err(ApiError::bad_request("Message cannot be empty"));
    }

    let options = ChatOptions::new()
        .with_scenario(request.scenario.as_deref().unwrap_or(DEFAULT_SCENARIO))
        .with_history(request.use_history);
    let reply = handle.client.chat(message, &options).await?;

    Ok(Json(json!({
        "success": true,
        "response": reply.content,
        "scenario": reply.scenario,
    })))
}

async fn get_history(State(state): State<AppState>, headers: HeaderMap) -> ApiResult {
    let handle = session_for(&state, &headers).await?;
    let history = handle.client.history().await;
    Ok(Json(json!({ "success": true, "history": history })))
}

async fn clear_history(State(state): State<AppState>, headers: HeaderMap) -> ApiResult {
    let handle = session_for(&state, &headers).await?;
    handle.client.clear_history().await;
    Ok(Json(json!({ "success": true, "message": "History cleared" })))
}

async fn status(State(state): State<AppState>) -> Json<Value> {
    let client = state.container.new_client();
    let connected = client.is_reachable().await;
    let models = if connected {
        client.list_models().await
    } else {
        Vec::new()
    };

    Json(json!({ "success": true, "connected": connected, "models": models }))
}

async fn not_found() -> ApiError {
    ApiError::not_found("Endpoint not found")
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>ScenarioChat</title>
<style>
  body { font-family: sans-serif; max-width: 760px; margin: 2rem auto; }
  #log { border: 1px solid #ccc; min-height: 320px; padding: .5rem; white-space: pre-wrap; }
  .user { color: #1a4d8f; } .ai { color: #222; } .err { color: #b00; }
  form { display: flex; gap: .5rem; margin-top: .5rem; } #message { flex: 1; }
</style>
</head>
<body>
<h1>ScenarioChat</h1>
<p>
  <select id="scenario"></select>
  <label><input type="checkbox" id="history"> keep history</label>
  <button id="clear" type="button">Clear history</button>
  <span id="status"></span>
</p>
<div id="log"></div>
<form id="form"><input id="message" autocomplete="off"><button>Send</button></form>
<script>
const log = document.getElementById('log');
function append(cls, text) {
  const div = document.createElement('div');
  div.className = cls; div.textContent = text; log.appendChild(div);
}
async function init() {
  const s = await (await fetch('/api/scenarios')).json();
  const select = document.getElementById('scenario');
  for (const sc of s.scenarios) {
    const opt = document.createElement('option');
    opt.value = sc.key; opt.textContent = sc.name; select.appendChild(opt);
  }
  const st = await (await fetch('/api/status')).json();
  document.getElementById('status').textContent = st.connected ? 'connected' : 'server unreachable';
}
document.getElementById('form').addEventListener('submit', async (e) => {
  e.preventDefault();
  const input = document.getElementById('message');
  const message = input.value.trim();
  if (!message) return;
  input.value = '';
  append('user', 'You: ' + message);
  const res = await fetch('/api/chat', {
    method: 'POST', headers: {'Content-Type': 'application/json'},
    body: JSON.stringify({
      message,
      scenario: document.getElementById('scenario').value,
      use_history: document.getElementById('history').checked
    })
  });
  const body = await res.json();
  if (body.success) append('ai', 'AI: ' + body.response); else append('err', body.error);
});
document.getElementById('clear').addEventListener('click', async () => {
  await fetch('/api/history', {method: 'DELETE'});
  log.textContent = '';
});
init();
</script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    #[test]
    fn session_cookie_is_found_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; session_id=abc123; lang=en"),
        );
        assert_eq!(session_cookie(&headers).as_deref(), Some("abc123"));
    }

    #[test]
    fn blank_or_missing_cookie_is_none() {
        let mut headers = HeaderMap::new();
        assert!(session_cookie(&headers).is_none());

        headers.insert(COOKIE, HeaderValue::from_static("session_id="));
        assert!(session_cookie(&headers).is_none());
    }
}
