use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use async_stream::stream;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, Sse};
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use futures_util::{Stream, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use super::{ApiError, AppState};
use crate::connector::api::controller::report_json;
use crate::connector::api::Container;
use crate::domain::{ChatOptions, DEFAULT_SCENARIO};

type ApiResult = std::result::Result<Json<Value>, ApiError>;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: Option<String>,
    pub scenario: Option<String>,
    pub session_id: Option<String>,
    #[serde(default)]
    pub use_history: bool,
    pub temperature: Option<f32>,
}

impl ChatRequest {
    fn message(&self) -> std::result::Result<&str, ApiError> {
        let message = self
            .message
            .as_deref()
            .ok_or_else(|| ApiError::bad_request("Missing required field: message"))?
            .trim();
        if message.is_empty() {
            return Err(ApiError::bad_request("Message cannot be empty"));
        }
        Ok(message)
    }

    fn options(&self) -> ChatOptions {
        ChatOptions::new()
            .with_scenario(self.scenario.as_deref().unwrap_or(DEFAULT_SCENARIO))
            .with_history(self.use_history)
            .with_temperature(self.temperature)
    }
}

#[derive(Debug, Deserialize)]
pub struct AddScenarioRequest {
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub system_prompt: String,
    pub temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    pub messages: Option<Vec<String>>,
    pub scenario: Option<String>,
    pub temperature: Option<f32>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/scenarios", get(list_scenarios).post(add_scenario))
        .route("/api/scenarios/{id}", get(get_scenario))
        .route("/api/chat", post(chat))
        .route("/api/chat/stream", post(chat_stream))
        .route("/api/session", post(create_session))
        .route("/api/session/{id}", get(get_session).delete(delete_session))
        .route("/api/session/{id}/history", delete(clear_session_history))
        .route("/api/models", get(list_models))
        .route("/api/batch", post(batch))
        .fallback(not_found)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(container: Arc<Container>, addr: SocketAddr) -> Result<()> {
    info!("Starting REST API for model {}", container.model_name());
    super::serve(router(AppState::new(container)), addr).await
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    let connected = state.container.backend().is_reachable().await;

    Json(json!({
        "success": true,
        "status": if connected { "healthy" } else { "unhealthy" },
        "timestamp": state.now(),
        "ollama_connected": connected,
        "active_sessions": state.sessions.len().await,
        "uptime_secs": state.started_at.elapsed().as_secs(),
    }))
}

async fn list_scenarios(State(state): State<AppState>) -> ApiResult {
    let scenarios = state.container.scenarios_use_case().list().await?;

    Ok(Json(json!({
        "success": true,
        "count": scenarios.len(),
        "scenarios": scenarios,
    })))
}

async fn get_scenario(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let scenario = state
        .container
        .scenarios_use_case()
        .get(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Scenario not found"))?;

    Ok(Json(json!({
        "success": true,
        "scenario_id": id,
        "scenario": scenario,
    })))
}

async fn add_scenario(
    State(state): State<AppState>,
    payload: std::result::Result<Json<AddScenarioRequest>, JsonRejection>,
) -> std::result::Result<impl IntoResponse, ApiError> {
    let Json(request) = payload?;
    let scenario = state
        .container
        .scenarios_use_case()
        .add(
            &request.key,
            &request.name,
            &request.system_prompt,
            request.temperature,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "scenario": scenario })),
    ))
}

async fn chat(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ChatRequest>, JsonRejection>,
) -> ApiResult {
    let Json(request) = payload?;
    let message = request.message()?;

    let handle = state
        .sessions
        .get_or_create(request.session_id.as_deref())
        .await;

    let start = Instant::now();
    let reply = handle.client.chat(message, &request.options()).await?;
    let elapsed = start.elapsed().as_secs_f64();

    Ok(Json(json!({
        "success": true,
        "session_id": handle.session.id(),
        "response": reply.content,
        "scenario": reply.scenario,
        "fell_back": reply.fell_back,
        "temperature": reply.temperature,
        "elapsed_time": (elapsed * 100.0).round() / 100.0,
        "timestamp": state.now(),
    })))
}

/// `data: <chunk>` per generated piece. With a `session_id` the stream runs on
/// that session's client; otherwise on a throwaway one.
async fn chat_stream(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ChatRequest>, JsonRejection>,
) -> std::result::Result<Sse<impl Stream<Item = std::result::Result<Event, Infallible>>>, ApiError>
{
    let Json(request) = payload?;
    let message = request.message()?;

    let client = match request.session_id.as_deref() {
        Some(token) => state.sessions.get_or_create(Some(token)).await.client,
        None => Arc::new(state.container.new_client()),
    };
    let mut chunks = client.chat_stream(message, &request.options()).await?;

    let events = stream! {
        while let Some(chunk) = chunks.next().await {
            match chunk {
                Ok(text) => {
                    yield Ok::<_, Infallible>(Event::default().data(text));
                }
                Err(e) => {
                    warn!("Stream aborted: {}", e);
                    yield Ok(Event::default().event("error").data(e.to_string()));
                    break;
                }
            }
        }
    };

    Ok(Sse::new(events))
}

async fn create_session(State(state): State<AppState>) -> Json<Value> {
    let handle = state.sessions.create().await;

    Json(json!({
        "success": true,
        "session_id": handle.session.id(),
        "created_at": handle.session.created_at(),
    }))
}

async fn get_session(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    let handle = state
        .sessions
        .get(&id)
        .await
        .ok_or_else(|| ApiError::not_found("Session not found"))?;
    let history = handle.client.history().await;

    Ok(Json(json!({
        "success": true,
        "session_id": handle.session.id(),
        "created_at": handle.session.created_at(),
        "last_active": handle.session.last_active(),
        "message_count": history.len(),
        "history": history,
    })))
}

async fn delete_session(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult {
    if !state.sessions.delete(&id).await {
        return Err(ApiError::not_found("Session not found"));
    }

    Ok(Json(json!({ "success": true, "message": "Session deleted" })))
}

async fn clear_session_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult {
    let handle = state
        .sessions
        .get(&id)
        .await
        .ok_or_else(|| ApiError::not_found("Session not found"))?;
    handle.client.clear_history().await;

    Ok(Json(json!({ "success": true, "message": "History cleared" })))
}

async fn list_models(State(state): State<AppState>) -> Json<Value> {
    let models = state.container.new_client().list_models().await;

    Json(json!({
        "success": true,
        "count": models.len(),
        "models": models,
        "current_model": state.container.model_name(),
    }))
}

async fn batch(
    State(state): State<AppState>,
    payload: std::result::Result<Json<BatchRequest>, JsonRejection>,
) -> ApiResult {
    let Json(request) = payload?;
    let messages = request
        .messages
        .ok_or_else(|| ApiError::bad_request("Missing required field: messages"))?;
    if messages.is_empty() {
        return Err(ApiError::bad_request("messages must be a non-empty array"));
    }

    let options = ChatOptions::new()
        .with_scenario(request.scenario.as_deref().unwrap_or(DEFAULT_SCENARIO))
        .with_temperature(request.temperature);
    let report = state
        .container
        .batch_use_case()
        .execute(&messages, &options)
        .await;

    Ok(Json(report_json(&report)))
}

async fn not_found() -> ApiError {
    ApiError::not_found("Endpoint not found")
}
