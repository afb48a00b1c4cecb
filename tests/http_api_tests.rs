use std::net::SocketAddr;
use std::sync::Arc;

use reqwest::header::{COOKIE, SET_COOKIE};
use reqwest::StatusCode;
use serde_json::{json, Value};

use scenariochat::connector::http::{rest, web, AppState};
use scenariochat::{
    ClientSettings, Container, ContainerConfig, MockBackend, OllamaConfig, SessionLimits,
};

fn config() -> ContainerConfig {
    ContainerConfig {
        ollama: OllamaConfig::default(),
        mock_backend: true,
        client: ClientSettings::default(),
        session_limits: SessionLimits::default(),
        scenarios_file: None,
    }
}

async fn spawn(app: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn rest_server(backend: MockBackend) -> String {
    let container = Container::with_backend(config(), Arc::new(backend))
        .await
        .unwrap();
    spawn(rest::router(AppState::new(Arc::new(container)))).await
}

async fn web_server() -> String {
    let container = Container::new(config()).await.unwrap();
    spawn(web::router(AppState::new(Arc::new(container)))).await
}

#[tokio::test]
async fn health_reports_backend_and_sessions() {
    let base = rest_server(MockBackend::new()).await;

    let body: Value = reqwest::get(format!("{}/health", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["status"], "healthy");
    assert_eq!(body["ollama_connected"], true);
    assert_eq!(body["active_sessions"], 0);
}

#[tokio::test]
async fn scenarios_can_be_listed_fetched_and_added() {
    let base = rest_server(MockBackend::new()).await;
    let client = reqwest::Client::new();

    let list: Value = client
        .get(format!("{}/api/scenarios", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(list["count"], 6);

    let missing = client
        .get(format!("{}/api/scenarios/pirate", base))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    let created = client
        .post(format!("{}/api/scenarios", base))
        .json(&json!({"key": "pirate", "name": "Pirate", "system_prompt": "Arr."}))
        .send()
        .await
        .unwrap();
    assert_eq!(created.status(), StatusCode::CREATED);

    let fetched: Value = client
        .get(format!("{}/api/scenarios/pirate", base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched["scenario"]["system_prompt"], "Arr.");
    assert_eq!(fetched["scenario_id"], "pirate");
}

#[tokio::test]
async fn chat_creates_a_session_and_keeps_history_on_it() {
    let base = rest_server(MockBackend::new()).await;
    let client = reqwest::Client::new();

    let first: Value = client
        .post(format!("{}/api/chat", base))
        .json(&json!({"message": "hello", "use_history": true}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(first["success"], true);
    assert_eq!(first["response"], "Echo: hello");
    let session_id = first["session_id"].as_str().unwrap().to_string();
    assert_eq!(session_id.len(), 32);

    client
        .post(format!("{}/api/chat", base))
        .json(&json!({"message": "again", "use_history": true, "session_id": session_id}))
        .send()
        .await
        .unwrap();

    let session: Value = client
        .get(format!("{}/api/session/{}", base, session_id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(session["message_count"], 4);
    assert_eq!(session["history"][2]["content"], "again");

    let cleared = client
        .delete(format!("{}/api/session/{}/history", base, session_id))
        .send()
        .await
        .unwrap();
    assert_eq!(cleared.status(), StatusCode::OK);

    let deleted = client
        .delete(format!("{}/api/session/{}", base, session_id))
        .send()
        .await
        .unwrap();
    assert_eq!(deleted.status(), StatusCode::OK);

    let gone = client
        .get(format!("{}/api/session/{}", base, session_id))
        .send()
        .await
        .unwrap();
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_chat_bodies_are_rejected() {
    let base = rest_server(MockBackend::new()).await;
    let client = reqwest::Client::new();

    for body in [json!({}), json!({"message": "   "})] {
        let response = client
            .post(format!("{}/api/chat", base))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["success"], false);
    }
}

#[tokio::test]
async fn upstream_failures_map_to_gateway_statuses() {
    let base = rest_server(MockBackend::unreachable()).await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/chat", base))
        .json(&json!({"message": "hello"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn stream_emits_sse_chunks() {
    let base = rest_server(MockBackend::new()).await;

    let response = reqwest::Client::new()
        .post(format!("{}/api/chat/stream", base))
        .json(&json!({"message": "hi there"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.unwrap();
    assert!(body.contains("data: Echo: "));
    assert!(body.contains("data: there"));
}

#[tokio::test]
async fn batch_isolates_failures() {
    let base = rest_server(MockBackend::new().failing_on("explode")).await;
    let client = reqwest::Client::new();

    let report: Value = client
        .post(format!("{}/api/batch", base))
        .json(&json!({"messages": ["one", "explode", "three"]}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(report["total_messages"], 3);
    assert_eq!(report["successful"], 2);
    assert_eq!(report["failed"], 1);
    assert_eq!(report["results"][1]["success"], false);

    let empty = client
        .post(format!("{}/api/batch", base))
        .json(&json!({"messages": []}))
        .send()
        .await
        .unwrap();
    assert_eq!(empty.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn models_and_unknown_routes() {
    let base = rest_server(MockBackend::new()).await;

    let models: Value = reqwest::get(format!("{}/api/models", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(models["current_model"], "mock-model");
    assert_eq!(models["count"], 1);

    let missing = reqwest::get(format!("{}/api/nope", base)).await.unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    let body: Value = missing.json().await.unwrap();
    assert_eq!(body["error"], "Endpoint not found");
}

#[tokio::test]
async fn web_session_is_bound_to_cookie() {
    let base = web_server().await;
    let client = reqwest::Client::new();

    let no_cookie = client
        .post(format!("{}/api/chat", base))
        .json(&json!({"message": "hi"}))
        .send()
        .await
        .unwrap();
    assert_eq!(no_cookie.status(), StatusCode::BAD_REQUEST);

    let index = client.get(format!("{}/", base)).send().await.unwrap();
    let set_cookie = index
        .headers()
        .get(SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    let cookie = set_cookie.split(';').next().unwrap().to_string();
    assert!(cookie.starts_with("session_id="));

    let reply: Value = client
        .post(format!("{}/api/chat", base))
        .header(COOKIE, &cookie)
        .json(&json!({"message": "hi", "use_history": true}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(reply["response"], "Echo: hi");

    let history: Value = client
        .get(format!("{}/api/history", base))
        .header(COOKIE, &cookie)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(history["history"].as_array().unwrap().len(), 2);

    client
        .delete(format!("{}/api/history", base))
        .header(COOKIE, &cookie)
        .send()
        .await
        .unwrap();
    let history: Value = client
        .get(format!("{}/api/history", base))
        .header(COOKIE, &cookie)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(history["history"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn web_index_keeps_existing_cookie() {
    let base = web_server().await;

    let index = reqwest::Client::new()
        .get(format!("{}/", base))
        .header(COOKIE, "session_id=abc")
        .send()
        .await
        .unwrap();

    assert_eq!(index.status(), StatusCode::OK);
    assert!(index.headers().get(SET_COOKIE).is_none());
    assert!(index.text().await.unwrap().contains("<title>ScenarioChat</title>"));
}
