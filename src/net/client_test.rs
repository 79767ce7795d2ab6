use std::collections::HashMap;
use std::sync::Mutex;

use axum::Json;
use axum::extract::Query;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use serde_json::json;

use super::*;
use crate::test_support::{browser_client, server_client, spawn_backend};

async fn echo_query(Query(query): Query<HashMap<String, String>>) -> Json<Value> {
    Json(json!({ "query": query }))
}

async fn echo_auth(headers: HeaderMap) -> Json<Value> {
    let auth = headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()).map(str::to_owned);
    let cookie = headers.get(header::COOKIE).and_then(|v| v.to_str().ok()).map(str::to_owned);
    Json(json!({ "authorization": auth, "cookie": cookie }))
}

fn router() -> axum::Router {
    axum::Router::new()
        .route("/echo", get(echo_query))
        .route("/whoami", get(echo_auth))
        .route("/empty", post(|| async { StatusCode::NO_CONTENT }))
        .route(
            "/login",
            post(|| async {
                (StatusCode::OK, [(header::SET_COOKIE, "auth_token=session-1; Path=/; HttpOnly")], Json(json!({"ok": true})))
            }),
        )
        .route(
            "/denied",
            get(|| async { (StatusCode::UNAUTHORIZED, Json(json!({"error": "Invalid credentials"}))) }),
        )
        .route(
            "/broken",
            get(|| async { (StatusCode::BAD_GATEWAY, "upstream exploded").into_response() }),
        )
        .route(
            "/created",
            post(|Json(body): Json<Value>| async move { (StatusCode::CREATED, Json(json!({"received": body}))) }),
        )
}

// =============================================================================
// URL building
// =============================================================================

#[test]
fn build_url_without_params_has_no_query() {
    let client = server_client("https://api.test/", "t");
    assert_eq!(client.build_url("/api/v1/jobs", &[]).unwrap(), "https://api.test/api/v1/jobs");
}

#[test]
fn build_url_encodes_params_in_order() {
    let client = server_client("https://api.test", "t");
    let options = RequestOptions::new().param("search", "john@example.com").param("page", 2);
    assert_eq!(
        client.build_url("/api/v1/admin/users", &options.params).unwrap(),
        "https://api.test/api/v1/admin/users?search=john%40example.com&page=2"
    );
}

#[test]
fn build_url_follows_runtime_override() {
    let client = server_client("https://build.test", "t");
    client.config().runtime.set_api_url("https://runtime.test");
    assert_eq!(client.build_url("/x", &[]).unwrap(), "https://runtime.test/x");
}

#[test]
fn server_without_token_is_anonymous() {
    let client = ApiClient::server(ApiConfig::default(), None).unwrap();
    assert_eq!(client.credentials(), &Credentials::Anonymous);
    let client = client.with_token("abc");
    assert_eq!(client.credentials(), &Credentials::Bearer("abc".into()));
}

#[test]
fn debug_redacts_token() {
    let client = server_client("https://api.test", "super-secret");
    assert!(!format!("{client:?}").contains("super-secret"));
}

#[test]
fn parse_error_body_by_content_type() {
    assert_eq!(parse_error_body(Some("application/json; charset=utf-8"), r#"{"a":1}"#.into()), Some(json!({"a": 1})));
    assert_eq!(parse_error_body(Some("text/html"), "<h1>502</h1>".into()), Some(json!("<h1>502</h1>")));
    assert_eq!(parse_error_body(Some("application/json"), "not json".into()), Some(json!("not json")));
    assert_eq!(parse_error_body(None, String::new()), None);
}

// =============================================================================
// Requests against a fake backend
// =============================================================================

#[tokio::test]
async fn get_sends_query_params() {
    let base = spawn_backend(router()).await;
    let client = server_client(&base, "t");
    let options = RequestOptions::new().param("role", "company").param("page", 3);
    let body: Value = client.get("/echo", &options).await.unwrap();
    assert_eq!(body["query"]["role"], "company");
    assert_eq!(body["query"]["page"], "3");
}

#[tokio::test]
async fn server_client_sends_bearer_token() {
    let base = spawn_backend(router()).await;
    let client = server_client(&base, "tok-123");
    let body: Value = client.get("/whoami", &RequestOptions::default()).await.unwrap();
    assert_eq!(body["authorization"], "Bearer tok-123");
    assert_eq!(body["cookie"], Value::Null);
}

#[tokio::test]
async fn browser_client_replays_session_cookie() {
    let base = spawn_backend(router()).await;
    let base = base.replace("127.0.0.1", "localhost");
    let client = browser_client(&base);

    let _: Value = client.post("/login", &json!({}), &RequestOptions::default()).await.unwrap();
    let body: Value = client.get("/whoami", &RequestOptions::default()).await.unwrap();
    assert_eq!(body["cookie"], "auth_token=session-1");
    assert_eq!(body["authorization"], Value::Null);
}

#[tokio::test]
async fn no_content_yields_none() {
    let base = spawn_backend(router()).await;
    let client = server_client(&base, "t");
    let out: Option<Value> = client.post_opt("/empty", Some(&json!({})), &RequestOptions::default()).await.unwrap();
    assert!(out.is_none());

    client.post::<(), _>("/empty", &json!({}), &RequestOptions::default()).await.unwrap();
}

#[tokio::test]
async fn post_returns_parsed_json() {
    let base = spawn_backend(router()).await;
    let client = server_client(&base, "t");
    let out: Value = client.post("/created", &json!({"name": "x"}), &RequestOptions::default()).await.unwrap();
    assert_eq!(out["received"]["name"], "x");
}

#[tokio::test]
async fn json_error_body_is_parsed() {
    let base = spawn_backend(router()).await;
    let client = server_client(&base, "t");
    let err = client.get::<Value>("/denied", &RequestOptions::default()).await.unwrap_err();
    let api = err.api().unwrap();
    assert_eq!(api.status, 401);
    assert_eq!(api.status_text, "Unauthorized");
    assert_eq!(api.server_message().as_deref(), Some("Invalid credentials"));
}

#[tokio::test]
async fn text_error_body_is_kept_as_string() {
    let base = spawn_backend(router()).await;
    let client = server_client(&base, "t");
    let err = client.get::<Value>("/broken", &RequestOptions::default()).await.unwrap_err();
    assert_eq!(err.status(), Some(502));
    assert_eq!(err.api().unwrap().data, Some(json!("upstream exploded")));
}

#[tokio::test]
async fn error_hook_sees_every_api_error() {
    let base = spawn_backend(router()).await;
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let client = server_client(&base, "t").with_error_hook(move |err| sink.lock().unwrap().push(err.status));

    let _ = client.get::<Value>("/denied", &RequestOptions::default()).await;
    let _ = client.get::<Value>("/broken", &RequestOptions::default()).await;
    let _: Value = client.get("/echo", &RequestOptions::default()).await.unwrap();

    assert_eq!(*seen.lock().unwrap(), vec![401, 502]);
}

#[tokio::test]
async fn unreachable_backend_is_network_error() {
    let client = server_client("http://127.0.0.1:9", "t");
    let err = client.get::<Value>("/echo", &RequestOptions::default()).await.unwrap_err();
    assert!(matches!(err, RequestError::Network(_)));
}

#[tokio::test]
async fn missing_base_url_in_production_is_config_error() {
    let config = ApiConfig { mode: crate::config::BuildMode::Production, ..ApiConfig::default() };
    let client = ApiClient::server(config, None).unwrap();
    let err = client.get::<Value>("/echo", &RequestOptions::default()).await.unwrap_err();
    assert!(matches!(err, RequestError::Config(ConfigError::MissingApiUrl)));
}
