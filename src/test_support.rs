//! Shared fixtures for in-crate tests.

use std::sync::Arc;

use crate::config::ApiConfig;
use crate::net::ApiClient;
use crate::storage::{MemoryStorage, SharedStorage};

/// Serve `router` on an ephemeral port and return its base URL.
pub(crate) async fn spawn_backend(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

pub(crate) fn memory_storage() -> SharedStorage {
    Arc::new(MemoryStorage::new())
}

pub(crate) fn server_client(base_url: &str, token: &str) -> ApiClient {
    ApiClient::server(ApiConfig::with_api_url(base_url), Some(token.to_owned())).unwrap()
}

pub(crate) fn browser_client(base_url: &str) -> ApiClient {
    ApiClient::browser(ApiConfig::with_api_url(base_url)).unwrap()
}
