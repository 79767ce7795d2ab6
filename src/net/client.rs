//! Dual-context API client.
//!
//! SYSTEM CONTEXT
//! ==============
//! The same endpoints are called from two places: an interactive session
//! that holds the httpOnly `auth_token` cookie, and server-side handlers that
//! already extracted the token and must forward it explicitly. One
//! `ApiClient` covers both; the credential strategy is fixed at construction.
//!
//! ERROR HANDLING
//! ==============
//! Non-2xx responses become `RequestError::Api` carrying the parsed body
//! (JSON when the content type says so, otherwise raw text). Transport
//! failures become `RequestError::Network`. Nothing here retries or times
//! out beyond reqwest's defaults.

use std::fmt;
use std::sync::Arc;

use reqwest::header::{CONTENT_TYPE, HeaderValue};
use reqwest::multipart::Form;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use super::error::{ApiError, RequestError};
use crate::config::{ApiConfig, ConfigError};

/// Name of the session cookie set by the backend on login.
pub const AUTH_COOKIE_NAME: &str = "auth_token";

#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Cookie store enabled; the session cookie rides along automatically.
    Browser,
    /// `Authorization: Bearer <token>` on every request.
    Bearer(String),
    /// Server context without a token.
    Anonymous,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Browser => f.write_str("Browser"),
            Self::Bearer(_) => f.write_str("Bearer(<redacted>)"),
            Self::Anonymous => f.write_str("Anonymous"),
        }
    }
}

/// Called with every `ApiError` before it is returned.
pub type ErrorHook = Arc<dyn Fn(&ApiError) + Send + Sync>;

/// Per-request query parameters and extra headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    pub params: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
}

impl RequestOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.push((key.into(), value.to_string()));
        self
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    config: ApiConfig,
    credentials: Credentials,
    on_error: Option<ErrorHook>,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("config", &self.config)
            .field("credentials", &self.credentials)
            .field("on_error", &self.on_error.is_some())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Interactive-session client with a cookie store.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::ClientBuild`] if the HTTP client fails to build.
    pub fn browser(config: ApiConfig) -> Result<Self, RequestError> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .map_err(|e| RequestError::ClientBuild(e.to_string()))?;
        Ok(Self { http, config, credentials: Credentials::Browser, on_error: None })
    }

    /// Server-side client forwarding an explicit token.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::ClientBuild`] if the HTTP client fails to build.
    pub fn server(config: ApiConfig, token: Option<String>) -> Result<Self, RequestError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| RequestError::ClientBuild(e.to_string()))?;
        let credentials = match token {
            Some(token) if !token.is_empty() => Credentials::Bearer(token),
            _ => Credentials::Anonymous,
        };
        Ok(Self { http, config, credentials, on_error: None })
    }

    /// Same connection pool, different token.
    #[must_use]
    pub fn with_token(&self, token: impl Into<String>) -> Self {
        Self { credentials: Credentials::Bearer(token.into()), ..self.clone() }
    }

    #[must_use]
    pub fn with_error_hook(mut self, hook: impl Fn(&ApiError) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(hook));
        self
    }

    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    #[must_use]
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Underlying HTTP client, shared with direct-to-storage uploads.
    #[must_use]
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Base URL + endpoint, plus a form-urlencoded query when params exist.
    ///
    /// # Errors
    ///
    /// Propagates base URL resolution failures.
    pub fn build_url(&self, endpoint: &str, params: &[(String, String)]) -> Result<String, ConfigError> {
        let url = self.config.api_url(endpoint)?;
        if params.is_empty() {
            return Ok(url);
        }
        let query = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(params)
            .finish();
        Ok(format!("{url}?{query}"))
    }

    /// Send with URL, extra headers and credentials applied; non-2xx
    /// statuses become `RequestError::Api` after the error hook runs.
    async fn send(
        &self,
        method: Method,
        endpoint: &str,
        options: &RequestOptions,
        body: impl FnOnce(RequestBuilder) -> RequestBuilder,
    ) -> Result<Response, RequestError> {
        let url = self.build_url(endpoint, &options.params)?;
        let mut request = self.http.request(method.clone(), &url);
        for (name, value) in &options.headers {
            request = request.header(name, value);
        }
        if let Credentials::Bearer(token) = &self.credentials {
            request = request.bearer_auth(token);
        }

        let response = body(request).send().await.map_err(|e| {
            warn!(%method, endpoint, error = %e, "api request failed to send");
            RequestError::Network(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            let err = read_api_error(response).await;
            warn!(%method, endpoint, status = err.status, "api request returned error status");
            if let Some(hook) = &self.on_error {
                hook(&err);
            }
            return Err(err.into());
        }
        debug!(%method, endpoint, status = status.as_u16(), "api request ok");
        Ok(response)
    }

    /// Send a request; `Ok(None)` for 204 or an empty 2xx body.
    ///
    /// # Errors
    ///
    /// See [`RequestError`].
    pub async fn request_opt<T, B>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&B>,
        options: &RequestOptions,
    ) -> Result<Option<T>, RequestError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let response = self
            .send(method, endpoint, options, |request| {
                let request = request.header(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                match body {
                    Some(body) => request.json(body),
                    None => request,
                }
            })
            .await?;
        decode_body(response).await
    }

    /// Like [`ApiClient::request_opt`] but an empty response must
    /// deserialize from `null` (fine for `Option<_>`, `()`, `Value`).
    ///
    /// # Errors
    ///
    /// See [`RequestError`].
    pub async fn request<T, B>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&B>,
        options: &RequestOptions,
    ) -> Result<T, RequestError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        match self.request_opt(method, endpoint, body, options).await? {
            Some(value) => Ok(value),
            None => serde_json::from_value(Value::Null)
                .map_err(|_| RequestError::Decode(format!("empty response from {endpoint}"))),
        }
    }

    /// # Errors
    ///
    /// See [`RequestError`].
    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str, options: &RequestOptions) -> Result<T, RequestError> {
        self.request(Method::GET, endpoint, None::<&()>, options).await
    }

    /// # Errors
    ///
    /// See [`RequestError`].
    pub async fn get_opt<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: &RequestOptions,
    ) -> Result<Option<T>, RequestError> {
        self.request_opt(Method::GET, endpoint, None::<&()>, options).await
    }

    /// # Errors
    ///
    /// See [`RequestError`].
    pub async fn post<T, B>(&self, endpoint: &str, body: &B, options: &RequestOptions) -> Result<T, RequestError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::POST, endpoint, Some(body), options).await
    }

    /// # Errors
    ///
    /// See [`RequestError`].
    pub async fn post_opt<T, B>(
        &self,
        endpoint: &str,
        body: Option<&B>,
        options: &RequestOptions,
    ) -> Result<Option<T>, RequestError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request_opt(Method::POST, endpoint, body, options).await
    }

    /// # Errors
    ///
    /// See [`RequestError`].
    pub async fn put<T, B>(&self, endpoint: &str, body: &B, options: &RequestOptions) -> Result<T, RequestError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::PUT, endpoint, Some(body), options).await
    }

    /// # Errors
    ///
    /// See [`RequestError`].
    pub async fn patch<T, B>(&self, endpoint: &str, body: &B, options: &RequestOptions) -> Result<T, RequestError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::PATCH, endpoint, Some(body), options).await
    }

    /// # Errors
    ///
    /// See [`RequestError`].
    pub async fn delete<T: DeserializeOwned>(&self, endpoint: &str, options: &RequestOptions) -> Result<T, RequestError> {
        self.request(Method::DELETE, endpoint, None::<&()>, options).await
    }

    /// # Errors
    ///
    /// See [`RequestError`].
    pub async fn delete_opt<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: &RequestOptions,
    ) -> Result<Option<T>, RequestError> {
        self.request_opt(Method::DELETE, endpoint, None::<&()>, options).await
    }

    /// POST a multipart form. reqwest sets the boundary content type.
    ///
    /// # Errors
    ///
    /// See [`RequestError`].
    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        form: Form,
        options: &RequestOptions,
    ) -> Result<T, RequestError> {
        let response = self.send(Method::POST, endpoint, options, |request| request.multipart(form)).await?;
        decode_body(response)
            .await?
            .ok_or_else(|| RequestError::Decode(format!("empty response from {endpoint}")))
    }

    /// GET a non-JSON resource (file downloads) as raw bytes.
    ///
    /// # Errors
    ///
    /// See [`RequestError`].
    pub async fn get_bytes(&self, endpoint: &str, options: &RequestOptions) -> Result<Vec<u8>, RequestError> {
        let response = self.send(Method::GET, endpoint, options, |request| request).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| RequestError::Network(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

/// `None` for 204 or an empty body, otherwise JSON.
async fn decode_body<T: DeserializeOwned>(response: Response) -> Result<Option<T>, RequestError> {
    if response.status() == StatusCode::NO_CONTENT {
        return Ok(None);
    }
    let bytes = response
        .bytes()
        .await
        .map_err(|e| RequestError::Network(e.to_string()))?;
    if bytes.is_empty() {
        return Ok(None);
    }
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|e| RequestError::Decode(e.to_string()))
}

async fn read_api_error(response: reqwest::Response) -> ApiError {
    let status = response.status();
    let status_text = status.canonical_reason().unwrap_or_default().to_owned();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    let text = response.text().await.unwrap_or_default();
    ApiError::new(status.as_u16(), status_text, parse_error_body(content_type.as_deref(), text))
}

/// JSON when the content type says so and it parses, otherwise raw text.
pub(crate) fn parse_error_body(content_type: Option<&str>, text: String) -> Option<Value> {
    if text.is_empty() {
        return None;
    }
    if content_type.is_some_and(|ct| ct.contains("application/json")) {
        if let Ok(value) = serde_json::from_str(&text) {
            return Some(value);
        }
    }
    Some(Value::String(text))
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
