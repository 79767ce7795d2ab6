//! Error types for the API boundary.
//!
//! DESIGN
//! ======
//! `ApiError` is the raw non-2xx response. `SubmitError` is what forms see:
//! it is decided once, here, so that callers never sniff the error payload
//! shape to tell field errors from a general message.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::config::ConfigError;
use crate::messages;

/// Non-2xx response from the backend.
///
/// `data` holds the parsed JSON body, or the raw body text as a JSON string
/// when the response was not JSON.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("API Error {status}: {status_text}")]
pub struct ApiError {
    pub status: u16,
    pub status_text: String,
    pub data: Option<Value>,
}

impl ApiError {
    #[must_use]
    pub fn new(status: u16, status_text: impl Into<String>, data: Option<Value>) -> Self {
        Self { status, status_text: status_text.into(), data }
    }

    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }

    #[must_use]
    pub fn is_forbidden(&self) -> bool {
        self.status == 403
    }

    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        self.status == 429
    }

    /// Per-field messages from `{"errors": {"field": ["msg", ...] | "msg"}}`.
    ///
    /// Arrays contribute their first message. `detail` is not a field.
    #[must_use]
    pub fn field_errors(&self) -> BTreeMap<String, String> {
        let Some(Value::Object(errors)) = self.data.as_ref().and_then(|d| d.get("errors")) else {
            return BTreeMap::new();
        };
        errors
            .iter()
            .filter(|(field, _)| field.as_str() != "detail")
            .filter_map(|(field, value)| first_message(value).map(|msg| (field.clone(), msg)))
            .collect()
    }

    /// `errors.detail`, falling back to a top-level `detail`.
    #[must_use]
    pub fn detail(&self) -> Option<String> {
        let data = self.data.as_ref()?;
        data.get("errors")
            .and_then(|errors| errors.get("detail"))
            .and_then(first_message)
            .or_else(|| data.get("detail").and_then(first_message))
    }

    /// Top-level `error` string, used by the login endpoint.
    #[must_use]
    pub fn server_message(&self) -> Option<String> {
        self.data
            .as_ref()?
            .get("error")
            .and_then(Value::as_str)
            .filter(|msg| !msg.is_empty())
            .map(str::to_owned)
    }
}

fn first_message(value: &Value) -> Option<String> {
    match value {
        Value::String(msg) if !msg.is_empty() => Some(msg.clone()),
        Value::Array(items) => items.iter().find_map(first_message),
        _ => None,
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    /// The request never produced an HTTP response.
    #[error("network error: {0}")]
    Network(String),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to decode response: {0}")]
    Decode(String),
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(String),
}

impl RequestError {
    #[must_use]
    pub fn api(&self) -> Option<&ApiError> {
        match self {
            Self::Api(err) => Some(err),
            _ => None,
        }
    }

    #[must_use]
    pub fn status(&self) -> Option<u16> {
        self.api().map(|err| err.status)
    }
}

/// Submission failure as presented to a form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    /// Field-level messages, with an optional general message alongside.
    #[error("{}", .message.as_deref().unwrap_or(messages::VALIDATION_FAILED))]
    Validation { fields: BTreeMap<String, String>, message: Option<String> },
    #[error("{message}")]
    General { message: String },
}

impl SubmitError {
    #[must_use]
    pub fn general(message: impl Into<String>) -> Self {
        Self::General { message: message.into() }
    }

    #[must_use]
    pub fn validation(fields: BTreeMap<String, String>) -> Self {
        Self::Validation { fields, message: None }
    }

    #[must_use]
    pub fn fields(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            Self::Validation { fields, .. } => Some(fields),
            Self::General { .. } => None,
        }
    }

    /// General message, if any.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Validation { message, .. } => message.as_deref(),
            Self::General { message } => Some(message),
        }
    }
}

impl From<ApiError> for SubmitError {
    fn from(err: ApiError) -> Self {
        if err.is_unauthorized() {
            return Self::general(err.server_message().unwrap_or_else(|| messages::INVALID_CREDENTIALS.to_owned()));
        }
        if err.is_rate_limited() {
            return Self::general(messages::RATE_LIMIT_EXCEEDED);
        }

        let fields = err.field_errors();
        let detail = err.detail();
        if !fields.is_empty() {
            return Self::Validation { fields, message: detail };
        }
        if let Some(detail) = detail {
            return Self::general(detail);
        }
        if err.is_forbidden() {
            return Self::general(err.server_message().unwrap_or_else(|| messages::FORBIDDEN.to_owned()));
        }
        Self::general(messages::SERVER_ERROR)
    }
}

impl SubmitError {
    /// For one-shot actions that show a single message: the server `error`
    /// string when present, otherwise `fallback`.
    #[must_use]
    pub fn or_fallback(err: &RequestError, fallback: &str) -> Self {
        let message = err.api().and_then(ApiError::server_message);
        Self::general(message.unwrap_or_else(|| fallback.to_owned()))
    }
}

impl From<RequestError> for SubmitError {
    fn from(err: RequestError) -> Self {
        match err {
            RequestError::Api(api) => Self::from(api),
            RequestError::Network(_) => Self::general(messages::NETWORK_ERROR),
            RequestError::Config(config) => Self::general(config.to_string()),
            RequestError::Decode(_) | RequestError::ClientBuild(_) => Self::general(messages::SERVER_ERROR),
        }
    }
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
