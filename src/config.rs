//! Environment and base URL resolution.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every API call resolves its base URL at call time, because a deployed
//! bundle can have the URL injected after startup (the browser's
//! `window.ENV.API_URL`). The runtime slot therefore wins over anything read
//! at build or process start.
//!
//! Precedence:
//! 1. `RuntimeEnv` override
//! 2. `TALENTBASE_API_URL` (process env, or baked in at compile time)
//! 3. `http://localhost:8000` in development
//! 4. `ConfigError::MissingApiUrl` in production

use std::str::FromStr;
use std::sync::{Arc, PoisonError, RwLock};

use crate::routes;

pub const DEV_API_URL: &str = "http://localhost:8000";
pub const DEV_APP_URL: &str = "http://localhost:3000";

const COMPILED_API_URL: Option<&str> = option_env!("TALENTBASE_API_URL");

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("API_URL not configured! Set TALENTBASE_API_URL or inject a runtime API_URL")]
    MissingApiUrl,
    #[error("APP_URL not configured! Set TALENTBASE_APP_URL")]
    MissingAppUrl,
    #[error("unsupported TALENTBASE_ENV: {0}")]
    UnknownMode(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BuildMode {
    #[default]
    Development,
    Production,
}

/// Runtime-injected configuration slot. Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct RuntimeEnv {
    api_url: Arc<RwLock<Option<String>>>,
}

impl RuntimeEnv {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_api_url(&self, url: impl Into<String>) {
        let url = url.into();
        let mut slot = self.api_url.write().unwrap_or_else(PoisonError::into_inner);
        *slot = if url.trim().is_empty() { None } else { Some(url) };
    }

    pub fn clear_api_url(&self) {
        *self.api_url.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    #[must_use]
    pub fn api_url(&self) -> Option<String> {
        self.api_url
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ApiConfig {
    /// Build-time API URL (`TALENTBASE_API_URL`).
    pub build_api_url: Option<String>,
    pub app_base_url: Option<String>,
    pub mode: BuildMode,
    pub runtime: RuntimeEnv,
}

impl ApiConfig {
    /// Build config from environment variables.
    ///
    /// Optional:
    /// - `TALENTBASE_ENV`: `development` (default) or `production`/`prod`
    /// - `TALENTBASE_API_URL`: backend base URL; falls back to the value
    ///   present at compile time
    /// - `TALENTBASE_APP_URL`: public app origin used for share links
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownMode`] for an unrecognized `TALENTBASE_ENV`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ApiConfig::from_env`] with an injectable variable source.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownMode`] for an unrecognized `TALENTBASE_ENV`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mode = parse_mode(lookup("TALENTBASE_ENV").as_deref())?;
        let build_api_url = non_empty(lookup("TALENTBASE_API_URL"))
            .or_else(|| non_empty(COMPILED_API_URL.map(str::to_owned)));
        let app_base_url = non_empty(lookup("TALENTBASE_APP_URL"));
        Ok(Self { build_api_url, app_base_url, mode, runtime: RuntimeEnv::new() })
    }

    /// Development config pinned to one backend URL.
    #[must_use]
    pub fn with_api_url(api_url: impl Into<String>) -> Self {
        Self { build_api_url: Some(api_url.into()), ..Self::default() }
    }

    /// Fail-fast startup check.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingApiUrl`] in production when no API URL
    /// is available from any source.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.resolve_api_base_url().map(|_| ())
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::MissingApiUrl`] in production without any URL.
    pub fn resolve_api_base_url(&self) -> Result<String, ConfigError> {
        if let Some(url) = self.runtime.api_url() {
            return Ok(trim_base(&url));
        }
        if let Some(url) = &self.build_api_url {
            return Ok(trim_base(url));
        }
        match self.mode {
            BuildMode::Development => Ok(DEV_API_URL.to_owned()),
            BuildMode::Production => Err(ConfigError::MissingApiUrl),
        }
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::MissingAppUrl`] in production without `TALENTBASE_APP_URL`.
    pub fn resolve_app_base_url(&self) -> Result<String, ConfigError> {
        match (&self.app_base_url, self.mode) {
            (Some(url), _) => Ok(trim_base(url)),
            (None, BuildMode::Development) => Ok(DEV_APP_URL.to_owned()),
            (None, BuildMode::Production) => Err(ConfigError::MissingAppUrl),
        }
    }

    /// Full API URL for an endpoint path.
    ///
    /// # Errors
    ///
    /// Propagates base URL resolution failures.
    pub fn api_url(&self, endpoint: &str) -> Result<String, ConfigError> {
        Ok(format!("{}{endpoint}", self.resolve_api_base_url()?))
    }

    /// Public share link for a candidate profile token.
    ///
    /// # Errors
    ///
    /// Propagates app base URL resolution failures.
    pub fn share_link(&self, token: &str) -> Result<String, ConfigError> {
        Ok(format!("{}{}", self.resolve_app_base_url()?, routes::share_candidate(token)))
    }
}

fn trim_base(url: &str) -> String {
    url.trim().trim_end_matches('/').to_owned()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_mode(raw: Option<&str>) -> Result<BuildMode, ConfigError> {
    match raw.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        None | Some("" | "development" | "dev") => Ok(BuildMode::Development),
        Some("production" | "prod") => Ok(BuildMode::Production),
        Some(other) => Err(ConfigError::UnknownMode(other.to_owned())),
    }
}

pub(crate) fn env_parse<T: FromStr + Copy>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

pub(crate) fn env_bool(key: &str) -> Option<bool> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
