//! Application context.
//!
//! Everything that would otherwise be a process-wide singleton (API client,
//! storage, toast queue, cached session) lives here and is handed to each
//! flow explicitly. Clones share the same underlying state.

use crate::auth::{AuthCache, AuthService, AuthSession};
use crate::config::ApiConfig;
use crate::draft::{DraftAutoSave, DraftOptions, FormDraft};
use crate::net::{ApiClient, RequestError, SubmitError};
use crate::storage::SharedStorage;
use crate::toast::ToastQueue;
use crate::upload::UploadController;

#[derive(Clone)]
pub struct AppContext {
    config: ApiConfig,
    api: ApiClient,
    storage: SharedStorage,
    toasts: ToastQueue,
    auth: AuthCache,
}

impl AppContext {
    /// Interactive context: cookie-backed client. A 401 from any call drops
    /// the cached user so the UI stops presenting a dead session.
    ///
    /// # Errors
    ///
    /// Fails only if the HTTP client cannot be built.
    pub fn browser(config: ApiConfig, storage: SharedStorage) -> Result<Self, RequestError> {
        let auth = AuthCache::new(storage.clone());
        let on_unauthorized = auth.clone();
        let api = ApiClient::browser(config.clone())?.with_error_hook(move |error| {
            if error.is_unauthorized() {
                on_unauthorized.clear();
            }
        });
        Ok(Self { config, api, storage, toasts: ToastQueue::from_env(), auth })
    }

    /// Server-side or scripted context forwarding an explicit token.
    ///
    /// # Errors
    ///
    /// Fails only if the HTTP client cannot be built.
    pub fn server(config: ApiConfig, token: Option<String>, storage: SharedStorage) -> Result<Self, RequestError> {
        let api = ApiClient::server(config.clone(), token)?;
        let auth = AuthCache::new(storage.clone());
        Ok(Self { config, api, storage, toasts: ToastQueue::from_env(), auth })
    }

    #[must_use]
    pub fn with_toasts(mut self, toasts: ToastQueue) -> Self {
        self.toasts = toasts;
        self
    }

    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    #[must_use]
    pub fn storage(&self) -> &SharedStorage {
        &self.storage
    }

    #[must_use]
    pub fn toasts(&self) -> &ToastQueue {
        &self.toasts
    }

    #[must_use]
    pub fn auth_cache(&self) -> &AuthCache {
        &self.auth
    }

    #[must_use]
    pub fn auth_service(&self) -> AuthService {
        AuthService::new(self.api.clone(), self.auth.clone())
    }

    #[must_use]
    pub fn session(&self) -> AuthSession {
        self.auth.session()
    }

    /// Draft persisted in this context's storage.
    pub fn draft(&self, key: &str, initial: FormDraft) -> DraftAutoSave {
        DraftAutoSave::new(self.storage.clone(), key, initial, DraftOptions::from_env())
    }

    #[must_use]
    pub fn uploader(&self) -> UploadController {
        UploadController::new(self.api.clone())
    }

    /// Error toast for a failed submission; field errors get the generic
    /// "check the highlighted fields" text.
    pub fn notify_error(&self, error: &SubmitError) -> String {
        self.toasts.error(error.to_string(), None, None)
    }

    pub fn notify_success(&self, message: impl Into<String>) -> String {
        self.toasts.success(message, None, None)
    }
}

#[cfg(test)]
#[path = "context_test.rs"]
mod tests;
