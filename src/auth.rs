//! Identity, cached session user, and the login/registration flows.
//!
//! SYSTEM CONTEXT
//! ==============
//! The backend owns authentication: it sets the httpOnly `auth_token`
//! cookie and enforces every permission. The client only caches the
//! non-sensitive user record (under the `user` storage key) to decide what
//! to show. Role checks here are for UX, not security.
//!
//! Server-side handlers read the cookie from request headers and forward it
//! as a bearer token; without one they redirect to login.

use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use axum_extra::extract::cookie::{Cookie, CookieJar};

use crate::config::ApiConfig;
use crate::formatting::strip_formatting;
use crate::net::client::AUTH_COOKIE_NAME;
use crate::net::endpoints::auth as endpoints;
use crate::net::{ApiClient, RequestError, RequestOptions, SubmitError};
use crate::routes;
use crate::storage::{SharedStorage, save_json};
use crate::validation::{FormErrors, ValidationResult};
use crate::validators;

pub const USER_CACHE_KEY: &str = "user";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Candidate,
    Company,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Candidate => "candidate",
            Self::Company => "company",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    pub email: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

pub(crate) fn id_from_string_or_number<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(u64),
    }
    Ok(match Id::deserialize(deserializer)? {
        Id::Text(text) => text,
        Id::Number(number) => number.to_string(),
    })
}

// =============================================================================
// SESSION CACHE
// =============================================================================

/// Snapshot of who is signed in, for UI decisions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthSession {
    pub user: Option<User>,
}

impl AuthSession {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    #[must_use]
    pub fn has_role(&self, roles: &[Role]) -> bool {
        self.user.as_ref().is_some_and(|user| roles.contains(&user.role))
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.has_role(&[Role::Admin])
    }

    #[must_use]
    pub fn is_candidate(&self) -> bool {
        self.has_role(&[Role::Candidate])
    }

    #[must_use]
    pub fn is_company(&self) -> bool {
        self.has_role(&[Role::Company])
    }
}

#[derive(Clone)]
pub struct AuthCache {
    storage: SharedStorage,
}

impl AuthCache {
    #[must_use]
    pub fn new(storage: SharedStorage) -> Self {
        Self { storage }
    }

    /// Cached user; an unreadable record is removed.
    #[must_use]
    pub fn load(&self) -> Option<User> {
        let raw = match self.storage.get_item(USER_CACHE_KEY) {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(error = %e, "failed to read cached user");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                warn!(error = %e, "cached user is corrupt; removing");
                self.clear();
                None
            }
        }
    }

    pub fn store(&self, user: &User) {
        save_json(self.storage.as_ref(), USER_CACHE_KEY, user);
    }

    pub fn clear(&self) {
        if let Err(e) = self.storage.remove_item(USER_CACHE_KEY) {
            warn!(error = %e, "failed to clear cached user");
        }
    }

    #[must_use]
    pub fn session(&self) -> AuthSession {
        AuthSession { user: self.load() }
    }
}

// =============================================================================
// PAYLOADS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginCredentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CandidateRegistration {
    pub email: String,
    pub password: String,
    #[serde(skip)]
    pub confirm_password: String,
    pub full_name: String,
    pub phone: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CompanyRegistration {
    pub company_name: String,
    /// Sent as digits only.
    #[serde(serialize_with = "serialize_digits")]
    pub cnpj: String,
    pub email: String,
    pub password: String,
    #[serde(skip)]
    pub confirm_password: String,
    pub contact_person_name: String,
    pub contact_person_phone: String,
    #[serde(skip_serializing_if = "is_blank")]
    pub website: Option<String>,
}

fn serialize_digits<S: serde::Serializer>(value: &str, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&strip_formatting(value))
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(|v| v.trim().is_empty())
}

/// Gathers failing checks into a field-keyed validation error.
fn collect_errors<'a>(checks: impl IntoIterator<Item = (&'a str, ValidationResult)>) -> Result<(), SubmitError> {
    let fields: FormErrors = checks
        .into_iter()
        .filter(|(_, result)| !result.is_valid)
        .map(|(field, result)| {
            let message = result.error.unwrap_or_else(|| crate::messages::INVALID_FIELD.to_owned());
            (field.to_owned(), message)
        })
        .collect();
    if fields.is_empty() { Ok(()) } else { Err(SubmitError::validation(fields)) }
}

impl CandidateRegistration {
    /// # Errors
    ///
    /// `SubmitError::Validation` listing every failing field.
    pub fn validate(&self) -> Result<(), SubmitError> {
        collect_errors([
            ("email", validators::validate_email(&self.email)),
            ("password", validators::validate_password(&self.password)),
            (
                "confirm_password",
                validators::validate_password_confirmation(&self.password, &self.confirm_password),
            ),
            ("full_name", validators::validate_full_name(&self.full_name)),
            ("phone", validators::validate_phone(&self.phone)),
        ])
    }
}

impl CompanyRegistration {
    /// # Errors
    ///
    /// `SubmitError::Validation` listing every failing field.
    pub fn validate(&self) -> Result<(), SubmitError> {
        collect_errors([
            ("company_name", validators::validate_company_name(&self.company_name)),
            ("cnpj", validators::validate_cnpj(&self.cnpj)),
            ("email", validators::validate_email(&self.email)),
            ("password", validators::validate_password(&self.password)),
            (
                "confirm_password",
                validators::validate_password_confirmation(&self.password, &self.confirm_password),
            ),
            ("contact_person_name", validators::validate_contact_name(&self.contact_person_name)),
            ("contact_person_phone", validators::validate_phone(&self.contact_person_phone)),
            ("website", validators::validate_url(self.website.as_deref().unwrap_or_default(), false)),
        ])
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginResponse {
    pub user: User,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub redirect_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegistrationResponse {
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Where to send the user after a successful login or registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthOutcome {
    pub user: Option<User>,
    /// Present when the backend also returns the token in the body, for
    /// clients without a cookie jar.
    pub token: Option<String>,
    pub redirect_to: String,
    pub message: Option<String>,
}

/// Landing page right after sign-up. Companies wait for admin approval.
#[must_use]
pub fn after_registration(role: Role) -> &'static str {
    match role {
        Role::Candidate => routes::candidate::PROFILE_CREATE,
        Role::Company => routes::auth::REGISTRATION_PENDING,
        Role::Admin => routes::HOME,
    }
}

// =============================================================================
// SERVICE
// =============================================================================

#[derive(Clone)]
pub struct AuthService {
    api: ApiClient,
    cache: AuthCache,
}

impl AuthService {
    #[must_use]
    pub fn new(api: ApiClient, cache: AuthCache) -> Self {
        Self { api, cache }
    }

    #[must_use]
    pub fn cache(&self) -> &AuthCache {
        &self.cache
    }

    /// Signs in and caches the returned user. The backend's `redirect_url`
    /// wins over the role's home page.
    ///
    /// # Errors
    ///
    /// The backend's answer mapped into a `SubmitError`; a 401 becomes the
    /// invalid-credentials message.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthOutcome, SubmitError> {
        let credentials = LoginCredentials { email: email.to_owned(), password: password.to_owned() };
        let response: LoginResponse = self.api.post(endpoints::LOGIN, &credentials, &RequestOptions::new()).await?;
        self.cache.store(&response.user);
        info!(user_id = %response.user.id, role = response.user.role.as_str(), "login succeeded");
        let redirect_to = response
            .redirect_url
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| routes::home_for_role(response.user.role).to_owned());
        Ok(AuthOutcome { user: Some(response.user), token: response.token, redirect_to, message: None })
    }

    /// Validates locally, then registers a candidate.
    ///
    /// # Errors
    ///
    /// Local validation failures, or the backend's answer mapped into a
    /// `SubmitError`.
    pub async fn register_candidate(&self, form: &CandidateRegistration) -> Result<AuthOutcome, SubmitError> {
        form.validate()?;
        let response: RegistrationResponse =
            self.api.post(endpoints::REGISTER_CANDIDATE, form, &RequestOptions::new()).await?;
        Ok(self.finish_registration(response, Role::Candidate))
    }

    /// Validates locally, then registers a company. Companies wait for
    /// admin approval, so the outcome points at the pending page.
    ///
    /// # Errors
    ///
    /// Local validation failures, or the backend's answer mapped into a
    /// `SubmitError`.
    pub async fn register_company(&self, form: &CompanyRegistration) -> Result<AuthOutcome, SubmitError> {
        form.validate()?;
        let response: RegistrationResponse =
            self.api.post(endpoints::REGISTER_COMPANY, form, &RequestOptions::new()).await?;
        Ok(self.finish_registration(response, Role::Company))
    }

    fn finish_registration(&self, response: RegistrationResponse, role: Role) -> AuthOutcome {
        if let Some(user) = &response.user {
            self.cache.store(user);
            info!(user_id = %user.id, role = user.role.as_str(), "registration succeeded");
        }
        let redirect_to = after_registration(response.user.as_ref().map_or(role, |user| user.role));
        AuthOutcome {
            user: response.user,
            token: response.token,
            redirect_to: redirect_to.to_owned(),
            message: response.message,
        }
    }

    /// Clears the cached user, then asks the backend to drop the cookie.
    /// An already-expired session is not an error.
    ///
    /// # Errors
    ///
    /// Any request failure other than 401.
    pub async fn logout(&self) -> Result<(), RequestError> {
        self.cache.clear();
        let body = serde_json::json!({});
        match self.api.post_opt::<serde_json::Value, _>(endpoints::LOGOUT, Some(&body), &RequestOptions::new()).await {
            Ok(_) => Ok(()),
            Err(e) if e.status() == Some(401) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Current user according to the backend. Refreshes the cache; a 401
    /// clears it.
    ///
    /// # Errors
    ///
    /// The request error, after clearing the cache on 401.
    pub async fn me(&self) -> Result<User, RequestError> {
        match self.api.get::<User>(endpoints::ME, &RequestOptions::new()).await {
            Ok(user) => {
                self.cache.store(&user);
                Ok(user)
            }
            Err(e) => {
                if e.status() == Some(401) {
                    self.cache.clear();
                }
                Err(e)
            }
        }
    }
}

// =============================================================================
// SERVER-SIDE HELPERS
// =============================================================================

/// Session token from the incoming request's `Cookie` headers.
#[must_use]
pub fn auth_token_from_headers(headers: &HeaderMap) -> Option<String> {
    CookieJar::from_headers(headers)
        .get(AUTH_COOKIE_NAME)
        .map(Cookie::value)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
}

/// A protected page was requested without a session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("authentication required; redirect to {location}")]
pub struct AuthRedirect {
    pub location: String,
}

/// Token for a protected server-side handler, or a redirect to login that
/// returns to `path`.
///
/// # Errors
///
/// `AuthRedirect` when the request carries no session cookie.
pub fn require_auth(headers: &HeaderMap, path: &str) -> Result<String, AuthRedirect> {
    auth_token_from_headers(headers).ok_or_else(|| AuthRedirect { location: routes::login_redirect_to(path) })
}

/// API client that forwards the request's session cookie as a bearer token.
///
/// # Errors
///
/// Fails only if the HTTP client cannot be built.
pub fn server_client(config: ApiConfig, headers: &HeaderMap) -> Result<ApiClient, RequestError> {
    ApiClient::server(config, auth_token_from_headers(headers))
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
