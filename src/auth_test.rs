use std::sync::{Arc, Mutex};

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use reqwest::header::{COOKIE, HeaderValue};
use serde_json::{Value, json};

use super::*;
use crate::messages;
use crate::storage::Storage;
use crate::test_support::{memory_storage, server_client, spawn_backend};

fn user(role: Role) -> User {
    User { id: "42".into(), email: "ana@example.com".into(), role, name: Some("Ana".into()), is_active: Some(true) }
}

fn valid_candidate() -> CandidateRegistration {
    CandidateRegistration {
        email: "ana@example.com".into(),
        password: "Segura123".into(),
        confirm_password: "Segura123".into(),
        full_name: "Ana Souza".into(),
        phone: "(11) 98765-4321".into(),
    }
}

fn valid_company() -> CompanyRegistration {
    CompanyRegistration {
        company_name: "Acme".into(),
        cnpj: "11.222.333/0001-81".into(),
        email: "rh@acme.test".into(),
        password: "Segura123".into(),
        confirm_password: "Segura123".into(),
        contact_person_name: "Bruno".into(),
        contact_person_phone: "1133334444".into(),
        website: Some("  ".into()),
    }
}

// =============================================================================
// cache and session
// =============================================================================

#[test]
fn user_id_accepts_numbers() {
    let user: User = serde_json::from_value(json!({"id": 7, "email": "a@b.co", "role": "admin"})).unwrap();
    assert_eq!(user.id, "7");
    assert_eq!(user.name, None);
}

#[test]
fn cache_round_trips_user() {
    let cache = AuthCache::new(memory_storage());
    assert_eq!(cache.load(), None);
    cache.store(&user(Role::Company));
    assert_eq!(cache.load(), Some(user(Role::Company)));
    cache.clear();
    assert!(!cache.session().is_authenticated());
}

#[test]
fn corrupt_cached_user_is_removed() {
    let storage = memory_storage();
    storage.set_item(USER_CACHE_KEY, "{not json").unwrap();
    let cache = AuthCache::new(Arc::clone(&storage));
    assert_eq!(cache.load(), None);
    assert_eq!(storage.get_item(USER_CACHE_KEY).unwrap(), None);
}

#[test]
fn registration_landing_pages() {
    assert_eq!(after_registration(Role::Candidate), "/candidate/profile/create");
    assert_eq!(after_registration(Role::Company), "/auth/registration-pending");
    assert_eq!(after_registration(Role::Admin), "/");
}

#[test]
fn session_role_checks() {
    let session = AuthSession { user: Some(user(Role::Candidate)) };
    assert!(session.is_candidate());
    assert!(!session.is_admin());
    assert!(session.has_role(&[Role::Admin, Role::Candidate]));
    assert!(!AuthSession::default().has_role(&[Role::Candidate]));
}

// =============================================================================
// registration payloads
// =============================================================================

#[test]
fn candidate_validation_lists_every_failing_field() {
    let form = CandidateRegistration { confirm_password: "outra".into(), phone: "123".into(), ..valid_candidate() };
    let err = form.validate().unwrap_err();
    let fields = err.fields().unwrap();
    assert_eq!(fields.get("confirm_password").map(String::as_str), Some(messages::PASSWORDS_DONT_MATCH));
    assert_eq!(fields.get("phone").map(String::as_str), Some(messages::INVALID_PHONE));
    assert_eq!(fields.len(), 2);
}

#[test]
fn company_payload_strips_cnpj_and_skips_blank_website() {
    let company = valid_company();
    assert!(company.validate().is_ok());
    let body = serde_json::to_value(&company).unwrap();
    assert_eq!(body["cnpj"], "11222333000181");
    assert!(body.get("website").is_none());
    assert!(body.get("confirm_password").is_none());
}

#[test]
fn company_website_is_checked_when_present() {
    let company = CompanyRegistration { website: Some("not a url".into()), ..valid_company() };
    let err = company.validate().unwrap_err();
    assert_eq!(err.fields().unwrap().get("website").map(String::as_str), Some(messages::INVALID_URL));
}

// =============================================================================
// service against a fake backend
// =============================================================================

type Seen = Arc<Mutex<Vec<Value>>>;

async fn backend(seen: Seen) -> String {
    let router = axum::Router::new()
        .route(
            endpoints::LOGIN,
            post(|Json(body): Json<Value>| async move {
                if body["password"] == "Segura123" {
                    Ok(Json(json!({"user": {"id": 1, "email": body["email"], "role": "company"}, "redirect_url": ""})))
                } else {
                    Err((StatusCode::UNAUTHORIZED, Json(json!({"detail": "bad"}))))
                }
            }),
        )
        .route(
            endpoints::REGISTER_COMPANY,
            post(|State(seen): State<Seen>, Json(body): Json<Value>| async move {
                seen.lock().unwrap().push(body);
                (StatusCode::CREATED, Json(json!({"message": "Cadastro em análise"})))
            }),
        )
        .route(
            endpoints::REGISTER_CANDIDATE,
            post(|| async {
                Json(json!({"user": {"id": "9", "email": "ana@example.com", "role": "candidate"}, "token": "t"}))
            }),
        )
        .route(endpoints::LOGOUT, post(|| async { StatusCode::UNAUTHORIZED }))
        .route(endpoints::ME, get(|| async { StatusCode::UNAUTHORIZED }))
        .with_state(seen);
    spawn_backend(router).await
}

#[tokio::test]
async fn login_caches_user_and_falls_back_to_role_home() {
    let base = backend(Seen::default()).await;
    let service = AuthService::new(server_client(&base, "t"), AuthCache::new(memory_storage()));
    let outcome = service.login("rh@acme.test", "Segura123").await.unwrap();

    assert_eq!(outcome.redirect_to, routes::company::DASHBOARD);
    assert_eq!(service.cache().load().map(|u| u.id), Some("1".to_owned()));
}

#[tokio::test]
async fn rejected_login_maps_to_invalid_credentials() {
    let base = backend(Seen::default()).await;
    let service = AuthService::new(server_client(&base, "t"), AuthCache::new(memory_storage()));
    let err = service.login("rh@acme.test", "errada").await.unwrap_err();

    assert_eq!(err.message(), Some(messages::INVALID_CREDENTIALS));
    assert_eq!(service.cache().load(), None);
}

#[tokio::test]
async fn company_registration_points_at_pending_page() {
    let seen = Seen::default();
    let base = backend(Arc::clone(&seen)).await;
    let service = AuthService::new(server_client(&base, "t"), AuthCache::new(memory_storage()));

    let outcome = service.register_company(&valid_company()).await.unwrap();

    assert_eq!(outcome.redirect_to, routes::auth::REGISTRATION_PENDING);
    assert_eq!(outcome.message.as_deref(), Some("Cadastro em análise"));
    assert_eq!(outcome.user, None);
    assert_eq!(seen.lock().unwrap()[0]["cnpj"], "11222333000181");
}

#[tokio::test]
async fn candidate_registration_caches_user() {
    let base = backend(Seen::default()).await;
    let service = AuthService::new(server_client(&base, "t"), AuthCache::new(memory_storage()));

    let outcome = service.register_candidate(&valid_candidate()).await.unwrap();

    assert_eq!(outcome.redirect_to, routes::candidate::PROFILE_CREATE);
    assert_eq!(outcome.token.as_deref(), Some("t"));
    assert!(service.cache().session().is_candidate());
}

#[tokio::test]
async fn invalid_registration_never_reaches_backend() {
    let seen = Seen::default();
    let base = backend(Arc::clone(&seen)).await;
    let service = AuthService::new(server_client(&base, "t"), AuthCache::new(memory_storage()));
    let form = CompanyRegistration { cnpj: "11.111.111/1111-11".into(), ..valid_company() };

    let err = service.register_company(&form).await.unwrap_err();

    assert!(err.fields().unwrap().contains_key("cnpj"));
    assert!(seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn logout_and_expired_me_clear_cache() {
    let base = backend(Seen::default()).await;
    let cache = AuthCache::new(memory_storage());
    let service = AuthService::new(server_client(&base, "t"), cache.clone());

    cache.store(&user(Role::Admin));
    service.logout().await.unwrap();
    assert_eq!(cache.load(), None);

    cache.store(&user(Role::Admin));
    let err = service.me().await.unwrap_err();
    assert_eq!(err.status(), Some(401));
    assert_eq!(cache.load(), None);
}

// =============================================================================
// server-side helpers
// =============================================================================

#[test]
fn token_is_read_from_cookie_header() {
    let mut headers = HeaderMap::new();
    headers.insert(COOKIE, HeaderValue::from_static("theme=dark; auth_token=abc123"));
    assert_eq!(auth_token_from_headers(&headers).as_deref(), Some("abc123"));
    assert_eq!(require_auth(&headers, "/admin").unwrap(), "abc123");
}

#[test]
fn missing_cookie_redirects_to_login() {
    let redirect = require_auth(&HeaderMap::new(), "/admin/users").unwrap_err();
    assert_eq!(redirect.location, "/auth/login?redirectTo=%2Fadmin%2Fusers");
}

#[test]
fn server_client_forwards_cookie_as_bearer() {
    let mut headers = HeaderMap::new();
    headers.insert(COOKIE, HeaderValue::from_static("auth_token=abc123"));
    let client = super::server_client(ApiConfig::with_api_url("http://api.test"), &headers).unwrap();
    assert_eq!(client.credentials(), &crate::net::Credentials::Bearer("abc123".into()));
}
