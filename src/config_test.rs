use std::collections::HashMap;

use super::*;

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = vars.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect();
    move |key| vars.get(key).cloned()
}

fn production() -> ApiConfig {
    ApiConfig { mode: BuildMode::Production, ..ApiConfig::default() }
}

// =============================================================================
// from_lookup
// =============================================================================

#[test]
fn from_lookup_defaults_to_development() {
    let cfg = ApiConfig::from_lookup(lookup(&[])).unwrap();
    assert_eq!(cfg.mode, BuildMode::Development);
    assert!(cfg.app_base_url.is_none());
}

#[test]
fn from_lookup_parses_production_and_urls() {
    let cfg = ApiConfig::from_lookup(lookup(&[
        ("TALENTBASE_ENV", "Production"),
        ("TALENTBASE_API_URL", "https://api.talentbase.test/"),
        ("TALENTBASE_APP_URL", "https://app.talentbase.test"),
    ]))
    .unwrap();
    assert_eq!(cfg.mode, BuildMode::Production);
    assert_eq!(cfg.resolve_api_base_url().unwrap(), "https://api.talentbase.test");
    assert_eq!(cfg.resolve_app_base_url().unwrap(), "https://app.talentbase.test");
}

#[test]
fn from_lookup_accepts_prod_alias() {
    let cfg = ApiConfig::from_lookup(lookup(&[("TALENTBASE_ENV", "prod")])).unwrap();
    assert_eq!(cfg.mode, BuildMode::Production);
}

#[test]
fn from_lookup_rejects_unknown_mode() {
    let err = ApiConfig::from_lookup(lookup(&[("TALENTBASE_ENV", "staging")])).unwrap_err();
    assert_eq!(err, ConfigError::UnknownMode("staging".into()));
}

#[test]
fn from_lookup_ignores_blank_api_url() {
    let cfg = ApiConfig::from_lookup(lookup(&[("TALENTBASE_API_URL", "   ")])).unwrap();
    assert_eq!(cfg.resolve_api_base_url().unwrap(), DEV_API_URL);
}

// =============================================================================
// resolve_api_base_url
// =============================================================================

#[test]
fn runtime_override_wins_over_build_url() {
    let cfg = ApiConfig::with_api_url("https://build.test");
    cfg.runtime.set_api_url("https://runtime.test/");
    assert_eq!(cfg.resolve_api_base_url().unwrap(), "https://runtime.test");
}

#[test]
fn runtime_override_is_read_at_call_time() {
    let cfg = ApiConfig::with_api_url("https://build.test");
    let shared = cfg.clone();
    assert_eq!(cfg.resolve_api_base_url().unwrap(), "https://build.test");

    shared.runtime.set_api_url("https://late.test");
    assert_eq!(cfg.resolve_api_base_url().unwrap(), "https://late.test");

    shared.runtime.clear_api_url();
    assert_eq!(cfg.resolve_api_base_url().unwrap(), "https://build.test");
}

#[test]
fn development_falls_back_to_localhost() {
    let cfg = ApiConfig::default();
    assert_eq!(cfg.resolve_api_base_url().unwrap(), "http://localhost:8000");
}

#[test]
fn production_without_url_is_fatal() {
    let cfg = production();
    assert_eq!(cfg.resolve_api_base_url().unwrap_err(), ConfigError::MissingApiUrl);
    assert_eq!(cfg.validate().unwrap_err(), ConfigError::MissingApiUrl);
}

#[test]
fn production_with_runtime_url_validates() {
    let cfg = production();
    cfg.runtime.set_api_url("https://api.talentbase.test");
    assert!(cfg.validate().is_ok());
}

#[test]
fn blank_runtime_url_clears_override() {
    let cfg = ApiConfig::with_api_url("https://build.test");
    cfg.runtime.set_api_url("");
    assert_eq!(cfg.runtime.api_url(), None);
    assert_eq!(cfg.resolve_api_base_url().unwrap(), "https://build.test");
}

#[test]
fn api_url_joins_endpoint() {
    let cfg = ApiConfig::with_api_url("https://api.test/");
    assert_eq!(cfg.api_url("/api/v1/auth/me").unwrap(), "https://api.test/api/v1/auth/me");
}

// =============================================================================
// app url
// =============================================================================

#[test]
fn share_link_uses_app_origin() {
    let cfg = ApiConfig { app_base_url: Some("https://app.test/".into()), ..ApiConfig::default() };
    assert_eq!(cfg.share_link("abc123").unwrap(), "https://app.test/share/candidate/abc123");
}

#[test]
fn production_share_link_requires_app_url() {
    assert_eq!(production().share_link("x").unwrap_err(), ConfigError::MissingAppUrl);
}

// =============================================================================
// env helpers
// =============================================================================

#[test]
fn env_parse_falls_back_on_garbage() {
    unsafe { std::env::set_var("TALENTBASE_TEST_ENV_PARSE_GARBAGE", "soon") };
    assert_eq!(env_parse("TALENTBASE_TEST_ENV_PARSE_GARBAGE", 42_u64), 42);
    unsafe { std::env::remove_var("TALENTBASE_TEST_ENV_PARSE_GARBAGE") };
}

#[test]
fn env_parse_reads_trimmed_value() {
    unsafe { std::env::set_var("TALENTBASE_TEST_ENV_PARSE_OK", " 1500 ") };
    assert_eq!(env_parse("TALENTBASE_TEST_ENV_PARSE_OK", 0_u64), 1500);
    unsafe { std::env::remove_var("TALENTBASE_TEST_ENV_PARSE_OK") };
}

#[test]
fn env_bool_accepts_common_spellings() {
    unsafe { std::env::set_var("TALENTBASE_TEST_ENV_BOOL", "Yes") };
    assert_eq!(env_bool("TALENTBASE_TEST_ENV_BOOL"), Some(true));
    unsafe { std::env::set_var("TALENTBASE_TEST_ENV_BOOL", "off") };
    assert_eq!(env_bool("TALENTBASE_TEST_ENV_BOOL"), Some(false));
    unsafe { std::env::set_var("TALENTBASE_TEST_ENV_BOOL", "maybe") };
    assert_eq!(env_bool("TALENTBASE_TEST_ENV_BOOL"), None);
    unsafe { std::env::remove_var("TALENTBASE_TEST_ENV_BOOL") };
    assert_eq!(env_bool("TALENTBASE_TEST_ENV_BOOL"), None);
}
