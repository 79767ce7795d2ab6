use serde_json::json;

use super::*;
use crate::validators::rules;

fn values(value: Value) -> FormDraft {
    value.as_object().cloned().unwrap()
}

fn login_form() -> FormValidation {
    let schema = ValidationSchema::new()
        .field("email", rules::email())
        .field("password", rules::password());
    FormValidation::new(values(json!({"email": "", "password": "", "remember": false})), Some(schema))
}

// =============================================================================
// field validation
// =============================================================================

#[test]
fn blur_validates_single_field() {
    let mut form = login_form();
    assert!(!form.handle_blur("email"));
    assert_eq!(form.error("email"), Some(crate::messages::REQUIRED_EMAIL));
    assert_eq!(form.error("password"), None);
}

#[test]
fn change_clears_only_that_field_error() {
    let mut form = login_form();
    assert!(!form.validate_form());
    assert_eq!(form.errors().len(), 2);

    form.handle_change("email", json!("ana@example.com"));
    assert_eq!(form.error("email"), None);
    assert!(form.error("password").is_some());
    assert_eq!(form.value("email"), Some(&json!("ana@example.com")));
}

#[test]
fn change_does_not_validate() {
    let mut form = login_form();
    form.handle_change("email", json!("not-an-email"));
    assert!(form.errors().is_empty());
}

#[test]
fn valid_field_removes_previous_error() {
    let mut form = login_form();
    form.validate_field("email");
    form.set_values(values(json!({"email": "ana@example.com", "password": ""})));
    assert!(form.validate_field("email"));
    assert_eq!(form.error("email"), None);
}

#[test]
fn field_without_validator_is_valid() {
    let mut form = login_form();
    assert!(form.validate_field("remember"));
    assert!(form.validate_field("unknown"));
    assert!(form.errors().is_empty());
}

#[test]
fn invalid_without_message_gets_generic_message() {
    let schema = ValidationSchema::new().field("x", |_: &Value| ValidationResult { is_valid: false, error: None });
    let mut form = FormValidation::new(FormDraft::new(), Some(schema));
    assert!(!form.validate_field("x"));
    assert_eq!(form.error("x"), Some(crate::messages::INVALID_FIELD));
}

#[test]
fn validate_fields_reports_every_failure() {
    let mut form = login_form();
    assert!(!form.validate_fields(&["email", "password"]));
    assert_eq!(form.errors().len(), 2);
}

// =============================================================================
// whole-form validation
// =============================================================================

#[test]
fn validate_form_replaces_error_map() {
    let mut form = login_form();
    form.set_errors(FormErrors::from([("server".to_owned(), "boom".to_owned())]));
    form.handle_change("email", json!("ana@example.com"));
    form.handle_change("password", json!("SecurePass123"));
    assert!(form.validate_form());
    assert!(form.errors().is_empty());
    assert!(!form.is_validating());
}

#[test]
fn validate_form_without_schema_is_true() {
    let mut form = FormValidation::new(values(json!({"a": 1})), None);
    form.set_errors(FormErrors::from([("a".to_owned(), "kept".to_owned())]));
    assert!(form.validate_form());
    assert!(form.validate_field("a"));
    assert_eq!(form.error("a"), Some("kept"));
}

#[test]
fn reset_restores_initial_values() {
    let mut form = login_form();
    form.handle_change("email", json!("ana@example.com"));
    form.validate_form();
    form.reset_form();
    assert_eq!(form.value("email"), Some(&json!("")));
    assert!(form.errors().is_empty());
}

#[test]
fn clear_errors_keeps_values() {
    let mut form = login_form();
    form.handle_change("email", json!("x"));
    form.validate_form();
    form.clear_errors();
    assert!(form.errors().is_empty());
    assert_eq!(form.value("email"), Some(&json!("x")));
}

#[test]
fn schema_lists_fields() {
    let schema = ValidationSchema::new().field("b", rules::required()).field("a", rules::required());
    assert_eq!(schema.fields().collect::<Vec<_>>(), vec!["a", "b"]);
    assert_eq!(schema.len(), 2);
    assert!(schema.get("a").is_some());
    assert_eq!(format!("{schema:?}"), r#"{"a", "b"}"#);
}
