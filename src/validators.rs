//! Field validators shared by the registration and profile forms.
//!
//! Each validator takes the raw input and returns a [`ValidationResult`]
//! with a user-facing message. The [`rules`] module adapts them to schema
//! validators over JSON values.

use std::sync::LazyLock;

use regex::Regex;

use crate::formatting::strip_formatting;
use crate::messages;
use crate::validation::ValidationResult;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(https?://)?([\da-z.-]+)\.([a-z.]{2,6})([/\w .-]*)*/?$").expect("valid url regex")
});

const MIN_PASSWORD_LEN: usize = 8;
const MIN_NAME_LEN: usize = 3;

pub fn validate_email(email: &str) -> ValidationResult {
    if email.is_empty() {
        return ValidationResult::invalid(messages::REQUIRED_EMAIL);
    }
    if !EMAIL_RE.is_match(email) {
        return ValidationResult::invalid(messages::INVALID_EMAIL);
    }
    ValidationResult::valid()
}

/// At least 8 characters with lowercase, uppercase, and a digit.
pub fn validate_password(password: &str) -> ValidationResult {
    if password.is_empty() {
        return ValidationResult::invalid(messages::REQUIRED_PASSWORD);
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return ValidationResult::invalid(messages::PASSWORD_TOO_SHORT);
    }
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if !(has_lower && has_upper && has_digit) {
        return ValidationResult::invalid(messages::PASSWORD_WEAK);
    }
    ValidationResult::valid()
}

pub fn validate_password_confirmation(password: &str, confirmation: &str) -> ValidationResult {
    if password == confirmation {
        ValidationResult::valid()
    } else {
        ValidationResult::invalid(messages::PASSWORDS_DONT_MATCH)
    }
}

fn validate_min_len(value: &str, message: &str) -> ValidationResult {
    if value.trim().chars().count() < MIN_NAME_LEN {
        ValidationResult::invalid(message)
    } else {
        ValidationResult::valid()
    }
}

pub fn validate_full_name(name: &str) -> ValidationResult {
    validate_min_len(name, messages::FULL_NAME_TOO_SHORT)
}

pub fn validate_company_name(name: &str) -> ValidationResult {
    validate_min_len(name, messages::COMPANY_NAME_TOO_SHORT)
}

pub fn validate_contact_name(name: &str) -> ValidationResult {
    validate_min_len(name, messages::CONTACT_NAME_TOO_SHORT)
}

/// 10 to 15 digits once formatting is stripped.
pub fn validate_phone(phone: &str) -> ValidationResult {
    if phone.is_empty() {
        return ValidationResult::invalid(messages::REQUIRED_PHONE);
    }
    let digits = strip_formatting(phone).len();
    if !(10..=15).contains(&digits) {
        return ValidationResult::invalid(messages::INVALID_PHONE);
    }
    ValidationResult::valid()
}

pub fn validate_cnpj(cnpj: &str) -> ValidationResult {
    if cnpj.is_empty() {
        return ValidationResult::invalid(messages::REQUIRED_CNPJ);
    }
    let digits = digit_values(cnpj);
    if digits.len() != 14 {
        return ValidationResult::invalid(messages::CNPJ_WRONG_LENGTH);
    }
    if !cnpj_check_digits_match(&digits) {
        return ValidationResult::invalid(messages::INVALID_CNPJ);
    }
    ValidationResult::valid()
}

/// CPF is optional on the profile; an empty value is valid.
pub fn validate_cpf(cpf: &str) -> ValidationResult {
    if cpf.trim().is_empty() {
        return ValidationResult::valid();
    }
    let digits = digit_values(cpf);
    if digits.len() != 11 {
        return ValidationResult::invalid(messages::CPF_WRONG_LENGTH);
    }
    if !cpf_check_digits_match(&digits) {
        return ValidationResult::invalid(messages::INVALID_CPF);
    }
    ValidationResult::valid()
}

pub fn validate_url(url: &str, required: bool) -> ValidationResult {
    if url.is_empty() {
        return if required {
            ValidationResult::invalid(messages::REQUIRED_FIELD)
        } else {
            ValidationResult::valid()
        };
    }
    if !URL_RE.is_match(url) {
        return ValidationResult::invalid(messages::INVALID_URL);
    }
    ValidationResult::valid()
}

pub fn validate_required(value: &str) -> ValidationResult {
    if value.trim().is_empty() {
        ValidationResult::invalid(messages::REQUIRED_FIELD)
    } else {
        ValidationResult::valid()
    }
}

// =============================================================================
// CHECK DIGITS
// =============================================================================

fn digit_values(raw: &str) -> Vec<u32> {
    raw.chars().filter_map(|c| c.to_digit(10)).collect()
}

fn all_same(digits: &[u32]) -> bool {
    digits.windows(2).all(|pair| pair[0] == pair[1])
}

fn weighted_sum(digits: &[u32], weights: &[u32]) -> u32 {
    digits.iter().zip(weights).map(|(d, w)| d * w).sum()
}

fn cnpj_check_digits_match(digits: &[u32]) -> bool {
    const FIRST: [u32; 12] = [5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];
    const SECOND: [u32; 13] = [6, 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];
    let check = |sum: u32| match sum % 11 {
        r if r < 2 => 0,
        r => 11 - r,
    };
    if all_same(digits) {
        return false;
    }
    check(weighted_sum(&digits[..12], &FIRST)) == digits[12] && check(weighted_sum(&digits[..13], &SECOND)) == digits[13]
}

fn cpf_check_digits_match(digits: &[u32]) -> bool {
    const FIRST: [u32; 9] = [10, 9, 8, 7, 6, 5, 4, 3, 2];
    const SECOND: [u32; 10] = [11, 10, 9, 8, 7, 6, 5, 4, 3, 2];
    let check = |sum: u32| (sum * 10 % 11) % 10;
    if all_same(digits) {
        return false;
    }
    check(weighted_sum(&digits[..9], &FIRST)) == digits[9] && check(weighted_sum(&digits[..10], &SECOND)) == digits[10]
}

// =============================================================================
// SCHEMA ADAPTERS
// =============================================================================

/// Validators over JSON form values. Non-string values validate as `""`.
pub mod rules {
    use serde_json::Value;

    use super::*;

    fn text(value: &Value) -> &str {
        value.as_str().unwrap_or_default()
    }

    pub fn email() -> impl Fn(&Value) -> ValidationResult + Send + Sync + 'static {
        |value: &Value| validate_email(text(value))
    }

    pub fn password() -> impl Fn(&Value) -> ValidationResult + Send + Sync + 'static {
        |value: &Value| validate_password(text(value))
    }

    pub fn full_name() -> impl Fn(&Value) -> ValidationResult + Send + Sync + 'static {
        |value: &Value| validate_full_name(text(value))
    }

    pub fn company_name() -> impl Fn(&Value) -> ValidationResult + Send + Sync + 'static {
        |value: &Value| validate_company_name(text(value))
    }

    pub fn phone() -> impl Fn(&Value) -> ValidationResult + Send + Sync + 'static {
        |value: &Value| validate_phone(text(value))
    }

    pub fn cnpj() -> impl Fn(&Value) -> ValidationResult + Send + Sync + 'static {
        |value: &Value| validate_cnpj(text(value))
    }

    pub fn cpf() -> impl Fn(&Value) -> ValidationResult + Send + Sync + 'static {
        |value: &Value| validate_cpf(text(value))
    }

    pub fn url(required: bool) -> impl Fn(&Value) -> ValidationResult + Send + Sync + 'static {
        move |value: &Value| validate_url(text(value), required)
    }

    /// Non-blank string, non-empty array, or any number/bool.
    pub fn required() -> impl Fn(&Value) -> ValidationResult + Send + Sync + 'static {
        |value: &Value| match value {
            Value::Null => ValidationResult::invalid(crate::messages::REQUIRED_FIELD),
            Value::String(s) => validate_required(s),
            Value::Array(items) if items.is_empty() => ValidationResult::invalid(crate::messages::REQUIRED_FIELD),
            _ => ValidationResult::valid(),
        }
    }
}

#[cfg(test)]
#[path = "validators_test.rs"]
mod tests;
