//! Form validation engine.
//!
//! A form owns its values and an error map. Validators are pure functions
//! of one field's value. Invariant: a field has an entry in the error map
//! exactly when its most recent validation failed.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::draft::FormDraft;
use crate::messages;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub error: Option<String>,
}

impl ValidationResult {
    #[must_use]
    pub fn valid() -> Self {
        Self { is_valid: true, error: None }
    }

    #[must_use]
    pub fn invalid(error: impl Into<String>) -> Self {
        Self { is_valid: false, error: Some(error.into()) }
    }
}

pub type Validator = Arc<dyn Fn(&Value) -> ValidationResult + Send + Sync>;

pub type FormErrors = BTreeMap<String, String>;

/// Field name → validator.
#[derive(Clone, Default)]
pub struct ValidationSchema {
    validators: BTreeMap<String, Validator>,
}

impl fmt::Debug for ValidationSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.validators.keys()).finish()
    }
}

impl ValidationSchema {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn field(
        mut self,
        name: impl Into<String>,
        validator: impl Fn(&Value) -> ValidationResult + Send + Sync + 'static,
    ) -> Self {
        self.validators.insert(name.into(), Arc::new(validator));
        self
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Validator> {
        self.validators.get(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.validators.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.validators.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    fn check(&self, field: &str, values: &FormDraft) -> Option<Result<(), String>> {
        let validator = self.validators.get(field)?;
        let result = validator(values.get(field).unwrap_or(&Value::Null));
        if result.is_valid {
            Some(Ok(()))
        } else {
            Some(Err(result.error.unwrap_or_else(|| messages::INVALID_FIELD.to_owned())))
        }
    }
}

#[derive(Debug, Clone)]
pub struct FormValidation {
    initial: FormDraft,
    values: FormDraft,
    errors: FormErrors,
    schema: Option<ValidationSchema>,
    is_validating: bool,
}

impl FormValidation {
    #[must_use]
    pub fn new(initial_values: FormDraft, schema: Option<ValidationSchema>) -> Self {
        Self {
            values: initial_values.clone(),
            initial: initial_values,
            errors: FormErrors::new(),
            schema,
            is_validating: false,
        }
    }

    #[must_use]
    pub fn values(&self) -> &FormDraft {
        &self.values
    }

    #[must_use]
    pub fn value(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }

    #[must_use]
    pub fn errors(&self) -> &FormErrors {
        &self.errors
    }

    #[must_use]
    pub fn error(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    #[must_use]
    pub fn is_validating(&self) -> bool {
        self.is_validating
    }

    /// Record a new value and drop any stale error for that field.
    pub fn handle_change(&mut self, field: &str, value: Value) {
        self.values.insert(field.to_owned(), value);
        self.errors.remove(field);
    }

    pub fn handle_blur(&mut self, field: &str) -> bool {
        self.validate_field(field)
    }

    /// Fields without a validator (or forms without a schema) are valid.
    pub fn validate_field(&mut self, field: &str) -> bool {
        let Some(outcome) = self.schema.as_ref().and_then(|schema| schema.check(field, &self.values)) else {
            return true;
        };
        match outcome {
            Ok(()) => {
                self.errors.remove(field);
                true
            }
            Err(message) => {
                self.errors.insert(field.to_owned(), message);
                false
            }
        }
    }

    /// Validate a subset (one wizard step). Every field is checked; there is
    /// no short-circuit, so all failing fields get their message.
    pub fn validate_fields(&mut self, fields: &[&str]) -> bool {
        fields
            .iter()
            .fold(true, |valid, field| self.validate_field(field) && valid)
    }

    /// Validate every schema field and replace the error map atomically.
    pub fn validate_form(&mut self) -> bool {
        let Some(schema) = &self.schema else {
            return true;
        };
        self.is_validating = true;
        let errors: FormErrors = schema
            .fields()
            .filter_map(|field| match schema.check(field, &self.values) {
                Some(Err(message)) => Some((field.to_owned(), message)),
                _ => None,
            })
            .collect();
        let valid = errors.is_empty();
        self.errors = errors;
        self.is_validating = false;
        valid
    }

    pub fn set_values(&mut self, values: FormDraft) {
        self.values = values;
    }

    /// Server-side field errors, e.g. from a rejected submission.
    pub fn set_errors(&mut self, errors: FormErrors) {
        self.errors = errors;
    }

    pub fn clear_errors(&mut self) {
        self.errors.clear();
    }

    pub fn reset_form(&mut self) {
        self.values = self.initial.clone();
        self.errors.clear();
        self.is_validating = false;
    }
}

#[cfg(test)]
#[path = "validation_test.rs"]
mod tests;
