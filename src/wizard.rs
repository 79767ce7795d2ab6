//! Multi-step wizard: step navigation and final submission.
//!
//! DESIGN
//! ======
//! `WizardSteps` tracks which step is active and gates forward movement on
//! the step's fields validating. `WizardSubmit` runs the final submission
//! and turns the outcome into form state: field errors for structured
//! rejections, one general message otherwise.
//!
//! Submission state is published on a `watch` channel so a view can show
//! the loading state while the submit future is pending. The phase goes
//! `Idle -> Submitting -> Idle`; how the last attempt ended is kept in
//! `outcome`. The phase always leaves `Submitting`, including when the
//! submission future is dropped mid-flight. A submit issued while another
//! is in flight is ignored.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::messages;
use crate::net::SubmitError;
use crate::validation::{FormErrors, FormValidation};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SubmitPhase {
    #[default]
    Idle,
    Submitting,
}

/// How the most recent submission ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmitState {
    pub phase: SubmitPhase,
    pub outcome: Option<SubmitOutcome>,
    pub error: Option<String>,
    pub field_errors: Option<FormErrors>,
}

pub type SubmitFuture = Pin<Box<dyn Future<Output = Result<Value, SubmitError>> + Send>>;
pub type SubmitFn = Arc<dyn Fn(Value) -> SubmitFuture + Send + Sync>;
pub type SuccessCallback = Arc<dyn Fn(&Value) + Send + Sync>;
pub type ErrorCallback = Arc<dyn Fn(&SubmitError) + Send + Sync>;

#[derive(Clone, Default)]
pub struct WizardSubmitOptions {
    pub on_success: Option<SuccessCallback>,
    pub on_error: Option<ErrorCallback>,
    pub custom_submit: Option<SubmitFn>,
}

impl fmt::Debug for WizardSubmitOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WizardSubmitOptions")
            .field("on_success", &self.on_success.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("custom_submit", &self.custom_submit.is_some())
            .finish()
    }
}

impl WizardSubmitOptions {
    #[must_use]
    pub fn on_success(mut self, callback: impl Fn(&Value) + Send + Sync + 'static) -> Self {
        self.on_success = Some(Arc::new(callback));
        self
    }

    #[must_use]
    pub fn on_error(mut self, callback: impl Fn(&SubmitError) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(callback));
        self
    }

    #[must_use]
    pub fn custom_submit<F, Fut>(mut self, submit: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, SubmitError>> + Send + 'static,
    {
        self.custom_submit = Some(Arc::new(move |data: Value| Box::pin(submit(data)) as SubmitFuture));
        self
    }
}

/// Holds the `Submitting` phase; dropping it always returns to `Idle`.
struct SubmittingGuard<'a> {
    state: &'a watch::Sender<SubmitState>,
}

impl<'a> SubmittingGuard<'a> {
    /// Enter `Submitting` with errors cleared, or `None` if a submission is
    /// already in flight.
    fn enter(state: &'a watch::Sender<SubmitState>) -> Option<Self> {
        let entered = state.send_if_modified(|s| {
            if s.phase == SubmitPhase::Submitting {
                return false;
            }
            *s = SubmitState { phase: SubmitPhase::Submitting, ..SubmitState::default() };
            true
        });
        entered.then_some(Self { state })
    }

    fn record(&self, outcome: SubmitOutcome, apply: impl FnOnce(&mut SubmitState)) {
        self.state.send_modify(|s| {
            apply(s);
            s.outcome = Some(outcome);
        });
    }
}

impl Drop for SubmittingGuard<'_> {
    fn drop(&mut self) {
        self.state.send_if_modified(|s| {
            let was_submitting = s.phase == SubmitPhase::Submitting;
            s.phase = SubmitPhase::Idle;
            was_submitting
        });
    }
}

/// Final-step submission controller. Clones share state.
#[derive(Clone)]
pub struct WizardSubmit {
    options: WizardSubmitOptions,
    state: Arc<watch::Sender<SubmitState>>,
}

impl fmt::Debug for WizardSubmit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WizardSubmit")
            .field("options", &self.options)
            .field("state", &*self.state.borrow())
            .finish()
    }
}

impl Default for WizardSubmit {
    fn default() -> Self {
        Self::new(WizardSubmitOptions::default())
    }
}

impl WizardSubmit {
    #[must_use]
    pub fn new(options: WizardSubmitOptions) -> Self {
        let (state, _) = watch::channel(SubmitState::default());
        Self { options, state: Arc::new(state) }
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SubmitState> {
        self.state.subscribe()
    }

    #[must_use]
    pub fn state(&self) -> SubmitState {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn phase(&self) -> SubmitPhase {
        self.state.borrow().phase
    }

    #[must_use]
    pub fn is_submitting(&self) -> bool {
        self.phase() == SubmitPhase::Submitting
    }

    #[must_use]
    pub fn outcome(&self) -> Option<SubmitOutcome> {
        self.state.borrow().outcome
    }

    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.state.borrow().error.clone()
    }

    #[must_use]
    pub fn field_errors(&self) -> Option<FormErrors> {
        self.state.borrow().field_errors.clone()
    }

    pub fn set_error(&self, error: Option<String>) {
        self.state.send_modify(|s| s.error = error);
    }

    pub fn set_field_errors(&self, errors: Option<FormErrors>) {
        self.state.send_modify(|s| s.field_errors = errors);
    }

    pub fn clear_errors(&self) {
        self.state.send_modify(|s| {
            s.error = None;
            s.field_errors = None;
        });
    }

    /// Submit `data`. Returns the response on success.
    ///
    /// Without a custom submit function the host performs its default form
    /// submission; this only passes through `Submitting` and back.
    pub async fn submit(&self, data: Value) -> Option<Value> {
        let Some(guard) = SubmittingGuard::enter(&self.state) else {
            debug!("submission already in flight; ignoring");
            return None;
        };
        let Some(submit) = self.options.custom_submit.clone() else {
            debug!("no custom submit configured; deferring to default submission");
            return None;
        };

        match submit(data).await {
            Ok(response) => {
                guard.record(SubmitOutcome::Succeeded, |_| {});
                info!("wizard submission succeeded");
                if let Some(on_success) = &self.options.on_success {
                    on_success(&response);
                }
                Some(response)
            }
            Err(err) => {
                warn!(error = %err, "wizard submission failed");
                guard.record(SubmitOutcome::Failed, |s| match &err {
                    SubmitError::Validation { fields, .. } => s.field_errors = Some(fields.clone()),
                    SubmitError::General { message } if message.is_empty() => {
                        s.error = Some(messages::SERVER_ERROR.to_owned());
                    }
                    SubmitError::General { message } => s.error = Some(message.clone()),
                });
                if let Some(on_error) = &self.options.on_error {
                    on_error(&err);
                }
                None
            }
        }
    }
}

// =============================================================================
// STEPS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WizardStep {
    pub id: String,
    pub label: String,
    pub description: Option<String>,
    /// Fields that must validate before leaving this step.
    pub fields: Vec<String>,
}

impl WizardStep {
    #[must_use]
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self { id: id.into(), label: label.into(), description: None, fields: Vec::new() }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_fields(mut self, fields: &[&str]) -> Self {
        self.fields = fields.iter().map(|f| (*f).to_owned()).collect();
        self
    }
}

#[derive(Debug, Clone)]
pub struct WizardSteps {
    steps: Vec<WizardStep>,
    current: usize,
    furthest: usize,
}

impl WizardSteps {
    #[must_use]
    pub fn new(steps: Vec<WizardStep>) -> Self {
        Self { steps, current: 0, furthest: 0 }
    }

    #[must_use]
    pub fn steps(&self) -> &[WizardStep] {
        &self.steps
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current(&self) -> Option<&WizardStep> {
        self.steps.get(self.current)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    #[must_use]
    pub fn is_first(&self) -> bool {
        self.current == 0
    }

    #[must_use]
    pub fn is_last(&self) -> bool {
        self.current + 1 >= self.steps.len()
    }

    /// Whole-number percentage including the current step.
    #[must_use]
    pub fn progress_percent(&self) -> u8 {
        if self.steps.is_empty() {
            return 0;
        }
        let percent = (self.current + 1) * 100 / self.steps.len();
        u8::try_from(percent).unwrap_or(100)
    }

    /// Advance if the current step's fields validate.
    pub fn next(&mut self, form: &mut FormValidation) -> bool {
        if self.is_last() {
            return false;
        }
        let Some(step) = self.steps.get(self.current) else {
            return false;
        };
        let fields: Vec<&str> = step.fields.iter().map(String::as_str).collect();
        if !form.validate_fields(&fields) {
            debug!(step = %step.id, "step has invalid fields");
            return false;
        }
        self.current += 1;
        self.furthest = self.furthest.max(self.current);
        true
    }

    pub fn previous(&mut self) -> bool {
        if self.is_first() {
            return false;
        }
        self.current -= 1;
        true
    }

    /// Jump to an already-visited step.
    pub fn go_to(&mut self, index: usize) -> bool {
        if index > self.furthest || index >= self.steps.len() {
            return false;
        }
        self.current = index;
        true
    }

    /// Resume at a step recorded in a saved draft; clamps to the last step.
    pub fn restore(&mut self, index: usize) {
        if self.steps.is_empty() {
            return;
        }
        self.current = index.min(self.steps.len() - 1);
        self.furthest = self.furthest.max(self.current);
    }
}

#[cfg(test)]
#[path = "wizard_test.rs"]
mod tests;
