//! Candidate profile types, wizard definition, and API calls.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::config::{ApiConfig, ConfigError};
use crate::draft::{DraftAutoSave, FormDraft};
use crate::messages;
use crate::net::endpoints::candidates as endpoints;
use crate::net::{ApiClient, RequestError, RequestOptions, SubmitError};
use crate::upload::{PresignedUpload, UploadKind};
use crate::validation::{FormErrors, ValidationSchema};
use crate::validators::{rules, validate_email, validate_full_name};
use crate::wizard::WizardStep;

pub const DRAFT_STORAGE_KEY: &str = "candidate_profile_draft";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoType {
    #[default]
    S3,
    Youtube,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Experience {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub company_name: String,
    pub position: String,
    /// ISO date.
    pub start_date: String,
    /// `None` while the position is current.
    #[serde(default)]
    pub end_date: Option<String>,
    pub responsibilities: String,
}

/// Profile as returned by the API. Everything beyond name and phone is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CandidateProfile {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<Value>,
    pub full_name: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpf: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_photo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pitch_video_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pitch_video_type: Option<VideoType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_position: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub years_of_experience: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sales_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sales_cycle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_ticket: Option<String>,
    pub top_skills: Vec<String>,
    pub tools_software: Vec<String>,
    pub solutions_sold: Vec<String>,
    pub departments_sold_to: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    pub public_sharing_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_token: Option<String>,
    /// Set once a share link has been generated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub share_link_generated_at: Option<String>,
    pub experiences: Vec<Experience>,
}

impl CandidateProfile {
    /// Public link for a profile whose share token was already generated.
    ///
    /// # Errors
    ///
    /// Propagates app base URL resolution failures.
    pub fn share_link(&self, config: &ApiConfig) -> Result<Option<String>, ConfigError> {
        match (&self.share_link_generated_at, &self.public_token) {
            (Some(_), Some(token)) => config.share_link(token).map(Some),
            _ => Ok(None),
        }
    }
}

/// Data collected by the profile wizard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CandidateFormData {
    pub full_name: String,
    pub phone: String,
    pub city: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_photo_url: Option<String>,
    pub current_position: String,
    pub years_of_experience: u32,
    pub sales_type: String,
    pub sales_cycle: String,
    pub avg_ticket: String,
    pub top_skills: Vec<String>,
    pub tools_software: Vec<String>,
    pub solutions_sold: Vec<String>,
    pub departments_sold_to: Vec<String>,
    pub bio: String,
    pub experiences: Vec<Experience>,
    pub pitch_video_url: String,
    pub pitch_video_type: VideoType,
}

impl CandidateFormData {
    /// Draft form of the data; the empty wizard's initial draft when default.
    #[must_use]
    pub fn to_draft(&self) -> FormDraft {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => FormDraft::new(),
        }
    }

    /// Missing keys take their defaults; wizard metadata keys are ignored.
    ///
    /// # Errors
    ///
    /// Returns the decode error when a present field has the wrong shape.
    pub fn from_draft(draft: &FormDraft) -> Result<Self, serde_json::Error> {
        serde_json::from_value(Value::Object(draft.clone()))
    }
}

// =============================================================================
// SHARING
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareLink {
    pub share_url: String,
    #[serde(default)]
    pub share_token: Option<String>,
    #[serde(default)]
    pub generated_at: Option<String>,
}

#[derive(Deserialize)]
struct SharingState {
    public_sharing_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
    pub name: String,
    pub level: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicExperience {
    pub company_name: String,
    #[serde(default)]
    pub company_logo_url: Option<String>,
    pub position: String,
    pub start_date: String,
    #[serde(default)]
    pub end_date: Option<String>,
}

/// What anyone holding the share token may see. No contact details.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublicProfile {
    pub id: Option<Value>,
    pub full_name: String,
    pub profile_photo_url: Option<String>,
    pub city: Option<String>,
    pub current_position: Option<String>,
    pub years_of_experience: Option<f64>,
    pub sales_type: Option<String>,
    pub sales_cycle: Option<String>,
    pub avg_ticket: Option<String>,
    pub top_skills: Vec<String>,
    pub tools_software: Vec<String>,
    pub solutions_sold: Vec<String>,
    pub departments_sold_to: Vec<String>,
    pub bio: Option<String>,
    pub pitch_video_url: Option<String>,
    pub pitch_video_type: Option<VideoType>,
    pub experiences: Vec<PublicExperience>,
    pub languages: Vec<Language>,
    pub work_model: Option<String>,
    pub accepts_pj: Option<bool>,
    pub relocation: Option<bool>,
    pub pcd: Option<bool>,
}

/// Message from a visitor of a public profile, relayed to the admins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRequest {
    pub name: String,
    pub email: String,
    pub message: String,
}

impl ContactRequest {
    /// # Errors
    ///
    /// Returns field errors for a short name, a bad email or an empty message.
    pub fn validate(&self) -> Result<(), SubmitError> {
        let mut fields = FormErrors::new();
        if let Some(msg) = validate_full_name(&self.name).error {
            fields.insert("name".into(), msg);
        }
        if let Some(msg) = validate_email(&self.email).error {
            fields.insert("email".into(), msg);
        }
        if self.message.trim().is_empty() {
            fields.insert("message".into(), messages::REQUIRED_FIELD.to_owned());
        }
        if fields.is_empty() { Ok(()) } else { Err(SubmitError::validation(fields)) }
    }
}

/// Generate (or regenerate, invalidating the old one) the share token and
/// enable public sharing. The backend requires a pitch video first.
///
/// # Errors
///
/// The server `error` message, or a generic one.
pub async fn generate_share_link(api: &ApiClient, profile_id: u64) -> Result<ShareLink, SubmitError> {
    let link: ShareLink = api
        .post(&endpoints::generate_share_token(profile_id), &json!({}), &RequestOptions::default())
        .await
        .map_err(|e| SubmitError::or_fallback(&e, messages::SHARE_LINK_FAILED))?;
    info!(profile_id, "share link generated");
    Ok(link)
}

/// Turn public sharing on or off; the token is kept. Returns the new state.
///
/// # Errors
///
/// Always the generic toggle message.
pub async fn set_public_sharing(api: &ApiClient, profile_id: u64, enabled: bool) -> Result<bool, SubmitError> {
    let state: SharingState = api
        .patch(&endpoints::toggle_sharing(profile_id), &json!({ "enabled": enabled }), &RequestOptions::default())
        .await
        .map_err(|e| {
            warn!(profile_id, error = %e, "toggling public sharing failed");
            SubmitError::general(messages::SHARING_TOGGLE_FAILED)
        })?;
    Ok(state.public_sharing_enabled)
}

/// Public profile behind a share token. `None` when the token is unknown
/// or sharing is disabled (the backend answers 404 for both).
///
/// # Errors
///
/// Any other failure.
pub async fn fetch_public_profile(api: &ApiClient, token: &str) -> Result<Option<PublicProfile>, RequestError> {
    match api.get(&endpoints::public_profile(token), &RequestOptions::default()).await {
        Ok(profile) => Ok(Some(profile)),
        Err(e) if e.status() == Some(404) => Ok(None),
        Err(e) => Err(e),
    }
}

/// # Errors
///
/// Local field errors, then the server `error` message or a generic one.
pub async fn send_contact_request(api: &ApiClient, token: &str, request: &ContactRequest) -> Result<(), SubmitError> {
    request.validate()?;
    api.post_opt::<Value, _>(&endpoints::public_contact(token), Some(request), &RequestOptions::default())
        .await
        .map_err(|e| SubmitError::or_fallback(&e, messages::CONTACT_FAILED))?;
    Ok(())
}

// =============================================================================
// WIZARD
// =============================================================================

#[must_use]
pub fn profile_steps() -> Vec<WizardStep> {
    vec![
        WizardStep::new("basic", "Informações Básicas")
            .with_description("Comece com suas informações de contato e foto de perfil")
            .with_fields(&["full_name", "phone", "city"]),
        WizardStep::new("position", "Posição & Experiência")
            .with_description("Conte-nos sobre sua experiência em vendas")
            .with_fields(&["current_position"]),
        WizardStep::new("tools", "Ferramentas & Software").with_description("Quais ferramentas você domina?"),
        WizardStep::new("solutions", "Soluções & Departamentos")
            .with_description("Experiência por segmento e buyer persona"),
        WizardStep::new("history", "Histórico de Trabalho, Bio & Vídeo")
            .with_description("Finalize seu perfil com suas experiências e vídeo pitch"),
    ]
}

#[must_use]
pub fn profile_schema() -> ValidationSchema {
    ValidationSchema::new()
        .field("full_name", rules::full_name())
        .field("phone", rules::phone())
        .field("city", rules::required())
        .field("current_position", rules::required())
        .field("cpf", rules::cpf())
}

/// Record wizard position metadata (`current_step`, `last_saved` in
/// milliseconds since the epoch) alongside the draft fields.
pub fn record_wizard_position(draft: &DraftAutoSave, current_step: usize) {
    let now_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX));
    let mut meta = FormDraft::new();
    meta.insert("current_step".into(), json!(current_step));
    meta.insert("last_saved".into(), json!(now_ms));
    draft.update(meta);
}

// =============================================================================
// API
// =============================================================================

/// # Errors
///
/// See [`RequestError`].
pub async fn get_upload_url(
    api: &ApiClient,
    filename: &str,
    content_type: &str,
    kind: UploadKind,
) -> Result<PresignedUpload, RequestError> {
    let options = RequestOptions::new()
        .param("filename", filename)
        .param("content_type", content_type)
        .param("type", kind.as_str());
    api.get(endpoints::UPLOAD_URL, &options).await
}

/// # Errors
///
/// See [`RequestError`].
pub async fn fetch_profile(api: &ApiClient) -> Result<CandidateProfile, RequestError> {
    api.get(endpoints::PROFILE, &RequestOptions::default()).await
}

/// # Errors
///
/// See [`RequestError`].
pub async fn create_profile(api: &ApiClient, data: &CandidateFormData) -> Result<CandidateProfile, RequestError> {
    let profile: CandidateProfile = api.post(endpoints::CREATE, data, &RequestOptions::default()).await?;
    info!(profile_id = ?profile.id, "candidate profile created");
    Ok(profile)
}

/// # Errors
///
/// See [`RequestError`].
pub async fn save_profile_draft(
    api: &ApiClient,
    profile_id: u64,
    data: &FormDraft,
) -> Result<CandidateProfile, RequestError> {
    api.patch(&endpoints::draft(profile_id), data, &RequestOptions::default()).await
}

/// # Errors
///
/// See [`RequestError`].
pub async fn update_profile_photo(
    api: &ApiClient,
    profile_id: u64,
    photo_url: &str,
) -> Result<CandidateProfile, RequestError> {
    let body = json!({ "profile_photo_url": photo_url });
    api.put(&endpoints::photo(profile_id), &body, &RequestOptions::default()).await
}

/// # Errors
///
/// See [`RequestError`].
pub async fn update_pitch_video(
    api: &ApiClient,
    profile_id: u64,
    video_url: &str,
    video_type: VideoType,
) -> Result<CandidateProfile, RequestError> {
    let body = json!({ "pitch_video_url": video_url, "pitch_video_type": video_type });
    api.put(&endpoints::video(profile_id), &body, &RequestOptions::default()).await
}

#[cfg(test)]
#[path = "candidates_test.rs"]
mod tests;
