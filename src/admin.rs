//! Admin API: user management, candidate listing and creation, and bulk
//! CSV import. Called from server-side handlers with the admin's forwarded
//! token.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::{debug, info, warn};

use crate::auth::Role;
use crate::candidates::{Experience, Language, VideoType};
use crate::config::env_parse;
use crate::draft::FormDraft;
use crate::messages;
use crate::net::endpoints::admin as endpoints;
use crate::net::endpoints::candidates as candidate_endpoints;
use crate::net::{ApiClient, RequestError, RequestOptions, SubmitError};
use crate::routes::{self, AdminCandidatesQuery};
use crate::validation::FormErrors;
use crate::validators::{validate_email, validate_phone};
use crate::wizard::WizardStep;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum RoleFilter {
    #[default]
    All,
    Admin,
    Candidate,
    Company,
}

impl RoleFilter {
    /// Query value, or `None` for `All`.
    #[must_use]
    pub fn as_param(self) -> Option<&'static str> {
        match self {
            Self::All => None,
            Self::Admin => Some("admin"),
            Self::Candidate => Some("candidate"),
            Self::Company => Some("company"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum UserStatusFilter {
    #[default]
    All,
    Active,
    Inactive,
    Pending,
    Approved,
    Rejected,
}

impl UserStatusFilter {
    /// Query value, or `None` for `All`.
    #[must_use]
    pub fn as_param(self) -> Option<&'static str> {
        match self {
            Self::All => None,
            Self::Active => Some("active"),
            Self::Inactive => Some("inactive"),
            Self::Pending => Some("pending"),
            Self::Approved => Some("approved"),
            Self::Rejected => Some("rejected"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsersFilter {
    pub role: RoleFilter,
    pub status: UserStatusFilter,
    pub search: Option<String>,
    pub page: Option<u32>,
}

impl UsersFilter {
    #[must_use]
    pub fn to_options(&self) -> RequestOptions {
        let mut options = RequestOptions::new();
        if let Some(role) = self.role.as_param() {
            options = options.param("role", role);
        }
        if let Some(status) = self.status.as_param() {
            options = options.param("status", status);
        }
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            options = options.param("search", search);
        }
        if let Some(page) = self.page.filter(|p| *p > 0) {
            options = options.param("page", page);
        }
        options
    }
}

const DEFAULT_CANDIDATES_PAGE_SIZE: u32 = 20;

/// Admin candidate listing filter. Unlike users, page and page size are
/// always sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidatesFilter {
    pub search: Option<String>,
    /// `all` or empty sends nothing.
    pub status: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl CandidatesFilter {
    #[must_use]
    pub fn to_options(&self) -> RequestOptions {
        let mut options = RequestOptions::new()
            .param("page", self.page.filter(|p| *p > 0).unwrap_or(1))
            .param("page_size", self.page_size.filter(|s| *s > 0).unwrap_or(DEFAULT_CANDIDATES_PAGE_SIZE));
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            options = options.param("search", search);
        }
        if let Some(status) = self.status.as_deref().filter(|s| !s.is_empty() && *s != "all") {
            options = options.param("status", status);
        }
        options
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Active,
    Inactive,
    Pending,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminUser {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub email: String,
    pub role: Role,
    pub status: AccountStatus,
    #[serde(default)]
    pub created_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserProfileSummary {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub company_name: Option<String>,
    pub website: Option<String>,
    pub contact_person_name: Option<String>,
    pub contact_person_email: Option<String>,
    pub contact_person_phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDetail {
    #[serde(flatten)]
    pub user: AdminUser,
    pub is_active: bool,
    #[serde(default)]
    pub updated_at: String,
    #[serde(default)]
    pub profile: Option<UserProfileSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsersPage {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<AdminUser>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateStatus {
    Available,
    Hired,
    Inactive,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportSource {
    Csv,
    Registration,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminCandidate {
    pub id: String,
    pub full_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub current_position: Option<String>,
    #[serde(default)]
    pub years_of_experience: Option<f64>,
    #[serde(default)]
    pub status: Option<CandidateStatus>,
    #[serde(default)]
    pub profile_photo_url: Option<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub import_source: Option<ImportSource>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidatesPage {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<AdminCandidate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub user_email: String,
    pub user_role: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminStats {
    pub total_users: u64,
    pub total_candidates: u64,
    pub total_companies: u64,
    pub total_admins: u64,
    pub pending_approvals: u64,
    pub active_jobs: u64,
    #[serde(default)]
    pub recent_activity: Vec<ActivityEntry>,
}

#[derive(Deserialize)]
struct PendingCount {
    count: u64,
}

/// # Errors
///
/// See [`RequestError`].
pub async fn fetch_users(api: &ApiClient, filter: &UsersFilter) -> Result<UsersPage, RequestError> {
    api.get(endpoints::USERS, &filter.to_options()).await
}

/// # Errors
///
/// See [`RequestError`].
pub async fn fetch_user_detail(api: &ApiClient, user_id: &str) -> Result<UserDetail, RequestError> {
    api.get(&endpoints::user_detail(user_id), &RequestOptions::default()).await
}

/// Approve or deactivate an account. `reason` is only sent when present.
///
/// # Errors
///
/// See [`RequestError`].
pub async fn update_user_status(
    api: &ApiClient,
    user_id: &str,
    is_active: bool,
    reason: Option<&str>,
) -> Result<UserDetail, RequestError> {
    let mut body = json!({ "is_active": is_active });
    if let Some(reason) = reason.filter(|r| !r.is_empty()) {
        body["reason"] = json!(reason);
    }
    let detail: UserDetail = api
        .patch(&endpoints::update_user_status(user_id), &body, &RequestOptions::default())
        .await?;
    info!(user_id, is_active, "user status updated");
    Ok(detail)
}

/// # Errors
///
/// See [`RequestError`].
pub async fn fetch_pending_count(api: &ApiClient) -> Result<u64, RequestError> {
    let pending: PendingCount = api.get(endpoints::PENDING_COUNT, &RequestOptions::default()).await?;
    Ok(pending.count)
}

/// # Errors
///
/// See [`RequestError`].
pub async fn fetch_candidates(api: &ApiClient, filter: &CandidatesFilter) -> Result<CandidatesPage, RequestError> {
    api.get(candidate_endpoints::ADMIN_LIST, &filter.to_options()).await
}

/// # Errors
///
/// See [`RequestError`].
pub async fn fetch_stats(api: &ApiClient) -> Result<AdminStats, RequestError> {
    api.get(endpoints::STATS, &RequestOptions::default()).await
}

// =============================================================================
// CANDIDATE CREATION
// =============================================================================

pub const ADMIN_CANDIDATE_DRAFT_KEY: &str = "admin_candidate_draft";

/// Everything an admin can fill in when creating a candidate on their
/// behalf. Unset optionals are left out of the payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminCandidateForm {
    pub email: String,
    pub full_name: String,
    pub phone: String,
    pub city: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpf: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_photo_url: Option<String>,

    pub current_position: String,
    pub years_of_experience: f64,
    pub sales_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sales_cycle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_ticket: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub academic_degree: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,

    pub tools_software: Vec<String>,
    pub top_skills: Vec<String>,
    pub languages: Vec<Language>,

    pub solutions_sold: Vec<String>,
    pub departments_sold_to: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relocation_availability: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub travel_availability: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accepts_pj: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_pcd: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum_salary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_drivers_license: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_vehicle: Option<bool>,

    pub experiences: Vec<Experience>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pitch_video_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pitch_video_type: Option<VideoType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_signed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interview_date: Option<String>,

    pub send_welcome_email: bool,
}

impl AdminCandidateForm {
    #[must_use]
    pub fn to_draft(&self) -> FormDraft {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => FormDraft::new(),
        }
    }

    /// # Errors
    ///
    /// Returns the decode error when a present field has the wrong shape.
    pub fn from_draft(draft: &FormDraft) -> Result<Self, serde_json::Error> {
        serde_json::from_value(Value::Object(draft.clone()))
    }

    /// Whether the wizard may leave step `index`. The last two steps are
    /// all optional; an index past the end never passes.
    #[must_use]
    pub fn step_is_complete(&self, index: usize) -> bool {
        match index {
            0 => {
                validate_email(&self.email).is_valid
                    && !self.full_name.trim().is_empty()
                    && validate_phone(&self.phone).is_valid
                    && !self.city.trim().is_empty()
            }
            1 => !self.current_position.is_empty() && self.years_of_experience > 0.0 && !self.sales_type.is_empty(),
            2 => !self.tools_software.is_empty(),
            3 => !self.solutions_sold.is_empty() && !self.departments_sold_to.is_empty(),
            4 | 5 => true,
            _ => false,
        }
    }
}

#[must_use]
pub fn admin_candidate_steps() -> Vec<WizardStep> {
    vec![
        WizardStep::new("1", "Informações Básicas").with_description("Email, nome, telefone e contatos"),
        WizardStep::new("2", "Posição & Experiência").with_description("Cargo, tempo de experiência e formação"),
        WizardStep::new("3", "Ferramentas & Habilidades").with_description("Tecnologias, skills e idiomas"),
        WizardStep::new("4", "Soluções & Departamentos").with_description("Experiência por segmento e buyer persona"),
        WizardStep::new("5", "Preferências de Trabalho")
            .with_description("Modelo de trabalho, disponibilidade e remuneração"),
        WizardStep::new("6", "Histórico & Vídeo").with_description("Experiências profissionais e vídeo pitch"),
    ]
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedCandidate {
    #[serde(deserialize_with = "crate::auth::id_from_string_or_number")]
    pub id: String,
    pub email: String,
    pub full_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateCandidateResponse {
    #[serde(default)]
    pub success: bool,
    pub candidate: CreatedCandidate,
    #[serde(default)]
    pub email_sent: bool,
}

impl CreateCandidateResponse {
    /// Candidate list with the "created" banner flags.
    #[must_use]
    pub fn redirect_to(&self) -> String {
        routes::build_admin_candidates_route(&AdminCandidatesQuery {
            created: Some(true),
            email_sent: Some(self.email_sent),
            ..AdminCandidatesQuery::default()
        })
    }
}

/// Create a candidate profile (and its user) as an admin.
///
/// # Errors
///
/// A 400 naming `email` means the address is taken and becomes a field
/// error; anything else is one generic message.
pub async fn create_candidate(
    api: &ApiClient,
    form: &AdminCandidateForm,
) -> Result<CreateCandidateResponse, SubmitError> {
    match api.post::<CreateCandidateResponse, _>(candidate_endpoints::ADMIN_CREATE, form, &RequestOptions::default()).await
    {
        Ok(created) => {
            info!(candidate_id = %created.candidate.id, email_sent = created.email_sent, "candidate created by admin");
            Ok(created)
        }
        Err(e) => {
            warn!(error = %e, "admin candidate creation failed");
            let duplicate_email = e
                .api()
                .filter(|err| err.status == 400)
                .and_then(|err| err.data.as_ref())
                .is_some_and(|data| data.get("email").is_some());
            if duplicate_email {
                let fields = FormErrors::from([("email".to_owned(), messages::DUPLICATE_EMAIL.to_owned())]);
                return Err(SubmitError::validation(fields));
            }
            Err(SubmitError::general(messages::CANDIDATE_CREATE_FAILED))
        }
    }
}

// =============================================================================
// CSV IMPORT
// =============================================================================

pub const MAX_CSV_BYTES: usize = 10 * 1024 * 1024;
const DEFAULT_IMPORT_POLL_MS: u64 = 2_000;

/// Optional `TALENTBASE_IMPORT_POLL_MS`: status poll interval, default 2000.
#[must_use]
pub fn import_poll_interval() -> Duration {
    Duration::from_millis(env_parse("TALENTBASE_IMPORT_POLL_MS", DEFAULT_IMPORT_POLL_MS))
}

/// What to do with a row whose email already exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateStrategy {
    #[default]
    Skip,
    Update,
    Error,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CsvPreview {
    pub columns: Vec<String>,
    #[serde(default)]
    pub preview_rows: Vec<Map<String, Value>>,
    /// CSV column → profile field.
    #[serde(default)]
    pub suggested_mapping: BTreeMap<String, String>,
    pub total_rows: u64,
    pub file_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRequest {
    pub file_id: String,
    pub column_mapping: BTreeMap<String, String>,
    pub duplicate_strategy: DuplicateStrategy,
}

impl ImportRequest {
    /// Start from the backend's suggested mapping.
    #[must_use]
    pub fn from_preview(preview: &CsvPreview, duplicate_strategy: DuplicateStrategy) -> Self {
        Self {
            file_id: preview.file_id.clone(),
            column_mapping: preview.suggested_mapping.clone(),
            duplicate_strategy,
        }
    }

    /// Map `column` to `field`; an empty field unmaps it.
    pub fn map_column(&mut self, column: &str, field: &str) {
        if field.is_empty() {
            self.column_mapping.remove(column);
        } else {
            self.column_mapping.insert(column.to_owned(), field.to_owned());
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ImportTaskState {
    Pending,
    Progress,
    Success,
    Failure,
    /// Worker states the page does not distinguish (started, retry).
    #[serde(other)]
    Other,
}

impl ImportTaskState {
    #[must_use]
    pub fn is_finished(self) -> bool {
        matches!(self, Self::Success | Self::Failure)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportStatus {
    pub task_id: String,
    pub status: ImportTaskState,
    #[serde(default)]
    pub progress: Option<f64>,
    #[serde(default)]
    pub current: Option<u64>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub success: Option<u64>,
    #[serde(default)]
    pub errors: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportRowError {
    pub row: u64,
    #[serde(default, rename = "nome")]
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub total: u64,
    pub success: u64,
    #[serde(default)]
    pub skipped: u64,
    #[serde(default)]
    pub errors: Vec<ImportRowError>,
    #[serde(default)]
    pub error_file_url: Option<String>,
}

#[derive(Deserialize)]
struct ImportStarted {
    task_id: String,
}

/// Upload a CSV for parsing. Returns column suggestions and a preview.
///
/// # Errors
///
/// Rejects non-`.csv` names and files over [`MAX_CSV_BYTES`] locally;
/// otherwise the server `error` message or a generic one.
pub async fn parse_csv(api: &ApiClient, filename: &str, bytes: Vec<u8>) -> Result<CsvPreview, SubmitError> {
    if !filename.to_ascii_lowercase().ends_with(".csv") {
        return Err(SubmitError::general(messages::CSV_WRONG_TYPE));
    }
    if bytes.len() > MAX_CSV_BYTES {
        return Err(SubmitError::general(messages::CSV_TOO_LARGE));
    }
    let form = Form::new().part("file", Part::bytes(bytes).file_name(filename.to_owned()));
    let preview: CsvPreview = api
        .post_multipart(candidate_endpoints::ADMIN_PARSE_CSV, form, &RequestOptions::default())
        .await
        .map_err(|e| SubmitError::or_fallback(&e, messages::CSV_PARSE_FAILED))?;
    info!(file_id = %preview.file_id, rows = preview.total_rows, "csv parsed");
    Ok(preview)
}

/// Queue the import. Returns the background task id.
///
/// # Errors
///
/// The server `error` message or a generic one.
pub async fn start_import(api: &ApiClient, request: &ImportRequest) -> Result<String, SubmitError> {
    let started: ImportStarted = api
        .post(candidate_endpoints::ADMIN_IMPORT, request, &RequestOptions::default())
        .await
        .map_err(|e| SubmitError::or_fallback(&e, messages::IMPORT_START_FAILED))?;
    info!(task_id = %started.task_id, "csv import started");
    Ok(started.task_id)
}

/// # Errors
///
/// See [`RequestError`].
pub async fn fetch_import_status(api: &ApiClient, task_id: &str) -> Result<ImportStatus, RequestError> {
    api.get(&candidate_endpoints::import_status(task_id), &RequestOptions::default()).await
}

/// # Errors
///
/// See [`RequestError`].
pub async fn fetch_import_result(api: &ApiClient, task_id: &str) -> Result<ImportSummary, RequestError> {
    api.get(&candidate_endpoints::import_result(task_id), &RequestOptions::default()).await
}

/// CSV of the rows that failed.
///
/// # Errors
///
/// See [`RequestError`].
pub async fn download_import_error_log(api: &ApiClient, task_id: &str) -> Result<Vec<u8>, RequestError> {
    api.get_bytes(&candidate_endpoints::import_error_log(task_id), &RequestOptions::default()).await
}

/// Poll the task every `interval` until it finishes, reporting each status,
/// then fetch the summary.
///
/// Network errors and 5xx responses are logged and polling continues;
/// any other error status ends the wait.
///
/// # Errors
///
/// [`messages::IMPORT_FAILED`] when the task fails, or the mapped request
/// error.
pub async fn wait_for_import(
    api: &ApiClient,
    task_id: &str,
    interval: Duration,
    mut on_status: impl FnMut(&ImportStatus),
) -> Result<ImportSummary, SubmitError> {
    loop {
        tokio::time::sleep(interval).await;
        let status = match fetch_import_status(api, task_id).await {
            Ok(status) => status,
            Err(e) if is_transient(&e) => {
                warn!(task_id, error = %e, "import status poll failed; retrying");
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        on_status(&status);
        match status.status {
            ImportTaskState::Success => break,
            ImportTaskState::Failure => {
                warn!(task_id, "csv import failed");
                return Err(SubmitError::general(messages::IMPORT_FAILED));
            }
            _ => debug!(task_id, current = ?status.current, total = ?status.total, "csv import in progress"),
        }
    }
    let summary = fetch_import_result(api, task_id).await?;
    info!(task_id, success = summary.success, errors = summary.errors.len(), "csv import finished");
    Ok(summary)
}

fn is_transient(err: &RequestError) -> bool {
    match err {
        RequestError::Network(_) => true,
        RequestError::Api(api) => api.status >= 500,
        _ => false,
    }
}

#[cfg(test)]
#[path = "admin_test.rs"]
mod tests;
