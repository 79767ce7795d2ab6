use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::Value;
use talentbase::admin::{
    self, AdminCandidateForm, CandidatesFilter, DuplicateStrategy, ImportRequest, RoleFilter, UserStatusFilter,
    UsersFilter,
};
use talentbase::auth::{AuthOutcome, CandidateRegistration, CompanyRegistration};
use talentbase::candidates::{self, ContactRequest, VideoType};
use talentbase::config::{ApiConfig, ConfigError};
use talentbase::context::AppContext;
use talentbase::draft::FormDraft;
use talentbase::formatting;
use talentbase::net::{RequestError, SubmitError};
use talentbase::routes::{self, AdminUsersQuery};
use talentbase::storage::{FileStorage, SharedStorage, Storage, StorageError};
use talentbase::upload::{UploadFile, UploadKind};
use talentbase::validation::ValidationResult;
use talentbase::validators;
use tracing_subscriber::EnvFilter;

/// Storage key for the bearer token saved by `login`.
const SESSION_TOKEN_KEY: &str = "session_token";

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("local storage failed: {0}")]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Request(#[from] RequestError),
    #[error("{0}")]
    Submit(SubmitError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("upload failed: {0}")]
    Upload(String),
    #[error("invalid value: {0}")]
    Invalid(String),
}

impl From<SubmitError> for CliError {
    fn from(error: SubmitError) -> Self {
        if let Some(fields) = error.fields() {
            for (field, message) in fields {
                eprintln!("  {field}: {message}");
            }
        }
        Self::Submit(error)
    }
}

#[derive(Parser, Debug)]
#[command(name = "talentbase", about = "TalentBase API CLI")]
struct Cli {
    /// Overrides the configured backend URL for this run.
    #[arg(long)]
    api_url: Option<String>,

    /// Bearer token; defaults to the one saved by `login`.
    #[arg(long, env = "TALENTBASE_TOKEN")]
    token: Option<String>,

    #[arg(long, env = "TALENTBASE_DATA_DIR", default_value = ".talentbase")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login {
        email: String,
        #[arg(long, env = "TALENTBASE_PASSWORD")]
        password: String,
    },
    Logout,
    Me,
    Register(RegisterCommand),
    Admin(AdminCommand),
    Upload(UploadArgs),
    Share(ShareCommand),
    Draft(DraftCommand),
    /// Check and format a single field value.
    Validate {
        #[arg(value_enum)]
        kind: FieldKind,
        value: String,
    },
}

#[derive(Args, Debug)]
struct RegisterCommand {
    #[command(subcommand)]
    command: RegisterSubcommand,
}

#[derive(Subcommand, Debug)]
enum RegisterSubcommand {
    Candidate {
        #[arg(long)]
        email: String,
        #[arg(long, env = "TALENTBASE_PASSWORD")]
        password: String,
        #[arg(long)]
        full_name: String,
        #[arg(long)]
        phone: String,
    },
    Company {
        #[arg(long)]
        company_name: String,
        #[arg(long)]
        cnpj: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "TALENTBASE_PASSWORD")]
        password: String,
        #[arg(long)]
        contact_name: String,
        #[arg(long)]
        contact_phone: String,
        #[arg(long)]
        website: Option<String>,
    },
}

#[derive(Args, Debug)]
struct AdminCommand {
    #[command(subcommand)]
    command: AdminSubcommand,
}

#[derive(Args, Debug, Clone)]
struct UsersArgs {
    #[arg(long, value_enum, default_value_t = RoleArg::All)]
    role: RoleArg,
    #[arg(long, value_enum, default_value_t = StatusArg::All)]
    status: StatusArg,
    #[arg(long)]
    search: Option<String>,
    #[arg(long)]
    page: Option<u32>,
}

#[derive(Subcommand, Debug)]
enum AdminSubcommand {
    Users(UsersArgs),
    User {
        user_id: String,
    },
    SetStatus {
        user_id: String,
        #[arg(long)]
        active: bool,
        #[arg(long)]
        reason: Option<String>,
    },
    Candidates {
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        page: Option<u32>,
    },
    PendingCount,
    Stats,
    /// Print the admin UI route for a filter instead of calling the API.
    Route(UsersArgs),
    /// Create a candidate from a JSON file, or from the saved admin draft.
    CreateCandidate {
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Bulk import candidates from a CSV file.
    Import {
        path: PathBuf,
        #[arg(long, value_enum, default_value_t = StrategyArg::Skip)]
        on_duplicate: StrategyArg,
        /// Override a suggested mapping, `Column=field` (empty field unmaps).
        #[arg(long = "map")]
        mappings: Vec<String>,
        /// Write the failed-rows CSV here when any row fails.
        #[arg(long)]
        error_log: Option<PathBuf>,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum StrategyArg {
    Skip,
    Update,
    Error,
}

impl From<StrategyArg> for DuplicateStrategy {
    fn from(strategy: StrategyArg) -> Self {
        match strategy {
            StrategyArg::Skip => Self::Skip,
            StrategyArg::Update => Self::Update,
            StrategyArg::Error => Self::Error,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum RoleArg {
    All,
    Admin,
    Candidate,
    Company,
}

impl From<RoleArg> for RoleFilter {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::All => Self::All,
            RoleArg::Admin => Self::Admin,
            RoleArg::Candidate => Self::Candidate,
            RoleArg::Company => Self::Company,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum StatusArg {
    All,
    Active,
    Inactive,
    Pending,
    Approved,
    Rejected,
}

impl From<StatusArg> for UserStatusFilter {
    fn from(status: StatusArg) -> Self {
        match status {
            StatusArg::All => Self::All,
            StatusArg::Active => Self::Active,
            StatusArg::Inactive => Self::Inactive,
            StatusArg::Pending => Self::Pending,
            StatusArg::Approved => Self::Approved,
            StatusArg::Rejected => Self::Rejected,
        }
    }
}

#[derive(Args, Debug)]
struct UploadArgs {
    path: PathBuf,
    #[arg(long, value_enum, default_value_t = KindArg::Photo)]
    kind: KindArg,
    /// Attach the uploaded file to this candidate profile.
    #[arg(long)]
    profile_id: Option<u64>,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum KindArg {
    Photo,
    Video,
}

#[derive(Args, Debug)]
struct ShareCommand {
    #[command(subcommand)]
    command: ShareSubcommand,
}

#[derive(Subcommand, Debug)]
enum ShareSubcommand {
    /// Generate a new public link (the previous one stops working).
    Generate { profile_id: u64 },
    Enable { profile_id: u64 },
    Disable { profile_id: u64 },
    /// Show the public profile behind a share token.
    Show { token: String },
    Contact {
        token: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        message: String,
    },
}

#[derive(Args, Debug)]
struct DraftCommand {
    #[command(subcommand)]
    command: DraftSubcommand,
}

#[derive(Subcommand, Debug)]
enum DraftSubcommand {
    Show {
        #[arg(default_value = candidates::DRAFT_STORAGE_KEY)]
        key: String,
    },
    Set {
        field: String,
        /// JSON value; bare words are stored as strings.
        value: String,
        #[arg(long, default_value = candidates::DRAFT_STORAGE_KEY)]
        key: String,
    },
    Clear {
        #[arg(default_value = candidates::DRAFT_STORAGE_KEY)]
        key: String,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum FieldKind {
    Email,
    Password,
    Phone,
    Cnpj,
    Cpf,
    Url,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Command::Validate { kind, value } = &cli.command {
        return run_validate(*kind, value);
    }

    let config = ApiConfig::from_env()?;
    if let Some(url) = &cli.api_url {
        config.runtime.set_api_url(url.clone());
    }
    config.validate()?;

    let storage: SharedStorage = Arc::new(FileStorage::new(&cli.data_dir)?);
    let token = match cli.token {
        Some(token) => Some(token),
        None => storage.get_item(SESSION_TOKEN_KEY)?,
    };
    let ctx = AppContext::server(config, token, Arc::clone(&storage))?;

    match cli.command {
        Command::Login { email, password } => {
            let outcome = ctx.auth_service().login(&email, &password).await?;
            save_token(&storage, &outcome)?;
            print_outcome(&outcome)
        }
        Command::Logout => {
            ctx.auth_service().logout().await?;
            storage.remove_item(SESSION_TOKEN_KEY)?;
            println!("logged out");
            Ok(())
        }
        Command::Me => {
            let user = ctx.auth_service().me().await?;
            print_json(&serde_json::to_value(user)?)
        }
        Command::Register(register) => run_register(&ctx, &storage, register).await,
        Command::Admin(admin) => run_admin(&ctx, admin).await,
        Command::Upload(args) => run_upload(&ctx, args).await,
        Command::Share(share) => run_share(&ctx, share).await,
        Command::Draft(draft) => run_draft(&ctx, draft),
        Command::Validate { .. } => Ok(()),
    }
}

async fn run_register(ctx: &AppContext, storage: &SharedStorage, register: RegisterCommand) -> Result<(), CliError> {
    let service = ctx.auth_service();
    let outcome = match register.command {
        RegisterSubcommand::Candidate { email, password, full_name, phone } => {
            let form = CandidateRegistration { email, confirm_password: password.clone(), password, full_name, phone };
            service.register_candidate(&form).await?
        }
        RegisterSubcommand::Company {
            company_name,
            cnpj,
            email,
            password,
            contact_name,
            contact_phone,
            website,
        } => {
            let form = CompanyRegistration {
                company_name,
                cnpj,
                email,
                confirm_password: password.clone(),
                password,
                contact_person_name: contact_name,
                contact_person_phone: contact_phone,
                website,
            };
            service.register_company(&form).await?
        }
    };
    save_token(storage, &outcome)?;
    print_outcome(&outcome)
}

async fn run_admin(ctx: &AppContext, admin: AdminCommand) -> Result<(), CliError> {
    let api = ctx.api();
    let value = match admin.command {
        AdminSubcommand::Users(args) => {
            let filter = UsersFilter {
                role: args.role.into(),
                status: args.status.into(),
                search: args.search,
                page: args.page,
            };
            serde_json::to_value(admin::fetch_users(api, &filter).await?)?
        }
        AdminSubcommand::User { user_id } => serde_json::to_value(admin::fetch_user_detail(api, &user_id).await?)?,
        AdminSubcommand::SetStatus { user_id, active, reason } => {
            let detail = admin::update_user_status(api, &user_id, active, reason.as_deref()).await?;
            serde_json::to_value(detail)?
        }
        AdminSubcommand::Candidates { search, status, page } => {
            let filter = CandidatesFilter { search, status, page, page_size: None };
            serde_json::to_value(admin::fetch_candidates(api, &filter).await?)?
        }
        AdminSubcommand::PendingCount => Value::from(admin::fetch_pending_count(api).await?),
        AdminSubcommand::Stats => serde_json::to_value(admin::fetch_stats(api).await?)?,
        AdminSubcommand::Route(args) => {
            let query = AdminUsersQuery {
                status: args.status.into(),
                role: args.role.into(),
                search: args.search,
                page: args.page,
            };
            println!("{}", routes::build_admin_users_route(&query));
            return Ok(());
        }
        AdminSubcommand::CreateCandidate { file } => return run_create_candidate(ctx, file).await,
        AdminSubcommand::Import { path, on_duplicate, mappings, error_log } => {
            return run_import(ctx, &path, on_duplicate.into(), &mappings, error_log.as_deref()).await;
        }
    };
    print_json(&value)
}

async fn run_create_candidate(ctx: &AppContext, file: Option<PathBuf>) -> Result<(), CliError> {
    let draft = ctx.draft(admin::ADMIN_CANDIDATE_DRAFT_KEY, FormDraft::new());
    let form: AdminCandidateForm = match &file {
        Some(path) => serde_json::from_str(&tokio::fs::read_to_string(path).await?)?,
        None => AdminCandidateForm::from_draft(&draft.data())?,
    };
    let steps = admin::admin_candidate_steps();
    if let Some(index) = (0..steps.len()).find(|index| !form.step_is_complete(*index)) {
        let label = &steps[index].label;
        return Err(CliError::Invalid(format!("step {} ({label}) is incomplete", index + 1)));
    }

    let created = admin::create_candidate(ctx.api(), &form).await?;
    if file.is_none() {
        draft.clear();
    }
    eprintln!("{}", created.redirect_to());
    print_json(&serde_json::to_value(created)?)
}

async fn run_import(
    ctx: &AppContext,
    path: &Path,
    strategy: DuplicateStrategy,
    mappings: &[String],
    error_log: Option<&Path>,
) -> Result<(), CliError> {
    let api = ctx.api();
    let filename = path.file_name().and_then(|n| n.to_str()).unwrap_or_default().to_owned();
    let preview = admin::parse_csv(api, &filename, tokio::fs::read(path).await?).await?;
    eprintln!("{} rows, columns: {}", preview.total_rows, preview.columns.join(", "));

    let mut request = ImportRequest::from_preview(&preview, strategy);
    for mapping in mappings {
        let (column, field) = mapping
            .split_once('=')
            .ok_or_else(|| CliError::Invalid(format!("mapping must be Column=field: {mapping}")))?;
        request.map_column(column, field);
    }

    let task_id = admin::start_import(api, &request).await?;
    let summary = admin::wait_for_import(api, &task_id, admin::import_poll_interval(), |status| {
        if let (Some(current), Some(total)) = (status.current, status.total) {
            eprint!("\r{current} de {total}");
        }
    })
    .await?;
    eprintln!();

    if let Some(out) = error_log.filter(|_| !summary.errors.is_empty()) {
        tokio::fs::write(out, admin::download_import_error_log(api, &task_id).await?).await?;
        eprintln!("error log written to {}", out.display());
    }
    print_json(&serde_json::to_value(summary)?)
}

async fn run_share(ctx: &AppContext, share: ShareCommand) -> Result<(), CliError> {
    let api = ctx.api();
    let value = match share.command {
        ShareSubcommand::Generate { profile_id } => {
            serde_json::to_value(candidates::generate_share_link(api, profile_id).await?)?
        }
        ShareSubcommand::Enable { profile_id } => {
            Value::from(candidates::set_public_sharing(api, profile_id, true).await?)
        }
        ShareSubcommand::Disable { profile_id } => {
            Value::from(candidates::set_public_sharing(api, profile_id, false).await?)
        }
        ShareSubcommand::Show { token } => match candidates::fetch_public_profile(api, &token).await? {
            Some(profile) => serde_json::to_value(profile)?,
            None => return Err(CliError::Invalid(format!("no public profile for {token}"))),
        },
        ShareSubcommand::Contact { token, name, email, message } => {
            candidates::send_contact_request(api, &token, &ContactRequest { name, email, message }).await?;
            println!("message sent");
            return Ok(());
        }
    };
    print_json(&value)
}

async fn run_upload(ctx: &AppContext, args: UploadArgs) -> Result<(), CliError> {
    let file = UploadFile::from_path(&args.path).await?;
    let kind = match args.kind {
        KindArg::Photo => UploadKind::Photo,
        KindArg::Video => UploadKind::Video,
    };

    let controller = ctx.uploader();
    let mut updates = controller.subscribe();
    let progress = tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let state = updates.borrow_and_update().clone();
            if state.is_uploading {
                eprint!("\r{:>3}%", state.progress);
            }
        }
    });

    let file_url = controller.upload_file(&file, kind).await;
    progress.abort();
    eprintln!();

    let Some(file_url) = file_url else {
        let message = controller.state().error.unwrap_or_else(|| "unknown error".to_owned());
        return Err(CliError::Upload(message));
    };
    println!("{file_url}");

    if let Some(profile_id) = args.profile_id {
        let profile = match kind {
            UploadKind::Photo => candidates::update_profile_photo(ctx.api(), profile_id, &file_url).await?,
            UploadKind::Video => {
                candidates::update_pitch_video(ctx.api(), profile_id, &file_url, VideoType::S3).await?
            }
        };
        print_json(&serde_json::to_value(profile)?)?;
    }
    Ok(())
}

fn run_draft(ctx: &AppContext, draft: DraftCommand) -> Result<(), CliError> {
    match draft.command {
        DraftSubcommand::Show { key } => {
            let draft = ctx.draft(&key, FormDraft::new());
            if !draft.has_draft() {
                eprintln!("no saved draft under {key}");
            }
            print_json(&Value::Object(draft.data()))
        }
        DraftSubcommand::Set { field, value, key } => {
            let draft = ctx.draft(&key, FormDraft::new());
            let value = serde_json::from_str(&value).unwrap_or(Value::String(value));
            let mut partial = FormDraft::new();
            partial.insert(field, value);
            draft.update(partial);
            if !draft.save() {
                return Err(CliError::Invalid(format!("could not save draft {key}")));
            }
            print_json(&Value::Object(draft.data()))
        }
        DraftSubcommand::Clear { key } => {
            ctx.draft(&key, FormDraft::new()).clear();
            println!("cleared {key}");
            Ok(())
        }
    }
}

fn run_validate(kind: FieldKind, value: &str) -> Result<(), CliError> {
    let (result, formatted): (ValidationResult, Option<String>) = match kind {
        FieldKind::Email => (validators::validate_email(value), None),
        FieldKind::Password => (validators::validate_password(value), None),
        FieldKind::Phone => (validators::validate_phone(value), Some(formatting::format_phone(value))),
        FieldKind::Cnpj => (validators::validate_cnpj(value), Some(formatting::format_cnpj(value))),
        FieldKind::Cpf => (validators::validate_cpf(value), Some(formatting::format_cpf(value))),
        FieldKind::Url => (validators::validate_url(value, true), None),
    };
    if !result.is_valid {
        return Err(CliError::Invalid(result.error.unwrap_or_default()));
    }
    println!("{}", formatted.as_deref().unwrap_or(value));
    Ok(())
}

fn save_token(storage: &SharedStorage, outcome: &AuthOutcome) -> Result<(), CliError> {
    if let Some(token) = &outcome.token {
        storage.set_item(SESSION_TOKEN_KEY, token)?;
    }
    Ok(())
}

fn print_outcome(outcome: &AuthOutcome) -> Result<(), CliError> {
    if let Some(message) = &outcome.message {
        eprintln!("{message}");
    }
    print_json(&serde_json::json!({
        "user": outcome.user,
        "redirect_to": outcome.redirect_to,
    }))
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
