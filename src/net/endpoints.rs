//! Backend REST paths. Dynamic segments are built by the functions.

pub mod auth {
    pub const LOGIN: &str = "/api/v1/auth/login";
    pub const LOGOUT: &str = "/api/v1/auth/logout";
    pub const ME: &str = "/api/v1/auth/me";
    pub const REGISTER_CANDIDATE: &str = "/api/v1/auth/register/candidate";
    pub const REGISTER_COMPANY: &str = "/api/v1/auth/register/company";
}

pub mod admin {
    pub const USERS: &str = "/api/v1/admin/users";
    pub const PENDING_COUNT: &str = "/api/v1/admin/pending-count";
    pub const STATS: &str = "/api/v1/admin/stats";

    #[must_use]
    pub fn user_detail(user_id: &str) -> String {
        format!("{USERS}/{user_id}")
    }

    /// Status updates are a PATCH on the detail resource.
    #[must_use]
    pub fn update_user_status(user_id: &str) -> String {
        user_detail(user_id)
    }
}

pub mod candidates {
    pub const CREATE: &str = "/api/v1/candidates/";
    pub const PROFILE: &str = "/api/v1/candidates/profile";
    pub const UPLOAD_URL: &str = "/api/v1/candidates/upload-url";
    /// Admin-only listing of every candidate profile.
    pub const ADMIN_LIST: &str = "/api/v1/candidates/admin/candidates";
    pub const ADMIN_CREATE: &str = "/api/v1/candidates/admin/candidates/create";
    pub const ADMIN_PARSE_CSV: &str = "/api/v1/candidates/admin/parse-csv";
    pub const ADMIN_IMPORT: &str = "/api/v1/candidates/admin/import";

    #[must_use]
    pub fn draft(profile_id: u64) -> String {
        format!("/api/v1/candidates/{profile_id}/draft")
    }

    #[must_use]
    pub fn photo(profile_id: u64) -> String {
        format!("/api/v1/candidates/{profile_id}/photo")
    }

    #[must_use]
    pub fn video(profile_id: u64) -> String {
        format!("/api/v1/candidates/{profile_id}/video")
    }

    #[must_use]
    pub fn generate_share_token(profile_id: u64) -> String {
        format!("/api/v1/candidates/{profile_id}/generate-share-token")
    }

    #[must_use]
    pub fn toggle_sharing(profile_id: u64) -> String {
        format!("/api/v1/candidates/{profile_id}/toggle-sharing")
    }

    #[must_use]
    pub fn public_profile(token: &str) -> String {
        format!("/api/v1/candidates/public/{token}")
    }

    #[must_use]
    pub fn public_contact(token: &str) -> String {
        format!("/api/v1/candidates/public/{token}/contact")
    }

    #[must_use]
    pub fn import_status(task_id: &str) -> String {
        format!("{ADMIN_IMPORT}/{task_id}/status")
    }

    #[must_use]
    pub fn import_result(task_id: &str) -> String {
        format!("{ADMIN_IMPORT}/{task_id}/result")
    }

    #[must_use]
    pub fn import_error_log(task_id: &str) -> String {
        format!("{ADMIN_IMPORT}/{task_id}/error-log")
    }
}
