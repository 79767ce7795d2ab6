//! Application route paths and builders.
//!
//! Builders omit the `all` filter value and only emit `page` past the first
//! page, so equivalent filters always produce the same URL.

use url::form_urlencoded;

use crate::admin::{RoleFilter, UserStatusFilter};
use crate::auth::Role;

pub const HOME: &str = "/";

pub mod auth {
    pub const LOGIN: &str = "/auth/login";
    pub const REGISTER: &str = "/auth/register";
    pub const CANDIDATE_REGISTER: &str = "/auth/register/candidate";
    pub const COMPANY_REGISTER: &str = "/auth/register/company";
    pub const REGISTRATION_PENDING: &str = "/auth/registration-pending";
    pub const LOGOUT: &str = "/auth/logout";
}

pub mod admin {
    pub const DASHBOARD: &str = "/admin";
    pub const USERS: &str = "/admin/users";
    pub const COMPANIES: &str = "/admin/companies";
    pub const CANDIDATES: &str = "/admin/candidates";
    pub const CANDIDATES_NEW: &str = "/admin/candidates/new";
    pub const JOBS: &str = "/admin/jobs";
    pub const APPLICATIONS: &str = "/admin/applications";
    pub const MATCHING: &str = "/admin/matching";
    pub const IMPORT_CANDIDATES: &str = "/admin/import/candidates";
}

pub mod candidate {
    pub const DASHBOARD: &str = "/candidate/dashboard";
    pub const PROFILE: &str = "/candidate/profile";
    pub const PROFILE_CREATE: &str = "/candidate/profile/create";
}

pub mod company {
    pub const DASHBOARD: &str = "/company/dashboard";
    pub const PROFILE: &str = "/company/profile";
    pub const JOBS: &str = "/company/jobs";
}

#[must_use]
pub fn share_candidate(token: &str) -> String {
    format!("/share/candidate/{token}")
}

fn with_query(path: &str, pairs: &[(&str, String)]) -> String {
    if pairs.is_empty() {
        return path.to_owned();
    }
    let query = form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish();
    format!("{path}?{query}")
}

fn encode_component(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminUsersQuery {
    pub status: UserStatusFilter,
    pub role: RoleFilter,
    pub search: Option<String>,
    pub page: Option<u32>,
}

/// `/admin/users` with `status`, `role`, `search`, `page` in that order.
#[must_use]
pub fn build_admin_users_route(query: &AdminUsersQuery) -> String {
    let mut pairs = Vec::new();
    if let Some(status) = query.status.as_param() {
        pairs.push(("status", status.to_owned()));
    }
    if let Some(role) = query.role.as_param() {
        pairs.push(("role", role.to_owned()));
    }
    if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
        pairs.push(("search", search.to_owned()));
    }
    if let Some(page) = query.page.filter(|p| *p > 1) {
        pairs.push(("page", page.to_string()));
    }
    with_query(admin::USERS, &pairs)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminCandidatesQuery {
    pub created: Option<bool>,
    pub email_sent: Option<bool>,
    pub search: Option<String>,
    pub page: Option<u32>,
}

#[must_use]
pub fn build_admin_candidates_route(query: &AdminCandidatesQuery) -> String {
    let mut pairs = Vec::new();
    if let Some(created) = query.created {
        pairs.push(("created", created.to_string()));
    }
    if let Some(email_sent) = query.email_sent {
        pairs.push(("email_sent", email_sent.to_string()));
    }
    if let Some(search) = query.search.as_deref().filter(|s| !s.is_empty()) {
        pairs.push(("search", search.to_owned()));
    }
    if let Some(page) = query.page.filter(|p| *p > 1) {
        pairs.push(("page", page.to_string()));
    }
    with_query(admin::CANDIDATES, &pairs)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardAction {
    GenerateLink,
    ToggleSharing,
}

impl DashboardAction {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GenerateLink => "generate-link",
            Self::ToggleSharing => "toggle-sharing",
        }
    }
}

#[must_use]
pub fn build_candidate_dashboard_route(action: Option<DashboardAction>) -> String {
    match action {
        Some(action) => with_query(candidate::DASHBOARD, &[("action", action.as_str().to_owned())]),
        None => candidate::DASHBOARD.to_owned(),
    }
}

/// Login page that returns to `return_to` afterwards (`returnTo` param).
#[must_use]
pub fn login_with_redirect(return_to: &str) -> String {
    format!("{}?returnTo={}", auth::LOGIN, encode_component(return_to))
}

/// Login redirect issued by server-side auth guards (`redirectTo` param).
#[must_use]
pub fn login_redirect_to(path: &str) -> String {
    format!("{}?redirectTo={}", auth::LOGIN, encode_component(path))
}

#[must_use]
pub fn pending_company_approvals() -> String {
    build_admin_users_route(&AdminUsersQuery {
        status: UserStatusFilter::Pending,
        role: RoleFilter::Company,
        ..AdminUsersQuery::default()
    })
}

#[must_use]
pub fn pending_candidate_approvals() -> String {
    build_admin_users_route(&AdminUsersQuery {
        status: UserStatusFilter::Pending,
        role: RoleFilter::Candidate,
        ..AdminUsersQuery::default()
    })
}

#[must_use]
pub fn all_pending_approvals() -> String {
    build_admin_users_route(&AdminUsersQuery { status: UserStatusFilter::Pending, ..AdminUsersQuery::default() })
}

/// Landing page after login when the backend sends no redirect.
#[must_use]
pub fn home_for_role(role: Role) -> &'static str {
    match role {
        Role::Admin => admin::DASHBOARD,
        Role::Candidate => candidate::DASHBOARD,
        Role::Company => company::DASHBOARD,
    }
}

#[must_use]
pub fn is_admin_route(path: &str) -> bool {
    path.starts_with("/admin")
}

#[must_use]
pub fn is_candidate_route(path: &str) -> bool {
    path.starts_with("/candidate")
}

#[must_use]
pub fn is_company_route(path: &str) -> bool {
    path.starts_with("/company")
}

#[must_use]
pub fn is_auth_route(path: &str) -> bool {
    path.starts_with("/auth")
}

#[must_use]
pub fn is_public_route(path: &str) -> bool {
    !is_admin_route(path) && !is_candidate_route(path) && !is_company_route(path)
}

#[cfg(test)]
#[path = "routes_test.rs"]
mod tests;
