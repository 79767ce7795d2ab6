//! TalentBase client core.
//!
//! SYSTEM CONTEXT
//! ==============
//! TalentBase connects candidates, companies, and admins through a backend
//! REST API. This crate is the client half: it calls that API from an
//! interactive session (cookie auth) or a server-side handler (bearer auth),
//! validates Brazilian registration data, keeps long forms in resumable
//! drafts, drives multi-step wizards, uploads media straight to object
//! storage, and queues user-facing notifications.
//!
//! Shared state is owned by an explicitly constructed [`context::AppContext`];
//! nothing here is a global.

pub mod admin;
pub mod auth;
pub mod candidates;
pub mod config;
pub mod context;
pub mod draft;
pub mod formatting;
pub mod messages;
pub mod net;
pub mod routes;
pub mod storage;
pub mod toast;
pub mod upload;
pub mod validation;
pub mod validators;
pub mod wizard;

#[cfg(test)]
pub(crate) mod test_support;
