//! HTTP plumbing shared by every API surface.

pub mod client;
pub mod endpoints;
pub mod error;

pub use client::{ApiClient, Credentials, RequestOptions};
pub use error::{ApiError, RequestError, SubmitError};
