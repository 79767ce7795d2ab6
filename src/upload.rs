//! Direct-to-storage uploads through pre-signed POST descriptors.
//!
//! SYSTEM CONTEXT
//! ==============
//! Photos and pitch videos never pass through the API server. The client
//! asks the API for a pre-signed descriptor, then POSTs the file straight
//! to object storage as multipart form data: every pre-signed field first,
//! in the order the API returned them, then the file under `file`.
//!
//! DESIGN
//! ======
//! `UploadController` publishes `UploadState` on a `tokio::sync::watch`
//! channel so any number of observers can follow progress. The multipart
//! body is streamed in chunks; each chunk handed to the transport advances
//! the progress percentage, rounded and never decreasing.
//!
//! ERROR HANDLING
//! ==============
//! `upload_file` never returns an error. Every failure lands in the state's
//! `error` with progress back at 0, and the call yields `None`.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use futures::StreamExt;
use reqwest::multipart::{Form, Part};
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::candidates;
use crate::net::{ApiClient, RequestError};

const CHUNK_SIZE: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadKind {
    Photo,
    Video,
}

impl UploadKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Photo => "photo",
            Self::Video => "video",
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for UploadFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadFile")
            .field("name", &self.name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl UploadFile {
    #[must_use]
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self { name: name.into(), content_type: content_type.into(), bytes }
    }

    /// Read a file from disk, guessing the content type from its extension.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the file cannot be read.
    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map_or_else(|| "upload".to_owned(), |n| n.to_string_lossy().into_owned());
        Ok(Self { content_type: content_type_for(path).to_owned(), name, bytes })
    }
}

fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        _ => "application/octet-stream",
    }
}

/// Pre-signed POST descriptor. `fields` keeps the order the API sent.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PresignedUpload {
    pub url: String,
    #[serde(deserialize_with = "ordered_fields")]
    pub fields: Vec<(String, String)>,
    pub file_url: String,
    #[serde(default)]
    pub expires_in: u64,
}

fn ordered_fields<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<(String, String)>, D::Error> {
    struct FieldsVisitor;

    impl<'de> Visitor<'de> for FieldsVisitor {
        type Value = Vec<(String, String)>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of form field names to values")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            let mut fields = Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some(entry) = map.next_entry::<String, String>()? {
                fields.push(entry);
            }
            Ok(fields)
        }
    }

    deserializer.deserialize_map(FieldsVisitor)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadState {
    pub is_uploading: bool,
    /// Whole percent, 0..=100.
    pub progress: u8,
    pub error: Option<String>,
    pub file_url: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Upload failed with status {0}")]
    Status(u16),
    #[error("Upload failed: {0}")]
    Transport(String),
    #[error(transparent)]
    Request(#[from] RequestError),
}

// =============================================================================
// PROGRESS
// =============================================================================

/// Rounded percentage; an empty body counts as complete.
fn percent(sent: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    let rounded = (sent.min(total) * 100 + total / 2) / total;
    u8::try_from(rounded).unwrap_or(100)
}

/// Handle given to uploaders for reporting bytes sent.
#[derive(Debug, Clone)]
pub struct ProgressReporter {
    state: Arc<watch::Sender<UploadState>>,
}

impl ProgressReporter {
    /// Progress only moves forward.
    pub fn report(&self, sent: u64, total: u64) {
        let next = percent(sent, total);
        self.state.send_if_modified(|state| {
            if next > state.progress {
                state.progress = next;
                true
            } else {
                false
            }
        });
    }
}

// =============================================================================
// STORAGE UPLOADER
// =============================================================================

#[async_trait::async_trait]
pub trait StorageUploader: Send + Sync {
    /// POST `file` to the descriptor's URL and return the HTTP status.
    async fn upload(
        &self,
        target: &PresignedUpload,
        file: &UploadFile,
        progress: ProgressReporter,
    ) -> Result<u16, UploadError>;
}

/// Multipart upload over reqwest with a streamed file part.
#[derive(Debug, Clone)]
pub struct ReqwestUploader {
    http: reqwest::Client,
}

impl ReqwestUploader {
    #[must_use]
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait::async_trait]
impl StorageUploader for ReqwestUploader {
    async fn upload(
        &self,
        target: &PresignedUpload,
        file: &UploadFile,
        progress: ProgressReporter,
    ) -> Result<u16, UploadError> {
        let total = file.bytes.len() as u64;
        let chunks: Vec<Vec<u8>> = file.bytes.chunks(CHUNK_SIZE).map(<[u8]>::to_vec).collect();
        let mut sent = 0_u64;
        let stream = futures::stream::iter(chunks).map(move |chunk| {
            sent += chunk.len() as u64;
            progress.report(sent, total);
            Ok::<_, std::io::Error>(chunk)
        });

        let part = Part::stream_with_length(reqwest::Body::wrap_stream(stream), total)
            .file_name(file.name.clone())
            .mime_str(&file.content_type)
            .map_err(|e| UploadError::Transport(e.to_string()))?;
        let form = target
            .fields
            .iter()
            .fold(Form::new(), |form, (name, value)| form.text(name.clone(), value.clone()))
            .part("file", part);

        let response = self
            .http
            .post(&target.url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| UploadError::Transport(e.to_string()))?;
        Ok(response.status().as_u16())
    }
}

// =============================================================================
// CONTROLLER
// =============================================================================

#[derive(Clone)]
pub struct UploadController {
    api: ApiClient,
    uploader: Arc<dyn StorageUploader>,
    state: Arc<watch::Sender<UploadState>>,
}

impl fmt::Debug for UploadController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadController").field("state", &*self.state.borrow()).finish_non_exhaustive()
    }
}

impl UploadController {
    /// Controller that uploads with the API client's HTTP connection pool.
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        let uploader = Arc::new(ReqwestUploader::new(api.http().clone()));
        Self::with_uploader(api, uploader)
    }

    #[must_use]
    pub fn with_uploader(api: ApiClient, uploader: Arc<dyn StorageUploader>) -> Self {
        let (state, _) = watch::channel(UploadState::default());
        Self { api, uploader, state: Arc::new(state) }
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<UploadState> {
        self.state.subscribe()
    }

    #[must_use]
    pub fn state(&self) -> UploadState {
        self.state.borrow().clone()
    }

    pub fn reset(&self) {
        self.state.send_replace(UploadState::default());
    }

    /// Upload and return the public file URL, or `None` with the failure
    /// recorded in the state.
    pub async fn upload_file(&self, file: &UploadFile, kind: UploadKind) -> Option<String> {
        self.state.send_replace(UploadState { is_uploading: true, ..UploadState::default() });

        match self.try_upload(file, kind).await {
            Ok(file_url) => {
                info!(kind = kind.as_str(), file = %file.name, "upload complete");
                self.state.send_replace(UploadState {
                    is_uploading: false,
                    progress: 100,
                    error: None,
                    file_url: Some(file_url.clone()),
                });
                Some(file_url)
            }
            Err(e) => {
                warn!(kind = kind.as_str(), file = %file.name, error = %e, "upload failed");
                self.state.send_replace(UploadState { error: Some(e.to_string()), ..UploadState::default() });
                None
            }
        }
    }

    async fn try_upload(&self, file: &UploadFile, kind: UploadKind) -> Result<String, UploadError> {
        let target = candidates::get_upload_url(&self.api, &file.name, &file.content_type, kind).await?;
        let progress = ProgressReporter { state: Arc::clone(&self.state) };
        match self.uploader.upload(&target, file, progress).await? {
            200 | 204 => Ok(target.file_url),
            status => Err(UploadError::Status(status)),
        }
    }
}

#[cfg(test)]
#[path = "upload_test.rs"]
mod tests;
