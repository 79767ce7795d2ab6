use std::sync::Mutex;

use axum::Json;
use axum::extract::{Multipart, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::routing::{get, post};
use serde_json::json;

use super::*;
use crate::test_support::{server_client, spawn_backend};

// =============================================================================
// helpers
// =============================================================================

#[test]
fn percent_rounds_to_whole_numbers() {
    assert_eq!(percent(0, 3), 0);
    assert_eq!(percent(1, 3), 33);
    assert_eq!(percent(2, 3), 67);
    assert_eq!(percent(3, 3), 100);
    assert_eq!(percent(5, 3), 100);
    assert_eq!(percent(0, 0), 100);
}

#[test]
fn progress_never_decreases() {
    let (tx, rx) = watch::channel(UploadState::default());
    let reporter = ProgressReporter { state: Arc::new(tx) };
    reporter.report(50, 100);
    reporter.report(25, 100);
    assert_eq!(rx.borrow().progress, 50);
    reporter.report(99, 100);
    assert_eq!(rx.borrow().progress, 99);
}

#[test]
fn presigned_fields_keep_document_order() {
    let raw = r#"{"url":"u","fields":{"z":"1","a":"2","m":"3"},"file_url":"f","expires_in":60}"#;
    let target: PresignedUpload = serde_json::from_str(raw).unwrap();
    assert_eq!(
        target.fields,
        vec![("z".into(), "1".into()), ("a".into(), "2".into()), ("m".into(), "3".into())]
    );
}

#[test]
fn content_type_from_extension() {
    assert_eq!(content_type_for(Path::new("me.JPG")), "image/jpeg");
    assert_eq!(content_type_for(Path::new("pitch.mp4")), "video/mp4");
    assert_eq!(content_type_for(Path::new("notes")), "application/octet-stream");
}

#[tokio::test]
async fn from_path_reads_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("foto.png");
    std::fs::write(&path, [1_u8, 2, 3]).unwrap();
    let file = UploadFile::from_path(&path).await.unwrap();
    assert_eq!(file.name, "foto.png");
    assert_eq!(file.content_type, "image/png");
    assert_eq!(file.bytes, vec![1, 2, 3]);
}

// =============================================================================
// controller with a scripted uploader
// =============================================================================

struct ScriptedUploader {
    status: u16,
    targets: Mutex<Vec<PresignedUpload>>,
}

#[async_trait::async_trait]
impl StorageUploader for ScriptedUploader {
    async fn upload(
        &self,
        target: &PresignedUpload,
        file: &UploadFile,
        progress: ProgressReporter,
    ) -> Result<u16, UploadError> {
        self.targets.lock().unwrap().push(target.clone());
        progress.report(file.bytes.len() as u64 / 2, file.bytes.len() as u64);
        Ok(self.status)
    }
}

fn api_router() -> axum::Router {
    axum::Router::new().route(
        "/api/v1/candidates/upload-url",
        get(|headers: HeaderMap| async move {
            let host = headers.get(header::HOST).and_then(|h| h.to_str().ok()).unwrap_or_default().to_owned();
            Json(json!({
                "url": format!("http://{host}/storage"),
                "fields": {"key": "uploads/pitch.mp4", "Content-Type": "video/mp4", "policy": "cG9saWN5"},
                "file_url": "https://cdn.test/uploads/pitch.mp4",
                "expires_in": 3600,
            }))
        }),
    )
}

fn scripted(status: u16) -> Arc<ScriptedUploader> {
    Arc::new(ScriptedUploader { status, targets: Mutex::new(Vec::new()) })
}

fn video() -> UploadFile {
    UploadFile::new("pitch.mp4", "video/mp4", vec![7_u8; 1000])
}

#[tokio::test]
async fn success_publishes_file_url() {
    let base = spawn_backend(api_router()).await;
    let uploader = scripted(204);
    let controller = UploadController::with_uploader(server_client(&base, "t"), uploader.clone());

    let url = controller.upload_file(&video(), UploadKind::Video).await;
    assert_eq!(url.as_deref(), Some("https://cdn.test/uploads/pitch.mp4"));
    assert_eq!(
        controller.state(),
        UploadState {
            is_uploading: false,
            progress: 100,
            error: None,
            file_url: Some("https://cdn.test/uploads/pitch.mp4".into())
        }
    );
    assert_eq!(uploader.targets.lock().unwrap()[0].fields[0].0, "key");
}

#[tokio::test]
async fn plain_ok_from_storage_also_succeeds() {
    let base = spawn_backend(api_router()).await;
    let controller = UploadController::with_uploader(server_client(&base, "t"), scripted(200));

    let url = controller.upload_file(&video(), UploadKind::Video).await;
    assert_eq!(url.as_deref(), Some("https://cdn.test/uploads/pitch.mp4"));
    let state = controller.state();
    assert_eq!(state.file_url.as_deref(), Some("https://cdn.test/uploads/pitch.mp4"));
    assert_eq!(state.progress, 100);
    assert!(!state.is_uploading);
    assert_eq!(state.error, None);
}

#[tokio::test]
async fn non_success_status_is_an_error() {
    let base = spawn_backend(api_router()).await;
    let controller = UploadController::with_uploader(server_client(&base, "t"), scripted(403));

    assert!(controller.upload_file(&video(), UploadKind::Video).await.is_none());
    let state = controller.state();
    assert_eq!(state.error.as_deref(), Some("Upload failed with status 403"));
    assert_eq!(state.progress, 0);
    assert!(!state.is_uploading);
    assert!(state.file_url.is_none());
}

#[tokio::test]
async fn descriptor_failure_is_an_error() {
    let base = spawn_backend(axum::Router::new()).await;
    let uploader = scripted(204);
    let controller = UploadController::with_uploader(server_client(&base, "t"), uploader.clone());

    assert!(controller.upload_file(&video(), UploadKind::Photo).await.is_none());
    assert_eq!(controller.state().error.as_deref(), Some("API Error 404: Not Found"));
    assert!(uploader.targets.lock().unwrap().is_empty());
}

#[tokio::test]
async fn reset_clears_state_and_subscribers_see_it() {
    let base = spawn_backend(api_router()).await;
    let controller = UploadController::with_uploader(server_client(&base, "t"), scripted(500));
    let mut rx = controller.subscribe();

    controller.upload_file(&video(), UploadKind::Video).await;
    assert!(rx.has_changed().unwrap());
    assert!(rx.borrow_and_update().error.is_some());

    controller.reset();
    assert_eq!(*rx.borrow_and_update(), UploadState::default());
}

// =============================================================================
// reqwest uploader against a fake bucket
// =============================================================================

type Received = Arc<Mutex<Vec<(String, Vec<u8>)>>>;

async fn bucket(State(received): State<Received>, mut multipart: Multipart) -> StatusCode {
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_owned();
        let data = field.bytes().await.unwrap().to_vec();
        received.lock().unwrap().push((name, data));
    }
    StatusCode::NO_CONTENT
}

#[tokio::test]
async fn multipart_sends_fields_then_file() {
    let received = Received::default();
    let router = api_router().merge(
        axum::Router::new()
            .route("/storage", post(bucket))
            .with_state(Arc::clone(&received)),
    );
    let base = spawn_backend(router).await;
    let controller = UploadController::new(server_client(&base, "t"));
    let file = UploadFile::new("pitch.mp4", "video/mp4", (0..200_000_u32).map(|i| (i % 251) as u8).collect());

    let url = controller.upload_file(&file, UploadKind::Video).await;
    assert_eq!(url.as_deref(), Some("https://cdn.test/uploads/pitch.mp4"));

    let received = received.lock().unwrap();
    let names: Vec<&str> = received.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec!["key", "Content-Type", "policy", "file"]);
    assert_eq!(received[0].1, b"uploads/pitch.mp4");
    assert_eq!(received[3].1, file.bytes);
}

#[tokio::test]
async fn unreachable_bucket_is_transport_error() {
    let target = PresignedUpload {
        url: "http://127.0.0.1:9/storage".into(),
        fields: Vec::new(),
        file_url: "x".into(),
        expires_in: 0,
    };
    let (tx, _rx) = watch::channel(UploadState::default());
    let uploader = ReqwestUploader::new(reqwest::Client::new());
    let err = uploader
        .upload(&target, &video(), ProgressReporter { state: Arc::new(tx) })
        .await
        .unwrap_err();
    assert!(matches!(err, UploadError::Transport(_)));
}
