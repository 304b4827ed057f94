//! Job API handlers.

use std::path::{Path as FsPath, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use futures::Stream;
use serde::{Deserialize, Serialize};
use tokio_util::io::ReaderStream;
use tracing::{debug, error, warn};
use vidfetch_core::{Job, OrchestratorError, RetentionManager};

use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for submitting a job
#[derive(Debug, Deserialize)]
pub struct SubmitJobBody {
    pub url: String,
    /// `best`, `worst` or a maximum height such as `720`
    #[serde(default = "default_quality")]
    pub quality: String,
}

fn default_quality() -> String {
    "best".to_string()
}

#[derive(Debug, Serialize)]
pub struct SubmitJobResponse {
    pub id: String,
}

#[derive(Debug, Serialize)]
pub struct JobNotFoundResponse {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct JobErrorResponse {
    pub error: String,
}

fn error_response(err: &OrchestratorError) -> (StatusCode, Json<JobErrorResponse>) {
    let status = match err {
        e if e.is_validation() => StatusCode::BAD_REQUEST,
        OrchestratorError::JobNotFound(_) => StatusCode::NOT_FOUND,
        OrchestratorError::NotReady { .. } => StatusCode::CONFLICT,
        OrchestratorError::ArtifactMissing(_) => StatusCode::GONE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(JobErrorResponse {
            error: err.to_string(),
        }),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// Submit a new job
pub async fn submit_job(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SubmitJobBody>,
) -> Result<(StatusCode, Json<SubmitJobResponse>), (StatusCode, Json<JobErrorResponse>)> {
    match state.orchestrator().submit(&body.url, &body.quality) {
        Ok(id) => Ok((StatusCode::ACCEPTED, Json(SubmitJobResponse { id }))),
        Err(e) => {
            if !e.is_validation() {
                error!("Failed to submit job: {}", e);
            }
            Err(error_response(&e))
        }
    }
}

/// Poll a job
pub async fn get_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Job>, (StatusCode, Json<JobNotFoundResponse>)> {
    state.orchestrator().job(&id).map(Json).ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            Json(JobNotFoundResponse {
                status: "not_found".to_string(),
            }),
        )
    })
}

/// Stream a completed job's file as an attachment.
///
/// Removal of the file is scheduled once the body has been sent or dropped.
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response, (StatusCode, Json<JobErrorResponse>)> {
    let artifact = state
        .orchestrator()
        .artifact(&id)
        .await
        .map_err(|e| error_response(&e))?;

    let file = match tokio::fs::File::open(&artifact.path).await {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(error_response(&OrchestratorError::ArtifactMissing(id)));
        }
        Err(e) => {
            error!("Failed to open {}: {}", artifact.path.display(), e);
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(JobErrorResponse {
                    error: format!("failed to open artifact: {}", e),
                }),
            ));
        }
    };
    let length = file.metadata().await.ok().map(|m| m.len());

    let stream = RemoveOnDrop {
        inner: ReaderStream::new(file),
        _guard: RemovalGuard {
            retention: Arc::clone(state.retention()),
            path: artifact.path.clone(),
        },
    };

    let mut response = Body::from_stream(stream).into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(content_type_for(&artifact.path)),
    );
    if let Ok(value) = HeaderValue::from_str(&content_disposition(&artifact.display_name)) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    if let Some(length) = length {
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(length));
    }

    debug!("Serving {} for job {}", artifact.display_name, id);
    Ok(response)
}

// ============================================================================
// Helpers
// ============================================================================

/// Schedules the artifact for removal when dropped.
struct RemovalGuard {
    retention: Arc<RetentionManager>,
    path: PathBuf,
}

impl Drop for RemovalGuard {
    fn drop(&mut self) {
        let path = std::mem::take(&mut self.path);
        if let Err(e) = self.retention.schedule_removal(path) {
            warn!("Could not schedule removal of served file: {}", e);
        }
    }
}

/// Body stream that keeps a [`RemovalGuard`] alive until the body is
/// finished or dropped by the connection.
struct RemoveOnDrop<S> {
    inner: S,
    _guard: RemovalGuard,
}

impl<S: Stream + Unpin> Stream for RemoveOnDrop<S> {
    type Item = S::Item;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

fn content_type_for(path: &FsPath) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("mp4") | Some("m4v") => "video/mp4",
        Some("webm") => "video/webm",
        Some("mkv") => "video/x-matroska",
        Some("mov") => "video/quicktime",
        _ => "application/octet-stream",
    }
}

/// `attachment` disposition with an ASCII fallback and an RFC 5987 UTF-8 name.
fn content_disposition(name: &str) -> String {
    let fallback: String = name
        .chars()
        .map(|c| {
            if c.is_ascii() && !c.is_ascii_control() && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(name)
    )
}
