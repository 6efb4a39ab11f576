use super::{render, AppState};
use crate::error::FollowbackError;
use crate::pipeline::{Upload, UploadFile};
use axum::extract::multipart::MultipartError;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

pub async fn index(State(state): State<AppState>) -> Html<String> {
    Html(render::index_page(
        &state.pipeline.archive_config().expected_extension,
    ))
}

pub async fn health() -> &'static str {
    "ok"
}

pub async fn upload(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let upload = match stage_upload(state.pipeline.uploads_dir(), &mut multipart).await {
        Ok(Some(upload)) => upload,
        Ok(None) => {
            return failure_response(&FollowbackError::InvalidInput {
                reason: "no file was uploaded".to_string(),
            })
        }
        Err(response) => return response,
    };

    info!(upload = %upload.original_name, "upload received");

    match state
        .pipeline
        .process_with(upload, |outcome| render::outcome_page(&outcome))
        .await
    {
        Ok(page) => (StatusCode::OK, Html(page)).into_response(),
        Err(e) => failure_response(&e),
    }
}

/// Streams the first multipart field that carries a file name into a staging
/// file under `uploads_dir`. A partially written file is removed on error.
async fn stage_upload(
    uploads_dir: &Path,
    multipart: &mut Multipart,
) -> std::result::Result<Option<Upload>, Response> {
    while let Some(mut field) = multipart.next_field().await.map_err(multipart_rejection)? {
        let Some(original_name) = field
            .file_name()
            .filter(|name| !name.is_empty())
            .map(str::to_owned)
        else {
            continue;
        };

        let staged = UploadFile::stage_in(uploads_dir).map_err(|e| failure_response(&e))?;
        let handle = staged
            .as_file()
            .try_clone()
            .map_err(|e| failure_response(&FollowbackError::Io(e)))?;
        let mut writer = fs::File::from_std(handle);

        while let Some(chunk) = field.chunk().await.map_err(multipart_rejection)? {
            writer
                .write_all(&chunk)
                .await
                .map_err(|e| failure_response(&FollowbackError::Io(e)))?;
        }
        writer
            .flush()
            .await
            .map_err(|e| failure_response(&FollowbackError::Io(e)))?;

        return Ok(Some(Upload::staged(original_name, staged)));
    }

    Ok(None)
}

fn failure_response(error: &FollowbackError) -> Response {
    let status =
        StatusCode::from_u16(error.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_server_error() {
        warn!(error = %error, "upload failed");
    }
    (status, Html(render::error_page(error))).into_response()
}

fn multipart_rejection(error: MultipartError) -> Response {
    warn!(error = %error, "malformed or oversized upload");
    let status = error.status();
    let page = render::error_page(&FollowbackError::InvalidInput {
        reason: if status == StatusCode::PAYLOAD_TOO_LARGE {
            "the file is too large".to_string()
        } else {
            "the upload could not be read".to_string()
        },
    });
    (status, Html(page)).into_response()
}
