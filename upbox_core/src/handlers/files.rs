use axum::{
    extract::{multipart::MultipartError, Extension, Form, Multipart, Path, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use crate::{
    auth::FlashMessage,
    error::Result,
    files::{validation::validate_extension, FileRepository, StorageError, StoredFile, MAX_FILE_SIZE},
    middleware::session::SessionContext,
    views::{self, DashboardView},
    AppState,
};

/// Name of the multipart field carrying the upload.
pub const UPLOAD_FIELD: &str = "file";

#[derive(Debug, Deserialize)]
pub struct IndexQuery {
    pub settings: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteForm {
    #[serde(default)]
    pub filename: String,
}

#[derive(Debug, Error)]
enum UploadError {
    #[error("no file in request")]
    MissingFile,

    #[error("malformed multipart body: {0}")]
    Malformed(#[from] MultipartError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl UploadError {
    fn user_message(&self) -> &'static str {
        match self {
            UploadError::MissingFile => "No file selected or upload error",
            UploadError::Malformed(e) if e.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                StorageError::FileTooLarge {
                    size: MAX_FILE_SIZE + 1,
                    max_size: MAX_FILE_SIZE,
                }
                .user_message()
            }
            UploadError::Malformed(_) => "No file selected or upload error",
            UploadError::Storage(e) => e.user_message(),
        }
    }
}

pub async fn index(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    Query(query): Query<IndexQuery>,
) -> Result<Html<String>> {
    let flash = state.auth.sessions().take_flash(&session.id);
    let settings = query.settings.is_some();
    let files = if settings {
        Vec::new()
    } else {
        state.files.list().await?
    };

    Ok(Html(views::dashboard(&DashboardView {
        flash,
        files: &files,
        settings,
    })))
}

pub async fn upload(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    multipart: Multipart,
) -> Redirect {
    let flash = match receive_upload(&state.files, multipart).await {
        Ok(stored) => {
            info!(
                session = %session.id,
                name = %stored.name,
                size = stored.size_bytes,
                "file uploaded"
            );
            FlashMessage::success("File uploaded successfully!")
        }
        Err(e) => {
            warn!(session = %session.id, error = %e, "upload rejected");
            FlashMessage::error(e.user_message())
        }
    };

    state.auth.sessions().set_flash(&session.id, flash);
    Redirect::to("/")
}

/// Streams the `file` field into a staging file, cutting off at the size cap.
async fn receive_upload(
    files: &FileRepository,
    mut multipart: Multipart,
) -> std::result::Result<StoredFile, UploadError> {
    while let Some(mut field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let raw_name = match field.file_name() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => return Err(UploadError::MissingFile),
        };

        validate_extension(&raw_name)?;

        let staged = files.stage().await?;
        let writer = staged.writer().map_err(StorageError::StorageUnavailable)?;
        let mut writer = tokio::fs::File::from_std(writer);
        let mut received: u64 = 0;

        while let Some(chunk) = field.chunk().await? {
            received += chunk.len() as u64;
            if received > MAX_FILE_SIZE {
                return Err(StorageError::FileTooLarge {
                    size: received,
                    max_size: MAX_FILE_SIZE,
                }
                .into());
            }
            writer
                .write_all(&chunk)
                .await
                .map_err(StorageError::StorageUnavailable)?;
        }

        writer
            .flush()
            .await
            .map_err(StorageError::StorageUnavailable)?;
        drop(writer);

        return Ok(files.store_staged(&raw_name, staged).await?);
    }

    Err(UploadError::MissingFile)
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    Form(form): Form<DeleteForm>,
) -> Redirect {
    let flash = if form.filename.is_empty() {
        FlashMessage::error("No filename specified")
    } else {
        match state.files.delete(&form.filename).await {
            Ok(()) => {
                info!(session = %session.id, name = %form.filename, "file deleted");
                FlashMessage::success("File deleted successfully!")
            }
            Err(e) => {
                warn!(session = %session.id, name = %form.filename, error = %e, "delete rejected");
                FlashMessage::error(e.user_message())
            }
        }
    };

    state.auth.sessions().set_flash(&session.id, flash);
    Redirect::to("/")
}

pub async fn download(State(state): State<AppState>, Path(name): Path<String>) -> Result<Response> {
    let (stored, path) = state.files.locate(&name).await?;
    let bytes = tokio::fs::read(&path).await?;

    let mime = mime_guess::from_path(&stored.name).first_or_octet_stream();
    let content_type = HeaderValue::from_str(mime.essence_str())
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff")),
        ],
        bytes,
    )
        .into_response())
}
