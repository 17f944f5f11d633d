//! Application error types and handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::auth::AuthError;
use crate::files::StorageError;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Internal server error")]
    InternalServerError,

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::InternalServerError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
            AppError::Storage(err) => {
                let status = if err.is_not_found() {
                    StatusCode::NOT_FOUND
                } else if matches!(
                    err,
                    StorageError::InvalidExtension { .. } | StorageError::EmptyFile
                ) {
                    StatusCode::BAD_REQUEST
                } else if matches!(err, StorageError::FileTooLarge { .. }) {
                    StatusCode::PAYLOAD_TOO_LARGE
                } else {
                    tracing::error!("Storage error: {:?}", err);
                    StatusCode::INTERNAL_SERVER_ERROR
                };
                (status, err.user_message().to_string())
            }
            AppError::Auth(err) => {
                let status = match &err {
                    AuthError::InvalidCredentials | AuthError::NotLoggedIn => {
                        StatusCode::UNAUTHORIZED
                    }
                    AuthError::WrongCurrentPassword
                    | AuthError::Mismatch
                    | AuthError::TooShort { .. } => StatusCode::BAD_REQUEST,
                    AuthError::Storage(_) | AuthError::Encoding(_) | AuthError::Hashing(_) => {
                        tracing::error!("Credential error: {:?}", err);
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                };
                (status, err.user_message().to_string())
            }
            AppError::IoError(err) => {
                tracing::error!("IO error: {:?}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_status_mapping() {
        let response = AppError::from(StorageError::AccessDenied {
            name: "../etc".to_string(),
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = AppError::from(StorageError::NotFound {
            name: "gone.txt".to_string(),
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = AppError::from(StorageError::EmptyFile).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = AppError::from(StorageError::StorageUnavailable(std::io::Error::other(
            "disk gone",
        )))
        .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = AppError::from(StorageError::FileTooLarge {
            size: 11,
            max_size: 10,
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[test]
    fn test_auth_status_mapping() {
        let response = AppError::from(AuthError::InvalidCredentials).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = AppError::from(AuthError::Mismatch).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
