use std::io;
use thiserror::Error;

/// Failures of the content store. Every variant leaves the content root as it was.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("File type not allowed: {extension:?}")]
    InvalidExtension { extension: String },

    #[error("File too large: {size} bytes (max: {max_size} bytes)")]
    FileTooLarge { size: u64, max_size: u64 },

    #[error("Empty file not allowed")]
    EmptyFile,

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(#[source] io::Error),

    #[error("Access denied for {name:?}")]
    AccessDenied { name: String },

    #[error("File not found: {name:?}")]
    NotFound { name: String },

    #[error("Failed to delete {name:?}: {source}")]
    DeleteFailed {
        name: String,
        #[source]
        source: io::Error,
    },
}

impl StorageError {
    /// Text shown to the user. Traversal attempts read exactly like a missing file.
    pub fn user_message(&self) -> &'static str {
        match self {
            StorageError::InvalidExtension { .. } => "File type not allowed",
            StorageError::FileTooLarge { .. } => "File size exceeds limit (10MB)",
            StorageError::EmptyFile => "No file selected or upload error",
            StorageError::StorageUnavailable(_) => "Failed to move uploaded file",
            StorageError::AccessDenied { .. } | StorageError::NotFound { .. } => {
                "File not found or access denied"
            }
            StorageError::DeleteFailed { .. } => "Failed to delete file",
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StorageError::NotFound { .. } | StorageError::AccessDenied { .. }
        )
    }
}
