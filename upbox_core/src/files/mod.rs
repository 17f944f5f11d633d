pub mod error;
pub mod models;
pub mod repository;
pub mod sanitize;
pub mod validation;

pub use error::StorageError;
pub use models::{format_file_size, FileCategory, StoredFile};
pub use repository::{FileRepository, StagedUpload};
pub use sanitize::sanitize;
pub use validation::{ALLOWED_EXTENSIONS, MAX_FILE_SIZE};
