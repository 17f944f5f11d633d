use super::error::StorageError;

/// Extensions accepted by the content store, lower-case.
pub const ALLOWED_EXTENSIONS: [&str; 9] = [
    "html", "svg", "jpg", "jpeg", "png", "gif", "webp", "md", "txt",
];

/// Hard upload cap: 10 MiB.
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Lower-cased suffix after the final `.`, or an empty string when there is none.
pub fn extension_of(name: &str) -> String {
    name.rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default()
}

pub fn is_allowed_extension(extension: &str) -> bool {
    ALLOWED_EXTENSIONS.contains(&extension)
}

pub fn validate_extension(raw_name: &str) -> Result<String, StorageError> {
    let extension = extension_of(raw_name);
    if !is_allowed_extension(&extension) {
        return Err(StorageError::InvalidExtension { extension });
    }
    Ok(extension)
}

pub fn validate_size(size_bytes: u64) -> Result<(), StorageError> {
    if size_bytes > MAX_FILE_SIZE {
        return Err(StorageError::FileTooLarge {
            size: size_bytes,
            max_size: MAX_FILE_SIZE,
        });
    }

    if size_bytes == 0 {
        return Err(StorageError::EmptyFile);
    }

    Ok(())
}

/// Checks run before anything touches the content root, in this order:
/// extension, size cap, emptiness.
pub fn validate_upload(raw_name: &str, size_bytes: u64) -> Result<String, StorageError> {
    let extension = validate_extension(raw_name)?;
    validate_size(size_bytes)?;
    Ok(extension)
}
