//! Flat content store: every stored file is a direct child of one root directory.

use std::fs::{self, Metadata};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tempfile::{Builder, NamedTempFile};
use tracing::{debug, error, info, warn};

use super::error::StorageError;
use super::models::StoredFile;
use super::sanitize::{base_name, collision_name, sanitize};
use super::validation::validate_upload;

/// Prefix of in-flight upload files. `~` never survives sanitization, so no
/// stored name can start with it.
pub const STAGING_PREFIX: &str = "~upbox-";
const STAGING_SUFFIX: &str = ".part";
const MAX_COLLISION_INDEX: u32 = 10_000;

/// Upload bytes parked in a temporary file inside the content root.
///
/// Dropping it without committing removes the file, so an aborted request
/// never leaves anything behind.
#[derive(Debug)]
pub struct StagedUpload {
    temp: NamedTempFile,
}

impl StagedUpload {
    /// A second handle onto the staged file for writing.
    pub fn writer(&self) -> io::Result<fs::File> {
        self.temp.as_file().try_clone()
    }

    pub fn len(&self) -> io::Result<u64> {
        Ok(self.temp.as_file().metadata()?.len())
    }

    pub fn path(&self) -> &Path {
        self.temp.path()
    }
}

#[derive(Debug, Clone)]
pub struct FileRepository {
    root: Arc<PathBuf>,
}

impl FileRepository {
    /// Opens the content root, creating it when missing.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, StorageError> {
        let root = root.as_ref();
        fs::create_dir_all(root).map_err(StorageError::StorageUnavailable)?;
        let canonical = fs::canonicalize(root).map_err(StorageError::StorageUnavailable)?;

        info!(root = %canonical.display(), "content root ready");

        Ok(Self {
            root: Arc::new(canonical),
        })
    }

    /// Canonical path of the content root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Regular files in the root, newest first; equal timestamps fall back to name order.
    pub async fn list(&self) -> Result<Vec<StoredFile>, StorageError> {
        let repo = self.clone();
        blocking(move || repo.list_blocking()).await
    }

    /// Validates and stores `size_bytes` bytes read from `content` under a
    /// sanitized, collision-free name.
    pub async fn store<R>(
        &self,
        raw_name: &str,
        size_bytes: u64,
        content: R,
    ) -> Result<StoredFile, StorageError>
    where
        R: Read + Send + 'static,
    {
        let repo = self.clone();
        let raw_name = raw_name.to_string();
        blocking(move || repo.store_blocking(&raw_name, size_bytes, content)).await
    }

    /// Creates an empty staging file for a caller that streams the body itself.
    pub async fn stage(&self) -> Result<StagedUpload, StorageError> {
        let repo = self.clone();
        blocking(move || repo.stage_blocking()).await
    }

    /// Validates a fully written staging file and promotes it to its final name.
    pub async fn store_staged(
        &self,
        raw_name: &str,
        staged: StagedUpload,
    ) -> Result<StoredFile, StorageError> {
        let repo = self.clone();
        let raw_name = raw_name.to_string();
        blocking(move || repo.commit_blocking(&raw_name, staged)).await
    }

    pub async fn delete(&self, name: &str) -> Result<(), StorageError> {
        let repo = self.clone();
        let name = name.to_string();
        blocking(move || repo.delete_blocking(&name)).await
    }

    /// Resolves a stored file for reading, with the same containment checks as `delete`.
    pub async fn locate(&self, name: &str) -> Result<(StoredFile, PathBuf), StorageError> {
        let repo = self.clone();
        let name = name.to_string();
        blocking(move || repo.locate_blocking(&name)).await
    }

    fn list_blocking(&self) -> Result<Vec<StoredFile>, StorageError> {
        let entries = fs::read_dir(self.root.as_path()).map_err(StorageError::StorageUnavailable)?;
        let mut files = Vec::new();

        for entry in entries {
            let entry = entry.map_err(StorageError::StorageUnavailable)?;

            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(raw) => {
                    debug!(name = ?raw, "skipping non UTF-8 entry");
                    continue;
                }
            };

            if name.starts_with(STAGING_PREFIX) {
                continue;
            }

            // symlinks are not followed: only regular files count
            let metadata = match entry.metadata() {
                Ok(metadata) => metadata,
                Err(err) => {
                    debug!(name = %name, error = %err, "entry vanished during scan");
                    continue;
                }
            };

            if !metadata.is_file() {
                continue;
            }

            files.push(stored_file(name, &metadata)?);
        }

        files.sort_by(|a, b| {
            b.modified_at
                .cmp(&a.modified_at)
                .then_with(|| a.name.cmp(&b.name))
        });

        Ok(files)
    }

    fn store_blocking<R: Read>(
        &self,
        raw_name: &str,
        size_bytes: u64,
        mut content: R,
    ) -> Result<StoredFile, StorageError> {
        validate_upload(raw_name, size_bytes)?;

        let staged = self.stage_blocking()?;
        let mut writer = staged.writer().map_err(StorageError::StorageUnavailable)?;

        let copied = io::copy(&mut content.by_ref().take(size_bytes + 1), &mut writer)
            .map_err(StorageError::StorageUnavailable)?;
        writer.flush().map_err(StorageError::StorageUnavailable)?;

        if copied != size_bytes {
            return Err(StorageError::StorageUnavailable(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("declared {} bytes but received {}", size_bytes, copied),
            )));
        }

        self.commit_blocking(raw_name, staged)
    }

    fn stage_blocking(&self) -> Result<StagedUpload, StorageError> {
        let temp = Builder::new()
            .prefix(STAGING_PREFIX)
            .suffix(STAGING_SUFFIX)
            .tempfile_in(self.root.as_path())
            .map_err(StorageError::StorageUnavailable)?;

        Ok(StagedUpload { temp })
    }

    fn commit_blocking(
        &self,
        raw_name: &str,
        staged: StagedUpload,
    ) -> Result<StoredFile, StorageError> {
        let size_bytes = staged.len().map_err(StorageError::StorageUnavailable)?;
        validate_upload(raw_name, size_bytes)?;

        staged
            .temp
            .as_file()
            .sync_all()
            .map_err(StorageError::StorageUnavailable)?;

        let candidate = sanitize(raw_name);
        let name = self.first_free_name(&candidate)?;
        let stored = self.claim(staged, &name)?;

        info!(
            raw_name = %raw_name,
            name = %stored.name,
            size = stored.size_bytes,
            "file stored"
        );

        Ok(stored)
    }

    fn first_free_name(&self, candidate: &str) -> Result<String, StorageError> {
        for index in 0..=MAX_COLLISION_INDEX {
            let name = collision_name(candidate, index);

            match fs::symlink_metadata(self.root.join(&name)) {
                Ok(_) => continue,
                Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(name),
                Err(err) => return Err(StorageError::StorageUnavailable(err)),
            }
        }

        Err(StorageError::StorageUnavailable(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("no free name left for {}", candidate),
        )))
    }

    /// Promotes the staged file to `name` without ever replacing an existing entry.
    fn claim(&self, staged: StagedUpload, name: &str) -> Result<StoredFile, StorageError> {
        let destination = self.root.join(name);

        staged
            .temp
            .persist_noclobber(&destination)
            .map_err(|err| {
                warn!(name = %name, error = %err.error, "could not claim destination, upload discarded");
                StorageError::StorageUnavailable(err.error)
            })?;

        match fs::metadata(&destination) {
            Ok(metadata) => stored_file(name.to_string(), &metadata),
            Err(err) => {
                error!(name = %name, error = %err, "stored file unreadable, rolling back");
                let _ = fs::remove_file(&destination);
                Err(StorageError::StorageUnavailable(err))
            }
        }
    }

    fn delete_blocking(&self, name: &str) -> Result<(), StorageError> {
        let path = self.resolve_existing(name)?;

        fs::remove_file(&path).map_err(|source| {
            error!(name = %name, error = %source, "failed to delete file");
            StorageError::DeleteFailed {
                name: name.to_string(),
                source,
            }
        })?;

        info!(name = %name, "file deleted");
        Ok(())
    }

    fn locate_blocking(&self, name: &str) -> Result<(StoredFile, PathBuf), StorageError> {
        let path = self.resolve_existing(name)?;
        let metadata = fs::metadata(&path).map_err(StorageError::StorageUnavailable)?;

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .ok_or_else(|| StorageError::NotFound {
                name: name.to_string(),
            })?;

        Ok((stored_file(file_name, &metadata)?, path))
    }

    /// Path of an existing regular file that sits directly in the root.
    fn resolve_existing(&self, name: &str) -> Result<PathBuf, StorageError> {
        let base = base_name(name);

        if base.is_empty() || base == "." || base == ".." {
            warn!(requested = %name, "rejected file name that escapes the content root");
            return Err(StorageError::AccessDenied {
                name: name.to_string(),
            });
        }

        if base.starts_with(STAGING_PREFIX) {
            return Err(StorageError::NotFound {
                name: name.to_string(),
            });
        }

        let canonical = match fs::canonicalize(self.root.join(base)) {
            Ok(path) => path,
            Err(err)
                if matches!(
                    err.kind(),
                    io::ErrorKind::NotFound | io::ErrorKind::InvalidInput
                ) =>
            {
                return Err(StorageError::NotFound {
                    name: name.to_string(),
                });
            }
            Err(err) => return Err(StorageError::StorageUnavailable(err)),
        };

        if canonical.parent() != Some(self.root.as_path()) {
            warn!(
                requested = %name,
                resolved = %canonical.display(),
                "directory traversal attempt blocked"
            );
            return Err(StorageError::AccessDenied {
                name: name.to_string(),
            });
        }

        // act on the named entry itself; a link to another stored file is not that file
        let entry = self.root.join(base);
        match fs::symlink_metadata(&entry) {
            Ok(metadata) if metadata.is_file() => Ok(entry),
            Ok(_) => Err(StorageError::NotFound {
                name: name.to_string(),
            }),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Err(StorageError::NotFound {
                name: name.to_string(),
            }),
            Err(err) => Err(StorageError::StorageUnavailable(err)),
        }
    }
}

fn stored_file(name: String, metadata: &Metadata) -> Result<StoredFile, StorageError> {
    let modified = metadata.modified().map_err(StorageError::StorageUnavailable)?;
    Ok(StoredFile::new(
        name,
        metadata.len(),
        DateTime::<Utc>::from(modified),
    ))
}

async fn blocking<T, F>(task: F) -> Result<T, StorageError>
where
    F: FnOnce() -> Result<T, StorageError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|err| StorageError::StorageUnavailable(io::Error::other(err)))?
}
