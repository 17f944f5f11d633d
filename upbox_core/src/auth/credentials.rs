//! The single credential record persisted as JSON.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{info, warn};

use super::error::AuthError;

/// On-disk shape: `{"password_hash": "..."}`. Older deployments stored
/// `{"password": "..."}` in plaintext.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// What the record holds, hash first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoredSecret<'a> {
    Hash(&'a str),
    Legacy(&'a str),
}

impl CredentialRecord {
    pub fn hashed(password_hash: String) -> Self {
        Self {
            password_hash: Some(password_hash),
            password: None,
        }
    }

    pub fn secret(&self) -> Option<StoredSecret<'_>> {
        match (&self.password_hash, &self.password) {
            (Some(hash), _) => Some(StoredSecret::Hash(hash)),
            (None, Some(plain)) => Some(StoredSecret::Legacy(plain)),
            (None, None) => None,
        }
    }
}

/// Outcome of reading the credential file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadedRecord {
    Missing,
    /// Present but not a usable record; left untouched on disk.
    Unusable,
    Present(CredentialRecord),
}

#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: Arc<PathBuf>,
    write_lock: Arc<Mutex<()>>,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Arc::new(path.into()),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Serializes read-modify-write sequences against the record.
    pub fn lock(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock()
    }

    pub fn load(&self) -> Result<LoadedRecord, AuthError> {
        let raw = match fs::read(self.path.as_path()) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(LoadedRecord::Missing),
            Err(err) => return Err(AuthError::Storage(err)),
        };

        match serde_json::from_slice::<CredentialRecord>(&raw) {
            Ok(record) if record.secret().is_some() => Ok(LoadedRecord::Present(record)),
            Ok(_) => {
                warn!(path = %self.path.display(), "credential file holds no password");
                Ok(LoadedRecord::Unusable)
            }
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "credential file is not valid JSON");
                Ok(LoadedRecord::Unusable)
            }
        }
    }

    /// Replaces the record in one rename; readers never see a half-written file.
    pub fn save(&self, record: &CredentialRecord) -> Result<(), AuthError> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent)?;

        let mut temp = NamedTempFile::new_in(&parent)?;
        serde_json::to_writer_pretty(&mut temp, record)?;
        temp.write_all(b"\n")?;
        temp.as_file().sync_all()?;
        temp.persist(self.path.as_path())
            .map_err(|err| AuthError::Storage(err.error))?;

        info!(path = %self.path.display(), "credential record saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let store = CredentialStore::new(temp_dir.path().join("conf/config.json"));

        assert_eq!(store.load().unwrap(), LoadedRecord::Missing);
    }

    #[test]
    fn test_save_creates_parent_and_round_trips() {
        let temp_dir = TempDir::new().unwrap();
        let store = CredentialStore::new(temp_dir.path().join("conf/config.json"));
        let record = CredentialRecord::hashed("$argon2id$fake".to_string());

        store.save(&record).unwrap();

        assert_eq!(store.load().unwrap(), LoadedRecord::Present(record));
        let raw = fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("password_hash"));
        assert!(!raw.contains("\"password\""));
    }

    #[test]
    fn test_legacy_record() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        fs::write(&path, r#"{"password": "hunter22"}"#).unwrap();

        let store = CredentialStore::new(&path);
        match store.load().unwrap() {
            LoadedRecord::Present(record) => {
                assert_eq!(record.secret(), Some(StoredSecret::Legacy("hunter22")));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_hash_wins_over_legacy_field() {
        let record = CredentialRecord {
            password_hash: Some("hash".to_string()),
            password: Some("plain".to_string()),
        };
        assert_eq!(record.secret(), Some(StoredSecret::Hash("hash")));
    }

    #[test]
    fn test_unusable_files() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        let store = CredentialStore::new(&path);

        for body in ["not json", "{}", "[]", r#"{"other": 1}"#] {
            fs::write(&path, body).unwrap();
            assert_eq!(store.load().unwrap(), LoadedRecord::Unusable, "{}", body);
        }
    }
}
