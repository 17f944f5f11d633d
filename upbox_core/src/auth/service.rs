use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use subtle::ConstantTimeEq;
use tracing::{error, info, warn};

use super::credentials::{CredentialRecord, CredentialStore, LoadedRecord, StoredSecret};
use super::error::{AuthError, MIN_PASSWORD_LENGTH};
use super::session::{SessionId, SessionStore};

/// Login, logout and password changes for the single account.
#[derive(Clone)]
pub struct AuthService {
    store: CredentialStore,
    sessions: SessionStore,
    argon2: Argon2<'static>,
    default_password: Arc<str>,
}

impl AuthService {
    pub fn new(
        store: CredentialStore,
        sessions: SessionStore,
        default_password: impl Into<String>,
    ) -> Self {
        Self {
            store,
            sessions,
            argon2: Argon2::default(),
            default_password: Arc::from(default_password.into()),
        }
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn credential_store(&self) -> &CredentialStore {
        &self.store
    }

    /// Writes the default credential record when none exists yet.
    pub fn initialize(&self) -> Result<(), AuthError> {
        let _guard = self.store.lock();
        self.current_record()?;
        Ok(())
    }

    /// True while the stored secret still accepts the default password.
    pub fn is_default_password(&self) -> Result<bool, AuthError> {
        let _guard = self.store.lock();
        let record = self.current_record()?;
        Ok(self.matches(&record, &self.default_password))
    }

    pub fn login(&self, password: &str) -> Result<SessionId, AuthError> {
        let _guard = self.store.lock();
        let record = self.current_record()?;

        let accepted = match record.secret() {
            Some(StoredSecret::Hash(hash)) => self.verify_password(password, hash),
            Some(StoredSecret::Legacy(plain)) => {
                let accepted = legacy_matches(password, plain);
                if accepted {
                    self.upgrade_legacy(password);
                }
                accepted
            }
            None => false,
        };

        if !accepted {
            warn!("login rejected");
            return Err(AuthError::InvalidCredentials);
        }

        let session = self.sessions.create();
        info!(session = %session, "login succeeded");
        Ok(session)
    }

    pub fn logout(&self, session: &SessionId) {
        self.sessions.destroy(session);
        info!(session = %session, "logged out");
    }

    /// Checks run in order: session, current password, confirmation, length.
    pub fn change_password(
        &self,
        session: &SessionId,
        current: &str,
        new: &str,
        confirm: &str,
    ) -> Result<(), AuthError> {
        if !self.sessions.is_logged_in(session) {
            return Err(AuthError::NotLoggedIn);
        }

        let _guard = self.store.lock();
        let record = self.current_record()?;

        if !self.matches(&record, current) {
            warn!(session = %session, "password change rejected: wrong current password");
            return Err(AuthError::WrongCurrentPassword);
        }

        if new != confirm {
            return Err(AuthError::Mismatch);
        }

        if new.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AuthError::TooShort {
                min_length: MIN_PASSWORD_LENGTH,
            });
        }

        let hash = self.hash_password(new)?;
        self.store.save(&CredentialRecord::hashed(hash))?;

        info!(session = %session, "password changed");
        Ok(())
    }

    /// Reads the record, creating the default one when the file is missing.
    /// An unusable file is not overwritten; the default applies in memory only.
    fn current_record(&self) -> Result<CredentialRecord, AuthError> {
        match self.store.load()? {
            LoadedRecord::Present(record) => Ok(record),
            LoadedRecord::Missing => {
                let record = CredentialRecord::hashed(self.hash_password(&self.default_password)?);
                self.store.save(&record)?;
                info!(path = %self.store.path().display(), "created default credential record");
                Ok(record)
            }
            LoadedRecord::Unusable => Ok(CredentialRecord::hashed(
                self.hash_password(&self.default_password)?,
            )),
        }
    }

    fn matches(&self, record: &CredentialRecord, password: &str) -> bool {
        match record.secret() {
            Some(StoredSecret::Hash(hash)) => self.verify_password(password, hash),
            Some(StoredSecret::Legacy(plain)) => legacy_matches(password, plain),
            None => false,
        }
    }

    fn upgrade_legacy(&self, password: &str) {
        let upgraded = self
            .hash_password(password)
            .and_then(|hash| self.store.save(&CredentialRecord::hashed(hash)));

        match upgraded {
            Ok(()) => info!("upgraded plaintext credential to a password hash"),
            Err(e) => error!(error = %e, "failed to upgrade plaintext credential"),
        }
    }

    fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        let password_hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::Hashing(e.to_string()))?;

        Ok(password_hash.to_string())
    }

    fn verify_password(&self, password: &str, hash: &str) -> bool {
        let parsed_hash = match PasswordHash::new(hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                error!(error = %e, "stored password hash is malformed");
                return false;
            }
        };

        self.argon2
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }
}

fn legacy_matches(candidate: &str, stored: &str) -> bool {
    candidate.as_bytes().ct_eq(stored.as_bytes()).into()
}
