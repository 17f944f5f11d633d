pub mod credentials;
pub mod error;
pub mod service;
pub mod session;

#[cfg(test)]
mod tests;

pub use credentials::{CredentialRecord, CredentialStore, LoadedRecord, StoredSecret};
pub use error::{AuthError, MIN_PASSWORD_LENGTH};
pub use service::AuthService;
pub use session::{FlashKind, FlashMessage, Session, SessionId, SessionStore};
