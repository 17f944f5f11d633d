//! Server-side sessions keyed by an opaque cookie value.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashKind {
    Success,
    Error,
}

/// Notification shown once on the next page render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlashMessage {
    pub kind: FlashKind,
    pub text: String,
}

impl FlashMessage {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Error,
            text: text.into(),
        }
    }

    pub fn css_class(&self) -> &'static str {
        match self.kind {
            FlashKind::Success => "success",
            FlashKind::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for SessionId {
    // only a prefix, the full id is a bearer secret
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix: String = self.0.chars().take(8).collect();
        write!(f, "{}…", prefix)
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    pub logged_in: bool,
    pub flash: Option<FlashMessage>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<SessionId, Session>>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Starts a fresh logged-in session.
    pub fn create(&self) -> SessionId {
        let id = SessionId::generate();
        let session = Session {
            logged_in: true,
            flash: None,
            expires_at: Utc::now() + self.ttl,
        };

        let mut sessions = self.sessions.write();
        sessions.retain(|_, s| s.expires_at > Utc::now());
        sessions.insert(id.clone(), session);

        debug!(session = %id, "session created");
        id
    }

    pub fn is_logged_in(&self, id: &SessionId) -> bool {
        self.with_live(id, |session| session.logged_in).unwrap_or(false)
    }

    pub fn destroy(&self, id: &SessionId) {
        if self.sessions.write().remove(id).is_some() {
            debug!(session = %id, "session destroyed");
        }
    }

    pub fn set_flash(&self, id: &SessionId, flash: FlashMessage) {
        self.with_live(id, |session| session.flash = Some(flash));
    }

    /// Returns the pending flash message and clears it.
    pub fn take_flash(&self, id: &SessionId) -> Option<FlashMessage> {
        self.with_live(id, |session| session.flash.take()).flatten()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Runs `f` on the session when it exists and has not expired; expired
    /// sessions are dropped on the way.
    fn with_live<T>(&self, id: &SessionId, f: impl FnOnce(&mut Session) -> T) -> Option<T> {
        let mut sessions = self.sessions.write();
        let now = Utc::now();

        match sessions.get_mut(id) {
            Some(session) if session.expires_at > now => Some(f(session)),
            Some(_) => {
                sessions.remove(id);
                debug!(session = %id, "session expired");
                None
            }
            None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_destroy() {
        let store = SessionStore::new(Duration::minutes(30));
        let id = store.create();

        assert!(store.is_logged_in(&id));
        assert_eq!(store.len(), 1);

        store.destroy(&id);
        assert!(!store.is_logged_in(&id));
        assert!(store.is_empty());
    }

    #[test]
    fn test_unknown_session() {
        let store = SessionStore::new(Duration::minutes(30));
        assert!(!store.is_logged_in(&SessionId::from("forged")));
        assert_eq!(store.take_flash(&SessionId::from("forged")), None);
    }

    #[test]
    fn test_ids_are_unique() {
        let store = SessionStore::new(Duration::minutes(30));
        let a = store.create();
        let b = store.create();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 32);
    }

    #[test]
    fn test_flash_is_one_shot() {
        let store = SessionStore::new(Duration::minutes(30));
        let id = store.create();

        store.set_flash(&id, FlashMessage::success("File uploaded successfully!"));
        let flash = store.take_flash(&id).unwrap();
        assert_eq!(flash.kind, FlashKind::Success);
        assert_eq!(flash.css_class(), "success");
        assert_eq!(flash.text, "File uploaded successfully!");

        assert_eq!(store.take_flash(&id), None);
    }

    #[test]
    fn test_newer_flash_replaces_older() {
        let store = SessionStore::new(Duration::minutes(30));
        let id = store.create();

        store.set_flash(&id, FlashMessage::success("first"));
        store.set_flash(&id, FlashMessage::error("second"));

        assert_eq!(store.take_flash(&id), Some(FlashMessage::error("second")));
    }

    #[test]
    fn test_expired_sessions_are_dropped() {
        let store = SessionStore::new(Duration::zero());
        let id = store.create();

        assert!(!store.is_logged_in(&id));
        assert!(store.is_empty());
    }

    #[test]
    fn test_display_hides_full_id() {
        let store = SessionStore::new(Duration::minutes(1));
        let id = store.create();
        let shown = id.to_string();
        assert!(!shown.contains(id.as_str()));
        assert!(shown.starts_with(&id.as_str()[..8]));
    }
}
