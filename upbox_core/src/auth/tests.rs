#[cfg(test)]
mod tests {
    use crate::auth::{
        credentials::{CredentialStore, LoadedRecord, StoredSecret},
        error::AuthError,
        service::AuthService,
        session::{SessionId, SessionStore},
    };
    use chrono::Duration;
    use std::fs;
    use tempfile::TempDir;

    const DEFAULT_PASSWORD: &str = "admin123";

    fn setup_auth() -> (AuthService, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = CredentialStore::new(temp_dir.path().join("conf").join("config.json"));
        let sessions = SessionStore::new(Duration::hours(1));
        let auth = AuthService::new(store, sessions, DEFAULT_PASSWORD);
        (auth, temp_dir)
    }

    fn credential_bytes(auth: &AuthService) -> Vec<u8> {
        fs::read(auth.credential_store().path()).unwrap()
    }

    #[test]
    fn test_initialize_writes_hashed_default() {
        let (auth, _temp_dir) = setup_auth();

        auth.initialize().unwrap();

        let raw = String::from_utf8(credential_bytes(&auth)).unwrap();
        assert!(raw.contains("password_hash"));
        assert!(!raw.contains(DEFAULT_PASSWORD));
        assert!(auth.is_default_password().unwrap());
    }

    #[test]
    fn test_initialize_keeps_existing_record() {
        let (auth, _temp_dir) = setup_auth();
        auth.initialize().unwrap();
        let before = credential_bytes(&auth);

        auth.initialize().unwrap();

        assert_eq!(credential_bytes(&auth), before);
    }

    #[test]
    fn test_login_with_default_password() {
        let (auth, _temp_dir) = setup_auth();

        let session = auth.login(DEFAULT_PASSWORD).unwrap();

        assert!(auth.sessions().is_logged_in(&session));
    }

    #[test]
    fn test_login_rejects_wrong_password() {
        let (auth, _temp_dir) = setup_auth();

        let result = auth.login("not-the-password");

        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
        assert!(auth.sessions().is_empty());
    }

    #[test]
    fn test_logout_ends_session() {
        let (auth, _temp_dir) = setup_auth();
        let session = auth.login(DEFAULT_PASSWORD).unwrap();

        auth.logout(&session);

        assert!(!auth.sessions().is_logged_in(&session));
        // a second logout is harmless
        auth.logout(&session);
    }

    #[test]
    fn test_legacy_plaintext_is_upgraded_once() {
        let (auth, _temp_dir) = setup_auth();
        let path = auth.credential_store().path().to_path_buf();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, r#"{"password": "legacy-secret"}"#).unwrap();

        assert!(matches!(
            auth.login("wrong"),
            Err(AuthError::InvalidCredentials)
        ));
        assert!(fs::read_to_string(&path).unwrap().contains("legacy-secret"));

        auth.login("legacy-secret").unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert!(!raw.contains("legacy-secret"));
        assert!(!raw.contains("\"password\""));
        match auth.credential_store().load().unwrap() {
            LoadedRecord::Present(record) => {
                assert!(matches!(record.secret(), Some(StoredSecret::Hash(_))));
            }
            other => panic!("unexpected {:?}", other),
        }

        auth.login("legacy-secret").unwrap();
    }

    #[test]
    fn test_change_password_success() {
        let (auth, _temp_dir) = setup_auth();
        let session = auth.login(DEFAULT_PASSWORD).unwrap();

        auth.change_password(&session, DEFAULT_PASSWORD, "newpass1", "newpass1")
            .unwrap();

        assert!(matches!(
            auth.login(DEFAULT_PASSWORD),
            Err(AuthError::InvalidCredentials)
        ));
        auth.login("newpass1").unwrap();
        assert!(!auth.is_default_password().unwrap());
    }

    #[test]
    fn test_change_password_wrong_current_leaves_file_untouched() {
        let (auth, _temp_dir) = setup_auth();
        let session = auth.login(DEFAULT_PASSWORD).unwrap();
        let before = credential_bytes(&auth);

        let result = auth.change_password(&session, "wrong", "newpass1", "newpass1");

        assert!(matches!(result, Err(AuthError::WrongCurrentPassword)));
        assert_eq!(credential_bytes(&auth), before);
    }

    #[test]
    fn test_change_password_validation_order() {
        let (auth, _temp_dir) = setup_auth();
        let session = auth.login(DEFAULT_PASSWORD).unwrap();
        let before = credential_bytes(&auth);

        assert!(matches!(
            auth.change_password(&session, "wrong", "abc", "xyz"),
            Err(AuthError::WrongCurrentPassword)
        ));
        assert!(matches!(
            auth.change_password(&session, DEFAULT_PASSWORD, "abc", "xyz"),
            Err(AuthError::Mismatch)
        ));
        assert!(matches!(
            auth.change_password(&session, DEFAULT_PASSWORD, "abc", "abc"),
            Err(AuthError::TooShort { min_length: 6 })
        ));

        assert_eq!(credential_bytes(&auth), before);
    }

    #[test]
    fn test_password_length_counts_characters_not_bytes() {
        let (auth, _temp_dir) = setup_auth();
        let session = auth.login(DEFAULT_PASSWORD).unwrap();

        // five two-byte characters: ten bytes, still too short
        assert!(matches!(
            auth.change_password(&session, DEFAULT_PASSWORD, "ééééé", "ééééé"),
            Err(AuthError::TooShort { min_length: 6 })
        ));

        auth.change_password(&session, DEFAULT_PASSWORD, "éééééé", "éééééé")
            .unwrap();
        auth.login("éééééé").unwrap();
    }

    #[test]
    fn test_change_password_requires_session() {
        let (auth, _temp_dir) = setup_auth();
        auth.initialize().unwrap();

        let result = auth.change_password(
            &SessionId::from("forged"),
            DEFAULT_PASSWORD,
            "newpass1",
            "newpass1",
        );

        assert!(matches!(result, Err(AuthError::NotLoggedIn)));
        assert!(auth.is_default_password().unwrap());
    }

    #[test]
    fn test_corrupt_file_falls_back_without_overwrite() {
        let (auth, _temp_dir) = setup_auth();
        let path = auth.credential_store().path().to_path_buf();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{ not json").unwrap();

        auth.login(DEFAULT_PASSWORD).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "{ not json");
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(AuthError::InvalidCredentials.user_message(), "Invalid password");
        assert_eq!(
            AuthError::TooShort { min_length: 6 }.user_message(),
            "New password must be at least 6 characters long"
        );
        assert_eq!(
            AuthError::Mismatch.user_message(),
            "New passwords do not match"
        );
    }
}
