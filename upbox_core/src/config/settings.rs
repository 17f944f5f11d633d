use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::auth::MIN_PASSWORD_LENGTH;

/// Default file looked up in the working directory.
pub const CONFIG_FILE: &str = "upbox.toml";

/// One year; longer values are clamped.
const MAX_SESSION_TTL_MINUTES: u64 = 365 * 24 * 60;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub content_dir: PathBuf,
    pub credential_file: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub default_password: String,
    pub session_ttl_minutes: u64,
    pub cookie_secure: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            content_dir: PathBuf::from("./content"),
            credential_file: PathBuf::from("./conf/config.json"),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            default_password: "admin123".to_string(),
            session_ttl_minutes: 24 * 60,
            cookie_secure: false,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    /// Defaults, then `path` when it exists, then `UPBOX_*` variables
    /// (`UPBOX_SERVER__PORT=8080`).
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let mut builder = Config::builder().add_source(Config::try_from(&AppConfig::default())?);

        if path.exists() {
            builder = builder.add_source(File::from(path));
        }

        builder = builder.add_source(
            Environment::with_prefix("UPBOX")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        let app_config: AppConfig = config.try_deserialize()?;

        app_config.validate()?;

        Ok(app_config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Message("Server port cannot be 0".to_string()));
        }

        if self.server.host.is_empty() {
            return Err(ConfigError::Message("Server host cannot be empty".to_string()));
        }

        if self.storage.content_dir.as_os_str().is_empty() {
            return Err(ConfigError::Message(
                "Content directory cannot be empty".to_string(),
            ));
        }

        if self.storage.credential_file.as_os_str().is_empty() {
            return Err(ConfigError::Message(
                "Credential file path cannot be empty".to_string(),
            ));
        }

        if self.auth.default_password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(ConfigError::Message(format!(
                "Default password must be at least {} characters",
                MIN_PASSWORD_LENGTH
            )));
        }

        if self.auth.session_ttl_minutes == 0 {
            return Err(ConfigError::Message(
                "Session TTL must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    pub fn create_directories(&self) -> Result<(), std::io::Error> {
        std::fs::create_dir_all(&self.storage.content_dir)?;
        if let Some(parent) = self.storage.credential_file.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn session_ttl(&self) -> chrono::Duration {
        let minutes = self.auth.session_ttl_minutes.min(MAX_SESSION_TTL_MINUTES);
        chrono::Duration::minutes(minutes as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.storage.content_dir, PathBuf::from("./content"));
        assert_eq!(config.storage.credential_file, PathBuf::from("./conf/config.json"));
        assert_eq!(config.auth.default_password, "admin123");
        assert_eq!(config.auth.session_ttl_minutes, 1440);
        assert!(!config.auth.cookie_secure);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = AppConfig::default();

        config.server.port = 0;
        assert!(config.validate().is_err());

        config = AppConfig::default();
        config.storage.content_dir = PathBuf::new();
        assert!(config.validate().is_err());

        config = AppConfig::default();
        config.storage.credential_file = PathBuf::new();
        assert!(config.validate().is_err());

        config = AppConfig::default();
        config.auth.default_password = "short".to_string();
        assert!(config.validate().is_err());

        config = AppConfig::default();
        config.auth.session_ttl_minutes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bind_address() {
        let config = AppConfig::default();
        assert_eq!(config.bind_address(), "127.0.0.1:3000");

        let mut config = AppConfig::default();
        config.server.host = "0.0.0.0".to_string();
        config.server.port = 8080;
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
    }

    #[test]
    fn test_session_ttl() {
        let mut config = AppConfig::default();
        assert_eq!(config.session_ttl(), chrono::Duration::hours(24));

        config.auth.session_ttl_minutes = u64::MAX;
        assert_eq!(config.session_ttl(), chrono::Duration::days(365));
    }

    #[test]
    fn test_config_loading_without_file() {
        let temp_dir = TempDir::new().unwrap();

        let config = AppConfig::load_from(&temp_dir.path().join("missing.toml"))
            .expect("Should load default configuration");

        assert!(!config.server.host.is_empty());
        assert!(config.server.port > 0);
        assert!(config.auth.session_ttl_minutes > 0);
    }

    #[test]
    fn test_config_file_overrides_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("upbox.toml");
        fs::write(
            &path,
            r#"
[storage]
content_dir = "/srv/upbox/content"

[auth]
session_ttl_minutes = 30
"#,
        )
        .unwrap();

        let config = AppConfig::load_from(&path).expect("Should load configuration file");

        assert_eq!(config.storage.content_dir, PathBuf::from("/srv/upbox/content"));
        assert_eq!(config.auth.session_ttl_minutes, 30);
        assert_eq!(config.auth.default_password, "admin123");
    }

    #[test]
    fn test_invalid_config_file_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("upbox.toml");
        fs::write(&path, "[auth]\ndefault_password = \"abc\"\n").unwrap();

        assert!(AppConfig::load_from(&path).is_err());
    }

    #[test]
    fn test_directory_creation() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = AppConfig::default();
        config.storage.content_dir = temp_dir.path().join("content");
        config.storage.credential_file = temp_dir.path().join("conf").join("config.json");

        assert!(config.create_directories().is_ok());

        assert!(config.storage.content_dir.exists());
        assert!(temp_dir.path().join("conf").exists());
    }
}
