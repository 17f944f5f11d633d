//! Core library for UpBox: storage, authentication and the HTTP surface of a
//! single-user web file manager.

pub mod auth;
pub mod config;
pub mod error;
pub mod files;
pub mod handlers;
pub mod middleware;
pub mod views;

pub use auth::{AuthError, AuthService, CredentialStore, FlashMessage, SessionId, SessionStore};
pub use config::AppConfig;
pub use error::{AppError, Result};
pub use files::{FileCategory, FileRepository, StorageError, StoredFile};
pub use handlers::routes::create_routes;

use axum::{middleware as axum_middleware, Router};
use std::net::SocketAddr;
use tokio::signal;
use tracing::{error, info};

#[derive(Clone)]
pub struct AppState {
    pub app_name: String,
    pub version: String,
    pub files: FileRepository,
    pub auth: AuthService,
    pub cookie_secure: bool,
}

impl AppState {
    pub fn new(files: FileRepository, auth: AuthService) -> Self {
        Self {
            app_name: "UpBox".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            files,
            auth,
            cookie_secure: false,
        }
    }

    pub fn with_cookie_secure(mut self, secure: bool) -> Self {
        self.cookie_secure = secure;
        self
    }

    /// Opens the content root and wires the credential file and session store.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let files = FileRepository::new(&config.storage.content_dir)?;
        let store = CredentialStore::new(config.storage.credential_file.clone());
        let sessions = SessionStore::new(config.session_ttl());
        let auth = AuthService::new(store, sessions, config.auth.default_password.clone());

        Ok(Self::new(files, auth).with_cookie_secure(config.auth.cookie_secure))
    }
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .merge(create_routes(state.clone()))
        .layer(axum_middleware::from_fn(middleware::security_headers))
        .layer(middleware::logging_layer())
        .with_state(state)
}

pub async fn run_server(app: Router, addr: SocketAddr) -> Result<()> {
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
