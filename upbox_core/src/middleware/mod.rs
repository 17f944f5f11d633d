//! Middleware components for the HTTP server

pub mod headers;
pub mod logging;
pub mod session;

pub use headers::security_headers;
pub use logging::logging_layer;
pub use session::{require_session, SessionContext, SESSION_COOKIE};
