//! Route table

use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};

use super::{auth, files, health};
use crate::{files::MAX_FILE_SIZE, middleware::session::require_session, AppState};

/// Headroom for multipart boundaries and part headers on top of the file cap.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn create_routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/", get(files::index))
        .route(
            "/upload",
            post(files::upload)
                .layer(DefaultBodyLimit::max(MAX_FILE_SIZE as usize + MULTIPART_OVERHEAD)),
        )
        .route("/delete", post(files::delete))
        .route("/content/:name", get(files::download))
        .route("/change_password", post(auth::change_password))
        .route_layer(axum_middleware::from_fn_with_state(state, require_session));

    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", get(auth::logout))
        .route("/health", get(health::handle_health))
        .merge(protected)
}
