//! Login, logout and password change handlers

use axum::{
    extract::{Extension, Form, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::{
    auth::{AuthError, FlashMessage},
    error::{AppError, Result},
    middleware::session::{removal_cookie, session_cookie, session_from_jar, SessionContext},
    views, AppState,
};

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordForm {
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
    #[serde(default)]
    pub confirm_password: String,
}

pub async fn login_page(State(state): State<AppState>, jar: CookieJar) -> Response {
    if let Some(id) = session_from_jar(&jar) {
        if state.auth.sessions().is_logged_in(&id) {
            return Redirect::to("/").into_response();
        }
    }

    Html(views::login_page(None)).into_response()
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let auth = state.auth.clone();
    let outcome = run_blocking(move || auth.login(&form.password)).await?;

    match outcome {
        Ok(session) => {
            if let Some(previous) = session_from_jar(&jar) {
                state.auth.sessions().destroy(&previous);
            }
            let jar = jar.add(session_cookie(&session, state.cookie_secure));
            Ok((jar, Redirect::to("/")).into_response())
        }
        Err(AuthError::InvalidCredentials) => Ok((
            StatusCode::OK,
            Html(views::login_page(Some(
                AuthError::InvalidCredentials.user_message(),
            ))),
        )
            .into_response()),
        Err(e) => Err(e.into()),
    }
}

pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    if let Some(id) = session_from_jar(&jar) {
        state.auth.logout(&id);
    }

    (jar.remove(removal_cookie()), Redirect::to("/login"))
}

pub async fn change_password(
    State(state): State<AppState>,
    Extension(session): Extension<SessionContext>,
    Form(form): Form<ChangePasswordForm>,
) -> Result<Redirect> {
    let flash = if form.current_password.is_empty()
        || form.new_password.is_empty()
        || form.confirm_password.is_empty()
    {
        FlashMessage::error("All fields are required")
    } else {
        let auth = state.auth.clone();
        let id = session.id.clone();
        let outcome = run_blocking(move || {
            auth.change_password(
                &id,
                &form.current_password,
                &form.new_password,
                &form.confirm_password,
            )
        })
        .await?;

        match outcome {
            Ok(()) => FlashMessage::success("Password changed successfully!"),
            Err(e @ (AuthError::Storage(_) | AuthError::Encoding(_) | AuthError::Hashing(_))) => {
                error!(session = %session.id, error = %e, "password change failed");
                FlashMessage::error(e.user_message())
            }
            Err(e) => {
                info!(session = %session.id, reason = %e, "password change refused");
                FlashMessage::error(e.user_message())
            }
        }
    };

    state.auth.sessions().set_flash(&session.id, flash);
    Ok(Redirect::to("/?settings=1"))
}

/// Argon2 work stays off the async workers.
async fn run_blocking<F, T>(f: F) -> Result<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        warn!(error = %e, "credential task did not complete");
        AppError::InternalServerError
    })
}
