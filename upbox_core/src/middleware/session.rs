//! Cookie-backed session gate for the protected routes.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::auth::SessionId;
use crate::AppState;

pub const SESSION_COOKIE: &str = "UPBOX_SESSION";

/// The live session of the current request, inserted by [`require_session`].
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub id: SessionId,
}

/// Session id carried by the request cookie, if any. Not validated.
pub fn session_from_jar(jar: &CookieJar) -> Option<SessionId> {
    jar.get(SESSION_COOKIE)
        .map(|cookie| SessionId::from(cookie.value()))
}

/// Redirects to `/login` unless the cookie names a live, logged-in session.
pub async fn require_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    match session_from_jar(&jar) {
        Some(id) if state.auth.sessions().is_logged_in(&id) => {
            request.extensions_mut().insert(SessionContext { id });
            next.run(request).await
        }
        Some(_) => {
            tracing::debug!(path = %request.uri().path(), "stale session cookie");
            (jar.remove(removal_cookie()), Redirect::to("/login")).into_response()
        }
        None => Redirect::to("/login").into_response(),
    }
}

pub fn session_cookie(id: &SessionId, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, id.as_str().to_string()))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .build()
}

pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE).path("/").build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::SessionStore;

    #[test]
    fn test_session_cookie_attributes() {
        let id = SessionStore::new(chrono::Duration::minutes(5)).create();
        let cookie = session_cookie(&id, true);

        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.value(), id.as_str());
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.path(), Some("/"));
    }

    #[test]
    fn test_session_from_jar() {
        let jar = CookieJar::new();
        assert!(session_from_jar(&jar).is_none());

        let jar = jar.add(Cookie::new(SESSION_COOKIE, "abc"));
        assert_eq!(session_from_jar(&jar), Some(SessionId::from("abc")));
    }
}
