// Session cookie middleware

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use tracing::debug;

use crate::session::{SessionHandle, SessionId};
use crate::AppState;

/// Make sure every request carries a session id
///
/// Reads the session cookie, or starts a new session. The id goes into the request
/// extensions as a `SessionHandle`; the cookie is set on the way out when the
/// session is new or a handler rotated it.
pub async fn ensure_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let cookie_name = state.config.session.cookie_name.clone();

    let existing = jar
        .get(&cookie_name)
        .and_then(|cookie| SessionId::parse(cookie.value()));

    let (issued, is_new) = match existing {
        Some(id) => (id, false),
        None => (SessionId::generate(), true),
    };

    let handle = SessionHandle::new(issued);
    request.extensions_mut().insert(handle.clone());
    let response = next.run(request).await;

    let current = handle.id();
    if current != issued {
        debug!("Session rotated, re-issuing cookie");
    } else if is_new {
        debug!("Started new session");
    } else {
        return response;
    }

    let cookie = Cookie::build((cookie_name, current.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);

    (jar.add(cookie), response).into_response()
}
