//! Page navigation middleware: loads the caller's session and applies [`crate::guard::evaluate`].

use super::auth::{cookie::clear_session_cookie, cookie::extract_session_token, end_session};
use crate::{
    api::state::AppState,
    error::AuthError,
    guard::{self as policy, AUTH_NAMESPACE, Decision, LOGIN_PATH, Subject},
    session::role::in_namespace,
};
use axum::{
    body::Body,
    extract::Extension,
    http::{Request, header::SET_COOKIE},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;
use tracing::{debug, info};

/// What the guard learned about the cookie while resolving the subject.
enum Lookup {
    Subject(Subject),
    /// Cookie names a session that does not exist.
    Stale,
    /// Session was invalidated; it has been cleared and the user must sign in.
    Expired,
}

pub async fn guard(
    state: Extension<Arc<AppState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();

    if let Some(target) = policy::legacy_redirect(&path) {
        return Redirect::permanent(target).into_response();
    }

    let session_id = extract_session_token(request.headers());
    let (subject, clear_cookie) = match lookup(&state, session_id).await {
        Lookup::Subject(subject) => (subject, false),
        Lookup::Stale => (Subject::Anonymous, true),
        Lookup::Expired => {
            let response = if in_namespace(&path, AUTH_NAMESPACE) {
                next.run(request).await
            } else {
                Redirect::temporary(LOGIN_PATH).into_response()
            };
            return with_cleared_cookie(&state, response);
        }
    };

    let response = match policy::evaluate(subject, &path) {
        Decision::Allow => next.run(request).await,
        Decision::RedirectTo(target) => {
            debug!(%path, target, "navigation redirected");
            Redirect::temporary(target).into_response()
        }
    };

    if clear_cookie {
        with_cleared_cookie(&state, response)
    } else {
        response
    }
}

async fn lookup(state: &AppState, session_id: Option<String>) -> Lookup {
    let Some(id) = session_id else {
        return Lookup::Subject(Subject::Anonymous);
    };

    match state.tokens().current(&id).await {
        Ok(session) => Lookup::Subject(Subject::Authenticated {
            role: session.role(),
        }),
        Err(AuthError::Unauthorized) => Lookup::Stale,
        // Backend is down: keep the session and route by its stored role.
        Err(AuthError::BackendUnavailable(_)) => match state.store().get(&id).await {
            Some(session) => Lookup::Subject(Subject::Authenticated {
                role: session.role(),
            }),
            None => Lookup::Stale,
        },
        Err(error) => {
            info!("session invalidated: {error}");
            end_session(state, &id).await;
            Lookup::Expired
        }
    }
}

fn with_cleared_cookie(state: &AppState, mut response: Response) -> Response {
    if let Ok(cookie) = clear_session_cookie(state.config()) {
        response.headers_mut().append(SET_COOKIE, cookie);
    }
    response
}
