//! # Campus Gateway (session gateway for the Campus Genius portal)
//!
//! `campus-gateway` sits between browsers and the Campus Genius backend API. It
//! owns the user session, guards page navigations by role and forwards API
//! calls to the backend with the session's bearer token attached.
//!
//! ## Sessions
//!
//! A session is created by exchanging credentials (email/password) or a Google
//! identity assertion with the backend. Sessions live in a [`session::SessionStore`]
//! and are referenced from the browser by an opaque, `HttpOnly` cookie. The
//! backend-issued access token is short-lived; the [`session::TokenManager`]
//! refreshes it lazily when a caller asks for a token within ten seconds of its
//! expiry, collapsing concurrent refreshes for one session into a single backend
//! call.
//!
//! A refresh that the backend rejects, or an expired federated session (which
//! never carries a refresh token), leaves a sticky error on the session. The
//! next page navigation clears it and redirects to the login page.
//!
//! ## Route Guard
//!
//! Page navigations pass through [`guard::evaluate`], a pure function of the
//! session's role and the target path. Role namespaces (`/student`, `/faculty`,
//! `/admin`) are exclusive: a session never sees another role's pages and is
//! redirected to its own dashboard instead.
//!
//! ## Proxies
//!
//! Handlers under `/api` forward to the backend and relay its status code and
//! body verbatim. Client and backend field names differ on a few endpoints; the
//! translations are static per-endpoint tables, see `api::handlers::proxy::mapping`.

pub mod api;
pub mod backend;
pub mod cli;
pub mod error;
pub mod guard;
pub mod session;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
