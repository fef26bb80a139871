//! Route guard policy for page navigations.
//!
//! A pure function of who is asking and where they are going. The middleware
//! in `api::handlers::guard` loads the session and applies the decision.

use crate::session::{Role, role::in_namespace};

pub const LOGIN_PATH: &str = "/auth/login";
pub const AUTH_NAMESPACE: &str = "/auth";
/// Identity-provider callbacks; intercepting these causes login loops.
pub const CALLBACK_NAMESPACE: &str = "/api/auth";

/// Old page paths that moved, answered with a permanent redirect.
const LEGACY_REDIRECTS: &[(&str, &str)] = &[("/student/lectures", "/student/video-lectures")];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Subject {
    Anonymous,
    Authenticated { role: Option<Role> },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    Allow,
    RedirectTo(&'static str),
}

#[must_use]
pub fn evaluate(subject: Subject, path: &str) -> Decision {
    if in_namespace(path, CALLBACK_NAMESPACE) {
        return Decision::Allow;
    }

    let is_root = path == "/" || path.is_empty();
    let is_auth = in_namespace(path, AUTH_NAMESPACE);

    match subject {
        Subject::Anonymous => {
            if is_root || is_auth {
                Decision::Allow
            } else {
                Decision::RedirectTo(LOGIN_PATH)
            }
        }
        Subject::Authenticated { role } => {
            if is_root || is_auth {
                return match role {
                    Some(role) => Decision::RedirectTo(role.dashboard()),
                    // Let a role-less session reach the auth pages so it can sign out.
                    None if is_auth => Decision::Allow,
                    None => Decision::RedirectTo(LOGIN_PATH),
                };
            }
            match (Role::owner_of(path), role) {
                (Some(owner), Some(role)) if owner != role => {
                    Decision::RedirectTo(role.dashboard())
                }
                (Some(_), None) => Decision::RedirectTo(LOGIN_PATH),
                _ => Decision::Allow,
            }
        }
    }
}

/// Permanent redirect target for a moved page, checked before the guard.
#[must_use]
pub fn legacy_redirect(path: &str) -> Option<&'static str> {
    let path = path.trim_end_matches('/');
    LEGACY_REDIRECTS
        .iter()
        .find(|(from, _)| *from == path)
        .map(|(_, to)| *to)
}

#[cfg(test)]
mod tests {
    use super::*;

    const STUDENT: Subject = Subject::Authenticated {
        role: Some(Role::Student),
    };
    const FACULTY: Subject = Subject::Authenticated {
        role: Some(Role::Faculty),
    };
    const ADMIN: Subject = Subject::Authenticated {
        role: Some(Role::Admin),
    };
    const ROLELESS: Subject = Subject::Authenticated { role: None };

    #[test]
    fn anonymous_is_sent_to_login() {
        assert_eq!(
            evaluate(Subject::Anonymous, "/faculty/dashboard"),
            Decision::RedirectTo("/auth/login")
        );
        assert_eq!(
            evaluate(Subject::Anonymous, "/about"),
            Decision::RedirectTo("/auth/login")
        );
        assert_eq!(evaluate(Subject::Anonymous, "/"), Decision::Allow);
        assert_eq!(evaluate(Subject::Anonymous, "/auth/login"), Decision::Allow);
        assert_eq!(evaluate(Subject::Anonymous, "/auth/register"), Decision::Allow);
    }

    #[test]
    fn cross_role_access_redirects_to_own_dashboard() {
        assert_eq!(
            evaluate(STUDENT, "/faculty/dashboard"),
            Decision::RedirectTo("/student/dashboard")
        );
        assert_eq!(
            evaluate(FACULTY, "/admin/users"),
            Decision::RedirectTo("/faculty/dashboard")
        );
        assert_eq!(
            evaluate(ADMIN, "/student/quizzes"),
            Decision::RedirectTo("/admin/dashboard")
        );
    }

    #[test]
    fn root_and_auth_pages_redirect_to_dashboard() {
        assert_eq!(
            evaluate(FACULTY, "/"),
            Decision::RedirectTo("/faculty/dashboard")
        );
        assert_eq!(
            evaluate(STUDENT, "/auth/login"),
            Decision::RedirectTo("/student/dashboard")
        );
    }

    #[test]
    fn own_namespace_and_shared_pages_are_allowed() {
        assert_eq!(evaluate(STUDENT, "/student/dashboard"), Decision::Allow);
        assert_eq!(evaluate(FACULTY, "/faculty/courses/3"), Decision::Allow);
        assert_eq!(evaluate(STUDENT, "/profile"), Decision::Allow);
        // Not a reserved namespace, only a shared prefix.
        assert_eq!(evaluate(STUDENT, "/faculty-directory"), Decision::Allow);
    }

    #[test]
    fn roleless_session_can_only_sign_out() {
        assert_eq!(evaluate(ROLELESS, "/auth/logout"), Decision::Allow);
        assert_eq!(evaluate(ROLELESS, "/"), Decision::RedirectTo("/auth/login"));
        assert_eq!(
            evaluate(ROLELESS, "/student/dashboard"),
            Decision::RedirectTo("/auth/login")
        );
        assert_eq!(evaluate(ROLELESS, "/profile"), Decision::Allow);
    }

    #[test]
    fn callback_namespace_is_never_intercepted() {
        for subject in [Subject::Anonymous, STUDENT, ROLELESS] {
            assert_eq!(
                evaluate(subject, "/api/auth/callback/google"),
                Decision::Allow
            );
        }
    }

    #[test]
    fn legacy_lectures_path_moves() {
        assert_eq!(
            legacy_redirect("/student/lectures"),
            Some("/student/video-lectures")
        );
        assert_eq!(
            legacy_redirect("/student/lectures/"),
            Some("/student/video-lectures")
        );
        assert_eq!(legacy_redirect("/student/video-lectures"), None);
    }
}
