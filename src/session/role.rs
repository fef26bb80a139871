//! Roles and the page namespaces they own.

use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Faculty,
    Admin,
}

/// Namespace ownership: each prefix is reserved for exactly one role.
const NAMESPACES: [(Role, &str); 3] = [
    (Role::Student, "/student"),
    (Role::Faculty, "/faculty"),
    (Role::Admin, "/admin"),
];

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Faculty => "faculty",
            Self::Admin => "admin",
        }
    }

    #[must_use]
    pub const fn namespace(self) -> &'static str {
        match self {
            Self::Student => "/student",
            Self::Faculty => "/faculty",
            Self::Admin => "/admin",
        }
    }

    #[must_use]
    pub const fn dashboard(self) -> &'static str {
        match self {
            Self::Student => "/student/dashboard",
            Self::Faculty => "/faculty/dashboard",
            Self::Admin => "/admin/dashboard",
        }
    }

    /// Parse a backend role string; unknown values yield `None`.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "student" => Some(Self::Student),
            "faculty" => Some(Self::Faculty),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }

    /// The role whose namespace contains `path`, if any.
    #[must_use]
    pub fn owner_of(path: &str) -> Option<Self> {
        NAMESPACES
            .iter()
            .find(|(_, prefix)| in_namespace(path, prefix))
            .map(|(role, _)| *role)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Segment-aware prefix match: `/student` and `/student/x` match, `/students` does not.
pub(crate) fn in_namespace(path: &str, prefix: &str) -> bool {
    path.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive_and_closed() {
        assert_eq!(Role::parse("student"), Some(Role::Student));
        assert_eq!(Role::parse(" Faculty "), Some(Role::Faculty));
        assert_eq!(Role::parse("ADMIN"), Some(Role::Admin));
        assert_eq!(Role::parse("staff"), None);
        assert_eq!(Role::parse(""), None);
    }

    #[test]
    fn owner_of_respects_segment_boundaries() {
        assert_eq!(Role::owner_of("/student"), Some(Role::Student));
        assert_eq!(Role::owner_of("/student/quizzes/4"), Some(Role::Student));
        assert_eq!(Role::owner_of("/faculty/dashboard"), Some(Role::Faculty));
        assert_eq!(Role::owner_of("/admin/users"), Some(Role::Admin));
        assert_eq!(Role::owner_of("/students"), None);
        assert_eq!(Role::owner_of("/about"), None);
        assert_eq!(Role::owner_of("/"), None);
    }

    #[test]
    fn dashboards_live_in_their_own_namespace() {
        for (role, _) in NAMESPACES {
            assert_eq!(Role::owner_of(role.dashboard()), Some(role));
            assert!(in_namespace(role.dashboard(), role.namespace()));
        }
    }

    #[test]
    fn serde_uses_lowercase_names() -> anyhow::Result<()> {
        assert_eq!(serde_json::to_string(&Role::Faculty)?, "\"faculty\"");
        let role: Role = serde_json::from_str("\"admin\"")?;
        assert_eq!(role, Role::Admin);
        Ok(())
    }
}
