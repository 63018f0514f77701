use serde::{Deserialize, Serialize};

/// Privilege tiers, least to most. The derived ordering is the authorization
/// total order: Student < Teacher < Admin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Teacher,
    Admin,
}

impl Role {
    /// Parse a wire/store role string. Anything outside the enumerated set
    /// yields None; callers must never trust a role string that fails here.
    pub fn parse(value: &str) -> Option<Role> {
        match value {
            "student" => Some(Role::Student),
            "teacher" => Some(Role::Teacher),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Teacher => "teacher",
            Role::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Membership test against the exact enumerated role set.
pub fn is_valid_role(value: &str) -> bool {
    Role::parse(value).is_some()
}

/// True iff `user_role` names a known role at or above `required`.
///
/// An unrecognized role string always fails, on either side of the
/// comparison. (A literal index-position comparison would let two unknown
/// roles compare equal and pass; that is a lockout-adjacent bug, not a
/// contract.)
pub fn has_role(user_role: &str, required: Role) -> bool {
    match Role::parse(user_role) {
        Some(role) => role >= required,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hierarchy_is_total_order() {
        assert!(Role::Student < Role::Teacher);
        assert!(Role::Teacher < Role::Admin);
        assert!(Role::Student < Role::Admin);
    }

    #[test]
    fn has_role_respects_hierarchy() {
        assert!(!has_role("student", Role::Admin));
        assert!(has_role("admin", Role::Student));
        assert!(has_role("teacher", Role::Teacher));
        assert!(has_role("admin", Role::Admin));
        assert!(!has_role("teacher", Role::Admin));
    }

    #[test]
    fn unknown_roles_always_fail() {
        assert!(!has_role("superadmin", Role::Student));
        assert!(!has_role("", Role::Student));
        assert!(!has_role("Admin", Role::Admin));
    }

    #[test]
    fn validates_role_membership() {
        assert!(is_valid_role("student"));
        assert!(is_valid_role("teacher"));
        assert!(is_valid_role("admin"));
        assert!(!is_valid_role("superadmin"));
        assert!(!is_valid_role("owner"));
        assert!(!is_valid_role(" admin"));
    }

    #[test]
    fn parses_and_prints_wire_strings() {
        for s in ["student", "teacher", "admin"] {
            assert_eq!(Role::parse(s).unwrap().as_str(), s);
        }
        assert_eq!(Role::parse("moderator"), None);
    }
}
