use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The three account roles. Authorization checks match on this enum
/// exhaustively so a new role can't silently slip past a gate.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Teacher,
    Admin,
}

impl Role {
    /// Whether the role may create and manage courses and assignments.
    pub fn can_instruct(self) -> bool {
        match self {
            Role::Teacher | Role::Admin => true,
            Role::Student => false,
        }
    }

    pub fn is_admin(self) -> bool {
        match self {
            Role::Admin => true,
            Role::Teacher | Role::Student => false,
        }
    }

    pub fn is_student(self) -> bool {
        match self {
            Role::Student => true,
            Role::Teacher | Role::Admin => false,
        }
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::Student
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Student => write!(f, "student"),
            Role::Teacher => write!(f, "teacher"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

impl FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Role::Student),
            "teacher" => Ok(Role::Teacher),
            "admin" => Ok(Role::Admin),
            _ => Err(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_lowercase_strings() {
        assert_eq!(serde_json::to_string(&Role::Student).unwrap(), "\"student\"");
        assert_eq!(serde_json::to_string(&Role::Teacher).unwrap(), "\"teacher\"");
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
    }

    #[test]
    fn parses_known_roles_only() {
        assert_eq!(Role::from_str("teacher"), Ok(Role::Teacher));
        assert_eq!(Role::from_str("admin"), Ok(Role::Admin));
        assert_eq!(Role::from_str("student"), Ok(Role::Student));
        assert!(Role::from_str("Teacher").is_err());
        assert!(Role::from_str("superuser").is_err());
    }

    #[test]
    fn instruct_gate_rejects_students() {
        assert!(!Role::Student.can_instruct());
        assert!(Role::Teacher.can_instruct());
        assert!(Role::Admin.can_instruct());
    }

    #[test]
    fn admin_gate_rejects_teachers() {
        assert!(!Role::Student.is_admin());
        assert!(!Role::Teacher.is_admin());
        assert!(Role::Admin.is_admin());
    }
}
