//! User role enumeration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Roles recognized by the monitoring dashboard.
///
/// Only `Admin` bypasses machine scoping; every other role (including
/// unknown role strings from the backend) is restricted to its assigned
/// machines.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Full fleet visibility and configuration access.
    Admin,
    /// Oversees a subset of machines.
    Supervisor,
    /// Operates assigned machines only.
    Employee,
    /// A role string this build does not recognize. Treated as fully
    /// scoped, never as admin.
    #[serde(untagged)]
    Other(String),
}

impl UserRole {
    /// Check if this role is an admin.
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }

    /// Return the role as a lowercase string.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Admin => "admin",
            Self::Supervisor => "supervisor",
            Self::Employee => "employee",
            Self::Other(s) => s.as_str(),
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "admin" => Self::Admin,
            "supervisor" => Self::Supervisor,
            "employee" => Self::Employee,
            other => Self::Other(other.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str() {
        assert_eq!("admin".parse::<UserRole>().unwrap(), UserRole::Admin);
        assert_eq!("EMPLOYEE".parse::<UserRole>().unwrap(), UserRole::Employee);
        assert_eq!(
            "janitor".parse::<UserRole>().unwrap(),
            UserRole::Other("janitor".to_string())
        );
    }

    #[test]
    fn test_only_admin_is_admin() {
        assert!(UserRole::Admin.is_admin());
        assert!(!UserRole::Supervisor.is_admin());
        assert!(!UserRole::Other("admin2".into()).is_admin());
    }
}
