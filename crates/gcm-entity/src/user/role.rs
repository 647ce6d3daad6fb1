//! User role enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Roles known to the GCM server.
///
/// Ordered by privilege: CompanyManager > ContentManager > Employee > Customer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Buys maps and subscriptions.
    Customer,
    /// Edits catalog content and submits changes for approval.
    Employee,
    /// Approves content changes and proposes price changes.
    ContentManager,
    /// Approves price changes and administers accounts.
    CompanyManager,
}

impl UserRole {
    /// Return the privilege level (higher = more privileged).
    pub fn privilege_level(&self) -> u8 {
        match self {
            Self::CompanyManager => 4,
            Self::ContentManager => 3,
            Self::Employee => 2,
            Self::Customer => 1,
        }
    }

    /// Check if this role has at least the given role's privileges.
    pub fn has_at_least(&self, other: &UserRole) -> bool {
        self.privilege_level() >= other.privilege_level()
    }

    /// Return the role as a snake_case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Employee => "employee",
            Self::ContentManager => "content_manager",
            Self::CompanyManager => "company_manager",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = gcm_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "customer" => Ok(Self::Customer),
            "employee" => Ok(Self::Employee),
            "content_manager" => Ok(Self::ContentManager),
            "company_manager" => Ok(Self::CompanyManager),
            _ => Err(gcm_core::AppError::validation(format!(
                "Invalid user role: '{s}'. Expected one of: customer, employee, content_manager, company_manager"
            ))),
        }
    }
}
