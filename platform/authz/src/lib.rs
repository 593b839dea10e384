//! Authorization primitives for the HR surfaces.
//!
//! Callers carry a single role. Ownership rules (a manager owns a
//! department) are evaluated by each operation; this crate only provides the
//! role gates they start from.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("{0}")]
    Forbidden(String),
}

impl AuthzError {
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Manager,
    Employee,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Employee => "employee",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "manager" => Some(Role::Manager),
            "employee" => Some(Role::Employee),
            _ => None,
        }
    }
}

/// The authenticated identity a request runs as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
}

impl Caller {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_manager(&self) -> bool {
        self.role == Role::Manager
    }

    pub fn is_employee(&self) -> bool {
        self.role == Role::Employee
    }

    /// Succeeds when the caller holds one of `allowed`.
    pub fn require_any(&self, allowed: &[Role], message: &str) -> Result<(), AuthzError> {
        if allowed.contains(&self.role) {
            Ok(())
        } else {
            tracing::debug!(user_id = %self.user_id, role = self.role.as_str(), "role gate denied");
            Err(AuthzError::forbidden(message))
        }
    }

    /// Admins pass unconditionally; managers pass when `owns` holds.
    pub fn require_admin_or_owner(&self, owns: bool, message: &str) -> Result<(), AuthzError> {
        match self.role {
            Role::Admin => Ok(()),
            Role::Manager if owns => Ok(()),
            Role::Manager => {
                tracing::debug!(user_id = %self.user_id, "ownership check denied");
                Err(AuthzError::forbidden(message))
            }
            Role::Employee => Err(AuthzError::forbidden("Not enough privileges")),
        }
    }
}
