//! HR vertical slice.
//!
//! Every operation takes the resolved [`Caller`] and evaluates its own
//! role/ownership rule before touching the database:
//!
//! * departments belong to exactly one manager,
//! * an employee record ties a user to one department,
//! * timesheets and leave requests hang off employee records.

pub mod departments;
pub mod employees;
mod error;
pub mod leave_requests;
pub mod timesheets;
pub mod users;

use entity::users as user_entity;
pub use error::{HrError, HrResult};
pub use platform_authz::{Caller, Role};
use serde::{Deserialize, Deserializer};

pub(crate) const FORBIDDEN: &str = "Not enough privileges";

pub fn role_from_entity(role: user_entity::Role) -> Role {
    match role {
        user_entity::Role::Admin => Role::Admin,
        user_entity::Role::Manager => Role::Manager,
        user_entity::Role::Employee => Role::Employee,
    }
}

pub fn role_to_entity(role: Role) -> user_entity::Role {
    match role {
        Role::Admin => user_entity::Role::Admin,
        Role::Manager => user_entity::Role::Manager,
        Role::Employee => user_entity::Role::Employee,
    }
}

pub fn caller_from_user(user: &user_entity::Model) -> Caller {
    Caller {
        user_id: user.id,
        email: user.email.clone(),
        role: role_from_entity(user.role),
    }
}

/// Distinguishes an absent field (`None`) from an explicit `null`
/// (`Some(None)`) in partial updates.
pub(crate) fn nullable<'de, D, T>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}
