use platform_authn::AuthnError;
use platform_authz::AuthzError;
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

pub type HrResult<T> = Result<T, HrError>;

#[derive(Debug, Error)]
pub enum HrError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Forbidden(String),
    /// Business-rule violation such as a populated department or a second
    /// department membership.
    #[error("{0}")]
    Conflict(String),
    /// A unique value already claimed by another record.
    #[error("{0}")]
    Duplicate(String),
    #[error("{0}")]
    Validation(String),
    #[error("database error: {0}")]
    Db(#[from] DbErr),
    #[error(transparent)]
    Authn(#[from] AuthnError),
}

impl HrError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

impl From<AuthzError> for HrError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::Forbidden(message) => HrError::Forbidden(message),
        }
    }
}

/// Maps a unique-key violation to `on_unique`; other failures stay database
/// errors.
pub(crate) fn unique_violation(err: DbErr, on_unique: impl FnOnce() -> HrError) -> HrError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => on_unique(),
        _ => HrError::Db(err),
    }
}

/// Maps a foreign-key violation to a conflict carrying `message`.
pub(crate) fn reference_violation(err: DbErr, message: &str) -> HrError {
    match err.sql_err() {
        Some(SqlErr::ForeignKeyConstraintViolation(_)) => HrError::conflict(message),
        _ => HrError::Db(err),
    }
}

pub(crate) fn check_length(field: &str, value: &str, max: usize) -> HrResult<()> {
    if value.chars().count() > max {
        return Err(HrError::validation(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(())
}

pub(crate) fn required_text(field: &str, value: &str, max: usize) -> HrResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(HrError::validation(format!("{field} is required")));
    }
    check_length(field, trimmed, max)?;
    Ok(trimmed.to_string())
}
