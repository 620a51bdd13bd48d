//! Shared primitives for all Rust crates in rolescope.

#![forbid(unsafe_code)]

/// Identifier newtypes for identity-service resources.
pub mod ids;

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use ids::{RoleId, RoleName, TenantId, UserId};

/// Result type used across rolescope crates.
pub type AppResult<T> = Result<T, AppError>;

/// A validated non-empty UTF-8 string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NonEmptyString(String);

impl NonEmptyString {
    /// Creates a validated non-empty string.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::Validation(
                "value must not be empty or whitespace".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl TryFrom<String> for NonEmptyString {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

/// A revoke that could not be completed during cleanup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevokeFailure {
    /// User the role was granted to.
    pub user_id: UserId,
    /// Tenant the grant was scoped to.
    pub tenant_id: TenantId,
    /// Role that is still held.
    pub role_id: RoleId,
    /// Backend error description.
    pub reason: String,
}

/// Common application error categories.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid input or violated invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// Requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Write operation conflicts with existing state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Identity service refused the call for the current credential.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Identity service could not be reached or failed to answer.
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    /// One or more recorded grants could not be reverted.
    #[error("cleanup incomplete: {}", describe_revoke_failures(.0))]
    CleanupIncomplete(Vec<RevokeFailure>),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Builds the error raised when a configured role name is not in the catalogue.
    #[must_use]
    pub fn role_not_found(name: &str) -> Self {
        Self::NotFound(format!("There is no role with name `{name}`"))
    }

    /// Returns true for the `NotFound` category.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

fn describe_revoke_failures(failures: &[RevokeFailure]) -> String {
    let mut description = format!("{} revoke(s) failed", failures.len());
    for failure in failures {
        let _ = write!(
            description,
            "; role '{}' for user '{}' in tenant '{}': {}",
            failure.role_id, failure.user_id, failure.tenant_id, failure.reason
        );
    }
    description
}
