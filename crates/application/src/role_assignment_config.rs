use std::collections::HashSet;

use rolescope_core::{AppError, AppResult, NonEmptyString, RoleName};
use serde::{Deserialize, Serialize};

/// Default number of users processed concurrently.
pub const DEFAULT_MAX_CONCURRENCY: usize = 8;

/// Roles to grant for a task and the per-user worker bound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawRoleAssignmentConfig")]
pub struct RoleAssignmentConfig {
    roles: Vec<RoleName>,
    max_concurrency: usize,
}

#[derive(Deserialize)]
struct RawRoleAssignmentConfig {
    roles: Vec<String>,
    #[serde(default = "default_max_concurrency")]
    max_concurrency: usize,
}

fn default_max_concurrency() -> usize {
    DEFAULT_MAX_CONCURRENCY
}

impl RoleAssignmentConfig {
    /// Creates a configuration from role names.
    ///
    /// Repeated names are kept once, in first-seen order. An empty list or a
    /// blank name is rejected.
    pub fn new<I, S>(roles: I) -> AppResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let mut names = Vec::new();
        for role in roles {
            let role = NonEmptyString::new(role).map_err(|_| {
                AppError::Validation("role names must not be empty or whitespace".to_owned())
            })?;
            let name = RoleName::new(role);
            if seen.insert(name.clone()) {
                names.push(name);
            }
        }

        if names.is_empty() {
            return Err(AppError::Validation(
                "role assignment requires at least one role name".to_owned(),
            ));
        }

        Ok(Self {
            roles: names,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        })
    }

    /// Sets how many users are processed at the same time.
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> AppResult<Self> {
        if max_concurrency == 0 {
            return Err(AppError::Validation(
                "max_concurrency must be greater than zero".to_owned(),
            ));
        }

        self.max_concurrency = max_concurrency;
        Ok(self)
    }

    /// Returns the configured role names in order.
    #[must_use]
    pub fn roles(&self) -> &[RoleName] {
        &self.roles
    }

    /// Returns the per-user worker bound.
    #[must_use]
    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }
}

impl TryFrom<RawRoleAssignmentConfig> for RoleAssignmentConfig {
    type Error = AppError;

    fn try_from(raw: RawRoleAssignmentConfig) -> Result<Self, Self::Error> {
        Self::new(raw.roles)?.with_max_concurrency(raw.max_concurrency)
    }
}
