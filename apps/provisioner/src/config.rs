use std::env;
use std::path::PathBuf;

use rolescope_application::{DEFAULT_MAX_CONCURRENCY, RoleAssignmentConfig};
use rolescope_core::{AppError, AppResult};

/// Provisioner settings read from the environment.
#[derive(Debug, Clone)]
pub struct ProvisionerConfig {
    pub role_assignment: RoleAssignmentConfig,
    pub fixture_path: PathBuf,
}

impl ProvisionerConfig {
    pub fn load() -> AppResult<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> AppResult<Self> {
        let roles = required(&lookup, "ROLESCOPE_ROLES")?;
        let fixture_path = PathBuf::from(required(&lookup, "ROLESCOPE_FIXTURE_PATH")?);
        let max_concurrency =
            parse_usize(&lookup, "ROLESCOPE_MAX_CONCURRENCY", DEFAULT_MAX_CONCURRENCY)?;

        let role_assignment = RoleAssignmentConfig::new(
            roles
                .split(',')
                .map(str::trim)
                .filter(|role| !role.is_empty()),
        )
        .map_err(|error| AppError::Validation(format!("ROLESCOPE_ROLES: {error}")))?
        .with_max_concurrency(max_concurrency)
        .map_err(|error| AppError::Validation(format!("ROLESCOPE_MAX_CONCURRENCY: {error}")))?;

        Ok(Self {
            role_assignment,
            fixture_path,
        })
    }
}

fn required(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> AppResult<String> {
    lookup(name)
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| AppError::Validation(format!("{name} is required")))
}

fn parse_usize(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: usize,
) -> AppResult<usize> {
    match lookup(name) {
        Some(value) => value.trim().parse::<usize>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        None => Ok(default),
    }
}
