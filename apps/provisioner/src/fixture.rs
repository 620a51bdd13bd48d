//! Identity service seed data for a provisioning run.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use rolescope_application::{RoleAssignmentBackend, TaskContext, TaskUser};
use rolescope_core::{AppError, AppResult, RoleId, RoleName, TenantId, UserId};
use rolescope_infrastructure::InMemoryIdentityService;

/// Roles and users to create before role assignment runs.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityFixture {
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub users: Vec<FixtureUser>,
}

/// A generated user and the roles it holds before the task.
#[derive(Debug, Clone, Deserialize)]
pub struct FixtureUser {
    pub id: String,
    pub tenant_id: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl IdentityFixture {
    pub async fn load(path: &Path) -> AppResult<Self> {
        let raw = tokio::fs::read_to_string(path).await.map_err(|error| {
            AppError::Validation(format!(
                "failed to read fixture '{}': {error}",
                path.display()
            ))
        })?;

        Self::parse(raw.as_str())
    }

    fn parse(raw: &str) -> AppResult<Self> {
        serde_json::from_str(raw)
            .map_err(|error| AppError::Validation(format!("invalid fixture: {error}")))
    }

    /// Creates the fixture's roles and pre-existing holdings, returning the
    /// task context for the fixture's users.
    pub async fn seed(&self, service: &InMemoryIdentityService) -> AppResult<TaskContext> {
        let mut role_ids: HashMap<&str, RoleId> = HashMap::new();
        for name in &self.roles {
            let entry = service.create_role(RoleName::new(name.as_str())).await?;
            role_ids.insert(name.as_str(), entry.role_id);
        }

        let mut users = Vec::with_capacity(self.users.len());
        for user in &self.users {
            let user_id = UserId::new(user.id.as_str());
            let tenant_id = TenantId::new(user.tenant_id.as_str());
            for role in &user.roles {
                let role_id = role_ids.get(role.as_str()).ok_or_else(|| {
                    AppError::Validation(format!(
                        "fixture user '{}' holds undeclared role '{role}'",
                        user.id
                    ))
                })?;
                service.grant(&user_id, role_id, &tenant_id).await?;
            }
            users.push(TaskUser::new(user_id, tenant_id));
        }

        Ok(TaskContext::new(users))
    }
}

#[cfg(test)]
mod tests {
    use rolescope_application::RoleAssignmentBackend;
    use rolescope_core::{AppError, TenantId, UserId};
    use rolescope_infrastructure::InMemoryIdentityService;

    use super::IdentityFixture;

    const FIXTURE: &str = r#"{
        "roles": ["role-a", "role-b"],
        "users": [
            {"id": "u1", "tenant_id": "t1"},
            {"id": "u2", "tenant_id": "t2", "roles": ["role-a"]}
        ]
    }"#;

    #[tokio::test]
    async fn seed_creates_roles_and_prior_holdings() {
        let Ok(fixture) = IdentityFixture::parse(FIXTURE) else {
            panic!("fixture should parse");
        };
        let service = InMemoryIdentityService::new();

        let task = fixture.seed(&service).await;

        assert!(task.is_ok_and(|task| task.users.len() == 2));
        let held = service
            .current_roles(&UserId::new("u2"), &TenantId::new("t2"))
            .await;
        assert!(held.is_ok_and(|roles| roles.len() == 1));
    }

    #[tokio::test]
    async fn undeclared_prior_role_is_rejected() {
        let Ok(fixture) = IdentityFixture::parse(
            r#"{"roles": [], "users": [{"id": "u1", "tenant_id": "t1", "roles": ["admin"]}]}"#,
        ) else {
            panic!("fixture should parse");
        };

        let result = fixture.seed(&InMemoryIdentityService::new()).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
