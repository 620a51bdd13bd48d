use std::collections::HashSet;

use async_trait::async_trait;

use rolescope_core::{AppResult, RoleId, TenantId, UserId};
use rolescope_domain::RoleCatalogEntry;

/// Port for the identity service's role directory.
#[async_trait]
pub trait RoleCatalog: Send + Sync {
    /// Lists every role definition known to the identity service.
    async fn list_roles(&self) -> AppResult<Vec<RoleCatalogEntry>>;
}

/// Port for granting, revoking and reading tenant-scoped role holdings.
///
/// Implementations report transport failures as `BackendUnavailable` and
/// authorization failures as `PermissionDenied`. A revoke of a role the user
/// does not hold should return `NotFound`; a grant of a role already held
/// should return `Conflict`.
#[async_trait]
pub trait RoleAssignmentBackend: Send + Sync {
    /// Returns the role identifiers currently held by the user in the tenant.
    async fn current_roles(
        &self,
        user_id: &UserId,
        tenant_id: &TenantId,
    ) -> AppResult<HashSet<RoleId>>;

    /// Grants a role to the user in the tenant.
    async fn grant(&self, user_id: &UserId, role_id: &RoleId, tenant_id: &TenantId)
    -> AppResult<()>;

    /// Revokes a role from the user in the tenant.
    async fn revoke(
        &self,
        user_id: &UserId,
        role_id: &RoleId,
        tenant_id: &TenantId,
    ) -> AppResult<()>;
}
