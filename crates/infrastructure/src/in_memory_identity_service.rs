use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use rolescope_application::{RoleAssignmentBackend, RoleCatalog};
use rolescope_core::{AppError, AppResult, RoleId, RoleName, TenantId, UserId};
use rolescope_domain::RoleCatalogEntry;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

#[cfg(test)]
mod tests;

/// In-process identity service holding a role catalogue and tenant-scoped
/// role assignments.
#[derive(Debug, Default)]
pub struct InMemoryIdentityService {
    roles: RwLock<BTreeMap<RoleId, RoleName>>,
    assignments: RwLock<HashMap<(UserId, TenantId), HashSet<RoleId>>>,
    list_calls: AtomicUsize,
    grant_calls: AtomicUsize,
    revoke_calls: AtomicUsize,
}

impl InMemoryIdentityService {
    /// Creates an empty identity service.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a role definition with a generated identifier.
    pub async fn create_role(&self, name: RoleName) -> AppResult<RoleCatalogEntry> {
        let mut roles = self.roles.write().await;
        if roles.values().any(|existing| existing == &name) {
            return Err(AppError::Conflict(format!(
                "role '{name}' already exists"
            )));
        }

        let role_id = RoleId::new(Uuid::new_v4().to_string());
        roles.insert(role_id.clone(), name.clone());
        debug!(role_id = %role_id, role_name = %name, "role created");

        Ok(RoleCatalogEntry::new(role_id, name))
    }

    /// Removes a role definition. Existing assignments are left untouched.
    pub async fn delete_role(&self, role_id: &RoleId) -> AppResult<()> {
        self.roles
            .write()
            .await
            .remove(role_id)
            .map(|_| ())
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' does not exist")))
    }

    /// Returns how many times the catalogue was listed.
    #[must_use]
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::Relaxed)
    }

    /// Returns how many grant calls were received.
    #[must_use]
    pub fn grant_calls(&self) -> usize {
        self.grant_calls.load(Ordering::Relaxed)
    }

    /// Returns how many revoke calls were received.
    #[must_use]
    pub fn revoke_calls(&self) -> usize {
        self.revoke_calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl RoleCatalog for InMemoryIdentityService {
    async fn list_roles(&self) -> AppResult<Vec<RoleCatalogEntry>> {
        self.list_calls.fetch_add(1, Ordering::Relaxed);
        let roles = self.roles.read().await;

        Ok(roles
            .iter()
            .map(|(role_id, name)| RoleCatalogEntry::new(role_id.clone(), name.clone()))
            .collect())
    }
}

#[async_trait]
impl RoleAssignmentBackend for InMemoryIdentityService {
    async fn current_roles(
        &self,
        user_id: &UserId,
        tenant_id: &TenantId,
    ) -> AppResult<HashSet<RoleId>> {
        let assignments = self.assignments.read().await;

        Ok(assignments
            .get(&(user_id.clone(), tenant_id.clone()))
            .cloned()
            .unwrap_or_default())
    }

    async fn grant(
        &self,
        user_id: &UserId,
        role_id: &RoleId,
        tenant_id: &TenantId,
    ) -> AppResult<()> {
        self.grant_calls.fetch_add(1, Ordering::Relaxed);

        if !self.roles.read().await.contains_key(role_id) {
            return Err(AppError::NotFound(format!(
                "role '{role_id}' does not exist"
            )));
        }

        let mut assignments = self.assignments.write().await;
        let held = assignments
            .entry((user_id.clone(), tenant_id.clone()))
            .or_default();
        if !held.insert(role_id.clone()) {
            return Err(AppError::Conflict(format!(
                "role '{role_id}' is already assigned to user '{user_id}' in tenant '{tenant_id}'"
            )));
        }

        Ok(())
    }

    async fn revoke(
        &self,
        user_id: &UserId,
        role_id: &RoleId,
        tenant_id: &TenantId,
    ) -> AppResult<()> {
        self.revoke_calls.fetch_add(1, Ordering::Relaxed);

        let mut assignments = self.assignments.write().await;
        let key = (user_id.clone(), tenant_id.clone());
        let removed = assignments
            .get_mut(&key)
            .is_some_and(|held| held.remove(role_id));
        if !removed {
            return Err(AppError::NotFound(format!(
                "role '{role_id}' is not assigned to user '{user_id}' in tenant '{tenant_id}'"
            )));
        }

        if assignments.get(&key).is_some_and(HashSet::is_empty) {
            assignments.remove(&key);
        }

        Ok(())
    }
}
