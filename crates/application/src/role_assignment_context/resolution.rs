use super::*;

use rolescope_domain::RoleMapping;
use tracing::debug;

impl RoleAssignmentContext {
    /// Resolves a role name to its catalogue identifier.
    ///
    /// The first call lists the catalogue; later calls reuse that snapshot
    /// until `cleanup` discards it.
    pub async fn resolve(&self, role_name: &RoleName) -> AppResult<RoleId> {
        let snapshot = self
            .catalog_snapshot
            .get_or_try_init(|| async {
                let entries = self.catalog.list_roles().await?;
                debug!(role_count = entries.len(), "role catalogue loaded");
                Ok::<_, AppError>(RoleCatalogSnapshot::from_entries(entries))
            })
            .await?;

        snapshot.resolve(role_name)
    }

    /// Resolves every configured name, stopping at the first unknown one.
    pub(super) async fn resolve_configured_roles(
        &self,
    ) -> AppResult<(Vec<RoleId>, RoleMapping)> {
        let mut target = Vec::with_capacity(self.config.roles().len());
        let mut mapping = RoleMapping::new();

        for role_name in self.config.roles() {
            let role_id = self.resolve(role_name).await?;
            if !mapping.contains(&role_id) {
                target.push(role_id.clone());
            }
            mapping.insert(role_id, role_name.clone());
        }

        Ok((target, mapping))
    }
}
