//! Per-user role diffing.
//!
//! Both functions are pure so the grant and revoke paths can be checked
//! without an identity service.

use std::collections::HashSet;
use std::fmt::{Display, Formatter};

use rolescope_core::{RoleId, TenantId, UserId};
use serde::{Deserialize, Serialize};

/// A principal scoped to a tenant.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserRef {
    /// User identifier.
    pub user_id: UserId,
    /// Tenant the user's roles are scoped to.
    pub tenant_id: TenantId,
}

impl UserRef {
    /// Creates a user reference.
    #[must_use]
    pub fn new(user_id: UserId, tenant_id: TenantId) -> Self {
        Self { user_id, tenant_id }
    }
}

impl Display for UserRef {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}@{}", self.user_id, self.tenant_id)
    }
}

/// Returns the target roles the user does not hold yet.
///
/// Target order is preserved and duplicates in `target` are emitted once.
#[must_use]
pub fn missing_roles(target: &[RoleId], current: &HashSet<RoleId>) -> Vec<RoleId> {
    let mut seen = HashSet::with_capacity(target.len());
    target
        .iter()
        .filter(|role_id| !current.contains(*role_id) && seen.insert(*role_id))
        .cloned()
        .collect()
}

/// Removes one occurrence of each granted role from a published role list.
///
/// Entries contributed by other collaborators are left in place.
pub fn remove_granted_roles(assigned: &mut Vec<RoleId>, granted: &[RoleId]) {
    for role_id in granted {
        if let Some(position) = assigned.iter().position(|existing| existing == role_id) {
            assigned.remove(position);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use proptest::prelude::*;
    use rolescope_core::RoleId;

    use super::{missing_roles, remove_granted_roles};

    fn ids(values: &[&str]) -> Vec<RoleId> {
        values.iter().map(|value| RoleId::new(*value)).collect()
    }

    #[test]
    fn missing_roles_skips_held_roles() {
        let target = ids(&["r1", "r2", "r3"]);
        let current: HashSet<RoleId> = ids(&["r2"]).into_iter().collect();

        assert_eq!(missing_roles(&target, &current), ids(&["r1", "r3"]));
    }

    #[test]
    fn missing_roles_is_empty_when_everything_is_held() {
        let target = ids(&["r1", "r2"]);
        let current: HashSet<RoleId> = ids(&["r1", "r2", "r9"]).into_iter().collect();

        assert!(missing_roles(&target, &current).is_empty());
    }

    #[test]
    fn remove_granted_roles_keeps_foreign_entries() {
        let mut assigned = ids(&["r0", "r1", "r2"]);
        remove_granted_roles(&mut assigned, &ids(&["r1", "r2", "r5"]));

        assert_eq!(assigned, ids(&["r0"]));
    }

    fn role_ids() -> impl Strategy<Value = Vec<RoleId>> {
        proptest::collection::vec("r[0-9]{1,2}", 0..12)
            .prop_map(|values| values.into_iter().map(RoleId::new).collect())
    }

    proptest! {
        #[test]
        fn missing_roles_is_target_minus_current(target in role_ids(), held in role_ids()) {
            let current: HashSet<RoleId> = held.into_iter().collect();
            let missing = missing_roles(&target, &current);

            let unique: HashSet<&RoleId> = missing.iter().collect();
            prop_assert_eq!(unique.len(), missing.len());
            for role_id in &missing {
                prop_assert!(target.contains(role_id));
                prop_assert!(!current.contains(role_id));
            }
            for role_id in &target {
                prop_assert!(current.contains(role_id) || missing.contains(role_id));
            }
        }

        #[test]
        fn removing_granted_roles_restores_prior_list(prior in role_ids(), target in role_ids()) {
            let current: HashSet<RoleId> = prior.iter().cloned().collect();
            let granted = missing_roles(&target, &current);

            let mut published = prior.clone();
            published.extend(granted.iter().cloned());
            remove_granted_roles(&mut published, &granted);

            prop_assert_eq!(published, prior);
        }
    }
}
