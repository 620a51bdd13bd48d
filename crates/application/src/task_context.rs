use std::collections::BTreeSet;

use rolescope_core::{RoleId, TenantId, UserId};
use rolescope_domain::{RoleMapping, UserRef, remove_granted_roles};
use serde::{Deserialize, Serialize};

/// Generated user entry shared through the task context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskUser {
    /// User identifier.
    pub id: UserId,
    /// Tenant the user belongs to.
    pub tenant_id: TenantId,
    /// Roles granted to this user for the task, by any collaborator.
    #[serde(default)]
    pub assigned_roles: Vec<RoleId>,
}

impl TaskUser {
    /// Creates a user entry with no recorded roles.
    #[must_use]
    pub fn new(id: UserId, tenant_id: TenantId) -> Self {
        Self {
            id,
            tenant_id,
            assigned_roles: Vec::new(),
        }
    }

    /// Returns the tenant-scoped reference for this user.
    #[must_use]
    pub fn user_ref(&self) -> UserRef {
        UserRef::new(self.id.clone(), self.tenant_id.clone())
    }
}

/// State shared between collaborators for the duration of one task.
///
/// `users` is populated by the user generator before roles are assigned.
/// `roles` is only present between role setup and cleanup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskContext {
    /// Generated users taking part in the task.
    #[serde(default)]
    pub users: Vec<TaskUser>,
    /// Role identifier to role name mapping of the granted roles.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roles: Option<RoleMapping>,
}

impl TaskContext {
    /// Creates a task context for the given users.
    #[must_use]
    pub fn new(users: Vec<TaskUser>) -> Self {
        Self { users, roles: None }
    }

    /// Returns the role mapping, if roles are currently granted.
    #[must_use]
    pub fn roles(&self) -> Option<&RoleMapping> {
        self.roles.as_ref()
    }

    /// Returns each distinct user reference once.
    #[must_use]
    pub fn user_refs(&self) -> BTreeSet<UserRef> {
        self.users.iter().map(TaskUser::user_ref).collect()
    }

    pub(crate) fn record_granted(&mut self, user: &UserRef, granted: &[RoleId]) {
        for entry in self.matching_users(user) {
            entry.assigned_roles.extend(granted.iter().cloned());
        }
    }

    pub(crate) fn forget_granted(&mut self, user: &UserRef, granted: &[RoleId]) {
        for entry in self.matching_users(user) {
            remove_granted_roles(&mut entry.assigned_roles, granted);
        }
    }

    fn matching_users<'a>(
        &'a mut self,
        user: &'a UserRef,
    ) -> impl Iterator<Item = &'a mut TaskUser> {
        self.users
            .iter_mut()
            .filter(move |entry| entry.id == user.user_id && entry.tenant_id == user.tenant_id)
    }
}
