//! Role catalogue snapshot and the resolved role mapping.

use std::collections::{BTreeMap, HashMap};

use rolescope_core::{AppError, AppResult, RoleId, RoleName};
use serde::{Deserialize, Serialize};

/// One role definition as listed by the catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleCatalogEntry {
    /// Stable catalogue identifier.
    pub role_id: RoleId,
    /// Unique role name.
    pub name: RoleName,
}

impl RoleCatalogEntry {
    /// Creates a catalogue entry.
    #[must_use]
    pub fn new(role_id: RoleId, name: RoleName) -> Self {
        Self { role_id, name }
    }
}

/// Point-in-time copy of the catalogue indexed by role name.
#[derive(Debug, Clone, Default)]
pub struct RoleCatalogSnapshot {
    by_name: HashMap<RoleName, RoleId>,
}

impl RoleCatalogSnapshot {
    /// Indexes listed entries by name. The first entry wins on duplicate names.
    #[must_use]
    pub fn from_entries(entries: impl IntoIterator<Item = RoleCatalogEntry>) -> Self {
        let mut by_name = HashMap::new();
        for entry in entries {
            by_name.entry(entry.name).or_insert(entry.role_id);
        }

        Self { by_name }
    }

    /// Resolves a role name by exact match.
    pub fn resolve(&self, name: &RoleName) -> AppResult<RoleId> {
        self.by_name
            .get(name)
            .cloned()
            .ok_or_else(|| AppError::role_not_found(name.as_str()))
    }

    /// Returns the number of distinct role names in the snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// Returns true when the catalogue listed no roles.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

/// Resolved target roles keyed by identifier, published under the `roles` key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleMapping(BTreeMap<RoleId, RoleName>);

impl RoleMapping {
    /// Creates an empty mapping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a resolved role.
    pub fn insert(&mut self, role_id: RoleId, name: RoleName) {
        self.0.insert(role_id, name);
    }

    /// Returns the name for a role identifier.
    #[must_use]
    pub fn name_of(&self, role_id: &RoleId) -> Option<&RoleName> {
        self.0.get(role_id)
    }

    /// Returns true when the identifier is part of the mapping.
    #[must_use]
    pub fn contains(&self, role_id: &RoleId) -> bool {
        self.0.contains_key(role_id)
    }

    /// Iterates over `(RoleId, RoleName)` pairs in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = (&RoleId, &RoleName)> {
        self.0.iter()
    }

    /// Returns the number of mapped roles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true when no role is mapped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(RoleId, RoleName)> for RoleMapping {
    fn from_iter<T: IntoIterator<Item = (RoleId, RoleName)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
