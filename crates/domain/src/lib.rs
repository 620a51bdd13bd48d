//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod assignment;
mod lifecycle;
mod role;

pub use assignment::{UserRef, missing_roles, remove_granted_roles};
pub use lifecycle::ContextState;
pub use role::{RoleCatalogEntry, RoleCatalogSnapshot, RoleMapping};
