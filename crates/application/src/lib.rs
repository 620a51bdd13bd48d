//! Application services and ports.

#![forbid(unsafe_code)]

mod role_assignment_config;
mod role_assignment_context;
mod role_assignment_ports;
mod task_context;

pub use role_assignment_config::{DEFAULT_MAX_CONCURRENCY, RoleAssignmentConfig};
pub use role_assignment_context::RoleAssignmentContext;
pub use role_assignment_ports::{RoleAssignmentBackend, RoleCatalog};
pub use task_context::{TaskContext, TaskUser};
