//! Task-scoped role grants.
//!
//! `setup` resolves the configured role names against the catalogue, grants
//! each user the roles it does not hold yet and records exactly those grants.
//! `cleanup` revokes the recorded grants and nothing else, whatever the
//! catalogue or the users' holdings look like at that point.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::OnceCell;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::mpsc::error::TryRecvError;
use tracing::{info, warn};

use rolescope_core::{AppError, AppResult, RoleId, RoleName};
use rolescope_domain::{ContextState, RoleCatalogSnapshot, UserRef};

use crate::role_assignment_config::RoleAssignmentConfig;
use crate::role_assignment_ports::{RoleAssignmentBackend, RoleCatalog};
use crate::task_context::TaskContext;

mod cleanup;
mod resolution;
mod scoped;
mod setup;


/// Grants configured roles to the task's users and reverts them afterwards.
pub struct RoleAssignmentContext {
    config: RoleAssignmentConfig,
    catalog: Arc<dyn RoleCatalog>,
    backend: Arc<dyn RoleAssignmentBackend>,
    task: TaskContext,
    catalog_snapshot: OnceCell<RoleCatalogSnapshot>,
    ledger: BTreeMap<UserRef, Vec<RoleId>>,
    committed_grants: Option<UnboundedReceiver<(UserRef, RoleId)>>,
    state: ContextState,
}

impl RoleAssignmentContext {
    /// Creates a context from its configuration, identity-service ports and
    /// the shared task state.
    #[must_use]
    pub fn new(
        config: RoleAssignmentConfig,
        catalog: Arc<dyn RoleCatalog>,
        backend: Arc<dyn RoleAssignmentBackend>,
        task: TaskContext,
    ) -> Self {
        Self {
            config,
            catalog,
            backend,
            task,
            catalog_snapshot: OnceCell::new(),
            ledger: BTreeMap::new(),
            committed_grants: None,
            state: ContextState::Unstarted,
        }
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ContextState {
        self.state
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &RoleAssignmentConfig {
        &self.config
    }

    /// Returns the shared task state.
    #[must_use]
    pub fn task_context(&self) -> &TaskContext {
        &self.task
    }

    /// Returns the shared task state for collaborators that populate it.
    pub fn task_context_mut(&mut self) -> &mut TaskContext {
        &mut self.task
    }

    /// Returns the name of a granted role while roles are published.
    #[must_use]
    pub fn role_name(&self, role_id: &RoleId) -> Option<&RoleName> {
        self.task
            .roles()
            .and_then(|mapping| mapping.name_of(role_id))
    }

    /// Returns the roles this context granted to the user and has not reverted.
    #[must_use]
    pub fn assigned_roles(&self, user: &UserRef) -> &[RoleId] {
        self.ledger.get(user).map(Vec::as_slice).unwrap_or_default()
    }

    /// Returns the number of grants awaiting cleanup.
    #[must_use]
    pub fn pending_grant_count(&self) -> usize {
        self.ledger.values().map(Vec::len).sum()
    }

    /// Moves grants reported by setup workers into the ledger.
    ///
    /// Workers report each grant as soon as the backend accepts it, so grants
    /// made by a setup that was cancelled mid-flight are still recorded.
    fn absorb_committed_grants(&mut self) {
        let Some(receiver) = self.committed_grants.as_mut() else {
            return;
        };

        let mut disconnected = false;
        loop {
            match receiver.try_recv() {
                Ok((user, role_id)) => {
                    self.task
                        .record_granted(&user, std::slice::from_ref(&role_id));
                    self.ledger.entry(user).or_default().push(role_id);
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    disconnected = true;
                    break;
                }
            }
        }

        if disconnected {
            self.committed_grants = None;
        }
    }

    fn ensure_setup_allowed(&self) -> AppResult<()> {
        if !self.state.accepts_setup() {
            return Err(AppError::Conflict(format!(
                "role assignment setup cannot start while {}",
                self.state.as_str()
            )));
        }

        if !self.ledger.is_empty() {
            return Err(AppError::Conflict(format!(
                "role assignment setup cannot start with {} unreverted grant(s)",
                self.pending_grant_count()
            )));
        }

        Ok(())
    }
}

impl Drop for RoleAssignmentContext {
    fn drop(&mut self) {
        self.absorb_committed_grants();
        if self.ledger.is_empty() {
            return;
        }

        let ledger = std::mem::take(&mut self.ledger);
        let users = ledger.len();
        let grants: usize = ledger.values().map(Vec::len).sum();

        let Ok(runtime) = Handle::try_current() else {
            warn!(
                users,
                grants,
                "role assignment context dropped outside a runtime; recorded grants were not revoked"
            );
            return;
        };

        warn!(
            users,
            grants,
            "role assignment context dropped before cleanup; revoking recorded grants in the background"
        );
        let backend = Arc::clone(&self.backend);
        let max_concurrency = self.config.max_concurrency();
        runtime.spawn(async move {
            let failures = cleanup::revoke_ledger(backend, ledger, max_concurrency).await;
            if failures.is_empty() {
                info!(revoked_grants = grants, "background role revoke completed");
            } else {
                warn!(
                    failed_revokes = failures.len(),
                    error = %AppError::CleanupIncomplete(failures),
                    "background role revoke left grants in place"
                );
            }
        });
    }
}
