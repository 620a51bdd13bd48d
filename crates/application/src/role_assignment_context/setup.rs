use super::*;

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Semaphore;
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::task::JoinSet;
use tracing::debug;

use rolescope_domain::missing_roles;

/// How one user's worker finished. Its grants are reported separately, as
/// they happen.
struct UserGrantOutcome {
    skipped: bool,
    error: Option<AppError>,
}

impl RoleAssignmentContext {
    /// Grants the configured roles to every task user that lacks them.
    ///
    /// Fails before any grant when a role name cannot be resolved. A failed
    /// grant or holdings query stops the remaining work and is returned, but
    /// every grant already committed stays recorded so `cleanup` reverts it.
    /// Every setup after the first lists the catalogue again.
    pub async fn setup(&mut self) -> AppResult<()> {
        self.absorb_committed_grants();
        self.ensure_setup_allowed()?;
        if self.state == ContextState::Done {
            self.catalog_snapshot = OnceCell::new();
        }
        self.state = ContextState::SettingUp;

        let (target, mapping) = match self.resolve_configured_roles().await {
            Ok(resolved) => resolved,
            Err(error) => {
                self.abort_setup();
                return Err(error);
            }
        };

        if let Err(error) = self.grant_missing_roles(Arc::new(target)).await {
            self.abort_setup();
            return Err(error);
        }

        info!(
            users = self.ledger.len(),
            grants = self.pending_grant_count(),
            roles = mapping.len(),
            "role assignment setup completed"
        );
        self.task.roles = Some(mapping);
        self.state = ContextState::Active;

        Ok(())
    }

    fn abort_setup(&mut self) {
        self.catalog_snapshot = OnceCell::new();
        self.state = ContextState::Done;
    }

    async fn grant_missing_roles(&mut self, target: Arc<Vec<RoleId>>) -> AppResult<()> {
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrency()));
        let stop = Arc::new(AtomicBool::new(false));
        let (committed, receiver) = mpsc::unbounded_channel();
        self.committed_grants = Some(receiver);
        let mut workers = JoinSet::new();

        for user in self.task.user_refs() {
            let backend = Arc::clone(&self.backend);
            let semaphore = Arc::clone(&semaphore);
            let stop = Arc::clone(&stop);
            let target = Arc::clone(&target);
            let committed = committed.clone();

            workers.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return UserGrantOutcome::skipped();
                };
                if stop.load(Ordering::Acquire) {
                    return UserGrantOutcome::skipped();
                }

                grant_user_roles(backend.as_ref(), user, &target, &stop, &committed).await
            });
        }
        drop(committed);

        let mut first_error = None;
        let mut skipped_users = 0_usize;
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(outcome) => {
                    if outcome.skipped {
                        skipped_users = skipped_users.saturating_add(1);
                    }
                    if let Some(error) = outcome.error {
                        first_error.get_or_insert(error);
                    }
                }
                Err(join_error) => {
                    stop.store(true, Ordering::Release);
                    first_error.get_or_insert(AppError::Internal(format!(
                        "role grant worker failed: {join_error}"
                    )));
                }
            }
        }
        self.absorb_committed_grants();

        match first_error {
            Some(error) => {
                warn!(
                    error = %error,
                    recorded_grants = self.pending_grant_count(),
                    skipped_users,
                    "role assignment setup aborted"
                );
                Err(error)
            }
            None => Ok(()),
        }
    }
}

impl UserGrantOutcome {
    fn skipped() -> Self {
        Self {
            skipped: true,
            error: None,
        }
    }

    fn finished(error: Option<AppError>) -> Self {
        Self {
            skipped: false,
            error,
        }
    }
}

async fn grant_user_roles(
    backend: &dyn RoleAssignmentBackend,
    user: UserRef,
    target: &[RoleId],
    stop: &AtomicBool,
    committed: &UnboundedSender<(UserRef, RoleId)>,
) -> UserGrantOutcome {
    let current: HashSet<RoleId> = match backend
        .current_roles(&user.user_id, &user.tenant_id)
        .await
    {
        Ok(current) => current,
        Err(error) => {
            stop.store(true, Ordering::Release);
            return UserGrantOutcome::finished(Some(error));
        }
    };

    for role_id in missing_roles(target, &current) {
        if stop.load(Ordering::Acquire) {
            break;
        }

        match backend
            .grant(&user.user_id, &role_id, &user.tenant_id)
            .await
        {
            Ok(()) => {
                debug!(
                    user_id = %user.user_id,
                    tenant_id = %user.tenant_id,
                    role_id = %role_id,
                    "role granted"
                );
                // Fails only once the context itself has been dropped.
                let _ = committed.send((user.clone(), role_id));
            }
            // Granted by someone else since the holdings query; not ours to revoke.
            Err(AppError::Conflict(_)) => {
                debug!(
                    user_id = %user.user_id,
                    tenant_id = %user.tenant_id,
                    role_id = %role_id,
                    "role already held"
                );
            }
            Err(error) => {
                stop.store(true, Ordering::Release);
                return UserGrantOutcome::finished(Some(error));
            }
        }
    }

    UserGrantOutcome::finished(None)
}
