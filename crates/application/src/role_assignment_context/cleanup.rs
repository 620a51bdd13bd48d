use super::*;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::debug;

use rolescope_core::RevokeFailure;

struct UserRevokeOutcome {
    user: UserRef,
    failures: Vec<RevokeFailure>,
}

impl RoleAssignmentContext {
    /// Revokes every grant recorded by `setup` and clears the published roles.
    ///
    /// Revokes are attempted for all recorded grants even when some fail;
    /// failures are returned together afterwards. A role the user no longer
    /// holds counts as revoked. Calling this again without a new `setup` does
    /// nothing.
    pub async fn cleanup(&mut self) -> AppResult<()> {
        self.state = ContextState::CleaningUp;
        self.absorb_committed_grants();

        let ledger = std::mem::take(&mut self.ledger);
        let recorded_grants: usize = ledger.values().map(Vec::len).sum();
        for (user, recorded) in &ledger {
            self.task.forget_granted(user, recorded);
        }

        let failures = revoke_ledger(
            Arc::clone(&self.backend),
            ledger,
            self.config.max_concurrency(),
        )
        .await;

        self.task.roles = None;
        self.catalog_snapshot = OnceCell::new();
        self.state = ContextState::Done;

        if failures.is_empty() {
            if recorded_grants > 0 {
                info!(revoked_grants = recorded_grants, "role assignment cleanup completed");
            }
            return Ok(());
        }

        warn!(
            recorded_grants,
            failed_revokes = failures.len(),
            "role assignment cleanup left grants in place"
        );
        Err(AppError::CleanupIncomplete(failures))
    }
}

/// Revokes every recorded grant, one worker per user, and returns the
/// revokes that failed.
pub(super) async fn revoke_ledger(
    backend: Arc<dyn RoleAssignmentBackend>,
    ledger: BTreeMap<UserRef, Vec<RoleId>>,
    max_concurrency: usize,
) -> Vec<RevokeFailure> {
    let mut pending = ledger.clone();
    let semaphore = Arc::new(Semaphore::new(max_concurrency));
    let mut workers = JoinSet::new();

    for (user, recorded) in ledger {
        let backend = Arc::clone(&backend);
        let semaphore = Arc::clone(&semaphore);

        workers.spawn(async move {
            // The semaphore is never closed.
            let _permit = semaphore.acquire_owned().await.ok();
            revoke_user_roles(backend.as_ref(), user, recorded).await
        });
    }

    let mut failures = Vec::new();
    let mut last_join_error = None;
    while let Some(joined) = workers.join_next().await {
        match joined {
            Ok(outcome) => {
                pending.remove(&outcome.user);
                failures.extend(outcome.failures);
            }
            Err(join_error) => last_join_error = Some(join_error.to_string()),
        }
    }

    // Users whose worker died: nothing is known about their revokes.
    for (user, recorded) in pending {
        let reason = format!(
            "revoke worker failed: {}",
            last_join_error.as_deref().unwrap_or("unknown error")
        );
        failures.extend(recorded.into_iter().map(|role_id| RevokeFailure {
            user_id: user.user_id.clone(),
            tenant_id: user.tenant_id.clone(),
            role_id,
            reason: reason.clone(),
        }));
    }

    failures
}

async fn revoke_user_roles(
    backend: &dyn RoleAssignmentBackend,
    user: UserRef,
    recorded: Vec<RoleId>,
) -> UserRevokeOutcome {
    let mut failures = Vec::new();

    for role_id in &recorded {
        match backend
            .revoke(&user.user_id, role_id, &user.tenant_id)
            .await
        {
            Ok(()) => {
                debug!(
                    user_id = %user.user_id,
                    tenant_id = %user.tenant_id,
                    role_id = %role_id,
                    "role revoked"
                );
            }
            Err(error) if error.is_not_found() => {
                debug!(
                    user_id = %user.user_id,
                    tenant_id = %user.tenant_id,
                    role_id = %role_id,
                    "role already absent"
                );
            }
            Err(error) => {
                warn!(
                    user_id = %user.user_id,
                    tenant_id = %user.tenant_id,
                    role_id = %role_id,
                    error = %error,
                    "failed to revoke role"
                );
                failures.push(RevokeFailure {
                    user_id: user.user_id.clone(),
                    tenant_id: user.tenant_id.clone(),
                    role_id: role_id.clone(),
                    reason: error.to_string(),
                });
            }
        }
    }

    UserRevokeOutcome { user, failures }
}
