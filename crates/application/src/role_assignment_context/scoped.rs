use super::*;

use std::panic::AssertUnwindSafe;

use futures::FutureExt;

impl RoleAssignmentContext {
    /// Runs `workload` with roles granted, then always runs `cleanup`.
    ///
    /// Cleanup happens whether setup, the workload or neither failed, and when
    /// the workload panics; the panic is resumed once cleanup has finished.
    /// The first error is returned; a cleanup error is only returned when
    /// everything before it succeeded, otherwise it is logged.
    ///
    /// If the returned future is dropped before it completes, the recorded
    /// grants are revoked in the background when the context is dropped.
    pub async fn run_scoped<T, F>(&mut self, workload: F) -> AppResult<T>
    where
        F: AsyncFnOnce(&TaskContext) -> AppResult<T>,
    {
        let outcome = match self.setup().await {
            Ok(()) => AssertUnwindSafe(workload(&self.task)).catch_unwind().await,
            Err(error) => Ok(Err(error)),
        };

        let cleanup = self.cleanup().await;

        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(panic) => {
                if let Err(cleanup_error) = &cleanup {
                    warn!(
                        cleanup_error = %cleanup_error,
                        "role assignment cleanup failed after the workload panicked"
                    );
                }
                std::panic::resume_unwind(panic);
            }
        };

        match (outcome, cleanup) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(cleanup_error)) => Err(cleanup_error),
            (Err(error), Ok(())) => Err(error),
            (Err(error), Err(cleanup_error)) => {
                warn!(
                    error = %error,
                    cleanup_error = %cleanup_error,
                    "role assignment cleanup failed after an earlier error"
                );
                Err(error)
            }
        }
    }
}
