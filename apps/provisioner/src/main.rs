//! rolescope provisioning runner.
//!
//! Seeds an in-process identity service from a fixture, grants the configured
//! roles to the fixture's users for one scoped run and reverts them.

#![forbid(unsafe_code)]

mod config;
mod fixture;

use std::sync::Arc;

use rolescope_application::{RoleAssignmentContext, TaskContext};
use rolescope_core::{AppError, AppResult};
use rolescope_infrastructure::InMemoryIdentityService;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::config::ProvisionerConfig;
use crate::fixture::IdentityFixture;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    if let Err(error) = run().await {
        error!(error = %error, "provisioning run failed");
        return Err(error);
    }

    Ok(())
}

async fn run() -> AppResult<()> {
    let config = ProvisionerConfig::load()?;
    let fixture = IdentityFixture::load(config.fixture_path.as_path()).await?;

    let identity_service = Arc::new(InMemoryIdentityService::new());
    let task = fixture.seed(identity_service.as_ref()).await?;

    let mut context = RoleAssignmentContext::new(
        config.role_assignment,
        identity_service.clone(),
        identity_service.clone(),
        task,
    );

    info!(
        fixture = %config.fixture_path.display(),
        roles = context.config().roles().len(),
        users = context.task_context().users.len(),
        max_concurrency = context.config().max_concurrency(),
        "rolescope-provisioner started"
    );

    let granted = context
        .run_scoped(async |task: &TaskContext| {
            for (role_id, role_name) in task.roles.iter().flat_map(|roles| roles.iter()) {
                info!(role_id = %role_id, role_name = %role_name, "role in scope");
            }
            for user in &task.users {
                info!(
                    user_id = %user.id,
                    tenant_id = %user.tenant_id,
                    assigned_roles = user.assigned_roles.len(),
                    "user provisioned"
                );
            }
            Ok(task
                .users
                .iter()
                .map(|user| user.assigned_roles.len())
                .sum::<usize>())
        })
        .await?;

    info!(
        granted,
        grant_calls = identity_service.grant_calls(),
        revoke_calls = identity_service.revoke_calls(),
        "rolescope-provisioner finished"
    );

    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}
