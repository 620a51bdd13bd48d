//! Role assignment lifecycle against the in-memory identity service.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use rolescope_application::{
    RoleAssignmentBackend, RoleAssignmentConfig, RoleAssignmentContext, TaskContext, TaskUser,
};
use rolescope_core::{AppError, RoleId, RoleName, TenantId, UserId};
use rolescope_infrastructure::InMemoryIdentityService;

async fn seeded_service(names: &[&str]) -> (Arc<InMemoryIdentityService>, HashMap<String, RoleId>) {
    let service = Arc::new(InMemoryIdentityService::new());
    let mut ids = HashMap::new();
    for name in names {
        let Ok(entry) = service.create_role(RoleName::new(*name)).await else {
            panic!("role '{name}' should be created");
        };
        ids.insert((*name).to_owned(), entry.role_id);
    }
    (service, ids)
}

async fn holdings(
    service: &InMemoryIdentityService,
    users: &[(&str, &str)],
) -> Vec<HashSet<RoleId>> {
    let mut all = Vec::new();
    for (user, tenant) in users {
        let held = service
            .current_roles(&UserId::new(*user), &TenantId::new(*tenant))
            .await;
        let Ok(held) = held else {
            panic!("holdings query should succeed");
        };
        all.push(held);
    }
    all
}

fn context_for(
    roles: &[&str],
    users: &[(&str, &str)],
    service: &Arc<InMemoryIdentityService>,
) -> RoleAssignmentContext {
    let Ok(config) = RoleAssignmentConfig::new(roles.iter().copied()) else {
        panic!("role configuration should be valid");
    };
    let task = TaskContext::new(
        users
            .iter()
            .map(|(user, tenant)| TaskUser::new(UserId::new(*user), TenantId::new(*tenant)))
            .collect(),
    );
    RoleAssignmentContext::new(config, service.clone(), service.clone(), task)
}

#[tokio::test]
async fn setup_then_cleanup_restores_every_users_holdings() {
    let (service, ids) = seeded_service(&["role-a", "role-b", "role-c"]).await;
    let users = [("u1", "t1"), ("u2", "t2"), ("u3", "t1")];
    let Some(role_a) = ids.get("role-a") else {
        panic!("role-a should be seeded");
    };
    assert!(
        service
            .grant(&UserId::new("u2"), role_a, &TenantId::new("t2"))
            .await
            .is_ok()
    );
    let before = holdings(&service, &users).await;

    let mut context = context_for(&["role-a", "role-b"], &users, &service);
    let result = context
        .run_scoped(async |task: &TaskContext| {
            let during = holdings(&service, &users).await;
            Ok((task.roles().map(|roles| roles.len()), during))
        })
        .await;

    let Ok((published, during)) = result else {
        panic!("scoped run should succeed");
    };
    assert_eq!(published, Some(2));
    assert!(during.iter().all(|held| held.len() == 2));
    assert_eq!(service.grant_calls(), 1 + 5);
    assert_eq!(service.revoke_calls(), 5);
    assert_eq!(holdings(&service, &users).await, before);
    assert_eq!(service.list_calls(), 1);
}

#[tokio::test]
async fn cleanup_reverts_grants_for_roles_deleted_from_catalogue() {
    let (service, ids) = seeded_service(&["role-a"]).await;
    let users = [("u1", "t1")];
    let mut context = context_for(&["role-a"], &users, &service);

    assert!(context.setup().await.is_ok());
    let Some(role_a) = ids.get("role-a") else {
        panic!("role-a should be seeded");
    };
    assert!(service.delete_role(role_a).await.is_ok());

    assert!(context.cleanup().await.is_ok());
    assert!(holdings(&service, &users).await[0].is_empty());
}

#[tokio::test]
async fn unknown_role_fails_before_any_grant() {
    let (service, _) = seeded_service(&["role-a"]).await;
    let users = [("u1", "t1"), ("u2", "t2")];
    let mut context = context_for(&["role-a", "role-z"], &users, &service);

    let result = context
        .run_scoped(async |_task: &TaskContext| Ok(()))
        .await;

    match result {
        Err(AppError::NotFound(message)) => {
            assert_eq!(message, "There is no role with name `role-z`");
        }
        other => panic!("expected not found, got {other:?}"),
    }
    assert_eq!(service.grant_calls(), 0);
    assert_eq!(service.revoke_calls(), 0);
}

#[tokio::test]
async fn setup_succeeds_once_missing_role_is_created() {
    let (service, _) = seeded_service(&["role-a"]).await;
    let users = [("alice", "acme")];
    let mut context = context_for(&["role-a", "role-b"], &users, &service);

    let first = context.setup().await;
    assert!(matches!(first, Err(AppError::NotFound(_))));
    assert_eq!(service.grant_calls(), 0);

    let Ok(created) = service.create_role(RoleName::new("role-b")).await else {
        panic!("role 'role-b' should be created");
    };

    assert!(context.setup().await.is_ok());
    assert_eq!(service.list_calls(), 2);
    assert!(holdings(&service, &users).await[0].contains(&created.role_id));

    assert!(context.cleanup().await.is_ok());
    assert!(holdings(&service, &users).await[0].is_empty());
}
