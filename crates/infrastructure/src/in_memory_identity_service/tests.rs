use rolescope_application::{RoleAssignmentBackend, RoleCatalog};
use rolescope_core::{AppError, RoleName, TenantId, UserId};

use super::InMemoryIdentityService;

#[tokio::test]
async fn create_role_rejects_duplicate_names() {
    let service = InMemoryIdentityService::new();

    assert!(service.create_role(RoleName::new("member")).await.is_ok());
    let duplicate = service.create_role(RoleName::new("member")).await;

    assert!(matches!(duplicate, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn list_roles_returns_created_roles() {
    let service = InMemoryIdentityService::new();
    let created = service.create_role(RoleName::new("member")).await;

    let listed = service.list_roles().await;

    assert_eq!(listed.ok(), created.ok().map(|entry| vec![entry]));
    assert_eq!(service.list_calls(), 1);
}

#[tokio::test]
async fn grant_then_revoke_restores_holdings() {
    let service = InMemoryIdentityService::new();
    let Ok(entry) = service.create_role(RoleName::new("member")).await else {
        panic!("role should be created");
    };
    let user_id = UserId::new("u1");
    let tenant_id = TenantId::new("t1");

    assert!(service.grant(&user_id, &entry.role_id, &tenant_id).await.is_ok());
    let held = service.current_roles(&user_id, &tenant_id).await;
    assert!(held.is_ok_and(|roles| roles.contains(&entry.role_id)));

    assert!(service.revoke(&user_id, &entry.role_id, &tenant_id).await.is_ok());
    let held = service.current_roles(&user_id, &tenant_id).await;
    assert!(held.is_ok_and(|roles| roles.is_empty()));
}

#[tokio::test]
async fn grants_are_scoped_to_tenant() {
    let service = InMemoryIdentityService::new();
    let Ok(entry) = service.create_role(RoleName::new("member")).await else {
        panic!("role should be created");
    };
    let user_id = UserId::new("u1");

    assert!(
        service
            .grant(&user_id, &entry.role_id, &TenantId::new("t1"))
            .await
            .is_ok()
    );
    let other_tenant = service.current_roles(&user_id, &TenantId::new("t2")).await;

    assert!(other_tenant.is_ok_and(|roles| roles.is_empty()));
}

#[tokio::test]
async fn duplicate_grant_is_conflict_and_missing_revoke_is_not_found() {
    let service = InMemoryIdentityService::new();
    let Ok(entry) = service.create_role(RoleName::new("member")).await else {
        panic!("role should be created");
    };
    let user_id = UserId::new("u1");
    let tenant_id = TenantId::new("t1");

    assert!(service.grant(&user_id, &entry.role_id, &tenant_id).await.is_ok());
    let again = service.grant(&user_id, &entry.role_id, &tenant_id).await;
    assert!(matches!(again, Err(AppError::Conflict(_))));

    assert!(service.revoke(&user_id, &entry.role_id, &tenant_id).await.is_ok());
    let missing = service.revoke(&user_id, &entry.role_id, &tenant_id).await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));
    assert_eq!(service.grant_calls(), 2);
    assert_eq!(service.revoke_calls(), 2);
}

#[tokio::test]
async fn grant_of_unknown_role_is_not_found() {
    let service = InMemoryIdentityService::new();
    let Ok(entry) = service.create_role(RoleName::new("member")).await else {
        panic!("role should be created");
    };
    assert!(service.delete_role(&entry.role_id).await.is_ok());

    let result = service
        .grant(&UserId::new("u1"), &entry.role_id, &TenantId::new("t1"))
        .await;

    assert!(matches!(result, Err(AppError::NotFound(_))));
}
