use std::collections::BTreeSet;

use qryvanta_core::{AppError, TenantId};
use qryvanta_domain::{AuditAction, GroupScope, PrincipalPermissionAssignment};

use crate::test_support::{Fixture, actor};
use crate::{
    CreatePermissionGroupInput, GroupScopeSelector, PermissionGroupRepository,
    PrincipalAssignmentRepository, UpdatePermissionGroupInput,
};

use super::PermissionGroupService;

fn service(fixture: &Fixture) -> PermissionGroupService {
    PermissionGroupService::new(
        fixture.authorization.clone(),
        fixture.groups.clone(),
        fixture.assignments.clone(),
        fixture.validation.clone(),
        fixture.resolution.clone(),
        fixture.audit.clone(),
    )
}

fn input(name: &str, permission_ids: &[&str], is_default: bool) -> CreatePermissionGroupInput {
    CreatePermissionGroupInput {
        scope: GroupScopeSelector::Tenant,
        name: name.to_owned(),
        description: None,
        permission_ids: permission_ids.iter().map(|id| (*id).to_owned()).collect(),
        is_default,
    }
}

fn ids(values: &[&str]) -> BTreeSet<String> {
    values.iter().map(|value| (*value).to_owned()).collect()
}

#[tokio::test]
async fn created_group_reads_back_with_its_permissions() {
    let fixture = Fixture::new().await;
    let tenant_id = TenantId::new();
    let admin = fixture.admin(tenant_id, "admin").await;
    let service = service(&fixture);

    let created = service
        .create_group(&admin, input("Editor", &["project.view", "project.delete"], false))
        .await;
    assert!(created.is_ok());
    let Ok(created) = created else {
        return;
    };
    assert_eq!(created.scope(), GroupScope::Tenant(tenant_id));

    let fetched = service.get_group(&admin, created.group_id()).await;
    assert_eq!(
        fetched.map(|group| group.permission_ids().clone()).ok(),
        Some(ids(&["project.delete", "project.view"]))
    );

    let events = fixture.audit.events().await;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].action, AuditAction::PermissionGroupCreated);
}

#[tokio::test]
async fn duplicate_names_are_rejected_case_insensitively() {
    let fixture = Fixture::new().await;
    let admin = fixture.admin(TenantId::new(), "admin").await;
    let service = service(&fixture);

    assert!(
        service
            .create_group(&admin, input("Editor", &["project.view"], false))
            .await
            .is_ok()
    );
    let duplicate = service
        .create_group(&admin, input("  editor ", &["project.view"], false))
        .await;
    assert!(matches!(duplicate, Err(AppError::DuplicateName(_))));
}

#[tokio::test]
async fn same_name_is_allowed_in_another_tenant() {
    let fixture = Fixture::new().await;
    let first = fixture.admin(TenantId::new(), "first").await;
    let second = fixture.admin(TenantId::new(), "second").await;
    let service = service(&fixture);

    assert!(
        service
            .create_group(&first, input("Editor", &["project.view"], false))
            .await
            .is_ok()
    );
    assert!(
        service
            .create_group(&second, input("Editor", &["project.view"], false))
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn unknown_permission_ids_fail_the_whole_write() {
    let fixture = Fixture::new().await;
    let tenant_id = TenantId::new();
    let admin = fixture.admin(tenant_id, "admin").await;
    let service = service(&fixture);

    let result = service
        .create_group(
            &admin,
            input("Editor", &["project.view", "project.archive"], false),
        )
        .await;
    assert!(matches!(
        result,
        Err(AppError::InvalidPermissionIds(invalid)) if invalid == vec!["project.archive".to_owned()]
    ));

    let listed = service.list_groups(&admin, GroupScopeSelector::Tenant).await;
    assert_eq!(listed.map(|groups| groups.len()).ok(), Some(0));
}

#[tokio::test]
async fn failed_update_leaves_group_unchanged() {
    let fixture = Fixture::new().await;
    let admin = fixture.admin(TenantId::new(), "admin").await;
    let service = service(&fixture);
    let Ok(group) = service
        .create_group(&admin, input("Editor", &["project.view"], false))
        .await
    else {
        panic!("group should be created");
    };

    let result = service
        .update_group(
            &admin,
            group.group_id(),
            UpdatePermissionGroupInput {
                name: Some("Renamed".to_owned()),
                permission_ids: Some(vec!["client.merge".to_owned()]),
                ..UpdatePermissionGroupInput::default()
            },
        )
        .await;
    assert!(matches!(result, Err(AppError::InvalidPermissionIds(_))));

    let stored = service.get_group(&admin, group.group_id()).await;
    assert_eq!(stored.ok(), Some(group));
}

#[tokio::test]
async fn new_default_clears_previous_default() {
    let fixture = Fixture::new().await;
    let tenant_id = TenantId::new();
    let admin = fixture.admin(tenant_id, "admin").await;
    let service = service(&fixture);

    let Ok(first) = service
        .create_group(&admin, input("Members", &["project.view"], true))
        .await
    else {
        panic!("first default should be created");
    };
    let Ok(second) = service
        .create_group(&admin, input("Staff", &["project.view"], false))
        .await
    else {
        panic!("second group should be created");
    };

    let promoted = service.set_default_group(&admin, second.group_id()).await;
    assert_eq!(promoted.map(|group| group.is_default()).ok(), Some(true));

    let first = service.get_group(&admin, first.group_id()).await;
    assert_eq!(first.map(|group| group.is_default()).ok(), Some(false));
    assert_eq!(fixture.groups.defaults_in(GroupScope::Tenant(tenant_id)).await, 1);

    let actions: Vec<AuditAction> = fixture
        .audit
        .events()
        .await
        .into_iter()
        .map(|event| event.action)
        .collect();
    assert_eq!(
        actions
            .iter()
            .filter(|action| **action == AuditAction::PermissionGroupDefaultChanged)
            .count(),
        2
    );
}

#[tokio::test]
async fn concurrent_default_creations_leave_one_default() {
    let fixture = Fixture::new().await;
    let tenant_id = TenantId::new();
    let admin = fixture.admin(tenant_id, "admin").await;
    let service = service(&fixture);

    let mut handles = Vec::new();
    for index in 0..8 {
        let service = service.clone();
        let admin = admin.clone();
        handles.push(tokio::spawn(async move {
            service
                .create_group(&admin, input(&format!("Group {index}"), &["project.view"], true))
                .await
        }));
    }
    for handle in handles {
        assert!(matches!(handle.await, Ok(Ok(_))));
    }

    assert_eq!(fixture.groups.defaults_in(GroupScope::Tenant(tenant_id)).await, 1);
}

#[tokio::test]
async fn concurrent_creations_with_one_name_keep_one_group() {
    let fixture = Fixture::new().await;
    let admin = fixture.admin(TenantId::new(), "admin").await;
    let service = service(&fixture);

    let mut handles = Vec::new();
    for _ in 0..4 {
        let service = service.clone();
        let admin = admin.clone();
        handles.push(tokio::spawn(async move {
            service
                .create_group(&admin, input("Editor", &["project.view"], false))
                .await
        }));
    }
    let mut created = 0;
    for handle in handles {
        match handle.await {
            Ok(Ok(_)) => created += 1,
            Ok(Err(AppError::DuplicateName(_))) => {}
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
    assert_eq!(created, 1);
}

#[tokio::test]
async fn referenced_group_deletion_reports_principals() {
    let fixture = Fixture::new().await;
    let tenant_id = TenantId::new();
    let admin = fixture.admin(tenant_id, "admin").await;
    let service = service(&fixture);
    let Ok(group) = service
        .create_group(&admin, input("Editor", &["project.view"], false))
        .await
    else {
        panic!("group should be created");
    };
    let saved = fixture
        .assignments
        .save_assignment(
            tenant_id,
            "bob",
            PrincipalPermissionAssignment {
                group_ids: BTreeSet::from([group.group_id()]),
                ..PrincipalPermissionAssignment::default()
            },
        )
        .await;
    assert!(saved.is_ok());

    let result = service.delete_group(&admin, group.group_id()).await;
    assert!(matches!(
        result,
        Err(AppError::ReferencedGroupDeletion { principals, .. })
            if principals == vec![format!("bob@{tenant_id}")]
    ));
    assert!(service.get_group(&admin, group.group_id()).await.is_ok());
}

#[tokio::test]
async fn unreferenced_group_deletes() {
    let fixture = Fixture::new().await;
    let admin = fixture.admin(TenantId::new(), "admin").await;
    let service = service(&fixture);
    let Ok(group) = service
        .create_group(&admin, input("Editor", &["project.view"], false))
        .await
    else {
        panic!("group should be created");
    };

    assert!(service.delete_group(&admin, group.group_id()).await.is_ok());
    assert!(matches!(
        service.get_group(&admin, group.group_id()).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn groups_of_other_tenants_are_not_found() {
    let fixture = Fixture::new().await;
    let owner = fixture.admin(TenantId::new(), "owner").await;
    let outsider = fixture.admin(TenantId::new(), "outsider").await;
    let service = service(&fixture);
    let Ok(group) = service
        .create_group(&owner, input("Editor", &["project.view"], false))
        .await
    else {
        panic!("group should be created");
    };

    assert!(matches!(
        service.get_group(&outsider, group.group_id()).await,
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        service.delete_group(&outsider, group.group_id()).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn global_writes_require_platform_tenant() {
    let fixture = Fixture::new().await;
    let platform = TenantId::new();
    let platform_admin = fixture.admin(platform, "root").await;
    let tenant_admin = fixture.admin(TenantId::new(), "admin").await;
    let service = service(&fixture).with_platform_tenant(Some(platform));
    let global_input = CreatePermissionGroupInput {
        scope: GroupScopeSelector::Global,
        ..input("Everyone", &["project.view"], true)
    };

    assert!(matches!(
        service.create_group(&tenant_admin, global_input.clone()).await,
        Err(AppError::Forbidden(_))
    ));

    let created = service.create_group(&platform_admin, global_input).await;
    assert_eq!(created.map(|group| group.scope()).ok(), Some(GroupScope::Global));

    let visible = service
        .list_groups(&tenant_admin, GroupScopeSelector::Global)
        .await;
    assert_eq!(visible.map(|groups| groups.len()).ok(), Some(1));
}

#[tokio::test]
async fn principals_without_manage_permission_are_forbidden() {
    let fixture = Fixture::new().await;
    let service = service(&fixture);
    let member = actor(TenantId::new(), "member");

    assert!(matches!(
        service
            .create_group(&member, input("Editor", &["project.view"], false))
            .await,
        Err(AppError::Forbidden(_))
    ));
    assert!(matches!(
        service.list_groups(&member, GroupScopeSelector::Tenant).await,
        Err(AppError::Forbidden(_))
    ));
}

#[tokio::test]
async fn group_updates_reach_cached_resolutions() {
    let fixture = Fixture::new().await;
    let tenant_id = TenantId::new();
    let admin = fixture.admin(tenant_id, "admin").await;
    let service = service(&fixture);
    let Ok(group) = service
        .create_group(&admin, input("Editor", &["project.view"], false))
        .await
    else {
        panic!("group should be created");
    };
    let assignment = PrincipalPermissionAssignment {
        group_ids: BTreeSet::from([group.group_id()]),
        ..PrincipalPermissionAssignment::default()
    };

    let before = fixture.resolution.resolve(tenant_id, &assignment).await;
    assert_eq!(
        before.map(|value| value.permission_ids).ok(),
        Some(ids(&["project.view"]))
    );

    let updated = service
        .update_group(
            &admin,
            group.group_id(),
            UpdatePermissionGroupInput {
                permission_ids: Some(vec!["project.delete".to_owned()]),
                ..UpdatePermissionGroupInput::default()
            },
        )
        .await;
    assert!(updated.is_ok());

    let after = fixture.resolution.resolve(tenant_id, &assignment).await;
    assert_eq!(
        after.map(|value| value.permission_ids).ok(),
        Some(ids(&["project.delete"]))
    );
}

#[tokio::test]
async fn repository_clears_previous_default_in_one_write() {
    let fixture = Fixture::new().await;
    let admin = fixture.admin(TenantId::new(), "admin").await;
    let service = service(&fixture);
    let Ok(first) = service
        .create_group(&admin, input("Members", &["project.view"], true))
        .await
    else {
        panic!("group should be created");
    };
    assert!(
        service
            .create_group(&admin, input("Staff", &["project.view"], true))
            .await
            .is_ok()
    );

    let stored = fixture.groups.find_group(first.group_id()).await;
    assert_eq!(
        stored.ok().flatten().map(|group| group.is_default()),
        Some(false)
    );
}
