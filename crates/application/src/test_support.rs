use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use qryvanta_core::{AppError, AppResult, TenantId, UserIdentity};
use qryvanta_domain::{
    AdminPermission, CatalogueDefinition, CatalogueEntry, EffectivePermissions, GroupScope,
    PermissionGroup, PrincipalPermissionAssignment,
};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::{
    AuditEvent, AuditRepository, AuthorizationService, CacheGeneration, CatalogueSource,
    PermissionCatalogueService, PermissionGroupRepository, PermissionResolutionService,
    PermissionValidationService, PrincipalAssignmentRepository, PrincipalReference,
    ResolutionCache, ResolutionCacheKey,
};

pub(crate) struct StaticCatalogueSource {
    definition: Mutex<CatalogueDefinition>,
}

impl StaticCatalogueSource {
    pub(crate) fn new(definition: CatalogueDefinition) -> Self {
        Self {
            definition: Mutex::new(definition),
        }
    }

    pub(crate) async fn replace(&self, definition: CatalogueDefinition) {
        *self.definition.lock().await = definition;
    }
}

#[async_trait]
impl CatalogueSource for StaticCatalogueSource {
    async fn load_definition(&self) -> AppResult<CatalogueDefinition> {
        Ok(self.definition.lock().await.clone())
    }

    fn describe(&self) -> String {
        "static test definition".to_owned()
    }
}

/// `project` with `project.view` and `project.delete`, plus the security branch.
pub(crate) fn project_catalogue_definition() -> CatalogueDefinition {
    let security = AdminPermission::all()
        .iter()
        .map(|permission| CatalogueEntry::new(permission.as_str(), permission.label()))
        .collect();

    CatalogueDefinition {
        permissions: vec![
            CatalogueEntry::new("project", "Projects").with_children(vec![
                CatalogueEntry::new("project.view", "View projects"),
                CatalogueEntry::new("project.delete", "Delete projects"),
            ]),
            CatalogueEntry::new("security", "Security").with_children(security),
        ],
    }
}

pub(crate) async fn loaded_catalogue() -> PermissionCatalogueService {
    let service = PermissionCatalogueService::new(Arc::new(StaticCatalogueSource::new(
        project_catalogue_definition(),
    )));
    if service.load().await.is_err() {
        panic!("test catalogue should load");
    }
    service
}

#[derive(Default)]
pub(crate) struct FakePermissionGroupRepository {
    groups: Mutex<Vec<PermissionGroup>>,
}

impl FakePermissionGroupRepository {
    pub(crate) async fn defaults_in(&self, scope: GroupScope) -> usize {
        self.groups
            .lock()
            .await
            .iter()
            .filter(|group| group.scope() == scope && group.is_default())
            .count()
    }
}

fn clear_default(groups: &mut [PermissionGroup], incoming: &PermissionGroup) {
    if !incoming.is_default() {
        return;
    }
    for group in groups.iter_mut().filter(|group| {
        group.scope() == incoming.scope() && group.group_id() != incoming.group_id()
    }) {
        group.set_default(false);
    }
}

fn reject_duplicate_name(groups: &[PermissionGroup], incoming: &PermissionGroup) -> AppResult<()> {
    let taken = groups.iter().any(|group| {
        group.scope() == incoming.scope()
            && group.group_id() != incoming.group_id()
            && group.has_name(incoming.name())
    });
    if taken {
        return Err(AppError::DuplicateName(incoming.name().to_owned()));
    }
    Ok(())
}

#[async_trait]
impl PermissionGroupRepository for FakePermissionGroupRepository {
    async fn list_groups(&self, scope: GroupScope) -> AppResult<Vec<PermissionGroup>> {
        Ok(self
            .groups
            .lock()
            .await
            .iter()
            .filter(|group| group.scope() == scope)
            .cloned()
            .collect())
    }

    async fn find_group(&self, group_id: Uuid) -> AppResult<Option<PermissionGroup>> {
        Ok(self
            .groups
            .lock()
            .await
            .iter()
            .find(|group| group.group_id() == group_id)
            .cloned())
    }

    async fn find_groups(&self, group_ids: &[Uuid]) -> AppResult<Vec<PermissionGroup>> {
        Ok(self
            .groups
            .lock()
            .await
            .iter()
            .filter(|group| group_ids.contains(&group.group_id()))
            .cloned()
            .collect())
    }

    async fn find_group_by_name(
        &self,
        scope: GroupScope,
        name: &str,
    ) -> AppResult<Option<PermissionGroup>> {
        Ok(self
            .groups
            .lock()
            .await
            .iter()
            .find(|group| group.scope() == scope && group.has_name(name))
            .cloned())
    }

    async fn insert_group(&self, group: PermissionGroup) -> AppResult<()> {
        let mut groups = self.groups.lock().await;
        reject_duplicate_name(&groups, &group)?;
        clear_default(&mut groups, &group);
        groups.push(group);
        Ok(())
    }

    async fn replace_group(&self, group: PermissionGroup) -> AppResult<()> {
        let mut groups = self.groups.lock().await;
        reject_duplicate_name(&groups, &group)?;
        let Some(index) = groups
            .iter()
            .position(|stored| stored.group_id() == group.group_id())
        else {
            return Err(AppError::NotFound(group.group_id().to_string()));
        };
        clear_default(&mut groups, &group);
        groups[index] = group;
        Ok(())
    }

    async fn delete_group(&self, group_id: Uuid) -> AppResult<()> {
        let mut groups = self.groups.lock().await;
        let before = groups.len();
        groups.retain(|group| group.group_id() != group_id);
        if groups.len() == before {
            return Err(AppError::NotFound(group_id.to_string()));
        }
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct FakePrincipalAssignmentRepository {
    assignments: Mutex<HashMap<(TenantId, String), PrincipalPermissionAssignment>>,
}

#[async_trait]
impl PrincipalAssignmentRepository for FakePrincipalAssignmentRepository {
    async fn find_assignment(
        &self,
        tenant_id: TenantId,
        subject: &str,
    ) -> AppResult<PrincipalPermissionAssignment> {
        Ok(self
            .assignments
            .lock()
            .await
            .get(&(tenant_id, subject.to_owned()))
            .cloned()
            .unwrap_or_default())
    }

    async fn save_assignment(
        &self,
        tenant_id: TenantId,
        subject: &str,
        assignment: PrincipalPermissionAssignment,
    ) -> AppResult<()> {
        self.assignments
            .lock()
            .await
            .insert((tenant_id, subject.to_owned()), assignment);
        Ok(())
    }

    async fn list_principals_with_group(
        &self,
        group_id: Uuid,
    ) -> AppResult<Vec<PrincipalReference>> {
        let mut principals: Vec<PrincipalReference> = self
            .assignments
            .lock()
            .await
            .iter()
            .filter(|(_, assignment)| assignment.group_ids.contains(&group_id))
            .map(|((tenant_id, subject), _)| PrincipalReference {
                tenant_id: *tenant_id,
                subject: subject.clone(),
            })
            .collect();
        principals.sort();
        Ok(principals)
    }
}

#[derive(Default)]
pub(crate) struct RecordingResolutionCache {
    global: Mutex<u64>,
    tenants: Mutex<HashMap<TenantId, u64>>,
    entries: Mutex<HashMap<ResolutionCacheKey, EffectivePermissions>>,
    hits: Mutex<usize>,
}

impl RecordingResolutionCache {
    pub(crate) async fn hits(&self) -> usize {
        *self.hits.lock().await
    }
}

#[async_trait]
impl ResolutionCache for RecordingResolutionCache {
    async fn generation(&self, tenant_id: TenantId) -> AppResult<CacheGeneration> {
        Ok(CacheGeneration {
            global: *self.global.lock().await,
            tenant: self
                .tenants
                .lock()
                .await
                .get(&tenant_id)
                .copied()
                .unwrap_or_default(),
        })
    }

    async fn get(&self, key: &ResolutionCacheKey) -> AppResult<Option<EffectivePermissions>> {
        let value = self.entries.lock().await.get(key).cloned();
        if value.is_some() {
            *self.hits.lock().await += 1;
        }
        Ok(value)
    }

    async fn put(
        &self,
        key: ResolutionCacheKey,
        value: EffectivePermissions,
        _ttl_seconds: u32,
    ) -> AppResult<()> {
        self.entries.lock().await.insert(key, value);
        Ok(())
    }

    async fn invalidate_tenant(&self, tenant_id: TenantId) -> AppResult<()> {
        *self.tenants.lock().await.entry(tenant_id).or_default() += 1;
        Ok(())
    }

    async fn invalidate_all(&self) -> AppResult<()> {
        *self.global.lock().await += 1;
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct FakeAuditRepository {
    events: Mutex<Vec<AuditEvent>>,
}

impl FakeAuditRepository {
    pub(crate) async fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().await.clone()
    }
}

#[async_trait]
impl AuditRepository for FakeAuditRepository {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        self.events.lock().await.push(event);
        Ok(())
    }
}

/// Wired collaborators shared by service tests.
pub(crate) struct Fixture {
    pub(crate) catalogue: PermissionCatalogueService,
    pub(crate) groups: Arc<FakePermissionGroupRepository>,
    pub(crate) assignments: Arc<FakePrincipalAssignmentRepository>,
    pub(crate) audit: Arc<FakeAuditRepository>,
    pub(crate) validation: PermissionValidationService,
    pub(crate) resolution: PermissionResolutionService,
    pub(crate) authorization: AuthorizationService,
}

impl Fixture {
    pub(crate) async fn new() -> Self {
        let catalogue = loaded_catalogue().await;
        let groups = Arc::new(FakePermissionGroupRepository::default());
        let assignments = Arc::new(FakePrincipalAssignmentRepository::default());
        let cache = Arc::new(RecordingResolutionCache::default());
        let validation = PermissionValidationService::new(catalogue.clone());
        let resolution = PermissionResolutionService::new(groups.clone(), validation.clone())
            .with_cache(cache, 60);
        let authorization = AuthorizationService::new(assignments.clone(), resolution.clone());

        Self {
            catalogue,
            groups,
            assignments,
            audit: Arc::new(FakeAuditRepository::default()),
            validation,
            resolution,
            authorization,
        }
    }

    /// Creates an actor holding every administrative permission directly.
    pub(crate) async fn admin(&self, tenant_id: TenantId, subject: &str) -> UserIdentity {
        let assignment = PrincipalPermissionAssignment {
            direct_permission_ids: AdminPermission::all()
                .iter()
                .map(|permission| permission.as_str().to_owned())
                .collect(),
            ..PrincipalPermissionAssignment::default()
        };
        if self
            .assignments
            .save_assignment(tenant_id, subject, assignment)
            .await
            .is_err()
        {
            panic!("admin assignment should save");
        }
        actor(tenant_id, subject)
    }
}

pub(crate) fn actor(tenant_id: TenantId, subject: &str) -> UserIdentity {
    match UserIdentity::new(subject, None, tenant_id) {
        Ok(identity) => identity,
        Err(error) => panic!("test identity should build: {error}"),
    }
}
