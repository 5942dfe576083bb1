use std::collections::HashMap;

use async_trait::async_trait;
use qryvanta_application::PermissionGroupRepository;
use qryvanta_core::{AppError, AppResult};
use qryvanta_domain::{GroupScope, PermissionGroup};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct GroupTable {
    next_sequence: u64,
    rows: HashMap<Uuid, (u64, PermissionGroup)>,
}

impl GroupTable {
    fn ensure_unique_name(&self, incoming: &PermissionGroup) -> AppResult<()> {
        let taken = self.rows.values().any(|(_, group)| {
            group.scope() == incoming.scope()
                && group.group_id() != incoming.group_id()
                && group.has_name(incoming.name())
        });
        if taken {
            return Err(AppError::DuplicateName(format!(
                "permission group '{}' already exists in {}",
                incoming.name(),
                incoming.scope()
            )));
        }

        Ok(())
    }

    fn clear_previous_default(&mut self, incoming: &PermissionGroup) {
        if !incoming.is_default() {
            return;
        }

        for (_, group) in self.rows.values_mut() {
            if group.scope() == incoming.scope()
                && group.group_id() != incoming.group_id()
                && group.is_default()
            {
                group.set_default(false);
                group.touch(incoming.updated_at());
            }
        }
    }
}

/// In-memory permission group store for local runs and tests.
///
/// Each write holds the table lock for its whole duration, so the default swap
/// is observed atomically.
#[derive(Default)]
pub struct InMemoryPermissionGroupRepository {
    table: RwLock<GroupTable>,
}

impl InMemoryPermissionGroupRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PermissionGroupRepository for InMemoryPermissionGroupRepository {
    async fn list_groups(&self, scope: GroupScope) -> AppResult<Vec<PermissionGroup>> {
        let table = self.table.read().await;
        let mut rows: Vec<&(u64, PermissionGroup)> = table
            .rows
            .values()
            .filter(|(_, group)| group.scope() == scope)
            .collect();
        rows.sort_by_key(|(sequence, group)| (group.created_at(), *sequence));

        Ok(rows.into_iter().map(|(_, group)| group.clone()).collect())
    }

    async fn find_group(&self, group_id: Uuid) -> AppResult<Option<PermissionGroup>> {
        Ok(self
            .table
            .read()
            .await
            .rows
            .get(&group_id)
            .map(|(_, group)| group.clone()))
    }

    async fn find_groups(&self, group_ids: &[Uuid]) -> AppResult<Vec<PermissionGroup>> {
        let table = self.table.read().await;
        Ok(group_ids
            .iter()
            .filter_map(|group_id| table.rows.get(group_id))
            .map(|(_, group)| group.clone())
            .collect())
    }

    async fn find_group_by_name(
        &self,
        scope: GroupScope,
        name: &str,
    ) -> AppResult<Option<PermissionGroup>> {
        Ok(self
            .table
            .read()
            .await
            .rows
            .values()
            .find(|(_, group)| group.scope() == scope && group.has_name(name))
            .map(|(_, group)| group.clone()))
    }

    async fn insert_group(&self, group: PermissionGroup) -> AppResult<()> {
        let mut table = self.table.write().await;
        if table.rows.contains_key(&group.group_id()) {
            return Err(AppError::Conflict(format!(
                "permission group '{}' already exists",
                group.group_id()
            )));
        }
        table.ensure_unique_name(&group)?;
        table.clear_previous_default(&group);

        let sequence = table.next_sequence;
        table.next_sequence += 1;
        table.rows.insert(group.group_id(), (sequence, group));

        Ok(())
    }

    async fn replace_group(&self, group: PermissionGroup) -> AppResult<()> {
        let mut table = self.table.write().await;
        let Some(sequence) = table
            .rows
            .get(&group.group_id())
            .map(|(sequence, _)| *sequence)
        else {
            return Err(AppError::NotFound(format!(
                "permission group '{}' does not exist",
                group.group_id()
            )));
        };
        table.ensure_unique_name(&group)?;
        table.clear_previous_default(&group);
        table.rows.insert(group.group_id(), (sequence, group));

        Ok(())
    }

    async fn delete_group(&self, group_id: Uuid) -> AppResult<()> {
        self.table
            .write()
            .await
            .rows
            .remove(&group_id)
            .map(|_| ())
            .ok_or_else(|| {
                AppError::NotFound(format!("permission group '{group_id}' does not exist"))
            })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use qryvanta_application::PermissionGroupRepository;
    use qryvanta_core::{AppError, TenantId};
    use qryvanta_domain::{GroupScope, PermissionGroup};

    use super::InMemoryPermissionGroupRepository;

    fn group(scope: GroupScope, name: &str, is_default: bool) -> PermissionGroup {
        match PermissionGroup::new(
            scope,
            name,
            None,
            vec!["project.view".to_owned()],
            is_default,
            Utc::now(),
        ) {
            Ok(group) => group,
            Err(error) => panic!("group should build: {error}"),
        }
    }

    #[tokio::test]
    async fn list_returns_scope_groups_oldest_first() {
        let repository = InMemoryPermissionGroupRepository::new();
        let scope = GroupScope::Tenant(TenantId::new());
        let names = ["Charlie", "Alpha", "Bravo"];
        for name in names {
            assert!(repository.insert_group(group(scope, name, false)).await.is_ok());
        }
        assert!(
            repository
                .insert_group(group(GroupScope::Global, "Other", false))
                .await
                .is_ok()
        );

        let listed = repository.list_groups(scope).await;
        let listed: Option<Vec<String>> = listed
            .ok()
            .map(|groups| groups.iter().map(|group| group.name().to_owned()).collect());
        assert_eq!(
            listed,
            Some(names.iter().map(|name| (*name).to_owned()).collect())
        );
    }

    #[tokio::test]
    async fn inserting_default_clears_previous_default() {
        let repository = InMemoryPermissionGroupRepository::new();
        let scope = GroupScope::Global;
        let first = group(scope, "First", true);
        let first_id = first.group_id();
        assert!(repository.insert_group(first).await.is_ok());
        assert!(repository.insert_group(group(scope, "Second", true)).await.is_ok());

        let defaults = repository
            .list_groups(scope)
            .await
            .map(|groups| groups.iter().filter(|group| group.is_default()).count());
        assert_eq!(defaults.ok(), Some(1));

        let first = repository.find_group(first_id).await;
        assert_eq!(
            first.ok().flatten().map(|group| group.is_default()),
            Some(false)
        );
    }

    #[tokio::test]
    async fn names_collide_only_within_scope() {
        let repository = InMemoryPermissionGroupRepository::new();
        let scope = GroupScope::Tenant(TenantId::new());
        assert!(repository.insert_group(group(scope, "Editor", false)).await.is_ok());

        let duplicate = repository.insert_group(group(scope, "EDITOR", false)).await;
        assert!(matches!(duplicate, Err(AppError::DuplicateName(_))));
        assert!(
            repository
                .insert_group(group(GroupScope::Global, "Editor", false))
                .await
                .is_ok()
        );

        assert!(repository.insert_group(group(scope, "Équipe", false)).await.is_ok());
        let accented = repository.insert_group(group(scope, "équipe", false)).await;
        assert!(matches!(accented, Err(AppError::DuplicateName(_))));
    }

    #[tokio::test]
    async fn replace_keeps_original_position() {
        let repository = InMemoryPermissionGroupRepository::new();
        let scope = GroupScope::Global;
        let mut first = group(scope, "First", false);
        assert!(repository.insert_group(first.clone()).await.is_ok());
        assert!(repository.insert_group(group(scope, "Second", false)).await.is_ok());

        assert!(first.rename("Renamed").is_ok());
        first.touch(Utc::now() + Duration::seconds(5));
        assert!(repository.replace_group(first).await.is_ok());

        let names = repository.list_groups(scope).await.map(|groups| {
            groups
                .iter()
                .map(|group| group.name().to_owned())
                .collect::<Vec<_>>()
        });
        assert_eq!(
            names.ok(),
            Some(vec!["Renamed".to_owned(), "Second".to_owned()])
        );
    }

    #[tokio::test]
    async fn deleting_missing_group_is_not_found() {
        let repository = InMemoryPermissionGroupRepository::new();
        let result = repository.delete_group(uuid::Uuid::new_v4()).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
