use std::collections::HashMap;

use async_trait::async_trait;
use qryvanta_application::{PrincipalAssignmentRepository, PrincipalReference};
use qryvanta_core::{AppResult, TenantId};
use qryvanta_domain::PrincipalPermissionAssignment;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory principal assignment store.
#[derive(Default)]
pub struct InMemoryPrincipalAssignmentRepository {
    assignments: RwLock<HashMap<(TenantId, String), PrincipalPermissionAssignment>>,
}

impl InMemoryPrincipalAssignmentRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PrincipalAssignmentRepository for InMemoryPrincipalAssignmentRepository {
    async fn find_assignment(
        &self,
        tenant_id: TenantId,
        subject: &str,
    ) -> AppResult<PrincipalPermissionAssignment> {
        Ok(self
            .assignments
            .read()
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
        let mut assignments = self.assignments.write().await;
        let key = (tenant_id, subject.to_owned());
        if assignment.is_empty() {
            assignments.remove(&key);
        } else {
            assignments.insert(key, assignment);
        }

        Ok(())
    }

    async fn list_principals_with_group(
        &self,
        group_id: Uuid,
    ) -> AppResult<Vec<PrincipalReference>> {
        let mut principals: Vec<PrincipalReference> = self
            .assignments
            .read()
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

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use qryvanta_application::PrincipalAssignmentRepository;
    use qryvanta_core::TenantId;
    use qryvanta_domain::PrincipalPermissionAssignment;
    use uuid::Uuid;

    use super::InMemoryPrincipalAssignmentRepository;

    #[tokio::test]
    async fn principals_referencing_group_are_listed_in_order() {
        let repository = InMemoryPrincipalAssignmentRepository::new();
        let tenant_id = TenantId::new();
        let group_id = Uuid::new_v4();
        let assignment = PrincipalPermissionAssignment {
            group_ids: BTreeSet::from([group_id]),
            ..PrincipalPermissionAssignment::default()
        };

        for subject in ["carol", "alice"] {
            assert!(
                repository
                    .save_assignment(tenant_id, subject, assignment.clone())
                    .await
                    .is_ok()
            );
        }
        assert!(
            repository
                .save_assignment(tenant_id, "bob", PrincipalPermissionAssignment::default())
                .await
                .is_ok()
        );

        let subjects = repository
            .list_principals_with_group(group_id)
            .await
            .map(|principals| {
                principals
                    .into_iter()
                    .map(|principal| principal.subject)
                    .collect::<Vec<_>>()
            });
        assert_eq!(
            subjects.ok(),
            Some(vec!["alice".to_owned(), "carol".to_owned()])
        );
    }

    #[tokio::test]
    async fn missing_assignment_reads_as_empty() {
        let repository = InMemoryPrincipalAssignmentRepository::new();
        let assignment = repository.find_assignment(TenantId::new(), "nobody").await;
        assert_eq!(assignment.ok(), Some(PrincipalPermissionAssignment::default()));
    }
}
