use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use qryvanta_application::{PrincipalAssignmentRepository, PrincipalReference};
use qryvanta_core::{AppError, AppResult, TenantId};
use qryvanta_domain::PrincipalPermissionAssignment;

const EFFECT_GRANT: &str = "grant";
const EFFECT_REVOKE: &str = "revoke";

/// PostgreSQL-backed store for principal group assignments and overrides.
#[derive(Clone)]
pub struct PostgresPrincipalAssignmentRepository {
    pool: PgPool,
}

impl PostgresPrincipalAssignmentRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct OverrideRow {
    permission_id: String,
    effect: String,
}

#[derive(Debug, FromRow)]
struct PrincipalRow {
    tenant_id: Uuid,
    subject: String,
}

#[async_trait]
impl PrincipalAssignmentRepository for PostgresPrincipalAssignmentRepository {
    async fn find_assignment(
        &self,
        tenant_id: TenantId,
        subject: &str,
    ) -> AppResult<PrincipalPermissionAssignment> {
        let group_ids = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT group_id
            FROM principal_group_assignments
            WHERE tenant_id = $1 AND subject = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(subject)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to load principal group assignments: {error}"))
        })?;

        let overrides = sqlx::query_as::<_, OverrideRow>(
            r#"
            SELECT permission_id, effect
            FROM principal_permission_overrides
            WHERE tenant_id = $1 AND subject = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(subject)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to load principal permission overrides: {error}"))
        })?;

        let mut assignment = PrincipalPermissionAssignment {
            group_ids: group_ids.into_iter().collect(),
            ..PrincipalPermissionAssignment::default()
        };
        for row in overrides {
            match row.effect.as_str() {
                EFFECT_GRANT => {
                    assignment.direct_permission_ids.insert(row.permission_id);
                }
                EFFECT_REVOKE => {
                    assignment.revoked_permission_ids.insert(row.permission_id);
                }
                other => {
                    return Err(AppError::Internal(format!(
                        "unknown permission override effect '{other}'"
                    )));
                }
            }
        }

        Ok(assignment)
    }

    async fn save_assignment(
        &self,
        tenant_id: TenantId,
        subject: &str,
        assignment: PrincipalPermissionAssignment,
    ) -> AppResult<()> {
        let mut transaction =
            self.pool.begin().await.map_err(|error| {
                AppError::Internal(format!("failed to begin transaction: {error}"))
            })?;

        sqlx::query(
            "DELETE FROM principal_group_assignments WHERE tenant_id = $1 AND subject = $2",
        )
        .bind(tenant_id.as_uuid())
        .bind(subject)
        .execute(&mut *transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to clear principal group assignments: {error}"))
        })?;

        sqlx::query(
            "DELETE FROM principal_permission_overrides WHERE tenant_id = $1 AND subject = $2",
        )
        .bind(tenant_id.as_uuid())
        .bind(subject)
        .execute(&mut *transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to clear principal permission overrides: {error}"))
        })?;

        let group_ids: Vec<Uuid> = assignment.group_ids.iter().copied().collect();
        sqlx::query(
            r#"
            INSERT INTO principal_group_assignments (tenant_id, subject, group_id)
            SELECT $1, $2, group_id
            FROM UNNEST($3::UUID[]) AS group_id
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(subject)
        .bind(group_ids)
        .execute(&mut *transaction)
        .await
        .map_err(|error| {
            if let sqlx::Error::Database(database_error) = &error
                && database_error.code().as_deref() == Some("23503")
            {
                return AppError::Validation(
                    "assignment references a permission group that no longer exists".to_owned(),
                );
            }
            AppError::Internal(format!("failed to persist principal group assignments: {error}"))
        })?;

        let (permission_ids, effects): (Vec<String>, Vec<String>) = assignment
            .direct_permission_ids
            .iter()
            .map(|id| (id.clone(), EFFECT_GRANT.to_owned()))
            .chain(
                assignment
                    .revoked_permission_ids
                    .iter()
                    .map(|id| (id.clone(), EFFECT_REVOKE.to_owned())),
            )
            .unzip();
        sqlx::query(
            r#"
            INSERT INTO principal_permission_overrides (tenant_id, subject, permission_id, effect)
            SELECT $1, $2, overrides.permission_id, overrides.effect
            FROM UNNEST($3::TEXT[], $4::TEXT[]) AS overrides (permission_id, effect)
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(subject)
        .bind(permission_ids)
        .bind(effects)
        .execute(&mut *transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to persist principal permission overrides: {error}"))
        })?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        Ok(())
    }

    async fn list_principals_with_group(
        &self,
        group_id: Uuid,
    ) -> AppResult<Vec<PrincipalReference>> {
        let rows = sqlx::query_as::<_, PrincipalRow>(
            r#"
            SELECT tenant_id, subject
            FROM principal_group_assignments
            WHERE group_id = $1
            ORDER BY tenant_id, subject
            "#,
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list principals for group: {error}"))
        })?;

        Ok(rows
            .into_iter()
            .map(|row| PrincipalReference {
                tenant_id: TenantId::from_uuid(row.tenant_id),
                subject: row.subject,
            })
            .collect())
    }
}
