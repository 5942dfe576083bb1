use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use qryvanta_application::PermissionGroupRepository;
use qryvanta_core::{AppError, AppResult};
use qryvanta_domain::{GroupScope, PermissionGroup};

const NAME_UNIQUE_INDEX: &str = "permission_groups_scope_name_key";
const DEFAULT_UNIQUE_INDEX: &str = "permission_groups_scope_default_key";

const SELECT_GROUPS: &str = r#"
    SELECT
        groups.id,
        groups.scope_key,
        groups.name,
        groups.description,
        groups.is_default,
        groups.created_at,
        groups.updated_at,
        COALESCE(
            array_agg(grants.permission_id ORDER BY grants.permission_id)
                FILTER (WHERE grants.permission_id IS NOT NULL),
            '{}'
        ) AS permission_ids
    FROM permission_groups AS groups
    LEFT JOIN permission_group_grants AS grants
        ON grants.group_id = groups.id
"#;

/// PostgreSQL-backed permission group store.
///
/// Uniqueness of names and defaults is backed by unique indexes; the default
/// swap and grant replacement run in one transaction.
#[derive(Clone)]
pub struct PostgresPermissionGroupRepository {
    pool: PgPool,
}

impl PostgresPermissionGroupRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn begin(&self) -> AppResult<Transaction<'_, Postgres>> {
        self.pool
            .begin()
            .await
            .map_err(|error| AppError::Internal(format!("failed to begin transaction: {error}")))
    }
}

#[derive(Debug, FromRow)]
struct GroupRow {
    id: Uuid,
    scope_key: String,
    name: String,
    description: Option<String>,
    is_default: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    permission_ids: Vec<String>,
}

impl TryFrom<GroupRow> for PermissionGroup {
    type Error = AppError;

    fn try_from(row: GroupRow) -> Result<Self, Self::Error> {
        PermissionGroup::restore(
            row.id,
            GroupScope::from_str(row.scope_key.as_str())?,
            row.name,
            row.description,
            row.permission_ids,
            row.is_default,
            row.created_at,
            row.updated_at,
        )
    }
}

fn into_groups(rows: Vec<GroupRow>) -> AppResult<Vec<PermissionGroup>> {
    rows.into_iter().map(PermissionGroup::try_from).collect()
}

#[async_trait]
impl PermissionGroupRepository for PostgresPermissionGroupRepository {
    async fn list_groups(&self, scope: GroupScope) -> AppResult<Vec<PermissionGroup>> {
        let rows = sqlx::query_as::<_, GroupRow>(&format!(
            r#"
            {SELECT_GROUPS}
            WHERE groups.scope_key = $1
            GROUP BY groups.id
            ORDER BY groups.created_at, groups.insertion_order
            "#
        ))
        .bind(scope.storage_key())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to list permission groups: {error}"))
        })?;

        into_groups(rows)
    }

    async fn find_group(&self, group_id: Uuid) -> AppResult<Option<PermissionGroup>> {
        let row = sqlx::query_as::<_, GroupRow>(&format!(
            r#"
            {SELECT_GROUPS}
            WHERE groups.id = $1
            GROUP BY groups.id
            "#
        ))
        .bind(group_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find permission group: {error}")))?;

        row.map(PermissionGroup::try_from).transpose()
    }

    async fn find_groups(&self, group_ids: &[Uuid]) -> AppResult<Vec<PermissionGroup>> {
        if group_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, GroupRow>(&format!(
            r#"
            {SELECT_GROUPS}
            WHERE groups.id = ANY($1)
            GROUP BY groups.id
            "#
        ))
        .bind(group_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to load permission groups: {error}"))
        })?;

        into_groups(rows)
    }

    async fn find_group_by_name(
        &self,
        scope: GroupScope,
        name: &str,
    ) -> AppResult<Option<PermissionGroup>> {
        let row = sqlx::query_as::<_, GroupRow>(&format!(
            r#"
            {SELECT_GROUPS}
            WHERE groups.scope_key = $1 AND groups.name_key = $2
            GROUP BY groups.id
            "#
        ))
        .bind(scope.storage_key())
        .bind(PermissionGroup::key_for_name(name))
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to find permission group by name: {error}"))
        })?;

        row.map(PermissionGroup::try_from).transpose()
    }

    async fn insert_group(&self, group: PermissionGroup) -> AppResult<()> {
        let mut transaction = self.begin().await?;
        clear_previous_default(&mut transaction, &group).await?;

        sqlx::query(
            r#"
            INSERT INTO permission_groups (
                id,
                scope_key,
                tenant_id,
                name,
                name_key,
                description,
                is_default,
                created_at,
                updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(group.group_id())
        .bind(group.scope().storage_key())
        .bind(group.scope().tenant_id().map(|tenant_id| tenant_id.as_uuid()))
        .bind(group.name())
        .bind(group.name_key())
        .bind(group.description())
        .bind(group.is_default())
        .bind(group.created_at())
        .bind(group.updated_at())
        .execute(&mut *transaction)
        .await
        .map_err(|error| map_group_write_error(error, &group))?;

        write_grants(&mut transaction, &group).await?;
        commit(transaction).await
    }

    async fn replace_group(&self, group: PermissionGroup) -> AppResult<()> {
        let mut transaction = self.begin().await?;
        clear_previous_default(&mut transaction, &group).await?;

        let rows_affected = sqlx::query(
            r#"
            UPDATE permission_groups
            SET name = $2,
                name_key = $3,
                description = $4,
                is_default = $5,
                updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(group.group_id())
        .bind(group.name())
        .bind(group.name_key())
        .bind(group.description())
        .bind(group.is_default())
        .bind(group.updated_at())
        .execute(&mut *transaction)
        .await
        .map_err(|error| map_group_write_error(error, &group))?
        .rows_affected();

        if rows_affected == 0 {
            return Err(AppError::NotFound(format!(
                "permission group '{}' does not exist",
                group.group_id()
            )));
        }

        sqlx::query("DELETE FROM permission_group_grants WHERE group_id = $1")
            .bind(group.group_id())
            .execute(&mut *transaction)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to clear permission group grants: {error}"))
            })?;

        write_grants(&mut transaction, &group).await?;
        commit(transaction).await
    }

    async fn delete_group(&self, group_id: Uuid) -> AppResult<()> {
        let rows_affected = sqlx::query("DELETE FROM permission_groups WHERE id = $1")
            .bind(group_id)
            .execute(&self.pool)
            .await
            .map_err(|error| map_group_delete_error(error, group_id))?
            .rows_affected();

        if rows_affected == 0 {
            return Err(AppError::NotFound(format!(
                "permission group '{group_id}' does not exist"
            )));
        }

        Ok(())
    }
}

async fn clear_previous_default(
    transaction: &mut Transaction<'_, Postgres>,
    group: &PermissionGroup,
) -> AppResult<()> {
    if !group.is_default() {
        return Ok(());
    }

    sqlx::query(
        r#"
        UPDATE permission_groups
        SET is_default = false, updated_at = $3
        WHERE scope_key = $1 AND is_default AND id <> $2
        "#,
    )
    .bind(group.scope().storage_key())
    .bind(group.group_id())
    .bind(group.updated_at())
    .execute(&mut **transaction)
    .await
    .map_err(|error| {
        AppError::Internal(format!("failed to clear previous default group: {error}"))
    })?;

    Ok(())
}

async fn write_grants(
    transaction: &mut Transaction<'_, Postgres>,
    group: &PermissionGroup,
) -> AppResult<()> {
    let permission_ids: Vec<String> = group.permission_ids().iter().cloned().collect();

    sqlx::query(
        r#"
        INSERT INTO permission_group_grants (group_id, permission_id)
        SELECT $1, permission_id
        FROM UNNEST($2::TEXT[]) AS permission_id
        "#,
    )
    .bind(group.group_id())
    .bind(permission_ids)
    .execute(&mut **transaction)
    .await
    .map_err(|error| {
        AppError::Internal(format!("failed to persist permission group grants: {error}"))
    })?;

    Ok(())
}

async fn commit(transaction: Transaction<'_, Postgres>) -> AppResult<()> {
    transaction
        .commit()
        .await
        .map_err(|error| AppError::Internal(format!("failed to commit transaction: {error}")))
}

fn map_group_write_error(error: sqlx::Error, group: &PermissionGroup) -> AppError {
    if let sqlx::Error::Database(database_error) = &error
        && database_error.code().as_deref() == Some("23505")
    {
        return match database_error.constraint() {
            Some(NAME_UNIQUE_INDEX) => AppError::DuplicateName(format!(
                "permission group '{}' already exists in {}",
                group.name(),
                group.scope()
            )),
            Some(DEFAULT_UNIQUE_INDEX) => AppError::Conflict(format!(
                "another default group was set concurrently in {}",
                group.scope()
            )),
            _ => AppError::Conflict(format!(
                "permission group '{}' already exists",
                group.group_id()
            )),
        };
    }

    AppError::Internal(format!("failed to write permission group: {error}"))
}

fn map_group_delete_error(error: sqlx::Error, group_id: Uuid) -> AppError {
    if let sqlx::Error::Database(database_error) = &error
        && database_error.code().as_deref() == Some("23503")
    {
        return AppError::Conflict(format!(
            "permission group '{group_id}' is still assigned to principals"
        ));
    }

    AppError::Internal(format!("failed to delete permission group: {error}"))
}
