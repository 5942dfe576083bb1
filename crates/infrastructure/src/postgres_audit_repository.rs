use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

use qryvanta_application::{AuditEvent, AuditRepository};
use qryvanta_core::{AppError, AppResult};

/// PostgreSQL-backed append-only audit sink for permission administration.
#[derive(Clone)]
pub struct PostgresAuditRepository {
    pool: PgPool,
}

impl PostgresAuditRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditRepository for PostgresAuditRepository {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        let entry_id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO audit_log_entries (
                tenant_id, subject, action, resource_type, resource_id, detail
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(event.tenant_id.as_uuid())
        .bind(event.subject.as_str())
        .bind(event.action.as_str())
        .bind(event.resource_type.as_str())
        .bind(event.resource_id.as_str())
        .bind(event.detail.as_deref())
        .fetch_one(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to record audit event '{}': {error}",
                event.action.as_str()
            ))
        })?;

        debug!(entry_id, action = event.action.as_str(), "audit event persisted");
        Ok(())
    }
}
