use async_trait::async_trait;
use qryvanta_application::{AuditEvent, AuditRepository};
use qryvanta_core::AppResult;
use tokio::sync::RwLock;
use tracing::info;

/// Audit sink that keeps events in process memory and mirrors them to logs.
#[derive(Default)]
pub struct InMemoryAuditRepository {
    events: RwLock<Vec<AuditEvent>>,
}

impl InMemoryAuditRepository {
    /// Creates an empty audit sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns recorded events, oldest first.
    pub async fn events(&self) -> Vec<AuditEvent> {
        self.events.read().await.clone()
    }
}

#[async_trait]
impl AuditRepository for InMemoryAuditRepository {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        info!(
            tenant_id = %event.tenant_id,
            subject = %event.subject,
            action = event.action.as_str(),
            resource_type = %event.resource_type,
            resource_id = %event.resource_id,
            "audit event recorded"
        );
        self.events.write().await.push(event);
        Ok(())
    }
}
