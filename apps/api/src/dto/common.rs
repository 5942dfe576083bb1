use serde::Serialize;
use ts_rs::TS;

/// Health response payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/health-response.ts"
)]
pub struct HealthResponse {
    pub status: &'static str,
    pub ready: bool,
    pub catalogue: HealthDependencyStatus,
    pub postgres: HealthDependencyStatus,
    pub redis: HealthDependencyStatus,
}

/// Status of one dependency reported by the health endpoint.
#[derive(Debug, Clone, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/health-dependency-status.ts"
)]
pub struct HealthDependencyStatus {
    pub status: &'static str,
    pub detail: Option<String>,
}

impl HealthDependencyStatus {
    #[must_use]
    pub fn ok() -> Self {
        Self {
            status: "ok",
            detail: None,
        }
    }

    #[must_use]
    pub fn disabled() -> Self {
        Self {
            status: "disabled",
            detail: None,
        }
    }

    #[must_use]
    pub fn error(detail: String) -> Self {
        Self {
            status: "error",
            detail: Some(detail),
        }
    }

    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.status == "ok"
    }
}
