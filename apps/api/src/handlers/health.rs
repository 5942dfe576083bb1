use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use crate::dto::{HealthDependencyStatus, HealthResponse};
use crate::state::AppState;

mod checks;

use checks::{check_postgres, check_redis};

pub async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let catalogue = if state.catalogue_service.is_ready() {
        HealthDependencyStatus::ok()
    } else {
        HealthDependencyStatus::error("permission catalogue is not loaded".to_owned())
    };
    let postgres = check_postgres(state.postgres_pool.clone()).await;
    let redis = check_redis(state.redis_client.clone(), state.redis_required).await;

    let ready = catalogue.is_healthy()
        && (postgres.is_healthy() || state.postgres_pool.is_none())
        && (redis.is_healthy() || !state.redis_required);
    let status = if ready { "ok" } else { "degraded" };
    let http_status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        http_status,
        Json(HealthResponse {
            status,
            ready,
            catalogue,
            postgres,
            redis,
        }),
    )
}
