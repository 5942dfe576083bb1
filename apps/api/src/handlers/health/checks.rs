use redis::AsyncCommands;

use crate::dto::HealthDependencyStatus;

pub(super) async fn check_postgres(pool: Option<sqlx::PgPool>) -> HealthDependencyStatus {
    let Some(pool) = pool else {
        return HealthDependencyStatus::disabled();
    };

    match sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(&pool)
        .await
    {
        Ok(_) => HealthDependencyStatus::ok(),
        Err(error) => HealthDependencyStatus::error(format!("postgres check failed: {error}")),
    }
}

pub(super) async fn check_redis(
    redis_client: Option<redis::Client>,
    redis_required: bool,
) -> HealthDependencyStatus {
    let Some(redis_client) = redis_client else {
        return if redis_required {
            HealthDependencyStatus::error("redis client is not configured".to_owned())
        } else {
            HealthDependencyStatus::disabled()
        };
    };

    let mut connection = match redis_client.get_multiplexed_async_connection().await {
        Ok(connection) => connection,
        Err(error) => {
            return HealthDependencyStatus::error(format!("redis connection failed: {error}"));
        }
    };

    match connection.ping::<String>().await {
        Ok(value) if value.eq_ignore_ascii_case("pong") => HealthDependencyStatus::ok(),
        Ok(value) => {
            HealthDependencyStatus::error(format!("unexpected redis ping response: {value}"))
        }
        Err(error) => HealthDependencyStatus::error(format!("redis ping failed: {error}")),
    }
}
