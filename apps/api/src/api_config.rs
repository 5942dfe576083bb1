use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use qryvanta_core::{AppError, TenantId};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionCacheBackend {
    InMemory,
    Redis,
    Disabled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogueSourceConfig {
    Builtin,
    JsonFile(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapAdminConfig {
    pub subject: String,
    pub tenant_id: TenantId,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub migrate_only: bool,
    pub database_url: Option<String>,
    pub frontend_url: String,
    pub api_host: String,
    pub api_port: u16,
    pub redis_url: Option<String>,
    pub resolution_cache_backend: ResolutionCacheBackend,
    pub resolution_cache_ttl_seconds: u32,
    pub catalogue_source: CatalogueSourceConfig,
    pub bootstrap_admin: Option<BootstrapAdminConfig>,
    pub platform_tenant_id: Option<TenantId>,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let migrate_only = env::args().nth(1).as_deref() == Some("migrate");

        let frontend_url =
            env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_owned());
        let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
        let api_port = env::var("API_PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3001);

        let database_url = optional_env("DATABASE_URL");
        let resolution_cache_backend = parse_resolution_cache_backend(
            optional_env("RESOLUTION_CACHE_BACKEND").as_deref(),
            database_url.is_some(),
        )?;

        let resolution_cache_ttl_seconds = optional_env("RESOLUTION_CACHE_TTL_SECONDS")
            .map(|value| {
                value.parse::<u32>().map_err(|error| {
                    AppError::Validation(format!("invalid RESOLUTION_CACHE_TTL_SECONDS: {error}"))
                })
            })
            .transpose()?
            .unwrap_or(60);

        let catalogue_source = optional_env("PERMISSION_CATALOGUE_PATH")
            .map(|path| CatalogueSourceConfig::JsonFile(PathBuf::from(path)))
            .unwrap_or(CatalogueSourceConfig::Builtin);

        let bootstrap_admin = match (
            optional_env("BOOTSTRAP_ADMIN_SUBJECT"),
            optional_tenant_env("BOOTSTRAP_ADMIN_TENANT_ID")?,
        ) {
            (Some(subject), Some(tenant_id)) => Some(BootstrapAdminConfig { subject, tenant_id }),
            (None, None) => None,
            _ => {
                return Err(AppError::Validation(
                    "BOOTSTRAP_ADMIN_SUBJECT and BOOTSTRAP_ADMIN_TENANT_ID must be set together"
                        .to_owned(),
                ));
            }
        };

        Ok(Self {
            migrate_only,
            database_url,
            frontend_url,
            api_host,
            api_port,
            redis_url: optional_env("REDIS_URL"),
            resolution_cache_backend,
            resolution_cache_ttl_seconds,
            catalogue_source,
            bootstrap_admin,
            platform_tenant_id: optional_tenant_env("PLATFORM_TENANT_ID")?,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

/// Parses `RESOLUTION_CACHE_BACKEND`.
///
/// Unset means `in_memory` for a process without a database and `disabled` once
/// `DATABASE_URL` is set, since per-process caches go stale across replicas.
fn parse_resolution_cache_backend(
    value: Option<&str>,
    database_configured: bool,
) -> Result<ResolutionCacheBackend, AppError> {
    match value {
        None if database_configured => Ok(ResolutionCacheBackend::Disabled),
        None | Some("in_memory") => Ok(ResolutionCacheBackend::InMemory),
        Some("redis") => Ok(ResolutionCacheBackend::Redis),
        Some("disabled") => Ok(ResolutionCacheBackend::Disabled),
        Some(other) => Err(AppError::Validation(format!(
            "RESOLUTION_CACHE_BACKEND must be 'in_memory', 'redis' or 'disabled', got '{other}'"
        ))),
    }
}

fn optional_env(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn optional_tenant_env(name: &str) -> Result<Option<TenantId>, AppError> {
    optional_env(name)
        .map(|value| {
            TenantId::from_str(value.as_str())
                .map_err(|error| AppError::Validation(format!("invalid {name}: {error}")))
        })
        .transpose()
}
