use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use qryvanta_core::{AppError, AppResult};
use qryvanta_domain::{
    AdminPermission, CatalogueDefinition, PermissionCatalogue, PermissionNode, PermissionTreeNode,
};
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Port supplying the static catalogue definition.
#[async_trait]
pub trait CatalogueSource: Send + Sync {
    /// Reads the current definition.
    async fn load_definition(&self) -> AppResult<CatalogueDefinition>;

    /// Describes the source for operator logs.
    fn describe(&self) -> String;
}

/// Holder of the current catalogue snapshot.
///
/// Readers clone an `Arc` of the snapshot and never observe a partially built
/// catalogue; loads publish a fully built value in one pointer swap.
#[derive(Clone)]
pub struct PermissionCatalogueService {
    source: Arc<dyn CatalogueSource>,
    current: Arc<RwLock<Option<Arc<PermissionCatalogue>>>>,
    last_version: Arc<AtomicU64>,
    load_lock: Arc<Mutex<()>>,
}

impl PermissionCatalogueService {
    /// Creates a service not loaded yet.
    #[must_use]
    pub fn new(source: Arc<dyn CatalogueSource>) -> Self {
        Self {
            source,
            current: Arc::new(RwLock::new(None)),
            last_version: Arc::new(AtomicU64::new(0)),
            load_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Reads the definition from the source and publishes it.
    ///
    /// On failure the previous snapshot, if any, stays in place.
    pub async fn load(&self) -> AppResult<Arc<PermissionCatalogue>> {
        let _guard = self.load_lock.lock().await;
        let definition = self.source.load_definition().await?;
        self.publish(&definition, self.source.describe().as_str())
    }

    /// Publishes an in-memory definition directly.
    pub async fn load_definition(
        &self,
        definition: &CatalogueDefinition,
    ) -> AppResult<Arc<PermissionCatalogue>> {
        let _guard = self.load_lock.lock().await;
        self.publish(definition, "inline definition")
    }

    /// Returns the current snapshot or `CatalogueNotReady`.
    pub fn snapshot(&self) -> AppResult<Arc<PermissionCatalogue>> {
        self.current
            .read()
            .map_err(|_| AppError::Internal("permission catalogue lock poisoned".to_owned()))?
            .clone()
            .ok_or(AppError::CatalogueNotReady)
    }

    /// Returns whether a catalogue has been published.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.snapshot().is_ok()
    }

    /// Returns the forest in definition order.
    pub fn get_tree(&self) -> AppResult<Vec<PermissionTreeNode>> {
        Ok(self.snapshot()?.tree().to_vec())
    }

    /// Returns every id in depth-first pre-order.
    pub fn get_all(&self) -> AppResult<Vec<String>> {
        Ok(self.snapshot()?.all().to_vec())
    }

    /// Returns whether the id belongs to the current catalogue.
    pub fn exists(&self, id: &str) -> AppResult<bool> {
        Ok(self.snapshot()?.exists(id))
    }

    /// Returns one node by id.
    pub fn get_node(&self, id: &str) -> AppResult<PermissionNode> {
        self.snapshot()?.node(id).cloned()
    }

    fn publish(
        &self,
        definition: &CatalogueDefinition,
        origin: &str,
    ) -> AppResult<Arc<PermissionCatalogue>> {
        let version = self.last_version.load(Ordering::SeqCst) + 1;
        let catalogue = Arc::new(PermissionCatalogue::load(definition, version)?);

        let missing: Vec<&str> = AdminPermission::all()
            .iter()
            .map(AdminPermission::as_str)
            .filter(|id| !catalogue.exists(id))
            .collect();
        if !missing.is_empty() {
            warn!(
                missing = %missing.join(","),
                "permission catalogue lacks administrative permissions"
            );
        }

        *self
            .current
            .write()
            .map_err(|_| AppError::Internal("permission catalogue lock poisoned".to_owned()))? =
            Some(catalogue.clone());
        self.last_version.store(version, Ordering::SeqCst);

        info!(
            version,
            permissions = catalogue.len(),
            origin,
            "permission catalogue published"
        );

        Ok(catalogue)
    }
}
