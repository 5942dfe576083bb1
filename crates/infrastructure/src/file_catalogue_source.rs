use std::path::PathBuf;

use async_trait::async_trait;
use qryvanta_application::CatalogueSource;
use qryvanta_core::{AppError, AppResult};
use qryvanta_domain::CatalogueDefinition;

/// Catalogue source reading a JSON definition file on every load.
#[derive(Debug, Clone)]
pub struct JsonFileCatalogueSource {
    path: PathBuf,
}

impl JsonFileCatalogueSource {
    /// Creates a source for the file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CatalogueSource for JsonFileCatalogueSource {
    async fn load_definition(&self) -> AppResult<CatalogueDefinition> {
        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|error| {
                AppError::CatalogueLoad(format!(
                    "failed to read '{}': {error}",
                    self.path.display()
                ))
            })?;

        serde_json::from_str(&contents).map_err(|error| {
            AppError::CatalogueLoad(format!(
                "failed to parse '{}': {error}",
                self.path.display()
            ))
        })
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}

/// Catalogue source serving the compiled-in definition.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinCatalogueSource;

#[async_trait]
impl CatalogueSource for BuiltinCatalogueSource {
    async fn load_definition(&self) -> AppResult<CatalogueDefinition> {
        Ok(qryvanta_domain::builtin_catalogue_definition())
    }

    fn describe(&self) -> String {
        "built-in catalogue".to_owned()
    }
}
