use std::collections::BTreeSet;

use qryvanta_core::{AppError, AppResult};
use qryvanta_domain::ValidationResult;
use tracing::warn;

use crate::PermissionCatalogueService;

/// Classifies permission ids against the current catalogue.
///
/// Write paths reject unknown ids; read paths drop them.
#[derive(Clone)]
pub struct PermissionValidationService {
    catalogue: PermissionCatalogueService,
}

/// Outcome of filtering ids on a read path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct KnownPermissions {
    pub(crate) kept: BTreeSet<String>,
    pub(crate) dropped: Vec<String>,
    pub(crate) catalogue_version: u64,
}

impl PermissionValidationService {
    /// Creates a validation service over the catalogue holder.
    #[must_use]
    pub fn new(catalogue: PermissionCatalogueService) -> Self {
        Self { catalogue }
    }

    /// Partitions ids into valid and invalid ids, preserving input order.
    pub fn validate<I, S>(&self, ids: I) -> AppResult<ValidationResult>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(self.catalogue.snapshot()?.validate(ids))
    }

    /// Fails with `InvalidPermissionIds` when any id is unknown.
    pub fn require_valid<I, S>(&self, ids: I) -> AppResult<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let result = self.validate(ids)?;
        if result.is_valid() {
            return Ok(());
        }

        Err(AppError::InvalidPermissionIds(result.invalid_ids))
    }

    /// Returns the version of the catalogue currently enforced.
    pub fn catalogue_version(&self) -> AppResult<u64> {
        Ok(self.catalogue.snapshot()?.version())
    }

    /// Returns the load version and content fingerprint of the current catalogue.
    pub(crate) fn catalogue_identity(&self) -> AppResult<(u64, String)> {
        let catalogue = self.catalogue.snapshot()?;
        Ok((catalogue.version(), catalogue.fingerprint().to_owned()))
    }

    pub(crate) fn drop_unknown(&self, ids: BTreeSet<String>) -> AppResult<KnownPermissions> {
        let catalogue = self.catalogue.snapshot()?;
        let (kept, dropped): (BTreeSet<String>, BTreeSet<String>) =
            ids.into_iter().partition(|id| catalogue.exists(id));
        let dropped: Vec<String> = dropped.into_iter().collect();

        if !dropped.is_empty() {
            warn!(
                catalogue_version = catalogue.version(),
                dropped = %dropped.join(","),
                "dropping permission ids unknown to the catalogue"
            );
        }

        Ok(KnownPermissions {
            kept,
            dropped,
            catalogue_version: catalogue.version(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::Arc;

    use qryvanta_core::AppError;

    use crate::PermissionCatalogueService;
    use crate::test_support::{StaticCatalogueSource, loaded_catalogue};

    use super::PermissionValidationService;

    #[tokio::test]
    async fn validate_partitions_known_and_unknown_ids() {
        let service = PermissionValidationService::new(loaded_catalogue().await);

        let result = service.validate(["project.view", "project.archive"]);
        assert!(result.is_ok());
        let Ok(result) = result else {
            return;
        };
        assert_eq!(result.valid_ids, vec!["project.view".to_owned()]);
        assert_eq!(result.invalid_ids, vec!["project.archive".to_owned()]);
    }

    #[tokio::test]
    async fn validate_keeps_input_order_within_partitions() {
        let service = PermissionValidationService::new(loaded_catalogue().await);

        let result = service.validate(["z.unknown", "project.delete", "a.unknown", "project"]);
        assert_eq!(
            result.ok(),
            Some(qryvanta_domain::ValidationResult {
                valid_ids: vec!["project.delete".to_owned(), "project".to_owned()],
                invalid_ids: vec!["z.unknown".to_owned(), "a.unknown".to_owned()],
            })
        );
    }

    #[tokio::test]
    async fn validate_before_load_reports_not_ready() {
        let catalogue = PermissionCatalogueService::new(Arc::new(StaticCatalogueSource::new(
            crate::test_support::project_catalogue_definition(),
        )));
        let service = PermissionValidationService::new(catalogue);

        assert!(matches!(
            service.validate(["project.view"]),
            Err(AppError::CatalogueNotReady)
        ));
    }

    #[tokio::test]
    async fn require_valid_lists_invalid_ids() {
        let service = PermissionValidationService::new(loaded_catalogue().await);

        let result = service.require_valid(["project.view", "project.archive", "client.merge"]);
        assert!(matches!(
            result,
            Err(AppError::InvalidPermissionIds(ids))
                if ids == vec!["project.archive".to_owned(), "client.merge".to_owned()]
        ));
        assert!(service.require_valid(["project.view"]).is_ok());
    }

    #[tokio::test]
    async fn drop_unknown_splits_ids() {
        let service = PermissionValidationService::new(loaded_catalogue().await);

        let outcome = service.drop_unknown(BTreeSet::from([
            "project.view".to_owned(),
            "project.archive".to_owned(),
        ]));
        assert!(outcome.is_ok());
        let Ok(outcome) = outcome else {
            return;
        };
        assert_eq!(outcome.kept, BTreeSet::from(["project.view".to_owned()]));
        assert_eq!(outcome.dropped, vec!["project.archive".to_owned()]);
        assert_eq!(outcome.catalogue_version, 1);
    }
}
