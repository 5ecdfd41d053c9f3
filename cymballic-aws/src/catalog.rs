//! Idempotent registration of a cross-account query catalog.

use crate::traits::{DataCatalogSpec, DataCatalogs};
use cymballic_core::naming::CustomerNames;
use cymballic_core::RemoteResult;

/// Outcome of [`register_catalog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogRegistration {
    Created,
    Recreated,
}

/// Data catalog pointing at a customer's source account.
pub fn customer_catalog(names: &CustomerNames, source_account_id: &str) -> DataCatalogSpec {
    DataCatalogSpec {
        name: names.catalog.clone(),
        description: format!("Cross-account Glue catalog for {}", names.customer),
        source_account_id: source_account_id.to_string(),
    }
}

/// Create the catalog. An existing catalog is deleted and created again
/// exactly once; a failed delete is returned without recreating.
pub async fn register_catalog(
    catalogs: &dyn DataCatalogs,
    spec: &DataCatalogSpec,
) -> RemoteResult<CatalogRegistration> {
    match catalogs.create_data_catalog(spec).await {
        Ok(()) => {
            tracing::info!(
                catalog = %spec.name,
                source_account = %spec.source_account_id,
                "Created data catalog"
            );
            Ok(CatalogRegistration::Created)
        }
        Err(err) if err.is_already_exists() => {
            tracing::info!(catalog = %spec.name, "Data catalog exists, recreating it");
            catalogs.delete_data_catalog(&spec.name).await?;
            catalogs.create_data_catalog(spec).await?;
            tracing::info!(
                catalog = %spec.name,
                source_account = %spec.source_account_id,
                "Recreated data catalog"
            );
            Ok(CatalogRegistration::Recreated)
        }
        Err(err) => Err(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_customer_catalog_spec() {
        let spec = customer_catalog(&CustomerNames::new("Acme"), "444455556666");
        assert_eq!(spec.name, "external-cat-acme");
        assert_eq!(spec.description, "Cross-account Glue catalog for acme");
        assert_eq!(spec.source_account_id, "444455556666");
    }
}
