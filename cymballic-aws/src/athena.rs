//! Athena adapter for [`DataCatalogs`].

use crate::traits::{DataCatalogSpec, DataCatalogs};
use crate::util::call_failed;
use async_trait::async_trait;
use aws_sdk_athena::error::ProvideErrorMetadata;
use aws_sdk_athena::types::DataCatalogType;
use aws_sdk_athena::Client;
use cymballic_core::{RemoteError, RemoteResult};

/// Catalog parameter naming the account whose Glue catalog is queried.
pub const CATALOG_ID_PARAMETER: &str = "catalog-id";

#[derive(Debug, Clone)]
pub struct AthenaCatalogs {
    client: Client,
}

impl AthenaCatalogs {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

/// Athena reports a duplicate catalog as a generic invalid request.
fn is_duplicate_message(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    message.contains("already exists") || message.contains("already been created")
}

#[async_trait]
impl DataCatalogs for AthenaCatalogs {
    async fn create_data_catalog(&self, spec: &DataCatalogSpec) -> RemoteResult<()> {
        let result = self
            .client
            .create_data_catalog()
            .name(&spec.name)
            .r#type(DataCatalogType::Glue)
            .description(&spec.description)
            .parameters(CATALOG_ID_PARAMETER, &spec.source_account_id)
            .send()
            .await;
        match result {
            Ok(_) => Ok(()),
            Err(err) => match err.as_service_error() {
                Some(service)
                    if service.is_invalid_request_exception()
                        && service.message().is_some_and(is_duplicate_message) =>
                {
                    Err(RemoteError::already_exists(format!("data catalog {}", spec.name)))
                }
                _ => Err(call_failed("CreateDataCatalog", &err)),
            },
        }
    }

    async fn delete_data_catalog(&self, name: &str) -> RemoteResult<()> {
        self.client
            .delete_data_catalog()
            .name(name)
            .send()
            .await
            .map_err(|e| call_failed("DeleteDataCatalog", &e))?;
        Ok(())
    }
}
