//! Glue adapter for [`MetadataCatalog`].

use crate::traits::MetadataCatalog;
use crate::util::call_failed;
use async_trait::async_trait;
use aws_sdk_glue::types::{Column, DatabaseInput, SerDeInfo, StorageDescriptor, TableInput};
use aws_sdk_glue::Client;
use cymballic_core::{RemoteError, RemoteResult, TableDefinition};

#[derive(Debug, Clone)]
pub struct GlueCatalog {
    client: Client,
}

impl GlueCatalog {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

/// Translate a table definition into the SDK input shape.
fn table_input(table: &TableDefinition) -> RemoteResult<TableInput> {
    let columns = table
        .columns
        .iter()
        .map(|column| {
            Column::builder()
                .name(&column.name)
                .r#type(column.column_type.as_str())
                .build()
                .map_err(|e| call_failed("BuildTableInput", &e))
        })
        .collect::<RemoteResult<Vec<_>>>()?;

    let serde_info = SerDeInfo::builder()
        .serialization_library(&table.serialization_library)
        .set_parameters(Some(
            table
                .serde_parameters
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        ))
        .build();

    let storage = StorageDescriptor::builder()
        .set_columns(Some(columns))
        .location(&table.location)
        .input_format(&table.input_format)
        .output_format(&table.output_format)
        .compressed(table.compressed)
        .serde_info(serde_info)
        .build();

    TableInput::builder()
        .name(&table.name)
        .storage_descriptor(storage)
        .table_type(&table.table_type)
        .build()
        .map_err(|e| call_failed("BuildTableInput", &e))
}

#[async_trait]
impl MetadataCatalog for GlueCatalog {
    async fn create_database(&self, database: &str) -> RemoteResult<()> {
        let input = DatabaseInput::builder()
            .name(database)
            .build()
            .map_err(|e| call_failed("BuildDatabaseInput", &e))?;
        match self.client.create_database().database_input(input).send().await {
            Ok(_) => Ok(()),
            Err(err) => match err.as_service_error() {
                Some(service) if service.is_already_exists_exception() => {
                    Err(RemoteError::already_exists(format!("database {database}")))
                }
                _ => Err(call_failed("CreateDatabase", &err)),
            },
        }
    }

    async fn create_table(&self, table: &TableDefinition) -> RemoteResult<()> {
        let input = table_input(table)?;
        let result = self
            .client
            .create_table()
            .database_name(&table.database)
            .table_input(input)
            .send()
            .await;
        match result {
            Ok(_) => Ok(()),
            Err(err) => match err.as_service_error() {
                Some(service) if service.is_already_exists_exception() => Err(
                    RemoteError::already_exists(format!("table {}.{}", table.database, table.name)),
                ),
                _ => Err(call_failed("CreateTable", &err)),
            },
        }
    }

    async fn update_table(&self, table: &TableDefinition) -> RemoteResult<()> {
        let input = table_input(table)?;
        self.client
            .update_table()
            .database_name(&table.database)
            .table_input(input)
            .send()
            .await
            .map_err(|err| match err.as_service_error() {
                Some(service) if service.is_entity_not_found_exception() => {
                    RemoteError::not_found(format!("table {}.{}", table.database, table.name))
                }
                _ => call_failed("UpdateTable", &err),
            })?;
        Ok(())
    }

    async fn get_resource_policy(&self) -> RemoteResult<Option<String>> {
        match self.client.get_resource_policy().send().await {
            Ok(output) => Ok(output.policy_in_json().map(str::to_string)),
            Err(err) => match err.as_service_error() {
                Some(service) if service.is_entity_not_found_exception() => Ok(None),
                _ => Err(call_failed("GetResourcePolicy", &err)),
            },
        }
    }

    async fn put_resource_policy(&self, policy: &str) -> RemoteResult<()> {
        self.client
            .put_resource_policy()
            .policy_in_json(policy)
            .send()
            .await
            .map_err(|e| call_failed("PutResourcePolicy", &e))?;
        Ok(())
    }
}
