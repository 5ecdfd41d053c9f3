//! Idempotent catalog table registration.

use crate::traits::MetadataCatalog;
use cymballic_core::{RemoteResult, TableDefinition};

/// Outcome of [`register_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableRegistration {
    Created,
    Updated,
}

/// Create the table's database if needed, then create the table or replace
/// the existing definition.
pub async fn register_table(
    catalog: &dyn MetadataCatalog,
    table: &TableDefinition,
) -> RemoteResult<TableRegistration> {
    match catalog.create_database(&table.database).await {
        Ok(()) => tracing::info!(database = %table.database, "Created database"),
        Err(err) if err.is_already_exists() => {
            tracing::info!(database = %table.database, "Database already exists")
        }
        Err(err) => return Err(err),
    }

    match catalog.create_table(table).await {
        Ok(()) => {
            tracing::info!(
                database = %table.database,
                table = %table.name,
                columns = table.columns.len(),
                "Created table"
            );
            Ok(TableRegistration::Created)
        }
        Err(err) if err.is_already_exists() => {
            catalog.update_table(table).await?;
            tracing::info!(
                database = %table.database,
                table = %table.name,
                columns = table.columns.len(),
                "Updated table"
            );
            Ok(TableRegistration::Updated)
        }
        Err(err) => Err(err),
    }
}
