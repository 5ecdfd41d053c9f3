//! External table definitions registered in the catalog.

use crate::schema::ColumnDescriptor;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const PARQUET_INPUT_FORMAT: &str =
    "org.apache.hadoop.hive.ql.io.parquet.MapredParquetInputFormat";
pub const PARQUET_OUTPUT_FORMAT: &str =
    "org.apache.hadoop.hive.ql.io.parquet.MapredParquetOutputFormat";
pub const PARQUET_SERDE: &str = "org.apache.hadoop.hive.ql.io.parquet.serde.ParquetHiveSerDe";
pub const EXTERNAL_TABLE: &str = "EXTERNAL_TABLE";

/// A complete table definition. Registering it again replaces the previous
/// definition wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDefinition {
    pub database: String,
    pub name: String,
    pub location: String,
    pub columns: Vec<ColumnDescriptor>,
    pub input_format: String,
    pub output_format: String,
    pub serialization_library: String,
    pub serde_parameters: BTreeMap<String, String>,
    pub compressed: bool,
    pub table_type: String,
}

impl TableDefinition {
    /// Compressed Parquet external table at `location`.
    pub fn parquet(
        database: impl Into<String>,
        name: impl Into<String>,
        location: impl Into<String>,
        columns: Vec<ColumnDescriptor>,
    ) -> Self {
        Self {
            database: database.into(),
            name: name.into(),
            location: location.into(),
            columns,
            input_format: PARQUET_INPUT_FORMAT.to_string(),
            output_format: PARQUET_OUTPUT_FORMAT.to_string(),
            serialization_library: PARQUET_SERDE.to_string(),
            serde_parameters: BTreeMap::new(),
            compressed: true,
            table_type: EXTERNAL_TABLE.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ColumnType;

    #[test]
    fn test_parquet_definition_descriptors() {
        let table = TableDefinition::parquet(
            "acme",
            "sales",
            "s3://acme/sales/",
            vec![ColumnDescriptor::new("id", ColumnType::Bigint)],
        );
        assert!(table.compressed);
        assert_eq!(table.table_type, EXTERNAL_TABLE);
        assert!(table.input_format.ends_with("MapredParquetInputFormat"));
        assert_eq!(table.columns.len(), 1);
    }
}
