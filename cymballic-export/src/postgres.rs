//! Full-table Postgres export.
//!
//! Column types are discovered by preparing `SELECT * FROM <table>`. Integer,
//! floating point, boolean and character columns are decoded natively; every
//! other column is cast to `text` in the fetch query and exported as a string.

use crate::parquet_file::{columns_from_schema, write_batch};
use crate::{ExportedTable, TableExporter};
use arrow::array::{
    ArrayRef, BooleanArray, Float32Array, Float64Array, Int16Array, Int32Array, Int64Array,
    StringArray,
};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use async_trait::async_trait;
use cymballic_core::{format_elapsed, ExportError, PostgresConnection};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio_postgres::types::Type;
use tokio_postgres::{Client, NoTls, Row};

/// Exports Postgres tables over a plain connection.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresExporter;

impl PostgresExporter {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TableExporter for PostgresExporter {
    async fn export(
        &self,
        connection: &PostgresConnection,
        table: &str,
        destination: &Path,
    ) -> Result<ExportedTable, ExportError> {
        let started = Instant::now();
        let client = connect(connection).await?;
        tracing::info!(
            host = %connection.host,
            database = %connection.database,
            "Successfully connected to the database"
        );

        let query_error = |e: tokio_postgres::Error| ExportError::Query {
            table: table.to_string(),
            reason: e.to_string(),
        };

        let statement = client
            .prepare(&format!("SELECT * FROM {table}"))
            .await
            .map_err(query_error)?;
        let columns: Vec<SourceColumn> = statement
            .columns()
            .iter()
            .map(|column| SourceColumn::new(column.name(), column.type_()))
            .collect();

        let rows = client
            .query(&fetch_query(table, &columns), &[])
            .await
            .map_err(query_error)?;
        let batch = build_batch(&columns, &rows).map_err(|reason| ExportError::Query {
            table: table.to_string(),
            reason,
        })?;

        write_batch(destination, &batch)?;
        let exported = columns_from_schema(batch.schema().as_ref());
        tracing::info!(
            table,
            rows = rows.len(),
            path = %destination.display(),
            elapsed = %format_elapsed(started.elapsed()),
            "Exported table to parquet"
        );

        Ok(ExportedTable {
            path: destination.to_path_buf(),
            rows: rows.len(),
            columns: exported,
        })
    }
}

async fn connect(connection: &PostgresConnection) -> Result<Client, ExportError> {
    let mut config = tokio_postgres::Config::new();
    config
        .host(&connection.host)
        .port(connection.port)
        .dbname(&connection.database)
        .user(&connection.username)
        .password(&connection.password);

    let (client, conn) = config
        .connect(NoTls)
        .await
        .map_err(|e| ExportError::Connect {
            host: connection.host.clone(),
            database: connection.database.clone(),
            reason: e.to_string(),
        })?;

    tokio::spawn(async move {
        if let Err(err) = conn.await {
            tracing::warn!(error = %err, "Postgres connection closed with error");
        }
    });

    Ok(client)
}

// ============================================================================
// COLUMN DECODING
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    Bool,
    Text,
}

impl ColumnKind {
    /// Natively decoded kind, or `None` when the column must be cast to text.
    fn native(ty: &Type) -> Option<Self> {
        match *ty {
            Type::INT2 => Some(ColumnKind::Int16),
            Type::INT4 => Some(ColumnKind::Int32),
            Type::INT8 => Some(ColumnKind::Int64),
            Type::FLOAT4 => Some(ColumnKind::Float32),
            Type::FLOAT8 => Some(ColumnKind::Float64),
            Type::BOOL => Some(ColumnKind::Bool),
            Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME => Some(ColumnKind::Text),
            _ => None,
        }
    }

    fn data_type(&self) -> DataType {
        match self {
            ColumnKind::Int16 => DataType::Int16,
            ColumnKind::Int32 => DataType::Int32,
            ColumnKind::Int64 => DataType::Int64,
            ColumnKind::Float32 => DataType::Float32,
            ColumnKind::Float64 => DataType::Float64,
            ColumnKind::Bool => DataType::Boolean,
            ColumnKind::Text => DataType::Utf8,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct SourceColumn {
    name: String,
    kind: ColumnKind,
    cast_to_text: bool,
}

impl SourceColumn {
    fn new(name: &str, ty: &Type) -> Self {
        match ColumnKind::native(ty) {
            Some(kind) => Self {
                name: name.to_string(),
                kind,
                cast_to_text: false,
            },
            None => Self {
                name: name.to_string(),
                kind: ColumnKind::Text,
                cast_to_text: true,
            },
        }
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn fetch_query(table: &str, columns: &[SourceColumn]) -> String {
    if columns.is_empty() {
        return format!("SELECT * FROM {table}");
    }
    let select_list: Vec<String> = columns
        .iter()
        .map(|column| {
            let ident = quote_ident(&column.name);
            if column.cast_to_text {
                format!("{ident}::text AS {ident}")
            } else {
                ident
            }
        })
        .collect();
    format!("SELECT {} FROM {table}", select_list.join(", "))
}

enum ColumnValues {
    Int16(Vec<Option<i16>>),
    Int32(Vec<Option<i32>>),
    Int64(Vec<Option<i64>>),
    Float32(Vec<Option<f32>>),
    Float64(Vec<Option<f64>>),
    Bool(Vec<Option<bool>>),
    Text(Vec<Option<String>>),
}

impl ColumnValues {
    fn with_capacity(kind: ColumnKind, capacity: usize) -> Self {
        match kind {
            ColumnKind::Int16 => ColumnValues::Int16(Vec::with_capacity(capacity)),
            ColumnKind::Int32 => ColumnValues::Int32(Vec::with_capacity(capacity)),
            ColumnKind::Int64 => ColumnValues::Int64(Vec::with_capacity(capacity)),
            ColumnKind::Float32 => ColumnValues::Float32(Vec::with_capacity(capacity)),
            ColumnKind::Float64 => ColumnValues::Float64(Vec::with_capacity(capacity)),
            ColumnKind::Bool => ColumnValues::Bool(Vec::with_capacity(capacity)),
            ColumnKind::Text => ColumnValues::Text(Vec::with_capacity(capacity)),
        }
    }

    fn push(&mut self, row: &Row, idx: usize) -> Result<(), tokio_postgres::Error> {
        match self {
            ColumnValues::Int16(values) => values.push(row.try_get(idx)?),
            ColumnValues::Int32(values) => values.push(row.try_get(idx)?),
            ColumnValues::Int64(values) => values.push(row.try_get(idx)?),
            ColumnValues::Float32(values) => values.push(row.try_get(idx)?),
            ColumnValues::Float64(values) => values.push(row.try_get(idx)?),
            ColumnValues::Bool(values) => values.push(row.try_get(idx)?),
            ColumnValues::Text(values) => values.push(row.try_get(idx)?),
        }
        Ok(())
    }

    fn into_array(self) -> ArrayRef {
        match self {
            ColumnValues::Int16(values) => Arc::new(Int16Array::from(values)),
            ColumnValues::Int32(values) => Arc::new(Int32Array::from(values)),
            ColumnValues::Int64(values) => Arc::new(Int64Array::from(values)),
            ColumnValues::Float32(values) => Arc::new(Float32Array::from(values)),
            ColumnValues::Float64(values) => Arc::new(Float64Array::from(values)),
            ColumnValues::Bool(values) => Arc::new(BooleanArray::from(values)),
            ColumnValues::Text(values) => Arc::new(StringArray::from(values)),
        }
    }
}

fn build_batch(columns: &[SourceColumn], rows: &[Row]) -> Result<RecordBatch, String> {
    let schema = Arc::new(Schema::new(
        columns
            .iter()
            .map(|column| Field::new(column.name.as_str(), column.kind.data_type(), true))
            .collect::<Vec<_>>(),
    ));

    let mut values: Vec<ColumnValues> = columns
        .iter()
        .map(|column| ColumnValues::with_capacity(column.kind, rows.len()))
        .collect();
    for row in rows {
        for (idx, column) in values.iter_mut().enumerate() {
            column.push(row, idx).map_err(|e| e.to_string())?;
        }
    }

    let arrays: Vec<ArrayRef> = values.into_iter().map(ColumnValues::into_array).collect();
    let options = RecordBatchOptions::new().with_row_count(Some(rows.len()));
    RecordBatch::try_new_with_options(schema, arrays, &options).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_kinds() {
        assert_eq!(ColumnKind::native(&Type::INT8), Some(ColumnKind::Int64));
        assert_eq!(ColumnKind::native(&Type::FLOAT4), Some(ColumnKind::Float32));
        assert_eq!(ColumnKind::native(&Type::VARCHAR), Some(ColumnKind::Text));
        assert_eq!(ColumnKind::native(&Type::NUMERIC), None);
        assert_eq!(ColumnKind::native(&Type::TIMESTAMPTZ), None);
    }

    #[test]
    fn test_unsupported_columns_are_cast_to_text() {
        let columns = vec![
            SourceColumn::new("id", &Type::INT8),
            SourceColumn::new("created_at", &Type::TIMESTAMPTZ),
            SourceColumn::new("odd\"name", &Type::NUMERIC),
        ];
        assert!(columns[1].cast_to_text);
        assert_eq!(columns[1].kind, ColumnKind::Text);
        assert_eq!(
            fetch_query("orders", &columns),
            "SELECT \"id\", \"created_at\"::text AS \"created_at\", \
             \"odd\"\"name\"::text AS \"odd\"\"name\" FROM orders"
        );
    }

    #[test]
    fn test_empty_batch_keeps_schema() {
        let columns = vec![
            SourceColumn::new("id", &Type::INT4),
            SourceColumn::new("price", &Type::FLOAT8),
            SourceColumn::new("note", &Type::TEXT),
        ];
        let batch = build_batch(&columns, &[]).unwrap();
        assert_eq!(batch.num_rows(), 0);
        let exported = columns_from_schema(batch.schema().as_ref());
        let types: Vec<_> = exported.iter().map(|c| c.column_type.as_str()).collect();
        assert_eq!(types, vec!["bigint", "double", "string"]);
    }
}
