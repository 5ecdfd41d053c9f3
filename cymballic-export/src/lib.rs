//! Cymballic Export
//!
//! Moves a relational table into a local Parquet file and reads column
//! schemas back out of Parquet data.

pub mod parquet_file;
pub mod postgres;

pub use parquet_file::{columns_from_bytes, columns_from_file, columns_from_schema};
pub use postgres::PostgresExporter;

use async_trait::async_trait;
use cymballic_core::{ColumnDescriptor, ExportError, PostgresConnection};
use std::path::{Path, PathBuf};

/// Result of a table export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedTable {
    pub path: PathBuf,
    pub rows: usize,
    /// Columns inferred from the live export's types.
    pub columns: Vec<ColumnDescriptor>,
}

/// Exports a full table to a Parquet file at `destination`.
#[async_trait]
pub trait TableExporter: Send + Sync {
    async fn export(
        &self,
        connection: &PostgresConnection,
        table: &str,
        destination: &Path,
    ) -> Result<ExportedTable, ExportError>;
}
