//! Column schema inference.
//!
//! Native column type names (Arrow data types of a Parquet file or of a live
//! export) are mapped to the three catalog types by substring match. When no
//! live export is available the schema comes from an ordered list of
//! [`SchemaStrategy`] implementations; the first one to produce a result wins.

use crate::error::SchemaInferenceError;
use crate::naming::ObjectLocation;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Catalog column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    String,
    Double,
    Bigint,
}

impl ColumnType {
    /// Map a native type name. The checks run in a fixed order, so a name
    /// matching several substrings resolves to the first match.
    pub fn from_native(native: &str) -> Self {
        let native = native.to_ascii_lowercase();
        if native.contains("object") {
            ColumnType::String
        } else if native.contains("float") {
            ColumnType::Double
        } else if native.contains("int") {
            ColumnType::Bigint
        } else {
            ColumnType::String
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::String => "string",
            ColumnType::Double => "double",
            ColumnType::Bigint => "bigint",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One column of a catalog table, serialized the way the catalog expects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Type")]
    pub column_type: ColumnType,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }
}

/// Build column descriptors from `(name, native type name)` pairs, keeping order.
pub fn columns_from_native<I, N, T>(columns: I) -> Vec<ColumnDescriptor>
where
    I: IntoIterator<Item = (N, T)>,
    N: Into<String>,
    T: AsRef<str>,
{
    columns
        .into_iter()
        .map(|(name, native)| ColumnDescriptor::new(name, ColumnType::from_native(native.as_ref())))
        .collect()
}

// ============================================================================
// FALLBACK CHAIN
// ============================================================================

/// One way of discovering the columns of a stored dataset.
#[async_trait]
pub trait SchemaStrategy: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// `Ok(None)` means the strategy had nothing to offer; the chain moves on.
    async fn infer(
        &self,
        location: &ObjectLocation,
    ) -> Result<Option<Vec<ColumnDescriptor>>, SchemaInferenceError>;
}

/// Terminal strategy: an empty column list, leaving the catalog to infer the
/// columns on first query.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptySchema;

#[async_trait]
impl SchemaStrategy for EmptySchema {
    fn name(&self) -> &'static str {
        "empty"
    }

    async fn infer(
        &self,
        location: &ObjectLocation,
    ) -> Result<Option<Vec<ColumnDescriptor>>, SchemaInferenceError> {
        tracing::info!(
            %location,
            "Could not read schema from the object (expected in cross-account setups); \
             creating table with empty schema to let the catalog infer it"
        );
        Ok(Some(Vec::new()))
    }
}

/// Run the strategies in order and return the first result. Strategy failures
/// are logged and skipped; an exhausted chain yields an empty schema.
pub async fn infer_schema(
    strategies: &[Box<dyn SchemaStrategy + '_>],
    location: &ObjectLocation,
) -> Vec<ColumnDescriptor> {
    for strategy in strategies {
        match strategy.infer(location).await {
            Ok(Some(columns)) => {
                tracing::info!(
                    strategy = strategy.name(),
                    columns = columns.len(),
                    "Inferred schema"
                );
                return columns;
            }
            Ok(None) => {
                tracing::info!(strategy = strategy.name(), %location, "No schema available");
            }
            Err(err) => {
                tracing::info!(
                    strategy = strategy.name(),
                    %location,
                    error = %err,
                    "Could not read schema"
                );
            }
        }
    }
    Vec::new()
}
