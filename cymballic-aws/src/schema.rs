//! Schema strategies that read a stored object.

use crate::traits::ObjectStorage;
use async_trait::async_trait;
use cymballic_core::{
    ColumnDescriptor, ColumnType, EmptySchema, ObjectLocation, SchemaInferenceError,
    SchemaStrategy,
};
use cymballic_export::columns_from_bytes;

/// Downloads the object and reads its Parquet schema.
pub struct ParquetObjectSchema<'a> {
    storage: &'a dyn ObjectStorage,
}

impl<'a> ParquetObjectSchema<'a> {
    pub fn new(storage: &'a dyn ObjectStorage) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl SchemaStrategy for ParquetObjectSchema<'_> {
    fn name(&self) -> &'static str {
        "parquet-read"
    }

    async fn infer(
        &self,
        location: &ObjectLocation,
    ) -> Result<Option<Vec<ColumnDescriptor>>, SchemaInferenceError> {
        let data = self.storage.get_object(location).await?;
        columns_from_bytes(&location.to_string(), data).map(Some)
    }
}

/// Samples one record server-side. The sample carries no type information,
/// so every field is typed `string`.
pub struct SampledRecordSchema<'a> {
    storage: &'a dyn ObjectStorage,
}

impl<'a> SampledRecordSchema<'a> {
    pub fn new(storage: &'a dyn ObjectStorage) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl SchemaStrategy for SampledRecordSchema<'_> {
    fn name(&self) -> &'static str {
        "sample-record"
    }

    async fn infer(
        &self,
        location: &ObjectLocation,
    ) -> Result<Option<Vec<ColumnDescriptor>>, SchemaInferenceError> {
        let record = self.storage.select_first_record(location).await?;
        Ok(record.filter(|record| !record.is_empty()).map(|record| {
            record
                .keys()
                .map(|name| ColumnDescriptor::new(name.as_str(), ColumnType::String))
                .collect()
        }))
    }
}

/// Direct read, then a sampled record, then an empty schema.
pub fn default_strategies(storage: &dyn ObjectStorage) -> Vec<Box<dyn SchemaStrategy + '_>> {
    vec![
        Box::new(ParquetObjectSchema::new(storage)),
        Box::new(SampledRecordSchema::new(storage)),
        Box::new(EmptySchema),
    ]
}
