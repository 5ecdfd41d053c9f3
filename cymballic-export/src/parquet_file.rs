//! Parquet encoding and schema inspection.

use arrow::datatypes::{DataType, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use bytes::Bytes;
use cymballic_core::{columns_from_native, ColumnDescriptor, ExportError, SchemaInferenceError};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use parquet::file::reader::ChunkReader;
use std::fs::File;
use std::path::Path;

/// Native type name used for catalog type inference (`Int64`, `Utf8`, ...).
pub fn native_type_name(data_type: &DataType) -> String {
    data_type.to_string()
}

/// Catalog columns for every field of an Arrow schema, in field order.
pub fn columns_from_schema(schema: &Schema) -> Vec<ColumnDescriptor> {
    columns_from_native(
        schema
            .fields()
            .iter()
            .map(|field| (field.name().clone(), native_type_name(field.data_type()))),
    )
}

fn read_schema<R: ChunkReader + 'static>(reader: R) -> parquet::errors::Result<SchemaRef> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(reader)?;
    Ok(builder.schema().clone())
}

/// Columns of an in-memory Parquet file.
pub fn columns_from_bytes(
    location: &str,
    bytes: Bytes,
) -> Result<Vec<ColumnDescriptor>, SchemaInferenceError> {
    let schema = read_schema(bytes).map_err(|e| SchemaInferenceError::Unreadable {
        location: location.to_string(),
        reason: e.to_string(),
    })?;
    Ok(columns_from_schema(&schema))
}

/// Columns of a Parquet file on local disk.
pub fn columns_from_file(path: &Path) -> Result<Vec<ColumnDescriptor>, SchemaInferenceError> {
    let unreadable = |reason: String| SchemaInferenceError::Unreadable {
        location: path.display().to_string(),
        reason,
    };
    let file = File::open(path).map_err(|e| unreadable(e.to_string()))?;
    let schema = read_schema(file).map_err(|e| unreadable(e.to_string()))?;
    Ok(columns_from_schema(&schema))
}

/// Write `batch` as a Snappy-compressed Parquet file, replacing any file at `path`.
pub fn write_batch(path: &Path, batch: &RecordBatch) -> Result<(), ExportError> {
    let write_error = |reason: String| ExportError::Write {
        path: path.display().to_string(),
        reason,
    };
    let file = File::create(path).map_err(|e| write_error(e.to_string()))?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))
        .map_err(|e| write_error(e.to_string()))?;
    writer.write(batch).map_err(|e| write_error(e.to_string()))?;
    writer.close().map_err(|e| write_error(e.to_string()))?;
    Ok(())
}
