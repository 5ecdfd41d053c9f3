//! Shared fixtures: configurations and Parquet data.

use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use bytes::Bytes;
use cymballic_core::{CustomerConfig, GlobalConfig};
use parquet::arrow::ArrowWriter;
use serde_json::{json, Map, Value};
use std::sync::Arc;

/// Host account of [`global_config`].
pub const HOST_ACCOUNT: &str = "111122223333";

/// Account reported by mock session identities unless overridden.
pub const DEFAULT_CALLER_ACCOUNT: &str = "444455556666";

pub fn global_config() -> GlobalConfig {
    GlobalConfig {
        aws_region: "us-east-1".to_string(),
        aws_account_id: HOST_ACCOUNT.to_string(),
        aws_account_profile: "host-admin".to_string(),
        iam_service_role: "athena-service".to_string(),
        iam_sso_role: "analyst-sso".to_string(),
    }
}

pub fn global_config_json() -> String {
    json!({
        "aws_region": "us-east-1",
        "aws_account_id": HOST_ACCOUNT,
        "aws_account_profile": "host-admin",
        "iam_service_role": "athena-service",
        "iam_sso_role": "analyst-sso",
    })
    .to_string()
}

pub fn parquet_customer_json(customer: &str, profile: &str) -> String {
    json!({
        "customer": customer,
        "type": "parquet",
        "aws_profile": profile,
    })
    .to_string()
}

pub fn postgres_customer_json(customer: &str, profile: &str) -> String {
    json!({
        "customer": customer,
        "type": "postgres",
        "aws_profile": profile,
        "host": "db.internal",
        "database": "warehouse",
        "username": "reader",
        "password": "hunter2",
    })
    .to_string()
}

pub fn parquet_customer(customer: &str, profile: &str) -> CustomerConfig {
    CustomerConfig {
        customer: customer.to_string(),
        data_type: "parquet".to_string(),
        aws_profile: profile.to_string(),
        host: None,
        port: None,
        database: None,
        username: None,
        password: None,
    }
}

pub fn postgres_customer(customer: &str, profile: &str) -> CustomerConfig {
    CustomerConfig {
        customer: customer.to_string(),
        data_type: "postgres".to_string(),
        aws_profile: profile.to_string(),
        host: Some("db.internal".to_string()),
        port: None,
        database: Some("warehouse".to_string()),
        username: Some("reader".to_string()),
        password: Some("hunter2".to_string()),
    }
}

/// Three rows of `id: Int64, amount: Float64, region: Utf8`.
pub fn sample_batch() -> RecordBatch {
    let schema = Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("amount", DataType::Float64, true),
        Field::new("region", DataType::Utf8, true),
    ]));
    let columns: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from(vec![1, 2, 3])),
        Arc::new(Float64Array::from(vec![Some(12.5), None, Some(3.0)])),
        Arc::new(StringArray::from(vec![Some("emea"), Some("apac"), None])),
    ];
    match RecordBatch::try_new(schema, columns) {
        Ok(batch) => batch,
        Err(e) => panic!("sample batch is well formed: {e}"),
    }
}

/// `batch` encoded as an in-memory Parquet file.
pub fn parquet_bytes(batch: &RecordBatch) -> Bytes {
    let mut buffer = Vec::new();
    let written = ArrowWriter::try_new(&mut buffer, batch.schema(), None)
        .and_then(|mut writer| {
            writer.write(batch)?;
            writer.close()
        });
    if let Err(e) = written {
        panic!("in-memory parquet write failed: {e}");
    }
    Bytes::from(buffer)
}

/// First record of [`sample_batch`] as the sampling query returns it.
pub fn sample_record() -> Map<String, Value> {
    match json!({"id": 1, "amount": 12.5, "region": "emea"}) {
        Value::Object(record) => record,
        _ => Map::new(),
    }
}
