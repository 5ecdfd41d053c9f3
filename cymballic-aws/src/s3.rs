//! S3 adapter for [`ObjectStorage`].

use crate::traits::ObjectStorage;
use crate::util::call_failed;
use async_trait::async_trait;
use aws_sdk_s3::error::ProvideErrorMetadata;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{
    BucketLocationConstraint, CreateBucketConfiguration, ExpressionType, InputSerialization,
    JsonOutput, OutputSerialization, ParquetInput, SelectObjectContentEventStream,
};
use aws_sdk_s3::Client;
use bytes::Bytes;
use cymballic_core::naming::location_constraint;
use cymballic_core::{ObjectLocation, RemoteError, RemoteResult};
use serde_json::{Map, Value};
use std::path::Path;

/// Error code S3 returns when a bucket has no policy attached.
const NO_SUCH_BUCKET_POLICY: &str = "NoSuchBucketPolicy";

const SAMPLE_QUERY: &str = "SELECT * FROM s3object LIMIT 1";

#[derive(Debug, Clone)]
pub struct S3Storage {
    client: Client,
    region: String,
}

impl S3Storage {
    pub fn new(client: Client, region: impl Into<String>) -> Self {
        Self {
            client,
            region: region.into(),
        }
    }
}

#[async_trait]
impl ObjectStorage for S3Storage {
    async fn bucket_exists(&self, bucket: &str) -> RemoteResult<bool> {
        match self.client.head_bucket().bucket(bucket).send().await {
            Ok(_) => Ok(true),
            Err(err) => match err.as_service_error() {
                Some(service) if service.is_not_found() => Ok(false),
                _ => Err(call_failed("HeadBucket", &err)),
            },
        }
    }

    async fn create_bucket(&self, bucket: &str) -> RemoteResult<()> {
        let mut request = self.client.create_bucket().bucket(bucket);
        if let Some(constraint) = location_constraint(&self.region) {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(constraint))
                    .build(),
            );
        }
        match request.send().await {
            Ok(_) => Ok(()),
            Err(err) => match err.as_service_error() {
                Some(service) if service.is_bucket_already_owned_by_you() => {
                    Err(RemoteError::already_exists(format!("bucket {bucket}")))
                }
                _ => Err(call_failed("CreateBucket", &err)),
            },
        }
    }

    async fn object_exists(&self, location: &ObjectLocation) -> RemoteResult<bool> {
        let result = self
            .client
            .head_object()
            .bucket(&location.bucket)
            .key(&location.key)
            .send()
            .await;
        match result {
            Ok(_) => Ok(true),
            Err(err) => match err.as_service_error() {
                Some(service) if service.is_not_found() => Ok(false),
                _ => Err(call_failed("HeadObject", &err)),
            },
        }
    }

    async fn upload_file(&self, location: &ObjectLocation, path: &Path) -> RemoteResult<()> {
        let body = ByteStream::from_path(path)
            .await
            .map_err(|e| call_failed("PutObject", &e))?;
        self.client
            .put_object()
            .bucket(&location.bucket)
            .key(&location.key)
            .body(body)
            .send()
            .await
            .map_err(|e| call_failed("PutObject", &e))?;
        Ok(())
    }

    async fn get_object(&self, location: &ObjectLocation) -> RemoteResult<Bytes> {
        let output = self
            .client
            .get_object()
            .bucket(&location.bucket)
            .key(&location.key)
            .send()
            .await
            .map_err(|err| match err.as_service_error() {
                Some(service) if service.is_no_such_key() => {
                    RemoteError::not_found(location.to_string())
                }
                _ => call_failed("GetObject", &err),
            })?;
        let body = output
            .body
            .collect()
            .await
            .map_err(|e| call_failed("GetObject", &e))?;
        Ok(body.into_bytes())
    }

    async fn select_first_record(
        &self,
        location: &ObjectLocation,
    ) -> RemoteResult<Option<Map<String, Value>>> {
        let mut output = self
            .client
            .select_object_content()
            .bucket(&location.bucket)
            .key(&location.key)
            .expression_type(ExpressionType::Sql)
            .expression(SAMPLE_QUERY)
            .input_serialization(
                InputSerialization::builder()
                    .parquet(ParquetInput::builder().build())
                    .build(),
            )
            .output_serialization(
                OutputSerialization::builder()
                    .json(JsonOutput::builder().build())
                    .build(),
            )
            .send()
            .await
            .map_err(|e| call_failed("SelectObjectContent", &e))?;

        let mut records = Vec::new();
        while let Some(event) = output
            .payload
            .recv()
            .await
            .map_err(|e| call_failed("SelectObjectContent", &e))?
        {
            match event {
                SelectObjectContentEventStream::Records(event) => {
                    if let Some(payload) = event.payload() {
                        records.extend_from_slice(payload.as_ref());
                    }
                }
                SelectObjectContentEventStream::End(_) => break,
                _ => {}
            }
        }
        first_record(&records)
    }

    async fn get_bucket_policy(&self, bucket: &str) -> RemoteResult<Option<String>> {
        match self.client.get_bucket_policy().bucket(bucket).send().await {
            Ok(output) => Ok(output.policy().map(str::to_string)),
            Err(err) => match err.as_service_error() {
                Some(service) if service.code() == Some(NO_SUCH_BUCKET_POLICY) => Ok(None),
                _ => Err(call_failed("GetBucketPolicy", &err)),
            },
        }
    }

    async fn put_bucket_policy(&self, bucket: &str, policy: &str) -> RemoteResult<()> {
        self.client
            .put_bucket_policy()
            .bucket(bucket)
            .policy(policy)
            .send()
            .await
            .map_err(|e| call_failed("PutBucketPolicy", &e))?;
        Ok(())
    }
}

/// Parse the first line of newline-delimited JSON records.
fn first_record(records: &[u8]) -> RemoteResult<Option<Map<String, Value>>> {
    let text = String::from_utf8_lossy(records);
    let Some(line) = text.lines().map(str::trim).find(|line| !line.is_empty()) else {
        return Ok(None);
    };
    match serde_json::from_str::<Value>(line) {
        Ok(Value::Object(record)) => Ok(Some(record)),
        Ok(other) => Err(RemoteError::call(
            "SelectObjectContent",
            format!("expected a JSON record, got {other}"),
        )),
        Err(e) => Err(RemoteError::call("SelectObjectContent", e)),
    }
}
