//! Idempotent bucket provisioning.

use crate::traits::ObjectStorage;
use cymballic_core::RemoteResult;

/// Outcome of [`ensure_bucket`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketStatus {
    Existing,
    Created,
}

/// Make sure `bucket` exists. A bucket this account already owns counts as
/// success; every other creation failure is returned.
pub async fn ensure_bucket(
    storage: &dyn ObjectStorage,
    bucket: &str,
) -> RemoteResult<BucketStatus> {
    match storage.bucket_exists(bucket).await {
        Ok(true) => {
            tracing::info!(bucket, "Bucket already exists");
            return Ok(BucketStatus::Existing);
        }
        Ok(false) => {}
        Err(err) => {
            tracing::warn!(bucket, error = %err, "Could not check bucket, attempting to create it");
        }
    }

    match storage.create_bucket(bucket).await {
        Ok(()) => {
            tracing::info!(bucket, "Created bucket");
            Ok(BucketStatus::Created)
        }
        Err(err) if err.is_already_exists() => {
            tracing::info!(bucket, "Bucket already owned by this account");
            Ok(BucketStatus::Existing)
        }
        Err(err) => Err(err),
    }
}
