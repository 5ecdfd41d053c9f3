use aws_sdk_s3::error::DisplayErrorContext;
use cymballic_core::RemoteError;

/// Classify an SDK failure that has no dedicated variant.
pub(crate) fn call_failed<E: std::error::Error>(operation: &str, err: &E) -> RemoteError {
    RemoteError::call(operation, DisplayErrorContext(err))
}
