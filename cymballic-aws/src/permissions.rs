//! Applying reconciled policy documents to remote policy stores.
//!
//! Each store is fetched, reconciled against a resource key, snapshotted into
//! the run log and only then written back. A failed write therefore always
//! leaves the intended document on disk.

use crate::traits::{MetadataCatalog, ObjectStorage, RolePolicies};
use async_trait::async_trait;
use cymballic_core::{reconcile, PolicyDocument, PolicyError, RemoteResult, RunLog, Statement};
use std::path::PathBuf;

/// A remote location holding one policy document.
#[async_trait]
pub trait PolicyStore: Send + Sync {
    /// Human readable name used in logs and errors.
    fn label(&self) -> String;

    /// File stem of the run log snapshot.
    fn snapshot_name(&self) -> String;

    /// Current document JSON, `None` when no policy is set.
    async fn fetch(&self) -> RemoteResult<Option<String>>;

    async fn apply(&self, policy: &str) -> RemoteResult<()>;
}

// ============================================================================
// STORES
// ============================================================================

/// Bucket policy of a customer bucket.
pub struct BucketPolicy<'a> {
    storage: &'a dyn ObjectStorage,
    bucket: String,
}

impl<'a> BucketPolicy<'a> {
    pub fn new(storage: &'a dyn ObjectStorage, bucket: impl Into<String>) -> Self {
        Self {
            storage,
            bucket: bucket.into(),
        }
    }
}

#[async_trait]
impl PolicyStore for BucketPolicy<'_> {
    fn label(&self) -> String {
        format!("bucket policy for {}", self.bucket)
    }

    fn snapshot_name(&self) -> String {
        format!("s3_bucket_policy_{}", self.bucket)
    }

    async fn fetch(&self) -> RemoteResult<Option<String>> {
        self.storage.get_bucket_policy(&self.bucket).await
    }

    async fn apply(&self, policy: &str) -> RemoteResult<()> {
        self.storage.put_bucket_policy(&self.bucket, policy).await
    }
}

/// Account-level resource policy of the metadata catalog, reconciled for one
/// database.
pub struct CatalogResourcePolicy<'a> {
    catalog: &'a dyn MetadataCatalog,
    database: String,
}

impl<'a> CatalogResourcePolicy<'a> {
    pub fn new(catalog: &'a dyn MetadataCatalog, database: impl Into<String>) -> Self {
        Self {
            catalog,
            database: database.into(),
        }
    }
}

#[async_trait]
impl PolicyStore for CatalogResourcePolicy<'_> {
    fn label(&self) -> String {
        format!("catalog resource policy for {}", self.database)
    }

    fn snapshot_name(&self) -> String {
        format!("glue_policy_{}", self.database)
    }

    async fn fetch(&self) -> RemoteResult<Option<String>> {
        self.catalog.get_resource_policy().await
    }

    async fn apply(&self, policy: &str) -> RemoteResult<()> {
        self.catalog.put_resource_policy(policy).await
    }
}

/// Inline policy `<role>-policy` on a role.
pub struct RolePolicy<'a> {
    policies: &'a dyn RolePolicies,
    role: String,
    policy_name: String,
}

impl<'a> RolePolicy<'a> {
    pub fn new(policies: &'a dyn RolePolicies, role: impl Into<String>) -> Self {
        let role = role.into();
        Self {
            policies,
            policy_name: role_policy_name(&role),
            role,
        }
    }
}

/// Name of the inline policy managed on `role`.
pub fn role_policy_name(role: &str) -> String {
    format!("{role}-policy")
}

#[async_trait]
impl PolicyStore for RolePolicy<'_> {
    fn label(&self) -> String {
        format!("role policy {} on {}", self.policy_name, self.role)
    }

    fn snapshot_name(&self) -> String {
        self.policy_name.clone()
    }

    async fn fetch(&self) -> RemoteResult<Option<String>> {
        self.policies
            .get_role_policy(&self.role, &self.policy_name)
            .await
    }

    async fn apply(&self, policy: &str) -> RemoteResult<()> {
        self.policies
            .put_role_policy(&self.role, &self.policy_name, policy)
            .await
    }
}

// ============================================================================
// RECONCILE AND APPLY
// ============================================================================

/// Replace every statement in `store` that references `key` with
/// `statements`, snapshot the result, then write it back. Returns the
/// snapshot path.
pub async fn reconcile_policy(
    store: &dyn PolicyStore,
    run_log: &RunLog,
    key: &str,
    statements: Vec<Statement>,
) -> Result<PathBuf, PolicyError> {
    let policy = store.label();
    let existing = match store.fetch().await {
        Ok(Some(json)) => Some(PolicyDocument::from_json(&json).map_err(|e| {
            PolicyError::Malformed {
                policy: policy.clone(),
                reason: e.to_string(),
            }
        })?),
        Ok(None) => None,
        Err(err) if err.is_not_found() => None,
        Err(source) => return Err(PolicyError::Fetch { policy, source }),
    };
    if existing.is_none() {
        tracing::info!(policy = %policy, "No existing policy, starting from an empty document");
    }

    let document = reconcile(existing, key, statements);
    let snapshot = run_log.snapshot(&store.snapshot_name(), &document)?;
    let json = document.to_json().map_err(|e| PolicyError::Snapshot {
        path: snapshot.display().to_string(),
        reason: e.to_string(),
    })?;

    store
        .apply(&json)
        .await
        .map_err(|source| PolicyError::Apply {
            policy: policy.clone(),
            snapshot: snapshot.display().to_string(),
            source,
        })?;
    tracing::info!(
        policy = %policy,
        statements = document.statement.len(),
        "Updated policy"
    );
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_policy_name() {
        assert_eq!(role_policy_name("athena-service"), "athena-service-policy");
    }
}
