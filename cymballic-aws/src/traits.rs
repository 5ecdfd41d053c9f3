//! Collaborator traits.
//!
//! Every remote service the onboarding workflows touch is reached through one
//! of these seams. The AWS adapters in this crate implement them against the
//! SDK; `cymballic-test-utils` implements them in memory.

use async_trait::async_trait;
use bytes::Bytes;
use cymballic_core::{ObjectLocation, RemoteResult, SessionError, TableDefinition};
use serde_json::{Map, Value};
use std::path::Path;

// ============================================================================
// OBJECT STORAGE
// ============================================================================

/// Buckets, objects and bucket policies.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// `Ok(false)` only when the store reports the bucket as missing.
    async fn bucket_exists(&self, bucket: &str) -> RemoteResult<bool>;

    /// `AlreadyExists` when the caller already owns the bucket.
    async fn create_bucket(&self, bucket: &str) -> RemoteResult<()>;

    async fn object_exists(&self, location: &ObjectLocation) -> RemoteResult<bool>;

    async fn upload_file(&self, location: &ObjectLocation, path: &Path) -> RemoteResult<()>;

    async fn get_object(&self, location: &ObjectLocation) -> RemoteResult<Bytes>;

    /// First record of a Parquet object as returned by a server-side
    /// `SELECT * ... LIMIT 1`, or `None` for an empty object.
    async fn select_first_record(
        &self,
        location: &ObjectLocation,
    ) -> RemoteResult<Option<Map<String, Value>>>;

    /// Raw policy JSON, `None` when the bucket has no policy.
    async fn get_bucket_policy(&self, bucket: &str) -> RemoteResult<Option<String>>;

    async fn put_bucket_policy(&self, bucket: &str, policy: &str) -> RemoteResult<()>;
}

// ============================================================================
// METADATA CATALOG
// ============================================================================

/// Databases, tables and the account-level resource policy of the catalog.
#[async_trait]
pub trait MetadataCatalog: Send + Sync {
    /// `AlreadyExists` when the database is present.
    async fn create_database(&self, database: &str) -> RemoteResult<()>;

    /// `AlreadyExists` when a table with the same name is present.
    async fn create_table(&self, table: &TableDefinition) -> RemoteResult<()>;

    /// Replaces the stored definition wholesale.
    async fn update_table(&self, table: &TableDefinition) -> RemoteResult<()>;

    /// Raw policy JSON, `None` when no resource policy is set.
    async fn get_resource_policy(&self) -> RemoteResult<Option<String>>;

    async fn put_resource_policy(&self, policy: &str) -> RemoteResult<()>;
}

// ============================================================================
// IDENTITY POLICIES
// ============================================================================

/// Inline policies attached to roles.
#[async_trait]
pub trait RolePolicies: Send + Sync {
    /// Decoded policy JSON, `None` when the role has no such inline policy.
    async fn get_role_policy(&self, role: &str, policy_name: &str) -> RemoteResult<Option<String>>;

    async fn put_role_policy(&self, role: &str, policy_name: &str, policy: &str)
        -> RemoteResult<()>;
}

// ============================================================================
// QUERY ENGINE CATALOGS
// ============================================================================

/// A query engine catalog pointing at another account's metadata catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataCatalogSpec {
    pub name: String,
    pub description: String,
    pub source_account_id: String,
}

#[async_trait]
pub trait DataCatalogs: Send + Sync {
    /// `AlreadyExists` when a catalog with the same name is registered.
    async fn create_data_catalog(&self, spec: &DataCatalogSpec) -> RemoteResult<()>;

    async fn delete_data_catalog(&self, name: &str) -> RemoteResult<()>;
}

// ============================================================================
// SESSIONS
// ============================================================================

/// A verified identity session and the clients built on it.
pub trait CloudSession: Send + Sync {
    /// Account of the verified caller identity.
    fn account_id(&self) -> &str;

    fn object_storage(&self) -> &dyn ObjectStorage;

    fn catalog(&self) -> &dyn MetadataCatalog;

    fn role_policies(&self) -> &dyn RolePolicies;

    fn data_catalogs(&self) -> &dyn DataCatalogs;
}

/// Opens sessions for named profiles.
#[async_trait]
pub trait CloudConnector: Send + Sync {
    type Session: CloudSession;

    /// Open and verify a session. Failures carry the remediation command.
    async fn connect(&self, profile: &str) -> Result<Self::Session, SessionError>;

    /// Account a profile logs into, read from local profile configuration
    /// without opening a session.
    async fn profile_account_id(&self, profile: &str) -> Result<String, SessionError>;
}
