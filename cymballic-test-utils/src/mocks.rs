//! In-memory implementations of every collaborator trait.
//!
//! Each mock is cheap to clone; clones share state, so a test can keep a
//! handle for assertions after passing one into a session.

use crate::fixtures::{sample_batch, DEFAULT_CALLER_ACCOUNT};
use async_trait::async_trait;
use bytes::Bytes;
use cymballic_aws::{
    CloudConnector, CloudSession, DataCatalogSpec, DataCatalogs, MetadataCatalog, ObjectStorage,
    RolePolicies,
};
use cymballic_core::{
    ExportError, ObjectLocation, PostgresConnection, RemoteError, RemoteResult, SessionError,
    TableDefinition,
};
use cymballic_export::parquet_file::{columns_from_schema, write_batch};
use cymballic_export::{ExportedTable, TableExporter};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, RwLock};

fn access_denied(operation: &str) -> RemoteError {
    RemoteError::call(operation, "AccessDenied: injected failure")
}

// ============================================================================
// OBJECT STORAGE
// ============================================================================

#[derive(Debug, Default)]
struct StorageState {
    buckets: BTreeSet<String>,
    foreign_buckets: BTreeSet<String>,
    objects: BTreeMap<ObjectLocation, Bytes>,
    records: BTreeMap<ObjectLocation, Map<String, Value>>,
    bucket_policies: HashMap<String, String>,
    deny_object_reads: bool,
    fail_policy_writes: bool,
    calls: Vec<String>,
}

/// In-memory object store.
#[derive(Debug, Clone, Default)]
pub struct MockObjectStorage {
    state: Arc<RwLock<StorageState>>,
}

impl MockObjectStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bucket(self, bucket: &str) -> Self {
        self.state.write().unwrap().buckets.insert(bucket.to_string());
        self
    }

    /// A bucket name taken by another account.
    pub fn with_foreign_bucket(self, bucket: &str) -> Self {
        self.state
            .write()
            .unwrap()
            .foreign_buckets
            .insert(bucket.to_string());
        self
    }

    pub fn with_object(self, location: ObjectLocation, data: Bytes) -> Self {
        {
            let mut state = self.state.write().unwrap();
            state.buckets.insert(location.bucket.clone());
            state.objects.insert(location, data);
        }
        self
    }

    /// Record returned by the server-side sampling query for `location`.
    pub fn with_record(self, location: ObjectLocation, record: Map<String, Value>) -> Self {
        self.state.write().unwrap().records.insert(location, record);
        self
    }

    pub fn with_bucket_policy(self, bucket: &str, policy: &str) -> Self {
        self.state
            .write()
            .unwrap()
            .bucket_policies
            .insert(bucket.to_string(), policy.to_string());
        self
    }

    /// Object downloads fail, as they do for a cross-account reader.
    pub fn deny_object_reads(self) -> Self {
        self.state.write().unwrap().deny_object_reads = true;
        self
    }

    pub fn fail_policy_writes(self) -> Self {
        self.state.write().unwrap().fail_policy_writes = true;
        self
    }

    pub fn buckets(&self) -> Vec<String> {
        self.state.read().unwrap().buckets.iter().cloned().collect()
    }

    pub fn object(&self, location: &ObjectLocation) -> Option<Bytes> {
        self.state.read().unwrap().objects.get(location).cloned()
    }

    pub fn bucket_policy(&self, bucket: &str) -> Option<String> {
        self.state.read().unwrap().bucket_policies.get(bucket).cloned()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.read().unwrap().calls.clone()
    }

    fn record_call(&self, call: String) {
        self.state.write().unwrap().calls.push(call);
    }
}

#[async_trait]
impl ObjectStorage for MockObjectStorage {
    async fn bucket_exists(&self, bucket: &str) -> RemoteResult<bool> {
        self.record_call(format!("head_bucket:{bucket}"));
        Ok(self.state.read().unwrap().buckets.contains(bucket))
    }

    async fn create_bucket(&self, bucket: &str) -> RemoteResult<()> {
        self.record_call(format!("create_bucket:{bucket}"));
        let mut state = self.state.write().unwrap();
        if state.foreign_buckets.contains(bucket) {
            return Err(RemoteError::call(
                "CreateBucket",
                format!("BucketAlreadyExists: {bucket} is owned by another account"),
            ));
        }
        if !state.buckets.insert(bucket.to_string()) {
            return Err(RemoteError::already_exists(format!("bucket {bucket}")));
        }
        Ok(())
    }

    async fn object_exists(&self, location: &ObjectLocation) -> RemoteResult<bool> {
        self.record_call(format!("head_object:{location}"));
        Ok(self.state.read().unwrap().objects.contains_key(location))
    }

    async fn upload_file(&self, location: &ObjectLocation, path: &Path) -> RemoteResult<()> {
        self.record_call(format!("put_object:{location}"));
        let data = std::fs::read(path).map_err(|e| RemoteError::call("PutObject", e))?;
        let mut state = self.state.write().unwrap();
        if !state.buckets.contains(&location.bucket) {
            return Err(RemoteError::not_found(format!("bucket {}", location.bucket)));
        }
        state.objects.insert(location.clone(), Bytes::from(data));
        Ok(())
    }

    async fn get_object(&self, location: &ObjectLocation) -> RemoteResult<Bytes> {
        self.record_call(format!("get_object:{location}"));
        let state = self.state.read().unwrap();
        if state.deny_object_reads {
            return Err(access_denied("GetObject"));
        }
        state
            .objects
            .get(location)
            .cloned()
            .ok_or_else(|| RemoteError::not_found(location.to_string()))
    }

    async fn select_first_record(
        &self,
        location: &ObjectLocation,
    ) -> RemoteResult<Option<Map<String, Value>>> {
        self.record_call(format!("select_object_content:{location}"));
        Ok(self.state.read().unwrap().records.get(location).cloned())
    }

    async fn get_bucket_policy(&self, bucket: &str) -> RemoteResult<Option<String>> {
        self.record_call(format!("get_bucket_policy:{bucket}"));
        Ok(self.state.read().unwrap().bucket_policies.get(bucket).cloned())
    }

    async fn put_bucket_policy(&self, bucket: &str, policy: &str) -> RemoteResult<()> {
        self.record_call(format!("put_bucket_policy:{bucket}"));
        let mut state = self.state.write().unwrap();
        if state.fail_policy_writes {
            return Err(access_denied("PutBucketPolicy"));
        }
        state
            .bucket_policies
            .insert(bucket.to_string(), policy.to_string());
        Ok(())
    }
}

// ============================================================================
// METADATA CATALOG
// ============================================================================

#[derive(Debug, Default)]
struct CatalogState {
    databases: BTreeSet<String>,
    tables: BTreeMap<(String, String), TableDefinition>,
    resource_policy: Option<String>,
    fail_policy_writes: bool,
    calls: Vec<String>,
}

/// In-memory metadata catalog.
#[derive(Debug, Clone, Default)]
pub struct MockCatalog {
    state: Arc<RwLock<CatalogState>>,
}

impl MockCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_database(self, database: &str) -> Self {
        self.state
            .write()
            .unwrap()
            .databases
            .insert(database.to_string());
        self
    }

    pub fn with_resource_policy(self, policy: &str) -> Self {
        self.state.write().unwrap().resource_policy = Some(policy.to_string());
        self
    }

    pub fn fail_policy_writes(self) -> Self {
        self.state.write().unwrap().fail_policy_writes = true;
        self
    }

    pub fn databases(&self) -> Vec<String> {
        self.state.read().unwrap().databases.iter().cloned().collect()
    }

    pub fn table(&self, database: &str, name: &str) -> Option<TableDefinition> {
        self.state
            .read()
            .unwrap()
            .tables
            .get(&(database.to_string(), name.to_string()))
            .cloned()
    }

    pub fn table_count(&self) -> usize {
        self.state.read().unwrap().tables.len()
    }

    pub fn resource_policy(&self) -> Option<String> {
        self.state.read().unwrap().resource_policy.clone()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.read().unwrap().calls.clone()
    }
}

#[async_trait]
impl MetadataCatalog for MockCatalog {
    async fn create_database(&self, database: &str) -> RemoteResult<()> {
        let mut state = self.state.write().unwrap();
        state.calls.push(format!("create_database:{database}"));
        if !state.databases.insert(database.to_string()) {
            return Err(RemoteError::already_exists(format!("database {database}")));
        }
        Ok(())
    }

    async fn create_table(&self, table: &TableDefinition) -> RemoteResult<()> {
        let mut state = self.state.write().unwrap();
        state
            .calls
            .push(format!("create_table:{}.{}", table.database, table.name));
        if !state.databases.contains(&table.database) {
            return Err(RemoteError::not_found(format!("database {}", table.database)));
        }
        let key = (table.database.clone(), table.name.clone());
        if state.tables.contains_key(&key) {
            return Err(RemoteError::already_exists(format!(
                "table {}.{}",
                table.database, table.name
            )));
        }
        state.tables.insert(key, table.clone());
        Ok(())
    }

    async fn update_table(&self, table: &TableDefinition) -> RemoteResult<()> {
        let mut state = self.state.write().unwrap();
        state
            .calls
            .push(format!("update_table:{}.{}", table.database, table.name));
        let key = (table.database.clone(), table.name.clone());
        match state.tables.get_mut(&key) {
            Some(existing) => {
                *existing = table.clone();
                Ok(())
            }
            None => Err(RemoteError::not_found(format!(
                "table {}.{}",
                table.database, table.name
            ))),
        }
    }

    async fn get_resource_policy(&self) -> RemoteResult<Option<String>> {
        let mut state = self.state.write().unwrap();
        state.calls.push("get_resource_policy".to_string());
        Ok(state.resource_policy.clone())
    }

    async fn put_resource_policy(&self, policy: &str) -> RemoteResult<()> {
        let mut state = self.state.write().unwrap();
        state.calls.push("put_resource_policy".to_string());
        if state.fail_policy_writes {
            return Err(access_denied("PutResourcePolicy"));
        }
        state.resource_policy = Some(policy.to_string());
        Ok(())
    }
}

// ============================================================================
// ROLE POLICIES
// ============================================================================

#[derive(Debug, Default)]
struct RolePolicyState {
    policies: HashMap<(String, String), String>,
    fail_writes: bool,
    calls: Vec<String>,
}

/// In-memory inline role policies. Documents are stored decoded.
#[derive(Debug, Clone, Default)]
pub struct MockRolePolicies {
    state: Arc<RwLock<RolePolicyState>>,
}

impl MockRolePolicies {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(self, role: &str, policy_name: &str, policy: &str) -> Self {
        self.state.write().unwrap().policies.insert(
            (role.to_string(), policy_name.to_string()),
            policy.to_string(),
        );
        self
    }

    pub fn fail_writes(self) -> Self {
        self.state.write().unwrap().fail_writes = true;
        self
    }

    pub fn policy(&self, role: &str, policy_name: &str) -> Option<String> {
        self.state
            .read()
            .unwrap()
            .policies
            .get(&(role.to_string(), policy_name.to_string()))
            .cloned()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.read().unwrap().calls.clone()
    }
}

#[async_trait]
impl RolePolicies for MockRolePolicies {
    async fn get_role_policy(&self, role: &str, policy_name: &str) -> RemoteResult<Option<String>> {
        let mut state = self.state.write().unwrap();
        state.calls.push(format!("get_role_policy:{role}/{policy_name}"));
        Ok(state
            .policies
            .get(&(role.to_string(), policy_name.to_string()))
            .cloned())
    }

    async fn put_role_policy(
        &self,
        role: &str,
        policy_name: &str,
        policy: &str,
    ) -> RemoteResult<()> {
        let mut state = self.state.write().unwrap();
        state.calls.push(format!("put_role_policy:{role}/{policy_name}"));
        if state.fail_writes {
            return Err(access_denied("PutRolePolicy"));
        }
        state.policies.insert(
            (role.to_string(), policy_name.to_string()),
            policy.to_string(),
        );
        Ok(())
    }
}

// ============================================================================
// DATA CATALOGS
// ============================================================================

#[derive(Debug, Default)]
struct DataCatalogState {
    catalogs: BTreeMap<String, DataCatalogSpec>,
    fail_deletes: bool,
    calls: Vec<String>,
}

/// In-memory query engine catalogs.
#[derive(Debug, Clone, Default)]
pub struct MockDataCatalogs {
    state: Arc<RwLock<DataCatalogState>>,
}

impl MockDataCatalogs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_catalog(self, spec: DataCatalogSpec) -> Self {
        self.state
            .write()
            .unwrap()
            .catalogs
            .insert(spec.name.clone(), spec);
        self
    }

    pub fn fail_deletes(self) -> Self {
        self.state.write().unwrap().fail_deletes = true;
        self
    }

    pub fn catalog(&self, name: &str) -> Option<DataCatalogSpec> {
        self.state.read().unwrap().catalogs.get(name).cloned()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.read().unwrap().calls.clone()
    }
}

#[async_trait]
impl DataCatalogs for MockDataCatalogs {
    async fn create_data_catalog(&self, spec: &DataCatalogSpec) -> RemoteResult<()> {
        let mut state = self.state.write().unwrap();
        state.calls.push(format!("create:{}", spec.name));
        if state.catalogs.contains_key(&spec.name) {
            return Err(RemoteError::already_exists(format!(
                "data catalog {}",
                spec.name
            )));
        }
        state.catalogs.insert(spec.name.clone(), spec.clone());
        Ok(())
    }

    async fn delete_data_catalog(&self, name: &str) -> RemoteResult<()> {
        let mut state = self.state.write().unwrap();
        state.calls.push(format!("delete:{name}"));
        if state.fail_deletes {
            return Err(access_denied("DeleteDataCatalog"));
        }
        state
            .catalogs
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| RemoteError::not_found(format!("data catalog {name}")))
    }
}

// ============================================================================
// SESSIONS
// ============================================================================

/// Session over shared mock collaborators.
#[derive(Debug, Clone)]
pub struct MockSession {
    account_id: String,
    storage: MockObjectStorage,
    catalog: MockCatalog,
    role_policies: MockRolePolicies,
    data_catalogs: MockDataCatalogs,
}

impl CloudSession for MockSession {
    fn account_id(&self) -> &str {
        &self.account_id
    }

    fn object_storage(&self) -> &dyn ObjectStorage {
        &self.storage
    }

    fn catalog(&self) -> &dyn MetadataCatalog {
        &self.catalog
    }

    fn role_policies(&self) -> &dyn RolePolicies {
        &self.role_policies
    }

    fn data_catalogs(&self) -> &dyn DataCatalogs {
        &self.data_catalogs
    }
}

/// Connector handing out [`MockSession`]s. Every session shares the same
/// collaborators regardless of profile.
#[derive(Debug, Clone)]
pub struct MockConnector {
    pub storage: MockObjectStorage,
    pub catalog: MockCatalog,
    pub role_policies: MockRolePolicies,
    pub data_catalogs: MockDataCatalogs,
    caller_account: String,
    profile_accounts: HashMap<String, String>,
    expired_profiles: HashSet<String>,
    connected: Arc<RwLock<Vec<String>>>,
}

impl Default for MockConnector {
    fn default() -> Self {
        Self {
            storage: MockObjectStorage::new(),
            catalog: MockCatalog::new(),
            role_policies: MockRolePolicies::new(),
            data_catalogs: MockDataCatalogs::new(),
            caller_account: DEFAULT_CALLER_ACCOUNT.to_string(),
            profile_accounts: HashMap::new(),
            expired_profiles: HashSet::new(),
            connected: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_storage(mut self, storage: MockObjectStorage) -> Self {
        self.storage = storage;
        self
    }

    pub fn with_catalog(mut self, catalog: MockCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_role_policies(mut self, role_policies: MockRolePolicies) -> Self {
        self.role_policies = role_policies;
        self
    }

    pub fn with_data_catalogs(mut self, data_catalogs: MockDataCatalogs) -> Self {
        self.data_catalogs = data_catalogs;
        self
    }

    /// Account reported by the caller identity of every session.
    pub fn with_caller_account(mut self, account_id: &str) -> Self {
        self.caller_account = account_id.to_string();
        self
    }

    /// `sso_account_id` configured for `profile`.
    pub fn with_profile_account(mut self, profile: &str, account_id: &str) -> Self {
        self.profile_accounts
            .insert(profile.to_string(), account_id.to_string());
        self
    }

    /// Sessions for `profile` fail verification as expired.
    pub fn with_expired_profile(mut self, profile: &str) -> Self {
        self.expired_profiles.insert(profile.to_string());
        self
    }

    /// Profiles a session was successfully opened for, in order.
    pub fn connected_profiles(&self) -> Vec<String> {
        self.connected.read().unwrap().clone()
    }
}

#[async_trait]
impl CloudConnector for MockConnector {
    type Session = MockSession;

    async fn connect(&self, profile: &str) -> Result<MockSession, SessionError> {
        if self.expired_profiles.contains(profile) {
            return Err(SessionError::Expired {
                profile: profile.to_string(),
                detail: "ExpiredToken: the SSO session associated with this profile has expired"
                    .to_string(),
            });
        }
        self.connected.write().unwrap().push(profile.to_string());
        Ok(MockSession {
            account_id: self.caller_account.clone(),
            storage: self.storage.clone(),
            catalog: self.catalog.clone(),
            role_policies: self.role_policies.clone(),
            data_catalogs: self.data_catalogs.clone(),
        })
    }

    async fn profile_account_id(&self, profile: &str) -> Result<String, SessionError> {
        self.profile_accounts
            .get(profile)
            .cloned()
            .ok_or_else(|| SessionError::AccountIdUnavailable {
                profile: profile.to_string(),
            })
    }
}

// ============================================================================
// TABLE EXPORT
// ============================================================================

/// Exporter that writes [`sample_batch`] instead of querying a database.
#[derive(Debug, Clone, Default)]
pub struct MockExporter {
    exported: Arc<RwLock<Vec<String>>>,
    fail_connect: bool,
}

impl MockExporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every export fails to connect.
    pub fn unreachable() -> Self {
        Self {
            fail_connect: true,
            ..Self::default()
        }
    }

    /// Tables exported so far.
    pub fn exported_tables(&self) -> Vec<String> {
        self.exported.read().unwrap().clone()
    }
}

#[async_trait]
impl TableExporter for MockExporter {
    async fn export(
        &self,
        connection: &PostgresConnection,
        table: &str,
        destination: &Path,
    ) -> Result<ExportedTable, ExportError> {
        if self.fail_connect {
            return Err(ExportError::Connect {
                host: connection.host.clone(),
                database: connection.database.clone(),
                reason: "connection refused".to_string(),
            });
        }
        let batch = sample_batch();
        write_batch(destination, &batch)?;
        self.exported.write().unwrap().push(table.to_string());
        Ok(ExportedTable {
            path: destination.to_path_buf(),
            rows: batch.num_rows(),
            columns: columns_from_schema(batch.schema().as_ref()),
        })
    }
}
