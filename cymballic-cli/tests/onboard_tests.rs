use cymballic_aws::TableRegistration;
use cymballic_cli::{onboard, OnboardRequest, OnboardSummary, Workspace};
use cymballic_core::{
    ColumnDescriptor, ColumnType, CustomerConfig, CymballicError, CymballicResult,
    ObjectLocation, PolicyDocument, SessionError,
};
use cymballic_test_utils::{
    global_config, parquet_bytes, parquet_customer, postgres_customer, sample_batch,
    sample_record, MockCatalog, MockConnector, MockExporter, MockObjectStorage,
    DEFAULT_CALLER_ACCOUNT,
};
use std::path::Path;

struct Harness {
    dir: tempfile::TempDir,
    workspace: Workspace,
}

impl Harness {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let workspace = Workspace::new(dir.path().join("log"), dir.path());
        Self { dir, workspace }
    }

    async fn run(
        &self,
        connector: &MockConnector,
        exporter: &MockExporter,
        customer: &CustomerConfig,
        table: &str,
    ) -> CymballicResult<OnboardSummary> {
        let global = global_config();
        let config_path = self.dir.path().join("acme.json");
        let request = OnboardRequest {
            global: &global,
            customer,
            config_path: &config_path,
            table,
        };
        onboard(connector, exporter, &request, &self.workspace).await
    }
}

fn sales_location() -> ObjectLocation {
    ObjectLocation::new("acme", "sales/sales.parquet")
}

fn policy(json: Option<String>) -> PolicyDocument {
    PolicyDocument::from_json(&json.expect("policy applied")).unwrap()
}

// ============================================================================
// PARQUET SOURCE
// ============================================================================

#[tokio::test]
async fn test_parquet_cross_account_uses_sampled_schema() {
    let harness = Harness::new();
    let storage = MockObjectStorage::new()
        .with_object(sales_location(), parquet_bytes(&sample_batch()))
        .with_record(sales_location(), sample_record())
        .deny_object_reads();
    let connector = MockConnector::new().with_storage(storage.clone());

    let summary = harness
        .run(&connector, &MockExporter::new(), &parquet_customer("acme", "acme-sso"), "sales")
        .await
        .unwrap();

    assert_eq!(connector.catalog.databases(), vec!["acme".to_string()]);
    let table = connector.catalog.table("acme", "sales").unwrap();
    assert_eq!(table.location, "s3://acme/sales/");
    assert_eq!(table.table_type, "EXTERNAL_TABLE");
    assert!(table.compressed);
    assert_eq!(
        table.columns,
        vec![
            ColumnDescriptor::new("id", ColumnType::String),
            ColumnDescriptor::new("amount", ColumnType::String),
            ColumnDescriptor::new("region", ColumnType::String),
        ]
    );
    assert_eq!(summary.registration, TableRegistration::Created);
    assert!(summary.run_dir.join("s3_bucket_policy_acme.json").exists());
    assert!(summary.run_dir.join("glue_policy_acme.json").exists());
}

#[tokio::test]
async fn test_parquet_without_any_schema_registers_empty_columns() {
    let harness = Harness::new();
    let storage = MockObjectStorage::new()
        .with_object(sales_location(), parquet_bytes(&sample_batch()))
        .deny_object_reads();
    let connector = MockConnector::new().with_storage(storage);

    let summary = harness
        .run(&connector, &MockExporter::new(), &parquet_customer("acme", "acme-sso"), "sales")
        .await
        .unwrap();

    assert!(summary.columns.is_empty());
    assert!(connector.catalog.table("acme", "sales").unwrap().columns.is_empty());
}

#[tokio::test]
async fn test_parquet_direct_read_keeps_types() {
    let harness = Harness::new();
    let storage =
        MockObjectStorage::new().with_object(sales_location(), parquet_bytes(&sample_batch()));
    let connector = MockConnector::new().with_storage(storage);

    let summary = harness
        .run(&connector, &MockExporter::new(), &parquet_customer("Acme", "acme-sso"), "sales")
        .await
        .unwrap();

    let types: Vec<_> = summary.columns.iter().map(|c| c.column_type).collect();
    assert_eq!(
        types,
        vec![ColumnType::Bigint, ColumnType::Double, ColumnType::String]
    );
}

#[tokio::test]
async fn test_missing_parquet_object_is_fatal() {
    let harness = Harness::new();
    let connector = MockConnector::new().with_storage(MockObjectStorage::new().with_bucket("acme"));

    let err = harness
        .run(&connector, &MockExporter::new(), &parquet_customer("acme", "acme-sso"), "sales")
        .await
        .unwrap_err();

    assert!(matches!(err, CymballicError::MissingObject { .. }));
    assert_eq!(
        err.to_string(),
        "Parquet file not found at s3://acme/sales/sales.parquet"
    );
    assert_eq!(connector.catalog.table_count(), 0);
    assert!(connector.catalog.databases().is_empty());
    assert!(connector.storage.bucket_policy("acme").is_none());
}

// ============================================================================
// POSTGRES SOURCE
// ============================================================================

#[tokio::test]
async fn test_postgres_export_upload_and_register() {
    let harness = Harness::new();
    let connector = MockConnector::new();
    let exporter = MockExporter::new();

    let summary = harness
        .run(&connector, &exporter, &postgres_customer("acme", "acme-sso"), "orders")
        .await
        .unwrap();

    assert_eq!(exporter.exported_tables(), vec!["orders".to_string()]);
    assert_eq!(connector.storage.buckets(), vec!["acme".to_string()]);
    let uploaded = connector
        .storage
        .object(&ObjectLocation::new("acme", "orders/orders.parquet"))
        .unwrap();
    let staged = std::fs::read(harness.dir.path().join("orders.parquet")).unwrap();
    assert_eq!(uploaded.as_ref(), staged.as_slice());

    let table = connector.catalog.table("acme", "orders").unwrap();
    assert_eq!(table.location, "s3://acme/orders/");
    assert_eq!(
        table.columns,
        vec![
            ColumnDescriptor::new("id", ColumnType::Bigint),
            ColumnDescriptor::new("amount", ColumnType::Double),
            ColumnDescriptor::new("region", ColumnType::String),
        ]
    );
    assert_eq!(summary.columns, table.columns);
}

#[tokio::test]
async fn test_postgres_export_failure_stops_before_registration() {
    let harness = Harness::new();
    let connector = MockConnector::new();

    let err = harness
        .run(
            &connector,
            &MockExporter::unreachable(),
            &postgres_customer("acme", "acme-sso"),
            "orders",
        )
        .await
        .unwrap_err();

    assert!(matches!(err, CymballicError::Export(_)));
    assert_eq!(connector.catalog.table_count(), 0);
}

#[tokio::test]
async fn test_onboarding_twice_converges() {
    let harness = Harness::new();
    let connector = MockConnector::new();
    let exporter = MockExporter::new();
    let customer = postgres_customer("acme", "acme-sso");

    let first = harness.run(&connector, &exporter, &customer, "orders").await.unwrap();
    let bucket_policy = connector.storage.bucket_policy("acme");
    let catalog_policy = connector.catalog.resource_policy();
    let second = harness.run(&connector, &exporter, &customer, "orders").await.unwrap();

    assert_eq!(first.registration, TableRegistration::Created);
    assert_eq!(second.registration, TableRegistration::Updated);
    assert_eq!(connector.catalog.table_count(), 1);
    assert_eq!(connector.storage.bucket_policy("acme"), bucket_policy);
    assert_eq!(connector.catalog.resource_policy(), catalog_policy);
}

// ============================================================================
// POLICIES AND ACCOUNTS
// ============================================================================

#[tokio::test]
async fn test_policies_grant_host_roles() {
    let harness = Harness::new();
    let connector = MockConnector::new().with_profile_account("acme-sso", "777788889999");

    let summary = harness
        .run(&connector, &MockExporter::new(), &postgres_customer("acme", "acme-sso"), "orders")
        .await
        .unwrap();

    assert_eq!(summary.source_account_id, "777788889999");

    let bucket = policy(connector.storage.bucket_policy("acme"));
    let bucket_json = bucket.to_json().unwrap();
    assert!(bucket_json.contains("arn:aws:iam::111122223333:role/athena-service"));
    assert!(bucket_json.contains("arn:aws:iam::111122223333:role/analyst-sso"));
    assert!(bucket_json.contains("s3:GetBucketLocation"));

    let catalog = policy(connector.catalog.resource_policy());
    let catalog_json = catalog.to_json().unwrap();
    assert_eq!(catalog.statement.len(), 2);
    assert!(catalog_json.contains("arn:aws:glue:us-east-1:777788889999:database/acme"));
    assert!(catalog_json.contains("arn:aws:glue:us-east-1:777788889999:table/acme/*"));
    assert!(catalog_json.contains("arn:aws:iam::111122223333:root"));
    assert!(catalog_json.contains("ram.amazonaws.com"));
    assert!(catalog_json.contains("glue:ShareResource"));
}

#[tokio::test]
async fn test_source_account_falls_back_to_caller_identity() {
    let harness = Harness::new();
    let connector = MockConnector::new();

    let summary = harness
        .run(&connector, &MockExporter::new(), &postgres_customer("acme", "acme-sso"), "orders")
        .await
        .unwrap();

    assert_eq!(summary.source_account_id, DEFAULT_CALLER_ACCOUNT);
}

#[tokio::test]
async fn test_catalog_policy_write_failure_names_snapshot() {
    let harness = Harness::new();
    let connector = MockConnector::new().with_catalog(MockCatalog::new().fail_policy_writes());

    let err = harness
        .run(&connector, &MockExporter::new(), &postgres_customer("acme", "acme-sso"), "orders")
        .await
        .unwrap_err();

    let message = err.to_string();
    assert!(message.contains("Policy saved at"));
    assert!(message.contains("glue_policy_acme.json"));
    let run_dir = std::fs::read_dir(harness.workspace.log_root.as_path())
        .unwrap()
        .next()
        .unwrap()
        .unwrap()
        .path();
    assert!(run_dir.join("glue_policy_acme.json").exists());
}

// ============================================================================
// FAILURES BEFORE ANY REMOTE CALL
// ============================================================================

#[tokio::test]
async fn test_expired_session_names_remediation() {
    let harness = Harness::new();
    let connector = MockConnector::new().with_expired_profile("acme-sso");

    let err = harness
        .run(&connector, &MockExporter::new(), &parquet_customer("acme", "acme-sso"), "sales")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CymballicError::Session(SessionError::Expired { .. })
    ));
    assert!(err
        .to_string()
        .contains("aws sso login --profile acme-sso --no-browser"));
    assert!(connector.storage.calls().is_empty());
    assert!(!Path::new(&harness.workspace.log_root).exists());
}

#[tokio::test]
async fn test_unknown_data_type_is_rejected() {
    let harness = Harness::new();
    let connector = MockConnector::new();
    let mut customer = parquet_customer("acme", "acme-sso");
    customer.data_type = "csv".to_string();

    let err = harness
        .run(&connector, &MockExporter::new(), &customer, "sales")
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Unknown data type csv");
    assert!(connector.connected_profiles().is_empty());
}

#[tokio::test]
async fn test_invalid_table_name_is_rejected() {
    let harness = Harness::new();
    let connector = MockConnector::new();

    let err = harness
        .run(
            &connector,
            &MockExporter::new(),
            &postgres_customer("acme", "acme-sso"),
            "orders; drop table orders",
        )
        .await
        .unwrap_err();

    assert!(matches!(err, CymballicError::Config(_)));
    assert!(connector.connected_profiles().is_empty());
}
