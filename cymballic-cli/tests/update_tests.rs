use cymballic_aws::{customer_catalog, CatalogRegistration};
use cymballic_cli::update;
use cymballic_core::naming::CustomerNames;
use cymballic_core::{CymballicError, PolicyDocument, PolicyError, SessionError};
use cymballic_test_utils::{
    global_config, parquet_customer, MockConnector, MockDataCatalogs, MockRolePolicies,
};

const SOURCE_ACCOUNT: &str = "777788889999";

fn connector() -> MockConnector {
    MockConnector::new().with_profile_account("acme-sso", SOURCE_ACCOUNT)
}

#[tokio::test]
async fn test_update_grants_role_and_registers_catalog() {
    let dir = tempfile::tempdir().unwrap();
    let connector = connector();

    let summary = update(
        &connector,
        &global_config(),
        &parquet_customer("acme", "acme-sso"),
        dir.path(),
    )
    .await
    .unwrap();

    assert_eq!(connector.connected_profiles(), vec!["host-admin".to_string()]);
    assert_eq!(summary.catalog, "external-cat-acme");
    assert_eq!(summary.database, "acme");
    assert_eq!(summary.source_account_id, SOURCE_ACCOUNT);
    assert_eq!(summary.registration, CatalogRegistration::Created);
    assert!(summary
        .role_policy_snapshot
        .ends_with("athena-service-policy.json"));

    let policy = PolicyDocument::from_json(
        &connector
            .role_policies
            .policy("athena-service", "athena-service-policy")
            .unwrap(),
    )
    .unwrap();
    let json = policy.to_json().unwrap();
    assert_eq!(policy.statement.len(), 2);
    assert!(json.contains("sts:AssumeRole"));
    assert!(json.contains("arn:aws:glue:us-east-1:777788889999:database/acme"));
    assert!(json.contains("s3:PutObject"));

    let catalog = connector.data_catalogs.catalog("external-cat-acme").unwrap();
    assert_eq!(catalog.source_account_id, SOURCE_ACCOUNT);
    assert_eq!(catalog.description, "Cross-account Glue catalog for acme");
}

#[tokio::test]
async fn test_update_keeps_other_customers_in_role_policy() {
    let dir = tempfile::tempdir().unwrap();
    let existing = r#"{"Version":"2012-10-17","Statement":[
        {"Effect":"Allow","Action":"glue:*",
         "Resource":["arn:aws:glue:us-east-1:121212121212:database/globex"]},
        {"Effect":"Allow","Action":"glue:*",
         "Resource":["arn:aws:glue:us-east-1:999999999999:database/acme"]}
    ]}"#;
    let connector = connector().with_role_policies(MockRolePolicies::new().with_policy(
        "athena-service",
        "athena-service-policy",
        existing,
    ));

    update(
        &connector,
        &global_config(),
        &parquet_customer("acme", "acme-sso"),
        dir.path(),
    )
    .await
    .unwrap();

    let policy = PolicyDocument::from_json(
        &connector
            .role_policies
            .policy("athena-service", "athena-service-policy")
            .unwrap(),
    )
    .unwrap();
    assert_eq!(policy.statement.len(), 3);
    assert!(policy.statement[0].references("globex"));
    assert!(!policy.to_json().unwrap().contains("999999999999"));
}

#[tokio::test]
async fn test_existing_catalog_is_recreated_once() {
    let dir = tempfile::tempdir().unwrap();
    let stale = customer_catalog(&CustomerNames::new("acme"), "999999999999");
    let connector =
        connector().with_data_catalogs(MockDataCatalogs::new().with_catalog(stale));

    let summary = update(
        &connector,
        &global_config(),
        &parquet_customer("acme", "acme-sso"),
        dir.path(),
    )
    .await
    .unwrap();

    assert_eq!(summary.registration, CatalogRegistration::Recreated);
    assert_eq!(
        connector.data_catalogs.calls(),
        vec![
            "create:external-cat-acme",
            "delete:external-cat-acme",
            "create:external-cat-acme",
        ]
    );
    assert_eq!(
        connector
            .data_catalogs
            .catalog("external-cat-acme")
            .unwrap()
            .source_account_id,
        SOURCE_ACCOUNT
    );
}

#[tokio::test]
async fn test_catalog_delete_failure_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let stale = customer_catalog(&CustomerNames::new("acme"), "999999999999");
    let connector = connector()
        .with_data_catalogs(MockDataCatalogs::new().with_catalog(stale).fail_deletes());

    let err = update(
        &connector,
        &global_config(),
        &parquet_customer("acme", "acme-sso"),
        dir.path(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, CymballicError::Remote(_)));
    assert_eq!(
        connector.data_catalogs.calls(),
        vec!["create:external-cat-acme", "delete:external-cat-acme"]
    );
}

#[tokio::test]
async fn test_missing_source_account_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let connector = MockConnector::new();

    let err = update(
        &connector,
        &global_config(),
        &parquet_customer("acme", "acme-sso"),
        dir.path(),
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        CymballicError::Session(SessionError::AccountIdUnavailable { .. })
    ));
    assert_eq!(
        err.to_string(),
        "Could not find sso_account_id for profile acme-sso"
    );
    assert!(connector.role_policies.calls().is_empty());
    assert!(connector.data_catalogs.calls().is_empty());
}

#[tokio::test]
async fn test_expired_host_session_names_host_profile() {
    let dir = tempfile::tempdir().unwrap();
    let connector = connector().with_expired_profile("host-admin");

    let err = update(
        &connector,
        &global_config(),
        &parquet_customer("acme", "acme-sso"),
        dir.path(),
    )
    .await
    .unwrap_err();

    assert!(err
        .to_string()
        .contains("aws sso login --profile host-admin --no-browser"));
}

#[tokio::test]
async fn test_role_policy_write_failure_keeps_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let connector = connector().with_role_policies(MockRolePolicies::new().fail_writes());

    let err = update(
        &connector,
        &global_config(),
        &parquet_customer("acme", "acme-sso"),
        dir.path(),
    )
    .await
    .unwrap_err();

    let snapshot = match &err {
        CymballicError::Policy(PolicyError::Apply { snapshot, .. }) => snapshot.clone(),
        other => panic!("expected policy apply failure, got {other:?}"),
    };
    assert!(snapshot.ends_with("athena-service-policy.json"));
    assert!(std::path::Path::new(&snapshot).exists());
    assert!(connector.data_catalogs.calls().is_empty());
}

#[tokio::test]
async fn test_consecutive_updates_keep_each_role_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let connector = connector().with_profile_account("globex-sso", "121212121212");

    let acme = update(
        &connector,
        &global_config(),
        &parquet_customer("acme", "acme-sso"),
        dir.path(),
    )
    .await
    .unwrap();
    let globex = update(
        &connector,
        &global_config(),
        &parquet_customer("globex", "globex-sso"),
        dir.path(),
    )
    .await
    .unwrap();

    assert_ne!(acme.role_policy_snapshot, globex.role_policy_snapshot);
    let acme_snapshot = PolicyDocument::from_json(
        &std::fs::read_to_string(&acme.role_policy_snapshot).unwrap(),
    )
    .unwrap();
    let globex_snapshot = PolicyDocument::from_json(
        &std::fs::read_to_string(&globex.role_policy_snapshot).unwrap(),
    )
    .unwrap();
    assert_eq!(acme_snapshot.statement.len(), 2);
    assert_eq!(globex_snapshot.statement.len(), 4);
    assert!(!acme_snapshot.to_json().unwrap().contains("globex"));
}
