//! Onboarding a customer table into the source account's catalog.
//!
//! Steps run strictly in order and stop at the first failure. Every step is
//! idempotent, so a failed run is repaired by running it again.

use chrono::Local;
use cymballic_aws::{
    default_strategies, ensure_bucket, reconcile_policy, register_table, BucketPolicy,
    CatalogResourcePolicy, CloudConnector, CloudSession, TableRegistration,
};
use cymballic_core::grants::{bucket_read_statements, catalog_share_statements};
use cymballic_core::naming::{validate_table_name, CustomerNames};
use cymballic_core::{
    format_elapsed, infer_schema, ColumnDescriptor, CustomerConfig,
    CymballicError, CymballicResult, DataSource, GlobalConfig, ObjectLocation,
    PostgresConnection, RunLog, TableDefinition,
};
use cymballic_export::TableExporter;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Local directories a run writes to.
#[derive(Debug, Clone)]
pub struct Workspace {
    /// Root of the per-run policy snapshot directories.
    pub log_root: PathBuf,
    /// Directory exported Parquet files are staged in before upload.
    pub staging_dir: PathBuf,
}

impl Workspace {
    pub fn new(log_root: impl Into<PathBuf>, staging_dir: impl Into<PathBuf>) -> Self {
        Self {
            log_root: log_root.into(),
            staging_dir: staging_dir.into(),
        }
    }
}

/// Inputs of one onboarding run.
#[derive(Debug, Clone)]
pub struct OnboardRequest<'a> {
    pub global: &'a GlobalConfig,
    pub customer: &'a CustomerConfig,
    /// Path of the customer config, echoed in the follow-up instructions.
    pub config_path: &'a Path,
    pub table: &'a str,
}

#[derive(Debug, Clone)]
pub struct OnboardSummary {
    pub database: String,
    pub table: String,
    pub columns: Vec<ColumnDescriptor>,
    pub registration: TableRegistration,
    pub source_account_id: String,
    pub run_dir: PathBuf,
}

/// Run the onboarding workflow against the customer's source account.
pub async fn onboard<C: CloudConnector>(
    connector: &C,
    exporter: &dyn TableExporter,
    request: &OnboardRequest<'_>,
    workspace: &Workspace,
) -> CymballicResult<OnboardSummary> {
    let started = Instant::now();
    let OnboardRequest {
        global,
        customer,
        config_path,
        table,
    } = *request;

    validate_table_name(table)?;
    let source = customer.source()?;
    let names = CustomerNames::new(&customer.customer);
    tracing::info!(
        customer = %names.customer,
        table,
        data_type = %customer.data_type,
        "Starting onboarding"
    );

    let session = connector.connect(&customer.aws_profile).await?;
    let source_account_id = match connector.profile_account_id(&customer.aws_profile).await {
        Ok(account_id) => account_id,
        Err(err) => {
            tracing::warn!(
                error = %err,
                account_id = session.account_id(),
                "Using the session's caller account as the source account"
            );
            session.account_id().to_string()
        }
    };

    let location = names.table_object(table);
    let columns = match source {
        DataSource::Postgres(connection) => {
            export_and_upload(
                &session,
                exporter,
                &connection,
                &names,
                table,
                &location,
                workspace,
            )
            .await?
        }
        DataSource::Parquet => {
            let storage = session.object_storage();
            if !storage.object_exists(&location).await? {
                return Err(CymballicError::MissingObject {
                    location: location.to_string(),
                });
            }
            tracing::info!(%location, "Found parquet file");
            infer_schema(&default_strategies(storage), &location).await
        }
    };

    let definition = TableDefinition::parquet(
        &names.database,
        table,
        names.table_location(table),
        columns.clone(),
    );
    let registration = register_table(session.catalog(), &definition).await?;

    let run_log = RunLog::create(&workspace.log_root, Local::now())?;
    reconcile_policy(
        &BucketPolicy::new(session.object_storage(), &names.bucket),
        &run_log,
        &names.bucket,
        bucket_read_statements(global, &names.bucket),
    )
    .await?;
    reconcile_policy(
        &CatalogResourcePolicy::new(session.catalog(), &names.database),
        &run_log,
        &names.database,
        catalog_share_statements(global, &source_account_id, &names.database),
    )
    .await?;

    tracing::info!(
        database = %names.database,
        table,
        elapsed = %format_elapsed(started.elapsed()),
        "Onboarding complete"
    );
    tracing::info!("{}", next_steps(global, config_path));

    Ok(OnboardSummary {
        database: names.database,
        table: table.to_string(),
        columns,
        registration,
        source_account_id,
        run_dir: run_log.dir().to_path_buf(),
    })
}

/// Follow-up commands that grant the host account access.
fn next_steps(global: &GlobalConfig, config_path: &Path) -> String {
    format!(
        "Next steps:\n  1. aws sso login --profile {}\n  2. cymballic-update --config {}",
        global.aws_account_profile,
        config_path.display()
    )
}

/// Export the table locally, upload it, and return the live export's columns.
async fn export_and_upload<S: CloudSession>(
    session: &S,
    exporter: &dyn TableExporter,
    connection: &PostgresConnection,
    names: &CustomerNames,
    table: &str,
    location: &ObjectLocation,
    workspace: &Workspace,
) -> CymballicResult<Vec<ColumnDescriptor>> {
    let storage = session.object_storage();
    ensure_bucket(storage, &names.bucket).await?;

    let staging = workspace.staging_dir.join(format!("{table}.parquet"));
    let exported = exporter.export(connection, table, &staging).await?;

    let upload_started = Instant::now();
    storage.upload_file(location, &exported.path).await?;
    tracing::info!(
        %location,
        rows = exported.rows,
        elapsed = %format_elapsed(upload_started.elapsed()),
        "Uploaded parquet file"
    );
    Ok(exported.columns)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_steps_name_host_profile_and_config() {
        let global = GlobalConfig {
            aws_region: "us-east-1".to_string(),
            aws_account_id: "111122223333".to_string(),
            aws_account_profile: "host-admin".to_string(),
            iam_service_role: "athena-service".to_string(),
            iam_sso_role: "analyst-sso".to_string(),
        };
        let steps = next_steps(&global, Path::new("customers/acme.json"));
        assert_eq!(
            steps,
            "Next steps:\n  1. aws sso login --profile host-admin\n  \
             2. cymballic-update --config customers/acme.json"
        );
        assert!(!steps.contains("--no-browser"));
    }
}
