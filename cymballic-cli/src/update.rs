//! Granting the host account query access to an onboarded customer.

use chrono::Local;
use cymballic_aws::{
    customer_catalog, reconcile_policy, register_catalog, CatalogRegistration, CloudConnector,
    CloudSession, RolePolicy,
};
use cymballic_core::grants::host_role_statements;
use cymballic_core::naming::CustomerNames;
use cymballic_core::{CustomerConfig, CymballicResult, GlobalConfig, RunLog};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct UpdateSummary {
    pub catalog: String,
    pub database: String,
    pub source_account_id: String,
    pub registration: CatalogRegistration,
    pub role_policy_snapshot: PathBuf,
}

/// Run the update workflow in the host account.
pub async fn update<C: CloudConnector>(
    connector: &C,
    global: &GlobalConfig,
    customer: &CustomerConfig,
    log_root: &Path,
) -> CymballicResult<UpdateSummary> {
    let names = CustomerNames::new(&customer.customer);
    tracing::info!(customer = %names.customer, "Starting update");

    let session = connector.connect(&global.aws_account_profile).await?;
    let source_account_id = connector
        .profile_account_id(&customer.aws_profile)
        .await?;
    tracing::info!(
        profile = %customer.aws_profile,
        account_id = %source_account_id,
        "Resolved source account"
    );

    let run_log = RunLog::create(log_root, Local::now())?;
    let role_policy_snapshot = reconcile_policy(
        &RolePolicy::new(session.role_policies(), &global.iam_service_role),
        &run_log,
        &names.database,
        host_role_statements(
            &global.aws_region,
            &source_account_id,
            &names.database,
            &names.bucket,
        ),
    )
    .await?;

    let spec = customer_catalog(&names, &source_account_id);
    let registration = register_catalog(session.data_catalogs(), &spec).await?;

    tracing::info!(
        catalog = %names.catalog,
        database = %names.database,
        "Update complete. Query the database through the catalog"
    );

    Ok(UpdateSummary {
        catalog: names.catalog,
        database: names.database,
        source_account_id,
        registration,
        role_policy_snapshot,
    })
}
