//! Onboard one customer table into the source account's catalog.

use clap::Parser;
use cymballic_aws::AwsConnector;
use cymballic_cli::{init_tracing, onboard, OnboardRequest, TelemetryConfig, Workspace};
use cymballic_core::{CustomerConfig, CymballicResult, GlobalConfig, LOG_ROOT};
use cymballic_export::PostgresExporter;
use std::path::PathBuf;
use std::process::ExitCode;

/// Export or locate a customer table, register it in the customer's Glue
/// catalog and share the catalog with the host account.
#[derive(Parser, Debug)]
#[command(name = "cymballic-onboard", version)]
struct Args {
    /// Path to the customer configuration file.
    #[arg(long, short)]
    config: PathBuf,

    /// Table to onboard. Also used as the Glue table name and S3 prefix.
    #[arg(long, short)]
    table: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();
    if let Err(err) = init_tracing(&TelemetryConfig::default()) {
        eprintln!("Failed to initialize logging: {err}");
        return ExitCode::FAILURE;
    }

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> CymballicResult<()> {
    let global = GlobalConfig::load()?;
    let customer = CustomerConfig::from_path(&args.config)?;
    let connector = AwsConnector::new(&global);
    let request = OnboardRequest {
        global: &global,
        customer: &customer,
        config_path: &args.config,
        table: &args.table,
    };
    let workspace = Workspace::new(LOG_ROOT, std::env::temp_dir());
    onboard(&connector, &PostgresExporter::new(), &request, &workspace).await?;
    Ok(())
}
