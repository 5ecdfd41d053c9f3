//! Grant the host account query access to an onboarded customer.

use clap::Parser;
use cymballic_aws::AwsConnector;
use cymballic_cli::{init_tracing, update, TelemetryConfig};
use cymballic_core::{CustomerConfig, CymballicResult, GlobalConfig, LOG_ROOT};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Update the host service role's policy and register the customer's Glue
/// catalog as an Athena data catalog in the host account.
#[derive(Parser, Debug)]
#[command(name = "cymballic-update", version)]
struct Args {
    /// Path to the customer configuration file.
    #[arg(long, short)]
    config: PathBuf,
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
    update(&connector, &global, &customer, Path::new(LOG_ROOT)).await?;
    Ok(())
}
