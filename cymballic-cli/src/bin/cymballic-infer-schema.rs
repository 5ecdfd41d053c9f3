//! Print the Glue columns inferred for a local Parquet file.

use clap::Parser;
use cymballic_cli::{init_tracing, TelemetryConfig};
use cymballic_export::columns_from_file;
use std::path::PathBuf;
use std::process::ExitCode;

/// Read a Parquet file's schema and print it as a Glue column list.
#[derive(Parser, Debug)]
#[command(name = "cymballic-infer-schema", version)]
struct Args {
    /// Parquet file to inspect.
    file: PathBuf,
}

fn main() -> ExitCode {
    let args = Args::parse();
    if let Err(err) = init_tracing(&TelemetryConfig::default()) {
        eprintln!("Failed to initialize logging: {err}");
        return ExitCode::FAILURE;
    }

    let columns = match columns_from_file(&args.file) {
        Ok(columns) => columns,
        Err(err) => {
            tracing::error!("{err}");
            return ExitCode::FAILURE;
        }
    };
    match serde_json::to_string_pretty(&columns) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(error = %err, "Failed to render schema");
            ExitCode::FAILURE
        }
    }
}
