//! Cymballic Core
//!
//! Configuration, naming, schema inference and policy reconciliation for
//! cross-account catalog onboarding. Nothing in this crate talks to a remote
//! service; the collaborator seams live in `cymballic-aws`.

pub mod config;
pub mod error;
pub mod grants;
pub mod naming;
pub mod policy;
pub mod run_log;
pub mod schema;
pub mod table;

pub use config::{
    CustomerConfig, DataSource, DataType, GlobalConfig, PostgresConnection,
    DEFAULT_POSTGRES_PORT, DEFAULT_REGION, GLOBAL_CONFIG_PATH,
};
pub use error::{
    sso_login_command, ConfigError, CymballicError, CymballicResult, ExportError, PolicyError,
    RemoteError, RemoteResult, SchemaInferenceError, SessionError, UnsupportedTypeError,
};
pub use naming::{CustomerNames, ObjectLocation};
pub use policy::{reconcile, Effect, OneOrMany, PolicyDocument, Principal, Statement, POLICY_VERSION};
pub use run_log::{RunLog, LOG_ROOT};
pub use schema::{
    columns_from_native, infer_schema, ColumnDescriptor, ColumnType, EmptySchema, SchemaStrategy,
};
pub use table::TableDefinition;

use std::time::Duration;

/// Render an elapsed duration as `<minutes>m <seconds>s`.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{}m {}s", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::from_secs(0)), "0m 0s");
        assert_eq!(format_elapsed(Duration::from_millis(125_900)), "2m 5s");
    }
}
