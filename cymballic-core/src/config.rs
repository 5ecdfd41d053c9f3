//! Configuration loading.
//!
//! Two JSON files drive a run: the global `cymballic.json` describing the host
//! account, and a per-customer file passed with `--config`. Both are read once
//! at process start and passed explicitly to every step.

use crate::error::{ConfigError, CymballicError, CymballicResult, UnsupportedTypeError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Fixed location of the global configuration, relative to the working directory.
pub const GLOBAL_CONFIG_PATH: &str = "cymballic.json";

/// Region used when the global configuration does not name one.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Port used when a Postgres configuration does not name one.
pub const DEFAULT_POSTGRES_PORT: u16 = 5432;

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

fn read_config(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

fn require_non_empty(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
            reason: "must not be empty".to_string(),
        });
    }
    Ok(())
}

// ============================================================================
// GLOBAL CONFIGURATION
// ============================================================================

/// Host account settings shared by every customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default = "default_region")]
    pub aws_region: String,
    pub aws_account_id: String,
    pub aws_account_profile: String,
    pub iam_service_role: String,
    pub iam_sso_role: String,
}

impl GlobalConfig {
    /// Load and validate the global configuration from the fixed path.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_path(Path::new(GLOBAL_CONFIG_PATH))
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = read_config(path)?;
        let config: GlobalConfig =
            serde_json::from_str(&contents).map_err(|e| ConfigError::Parse {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty("aws_region", &self.aws_region)?;
        require_non_empty("aws_account_id", &self.aws_account_id)?;
        require_non_empty("aws_account_profile", &self.aws_account_profile)?;
        require_non_empty("iam_service_role", &self.iam_service_role)?;
        require_non_empty("iam_sso_role", &self.iam_sso_role)?;
        Ok(())
    }
}

// ============================================================================
// CUSTOMER CONFIGURATION
// ============================================================================

/// Kind of source data a customer onboards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    /// Export a Postgres table to Parquet.
    Postgres,
    /// Register a Parquet file already present in the bucket.
    Parquet,
}

impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Postgres => "postgres",
            DataType::Parquet => "parquet",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = UnsupportedTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "postgres" => Ok(DataType::Postgres),
            "parquet" => Ok(DataType::Parquet),
            other => Err(UnsupportedTypeError {
                value: other.to_string(),
            }),
        }
    }
}

/// Connection settings for a Postgres export.
#[derive(Clone, PartialEq, Eq)]
pub struct PostgresConnection {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub password: String,
}

impl fmt::Debug for PostgresConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresConnection")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Where the onboarded data comes from, resolved from the `type` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    Postgres(PostgresConnection),
    Parquet,
}

/// Per-customer configuration file.
///
/// The Postgres fields are only checked when the source is resolved, so the
/// update flow can reuse the same file without caring about the data type.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct CustomerConfig {
    pub customer: String,
    #[serde(rename = "type", alias = "data_type")]
    pub data_type: String,
    pub aws_profile: String,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl fmt::Debug for CustomerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomerConfig")
            .field("customer", &self.customer)
            .field("data_type", &self.data_type)
            .field("aws_profile", &self.aws_profile)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .finish_non_exhaustive()
    }
}

impl CustomerConfig {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = read_config(path)?;
        Self::from_json(&contents).map_err(|e| match e {
            ConfigError::Parse { reason, .. } => ConfigError::Parse {
                path: path.display().to_string(),
                reason,
            },
            other => other,
        })
    }

    pub fn from_json(contents: &str) -> Result<Self, ConfigError> {
        let config: CustomerConfig =
            serde_json::from_str(contents).map_err(|e| ConfigError::Parse {
                path: "<inline>".to_string(),
                reason: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        require_non_empty("customer", &self.customer)?;
        require_non_empty("aws_profile", &self.aws_profile)?;
        Ok(())
    }

    /// Resolve the data source, checking the fields the data type requires.
    pub fn source(&self) -> CymballicResult<DataSource> {
        let data_type: DataType = self.data_type.parse()?;
        match data_type {
            DataType::Parquet => Ok(DataSource::Parquet),
            DataType::Postgres => {
                let connection = PostgresConnection {
                    host: required("host", &self.host)?,
                    port: self.port.unwrap_or(DEFAULT_POSTGRES_PORT),
                    database: required("database", &self.database)?,
                    username: required("username", &self.username)?,
                    password: required("password", &self.password)?,
                };
                Ok(DataSource::Postgres(connection))
            }
        }
    }
}

fn required(field: &str, value: &Option<String>) -> Result<String, CymballicError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v.clone()),
        _ => Err(ConfigError::MissingRequired {
            field: field.to_string(),
        }
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_global_config_defaults_region() {
        let file = write_temp(
            r#"{
                "aws_account_id": "111122223333",
                "aws_account_profile": "host-admin",
                "iam_service_role": "athena-service",
                "iam_sso_role": "AWSReservedSSO_Analyst"
            }"#,
        );
        let config = GlobalConfig::from_path(file.path()).unwrap();
        assert_eq!(config.aws_region, "us-east-1");
        assert_eq!(config.iam_service_role, "athena-service");
    }

    #[test]
    fn test_global_config_rejects_empty_role() {
        let file = write_temp(
            r#"{
                "aws_region": "eu-west-1",
                "aws_account_id": "111122223333",
                "aws_account_profile": "host-admin",
                "iam_service_role": " ",
                "iam_sso_role": "sso"
            }"#,
        );
        let err = GlobalConfig::from_path(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "iam_service_role"));
    }

    #[test]
    fn test_global_config_missing_file() {
        let err = GlobalConfig::from_path(Path::new("/nonexistent/cymballic.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_customer_config_postgres_source() {
        let config = CustomerConfig::from_json(
            r#"{
                "customer": "Acme",
                "type": "postgres",
                "aws_profile": "acme-sso",
                "host": "db.internal",
                "database": "sales",
                "username": "reader",
                "password": "hunter2"
            }"#,
        )
        .unwrap();
        match config.source().unwrap() {
            DataSource::Postgres(conn) => {
                assert_eq!(conn.host, "db.internal");
                assert_eq!(conn.port, DEFAULT_POSTGRES_PORT);
                assert!(!format!("{:?}", conn).contains("hunter2"));
            }
            DataSource::Parquet => panic!("expected postgres source"),
        }
    }

    #[test]
    fn test_customer_config_data_type_alias() {
        let config = CustomerConfig::from_json(
            r#"{"customer": "Acme", "data_type": "parquet", "aws_profile": "acme-sso"}"#,
        )
        .unwrap();
        assert_eq!(config.source().unwrap(), DataSource::Parquet);
    }

    #[test]
    fn test_customer_config_missing_postgres_field() {
        let config = CustomerConfig::from_json(
            r#"{"customer": "Acme", "type": "postgres", "aws_profile": "acme-sso", "host": "db"}"#,
        )
        .unwrap();
        let err = config.source().unwrap_err();
        assert!(matches!(
            err,
            CymballicError::Config(ConfigError::MissingRequired { ref field }) if field == "database"
        ));
    }

    #[test]
    fn test_customer_config_unknown_type() {
        let config = CustomerConfig::from_json(
            r#"{"customer": "Acme", "type": "csv", "aws_profile": "acme-sso"}"#,
        )
        .unwrap();
        let err = config.source().unwrap_err();
        assert!(matches!(err, CymballicError::UnsupportedType(_)));
        assert_eq!(err.to_string(), "Unknown data type csv");
    }

    #[test]
    fn test_customer_config_parse_error_names_path() {
        let file = write_temp("{ not json");
        let err = CustomerConfig::from_path(file.path()).unwrap_err();
        match err {
            ConfigError::Parse { path, .. } => assert_eq!(path, file.path().display().to_string()),
            other => panic!("unexpected error {other:?}"),
        }
    }
}
