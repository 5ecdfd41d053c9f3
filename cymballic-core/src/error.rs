//! Error types for cymballic operations

use thiserror::Error;

/// Builds the command an operator runs to refresh an SSO session.
pub fn sso_login_command(profile: &str) -> String {
    format!("aws sso login --profile {} --no-browser", profile)
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Failed to read configuration {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("Failed to parse configuration {path}: {reason}")]
    Parse { path: String, reason: String },

    #[error("Missing required configuration field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Identity session errors. Every variant that an operator can fix carries the
/// exact remediation command in its message.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error(
        "AWS SSO session has expired or is invalid for profile '{profile}'.\nPlease run: {}",
        sso_login_command(.profile)
    )]
    Expired { profile: String, detail: String },

    #[error(
        "No active session for profile {profile}. Please run: {}",
        sso_login_command(.profile)
    )]
    NoActiveSession { profile: String, detail: String },

    #[error("Failed to load AWS profile configuration: {reason}")]
    ProfileLoad { reason: String },

    #[error("Profile {profile} not found in the AWS config file")]
    ProfileNotFound { profile: String },

    #[error("Could not find sso_account_id for profile {profile}")]
    AccountIdUnavailable { profile: String },
}

/// Failure of a call to a remote collaborator.
///
/// Adapters classify provider errors into these variants at the boundary, so
/// idempotent operations can match on `AlreadyExists` instead of inspecting
/// message text.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RemoteError {
    #[error("{resource} already exists")]
    AlreadyExists { resource: String },

    #[error("{resource} not found")]
    NotFound { resource: String },

    #[error("{operation} failed: {detail}")]
    Call { operation: String, detail: String },
}

impl RemoteError {
    pub fn already_exists(resource: impl Into<String>) -> Self {
        RemoteError::AlreadyExists {
            resource: resource.into(),
        }
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        RemoteError::NotFound {
            resource: resource.into(),
        }
    }

    pub fn call(operation: impl Into<String>, detail: impl ToString) -> Self {
        RemoteError::Call {
            operation: operation.into(),
            detail: detail.to_string(),
        }
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, RemoteError::AlreadyExists { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RemoteError::NotFound { .. })
    }
}

/// Result type alias for remote collaborator calls.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Failure of a single schema inference strategy. The fallback chain logs and
/// swallows these, so they never reach the caller.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchemaInferenceError {
    #[error("Could not read schema from {location}: {reason}")]
    Unreadable { location: String, reason: String },

    #[error(transparent)]
    Remote(#[from] RemoteError),
}

/// Unknown `type` value in a customer configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unknown data type {value}")]
pub struct UnsupportedTypeError {
    pub value: String,
}

/// Policy reconciliation errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PolicyError {
    #[error("Failed to write policy snapshot {path}: {reason}")]
    Snapshot { path: String, reason: String },

    #[error("Existing {policy} is not a valid policy document: {reason}")]
    Malformed { policy: String, reason: String },

    #[error("Failed to fetch {policy}: {source}")]
    Fetch { policy: String, source: RemoteError },

    #[error("Failed to update {policy}. Policy saved at {snapshot}\nError: {source}")]
    Apply {
        policy: String,
        snapshot: String,
        source: RemoteError,
    },
}

/// Table export errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExportError {
    #[error("Failed to connect to database {database} at {host}: {reason}")]
    Connect {
        host: String,
        database: String,
        reason: String,
    },

    #[error("Failed to export data from table {table}: {reason}")]
    Query { table: String, reason: String },

    #[error("Failed to write parquet file {path}: {reason}")]
    Write { path: String, reason: String },
}

/// Master error type for all cymballic errors.
#[derive(Debug, Clone, Error)]
pub enum CymballicError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("Remote call error: {0}")]
    Remote(#[from] RemoteError),

    #[error("Schema inference error: {0}")]
    SchemaInference(#[from] SchemaInferenceError),

    #[error(transparent)]
    UnsupportedType(#[from] UnsupportedTypeError),

    #[error("Policy error: {0}")]
    Policy(#[from] PolicyError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    #[error("Parquet file not found at {location}")]
    MissingObject { location: String },
}

/// Result type alias for cymballic operations.
pub type CymballicResult<T> = Result<T, CymballicError>;

// =============================================================================
// TESTS
// =============================================================================
