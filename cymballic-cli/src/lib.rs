//! Cymballic CLI
//!
//! The onboarding and update workflows behind the `cymballic-onboard` and
//! `cymballic-update` binaries. Both are generic over [`CloudConnector`] so
//! they run unchanged against in-memory collaborators.
//!
//! [`CloudConnector`]: cymballic_aws::CloudConnector

pub mod onboard;
pub mod telemetry;
pub mod update;

pub use onboard::{onboard, OnboardRequest, OnboardSummary, Workspace};
pub use telemetry::{init_tracing, LogFormat, TelemetryConfig};
pub use update::{update, UpdateSummary};
