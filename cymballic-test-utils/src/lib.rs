//! Cymballic Test Utilities
//!
//! Shared test infrastructure for the cymballic workspace:
//! - In-memory mocks of every collaborator trait
//! - Proptest generators
//! - Configuration and Parquet fixtures

pub mod fixtures;
pub mod generators;
pub mod mocks;

pub use fixtures::*;
pub use generators::*;
pub use mocks::{
    MockCatalog, MockConnector, MockDataCatalogs, MockExporter, MockObjectStorage,
    MockRolePolicies, MockSession,
};
