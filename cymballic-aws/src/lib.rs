//! Cymballic AWS
//!
//! Collaborator traits for object storage, the metadata catalog, role
//! policies and query catalogs, their AWS SDK adapters, and the idempotent
//! steps the onboarding workflows are built from.

pub mod athena;
pub mod bucket;
pub mod catalog;
pub mod glue;
pub mod iam;
pub mod permissions;
pub mod registrar;
pub mod s3;
pub mod schema;
pub mod session;
pub mod traits;
mod util;

pub use bucket::{ensure_bucket, BucketStatus};
pub use catalog::{customer_catalog, register_catalog, CatalogRegistration};
pub use permissions::{
    reconcile_policy, role_policy_name, BucketPolicy, CatalogResourcePolicy, PolicyStore,
    RolePolicy,
};
pub use registrar::{register_table, TableRegistration};
pub use schema::{default_strategies, ParquetObjectSchema, SampledRecordSchema};
pub use session::{AwsConnector, AwsSession};
pub use traits::{
    CloudConnector, CloudSession, DataCatalogSpec, DataCatalogs, MetadataCatalog, ObjectStorage,
    RolePolicies,
};
