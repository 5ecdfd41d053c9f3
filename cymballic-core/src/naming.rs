//! Resource naming derived from the customer name.

use crate::config::DEFAULT_REGION;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix of the cross-account data catalog registered in the host account.
pub const CATALOG_PREFIX: &str = "external-cat-";

/// Names of every per-customer resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerNames {
    pub customer: String,
    pub bucket: String,
    pub database: String,
    pub catalog: String,
}

impl CustomerNames {
    pub fn new(customer: &str) -> Self {
        let lower = customer.trim().to_lowercase();
        Self {
            customer: lower.clone(),
            bucket: lower.clone(),
            database: lower.clone(),
            catalog: format!("{}{}", CATALOG_PREFIX, lower),
        }
    }

    /// Location of the table's Parquet object inside the customer bucket.
    pub fn table_object(&self, table: &str) -> ObjectLocation {
        ObjectLocation::new(&self.bucket, format!("{table}/{table}.parquet"))
    }

    /// Storage location registered on the catalog table (the table's prefix).
    pub fn table_location(&self, table: &str) -> String {
        format!("s3://{}/{}/", self.bucket, table)
    }
}

/// A single object in a bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectLocation {
    pub bucket: String,
    pub key: String,
}

impl ObjectLocation {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }
}

impl fmt::Display for ObjectLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}

/// Table names end up in SQL, object keys and catalog entries, so only plain
/// identifiers are accepted.
pub fn validate_table_name(table: &str) -> Result<(), ConfigError> {
    let valid = !table.is_empty()
        && table
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid {
        return Err(ConfigError::InvalidValue {
            field: "table".to_string(),
            value: table.to_string(),
            reason: "must contain only ASCII letters, digits and underscores".to_string(),
        });
    }
    Ok(())
}

/// Location constraint for bucket creation. The default region rejects an
/// explicit constraint, every other region requires one.
pub fn location_constraint(region: &str) -> Option<&str> {
    if region == DEFAULT_REGION {
        None
    } else {
        Some(region)
    }
}

// ============================================================================
// ARNs
// ============================================================================

pub fn bucket_arn(bucket: &str) -> String {
    format!("arn:aws:s3:::{bucket}")
}

pub fn bucket_objects_arn(bucket: &str) -> String {
    format!("arn:aws:s3:::{bucket}/*")
}

pub fn glue_catalog_arn(region: &str, account_id: &str) -> String {
    format!("arn:aws:glue:{region}:{account_id}:catalog")
}

pub fn glue_database_arn(region: &str, account_id: &str, database: &str) -> String {
    format!("arn:aws:glue:{region}:{account_id}:database/{database}")
}

pub fn glue_tables_arn(region: &str, account_id: &str, database: &str) -> String {
    format!("arn:aws:glue:{region}:{account_id}:table/{database}/*")
}

pub fn role_arn(account_id: &str, role: &str) -> String {
    format!("arn:aws:iam::{account_id}:role/{role}")
}

pub fn account_root_arn(account_id: &str) -> String {
    format!("arn:aws:iam::{account_id}:root")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_customer_names_are_lowercased() {
        let names = CustomerNames::new("Acme");
        assert_eq!(names.bucket, "acme");
        assert_eq!(names.database, "acme");
        assert_eq!(names.catalog, "external-cat-acme");
    }

    #[test]
    fn test_table_object_and_location() {
        let names = CustomerNames::new("Acme");
        let object = names.table_object("sales");
        assert_eq!(object.key, "sales/sales.parquet");
        assert_eq!(object.to_string(), "s3://acme/sales/sales.parquet");
        assert_eq!(names.table_location("sales"), "s3://acme/sales/");
    }

    #[test]
    fn test_validate_table_name() {
        assert!(validate_table_name("orders_2024").is_ok());
        assert!(validate_table_name("").is_err());
        assert!(validate_table_name("orders; DROP TABLE x").is_err());
        assert!(validate_table_name("public.orders").is_err());
    }

    #[test]
    fn test_location_constraint_branches_on_region() {
        assert_eq!(location_constraint("us-east-1"), None);
        assert_eq!(location_constraint("eu-west-1"), Some("eu-west-1"));
    }

    #[test]
    fn test_glue_arns() {
        assert_eq!(
            glue_database_arn("us-east-1", "444455556666", "acme"),
            "arn:aws:glue:us-east-1:444455556666:database/acme"
        );
        assert_eq!(
            glue_tables_arn("us-east-1", "444455556666", "acme"),
            "arn:aws:glue:us-east-1:444455556666:table/acme/*"
        );
    }
}
