//! Statements granting the host account access to a customer's data.

use crate::config::GlobalConfig;
use crate::naming::{
    account_root_arn, bucket_arn, bucket_objects_arn, glue_catalog_arn, glue_database_arn,
    glue_tables_arn, role_arn,
};
use crate::policy::{Principal, Statement};

/// Service principal that shares catalog resources across accounts.
pub const RAM_SERVICE: &str = "ram.amazonaws.com";

fn host_roles(global: &GlobalConfig) -> Vec<String> {
    vec![
        role_arn(&global.aws_account_id, &global.iam_service_role),
        role_arn(&global.aws_account_id, &global.iam_sso_role),
    ]
}

fn catalog_resources(region: &str, source_account_id: &str, database: &str) -> Vec<String> {
    vec![
        glue_catalog_arn(region, source_account_id),
        glue_database_arn(region, source_account_id, database),
        glue_tables_arn(region, source_account_id, database),
    ]
}

/// Bucket policy statements: the host roles may read the bucket.
pub fn bucket_read_statements(global: &GlobalConfig, bucket: &str) -> Vec<Statement> {
    vec![Statement::allow(
        vec!["s3:GetObject", "s3:ListBucket", "s3:GetBucketLocation"],
        vec![bucket_arn(bucket), bucket_objects_arn(bucket)],
    )
    .with_principal(Principal::aws(host_roles(global)))]
}

/// Catalog resource policy statements in the source account: the host account
/// gets full catalog access to the database, and the resource share service
/// may share it.
pub fn catalog_share_statements(
    global: &GlobalConfig,
    source_account_id: &str,
    database: &str,
) -> Vec<Statement> {
    let resources = catalog_resources(&global.aws_region, source_account_id, database);
    let mut principals = vec![account_root_arn(&global.aws_account_id)];
    principals.extend(host_roles(global));

    vec![
        Statement::allow(vec!["glue:*"], resources.clone()).with_principal(Principal::aws(principals)),
        Statement::allow("glue:ShareResource", resources)
            .with_principal(Principal::service(RAM_SERVICE)),
    ]
}

/// Identity policy statements for the host service role: query the source
/// catalog and read/write the customer bucket.
pub fn host_role_statements(
    region: &str,
    source_account_id: &str,
    database: &str,
    bucket: &str,
) -> Vec<Statement> {
    vec![
        Statement::allow(
            vec!["glue:*", "sts:AssumeRole"],
            catalog_resources(region, source_account_id, database),
        ),
        Statement::allow(
            vec![
                "s3:GetObject",
                "s3:GetBucketLocation",
                "s3:ListBucket",
                "s3:PutObject",
            ],
            vec![bucket_arn(bucket), bucket_objects_arn(bucket)],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn global() -> GlobalConfig {
        GlobalConfig {
            aws_region: "us-east-1".to_string(),
            aws_account_id: "111122223333".to_string(),
            aws_account_profile: "host-admin".to_string(),
            iam_service_role: "athena-service".to_string(),
            iam_sso_role: "analyst".to_string(),
        }
    }

    #[test]
    fn test_bucket_read_statements_grant_host_roles() {
        let statements = bucket_read_statements(&global(), "acme");
        assert_eq!(statements.len(), 1);
        let value = serde_json::to_value(&statements[0]).unwrap();
        assert_eq!(
            value["Principal"]["AWS"][0],
            "arn:aws:iam::111122223333:role/athena-service"
        );
        assert_eq!(value["Resource"][1], "arn:aws:s3:::acme/*");
    }

    #[test]
    fn test_catalog_share_statements_reference_database() {
        let statements = catalog_share_statements(&global(), "444455556666", "acme");
        assert_eq!(statements.len(), 2);
        assert!(statements.iter().all(|s| s.references("acme")));
        let value = serde_json::to_value(&statements[0]).unwrap();
        assert_eq!(value["Principal"]["AWS"][0], "arn:aws:iam::111122223333:root");
    }

    #[test]
    fn test_host_role_statements_have_no_principal() {
        let statements = host_role_statements("us-east-1", "444455556666", "acme", "acme");
        assert_eq!(statements.len(), 2);
        assert!(statements.iter().all(|s| s.principal.is_none()));
        assert!(statements.iter().all(|s| s.references("acme")));
    }
}
