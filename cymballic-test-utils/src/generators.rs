//! Proptest generators.

use cymballic_core::naming::{bucket_arn, bucket_objects_arn};
use cymballic_core::{ColumnDescriptor, ColumnType, Principal, Statement};
use proptest::prelude::*;

/// Lowercase customer names that are valid bucket and database names.
pub fn arb_customer() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9]{3,12}"
}

/// Valid table names.
pub fn arb_table_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,15}"
}

pub fn arb_column_type() -> impl Strategy<Value = ColumnType> {
    prop_oneof![
        Just(ColumnType::String),
        Just(ColumnType::Double),
        Just(ColumnType::Bigint),
    ]
}

pub fn arb_columns() -> impl Strategy<Value = Vec<ColumnDescriptor>> {
    prop::collection::vec(
        ("[a-z][a-z0-9_]{0,10}", arb_column_type())
            .prop_map(|(name, column_type)| ColumnDescriptor::new(name, column_type)),
        0..6,
    )
}

/// Read grant on `bucket` for a generated set of account roots.
pub fn arb_bucket_statement(bucket: String) -> impl Strategy<Value = Statement> {
    prop::collection::vec("[0-9]{12}", 1..3).prop_map(move |accounts| {
        Statement::allow(
            vec!["s3:GetObject", "s3:ListBucket"],
            vec![bucket_arn(&bucket), bucket_objects_arn(&bucket)],
        )
        .with_principal(Principal::aws(
            accounts
                .into_iter()
                .map(|account| format!("arn:aws:iam::{account}:root"))
                .collect(),
        ))
    })
}
