use aws_sdk_dynamodb::types::TableDescription;
use serde::{Deserialize, Serialize};

use super::request::BillingMode;

/// Status string DynamoDB reports once a table is usable.
pub const STATUS_ACTIVE: &str = "ACTIVE";

/// Live table attributes, fetched fresh from `DescribeTable` at validation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveTableSnapshot {
    pub name: String,
    /// Wire spelling, e.g. `ACTIVE`, `CREATING`.
    pub status: String,
    pub billing_mode: String,
    pub read_capacity: Option<i64>,
    pub write_capacity: Option<i64>,
}

impl LiveTableSnapshot {
    /// Flatten a `TableDescription`.
    ///
    /// `BillingModeSummary` is only reported for tables that have been on-demand at
    /// some point; its absence means `PROVISIONED`.
    pub fn from_description(table: &TableDescription) -> Self {
        let billing_mode = table
            .billing_mode_summary()
            .and_then(|s| s.billing_mode())
            .map_or_else(
                || BillingMode::Provisioned.as_str().to_string(),
                |m| m.as_str().to_string(),
            );
        let throughput = table.provisioned_throughput();

        Self {
            name: table.table_name().unwrap_or_default().to_string(),
            status: table
                .table_status()
                .map(|s| s.as_str().to_string())
                .unwrap_or_default(),
            billing_mode,
            read_capacity: throughput.and_then(|t| t.read_capacity_units()),
            write_capacity: throughput.and_then(|t| t.write_capacity_units()),
        }
    }
}
