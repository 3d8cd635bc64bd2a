use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ValidatorError;

pub const OUTPUT_TABLE_ARN: &str = "dynamodb_table_arn";
pub const OUTPUT_TABLE_ID: &str = "dynamodb_table_id";
pub const OUTPUT_TABLE_NAME: &str = "dynamodb_table_name";
pub const OUTPUT_BILLING_MODE: &str = "dynamodb_table_billing_mode";

/// Outputs declared by the Terraform module, read back after apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvisionedOutputs {
    pub arn: String,
    pub id: String,
    pub name: String,
    pub billing_mode: String,
}

impl ProvisionedOutputs {
    /// Pick the declared outputs out of a `name -> value` map.
    pub fn from_outputs(
        outputs: &BTreeMap<String, serde_json::Value>,
    ) -> Result<Self, ValidatorError> {
        Ok(Self {
            arn: string_output(outputs, OUTPUT_TABLE_ARN)?,
            id: string_output(outputs, OUTPUT_TABLE_ID)?,
            name: string_output(outputs, OUTPUT_TABLE_NAME)?,
            billing_mode: string_output(outputs, OUTPUT_BILLING_MODE)?,
        })
    }
}

fn string_output(
    outputs: &BTreeMap<String, serde_json::Value>,
    name: &str,
) -> Result<String, ValidatorError> {
    let value = outputs
        .get(name)
        .ok_or_else(|| ValidatorError::MissingOutput(name.to_string()))?;
    value
        .as_str()
        .map(String::from)
        .ok_or_else(|| ValidatorError::MalformedOutput {
            name: name.to_string(),
            reason: format!("expected a string, got {value}"),
        })
}
