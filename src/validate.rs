//! Expected-vs-actual checks for a provisioned table.

use crate::error::ValidatorError;
use crate::types::{BillingMode, LiveTableSnapshot, ProvisionedOutputs, ResourceRequest, STATUS_ACTIVE};

/// Compare the request against the engine outputs and the live table.
///
/// Checks run in a fixed order and the first mismatch is returned; there is no
/// partial success.
pub fn validate(
    expected: &ResourceRequest,
    outputs: &ProvisionedOutputs,
    live: &LiveTableSnapshot,
) -> Result<(), ValidatorError> {
    let name = expected.name();
    let mode = expected.billing_mode().as_str();

    if !outputs.arn.contains(name) {
        return Err(ValidatorError::mismatch(
            "output dynamodb_table_arn",
            format!("an ARN containing {name}"),
            &outputs.arn,
        ));
    }
    check_eq("output dynamodb_table_id", name, &outputs.id)?;
    check_eq("output dynamodb_table_name", name, &outputs.name)?;
    check_eq("output dynamodb_table_billing_mode", mode, &outputs.billing_mode)?;

    check_eq("live table name", name, &live.name)?;
    check_eq("live table status", STATUS_ACTIVE, &live.status)?;
    check_eq("live billing mode", mode, &live.billing_mode)?;

    if expected.billing_mode() == BillingMode::Provisioned
        && let Some(capacity) = expected.capacity()
    {
        check_capacity("live read capacity", capacity.read, live.read_capacity)?;
        check_capacity("live write capacity", capacity.write, live.write_capacity)?;
    }

    Ok(())
}

fn check_eq(field: &'static str, expected: &str, actual: &str) -> Result<(), ValidatorError> {
    if expected == actual {
        Ok(())
    } else {
        Err(ValidatorError::mismatch(field, expected, actual))
    }
}

fn check_capacity(
    field: &'static str,
    expected: i64,
    actual: Option<i64>,
) -> Result<(), ValidatorError> {
    match actual {
        Some(v) if v == expected => Ok(()),
        Some(v) => Err(ValidatorError::mismatch(field, expected, v)),
        None => Err(ValidatorError::mismatch(field, expected, "<absent>")),
    }
}
