//! Shared test infrastructure: config from env vars and the validator under test.

use std::sync::Arc;

use dynamo_provision_check::describe::DynamoDbDescriber;
use dynamo_provision_check::engine::TerraformCli;
use dynamo_provision_check::{ProvisioningValidator, RunReport, ValidatorConfig};

pub use dynamo_provision_check::telemetry::init_test_tracing as init_tracing;

/// Load config from the environment, panicking with the reason on bad input.
pub fn test_config() -> ValidatorConfig {
    match ValidatorConfig::from_env() {
        Ok(config) => config,
        Err(e) => panic!("invalid test configuration: {e}"),
    }
}

/// Validator backed by the Terraform CLI and the real DynamoDB control plane.
pub fn live_validator(config: &ValidatorConfig) -> ProvisioningValidator {
    ProvisioningValidator::new(
        Arc::new(TerraformCli::new(config.terraform_binary.clone())),
        Arc::new(DynamoDbDescriber::new()),
        config,
    )
}

pub fn print_report(report: &RunReport) {
    tracing::info!(
        "  table={} arn={} status={} billing_mode={} rcu={:?} wcu={:?}",
        report.table_name,
        report.outputs.arn,
        report.live.status,
        report.live.billing_mode,
        report.live.read_capacity,
        report.live.write_capacity
    );
    tracing::info!("  phases={:?}", report.phases);
}
