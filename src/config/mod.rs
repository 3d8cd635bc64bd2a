pub mod env;

use std::path::PathBuf;
use std::time::Duration;

use crate::engine::RetryPolicy;
use crate::naming;

/// Region used when `DYNAMODB_TEST_REGION` is unset.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Configuration for provisioning runs, read from environment variables.
#[derive(Debug, Clone)]
pub struct ValidatorConfig {
    /// Terraform executable. Controlled by `TERRAFORM_BINARY` (default: `terraform`).
    pub terraform_binary: String,
    /// Module applied for every run; copied to a scratch dir first.
    /// Controlled by `TERRAFORM_DIR` (default: `terraform/complete` in this crate).
    pub terraform_dir: PathBuf,
    /// Controlled by `DYNAMODB_TEST_REGION` (default: `us-east-1`).
    pub aws_region: String,
    /// Controlled by `TABLE_NAME_PREFIX` (default: `terratest-dynamodb`).
    pub table_name_prefix: String,
    // Engine retry: `TERRAFORM_MAX_RETRIES`, `TERRAFORM_RETRY_SLEEP_SECS`,
    // `TERRAFORM_EXTRA_RETRYABLE_ERRORS` (JSON array, appended to the defaults).
    pub retry: RetryPolicy,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            terraform_binary: "terraform".to_string(),
            terraform_dir: default_terraform_dir(),
            aws_region: DEFAULT_REGION.to_string(),
            table_name_prefix: naming::DEFAULT_PREFIX.to_string(),
            retry: RetryPolicy::default(),
        }
    }
}

fn default_terraform_dir() -> PathBuf {
    PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/terraform/complete"))
}

impl ValidatorConfig {
    /// Read configuration from environment variables.
    pub fn from_env() -> Result<Self, String> {
        let defaults = Self::default();

        let mut retry = defaults.retry;
        retry.max_retries = env::parse_env_u32("TERRAFORM_MAX_RETRIES", retry.max_retries)?;
        retry.time_between_retries = Duration::from_secs(env::parse_env_u64(
            "TERRAFORM_RETRY_SLEEP_SECS",
            retry.time_between_retries.as_secs(),
        )?);
        let extra = env::parse_env_string_list("TERRAFORM_EXTRA_RETRYABLE_ERRORS")?;
        retry.retryable_errors.extend(
            crate::engine::compile_patterns(&extra)
                .map_err(|e| format!("invalid TERRAFORM_EXTRA_RETRYABLE_ERRORS: {e}"))?,
        );

        let table_name_prefix = env::env_or("TABLE_NAME_PREFIX", &defaults.table_name_prefix);
        // The prefix plus "-prov-" plus the suffix must still be a valid table name.
        naming::validate_table_name(&naming::table_name(
            &naming::provisioned_prefix(&table_name_prefix),
            &"0".repeat(naming::SUFFIX_LEN),
        ))
        .map_err(|e| format!("invalid TABLE_NAME_PREFIX: {e}"))?;

        Ok(Self {
            terraform_binary: env::env_or("TERRAFORM_BINARY", &defaults.terraform_binary),
            terraform_dir: std::env::var("TERRAFORM_DIR")
                .ok()
                .filter(|v| !v.is_empty())
                .map_or(defaults.terraform_dir, PathBuf::from),
            aws_region: env::env_or("DYNAMODB_TEST_REGION", &defaults.aws_region),
            table_name_prefix,
            retry,
        })
    }
}
