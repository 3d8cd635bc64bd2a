mod terraform;

pub use terraform::TerraformCli;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;

/// Terraform errors that are worth retrying: provider downloads, registry
/// hiccups, throttling. Anything else fails on the first attempt.
pub const DEFAULT_RETRYABLE_ERRORS: &[&str] = &[
    r".*read: connection reset by peer.*",
    r".*TLS handshake timeout.*",
    r".*unexpected EOF.*",
    r".*Error installing provider.*",
    r".*Failed to query available provider packages.*",
    r".*could not query provider registry for.*",
    r".*timeout while waiting for plugin to start.*",
    r".*timed out waiting for server handshake.*",
    r".*429 Too Many Requests.*",
    r".*ThrottlingException.*",
    r".*Error: Failed to install provider.*",
];

/// How the engine retries transient command failures.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub time_between_retries: Duration,
    /// Matched against combined stdout+stderr of a failed command.
    pub retryable_errors: Vec<Regex>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            time_between_retries: Duration::from_secs(5),
            retryable_errors: DEFAULT_RETRYABLE_ERRORS
                .iter()
                .filter_map(|p| Regex::new(p).ok())
                .collect(),
        }
    }
}

/// Compile retryable-error patterns, failing on the first invalid one.
pub fn compile_patterns<I, S>(patterns: I) -> Result<Vec<Regex>, regex::Error>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    patterns.into_iter().map(|p| Regex::new(p.as_ref())).collect()
}

impl RetryPolicy {
    /// A policy that never retries.
    pub const fn none() -> Self {
        Self {
            max_retries: 0,
            time_between_retries: Duration::ZERO,
            retryable_errors: Vec::new(),
        }
    }

    pub(crate) fn is_retryable(&self, output: &str) -> bool {
        crate::error::matches_error_patterns(output, &self.retryable_errors)
    }
}

/// One Terraform working directory plus the variables and environment every
/// command against it is run with.
#[derive(Debug, Clone)]
pub struct TerraformOptions {
    pub dir: PathBuf,
    pub vars: BTreeMap<String, serde_json::Value>,
    pub env: BTreeMap<String, String>,
    pub retry: RetryPolicy,
}

/// External declarative-infrastructure engine.
///
/// `init` never creates resources; `apply` may, even when it fails.
/// `destroy_blocking` exists for the teardown guard's `Drop`, which cannot await.
#[async_trait]
pub trait InfraEngine: Send + Sync {
    /// Prepare the working directory (providers, modules).
    async fn init(&self, options: &TerraformOptions) -> Result<()>;

    /// Idempotent create-or-update.
    async fn apply(&self, options: &TerraformOptions) -> Result<()>;

    /// All outputs from state, keyed by name, with their plain values.
    async fn outputs(
        &self,
        options: &TerraformOptions,
    ) -> Result<BTreeMap<String, serde_json::Value>>;

    async fn destroy(&self, options: &TerraformOptions) -> Result<()>;

    fn destroy_blocking(&self, options: &TerraformOptions) -> Result<()>;
}
