use std::collections::BTreeMap;
use std::process::Output;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::{InfraEngine, TerraformOptions};

/// Drives the `terraform` CLI as a child process.
#[derive(Debug, Clone)]
pub struct TerraformCli {
    binary: String,
}

impl Default for TerraformCli {
    fn default() -> Self {
        Self::new("terraform")
    }
}

const DESTROY_LOCK_TIMEOUT: &str = "-lock-timeout=120s";

/// Result of one command attempt.
enum Attempt {
    Done(String),
    Retry,
    Fail(anyhow::Error),
}

/// One entry of `terraform output -json`.
#[derive(Deserialize)]
struct OutputEntry {
    value: serde_json::Value,
}

impl TerraformCli {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    fn init_args() -> Vec<String> {
        ["init", "-upgrade=false", "-input=false", "-no-color"]
            .map(String::from)
            .to_vec()
    }

    fn apply_args(options: &TerraformOptions) -> Vec<String> {
        let mut args: Vec<String> = ["apply", "-input=false", "-auto-approve", "-no-color"]
            .map(String::from)
            .to_vec();
        args.extend(var_args(&options.vars));
        args
    }

    fn output_args() -> Vec<String> {
        ["output", "-no-color", "-json"].map(String::from).to_vec()
    }

    /// Destroy waits for the state lock, so it never runs alongside an apply
    /// that is still shutting down in the same directory.
    fn destroy_args(options: &TerraformOptions) -> Vec<String> {
        let mut args: Vec<String> = [
            "destroy",
            "-input=false",
            "-auto-approve",
            DESTROY_LOCK_TIMEOUT,
            "-no-color",
        ]
        .map(String::from)
        .to_vec();
        args.extend(var_args(&options.vars));
        args
    }

    /// Decide what to do with the outcome of attempt number `attempt` (0-based).
    fn classify(
        &self,
        args: &[String],
        attempt: u32,
        options: &TerraformOptions,
        result: std::io::Result<Output>,
    ) -> Attempt {
        let subcommand = args.first().map_or("", String::as_str);
        let output = match result {
            Ok(o) => o,
            Err(e) => {
                return Attempt::Fail(anyhow::Error::new(e).context(format!(
                    "running {} {subcommand} (is terraform installed?)",
                    self.binary
                )));
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if output.status.success() {
            return Attempt::Done(stdout);
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let combined = format!("{stdout}\n{stderr}");
        if attempt < options.retry.max_retries && options.retry.is_retryable(&combined) {
            warn!(
                subcommand,
                attempt = attempt + 1,
                max_retries = options.retry.max_retries,
                "terraform hit a retryable error, retrying"
            );
            return Attempt::Retry;
        }

        Attempt::Fail(anyhow::anyhow!(
            "terraform {subcommand} exited with {}: {}",
            output.status,
            stderr.trim()
        ))
    }

    async fn run(&self, options: &TerraformOptions, args: &[String]) -> Result<String> {
        let mut attempt = 0;
        loop {
            debug!(dir = %options.dir.display(), ?args, "running terraform");
            let result = tokio::process::Command::new(&self.binary)
                .args(args)
                .current_dir(&options.dir)
                .envs(&options.env)
                .env("TF_IN_AUTOMATION", "1")
                // A cancelled run must not leave apply running under the guard's destroy.
                .kill_on_drop(true)
                .output()
                .await;
            match self.classify(args, attempt, options, result) {
                Attempt::Done(stdout) => return Ok(stdout),
                Attempt::Fail(e) => return Err(e),
                Attempt::Retry => {
                    attempt += 1;
                    tokio::time::sleep(options.retry.time_between_retries).await;
                }
            }
        }
    }

    fn run_blocking(&self, options: &TerraformOptions, args: &[String]) -> Result<String> {
        let mut attempt = 0;
        loop {
            debug!(dir = %options.dir.display(), ?args, "running terraform (blocking)");
            let result = std::process::Command::new(&self.binary)
                .args(args)
                .current_dir(&options.dir)
                .envs(&options.env)
                .env("TF_IN_AUTOMATION", "1")
                .output();
            match self.classify(args, attempt, options, result) {
                Attempt::Done(stdout) => return Ok(stdout),
                Attempt::Fail(e) => return Err(e),
                Attempt::Retry => {
                    attempt += 1;
                    std::thread::sleep(options.retry.time_between_retries);
                }
            }
        }
    }
}

/// `-var key=value` pairs. Strings are passed raw, everything else as JSON
/// (which Terraform parses as an HCL expression).
fn var_args(vars: &BTreeMap<String, serde_json::Value>) -> Vec<String> {
    vars.iter()
        .flat_map(|(k, v)| {
            let value = match v {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            ["-var".to_string(), format!("{k}={value}")]
        })
        .collect()
}

/// Parse `terraform output -json` into `name -> value`.
fn parse_outputs(stdout: &str) -> Result<BTreeMap<String, serde_json::Value>> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Ok(BTreeMap::new());
    }
    let entries: BTreeMap<String, OutputEntry> =
        serde_json::from_str(trimmed).context("parsing terraform output -json")?;
    Ok(entries.into_iter().map(|(k, e)| (k, e.value)).collect())
}

#[async_trait]
impl InfraEngine for TerraformCli {
    async fn init(&self, options: &TerraformOptions) -> Result<()> {
        info!(dir = %options.dir.display(), "terraform init");
        self.run(options, &Self::init_args())
            .await
            .context("terraform init")?;
        Ok(())
    }

    async fn apply(&self, options: &TerraformOptions) -> Result<()> {
        info!(dir = %options.dir.display(), "terraform apply");
        self.run(options, &Self::apply_args(options))
            .await
            .context("terraform apply")?;
        Ok(())
    }

    async fn outputs(
        &self,
        options: &TerraformOptions,
    ) -> Result<BTreeMap<String, serde_json::Value>> {
        let stdout = self.run(options, &Self::output_args()).await?;
        parse_outputs(&stdout)
    }

    async fn destroy(&self, options: &TerraformOptions) -> Result<()> {
        info!(dir = %options.dir.display(), "terraform destroy");
        self.run(options, &Self::destroy_args(options))
            .await
            .context("terraform destroy")?;
        Ok(())
    }

    fn destroy_blocking(&self, options: &TerraformOptions) -> Result<()> {
        info!(dir = %options.dir.display(), "terraform destroy (blocking)");
        self.run_blocking(options, &Self::destroy_args(options))
            .context("terraform destroy")?;
        Ok(())
    }
}
