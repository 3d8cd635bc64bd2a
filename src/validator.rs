//! Provision → read outputs → describe → validate → destroy.

use std::fmt;
use std::sync::Arc;

use tracing::{Instrument, error, info, info_span, warn};

use crate::config::ValidatorConfig;
use crate::describe::{DynamoDbDescriber, TableDescriber};
use crate::engine::{InfraEngine, RetryPolicy, TerraformCli, TerraformOptions};
use crate::error::ValidatorError;
use crate::guard::ProvisionGuard;
use crate::types::{LiveTableSnapshot, ProvisionedOutputs, ResourceRequest};
use crate::validate;
use crate::workspace::Workspace;

/// Where a run is. `Destroyed` is always the last entry, even after `Failed`.
///
/// `Destroyed` records that teardown ran, not that it succeeded; see
/// [`RunFailure::teardown_failed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Init,
    Applied,
    OutputsRead,
    Validated,
    Failed,
    Destroyed,
}

/// A run that passed every check.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub table_name: String,
    pub outputs: ProvisionedOutputs,
    pub live: LiveTableSnapshot,
    pub phases: Vec<Phase>,
}

/// A run that failed. `error` is the first failure.
#[derive(Debug)]
pub struct RunFailure {
    pub table_name: String,
    pub phases: Vec<Phase>,
    pub error: ValidatorError,
    /// Destroy failure that followed an earlier error.
    pub teardown_error: Option<ValidatorError>,
}

impl RunFailure {
    /// Last phase reached before the failure.
    pub fn failed_after(&self) -> Phase {
        self.phases
            .iter()
            .rev()
            .find(|p| !matches!(p, Phase::Failed | Phase::Destroyed))
            .copied()
            .unwrap_or(Phase::Init)
    }

    /// Whether the table may still exist.
    pub const fn teardown_failed(&self) -> bool {
        matches!(self.error, ValidatorError::Teardown(_)) || self.teardown_error.is_some()
    }
}

impl fmt::Display for RunFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "run for {} failed after {:?}: {}",
            self.table_name,
            self.failed_after(),
            self.error
        )?;
        if let Some(teardown) = &self.teardown_error {
            write!(f, " (teardown also failed: {teardown})")?;
        }
        Ok(())
    }
}

impl std::error::Error for RunFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

struct PhaseLog {
    table: String,
    phases: Vec<Phase>,
}

impl PhaseLog {
    fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            phases: vec![Phase::Init],
        }
    }

    fn advance(&mut self, phase: Phase) {
        info!(table = %self.table, ?phase, "phase");
        self.phases.push(phase);
    }
}

pub struct ProvisioningValidator {
    engine: Arc<dyn InfraEngine>,
    describer: Arc<dyn TableDescriber>,
    terraform_dir: std::path::PathBuf,
    retry: RetryPolicy,
}

impl ProvisioningValidator {
    pub fn new(
        engine: Arc<dyn InfraEngine>,
        describer: Arc<dyn TableDescriber>,
        config: &ValidatorConfig,
    ) -> Self {
        Self {
            engine,
            describer,
            terraform_dir: config.terraform_dir.clone(),
            retry: config.retry.clone(),
        }
    }

    /// Terraform CLI + real DynamoDB client.
    pub fn from_config(config: &ValidatorConfig) -> Self {
        Self::new(
            Arc::new(TerraformCli::new(config.terraform_binary.clone())),
            Arc::new(DynamoDbDescriber::new()),
            config,
        )
    }

    /// Copy the module to a scratch workspace, then init + apply with the
    /// request's variables. The returned guard owns teardown.
    pub async fn provision(
        &self,
        request: &ResourceRequest,
    ) -> Result<ProvisionGuard, ValidatorError> {
        let workspace = Workspace::copy_from(&self.terraform_dir, request.unique_suffix())
            .map_err(|e| ValidatorError::Configuration(format!("{e:#}")))?;
        let options = TerraformOptions {
            dir: workspace.path().to_path_buf(),
            vars: request.terraform_vars(),
            env: request.terraform_env(),
            retry: self.retry.clone(),
        };
        ProvisionGuard::acquire(
            Arc::clone(&self.engine),
            options,
            Some(workspace),
            request.name(),
        )
        .await
    }

    pub async fn fetch_outputs(
        &self,
        guard: &ProvisionGuard,
    ) -> Result<ProvisionedOutputs, ValidatorError> {
        let outputs = guard
            .engine()
            .outputs(guard.options())
            .await
            .map_err(ValidatorError::Output)?;
        ProvisionedOutputs::from_outputs(&outputs)
    }

    pub async fn describe_live(
        &self,
        region: &str,
        table_name: &str,
    ) -> Result<LiveTableSnapshot, ValidatorError> {
        self.describer.describe_table(region, table_name).await
    }

    pub fn validate(
        &self,
        expected: &ResourceRequest,
        outputs: &ProvisionedOutputs,
        live: &LiveTableSnapshot,
    ) -> Result<(), ValidatorError> {
        validate::validate(expected, outputs, live)
    }

    pub async fn teardown(&self, guard: ProvisionGuard) -> Result<(), ValidatorError> {
        guard.teardown().await
    }

    /// Full lifecycle for one request. Teardown runs on every path.
    pub async fn run(&self, request: &ResourceRequest) -> Result<RunReport, RunFailure> {
        let span = info_span!("provision_run", table = %request.name(), mode = %request.billing_mode());
        self.run_inner(request).instrument(span).await
    }

    async fn run_inner(&self, request: &ResourceRequest) -> Result<RunReport, RunFailure> {
        let mut log = PhaseLog::new(request.name());

        let guard = match self.provision(request).await {
            Ok(guard) => guard,
            Err(error) => {
                // The guard already destroyed whatever apply left behind.
                log.advance(Phase::Failed);
                log.advance(Phase::Destroyed);
                return Err(Self::failure(request, log, error, None));
            }
        };
        log.advance(Phase::Applied);

        let checked = self.check(request, &guard, &mut log).await;
        let teardown = self.teardown(guard).await;

        match (checked, teardown) {
            (Ok((outputs, live)), Ok(())) => {
                log.advance(Phase::Destroyed);
                Ok(RunReport {
                    table_name: request.name().to_string(),
                    outputs,
                    live,
                    phases: log.phases,
                })
            }
            (Ok(_), Err(teardown_err)) => {
                log.advance(Phase::Failed);
                log.advance(Phase::Destroyed);
                Err(Self::failure(request, log, teardown_err, None))
            }
            (Err(error), teardown) => {
                let teardown_error = teardown.err();
                if let Some(teardown_err) = &teardown_error {
                    warn!(table = %request.name(), error = %teardown_err, "teardown also failed");
                }
                log.advance(Phase::Failed);
                log.advance(Phase::Destroyed);
                Err(Self::failure(request, log, error, teardown_error))
            }
        }
    }

    async fn check(
        &self,
        request: &ResourceRequest,
        guard: &ProvisionGuard,
        log: &mut PhaseLog,
    ) -> Result<(ProvisionedOutputs, LiveTableSnapshot), ValidatorError> {
        let outputs = self.fetch_outputs(guard).await?;
        log.advance(Phase::OutputsRead);

        let live = self.describe_live(request.region(), request.name()).await?;
        self.validate(request, &outputs, &live)?;
        log.advance(Phase::Validated);

        Ok((outputs, live))
    }

    fn failure(
        request: &ResourceRequest,
        log: PhaseLog,
        error: ValidatorError,
        teardown_error: Option<ValidatorError>,
    ) -> RunFailure {
        error!(table = %request.name(), error = %error, "run failed");
        RunFailure {
            table_name: request.name().to_string(),
            phases: log.phases,
            error,
            teardown_error,
        }
    }
}
