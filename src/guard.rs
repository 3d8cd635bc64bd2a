//! Scoped acquisition of a provisioned table.
//!
//! Acquiring a [`ProvisionGuard`] runs `init` + `apply`; releasing it runs
//! `destroy`. Release happens exactly once, either through [`ProvisionGuard::teardown`]
//! or, if the guard is dropped while still armed (panic, cancelled future, early
//! return), through a blocking destroy in `Drop`.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::engine::{InfraEngine, TerraformOptions};
use crate::error::ValidatorError;
use crate::workspace::Workspace;

pub struct ProvisionGuard {
    engine: Arc<dyn InfraEngine>,
    options: TerraformOptions,
    workspace: Option<Workspace>,
    table_name: String,
    armed: bool,
    apply_started: bool,
}

impl std::fmt::Debug for ProvisionGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProvisionGuard")
            .field("table_name", &self.table_name)
            .field("dir", &self.options.dir)
            .field("armed", &self.armed)
            .field("apply_started", &self.apply_started)
            .finish_non_exhaustive()
    }
}

impl ProvisionGuard {
    /// Arm the guard, then init and apply.
    ///
    /// The guard is armed before apply starts, so a failed or partial apply is
    /// still destroyed before the error is returned.
    pub async fn acquire(
        engine: Arc<dyn InfraEngine>,
        options: TerraformOptions,
        workspace: Option<Workspace>,
        table_name: impl Into<String>,
    ) -> Result<Self, ValidatorError> {
        let mut guard = Self {
            engine,
            options,
            workspace,
            table_name: table_name.into(),
            armed: true,
            apply_started: false,
        };

        let provisioned = match guard.engine.init(&guard.options).await {
            Ok(()) => {
                guard.apply_started = true;
                guard.engine.apply(&guard.options).await
            }
            Err(e) => Err(e),
        };
        if let Err(e) = provisioned {
            error!(table = %guard.table_name, error = %format!("{e:#}"), "apply failed, tearing down");
            if let Err(teardown_err) = guard.teardown().await {
                warn!(error = %teardown_err, "teardown after failed apply also failed");
            }
            return Err(ValidatorError::Apply(e));
        }

        info!(table = %guard.table_name, "table provisioned");
        Ok(guard)
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub const fn options(&self) -> &TerraformOptions {
        &self.options
    }

    pub(crate) fn engine(&self) -> &dyn InfraEngine {
        self.engine.as_ref()
    }

    /// Destroy the table. Disarms the guard before running, so `Drop` never
    /// destroys a second time even if this fails.
    pub async fn teardown(mut self) -> Result<(), ValidatorError> {
        self.armed = false;
        info!(table = %self.table_name, "tearing down");
        match self.engine.destroy(&self.options).await {
            Ok(()) => {
                info!(table = %self.table_name, "table destroyed");
                Ok(())
            }
            Err(e) if !self.may_hold_resources() => {
                info!(
                    table = %self.table_name,
                    error = %format!("{e:#}"),
                    "destroy failed but nothing was provisioned"
                );
                Ok(())
            }
            Err(e) => {
                self.keep_workspace();
                Err(ValidatorError::Teardown(e))
            }
        }
    }

    /// False only when apply never ran, or the local state shows it created nothing.
    fn may_hold_resources(&self) -> bool {
        self.apply_started
            && self
                .workspace
                .as_ref()
                .is_none_or(Workspace::holds_resources)
    }

    fn keep_workspace(&mut self) {
        if let Some(ws) = self.workspace.as_mut() {
            ws.persist();
        }
    }
}

impl Drop for ProvisionGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        self.armed = false;
        warn!(table = %self.table_name, "guard dropped while armed, destroying");
        match self.engine.destroy_blocking(&self.options) {
            Ok(()) => info!(table = %self.table_name, "table destroyed"),
            Err(e) if !self.may_hold_resources() => info!(
                table = %self.table_name,
                error = %format!("{e:#}"),
                "destroy failed but nothing was provisioned"
            ),
            Err(e) => {
                error!(
                    table = %self.table_name,
                    error = %format!("{e:#}"),
                    "destroy failed, table may need manual cleanup"
                );
                self.keep_workspace();
            }
        }
    }
}
