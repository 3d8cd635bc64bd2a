use anyhow::Result;
use tracing::{error, info};

use dynamo_provision_check::scenarios::{Scenario, parse_scenarios};
use dynamo_provision_check::{ProvisioningValidator, ValidatorConfig, telemetry};

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init_tracing();

    let scenarios = parse_scenarios(std::env::args().skip(1))
        .map_err(|e| anyhow::anyhow!("usage: dynamo-provision-check [pay-per-request|provisioned|all]: {e}"))?;
    let config = ValidatorConfig::from_env()
        .map_err(|e| anyhow::anyhow!("configuration error: {e}"))?;

    info!(
        region = %config.aws_region,
        dir = %config.terraform_dir.display(),
        ?scenarios,
        "starting provisioning runs"
    );

    let requests = scenarios
        .iter()
        .map(|s| s.request(&config).map(|r| (*s, r)))
        .collect::<Result<Vec<_>, _>>()?;

    let validator = &ProvisioningValidator::from_config(&config);
    let results = futures::future::join_all(
        requests
            .iter()
            .map(|(scenario, request)| async move { (*scenario, validator.run(request).await) }),
    )
    .await;

    let mut failed: Vec<Scenario> = Vec::new();
    for (scenario, result) in results {
        match result {
            Ok(report) => info!(
                %scenario,
                table = %report.table_name,
                status = %report.live.status,
                billing_mode = %report.live.billing_mode,
                "PASS"
            ),
            Err(failure) => {
                error!(%scenario, table = %failure.table_name, error = %failure, "FAIL");
                failed.push(scenario);
            }
        }
    }

    if failed.is_empty() {
        Ok(())
    } else {
        anyhow::bail!("{} of {} scenario(s) failed: {failed:?}", failed.len(), scenarios.len())
    }
}
