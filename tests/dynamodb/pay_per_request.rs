//! On-demand table keyed on `LockID`.

use anyhow::Result;

use dynamo_provision_check::Phase;
use dynamo_provision_check::scenarios::Scenario;

use super::infra::*;

#[tokio::test]
async fn test_pay_per_request_table() -> Result<()> {
    init_tracing();

    let config = test_config();
    let validator = live_validator(&config);
    let request = Scenario::PayPerRequest.request(&config)?;

    tracing::info!("Provisioning on-demand table {}", request.name());
    let report = validator.run(&request).await?;
    print_report(&report);

    assert!(report.outputs.arn.contains(request.name()));
    assert_eq!(report.outputs.id, request.name());
    assert_eq!(report.outputs.name, request.name());
    assert_eq!(report.outputs.billing_mode, "PAY_PER_REQUEST");

    assert_eq!(report.live.name, request.name());
    assert_eq!(report.live.status, "ACTIVE");
    assert_eq!(report.live.billing_mode, "PAY_PER_REQUEST");

    assert_eq!(report.phases.last(), Some(&Phase::Destroyed));
    Ok(())
}
