//! Provisioned table keyed on `id` with 5 RCU / 5 WCU.

use anyhow::Result;

use dynamo_provision_check::scenarios::Scenario;

use super::infra::*;

#[tokio::test]
async fn test_provisioned_table() -> Result<()> {
    init_tracing();

    let config = test_config();
    let validator = live_validator(&config);
    let request = Scenario::Provisioned.request(&config)?;

    tracing::info!("Provisioning provisioned-capacity table {}", request.name());
    let report = validator.run(&request).await?;
    print_report(&report);

    let capacity = Scenario::provisioned_capacity();
    assert!(report.outputs.arn.contains(request.name()));
    assert_eq!(report.outputs.billing_mode, "PROVISIONED");
    assert_eq!(report.live.status, "ACTIVE");
    assert_eq!(report.live.read_capacity, Some(capacity.read));
    assert_eq!(report.live.write_capacity, Some(capacity.write));
    Ok(())
}
