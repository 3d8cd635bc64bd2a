//! A failed apply never reaches DescribeTable, and teardown still runs.

use anyhow::Result;

use dynamo_provision_check::types::{KeyAttribute, ResourceRequest};
use dynamo_provision_check::{Phase, ValidatorError};

use super::infra::*;

#[tokio::test]
async fn test_invalid_region_fails_before_describe() -> Result<()> {
    init_tracing();

    let mut config = test_config();
    // Fail fast: an invalid region is never transient.
    config.retry.max_retries = 0;
    let validator = live_validator(&config);

    let request = ResourceRequest::pay_per_request(
        &config.table_name_prefix,
        "xx-invalid-1",
        KeyAttribute::string("LockID"),
    )?;

    let Err(failure) = validator.run(&request).await else {
        anyhow::bail!("apply against an invalid region should fail");
    };
    tracing::info!("  failure: {failure}");

    assert!(
        matches!(failure.error, ValidatorError::Apply(_)),
        "expected an apply error, got: {:?}",
        failure.error
    );
    assert!(!failure.phases.contains(&Phase::OutputsRead));
    assert!(!failure.phases.contains(&Phase::Validated));
    assert_eq!(
        failure.phases,
        vec![Phase::Init, Phase::Failed, Phase::Destroyed],
        "teardown must follow the failure"
    );
    Ok(())
}
