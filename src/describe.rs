use anyhow::Context;
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use tracing::{debug, info};

use crate::error::ValidatorError;
use crate::types::LiveTableSnapshot;

/// Read-only view of the live table through the provider's control plane.
#[async_trait]
pub trait TableDescriber: Send + Sync {
    async fn describe_table(
        &self,
        region: &str,
        table_name: &str,
    ) -> Result<LiveTableSnapshot, ValidatorError>;
}

/// Where the DynamoDB client comes from.
#[derive(Debug, Clone)]
enum ClientSource {
    /// Build a client per call from the default credential chain and the given region.
    PerRegion,
    /// Use a preconfigured client (mocks, custom endpoints). The region argument is ignored.
    Fixed(aws_sdk_dynamodb::Client),
}

/// `DescribeTable` through `aws-sdk-dynamodb`. One call, no local retry.
#[derive(Debug, Clone)]
pub struct DynamoDbDescriber {
    source: ClientSource,
}

impl Default for DynamoDbDescriber {
    fn default() -> Self {
        Self::new()
    }
}

impl DynamoDbDescriber {
    pub const fn new() -> Self {
        Self {
            source: ClientSource::PerRegion,
        }
    }

    pub const fn from_client(client: aws_sdk_dynamodb::Client) -> Self {
        Self {
            source: ClientSource::Fixed(client),
        }
    }

    async fn client_for(&self, region: &str) -> aws_sdk_dynamodb::Client {
        match &self.source {
            ClientSource::Fixed(client) => client.clone(),
            ClientSource::PerRegion => {
                debug!(region, "loading AWS config");
                let config = aws_config::defaults(BehaviorVersion::latest())
                    .region(Region::new(region.to_string()))
                    .load()
                    .await;
                aws_sdk_dynamodb::Client::new(&config)
            }
        }
    }
}

#[async_trait]
impl TableDescriber for DynamoDbDescriber {
    async fn describe_table(
        &self,
        region: &str,
        table_name: &str,
    ) -> Result<LiveTableSnapshot, ValidatorError> {
        let client = self.client_for(region).await;
        let output = client
            .describe_table()
            .table_name(table_name)
            .send()
            .await
            .map_err(|e| {
                ValidatorError::Provider(
                    anyhow::anyhow!("{}", aws_sdk_dynamodb::error::DisplayErrorContext(e))
                        .context(format!("describing table {table_name} in {region}")),
                )
            })?;

        let table = output
            .table()
            .context("DescribeTable returned no table description")
            .map_err(ValidatorError::Provider)?;
        let snapshot = LiveTableSnapshot::from_description(table);

        info!(
            table = %snapshot.name,
            status = %snapshot.status,
            billing_mode = %snapshot.billing_mode,
            "described live table"
        );
        Ok(snapshot)
    }
}
