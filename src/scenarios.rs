use std::fmt;
use std::str::FromStr;

use crate::config::ValidatorConfig;
use crate::error::ValidatorError;
use crate::naming;
use crate::types::{Capacity, KeyAttribute, ResourceRequest};

/// Built-in table shapes the suite provisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    /// On-demand table keyed on `LockID` (the Terraform state-lock shape).
    PayPerRequest,
    /// Provisioned table keyed on `id` with 5 RCU / 5 WCU.
    Provisioned,
}

impl Scenario {
    pub const ALL: [Self; 2] = [Self::PayPerRequest, Self::Provisioned];

    pub const fn provisioned_capacity() -> Capacity {
        Capacity { read: 5, write: 5 }
    }

    /// A fresh, uniquely named request for this scenario.
    pub fn request(self, config: &ValidatorConfig) -> Result<ResourceRequest, ValidatorError> {
        match self {
            Self::PayPerRequest => ResourceRequest::pay_per_request(
                &config.table_name_prefix,
                config.aws_region.clone(),
                KeyAttribute::string("LockID"),
            ),
            Self::Provisioned => ResourceRequest::provisioned(
                &naming::provisioned_prefix(&config.table_name_prefix),
                config.aws_region.clone(),
                KeyAttribute::string("id"),
                Self::provisioned_capacity(),
            ),
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PayPerRequest => f.write_str("pay-per-request"),
            Self::Provisioned => f.write_str("provisioned"),
        }
    }
}

impl FromStr for Scenario {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pay-per-request" | "on-demand" => Ok(Self::PayPerRequest),
            "provisioned" => Ok(Self::Provisioned),
            other => Err(format!(
                "unknown scenario '{other}' (expected pay-per-request, provisioned or all)"
            )),
        }
    }
}

/// Parse CLI scenario names. Empty input or `all` selects every scenario.
pub fn parse_scenarios<I, S>(args: I) -> Result<Vec<Scenario>, String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut selected = Vec::new();
    for arg in args {
        let arg = arg.as_ref();
        if arg == "all" {
            return Ok(Scenario::ALL.to_vec());
        }
        let scenario: Scenario = arg.parse()?;
        if !selected.contains(&scenario) {
            selected.push(scenario);
        }
    }
    if selected.is_empty() {
        return Ok(Scenario::ALL.to_vec());
    }
    Ok(selected)
}
