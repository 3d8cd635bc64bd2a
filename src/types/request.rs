use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidatorError;
use crate::naming;

/// DynamoDB billing mode, spelled the way both Terraform and the API spell it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BillingMode {
    PayPerRequest,
    Provisioned,
}

impl BillingMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PayPerRequest => "PAY_PER_REQUEST",
            Self::Provisioned => "PROVISIONED",
        }
    }
}

impl fmt::Display for BillingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BillingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PAY_PER_REQUEST" => Ok(Self::PayPerRequest),
            "PROVISIONED" => Ok(Self::Provisioned),
            other => Err(format!(
                "unknown billing mode '{other}' (expected PAY_PER_REQUEST or PROVISIONED)"
            )),
        }
    }
}

/// Scalar type of the hash key attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttributeType {
    #[serde(rename = "S")]
    String,
    #[serde(rename = "N")]
    Number,
    #[serde(rename = "B")]
    Binary,
}

impl AttributeType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "S",
            Self::Number => "N",
            Self::Binary => "B",
        }
    }
}

impl FromStr for AttributeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "S" => Ok(Self::String),
            "N" => Ok(Self::Number),
            "B" => Ok(Self::Binary),
            other => Err(format!("unknown attribute type '{other}' (expected S, N or B)")),
        }
    }
}

/// Hash key of the table. The key name doubles as the declared attribute name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyAttribute {
    pub name: String,
    pub attribute_type: AttributeType,
}

impl KeyAttribute {
    pub fn string(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attribute_type: AttributeType::String,
        }
    }
}

/// Provisioned read/write capacity units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capacity {
    pub read: i64,
    pub write: i64,
}

/// Everything needed to provision one table. Built once per run and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRequest {
    unique_suffix: String,
    name: String,
    region: String,
    billing_mode: BillingMode,
    key: KeyAttribute,
    capacity: Option<Capacity>,
}

impl ResourceRequest {
    /// On-demand table named `{prefix}-{suffix}`.
    pub fn pay_per_request(
        prefix: &str,
        region: impl Into<String>,
        key: KeyAttribute,
    ) -> Result<Self, ValidatorError> {
        Self::build(prefix, region.into(), BillingMode::PayPerRequest, key, None)
    }

    /// Provisioned-capacity table named `{prefix}-{suffix}`.
    pub fn provisioned(
        prefix: &str,
        region: impl Into<String>,
        key: KeyAttribute,
        capacity: Capacity,
    ) -> Result<Self, ValidatorError> {
        Self::build(
            prefix,
            region.into(),
            BillingMode::Provisioned,
            key,
            Some(capacity),
        )
    }

    fn build(
        prefix: &str,
        region: String,
        billing_mode: BillingMode,
        key: KeyAttribute,
        capacity: Option<Capacity>,
    ) -> Result<Self, ValidatorError> {
        let unique_suffix = naming::unique_suffix();
        let name = naming::table_name(prefix, &unique_suffix);
        naming::validate_table_name(&name).map_err(ValidatorError::Configuration)?;

        if region.trim().is_empty() {
            return Err(ValidatorError::Configuration("region must not be empty".into()));
        }
        if key.name.is_empty() {
            return Err(ValidatorError::Configuration(
                "hash key name must not be empty".into(),
            ));
        }
        if let Some(c) = capacity
            && (c.read <= 0 || c.write <= 0)
        {
            return Err(ValidatorError::Configuration(format!(
                "provisioned capacity must be positive (read={}, write={})",
                c.read, c.write
            )));
        }

        Ok(Self {
            unique_suffix,
            name,
            region,
            billing_mode,
            key,
            capacity,
        })
    }

    pub fn unique_suffix(&self) -> &str {
        &self.unique_suffix
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub const fn billing_mode(&self) -> BillingMode {
        self.billing_mode
    }

    pub const fn key(&self) -> &KeyAttribute {
        &self.key
    }

    /// Present exactly when the billing mode is `PROVISIONED`.
    pub const fn capacity(&self) -> Option<Capacity> {
        self.capacity
    }

    /// Input variables for the Terraform module.
    ///
    /// `read_capacity` / `write_capacity` are only passed for provisioned tables.
    pub fn terraform_vars(&self) -> BTreeMap<String, serde_json::Value> {
        let mut vars = BTreeMap::from([
            ("table_name".to_string(), self.name.clone().into()),
            ("aws_region".to_string(), self.region.clone().into()),
            ("billing_mode".to_string(), self.billing_mode.as_str().into()),
            ("hash_key".to_string(), self.key.name.clone().into()),
            ("attribute_name".to_string(), self.key.name.clone().into()),
            (
                "attribute_type".to_string(),
                self.key.attribute_type.as_str().into(),
            ),
        ]);
        if let Some(capacity) = self.capacity {
            vars.insert("read_capacity".to_string(), capacity.read.into());
            vars.insert("write_capacity".to_string(), capacity.write.into());
        }
        vars
    }

    /// Environment for Terraform invocations.
    pub fn terraform_env(&self) -> BTreeMap<String, String> {
        BTreeMap::from([("AWS_DEFAULT_REGION".to_string(), self.region.clone())])
    }
}
