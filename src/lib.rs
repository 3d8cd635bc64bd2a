//! Provision a DynamoDB table through Terraform, check it against the live
//! `DescribeTable` API, and always tear it down.

pub mod config;
pub mod describe;
pub mod engine;
pub mod error;
pub mod guard;
pub mod naming;
pub mod scenarios;
pub mod telemetry;
pub mod types;
pub mod validate;
pub mod validator;
pub mod workspace;

#[cfg(test)]
mod testing;

pub use config::ValidatorConfig;
pub use error::ValidatorError;
pub use validator::{Phase, ProvisioningValidator, RunFailure, RunReport};
