//! In-process fakes for the engine and the describer.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use async_trait::async_trait;

use crate::describe::TableDescriber;
use crate::engine::{InfraEngine, RetryPolicy, TerraformOptions};
use crate::error::ValidatorError;
use crate::types::{
    LiveTableSnapshot, OUTPUT_BILLING_MODE, OUTPUT_TABLE_ARN, OUTPUT_TABLE_ID, OUTPUT_TABLE_NAME,
};

/// Records every call and answers `outputs` from the vars it was applied with.
#[derive(Debug, Default)]
pub struct FakeEngine {
    init_error: Option<String>,
    apply_error: Option<String>,
    destroy_error: Option<String>,
    omitted_output: Option<&'static str>,
    output_overrides: BTreeMap<String, serde_json::Value>,
    inits: AtomicUsize,
    applies: AtomicUsize,
    output_calls: AtomicUsize,
    destroys: AtomicUsize,
    blocking_destroys: AtomicUsize,
}

impl FakeEngine {
    pub fn options() -> TerraformOptions {
        TerraformOptions {
            dir: std::env::temp_dir(),
            vars: BTreeMap::from([
                ("table_name".to_string(), "t".into()),
                ("aws_region".to_string(), "us-east-1".into()),
                ("billing_mode".to_string(), "PAY_PER_REQUEST".into()),
            ]),
            env: BTreeMap::new(),
            retry: RetryPolicy::none(),
        }
    }

    pub fn failing_init(msg: &str) -> Self {
        Self {
            init_error: Some(msg.to_string()),
            ..Self::default()
        }
    }

    /// Init fails and so does every later destroy.
    pub fn failing_init_and_destroy(msg: &str) -> Self {
        Self {
            init_error: Some(msg.to_string()),
            destroy_error: Some(msg.to_string()),
            ..Self::default()
        }
    }

    pub fn failing_apply(msg: &str) -> Self {
        Self {
            apply_error: Some(msg.to_string()),
            ..Self::default()
        }
    }

    pub fn failing_destroy(msg: &str) -> Self {
        Self {
            destroy_error: Some(msg.to_string()),
            ..Self::default()
        }
    }

    pub fn without_output(name: &'static str) -> Self {
        Self {
            omitted_output: Some(name),
            ..Self::default()
        }
    }

    pub fn with_output(name: &str, value: impl Into<serde_json::Value>) -> Self {
        Self {
            output_overrides: BTreeMap::from([(name.to_string(), value.into())]),
            ..Self::default()
        }
    }

    pub fn inits(&self) -> usize {
        self.inits.load(Ordering::SeqCst)
    }

    pub fn applies(&self) -> usize {
        self.applies.load(Ordering::SeqCst)
    }

    pub fn output_calls(&self) -> usize {
        self.output_calls.load(Ordering::SeqCst)
    }

    pub fn destroys(&self) -> usize {
        self.destroys.load(Ordering::SeqCst)
    }

    pub fn blocking_destroys(&self) -> usize {
        self.blocking_destroys.load(Ordering::SeqCst)
    }

    pub fn total_destroys(&self) -> usize {
        self.destroys() + self.blocking_destroys()
    }

    fn destroy_result(&self) -> Result<()> {
        result_of(self.destroy_error.as_ref())
    }
}

fn result_of(error: Option<&String>) -> Result<()> {
    match error {
        Some(msg) => Err(anyhow::anyhow!("{msg}")),
        None => Ok(()),
    }
}

#[async_trait]
impl InfraEngine for FakeEngine {
    async fn init(&self, _options: &TerraformOptions) -> Result<()> {
        self.inits.fetch_add(1, Ordering::SeqCst);
        result_of(self.init_error.as_ref())
    }

    /// Like terraform, a successful apply in a module copy leaves state behind.
    async fn apply(&self, options: &TerraformOptions) -> Result<()> {
        self.applies.fetch_add(1, Ordering::SeqCst);
        result_of(self.apply_error.as_ref())?;
        if options.dir.join("main.tf").is_file() {
            std::fs::write(
                options.dir.join("terraform.tfstate"),
                r#"{"version": 4, "resources": [{"type": "aws_dynamodb_table", "name": "this"}]}"#,
            )?;
        }
        Ok(())
    }

    async fn outputs(
        &self,
        options: &TerraformOptions,
    ) -> Result<BTreeMap<String, serde_json::Value>> {
        self.output_calls.fetch_add(1, Ordering::SeqCst);
        let var = |k: &str| {
            options
                .vars
                .get(k)
                .and_then(serde_json::Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        let name = var("table_name");
        let mut outputs = BTreeMap::from([
            (
                OUTPUT_TABLE_ARN.to_string(),
                format!(
                    "arn:aws:dynamodb:{}:123456789012:table/{name}",
                    var("aws_region")
                )
                .into(),
            ),
            (OUTPUT_TABLE_ID.to_string(), name.clone().into()),
            (OUTPUT_TABLE_NAME.to_string(), name.into()),
            (OUTPUT_BILLING_MODE.to_string(), var("billing_mode").into()),
        ]);
        if let Some(omitted) = self.omitted_output {
            outputs.remove(omitted);
        }
        outputs.extend(self.output_overrides.clone());
        Ok(outputs)
    }

    async fn destroy(&self, _options: &TerraformOptions) -> Result<()> {
        self.destroys.fetch_add(1, Ordering::SeqCst);
        self.destroy_result()
    }

    fn destroy_blocking(&self, _options: &TerraformOptions) -> Result<()> {
        self.blocking_destroys.fetch_add(1, Ordering::SeqCst);
        self.destroy_result()
    }
}

/// Returns a fixed snapshot (or a provider error) and counts calls.
#[derive(Debug, Default)]
pub struct FakeDescriber {
    snapshot: Option<LiveTableSnapshot>,
    calls: AtomicUsize,
    last_region: Mutex<Option<String>>,
}

impl FakeDescriber {
    pub fn returning(snapshot: LiveTableSnapshot) -> Self {
        Self {
            snapshot: Some(snapshot),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_region(&self) -> Option<String> {
        self.last_region.lock().ok().and_then(|r| r.clone())
    }
}

#[async_trait]
impl TableDescriber for FakeDescriber {
    async fn describe_table(
        &self,
        region: &str,
        table_name: &str,
    ) -> Result<LiveTableSnapshot, ValidatorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_region.lock() {
            *last = Some(region.to_string());
        }
        self.snapshot.clone().ok_or_else(|| {
            ValidatorError::Provider(anyhow::anyhow!(
                "ResourceNotFoundException: Requested resource not found: Table: {table_name} not found"
            ))
        })
    }
}
