use std::fmt;

/// Errors from a provisioning run.
///
/// None of these are retried by the validator. Transient Terraform failures are
/// retried inside the engine before they surface as `Apply`.
#[derive(Debug)]
pub enum ValidatorError {
    /// Bad environment, invalid request, unreadable module directory.
    Configuration(String),
    /// `terraform init` / `terraform apply` failed.
    Apply(anyhow::Error),
    /// `terraform output` itself failed.
    Output(anyhow::Error),
    /// A declared output is absent from the engine state (template/output mismatch).
    MissingOutput(String),
    /// An output exists but does not have the expected shape.
    MalformedOutput { name: String, reason: String },
    /// DynamoDB control-plane call failed (auth, network, throttling, not found).
    Provider(anyhow::Error),
    /// Expected and actual attribute diverged.
    Mismatch {
        field: &'static str,
        expected: String,
        actual: String,
    },
    /// `terraform destroy` failed after an otherwise successful run.
    Teardown(anyhow::Error),
}

impl ValidatorError {
    pub(crate) fn mismatch(
        field: &'static str,
        expected: impl fmt::Display,
        actual: impl fmt::Display,
    ) -> Self {
        Self::Mismatch {
            field,
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }
}

impl fmt::Display for ValidatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration(msg) => write!(f, "configuration error: {msg}"),
            Self::Apply(err) => write!(f, "terraform apply failed: {err:#}"),
            Self::Output(err) => write!(f, "terraform output failed: {err:#}"),
            Self::MissingOutput(name) => write!(f, "missing terraform output: {name}"),
            Self::MalformedOutput { name, reason } => {
                write!(f, "malformed terraform output {name}: {reason}")
            }
            Self::Provider(err) => write!(f, "provider error: {err:#}"),
            Self::Mismatch {
                field,
                expected,
                actual,
            } => write!(f, "{field} mismatch: expected {expected:?}, got {actual:?}"),
            Self::Teardown(err) => write!(f, "terraform destroy failed: {err:#}"),
        }
    }
}

impl std::error::Error for ValidatorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Apply(err) | Self::Output(err) | Self::Provider(err) | Self::Teardown(err) => {
                Some(err.as_ref())
            }
            Self::Configuration(_)
            | Self::MissingOutput(_)
            | Self::MalformedOutput { .. }
            | Self::Mismatch { .. } => None,
        }
    }
}

/// Check if an error message matches any of the given patterns.
///
/// Used by the Terraform engine to decide whether a failed command is transient.
pub fn matches_error_patterns(error_message: &str, patterns: &[regex::Regex]) -> bool {
    patterns.iter().any(|re| re.is_match(error_message))
}
