//! Unique table naming for parallel runs.
//!
//! Every run gets its own suffix so concurrent runs in the same account and
//! region never collide. No coordination is needed beyond the entropy of a v4 UUID.

/// Length of the generated suffix, in hex characters (48 bits of entropy).
pub const SUFFIX_LEN: usize = 12;

/// Default table name prefix for on-demand tables.
pub const DEFAULT_PREFIX: &str = "terratest-dynamodb";

/// Prefix used for provisioned-capacity tables, derived from the base prefix.
pub fn provisioned_prefix(base: &str) -> String {
    format!("{base}-prov")
}

/// Generate a lowercase hex suffix (DynamoDB names are case-sensitive; Terraform
/// state paths and ARNs read better lowercase).
pub fn unique_suffix() -> String {
    let mut id = uuid::Uuid::new_v4().simple().to_string();
    id.truncate(SUFFIX_LEN);
    id
}

/// `{prefix}-{suffix}`.
pub fn table_name(prefix: &str, suffix: &str) -> String {
    format!("{prefix}-{suffix}")
}

/// Check a table name against DynamoDB naming rules: 3–255 characters of
/// `[A-Za-z0-9_.-]`.
pub fn validate_table_name(name: &str) -> Result<(), String> {
    if !(3..=255).contains(&name.len()) {
        return Err(format!(
            "table name '{name}' must be 3-255 characters (got {})",
            name.len()
        ));
    }
    if let Some(bad) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-')))
    {
        return Err(format!("table name '{name}' contains invalid character '{bad}'"));
    }
    Ok(())
}
