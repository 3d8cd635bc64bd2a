pub fn parse_env_u32(name: &str, default: u32) -> Result<u32, String> {
    std::env::var(name)
        .map_or(Ok(default), |v| v.parse::<u32>().map_err(|e| format!("invalid {name}: {e}")))
}

pub fn parse_env_u64(name: &str, default: u64) -> Result<u64, String> {
    std::env::var(name)
        .map_or(Ok(default), |v| v.parse::<u64>().map_err(|e| format!("invalid {name}: {e}")))
}

/// Non-empty string value, or `default`.
pub fn env_or(name: &str, default: &str) -> String {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => v,
        _ => default.to_string(),
    }
}

/// Parse an env var holding a JSON array of strings.
/// Example: `TERRAFORM_EXTRA_RETRYABLE_ERRORS=[".*RequestLimitExceeded.*"]`
pub fn parse_env_string_list(name: &str) -> Result<Vec<String>, String> {
    let val = match std::env::var(name) {
        Ok(v) if !v.is_empty() => v,
        _ => return Ok(Vec::new()),
    };
    serde_json::from_str::<Vec<String>>(&val).map_err(|e| format!("invalid {name} JSON: {e}"))
}
