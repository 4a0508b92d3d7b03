//! API key resolution
//!
//! Credentials never live in the YAML config. The chat endpoint key is
//! looked up from the process environment: the harness-scoped variable
//! first, then the standard provider variable.

use crate::error::{RubricError, RubricResult};

/// Harness-scoped environment variable, checked first
pub const RUBRIC_API_KEY_VAR: &str = "RUBRIC_API_KEY";
/// Standard provider variable, checked as a fallback
pub const OPENAI_API_KEY_VAR: &str = "OPENAI_API_KEY";

/// Resolve the chat API key from the environment.
///
/// Missing or empty values are a config error so the run fails before any
/// network call is made.
pub fn resolve_api_key() -> RubricResult<String> {
    for var in [RUBRIC_API_KEY_VAR, OPENAI_API_KEY_VAR] {
        if let Ok(value) = std::env::var(var) {
            let value = value.trim().to_string();
            if !value.is_empty() {
                tracing::debug!("using API key from {} ({})", var, mask_key(&value));
                return Ok(value);
            }
        }
    }
    Err(RubricError::config(format!(
        "no API key found; set {} or {}",
        RUBRIC_API_KEY_VAR, OPENAI_API_KEY_VAR
    )))
}

/// Mask a key for display, keeping only the last four characters
pub fn mask_key(key: &str) -> String {
    if key.len() <= 4 {
        "****".to_string()
    } else {
        format!("...{}", &key[key.len() - 4..])
    }
}
