//! Pre-flight checks before expensive operations.
//!
//! Validates that required secrets are present before starting operations
//! that would otherwise fail midway. A missing secret is a fatal startup
//! error, never a silent default.

use crate::error::{OrdskifteError, Result};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// The full pipeline needs both provider keys.
    Process,
    /// Answering and searching embed the query, so they need OpenAI.
    Ask,
    /// Formatting saved transcripts touches no provider.
    Format,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation) -> Result<()> {
    match operation {
        Operation::Process => {
            check_env_key("DEEPGRAM_API_KEY")?;
            check_env_key("OPENAI_API_KEY")?;
        }
        Operation::Ask => {
            check_env_key("OPENAI_API_KEY")?;
        }
        Operation::Format => {
            // No secrets required.
        }
    }
    Ok(())
}

/// Check that an environment variable holds a non-empty value.
fn check_env_key(name: &str) -> Result<()> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(()),
        Ok(_) => Err(OrdskifteError::Config(format!(
            "{} is empty. Set it with: export {}='...'",
            name, name
        ))),
        Err(_) => Err(OrdskifteError::Config(format!(
            "{} not set. Set it with: export {}='...'",
            name, name
        ))),
    }
}
