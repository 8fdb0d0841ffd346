//! Pre-flight checks before starting a session.
//!
//! Validates that the credential and webhook endpoints are in place before
//! a conversation starts, so a misconfiguration fails fast instead of in the
//! middle of a user's request.

use crate::config::Settings;
use crate::error::Result;
use crate::openai::read_api_key;
use crate::orchestrator::build_registry;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Conversations need the model credential and every endpoint.
    Converse,
    /// Direct tool calls only need the endpoints.
    CallTool,
}

/// Run pre-flight checks for the given operation.
///
/// Returns Ok(()) if all checks pass, or an error describing what's missing.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Converse => {
            read_api_key(&settings.model.api_key_env)?;
            build_registry(settings)?;
        }
        Operation::CallTool => {
            build_registry(settings)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RelevoError;
    use crate::role::Deployment;

    #[test]
    fn test_call_tool_needs_only_endpoints() {
        let mut settings = Settings::default();
        settings.router.deployment = Deployment::Workplace;
        settings.model.api_key_env = "RELEVO_TEST_KEY_THAT_IS_NEVER_SET".to_string();

        assert!(check(Operation::CallTool, &settings).is_ok());
        let err = check(Operation::Converse, &settings).unwrap_err();
        assert!(matches!(err, RelevoError::Config(_)));
    }

    #[test]
    fn test_missing_endpoint_fails() {
        let mut settings = Settings::default();
        settings.router.deployment = Deployment::University;
        settings.webhooks.endpoints.clear();

        assert!(check(Operation::CallTool, &settings).is_err());
    }
}
