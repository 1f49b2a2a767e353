//! Pre-flight checks before operations that call external APIs.

use crate::config::Settings;
use crate::error::{CoursemateError, Result};

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Answering needs the generation key and the embedding key.
    Ask,
    /// Ingesting needs the embedding key.
    Ingest,
    /// Listing courses reads the local store only.
    Courses,
}

/// Run pre-flight checks for the given operation.
pub fn check(operation: Operation, settings: &Settings) -> Result<()> {
    match operation {
        Operation::Ask => {
            check_api_key(settings.generation.provider.api_key_env())?;
            check_api_key("OPENAI_API_KEY")?;
        }
        Operation::Ingest => {
            check_api_key("OPENAI_API_KEY")?;
        }
        Operation::Courses => {}
    }
    Ok(())
}

fn check_api_key(var: &str) -> Result<()> {
    match std::env::var(var) {
        Ok(key) if !key.trim().is_empty() => Ok(()),
        Ok(_) => Err(CoursemateError::Config(format!(
            "{} is empty. Set it with: export {}='...'",
            var, var
        ))),
        Err(_) => Err(CoursemateError::Config(format!(
            "{} not set. Set it with: export {}='...'",
            var, var
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_courses_has_no_requirements() {
        assert!(check(Operation::Courses, &Settings::default()).is_ok());
    }

    #[test]
    fn test_missing_key_is_config_error() {
        let err = check_api_key("COURSEMATE_TEST_KEY_THAT_IS_NEVER_SET").unwrap_err();
        assert!(matches!(err, CoursemateError::Config(_)));
        assert!(err.to_string().contains("not set"));
    }
}
