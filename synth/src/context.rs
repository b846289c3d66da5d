//! Context parameter resolution.
//!
//! Stack parameters can come from three places, in descending
//! precedence: CLI flags, an optional TOML context file, and the
//! documented defaults (with `CDK_DEFAULT_ACCOUNT` / `CDK_DEFAULT_REGION`
//! honored for the deployment target). Resolution happens here, once;
//! the construct library only ever sees the finished [`StackConfig`].

use constructs::StackConfig;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

pub const ACCOUNT_ENV: &str = "CDK_DEFAULT_ACCOUNT";
pub const REGION_ENV: &str = "CDK_DEFAULT_REGION";

#[derive(Error, Debug)]
pub enum ContextError {
    #[error("Failed to read context file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse context file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Parameters a context file may carry; everything is optional
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ContextFile {
    pub model: Option<String>,
    pub task: Option<String>,
    pub instance_type: Option<String>,
    pub role: Option<String>,
    pub region: Option<String>,
    pub account: Option<String>,
}

impl ContextFile {
    /// Load a context file; a missing file is an empty context.
    pub fn load(path: &Path) -> Result<Self, ContextError> {
        if !path.exists() {
            debug!(path = %path.display(), "no context file, using defaults");
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }
}

/// Parameters passed on the command line; everything is optional
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub model: Option<String>,
    pub task: Option<String>,
    pub instance_type: Option<String>,
    pub role: Option<String>,
    pub region: Option<String>,
    pub account: Option<String>,
}

/// Merge flags over the context file over environment/defaults.
pub fn resolve(overrides: CliOverrides, file: ContextFile) -> StackConfig {
    let defaults = StackConfig::default();
    StackConfig {
        model: overrides.model.or(file.model).unwrap_or(defaults.model),
        task: overrides.task.or(file.task).unwrap_or(defaults.task),
        instance_type: overrides
            .instance_type
            .or(file.instance_type)
            .unwrap_or(defaults.instance_type),
        region: overrides
            .region
            .or(file.region)
            .or_else(|| std::env::var(REGION_ENV).ok())
            .unwrap_or(defaults.region),
        account: overrides
            .account
            .or(file.account)
            .or_else(|| std::env::var(ACCOUNT_ENV).ok())
            .unwrap_or(defaults.account),
        execution_role_arn: overrides.role.or(file.role),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_context_resolves_to_defaults() {
        let config = resolve(CliOverrides::default(), ContextFile::default());
        assert_eq!(config.model, constructs::DEFAULT_MODEL);
        assert_eq!(config.task, constructs::DEFAULT_TASK);
        assert_eq!(config.instance_type, constructs::DEFAULT_INSTANCE_TYPE);
        assert!(config.execution_role_arn.is_none());
    }

    #[test]
    fn test_flags_win_over_file() {
        let overrides = CliOverrides {
            model: Some("cli/model".to_string()),
            ..CliOverrides::default()
        };
        let file = ContextFile {
            model: Some("file/model".to_string()),
            task: Some("summarization".to_string()),
            ..ContextFile::default()
        };

        let config = resolve(overrides, file);
        assert_eq!(config.model, "cli/model");
        assert_eq!(config.task, "summarization");
    }

    #[test]
    fn test_role_has_no_default() {
        let file = ContextFile {
            role: Some("arn:aws:iam::123456789012:role/supplied".to_string()),
            ..ContextFile::default()
        };
        let config = resolve(CliOverrides::default(), file);
        assert_eq!(
            config.execution_role_arn.as_deref(),
            Some("arn:aws:iam::123456789012:role/supplied")
        );
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let context = ContextFile::load(Path::new("definitely/not/here.toml")).unwrap();
        assert!(context.model.is_none());
        assert!(context.account.is_none());
    }

    #[test]
    fn test_load_context_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "model = \"org/model_x\"\ninstance_type = \"ml.g4dn.xlarge\""
        )
        .unwrap();

        let context = ContextFile::load(file.path()).unwrap();
        assert_eq!(context.model.as_deref(), Some("org/model_x"));
        assert_eq!(context.instance_type.as_deref(), Some("ml.g4dn.xlarge"));
        assert!(context.task.is_none());
    }

    #[test]
    fn test_load_rejects_malformed_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "model = [broken").unwrap();

        let result = ContextFile::load(file.path());
        assert!(matches!(result, Err(ContextError::Parse(_))));
    }
}
