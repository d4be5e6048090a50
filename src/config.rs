//! Runtime configuration and CI trigger context, resolved once at startup.
//! Nothing reads the environment after this point.

use anyhow::{Context, Result};
use std::env;

pub const DEFAULT_BASE_URL: &str = "https://api.cognitedata.com";

/// Platform connection settings.
#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    pub project: String,
    pub api_key: String,
    pub function_path: String,
}

impl Config {
    /// Resolve settings, CLI flags taking precedence over the environment.
    ///
    /// Missing project or credentials fails here, before any network call.
    pub fn resolve(
        base_url: Option<String>,
        project: Option<String>,
        function_path: Option<String>,
    ) -> Result<Self> {
        let base_url = base_url
            .or_else(|| env_non_empty("CDF_BASE_URL"))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let project = project
            .or_else(|| env_non_empty("CDF_PROJECT"))
            .context("Missing required variable CDF_PROJECT")?;
        let api_key = env_non_empty("CDF_CREDENTIALS")
            .context("Missing required variable CDF_CREDENTIALS")?;
        let function_path = function_path
            .or_else(|| env_non_empty("FUNCTION_PATH"))
            .unwrap_or_else(|| ".".to_string());

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            project,
            api_key,
            function_path,
        })
    }
}

/// What the CI run was triggered by, read from the standard GitHub variables.
#[derive(Debug, Clone)]
pub struct CiContext {
    pub event_name: String,
    pub repository: String,
    pub ref_name: Option<String>,
    /// Set when the run should only clean up the PR deployment.
    pub delete_only: bool,
    sha: Option<String>,
    head_ref: Option<String>,
}

impl CiContext {
    pub fn from_env() -> Result<Self> {
        let repository = env_non_empty("GITHUB_REPOSITORY")
            .context("Missing required variable GITHUB_REPOSITORY")?;
        Ok(Self {
            event_name: env_non_empty("GITHUB_EVENT_NAME").unwrap_or_default(),
            repository,
            ref_name: env_non_empty("GITHUB_REF"),
            delete_only: env_non_empty("DELETE_PR_FUNCTION").is_some(),
            sha: env_non_empty("GITHUB_SHA"),
            head_ref: env_non_empty("GITHUB_HEAD_REF"),
        })
    }

    /// First 7 characters of the commit SHA, the ref a push deploys under.
    pub fn short_sha(&self) -> Result<&str> {
        let sha = self
            .sha
            .as_deref()
            .context("Missing required variable GITHUB_SHA")?;
        Ok(&sha[..7.min(sha.len())])
    }

    pub fn head_ref(&self) -> Result<&str> {
        self.head_ref
            .as_deref()
            .context("Missing required variable GITHUB_HEAD_REF")
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    match env::var(key) {
        Ok(value) if !value.is_empty() => Some(value),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_non_empty_with_empty_string() {
        std::env::set_var("CDF_TEST_EMPTY_VAR", "");
        assert_eq!(env_non_empty("CDF_TEST_EMPTY_VAR"), None);
        std::env::remove_var("CDF_TEST_EMPTY_VAR");
    }

    #[test]
    fn test_env_non_empty_with_value() {
        std::env::set_var("CDF_TEST_VALUE_VAR", "some_value");
        assert_eq!(
            env_non_empty("CDF_TEST_VALUE_VAR"),
            Some("some_value".to_string())
        );
        std::env::remove_var("CDF_TEST_VALUE_VAR");
    }

    #[test]
    fn test_env_non_empty_with_unset() {
        std::env::remove_var("CDF_TEST_UNSET_VAR");
        assert_eq!(env_non_empty("CDF_TEST_UNSET_VAR"), None);
    }

    // One test covers the whole resolve matrix so the fixed CDF_* variable
    // names are never mutated from two tests at once.
    #[test]
    fn test_resolve_requires_project_and_credentials() {
        std::env::remove_var("CDF_BASE_URL");
        std::env::remove_var("CDF_PROJECT");
        std::env::remove_var("CDF_CREDENTIALS");
        std::env::remove_var("FUNCTION_PATH");

        assert!(Config::resolve(None, None, None).is_err());
        // A project flag alone is not enough without credentials.
        assert!(Config::resolve(None, Some("unit".to_string()), None).is_err());

        std::env::set_var("CDF_CREDENTIALS", "test-key");
        let config = Config::resolve(None, Some("unit".to_string()), None).unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.project, "unit");
        assert_eq!(config.api_key, "test-key");
        assert_eq!(config.function_path, ".");

        // Flags win over the environment, and trailing slashes are dropped.
        let config = Config::resolve(
            Some("https://greenfield.cognitedata.com/".to_string()),
            Some("unit".to_string()),
            Some("functions/foo".to_string()),
        )
        .unwrap();
        assert_eq!(config.base_url, "https://greenfield.cognitedata.com");
        assert_eq!(config.function_path, "functions/foo");

        std::env::remove_var("CDF_CREDENTIALS");
    }

    #[test]
    fn test_short_sha_truncates_to_seven() {
        let ctx = CiContext {
            event_name: "push".to_string(),
            repository: "org/repo".to_string(),
            ref_name: None,
            delete_only: false,
            sha: Some("abc1234def5678900".to_string()),
            head_ref: None,
        };
        assert_eq!(ctx.short_sha().unwrap(), "abc1234");
    }

    #[test]
    fn test_missing_sha_and_head_ref_are_errors() {
        let ctx = CiContext {
            event_name: "push".to_string(),
            repository: "org/repo".to_string(),
            ref_name: None,
            delete_only: false,
            sha: None,
            head_ref: None,
        };
        assert!(ctx.short_sha().is_err());
        assert!(ctx.head_ref().is_err());
    }
}
