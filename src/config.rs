//! Explicit configuration for a single pipeline run.
//!
//! The fetcher itself never touches the process environment; everything it
//! needs arrives through these structs. `from_ci_env` is the one place the
//! GitLab CI variables are read, at the binary edge.

use crate::errors::{ConfigError, ContextEngineError, ContextEngineResult};
use crate::provider::GitLabConfig;
use std::env;

/// Resolved reference to the entity this pipeline run is about.
///
/// `project_id` is either a numeric project ID or a "group/project" path;
/// it is URL-encoded on the wire. `mr_iid` is absent for issue-triggered
/// runs.
#[derive(Debug, Clone)]
pub struct PipelineContext {
    pub project_id: String,
    pub mr_iid: Option<u64>,
}

/// Assembles configuration from the GitLab CI job environment.
///
/// Required: `CI_SERVER_URL`, `GITLAB_TOKEN`, `CI_PROJECT_ID`.
/// Optional: `CI_MERGE_REQUEST_IID` (absent outside MR pipelines).
pub fn from_ci_env() -> ContextEngineResult<(GitLabConfig, PipelineContext)> {
    load(|key| env::var(key).ok())
}

fn load(
    get: impl Fn(&str) -> Option<String>,
) -> ContextEngineResult<(GitLabConfig, PipelineContext)> {
    let host = require(&get, "CI_SERVER_URL")?;
    let token = get("GITLAB_TOKEN")
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::MissingToken)?;
    let project_id = require(&get, "CI_PROJECT_ID")?;

    let mr_iid = match get("CI_MERGE_REQUEST_IID") {
        Some(raw) if !raw.is_empty() => Some(
            raw.parse::<u64>()
                .map_err(|_| ContextEngineError::InvalidIdentifier(raw))?,
        ),
        _ => None,
    };

    Ok((
        GitLabConfig { host, token },
        PipelineContext { project_id, mr_iid },
    ))
}

fn require(
    get: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> ContextEngineResult<String> {
    get(key)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ConfigError::MissingVar(key).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn load_from(map: &HashMap<String, String>) -> ContextEngineResult<(GitLabConfig, PipelineContext)> {
        load(|key| map.get(key).cloned())
    }

    #[test]
    fn loads_full_mr_environment() {
        let map = vars(&[
            ("CI_SERVER_URL", "https://gitlab.example.com"),
            ("GITLAB_TOKEN", "glpat-secret"),
            ("CI_PROJECT_ID", "42"),
            ("CI_MERGE_REQUEST_IID", "7"),
        ]);

        let (cfg, ctx) = load_from(&map).unwrap();
        assert_eq!(cfg.host, "https://gitlab.example.com");
        assert_eq!(ctx.project_id, "42");
        assert_eq!(ctx.mr_iid, Some(7));
    }

    #[test]
    fn mr_iid_is_optional() {
        let map = vars(&[
            ("CI_SERVER_URL", "https://gitlab.example.com"),
            ("GITLAB_TOKEN", "glpat-secret"),
            ("CI_PROJECT_ID", "group/repo"),
        ]);

        let (_, ctx) = load_from(&map).unwrap();
        assert_eq!(ctx.mr_iid, None);
    }

    #[test]
    fn missing_token_is_a_config_error() {
        let map = vars(&[
            ("CI_SERVER_URL", "https://gitlab.example.com"),
            ("CI_PROJECT_ID", "42"),
        ]);

        let err = load_from(&map).unwrap_err();
        assert!(matches!(
            err,
            ContextEngineError::Config(ConfigError::MissingToken)
        ));
    }

    #[test]
    fn missing_server_url_names_the_variable() {
        let map = vars(&[("GITLAB_TOKEN", "glpat-secret"), ("CI_PROJECT_ID", "42")]);

        let err = load_from(&map).unwrap_err();
        assert!(matches!(
            err,
            ContextEngineError::Config(ConfigError::MissingVar("CI_SERVER_URL"))
        ));
    }

    #[test]
    fn non_numeric_mr_iid_is_rejected() {
        let map = vars(&[
            ("CI_SERVER_URL", "https://gitlab.example.com"),
            ("GITLAB_TOKEN", "glpat-secret"),
            ("CI_PROJECT_ID", "42"),
            ("CI_MERGE_REQUEST_IID", "seven"),
        ]);

        let err = load_from(&map).unwrap_err();
        assert!(matches!(err, ContextEngineError::InvalidIdentifier(s) if s == "seven"));
    }
}
