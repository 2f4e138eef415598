//! Normalized GitLab context for AI review pipelines.
//!
//! Given an access token and a resolved project/MR/issue reference, this
//! crate fetches the entity's metadata, its changed files (for merge
//! requests) and all discussion threads, and reduces the heterogeneous REST
//! shapes to two flat record types for prompt construction downstream.

pub mod config;
mod errors;
pub mod provider;

pub use config::PipelineContext;
pub use errors::{ApiClientError, ConfigError, ContextEngineError, ContextEngineResult};
pub use provider::GitLabConfig;
pub use provider::gitlab::{GitLabClient, parse_issue_iid};
pub use provider::types::{
    Author, DiffRefs, Discussion, FileChange, IssueContext, MergeRequestContext, Note,
};

use serde::Serialize;
use tracing::{debug, info};

/// What this pipeline run should fetch context for.
#[derive(Debug, Clone, Copy)]
pub enum ContextTarget {
    /// The merge request named by `PipelineContext::mr_iid`.
    MergeRequest,
    /// A specific issue in the project.
    Issue { iid: u64 },
}

/// The normalized snapshot handed to the prompt-construction stage.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ContextSnapshot {
    MergeRequest(MergeRequestContext),
    Issue(IssueContext),
}

/// Fetches the context snapshot for one pipeline run.
///
/// This is the entry point invoked by the orchestration layer between its
/// prepare and execute phases. It builds one authenticated client per call
/// and performs no retries: any failure propagates to the caller, which
/// owns logging and the abort/comment decision.
pub async fn fetch_context(
    cfg: &GitLabConfig,
    ctx: &PipelineContext,
    target: ContextTarget,
) -> ContextEngineResult<ContextSnapshot> {
    info!(
        host = %cfg.host,
        project = %ctx.project_id,
        kind = ?target,
        "context fetch started"
    );

    let client = GitLabClient::from_config(cfg)?;

    let snapshot = match target {
        ContextTarget::MergeRequest => {
            let mr = client.fetch_merge_request_context(ctx).await?;
            debug!(
                iid = mr.iid,
                files = mr.changes.len(),
                discussions = mr.discussions.len(),
                "merge request context fetched"
            );
            ContextSnapshot::MergeRequest(mr)
        }
        ContextTarget::Issue { iid } => {
            let issue = client.fetch_issue_context(ctx, iid).await?;
            debug!(
                iid = issue.iid,
                labels = issue.labels.len(),
                discussions = issue.discussions.len(),
                "issue context fetched"
            );
            ContextSnapshot::Issue(issue)
        }
    };

    info!(project = %ctx.project_id, "context fetch finished");

    Ok(snapshot)
}
