//! GitLab context fetcher (REST v4) for merge requests and issues.
//!
//! Endpoints used (as of 2025):
//!   * GET /projects/:id/merge_requests/:iid
//!   * GET /projects/:id/merge_requests/:iid/discussions
//!   * GET /projects/:id/merge_requests/:iid/changes
//!   * GET /projects/:id/issues/:iid
//!   * GET /projects/:id/issues/:iid/discussions
//!
//! Metadata and discussions go through the shared JSON client path; the
//! changed-files listing is a direct request with manual status inspection,
//! because the generic client path is not a reliable source for the changes
//! payload.

use crate::config::PipelineContext;
use crate::errors::{ApiClientError, ConfigError, ContextEngineError, ContextEngineResult};
use crate::provider::GitLabConfig;
use crate::provider::types::*;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

/// GitLab HTTP client wrapper.
///
/// Holds one shared HTTP instance per fetch session; purely read-only, no
/// state beyond configuration.
#[derive(Debug, Clone)]
pub struct GitLabClient {
    http: Client,
    base_api: String, // e.g. "https://gitlab.com/api/v4"
    token: String,    // "PRIVATE-TOKEN"
}

impl GitLabClient {
    /// Constructs a GitLab client from explicit configuration.
    ///
    /// The underlying HTTP client is shared across all requests of a fetch
    /// and carries a stable user agent so the instance can identify the
    /// integration. An empty token is rejected up front.
    pub fn from_config(cfg: &GitLabConfig) -> ContextEngineResult<Self> {
        if cfg.token.is_empty() {
            return Err(ConfigError::MissingToken.into());
        }

        let base_api = format!("{}/api/v4", cfg.host.trim_end_matches('/'));
        debug!("Creating GitLabClient with base_api={}", base_api);

        let http = Client::builder()
            .user_agent("gitlab-context-engine/0.1")
            .build()?;

        Ok(Self {
            http,
            base_api,
            token: cfg.token.clone(),
        })
    }

    /// Fetches a complete normalized merge-request snapshot.
    ///
    /// Metadata and discussions are issued concurrently and joined; the
    /// changed-files listing follows as an independent sequential request.
    /// Fails with `MissingIdentifier` before any network call when the
    /// context carries no MR IID.
    pub async fn fetch_merge_request_context(
        &self,
        ctx: &PipelineContext,
    ) -> ContextEngineResult<MergeRequestContext> {
        let iid = ctx
            .mr_iid
            .ok_or(ContextEngineError::MissingIdentifier("mr_iid"))?;
        debug!(
            "GitLab fetch_merge_request_context: project={}, iid={}",
            ctx.project_id, iid
        );

        let (meta, discussions) = tokio::try_join!(
            self.get_mr_meta(&ctx.project_id, iid),
            self.get_discussions(&ctx.project_id, "merge_requests", iid),
        )?;

        let changes = self.get_mr_changes(&ctx.project_id, iid).await?;

        let diff_refs = resolve_diff_refs(meta.diff_refs, changes.diff_refs);

        let files = changes
            .changes
            .into_iter()
            .map(|f| FileChange {
                old_path: f.old_path,
                new_path: f.new_path,
                is_new: f.new_file,
                is_renamed: f.renamed_file,
                is_deleted: f.deleted_file,
                diff: f.diff.unwrap_or_default(),
            })
            .collect();

        Ok(MergeRequestContext {
            iid: meta.iid,
            project_id: meta.project_id,
            title: meta.title,
            description: meta.description.unwrap_or_default(),
            state: meta.state,
            source_branch: meta.source_branch,
            target_branch: meta.target_branch,
            author: normalize_author(meta.author),
            web_url: meta.web_url,
            diff_refs,
            changes: files,
            discussions: normalize_discussions(discussions),
        })
    }

    /// Fetches a complete normalized issue snapshot.
    ///
    /// Metadata and discussions are issued concurrently and joined.
    pub async fn fetch_issue_context(
        &self,
        ctx: &PipelineContext,
        issue_iid: u64,
    ) -> ContextEngineResult<IssueContext> {
        debug!(
            "GitLab fetch_issue_context: project={}, iid={}",
            ctx.project_id, issue_iid
        );

        let (meta, discussions) = tokio::try_join!(
            self.get_issue_meta(&ctx.project_id, issue_iid),
            self.get_discussions(&ctx.project_id, "issues", issue_iid),
        )?;

        Ok(IssueContext {
            iid: meta.iid,
            project_id: meta.project_id,
            title: meta.title,
            description: meta.description.unwrap_or_default(),
            state: meta.state,
            author: normalize_author(meta.author),
            web_url: meta.web_url,
            labels: meta.labels.into_iter().map(normalize_label).collect(),
            discussions: normalize_discussions(discussions),
        })
    }

    /// Fetches merge request metadata including diff refs and author info.
    async fn get_mr_meta(&self, project: &str, iid: u64) -> ContextEngineResult<GitLabMr> {
        let url = format!(
            "{}/projects/{}/merge_requests/{}",
            self.base_api,
            urlencoding::encode(project),
            iid
        );
        debug!("GitLab get_mr_meta: {}", url);

        self.get_json(url).await
    }

    /// Fetches issue metadata including labels and author info.
    async fn get_issue_meta(&self, project: &str, iid: u64) -> ContextEngineResult<GitLabIssue> {
        let url = format!(
            "{}/projects/{}/issues/{}",
            self.base_api,
            urlencoding::encode(project),
            iid
        );
        debug!("GitLab get_issue_meta: {}", url);

        self.get_json(url).await
    }

    /// Fetches discussion threads for an MR or issue.
    ///
    /// `entity` is the REST path segment: "merge_requests" or "issues".
    async fn get_discussions(
        &self,
        project: &str,
        entity: &str,
        iid: u64,
    ) -> ContextEngineResult<Vec<GitLabDiscussion>> {
        let url = format!(
            "{}/projects/{}/{}/{}/discussions",
            self.base_api,
            urlencoding::encode(project),
            entity,
            iid
        );
        debug!("GitLab get_discussions: {}", url);

        self.get_json(url).await
    }

    /// Fetches the changed-files listing via a direct request.
    ///
    /// This path deliberately bypasses the shared client error mapping: a
    /// non-2xx status surfaces as `UpstreamFetch` with the status code and
    /// reason text, and no partial record is returned.
    async fn get_mr_changes(&self, project: &str, iid: u64) -> ContextEngineResult<GitLabMrChanges> {
        let url = format!(
            "{}/projects/{}/merge_requests/{}/changes",
            self.base_api,
            urlencoding::encode(project),
            iid
        );
        debug!("GitLab get_mr_changes: {}", url);

        let resp = self
            .http
            .get(url)
            .header("PRIVATE-TOKEN", &self.token)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(ContextEngineError::UpstreamFetch {
                status: status.as_u16(),
                reason: status
                    .canonical_reason()
                    .unwrap_or("unknown status")
                    .to_string(),
            });
        }

        Ok(resp.json().await?)
    }

    /// Shared JSON request path for metadata and discussion calls.
    ///
    /// Errors here are classified by `ApiClientError` and passed through
    /// unchanged.
    async fn get_json<T: DeserializeOwned>(&self, url: String) -> ContextEngineResult<T> {
        let resp = self
            .http
            .get(url)
            .header("PRIVATE-TOKEN", &self.token)
            .send()
            .await
            .map_err(ApiClientError::from)?
            .error_for_status()
            .map_err(ApiClientError::from)?
            .json()
            .await
            .map_err(ApiClientError::from)?;

        Ok(resp)
    }
}

/// Parses an issue IID given as a decimal string.
///
/// Non-numeric input is rejected explicitly rather than producing a garbage
/// request path.
pub fn parse_issue_iid(raw: &str) -> ContextEngineResult<u64> {
    raw.trim()
        .parse::<u64>()
        .map_err(|_| ContextEngineError::InvalidIdentifier(raw.to_string()))
}

/// Resolves the diff-ref triple: metadata response first, then the changes
/// response, then all-empty.
fn resolve_diff_refs(
    meta: Option<GitLabDiffRefs>,
    changes: Option<GitLabDiffRefs>,
) -> DiffRefs {
    match meta.or(changes) {
        Some(r) => DiffRefs {
            base_sha: r.base_sha.unwrap_or_default(),
            head_sha: r.head_sha.unwrap_or_default(),
            start_sha: r.start_sha.unwrap_or_default(),
        },
        None => DiffRefs::default(),
    }
}

fn normalize_author(u: GitLabUser) -> Author {
    Author {
        username: u.username.unwrap_or_default(),
        name: u.name.unwrap_or_default(),
    }
}

fn normalize_discussions(raw: Vec<GitLabDiscussion>) -> Vec<Discussion> {
    raw.into_iter()
        .map(|d| Discussion {
            id: d.id,
            notes: d
                .notes
                .into_iter()
                .map(|n| Note {
                    id: n.id,
                    body: n.body,
                    author: normalize_author(n.author),
                    created_at: n.created_at,
                })
                .collect(),
        })
        .collect()
}

/// Reduces a label wire entry to its plain string form at the boundary.
fn normalize_label(label: GitLabLabel) -> String {
    match label {
        GitLabLabel::Name(name) => name,
        GitLabLabel::Detailed { name } => name,
    }
}

/// GitLab MR response (subset).
#[derive(Debug, Deserialize)]
struct GitLabMr {
    iid: u64,
    project_id: u64,
    title: String,
    #[serde(default)]
    description: Option<String>,
    state: String,
    source_branch: String,
    target_branch: String,
    web_url: String,
    author: GitLabUser,
    #[serde(default)]
    diff_refs: Option<GitLabDiffRefs>,
}

/// GitLab issue response (subset).
#[derive(Debug, Deserialize)]
struct GitLabIssue {
    iid: u64,
    project_id: u64,
    title: String,
    #[serde(default)]
    description: Option<String>,
    state: String,
    web_url: String,
    author: GitLabUser,
    #[serde(default)]
    labels: Vec<GitLabLabel>,
}

/// Label entry as it appears on the wire: either a bare string or an object
/// carrying a `name` field (webhook-style payloads use the latter).
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GitLabLabel {
    Name(String),
    Detailed { name: String },
}

#[derive(Debug, Deserialize)]
struct GitLabUser {
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GitLabDiffRefs {
    #[serde(default)]
    base_sha: Option<String>,
    #[serde(default)]
    head_sha: Option<String>,
    #[serde(default)]
    start_sha: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GitLabDiscussion {
    id: String,
    #[serde(default)]
    notes: Vec<GitLabNote>,
}

#[derive(Debug, Deserialize)]
struct GitLabNote {
    id: u64,
    body: String,
    author: GitLabUser,
    created_at: DateTime<Utc>,
}

/// Response of the direct `/changes` call (subset).
#[derive(Debug, Deserialize)]
struct GitLabMrChanges {
    #[serde(default)]
    changes: Vec<GitLabChangeFile>,
    #[serde(default)]
    diff_refs: Option<GitLabDiffRefs>,
}

#[derive(Debug, Deserialize)]
struct GitLabChangeFile {
    old_path: String,
    new_path: String,
    new_file: bool,
    renamed_file: bool,
    deleted_file: bool,
    #[serde(default)]
    diff: Option<String>, // unified diff; None for binary/too large
}
