use std::error::Error;

use gitlab_context_engine::{ContextTarget, config, fetch_context, parse_issue_iid};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Load environment variables from .env file when present; CI jobs
    // provide theirs through the runner instead.
    dotenvy::dotenv().ok();

    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let (cfg, ctx) = config::from_ci_env()?;

    let target = match std::env::var("CONTEXT_ISSUE_IID") {
        Ok(raw) => ContextTarget::Issue {
            iid: parse_issue_iid(&raw)?,
        },
        Err(_) => ContextTarget::MergeRequest,
    };

    let snapshot = fetch_context(&cfg, &ctx, target).await?;

    // Machine-readable snapshot for the next pipeline phase.
    println!("{}", serde_json::to_string_pretty(&snapshot)?);

    Ok(())
}
