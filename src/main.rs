//! # GitHub Issue Controller
//!
//! Watches `GithubIssue` resources and keeps a matching issue open on GitHub.
//! See the library crate for the reconciliation logic.

use anyhow::Result;
use github_issue_controller::runtime::{initialize, run_watch_loop};

#[tokio::main]
async fn main() -> Result<()> {
    let init = initialize().await?;
    run_watch_loop(init.issues, init.reconciler, init.server_state, &init.config).await
}
