//! # Reconcile
//!
//! The per-resource state machine.
//!
//! Each pass starts from a fresh read of the resource and performs at most
//! one remote mutation:
//!
//! - deleting: close the tracked issue, then drop the finalizer
//! - no finalizer yet: add it and stop
//! - tracked: fetch by number, update only when title or body drifted
//! - untracked: adopt the first open issue with the same title, or create one
//!
//! Resource writes are versioned, so a concurrent change fails the pass with
//! a conflict and the whole pass is retried.

use std::sync::Arc;
use std::time::Instant;

use kube::ResourceExt;
use kube_runtime::controller::Action;
use tracing::{debug, info, warn};

use super::status::{reason, update_status, StatusReport};
use super::tracking;
use super::types::{resource_key, Reconciler, ReconcilerError};
use super::validation::validate_spec;
use crate::credentials::AccessToken;
use crate::crd::GithubIssue;
use crate::observability::metrics;
use crate::tracker::{IssueContent, IssueState, RemoteIssue, TrackerError};

/// Entry point used by the controller runtime
///
/// Bounds the pass by the configured deadline and records metrics. A
/// successful pass clears the resource's error backoff.
pub async fn reconcile(
    obj: Arc<GithubIssue>,
    ctx: Arc<Reconciler>,
) -> Result<Action, ReconcilerError> {
    let name = obj.name_any();
    let namespace = obj.namespace().unwrap_or_else(|| "default".to_string());
    let key = resource_key(&namespace, &name);

    metrics::increment_reconciliations();
    let start = Instant::now();
    let deadline = ctx.config.reconcile_deadline();

    let result = match tokio::time::timeout(deadline, reconcile_issue(&ctx, &namespace, &name)).await
    {
        Ok(result) => result,
        Err(_) => Err(ReconcilerError::Timeout(deadline)),
    };

    metrics::observe_reconciliation_duration(start.elapsed().as_secs_f64());
    if result.is_ok() {
        ctx.reset_backoff(&key);
    }
    result
}

/// One pass of the state machine for `namespace/name`
pub async fn reconcile_issue(
    ctx: &Reconciler,
    namespace: &str,
    name: &str,
) -> Result<Action, ReconcilerError> {
    let Some(mut issue) = ctx.store.get(namespace, name).await? else {
        debug!("GithubIssue no longer exists, nothing to do");
        return Ok(Action::await_change());
    };

    if issue.metadata.deletion_timestamp.is_some() {
        return finalize(ctx, issue).await;
    }

    if !tracking::has_finalizer(&issue) {
        tracking::add_finalizer(&mut issue);
        ctx.store.replace(&issue).await?;
        metrics::increment_finalizer_operations("add");
        info!("Added finalizer");
        return Ok(Action::await_change());
    }

    let Some(token) = ctx.credentials.token().await? else {
        info!("No tracker token available, skipping until the next resync");
        metrics::increment_requeues("no-credential");
        return Ok(Action::requeue(ctx.config.resync_interval()));
    };

    if let Err(e) = validate_spec(&issue.spec) {
        warn!(error = %e, "Invalid GithubIssue spec");
        update_status(
            ctx.store.as_ref(),
            &issue,
            &StatusReport::not_ready(reason::INVALID_SPEC, e.to_string()),
        )
        .await?;
        return Ok(Action::await_change());
    }

    match sync(ctx, &mut issue, &token).await {
        Ok(action) => Ok(action),
        Err(ReconcilerError::Tracker(TrackerError::MalformedResponse(detail))) => {
            warn!(detail = %detail, "Tracker returned a response that could not be understood");
            update_status(
                ctx.store.as_ref(),
                &issue,
                &StatusReport::not_ready(reason::MALFORMED_RESPONSE, detail),
            )
            .await?;
            metrics::increment_requeues("malformed-response");
            Ok(Action::requeue(ctx.config.resync_interval()))
        }
        Err(ReconcilerError::Tracker(e)) => {
            // Report the failure, but return the original error for backoff
            let report = StatusReport::not_ready(reason::TRACKER_ERROR, e.to_string());
            if let Err(status_err) = update_status(ctx.store.as_ref(), &issue, &report).await {
                warn!(error = %status_err, "Failed to report tracker error on status");
            }
            Err(ReconcilerError::Tracker(e))
        }
        Err(e) => Err(e),
    }
}

/// Bring the remote issue in line with the resource
async fn sync(
    ctx: &Reconciler,
    issue: &mut GithubIssue,
    token: &AccessToken,
) -> Result<Action, ReconcilerError> {
    let desired = IssueContent::new(issue.spec.title.clone(), issue.spec.description.clone());
    let repo = issue.spec.repo.trim().to_string();

    if let Some(id) = tracking::tracking_id(issue) {
        let remote = ctx.tracker.get(token, &repo, id).await?;
        return sync_tracked(ctx, issue, token, &repo, &desired, remote).await;
    }

    if let Some(raw) = tracking::tracking_annotation(issue) {
        warn!(annotation = raw, "Ignoring unparseable issue number annotation");
    }

    let candidates = ctx.tracker.search_open(token, &repo).await?;
    if let Some(found) = candidates
        .into_iter()
        .find(|c| c.content.same_title(&desired))
    {
        info!(issue.id = found.id, "Adopting existing open issue with matching title");
        tracking::set_tracking_id(issue, found.id);
        let written = ctx.store.replace(issue).await?;
        update_status(
            ctx.store.as_ref(),
            &written,
            &StatusReport::ready(reason::ADOPTED, format!("Adopted issue #{}", found.id))
                .with_issue(found.id, found.url),
        )
        .await?;
        // Drift, if any, is corrected through the tracked path on the next pass
        return Ok(Action::await_change());
    }

    let created = ctx.tracker.create(token, &repo, &desired).await?;
    info!(issue.id = created.id, "Created issue");
    tracking::set_tracking_id(issue, created.id);
    let written = ctx.store.replace(issue).await?;
    update_status(
        ctx.store.as_ref(),
        &written,
        &StatusReport::ready(reason::CREATED, format!("Created issue #{}", created.id))
            .with_issue(created.id, created.url),
    )
    .await?;
    Ok(Action::requeue(ctx.config.resync_interval()))
}

async fn sync_tracked(
    ctx: &Reconciler,
    issue: &GithubIssue,
    token: &AccessToken,
    repo: &str,
    desired: &IssueContent,
    remote: RemoteIssue,
) -> Result<Action, ReconcilerError> {
    let report = if remote.content.matches(desired) {
        debug!(issue.id = remote.id, "Issue already matches spec");
        if remote.state == IssueState::Closed {
            info!(issue.id = remote.id, "Tracked issue was closed outside the controller");
        }
        StatusReport::ready(reason::IN_SYNC, format!("Issue #{} is up to date", remote.id))
    } else {
        ctx.tracker
            .update(token, repo, remote.id, desired, IssueState::Open)
            .await?;
        info!(issue.id = remote.id, "Updated issue to match spec");
        StatusReport::ready(reason::UPDATED, format!("Updated issue #{}", remote.id))
    };

    update_status(
        ctx.store.as_ref(),
        issue,
        &report.with_issue(remote.id, remote.url),
    )
    .await?;
    Ok(Action::requeue(ctx.config.resync_interval()))
}

/// Deletion path: close the tracked issue, then release the resource
async fn finalize(ctx: &Reconciler, mut issue: GithubIssue) -> Result<Action, ReconcilerError> {
    if !tracking::has_finalizer(&issue) {
        return Ok(Action::await_change());
    }

    if let Some(id) = tracking::tracking_id(&issue) {
        let Some(token) = ctx.credentials.token().await? else {
            warn!(issue.id = id, "No tracker token available, cannot close issue yet");
            metrics::increment_requeues("no-credential");
            return Ok(Action::requeue(ctx.config.resync_interval()));
        };

        let content = IssueContent::new(issue.spec.title.clone(), issue.spec.description.clone());
        // Any failure keeps the finalizer; a 404 may only mean lost access
        ctx.tracker
            .close(&token, issue.spec.repo.trim(), id, &content)
            .await?;
        info!(issue.id = id, "Closed issue");
    }

    tracking::remove_finalizer(&mut issue);
    ctx.store.replace(&issue).await?;
    metrics::increment_finalizer_operations("remove");
    info!("Removed finalizer");

    let key = resource_key(
        issue.metadata.namespace.as_deref().unwrap_or("default"),
        &issue.name_any(),
    );
    ctx.reset_backoff(&key);
    Ok(Action::await_change())
}
