//! # Status Updates
//!
//! Maintains the `Ready` condition and tracked-issue fields on a `GithubIssue`.
//! Writes only when something other than timestamps changed, so a status
//! update never triggers another reconciliation on its own.

use tracing::debug;

use super::store::{IssueStore, StoreError};
use crate::crd::{Condition, GithubIssue, GithubIssueStatus, READY_CONDITION};

/// Reason strings reported on the `Ready` condition
pub mod reason {
    pub const CREATED: &str = "IssueCreated";
    pub const ADOPTED: &str = "IssueAdopted";
    pub const UPDATED: &str = "IssueUpdated";
    pub const IN_SYNC: &str = "InSync";
    pub const INVALID_SPEC: &str = "InvalidSpec";
    pub const MALFORMED_RESPONSE: &str = "MalformedResponse";
    pub const TRACKER_ERROR: &str = "TrackerError";
}

/// Outcome of one reconciliation, as it should appear on the resource
#[derive(Debug, Clone)]
pub struct StatusReport {
    pub ready: bool,
    pub reason: &'static str,
    pub message: String,
    /// Tracked issue number and URL; `None` keeps what is already reported
    pub issue: Option<(u64, String)>,
}

impl StatusReport {
    pub fn ready(reason: &'static str, message: impl Into<String>) -> Self {
        Self {
            ready: true,
            reason,
            message: message.into(),
            issue: None,
        }
    }

    pub fn not_ready(reason: &'static str, message: impl Into<String>) -> Self {
        Self {
            ready: false,
            reason,
            message: message.into(),
            issue: None,
        }
    }

    pub fn with_issue(mut self, id: u64, url: impl Into<String>) -> Self {
        self.issue = Some((id, url.into()));
        self
    }
}

/// Status the resource should carry after `report`.
/// Timestamps are carried over from `current` and only refreshed by [`update_status`].
pub fn desired_status(issue: &GithubIssue, report: &StatusReport) -> GithubIssueStatus {
    let current = issue.status.clone().unwrap_or_default();
    let status_value = if report.ready { "True" } else { "False" };

    let previous = current.ready();
    let last_transition_time = match previous {
        Some(c) if c.status == status_value => c.last_transition_time.clone(),
        _ => None,
    };

    let (issue_number, issue_url) = match &report.issue {
        Some((id, url)) => (Some(*id), Some(url.clone())),
        None => (current.issue_number, current.issue_url.clone()),
    };

    GithubIssueStatus {
        conditions: vec![Condition {
            r#type: READY_CONDITION.to_string(),
            status: status_value.to_string(),
            last_transition_time,
            reason: Some(report.reason.to_string()),
            message: Some(report.message.clone()),
        }],
        issue_url,
        issue_number,
        observed_generation: issue.metadata.generation,
        last_update_time: current.last_update_time.clone(),
    }
}

/// Write the status if it differs from what the resource already reports
pub async fn update_status(
    store: &dyn IssueStore,
    issue: &GithubIssue,
    report: &StatusReport,
) -> Result<bool, StoreError> {
    let mut next = desired_status(issue, report);
    if issue.status.as_ref() == Some(&next) {
        debug!(reason = report.reason, "Skipping status update - unchanged");
        return Ok(false);
    }

    let now = chrono::Utc::now().to_rfc3339();
    if let Some(c) = next.conditions.first_mut() {
        if c.last_transition_time.is_none() {
            c.last_transition_time = Some(now.clone());
        }
    }
    next.last_update_time = Some(now);

    let namespace = issue.metadata.namespace.as_deref().unwrap_or("default");
    let name = issue.metadata.name.as_deref().unwrap_or_default();
    store.patch_status(namespace, name, &next).await?;
    Ok(true)
}
