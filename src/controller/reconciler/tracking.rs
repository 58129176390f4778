//! # Tracking State
//!
//! Finalizer and issue-number annotation bookkeeping on a `GithubIssue`.
//! Mutators return whether they changed anything so callers can skip writes.

use crate::constants::{ISSUE_FINALIZER, ISSUE_NUMBER_ANNOTATION};
use crate::crd::GithubIssue;

pub fn has_finalizer(issue: &GithubIssue) -> bool {
    issue
        .metadata
        .finalizers
        .as_ref()
        .is_some_and(|f| f.iter().any(|x| x == ISSUE_FINALIZER))
}

pub fn add_finalizer(issue: &mut GithubIssue) -> bool {
    if has_finalizer(issue) {
        return false;
    }
    issue
        .metadata
        .finalizers
        .get_or_insert_with(Vec::new)
        .push(ISSUE_FINALIZER.to_string());
    true
}

pub fn remove_finalizer(issue: &mut GithubIssue) -> bool {
    let Some(finalizers) = issue.metadata.finalizers.as_mut() else {
        return false;
    };
    let before = finalizers.len();
    finalizers.retain(|f| f != ISSUE_FINALIZER);
    before != finalizers.len()
}

/// Raw annotation value, if any
pub fn tracking_annotation(issue: &GithubIssue) -> Option<&str> {
    issue
        .metadata
        .annotations
        .as_ref()
        .and_then(|a| a.get(ISSUE_NUMBER_ANNOTATION))
        .map(String::as_str)
}

/// Tracked remote issue number. An unparseable annotation counts as absent.
pub fn tracking_id(issue: &GithubIssue) -> Option<u64> {
    tracking_annotation(issue).and_then(|v| v.trim().parse().ok())
}

pub fn set_tracking_id(issue: &mut GithubIssue, id: u64) -> bool {
    let value = id.to_string();
    if tracking_annotation(issue) == Some(value.as_str()) {
        return false;
    }
    issue
        .metadata
        .annotations
        .get_or_insert_with(Default::default)
        .insert(ISSUE_NUMBER_ANNOTATION.to_string(), value);
    true
}
