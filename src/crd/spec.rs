//! # GithubIssue Spec
//!
//! Desired state of a remote issue.

use serde::{Deserialize, Serialize};

/// GithubIssue Custom Resource Definition
///
/// Declares that an open issue with the given title and body should exist in a
/// repository. The controller creates, updates, and finally closes the remote
/// issue to match.
///
/// # Example
///
/// ```yaml
/// apiVersion: training.redhat.com/v1alpha1
/// kind: GithubIssue
/// metadata:
///   name: flaky-ci
///   namespace: default
/// spec:
///   repo: https://api.github.com/repos/acme/widgets
///   title: CI is flaky on main
///   description: The integration suite times out roughly one run in five.
/// ```
#[derive(kube::CustomResource, Debug, Clone, Deserialize, Serialize, schemars::JsonSchema)]
#[kube(
    kind = "GithubIssue",
    group = "training.redhat.com",
    version = "v1alpha1",
    namespaced,
    status = "crate::crd::GithubIssueStatus",
    shortname = "ghi",
    printcolumn = r#"{"name":"Issue", "type":"integer", "jsonPath":".status.issueNumber"}, {"name":"Ready", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Ready\")].status"}, {"name":"Title", "type":"string", "jsonPath":".spec.title", "priority": 1}, {"name":"Age", "type":"date", "jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct GithubIssueSpec {
    /// Repository API collection URL, e.g. `https://api.github.com/repos/acme/widgets`
    pub repo: String,
    /// Desired issue title; used to find an existing issue before one is tracked
    pub title: String,
    /// Desired issue body
    #[serde(default)]
    pub description: String,
    /// Advisory only. The tracked identifier lives in an annotation.
    #[serde(default, alias = "issumeNumber", skip_serializing_if = "Option::is_none")]
    pub issue_number: Option<i64>,
}
