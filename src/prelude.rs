//! # Prelude
//!
//! Commonly used types and traits, importable with
//! `use github_issue_controller::prelude::*;`.

pub use crate::crd::*;

pub use crate::tracker::{
    CreatedIssue, GithubClient, IssueContent, IssueState, IssueTracker, RemoteIssue, TrackerError,
};

pub use crate::credentials::{AccessToken, CredentialError, CredentialProvider};

pub use crate::controller::reconciler::{
    reconcile, IssueStore, KubeIssueStore, Reconciler, ReconcilerError, StoreError,
};

pub use crate::config::{ControllerConfig, ServerConfig};
