//! # Resource Store
//!
//! Versioned access to `GithubIssue` objects in the cluster.
//!
//! Every write goes through `replace`, which sends the `resourceVersion` of
//! the object it was given. A stale version comes back as HTTP 409 and is
//! surfaced as [`StoreError::Conflict`] so the whole invocation is retried.

use async_trait::async_trait;
use kube::api::{Api, Patch, PatchParams, PostParams};
use kube::Client;
use thiserror::Error;

use crate::constants::CONTROLLER_NAME;
use crate::crd::{GithubIssue, GithubIssueStatus};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("resource version conflict")]
    Conflict,
    #[error(transparent)]
    Api(#[from] kube::Error),
}

fn map_write_error(err: kube::Error) -> StoreError {
    match err {
        kube::Error::Api(api_err) if api_err.code == 409 => StoreError::Conflict,
        other => StoreError::Api(other),
    }
}

#[async_trait]
pub trait IssueStore: Send + Sync {
    /// Fresh read; `None` when the object no longer exists
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<GithubIssue>, StoreError>;

    /// Write metadata and spec, guarded by the object's resourceVersion
    async fn replace(&self, issue: &GithubIssue) -> Result<GithubIssue, StoreError>;

    /// Merge-patch the status subresource
    async fn patch_status(
        &self,
        namespace: &str,
        name: &str,
        status: &GithubIssueStatus,
    ) -> Result<(), StoreError>;
}

/// Store backed by the Kubernetes API
#[derive(Clone)]
pub struct KubeIssueStore {
    client: Client,
}

impl std::fmt::Debug for KubeIssueStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeIssueStore").finish_non_exhaustive()
    }
}

impl KubeIssueStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api(&self, namespace: &str) -> Api<GithubIssue> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

#[async_trait]
impl IssueStore for KubeIssueStore {
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<GithubIssue>, StoreError> {
        Ok(self.api(namespace).get_opt(name).await?)
    }

    async fn replace(&self, issue: &GithubIssue) -> Result<GithubIssue, StoreError> {
        let namespace = issue.metadata.namespace.as_deref().unwrap_or("default");
        let name = issue.metadata.name.as_deref().unwrap_or_default();
        let params = PostParams {
            dry_run: false,
            field_manager: Some(CONTROLLER_NAME.to_string()),
        };
        self.api(namespace)
            .replace(name, &params, issue)
            .await
            .map_err(map_write_error)
    }

    async fn patch_status(
        &self,
        namespace: &str,
        name: &str,
        status: &GithubIssueStatus,
    ) -> Result<(), StoreError> {
        let patch = serde_json::json!({ "status": status });
        self.api(namespace)
            .patch_status(name, &PatchParams::default(), &Patch::Merge(patch))
            .await
            .map_err(map_write_error)?;
        Ok(())
    }
}
