//! In-memory collaborators for exercising the state machine without a cluster
//! or a tracker.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;

use super::store::{IssueStore, StoreError};
use super::types::Reconciler;
use crate::config::ControllerConfig;
use crate::credentials::{AccessToken, CredentialError, CredentialProvider};
use crate::crd::{GithubIssue, GithubIssueSpec, GithubIssueStatus};
use crate::tracker::{
    issue_url, CreatedIssue, IssueContent, IssueState, IssueTracker, RemoteIssue, TrackerError,
};

pub const NAMESPACE: &str = "default";
pub const NAME: &str = "flaky-ci";
pub const REPO: &str = "https://api.github.com/repos/acme/widgets";

pub fn github_issue(title: &str, description: &str) -> GithubIssue {
    let mut issue = GithubIssue::new(
        NAME,
        GithubIssueSpec {
            repo: REPO.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            issue_number: None,
        },
    );
    issue.metadata.namespace = Some(NAMESPACE.to_string());
    issue.metadata.generation = Some(1);
    issue
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct StoreState {
    objects: BTreeMap<(String, String), GithubIssue>,
    version: u64,
    replaces: usize,
    status_patches: usize,
    injected_conflicts: usize,
}

/// Mimics API server semantics that matter here: resourceVersion checks,
/// status being ignored by replace, and removal once a deleting object has
/// no finalizers left.
#[derive(Debug, Default)]
pub struct FakeStore {
    state: Mutex<StoreState>,
}

impl FakeStore {
    pub fn with(issue: GithubIssue) -> Arc<Self> {
        let store = Arc::new(Self::default());
        store.insert(issue);
        store
    }

    pub fn insert(&self, mut issue: GithubIssue) {
        let mut state = self.state.lock().unwrap();
        state.version += 1;
        issue.metadata.resource_version = Some(state.version.to_string());
        let key = (
            issue.metadata.namespace.clone().unwrap_or_default(),
            issue.metadata.name.clone().unwrap_or_default(),
        );
        state.objects.insert(key, issue);
    }

    pub fn object(&self) -> Option<GithubIssue> {
        let state = self.state.lock().unwrap();
        state
            .objects
            .get(&(NAMESPACE.to_string(), NAME.to_string()))
            .cloned()
    }

    /// Apply an out-of-band change, as another client would
    pub fn modify(&self, f: impl FnOnce(&mut GithubIssue)) {
        let mut issue = self.object().expect("object exists");
        f(&mut issue);
        self.insert(issue);
    }

    pub fn mark_deleted(&self) {
        self.modify(|issue| {
            issue.metadata.deletion_timestamp = Some(
                serde_json::from_value::<Time>(serde_json::json!("2026-10-19T12:00:00Z"))
                    .unwrap(),
            );
        });
    }

    pub fn inject_conflict(&self) {
        self.state.lock().unwrap().injected_conflicts += 1;
    }

    pub fn replaces(&self) -> usize {
        self.state.lock().unwrap().replaces
    }

    pub fn status_patches(&self) -> usize {
        self.state.lock().unwrap().status_patches
    }
}

#[async_trait]
impl IssueStore for FakeStore {
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<GithubIssue>, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .objects
            .get(&(namespace.to_string(), name.to_string()))
            .cloned())
    }

    async fn replace(&self, issue: &GithubIssue) -> Result<GithubIssue, StoreError> {
        let mut state = self.state.lock().unwrap();
        if state.injected_conflicts > 0 {
            state.injected_conflicts -= 1;
            return Err(StoreError::Conflict);
        }
        let key = (
            issue.metadata.namespace.clone().unwrap_or_default(),
            issue.metadata.name.clone().unwrap_or_default(),
        );
        let Some(stored) = state.objects.get(&key) else {
            return Err(StoreError::Conflict);
        };
        if stored.metadata.resource_version != issue.metadata.resource_version {
            return Err(StoreError::Conflict);
        }

        let mut next = issue.clone();
        next.status = stored.status.clone();
        state.version += 1;
        state.replaces += 1;
        next.metadata.resource_version = Some(state.version.to_string());

        let released = next.metadata.deletion_timestamp.is_some()
            && next.metadata.finalizers.as_ref().map_or(true, Vec::is_empty);
        if released {
            state.objects.remove(&key);
        } else {
            state.objects.insert(key, next.clone());
        }
        Ok(next)
    }

    async fn patch_status(
        &self,
        namespace: &str,
        name: &str,
        status: &GithubIssueStatus,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        state.version += 1;
        let version = state.version.to_string();
        state.status_patches += 1;
        if let Some(obj) = state
            .objects
            .get_mut(&(namespace.to_string(), name.to_string()))
        {
            obj.status = Some(status.clone());
            obj.metadata.resource_version = Some(version);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tracker
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct TrackerState {
    issues: BTreeMap<u64, RemoteIssue>,
    last_id: u64,
    calls: Vec<&'static str>,
    failures: Vec<(&'static str, TrackerError)>,
    delay: Option<Duration>,
}

/// Single-repository tracker; identifiers are assigned sequentially from 1
#[derive(Debug, Default)]
pub struct FakeTracker {
    state: Mutex<TrackerState>,
}

impl FakeTracker {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Seed an issue that already exists on the tracker
    pub fn seed(&self, title: &str, body: &str, state: IssueState) -> u64 {
        let mut s = self.state.lock().unwrap();
        s.last_id += 1;
        let id = s.last_id;
        s.issues.insert(
            id,
            RemoteIssue {
                id,
                content: IssueContent::new(title, body),
                state,
                url: issue_url(REPO, id),
            },
        );
        id
    }

    pub fn issue(&self, id: u64) -> Option<RemoteIssue> {
        self.state.lock().unwrap().issues.get(&id).cloned()
    }

    /// Edit an issue the way a human would through the web UI
    pub fn edit(&self, id: u64, f: impl FnOnce(&mut RemoteIssue)) {
        if let Some(issue) = self.state.lock().unwrap().issues.get_mut(&id) {
            f(issue);
        }
    }

    /// Fail the next call of `operation` with `error`
    pub fn fail_next(&self, operation: &'static str, error: TrackerError) {
        self.state.lock().unwrap().failures.push((operation, error));
    }

    pub fn set_delay(&self, delay: Duration) {
        self.state.lock().unwrap().delay = Some(delay);
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count(&self, operation: &str) -> usize {
        self.calls().iter().filter(|c| **c == operation).count()
    }

    fn begin(&self, operation: &'static str) -> Result<Option<Duration>, TrackerError> {
        let mut s = self.state.lock().unwrap();
        s.calls.push(operation);
        if let Some(pos) = s.failures.iter().position(|(op, _)| *op == operation) {
            return Err(s.failures.remove(pos).1);
        }
        Ok(s.delay)
    }

    async fn enter(&self, operation: &'static str) -> Result<(), TrackerError> {
        if let Some(delay) = self.begin(operation)? {
            tokio::time::sleep(delay).await;
        }
        Ok(())
    }
}

fn not_found() -> TrackerError {
    TrackerError::Api {
        status: 404,
        message: "Not Found".to_string(),
    }
}

#[async_trait]
impl IssueTracker for FakeTracker {
    async fn create(
        &self,
        _token: &AccessToken,
        repository: &str,
        content: &IssueContent,
    ) -> Result<CreatedIssue, TrackerError> {
        self.enter("create").await?;
        let mut s = self.state.lock().unwrap();
        s.last_id += 1;
        let id = s.last_id;
        let url = issue_url(repository, id);
        s.issues.insert(
            id,
            RemoteIssue {
                id,
                content: content.clone(),
                state: IssueState::Open,
                url: url.clone(),
            },
        );
        Ok(CreatedIssue { id, url })
    }

    async fn get(
        &self,
        _token: &AccessToken,
        _repository: &str,
        id: u64,
    ) -> Result<RemoteIssue, TrackerError> {
        self.enter("get").await?;
        self.state
            .lock()
            .unwrap()
            .issues
            .get(&id)
            .cloned()
            .ok_or_else(not_found)
    }

    async fn update(
        &self,
        _token: &AccessToken,
        _repository: &str,
        id: u64,
        content: &IssueContent,
        state: IssueState,
    ) -> Result<(), TrackerError> {
        self.enter(match state {
            IssueState::Open => "update",
            IssueState::Closed => "close",
        })
        .await?;
        let mut s = self.state.lock().unwrap();
        let issue = s.issues.get_mut(&id).ok_or_else(not_found)?;
        issue.content = content.clone();
        issue.state = state;
        Ok(())
    }

    async fn search_open(
        &self,
        _token: &AccessToken,
        _repository: &str,
    ) -> Result<Vec<RemoteIssue>, TrackerError> {
        self.enter("search").await?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .issues
            .values()
            .filter(|i| i.state == IssueState::Open)
            .cloned()
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct FakeCredentials {
    token: Mutex<Option<String>>,
}

impl FakeCredentials {
    pub fn with_token(token: &str) -> Arc<Self> {
        Arc::new(Self {
            token: Mutex::new(Some(token.to_string())),
        })
    }

    pub fn without_token() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set(&self, token: Option<&str>) {
        *self.token.lock().unwrap() = token.map(str::to_string);
    }
}

#[async_trait]
impl CredentialProvider for FakeCredentials {
    async fn token(&self) -> Result<Option<AccessToken>, CredentialError> {
        Ok(self
            .token
            .lock()
            .unwrap()
            .as_deref()
            .and_then(AccessToken::from_raw))
    }
}

pub fn reconciler(
    store: &Arc<FakeStore>,
    tracker: &Arc<FakeTracker>,
    credentials: &Arc<FakeCredentials>,
) -> Reconciler {
    Reconciler::new(
        Arc::clone(store) as Arc<dyn IssueStore>,
        Arc::clone(tracker) as Arc<dyn IssueTracker>,
        Arc::clone(credentials) as Arc<dyn CredentialProvider>,
        Arc::new(ControllerConfig::default()),
    )
}
