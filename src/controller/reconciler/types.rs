//! # Types
//!
//! Core types for the reconciler.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use thiserror::Error;
use tracing::warn;

use super::store::{IssueStore, StoreError};
use crate::config::ControllerConfig;
use crate::controller::backoff::FibonacciBackoff;
use crate::credentials::{CredentialError, CredentialProvider};
use crate::tracker::{IssueTracker, TrackerError};

#[derive(Debug, Error)]
pub enum ReconcilerError {
    #[error("resource was modified concurrently, retrying")]
    StoreConflict,
    #[error("cluster API error: {0}")]
    Store(#[source] kube::Error),
    #[error(transparent)]
    Tracker(#[from] TrackerError),
    #[error(transparent)]
    Credential(#[from] CredentialError),
    #[error("reconciliation did not finish within {0:?}")]
    Timeout(Duration),
}

impl From<StoreError> for ReconcilerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict => Self::StoreConflict,
            StoreError::Api(e) => Self::Store(e),
        }
    }
}

impl ReconcilerError {
    /// Label used for requeue metrics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::StoreConflict => "store-conflict",
            Self::Store(_) => "store",
            Self::Tracker(_) => "tracker",
            Self::Credential(_) => "credential",
            Self::Timeout(_) => "timeout",
        }
    }
}

/// Backoff state for a specific resource
#[derive(Debug, Clone)]
pub struct BackoffState {
    pub backoff: FibonacciBackoff,
    pub error_count: u32,
}

impl BackoffState {
    pub fn new(min_minutes: u64, max_minutes: u64) -> Self {
        Self {
            backoff: FibonacciBackoff::new(min_minutes, max_minutes),
            error_count: 0,
        }
    }
}

/// Shared reconciliation context
///
/// Collaborators sit behind traits so the state machine can run against the
/// cluster and GitHub in production and against in-memory fakes in tests.
#[derive(Clone)]
pub struct Reconciler {
    pub store: Arc<dyn IssueStore>,
    pub tracker: Arc<dyn IssueTracker>,
    pub credentials: Arc<dyn CredentialProvider>,
    pub config: Arc<ControllerConfig>,
    // Backoff state per resource (namespace/name), driven by the error policy
    pub backoff_states: Arc<Mutex<HashMap<String, BackoffState>>>,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    pub fn new(
        store: Arc<dyn IssueStore>,
        tracker: Arc<dyn IssueTracker>,
        credentials: Arc<dyn CredentialProvider>,
        config: Arc<ControllerConfig>,
    ) -> Self {
        Self {
            store,
            tracker,
            credentials,
            config,
            backoff_states: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Advance the backoff for a failing resource.
    /// Returns the delay and how many consecutive errors it has seen.
    pub fn next_error_backoff(&self, resource_key: &str) -> (Duration, u32) {
        match self.backoff_states.lock() {
            Ok(mut states) => {
                let state = states.entry(resource_key.to_string()).or_insert_with(|| {
                    BackoffState::new(self.config.backoff_min_minutes, self.config.backoff_max_minutes)
                });
                state.error_count += 1;
                (state.backoff.next_backoff(), state.error_count)
            }
            Err(e) => {
                warn!("Failed to lock backoff_states: {}, using default backoff", e);
                (Duration::from_secs(self.config.backoff_min_minutes * 60), 0)
            }
        }
    }

    /// Forget the failure history of a resource after a successful pass
    pub fn reset_backoff(&self, resource_key: &str) {
        if let Ok(mut states) = self.backoff_states.lock() {
            states.remove(resource_key);
        }
    }
}

/// Key used for per-resource bookkeeping
pub fn resource_key(namespace: &str, name: &str) -> String {
    format!("{namespace}/{name}")
}
