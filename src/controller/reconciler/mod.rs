//! # Reconciler
//!
//! Keeps one remote issue in step with one `GithubIssue`.
//!
//! - `reconcile.rs` - the state machine and its runtime entry point
//! - `tracking.rs` - finalizer and issue-number annotation bookkeeping
//! - `store.rs` - versioned resource reads and writes
//! - `status.rs` - `Ready` condition reporting
//! - `validation.rs` - spec checks
//! - `types.rs` - context and error types

mod reconcile;
pub mod status;
pub mod store;
pub mod tracking;
mod types;
pub mod validation;

#[cfg(test)]
pub(crate) mod fakes;

pub use reconcile::{reconcile, reconcile_issue};
pub use store::{IssueStore, KubeIssueStore, StoreError};
pub use types::{resource_key, BackoffState, Reconciler, ReconcilerError};
