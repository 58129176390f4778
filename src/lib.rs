//! GitHub Issue Controller Library
//!
//! Core functionality for the controller that keeps GitHub issues in sync
//! with `GithubIssue` custom resources. Tests live beside the code they cover.
//!
//! ```rust
//! use github_issue_controller::prelude::*;
//! ```

pub mod config;
pub mod constants;
pub mod controller;
pub mod crd;
pub mod credentials;
pub mod observability;
pub mod prelude;
pub mod runtime;
pub mod tracker;
