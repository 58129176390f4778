//! # Issue Tracker
//!
//! Remote issue operations behind the [`IssueTracker`] trait.
//!
//! The reconciler only talks to this trait; [`github::GithubClient`] is the
//! REST implementation used in production and tests substitute an in-memory
//! fake.

pub mod github;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::credentials::AccessToken;

pub use github::GithubClient;

/// Remote issue state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    Open,
    Closed,
}

impl IssueState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }
}

/// Title and body of an issue, as desired or as observed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueContent {
    pub title: String,
    pub body: String,
}

impl IssueContent {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }

    /// Title and body match after trailing line-ending trim
    pub fn matches(&self, other: &IssueContent) -> bool {
        self.same_title(other) && trim_line_endings(&self.body) == trim_line_endings(&other.body)
    }

    /// Title match used to find an existing issue before one is tracked
    pub fn same_title(&self, other: &IssueContent) -> bool {
        trim_line_endings(&self.title) == trim_line_endings(&other.title)
    }
}

fn trim_line_endings(s: &str) -> &str {
    s.trim_end_matches(['\n', '\r'])
}

/// Issue as reported by the tracker. Never cached across reconciliations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteIssue {
    pub id: u64,
    pub content: IssueContent,
    pub state: IssueState,
    pub url: String,
}

/// Result of a successful create
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedIssue {
    pub id: u64,
    pub url: String,
}

#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("tracker returned HTTP {status}: {message}")]
    Api { status: u16, message: String },
    #[error("malformed tracker response: {0}")]
    MalformedResponse(String),
    #[error("repository url {0:?} has no /repos/{{owner}}/{{repo}} path")]
    InvalidRepository(String),
    #[error("tracker request timed out")]
    Timeout,
    #[error("tracker request failed: {0}")]
    Transport(#[source] reqwest::Error),
}

impl TrackerError {
    /// HTTP status for API errors
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Short label used in metrics and status reasons
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Api { .. } => "api_error",
            Self::MalformedResponse(_) => "malformed_response",
            Self::InvalidRepository(_) => "invalid_repository",
            Self::Timeout => "timeout",
            Self::Transport(_) => "transport",
        }
    }
}

impl From<reqwest::Error> for TrackerError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport(err)
        }
    }
}

/// Remote issue operations. `repository` is the collection URL from the CR,
/// e.g. `https://api.github.com/repos/acme/widgets`.
#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// Create an open issue; succeeds only on HTTP 201
    async fn create(
        &self,
        token: &AccessToken,
        repository: &str,
        content: &IssueContent,
    ) -> Result<CreatedIssue, TrackerError>;

    /// Fetch one issue by identifier
    async fn get(
        &self,
        token: &AccessToken,
        repository: &str,
        id: u64,
    ) -> Result<RemoteIssue, TrackerError>;

    /// Overwrite title, body and state
    async fn update(
        &self,
        token: &AccessToken,
        repository: &str,
        id: u64,
        content: &IssueContent,
        state: IssueState,
    ) -> Result<(), TrackerError>;

    /// Close the issue, keeping title and body as given
    async fn close(
        &self,
        token: &AccessToken,
        repository: &str,
        id: u64,
        content: &IssueContent,
    ) -> Result<(), TrackerError> {
        self.update(token, repository, id, content, IssueState::Closed)
            .await
    }

    /// Open issues of the repository, in tracker order
    async fn search_open(
        &self,
        token: &AccessToken,
        repository: &str,
    ) -> Result<Vec<RemoteIssue>, TrackerError>;
}

/// Identifier from the last path segment of an issue URL
///
/// ```
/// use github_issue_controller::tracker::issue_id_from_url;
///
/// assert_eq!(issue_id_from_url("https://api.github.com/repos/a/b/issues/42").unwrap(), 42);
/// assert!(issue_id_from_url("https://api.github.com/repos/a/b/issues/").is_err());
/// ```
pub fn issue_id_from_url(url: &str) -> Result<u64, TrackerError> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .and_then(|segment| segment.parse::<u64>().ok())
        .ok_or_else(|| {
            TrackerError::MalformedResponse(format!("no issue number at the end of url {url:?}"))
        })
}

/// Issue URL for an identifier; inverse of [`issue_id_from_url`]
pub fn issue_url(repository: &str, id: u64) -> String {
    format!("{}/issues/{id}", repository.trim_end_matches('/'))
}

/// Split a repository URL into the API root and `owner/repo`
///
/// ```
/// use github_issue_controller::tracker::split_repository;
///
/// let (root, slug) = split_repository("https://api.github.com/repos/acme/widgets").unwrap();
/// assert_eq!(root, "https://api.github.com");
/// assert_eq!(slug, "acme/widgets");
/// ```
pub fn split_repository(repository: &str) -> Option<(&str, &str)> {
    let index = repository.find("/repos/")?;
    let root = &repository[..index];
    let slug = repository[index + "/repos/".len()..].trim_end_matches('/');
    if slug.is_empty() {
        None
    } else {
        Some((root, slug))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_id_round_trip() {
        let repo = "https://api.github.com/repos/acme/widgets";
        let id = issue_id_from_url("https://api.github.com/repos/acme/widgets/issues/42").unwrap();
        assert_eq!(id, 42);
        assert_eq!(
            issue_url(repo, id),
            "https://api.github.com/repos/acme/widgets/issues/42"
        );
        assert_eq!(issue_url(&format!("{repo}/"), id), issue_url(repo, id));
    }

    #[test]
    fn test_issue_id_rejects_non_numeric_segment() {
        assert!(matches!(
            issue_id_from_url("https://api.github.com/repos/acme/widgets/issues/abc"),
            Err(TrackerError::MalformedResponse(_))
        ));
        assert!(issue_id_from_url("").is_err());
    }

    #[test]
    fn test_split_repository_requires_repos_segment() {
        assert_eq!(split_repository("https://example.com/acme/widgets"), None);
        assert_eq!(split_repository("https://example.com/repos/"), None);
        assert_eq!(
            split_repository("http://127.0.0.1:8080/repos/acme/widgets/"),
            Some(("http://127.0.0.1:8080", "acme/widgets"))
        );
    }

    #[test]
    fn test_content_comparison_ignores_trailing_line_endings() {
        let desired = IssueContent::new("Flaky CI", "Fails often");
        assert!(desired.matches(&IssueContent::new("Flaky CI", "Fails often\r\n")));
        assert!(!desired.matches(&IssueContent::new("Flaky CI ", "Fails often")));
        assert!(!desired.matches(&IssueContent::new("Flaky CI", " Fails often")));
    }

    #[test]
    fn test_title_comparison_ignores_trailing_line_endings() {
        let desired = IssueContent::new("Flaky CI\n", "Fails often");
        assert!(desired.same_title(&IssueContent::new("Flaky CI", "other")));
        assert!(desired.matches(&IssueContent::new("Flaky CI", "Fails often")));
        assert!(!desired.same_title(&IssueContent::new("Flaky", "Fails often")));
    }
}
