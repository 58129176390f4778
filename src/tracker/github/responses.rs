//! # Response Types
//!
//! JSON payloads returned by the GitHub issues REST API. Only the fields the
//! controller reads are declared; everything else is ignored.

use serde::Deserialize;

use crate::tracker::{issue_id_from_url, IssueContent, IssueState, RemoteIssue, TrackerError};

/// Issue resource
///
/// API Reference: https://docs.github.com/en/rest/issues/issues#get-an-issue
#[derive(Debug, Deserialize)]
pub struct IssueResponse {
    /// API URL, ends in the issue number
    pub url: String,
    /// Browser URL
    #[serde(default)]
    pub html_url: Option<String>,
    pub title: String,
    /// GitHub sends `null` for an empty body
    #[serde(default)]
    pub body: Option<String>,
    pub state: IssueState,
}

impl IssueResponse {
    pub fn into_remote(self) -> Result<RemoteIssue, TrackerError> {
        let id = issue_id_from_url(&self.url)?;
        Ok(RemoteIssue {
            id,
            content: IssueContent {
                title: self.title,
                body: self.body.unwrap_or_default(),
            },
            state: self.state,
            url: self.html_url.unwrap_or(self.url),
        })
    }
}

/// Response of `POST {repo}/issues`
#[derive(Debug, Deserialize)]
pub struct CreatedIssueResponse {
    pub url: String,
    #[serde(default)]
    pub html_url: Option<String>,
}

/// Response of `GET /search/issues`
///
/// API Reference: https://docs.github.com/en/rest/search/search#search-issues-and-pull-requests
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    pub items: Vec<IssueResponse>,
}

/// Error body returned on non-2xx responses
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_with_null_body() {
        let issue: IssueResponse = serde_json::from_value(serde_json::json!({
            "url": "https://api.github.com/repos/acme/widgets/issues/9",
            "html_url": "https://github.com/acme/widgets/issues/9",
            "number": 9,
            "title": "t",
            "body": null,
            "state": "open"
        }))
        .unwrap();
        let remote = issue.into_remote().unwrap();
        assert_eq!(remote.id, 9);
        assert_eq!(remote.content.body, "");
        assert_eq!(remote.url, "https://github.com/acme/widgets/issues/9");
    }

    #[test]
    fn test_unknown_state_is_rejected() {
        let parsed = serde_json::from_value::<IssueResponse>(serde_json::json!({
            "url": "https://api.github.com/repos/acme/widgets/issues/9",
            "title": "t",
            "state": "locked"
        }));
        assert!(parsed.is_err());
    }
}
