//! # Request Types
//!
//! JSON bodies sent to the GitHub issues REST API.

use serde::Serialize;

use crate::tracker::{IssueContent, IssueState};

/// Body for `POST {repo}/issues` and `PATCH {repo}/issues/{number}`
///
/// API Reference: https://docs.github.com/en/rest/issues/issues#update-an-issue
#[derive(Debug, Serialize)]
pub struct IssueRequest<'a> {
    pub title: &'a str,
    pub body: &'a str,
    pub state: IssueState,
}

impl<'a> IssueRequest<'a> {
    pub fn new(content: &'a IssueContent, state: IssueState) -> Self {
        Self {
            title: &content.title,
            body: &content.body,
            state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_lowercase_state() {
        let content = IssueContent::new("t", "b");
        let json = serde_json::to_value(IssueRequest::new(&content, IssueState::Closed)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"title": "t", "body": "b", "state": "closed"})
        );
    }
}
