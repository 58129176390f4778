//! # Validation
//!
//! Checks a `GithubIssue` spec before any tracker call.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::crd::GithubIssueSpec;

/// `http(s)://host[/prefix]/repos/{owner}/{repo}`; the prefix allows GitHub Enterprise `/api/v3`
static REPO_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https?://[^/\s?#]+(/[^\s?#]*)?/repos/[A-Za-z0-9_.-]+/[A-Za-z0-9_.-]+/?$")
        .expect("repository URL pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("spec.repo {0:?} must look like https://api.github.com/repos/OWNER/REPO")]
    InvalidRepository(String),
    #[error("spec.title must not be empty")]
    EmptyTitle,
}

pub fn validate_spec(spec: &GithubIssueSpec) -> Result<(), ValidationError> {
    if !REPO_URL.is_match(spec.repo.trim()) {
        return Err(ValidationError::InvalidRepository(spec.repo.clone()));
    }
    if spec.title.trim().is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(repo: &str, title: &str) -> GithubIssueSpec {
        GithubIssueSpec {
            repo: repo.to_string(),
            title: title.to_string(),
            description: String::new(),
            issue_number: None,
        }
    }

    #[test]
    fn test_accepts_public_and_enterprise_urls() {
        for repo in [
            "https://api.github.com/repos/acme/widgets",
            "https://api.github.com/repos/acme/widgets/",
            "https://ghe.example.com/api/v3/repos/platform-team/my_repo.rs",
            "http://127.0.0.1:1234/repos/acme/widgets",
        ] {
            assert_eq!(validate_spec(&spec(repo, "t")), Ok(()), "{repo}");
        }
    }

    #[test]
    fn test_rejects_malformed_urls() {
        for repo in [
            "",
            "api.github.com/repos/acme/widgets",
            "ftp://api.github.com/repos/acme/widgets",
            "https://github.com/acme/widgets",
            "https://api.github.com/repos/acme",
            "https://api.github.com/repos/acme/widgets/issues",
            "https://api.github.com/repos/ac me/widgets",
            "https://api.github.com/repos/acme/widgets?x=1",
        ] {
            assert!(
                matches!(
                    validate_spec(&spec(repo, "t")),
                    Err(ValidationError::InvalidRepository(_))
                ),
                "{repo}"
            );
        }
    }

    #[test]
    fn test_rejects_blank_title() {
        assert_eq!(
            validate_spec(&spec("https://api.github.com/repos/acme/widgets", "  ")),
            Err(ValidationError::EmptyTitle)
        );
    }
}
