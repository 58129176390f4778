//! GitHub Issues REST Client
//!
//! Native REST implementation of [`IssueTracker`] for the GitHub v3 API.
//! Uses reqwest with rustls; every request carries the token, the v3 media
//! type, the pinned API version and a user agent, and is bounded by the
//! client timeout.
//!
//! The repository URL from the resource is used as-is, so pointing it at a
//! GitHub Enterprise host or a Pact mock server needs no extra configuration.
//!
//! References:
//! - [Issues](https://docs.github.com/en/rest/issues/issues)
//! - [Search](https://docs.github.com/en/rest/search/search#search-issues-and-pull-requests)

mod requests;
mod responses;

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{header, Client, Method, RequestBuilder, StatusCode};
use tracing::{debug, debug_span, warn, Instrument};

use self::requests::IssueRequest;
use self::responses::{CreatedIssueResponse, ErrorResponse, IssueResponse, SearchResponse};
use super::{
    issue_id_from_url, issue_url, split_repository, CreatedIssue, IssueContent, IssueState,
    IssueTracker, RemoteIssue, TrackerError,
};
use crate::constants::{
    CONTROLLER_NAME, TRACKER_ACCEPT, TRACKER_API_VERSION, TRACKER_API_VERSION_HEADER,
};
use crate::credentials::AccessToken;
use crate::observability::metrics;

/// Longest error body kept in error messages
const MAX_ERROR_BODY: usize = 512;

/// GitHub issues REST client
#[derive(Debug, Clone)]
pub struct GithubClient {
    http_client: Client,
}

impl GithubClient {
    /// Create a client whose every request is bounded by `timeout`
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built
    #[allow(
        clippy::missing_errors_doc,
        reason = "Error documentation is provided in doc comments"
    )]
    pub fn new(timeout: Duration) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .user_agent(format!("{CONTROLLER_NAME}/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self { http_client })
    }

    /// Build HTTP request with authentication and API headers
    fn make_request(&self, method: Method, url: &str, token: &AccessToken) -> RequestBuilder {
        self.http_client
            .request(method, url)
            .header(header::AUTHORIZATION, format!("token {}", token.expose()))
            .header(header::ACCEPT, TRACKER_ACCEPT)
            .header(TRACKER_API_VERSION_HEADER, TRACKER_API_VERSION)
    }

    /// Send the request, require `expected`, and decode the body
    async fn call<T, F>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
        expected: StatusCode,
        decode: F,
    ) -> Result<T, TrackerError>
    where
        F: FnOnce(&str) -> Result<T, TrackerError>,
    {
        let start = Instant::now();
        let result = async {
            let response = request.send().await?;
            let status = response.status();
            let text = response.text().await?;
            if status != expected {
                return Err(handle_error_response(status, &text));
            }
            decode(&text)
        }
        .await;

        let outcome = match &result {
            Ok(_) => "success",
            Err(e) => e.kind(),
        };
        metrics::record_tracker_operation(operation, outcome, start.elapsed().as_secs_f64());
        if let Err(e) = &result {
            debug!(tracker.operation = operation, error = %e, "Tracker call failed");
        }
        result
    }
}

/// Map a non-expected response to an API error, preferring GitHub's own message
fn handle_error_response(status: StatusCode, body: &str) -> TrackerError {
    let message = match serde_json::from_str::<ErrorResponse>(body) {
        Ok(error) => error.message,
        Err(_) => body.chars().take(MAX_ERROR_BODY).collect(),
    };
    TrackerError::Api {
        status: status.as_u16(),
        message,
    }
}

fn decode_json<T: serde::de::DeserializeOwned>(
    operation: &str,
    body: &str,
) -> Result<T, TrackerError> {
    serde_json::from_str(body)
        .map_err(|e| TrackerError::MalformedResponse(format!("{operation}: {e}")))
}

#[async_trait]
impl IssueTracker for GithubClient {
    async fn create(
        &self,
        token: &AccessToken,
        repository: &str,
        content: &IssueContent,
    ) -> Result<CreatedIssue, TrackerError> {
        let span = debug_span!("tracker.create", tracker.repository = repository);
        let url = format!("{}/issues", repository.trim_end_matches('/'));
        let request = self
            .make_request(Method::POST, &url, token)
            .json(&IssueRequest::new(content, IssueState::Open));

        self.call("create", request, StatusCode::CREATED, |body| {
            let created: CreatedIssueResponse = decode_json("create", body)?;
            let id = issue_id_from_url(&created.url)?;
            Ok(CreatedIssue {
                id,
                url: created.html_url.unwrap_or(created.url),
            })
        })
        .instrument(span)
        .await
    }

    async fn get(
        &self,
        token: &AccessToken,
        repository: &str,
        id: u64,
    ) -> Result<RemoteIssue, TrackerError> {
        let span = debug_span!("tracker.get", tracker.repository = repository, issue.id = id);
        let request = self.make_request(Method::GET, &issue_url(repository, id), token);

        self.call("get", request, StatusCode::OK, |body| {
            decode_json::<IssueResponse>("get", body)?.into_remote()
        })
        .instrument(span)
        .await
    }

    async fn update(
        &self,
        token: &AccessToken,
        repository: &str,
        id: u64,
        content: &IssueContent,
        state: IssueState,
    ) -> Result<(), TrackerError> {
        let span = debug_span!(
            "tracker.update",
            tracker.repository = repository,
            issue.id = id,
            issue.state = state.as_str()
        );
        let request = self
            .make_request(Method::PATCH, &issue_url(repository, id), token)
            .json(&IssueRequest::new(content, state));

        self.call("update", request, StatusCode::OK, |_| Ok(()))
            .instrument(span)
            .await
    }

    async fn search_open(
        &self,
        token: &AccessToken,
        repository: &str,
    ) -> Result<Vec<RemoteIssue>, TrackerError> {
        let span = debug_span!("tracker.search", tracker.repository = repository);
        let (api_root, slug) = split_repository(repository)
            .ok_or_else(|| TrackerError::InvalidRepository(repository.to_string()))?;
        let request = self
            .make_request(Method::GET, &format!("{api_root}/search/issues"), token)
            .query(&[("q", format!("repo:{slug} type:issue state:open"))]);

        self.call("search", request, StatusCode::OK, |body| {
            let found: SearchResponse = decode_json("search", body)?;
            let mut issues = Vec::with_capacity(found.items.len());
            for item in found.items {
                match item.into_remote() {
                    Ok(issue) => issues.push(issue),
                    // Search also matches items we cannot address; skip them
                    Err(e) => warn!(error = %e, "Skipping search result without an issue number"),
                }
            }
            Ok(issues)
        })
        .instrument(span)
        .await
    }
}
