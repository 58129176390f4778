//! # Error Policy
//!
//! Requeue decisions for failed reconciliations and classification of watch
//! stream errors.

use std::sync::Arc;

use kube::ResourceExt;
use kube_runtime::controller::Action;
use tracing::{error, info, warn};

use crate::controller::reconciler::{resource_key, Reconciler, ReconcilerError};
use crate::crd::GithubIssue;
use crate::observability;

/// Requeue a failed resource with its own Fibonacci backoff
///
/// Backoff state is kept per resource so one failing GithubIssue never slows
/// down the others. A successful pass resets it.
pub fn handle_reconciliation_error(
    obj: Arc<GithubIssue>,
    error: &ReconcilerError,
    ctx: Arc<Reconciler>,
) -> Action {
    let name = obj.name_any();
    let namespace = obj.namespace().unwrap_or_else(|| "default".to_string());

    let error_span = tracing::span!(
        tracing::Level::ERROR,
        "controller.watch.reconciliation_error",
        resource.name = name.as_str(),
        resource.namespace = namespace.as_str(),
        error.kind = error.kind()
    );
    let _error_guard = error_span.enter();

    error!("Reconciliation error for {}/{}: {}", namespace, name, error);
    observability::metrics::increment_reconciliation_errors();

    let (delay, error_count) = ctx.next_error_backoff(&resource_key(&namespace, &name));
    let next_attempt = chrono::Utc::now()
        + chrono::Duration::from_std(delay).unwrap_or_else(|_| chrono::Duration::zero());
    info!(
        error_count,
        "Retrying in {}s (next attempt {})",
        delay.as_secs(),
        next_attempt.to_rfc3339()
    );

    observability::metrics::increment_requeues(error.kind());
    Action::requeue(delay)
}

/// Broad classes of watch stream failures, each with its own operator advice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchErrorKind {
    /// The GithubIssue CRD is not installed
    NotFound,
    /// Service account token rejected
    Unauthorized,
    /// RBAC does not allow list/watch
    Forbidden,
    /// Resource version too old; the watcher relists on its own
    Expired,
    /// API server throttling or still starting
    Throttled,
    Other,
}

/// Classify a watch error from its rendered message
pub fn classify_watch_error(message: &str) -> WatchErrorKind {
    // 404 before 401: a plain-text 404 body surfaces through a decode error
    if message.contains("404") || message.contains("NotFound") || message.contains("not found") {
        WatchErrorKind::NotFound
    } else if message.contains("401") || message.contains("Unauthorized") {
        WatchErrorKind::Unauthorized
    } else if message.contains("403") || message.contains("Forbidden") {
        WatchErrorKind::Forbidden
    } else if message.contains("410")
        || message.contains("too old resource version")
        || message.contains("Expired")
    {
        WatchErrorKind::Expired
    } else if message.contains("429") || message.contains("TooManyRequests") {
        WatchErrorKind::Throttled
    } else {
        WatchErrorKind::Other
    }
}

/// Log a watch stream error with advice matching its class
pub fn log_watch_error(message: &str) {
    match classify_watch_error(message) {
        WatchErrorKind::NotFound => {
            error!(error = message, "GithubIssue resources cannot be watched; is the CRD installed?");
            error!("   Install it with: crdgen | kubectl apply -f -");
        }
        WatchErrorKind::Unauthorized => {
            error!(error = message, "Watch rejected (401); the service account token may be invalid");
        }
        WatchErrorKind::Forbidden => {
            error!(
                error = message,
                "Watch forbidden (403); check the ClusterRole grants list/watch on githubissues.training.redhat.com"
            );
        }
        WatchErrorKind::Expired => {
            info!(error = message, "Watch resource version expired, relisting");
        }
        WatchErrorKind::Throttled => {
            warn!(error = message, "API server is throttling watch requests");
        }
        WatchErrorKind::Other => {
            warn!(error = message, "Watch stream error");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::reconciler::fakes::{
        github_issue, reconciler, FakeCredentials, FakeStore, FakeTracker,
    };
    use std::time::Duration;

    #[test]
    fn test_backoff_grows_per_resource() {
        let store = FakeStore::with(github_issue("t", "b"));
        let ctx = Arc::new(reconciler(
            &store,
            &FakeTracker::new(),
            &FakeCredentials::without_token(),
        ));
        let obj = Arc::new(store.object().unwrap());
        let mut other = github_issue("t", "b");
        other.metadata.name = Some("other".to_string());
        let other = Arc::new(other);

        let actions: Vec<Action> = (0..4)
            .map(|_| {
                handle_reconciliation_error(
                    Arc::clone(&obj),
                    &ReconcilerError::StoreConflict,
                    Arc::clone(&ctx),
                )
            })
            .collect();
        let expected: Vec<Action> = [60, 60, 120, 180]
            .into_iter()
            .map(|secs| Action::requeue(Duration::from_secs(secs)))
            .collect();
        assert_eq!(actions, expected);

        // an unrelated resource starts from the bottom
        assert_eq!(
            handle_reconciliation_error(other, &ReconcilerError::StoreConflict, ctx),
            Action::requeue(Duration::from_secs(60))
        );
    }

    #[test]
    fn test_classify_watch_errors() {
        assert_eq!(
            classify_watch_error("ApiError: 404 page not found"),
            WatchErrorKind::NotFound
        );
        assert_eq!(
            classify_watch_error("ApiError: Unauthorized (401)"),
            WatchErrorKind::Unauthorized
        );
        assert_eq!(
            classify_watch_error("ApiError: githubissues is forbidden: 403"),
            WatchErrorKind::Forbidden
        );
        assert_eq!(
            classify_watch_error("too old resource version: 123 (456)"),
            WatchErrorKind::Expired
        );
        assert_eq!(
            classify_watch_error("429 TooManyRequests"),
            WatchErrorKind::Throttled
        );
        assert_eq!(classify_watch_error("connection reset"), WatchErrorKind::Other);
    }
}
