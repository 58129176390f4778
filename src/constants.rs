//! # Constants
//!
//! Shared constants used throughout the controller.
//!
//! Defaults can be overridden via environment variables where applicable
//! (see [`crate::config::ControllerConfig::from_env`]).

/// Field manager / user agent name used for API writes and tracker requests
pub const CONTROLLER_NAME: &str = "github-issue-controller";

/// Finalizer registered on every GithubIssue before any remote mutation.
/// Removed only after the remote issue has been closed.
pub const ISSUE_FINALIZER: &str = "github-issue.kubebuilder.io/finalizer";

/// Annotation holding the decimal identifier of the tracked remote issue
pub const ISSUE_NUMBER_ANNOTATION: &str = "github-issue.kubebuilder.io/issue-number";

/// Media type requested from the tracker on every call
pub const TRACKER_ACCEPT: &str = "application/vnd.github.v3+json";

/// Header carrying the date-versioned tracker API version
pub const TRACKER_API_VERSION_HEADER: &str = "X-GitHub-Api-Version";

/// Tracker REST API version sent on every call
pub const TRACKER_API_VERSION: &str = "2022-11-28";

/// Default HTTP server port for metrics and health probes
pub const DEFAULT_METRICS_PORT: u16 = 5000;

/// Default HTTP server startup timeout (how long to wait for server to be ready)
pub const DEFAULT_SERVER_STARTUP_TIMEOUT_SECS: u64 = 10;

/// Default HTTP server readiness poll interval
pub const DEFAULT_SERVER_POLL_INTERVAL_MS: u64 = 50;

/// Default timeout applied to every tracker HTTP call (seconds)
pub const DEFAULT_TRACKER_TIMEOUT_SECS: u64 = 10;

/// Default deadline for a single reconcile invocation (seconds)
/// Must stay above the tracker timeout so a slow call surfaces as a tracker timeout first
pub const DEFAULT_RECONCILE_DEADLINE_SECS: u64 = 30;

/// Default periodic resync interval for healthy resources (seconds)
pub const DEFAULT_RESYNC_INTERVAL_SECS: u64 = 300;

/// Default maximum number of concurrent reconciliations
pub const DEFAULT_MAX_CONCURRENT_RECONCILIATIONS: usize = 10;

/// Fibonacci backoff bounds for failed reconciliations (minutes)
pub const DEFAULT_BACKOFF_MIN_MINUTES: u64 = 1;
pub const DEFAULT_BACKOFF_MAX_MINUTES: u64 = 10;

/// Default delay before restarting the watch stream after it ends or fails (seconds)
pub const DEFAULT_WATCH_RESTART_DELAY_SECS: u64 = 5;

/// Environment variable read by default for the tracker token
pub const DEFAULT_TOKEN_ENV_VAR: &str = "GITHUB_TOKEN";

/// Key looked up inside the token Secret when none is configured
pub const DEFAULT_TOKEN_SECRET_KEY: &str = "token";

/// Namespace assumed when `POD_NAMESPACE` is not set
pub const DEFAULT_CONTROLLER_NAMESPACE: &str = "github-issue-system";
