//! # Controller Configuration
//!
//! Controller-level settings loaded from environment variables.

use std::time::Duration;

use crate::constants::{
    DEFAULT_BACKOFF_MAX_MINUTES, DEFAULT_BACKOFF_MIN_MINUTES, DEFAULT_CONTROLLER_NAMESPACE,
    DEFAULT_MAX_CONCURRENT_RECONCILIATIONS, DEFAULT_RECONCILE_DEADLINE_SECS,
    DEFAULT_RESYNC_INTERVAL_SECS, DEFAULT_TOKEN_ENV_VAR, DEFAULT_TOKEN_SECRET_KEY,
    DEFAULT_TRACKER_TIMEOUT_SECS, DEFAULT_WATCH_RESTART_DELAY_SECS,
};

/// Where the tracker token comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenSource {
    /// Process environment variable (name of the variable)
    Env { var: String },
    /// Kubernetes Secret in the given namespace
    Secret {
        namespace: String,
        name: String,
        key: String,
    },
}

/// Log output format for the tracing subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Text,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("text") {
            Self::Text
        } else {
            Self::Json
        }
    }
}

/// Controller-level configuration
///
/// All settings have sensible defaults and can be overridden via environment variables.
/// Environment variables are populated from a ConfigMap using `envFrom` in the deployment.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Timeout applied to every tracker HTTP call (seconds)
    pub tracker_timeout_secs: u64,
    /// Deadline for one reconcile invocation (seconds)
    /// Clamped to stay above the tracker timeout
    pub reconcile_deadline_secs: u64,
    /// Requeue interval after a successful or skipped reconciliation (seconds)
    pub resync_interval_secs: u64,
    /// Maximum concurrent reconciliations across different resources
    pub max_concurrent_reconciliations: usize,
    /// Fibonacci backoff floor for failed reconciliations (minutes)
    pub backoff_min_minutes: u64,
    /// Fibonacci backoff cap for failed reconciliations (minutes)
    pub backoff_max_minutes: u64,
    /// Delay before restarting the watch stream (seconds)
    pub watch_restart_delay_secs: u64,
    /// Namespace where the controller is deployed
    pub controller_namespace: String,
    /// Tracker token location
    pub token_source: TokenSource,
    /// Log format (json, text)
    pub log_format: LogFormat,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            tracker_timeout_secs: DEFAULT_TRACKER_TIMEOUT_SECS,
            reconcile_deadline_secs: DEFAULT_RECONCILE_DEADLINE_SECS,
            resync_interval_secs: DEFAULT_RESYNC_INTERVAL_SECS,
            max_concurrent_reconciliations: DEFAULT_MAX_CONCURRENT_RECONCILIATIONS,
            backoff_min_minutes: DEFAULT_BACKOFF_MIN_MINUTES,
            backoff_max_minutes: DEFAULT_BACKOFF_MAX_MINUTES,
            watch_restart_delay_secs: DEFAULT_WATCH_RESTART_DELAY_SECS,
            controller_namespace: DEFAULT_CONTROLLER_NAMESPACE.to_string(),
            token_source: TokenSource::Env {
                var: DEFAULT_TOKEN_ENV_VAR.to_string(),
            },
            log_format: LogFormat::Json,
        }
    }
}

impl ControllerConfig {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        let controller_namespace =
            env_var_or_default_str("POD_NAMESPACE", DEFAULT_CONTROLLER_NAMESPACE);

        let token_source = match std::env::var("TOKEN_SECRET_NAME") {
            Ok(name) if !name.trim().is_empty() => TokenSource::Secret {
                namespace: env_var_or_default_str("TOKEN_SECRET_NAMESPACE", &controller_namespace),
                name: name.trim().to_string(),
                key: env_var_or_default_str("TOKEN_SECRET_KEY", DEFAULT_TOKEN_SECRET_KEY),
            },
            _ => TokenSource::Env {
                var: env_var_or_default_str("TOKEN_ENV_VAR", DEFAULT_TOKEN_ENV_VAR),
            },
        };

        let tracker_timeout_secs =
            env_var_or_default("TRACKER_TIMEOUT_SECS", DEFAULT_TRACKER_TIMEOUT_SECS).max(1);
        let reconcile_deadline_secs =
            env_var_or_default("RECONCILE_DEADLINE_SECS", DEFAULT_RECONCILE_DEADLINE_SECS)
                .max(tracker_timeout_secs + 1);

        let backoff_min_minutes =
            env_var_or_default("BACKOFF_MIN_MINUTES", DEFAULT_BACKOFF_MIN_MINUTES).max(1);
        let backoff_max_minutes =
            env_var_or_default("BACKOFF_MAX_MINUTES", DEFAULT_BACKOFF_MAX_MINUTES)
                .max(backoff_min_minutes);

        Self {
            tracker_timeout_secs,
            reconcile_deadline_secs,
            resync_interval_secs: env_var_or_default(
                "RESYNC_INTERVAL_SECS",
                DEFAULT_RESYNC_INTERVAL_SECS,
            ),
            max_concurrent_reconciliations: env_var_or_default(
                "MAX_CONCURRENT_RECONCILIATIONS",
                DEFAULT_MAX_CONCURRENT_RECONCILIATIONS,
            )
            .max(1),
            backoff_min_minutes,
            backoff_max_minutes,
            watch_restart_delay_secs: env_var_or_default(
                "WATCH_RESTART_DELAY_SECS",
                DEFAULT_WATCH_RESTART_DELAY_SECS,
            ),
            controller_namespace,
            token_source,
            log_format: LogFormat::parse(&env_var_or_default_str("LOG_FORMAT", "json")),
        }
    }

    pub fn tracker_timeout(&self) -> Duration {
        Duration::from_secs(self.tracker_timeout_secs)
    }

    pub fn reconcile_deadline(&self) -> Duration {
        Duration::from_secs(self.reconcile_deadline_secs)
    }

    pub fn resync_interval(&self) -> Duration {
        Duration::from_secs(self.resync_interval_secs)
    }

    pub fn watch_restart_delay(&self) -> Duration {
        Duration::from_secs(self.watch_restart_delay_secs)
    }
}

/// Read environment variable or return default value
pub(crate) fn env_var_or_default<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Read environment variable as string or return default
pub(crate) fn env_var_or_default_str(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_env_is_empty() {
        temp_env::with_vars_unset(
            [
                "TRACKER_TIMEOUT_SECS",
                "RECONCILE_DEADLINE_SECS",
                "TOKEN_SECRET_NAME",
                "TOKEN_ENV_VAR",
                "POD_NAMESPACE",
                "LOG_FORMAT",
            ],
            || {
                let config = ControllerConfig::from_env();
                assert_eq!(config.tracker_timeout_secs, DEFAULT_TRACKER_TIMEOUT_SECS);
                assert_eq!(config.reconcile_deadline_secs, DEFAULT_RECONCILE_DEADLINE_SECS);
                assert_eq!(config.controller_namespace, DEFAULT_CONTROLLER_NAMESPACE);
                assert_eq!(
                    config.token_source,
                    TokenSource::Env {
                        var: "GITHUB_TOKEN".to_string()
                    }
                );
                assert_eq!(config.log_format, LogFormat::Json);
            },
        );
    }

    #[test]
    fn test_deadline_is_kept_above_tracker_timeout() {
        temp_env::with_vars(
            [
                ("TRACKER_TIMEOUT_SECS", Some("20")),
                ("RECONCILE_DEADLINE_SECS", Some("5")),
            ],
            || {
                let config = ControllerConfig::from_env();
                assert_eq!(config.tracker_timeout_secs, 20);
                assert_eq!(config.reconcile_deadline_secs, 21);
            },
        );
    }

    #[test]
    fn test_secret_token_source_defaults_to_controller_namespace() {
        temp_env::with_vars(
            [
                ("TOKEN_SECRET_NAME", Some("github-token")),
                ("POD_NAMESPACE", Some("ops")),
                ("TOKEN_SECRET_NAMESPACE", None),
                ("TOKEN_SECRET_KEY", None),
            ],
            || {
                let config = ControllerConfig::from_env();
                assert_eq!(
                    config.token_source,
                    TokenSource::Secret {
                        namespace: "ops".to_string(),
                        name: "github-token".to_string(),
                        key: "token".to_string(),
                    }
                );
            },
        );
    }

    #[test]
    fn test_unparseable_values_fall_back_to_defaults() {
        temp_env::with_vars(
            [
                ("MAX_CONCURRENT_RECONCILIATIONS", Some("lots")),
                ("LOG_FORMAT", Some("TEXT")),
            ],
            || {
                let config = ControllerConfig::from_env();
                assert_eq!(
                    config.max_concurrent_reconciliations,
                    DEFAULT_MAX_CONCURRENT_RECONCILIATIONS
                );
                assert_eq!(config.log_format, LogFormat::Text);
            },
        );
    }
}
