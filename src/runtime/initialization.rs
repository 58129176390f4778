//! # Initialization
//!
//! Process bootstrap: rustls, configuration, tracing, metrics, the probe
//! server, the Kubernetes client, and the reconciler's collaborators.

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use kube::api::{Api, ListParams};
use kube::{Client, ResourceExt};
use tracing::{debug, error, info, warn};

use crate::config::{ControllerConfig, ServerConfig, TokenSource};
use crate::controller::reconciler::{KubeIssueStore, Reconciler};
use crate::controller::server::{start_server, ServerState};
use crate::credentials::{self, CredentialProvider};
use crate::crd::GithubIssue;
use crate::observability;
use crate::tracker::GithubClient;

/// Everything the watch loop needs
pub struct InitializationResult {
    pub client: Client,
    /// GithubIssue resources in all namespaces
    pub issues: Api<GithubIssue>,
    pub reconciler: Arc<Reconciler>,
    pub server_state: Arc<ServerState>,
    pub config: Arc<ControllerConfig>,
}

impl std::fmt::Debug for InitializationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InitializationResult")
            .field("server_ready", &self.server_state.is_ready())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Initialize the controller runtime
#[allow(
    clippy::missing_errors_doc,
    reason = "Error documentation is provided in doc comments"
)]
pub async fn initialize() -> Result<InitializationResult> {
    // Required for rustls 0.23+ when no default provider is selected via features
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        debug!("rustls crypto provider already installed");
    }

    // Local development: a .env file may provide the token and overrides
    let dotenv = dotenvy::dotenv();

    let config = Arc::new(ControllerConfig::from_env());
    let server_config = ServerConfig::from_env();

    observability::logging::init_tracing(config.log_format)?;

    match dotenv {
        Ok(path) => info!("Loaded environment from {}", path.display()),
        Err(e) if e.not_found() => {}
        Err(e) => warn!("Failed to load .env file: {}", e),
    }

    info!("Starting GitHub Issue Controller");
    info!(
        "Build info: timestamp={}, datetime={}, git_hash={}",
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_DATETIME"),
        env!("BUILD_GIT_HASH")
    );

    observability::metrics::register_metrics()?;

    let server_state = Arc::new(ServerState::default());
    let server_state_clone = Arc::clone(&server_state);
    let server_port = server_config.metrics_port;
    let server_handle = tokio::spawn(async move {
        if let Err(e) = start_server(server_port, server_state_clone).await {
            error!("HTTP server error: {}", e);
        }
    });
    wait_for_server_ready(&server_state, &server_handle, &server_config).await?;

    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;
    let issues: Api<GithubIssue> = Api::all(client.clone());

    summarize_existing_resources(&issues).await?;

    let tracker = GithubClient::new(config.tracker_timeout())?;
    let credentials = credentials::provider_for(&config.token_source, client.clone());
    report_token_source(&config.token_source, credentials.as_ref()).await;

    let reconciler = Arc::new(Reconciler::new(
        Arc::new(KubeIssueStore::new(client.clone())),
        Arc::new(tracker),
        credentials,
        Arc::clone(&config),
    ));

    info!("Controller initialized, starting watch loop...");

    Ok(InitializationResult {
        client,
        issues,
        reconciler,
        server_state,
        config,
    })
}

/// Wait for the HTTP server to become ready
async fn wait_for_server_ready(
    server_state: &ServerState,
    server_handle: &tokio::task::JoinHandle<()>,
    server_config: &ServerConfig,
) -> Result<()> {
    let startup_timeout = server_config.startup_timeout();
    let start_time = std::time::Instant::now();

    loop {
        if server_handle.is_finished() {
            return Err(anyhow!("HTTP server failed to start"));
        }
        if server_state.is_ready() {
            info!("HTTP server is ready and accepting connections");
            return Ok(());
        }
        if start_time.elapsed() > startup_timeout {
            return Err(anyhow!(
                "HTTP server failed to become ready within {} seconds",
                startup_timeout.as_secs()
            ));
        }
        tokio::time::sleep(server_config.poll_interval()).await;
    }
}

/// Fail fast when the CRD is missing and log what is already declared
async fn summarize_existing_resources(issues: &Api<GithubIssue>) -> Result<()> {
    let list = issues.list(&ListParams::default()).await.context(
        "GithubIssue resources cannot be listed; install the CRD with `crdgen | kubectl apply -f -`",
    )?;

    let mut by_namespace: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for item in &list.items {
        by_namespace
            .entry(item.namespace().unwrap_or_else(|| "default".to_string()))
            .or_default()
            .push(item.name_any());
    }

    info!(
        "Found {} existing GithubIssue resources in {} namespaces",
        list.items.len(),
        by_namespace.len()
    );
    for (namespace, mut names) in by_namespace {
        names.sort();
        let shown = if names.len() <= 3 {
            names.join(", ")
        } else {
            format!("{}, ... ({} total)", names[..3].join(", "), names.len())
        };
        info!("  {}: {}", namespace, shown);
    }
    Ok(())
}

/// Tell the operator up front whether a token is available
async fn report_token_source(source: &TokenSource, provider: &dyn CredentialProvider) {
    let location = match source {
        TokenSource::Env { var } => format!("environment variable {var}"),
        TokenSource::Secret {
            namespace,
            name,
            key,
        } => format!("secret {namespace}/{name} key {key}"),
    };
    match provider.token().await {
        Ok(Some(_)) => info!("Tracker token found in {}", location),
        Ok(None) => warn!(
            "No tracker token in {}; GithubIssue resources will be skipped until one is provided",
            location
        ),
        Err(e) => warn!("Failed to read tracker token from {}: {}", location, e),
    }
}
