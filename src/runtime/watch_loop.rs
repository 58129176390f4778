//! # Watch Loop
//!
//! Runs the kube-runtime controller over all `GithubIssue` resources and
//! restarts it if the stream ends before shutdown was requested.

use std::sync::Arc;

use futures::StreamExt;
use kube::api::Api;
use kube::ResourceExt;
use kube_runtime::controller::{self, Action};
use kube_runtime::{watcher, Controller};
use tracing::{debug, info, info_span, warn, Instrument};

use crate::config::ControllerConfig;
use crate::controller::reconciler::{reconcile, Reconciler, ReconcilerError};
use crate::controller::server::ServerState;
use crate::crd::GithubIssue;
use crate::runtime::error_policy::{handle_reconciliation_error, log_watch_error};

/// Run the controller until SIGINT/SIGTERM
///
/// Readiness is dropped as soon as a shutdown signal arrives; in-flight
/// reconciliations are allowed to finish.
pub async fn run_watch_loop(
    issues: Api<GithubIssue>,
    reconciler: Arc<Reconciler>,
    server_state: Arc<ServerState>,
    config: &ControllerConfig,
) -> Result<(), anyhow::Error> {
    spawn_shutdown_listener(Arc::clone(&server_state));

    let concurrency = u16::try_from(config.max_concurrent_reconciliations).unwrap_or(u16::MAX);

    loop {
        if !server_state.is_ready() {
            info!("Shutdown requested, exiting watch loop");
            break;
        }

        info!(concurrency, "Starting controller watch loop...");
        Controller::new(issues.clone(), watcher::Config::default().any_semantic())
            .with_config(controller::Config::default().concurrency(concurrency))
            .shutdown_on_signal()
            .run(create_reconcile_fn, handle_reconciliation_error, Arc::clone(&reconciler))
            .for_each(|result| async move {
                match result {
                    Ok((obj_ref, action)) => {
                        debug!(resource = %obj_ref, ?action, "watch.event.success");
                    }
                    // Already logged and counted by the error policy
                    Err(controller::Error::ReconcilerFailed(_, obj_ref)) => {
                        debug!(resource = %obj_ref, "watch.event.reconcile_failed");
                    }
                    Err(controller::Error::ObjectNotFound(obj_ref)) => {
                        debug!(resource = %obj_ref, "watch.event.object_gone");
                    }
                    Err(controller::Error::QueueError(e)) => log_watch_error(&e.to_string()),
                    Err(other) => warn!(error = %other, "Controller error"),
                }
            })
            .await;

        if !server_state.is_ready() {
            info!("Shutdown requested, exiting watch loop");
            break;
        }

        let delay = config.watch_restart_delay();
        warn!(
            "Controller watch stream ended, restarting in {} seconds...",
            delay.as_secs()
        );
        tokio::time::sleep(delay).await;
    }

    info!("Controller stopped gracefully");
    Ok(())
}

/// Wrap each reconciliation in a span carrying the resource identity
fn create_reconcile_fn(
    obj: Arc<GithubIssue>,
    ctx: Arc<Reconciler>,
) -> impl std::future::Future<Output = Result<Action, ReconcilerError>> + Send {
    let span = info_span!(
        "controller.watch.reconcile",
        resource.name = %obj.name_any(),
        resource.namespace = %obj.namespace().unwrap_or_default(),
        resource.generation = obj.metadata.generation.unwrap_or_default(),
        resource.version = %obj.resource_version().unwrap_or_default()
    );
    reconcile(obj, ctx).instrument(span)
}

/// Mark the server not ready on SIGINT or SIGTERM
fn spawn_shutdown_listener(server_state: Arc<ServerState>) {
    tokio::spawn(async move {
        wait_for_signal().await;
        info!("Received shutdown signal (SIGINT/SIGTERM), initiating graceful shutdown...");
        server_state.set_ready(false);
        info!("Marked server as not ready, waiting for in-flight reconciliations to complete...");
    });
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = sigterm.recv() => {}
            }
        }
        Err(e) => {
            warn!("Failed to install SIGTERM handler: {}", e);
            let _ = tokio::signal::ctrl_c().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
