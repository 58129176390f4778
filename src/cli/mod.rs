//! # GHICTL CLI
//!
//! Command-line interface for inspecting `GithubIssue` resources.
//!
//! ## Usage
//!
//! ```bash
//! # List GithubIssue resources in all namespaces
//! ghictl list
//!
//! # List GithubIssue resources in one namespace
//! ghictl list --namespace team-a
//!
//! # Show status and tracking details of a GithubIssue
//! ghictl status flaky-ci --namespace team-a
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kube::Client;

mod list;
mod status;

/// GitHub Issue Controller CLI
#[derive(Parser)]
#[command(name = "ghictl")]
#[command(
    about = "GitHub Issue Controller CLI",
    long_about = None,
    after_help = "\
Examples:
  ghictl list
  ghictl list --namespace team-a
  ghictl status flaky-ci --namespace team-a
"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Kubernetes namespace (list: all namespaces when omitted, status: default)
    #[arg(short, long, global = true)]
    namespace: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List GithubIssue resources with their tracked issue
    List,
    /// Show status of a GithubIssue resource
    Status {
        /// Name of the GithubIssue resource
        #[arg(value_name = "NAME")]
        name: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Required for rustls 0.23+ when no default provider is set via features
    rustls::crypto::ring::default_provider()
        .install_default()
        .unwrap_or_else(|_| panic!("Failed to install rustls crypto provider"));

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ghictl=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client. Ensure kubeconfig is configured.")?;

    match cli.command {
        Commands::List => list::list_command(client, cli.namespace).await,
        Commands::Status { name } => status::status_command(client, name, cli.namespace).await,
    }
}
