//! # List Command

use anyhow::{Context, Result};
use github_issue_controller::crd::GithubIssue;
use kube::{api::Api, Client};

/// List GithubIssue resources
pub async fn list_command(client: Client, namespace: Option<String>) -> Result<()> {
    let api: Api<GithubIssue> = if let Some(ns) = &namespace {
        println!("Listing GithubIssue resources in namespace '{ns}'...");
        Api::namespaced(client, ns)
    } else {
        println!("Listing GithubIssue resources in all namespaces...");
        Api::all(client)
    };

    let issues = api
        .list(&kube::api::ListParams::default())
        .await
        .context("Failed to list GithubIssue resources")?;

    if issues.items.is_empty() {
        println!("No GithubIssue resources found.");
        return Ok(());
    }

    println!(
        "\n{:<30} {:<20} {:<8} {:<10} {:<40}",
        "NAME", "NAMESPACE", "ISSUE", "READY", "TITLE"
    );
    println!("{}", "-".repeat(108));

    for issue in issues.items {
        let name = issue.metadata.name.as_deref().unwrap_or("<unknown>");
        let ns = issue.metadata.namespace.as_deref().unwrap_or("<unknown>");

        let number = issue
            .status
            .as_ref()
            .and_then(|s| s.issue_number)
            .map_or_else(|| "-".to_string(), |n| n.to_string());

        let ready = issue
            .status
            .as_ref()
            .and_then(|s| s.ready())
            .map_or("Unknown", |c| if c.status == "True" { "True" } else { "False" });

        let title = truncate(&issue.spec.title, 40);

        println!("{name:<30} {ns:<20} {number:<8} {ready:<10} {title:<40}");
    }

    Ok(())
}

fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        value.to_string()
    } else {
        let cut: String = value.chars().take(width.saturating_sub(3)).collect();
        format!("{cut}...")
    }
}
