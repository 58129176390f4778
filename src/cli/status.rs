//! # Status Command
//!
//! Shows the desired issue, tracking details and conditions of one `GithubIssue`.

use anyhow::{Context, Result};
use github_issue_controller::constants::{ISSUE_FINALIZER, ISSUE_NUMBER_ANNOTATION};
use github_issue_controller::crd::GithubIssue;
use kube::{api::Api, Client};

/// Show detailed status of a GithubIssue resource
pub async fn status_command(client: Client, name: String, namespace: Option<String>) -> Result<()> {
    let ns = namespace.as_deref().unwrap_or("default");

    println!("Status for GithubIssue '{ns}/{name}'");
    println!();

    let api: Api<GithubIssue> = Api::namespaced(client, ns);

    let issue = api
        .get(&name)
        .await
        .with_context(|| format!("Failed to get GithubIssue '{ns}/{name}'"))?;

    println!("Resource Information:");
    println!(
        "  Name: {}",
        issue.metadata.name.as_deref().unwrap_or("<unknown>")
    );
    println!(
        "  Namespace: {}",
        issue.metadata.namespace.as_deref().unwrap_or("<unknown>")
    );
    if let Some(generation) = issue.metadata.generation {
        println!("  Generation: {generation}");
    }
    if let Some(deleted) = &issue.metadata.deletion_timestamp {
        println!("  Deletion Requested: {}", deleted.0);
    }

    println!();
    println!("Spec:");
    println!("  Repository: {}", issue.spec.repo);
    println!("  Title: {}", issue.spec.title);
    if issue.spec.description.is_empty() {
        println!("  Description: <empty>");
    } else {
        println!("  Description:");
        for line in issue.spec.description.lines() {
            println!("    {line}");
        }
    }

    println!();
    println!("Tracking:");
    let tracked = issue
        .metadata
        .annotations
        .as_ref()
        .and_then(|a| a.get(ISSUE_NUMBER_ANNOTATION));
    match tracked {
        Some(number) => println!("  Issue Number: {number}"),
        None => println!("  Issue Number: <not tracked yet>"),
    }
    let finalized = issue
        .metadata
        .finalizers
        .as_ref()
        .is_some_and(|f| f.iter().any(|x| x == ISSUE_FINALIZER));
    println!("  Finalizer Present: {finalized}");

    if let Some(status) = &issue.status {
        println!();
        println!("Status:");
        if let Some(url) = &status.issue_url {
            println!("  Issue URL: {url}");
        }
        if let Some(observed_generation) = status.observed_generation {
            println!("  Observed Generation: {observed_generation}");
        }
        if let Some(last_update_time) = &status.last_update_time {
            println!("  Last Update Time: {last_update_time}");
        }

        if !status.conditions.is_empty() {
            println!();
            println!("Conditions:");
            for condition in &status.conditions {
                println!("  {}: {}", condition.r#type, condition.status);
                if let Some(reason) = &condition.reason {
                    println!("    Reason: {reason}");
                }
                if let Some(message) = &condition.message {
                    println!("    Message: {message}");
                }
                if let Some(last_transition_time) = &condition.last_transition_time {
                    println!("    Last Transition: {last_transition_time}");
                }
            }
        }
    } else {
        println!();
        println!("Status: No status available (resource may not have been reconciled yet)");
    }

    Ok(())
}
