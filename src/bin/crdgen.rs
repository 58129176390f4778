//! # CRD Generator
//!
//! Prints the `GithubIssue` CustomResourceDefinition as YAML.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin crdgen | kubectl apply -f -
//! ```

use github_issue_controller::crd::GithubIssue;
use kube::CustomResourceExt;

fn main() {
    // Generate CRD YAML
    let crd = GithubIssue::crd();
    match serde_yaml::to_string(&crd) {
        Ok(yaml) => print!("{yaml}"),
        Err(e) => {
            eprintln!("Failed to serialize CRD: {e}");
            std::process::exit(1);
        }
    }
}
