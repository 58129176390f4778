//! # Custom Resource Definitions
//!
//! CRD types for the GithubIssue controller.
//!
//! - `spec.rs` - the `GithubIssue` resource and its desired state
//! - `status.rs` - observed state and conditions

mod spec;
mod status;

pub use spec::{GithubIssue, GithubIssueSpec};
pub use status::{Condition, GithubIssueStatus, READY_CONDITION};

#[cfg(test)]
mod tests {
    use super::*;
    use kube::core::CustomResourceExt;

    #[test]
    fn test_crd_identity() {
        let crd = GithubIssue::crd();
        assert_eq!(crd.spec.group, "training.redhat.com");
        assert_eq!(crd.spec.names.kind, "GithubIssue");
        assert_eq!(crd.spec.scope, "Namespaced");
        assert_eq!(
            crd.spec.names.short_names.as_deref(),
            Some(&["ghi".to_string()][..])
        );
        let version = &crd.spec.versions[0];
        assert_eq!(version.name, "v1alpha1");
        assert!(version
            .subresources
            .as_ref()
            .and_then(|s| s.status.as_ref())
            .is_some());
    }

    #[test]
    fn test_spec_accepts_legacy_issue_number_key() {
        let spec: GithubIssueSpec = serde_json::from_value(serde_json::json!({
            "repo": "https://api.github.com/repos/acme/widgets",
            "title": "t",
            "description": "d",
            "issumeNumber": 7
        }))
        .unwrap();
        assert_eq!(spec.issue_number, Some(7));
    }

    #[test]
    fn test_spec_description_defaults_to_empty() {
        let spec: GithubIssueSpec = serde_json::from_value(serde_json::json!({
            "repo": "https://api.github.com/repos/acme/widgets",
            "title": "t"
        }))
        .unwrap();
        assert_eq!(spec.description, "");
        assert_eq!(spec.issue_number, None);
    }
}
