//! Common test utilities for Pact integration tests
//!
//! Provides shared initialization code for all Pact tests, including
//! rustls crypto provider setup and the mock repository URL.

use std::sync::Once;

static RUSTLS_INIT: Once = Once::new();

/// Initialize rustls crypto provider for tests
///
/// Uses a `Once` so it runs a single time across all tests in the binary.
pub fn init_rustls() {
    RUSTLS_INIT.call_once(|| {
        // Required for rustls 0.23+ when no default provider is set via features
        rustls::crypto::ring::default_provider()
            .install_default()
            .expect("Failed to install rustls crypto provider");
    });
}

/// Repository URL served by a mock server at `base_url`
pub fn repository_url(base_url: &str) -> String {
    let mut base_url = base_url.to_string();
    if base_url.ends_with('/') {
        base_url.pop();
    }
    format!("{base_url}/repos/acme/widgets")
}
