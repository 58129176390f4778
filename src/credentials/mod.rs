//! # Credentials
//!
//! Token acquisition for the issue tracker.
//!
//! The reconciler never reads the environment or cluster for credentials on
//! its own; it asks a [`CredentialProvider`] on every invocation. "No token"
//! is a normal answer, not an error.

mod env;
mod secret;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use zeroize::Zeroizing;

pub use env::EnvCredentialProvider;
pub use secret::SecretCredentialProvider;

use crate::config::TokenSource;

/// Opaque tracker token. Zeroed on drop and never printed.
#[derive(Clone)]
pub struct AccessToken(Zeroizing<String>);

impl AccessToken {
    /// Build a token from raw input, trimming surrounding whitespace.
    /// Returns `None` when nothing is left.
    pub fn from_raw(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(Zeroizing::new(trimmed.to_string())))
        }
    }

    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("failed to read token secret {namespace}/{name}: {source}")]
    SecretRead {
        namespace: String,
        name: String,
        #[source]
        source: kube::Error,
    },
    #[error("token secret {namespace}/{name} key {key} is not valid UTF-8")]
    InvalidEncoding {
        namespace: String,
        name: String,
        key: String,
        #[source]
        source: std::str::Utf8Error,
    },
}

/// Source of the tracker token
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Current token, or `None` when no usable token is configured
    async fn token(&self) -> Result<Option<AccessToken>, CredentialError>;
}

/// Build the provider selected by configuration
pub fn provider_for(source: &TokenSource, client: kube::Client) -> Arc<dyn CredentialProvider> {
    match source {
        TokenSource::Env { var } => Arc::new(EnvCredentialProvider::new(var.clone())),
        TokenSource::Secret {
            namespace,
            name,
            key,
        } => Arc::new(SecretCredentialProvider::new(
            client,
            namespace.clone(),
            name.clone(),
            key.clone(),
        )),
    }
}
