//! Token from a process environment variable.

use async_trait::async_trait;

use super::{AccessToken, CredentialError, CredentialProvider};

/// Reads the token from an environment variable on every call, so a rotated
/// value is picked up without a restart when the variable is re-injected.
#[derive(Debug, Clone)]
pub struct EnvCredentialProvider {
    var: String,
}

impl EnvCredentialProvider {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

#[async_trait]
impl CredentialProvider for EnvCredentialProvider {
    async fn token(&self) -> Result<Option<AccessToken>, CredentialError> {
        Ok(std::env::var(&self.var)
            .ok()
            .and_then(|raw| AccessToken::from_raw(&raw)))
    }
}
