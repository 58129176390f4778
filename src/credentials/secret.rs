//! Token from a key of a Kubernetes Secret.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use kube::Api;
use tracing::debug;

use super::{AccessToken, CredentialError, CredentialProvider};

/// Reads the token from a Secret on every call.
/// A missing Secret or key means "no token".
#[derive(Clone)]
pub struct SecretCredentialProvider {
    api: Api<Secret>,
    namespace: String,
    name: String,
    key: String,
}

impl std::fmt::Debug for SecretCredentialProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretCredentialProvider")
            .field("namespace", &self.namespace)
            .field("name", &self.name)
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

impl SecretCredentialProvider {
    pub fn new(client: kube::Client, namespace: String, name: String, key: String) -> Self {
        Self {
            api: Api::namespaced(client, &namespace),
            namespace,
            name,
            key,
        }
    }
}

#[async_trait]
impl CredentialProvider for SecretCredentialProvider {
    async fn token(&self) -> Result<Option<AccessToken>, CredentialError> {
        let secret = match self.api.get(&self.name).await {
            Ok(secret) => secret,
            Err(kube::Error::Api(api_err)) if api_err.code == 404 => {
                debug!(
                    secret.namespace = %self.namespace,
                    secret.name = %self.name,
                    "Token secret not found"
                );
                return Ok(None);
            }
            Err(source) => {
                return Err(CredentialError::SecretRead {
                    namespace: self.namespace.clone(),
                    name: self.name.clone(),
                    source,
                });
            }
        };

        let Some(bytes) = secret.data.as_ref().and_then(|data| data.get(&self.key)) else {
            debug!(
                secret.namespace = %self.namespace,
                secret.name = %self.name,
                secret.key = %self.key,
                "Token secret has no such key"
            );
            return Ok(None);
        };

        decode_token(&self.namespace, &self.name, &self.key, &bytes.0)
    }
}

/// Secret values are raw bytes; the token must be UTF-8
fn decode_token(
    namespace: &str,
    name: &str,
    key: &str,
    bytes: &[u8],
) -> Result<Option<AccessToken>, CredentialError> {
    let raw = std::str::from_utf8(bytes).map_err(|source| CredentialError::InvalidEncoding {
        namespace: namespace.to_string(),
        name: name.to_string(),
        key: key.to_string(),
        source,
    })?;
    Ok(AccessToken::from_raw(raw))
}
