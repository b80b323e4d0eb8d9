//! API-key retrieval.
//!
//! [`KeyStore`] is the async trait for resolving a reference into its plaintext value.
//! [`SsmKeyStore`] implements it using AWS SSM Parameter Store; [`StaticKeyStore`]
//! hands back a key supplied directly (local runs and tests).

mod ssm;

pub use ssm::SsmKeyStore;

use anyhow::Result;

/// Resolves a vault reference (e.g. an SSM parameter ARN) into a plaintext secret.
#[async_trait::async_trait]
pub trait KeyStore: Send + Sync {
    async fn get(&self, reference: &str) -> Result<String>;
}

#[async_trait::async_trait]
impl<T: KeyStore + ?Sized> KeyStore for Box<T> {
    async fn get(&self, reference: &str) -> Result<String> {
        (**self).get(reference).await
    }
}

/// A key known up front. Ignores the reference.
pub struct StaticKeyStore(String);

impl StaticKeyStore {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }
}

#[async_trait::async_trait]
impl KeyStore for StaticKeyStore {
    async fn get(&self, _reference: &str) -> Result<String> {
        Ok(self.0.clone())
    }
}
