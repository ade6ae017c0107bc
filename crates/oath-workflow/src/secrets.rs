//! # Secrets
//!
//! Secrets come from the host through [`SecretStore`]. The workflow fetches
//! each secret once per execution, holds it as [`Zeroizing`] so the buffer
//! is wiped on drop, and never logs it or keeps it past the execution.

use std::collections::HashMap;
use std::future::Future;

use zeroize::Zeroizing;

use crate::error::SecretError;

/// Secret id of the telemetry API bearer token.
pub const UPTIME_API_KEY: &str = "UPTIME_API_KEY";

/// Host capability that supplies secrets by id.
pub trait SecretStore: Send + Sync {
    /// Fetch the secret with the given id. An empty value is
    /// [`SecretError::Missing`].
    fn get_secret(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<Zeroizing<String>, SecretError>> + Send;
}

/// Reads secrets from environment variables on every call.
///
/// By default the variable name equals the secret id; [`EnvSecretStore::map`]
/// overrides that per id.
#[derive(Debug, Clone, Default)]
pub struct EnvSecretStore {
    vars: HashMap<String, String>,
}

impl EnvSecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read secret `id` from env var `var`.
    pub fn map(mut self, id: impl Into<String>, var: impl Into<String>) -> Self {
        self.vars.insert(id.into(), var.into());
        self
    }

    fn var_for<'a>(&'a self, id: &'a str) -> &'a str {
        self.vars.get(id).map(String::as_str).unwrap_or(id)
    }
}

impl SecretStore for EnvSecretStore {
    async fn get_secret(&self, id: &str) -> Result<Zeroizing<String>, SecretError> {
        match std::env::var(self.var_for(id)) {
            Ok(value) if !value.is_empty() => Ok(Zeroizing::new(value)),
            Ok(_) | Err(std::env::VarError::NotPresent) => Err(SecretError::Missing(id.to_string())),
            Err(e) => Err(SecretError::Store {
                id: id.to_string(),
                reason: e.to_string(),
            }),
        }
    }
}

/// Fixed in-memory secrets, for tests and simulation.
#[derive(Default)]
pub struct StaticSecretStore {
    secrets: HashMap<String, Zeroizing<String>>,
}

impl StaticSecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, id: impl Into<String>, value: impl Into<String>) -> Self {
        self.secrets.insert(id.into(), Zeroizing::new(value.into()));
        self
    }
}

impl std::fmt::Debug for StaticSecretStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticSecretStore")
            .field("ids", &self.secrets.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl SecretStore for StaticSecretStore {
    async fn get_secret(&self, id: &str) -> Result<Zeroizing<String>, SecretError> {
        self.secrets
            .get(id)
            .filter(|v| !v.is_empty())
            .cloned()
            .ok_or_else(|| SecretError::Missing(id.to_string()))
    }
}
