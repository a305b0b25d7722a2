use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One live instance of a logical service, as reported by the registry.
/// Ephemeral: re-fetched on every lookup, never cached across requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRecord {
    pub name: String,
    pub address: String,
    pub port: u16,
}

impl ServiceRecord {
    /// Base URL for issuing requests against this instance.
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.address, self.port)
    }
}

/// A service's own registration, submitted once at startup.
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub id: String,
    pub address: String,
    pub port: u16,
    /// Full URL the registry should probe for liveness.
    pub health_check_url: String,
    /// Probe interval in registry notation, e.g. "10s".
    pub interval: String,
}

/// Errors from registry operations. Callers treat every variant as "service
/// unavailable"; retries, if any, are the caller's responsibility.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum RegistryError {
    /// Network failure or non-success status from the registry itself.
    #[error("registry request failed: {0}")]
    Request(String),

    /// The catalog returned an empty result set for this name.
    #[error("no live instance of '{0}'")]
    NoInstance(String),

    /// The catalog responded with something other than the expected shape.
    #[error("malformed catalog response: {0}")]
    Malformed(String),
}

pub type RegistryResult<T> = Result<T, RegistryError>;

/// How to pick one instance from a catalog snapshot. The deployed system
/// takes the first entry; `Random` exists as the one alternative strategy
/// but is never the default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionStrategy {
    #[default]
    First,
    Random,
}

impl SelectionStrategy {
    pub fn choose<'a>(&self, records: &'a [ServiceRecord]) -> Option<&'a ServiceRecord> {
        match self {
            SelectionStrategy::First => records.first(),
            SelectionStrategy::Random => {
                use rand::Rng;
                if records.is_empty() {
                    None
                } else {
                    let index = rand::rng().random_range(0..records.len());
                    records.get(index)
                }
            }
        }
    }
}

/// ServiceRegistry defines the port for the external service directory.
#[async_trait]
pub trait ServiceRegistry: Send + Sync + 'static {
    /// Resolve a logical service name to one live instance. Any failure
    /// (network, empty catalog, malformed payload) is an error, never a
    /// guessed address.
    async fn resolve(&self, service: &str) -> RegistryResult<ServiceRecord>;

    /// Register the calling service with the registry, including an HTTP
    /// health check for the registry to drive.
    async fn register(&self, registration: &Registration) -> RegistryResult<()>;
}
