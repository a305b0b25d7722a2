//! Registry adapter speaking the Consul HTTP API.
//!
//! Lookup: `GET /v1/catalog/service/{name}`, an array of records of which
//! one is chosen by the configured [`SelectionStrategy`] (first entry by
//! default). Registration: `PUT /v1/agent/service/register` with an HTTP
//! health check the registry drives on its own schedule. The registry daemon
//! is a black box; only these two endpoints are consumed.
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::ports::registry::{
    Registration, RegistryError, RegistryResult, SelectionStrategy, ServiceRecord, ServiceRegistry,
};

/// Catalog entry shape, limited to the fields this system reads.
#[derive(Debug, Deserialize)]
struct CatalogEntry {
    #[serde(rename = "Address")]
    address: String,
    #[serde(rename = "ServicePort")]
    service_port: u16,
}

#[derive(Debug, Serialize)]
struct RegisterCheck {
    #[serde(rename = "HTTP")]
    http: String,
    #[serde(rename = "Interval")]
    interval: String,
}

#[derive(Debug, Serialize)]
struct RegisterBody {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "ID")]
    id: String,
    #[serde(rename = "Address")]
    address: String,
    #[serde(rename = "Port")]
    port: u16,
    #[serde(rename = "Check")]
    check: RegisterCheck,
}

impl From<&Registration> for RegisterBody {
    fn from(registration: &Registration) -> Self {
        RegisterBody {
            name: registration.name.clone(),
            id: registration.id.clone(),
            address: registration.address.clone(),
            port: registration.port,
            check: RegisterCheck {
                http: registration.health_check_url.clone(),
                interval: registration.interval.clone(),
            },
        }
    }
}

pub struct ConsulRegistry {
    base_url: String,
    strategy: SelectionStrategy,
    client: reqwest::Client,
}

impl ConsulRegistry {
    pub fn new(base_url: impl Into<String>, strategy: SelectionStrategy) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            strategy,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl ServiceRegistry for ConsulRegistry {
    async fn resolve(&self, service: &str) -> RegistryResult<ServiceRecord> {
        let url = format!("{}/v1/catalog/service/{service}", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|err| RegistryError::Request(err.to_string()))?;

        if !response.status().is_success() {
            return Err(RegistryError::Request(format!(
                "catalog lookup for '{service}' returned {}",
                response.status()
            )));
        }

        let entries: Vec<CatalogEntry> = response
            .json()
            .await
            .map_err(|err| RegistryError::Malformed(err.to_string()))?;

        let records: Vec<ServiceRecord> = entries
            .into_iter()
            .map(|entry| ServiceRecord {
                name: service.to_string(),
                address: entry.address,
                port: entry.service_port,
            })
            .collect();

        self.strategy
            .choose(&records)
            .cloned()
            .ok_or_else(|| RegistryError::NoInstance(service.to_string()))
    }

    async fn register(&self, registration: &Registration) -> RegistryResult<()> {
        let url = format!("{}/v1/agent/service/register", self.base_url);
        let body = RegisterBody::from(registration);

        let response = self
            .client
            .put(&url)
            .json(&body)
            .send()
            .await
            .map_err(|err| RegistryError::Request(err.to_string()))?;

        if !response.status().is_success() {
            return Err(RegistryError::Request(format!(
                "registration of '{}' returned {}",
                registration.name,
                response.status()
            )));
        }

        tracing::info!(
            service = %registration.name,
            id = %registration.id,
            "registered with service registry"
        );
        Ok(())
    }
}

/// Submit a registration once at startup. Failure is logged and swallowed:
/// a service still serves traffic even when the registry cannot be reached.
pub async fn register_non_fatal(registry: &dyn ServiceRegistry, registration: &Registration) {
    if let Err(err) = registry.register(registration).await {
        tracing::warn!(
            service = %registration.name,
            error = %err,
            "service registry registration failed; continuing unregistered"
        );
    }
}
