//! Configuration data structures for the hospital stack.
//!
//! These types map directly to TOML (also JSON / YAML) configuration files.
//! They are serde-friendly and carry defaults matching the deployed layout:
//! gateway on 5000, auth on 5001, patients on 5003, registry on 8500. The
//! token secret is the one field with no default.
use serde::{Deserialize, Serialize};

use crate::{auth::DEFAULT_TOKEN_TTL_SECS, ports::registry::SelectionStrategy};

fn default_gateway_listen() -> String {
    "127.0.0.1:5000".to_string()
}

fn default_auth_listen() -> String {
    "127.0.0.1:5001".to_string()
}

fn default_patient_listen() -> String {
    "127.0.0.1:5003".to_string()
}

fn default_advertise_addr() -> String {
    "127.0.0.1".to_string()
}

fn default_registry_url() -> String {
    "http://localhost:8500".to_string()
}

fn default_check_interval() -> String {
    "10s".to_string()
}

fn default_token_ttl() -> i64 {
    DEFAULT_TOKEN_TTL_SECS
}

/// Top-level configuration shared by all three binaries. Each subcommand
/// reads only its own section plus `registry` and `token`.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    pub gateway: GatewayConfig,
    pub auth_service: ServiceConfig,
    pub patient_service: ServiceConfig,
    pub registry: RegistryConfig,
    pub token: TokenConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            gateway: GatewayConfig::default(),
            auth_service: ServiceConfig::default(),
            patient_service: ServiceConfig::patient_default(),
            registry: RegistryConfig::default(),
            token: TokenConfig::default(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct GatewayConfig {
    /// Address the gateway listens on
    pub listen_addr: String,
    pub forward: ForwardConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_gateway_listen(),
            forward: ForwardConfig::default(),
        }
    }
}

/// Outbound forwarding knobs.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct ForwardConfig {
    /// Per-request deadline in seconds. `None` means no deadline: the
    /// gateway waits as long as the backend does.
    pub timeout_secs: Option<u64>,
}

/// One backend service's listen/advertise settings.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ServiceConfig {
    pub listen_addr: String,
    /// Address advertised to the registry; may differ from the bind address
    /// behind NAT or in containers.
    pub advertise_addr: String,
    /// Instance ID in the registry, e.g. "auth1"
    pub instance_id: Option<String>,
    /// Health-probe interval in registry notation, e.g. "10s"
    pub check_interval: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_auth_listen(),
            advertise_addr: default_advertise_addr(),
            instance_id: None,
            check_interval: default_check_interval(),
        }
    }
}

impl ServiceConfig {
    /// Default section for the patient service (only the port differs).
    pub fn patient_default() -> Self {
        Self {
            listen_addr: default_patient_listen(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct RegistryConfig {
    /// Base URL of the Consul HTTP API
    pub url: String,
    /// How to pick an instance from a multi-entry catalog snapshot
    pub strategy: SelectionStrategy,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            url: default_registry_url(),
            strategy: SelectionStrategy::default(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct TokenConfig {
    /// HS256 signing secret, shared by issuer and verifiers. Required; an
    /// empty value fails validation.
    pub secret: String,
    /// Token lifetime in seconds
    pub ttl_secs: i64,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            ttl_secs: default_token_ttl(),
        }
    }
}
