//! The two backend services and their shared startup path.
//!
//! Each service is an axum `Router` plus a [`serve`]-style entrypoint that
//! binds its listener, announces itself to the registry, and runs until the
//! process stops. Registration failure is logged and swallowed: a backend
//! must keep serving direct traffic even when the registry is down.
pub mod auth_service;
pub mod patient_service;

use std::sync::Arc;

use axum::Router;
use eyre::{Context, Result};

use crate::{
    adapters::consul::register_non_fatal,
    config::models::ServiceConfig,
    ports::registry::{Registration, ServiceRegistry},
};

pub use auth_service::{AuthState, UserStore};
pub use patient_service::{PatientState, PatientStore};

/// Build this instance's registry announcement. The advertised port comes
/// from the bound listener, not the config, so ephemeral-port binds
/// advertise the port they actually got.
pub fn registration(config: &ServiceConfig, name: &str, default_id: &str, port: u16) -> Registration {
    let id = config
        .instance_id
        .clone()
        .unwrap_or_else(|| default_id.to_string());
    Registration {
        name: name.to_string(),
        id,
        address: config.advertise_addr.clone(),
        port,
        health_check_url: format!("http://{}:{}/health", config.advertise_addr, port),
        interval: config.check_interval.clone(),
    }
}

/// Bind, announce, serve. Shared by both backends.
pub async fn run_service(
    config: &ServiceConfig,
    name: &str,
    default_id: &str,
    registry: Arc<dyn ServiceRegistry>,
    router: Router,
) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {name} to {}", config.listen_addr))?;
    let port = listener
        .local_addr()
        .context("Failed to read bound address")?
        .port();

    register_non_fatal(registry.as_ref(), &registration(config, name, default_id, port)).await;

    tracing::info!(service = name, port, "service listening");
    axum::serve(listener, router)
        .await
        .with_context(|| format!("{name} server error"))
}
