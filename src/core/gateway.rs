//! Core gateway orchestration.
//!
//! `GatewayService` owns the static route table and a handle to the service
//! registry. For each inbound request it performs route lookup and a *fresh*
//! registry resolution — no cache, no circuit breaker; that trade-off is
//! inherited from the deployed system deliberately. This layer does no HTTP
//! I/O of its own beyond the registry port, so it stays easy to test.
use std::sync::Arc;

use http::Method;

use crate::{
    core::{
        error::ApiError,
        routes::{LogicalService, RouteMatch, RouteTable},
    },
    ports::registry::{ServiceRecord, ServiceRegistry},
};

pub struct GatewayService {
    routes: RouteTable,
    registry: Arc<dyn ServiceRegistry>,
}

impl GatewayService {
    pub fn new(registry: Arc<dyn ServiceRegistry>) -> Self {
        Self::with_routes(registry, RouteTable::hospital_defaults())
    }

    pub fn with_routes(registry: Arc<dyn ServiceRegistry>, routes: RouteTable) -> Self {
        Self { routes, registry }
    }

    /// Route table lookup; `None` falls through to a 404.
    pub fn find_route(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        self.routes.find(method, path)
    }

    /// Resolve one live instance of the mapped service. Every failure mode
    /// (registry unreachable, empty catalog, malformed payload) collapses to
    /// `Unavailable` so the caller answers 500 without attempting to
    /// forward.
    pub async fn resolve_backend(
        &self,
        service: LogicalService,
    ) -> Result<ServiceRecord, ApiError> {
        self.registry
            .resolve(service.registry_name())
            .await
            .map_err(|err| {
                tracing::warn!(
                    service = service.registry_name(),
                    error = %err,
                    "registry resolution failed"
                );
                ApiError::Unavailable(service)
            })
    }

    pub fn route_count(&self) -> usize {
        self.routes.len()
    }
}
