//! Inbound request orchestration for the gateway.
//!
//! For each request: route-table lookup, a fresh registry resolution, URI
//! rewrite, then one outbound call through the [`HttpClient`] port. A
//! backend's successful response streams back verbatim; a backend *error*
//! response (4xx/5xx) is collected so its status and JSON body can be
//! relayed through the central error mapping, with a generic envelope
//! substituted when the body is absent or not JSON.
use std::sync::Arc;

use axum::{
    body::Body as AxumBody,
    http::{StatusCode, header},
};
use http_body_util::BodyExt;
use hyper::{Request, Response};

use crate::{
    core::{GatewayService, error::ApiError},
    ports::http_client::HttpClient,
};

pub struct GatewayHandler {
    gateway: Arc<GatewayService>,
    http_client: Arc<dyn HttpClient>,
}

impl GatewayHandler {
    pub fn new(gateway: Arc<GatewayService>, http_client: Arc<dyn HttpClient>) -> Self {
        Self {
            gateway,
            http_client,
        }
    }

    /// Main request handler: liveness locally, everything else forwarded.
    pub async fn handle_request(
        &self,
        req: Request<AxumBody>,
    ) -> Result<Response<AxumBody>, ApiError> {
        let method = req.method().clone();
        let path = req.uri().path().to_string();

        tracing::info!("Handling {} request to {}", method, path);

        if path == "/health" {
            return Ok(Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, "text/plain")
                .body(AxumBody::from("API Gateway running"))
                .map_err(|_| ApiError::Internal)?);
        }

        self.forward(req).await
    }

    async fn forward(&self, mut req: Request<AxumBody>) -> Result<Response<AxumBody>, ApiError> {
        let method = req.method().clone();
        let original_uri = req.uri().clone();

        let route = self
            .gateway
            .find_route(&method, original_uri.path())
            .ok_or_else(|| ApiError::NotFound("Not found".to_string()))?;

        // Resolution must succeed before any forwarding is attempted.
        let record = self.gateway.resolve_backend(route.service).await?;

        let backend_uri = match original_uri.query() {
            Some(query) => format!("{}{}?{query}", record.base_url(), route.backend_path),
            None => format!("{}{}", record.base_url(), route.backend_path),
        };
        *req.uri_mut() = backend_uri.parse().map_err(|err| {
            tracing::error!(uri = %backend_uri, error = %err, "rewritten backend URI is invalid");
            ApiError::Internal
        })?;

        let response = self
            .http_client
            .send_request(req)
            .await
            .map_err(|_| ApiError::Transport)?;

        if response.status().is_client_error() || response.status().is_server_error() {
            let (parts, body) = response.into_parts();
            let bytes = body
                .collect()
                .await
                .map_err(|_| ApiError::Transport)?
                .to_bytes();
            let body = serde_json::from_slice(&bytes).ok();
            return Err(ApiError::Backend {
                status: parts.status,
                body,
            });
        }

        // Success path: status, headers and body relayed unmodified.
        Ok(response)
    }
}

impl Clone for GatewayHandler {
    fn clone(&self) -> Self {
        Self {
            gateway: self.gateway.clone(),
            http_client: self.http_client.clone(),
        }
    }
}
