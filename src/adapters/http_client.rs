use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body as AxumBody;
use eyre::Result;
use hyper::{Request, Response, Version, header, header::HeaderValue};
use hyper_rustls::HttpsConnector;
use hyper_util::{
    client::legacy::{Client, connect::HttpConnector},
    rt::TokioExecutor,
};
use rustls_native_certs::load_native_certs;
use tokio::time::timeout;
use tracing::Instrument;

use crate::ports::http_client::{HttpClient, HttpClientError, HttpClientResult};

/// Forwarding client built on Hyper with Rustls (HTTP/1.1 + HTTP/2).
///
/// Responsibilities:
/// * Sets the Host header from the target URI
/// * Forces request version to HTTP/1.1 while allowing ALPN to negotiate h2
/// * Optionally bounds each outbound call with a deadline
/// * Converts between Hyper body and Axum body types
///
/// Inbound headers — the Authorization header in particular — travel
/// untouched; the backend, not this client, is the authority on credential
/// validity.
pub struct HttpClientAdapter {
    client: Client<HttpsConnector<HttpConnector>, AxumBody>,
    /// Per-request deadline. `None` reproduces the deployed system's
    /// unbounded forwarding; a bounded value is opt-in via configuration.
    deadline: Option<Duration>,
}

impl HttpClientAdapter {
    pub fn new() -> Result<Self> {
        Self::with_deadline(None)
    }

    pub fn with_deadline(deadline: Option<Duration>) -> Result<Self> {
        // Install default crypto provider for rustls if not already set
        let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

        let mut http_connector = HttpConnector::new();
        http_connector.enforce_http(false); // Allow HTTPS URLs

        let mut root_cert_store = rustls::RootCertStore::empty();
        let native_certs = load_native_certs();

        if !native_certs.certs.is_empty() {
            for cert in native_certs.certs {
                if root_cert_store.add(cert).is_err() {
                    tracing::warn!("Failed to add native certificate to rustls RootCertStore");
                }
            }
        }
        if !native_certs.errors.is_empty() {
            tracing::warn!(
                "Some native certificates failed to load: {:?}",
                native_certs.errors
            );
        }

        let tls_config = rustls::ClientConfig::builder()
            .with_root_certificates(root_cert_store)
            .with_no_client_auth();

        let https_connector = hyper_rustls::HttpsConnectorBuilder::new()
            .with_tls_config(tls_config)
            .https_or_http()
            .enable_http1()
            .wrap_connector(http_connector);

        let client = Client::builder(TokioExecutor::new()).build::<_, AxumBody>(https_connector);

        Ok(Self { client, deadline })
    }
}

#[async_trait]
impl HttpClient for HttpClientAdapter {
    async fn send_request(
        &self,
        mut req: Request<AxumBody>,
    ) -> HttpClientResult<Response<AxumBody>> {
        let client = self.client.clone();

        let backend_identifier = format!(
            "{}://{}",
            req.uri().scheme_str().unwrap_or("http"),
            req.uri()
                .authority()
                .map_or_else(|| "unknown".to_string(), |a| a.to_string())
        );
        let request_path = req.uri().path().to_string();
        let request_method = req.method().to_string();

        let span = tracing::info_span!(
            "backend_request",
            backend.url = %backend_identifier,
            http.method = %request_method,
            http.path = %request_path,
            http.status_code = tracing::field::Empty,
        );

        // Set Host header from the rewritten target URI
        if let Some(host_str) = req.uri().host() {
            let host_header_val = if let Some(port) = req.uri().port() {
                HeaderValue::from_str(&format!("{host_str}:{}", port.as_u16()))
                    .unwrap_or_else(|_| HeaderValue::from_static(""))
            } else {
                HeaderValue::from_str(host_str).unwrap_or_else(|_| HeaderValue::from_static(""))
            };
            if !host_header_val.is_empty() {
                req.headers_mut().insert(hyper::header::HOST, host_header_val);
            }
        } else {
            tracing::error!("Outgoing URI has no host: {}", req.uri());
            return Err(HttpClientError::InvalidRequest(
                "Outgoing URI has no host".to_string(),
            ));
        }

        let (mut parts, axum_body) = req.into_parts();
        parts.version = Version::HTTP_11;

        tracing::debug!("Outgoing request headers: {:?}", parts.headers);

        let outgoing_request = Request::from_parts(parts, axum_body);
        let method_for_error_log = outgoing_request.method().clone();
        let uri_for_error_log = outgoing_request.uri().clone();

        let request_future = client.request(outgoing_request).instrument(span.clone());
        let result = match self.deadline {
            Some(deadline) => match timeout(deadline, request_future).await {
                Ok(inner) => inner,
                Err(_) => {
                    tracing::warn!(
                        backend = %backend_identifier,
                        deadline = ?deadline,
                        "outbound request exceeded deadline"
                    );
                    return Err(HttpClientError::Timeout(deadline));
                }
            },
            None => request_future.await,
        };

        match result {
            Ok(response) => {
                let status_code = response.status().as_u16();
                span.record("http.status_code", status_code);

                let (mut parts, hyper_body) = response.into_parts();

                // Remove Transfer-Encoding since the body is re-framed when
                // the relaying server writes it out.
                parts.headers.remove(header::TRANSFER_ENCODING);

                Ok(Response::from_parts(parts, AxumBody::new(hyper_body)))
            }
            Err(e) => {
                tracing::error!(
                    "Error making request to backend {} ({} {}): {}",
                    backend_identifier,
                    method_for_error_log,
                    uri_for_error_log,
                    e
                );
                Err(HttpClientError::ConnectionError(format!(
                    "Request to {method_for_error_log} {uri_for_error_log} failed: {e}"
                )))
            }
        }
    }
}
