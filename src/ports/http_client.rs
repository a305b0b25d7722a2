use async_trait::async_trait;
use axum::body::Body as AxumBody;
use hyper::{Request, Response};
use thiserror::Error;

/// Custom error type for outbound HTTP operations. All variants are
/// transport-level: a backend that *answered* — with any status — is not an
/// error at this layer.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum HttpClientError {
    /// Connection to the backend failed (refused, reset, DNS).
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The configured forwarding deadline elapsed.
    #[error("Timeout error after {0:?}")]
    Timeout(std::time::Duration),

    /// The outbound request could not be constructed.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Result type alias for HTTP client operations
pub type HttpClientResult<T> = Result<T, HttpClientError>;

/// HttpClient defines the port (interface) for issuing requests to resolved
/// backend instances.
#[async_trait]
pub trait HttpClient: Send + Sync + 'static {
    /// Send an HTTP request to a backend and return its response unmodified.
    ///
    /// The request URI is expected to already point at the resolved backend;
    /// headers (notably `Authorization`) and body travel as-is.
    async fn send_request(&self, req: Request<AxumBody>) -> HttpClientResult<Response<AxumBody>>;
}
