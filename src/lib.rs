//! Triage - a hospital-management microservice stack behind one gateway.
//!
//! Triage is a small service mesh implementing a **hexagonal architecture**:
//! an API gateway that discovers its backends through a Consul-compatible
//! registry on every request, plus the auth and patient backends it fronts.
//! This library exposes the building blocks so each binary (and the test
//! suite) composes the same parts.
//!
//! # Features
//! - Dynamic request forwarding: logical service names resolved against the
//!   registry catalog per request, no cached or hardcoded backend addresses
//! - Stateless bearer-token authentication (HS256) with a shared injected
//!   secret; missing credentials and bad credentials are distinct failures
//! - Role-based authorization, enforced by which extractor a handler uses
//! - Backend error responses relayed verbatim, status code included
//! - Self-registration of backends with HTTP health checks
//! - Structured tracing via `tracing`, configuration via the `config` crate
//!
//! # Quick Example
//! ```no_run
//! use std::sync::Arc;
//!
//! use triage::{
//!     adapters::{ConsulRegistry, GatewayHandler, HttpClientAdapter},
//!     core::GatewayService,
//!     ports::registry::SelectionStrategy,
//! };
//!
//! # fn main() -> eyre::Result<()> {
//! let registry = Arc::new(ConsulRegistry::new(
//!     "http://localhost:8500",
//!     SelectionStrategy::First,
//! ));
//! let gateway = Arc::new(GatewayService::new(registry));
//! let handler = GatewayHandler::new(gateway, Arc::new(HttpClientAdapter::new()?));
//! // Wire `handler` into an axum catch-all route (see the binary crate).
//! # Ok(()) }
//! ```
//!
//! # Architecture
//! The crate separates **ports** (traits) from **adapters** (implementations)
//! while keeping business logic inside `core`. The `auth` module carries the
//! credential layer shared by the gateway's backends; `services` holds the
//! backends themselves.
//!
//! # Error Handling
//! Request-path failures are the closed [`core::ApiError`] taxonomy, mapped
//! to HTTP exactly once. Startup and configuration paths return
//! `eyre::Result` with context attached.
//!
//! # Concurrency & Data Structures
//! For shared mutable maps the project uses `scc::HashMap` to maintain
//! predictable performance characteristics under contention.
pub mod adapters;
pub mod auth;
pub mod config;
pub mod core;
pub mod ports;
pub mod services;
pub mod tracing_setup;

pub use crate::{
    adapters::{ConsulRegistry, GatewayHandler, HttpClientAdapter},
    auth::{Role, TokenService},
    core::{ApiError, GatewayService},
    ports::{http_client::HttpClient, registry::ServiceRegistry},
};
