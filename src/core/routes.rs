//! The gateway's static route table.
//!
//! Each `(method, path pattern)` pair maps to exactly one logical service
//! and a backend-relative path template. Patterns and templates use `:name`
//! placeholders for single path segments; captured values are substituted
//! into the template by name. The table is fixed at startup — discovery is
//! dynamic, routing is not.
use std::fmt;

use http::Method;

/// Stable identifiers used for discovery, decoupled from network addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalService {
    Auth,
    Patient,
}

impl LogicalService {
    /// The name this service registers under in the registry catalog.
    pub fn registry_name(&self) -> &'static str {
        match self {
            LogicalService::Auth => "auth-service",
            LogicalService::Patient => "patient-service",
        }
    }

    /// Human-readable name used in client-facing unavailability messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            LogicalService::Auth => "Auth",
            LogicalService::Patient => "Patient",
        }
    }
}

impl fmt::Display for LogicalService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.registry_name())
    }
}

/// One entry in the table: inbound pattern, target service, backend path.
#[derive(Debug, Clone)]
pub struct RouteSpec {
    pub method: Method,
    pub pattern: &'static str,
    pub service: LogicalService,
    pub backend_template: &'static str,
}

/// A successful table lookup: where to go and the rewritten path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    pub service: LogicalService,
    pub backend_path: String,
}

impl RouteSpec {
    const fn new(
        method: Method,
        pattern: &'static str,
        service: LogicalService,
        backend_template: &'static str,
    ) -> Self {
        Self {
            method,
            pattern,
            service,
            backend_template,
        }
    }

    fn matches(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        if method != self.method {
            return None;
        }

        let pattern_segments: Vec<&str> = self.pattern.trim_matches('/').split('/').collect();
        let path_segments: Vec<&str> = path.trim_matches('/').split('/').collect();
        if pattern_segments.len() != path_segments.len() {
            return None;
        }

        let mut params: Vec<(&str, &str)> = Vec::new();
        for (pattern_segment, path_segment) in pattern_segments.iter().zip(&path_segments) {
            if let Some(name) = pattern_segment.strip_prefix(':') {
                if path_segment.is_empty() {
                    return None;
                }
                params.push((name, path_segment));
            } else if pattern_segment != path_segment {
                return None;
            }
        }

        let backend_path = self
            .backend_template
            .trim_end_matches('/')
            .split('/')
            .map(|segment| match segment.strip_prefix(':') {
                Some(name) => params
                    .iter()
                    .find(|(param, _)| *param == name)
                    .map(|(_, value)| *value)
                    .unwrap_or(segment),
                None => segment,
            })
            .collect::<Vec<_>>()
            .join("/");

        Some(RouteMatch {
            service: self.service,
            backend_path,
        })
    }
}

/// Ordered route table; the first matching entry wins, so literal segments
/// (`/api/patients/days`) are declared before parameterized ones.
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<RouteSpec>,
}

impl RouteTable {
    pub fn new(routes: Vec<RouteSpec>) -> Self {
        Self { routes }
    }

    /// The full hospital-system surface, mirroring backend routes 1:1 with
    /// the logical-service prefix remapped.
    pub fn hospital_defaults() -> Self {
        use LogicalService::{Auth, Patient};
        Self::new(vec![
            // Credential lifecycle
            RouteSpec::new(Method::POST, "/auth/register", Auth, "/register"),
            RouteSpec::new(Method::POST, "/auth/login", Auth, "/login"),
            RouteSpec::new(Method::DELETE, "/auth/user/:id", Auth, "/user/:id"),
            // User management (admin surface; the backend enforces the role)
            RouteSpec::new(Method::GET, "/api/users", Auth, "/users"),
            RouteSpec::new(Method::GET, "/api/users/:id", Auth, "/users/:id"),
            RouteSpec::new(Method::PUT, "/api/users/:id", Auth, "/users/:id"),
            RouteSpec::new(Method::DELETE, "/api/users/:id", Auth, "/users/delete/:id"),
            RouteSpec::new(
                Method::POST,
                "/api/users/:id/reset-password",
                Auth,
                "/users/:id/reset-password",
            ),
            // Clinical records
            RouteSpec::new(Method::GET, "/api/patients", Patient, "/patients"),
            RouteSpec::new(Method::POST, "/api/patients", Patient, "/patients"),
            RouteSpec::new(Method::GET, "/api/patients/days", Patient, "/patients/days"),
            RouteSpec::new(Method::POST, "/api/patients/days", Patient, "/patients/days"),
            RouteSpec::new(Method::PUT, "/api/patients/:id", Patient, "/patients/:id"),
            RouteSpec::new(Method::DELETE, "/api/patients/:id", Patient, "/patients/:id"),
        ])
    }

    /// Find the first entry matching this method and path.
    pub fn find(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        self.routes
            .iter()
            .find_map(|route| route.matches(method, path))
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
