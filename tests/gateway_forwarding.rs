//! End-to-end forwarding tests: a stub Consul agent, the real backends, and
//! the gateway wired together on ephemeral ports.
use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::{
    Json, Router,
    extract::{Path, Request, State},
    routing::{any, get, put},
};
use serde_json::{Value, json};
use triage::{
    adapters::{ConsulRegistry, GatewayHandler, HttpClientAdapter},
    auth::TokenService,
    core::GatewayService,
    ports::{http_client::HttpClient, registry::SelectionStrategy},
    services::{
        AuthState, PatientState, UserStore, PatientStore, auth_service, patient_service,
    },
};

const SECRET: &str = "integration-secret";

async fn spawn(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

/// In-memory stand-in for the Consul HTTP API: a fixed catalog plus a log
/// of registrations received.
#[derive(Clone, Default)]
struct StubConsul {
    catalog: Arc<HashMap<String, SocketAddr>>,
    registrations: Arc<Mutex<Vec<Value>>>,
}

impl StubConsul {
    fn with_catalog(entries: &[(&str, SocketAddr)]) -> Self {
        let catalog = entries
            .iter()
            .map(|(name, addr)| (name.to_string(), *addr))
            .collect();
        Self {
            catalog: Arc::new(catalog),
            registrations: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn router(&self) -> Router {
        Router::new()
            .route("/v1/catalog/service/{name}", get(catalog_lookup))
            .route("/v1/agent/service/register", put(record_registration))
            .with_state(self.clone())
    }
}

async fn catalog_lookup(
    State(consul): State<StubConsul>,
    Path(name): Path<String>,
) -> Json<Value> {
    match consul.catalog.get(&name) {
        Some(addr) => Json(json!([
            { "Address": addr.ip().to_string(), "ServicePort": addr.port() }
        ])),
        None => Json(json!([])),
    }
}

async fn record_registration(
    State(consul): State<StubConsul>,
    Json(body): Json<Value>,
) -> &'static str {
    consul.registrations.lock().unwrap().push(body);
    ""
}

fn gateway_router(consul_addr: SocketAddr, deadline: Option<Duration>) -> Router {
    let registry = Arc::new(ConsulRegistry::new(
        format!("http://{consul_addr}"),
        SelectionStrategy::First,
    ));
    let gateway = Arc::new(GatewayService::new(registry));
    let http_client: Arc<dyn HttpClient> =
        Arc::new(HttpClientAdapter::with_deadline(deadline).unwrap());
    let handler = GatewayHandler::new(gateway, http_client);

    let make_request_route = |handler: GatewayHandler| {
        any(move |req: Request| {
            let handler = handler.clone();
            async move { handler.handle_request(req).await }
        })
    };

    Router::new()
        .route("/", make_request_route(handler.clone()))
        .route("/{*path}", make_request_route(handler))
}

fn tokens() -> Arc<TokenService> {
    Arc::new(TokenService::new(SECRET, 3600))
}

async fn spawn_auth() -> SocketAddr {
    spawn(auth_service::router(AuthState {
        store: Arc::new(UserStore::new()),
        tokens: tokens(),
    }))
    .await
}

async fn spawn_patient() -> SocketAddr {
    spawn(patient_service::router(PatientState {
        store: Arc::new(PatientStore::new()),
        tokens: tokens(),
    }))
    .await
}

/// Full stack: stub consul knowing both backends, gateway in front.
async fn spawn_stack() -> (SocketAddr, StubConsul) {
    let auth_addr = spawn_auth().await;
    let patient_addr = spawn_patient().await;
    let consul = StubConsul::with_catalog(&[
        ("auth-service", auth_addr),
        ("patient-service", patient_addr),
    ]);
    let consul_addr = spawn(consul.router()).await;
    let gateway_addr = spawn(gateway_router(consul_addr, None)).await;
    (gateway_addr, consul)
}

async fn login_as(
    client: &reqwest::Client,
    gateway: SocketAddr,
    username: &str,
    role: &str,
) -> String {
    let response = client
        .post(format!("http://{gateway}/auth/register"))
        .json(&json!({ "username": username, "password": "pw", "role": role }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let response = client
        .post(format!("http://{gateway}/auth/login"))
        .json(&json!({ "username": username, "password": "pw" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test(flavor = "multi_thread")]
async fn test_gateway_health_served_locally() {
    let consul = StubConsul::default();
    let consul_addr = spawn(consul.router()).await;
    let gateway = spawn(gateway_router(consul_addr, None)).await;

    let response = reqwest::get(format!("http://{gateway}/health")).await.unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "API Gateway running");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_empty_catalog_reports_service_unavailable() {
    let consul = StubConsul::default();
    let consul_addr = spawn(consul.router()).await;
    let gateway = spawn(gateway_router(consul_addr, None)).await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("http://{gateway}/api/patients"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 500);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "message": "Patient service not available" }));

    let response = client
        .post(format!("http://{gateway}/auth/register"))
        .json(&json!({ "username": "a", "password": "b", "role": "admin" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 500);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "message": "Auth service not available" }));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unmapped_path_is_not_found() {
    let consul = StubConsul::default();
    let consul_addr = spawn(consul.router()).await;
    let gateway = spawn(gateway_router(consul_addr, None)).await;

    let response = reqwest::get(format!("http://{gateway}/api/drugs")).await.unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_register_login_and_admin_listing_through_gateway() {
    let (gateway, _consul) = spawn_stack().await;
    let client = reqwest::Client::new();

    let token = login_as(&client, gateway, "alice", "admin").await;

    let response = client
        .get(format!("http://{gateway}/api/users"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let users: Value = response.json().await.unwrap();
    let listed = users.as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["username"], "alice");
    assert_eq!(listed[0]["role"], "admin");
    assert!(listed[0].get("password").is_none());
    assert!(listed[0].get("password_hash").is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_backend_auth_failures_relayed_verbatim() {
    let (gateway, _consul) = spawn_stack().await;
    let client = reqwest::Client::new();

    // No Authorization header: 401 from the backend, through the gateway
    let response = client
        .get(format!("http://{gateway}/api/users"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "message": "No token provided" }));

    // Present but invalid token: 403
    let response = client
        .get(format!("http://{gateway}/api/users"))
        .bearer_auth("not-a-token")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "message": "Failed to authenticate token" }));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_role_gate_relayed_verbatim() {
    let (gateway, _consul) = spawn_stack().await;
    let client = reqwest::Client::new();

    let token = login_as(&client, gateway, "rita", "receptionist").await;
    let response = client
        .get(format!("http://{gateway}/api/users"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "message": "Forbidden" }));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_backend_404_body_passes_through() {
    let (gateway, _consul) = spawn_stack().await;
    let client = reqwest::Client::new();

    let token = login_as(&client, gateway, "nina", "nurse").await;
    let response = client
        .put(format!("http://{gateway}/api/patients/999"))
        .bearer_auth(&token)
        .json(&json!({ "status": "discharged" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "message": "Patient not found" }));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_duplicate_registration_passes_through_as_400() {
    let (gateway, _consul) = spawn_stack().await;
    let client = reqwest::Client::new();

    for expected_status in [200, 400] {
        let response = client
            .post(format!("http://{gateway}/auth/register"))
            .json(&json!({ "username": "dup", "password": "pw", "role": "doctor" }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), expected_status);
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_patient_crud_and_daily_visits_through_gateway() {
    let (gateway, _consul) = spawn_stack().await;
    let client = reqwest::Client::new();

    let token = login_as(&client, gateway, "dora", "doctor").await;

    let response = client
        .post(format!("http://{gateway}/api/patients"))
        .bearer_auth(&token)
        .json(&json!({ "name": "Ada", "age": 30, "identity_no": "X-1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let created: Value = response.json().await.unwrap();
    let id = created["id"].as_i64().unwrap();

    let response = client
        .get(format!("http://{gateway}/api/patients"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let listed: Value = response.json().await.unwrap();
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let response = client
        .delete(format!("http://{gateway}/api/patients/{id}"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    // First visit of the day is created, the second finds the existing one
    let response = client
        .post(format!("http://{gateway}/api/patients/days"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], json!(true));

    let response = client
        .post(format!("http://{gateway}/api/patients/days"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["message"], json!("Visit already exists for today"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_dead_backend_maps_to_transport_error() {
    // Reserve a port, then release it so nothing is listening there
    let dead = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dead_addr = dead.local_addr().unwrap();
    drop(dead);

    let consul = StubConsul::with_catalog(&[("patient-service", dead_addr)]);
    let consul_addr = spawn(consul.router()).await;
    let gateway = spawn(gateway_router(consul_addr, None)).await;

    let response = reqwest::Client::new()
        .get(format!("http://{gateway}/api/patients"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 500);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "message": "Upstream service request failed" }));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_forward_deadline_bounds_slow_backend() {
    let slow = Router::new().route(
        "/patients",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            "late"
        }),
    );
    let slow_addr = spawn(slow).await;

    let consul = StubConsul::with_catalog(&[("patient-service", slow_addr)]);
    let consul_addr = spawn(consul.router()).await;
    let gateway = spawn(gateway_router(consul_addr, Some(Duration::from_millis(200)))).await;

    let start = std::time::Instant::now();
    let response = reqwest::Client::new()
        .get(format!("http://{gateway}/api/patients"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 500);
    assert!(start.elapsed() < Duration::from_secs(4));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_resolve_is_stable_without_registry_change() {
    let backend: SocketAddr = "10.0.0.7:5003".parse().unwrap();
    let consul = StubConsul::with_catalog(&[("patient-service", backend)]);
    let consul_addr = spawn(consul.router()).await;
    let registry = ConsulRegistry::new(format!("http://{consul_addr}"), SelectionStrategy::First);

    let first = triage::ServiceRegistry::resolve(&registry, "patient-service")
        .await
        .unwrap();
    let second = triage::ServiceRegistry::resolve(&registry, "patient-service")
        .await
        .unwrap();
    assert_eq!(first.address, second.address);
    assert_eq!(first.port, second.port);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_backend_self_registration_reaches_registry() {
    let consul = StubConsul::default();
    let consul_addr = spawn(consul.router()).await;
    let registry = ConsulRegistry::new(format!("http://{consul_addr}"), SelectionStrategy::First);

    let registration = triage::ports::registry::Registration {
        name: "auth-service".to_string(),
        id: "auth1".to_string(),
        address: "127.0.0.1".to_string(),
        port: 5001,
        health_check_url: "http://127.0.0.1:5001/health".to_string(),
        interval: "10s".to_string(),
    };
    triage::ServiceRegistry::register(&registry, &registration)
        .await
        .unwrap();

    let recorded = consul.registrations.lock().unwrap();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0]["Name"], "auth-service");
    assert_eq!(recorded[0]["Check"]["HTTP"], "http://127.0.0.1:5001/health");
    assert_eq!(recorded[0]["Check"]["Interval"], "10s");
}
