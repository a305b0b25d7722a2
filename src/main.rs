use std::{path::Path, sync::Arc, time::Duration};

use axum::{Router, extract::Request, routing::any};
use clap::Parser;
use color_eyre::{
    Result,
    eyre::{Context, eyre},
};
use tower_http::trace::TraceLayer;
use triage::{
    adapters::{ConsulRegistry, GatewayHandler, HttpClientAdapter},
    auth::TokenService,
    config::{AppConfig, AppConfigValidator, load_config},
    core::GatewayService,
    ports::{http_client::HttpClient, registry::ServiceRegistry},
    services::{self, AuthState, PatientState, UserStore, PatientStore},
    tracing_setup,
};

#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    #[clap(subcommand)]
    command: Option<Commands>,

    #[clap(short, long, default_value = "config.toml")]
    config: String,

    /// Human-readable console logs instead of JSON
    #[clap(long)]
    pretty: bool,
}

#[derive(Parser, Debug)]
enum Commands {
    /// Start the API gateway (default)
    Gateway,
    /// Start the auth backend
    AuthService,
    /// Start the patient backend
    PatientService,
    /// Validate configuration file
    Validate,
    /// Initialize a new configuration file
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    let config_path = args.config.clone();

    match &args.command {
        Some(Commands::Validate) => return validate_config_command(&config_path),
        Some(Commands::Init) => return init_config_command(&config_path).await,
        _ => {}
    }

    if args.pretty {
        tracing_setup::init_console_tracing()?;
    } else {
        tracing_setup::init_tracing()?;
    }

    tracing::info!("Loading configuration from {config_path}");
    let config = load_config(&config_path)?;
    AppConfigValidator::validate(&config)
        .map_err(|e| eyre!("Invalid configuration: {e}"))?;

    let registry: Arc<dyn ServiceRegistry> = Arc::new(ConsulRegistry::new(
        config.registry.url.clone(),
        config.registry.strategy,
    ));

    match args.command {
        Some(Commands::AuthService) => run_auth_service(&config, registry).await,
        Some(Commands::PatientService) => run_patient_service(&config, registry).await,
        Some(Commands::Gateway) | None => run_gateway(&config, registry).await,
        Some(Commands::Validate) | Some(Commands::Init) => unreachable!(),
    }
}

fn token_service(config: &AppConfig) -> Arc<TokenService> {
    Arc::new(TokenService::new(
        &config.token.secret,
        config.token.ttl_secs,
    ))
}

async fn run_gateway(config: &AppConfig, registry: Arc<dyn ServiceRegistry>) -> Result<()> {
    let http_client: Arc<dyn HttpClient> = Arc::new(
        HttpClientAdapter::with_deadline(
            config.gateway.forward.timeout_secs.map(Duration::from_secs),
        )
        .context("Failed to create HTTP client adapter")?,
    );
    let gateway = Arc::new(GatewayService::new(registry));
    let handler = GatewayHandler::new(gateway, http_client);

    let make_request_route = |handler: GatewayHandler| {
        any(move |req: Request| {
            let handler = handler.clone();
            async move { handler.handle_request(req).await }
        })
    };

    let app = Router::new()
        .route("/", make_request_route(handler.clone()))
        .route("/{*path}", make_request_route(handler))
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&config.gateway.listen_addr)
        .await
        .context("Failed to bind gateway listener")?;
    tracing::info!("API Gateway listening on {}", config.gateway.listen_addr);

    tokio::select! {
        result = axum::serve(listener, app) => result.context("Gateway server error"),
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
            Ok(())
        }
    }
}

async fn run_auth_service(config: &AppConfig, registry: Arc<dyn ServiceRegistry>) -> Result<()> {
    let state = AuthState {
        store: Arc::new(UserStore::new()),
        tokens: token_service(config),
    };
    let router = services::auth_service::router(state);

    tokio::select! {
        result = services::run_service(
            &config.auth_service,
            "auth-service",
            "auth1",
            registry,
            router,
        ) => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
            Ok(())
        }
    }
}

async fn run_patient_service(config: &AppConfig, registry: Arc<dyn ServiceRegistry>) -> Result<()> {
    let state = PatientState {
        store: Arc::new(PatientStore::new()),
        tokens: token_service(config),
    };
    let router = services::patient_service::router(state);

    tokio::select! {
        result = services::run_service(
            &config.patient_service,
            "patient-service",
            "patient1",
            registry,
            router,
        ) => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
            Ok(())
        }
    }
}

/// Validate configuration file and exit
fn validate_config_command(config_path: &str) -> Result<()> {
    println!("Validating configuration file: {config_path}");

    if !Path::new(config_path).exists() {
        eprintln!("Error: configuration file '{config_path}' not found");
        std::process::exit(1);
    }

    let config = match load_config(config_path) {
        Ok(config) => {
            println!("Configuration parsing: OK");
            config
        }
        Err(e) => {
            eprintln!("Configuration parsing failed:");
            eprintln!("   {e}");
            std::process::exit(1);
        }
    };

    match AppConfigValidator::validate(&config) {
        Ok(()) => {
            println!("Configuration validation: OK");
            println!();
            println!("Summary:");
            println!("   Gateway:         {}", config.gateway.listen_addr);
            println!("   Auth service:    {}", config.auth_service.listen_addr);
            println!("   Patient service: {}", config.patient_service.listen_addr);
            println!("   Registry:        {}", config.registry.url);
            println!("   Token TTL:       {}s", config.token.ttl_secs);
            Ok(())
        }
        Err(e) => {
            eprintln!("Configuration validation failed:");
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}

/// Initialize a new configuration file
async fn init_config_command(config_path: &str) -> Result<()> {
    let path = Path::new(config_path);
    if path.exists() {
        eprintln!("Error: configuration file '{config_path}' already exists");
        std::process::exit(1);
    }

    let default_config = r#"# Triage configuration

[gateway]
listen_addr = "127.0.0.1:5000"

# Per-request forwarding deadline; omit for no deadline
# [gateway.forward]
# timeout_secs = 30

[auth_service]
listen_addr = "127.0.0.1:5001"
advertise_addr = "127.0.0.1"
instance_id = "auth1"
check_interval = "10s"

[patient_service]
listen_addr = "127.0.0.1:5003"
advertise_addr = "127.0.0.1"
instance_id = "patient1"
check_interval = "10s"

[registry]
url = "http://localhost:8500"
strategy = "first"

[token]
# Required. Shared HS256 secret for issuing and verifying tokens.
secret = "change-me"
ttl_secs = 3600
"#;

    tokio::fs::write(path, default_config)
        .await
        .context("Failed to write config file")?;
    println!("Created default configuration at: {config_path}");
    println!("   Run 'triage gateway --config {config_path}' to start the gateway");
    Ok(())
}
