pub mod consul;
pub mod http_client;
pub mod http_handler;

pub use consul::ConsulRegistry;
pub use http_client::HttpClientAdapter;
pub use http_handler::GatewayHandler;
