pub mod http_client;
pub mod registry;

pub use http_client::{HttpClient, HttpClientError, HttpClientResult};
pub use registry::{
    Registration, RegistryError, RegistryResult, SelectionStrategy, ServiceRecord, ServiceRegistry,
};
