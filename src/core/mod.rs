pub mod error;
pub mod gateway;
pub mod routes;

pub use error::{ApiError, ApiResult};
pub use gateway::GatewayService;
pub use routes::{LogicalService, RouteMatch, RouteTable};
