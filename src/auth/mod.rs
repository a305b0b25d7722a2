pub mod extract;
pub mod policy;
pub mod role;
pub mod token;

pub use extract::Administrative;
pub use policy::Capability;
pub use role::{Role, UnknownRole};
pub use token::{Claims, DEFAULT_TOKEN_TTL_SECS, Identity, TokenError, TokenService};
