pub mod authority;
pub mod bypass;
pub mod error;
pub mod factory;
pub mod http_authority;
#[cfg(test)]
pub(crate) mod mock;
pub mod service;

pub use authority::{AuthorityClient, AuthorityError, AuthorityOutcome};
pub use bypass::BypassPolicy;
pub use error::IamError;
pub use factory::build_iam_service;
pub use http_authority::HttpAuthorityClient;
pub use service::{IamConfig, IamService};
