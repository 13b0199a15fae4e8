pub mod provider;
pub mod types;

pub use provider::{IdentityError, IdentityProvider, JwtIdentityProvider};
pub use types::Identity;
