//! Boundary to the remote authorization authority.
use async_trait::async_trait;

/// Why a request to the authority did not produce a decision.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AuthorityError {
    #[error("authority unreachable: {0}")]
    Unreachable(String),
    #[error("authority responded with server error status {0}")]
    Status(u16),
    #[error("authority request failed: {0}")]
    Transport(String),
}

/// Result of asking the authority about one claim.
#[derive(Debug, Clone)]
pub enum AuthorityOutcome {
    Granted,
    Denied,
    TransportFailure(AuthorityError),
}

/// Asks the authority whether a token holds a claim.
///
/// Implementations own timeouts and retries; callers treat each call as a
/// single opaque attempt.
#[async_trait]
pub trait AuthorityClient: Send + Sync {
    // Backend name, for logging.
    fn backend_name(&self) -> &'static str;

    async fn check(
        &self,
        token: &str,
        claim_name: &str,
        claim_value: Option<&str>,
    ) -> AuthorityOutcome;
}
