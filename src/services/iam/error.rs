use crate::services::iam::authority::AuthorityError;

/// Failures of a claim check, as seen by callers of `IamService`.
#[derive(Debug, thiserror::Error)]
pub enum IamError {
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    #[error("identity does not have the requested claim '{claim_name}'")]
    Denied { claim_name: String },

    #[error("claim check for '{claim_name}' failed upstream")]
    UpstreamFailure {
        claim_name: String,
        #[source]
        source: AuthorityError,
    },
}
