/// An authenticated caller as seen by the claim checker.
///
/// - `token` is the raw bearer token, forwarded to the authority as-is.
/// - `user_id` keys the claim cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub token: String,
    pub user_id: String,
}

impl Identity {
    pub fn new(token: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            user_id: user_id.into(),
        }
    }
}
