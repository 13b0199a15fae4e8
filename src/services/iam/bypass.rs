use base64::Engine;
use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};

/// Plain-text value of the development bypass token.
pub const DUMMY_TOKEN: &str = "dummy_token";

/// Which credentials may skip the claim check entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BypassPolicy {
    #[default]
    NoBypass,
    // base64("dummy_token") passes every check. Never enable in production.
    GodToken,
}

impl BypassPolicy {
    pub fn from_allow_god_token(allow: bool) -> Self {
        if allow { Self::GodToken } else { Self::NoBypass }
    }

    /// `true` when `token` is allowed to skip the claim check.
    pub fn allows(self, token: &str) -> bool {
        match self {
            Self::NoBypass => false,
            Self::GodToken => is_dummy_token(token),
        }
    }
}

/// `true` when `token` is the base64 encoding of [`DUMMY_TOKEN`].
///
/// Anything that fails to decode is simply not the dummy token.
pub fn is_dummy_token(token: &str) -> bool {
    let decoded = STANDARD
        .decode(token)
        .or_else(|_| STANDARD_NO_PAD.decode(token));

    matches!(decoded, Ok(bytes) if bytes == DUMMY_TOKEN.as_bytes())
}
