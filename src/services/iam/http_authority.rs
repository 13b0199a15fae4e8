use async_trait::async_trait;
use reqwest::{Client, StatusCode, header};
use url::Url;

use crate::services::iam::authority::{AuthorityClient, AuthorityError, AuthorityOutcome};

#[derive(Debug, thiserror::Error)]
pub enum HttpAuthorityError {
    #[error("authority url cannot be used as a base: {0}")]
    InvalidBaseUrl(String),
}

/// HTTP authority client.
///
/// Sends `GET {base}/{claim_path}/{claim_name}[?claimValue=..]` with the
/// caller's token as bearer credential. `204 No Content` grants the claim.
#[derive(Clone, Debug)]
pub struct HttpAuthorityClient {
    http: Client,
    base_url: Url,
    claim_path: Vec<String>,
}

impl HttpAuthorityClient {
    pub fn new(http: Client, base_url: Url, claim_path: &str) -> Result<Self, HttpAuthorityError> {
        if base_url.cannot_be_a_base() {
            return Err(HttpAuthorityError::InvalidBaseUrl(base_url.to_string()));
        }

        let claim_path = claim_path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
            .collect();

        Ok(Self {
            http,
            base_url,
            claim_path,
        })
    }

    /// Build the claim check URL. Path segments and the query value are
    /// percent-encoded.
    pub fn claim_url(&self, claim_name: &str, claim_value: Option<&str>) -> Url {
        let mut url = self.base_url.clone();

        // `new` rejects cannot-be-a-base urls, so segments are always available.
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty();
            segments.extend(&self.claim_path);
            segments.push(claim_name);
        }

        if let Some(value) = claim_value {
            url.query_pairs_mut().append_pair("claimValue", value);
        }

        url
    }
}

#[async_trait]
impl AuthorityClient for HttpAuthorityClient {
    fn backend_name(&self) -> &'static str {
        "http"
    }

    async fn check(
        &self,
        token: &str,
        claim_name: &str,
        claim_value: Option<&str>,
    ) -> AuthorityOutcome {
        let url = self.claim_url(claim_name, claim_value);

        let result = self
            .http
            .get(url)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .send()
            .await;

        let resp = match result {
            Ok(resp) => resp,
            Err(e) if e.is_connect() || e.is_timeout() => {
                return AuthorityOutcome::TransportFailure(AuthorityError::Unreachable(
                    e.to_string(),
                ));
            }
            Err(e) => {
                return AuthorityOutcome::TransportFailure(AuthorityError::Transport(e.to_string()));
            }
        };

        match resp.status() {
            StatusCode::NO_CONTENT => AuthorityOutcome::Granted,
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                tracing::debug!(
                    claim_name,
                    status = resp.status().as_u16(),
                    "authority rejected claim"
                );
                AuthorityOutcome::Denied
            }
            status if status.is_server_error() => {
                AuthorityOutcome::TransportFailure(AuthorityError::Status(status.as_u16()))
            }
            status => {
                tracing::debug!(
                    claim_name,
                    status = status.as_u16(),
                    "authority did not grant claim"
                );
                AuthorityOutcome::Denied
            }
        }
    }
}
