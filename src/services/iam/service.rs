//! Claim checks: bypass rules, then cache, then the authority.
use std::sync::Arc;

use crate::services::cache::{ClaimCache, ClaimCacheConfig};
use crate::services::iam::authority::{AuthorityClient, AuthorityOutcome};
use crate::services::iam::bypass::BypassPolicy;
use crate::services::iam::error::IamError;
use crate::services::identity::Identity;

/// Policy knobs for [`IamService`].
#[derive(Debug, Clone, Default)]
pub struct IamConfig {
    // Every check succeeds when set.
    pub disable_claim_check: bool,
    pub bypass: BypassPolicy,
    pub cache: ClaimCacheConfig,
}

/// Answers "does this identity hold claim X?" with a cache in front of the
/// authority.
pub struct IamService {
    config: IamConfig,
    cache: ClaimCache,
    authority: Arc<dyn AuthorityClient>,
}

impl std::fmt::Debug for IamService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IamService")
            .field("config", &self.config)
            .field("authority", &self.authority.backend_name())
            .finish()
    }
}

impl IamService {
    /// Must be called inside a tokio runtime for the cache sweep to run.
    pub fn new(config: IamConfig, authority: Arc<dyn AuthorityClient>) -> Self {
        let cache = ClaimCache::new(config.cache);
        Self {
            config,
            cache,
            authority,
        }
    }

    pub fn cache(&self) -> &ClaimCache {
        &self.cache
    }

    /// Fail unless `identity` holds `claim_name`.
    ///
    /// Order matters: a globally disabled check succeeds even without an
    /// identity, and the god token skips claim name validation.
    pub async fn ensure_has_claim(
        &self,
        identity: Option<&Identity>,
        claim_name: Option<&str>,
        claim_value: Option<&str>,
    ) -> Result<(), IamError> {
        if self.config.disable_claim_check {
            return Ok(());
        }

        let identity = identity.ok_or(IamError::InvalidArgument("no valid identity given"))?;

        if self.config.bypass.allows(&identity.token) {
            tracing::debug!(user_id = %identity.user_id, "god token used, skipping claim check");
            return Ok(());
        }

        let claim_name = claim_name
            .filter(|name| !name.is_empty())
            .ok_or(IamError::InvalidArgument("no valid claim name given"))?;

        if !self.check_claim(identity, claim_name, claim_value).await? {
            return Err(IamError::Denied {
                claim_name: claim_name.to_owned(),
            });
        }

        Ok(())
    }

    /// Cache-aside lookup of a single claim.
    ///
    /// - `Ok(bool)` is a definitive answer and has been cached.
    /// - `Err(UpstreamFailure)` leaves the cache untouched.
    pub async fn check_claim(
        &self,
        identity: &Identity,
        claim_name: &str,
        claim_value: Option<&str>,
    ) -> Result<bool, IamError> {
        if self.cache.is_enabled() {
            if let Some(cached) = self.cache.get(&identity.user_id, claim_name) {
                tracing::debug!(
                    user_id = %identity.user_id,
                    claim_name,
                    has_claim = cached.has_claim,
                    "claim cache hit"
                );
                return Ok(cached.has_claim);
            }
        }

        let has_claim = match self
            .authority
            .check(&identity.token, claim_name, claim_value)
            .await
        {
            AuthorityOutcome::Granted => true,
            AuthorityOutcome::Denied => false,
            AuthorityOutcome::TransportFailure(err) => {
                tracing::error!(
                    user_id = %identity.user_id,
                    claim_name,
                    backend = self.authority.backend_name(),
                    error = %err,
                    "claim check against authority failed"
                );
                return Err(IamError::UpstreamFailure {
                    claim_name: claim_name.to_owned(),
                    source: err,
                });
            }
        };

        tracing::debug!(
            user_id = %identity.user_id,
            claim_name,
            has_claim,
            "claim checked against authority"
        );

        self.cache.add(&identity.user_id, claim_name, has_claim);

        Ok(has_claim)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::iam::authority::AuthorityError;
    use crate::services::iam::mock::StaticAuthority;

    const DUMMY: &str = "ZHVtbXlfdG9rZW4=";

    fn identity(user_id: &str) -> Identity {
        Identity::new("abcdefg", user_id)
    }

    fn service(config: IamConfig, outcome: AuthorityOutcome) -> (IamService, Arc<StaticAuthority>) {
        let authority = Arc::new(StaticAuthority::new(outcome));
        (IamService::new(config, authority.clone()), authority)
    }

    #[tokio::test]
    async fn test_ensure_has_claim_granted() {
        let (svc, _) = service(IamConfig::default(), AuthorityOutcome::Granted);

        let result = svc
            .ensure_has_claim(Some(&identity("userId1")), Some("claim1"), None)
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_ensure_has_claim_denied() {
        let (svc, _) = service(IamConfig::default(), AuthorityOutcome::Denied);

        let err = svc
            .ensure_has_claim(Some(&identity("userId1")), Some("claim1"), None)
            .await
            .unwrap_err();

        assert!(matches!(err, IamError::Denied { ref claim_name } if claim_name == "claim1"));
    }

    #[tokio::test]
    async fn test_ensure_has_claim_requires_identity() {
        let (svc, authority) = service(IamConfig::default(), AuthorityOutcome::Granted);

        let err = svc.ensure_has_claim(None, Some("claim"), None).await.unwrap_err();

        assert!(matches!(err, IamError::InvalidArgument(_)));
        assert_eq!(authority.calls(), 0);
    }

    #[tokio::test]
    async fn test_ensure_has_claim_requires_claim_name() {
        let (svc, authority) = service(IamConfig::default(), AuthorityOutcome::Granted);
        let id = identity("userId1");

        let err = svc.ensure_has_claim(Some(&id), Some(""), None).await.unwrap_err();
        assert!(matches!(err, IamError::InvalidArgument(_)));

        let err = svc.ensure_has_claim(Some(&id), None, None).await.unwrap_err();
        assert!(matches!(err, IamError::InvalidArgument(_)));

        assert_eq!(authority.calls(), 0);
    }

    #[tokio::test]
    async fn test_disabled_claim_check_always_succeeds() {
        let config = IamConfig {
            disable_claim_check: true,
            ..Default::default()
        };
        let (svc, authority) = service(config, AuthorityOutcome::Denied);

        assert!(svc.ensure_has_claim(None, None, None).await.is_ok());
        assert!(
            svc.ensure_has_claim(Some(&identity("userId1")), Some("claim1"), None)
                .await
                .is_ok()
        );
        assert_eq!(authority.calls(), 0);
    }

    #[tokio::test]
    async fn test_god_token_bypasses_when_allowed() {
        let config = IamConfig {
            bypass: BypassPolicy::GodToken,
            ..Default::default()
        };
        let (svc, authority) = service(config, AuthorityOutcome::Denied);
        let dummy = Identity::new(DUMMY, "dummy_token");

        assert!(svc.ensure_has_claim(Some(&dummy), Some("claim1"), None).await.is_ok());
        // Claim name is not validated for the god token.
        assert!(svc.ensure_has_claim(Some(&dummy), None, None).await.is_ok());
        assert_eq!(authority.calls(), 0);

        // Still needs an identity.
        let err = svc.ensure_has_claim(None, Some("claim1"), None).await.unwrap_err();
        assert!(matches!(err, IamError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_god_token_ignored_when_not_allowed() {
        let (svc, authority) = service(IamConfig::default(), AuthorityOutcome::Denied);
        let dummy = Identity::new(DUMMY, "dummy_token");

        let err = svc
            .ensure_has_claim(Some(&dummy), Some("claim1"), None)
            .await
            .unwrap_err();

        assert!(matches!(err, IamError::Denied { .. }));
        assert_eq!(authority.calls(), 1);
    }

    #[tokio::test]
    async fn test_god_token_policy_does_not_bypass_regular_tokens() {
        let config = IamConfig {
            bypass: BypassPolicy::GodToken,
            ..Default::default()
        };
        let (svc, authority) = service(config, AuthorityOutcome::Granted);

        assert!(
            svc.ensure_has_claim(Some(&identity("userId1")), Some("claim1"), None)
                .await
                .is_ok()
        );
        assert_eq!(authority.calls(), 1);
    }

    #[tokio::test]
    async fn test_granted_result_is_cached() {
        let (svc, authority) = service(IamConfig::default(), AuthorityOutcome::Granted);
        let u1 = identity("u1");

        assert!(svc.check_claim(&u1, "read", None).await.unwrap());

        // Authority changes its mind, but the cached grant is still served.
        authority.set_outcome(AuthorityOutcome::Denied);
        assert!(svc.check_claim(&u1, "read", None).await.unwrap());
        assert_eq!(authority.calls(), 1);

        let cached = svc.cache().get("u1", "read").expect("cached");
        assert!(cached.has_claim);
    }

    #[tokio::test]
    async fn test_denied_result_is_cached() {
        let (svc, authority) = service(IamConfig::default(), AuthorityOutcome::Denied);
        let u2 = identity("u2");

        assert!(!svc.check_claim(&u2, "delete", None).await.unwrap());
        assert!(!svc.check_claim(&u2, "delete", None).await.unwrap());

        assert_eq!(authority.calls(), 1);
        assert_eq!(svc.cache().get("u2", "delete").map(|v| v.has_claim), Some(false));
    }

    #[tokio::test]
    async fn test_upstream_failure_is_raised_and_not_cached() {
        let outcome = AuthorityOutcome::TransportFailure(AuthorityError::Unreachable(
            "connection refused".into(),
        ));
        let (svc, authority) = service(IamConfig::default(), outcome);
        let u3 = identity("u3");

        let err = svc.check_claim(&u3, "read", None).await.unwrap_err();
        assert!(matches!(
            err,
            IamError::UpstreamFailure {
                source: AuthorityError::Unreachable(_),
                ..
            }
        ));
        assert!(!svc.cache().has_matching_entry("u3", "read"));

        // The next call goes to the authority again.
        authority.set_outcome(AuthorityOutcome::Granted);
        assert!(svc.check_claim(&u3, "read", None).await.unwrap());
        assert_eq!(authority.calls(), 2);
    }

    #[tokio::test]
    async fn test_disabled_cache_always_asks_authority() {
        let config = IamConfig {
            cache: ClaimCacheConfig {
                enabled: false,
                ..Default::default()
            },
            ..Default::default()
        };
        let (svc, authority) = service(config, AuthorityOutcome::Granted);
        let u1 = identity("u1");

        assert!(svc.check_claim(&u1, "read", None).await.unwrap());
        assert!(svc.check_claim(&u1, "read", None).await.unwrap());

        assert_eq!(authority.calls(), 2);
        assert!(svc.cache().is_empty());
    }

    #[tokio::test]
    async fn test_cache_is_keyed_by_user() {
        let (svc, authority) = service(IamConfig::default(), AuthorityOutcome::Granted);

        assert!(svc.check_claim(&identity("u1"), "read", None).await.unwrap());
        authority.set_outcome(AuthorityOutcome::Denied);
        assert!(!svc.check_claim(&identity("u2"), "read", None).await.unwrap());

        assert_eq!(authority.calls(), 2);
    }
}
