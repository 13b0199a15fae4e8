//! Scripted authority for tests.
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::services::iam::authority::{AuthorityClient, AuthorityOutcome};

#[derive(Debug)]
pub struct StaticAuthority {
    outcome: Mutex<AuthorityOutcome>,
    calls: AtomicUsize,
}

impl StaticAuthority {
    pub fn new(outcome: AuthorityOutcome) -> Self {
        Self {
            outcome: Mutex::new(outcome),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn set_outcome(&self, outcome: AuthorityOutcome) {
        *self.outcome.lock().unwrap() = outcome;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AuthorityClient for StaticAuthority {
    fn backend_name(&self) -> &'static str {
        "static"
    }

    async fn check(
        &self,
        _token: &str,
        _claim_name: &str,
        _claim_value: Option<&str>,
    ) -> AuthorityOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome.lock().unwrap().clone()
    }
}
