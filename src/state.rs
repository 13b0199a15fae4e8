/*
 * Responsibility
 * - Shared context bound to the Router (AppState)
 *   - iam: claim checker (owns the claim cache), identity: bearer -> Identity
 * - Cheap to Clone (Arc inside)
 */
use std::sync::Arc;

use crate::services::{iam::IamService, identity::IdentityProvider};

#[derive(Clone)]
pub struct AppState {
    pub iam: Arc<IamService>,
    pub identity: Arc<dyn IdentityProvider>,
}

impl AppState {
    pub fn new(iam: Arc<IamService>, identity: Arc<dyn IdentityProvider>) -> Self {
        Self { iam, identity }
    }
}
