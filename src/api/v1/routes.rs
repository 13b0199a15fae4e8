/*
 * Responsibility
 * - URL layout of v1
 * - /health is public; /claims/{claim_name} goes through the access middleware
 */
use axum::{Router, routing::get};

use crate::middleware;
use crate::state::AppState;

use crate::api::v1::handlers::{claims::ensure_claim, health::health};

pub fn routes(state: AppState) -> Router<AppState> {
    let claims = Router::new().route("/claims/{claim_name}", get(ensure_claim));
    let claims = middleware::auth::access::apply(claims, state);

    Router::new().route("/health", get(health)).merge(claims)
}
