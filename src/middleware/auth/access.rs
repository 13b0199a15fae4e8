//! Bearer token -> `Identity` request extension.
//!
//! - No `Authorization` header: the request continues without an identity.
//!   Whether that is acceptable is the claim checker's decision (it is when
//!   claim checks are globally disabled).
//! - A header that is not a resolvable bearer token is rejected with 401.

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::{self, Next},
    response::Response,
};

use crate::error::AppError;
use crate::state::AppState;

/// Apply the access middleware to `/api/v1/*`.
///
/// ```ignore
/// let v1 = api::v1::routes();
/// let v1 = middleware::auth::access::apply(v1, state.clone());
/// app = app.nest("/api/v1", v1);
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    router.layer(middleware::from_fn_with_state(state, access_middleware))
}

async fn access_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let Some(auth) = req.headers().get(header::AUTHORIZATION) else {
        return Ok(next.run(req).await);
    };

    let token = auth
        .to_str()
        .ok()
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .ok_or(AppError::Unauthorized)?;

    let identity = match state.identity.resolve(token) {
        Ok(identity) => identity,
        Err(err) => {
            tracing::warn!(error = %err, "bearer token could not be resolved to an identity");
            return Err(err.into());
        }
    };

    req.extensions_mut().insert(identity);

    Ok(next.run(req).await)
}
