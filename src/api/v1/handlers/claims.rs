/*
 * Responsibility
 * - GET /claims/{claim_name}: does the caller hold this claim?
 * - 204 when it does; errors are mapped by AppError
 */
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;

use crate::{api::v1::extractors::MaybeIdentity, error::AppError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct ClaimQuery {
    #[serde(rename = "claimValue")]
    pub claim_value: Option<String>,
}

pub async fn ensure_claim(
    State(state): State<AppState>,
    MaybeIdentity(identity): MaybeIdentity,
    Path(claim_name): Path<String>,
    Query(query): Query<ClaimQuery>,
) -> Result<StatusCode, AppError> {
    state
        .iam
        .ensure_has_claim(
            identity.as_ref(),
            Some(claim_name.as_str()),
            query.claim_value.as_deref(),
        )
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
