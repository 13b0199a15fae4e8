/// Factory: build `IamService` from application `Config`.
use std::sync::Arc;

use crate::config::Config;
use crate::services::iam::{HttpAuthorityClient, IamService};

#[derive(Debug, thiserror::Error)]
pub enum FactoryError {
    #[error("failed to build http client: {0}")]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Authority(#[from] crate::services::iam::http_authority::HttpAuthorityError),
}

pub fn build_iam_service(config: &Config) -> Result<Arc<IamService>, FactoryError> {
    let http = reqwest::Client::builder()
        .timeout(config.authority_timeout)
        .build()?;

    let authority =
        HttpAuthorityClient::new(http, config.authority_url.clone(), &config.claim_path)?;

    if config.iam.disable_claim_check {
        tracing::warn!("claim checks are disabled; every request is allowed");
    }

    Ok(Arc::new(IamService::new(config.iam.clone(), Arc::new(authority))))
}
