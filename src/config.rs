/*
 * Responsibility
 * - Load settings from the environment (authority URL, claim cache, bypass flags)
 * - Validate them and fail startup when something is missing or unsafe
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

use crate::services::cache::ClaimCacheConfig;
use crate::services::iam::{BypassPolicy, IamConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn parse(value: Option<&str>) -> Self {
        match value.unwrap_or("development").to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,

    pub authority_url: Url,
    pub claim_path: String,
    pub authority_timeout: Duration,

    pub iam: IamConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key lookup (environment, test fixtures).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let port: u16 = match lookup("PORT") {
            Some(v) => v.parse().map_err(|_| ConfigError::Invalid("PORT"))?,
            None => 3000,
        };

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::parse(lookup("APP_ENV").as_deref());

        let authority_url = lookup("IAM_AUTHORITY_URL")
            .ok_or(ConfigError::Missing("IAM_AUTHORITY_URL"))?;
        let authority_url = Url::parse(&authority_url)
            .ok()
            .filter(|u| !u.cannot_be_a_base())
            .ok_or(ConfigError::Invalid("IAM_AUTHORITY_URL"))?;

        let claim_path = lookup("IAM_CLAIM_PATH").unwrap_or_else(|| "claims/ensure".to_string());

        let authority_timeout = Duration::from_millis(parse_u64(
            &lookup,
            "IAM_AUTHORITY_TIMEOUT_MS",
            10_000,
        )?);

        let disable_claim_check = parse_bool(&lookup, "IAM_DISABLE_CLAIM_CHECK", false)?;
        let allow_god_token = parse_bool(&lookup, "IAM_ALLOW_GOD_TOKEN", false)?;

        // The god token skips every check; refuse to start with it in production.
        if allow_god_token && app_env.is_production() {
            return Err(ConfigError::Invalid("IAM_ALLOW_GOD_TOKEN"));
        }

        let defaults = ClaimCacheConfig::default();
        let cache = ClaimCacheConfig {
            enabled: parse_bool(&lookup, "CLAIM_CACHE_ENABLED", defaults.enabled)?,
            lifetime_seconds: parse_cache_seconds(
                &lookup,
                "CLAIM_CACHE_LIFETIME_SECONDS",
                defaults.lifetime_seconds,
            )?,
            cleanup_interval_seconds: parse_cache_seconds(
                &lookup,
                "CLAIM_CACHE_CLEANUP_INTERVAL_SECONDS",
                defaults.cleanup_interval_seconds,
            )?,
        };

        Ok(Self {
            addr,
            app_env,
            authority_url,
            claim_path,
            authority_timeout,
            iam: IamConfig {
                disable_claim_check,
                bypass: BypassPolicy::from_allow_god_token(allow_god_token),
                cache,
            },
        })
    }
}

fn parse_bool<F>(lookup: &F, key: &'static str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&'static str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(v) => match v.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::Invalid(key)),
        },
    }
}

fn parse_u64<F>(lookup: &F, key: &'static str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&'static str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(v) => v.trim().parse().map_err(|_| ConfigError::Invalid(key)),
    }
}

/// Upper bound for claim cache lifetime and cleanup interval (one year).
pub const MAX_CACHE_SECONDS: u64 = 365 * 24 * 60 * 60;

fn parse_cache_seconds<F>(lookup: &F, key: &'static str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&'static str) -> Option<String>,
{
    let seconds = parse_u64(lookup, key, default)?;
    if seconds > MAX_CACHE_SECONDS {
        return Err(ConfigError::Invalid(key));
    }
    Ok(seconds)
}
