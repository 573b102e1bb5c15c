//! Configuration for the ezbuy binary

use core_config::{ConfigError, Environment, FromEnv, env_or_default};
use database::RetryConfig;
use database::mongodb::MongoConfig;
use domain_goods::GoodsConfig;
use eyre::{Result, WrapErr};
use std::net::SocketAddr;

/// Every ten minutes, on the minute
pub const DEFAULT_MATCH_CRON: &str = "0 */10 * * * *";

#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    pub mongo: MongoConfig,
    pub goods: GoodsConfig,
    pub retry: RetryConfig,
    /// Cron expression for `schedule` when `--cron` is not given
    pub match_cron: String,
    /// Prometheus scrape endpoint for `schedule`; disabled when unset
    pub metrics_addr: Option<SocketAddr>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Config {
            environment: Environment::from_env(),
            mongo: MongoConfig::from_env().wrap_err("invalid MongoDB configuration")?,
            goods: GoodsConfig::from_env().wrap_err("invalid goods configuration")?,
            retry: RetryConfig::from_env().wrap_err("invalid retry configuration")?,
            match_cron: env_or_default("MATCH_CRON", DEFAULT_MATCH_CRON),
            metrics_addr: metrics_addr_from_env()?,
        })
    }
}

fn metrics_addr_from_env() -> Result<Option<SocketAddr>, ConfigError> {
    match std::env::var("METRICS_ADDR") {
        Ok(raw) if !raw.trim().is_empty() => {
            raw.trim()
                .parse()
                .map(Some)
                .map_err(|e: std::net::AddrParseError| ConfigError::ParseError {
                    key: "METRICS_ADDR".to_string(),
                    details: e.to_string(),
                })
        }
        _ => Ok(None),
    }
}
