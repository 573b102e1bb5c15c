//! Store connectors for the EZBuy services
//!
//! # Features
//!
//! - `mongodb` (default) - MongoDB session, config, and health checks
//! - `config` - `core_config::FromEnv` support for the config types
//!
//! # Example
//!
//! ```ignore
//! use core_config::FromEnv;
//! use database::mongodb::{MongoConfig, MongoSession};
//!
//! let config = MongoConfig::from_env()?;
//! let session = MongoSession::open_with_retry(&config, None).await?;
//! // ... hand `session.database()` to repositories ...
//! session.shutdown().await;
//! ```

pub mod common;

#[cfg(feature = "mongodb")]
pub mod mongodb;

pub use common::RetryConfig;
