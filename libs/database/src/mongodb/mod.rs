//! MongoDB session management
//!
//! One [`MongoSession`] is opened at startup and shared by every repository.

mod config;
mod connector;
mod health;

pub use config::MongoConfig;
pub use connector::{MongoError, MongoSession};
pub use health::{HealthStatus, check_health, check_health_detailed};

// Re-export MongoDB types for convenience
pub use mongodb::{Client, Collection, Database};
