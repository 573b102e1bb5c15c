use mongodb::{Client, Database, bson::doc, options::ClientOptions};
use std::time::Duration;
use tracing::{info, instrument};

use super::MongoConfig;
use crate::common::{RetryConfig, retry, retry_with_backoff};

/// Error type for MongoDB session management
#[derive(Debug, thiserror::Error)]
pub enum MongoError {
    #[error("MongoDB error: {0}")]
    Mongo(#[from] mongodb::error::Error),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
}

/// A MongoDB client and its target database, acquired once and shared.
///
/// Cloning is cheap: the driver's `Client` and `Database` are handles onto the
/// same connection pool. Call [`MongoSession::shutdown`] once on exit so
/// in-flight operations finish and pooled connections close deterministically.
#[derive(Clone, Debug)]
pub struct MongoSession {
    client: Client,
    database: Database,
}

impl MongoSession {
    /// Connect using `config` and verify the server answers a `ping`
    ///
    /// # Example
    /// ```ignore
    /// use database::mongodb::{MongoConfig, MongoSession};
    ///
    /// let config = MongoConfig::new("mongodb://localhost:27017", "ezbuy");
    /// let session = MongoSession::open(&config).await?;
    /// let goods = session.database().collection::<Good>("EZBuyGoods");
    /// ```
    #[instrument(skip(config), fields(url = %config.redacted_url(), database = %config.database))]
    pub async fn open(config: &MongoConfig) -> Result<Self, MongoError> {
        info!("Connecting to MongoDB");

        let mut options = ClientOptions::parse(&config.url).await?;
        options.connect_timeout = Some(Duration::from_secs(config.connect_timeout_secs));
        options.server_selection_timeout =
            Some(Duration::from_secs(config.server_selection_timeout_secs));
        if let Some(ref app_name) = config.app_name {
            options.app_name = Some(app_name.clone());
        }

        let client = Client::with_options(options)?;
        let database = client.database(&config.database);

        let session = Self { client, database };
        session
            .ping()
            .await
            .map_err(|e| MongoError::ConnectionFailed(e.to_string()))?;

        info!("Connected to MongoDB");
        Ok(session)
    }

    /// [`MongoSession::open`] with exponential backoff
    ///
    /// `None` uses the default policy (3 retries starting at 100ms).
    pub async fn open_with_retry(
        config: &MongoConfig,
        retry_config: Option<RetryConfig>,
    ) -> Result<Self, MongoError> {
        match retry_config {
            Some(policy) => retry_with_backoff(|| Self::open(config), policy).await,
            None => retry(|| Self::open(config)).await,
        }
    }

    /// Wrap an already-built client, e.g. one pointed at a test container
    pub fn from_client(client: Client, database: &str) -> Self {
        let database = client.database(database);
        Self { client, database }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    /// Run `{ ping: 1 }` against the session database
    pub async fn ping(&self) -> Result<(), mongodb::error::Error> {
        self.database.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }

    /// Close the pool, waiting for operations in flight
    pub async fn shutdown(self) {
        info!("Closing MongoDB session");
        self.client.shutdown().await;
        info!("MongoDB session closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_rejects_invalid_connection_string() {
        let config = MongoConfig::new("not-a-mongo-url", "ezbuy");
        let result = MongoSession::open(&config).await;
        assert!(matches!(result, Err(MongoError::Mongo(_))));
    }

    #[tokio::test]
    #[ignore] // Requires actual MongoDB
    async fn test_open_and_shutdown() {
        let url = std::env::var("MONGODB_URL")
            .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());

        let session = MongoSession::open(&MongoConfig::new(url, "ezbuy_test"))
            .await
            .unwrap();
        assert_eq!(session.database().name(), "ezbuy_test");
        session.shutdown().await;
    }
}
