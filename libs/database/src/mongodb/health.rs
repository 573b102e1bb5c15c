use serde::Serialize;
use std::time::Instant;

use super::MongoSession;

/// Health check status for MongoDB
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    pub healthy: bool,
    /// Error details when unhealthy
    pub message: Option<String>,
    pub response_time_ms: u64,
}

/// `true` when the session database answers a ping
pub async fn check_health(session: &MongoSession) -> bool {
    session.ping().await.is_ok()
}

/// Ping the session database and report latency and any error
///
/// # Example
/// ```ignore
/// let status = check_health_detailed(&session).await;
/// if !status.healthy {
///     tracing::warn!(message = ?status.message, "MongoDB unhealthy");
/// }
/// ```
pub async fn check_health_detailed(session: &MongoSession) -> HealthStatus {
    let start = Instant::now();
    let outcome = session.ping().await;
    let response_time_ms = start.elapsed().as_millis() as u64;

    match outcome {
        Ok(()) => HealthStatus {
            healthy: true,
            message: None,
            response_time_ms,
        },
        Err(e) => HealthStatus {
            healthy: false,
            message: Some(e.to_string()),
            response_time_ms,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mongodb::MongoConfig;

    #[test]
    fn test_health_status_serializes() {
        let status = HealthStatus {
            healthy: false,
            message: Some("server selection timeout".to_string()),
            response_time_ms: 30_000,
        };
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["healthy"], false);
        assert_eq!(json["response_time_ms"], 30_000);
    }

    #[tokio::test]
    #[ignore] // Requires actual MongoDB
    async fn test_check_health_detailed() {
        let session = MongoSession::open(&MongoConfig::default()).await.unwrap();
        let status = check_health_detailed(&session).await;
        assert!(status.healthy);
        assert!(status.message.is_none());
        assert!(check_health(&session).await);
    }
}
