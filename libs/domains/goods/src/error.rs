use thiserror::Error;

#[derive(Debug, Error)]
pub enum GoodsError {
    /// A stored document lacks a field or carries the wrong type for it
    #[error("Malformed document for item '{}': {reason}", .item.as_deref().unwrap_or("<unknown>"))]
    MalformedDocument {
        item: Option<String>,
        reason: String,
    },

    #[error("Item not found: {0}")]
    ItemNotFound(String),

    #[error("Client not found: {0}")]
    ClientNotFound(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type GoodsResult<T> = Result<T, GoodsError>;

impl GoodsError {
    pub fn malformed(item: Option<&str>, reason: impl ToString) -> Self {
        GoodsError::MalformedDocument {
            item: item.map(str::to_string),
            reason: reason.to_string(),
        }
    }
}

impl From<mongodb::error::Error> for GoodsError {
    fn from(err: mongodb::error::Error) -> Self {
        GoodsError::Database(err.to_string())
    }
}

impl From<bson::ser::Error> for GoodsError {
    fn from(err: bson::ser::Error) -> Self {
        GoodsError::Serialization(err.to_string())
    }
}

impl From<validator::ValidationErrors> for GoodsError {
    fn from(err: validator::ValidationErrors) -> Self {
        GoodsError::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_display_names_item() {
        let err = GoodsError::malformed(Some("球拍"), "missing field `last_match_time`");
        assert_eq!(
            err.to_string(),
            "Malformed document for item '球拍': missing field `last_match_time`"
        );
    }

    #[test]
    fn test_malformed_display_without_item() {
        let err = GoodsError::malformed(None, "missing field `item`");
        assert!(err.to_string().contains("<unknown>"));
    }
}
