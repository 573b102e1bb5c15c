use async_trait::async_trait;
use bson::Document;
use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::error::GoodsResult;
use crate::models::{Good, InsertOutcome, Post, ShoppingList, Subscriber};

/// Persistence for marketplace goods
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GoodsRepository: Send + Sync {
    /// Create the TTL index on ingest time and the unique index on `id`
    async fn ensure_indexes(&self, ttl: Duration) -> GoodsResult<()>;

    /// Insert goods unordered; duplicates of an existing `id` are counted, not fatal
    async fn insert_many(&self, goods: Vec<Good>) -> GoodsResult<InsertOutcome>;

    /// Goods whose message contains any of `keywords`, newest first
    async fn find_by_keywords(&self, keywords: &[String]) -> GoodsResult<Vec<Good>>;

    async fn list_all(&self) -> GoodsResult<Vec<Good>>;

    /// Remove every good, returning the number deleted
    async fn delete_all(&self) -> GoodsResult<u64>;
}

/// Persistence for item documents (subscribers + posts per keyword)
///
/// Documents are returned raw so that callers decide how to treat malformed ones.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ItemInfoRepository: Send + Sync {
    async fn list_documents(&self) -> GoodsResult<Vec<Document>>;

    async fn find_document(&self, item: &str) -> GoodsResult<Option<Document>>;

    /// Append posts and stamp `last_update_time`
    async fn append_posts(
        &self,
        item: &str,
        posts: Vec<Post>,
        updated_at: DateTime<Utc>,
    ) -> GoodsResult<()>;

    /// Subscribe a client, creating the item document if needed.
    /// Returns `false` when the client was already subscribed.
    async fn add_subscriber(&self, item: &str, subscriber: Subscriber) -> GoodsResult<bool>;

    /// Returns `false` when the client was not subscribed
    async fn remove_subscriber(&self, item: &str, client_id: &str) -> GoodsResult<bool>;
}

/// Persistence for client shopping lists
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ShoppingListRepository: Send + Sync {
    async fn find(&self, client_id: &str) -> GoodsResult<Option<ShoppingList>>;

    async fn create(&self, list: ShoppingList) -> GoodsResult<()>;

    /// Add `item` if absent and refresh the client's display name.
    /// Returns the list after the update.
    async fn add_item(
        &self,
        client_id: &str,
        client_name: &str,
        item: &str,
    ) -> GoodsResult<Option<ShoppingList>>;

    async fn remove_item(&self, client_id: &str, item: &str) -> GoodsResult<()>;

    /// Empty the cart, returning the list as it was before
    async fn clear(&self, client_id: &str) -> GoodsResult<Option<ShoppingList>>;
}
