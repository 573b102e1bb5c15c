//! MongoDB implementation of ItemInfoRepository

use async_trait::async_trait;
use bson::{Document, doc, to_bson};
use chrono::{DateTime, Utc};
use futures_util::TryStreamExt;
use mongodb::{Collection, Database};
use tracing::instrument;

use crate::error::{GoodsError, GoodsResult};
use crate::models::{Post, Subscriber};
use crate::repository::ItemInfoRepository;

/// Item documents are read untyped; conversion happens in the service
pub struct MongoItemInfoRepository {
    collection: Collection<Document>,
}

impl MongoItemInfoRepository {
    pub fn new(db: &Database, collection_name: &str) -> Self {
        Self {
            collection: db.collection::<Document>(collection_name),
        }
    }

    fn append_update(posts: &[Post], updated_at: DateTime<Utc>) -> GoodsResult<Document> {
        let posts = to_bson(posts)?;
        Ok(doc! {
            "$push": { "posts": { "$each": posts } },
            "$set": { "last_update_time": bson::DateTime::from_chrono(updated_at) },
        })
    }
}

#[async_trait]
impl ItemInfoRepository for MongoItemInfoRepository {
    #[instrument(skip(self))]
    async fn list_documents(&self) -> GoodsResult<Vec<Document>> {
        let cursor = self.collection.find(doc! {}).await?;
        Ok(cursor.try_collect().await?)
    }

    #[instrument(skip(self))]
    async fn find_document(&self, item: &str) -> GoodsResult<Option<Document>> {
        Ok(self.collection.find_one(doc! { "item": item }).await?)
    }

    #[instrument(skip(self, posts), fields(count = posts.len()))]
    async fn append_posts(
        &self,
        item: &str,
        posts: Vec<Post>,
        updated_at: DateTime<Utc>,
    ) -> GoodsResult<()> {
        if posts.is_empty() {
            return Ok(());
        }

        let update = Self::append_update(&posts, updated_at)?;
        let result = self
            .collection
            .update_one(doc! { "item": item }, update)
            .await?;

        if result.matched_count == 0 {
            return Err(GoodsError::ItemNotFound(item.to_string()));
        }
        Ok(())
    }

    #[instrument(skip(self, subscriber), fields(client_id = %subscriber.client_id))]
    async fn add_subscriber(&self, item: &str, subscriber: Subscriber) -> GoodsResult<bool> {
        self.collection
            .update_one(
                doc! { "item": item },
                doc! { "$setOnInsert": { "subscribers": [], "posts": [] } },
            )
            .upsert(true)
            .await?;

        let result = self
            .collection
            .update_one(
                doc! { "item": item, "subscribers.client_id": { "$ne": subscriber.client_id.as_str() } },
                doc! { "$push": { "subscribers": to_bson(&subscriber)? } },
            )
            .await?;

        let added = result.modified_count > 0;
        if added {
            tracing::info!("Client subscribed to item");
        }
        Ok(added)
    }

    #[instrument(skip(self))]
    async fn remove_subscriber(&self, item: &str, client_id: &str) -> GoodsResult<bool> {
        let result = self
            .collection
            .update_one(
                doc! { "item": item },
                doc! { "$pull": { "subscribers": { "client_id": client_id } } },
            )
            .await?;
        Ok(result.modified_count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_append_update_pushes_posts_and_stamps_time() {
        let posts = vec![Post {
            post_id: "p1".to_string(),
            post_time: Utc.timestamp_opt(20, 0).unwrap(),
        }];
        let updated_at = Utc.timestamp_opt(30, 0).unwrap();

        let update = MongoItemInfoRepository::append_update(&posts, updated_at).unwrap();

        let each = update
            .get_document("$push")
            .and_then(|push| push.get_document("posts"))
            .and_then(|p| p.get_array("$each"))
            .unwrap();
        assert_eq!(each.len(), 1);
        let first = each[0].as_document().unwrap();
        assert_eq!(first.get_str("post_id").unwrap(), "p1");
        assert_eq!(
            first.get_datetime("post_time").unwrap().timestamp_millis(),
            20_000
        );

        let stamped = update
            .get_document("$set")
            .and_then(|set| set.get_datetime("last_update_time"))
            .unwrap();
        assert_eq!(stamped.timestamp_millis(), 30_000);
    }
}
