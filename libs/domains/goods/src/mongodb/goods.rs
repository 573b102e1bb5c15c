//! MongoDB implementation of GoodsRepository

use async_trait::async_trait;
use bson::{Bson, Document, Regex, doc};
use futures_util::TryStreamExt;
use mongodb::{
    Collection, Database, IndexModel,
    error::{Error, ErrorKind},
    options::IndexOptions,
};
use std::time::Duration;
use tracing::instrument;

use crate::error::{GoodsError, GoodsResult};
use crate::models::{Good, InsertOutcome};
use crate::repository::GoodsRepository;

const DUPLICATE_KEY: i32 = 11000;

pub struct MongoGoodsRepository {
    collection: Collection<Good>,
}

impl MongoGoodsRepository {
    pub fn new(db: &Database, collection_name: &str) -> Self {
        Self {
            collection: db.collection::<Good>(collection_name),
        }
    }

    /// `{ message: { $in: [/kw1/, /kw2/, ...] } }` with each keyword matched literally
    fn keyword_filter(keywords: &[String]) -> Document {
        let patterns: Vec<Bson> = keywords
            .iter()
            .map(|keyword| {
                Bson::RegularExpression(Regex {
                    pattern: regex::escape(keyword),
                    options: String::new(),
                })
            })
            .collect();

        doc! { "message": { "$in": patterns } }
    }

    /// Split a failed unordered insert into duplicates and real failures
    fn classify_insert_error(err: Error, submitted: usize) -> GoodsResult<InsertOutcome> {
        match err.kind.as_ref() {
            ErrorKind::InsertMany(failure) if failure.write_concern_error.is_none() => {
                let write_errors = failure.write_errors.as_deref().unwrap_or_default();
                Self::count_duplicates(
                    submitted,
                    write_errors
                        .iter()
                        .map(|e| (e.code, e.index, e.message.as_str())),
                )
            }
            _ => Err(err.into()),
        }
    }

    /// Per-document write errors as `(code, index, message)`. Duplicate keys
    /// are counted; any other code fails the whole insert.
    fn count_duplicates<'a>(
        submitted: usize,
        write_errors: impl IntoIterator<Item = (i32, usize, &'a str)>,
    ) -> GoodsResult<InsertOutcome> {
        let mut duplicates = 0;
        for (code, index, message) in write_errors {
            if code != DUPLICATE_KEY {
                return Err(GoodsError::Database(format!(
                    "insert failed at index {index}: {message}"
                )));
            }
            duplicates += 1;
        }

        Ok(InsertOutcome {
            inserted: submitted.saturating_sub(duplicates),
            duplicates,
        })
    }
}

#[async_trait]
impl GoodsRepository for MongoGoodsRepository {
    #[instrument(skip(self))]
    async fn ensure_indexes(&self, ttl: Duration) -> GoodsResult<()> {
        let indexes = vec![
            IndexModel::builder()
                .keys(doc! { "createTime": 1 })
                .options(
                    IndexOptions::builder()
                        .expire_after(ttl)
                        .name("idx_create_time_ttl".to_string())
                        .build(),
                )
                .build(),
            IndexModel::builder()
                .keys(doc! { "id": 1 })
                .options(
                    IndexOptions::builder()
                        .unique(true)
                        .name("idx_id_unique".to_string())
                        .build(),
                )
                .build(),
        ];

        self.collection.create_indexes(indexes).await?;
        tracing::debug!("Goods indexes ensured");
        Ok(())
    }

    #[instrument(skip(self, goods), fields(count = goods.len()))]
    async fn insert_many(&self, goods: Vec<Good>) -> GoodsResult<InsertOutcome> {
        if goods.is_empty() {
            return Ok(InsertOutcome::default());
        }

        let submitted = goods.len();
        let outcome = match self.collection.insert_many(&goods).ordered(false).await {
            Ok(result) => InsertOutcome {
                inserted: result.inserted_ids.len(),
                duplicates: 0,
            },
            Err(err) => Self::classify_insert_error(err, submitted)?,
        };

        tracing::info!(
            inserted = outcome.inserted,
            duplicates = outcome.duplicates,
            "Goods inserted"
        );
        Ok(outcome)
    }

    #[instrument(skip(self))]
    async fn find_by_keywords(&self, keywords: &[String]) -> GoodsResult<Vec<Good>> {
        if keywords.is_empty() {
            return Ok(Vec::new());
        }

        let cursor = self
            .collection
            .find(Self::keyword_filter(keywords))
            .sort(doc! { "update_time": -1 })
            .await?;
        let goods: Vec<Good> = cursor.try_collect().await?;

        tracing::debug!(hits = goods.len(), "Keyword query complete");
        Ok(goods)
    }

    #[instrument(skip(self))]
    async fn list_all(&self) -> GoodsResult<Vec<Good>> {
        let cursor = self
            .collection
            .find(doc! {})
            .sort(doc! { "update_time": -1 })
            .await?;
        Ok(cursor.try_collect().await?)
    }

    #[instrument(skip(self))]
    async fn delete_all(&self) -> GoodsResult<u64> {
        let result = self.collection.delete_many(doc! {}).await?;
        tracing::info!(deleted = result.deleted_count, "Goods removed");
        Ok(result.deleted_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_filter_escapes_each_keyword() {
        let filter =
            MongoGoodsRepository::keyword_filter(&["C++".to_string(), "球拍".to_string()]);

        let patterns = filter
            .get_document("message")
            .unwrap()
            .get_array("$in")
            .unwrap();
        assert_eq!(patterns.len(), 2);

        match &patterns[0] {
            Bson::RegularExpression(regex) => {
                assert_eq!(regex.pattern, r"C\+\+");
                assert!(regex.options.is_empty());
            }
            other => panic!("expected regex, got {other:?}"),
        }
        match &patterns[1] {
            Bson::RegularExpression(regex) => assert_eq!(regex.pattern, "球拍"),
            other => panic!("expected regex, got {other:?}"),
        }
    }

    #[test]
    fn test_count_duplicates_tolerates_duplicate_keys() {
        let outcome = MongoGoodsRepository::count_duplicates(
            5,
            [
                (DUPLICATE_KEY, 1, "E11000 duplicate key error"),
                (DUPLICATE_KEY, 3, "E11000 duplicate key error"),
            ],
        )
        .unwrap();

        assert_eq!(outcome.inserted, 3);
        assert_eq!(outcome.duplicates, 2);
    }

    #[test]
    fn test_count_duplicates_without_errors_inserts_everything() {
        let outcome =
            MongoGoodsRepository::count_duplicates(4, Vec::<(i32, usize, &str)>::new()).unwrap();

        assert_eq!(outcome.inserted, 4);
        assert_eq!(outcome.duplicates, 0);
    }

    #[test]
    fn test_count_duplicates_fails_on_other_codes() {
        let result = MongoGoodsRepository::count_duplicates(
            3,
            [
                (DUPLICATE_KEY, 0, "E11000 duplicate key error"),
                (121, 2, "Document failed validation"),
            ],
        );

        match result {
            Err(GoodsError::Database(message)) => {
                assert!(message.contains("index 2"));
                assert!(message.contains("Document failed validation"));
            }
            other => panic!("expected database error, got {other:?}"),
        }
    }
}
