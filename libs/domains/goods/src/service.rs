use chrono::Utc;
use observability::{GoodsMetrics, OperationTimer};
use serde::Serialize;
use std::sync::Arc;
use tracing::instrument;
use validator::Validate;

use crate::config::GoodsConfig;
use crate::error::{GoodsError, GoodsResult};
use crate::matcher::{self, MatchBatch, MatchResult};
use crate::models::{
    AddOutcome, Good, IngestReport, ItemDocument, NewGood, Post, RefreshReport, RemoveOutcome,
    RemoveSelection, SearchResult, ShoppingList, Subscriber, collect_matches,
};
use crate::repository::{GoodsRepository, ItemInfoRepository, ShoppingListRepository};

/// Outcome of matching every item document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MatchReport {
    pub notifications: MatchBatch,
    /// Item documents that were matched
    pub items: usize,
    /// Item documents skipped because they could not be decoded
    pub malformed: usize,
}

/// Service layer for goods, item info, and shopping lists
pub struct GoodsService<G, I, S>
where
    G: GoodsRepository,
    I: ItemInfoRepository,
    S: ShoppingListRepository,
{
    goods: Arc<G>,
    items: Arc<I>,
    lists: Arc<S>,
    config: GoodsConfig,
}

impl<G, I, S> Clone for GoodsService<G, I, S>
where
    G: GoodsRepository,
    I: ItemInfoRepository,
    S: ShoppingListRepository,
{
    fn clone(&self) -> Self {
        Self {
            goods: Arc::clone(&self.goods),
            items: Arc::clone(&self.items),
            lists: Arc::clone(&self.lists),
            config: self.config.clone(),
        }
    }
}

impl<G, I, S> GoodsService<G, I, S>
where
    G: GoodsRepository,
    I: ItemInfoRepository,
    S: ShoppingListRepository,
{
    pub fn new(goods: G, items: I, lists: S, config: GoodsConfig) -> Self {
        Self {
            goods: Arc::new(goods),
            items: Arc::new(items),
            lists: Arc::new(lists),
            config,
        }
    }

    // =========================================================================
    // Goods
    // =========================================================================

    /// Validate, stamp with the ingest time, and bulk insert goods
    ///
    /// Goods whose `id` already exists are counted as duplicates.
    #[instrument(skip(self, goods), fields(count = goods.len()))]
    pub async fn ingest(&self, goods: Vec<NewGood>) -> GoodsResult<IngestReport> {
        if goods.is_empty() {
            return Ok(IngestReport::default());
        }

        let _timer = OperationTimer::new("ingest");

        for good in &goods {
            good.validate()
                .map_err(|e| GoodsError::Validation(format!("good '{}': {}", good.id, e)))?;
        }

        self.goods.ensure_indexes(self.config.goods_ttl()).await?;

        let now = Utc::now();
        let submitted = goods.len();
        let stamped: Vec<Good> = goods
            .into_iter()
            .map(|good| Good::stamped(good, now))
            .collect();

        let outcome = self.goods.insert_many(stamped).await?;
        let report = IngestReport {
            submitted,
            inserted: outcome.inserted,
            duplicates: outcome.duplicates,
        };

        GoodsMetrics::record_ingest(report.submitted, report.inserted, report.duplicates);
        tracing::info!(
            inserted = report.inserted,
            duplicates = report.duplicates,
            "Ingest complete"
        );
        Ok(report)
    }

    /// Goods matching any item in the shopping list, keyed by the list's client
    #[instrument(skip(self, list), fields(client_id = %list.client_id))]
    pub async fn search(&self, list: &ShoppingList) -> GoodsResult<SearchResult> {
        let mut result = SearchResult::new();

        if list.is_empty() {
            result.insert(list.client_id.clone(), Vec::new());
            return Ok(result);
        }

        let keywords = list.items();
        let goods = self.goods.find_by_keywords(&keywords).await?;
        let hits = collect_matches(list, &goods);

        GoodsMetrics::record_search(keywords.len(), hits.len());
        result.insert(list.client_id.clone(), hits);
        Ok(result)
    }

    /// Search with the stored shopping list of `client_id`
    pub async fn search_for_client(&self, client_id: &str) -> GoodsResult<SearchResult> {
        let list = self
            .lists
            .find(client_id)
            .await?
            .ok_or_else(|| GoodsError::ClientNotFound(client_id.to_string()))?;
        self.search(&list).await
    }

    pub async fn list_all(&self) -> GoodsResult<Vec<Good>> {
        self.goods.list_all().await
    }

    #[instrument(skip(self))]
    pub async fn remove_all(&self) -> GoodsResult<u64> {
        let deleted = self.goods.delete_all().await?;
        GoodsMetrics::record_purge(deleted);
        Ok(deleted)
    }

    // =========================================================================
    // Item info
    // =========================================================================

    /// Append goods mentioning each tracked item as new posts on its document
    #[instrument(skip(self))]
    pub async fn refresh_item_info(&self) -> GoodsResult<RefreshReport> {
        let _timer = OperationTimer::new("refresh");
        let mut report = RefreshReport::default();
        let now = Utc::now();

        for raw in self.items.list_documents().await? {
            let document = match ItemDocument::try_from(raw) {
                Ok(document) => document,
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping item document");
                    report.malformed += 1;
                    continue;
                }
            };

            let goods = self
                .goods
                .find_by_keywords(std::slice::from_ref(&document.item))
                .await?;
            let posts = new_posts(&document, &goods);

            report.items_scanned += 1;
            report.posts_added += posts.len();
            if !posts.is_empty() {
                tracing::debug!(item = %document.item, added = posts.len(), "Recording posts");
                self.items.append_posts(&document.item, posts, now).await?;
            }
        }

        GoodsMetrics::record_refresh(report.items_scanned, report.posts_added);
        tracing::info!(
            items = report.items_scanned,
            posts_added = report.posts_added,
            malformed = report.malformed,
            "Item info refreshed"
        );
        Ok(report)
    }

    /// Match every item document and group the results per client
    ///
    /// Malformed documents are logged and skipped.
    #[instrument(skip(self))]
    pub async fn match_all(&self) -> GoodsResult<MatchReport> {
        let _timer = OperationTimer::new("match");
        let mut report = MatchReport::default();

        for raw in self.items.list_documents().await? {
            match ItemDocument::try_from(raw) {
                Ok(mut document) => {
                    document.sort_for_matching();
                    matcher::merge_into(&mut report.notifications, matcher::match_item(&document));
                    report.items += 1;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Skipping item document");
                    report.malformed += 1;
                }
            }
        }

        GoodsMetrics::record_match(report.items, report.notifications.len(), report.malformed);
        tracing::info!(
            items = report.items,
            clients = report.notifications.len(),
            malformed = report.malformed,
            "Matching complete"
        );
        Ok(report)
    }

    /// Match a single item document by name
    #[instrument(skip(self))]
    pub async fn match_item_named(&self, item: &str) -> GoodsResult<MatchResult> {
        let raw = self
            .items
            .find_document(item)
            .await?
            .ok_or_else(|| GoodsError::ItemNotFound(item.to_string()))?;

        let mut document = ItemDocument::try_from(raw)?;
        document.sort_for_matching();
        Ok(matcher::match_item(&document))
    }

    // =========================================================================
    // Shopping lists
    // =========================================================================

    /// Add an item keyword to a client's cart and subscribe the client to it
    #[instrument(skip(self, client_name))]
    pub async fn add_to_cart(
        &self,
        client_id: &str,
        client_name: &str,
        item: &str,
    ) -> GoodsResult<AddOutcome> {
        let item = item.trim();
        if item.is_empty() {
            return Err(GoodsError::Validation("item must not be empty".to_string()));
        }

        let subscriber = Subscriber {
            client_id: client_id.to_string(),
            last_match_time: Utc::now(),
        };

        let count = match self.lists.find(client_id).await? {
            None => {
                self.lists
                    .create(ShoppingList::new(client_id, client_name, item))
                    .await?;
                1
            }
            Some(list) if list.contains(item) => {
                // A subscribe that failed after the cart write is repaired here
                self.items.add_subscriber(item, subscriber).await?;
                return Ok(AddOutcome::AlreadyTracked);
            }
            Some(list) if list.len() >= self.config.cart_item_limit => {
                return Ok(AddOutcome::Full {
                    limit: self.config.cart_item_limit,
                });
            }
            Some(list) => self
                .lists
                .add_item(client_id, client_name, item)
                .await?
                .map(|updated| updated.len())
                .unwrap_or(list.len() + 1),
        };

        self.items.add_subscriber(item, subscriber).await?;

        tracing::info!(count, "Item added to cart");
        Ok(AddOutcome::Added { count })
    }

    /// Items in a client's cart; empty for unknown clients
    pub async fn show_cart(&self, client_id: &str) -> GoodsResult<Vec<String>> {
        Ok(self
            .lists
            .find(client_id)
            .await?
            .map(|list| list.items())
            .unwrap_or_default())
    }

    /// Remove cart entries and unsubscribe the client from their items
    #[instrument(skip(self))]
    pub async fn remove_from_cart(
        &self,
        client_id: &str,
        selection: RemoveSelection,
    ) -> GoodsResult<RemoveOutcome> {
        let list = self
            .lists
            .find(client_id)
            .await?
            .ok_or_else(|| GoodsError::ClientNotFound(client_id.to_string()))?;

        match selection {
            RemoveSelection::Nothing => Ok(RemoveOutcome::Kept),
            RemoveSelection::Index(index) => {
                let item = list
                    .shopping_cart
                    .get(index)
                    .map(|entry| entry.item.clone())
                    .ok_or_else(|| {
                        GoodsError::Validation(format!(
                            "cart index {} out of range ({} items)",
                            index,
                            list.len()
                        ))
                    })?;

                self.lists.remove_item(client_id, &item).await?;
                self.items.remove_subscriber(&item, client_id).await?;
                Ok(RemoveOutcome::Removed { item })
            }
            RemoveSelection::All => {
                let removed = self
                    .lists
                    .clear(client_id)
                    .await?
                    .ok_or_else(|| GoodsError::ClientNotFound(client_id.to_string()))?
                    .items();

                for item in &removed {
                    self.items.remove_subscriber(item, client_id).await?;
                }
                Ok(RemoveOutcome::Cleared {
                    count: removed.len(),
                })
            }
        }
    }
}

/// Goods mentioning the item that are not yet recorded as posts
fn new_posts(document: &ItemDocument, goods: &[Good]) -> Vec<Post> {
    let mut posts: Vec<Post> = Vec::new();
    for good in goods {
        if !good.message.contains(document.item.as_str())
            || document.has_post(&good.id)
            || posts.iter().any(|p| p.post_id == good.id)
        {
            continue;
        }
        posts.push(Post {
            post_id: good.id.clone(),
            post_time: good.update_time,
        });
    }
    posts
}
