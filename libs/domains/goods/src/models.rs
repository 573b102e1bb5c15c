use bson::serde_helpers::chrono_datetime_as_bson_datetime;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use validator::Validate;

use crate::error::GoodsError;

/// A marketplace post as stored in the goods collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Good {
    /// Upstream post id, unique within the collection
    pub id: String,
    /// Post body searched by keyword
    pub message: String,
    /// When the post was last edited upstream
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub update_time: DateTime<Utc>,
    /// Ingest time; the TTL index expires documents relative to this
    #[serde(rename = "createTime", with = "chrono_datetime_as_bson_datetime")]
    pub create_time: DateTime<Utc>,
}

/// A good as submitted for ingest (e.g. one element of a JSON feed file)
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewGood {
    #[validate(length(min = 1, max = 200))]
    pub id: String,
    #[serde(default)]
    pub message: String,
    pub update_time: DateTime<Utc>,
}

impl Good {
    /// Stamp a submitted good with its ingest time
    pub fn stamped(input: NewGood, now: DateTime<Utc>) -> Self {
        Self {
            id: input.id,
            message: input.message,
            update_time: input.update_time,
            create_time: now,
        }
    }
}

/// Outcome of one bulk insert
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct InsertOutcome {
    pub inserted: usize,
    /// Goods rejected by the unique `id` index
    pub duplicates: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub submitted: usize,
    pub inserted: usize,
    pub duplicates: usize,
}

// =============================================================================
// Shopping lists
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartEntry {
    pub item: String,
}

/// A client's watch list of item keywords
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShoppingList {
    pub client_id: String,
    #[serde(default)]
    pub client_name: String,
    #[serde(default)]
    pub shopping_cart: Vec<CartEntry>,
    #[serde(default)]
    pub posts_notified: Vec<String>,
}

impl ShoppingList {
    pub fn new(client_id: &str, client_name: &str, first_item: &str) -> Self {
        Self {
            client_id: client_id.to_string(),
            client_name: client_name.to_string(),
            shopping_cart: vec![CartEntry {
                item: first_item.to_string(),
            }],
            posts_notified: Vec::new(),
        }
    }

    /// Cart keywords in insertion order
    pub fn items(&self) -> Vec<String> {
        self.shopping_cart.iter().map(|e| e.item.clone()).collect()
    }

    pub fn contains(&self, item: &str) -> bool {
        self.shopping_cart.iter().any(|e| e.item == item)
    }

    pub fn len(&self) -> usize {
        self.shopping_cart.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shopping_cart.is_empty()
    }
}

/// One search hit: a good whose message contains a watched item
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GoodMatch {
    pub item: String,
    pub post_id: String,
}

/// Search hits keyed by client id
pub type SearchResult = BTreeMap<String, Vec<GoodMatch>>;

/// Pair each good with every cart item its message contains
///
/// A good mentioning two watched items yields two hits.
pub fn collect_matches(list: &ShoppingList, goods: &[Good]) -> Vec<GoodMatch> {
    goods
        .iter()
        .flat_map(|good| {
            list.shopping_cart
                .iter()
                .filter(|entry| good.message.contains(entry.item.as_str()))
                .map(|entry| GoodMatch {
                    item: entry.item.clone(),
                    post_id: good.id.clone(),
                })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AddOutcome {
    Added { count: usize },
    AlreadyTracked,
    Full { limit: usize },
}

/// Which cart entries to remove
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveSelection {
    /// Zero-based position in the cart
    Index(usize),
    All,
    Nothing,
}

impl FromStr for RemoveSelection {
    type Err = GoodsError;

    /// Accepts `all`, `none`, or a zero-based index. The legacy quick-reply
    /// codes `-1` (all) and `-2` (nothing) are also understood.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "all" | "-1" => Ok(RemoveSelection::All),
            "none" | "-2" => Ok(RemoveSelection::Nothing),
            other => other.parse::<usize>().map(RemoveSelection::Index).map_err(|_| {
                GoodsError::Validation(format!("invalid cart selection '{}'", other))
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RemoveOutcome {
    Removed { item: String },
    Cleared { count: usize },
    Kept,
}

// =============================================================================
// Item info
// =============================================================================

/// A client watching an item, with the time it was last matched
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscriber {
    pub client_id: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub last_match_time: DateTime<Utc>,
}

/// A good recorded against an item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub post_id: String,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub post_time: DateTime<Utc>,
}

/// A tracked item keyword with its subscriber and post histories
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDocument {
    pub item: String,
    pub subscribers: Vec<Subscriber>,
    pub posts: Vec<Post>,
}

impl ItemDocument {
    pub fn new(item: impl Into<String>, subscribers: Vec<Subscriber>, posts: Vec<Post>) -> Self {
        Self {
            item: item.into(),
            subscribers,
            posts,
        }
    }

    /// Order subscribers by `last_match_time` and posts by `post_time`, newest
    /// first. The sort is stable, so equal timestamps keep their stored order.
    pub fn sort_for_matching(&mut self) {
        self.subscribers
            .sort_by(|a, b| b.last_match_time.cmp(&a.last_match_time));
        self.posts.sort_by(|a, b| b.post_time.cmp(&a.post_time));
    }

    pub fn has_post(&self, post_id: &str) -> bool {
        self.posts.iter().any(|p| p.post_id == post_id)
    }
}

impl TryFrom<bson::Document> for ItemDocument {
    type Error = GoodsError;

    fn try_from(document: bson::Document) -> Result<Self, Self::Error> {
        let item = document.get_str("item").ok().map(str::to_string);
        bson::from_document(document).map_err(|e| GoodsError::malformed(item.as_deref(), e))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RefreshReport {
    pub items_scanned: usize,
    pub posts_added: usize,
    pub malformed: usize,
}
