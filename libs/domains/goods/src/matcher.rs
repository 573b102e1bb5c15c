//! Subscriber/post matching
//!
//! Walks an item's subscribers against its posts with a single post cursor.
//! Both lists are expected newest-first (see [`ItemDocument::sort_for_matching`]);
//! the walk itself follows whatever order it is given.
//!
//! The cursor is shared by all subscribers and the matched list is never
//! reset, so a subscriber's entry holds every post matched up to and
//! including its own pass. A subscriber whose pass matches nothing gets no
//! entry, even if earlier passes matched posts.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::models::ItemDocument;

/// Posts matched for one client on one item
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientMatch {
    pub item: String,
    pub post_ids: Vec<String>,
}

/// Matches for a single item, keyed by client id
pub type MatchResult = BTreeMap<String, ClientMatch>;

/// Matches across many items, keyed by client id
pub type MatchBatch = BTreeMap<String, Vec<ClientMatch>>;

/// Match one item document's posts against its subscribers
pub fn match_item(document: &ItemDocument) -> MatchResult {
    let posts = &document.posts;
    let mut result = MatchResult::new();
    let mut cursor = 0;
    let mut matched: Vec<String> = Vec::new();

    for subscriber in &document.subscribers {
        if cursor >= posts.len() {
            break;
        }

        let before = matched.len();
        while let Some(post) = posts.get(cursor) {
            if subscriber.last_match_time >= post.post_time {
                break;
            }
            matched.push(post.post_id.clone());
            cursor += 1;
        }

        if matched.len() > before {
            result.insert(
                subscriber.client_id.clone(),
                ClientMatch {
                    item: document.item.clone(),
                    post_ids: matched.clone(),
                },
            );
        }
    }

    result
}

/// Fold one item's result into a cross-item batch
pub fn merge_into(batch: &mut MatchBatch, result: MatchResult) {
    for (client_id, client_match) in result {
        batch.entry(client_id).or_default().push(client_match);
    }
}
