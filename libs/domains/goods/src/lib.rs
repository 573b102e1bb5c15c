//! Goods Domain
//!
//! Marketplace goods, client shopping lists, and the subscriber/post matcher
//! that decides which posts each client has not seen yet.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │   Service   │  ← ingest, search, refresh, match, cart operations
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐     ┌─────────────┐
//! │ Repository  │     │   Matcher   │  ← pure, synchronous
//! └──────┬──────┘     └─────────────┘
//!        │
//! ┌──────▼──────┐
//! │   MongoDB   │  ← goods / item_info / shopping list collections
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_goods::{GoodsConfig, mongodb};
//!
//! # async fn run(db: &::mongodb::Database) -> domain_goods::GoodsResult<()> {
//! let service = mongodb::service(db, GoodsConfig::default());
//!
//! service.refresh_item_info().await?;
//! let report = service.match_all().await?;
//! println!("{} clients to notify", report.notifications.len());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod matcher;
pub mod models;
pub mod mongodb;
pub mod repository;
pub mod service;

// Re-export commonly used types
pub use config::GoodsConfig;
pub use error::{GoodsError, GoodsResult};
pub use matcher::{ClientMatch, MatchBatch, MatchResult, match_item};
pub use models::{
    AddOutcome, CartEntry, Good, GoodMatch, IngestReport, ItemDocument, NewGood, Post,
    RefreshReport, RemoveOutcome, RemoveSelection, SearchResult, ShoppingList, Subscriber,
};
pub use self::mongodb::{
    MongoGoodsRepository, MongoGoodsService, MongoItemInfoRepository, MongoShoppingListRepository,
};
pub use repository::{GoodsRepository, ItemInfoRepository, ShoppingListRepository};
pub use service::{GoodsService, MatchReport};
