//! MongoDB implementations of the goods repositories

mod goods;
mod item_info;
mod shopping_list;

pub use goods::MongoGoodsRepository;
pub use item_info::MongoItemInfoRepository;
pub use shopping_list::MongoShoppingListRepository;

use mongodb::Database;

use crate::config::GoodsConfig;
use crate::service::GoodsService;

/// The service wired to MongoDB repositories
pub type MongoGoodsService =
    GoodsService<MongoGoodsRepository, MongoItemInfoRepository, MongoShoppingListRepository>;

/// Build a [`MongoGoodsService`] over the collections named in `config`
pub fn service(db: &Database, config: GoodsConfig) -> MongoGoodsService {
    GoodsService::new(
        MongoGoodsRepository::new(db, &config.goods_collection),
        MongoItemInfoRepository::new(db, &config.item_info_collection),
        MongoShoppingListRepository::new(db, &config.shopping_list_collection),
        config,
    )
}
