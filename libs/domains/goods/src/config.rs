use core_config::{ConfigError, FromEnv, env_or_default, env_parse_or};
use std::time::Duration;

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Collection names and limits for the goods domain
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GoodsConfig {
    pub goods_collection: String,
    pub item_info_collection: String,
    pub shopping_list_collection: String,
    /// Goods expire this many days after ingest
    pub goods_ttl_days: u64,
    /// Maximum entries per shopping list
    pub cart_item_limit: usize,
}

impl GoodsConfig {
    pub fn goods_ttl(&self) -> Duration {
        Duration::from_secs(self.goods_ttl_days * SECONDS_PER_DAY)
    }
}

impl Default for GoodsConfig {
    fn default() -> Self {
        Self {
            goods_collection: "EZBuyGoods".to_string(),
            item_info_collection: "item_info".to_string(),
            shopping_list_collection: "user_info".to_string(),
            goods_ttl_days: 14,
            cart_item_limit: 9,
        }
    }
}

/// Environment variables (all optional):
/// - `GOODS_COLLECTION` (default: EZBuyGoods)
/// - `ITEM_INFO_COLLECTION` (default: item_info)
/// - `SHOPPING_LIST_COLLECTION` (default: user_info)
/// - `GOODS_TTL_DAYS` (default: 14, must be positive)
/// - `CART_ITEM_LIMIT` (default: 9, must be positive)
impl FromEnv for GoodsConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let goods_ttl_days = env_parse_or("GOODS_TTL_DAYS", defaults.goods_ttl_days)?;
        if goods_ttl_days == 0 {
            return Err(ConfigError::InvalidValue {
                key: "GOODS_TTL_DAYS".to_string(),
                details: "must be at least 1".to_string(),
            });
        }

        let cart_item_limit = env_parse_or("CART_ITEM_LIMIT", defaults.cart_item_limit)?;
        if cart_item_limit == 0 {
            return Err(ConfigError::InvalidValue {
                key: "CART_ITEM_LIMIT".to_string(),
                details: "must be at least 1".to_string(),
            });
        }

        Ok(Self {
            goods_collection: env_or_default("GOODS_COLLECTION", &defaults.goods_collection),
            item_info_collection: env_or_default(
                "ITEM_INFO_COLLECTION",
                &defaults.item_info_collection,
            ),
            shopping_list_collection: env_or_default(
                "SHOPPING_LIST_COLLECTION",
                &defaults.shopping_list_collection,
            ),
            goods_ttl_days,
            cart_item_limit,
        })
    }
}
