//! MongoDB implementation of ShoppingListRepository

use async_trait::async_trait;
use bson::doc;
use mongodb::{Collection, Database, options::ReturnDocument};
use tracing::instrument;

use crate::error::GoodsResult;
use crate::models::ShoppingList;
use crate::repository::ShoppingListRepository;

pub struct MongoShoppingListRepository {
    collection: Collection<ShoppingList>,
}

impl MongoShoppingListRepository {
    pub fn new(db: &Database, collection_name: &str) -> Self {
        Self {
            collection: db.collection::<ShoppingList>(collection_name),
        }
    }
}

#[async_trait]
impl ShoppingListRepository for MongoShoppingListRepository {
    #[instrument(skip(self))]
    async fn find(&self, client_id: &str) -> GoodsResult<Option<ShoppingList>> {
        Ok(self
            .collection
            .find_one(doc! { "client_id": client_id })
            .await?)
    }

    #[instrument(skip(self, list), fields(client_id = %list.client_id))]
    async fn create(&self, list: ShoppingList) -> GoodsResult<()> {
        self.collection.insert_one(&list).await?;
        tracing::info!("Shopping list created");
        Ok(())
    }

    #[instrument(skip(self, client_name))]
    async fn add_item(
        &self,
        client_id: &str,
        client_name: &str,
        item: &str,
    ) -> GoodsResult<Option<ShoppingList>> {
        let list = self
            .collection
            .find_one_and_update(
                doc! { "client_id": client_id },
                doc! {
                    "$addToSet": { "shopping_cart": { "item": item } },
                    "$set": { "client_name": client_name },
                },
            )
            .return_document(ReturnDocument::After)
            .await?;
        Ok(list)
    }

    #[instrument(skip(self))]
    async fn remove_item(&self, client_id: &str, item: &str) -> GoodsResult<()> {
        self.collection
            .update_one(
                doc! { "client_id": client_id },
                doc! { "$pull": { "shopping_cart": { "item": item } } },
            )
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn clear(&self, client_id: &str) -> GoodsResult<Option<ShoppingList>> {
        let before = self
            .collection
            .find_one_and_update(
                doc! { "client_id": client_id },
                doc! { "$set": { "shopping_cart": [] } },
            )
            .return_document(ReturnDocument::Before)
            .await?;
        Ok(before)
    }
}
