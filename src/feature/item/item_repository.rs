//! Types and functions for storing and loading items from the database.

use crate::infra::{database::Tx, error::ApiResult, pagination::PaginationParams};
use serde::{Deserialize, Serialize};
use tracing::{instrument, Instrument};
use utoipa::ToSchema;

/// A new item, or the replacement values of an existing one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct NewItem {
    /// The item's name.
    #[schema(example = "MyItem")]
    pub name: String,
    /// The item's description.
    #[schema(example = "A very interesting item")]
    #[serde(default)]
    pub description: Option<String>,
}

/// An existing item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct Item {
    /// The item's id.
    pub id: i64,
    #[schema(example = "MyItem")]
    /// The item's name.
    pub name: String,
    #[schema(example = "A very interesting item")]
    /// The item's description.
    pub description: Option<String>,
}

/// Anything that can create an item.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CreateItem {
    /// Creates a new item.
    async fn create_item(&mut self, new_item: NewItem) -> ApiResult<Item>;
}

/// Anything that can fetch an item.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait FetchItem {
    /// Fetches an item.
    async fn fetch_item(&mut self, id: i64) -> ApiResult<Option<Item>>;
}

/// Anything that can list items.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ListItems {
    /// Lists a page of items, ordered by id.
    async fn list_items(&mut self, params: PaginationParams) -> ApiResult<Vec<Item>>;
}

/// Anything that can replace an item.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait UpdateItem {
    /// Overwrites every field of an item, returning `None` if it does not exist.
    async fn update_item(&mut self, id: i64, new_item: NewItem) -> ApiResult<Option<Item>>;
}

/// Anything that can delete an item.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait DeleteItem {
    /// Deletes an item, returning what it was, or `None` if it did not exist.
    async fn delete_item(&mut self, id: i64) -> ApiResult<Option<Item>>;
}

/// An item repository.
#[derive(Debug)]
pub struct ItemRepository<E> {
    executor: E,
}

impl<E> ItemRepository<E> {
    /// Creates a new repository.
    pub fn new(executor: E) -> Self {
        Self { executor }
    }
}

#[async_trait::async_trait]
impl<'t> CreateItem for ItemRepository<&'t mut Tx> {
    #[instrument(skip(self))]
    async fn create_item(&mut self, new_item: NewItem) -> ApiResult<Item> {
        tracing::info!("Creating item {:?}", new_item);
        let item = sqlx::query_as::<_, Item>(
            r#"
                INSERT INTO items (name, description)
                VALUES ($1, $2)
                RETURNING id, name, description
            "#,
        )
        .bind(new_item.name)
        .bind(new_item.description)
        .fetch_one(&mut **self.executor)
        .instrument(tracing::info_span!("fetch_one"))
        .await?;
        tracing::info!("Created item {:?}", item);
        Ok(item)
    }
}

#[async_trait::async_trait]
impl<'t> FetchItem for ItemRepository<&'t mut Tx> {
    #[instrument(skip(self))]
    async fn fetch_item(&mut self, id: i64) -> ApiResult<Option<Item>> {
        tracing::info!("Reading item");
        let item = sqlx::query_as::<_, Item>(
            r#"
                SELECT id, name, description FROM items
                WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut **self.executor)
        .instrument(tracing::info_span!("fetch_optional"))
        .await?;
        tracing::info!("Found item: {:?}", item);
        Ok(item)
    }
}

#[async_trait::async_trait]
impl<'t> ListItems for ItemRepository<&'t mut Tx> {
    #[instrument(skip(self))]
    async fn list_items(&mut self, params: PaginationParams) -> ApiResult<Vec<Item>> {
        tracing::info!("Listing items");
        let items = sqlx::query_as::<_, Item>(
            r#"
                SELECT id, name, description FROM items
                ORDER BY id
                LIMIT $1
                OFFSET $2
            "#,
        )
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(&mut **self.executor)
        .instrument(tracing::info_span!("fetch_all"))
        .await?;
        tracing::info!("Listed {} items", items.len());
        Ok(items)
    }
}

#[async_trait::async_trait]
impl<'t> UpdateItem for ItemRepository<&'t mut Tx> {
    #[instrument(skip(self))]
    async fn update_item(&mut self, id: i64, new_item: NewItem) -> ApiResult<Option<Item>> {
        tracing::info!("Updating item");
        let item = sqlx::query_as::<_, Item>(
            r#"
                UPDATE items
                SET name = $1, description = $2
                WHERE id = $3
                RETURNING id, name, description
            "#,
        )
        .bind(new_item.name)
        .bind(new_item.description)
        .bind(id)
        .fetch_optional(&mut **self.executor)
        .instrument(tracing::info_span!("fetch_optional"))
        .await?;
        match &item {
            Some(item) => tracing::info!("Updated item {:?}", item),
            None => tracing::warn!("Item not found"),
        }
        Ok(item)
    }
}

#[async_trait::async_trait]
impl<'t> DeleteItem for ItemRepository<&'t mut Tx> {
    #[instrument(skip(self))]
    async fn delete_item(&mut self, id: i64) -> ApiResult<Option<Item>> {
        tracing::info!("Deleting item");
        let item = sqlx::query_as::<_, Item>(
            r#"
                DELETE FROM items
                WHERE id = $1
                RETURNING id, name, description
            "#,
        )
        .bind(id)
        .fetch_optional(&mut **self.executor)
        .instrument(tracing::info_span!("fetch_optional"))
        .await?;
        match &item {
            Some(item) => tracing::info!("Deleted item {:?}", item),
            None => tracing::warn!("Item not found"),
        }
        Ok(item)
    }
}
