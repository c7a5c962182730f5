//! A service for interacting with items.

use super::item_repository::{
    CreateItem, DeleteItem, FetchItem, Item, ListItems, NewItem, UpdateItem,
};
use crate::infra::{
    error::{ApiResult, ClientError},
    pagination::PaginationParams,
};
use tracing::instrument;

/// Creates a new item.
#[instrument(skip(repository))]
pub async fn create_item<R: CreateItem>(repository: &mut R, new_item: NewItem) -> ApiResult<Item> {
    repository.create_item(new_item).await
}

/// Reads an item.
#[instrument(skip(repository))]
pub async fn read_item<R: FetchItem>(repository: &mut R, id: i64) -> ApiResult<Item> {
    repository
        .fetch_item(id)
        .await?
        .ok_or_else(|| ClientError::NotFound.into())
}

/// Lists a page of items.
#[instrument(skip(repository))]
pub async fn list_items<R: ListItems>(
    repository: &mut R,
    params: PaginationParams,
) -> ApiResult<Vec<Item>> {
    repository.list_items(params).await
}

/// Replaces the name and description of an item.
#[instrument(skip(repository))]
pub async fn update_item<R: UpdateItem>(
    repository: &mut R,
    id: i64,
    new_item: NewItem,
) -> ApiResult<Item> {
    repository
        .update_item(id, new_item)
        .await?
        .ok_or_else(|| ClientError::NotFound.into())
}

/// Deletes an item, returning what it was.
#[instrument(skip(repository))]
pub async fn delete_item<R: DeleteItem>(repository: &mut R, id: i64) -> ApiResult<Item> {
    repository
        .delete_item(id)
        .await?
        .ok_or_else(|| ClientError::NotFound.into())
}
