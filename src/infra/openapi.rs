//! OpenAPI configuration.

use crate::feature::{
    health::health_api,
    home::home_api,
    item::{item_api, item_repository},
};
use utoipa::OpenApi;

/// OpenApi configuration.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Item Service",
        description = "CRUD operations over items stored in a relational database."
    ),
    paths(
        home_api::root,
        health_api::db_test,
        item_api::create_item,
        item_api::get_item,
        item_api::list_items,
        item_api::update_item,
        item_api::delete_item,
    ),
    components(
        schemas(
            home_api::Status,
            health_api::DbStatus,
            item_repository::NewItem,
            item_repository::Item,
            crate::infra::error::ErrorBody
        )
    )
)]
#[derive(Clone, Copy, Debug)]
pub struct ApiDoc;
