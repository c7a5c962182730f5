//! The item API implementation.

use crate::{
    feature::item::{
        item_repository::{Item, ItemRepository, NewItem},
        item_service,
    },
    infra::{
        database::{self, DbPool},
        error::{ApiError, ApiResult, ClientError, ErrorBody},
        extract::{Json, Query},
        pagination::PaginationParams,
        state::AppState,
    },
};
use axum::{extract::State, response::Redirect, routing::any, Router};
use axum_extra::routing::{RouterExt, TypedPath};
use http::{StatusCode, Uri};
use serde::Deserialize;
use tracing::instrument;

/// The item API endpoints.
pub fn routes() -> Router<AppState> {
    Router::new()
        .typed_post(create_item)
        .typed_get(list_items)
        .typed_get(get_item)
        .typed_put(update_item)
        .typed_delete(delete_item)
        .route("/items", any(redirect_to_items))
}

#[derive(Debug, Deserialize, TypedPath)]
#[typed_path("/items/", rejection(ClientError))]
pub(crate) struct Items;

#[derive(Debug, Deserialize, TypedPath)]
#[typed_path("/items/:id", rejection(ClientError))]
pub(crate) struct ItemsId(i64);

/// Sends `/items` to `/items/`, keeping the query string.
async fn redirect_to_items(uri: Uri) -> Redirect {
    match uri.query() {
        Some(query) => Redirect::temporary(&format!("{}?{query}", Items::PATH)),
        None => Redirect::temporary(Items::PATH),
    }
}

/// Creates a new item.
#[utoipa::path(
    post,
    path = "/items/",
    request_body = NewItem,
    responses(
        (status = 201, description = "Created", body = Item),
        (status = 400, description = "Bad Request", body = ErrorBody),
    )
)]
#[instrument(skip(db))]
pub(crate) async fn create_item(
    _: Items,
    State(db): State<DbPool>,
    Json(new_item): Json<NewItem>,
) -> ApiResult<(StatusCode, Json<Item>)> {
    let result: ApiResult<Item> = async {
        let mut tx = db.begin().await?;
        let result = item_service::create_item(&mut ItemRepository::new(&mut tx), new_item).await;
        database::commit_or_rollback(tx, result).await
    }
    .await;
    let item = result.map_err(ApiError::storage_as_bad_request)?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// Gets an item.
#[utoipa::path(
    get,
    path = "/items/{id}",
    params(("id" = i64, Path, description = "The item's id")),
    responses(
        (status = 200, description = "Ok", body = Item),
        (status = 404, description = "Not Found", body = ErrorBody),
        (status = 500, description = "Internal Server Error", body = ErrorBody),
    )
)]
#[instrument(skip(db))]
pub(crate) async fn get_item(ItemsId(id): ItemsId, State(db): State<DbPool>) -> ApiResult<Json<Item>> {
    let mut tx = db.begin().await?;
    let result = item_service::read_item(&mut ItemRepository::new(&mut tx), id).await;
    let item = database::commit_or_rollback(tx, result).await?;
    Ok(Json(item))
}

/// Lists a page of items, ordered by id.
#[utoipa::path(
    get,
    path = "/items/",
    params(PaginationParams),
    responses(
        (status = 200, description = "Ok", body = [Item]),
        (status = 400, description = "Bad Request", body = ErrorBody),
        (status = 500, description = "Internal Server Error", body = ErrorBody),
    )
)]
#[instrument(skip(db))]
pub(crate) async fn list_items(
    _: Items,
    State(db): State<DbPool>,
    Query(params): Query<PaginationParams>,
) -> ApiResult<Json<Vec<Item>>> {
    let params = params.validate()?;
    let mut tx = db.begin().await?;
    let result = item_service::list_items(&mut ItemRepository::new(&mut tx), params).await;
    let items = database::commit_or_rollback(tx, result).await?;
    Ok(Json(items))
}

/// Replaces an item's name and description.
///
/// A missing description is stored as null.
#[utoipa::path(
    put,
    path = "/items/{id}",
    params(("id" = i64, Path, description = "The item's id")),
    request_body = NewItem,
    responses(
        (status = 200, description = "Ok", body = Item),
        (status = 400, description = "Bad Request", body = ErrorBody),
        (status = 404, description = "Not Found", body = ErrorBody),
    )
)]
#[instrument(skip(db))]
pub(crate) async fn update_item(
    ItemsId(id): ItemsId,
    State(db): State<DbPool>,
    Json(new_item): Json<NewItem>,
) -> ApiResult<Json<Item>> {
    let result: ApiResult<Item> = async {
        let mut tx = db.begin().await?;
        let result =
            item_service::update_item(&mut ItemRepository::new(&mut tx), id, new_item).await;
        database::commit_or_rollback(tx, result).await
    }
    .await;
    let item = result.map_err(ApiError::storage_as_bad_request)?;
    Ok(Json(item))
}

/// Deletes an item, returning what it was.
#[utoipa::path(
    delete,
    path = "/items/{id}",
    params(("id" = i64, Path, description = "The item's id")),
    responses(
        (status = 200, description = "Ok", body = Item),
        (status = 404, description = "Not Found", body = ErrorBody),
        (status = 500, description = "Internal Server Error", body = ErrorBody),
    )
)]
#[instrument(skip(db))]
pub(crate) async fn delete_item(
    ItemsId(id): ItemsId,
    State(db): State<DbPool>,
) -> ApiResult<Json<Item>> {
    let mut tx = db.begin().await?;
    let result = item_service::delete_item(&mut ItemRepository::new(&mut tx), id).await;
    let item = database::commit_or_rollback(tx, result).await?;
    Ok(Json(item))
}

#[cfg(test)]
mod tests {
    use crate::{
        app::{test_app, unreachable_db},
        feature::item::item_repository::Item,
        infra::{database::DbPool, error::ErrorBody},
    };
    use axum::{body::Body, Router};
    use http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use serde::de::DeserializeOwned;
    use tower::ServiceExt;

    async fn send<T: DeserializeOwned>(app: &Router, req: Request<Body>) -> (StatusCode, T) {
        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let body = res.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&body).unwrap())
    }

    fn json(method: &str, uri: &str, body: &'static str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("Content-Type", "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    fn empty(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn create_without_name_is_bad_request() {
        let app = test_app(unreachable_db());
        let (status, body): (_, ErrorBody) =
            send(&app, json("POST", "/items/", r#"{"description": "d"}"#)).await;
        assert_eq!(StatusCode::BAD_REQUEST, status);
        assert!(body.detail().contains("name"));
    }

    #[tokio::test]
    async fn non_integer_id_is_bad_request() {
        let app = test_app(unreachable_db());
        let (status, _): (_, ErrorBody) = send(&app, empty("GET", "/items/abc")).await;
        assert_eq!(StatusCode::BAD_REQUEST, status);
    }

    #[tokio::test]
    async fn negative_limit_is_bad_request() {
        let app = test_app(unreachable_db());
        let (status, _): (_, ErrorBody) = send(&app, empty("GET", "/items/?limit=-1")).await;
        assert_eq!(StatusCode::BAD_REQUEST, status);
    }

    #[tokio::test]
    async fn negative_skip_is_bad_request() {
        let app = test_app(unreachable_db());
        let (status, body): (_, ErrorBody) = send(&app, empty("GET", "/items/?skip=-1")).await;
        assert_eq!(StatusCode::BAD_REQUEST, status);
        assert_eq!("skip must not be negative", body.detail());
    }

    #[tokio::test]
    async fn items_without_slash_redirects() {
        let app = test_app(unreachable_db());
        let res = app
            .clone()
            .oneshot(empty("GET", "/items?skip=1&limit=2"))
            .await
            .unwrap();
        assert_eq!(StatusCode::TEMPORARY_REDIRECT, res.status());
        assert_eq!("/items/?skip=1&limit=2", res.headers()["location"]);

        let res = app.oneshot(empty("POST", "/items")).await.unwrap();
        assert_eq!(StatusCode::TEMPORARY_REDIRECT, res.status());
        assert_eq!("/items/", res.headers()["location"]);
    }

    #[tokio::test]
    async fn unreachable_storage_is_internal_error() {
        let app = test_app(unreachable_db());
        let (status, body): (_, ErrorBody) = send(&app, empty("GET", "/items/1")).await;
        assert_eq!(StatusCode::INTERNAL_SERVER_ERROR, status);
        assert_eq!("internal error", body.detail());
    }

    #[tokio::test]
    async fn unreachable_storage_on_create_is_bad_request() {
        let app = test_app(unreachable_db());
        let (status, _): (_, ErrorBody) =
            send(&app, json("POST", "/items/", r#"{"name": "a"}"#)).await;
        assert_eq!(StatusCode::BAD_REQUEST, status);
    }

    #[sqlx::test(migrations = false)]
    async fn crud_lifecycle(db: DbPool) {
        crate::infra::database::ensure_schema(&db).await.unwrap();
        let app = test_app(db);
        let created = Item {
            id: 1,
            name: "a".to_string(),
            description: None,
        };

        let (status, item): (_, Item) = send(&app, json("POST", "/items/", r#"{"name": "a"}"#)).await;
        assert_eq!(StatusCode::CREATED, status);
        assert_eq!(created, item);

        let (status, item): (_, Item) = send(&app, empty("GET", "/items/1")).await;
        assert_eq!(StatusCode::OK, status);
        assert_eq!(created, item);

        let (status, item): (_, Item) = send(
            &app,
            json("PUT", "/items/1", r#"{"name": "b", "description": "d"}"#),
        )
        .await;
        assert_eq!(StatusCode::OK, status);
        let updated = Item {
            id: 1,
            name: "b".to_string(),
            description: Some("d".to_string()),
        };
        assert_eq!(updated, item);

        let (status, item): (_, Item) = send(&app, empty("DELETE", "/items/1")).await;
        assert_eq!(StatusCode::OK, status);
        assert_eq!(updated, item);

        let (status, body): (_, ErrorBody) = send(&app, empty("GET", "/items/1")).await;
        assert_eq!(StatusCode::NOT_FOUND, status);
        assert_eq!("Item not found", body.detail());

        let (status, _): (_, ErrorBody) = send(&app, empty("DELETE", "/items/1")).await;
        assert_eq!(StatusCode::NOT_FOUND, status);
    }

    #[sqlx::test(migrations = false)]
    async fn put_without_description_clears_it(db: DbPool) {
        crate::infra::database::ensure_schema(&db).await.unwrap();
        let app = test_app(db);
        let (_, item): (_, Item) = send(
            &app,
            json("POST", "/items/", r#"{"name": "a", "description": "d"}"#),
        )
        .await;

        let uri = format!("/items/{}", item.id);
        let req = Request::put(uri.as_str())
            .header("Content-Type", "application/json")
            .body(Body::from(r#"{"name": "b"}"#))
            .unwrap();
        let (status, item): (_, Item) = send(&app, req).await;
        assert_eq!(StatusCode::OK, status);
        assert_eq!(None, item.description);

        let (status, _): (_, ErrorBody) =
            send(&app, json("PUT", "/items/999", r#"{"name": "b"}"#)).await;
        assert_eq!(StatusCode::NOT_FOUND, status);
    }

    #[sqlx::test(migrations = false)]
    async fn list_pages_partition_items(db: DbPool) {
        crate::infra::database::ensure_schema(&db).await.unwrap();
        let app = test_app(db);
        for body in [r#"{"name": "a"}"#, r#"{"name": "b"}"#] {
            let (status, _): (_, Item) = send(&app, json("POST", "/items/", body)).await;
            assert_eq!(StatusCode::CREATED, status);
        }

        let (status, first): (_, Vec<Item>) =
            send(&app, empty("GET", "/items/?skip=0&limit=1")).await;
        assert_eq!(StatusCode::OK, status);
        let (_, second): (_, Vec<Item>) = send(&app, empty("GET", "/items/?skip=1&limit=1")).await;
        assert_eq!(1, first.len());
        assert_eq!(1, second.len());
        assert_eq!("a", first[0].name);
        assert_eq!("b", second[0].name);

        let (_, all): (_, Vec<Item>) = send(&app, empty("GET", "/items/")).await;
        assert_eq!(2, all.len());
    }

    #[sqlx::test(migrations = false)]
    async fn huge_pagination_values_are_accepted(db: DbPool) {
        crate::infra::database::ensure_schema(&db).await.unwrap();
        let app = test_app(db);
        let (status, _): (_, Item) = send(&app, json("POST", "/items/", r#"{"name": "a"}"#)).await;
        assert_eq!(StatusCode::CREATED, status);

        let (status, items): (_, Vec<Item>) =
            send(&app, empty("GET", "/items/?limit=5000000000")).await;
        assert_eq!(StatusCode::OK, status);
        assert_eq!(1, items.len());

        let (status, items): (_, Vec<Item>) =
            send(&app, empty("GET", "/items/?skip=5000000000")).await;
        assert_eq!(StatusCode::OK, status);
        assert!(items.is_empty());
    }

    #[sqlx::test(migrations = false)]
    async fn storage_errors_on_writes_are_bad_request(db: DbPool) {
        crate::infra::database::ensure_schema(&db).await.unwrap();
        let app = test_app(db);
        let original = Item {
            id: 1,
            name: "a".to_string(),
            description: None,
        };
        let (status, item): (_, Item) = send(&app, json("POST", "/items/", r#"{"name": "a"}"#)).await;
        assert_eq!(StatusCode::CREATED, status);
        assert_eq!(original, item);

        // PostgreSQL refuses NUL bytes in text columns.
        let (status, body): (_, ErrorBody) =
            send(&app, json("PUT", "/items/1", r#"{"name": "x\u0000"}"#)).await;
        assert_eq!(StatusCode::BAD_REQUEST, status);
        assert!(body.detail().starts_with("storage error"));

        let (status, item): (_, Item) = send(&app, empty("GET", "/items/1")).await;
        assert_eq!(StatusCode::OK, status);
        assert_eq!(original, item);

        let (status, body): (_, ErrorBody) =
            send(&app, json("POST", "/items/", r#"{"name": "a\u0000b"}"#)).await;
        assert_eq!(StatusCode::BAD_REQUEST, status);
        assert!(body.detail().starts_with("storage error"));

        let (_, all): (_, Vec<Item>) = send(&app, empty("GET", "/items/")).await;
        assert_eq!(vec![original], all);
    }
}
