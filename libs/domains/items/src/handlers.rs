use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::get,
};
use axum_helpers::{
    AuditEvent, AuditOutcome, UuidPath, ValidatedJson, ValidatedQuery,
    errors::responses::{
        BadRequestUuidResponse, BadRequestValidationResponse, ConflictResponse,
        InternalServerErrorResponse, NotFoundResponse,
    },
    extract_ip_from_headers, extract_user_agent,
};
use serde_json::json;
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::ItemResult;
use crate::models::{
    AddPhotos, CreateItem, DeletePhotos, Item, ItemDetails, ItemFilter, ItemPhoto, ItemSummary,
    PhotoCount, UpdateItem,
};
use crate::repository::ItemRepository;
use crate::service::ItemService;

const TAG: &str = "items";

#[derive(OpenApi)]
#[openapi(
    paths(
        list_items,
        create_item,
        get_item,
        update_item,
        delete_item,
        list_items_by_location,
        list_items_by_category,
        list_photos,
        add_photos,
        delete_photos,
        count_photos,
    ),
    components(
        schemas(
            Item,
            ItemSummary,
            ItemDetails,
            ItemPhoto,
            CreateItem,
            UpdateItem,
            ItemFilter,
            AddPhotos,
            DeletePhotos,
            PhotoCount
        ),
        responses(
            NotFoundResponse,
            BadRequestValidationResponse,
            BadRequestUuidResponse,
            ConflictResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = TAG, description = "Rental listings and their photos")
    )
)]
pub struct ApiDoc;

pub fn router<R: ItemRepository + 'static>(service: ItemService<R>) -> Router {
    Router::new()
        .route("/", get(list_items).post(create_item))
        .route("/location/{location}", get(list_items_by_location))
        .route("/category/{category_id}", get(list_items_by_category))
        .route(
            "/{id}",
            get(get_item).put(update_item).delete(delete_item),
        )
        .route(
            "/{id}/photos",
            get(list_photos).post(add_photos).delete(delete_photos),
        )
        .route("/{id}/photos/count", get(count_photos))
        .with_state(Arc::new(service))
}

fn audit(action: &str, id: uuid::Uuid, headers: &HeaderMap) -> AuditEvent {
    AuditEvent::new(action, Some(format!("item:{}", id)), AuditOutcome::Success)
        .with_ip(extract_ip_from_headers(headers))
        .with_user_agent(extract_user_agent(headers))
}

/// List items, newest first
#[utoipa::path(
    get,
    path = "",
    tag = TAG,
    params(ItemFilter),
    responses(
        (status = 200, description = "Matching items", body = Vec<ItemSummary>),
        (status = 400, response = BadRequestValidationResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_items<R: ItemRepository>(
    State(service): State<Arc<ItemService<R>>>,
    ValidatedQuery(filter): ValidatedQuery<ItemFilter>,
) -> ItemResult<Json<Vec<ItemSummary>>> {
    let items = service.list_items(filter).await?;
    Ok(Json(items))
}

/// Create an item, optionally with photos
#[utoipa::path(
    post,
    path = "",
    tag = TAG,
    request_body = CreateItem,
    responses(
        (status = 201, description = "Item created", body = ItemDetails),
        (status = 400, response = BadRequestValidationResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn create_item<R: ItemRepository>(
    State(service): State<Arc<ItemService<R>>>,
    headers: HeaderMap,
    ValidatedJson(input): ValidatedJson<CreateItem>,
) -> ItemResult<impl IntoResponse> {
    let details = service.create_item(input).await?;

    audit("item.create", details.item.id, &headers)
        .with_actor(Some(details.item.author_id.to_string()))
        .with_details(json!({
            "title": details.item.title,
            "price": details.item.price,
            "photos": details.photos.len(),
        }))
        .log();

    Ok((StatusCode::CREATED, Json(details)))
}

/// Get an item with its photos and category
#[utoipa::path(
    get,
    path = "/{id}",
    tag = TAG,
    params(
        ("id" = Uuid, Path, description = "Item ID")
    ),
    responses(
        (status = 200, description = "Item found", body = ItemDetails),
        (status = 400, response = BadRequestUuidResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_item<R: ItemRepository>(
    State(service): State<Arc<ItemService<R>>>,
    UuidPath(id): UuidPath,
) -> ItemResult<Json<ItemDetails>> {
    let details = service.get_item(id).await?;
    Ok(Json(details))
}

/// Partially update an item, optionally adding and removing photos
#[utoipa::path(
    put,
    path = "/{id}",
    tag = TAG,
    params(
        ("id" = Uuid, Path, description = "Item ID")
    ),
    request_body = UpdateItem,
    responses(
        (status = 200, description = "Item updated", body = ItemDetails),
        (status = 400, response = BadRequestValidationResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn update_item<R: ItemRepository>(
    State(service): State<Arc<ItemService<R>>>,
    headers: HeaderMap,
    UuidPath(id): UuidPath,
    ValidatedJson(input): ValidatedJson<UpdateItem>,
) -> ItemResult<Json<ItemDetails>> {
    let photos_added = input.photos_to_add.len();
    let photos_deleted = input.photo_ids_to_delete.len();
    let details = service.update_item(id, input).await?;

    audit("item.update", id, &headers)
        .with_details(json!({
            "photos_added": photos_added,
            "photos_deleted": photos_deleted,
            "has_photos": details.item.has_photos,
        }))
        .log();

    Ok(Json(details))
}

/// Delete an item and its photos
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = TAG,
    params(
        ("id" = Uuid, Path, description = "Item ID")
    ),
    responses(
        (status = 204, description = "Item deleted"),
        (status = 400, response = BadRequestUuidResponse),
        (status = 404, response = NotFoundResponse),
        (status = 409, response = ConflictResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn delete_item<R: ItemRepository>(
    State(service): State<Arc<ItemService<R>>>,
    headers: HeaderMap,
    UuidPath(id): UuidPath,
) -> ItemResult<impl IntoResponse> {
    service.delete_item(id).await?;
    audit("item.delete", id, &headers).log();
    Ok(StatusCode::NO_CONTENT)
}

/// List items whose location contains the given text
#[utoipa::path(
    get,
    path = "/location/{location}",
    tag = TAG,
    params(
        ("location" = String, Path, description = "Location substring"),
        ItemFilter
    ),
    responses(
        (status = 200, description = "Matching items", body = Vec<ItemSummary>),
        (status = 400, response = BadRequestValidationResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_items_by_location<R: ItemRepository>(
    State(service): State<Arc<ItemService<R>>>,
    Path(location): Path<String>,
    ValidatedQuery(filter): ValidatedQuery<ItemFilter>,
) -> ItemResult<Json<Vec<ItemSummary>>> {
    let items = service.list_by_location(location, filter).await?;
    Ok(Json(items))
}

/// List items in a category
#[utoipa::path(
    get,
    path = "/category/{category_id}",
    tag = TAG,
    params(
        ("category_id" = Uuid, Path, description = "Category ID"),
        ItemFilter
    ),
    responses(
        (status = 200, description = "Matching items", body = Vec<ItemSummary>),
        (status = 400, response = BadRequestUuidResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_items_by_category<R: ItemRepository>(
    State(service): State<Arc<ItemService<R>>>,
    UuidPath(category_id): UuidPath,
    ValidatedQuery(filter): ValidatedQuery<ItemFilter>,
) -> ItemResult<Json<Vec<ItemSummary>>> {
    let items = service.list_by_category(category_id, filter).await?;
    Ok(Json(items))
}

/// List an item's photos, oldest first
#[utoipa::path(
    get,
    path = "/{id}/photos",
    tag = TAG,
    params(
        ("id" = Uuid, Path, description = "Item ID")
    ),
    responses(
        (status = 200, description = "Photos", body = Vec<ItemPhoto>),
        (status = 400, response = BadRequestUuidResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_photos<R: ItemRepository>(
    State(service): State<Arc<ItemService<R>>>,
    UuidPath(id): UuidPath,
) -> ItemResult<Json<Vec<ItemPhoto>>> {
    let photos = service.list_photos(id).await?;
    Ok(Json(photos))
}

/// Add photos; `has_photos` is recomputed in the same transaction
#[utoipa::path(
    post,
    path = "/{id}/photos",
    tag = TAG,
    params(
        ("id" = Uuid, Path, description = "Item ID")
    ),
    request_body = AddPhotos,
    responses(
        (status = 200, description = "Item after the change", body = ItemDetails),
        (status = 400, response = BadRequestValidationResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn add_photos<R: ItemRepository>(
    State(service): State<Arc<ItemService<R>>>,
    headers: HeaderMap,
    UuidPath(id): UuidPath,
    ValidatedJson(input): ValidatedJson<AddPhotos>,
) -> ItemResult<Json<ItemDetails>> {
    let requested = input.urls.len();
    let details = service.add_photos(id, input).await?;

    audit("item.photos.add", id, &headers)
        .with_details(json!({ "added": requested, "total": details.photos.len() }))
        .log();

    Ok(Json(details))
}

/// Delete photos by id; ids of other items' photos are ignored
#[utoipa::path(
    delete,
    path = "/{id}/photos",
    tag = TAG,
    params(
        ("id" = Uuid, Path, description = "Item ID")
    ),
    request_body = DeletePhotos,
    responses(
        (status = 200, description = "Item after the change", body = ItemDetails),
        (status = 400, response = BadRequestValidationResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn delete_photos<R: ItemRepository>(
    State(service): State<Arc<ItemService<R>>>,
    headers: HeaderMap,
    UuidPath(id): UuidPath,
    ValidatedJson(input): ValidatedJson<DeletePhotos>,
) -> ItemResult<Json<ItemDetails>> {
    let requested = input.photo_ids.len();
    let details = service.delete_photos(id, input).await?;

    audit("item.photos.delete", id, &headers)
        .with_details(json!({ "requested": requested, "remaining": details.photos.len() }))
        .log();

    Ok(Json(details))
}

/// Count an item's photos
#[utoipa::path(
    get,
    path = "/{id}/photos/count",
    tag = TAG,
    params(
        ("id" = Uuid, Path, description = "Item ID")
    ),
    responses(
        (status = 200, description = "Photo count", body = PhotoCount),
        (status = 400, response = BadRequestUuidResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn count_photos<R: ItemRepository>(
    State(service): State<Arc<ItemService<R>>>,
    UuidPath(id): UuidPath,
) -> ItemResult<Json<PhotoCount>> {
    let count = service.count_photos(id).await?;
    Ok(Json(count))
}
