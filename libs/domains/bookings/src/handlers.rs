use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
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

use crate::error::BookingResult;
use crate::models::{Booking, BookingFilter, BookingStatus, CreateBooking, UpdateBooking};
use crate::repository::BookingRepository;
use crate::service::BookingService;

const TAG: &str = "bookings";

#[derive(OpenApi)]
#[openapi(
    paths(
        list_bookings,
        create_booking,
        list_available,
        list_by_item,
        list_by_user,
        get_booking,
        update_booking,
        delete_booking,
        confirm_booking,
        cancel_booking,
    ),
    components(
        schemas(Booking, BookingStatus, CreateBooking, UpdateBooking, BookingFilter),
        responses(
            NotFoundResponse,
            BadRequestValidationResponse,
            BadRequestUuidResponse,
            ConflictResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = TAG, description = "Item reservations")
    )
)]
pub struct ApiDoc;

pub fn router<R: BookingRepository + 'static>(service: BookingService<R>) -> Router {
    Router::new()
        .route("/", get(list_bookings).post(create_booking))
        .route("/available", get(list_available))
        .route("/item/{item_id}", get(list_by_item))
        .route("/user/{user_id}", get(list_by_user))
        .route(
            "/{id}",
            get(get_booking).put(update_booking).delete(delete_booking),
        )
        .route("/{id}/confirm", post(confirm_booking))
        .route("/{id}/cancel", post(cancel_booking))
        .with_state(Arc::new(service))
}

fn audit(action: &str, id: uuid::Uuid, headers: &HeaderMap) -> AuditEvent {
    AuditEvent::new(action, Some(format!("booking:{}", id)), AuditOutcome::Success)
        .with_ip(extract_ip_from_headers(headers))
        .with_user_agent(extract_user_agent(headers))
}

/// List bookings, newest first
#[utoipa::path(
    get,
    path = "",
    tag = TAG,
    params(BookingFilter),
    responses(
        (status = 200, description = "Matching bookings", body = Vec<Booking>),
        (status = 400, response = BadRequestValidationResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_bookings<R: BookingRepository>(
    State(service): State<Arc<BookingService<R>>>,
    ValidatedQuery(filter): ValidatedQuery<BookingFilter>,
) -> BookingResult<Json<Vec<Booking>>> {
    let bookings = service.list_bookings(filter).await?;
    Ok(Json(bookings))
}

/// Book an item for a period
#[utoipa::path(
    post,
    path = "",
    tag = TAG,
    request_body = CreateBooking,
    responses(
        (status = 201, description = "Booking created", body = Booking),
        (status = 400, response = BadRequestValidationResponse),
        (status = 404, response = NotFoundResponse),
        (status = 409, response = ConflictResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn create_booking<R: BookingRepository>(
    State(service): State<Arc<BookingService<R>>>,
    headers: HeaderMap,
    ValidatedJson(input): ValidatedJson<CreateBooking>,
) -> BookingResult<impl IntoResponse> {
    let booking = service.create_booking(input).await?;

    audit("booking.create", booking.id, &headers)
        .with_actor(Some(booking.user_id.to_string()))
        .with_details(json!({
            "item_id": booking.item_id,
            "start_date": booking.start_date,
            "end_date": booking.end_date,
        }))
        .log();

    Ok((StatusCode::CREATED, Json(booking)))
}

/// Bookings that have not ended yet, by start date
#[utoipa::path(
    get,
    path = "/available",
    tag = TAG,
    responses(
        (status = 200, description = "Bookings ending in the future", body = Vec<Booking>),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_available<R: BookingRepository>(
    State(service): State<Arc<BookingService<R>>>,
) -> BookingResult<Json<Vec<Booking>>> {
    let bookings = service.list_available().await?;
    Ok(Json(bookings))
}

/// All bookings of an item, by start date
#[utoipa::path(
    get,
    path = "/item/{item_id}",
    tag = TAG,
    params(
        ("item_id" = Uuid, Path, description = "Item ID")
    ),
    responses(
        (status = 200, description = "Bookings of the item", body = Vec<Booking>),
        (status = 400, response = BadRequestUuidResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_by_item<R: BookingRepository>(
    State(service): State<Arc<BookingService<R>>>,
    UuidPath(item_id): UuidPath,
) -> BookingResult<Json<Vec<Booking>>> {
    let bookings = service.list_by_item(item_id).await?;
    Ok(Json(bookings))
}

/// All bookings of a user, by start date
#[utoipa::path(
    get,
    path = "/user/{user_id}",
    tag = TAG,
    params(
        ("user_id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Bookings of the user", body = Vec<Booking>),
        (status = 400, response = BadRequestUuidResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_by_user<R: BookingRepository>(
    State(service): State<Arc<BookingService<R>>>,
    UuidPath(user_id): UuidPath,
) -> BookingResult<Json<Vec<Booking>>> {
    let bookings = service.list_by_user(user_id).await?;
    Ok(Json(bookings))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = TAG,
    params(
        ("id" = Uuid, Path, description = "Booking ID")
    ),
    responses(
        (status = 200, description = "Booking found", body = Booking),
        (status = 400, response = BadRequestUuidResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_booking<R: BookingRepository>(
    State(service): State<Arc<BookingService<R>>>,
    UuidPath(id): UuidPath,
) -> BookingResult<Json<Booking>> {
    let booking = service.get_booking(id).await?;
    Ok(Json(booking))
}

/// Move a booking to new dates
#[utoipa::path(
    put,
    path = "/{id}",
    tag = TAG,
    params(
        ("id" = Uuid, Path, description = "Booking ID")
    ),
    request_body = UpdateBooking,
    responses(
        (status = 200, description = "Booking updated", body = Booking),
        (status = 400, response = BadRequestValidationResponse),
        (status = 404, response = NotFoundResponse),
        (status = 409, response = ConflictResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn update_booking<R: BookingRepository>(
    State(service): State<Arc<BookingService<R>>>,
    headers: HeaderMap,
    UuidPath(id): UuidPath,
    ValidatedJson(input): ValidatedJson<UpdateBooking>,
) -> BookingResult<Json<Booking>> {
    let booking = service.update_booking(id, input).await?;

    audit("booking.update", id, &headers)
        .with_details(json!({
            "start_date": booking.start_date,
            "end_date": booking.end_date,
        }))
        .log();

    Ok(Json(booking))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = TAG,
    params(
        ("id" = Uuid, Path, description = "Booking ID")
    ),
    responses(
        (status = 204, description = "Booking deleted"),
        (status = 400, response = BadRequestUuidResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn delete_booking<R: BookingRepository>(
    State(service): State<Arc<BookingService<R>>>,
    headers: HeaderMap,
    UuidPath(id): UuidPath,
) -> BookingResult<impl IntoResponse> {
    service.delete_booking(id).await?;
    audit("booking.delete", id, &headers).log();
    Ok(StatusCode::NO_CONTENT)
}

/// Confirm a pending booking; confirming twice is a no-op
#[utoipa::path(
    post,
    path = "/{id}/confirm",
    tag = TAG,
    params(
        ("id" = Uuid, Path, description = "Booking ID")
    ),
    responses(
        (status = 200, description = "Booking confirmed", body = Booking),
        (status = 400, response = BadRequestValidationResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn confirm_booking<R: BookingRepository>(
    State(service): State<Arc<BookingService<R>>>,
    headers: HeaderMap,
    UuidPath(id): UuidPath,
) -> BookingResult<Json<Booking>> {
    let booking = service.confirm_booking(id).await?;
    audit("booking.confirm", id, &headers).log();
    Ok(Json(booking))
}

/// Cancel a booking and free its period
#[utoipa::path(
    post,
    path = "/{id}/cancel",
    tag = TAG,
    params(
        ("id" = Uuid, Path, description = "Booking ID")
    ),
    responses(
        (status = 200, description = "Booking cancelled", body = Booking),
        (status = 400, response = BadRequestUuidResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn cancel_booking<R: BookingRepository>(
    State(service): State<Arc<BookingService<R>>>,
    headers: HeaderMap,
    UuidPath(id): UuidPath,
) -> BookingResult<Json<Booking>> {
    let booking = service.cancel_booking(id).await?;
    audit("booking.cancel", id, &headers).log();
    Ok(Json(booking))
}
