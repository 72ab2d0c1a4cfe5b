//! Booking endpoints.

use crate::dto::{DEFAULT_LIMIT, ListBookingsParams, ListResponse, page};
use crate::error::AppError;
use crate::extractors::{ApiPath, ApiQuery};
use crate::state::AppState;
use axum::{Json, extract::State};
use class_booking_core::service::BookingStore;
use class_booking_core::types::{Booking, BookingId, UserId};

/// List a user's bookings, newest first.
///
/// # Endpoint
///
/// ```text
/// GET /bookings?user_id=user-42&limit=50&offset=0
/// ```
///
/// # Errors
///
/// `422` if `user_id` is missing or blank.
pub async fn list_bookings<S: BookingStore>(
    State(state): State<AppState<S>>,
    ApiQuery(params): ApiQuery<ListBookingsParams>,
) -> Result<Json<ListResponse<Booking>>, AppError> {
    let user_id = UserId::new(params.user_id.unwrap_or_default());
    let page = page(params.limit, params.offset, DEFAULT_LIMIT);

    let bookings = state.service.list_user_bookings(&user_id, page).await?;
    Ok(Json(ListResponse::new(bookings, page)))
}

/// Get a booking.
///
/// # Endpoint
///
/// ```text
/// GET /bookings/:id
/// ```
///
/// # Errors
///
/// `404` if the booking does not exist.
pub async fn get_booking<S: BookingStore>(
    State(state): State<AppState<S>>,
    ApiPath(id): ApiPath<BookingId>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(state.service.get_booking(id).await?))
}

/// Cancel a confirmed booking, freeing its place.
///
/// # Endpoint
///
/// ```text
/// DELETE /bookings/:id
/// ```
///
/// # Response
///
/// The booking with status `cancelled`.
///
/// # Errors
///
/// - `404` if the booking does not exist
/// - `409` if it is already cancelled
pub async fn cancel_booking<S: BookingStore>(
    State(state): State<AppState<S>>,
    ApiPath(id): ApiPath<BookingId>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(state.service.cancel_booking(id).await?))
}
