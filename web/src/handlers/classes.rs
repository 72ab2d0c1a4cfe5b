//! Class endpoints: catalog management and booking.

use crate::dto::{BookClassRequest, ClassResponse, DEFAULT_LIMIT, ListClassesParams, ListResponse, page};
use crate::error::AppError;
use crate::extractors::{ApiJson, ApiPath, ApiQuery};
use crate::state::AppState;
use axum::{Json, extract::State, http::StatusCode};
use class_booking_core::catalog::{ClassQuery, ClassUpdate, NewClass};
use class_booking_core::service::BookingStore;
use class_booking_core::types::{Booking, ClassId, UserId};

/// Create a class.
///
/// # Endpoint
///
/// ```text
/// POST /classes
/// Content-Type: application/json
///
/// {
///   "name": "Morning Yoga",
///   "instructor": "Alex",
///   "start_time": "2025-01-06T08:00:00Z",
///   "end_time": "2025-01-06T09:00:00Z",
///   "capacity": 12
/// }
/// ```
///
/// # Errors
///
/// `422` for a blank name or an end time not after the start time.
pub async fn create_class<S: BookingStore>(
    State(state): State<AppState<S>>,
    ApiJson(request): ApiJson<NewClass>,
) -> Result<(StatusCode, Json<ClassResponse>), AppError> {
    let class = state.service.create_class(request).await?;
    Ok((StatusCode::CREATED, Json(class.into())))
}

/// List classes in a date window, ordered by start time.
///
/// # Endpoint
///
/// ```text
/// GET /classes?start_date=2025-01-06&end_date=2025-01-12&limit=50&offset=0
/// ```
///
/// With neither date given, the current week (Monday to Sunday) is listed.
///
/// # Errors
///
/// `400` for malformed dates.
pub async fn list_classes<S: BookingStore>(
    State(state): State<AppState<S>>,
    ApiQuery(params): ApiQuery<ListClassesParams>,
) -> Result<Json<ListResponse<ClassResponse>>, AppError> {
    let query = if params.start_date.is_none() && params.end_date.is_none() {
        ClassQuery::current_week(state.service.now())
    } else {
        ClassQuery::from_dates(params.start_date, params.end_date)
    };
    let page = page(params.limit, params.offset, DEFAULT_LIMIT);

    let classes = state.service.list_classes(&query, page).await?;
    let items = classes.into_iter().map(ClassResponse::from).collect();
    Ok(Json(ListResponse::new(items, page)))
}

/// Get a class with its availability.
///
/// # Endpoint
///
/// ```text
/// GET /classes/:id
/// ```
///
/// # Errors
///
/// `404` if the class does not exist.
pub async fn get_class<S: BookingStore>(
    State(state): State<AppState<S>>,
    ApiPath(id): ApiPath<ClassId>,
) -> Result<Json<ClassResponse>, AppError> {
    let class = state.service.get_class(id).await?;
    Ok(Json(class.into()))
}

/// Edit a class. Absent fields are left unchanged.
///
/// # Endpoint
///
/// ```text
/// PATCH /classes/:id
/// Content-Type: application/json
///
/// {
///   "capacity": 20,
///   "status": "cancelled"
/// }
/// ```
///
/// # Errors
///
/// - `404` if the class does not exist
/// - `422` if the capacity drops below the confirmed bookings or the status change is not allowed
pub async fn update_class<S: BookingStore>(
    State(state): State<AppState<S>>,
    ApiPath(id): ApiPath<ClassId>,
    ApiJson(update): ApiJson<ClassUpdate>,
) -> Result<Json<ClassResponse>, AppError> {
    let class = state.service.update_class(id, &update).await?;
    Ok(Json(class.into()))
}

/// Book a place in a class.
///
/// # Endpoint
///
/// ```text
/// POST /classes/:id/book
/// Content-Type: application/json
///
/// {
///   "user_id": "user-42",
///   "user_name": "Sam"
/// }
/// ```
///
/// # Errors
///
/// - `404` if the class does not exist
/// - `409` if the class is full, not bookable, or the user already holds a place
/// - `422` for a blank user ID
/// - `503` if the class is too contended to lock in time
pub async fn book_class<S: BookingStore>(
    State(state): State<AppState<S>>,
    ApiPath(id): ApiPath<ClassId>,
    ApiJson(request): ApiJson<BookClassRequest>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let booking = state
        .service
        .book_class(id, UserId::new(request.user_id), request.user_name)
        .await?;
    Ok((StatusCode::CREATED, Json(booking)))
}
