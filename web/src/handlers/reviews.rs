//! Review endpoints.

use crate::dto::{DEFAULT_REVIEW_LIMIT, ListResponse, PageParams, UserReviewResponse, page};
use crate::error::AppError;
use crate::extractors::{ApiJson, ApiPath, ApiQuery};
use crate::state::AppState;
use axum::{Json, extract::State, http::StatusCode};
use class_booking_core::reviews::NewReview;
use class_booking_core::service::BookingStore;
use class_booking_core::types::{ClassId, Review, UserId};

/// Review a class.
///
/// # Endpoint
///
/// ```text
/// POST /classes/:id/reviews
/// Content-Type: application/json
///
/// {
///   "user_id": "user-42",
///   "user_name": "Sam",
///   "rating": 5,
///   "content": "Great class",
///   "images": []
/// }
/// ```
///
/// # Errors
///
/// - `404` if the class does not exist
/// - `422` for a rating outside 1 to 5 or a blank user ID
pub async fn create_review<S: BookingStore>(
    State(state): State<AppState<S>>,
    ApiPath(class_id): ApiPath<ClassId>,
    ApiJson(request): ApiJson<NewReview>,
) -> Result<(StatusCode, Json<Review>), AppError> {
    let review = state.service.create_review(class_id, request).await?;
    Ok((StatusCode::CREATED, Json(review)))
}

/// List reviews of a class, newest first.
///
/// # Endpoint
///
/// ```text
/// GET /classes/:id/reviews?limit=20&offset=0
/// ```
pub async fn list_reviews<S: BookingStore>(
    State(state): State<AppState<S>>,
    ApiPath(class_id): ApiPath<ClassId>,
    ApiQuery(params): ApiQuery<PageParams>,
) -> Result<Json<ListResponse<Review>>, AppError> {
    let page = page(params.limit, params.offset, DEFAULT_REVIEW_LIMIT);
    let reviews = state.service.list_class_reviews(class_id, page).await?;
    Ok(Json(ListResponse::new(reviews, page)))
}

/// The user's most recent review of a class.
///
/// # Endpoint
///
/// ```text
/// GET /classes/:id/reviews/users/:user_id
/// ```
///
/// # Response
///
/// `{"review": null}` when the user has not reviewed the class.
pub async fn get_user_review<S: BookingStore>(
    State(state): State<AppState<S>>,
    ApiPath((class_id, user_id)): ApiPath<(ClassId, String)>,
) -> Result<Json<UserReviewResponse>, AppError> {
    let review = state
        .service
        .get_user_review(class_id, &UserId::new(user_id))
        .await?;
    Ok(Json(UserReviewResponse { review }))
}
