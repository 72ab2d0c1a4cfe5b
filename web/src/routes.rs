//! HTTP router.
//!
//! Composes all handlers into a single Axum router.

use crate::handlers::{bookings, classes, health, reviews};
use crate::middleware::request_id_layer;
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};
use class_booking_core::service::BookingStore;
use tower_http::trace::TraceLayer;

/// Create the application router.
///
/// # Routes
///
/// - `GET /health` - Liveness check
/// - `POST /api/v1/classes` - Create a class
/// - `GET /api/v1/classes` - List classes in a date window
/// - `GET /api/v1/classes/:id` - Get a class
/// - `PATCH /api/v1/classes/:id` - Edit a class
/// - `POST /api/v1/classes/:id/book` - Book a place
/// - `POST /api/v1/classes/:id/reviews` - Review a class
/// - `GET /api/v1/classes/:id/reviews` - List reviews of a class
/// - `GET /api/v1/classes/:id/reviews/users/:user_id` - A user's latest review
/// - `GET /api/v1/bookings?user_id=` - List a user's bookings
/// - `GET /api/v1/bookings/:id` - Get a booking
/// - `DELETE /api/v1/bookings/:id` - Cancel a booking
///
/// # Example
///
/// ```rust,ignore
/// let service = BookingService::new(Arc::new(store), Arc::new(SystemClock));
/// let app = router(AppState::new(service));
/// axum::serve(listener, app).await?;
/// ```
pub fn router<S: BookingStore + 'static>(state: AppState<S>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api/v1", api_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(request_id_layer())
}

fn api_routes<S: BookingStore + 'static>() -> Router<AppState<S>> {
    Router::new()
        .route(
            "/classes",
            post(classes::create_class::<S>).get(classes::list_classes::<S>),
        )
        .route(
            "/classes/:id",
            get(classes::get_class::<S>).patch(classes::update_class::<S>),
        )
        .route("/classes/:id/book", post(classes::book_class::<S>))
        .route(
            "/classes/:id/reviews",
            post(reviews::create_review::<S>).get(reviews::list_reviews::<S>),
        )
        .route(
            "/classes/:id/reviews/users/:user_id",
            get(reviews::get_user_review::<S>),
        )
        .route("/bookings", get(bookings::list_bookings::<S>))
        .route(
            "/bookings/:id",
            get(bookings::get_booking::<S>).delete(bookings::cancel_booking::<S>),
        )
}
