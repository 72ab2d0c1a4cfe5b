//! HTTP surface of the class booking system.
//!
//! A thin Axum shell over [`BookingService`]: handlers extract input, call the
//! service and map [`BookingError`] onto status codes through [`AppError`].
//!
//! # Request Flow
//!
//! 1. **HTTP Request** arrives, gets a request ID and a tracing span
//! 2. **Extract data** from path, query and JSON body
//! 3. **Call** the matching `BookingService` operation
//! 4. **Map result** to a JSON response, or an error body `{code, message}`
//!
//! # Example
//!
//! ```ignore
//! use class_booking_web::{AppState, router};
//!
//! let service = BookingService::new(Arc::new(store), Arc::new(SystemClock));
//! let app = router(AppState::new(service));
//! ```
//!
//! [`BookingService`]: class_booking_core::BookingService
//! [`BookingError`]: class_booking_core::BookingError

#![forbid(unsafe_code)]
#![allow(clippy::module_name_repetitions)]

pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;

// Re-export key types for convenience
pub use error::AppError;
pub use extractors::{ApiJson, ApiPath, ApiQuery};
pub use middleware::{REQUEST_ID_HEADER, RequestId, request_id_layer};
pub use routes::router;
pub use state::AppState;
