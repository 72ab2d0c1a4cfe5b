//! Application state for Axum handlers.

use class_booking_core::service::{BookingService, BookingStore};

/// Application state shared across all HTTP handlers.
///
/// Generic over the backing store so the same router serves Postgres in
/// production and the in-memory store in tests.
pub struct AppState<S> {
    /// Booking operations
    pub service: BookingService<S>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
        }
    }
}

impl<S: BookingStore> AppState<S> {
    /// Create a new application state.
    #[must_use]
    pub const fn new(service: BookingService<S>) -> Self {
        Self { service }
    }
}
