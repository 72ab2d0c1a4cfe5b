//! HTTP request handlers.
//!
//! Handlers are thin: they extract input, call [`BookingService`] and map the
//! result. All business rules live in `class-booking-core`.
//!
//! [`BookingService`]: class_booking_core::BookingService

pub mod bookings;
pub mod classes;
pub mod health;
pub mod reviews;

pub use health::health_check;
