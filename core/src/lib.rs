//! # Class Booking Core
//!
//! Capacity-bounded reservation engine for scheduled classes.
//!
//! Users book places in classes that have a fixed capacity, cancel those bookings,
//! and leave reviews. The engine guarantees that, for every class:
//!
//! - `booked_count` equals the number of confirmed bookings
//! - `0 <= booked_count <= capacity`
//! - a user holds at most one confirmed booking
//!
//! even when many callers book the same class at once.
//!
//! ## Components
//!
//! - **Catalog** ([`catalog::ClassCatalog`]): class CRUD and time-window listings
//! - **Ledger** ([`ledger::BookingLedger`]): booking reads
//! - **Reviews** ([`reviews::ReviewStore`]): ratings and comments, independent of bookings
//! - **Unit of work** ([`unit_of_work::UnitOfWork`]): the transactional boundary with a
//!   per-class exclusive lock
//! - **Coordinator** ([`coordinator::ReservationCoordinator`]): the only writer of
//!   `booked_count`
//! - **Service** ([`service::BookingService`]): the operations exposed to callers
//!
//! Storage is pluggable. `class-booking-postgres` backs the traits with row locks;
//! `class-booking-testing` provides an in-memory store with the same contract.
//!
//! ## Example
//!
//! ```ignore
//! use class_booking_core::{BookingService, NewClass, SystemClock, UserId};
//! use std::sync::Arc;
//!
//! let service = BookingService::new(Arc::new(store), Arc::new(SystemClock));
//! let class = service.create_class(new_class).await?;
//! let booking = service
//!     .book_class(class.id, UserId::new("u-1"), "Lin".to_string())
//!     .await?;
//! ```

#![forbid(unsafe_code)]

pub mod catalog;
pub mod coordinator;
pub mod environment;
pub mod error;
pub mod ledger;
pub mod reviews;
pub mod service;
pub mod types;
pub mod unit_of_work;

pub use catalog::{ClassCatalog, ClassQuery, ClassUpdate, NewClass};
pub use coordinator::ReservationCoordinator;
pub use environment::{Clock, SystemClock};
pub use error::{BookingError, NotBookableReason, Resource, Result};
pub use ledger::BookingLedger;
pub use reviews::{NewReview, ReviewStore};
pub use service::{BookingService, BookingStore};
pub use types::{
    Booking, BookingId, BookingStatus, Class, ClassId, ClassStatus, Page, Review, ReviewId,
    UserId,
};
pub use unit_of_work::{ReservationStore, UnitOfWork};
