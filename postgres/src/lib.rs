//! `PostgreSQL` storage for the class booking engine.
//!
//! This crate implements every store trait from `class-booking-core` on top of sqlx:
//!
//! - Class catalog, booking ledger and review store as plain pool queries
//! - Units of work as transactions that lock the class row with `SELECT ... FOR UPDATE`
//! - A per-transaction `lock_timeout`, surfacing lock waits as transient failures
//! - Migrations for the `classes`, `bookings` and `reviews` tables, including the
//!   `CHECK` constraints and the partial unique index that back the capacity invariants
//!
//! # Example
//!
//! ```ignore
//! use class_booking_postgres::PostgresBookingStore;
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = PostgresBookingStore::connect("postgres://localhost/booking").await?;
//!     store.migrate().await?;
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
mod rows;
mod store;

pub use error::map_sqlx_error;
pub use store::{DEFAULT_LOCK_TIMEOUT, PostgresBookingStore, PostgresUnitOfWork};
