//! Booking ledger accessors.
//!
//! Writes to the ledger only happen inside a unit of work driven by the
//! reservation coordinator; this trait covers the plain reads.

use crate::error::Result;
use crate::types::{Booking, BookingId, ClassId, Page, UserId};
use std::future::Future;

/// Read access to booking records.
pub trait BookingLedger: Send + Sync {
    /// Fetch a booking by ID, `None` if absent.
    ///
    /// # Errors
    ///
    /// Returns error if the store query fails.
    fn get_booking(&self, id: BookingId) -> impl Future<Output = Result<Option<Booking>>> + Send;

    /// A user's bookings in every status, newest first.
    ///
    /// # Errors
    ///
    /// Returns error if the store query fails.
    fn list_user_bookings(
        &self,
        user_id: &UserId,
        page: Page,
    ) -> impl Future<Output = Result<Vec<Booking>>> + Send;

    /// Number of confirmed bookings for a class.
    ///
    /// Always equal to the class's `booked_count` outside a unit of work.
    ///
    /// # Errors
    ///
    /// Returns error if the store query fails.
    fn count_confirmed(&self, class_id: ClassId) -> impl Future<Output = Result<u32>> + Send;
}
