//! Atomic unit of work over the class and booking records.
//!
//! A [`UnitOfWork`] is the transactional boundary the reservation coordinator runs
//! in. Implementations must guarantee:
//!
//! - [`UnitOfWork::lock_class`] holds an exclusive lock on the class until the unit
//!   commits or is dropped. A second unit locking the same class waits; units on
//!   different classes never wait on each other.
//! - Writes are invisible to other callers until [`UnitOfWork::commit`] succeeds.
//! - Dropping a unit without committing discards every write.
//! - A lock wait that exceeds the store's timeout fails with
//!   [`BookingError::Transient`](crate::error::BookingError::Transient).
//!
//! Callers lock the class before any booking of that class. Keeping that order
//! everywhere is what keeps concurrent book and cancel calls from deadlocking.

use crate::error::Result;
use crate::types::{Booking, BookingId, BookingStatus, Class, ClassId, UserId};
use chrono::{DateTime, Utc};
use std::future::Future;

/// Factory for units of work.
pub trait ReservationStore: Send + Sync {
    /// Unit of work type produced by this store.
    type UnitOfWork: UnitOfWork;

    /// Open a new unit of work.
    ///
    /// # Errors
    ///
    /// Returns error if the store cannot start a transaction.
    fn begin(&self) -> impl Future<Output = Result<Self::UnitOfWork>> + Send;
}

/// One atomic read-check-write over a class and its bookings.
pub trait UnitOfWork: Send {
    /// Read a class and hold its lock for the rest of the unit.
    ///
    /// # Errors
    ///
    /// Returns [`Transient`](crate::error::BookingError::Transient) if the lock
    /// cannot be acquired in time.
    fn lock_class(&mut self, id: ClassId) -> impl Future<Output = Result<Option<Class>>> + Send;

    /// Read a booking without locking it.
    ///
    /// Used to find which class to lock before touching the booking.
    ///
    /// # Errors
    ///
    /// Returns error if the store query fails.
    fn get_booking(
        &mut self,
        id: BookingId,
    ) -> impl Future<Output = Result<Option<Booking>>> + Send;

    /// Read a booking and hold its lock for the rest of the unit.
    ///
    /// The owning class must already be locked.
    ///
    /// # Errors
    ///
    /// Returns error if the store query fails or the lock times out.
    fn lock_booking(
        &mut self,
        id: BookingId,
    ) -> impl Future<Output = Result<Option<Booking>>> + Send;

    /// The user's confirmed booking for a class, if any.
    ///
    /// # Errors
    ///
    /// Returns error if the store query fails.
    fn find_confirmed_booking(
        &mut self,
        class_id: ClassId,
        user_id: &UserId,
    ) -> impl Future<Output = Result<Option<Booking>>> + Send;

    /// Stage a new booking.
    ///
    /// # Errors
    ///
    /// Returns [`DuplicateBooking`](crate::error::BookingError::DuplicateBooking) if
    /// the store's uniqueness guard on confirmed bookings fires.
    fn insert_booking(&mut self, booking: &Booking) -> impl Future<Output = Result<()>> + Send;

    /// Stage a booking status change.
    ///
    /// # Errors
    ///
    /// Returns error if the store rejects the write.
    fn set_booking_status(
        &mut self,
        id: BookingId,
        status: BookingStatus,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Stage `booked_count += 1` on a locked class.
    ///
    /// # Errors
    ///
    /// Returns error if the store rejects the write, including when the store's
    /// own capacity guard fires.
    fn increment_booked_count(
        &mut self,
        class_id: ClassId,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Stage `booked_count -= 1` on a locked class.
    ///
    /// # Errors
    ///
    /// Returns error if the store rejects the write.
    fn decrement_booked_count(
        &mut self,
        class_id: ClassId,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Stage a class edit. `booked_count` on `class` is ignored.
    ///
    /// # Errors
    ///
    /// Returns error if the store rejects the write.
    fn update_class(&mut self, class: &Class) -> impl Future<Output = Result<()>> + Send;

    /// Make every staged write visible and release all locks.
    ///
    /// # Errors
    ///
    /// Returns error if the commit fails; nothing is applied in that case.
    fn commit(self) -> impl Future<Output = Result<()>> + Send;
}
