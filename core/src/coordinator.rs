//! Reservation coordinator.
//!
//! Owns every write that touches `booked_count`. Each operation is one unit of
//! work: lock the class, check, stage writes, commit. Any error before commit drops
//! the unit, so a failed call leaves no trace in the store.
//!
//! The coordinator never retries. A lock-wait timeout surfaces as
//! [`BookingError::Transient`] for the caller to act on.

use crate::catalog::ClassUpdate;
use crate::environment::Clock;
use crate::error::{BookingError, Result};
use crate::types::{Booking, BookingId, BookingStatus, Class, ClassId, UserId};
use crate::unit_of_work::{ReservationStore, UnitOfWork};
use std::sync::Arc;
use std::time::Instant;

/// Runs bookings, cancellations and class edits against a [`ReservationStore`].
pub struct ReservationCoordinator<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
}

impl<S> Clone for ReservationCoordinator<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<S: ReservationStore> ReservationCoordinator<S> {
    /// Create a coordinator over `store`, reading time from `clock`.
    #[must_use]
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Reserve one place in a class for a user.
    ///
    /// # Errors
    ///
    /// - [`BookingError::Validation`] if `user_id` is blank
    /// - [`BookingError::NotFound`] if the class does not exist
    /// - [`BookingError::ClassNotBookable`] if the class is cancelled, completed or started
    /// - [`BookingError::ClassFull`] if no place is left
    /// - [`BookingError::DuplicateBooking`] if the user already holds a confirmed booking
    /// - [`BookingError::Transient`] if the class lock could not be acquired in time
    #[tracing::instrument(skip_all, fields(class_id = %class_id, user_id = %user_id))]
    pub async fn book_class(
        &self,
        class_id: ClassId,
        user_id: UserId,
        user_name: String,
    ) -> Result<Booking> {
        user_id.validate()?;

        let started = Instant::now();
        let result = self.try_book(class_id, user_id, user_name).await;
        record_duration("book", started);

        match &result {
            Ok(booking) => {
                metrics::counter!("bookings_confirmed_total").increment(1);
                tracing::info!(booking_id = %booking.id, "Booking confirmed");
            }
            Err(err) => record_rejection("book", err),
        }
        result
    }

    async fn try_book(
        &self,
        class_id: ClassId,
        user_id: UserId,
        user_name: String,
    ) -> Result<Booking> {
        let mut uow = self.store.begin().await?;

        let class = uow
            .lock_class(class_id)
            .await?
            .ok_or_else(|| BookingError::class_not_found(class_id))?;

        // Read after the lock so a long wait cannot admit a booking past start time.
        let now = self.clock.now();
        class.ensure_bookable(now)?;

        if uow
            .find_confirmed_booking(class_id, &user_id)
            .await?
            .is_some()
        {
            return Err(BookingError::DuplicateBooking { class_id, user_id });
        }

        let booking = Booking::confirmed(class_id, user_id, user_name, now);
        uow.insert_booking(&booking).await?;
        uow.increment_booked_count(class_id, now).await?;
        uow.commit().await?;

        Ok(booking)
    }

    /// Cancel a confirmed booking and release its place.
    ///
    /// Returns the booking as it now stands.
    ///
    /// # Errors
    ///
    /// - [`BookingError::NotFound`] if the booking does not exist
    /// - [`BookingError::InvalidBookingState`] if the booking is not confirmed
    /// - [`BookingError::Transient`] if the class lock could not be acquired in time
    #[tracing::instrument(skip_all, fields(booking_id = %booking_id))]
    pub async fn cancel_booking(&self, booking_id: BookingId) -> Result<Booking> {
        let started = Instant::now();
        let result = self.try_cancel(booking_id).await;
        record_duration("cancel", started);

        match &result {
            Ok(booking) => {
                metrics::counter!("bookings_cancelled_total").increment(1);
                tracing::info!(class_id = %booking.class_id, "Booking cancelled");
            }
            Err(err) => record_rejection("cancel", err),
        }
        result
    }

    async fn try_cancel(&self, booking_id: BookingId) -> Result<Booking> {
        let mut uow = self.store.begin().await?;

        let class_id = uow
            .get_booking(booking_id)
            .await?
            .ok_or_else(|| BookingError::booking_not_found(booking_id))?
            .class_id;

        uow.lock_class(class_id)
            .await?
            .ok_or_else(|| BookingError::class_not_found(class_id))?;

        // Re-read under lock; a concurrent cancel may have won the race.
        let booking = uow
            .lock_booking(booking_id)
            .await?
            .ok_or_else(|| BookingError::booking_not_found(booking_id))?;

        if !booking.is_confirmed() {
            return Err(BookingError::InvalidBookingState {
                booking_id,
                status: booking.status,
            });
        }

        let now = self.clock.now();
        uow.set_booking_status(booking_id, BookingStatus::Cancelled, now)
            .await?;
        uow.decrement_booked_count(class_id, now).await?;
        uow.commit().await?;

        Ok(Booking {
            status: BookingStatus::Cancelled,
            updated_at: now,
            ..booking
        })
    }

    /// Apply a patch to a class under its lock.
    ///
    /// Serializes with bookings on the same class, so a capacity change can never
    /// slip under a concurrently admitted booking.
    ///
    /// # Errors
    ///
    /// - [`BookingError::NotFound`] if the class does not exist
    /// - [`BookingError::Validation`] if the patch breaks a class rule
    #[tracing::instrument(skip_all, fields(class_id = %class_id))]
    pub async fn update_class(&self, class_id: ClassId, update: &ClassUpdate) -> Result<Class> {
        let started = Instant::now();
        let result = self.try_update(class_id, update).await;
        record_duration("update_class", started);

        match &result {
            Ok(class) => tracing::info!(status = %class.status, "Class updated"),
            Err(err) => record_rejection("update_class", err),
        }
        result
    }

    async fn try_update(&self, class_id: ClassId, update: &ClassUpdate) -> Result<Class> {
        let mut uow = self.store.begin().await?;

        let current = uow
            .lock_class(class_id)
            .await?
            .ok_or_else(|| BookingError::class_not_found(class_id))?;

        let next = update.apply(&current, self.clock.now())?;
        uow.update_class(&next).await?;
        uow.commit().await?;

        Ok(next)
    }
}

fn record_duration(operation: &'static str, started: Instant) {
    metrics::histogram!("booking_unit_of_work_duration_seconds", "operation" => operation)
        .record(started.elapsed().as_secs_f64());
}

fn record_rejection(operation: &'static str, err: &BookingError) {
    let reason = match err {
        BookingError::ClassNotBookable { reason, .. } => reason.as_str(),
        BookingError::NotFound { .. } => "not_found",
        BookingError::ClassFull { .. } => "class_full",
        BookingError::DuplicateBooking { .. } => "duplicate_booking",
        BookingError::InvalidBookingState { .. } => "invalid_booking_state",
        BookingError::Validation(_) => "validation",
        BookingError::Transient(_) => "transient",
        BookingError::DatabaseError(_) => "database",
    };
    metrics::counter!("bookings_rejected_total", "operation" => operation, "reason" => reason)
        .increment(1);

    match err {
        BookingError::Transient(_) | BookingError::DatabaseError(_) => {
            tracing::warn!(error = %err, reason, "Unit of work aborted");
        }
        _ => tracing::debug!(error = %err, reason, "Request rejected"),
    }
}
