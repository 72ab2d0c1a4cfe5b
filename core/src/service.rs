//! `BookingService`: the operations a request layer calls.
//!
//! Plain reads go straight to the catalog, ledger and review store. Anything that
//! touches `booked_count` or needs the class lock is delegated to the
//! [`ReservationCoordinator`].

use crate::catalog::{ClassCatalog, ClassQuery, ClassUpdate, NewClass};
use crate::coordinator::ReservationCoordinator;
use crate::environment::Clock;
use crate::error::{BookingError, Result};
use crate::ledger::BookingLedger;
use crate::reviews::{NewReview, ReviewStore};
use crate::types::{Booking, BookingId, Class, ClassId, Page, Review, UserId};
use crate::unit_of_work::ReservationStore;
use std::sync::Arc;

/// Everything a backing store must provide to run the service.
pub trait BookingStore: ClassCatalog + BookingLedger + ReviewStore + ReservationStore {}

impl<T> BookingStore for T where T: ClassCatalog + BookingLedger + ReviewStore + ReservationStore {}

/// Class catalog, reservations and reviews behind one handle.
///
/// Cheap to clone; clones share the store and clock.
pub struct BookingService<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    coordinator: ReservationCoordinator<S>,
}

impl<S> Clone for BookingService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            clock: Arc::clone(&self.clock),
            coordinator: self.coordinator.clone(),
        }
    }
}

impl<S: BookingStore> BookingService<S> {
    /// Build a service over `store`.
    #[must_use]
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        let coordinator = ReservationCoordinator::new(Arc::clone(&store), Arc::clone(&clock));
        Self {
            store,
            clock,
            coordinator,
        }
    }

    /// Current time as seen by the service.
    #[must_use]
    pub fn now(&self) -> chrono::DateTime<chrono::Utc> {
        self.clock.now()
    }

    /// Borrow the backing store.
    #[must_use]
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    // ═══════════════════════════════════════════════════════════
    // Classes
    // ═══════════════════════════════════════════════════════════

    /// Create a scheduled class with no bookings.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Validation`] for a blank name or an inverted time
    /// window, or a storage error.
    pub async fn create_class(&self, input: NewClass) -> Result<Class> {
        let class = input.into_class(self.clock.now())?;
        self.store.insert_class(&class).await?;
        tracing::info!(class_id = %class.id, capacity = class.capacity, "Class created");
        Ok(class)
    }

    /// Fetch a class.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::NotFound`] if the class does not exist.
    pub async fn get_class(&self, id: ClassId) -> Result<Class> {
        self.store
            .get_class(id)
            .await?
            .ok_or_else(|| BookingError::class_not_found(id))
    }

    /// Classes in a time window, ascending by start time.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the listing fails.
    pub async fn list_classes(&self, query: &ClassQuery, page: Page) -> Result<Vec<Class>> {
        self.store.list_classes(query, page).await
    }

    /// Edit a class.
    ///
    /// # Errors
    ///
    /// See [`ReservationCoordinator::update_class`].
    pub async fn update_class(&self, id: ClassId, update: &ClassUpdate) -> Result<Class> {
        self.coordinator.update_class(id, update).await
    }

    // ═══════════════════════════════════════════════════════════
    // Bookings
    // ═══════════════════════════════════════════════════════════

    /// Book a place in a class.
    ///
    /// # Errors
    ///
    /// See [`ReservationCoordinator::book_class`].
    pub async fn book_class(
        &self,
        class_id: ClassId,
        user_id: UserId,
        user_name: String,
    ) -> Result<Booking> {
        self.coordinator
            .book_class(class_id, user_id, user_name)
            .await
    }

    /// Cancel a confirmed booking.
    ///
    /// # Errors
    ///
    /// See [`ReservationCoordinator::cancel_booking`].
    pub async fn cancel_booking(&self, id: BookingId) -> Result<Booking> {
        self.coordinator.cancel_booking(id).await
    }

    /// Fetch a booking.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::NotFound`] if the booking does not exist.
    pub async fn get_booking(&self, id: BookingId) -> Result<Booking> {
        self.store
            .get_booking(id)
            .await?
            .ok_or_else(|| BookingError::booking_not_found(id))
    }

    /// A user's bookings, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Validation`] if `user_id` is blank.
    pub async fn list_user_bookings(&self, user_id: &UserId, page: Page) -> Result<Vec<Booking>> {
        user_id.validate()?;
        self.store.list_user_bookings(user_id, page).await
    }

    // ═══════════════════════════════════════════════════════════
    // Reviews
    // ═══════════════════════════════════════════════════════════

    /// Leave a review for a class.
    ///
    /// No booking is required, and a user may review the same class more than once.
    ///
    /// # Errors
    ///
    /// - [`BookingError::Validation`] if the rating is outside `1..=5` or the user ID is blank
    /// - [`BookingError::NotFound`] if the class does not exist
    #[tracing::instrument(skip_all, fields(class_id = %class_id))]
    pub async fn create_review(&self, class_id: ClassId, input: NewReview) -> Result<Review> {
        let review = input.into_review(class_id, self.clock.now())?;

        if self.store.get_class(class_id).await?.is_none() {
            return Err(BookingError::class_not_found(class_id));
        }

        self.store.insert_review(&review).await?;
        metrics::counter!("reviews_created_total").increment(1);
        tracing::info!(review_id = %review.id, rating = review.rating, "Review created");
        Ok(review)
    }

    /// Reviews of a class, newest first.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the listing fails.
    pub async fn list_class_reviews(&self, class_id: ClassId, page: Page) -> Result<Vec<Review>> {
        self.store.list_class_reviews(class_id, page).await
    }

    /// The user's most recent review of a class. `None` is not an error.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the lookup fails.
    pub async fn get_user_review(
        &self,
        class_id: ClassId,
        user_id: &UserId,
    ) -> Result<Option<Review>> {
        self.store.find_user_review(class_id, user_id).await
    }
}
