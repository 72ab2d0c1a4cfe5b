//! In-memory booking store for fast, deterministic tests.
//!
//! Honours the same unit-of-work contract as the Postgres store:
//! - one async mutex per class, held from `lock_class` until commit or drop
//! - writes staged in the unit and applied atomically on commit
//! - lock waits bounded by a timeout that surfaces as `Transient`
//! - store-level guards mirroring the database constraints (capacity check,
//!   unique confirmed booking per user and class)

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Lock poisoning only follows a panicking test

use class_booking_core::catalog::{ClassCatalog, ClassQuery};
use class_booking_core::error::{BookingError, Result};
use class_booking_core::ledger::BookingLedger;
use class_booking_core::reviews::ReviewStore;
use class_booking_core::types::{
    Booking, BookingId, BookingStatus, Class, ClassId, Page, Review, UserId,
};
use class_booking_core::unit_of_work::{ReservationStore, UnitOfWork};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use tokio::sync::OwnedMutexGuard;

/// Default bound on how long a unit of work waits for a class lock.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Default)]
struct Tables {
    classes: HashMap<ClassId, Class>,
    bookings: HashMap<BookingId, Booking>,
    // Booking IDs in insert order; breaks created_at ties.
    booking_order: Vec<BookingId>,
    reviews: Vec<Review>,
}

impl Tables {
    fn confirmed_for(&self, class_id: ClassId) -> impl Iterator<Item = &Booking> {
        self.bookings
            .values()
            .filter(move |b| b.class_id == class_id && b.is_confirmed())
    }
}

type ClassLock = Arc<tokio::sync::Mutex<()>>;

/// In-memory implementation of every booking store trait.
///
/// Clones share the same data.
///
/// # Example
///
/// ```
/// use class_booking_testing::{InMemoryBookingStore, fixtures, test_clock};
/// use class_booking_core::{BookingService, UserId};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = InMemoryBookingStore::new();
/// let service = BookingService::new(Arc::new(store.clone()), Arc::new(test_clock()));
///
/// let class = service.create_class(fixtures::new_class(2)).await?;
/// service.book_class(class.id, UserId::new("u-1"), "Lin".into()).await?;
///
/// assert_eq!(store.class(class.id).unwrap().booked_count, 1);
/// store.assert_invariants();
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct InMemoryBookingStore {
    tables: Arc<RwLock<Tables>>,
    class_locks: Arc<Mutex<HashMap<ClassId, ClassLock>>>,
    lock_timeout: Duration,
    fail_commits: Arc<AtomicBool>,
}

impl InMemoryBookingStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tables: Arc::new(RwLock::new(Tables::default())),
            class_locks: Arc::new(Mutex::new(HashMap::new())),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
            fail_commits: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Use a different class-lock wait bound.
    #[must_use]
    pub fn with_lock_timeout(mut self, lock_timeout: Duration) -> Self {
        self.lock_timeout = lock_timeout;
        self
    }

    /// Make every subsequent commit fail with `Transient`, leaving state unchanged.
    pub fn fail_commits(&self, fail: bool) {
        self.fail_commits.store(fail, Ordering::SeqCst);
    }

    /// Snapshot of a class.
    #[must_use]
    pub fn class(&self, id: ClassId) -> Option<Class> {
        self.tables.read().unwrap().classes.get(&id).cloned()
    }

    /// Snapshot of a booking.
    #[must_use]
    pub fn booking(&self, id: BookingId) -> Option<Booking> {
        self.tables.read().unwrap().bookings.get(&id).cloned()
    }

    /// Every booking of a class, in no particular order.
    #[must_use]
    pub fn bookings_for_class(&self, class_id: ClassId) -> Vec<Booking> {
        self.tables
            .read()
            .unwrap()
            .bookings
            .values()
            .filter(|b| b.class_id == class_id)
            .cloned()
            .collect()
    }

    /// Number of confirmed bookings for a class.
    #[must_use]
    pub fn confirmed_count(&self, class_id: ClassId) -> usize {
        self.tables.read().unwrap().confirmed_for(class_id).count()
    }

    /// Total number of bookings in any status.
    #[must_use]
    pub fn booking_count(&self) -> usize {
        self.tables.read().unwrap().bookings.len()
    }

    /// Hold a class lock outside any unit of work, e.g. to force lock timeouts.
    pub async fn hold_class_lock(&self, id: ClassId) -> OwnedMutexGuard<()> {
        self.class_lock(id).lock_owned().await
    }

    /// Check the capacity invariants on every class.
    ///
    /// Returns one message per violation.
    #[must_use]
    pub fn invariant_violations(&self) -> Vec<String> {
        let tables = self.tables.read().unwrap();
        let mut violations = Vec::new();

        for class in tables.classes.values() {
            let confirmed: Vec<&Booking> = tables.confirmed_for(class.id).collect();

            if confirmed.len() != class.booked_count as usize {
                violations.push(format!(
                    "class {}: booked_count {} but {} confirmed bookings",
                    class.id,
                    class.booked_count,
                    confirmed.len()
                ));
            }
            if class.booked_count > class.capacity {
                violations.push(format!(
                    "class {}: booked_count {} exceeds capacity {}",
                    class.id, class.booked_count, class.capacity
                ));
            }

            let mut users: Vec<&UserId> = confirmed.iter().map(|b| &b.user_id).collect();
            users.sort();
            if users.windows(2).any(|pair| pair[0] == pair[1]) {
                violations.push(format!(
                    "class {}: a user holds more than one confirmed booking",
                    class.id
                ));
            }
        }
        violations
    }

    /// Panic if any capacity invariant is broken.
    pub fn assert_invariants(&self) {
        let violations = self.invariant_violations();
        assert!(
            violations.is_empty(),
            "invariants violated:\n{}",
            violations.join("\n")
        );
    }

    fn class_lock(&self, id: ClassId) -> ClassLock {
        Arc::clone(self.class_locks.lock().unwrap().entry(id).or_default())
    }
}

impl Default for InMemoryBookingStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassCatalog for InMemoryBookingStore {
    async fn insert_class(&self, class: &Class) -> Result<()> {
        self.tables
            .write()
            .unwrap()
            .classes
            .insert(class.id, class.clone());
        Ok(())
    }

    async fn get_class(&self, id: ClassId) -> Result<Option<Class>> {
        Ok(self.class(id))
    }

    async fn list_classes(&self, query: &ClassQuery, page: Page) -> Result<Vec<Class>> {
        let mut classes: Vec<Class> = self
            .tables
            .read()
            .unwrap()
            .classes
            .values()
            .filter(|c| query.matches(c))
            .cloned()
            .collect();
        classes.sort_by_key(|c| (c.start_time, c.created_at, c.id));
        Ok(page.slice(classes))
    }
}

impl BookingLedger for InMemoryBookingStore {
    async fn get_booking(&self, id: BookingId) -> Result<Option<Booking>> {
        Ok(self.booking(id))
    }

    async fn list_user_bookings(&self, user_id: &UserId, page: Page) -> Result<Vec<Booking>> {
        let tables = self.tables.read().unwrap();
        // Later inserts win ties on created_at; the sort is stable.
        let mut bookings: Vec<Booking> = tables
            .booking_order
            .iter()
            .rev()
            .filter_map(|id| tables.bookings.get(id))
            .filter(|b| &b.user_id == user_id)
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(page.slice(bookings))
    }

    async fn count_confirmed(&self, class_id: ClassId) -> Result<u32> {
        let count = self.confirmed_count(class_id);
        u32::try_from(count).map_err(|e| BookingError::DatabaseError(e.to_string()))
    }
}

impl ReviewStore for InMemoryBookingStore {
    async fn insert_review(&self, review: &Review) -> Result<()> {
        self.tables.write().unwrap().reviews.push(review.clone());
        Ok(())
    }

    async fn list_class_reviews(&self, class_id: ClassId, page: Page) -> Result<Vec<Review>> {
        let tables = self.tables.read().unwrap();
        // Later inserts win ties on created_at.
        let newest_first = tables
            .reviews
            .iter()
            .rev()
            .filter(|r| r.class_id == class_id);
        let mut reviews: Vec<Review> = newest_first.cloned().collect();
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(page.slice(reviews))
    }

    async fn find_user_review(&self, class_id: ClassId, user_id: &UserId) -> Result<Option<Review>> {
        let tables = self.tables.read().unwrap();
        // max_by_key keeps the last maximum, so later inserts win ties.
        let found = tables
            .reviews
            .iter()
            .filter(|r| r.class_id == class_id && &r.user_id == user_id)
            .max_by_key(|r| r.created_at);
        Ok(found.cloned())
    }
}

impl ReservationStore for InMemoryBookingStore {
    type UnitOfWork = InMemoryUnitOfWork;

    async fn begin(&self) -> Result<InMemoryUnitOfWork> {
        Ok(InMemoryUnitOfWork {
            store: self.clone(),
            guards: Vec::new(),
            classes: HashMap::new(),
            bookings: HashMap::new(),
        })
    }
}

/// Unit of work over an [`InMemoryBookingStore`].
///
/// `classes` holds working copies of locked classes; `bookings` holds only
/// bookings written by this unit. Dropping the unit releases the locks and
/// forgets both.
#[derive(Debug)]
pub struct InMemoryUnitOfWork {
    store: InMemoryBookingStore,
    guards: Vec<OwnedMutexGuard<()>>,
    classes: HashMap<ClassId, Class>,
    bookings: HashMap<BookingId, Booking>,
}

impl InMemoryUnitOfWork {
    fn read_booking(&self, id: BookingId) -> Option<Booking> {
        self.bookings
            .get(&id)
            .cloned()
            .or_else(|| self.store.booking(id))
    }

    fn locked_class(&mut self, class_id: ClassId) -> Result<&mut Class> {
        self.classes.get_mut(&class_id).ok_or_else(|| {
            BookingError::DatabaseError(format!("class {class_id} is not locked by this unit"))
        })
    }
}

impl UnitOfWork for InMemoryUnitOfWork {
    async fn lock_class(&mut self, id: ClassId) -> Result<Option<Class>> {
        if let Some(class) = self.classes.get(&id) {
            return Ok(Some(class.clone()));
        }

        let lock = self.store.class_lock(id);
        let guard = tokio::time::timeout(self.store.lock_timeout, lock.lock_owned())
            .await
            .map_err(|_| BookingError::Transient(format!("lock wait timeout on class {id}")))?;

        let Some(class) = self.store.class(id) else {
            return Ok(None);
        };
        self.guards.push(guard);
        self.classes.insert(id, class.clone());
        Ok(Some(class))
    }

    async fn get_booking(&mut self, id: BookingId) -> Result<Option<Booking>> {
        Ok(self.read_booking(id))
    }

    async fn lock_booking(&mut self, id: BookingId) -> Result<Option<Booking>> {
        // Bookings only change under their class lock, which the caller holds.
        Ok(self.read_booking(id))
    }

    async fn find_confirmed_booking(
        &mut self,
        class_id: ClassId,
        user_id: &UserId,
    ) -> Result<Option<Booking>> {
        let matches = |b: &Booking| b.class_id == class_id && &b.user_id == user_id;

        if let Some(staged) = self
            .bookings
            .values()
            .find(|&b| matches(b) && b.is_confirmed())
        {
            return Ok(Some(staged.clone()));
        }

        let tables = self.store.tables.read().unwrap();
        let committed = tables
            .confirmed_for(class_id)
            .filter(|&b| matches(b))
            // A staged write may have changed the committed row's status.
            .find(|b| self.bookings.get(&b.id).is_none_or(Booking::is_confirmed));
        Ok(committed.cloned())
    }

    async fn insert_booking(&mut self, booking: &Booking) -> Result<()> {
        if booking.is_confirmed()
            && self
                .find_confirmed_booking(booking.class_id, &booking.user_id)
                .await?
                .is_some()
        {
            return Err(BookingError::DuplicateBooking {
                class_id: booking.class_id,
                user_id: booking.user_id.clone(),
            });
        }
        self.bookings.insert(booking.id, booking.clone());
        Ok(())
    }

    async fn set_booking_status(
        &mut self,
        id: BookingId,
        status: BookingStatus,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let mut booking = self
            .read_booking(id)
            .ok_or_else(|| BookingError::booking_not_found(id))?;
        booking.status = status;
        booking.updated_at = now;
        self.bookings.insert(id, booking);
        Ok(())
    }

    async fn increment_booked_count(&mut self, class_id: ClassId, now: DateTime<Utc>) -> Result<()> {
        let class = self.locked_class(class_id)?;
        if class.booked_count >= class.capacity {
            return Err(BookingError::DatabaseError(format!(
                "booked_count would exceed capacity on class {class_id}"
            )));
        }
        class.booked_count += 1;
        class.updated_at = now;
        Ok(())
    }

    async fn decrement_booked_count(&mut self, class_id: ClassId, now: DateTime<Utc>) -> Result<()> {
        let class = self.locked_class(class_id)?;
        class.booked_count = class.booked_count.checked_sub(1).ok_or_else(|| {
            BookingError::DatabaseError(format!("booked_count would go negative on class {class_id}"))
        })?;
        class.updated_at = now;
        Ok(())
    }

    async fn update_class(&mut self, class: &Class) -> Result<()> {
        let working = self.locked_class(class.id)?;
        let booked_count = working.booked_count;
        *working = Class {
            booked_count,
            ..class.clone()
        };
        Ok(())
    }

    async fn commit(self) -> Result<()> {
        if self.store.fail_commits.load(Ordering::SeqCst) {
            return Err(BookingError::Transient("injected commit failure".to_string()));
        }

        let mut tables = self.store.tables.write().unwrap();
        tables.classes.extend(self.classes);
        for (id, booking) in self.bookings {
            if tables.bookings.insert(id, booking).is_none() {
                tables.booking_order.push(id);
            }
        }
        drop(tables);

        // Locks release only after the writes are visible.
        drop(self.guards);
        Ok(())
    }
}
