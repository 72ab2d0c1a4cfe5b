//! `PostgresBookingStore`: catalog, ledger, reviews and units of work over one pool.

use crate::error::{ONE_CONFIRMED_PER_USER, is_unique_violation, map_sqlx_error};
use crate::rows::{
    BOOKING_COLUMNS, CLASS_COLUMNS, REVIEW_COLUMNS, booking_from_row, class_from_row,
    review_from_row, to_db_count,
};
use chrono::{DateTime, Utc};
use class_booking_core::catalog::{ClassCatalog, ClassQuery};
use class_booking_core::error::{BookingError, Result};
use class_booking_core::ledger::BookingLedger;
use class_booking_core::reviews::ReviewStore;
use class_booking_core::types::{
    Booking, BookingId, BookingStatus, Class, ClassId, Page, Review, UserId,
};
use class_booking_core::unit_of_work::{ReservationStore, UnitOfWork};
use sqlx::{PgPool, Postgres, Transaction};
use std::time::Duration;

/// Default bound on how long a transaction waits for a row lock.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// `PostgreSQL` implementation of every booking store trait.
///
/// Units of work are `READ COMMITTED` transactions. The class row is locked with
/// `SELECT ... FOR UPDATE`, and each transaction sets a local `lock_timeout` so a
/// blocked booking fails fast with [`BookingError::Transient`].
///
/// # Example
///
/// ```no_run
/// use class_booking_postgres::PostgresBookingStore;
/// use class_booking_core::{BookingService, SystemClock};
/// use std::sync::Arc;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = PostgresBookingStore::connect("postgres://localhost/booking").await?;
/// store.migrate().await?;
///
/// let service = BookingService::new(Arc::new(store), Arc::new(SystemClock));
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct PostgresBookingStore {
    pool: PgPool,
    lock_timeout: Duration,
}

impl PostgresBookingStore {
    /// Create a store over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self {
            pool,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    /// Connect a new pool with default settings.
    ///
    /// # Errors
    ///
    /// Returns error if the database is unreachable.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| BookingError::DatabaseError(format!("Failed to connect: {e}")))?;
        Ok(Self::new(pool))
    }

    /// Bound row-lock waits inside units of work.
    #[must_use]
    pub fn with_lock_timeout(mut self, lock_timeout: Duration) -> Self {
        self.lock_timeout = lock_timeout;
        self
    }

    /// Run database migrations.
    ///
    /// # Errors
    ///
    /// Returns error if migrations fail.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| BookingError::DatabaseError(format!("Migration failed: {e}")))?;
        Ok(())
    }

    /// The underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Round-trip a trivial query.
    ///
    /// # Errors
    ///
    /// Returns error if the database cannot be reached.
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }
}

fn page_bounds(page: Page) -> (i64, i64) {
    (i64::from(page.limit), i64::from(page.offset))
}

impl ClassCatalog for PostgresBookingStore {
    async fn insert_class(&self, class: &Class) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO classes (
                id, name, description, instructor, start_time, end_time,
                capacity, booked_count, status, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ",
        )
        .bind(class.id.as_uuid())
        .bind(&class.name)
        .bind(&class.description)
        .bind(&class.instructor)
        .bind(class.start_time)
        .bind(class.end_time)
        .bind(to_db_count("capacity", class.capacity)?)
        .bind(to_db_count("booked_count", class.booked_count)?)
        .bind(class.status.as_str())
        .bind(class.created_at)
        .bind(class.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn get_class(&self, id: ClassId) -> Result<Option<Class>> {
        let sql = format!("SELECT {CLASS_COLUMNS} FROM classes WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        row.as_ref().map(class_from_row).transpose()
    }

    async fn list_classes(&self, query: &ClassQuery, page: Page) -> Result<Vec<Class>> {
        let (limit, offset) = page_bounds(page);
        let sql = format!(
            r"
            SELECT {CLASS_COLUMNS}
            FROM classes
            WHERE ($1::timestamptz IS NULL OR start_time >= $1)
              AND ($2::timestamptz IS NULL OR end_time <= $2)
            ORDER BY start_time ASC, created_at ASC, id ASC
            LIMIT $3 OFFSET $4
            "
        );
        let rows = sqlx::query(&sql)
            .bind(query.starts_from)
            .bind(query.ends_by)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        rows.iter().map(class_from_row).collect()
    }
}

impl BookingLedger for PostgresBookingStore {
    async fn get_booking(&self, id: BookingId) -> Result<Option<Booking>> {
        let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        row.as_ref().map(booking_from_row).transpose()
    }

    async fn list_user_bookings(&self, user_id: &UserId, page: Page) -> Result<Vec<Booking>> {
        let (limit, offset) = page_bounds(page);
        let sql = format!(
            r"
            SELECT {BOOKING_COLUMNS}
            FROM bookings
            WHERE user_id = $1
            ORDER BY created_at DESC, seq DESC
            LIMIT $2 OFFSET $3
            "
        );
        let rows = sqlx::query(&sql)
            .bind(user_id.as_str())
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        rows.iter().map(booking_from_row).collect()
    }

    async fn count_confirmed(&self, class_id: ClassId) -> Result<u32> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM bookings WHERE class_id = $1 AND status = 'confirmed'",
        )
        .bind(class_id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        u32::try_from(count).map_err(|e| BookingError::DatabaseError(e.to_string()))
    }
}

impl ReviewStore for PostgresBookingStore {
    async fn insert_review(&self, review: &Review) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO reviews (
                id, class_id, user_id, user_name, rating, content, images, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ",
        )
        .bind(review.id.as_uuid())
        .bind(review.class_id.as_uuid())
        .bind(review.user_id.as_str())
        .bind(&review.user_name)
        .bind(i16::from(review.rating))
        .bind(&review.content)
        .bind(&review.images)
        .bind(review.created_at)
        .bind(review.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn list_class_reviews(&self, class_id: ClassId, page: Page) -> Result<Vec<Review>> {
        let (limit, offset) = page_bounds(page);
        let sql = format!(
            r"
            SELECT {REVIEW_COLUMNS}
            FROM reviews
            WHERE class_id = $1
            ORDER BY created_at DESC, seq DESC
            LIMIT $2 OFFSET $3
            "
        );
        let rows = sqlx::query(&sql)
            .bind(class_id.as_uuid())
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        rows.iter().map(review_from_row).collect()
    }

    async fn find_user_review(&self, class_id: ClassId, user_id: &UserId) -> Result<Option<Review>> {
        let sql = format!(
            r"
            SELECT {REVIEW_COLUMNS}
            FROM reviews
            WHERE class_id = $1 AND user_id = $2
            ORDER BY created_at DESC, seq DESC
            LIMIT 1
            "
        );
        let row = sqlx::query(&sql)
            .bind(class_id.as_uuid())
            .bind(user_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        row.as_ref().map(review_from_row).transpose()
    }
}

impl ReservationStore for PostgresBookingStore {
    type UnitOfWork = PostgresUnitOfWork;

    async fn begin(&self) -> Result<PostgresUnitOfWork> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        // Scoped to this transaction; a lock wait past it raises SQLSTATE 55P03.
        sqlx::query("SELECT set_config('lock_timeout', $1, true)")
            .bind(format!("{}ms", self.lock_timeout.as_millis()))
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        Ok(PostgresUnitOfWork { tx })
    }
}

/// Unit of work backed by a database transaction.
///
/// Dropping it without [`UnitOfWork::commit`] rolls the transaction back.
pub struct PostgresUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

impl UnitOfWork for PostgresUnitOfWork {
    async fn lock_class(&mut self, id: ClassId) -> Result<Option<Class>> {
        let sql = format!("SELECT {CLASS_COLUMNS} FROM classes WHERE id = $1 FOR UPDATE");
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(map_sqlx_error)?;
        row.as_ref().map(class_from_row).transpose()
    }

    async fn get_booking(&mut self, id: BookingId) -> Result<Option<Booking>> {
        let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(map_sqlx_error)?;
        row.as_ref().map(booking_from_row).transpose()
    }

    async fn lock_booking(&mut self, id: BookingId) -> Result<Option<Booking>> {
        let sql = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1 FOR UPDATE");
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(map_sqlx_error)?;
        row.as_ref().map(booking_from_row).transpose()
    }

    async fn find_confirmed_booking(
        &mut self,
        class_id: ClassId,
        user_id: &UserId,
    ) -> Result<Option<Booking>> {
        let sql = format!(
            r"
            SELECT {BOOKING_COLUMNS}
            FROM bookings
            WHERE class_id = $1 AND user_id = $2 AND status = 'confirmed'
            LIMIT 1
            "
        );
        let row = sqlx::query(&sql)
            .bind(class_id.as_uuid())
            .bind(user_id.as_str())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(map_sqlx_error)?;
        row.as_ref().map(booking_from_row).transpose()
    }

    async fn insert_booking(&mut self, booking: &Booking) -> Result<()> {
        let result = sqlx::query(
            r"
            INSERT INTO bookings (id, class_id, user_id, user_name, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(booking.id.as_uuid())
        .bind(booking.class_id.as_uuid())
        .bind(booking.user_id.as_str())
        .bind(&booking.user_name)
        .bind(booking.status.as_str())
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .execute(&mut *self.tx)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e, ONE_CONFIRMED_PER_USER) => {
                Err(BookingError::DuplicateBooking {
                    class_id: booking.class_id,
                    user_id: booking.user_id.clone(),
                })
            }
            Err(e) => Err(map_sqlx_error(e)),
        }
    }

    async fn set_booking_status(
        &mut self,
        id: BookingId,
        status: BookingStatus,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let result = sqlx::query("UPDATE bookings SET status = $2, updated_at = $3 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(status.as_str())
            .bind(now)
            .execute(&mut *self.tx)
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(BookingError::booking_not_found(id));
        }
        Ok(())
    }

    async fn increment_booked_count(&mut self, class_id: ClassId, now: DateTime<Utc>) -> Result<()> {
        let result = sqlx::query(
            r"
            UPDATE classes
            SET booked_count = booked_count + 1, updated_at = $2
            WHERE id = $1 AND booked_count < capacity
            ",
        )
        .bind(class_id.as_uuid())
        .bind(now)
        .execute(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(BookingError::DatabaseError(format!(
                "booked_count would exceed capacity on class {class_id}"
            )));
        }
        Ok(())
    }

    async fn decrement_booked_count(&mut self, class_id: ClassId, now: DateTime<Utc>) -> Result<()> {
        let result = sqlx::query(
            r"
            UPDATE classes
            SET booked_count = booked_count - 1, updated_at = $2
            WHERE id = $1 AND booked_count > 0
            ",
        )
        .bind(class_id.as_uuid())
        .bind(now)
        .execute(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(BookingError::DatabaseError(format!(
                "booked_count would go negative on class {class_id}"
            )));
        }
        Ok(())
    }

    async fn update_class(&mut self, class: &Class) -> Result<()> {
        sqlx::query(
            r"
            UPDATE classes
            SET name = $2, description = $3, instructor = $4,
                start_time = $5, end_time = $6, capacity = $7,
                status = $8, updated_at = $9
            WHERE id = $1
            ",
        )
        .bind(class.id.as_uuid())
        .bind(&class.name)
        .bind(&class.description)
        .bind(&class.instructor)
        .bind(class.start_time)
        .bind(class.end_time)
        .bind(to_db_count("capacity", class.capacity)?)
        .bind(class.status.as_str())
        .bind(class.updated_at)
        .execute(&mut *self.tx)
        .await
        .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn commit(self) -> Result<()> {
        self.tx.commit().await.map_err(map_sqlx_error)
    }
}
