//! Mapping from sqlx failures onto the booking error taxonomy.

use class_booking_core::error::BookingError;

/// `lock_not_available`: the per-transaction `lock_timeout` fired.
pub const LOCK_NOT_AVAILABLE: &str = "55P03";
/// `serialization_failure`
pub const SERIALIZATION_FAILURE: &str = "40001";
/// `deadlock_detected`
pub const DEADLOCK_DETECTED: &str = "40P01";

/// Partial unique index allowing one confirmed booking per user and class.
pub const ONE_CONFIRMED_PER_USER: &str = "bookings_one_confirmed_per_user";

/// Classify a sqlx error.
///
/// Lock waits, serialization failures, deadlocks and pool exhaustion are
/// [`BookingError::Transient`]; everything else is [`BookingError::DatabaseError`].
pub fn map_sqlx_error(err: sqlx::Error) -> BookingError {
    match &err {
        sqlx::Error::PoolTimedOut => {
            metrics::counter!("booking_store_transient_errors_total", "kind" => "pool_timeout")
                .increment(1);
            BookingError::Transient("timed out acquiring a database connection".to_string())
        }
        sqlx::Error::Database(db) => match db.code().as_deref() {
            Some(code @ (LOCK_NOT_AVAILABLE | SERIALIZATION_FAILURE | DEADLOCK_DETECTED)) => {
                metrics::counter!("booking_store_transient_errors_total", "kind" => code.to_string())
                    .increment(1);
                tracing::debug!(sqlstate = code, error = %db, "Transient database failure");
                BookingError::Transient(db.message().to_string())
            }
            _ => BookingError::DatabaseError(err.to_string()),
        },
        _ => BookingError::DatabaseError(err.to_string()),
    }
}

/// Whether `err` is a violation of the named unique constraint.
pub fn is_unique_violation(err: &sqlx::Error, constraint: &str) -> bool {
    match err {
        sqlx::Error::Database(db) => db.is_unique_violation() && db.constraint() == Some(constraint),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_timeout_is_transient() {
        assert!(map_sqlx_error(sqlx::Error::PoolTimedOut).is_transient());
    }

    #[test]
    fn test_row_not_found_is_database_error() {
        assert!(matches!(
            map_sqlx_error(sqlx::Error::RowNotFound),
            BookingError::DatabaseError(_)
        ));
        assert!(!is_unique_violation(
            &sqlx::Error::RowNotFound,
            ONE_CONFIRMED_PER_USER
        ));
    }
}
