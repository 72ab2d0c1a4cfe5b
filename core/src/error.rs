//! Error types for catalog, booking and review operations.

use crate::types::{BookingId, BookingStatus, ClassId, UserId};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Result type alias for booking operations.
pub type Result<T> = std::result::Result<T, BookingError>;

/// Kind of record a lookup failed to find.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resource {
    /// A class in the catalog
    Class,
    /// A booking in the ledger
    Booking,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Class => f.write_str("Class"),
            Self::Booking => f.write_str("Booking"),
        }
    }
}

/// Why a class refused a booking for a reason other than capacity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotBookableReason {
    /// The class was cancelled
    ClassCancelled,
    /// The class already took place
    ClassCompleted,
    /// The class start time has been reached
    AlreadyStarted,
}

impl NotBookableReason {
    /// Short label used in logs and metrics.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ClassCancelled => "class_cancelled",
            Self::ClassCompleted => "class_completed",
            Self::AlreadyStarted => "already_started",
        }
    }
}

impl fmt::Display for NotBookableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClassCancelled => f.write_str("class has been cancelled"),
            Self::ClassCompleted => f.write_str("class has already completed"),
            Self::AlreadyStarted => f.write_str("class has already started"),
        }
    }
}

/// Error taxonomy for the reservation engine.
///
/// Every coordinator failure aborts its unit of work, so any of these errors
/// implies persisted state is unchanged.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BookingError {
    // ═══════════════════════════════════════════════════════════
    // Lookup
    // ═══════════════════════════════════════════════════════════

    /// Class or booking absent.
    #[error("{resource} not found: {id}")]
    NotFound {
        /// Kind of record
        resource: Resource,
        /// Requested identifier
        id: Uuid,
    },

    // ═══════════════════════════════════════════════════════════
    // Reservation rules
    // ═══════════════════════════════════════════════════════════

    /// Every place in the class is taken.
    #[error("Class {class_id} is full (capacity {capacity})")]
    ClassFull {
        /// Target class
        class_id: ClassId,
        /// Capacity at evaluation time
        capacity: u32,
    },

    /// The class is cancelled, completed or already started.
    #[error("Class {class_id} is not bookable: {reason}")]
    ClassNotBookable {
        /// Target class
        class_id: ClassId,
        /// Why booking was refused
        reason: NotBookableReason,
    },

    /// The user already holds a confirmed booking for this class.
    #[error("User {user_id} already has a confirmed booking for class {class_id}")]
    DuplicateBooking {
        /// Target class
        class_id: ClassId,
        /// Booking user
        user_id: UserId,
    },

    /// Only confirmed bookings can be cancelled.
    #[error("Booking {booking_id} cannot be cancelled from status {status}")]
    InvalidBookingState {
        /// Target booking
        booking_id: BookingId,
        /// Status found
        status: BookingStatus,
    },

    /// Input rejected before touching storage.
    #[error("Validation failed: {0}")]
    Validation(String),

    // ═══════════════════════════════════════════════════════════
    // Storage
    // ═══════════════════════════════════════════════════════════

    /// Lock-wait timeout, serialization failure or deadlock; safe to retry by the caller.
    #[error("Transient storage failure: {0}")]
    Transient(String),

    /// Any other storage failure.
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl BookingError {
    /// Class lookup failure.
    #[must_use]
    pub const fn class_not_found(id: ClassId) -> Self {
        Self::NotFound {
            resource: Resource::Class,
            id: *id.as_uuid(),
        }
    }

    /// Booking lookup failure.
    #[must_use]
    pub const fn booking_not_found(id: BookingId) -> Self {
        Self::NotFound {
            resource: Resource::Booking,
            id: *id.as_uuid(),
        }
    }

    /// Whether the caller may reasonably retry the same request.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }

    /// Stable machine-readable code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::ClassFull { .. } => "CLASS_FULL",
            Self::ClassNotBookable { .. } => "CLASS_NOT_BOOKABLE",
            Self::DuplicateBooking { .. } => "DUPLICATE_BOOKING",
            Self::InvalidBookingState { .. } => "INVALID_BOOKING_STATE",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Transient(_) => "TRANSIENT_FAILURE",
            Self::DatabaseError(_) => "DATABASE_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let id = ClassId::new();
        let err = BookingError::class_not_found(id);
        assert_eq!(err.to_string(), format!("Class not found: {id}"));
        assert_eq!(err.code(), "NOT_FOUND");
    }

    #[test]
    fn test_only_transient_is_retryable() {
        assert!(BookingError::Transient("lock timeout".into()).is_transient());
        assert!(!BookingError::DatabaseError("boom".into()).is_transient());
        assert!(!BookingError::Validation("rating".into()).is_transient());
    }

    #[test]
    fn test_not_bookable_display() {
        let class_id = ClassId::new();
        let err = BookingError::ClassNotBookable {
            class_id,
            reason: NotBookableReason::AlreadyStarted,
        };
        assert_eq!(
            err.to_string(),
            format!("Class {class_id} is not bookable: class has already started")
        );
    }
}
