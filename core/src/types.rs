//! Domain types for the class booking engine.
//!
//! This module contains the identifiers, records and status enums shared by every
//! component: the class catalog, the booking ledger, the review store and the
//! reservation coordinator.

use crate::error::{BookingError, NotBookableReason, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

/// Unique identifier for a scheduled class
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassId(Uuid);

impl ClassId {
    /// Creates a new random `ClassId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `ClassId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ClassId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a booking
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookingId(Uuid);

impl BookingId {
    /// Creates a new random `BookingId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `BookingId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for BookingId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BookingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a review
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReviewId(Uuid);

impl ReviewId {
    /// Creates a new random `ReviewId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a `ReviewId` from a `Uuid`
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ReviewId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ReviewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of the person making a booking or writing a review.
///
/// Issued by an external identity provider, so it is an opaque string rather than a UUID.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Wrap an external user identifier
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Reject blank identifiers.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Validation`] if the identifier is empty or whitespace.
    pub fn validate(&self) -> Result<()> {
        if self.0.trim().is_empty() {
            return Err(BookingError::Validation("user_id is required".to_string()));
        }
        Ok(())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

// ============================================================================
// Statuses
// ============================================================================

/// Lifecycle status of a class
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassStatus {
    /// Open for bookings until it starts
    Scheduled,
    /// Called off; terminal
    Cancelled,
    /// Took place; terminal
    Completed,
}

impl ClassStatus {
    /// Convert status to database string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
        }
    }

    /// Parse status from its string representation.
    ///
    /// # Errors
    ///
    /// Returns error if the string doesn't match a known status.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "scheduled" => Ok(Self::Scheduled),
            "cancelled" => Ok(Self::Cancelled),
            "completed" => Ok(Self::Completed),
            _ => Err(BookingError::DatabaseError(format!(
                "Invalid class status: {s}"
            ))),
        }
    }

    /// Whether a class in this status may move to `next`.
    ///
    /// Only `scheduled` classes change status; staying put is always allowed.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self == next || self == Self::Scheduled
    }
}

impl fmt::Display for ClassStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle status of a booking
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    /// Holds one unit of the class capacity
    Confirmed,
    /// Released by the user; terminal
    Cancelled,
    /// Attended; terminal, set outside this engine
    Completed,
}

impl BookingStatus {
    /// Convert status to database string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
        }
    }

    /// Parse status from its string representation.
    ///
    /// # Errors
    ///
    /// Returns error if the string doesn't match a known status.
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "confirmed" => Ok(Self::Confirmed),
            "cancelled" => Ok(Self::Cancelled),
            "completed" => Ok(Self::Completed),
            _ => Err(BookingError::DatabaseError(format!(
                "Invalid booking status: {s}"
            ))),
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Records
// ============================================================================

/// A scheduled class with a finite number of places.
///
/// `booked_count` always equals the number of confirmed bookings for the class and
/// never exceeds `capacity`. Only the reservation coordinator changes it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Class {
    /// Class ID
    pub id: ClassId,
    /// Display name
    pub name: String,
    /// Free-text description
    pub description: String,
    /// Instructor name
    pub instructor: String,
    /// When the class starts; bookings close at this instant
    pub start_time: DateTime<Utc>,
    /// When the class ends
    pub end_time: DateTime<Utc>,
    /// Maximum number of simultaneously confirmed bookings
    pub capacity: u32,
    /// Number of confirmed bookings
    pub booked_count: u32,
    /// Lifecycle status
    pub status: ClassStatus,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

impl Class {
    /// Places still free.
    #[must_use]
    pub const fn available_slots(&self) -> u32 {
        self.capacity.saturating_sub(self.booked_count)
    }

    /// Scheduled and not full, regardless of the clock.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.status == ClassStatus::Scheduled && self.booked_count < self.capacity
    }

    /// Evaluate whether one more booking may be admitted at `now`.
    ///
    /// Checks run in order: status, start time, capacity.
    ///
    /// # Errors
    ///
    /// - [`BookingError::ClassNotBookable`] if the class is not scheduled or has started
    /// - [`BookingError::ClassFull`] if every place is taken
    pub fn ensure_bookable(&self, now: DateTime<Utc>) -> Result<()> {
        let reason = match self.status {
            ClassStatus::Scheduled => None,
            ClassStatus::Cancelled => Some(NotBookableReason::ClassCancelled),
            ClassStatus::Completed => Some(NotBookableReason::ClassCompleted),
        };
        if let Some(reason) = reason {
            return Err(BookingError::ClassNotBookable {
                class_id: self.id,
                reason,
            });
        }

        if now >= self.start_time {
            return Err(BookingError::ClassNotBookable {
                class_id: self.id,
                reason: NotBookableReason::AlreadyStarted,
            });
        }

        if self.booked_count >= self.capacity {
            return Err(BookingError::ClassFull {
                class_id: self.id,
                capacity: self.capacity,
            });
        }

        Ok(())
    }
}

/// A user's claim on one place in a class.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    /// Booking ID
    pub id: BookingId,
    /// Booked class
    pub class_id: ClassId,
    /// Booking user
    pub user_id: UserId,
    /// User display name at booking time
    pub user_name: String,
    /// Lifecycle status
    pub status: BookingStatus,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// A fresh confirmed booking.
    #[must_use]
    pub fn confirmed(
        class_id: ClassId,
        user_id: UserId,
        user_name: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: BookingId::new(),
            class_id,
            user_id,
            user_name,
            status: BookingStatus::Confirmed,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether this booking counts against the class capacity.
    #[must_use]
    pub const fn is_confirmed(&self) -> bool {
        matches!(self.status, BookingStatus::Confirmed)
    }
}

/// A rating left for a class.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    /// Review ID
    pub id: ReviewId,
    /// Reviewed class
    pub class_id: ClassId,
    /// Author
    pub user_id: UserId,
    /// Author display name
    pub user_name: String,
    /// Rating from 1 to 5
    pub rating: u8,
    /// Free-text content
    pub content: String,
    /// Image references (URLs or object keys)
    pub images: Vec<String>,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

// ============================================================================
// Pagination
// ============================================================================

/// Limit/offset window over an ordered listing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    /// Maximum number of items returned
    pub limit: u32,
    /// Number of items skipped
    pub offset: u32,
}

impl Page {
    /// Largest page a caller may request.
    pub const MAX_LIMIT: u32 = 100;

    /// Build a page, clamping `limit` into `1..=MAX_LIMIT`.
    #[must_use]
    pub fn new(limit: u32, offset: u32) -> Self {
        Self {
            limit: limit.clamp(1, Self::MAX_LIMIT),
            offset,
        }
    }

    /// Apply the window to an already ordered iterator.
    pub fn slice<T>(&self, items: impl IntoIterator<Item = T>) -> Vec<T> {
        items
            .into_iter()
            .skip(self.offset as usize)
            .take(self.limit as usize)
            .collect()
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(50, 0)
    }
}
