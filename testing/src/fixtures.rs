//! Test inputs, timed relative to [`test_clock`](crate::test_clock).

use chrono::{DateTime, Duration, Utc};
use class_booking_core::catalog::NewClass;
use class_booking_core::environment::Clock;
use class_booking_core::reviews::NewReview;
use class_booking_core::types::UserId;

/// Start time of [`new_class`]: one day after the test clock.
#[must_use]
pub fn default_start() -> DateTime<Utc> {
    crate::test_clock().now() + Duration::days(1)
}

/// A one-hour class starting at [`default_start`].
#[must_use]
pub fn new_class(capacity: u32) -> NewClass {
    class_starting_at(default_start(), capacity)
}

/// A one-hour class starting at `start`.
#[must_use]
pub fn class_starting_at(start: DateTime<Utc>, capacity: u32) -> NewClass {
    NewClass {
        name: "Morning Flow".to_string(),
        description: "All-levels vinyasa".to_string(),
        instructor: "Ana".to_string(),
        start_time: start,
        end_time: start + Duration::hours(1),
        capacity,
    }
}

/// Distinct user IDs `user-0`, `user-1`, ...
#[must_use]
pub fn user(n: usize) -> UserId {
    UserId::new(format!("user-{n}"))
}

/// A review input with the given author and rating.
#[must_use]
pub fn new_review(user_id: &UserId, rating: i32) -> NewReview {
    NewReview {
        user_id: user_id.clone(),
        user_name: format!("Name of {user_id}"),
        rating,
        content: "Good session".to_string(),
        images: Vec::new(),
    }
}
