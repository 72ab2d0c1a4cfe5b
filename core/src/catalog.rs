//! Class catalog: class records, their creation input and listing filters.
//!
//! The catalog is plain CRUD. It never changes `booked_count`; edits to an existing
//! class go through a unit of work (see [`crate::unit_of_work`]) so they serialize
//! with bookings on the same class row.

use crate::error::{BookingError, Result};
use crate::types::{Class, ClassId, ClassStatus, Page};
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;

/// Read/write access to class records.
///
/// Each call sees a consistent snapshot; no locking contract beyond that.
pub trait ClassCatalog: Send + Sync {
    /// Persist a new class.
    ///
    /// # Errors
    ///
    /// Returns error if the store rejects the write.
    fn insert_class(&self, class: &Class) -> impl Future<Output = Result<()>> + Send;

    /// Fetch a class by ID, `None` if absent.
    ///
    /// # Errors
    ///
    /// Returns error if the store query fails.
    fn get_class(&self, id: ClassId) -> impl Future<Output = Result<Option<Class>>> + Send;

    /// List classes matching `query`, ascending by start time.
    ///
    /// # Errors
    ///
    /// Returns error if the store query fails.
    fn list_classes(
        &self,
        query: &ClassQuery,
        page: Page,
    ) -> impl Future<Output = Result<Vec<Class>>> + Send;
}

/// Input for creating a class.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewClass {
    /// Display name
    pub name: String,
    /// Free-text description
    #[serde(default)]
    pub description: String,
    /// Instructor name
    #[serde(default)]
    pub instructor: String,
    /// Start of the class
    pub start_time: DateTime<Utc>,
    /// End of the class
    pub end_time: DateTime<Utc>,
    /// Number of places
    pub capacity: u32,
}

impl NewClass {
    /// Check the input and build a scheduled class with no bookings.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Validation`] if the name is blank or the class
    /// does not end after it starts.
    pub fn into_class(self, now: DateTime<Utc>) -> Result<Class> {
        validate_name(&self.name)?;
        validate_window(self.start_time, self.end_time)?;

        Ok(Class {
            id: ClassId::new(),
            name: self.name,
            description: self.description,
            instructor: self.instructor,
            start_time: self.start_time,
            end_time: self.end_time,
            capacity: self.capacity,
            booked_count: 0,
            status: ClassStatus::Scheduled,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Partial update of a class. Absent fields are left unchanged.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassUpdate {
    /// New name
    pub name: Option<String>,
    /// New description
    pub description: Option<String>,
    /// New instructor
    pub instructor: Option<String>,
    /// New start time
    pub start_time: Option<DateTime<Utc>>,
    /// New end time
    pub end_time: Option<DateTime<Utc>>,
    /// New capacity; may not drop below the current `booked_count`
    pub capacity: Option<u32>,
    /// New status; only `scheduled` classes may change status
    pub status: Option<ClassStatus>,
}

impl ClassUpdate {
    /// Produce the updated class. `booked_count` is carried over untouched.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Validation`] if the result would break a class
    /// invariant or make an illegal status transition.
    pub fn apply(&self, current: &Class, now: DateTime<Utc>) -> Result<Class> {
        let mut next = current.clone();

        if let Some(name) = &self.name {
            validate_name(name)?;
            next.name.clone_from(name);
        }
        if let Some(description) = &self.description {
            next.description.clone_from(description);
        }
        if let Some(instructor) = &self.instructor {
            next.instructor.clone_from(instructor);
        }
        if let Some(start_time) = self.start_time {
            next.start_time = start_time;
        }
        if let Some(end_time) = self.end_time {
            next.end_time = end_time;
        }
        validate_window(next.start_time, next.end_time)?;

        if let Some(capacity) = self.capacity {
            if capacity < current.booked_count {
                return Err(BookingError::Validation(format!(
                    "capacity {capacity} is below the {} confirmed bookings",
                    current.booked_count
                )));
            }
            next.capacity = capacity;
        }

        if let Some(status) = self.status {
            if !current.status.can_transition_to(status) {
                return Err(BookingError::Validation(format!(
                    "class status cannot change from {} to {status}",
                    current.status
                )));
            }
            next.status = status;
        }

        next.updated_at = now;
        Ok(next)
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(BookingError::Validation("name is required".to_string()));
    }
    Ok(())
}

fn validate_window(start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> Result<()> {
    if end_time <= start_time {
        return Err(BookingError::Validation(
            "end_time must be after start_time".to_string(),
        ));
    }
    Ok(())
}

/// Time-range filter for class listings. Both bounds are inclusive.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClassQuery {
    /// Only classes with `start_time >= starts_from`
    pub starts_from: Option<DateTime<Utc>>,
    /// Only classes with `end_time <= ends_by`
    pub ends_by: Option<DateTime<Utc>>,
}

impl ClassQuery {
    /// No filter.
    #[must_use]
    pub const fn all() -> Self {
        Self {
            starts_from: None,
            ends_by: None,
        }
    }

    /// Whole calendar days: from 00:00:00 of `start_date` through 23:59:59 of `end_date`.
    #[must_use]
    pub fn from_dates(start_date: Option<NaiveDate>, end_date: Option<NaiveDate>) -> Self {
        Self {
            starts_from: start_date.map(start_of_day),
            ends_by: end_date.map(end_of_day),
        }
    }

    /// Monday 00:00:00 through Sunday 23:59:59 of the week containing `now`.
    #[must_use]
    pub fn current_week(now: DateTime<Utc>) -> Self {
        let today = now.date_naive();
        let monday = today - Duration::days(i64::from(today.weekday().num_days_from_monday()));
        Self::from_dates(Some(monday), Some(monday + Duration::days(6)))
    }

    /// Whether `class` falls inside the window.
    #[must_use]
    pub fn matches(&self, class: &Class) -> bool {
        self.starts_from.is_none_or(|from| class.start_time >= from)
            && self.ends_by.is_none_or(|by| class.end_time <= by)
    }
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    start_of_day(date) + Duration::days(1) - Duration::seconds(1)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn new_class(start: DateTime<Utc>) -> NewClass {
        NewClass {
            name: "Vinyasa".to_string(),
            description: "Flow class".to_string(),
            instructor: "Mei".to_string(),
            start_time: start,
            end_time: start + Duration::minutes(75),
            capacity: 12,
        }
    }

    #[test]
    fn test_new_class_starts_scheduled_and_empty() {
        let now = Utc::now();
        let class = new_class(now + Duration::days(1)).into_class(now).unwrap();
        assert_eq!(class.status, ClassStatus::Scheduled);
        assert_eq!(class.booked_count, 0);
        assert_eq!(class.created_at, now);
    }

    #[test]
    fn test_new_class_rejects_inverted_window() {
        let now = Utc::now();
        let mut input = new_class(now);
        input.end_time = input.start_time;
        assert!(matches!(
            input.into_class(now),
            Err(BookingError::Validation(_))
        ));
    }

    #[test]
    fn test_update_cannot_shrink_below_bookings() {
        let now = Utc::now();
        let mut class = new_class(now + Duration::days(1)).into_class(now).unwrap();
        class.booked_count = 5;

        let shrink = ClassUpdate {
            capacity: Some(4),
            ..ClassUpdate::default()
        };
        assert!(matches!(
            shrink.apply(&class, now),
            Err(BookingError::Validation(_))
        ));

        let exact = ClassUpdate {
            capacity: Some(5),
            ..ClassUpdate::default()
        };
        let updated = exact.apply(&class, now).unwrap();
        assert_eq!(updated.capacity, 5);
        assert_eq!(updated.booked_count, 5);
    }

    #[test]
    fn test_update_rejects_leaving_terminal_status() {
        let now = Utc::now();
        let mut class = new_class(now + Duration::days(1)).into_class(now).unwrap();
        class.status = ClassStatus::Cancelled;
        let reopen = ClassUpdate {
            status: Some(ClassStatus::Scheduled),
            ..ClassUpdate::default()
        };
        assert!(reopen.apply(&class, now).is_err());
    }

    #[test]
    fn test_current_week_spans_monday_to_sunday() {
        // Thursday
        let now = Utc.with_ymd_and_hms(2025, 3, 13, 15, 30, 0).unwrap();
        let week = ClassQuery::current_week(now);
        assert_eq!(
            week.starts_from,
            Some(Utc.with_ymd_and_hms(2025, 3, 10, 0, 0, 0).unwrap())
        );
        assert_eq!(
            week.ends_by,
            Some(Utc.with_ymd_and_hms(2025, 3, 16, 23, 59, 59).unwrap())
        );
    }

    #[test]
    fn test_current_week_on_sunday_looks_back() {
        let now = Utc.with_ymd_and_hms(2025, 3, 16, 8, 0, 0).unwrap();
        let week = ClassQuery::current_week(now);
        assert_eq!(
            week.starts_from,
            Some(Utc.with_ymd_and_hms(2025, 3, 10, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_query_bounds_are_inclusive() {
        let now = Utc::now();
        let class = new_class(Utc.with_ymd_and_hms(2025, 3, 10, 0, 0, 0).unwrap())
            .into_class(now)
            .unwrap();
        let query = ClassQuery {
            starts_from: Some(class.start_time),
            ends_by: Some(class.end_time),
        };
        assert!(query.matches(&class));
        assert!(ClassQuery::all().matches(&class));

        let later = ClassQuery {
            starts_from: Some(class.start_time + Duration::seconds(1)),
            ends_by: None,
        };
        assert!(!later.matches(&class));
    }
}
