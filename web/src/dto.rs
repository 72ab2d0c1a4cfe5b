//! Request and response bodies.
//!
//! Domain types serialize directly where their shape is already right; the
//! types here add what the HTTP surface needs on top.

use chrono::NaiveDate;
use class_booking_core::types::{Class, Page, Review};
use serde::{Deserialize, Serialize};

/// Default page size for class and booking listings.
pub const DEFAULT_LIMIT: u32 = 50;
/// Default page size for review listings.
pub const DEFAULT_REVIEW_LIMIT: u32 = 20;

/// A class with its availability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassResponse {
    /// The class record
    #[serde(flatten)]
    pub class: Class,
    /// Places still free
    pub available_slots: u32,
    /// Scheduled and not full
    pub is_available: bool,
}

impl From<Class> for ClassResponse {
    fn from(class: Class) -> Self {
        Self {
            available_slots: class.available_slots(),
            is_available: class.is_available(),
            class,
        }
    }
}

/// A page of results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse<T> {
    /// Items on this page
    pub items: Vec<T>,
    /// Page size used
    pub limit: u32,
    /// Items skipped
    pub offset: u32,
}

impl<T> ListResponse<T> {
    /// Wrap a page of items.
    #[must_use]
    pub const fn new(items: Vec<T>, page: Page) -> Self {
        Self {
            items,
            limit: page.limit,
            offset: page.offset,
        }
    }
}

/// Body of `POST /classes/:id/book`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookClassRequest {
    /// Booking user
    pub user_id: String,
    /// User display name
    #[serde(default)]
    pub user_name: String,
}

/// Query of `GET /classes`.
///
/// Dates are `YYYY-MM-DD`. With neither given, the current week is listed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListClassesParams {
    /// First day, from 00:00:00
    pub start_date: Option<NaiveDate>,
    /// Last day, through 23:59:59
    pub end_date: Option<NaiveDate>,
    /// Page size
    pub limit: Option<u32>,
    /// Items to skip
    pub offset: Option<u32>,
}

/// Query of `GET /bookings`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListBookingsParams {
    /// Whose bookings to list; required
    pub user_id: Option<String>,
    /// Page size
    pub limit: Option<u32>,
    /// Items to skip
    pub offset: Option<u32>,
}

/// Pagination-only query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageParams {
    /// Page size
    pub limit: Option<u32>,
    /// Items to skip
    pub offset: Option<u32>,
}

/// Build a page from optional query values.
#[must_use]
pub fn page(limit: Option<u32>, offset: Option<u32>, default_limit: u32) -> Page {
    Page::new(limit.unwrap_or(default_limit), offset.unwrap_or(0))
}

/// Body of `GET /classes/:id/reviews/users/:user_id`.
///
/// `review` is `null` when the user has not reviewed the class.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserReviewResponse {
    /// Most recent review, if any
    pub review: Option<Review>,
}
