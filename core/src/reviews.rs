//! Class reviews.
//!
//! Reviews are independent of the reservation path: a user may review a class
//! without having booked it, and may leave more than one review.

use crate::error::{BookingError, Result};
use crate::types::{ClassId, Page, Review, ReviewId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;

/// Lowest accepted rating.
pub const MIN_RATING: i32 = 1;
/// Highest accepted rating.
pub const MAX_RATING: i32 = 5;

/// Storage for reviews.
pub trait ReviewStore: Send + Sync {
    /// Persist a review.
    ///
    /// # Errors
    ///
    /// Returns error if the store rejects the write.
    fn insert_review(&self, review: &Review) -> impl Future<Output = Result<()>> + Send;

    /// Reviews for a class, newest first.
    ///
    /// # Errors
    ///
    /// Returns error if the store query fails.
    fn list_class_reviews(
        &self,
        class_id: ClassId,
        page: Page,
    ) -> impl Future<Output = Result<Vec<Review>>> + Send;

    /// The user's most recent review of a class, if any.
    ///
    /// # Errors
    ///
    /// Returns error if the store query fails.
    fn find_user_review(
        &self,
        class_id: ClassId,
        user_id: &UserId,
    ) -> impl Future<Output = Result<Option<Review>>> + Send;
}

/// Input for a new review.
///
/// `rating` is taken as a wide integer so that out-of-range input is reported
/// as a validation error rather than a decoding failure.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReview {
    /// Author
    pub user_id: UserId,
    /// Author display name
    #[serde(default)]
    pub user_name: String,
    /// Rating, 1 to 5
    pub rating: i32,
    /// Free-text content
    #[serde(default)]
    pub content: String,
    /// Image references
    #[serde(default)]
    pub images: Vec<String>,
}

impl NewReview {
    /// Validate and build the review record.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Validation`] if the user ID is blank or the rating
    /// is outside `1..=5`.
    pub fn into_review(self, class_id: ClassId, now: DateTime<Utc>) -> Result<Review> {
        self.user_id.validate()?;
        let rating = u8::try_from(self.rating)
            .ok()
            .filter(|r| (MIN_RATING..=MAX_RATING).contains(&i32::from(*r)))
            .ok_or_else(|| {
                BookingError::Validation(format!(
                    "rating must be between {MIN_RATING} and {MAX_RATING}, got {}",
                    self.rating
                ))
            })?;

        Ok(Review {
            id: ReviewId::new(),
            class_id,
            user_id: self.user_id,
            user_name: self.user_name,
            rating,
            content: self.content,
            images: self.images,
            created_at: now,
            updated_at: now,
        })
    }
}
