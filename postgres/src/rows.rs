//! Row decoding and the column lists the queries select.

use class_booking_core::error::{BookingError, Result};
use class_booking_core::types::{
    Booking, BookingId, BookingStatus, Class, ClassId, ClassStatus, Review, ReviewId, UserId,
};
use sqlx::Row;
use sqlx::postgres::PgRow;
use uuid::Uuid;

pub const CLASS_COLUMNS: &str = "id, name, description, instructor, start_time, end_time, \
     capacity, booked_count, status, created_at, updated_at";

pub const BOOKING_COLUMNS: &str = "id, class_id, user_id, user_name, status, created_at, updated_at";

pub const REVIEW_COLUMNS: &str =
    "id, class_id, user_id, user_name, rating, content, images, created_at, updated_at";

fn decode(err: sqlx::Error) -> BookingError {
    BookingError::DatabaseError(format!("Failed to decode row: {err}"))
}

fn non_negative(column: &str, value: i32) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| BookingError::DatabaseError(format!("Negative {column}: {value}")))
}

/// Store a `u32` count in an `INTEGER` column.
pub fn to_db_count(column: &str, value: u32) -> Result<i32> {
    i32::try_from(value)
        .map_err(|_| BookingError::Validation(format!("{column} {value} is too large")))
}

pub fn class_from_row(row: &PgRow) -> Result<Class> {
    let status: String = row.try_get("status").map_err(decode)?;
    Ok(Class {
        id: ClassId::from_uuid(row.try_get::<Uuid, _>("id").map_err(decode)?),
        name: row.try_get("name").map_err(decode)?,
        description: row.try_get("description").map_err(decode)?,
        instructor: row.try_get("instructor").map_err(decode)?,
        start_time: row.try_get("start_time").map_err(decode)?,
        end_time: row.try_get("end_time").map_err(decode)?,
        capacity: non_negative("capacity", row.try_get("capacity").map_err(decode)?)?,
        booked_count: non_negative("booked_count", row.try_get("booked_count").map_err(decode)?)?,
        status: ClassStatus::parse(&status)?,
        created_at: row.try_get("created_at").map_err(decode)?,
        updated_at: row.try_get("updated_at").map_err(decode)?,
    })
}

pub fn booking_from_row(row: &PgRow) -> Result<Booking> {
    let status: String = row.try_get("status").map_err(decode)?;
    Ok(Booking {
        id: BookingId::from_uuid(row.try_get::<Uuid, _>("id").map_err(decode)?),
        class_id: ClassId::from_uuid(row.try_get::<Uuid, _>("class_id").map_err(decode)?),
        user_id: UserId::new(row.try_get::<String, _>("user_id").map_err(decode)?),
        user_name: row.try_get("user_name").map_err(decode)?,
        status: BookingStatus::parse(&status)?,
        created_at: row.try_get("created_at").map_err(decode)?,
        updated_at: row.try_get("updated_at").map_err(decode)?,
    })
}

pub fn review_from_row(row: &PgRow) -> Result<Review> {
    let rating: i16 = row.try_get("rating").map_err(decode)?;
    Ok(Review {
        id: ReviewId::from_uuid(row.try_get::<Uuid, _>("id").map_err(decode)?),
        class_id: ClassId::from_uuid(row.try_get::<Uuid, _>("class_id").map_err(decode)?),
        user_id: UserId::new(row.try_get::<String, _>("user_id").map_err(decode)?),
        user_name: row.try_get("user_name").map_err(decode)?,
        rating: u8::try_from(rating)
            .map_err(|_| BookingError::DatabaseError(format!("Invalid rating: {rating}")))?,
        content: row.try_get("content").map_err(decode)?,
        images: row.try_get("images").map_err(decode)?,
        created_at: row.try_get("created_at").map_err(decode)?,
        updated_at: row.try_get("updated_at").map_err(decode)?,
    })
}
