//! Property tests: arbitrary book/cancel workloads never break the capacity invariants

#![allow(clippy::unwrap_used)] // Tests can unwrap
#![allow(clippy::expect_used)] // Tests can expect

use class_booking_core::{Booking, BookingError};
use class_booking_testing::properties::{BookingOp, booking_ops};
use class_booking_testing::{fixtures, test_service};
use proptest::prelude::*;
use std::collections::HashSet;

fn run_workload(capacity: u32, ops: Vec<BookingOp>) -> Result<(), TestCaseError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("runtime should build");

    runtime.block_on(async move {
        let (service, store) = test_service();
        let class = service
            .create_class(fixtures::new_class(capacity))
            .await
            .unwrap();

        let mut made: Vec<Booking> = Vec::new();
        let mut holders: HashSet<usize> = HashSet::new();

        for op in ops {
            match op {
                BookingOp::Book(n) => {
                    let result = service
                        .book_class(class.id, fixtures::user(n), format!("User {n}"))
                        .await;
                    let full = holders.len() >= capacity as usize;
                    match result {
                        Ok(booking) => {
                            prop_assert!(!full, "booked a full class");
                            prop_assert!(holders.insert(n), "double booking for user {}", n);
                            made.push(booking);
                        }
                        Err(BookingError::ClassFull { .. }) => prop_assert!(full),
                        Err(BookingError::DuplicateBooking { .. }) => {
                            prop_assert!(!full);
                            prop_assert!(holders.contains(&n));
                        }
                        Err(other) => prop_assert!(false, "unexpected error: {}", other),
                    }
                }
                BookingOp::Cancel(i) => {
                    if made.is_empty() {
                        continue;
                    }
                    let target = made[i % made.len()].clone();
                    let result = service.cancel_booking(target.id).await;
                    let user_index = target
                        .user_id
                        .as_str()
                        .trim_start_matches("user-")
                        .parse::<usize>()
                        .unwrap();
                    let still_confirmed = store.booking(target.id).unwrap().is_confirmed();
                    match result {
                        Ok(_) => {
                            prop_assert!(!still_confirmed);
                            holders.remove(&user_index);
                        }
                        Err(BookingError::InvalidBookingState { .. }) => {}
                        Err(other) => prop_assert!(false, "unexpected error: {}", other),
                    }
                }
            }

            let stored = store.class(class.id).unwrap();
            prop_assert_eq!(stored.booked_count as usize, holders.len());
            prop_assert!(stored.booked_count <= stored.capacity);
            prop_assert!(store.invariant_violations().is_empty());
        }
        Ok(())
    })
}

proptest! {
    #[test]
    fn prop_booked_count_tracks_confirmed_bookings(
        capacity in 0u32..5,
        ops in booking_ops(6, 40),
    ) {
        run_workload(capacity, ops)?;
    }
}
