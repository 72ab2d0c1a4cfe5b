//! Reservation coordinator behaviour against the in-memory store

#![allow(clippy::unwrap_used)] // Tests can unwrap
#![allow(clippy::expect_used)] // Tests can expect
#![allow(clippy::panic)] // Tests can panic

use chrono::Duration;
use class_booking_core::{
    BookingError, BookingStatus, ClassStatus, ClassUpdate, NotBookableReason, Page, UserId,
};
use class_booking_testing::{
    InMemoryBookingStore, fixtures, init_tracing, service_at, test_clock, test_service,
};
use class_booking_core::environment::Clock;
use std::sync::Arc;
use std::time::Duration as StdDuration;

#[tokio::test]
async fn test_end_to_end_capacity_two() {
    let (service, store) = test_service();
    let class = service.create_class(fixtures::new_class(2)).await.unwrap();
    assert_eq!(class.booked_count, 0);
    assert_eq!(class.status, ClassStatus::Scheduled);

    let u1 = service
        .book_class(class.id, fixtures::user(1), "One".into())
        .await
        .unwrap();
    assert_eq!(u1.status, BookingStatus::Confirmed);
    assert_eq!(store.class(class.id).unwrap().booked_count, 1);

    service
        .book_class(class.id, fixtures::user(2), "Two".into())
        .await
        .unwrap();
    assert_eq!(store.class(class.id).unwrap().booked_count, 2);

    let err = service
        .book_class(class.id, fixtures::user(3), "Three".into())
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::ClassFull { capacity: 2, .. }));
    assert_eq!(store.class(class.id).unwrap().booked_count, 2);

    let cancelled = service.cancel_booking(u1.id).await.unwrap();
    assert_eq!(cancelled.status, BookingStatus::Cancelled);
    assert_eq!(store.class(class.id).unwrap().booked_count, 1);
    assert_eq!(
        store.booking(u1.id).unwrap().status,
        BookingStatus::Cancelled
    );

    service
        .book_class(class.id, fixtures::user(3), "Three".into())
        .await
        .unwrap();
    assert_eq!(store.class(class.id).unwrap().booked_count, 2);

    store.assert_invariants();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_last_place_race_has_one_winner() {
    init_tracing();
    let (service, store) = test_service();
    let class = service.create_class(fixtures::new_class(1)).await.unwrap();

    let attempts: Vec<_> = (0..16)
        .map(|n| {
            let service = service.clone();
            tokio::spawn(async move {
                service
                    .book_class(class.id, fixtures::user(n), format!("User {n}"))
                    .await
            })
        })
        .collect();

    let mut confirmed = 0;
    for attempt in attempts {
        match attempt.await.unwrap() {
            Ok(_) => confirmed += 1,
            Err(BookingError::ClassFull { .. }) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(confirmed, 1);
    assert_eq!(store.class(class.id).unwrap().booked_count, 1);
    assert_eq!(store.confirmed_count(class.id), 1);
    store.assert_invariants();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_book_and_cancel_keep_counts_exact() {
    init_tracing();
    let (service, store) = test_service();
    let class = service.create_class(fixtures::new_class(5)).await.unwrap();

    let mut seeded = Vec::new();
    for n in 0..5 {
        seeded.push(
            service
                .book_class(class.id, fixtures::user(n), "Seed".into())
                .await
                .unwrap(),
        );
    }

    let mut tasks = Vec::new();
    for booking in seeded {
        let service = service.clone();
        tasks.push(tokio::spawn(async move {
            service.cancel_booking(booking.id).await.map(|_| ())
        }));
    }
    for n in 100..110 {
        let service = service.clone();
        tasks.push(tokio::spawn(async move {
            service
                .book_class(class.id, fixtures::user(n), "Late".into())
                .await
                .map(|_| ())
        }));
    }

    for task in tasks {
        match task.await.unwrap() {
            Ok(()) | Err(BookingError::ClassFull { .. }) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    let stored = store.class(class.id).unwrap();
    assert!(stored.booked_count <= stored.capacity);
    store.assert_invariants();
}

#[tokio::test]
async fn test_duplicate_booking_rejected() {
    let (service, store) = test_service();
    let class = service.create_class(fixtures::new_class(3)).await.unwrap();
    let user = fixtures::user(1);

    service
        .book_class(class.id, user.clone(), "One".into())
        .await
        .unwrap();
    let err = service
        .book_class(class.id, user.clone(), "One".into())
        .await
        .unwrap_err();

    assert_eq!(
        err,
        BookingError::DuplicateBooking {
            class_id: class.id,
            user_id: user
        }
    );
    assert_eq!(store.class(class.id).unwrap().booked_count, 1);
    assert_eq!(store.booking_count(), 1);
}

#[tokio::test]
async fn test_capacity_checked_before_duplicate() {
    let (service, _store) = test_service();
    let class = service.create_class(fixtures::new_class(1)).await.unwrap();
    let user = fixtures::user(1);

    service
        .book_class(class.id, user.clone(), "One".into())
        .await
        .unwrap();
    let err = service
        .book_class(class.id, user, "One".into())
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::ClassFull { .. }));
}

#[tokio::test]
async fn test_cancel_then_rebook_same_user() {
    let (service, store) = test_service();
    let class = service.create_class(fixtures::new_class(1)).await.unwrap();
    let user = fixtures::user(1);

    let first = service
        .book_class(class.id, user.clone(), "One".into())
        .await
        .unwrap();
    service.cancel_booking(first.id).await.unwrap();
    assert_eq!(store.class(class.id).unwrap().booked_count, 0);

    let second = service
        .book_class(class.id, user.clone(), "One".into())
        .await
        .unwrap();
    assert_ne!(first.id, second.id);
    assert_eq!(store.class(class.id).unwrap().booked_count, 1);

    let history = service
        .list_user_bookings(&user, Page::default())
        .await
        .unwrap();
    assert_eq!(history.len(), 2);
    store.assert_invariants();
}

#[tokio::test]
async fn test_cancel_twice_is_invalid_state() {
    let (service, store) = test_service();
    let class = service.create_class(fixtures::new_class(2)).await.unwrap();
    let booking = service
        .book_class(class.id, fixtures::user(1), "One".into())
        .await
        .unwrap();

    service.cancel_booking(booking.id).await.unwrap();
    let err = service.cancel_booking(booking.id).await.unwrap_err();

    assert_eq!(
        err,
        BookingError::InvalidBookingState {
            booking_id: booking.id,
            status: BookingStatus::Cancelled
        }
    );
    assert_eq!(store.class(class.id).unwrap().booked_count, 0);
}

#[tokio::test]
async fn test_unknown_ids_are_not_found() {
    let (service, _store) = test_service();

    let err = service
        .book_class(
            class_booking_core::ClassId::new(),
            fixtures::user(1),
            "One".into(),
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), "NOT_FOUND");

    let missing = class_booking_core::BookingId::new();
    assert_eq!(
        service.cancel_booking(missing).await.unwrap_err(),
        BookingError::booking_not_found(missing)
    );
    assert!(service.get_booking(missing).await.is_err());
}

#[tokio::test]
async fn test_started_class_not_bookable() {
    let store = InMemoryBookingStore::new();
    let early = service_at(&store, test_clock().now());
    let class = early.create_class(fixtures::new_class(5)).await.unwrap();

    let at_start = service_at(&store, class.start_time);
    let err = at_start
        .book_class(class.id, fixtures::user(1), "One".into())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        BookingError::ClassNotBookable {
            reason: NotBookableReason::AlreadyStarted,
            ..
        }
    ));

    let just_before = service_at(&store, class.start_time - Duration::seconds(1));
    assert!(
        just_before
            .book_class(class.id, fixtures::user(1), "One".into())
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn test_cancelled_class_not_bookable() {
    let (service, store) = test_service();
    let class = service.create_class(fixtures::new_class(5)).await.unwrap();

    let update = ClassUpdate {
        status: Some(ClassStatus::Cancelled),
        ..ClassUpdate::default()
    };
    service.update_class(class.id, &update).await.unwrap();

    let err = service
        .book_class(class.id, fixtures::user(1), "One".into())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        BookingError::ClassNotBookable {
            reason: NotBookableReason::ClassCancelled,
            ..
        }
    ));
    assert_eq!(store.booking_count(), 0);
}

#[tokio::test]
async fn test_blank_user_rejected_without_writes() {
    let (service, store) = test_service();
    let class = service.create_class(fixtures::new_class(5)).await.unwrap();

    let err = service
        .book_class(class.id, UserId::new(" "), "Nobody".into())
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::Validation(_)));
    assert_eq!(store.booking_count(), 0);

    assert!(
        service
            .list_user_bookings(&UserId::new(""), Page::default())
            .await
            .is_err()
    );
}

#[tokio::test]
async fn test_failed_commit_leaves_no_trace() {
    let (service, store) = test_service();
    let class = service.create_class(fixtures::new_class(2)).await.unwrap();
    let booking = service
        .book_class(class.id, fixtures::user(1), "One".into())
        .await
        .unwrap();

    store.fail_commits(true);

    let err = service
        .book_class(class.id, fixtures::user(2), "Two".into())
        .await
        .unwrap_err();
    assert!(err.is_transient());

    let err = service.cancel_booking(booking.id).await.unwrap_err();
    assert!(err.is_transient());

    assert_eq!(store.class(class.id).unwrap().booked_count, 1);
    assert_eq!(store.booking_count(), 1);
    assert_eq!(
        store.booking(booking.id).unwrap().status,
        BookingStatus::Confirmed
    );
    store.assert_invariants();
}

#[tokio::test]
async fn test_lock_timeout_surfaces_as_transient() {
    init_tracing();
    let store = InMemoryBookingStore::new().with_lock_timeout(StdDuration::from_millis(50));
    let service = class_booking_core::BookingService::new(
        Arc::new(store.clone()),
        Arc::new(test_clock()),
    );
    let class = service.create_class(fixtures::new_class(2)).await.unwrap();

    let _held = store.hold_class_lock(class.id).await;
    let err = service
        .book_class(class.id, fixtures::user(1), "One".into())
        .await
        .unwrap_err();

    assert!(err.is_transient());
    assert_eq!(store.booking_count(), 0);
}

#[tokio::test]
async fn test_update_class_respects_bookings() {
    let (service, store) = test_service();
    let class = service.create_class(fixtures::new_class(3)).await.unwrap();
    for n in 0..2 {
        service
            .book_class(class.id, fixtures::user(n), "Someone".into())
            .await
            .unwrap();
    }

    let shrink = ClassUpdate {
        capacity: Some(1),
        ..ClassUpdate::default()
    };
    assert!(matches!(
        service.update_class(class.id, &shrink).await,
        Err(BookingError::Validation(_))
    ));

    let rename = ClassUpdate {
        name: Some("Power Flow".to_string()),
        capacity: Some(2),
        ..ClassUpdate::default()
    };
    let updated = service.update_class(class.id, &rename).await.unwrap();
    assert_eq!(updated.name, "Power Flow");
    assert_eq!(updated.booked_count, 2);
    assert!(!updated.is_available());

    assert_eq!(store.class(class.id).unwrap(), updated);
    store.assert_invariants();

    assert!(matches!(
        service
            .update_class(class_booking_core::ClassId::new(), &rename)
            .await,
        Err(BookingError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_reviews_are_independent_of_bookings() {
    let (service, _store) = test_service();
    let class = service.create_class(fixtures::new_class(1)).await.unwrap();
    let user = fixtures::user(1);

    for bad in [0, 6] {
        let err = service
            .create_review(class.id, fixtures::new_review(&user, bad))
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::Validation(_)));
    }
    for rating in 1..=5 {
        service
            .create_review(class.id, fixtures::new_review(&user, rating))
            .await
            .unwrap();
    }

    let reviews = service
        .list_class_reviews(class.id, Page::new(20, 0))
        .await
        .unwrap();
    assert_eq!(reviews.len(), 5);

    let latest = service
        .get_user_review(class.id, &user)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(latest.rating, 5);

    assert!(
        service
            .get_user_review(class.id, &fixtures::user(2))
            .await
            .unwrap()
            .is_none()
    );

    let err = service
        .create_review(
            class_booking_core::ClassId::new(),
            fixtures::new_review(&user, 4),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::NotFound { .. }));
}
