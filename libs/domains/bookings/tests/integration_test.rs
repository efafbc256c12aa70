//! Integration tests for the PostgreSQL booking repository
//!
//! Run against a real PostgreSQL container with the service's migrations,
//! so the item row lock, the `booking_status` enum and the RESTRICT foreign
//! key are the real ones.

use chrono::{DateTime, TimeZone, Utc};
use domain_bookings::*;
use domain_items::{CreateItem, ItemError, ItemRepository, PgItemRepository};
use std::sync::Arc;
use test_utils::{TestDataBuilder, TestDatabase, assertions::*};
use uuid::Uuid;

fn day(n: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2030, 7, n, 10, 0, 0).unwrap()
}

async fn create_item(db: &TestDatabase, builder: &TestDataBuilder) -> Uuid {
    let items = PgItemRepository::new(db.connection());
    items
        .create(CreateItem {
            title: builder.name("item", "bookable"),
            description: "Integration test listing".to_string(),
            price: 100,
            location: "Graz".to_string(),
            author_id: builder.user_id(),
            category_id: None,
            tags: vec![],
            photos: vec![],
        })
        .await
        .unwrap()
        .id
}

fn booking(item_id: Uuid, builder: &TestDataBuilder, start: u32, end: u32) -> CreateBooking {
    CreateBooking {
        item_id,
        user_id: builder.user_id(),
        start_date: day(start),
        end_date: day(end),
        price: Some(55.0),
    }
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_overlap_rules() {
    let db = TestDatabase::new().await;
    let repo = PgBookingRepository::new(db.connection());
    let builder = TestDataBuilder::from_test_name("booking_overlap_rules");
    let item_id = create_item(&db, &builder).await;

    let first = repo.create(booking(item_id, &builder, 10, 15)).await.unwrap();

    let err = repo
        .create(booking(item_id, &builder, 12, 20))
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::Overlap { booking_id, .. } if booking_id == first.id));

    // Back to back
    repo.create(booking(item_id, &builder, 15, 18)).await.unwrap();

    // A cancelled booking frees its period
    repo.set_status(first.id, BookingStatus::Cancelled)
        .await
        .unwrap();
    repo.create(booking(item_id, &builder, 10, 15)).await.unwrap();
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_concurrent_bookings_of_one_period_accept_exactly_one() {
    let db = TestDatabase::new().await;
    let repo = Arc::new(PgBookingRepository::new(db.connection()));
    let builder = TestDataBuilder::from_test_name("booking_concurrent");
    let item_id = create_item(&db, &builder).await;

    let mut handles = Vec::new();
    for _ in 0..6 {
        let repo = repo.clone();
        let input = booking(item_id, &builder, 1, 5);
        handles.push(tokio::spawn(async move { repo.create(input).await }));
    }

    let mut accepted = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => accepted += 1,
            Err(err) => assert!(matches!(err, BookingError::Overlap { .. })),
        }
    }
    assert_eq!(accepted, 1);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_update_with_end_before_stored_start_is_rolled_back() {
    let db = TestDatabase::new().await;
    let repo = PgBookingRepository::new(db.connection());
    let builder = TestDataBuilder::from_test_name("booking_update_rollback");
    let item_id = create_item(&db, &builder).await;

    let created = repo.create(booking(item_id, &builder, 10, 15)).await.unwrap();

    let err = repo
        .update_dates(
            created.id,
            UpdateBooking {
                end_date: Some(day(9)),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::Validation(_)));

    let stored = assert_some(repo.get_by_id(created.id).await.unwrap(), "booking");
    assert_eq!(stored.end_date, day(15));
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_unknown_item_is_not_found() {
    let db = TestDatabase::new().await;
    let repo = PgBookingRepository::new(db.connection());
    let builder = TestDataBuilder::from_test_name("booking_unknown_item");

    let missing = Uuid::now_v7();
    let err = repo
        .create(booking(missing, &builder, 1, 2))
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::ItemNotFound(id) if id == missing));
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_booked_item_cannot_be_deleted() {
    let db = TestDatabase::new().await;
    let bookings = PgBookingRepository::new(db.connection());
    let items = PgItemRepository::new(db.connection());
    let builder = TestDataBuilder::from_test_name("booking_restrict_item");
    let item_id = create_item(&db, &builder).await;

    bookings
        .create(booking(item_id, &builder, 1, 2))
        .await
        .unwrap();

    let err = items.delete(item_id).await.unwrap_err();
    assert!(matches!(err, ItemError::InUse(id) if id == item_id));
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_filters_and_ordering() {
    let db = TestDatabase::new().await;
    let repo = PgBookingRepository::new(db.connection());
    let builder = TestDataBuilder::from_test_name("booking_filters");
    let item_id = create_item(&db, &builder).await;

    let early = repo.create(booking(item_id, &builder, 1, 3)).await.unwrap();
    let late = repo.create(booking(item_id, &builder, 20, 22)).await.unwrap();
    repo.set_status(late.id, BookingStatus::Confirmed)
        .await
        .unwrap();

    let confirmed = repo
        .list(BookingFilter {
            status: Some(BookingStatus::Confirmed),
            item_id: Some(item_id),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(confirmed.len(), 1);
    assert_uuid_eq(confirmed[0].id, late.id, "confirmed booking");

    let ids: Vec<Uuid> = repo
        .list_by_item(item_id)
        .await
        .unwrap()
        .into_iter()
        .map(|b| b.id)
        .collect();
    assert_eq!(ids, [early.id, late.id]);

    let available = repo.list_available(day(5)).await.unwrap();
    assert!(available.iter().all(|b| b.id != early.id));
    assert!(available.iter().any(|b| b.id == late.id));
}
