//! PostgreSQL booking repository.
//!
//! Calendar writes run inside [`with_transaction`] and take the item row
//! with `SELECT … FOR UPDATE` before looking for overlaps, so concurrent
//! bookings of the same item are checked one at a time.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use database::{BaseRepository, Page, with_transaction};
use domain_items::entity::item;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DatabaseTransaction,
    EntityTrait, QueryFilter, QueryOrder, QuerySelect,
};
use uuid::Uuid;

use crate::{
    entity,
    error::{BookingError, BookingResult},
    models::{Booking, BookingFilter, BookingStatus, CreateBooking, UpdateBooking},
    repository::BookingRepository,
};

pub struct PgBookingRepository {
    base: BaseRepository<entity::Entity>,
}

impl PgBookingRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }
}

/// Conjunction of the filter's predicates; absent fields add nothing.
pub fn build_condition(filter: &BookingFilter) -> Condition {
    use entity::Column;

    let mut condition = Condition::all();

    if let Some(min) = filter.min_start_date {
        condition = condition.add(Column::StartDate.gte(min));
    }
    if let Some(max) = filter.max_start_date {
        condition = condition.add(Column::StartDate.lte(max));
    }
    if let Some(min) = filter.min_end_date {
        condition = condition.add(Column::EndDate.gte(min));
    }
    if let Some(max) = filter.max_end_date {
        condition = condition.add(Column::EndDate.lte(max));
    }
    if let Some(min_price) = filter.min_price {
        condition = condition.add(Column::Price.gte(min_price));
    }
    if let Some(status) = filter.status {
        condition = condition.add(Column::Status.eq(status));
    }
    if let Some(item_id) = filter.item_id {
        condition = condition.add(Column::ItemId.eq(item_id));
    }
    if let Some(user_id) = filter.user_id {
        condition = condition.add(Column::UserId.eq(user_id));
    }

    condition
}

/// Active bookings of `item_id` sharing any moment with `[start_date, end_date)`.
pub fn overlap_condition(
    item_id: Uuid,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
) -> Condition {
    use entity::Column;

    Condition::all()
        .add(Column::ItemId.eq(item_id))
        .add(Column::Status.ne(BookingStatus::Cancelled))
        .add(Column::StartDate.lt(end_date))
        .add(Column::EndDate.gt(start_date))
}

/// Bookings ending after `now`, whatever their status.
pub fn available_condition(now: DateTime<Utc>) -> Condition {
    Condition::all().add(entity::Column::EndDate.gt(now))
}

async fn lock_item(txn: &DatabaseTransaction, item_id: Uuid) -> BookingResult<()> {
    item::Entity::find_by_id(item_id)
        .lock_exclusive()
        .one(txn)
        .await?
        .ok_or(BookingError::ItemNotFound(item_id))?;
    Ok(())
}

async fn lock_booking(txn: &DatabaseTransaction, id: Uuid) -> BookingResult<Booking> {
    let model = entity::Entity::find_by_id(id)
        .lock_exclusive()
        .one(txn)
        .await?
        .ok_or(BookingError::NotFound(id))?;
    Ok(model.into())
}

/// Must run after [`lock_item`] for the same item.
async fn ensure_free(txn: &DatabaseTransaction, booking: &Booking) -> BookingResult<()> {
    let existing = entity::Entity::find()
        .filter(overlap_condition(
            booking.item_id,
            booking.start_date,
            booking.end_date,
        ))
        .filter(entity::Column::Id.ne(booking.id))
        .one(txn)
        .await?;

    match existing {
        Some(existing) => Err(BookingError::Overlap {
            item_id: booking.item_id,
            booking_id: existing.id,
        }),
        None => Ok(()),
    }
}

async fn create_in(txn: &DatabaseTransaction, input: CreateBooking) -> BookingResult<Booking> {
    let booking = Booking::new(&input);
    let item_id = booking.item_id;

    lock_item(txn, item_id).await?;
    ensure_free(txn, &booking).await?;

    let model = entity::ActiveModel::from(booking)
        .insert(txn)
        .await
        .map_err(|e| BookingError::from_write(e, item_id))?;
    Ok(model.into())
}

async fn update_dates_in(
    txn: &DatabaseTransaction,
    id: Uuid,
    input: UpdateBooking,
) -> BookingResult<Booking> {
    let mut booking = lock_booking(txn, id).await?;
    if !booking.status.is_active() {
        return Err(BookingError::Cancelled(id));
    }
    booking.apply_update(&input);
    booking.validate_dates()?;

    lock_item(txn, booking.item_id).await?;
    ensure_free(txn, &booking).await?;

    let model = entity::ActiveModel::from(booking).update(txn).await?;
    Ok(model.into())
}

async fn set_status_in(
    txn: &DatabaseTransaction,
    id: Uuid,
    status: BookingStatus,
) -> BookingResult<Booking> {
    let mut booking = lock_booking(txn, id).await?;
    if booking.status == status {
        return Ok(booking);
    }
    if !booking.status.can_become(status) {
        return Err(BookingError::InvalidState {
            from: booking.status,
            to: status,
        });
    }

    booking.status = status;
    booking.updated_at = Utc::now();
    let model = entity::ActiveModel::from(booking).update(txn).await?;
    Ok(model.into())
}

#[async_trait]
impl BookingRepository for PgBookingRepository {
    async fn create(&self, input: CreateBooking) -> BookingResult<Booking> {
        let booking = with_transaction(self.base.db(), move |txn| {
            Box::pin(async move { create_in(txn, input).await })
        })
        .await?;

        tracing::info!(booking_id = %booking.id, item_id = %booking.item_id, "Created booking");
        Ok(booking)
    }

    async fn get_by_id(&self, id: Uuid) -> BookingResult<Option<Booking>> {
        let model = self.base.find_by_id(id).await?;
        Ok(model.map(Into::into))
    }

    async fn list(&self, filter: BookingFilter) -> BookingResult<Vec<Booking>> {
        let query = entity::Entity::find()
            .filter(build_condition(&filter))
            .order_by_desc(entity::Column::CreatedAt)
            .order_by_desc(entity::Column::Id);

        let models = Page::new(filter.limit, filter.offset)
            .apply(query)
            .all(self.base.db())
            .await?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn list_by_item(&self, item_id: Uuid) -> BookingResult<Vec<Booking>> {
        self.list_by_start(Condition::all().add(entity::Column::ItemId.eq(item_id)))
            .await
    }

    async fn list_by_user(&self, user_id: Uuid) -> BookingResult<Vec<Booking>> {
        self.list_by_start(Condition::all().add(entity::Column::UserId.eq(user_id)))
            .await
    }

    async fn list_available(&self, now: DateTime<Utc>) -> BookingResult<Vec<Booking>> {
        self.list_by_start(available_condition(now)).await
    }

    async fn update_dates(&self, id: Uuid, input: UpdateBooking) -> BookingResult<Booking> {
        let booking = with_transaction(self.base.db(), move |txn| {
            Box::pin(async move { update_dates_in(txn, id, input).await })
        })
        .await?;

        tracing::info!(booking_id = %id, "Moved booking");
        Ok(booking)
    }

    async fn set_status(&self, id: Uuid, status: BookingStatus) -> BookingResult<Booking> {
        let booking = with_transaction(self.base.db(), move |txn| {
            Box::pin(async move { set_status_in(txn, id, status).await })
        })
        .await?;

        tracing::info!(booking_id = %id, status = %booking.status, "Changed booking status");
        Ok(booking)
    }

    async fn delete(&self, id: Uuid) -> BookingResult<bool> {
        let rows = self.base.delete_by_id(id).await?;
        if rows > 0 {
            tracing::info!(booking_id = %id, "Deleted booking");
        }
        Ok(rows > 0)
    }
}

impl PgBookingRepository {
    async fn list_by_start(&self, condition: Condition) -> BookingResult<Vec<Booking>> {
        let models = entity::Entity::find()
            .filter(condition)
            .order_by_asc(entity::Column::StartDate)
            .order_by_asc(entity::Column::Id)
            .all(self.base.db())
            .await?;

        Ok(models.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use sea_orm::{DatabaseBackend, MockDatabase, QueryTrait};

    fn day(n: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 6, n, 12, 0, 0).unwrap()
    }

    fn sql(condition: Condition) -> String {
        entity::Entity::find()
            .filter(condition)
            .build(DatabaseBackend::Postgres)
            .to_string()
    }

    fn item_model(id: Uuid) -> item::Model {
        let now = Utc::now();
        item::Model {
            id,
            title: "Canoe".to_string(),
            description: "Three seat canoe with paddles".to_string(),
            price: 5000,
            location: "Ljubljana".to_string(),
            has_photos: false,
            author_id: Uuid::now_v7(),
            category_id: None,
            tags: serde_json::json!([]),
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    fn booking_model(item_id: Uuid, start: u32, end: u32) -> entity::Model {
        let now = Utc::now();
        entity::Model {
            id: Uuid::now_v7(),
            item_id,
            user_id: Uuid::now_v7(),
            start_date: day(start).into(),
            end_date: day(end).into(),
            price: 20.0,
            status: BookingStatus::Pending,
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    fn create_input(item_id: Uuid, start: u32, end: u32) -> CreateBooking {
        CreateBooking {
            item_id,
            user_id: Uuid::now_v7(),
            start_date: day(start),
            end_date: day(end),
            price: None,
        }
    }

    #[test]
    fn test_empty_filter_adds_no_predicate() {
        let query = sql(build_condition(&BookingFilter::default()));
        let predicate = query.split_once(" WHERE ").map_or("", |(_, rest)| rest);
        assert!(matches!(predicate, "" | "TRUE"), "{query}");
    }

    #[test]
    fn test_available_condition_only_checks_end_date() {
        let query = sql(available_condition(day(5)));
        assert!(query.contains(r#""end_date" >"#), "{query}");
        assert!(!query.contains(r#""status""#), "{query}");
    }

    #[test]
    fn test_filter_bounds_are_inclusive() {
        let query = sql(build_condition(&BookingFilter {
            min_start_date: Some(day(1)),
            max_end_date: Some(day(9)),
            min_price: Some(10.0),
            ..Default::default()
        }));
        assert!(query.contains(r#""start_date" >="#));
        assert!(query.contains(r#""end_date" <="#));
        assert!(query.contains(r#""price" >="#));
    }

    #[test]
    fn test_overlap_condition_is_half_open_and_skips_cancelled() {
        let query = sql(overlap_condition(Uuid::now_v7(), day(1), day(3)));
        assert!(query.contains(r#""start_date" <"#));
        assert!(query.contains(r#""end_date" >"#));
        assert!(!query.contains(r#""start_date" <="#));
        assert!(query.contains("'cancelled'"));
    }

    #[tokio::test]
    async fn test_create_rejects_overlap_after_locking_item() {
        let item_id = Uuid::now_v7();
        let existing = booking_model(item_id, 10, 15);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            // SELECT item ... FOR UPDATE
            .append_query_results([vec![item_model(item_id)]])
            // overlap lookup
            .append_query_results([vec![existing.clone()]])
            .into_connection();
        let repo = PgBookingRepository::new(db);

        let err = repo
            .create(create_input(item_id, 12, 18))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BookingError::Overlap { booking_id, .. } if booking_id == existing.id
        ));
    }

    #[tokio::test]
    async fn test_create_for_missing_item() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<item::Model>::new()])
            .into_connection();
        let repo = PgBookingRepository::new(db);

        let err = repo
            .create(create_input(Uuid::now_v7(), 1, 2))
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::ItemNotFound(_)));
    }

    #[tokio::test]
    async fn test_update_rejects_merged_range_before_writing() {
        let stored = booking_model(Uuid::now_v7(), 10, 15);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![stored.clone()]])
            .into_connection();
        let repo = PgBookingRepository::new(db);

        let err = repo
            .update_dates(
                stored.id,
                UpdateBooking {
                    end_date: Some(day(9)),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();

        let BookingError::Validation(errors) = err else {
            panic!("expected a validation error");
        };
        assert!(errors.field_errors().contains_key("end_date"));
    }

    #[tokio::test]
    async fn test_confirming_a_confirmed_booking_does_not_write() {
        let mut stored = booking_model(Uuid::now_v7(), 10, 15);
        stored.status = BookingStatus::Confirmed;
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![stored.clone()]])
            .into_connection();
        let repo = PgBookingRepository::new(db);

        let booking = repo
            .set_status(stored.id, BookingStatus::Confirmed)
            .await
            .unwrap();
        assert_eq!(booking.status, BookingStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_cancelled_booking_cannot_be_confirmed() {
        let mut stored = booking_model(Uuid::now_v7(), 10, 15);
        stored.status = BookingStatus::Cancelled;
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![stored.clone()]])
            .into_connection();
        let repo = PgBookingRepository::new(db);

        let err = repo
            .set_status(stored.id, BookingStatus::Confirmed)
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::InvalidState { .. }));
    }
}
