use async_trait::async_trait;
use chrono::{DateTime, Utc};
use database::Page;
use domain_items::{InMemoryItemRepository, ItemRepository};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{BookingError, BookingResult};
use crate::models::{Booking, BookingFilter, BookingStatus, CreateBooking, UpdateBooking};

/// Booking persistence.
///
/// Writes that place a booking on the calendar (create, date changes) check
/// for overlaps and write as one unit, so two bookings of the same item can
/// never both be accepted for the same period.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Fails with `ItemNotFound` or `Overlap`.
    async fn create(&self, input: CreateBooking) -> BookingResult<Booking>;

    async fn get_by_id(&self, id: Uuid) -> BookingResult<Option<Booking>>;

    /// Newest first.
    async fn list(&self, filter: BookingFilter) -> BookingResult<Vec<Booking>>;

    /// All bookings of an item by `start_date`.
    async fn list_by_item(&self, item_id: Uuid) -> BookingResult<Vec<Booking>>;

    /// All bookings of a user by `start_date`.
    async fn list_by_user(&self, user_id: Uuid) -> BookingResult<Vec<Booking>>;

    /// Bookings of any status that end after `now`, by `start_date`.
    async fn list_available(&self, now: DateTime<Utc>) -> BookingResult<Vec<Booking>>;

    /// Merges the new dates, re-checks the pair and the calendar, then writes.
    /// On any failure the stored booking is unchanged.
    async fn update_dates(&self, id: Uuid, input: UpdateBooking) -> BookingResult<Booking>;

    /// Moves the booking to `status` if the transition is allowed.
    async fn set_status(&self, id: Uuid, status: BookingStatus) -> BookingResult<Booking>;

    /// Returns `false` when nothing was deleted.
    async fn delete(&self, id: Uuid) -> BookingResult<bool>;
}

/// First active booking of `item_id` that overlaps the range, skipping `exclude`.
fn find_overlap<'a>(
    bookings: impl IntoIterator<Item = &'a Booking>,
    item_id: Uuid,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    exclude: Option<Uuid>,
) -> Option<&'a Booking> {
    bookings.into_iter().find(|b| {
        b.item_id == item_id && Some(b.id) != exclude && b.overlaps(start_date, end_date)
    })
}

fn sorted_by_start(mut bookings: Vec<Booking>) -> Vec<Booking> {
    bookings.sort_by(|a, b| a.start_date.cmp(&b.start_date).then(a.id.cmp(&b.id)));
    bookings
}

/// In-memory implementation for tests and local development.
///
/// The overlap check and the write happen under one write guard.
#[derive(Debug, Default, Clone)]
pub struct InMemoryBookingRepository {
    bookings: Arc<RwLock<HashMap<Uuid, Booking>>>,
    items: Option<InMemoryItemRepository>,
}

impl InMemoryBookingRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check `item_id` against an item store on create.
    pub fn with_items(mut self, items: InMemoryItemRepository) -> Self {
        self.items = Some(items);
        self
    }

    async fn ensure_item(&self, item_id: Uuid) -> BookingResult<()> {
        let Some(items) = &self.items else {
            return Ok(());
        };
        match items.get_by_id(item_id).await {
            Ok(Some(_)) => Ok(()),
            Ok(None) => Err(BookingError::ItemNotFound(item_id)),
            Err(e) => Err(BookingError::Database(e.to_string())),
        }
    }

    async fn collect(&self, keep: impl Fn(&Booking) -> bool) -> Vec<Booking> {
        let bookings = self.bookings.read().await;
        sorted_by_start(bookings.values().filter(|b| keep(b)).cloned().collect())
    }
}

#[async_trait]
impl BookingRepository for InMemoryBookingRepository {
    async fn create(&self, input: CreateBooking) -> BookingResult<Booking> {
        self.ensure_item(input.item_id).await?;

        let booking = Booking::new(&input);
        let mut bookings = self.bookings.write().await;

        if let Some(existing) = find_overlap(
            bookings.values(),
            booking.item_id,
            booking.start_date,
            booking.end_date,
            None,
        ) {
            return Err(BookingError::Overlap {
                item_id: booking.item_id,
                booking_id: existing.id,
            });
        }
        bookings.insert(booking.id, booking.clone());

        tracing::info!(booking_id = %booking.id, item_id = %booking.item_id, "Created booking");
        Ok(booking)
    }

    async fn get_by_id(&self, id: Uuid) -> BookingResult<Option<Booking>> {
        let bookings = self.bookings.read().await;
        Ok(bookings.get(&id).cloned())
    }

    async fn list(&self, filter: BookingFilter) -> BookingResult<Vec<Booking>> {
        let bookings = self.bookings.read().await;

        let mut matching: Vec<Booking> = bookings
            .values()
            .filter(|b| filter.matches(b))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        Ok(Page::new(filter.limit, filter.offset).slice(matching))
    }

    async fn list_by_item(&self, item_id: Uuid) -> BookingResult<Vec<Booking>> {
        Ok(self.collect(|b| b.item_id == item_id).await)
    }

    async fn list_by_user(&self, user_id: Uuid) -> BookingResult<Vec<Booking>> {
        Ok(self.collect(|b| b.user_id == user_id).await)
    }

    async fn list_available(&self, now: DateTime<Utc>) -> BookingResult<Vec<Booking>> {
        Ok(self.collect(|b| b.end_date > now).await)
    }

    async fn update_dates(&self, id: Uuid, input: UpdateBooking) -> BookingResult<Booking> {
        let mut bookings = self.bookings.write().await;

        let mut booking = bookings.get(&id).cloned().ok_or(BookingError::NotFound(id))?;
        if !booking.status.is_active() {
            return Err(BookingError::Cancelled(id));
        }
        booking.apply_update(&input);
        booking.validate_dates()?;

        if let Some(existing) = find_overlap(
            bookings.values(),
            booking.item_id,
            booking.start_date,
            booking.end_date,
            Some(id),
        ) {
            return Err(BookingError::Overlap {
                item_id: booking.item_id,
                booking_id: existing.id,
            });
        }
        bookings.insert(id, booking.clone());

        tracing::info!(booking_id = %id, "Moved booking");
        Ok(booking)
    }

    async fn set_status(&self, id: Uuid, status: BookingStatus) -> BookingResult<Booking> {
        let mut bookings = self.bookings.write().await;
        let booking = bookings.get_mut(&id).ok_or(BookingError::NotFound(id))?;

        if booking.status == status {
            return Ok(booking.clone());
        }
        if !booking.status.can_become(status) {
            return Err(BookingError::InvalidState {
                from: booking.status,
                to: status,
            });
        }
        booking.status = status;
        booking.updated_at = Utc::now();

        tracing::info!(booking_id = %id, status = %status, "Changed booking status");
        Ok(booking.clone())
    }

    async fn delete(&self, id: Uuid) -> BookingResult<bool> {
        let mut bookings = self.bookings.write().await;
        let removed = bookings.remove(&id).is_some();
        if removed {
            tracing::info!(booking_id = %id, "Deleted booking");
        }
        Ok(removed)
    }
}
