use chrono::Utc;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::error::{BookingError, BookingResult};
use crate::models::{Booking, BookingFilter, BookingStatus, CreateBooking, UpdateBooking};
use crate::repository::BookingRepository;

/// Booking use cases
pub struct BookingService<R: BookingRepository> {
    repository: Arc<R>,
}

impl<R: BookingRepository> Clone for BookingService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}

impl<R: BookingRepository> BookingService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    #[instrument(skip(self, input), fields(item_id = %input.item_id, user_id = %input.user_id))]
    pub async fn create_booking(&self, input: CreateBooking) -> BookingResult<Booking> {
        input.validate()?;
        self.repository.create(input).await
    }

    #[instrument(skip(self))]
    pub async fn get_booking(&self, id: Uuid) -> BookingResult<Booking> {
        self.repository
            .get_by_id(id)
            .await?
            .ok_or(BookingError::NotFound(id))
    }

    #[instrument(skip(self))]
    pub async fn list_bookings(&self, filter: BookingFilter) -> BookingResult<Vec<Booking>> {
        filter.validate()?;
        self.repository.list(filter).await
    }

    #[instrument(skip(self))]
    pub async fn list_by_item(&self, item_id: Uuid) -> BookingResult<Vec<Booking>> {
        self.repository.list_by_item(item_id).await
    }

    #[instrument(skip(self))]
    pub async fn list_by_user(&self, user_id: Uuid) -> BookingResult<Vec<Booking>> {
        self.repository.list_by_user(user_id).await
    }

    /// Bookings still ahead or in progress.
    #[instrument(skip(self))]
    pub async fn list_available(&self) -> BookingResult<Vec<Booking>> {
        self.repository.list_available(Utc::now()).await
    }

    /// A patch with both dates is checked up front; a one-sided patch is
    /// checked by the repository against the stored row.
    #[instrument(skip(self, input))]
    pub async fn update_booking(&self, id: Uuid, input: UpdateBooking) -> BookingResult<Booking> {
        input.validate()?;
        self.repository.update_dates(id, input).await
    }

    #[instrument(skip(self))]
    pub async fn delete_booking(&self, id: Uuid) -> BookingResult<()> {
        if self.repository.delete(id).await? {
            Ok(())
        } else {
            Err(BookingError::NotFound(id))
        }
    }

    #[instrument(skip(self))]
    pub async fn confirm_booking(&self, id: Uuid) -> BookingResult<Booking> {
        self.repository
            .set_status(id, BookingStatus::Confirmed)
            .await
    }

    #[instrument(skip(self))]
    pub async fn cancel_booking(&self, id: Uuid) -> BookingResult<Booking> {
        self.repository
            .set_status(id, BookingStatus::Cancelled)
            .await
    }
}
