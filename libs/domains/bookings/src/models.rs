use chrono::{DateTime, Utc};
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use strum::{Display, EnumString};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

/// Booking lifecycle
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    Default,
    DeriveActiveEnum,
    EnumIter,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "booking_status")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BookingStatus {
    /// Requested, not yet accepted
    #[default]
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "confirmed")]
    Confirmed,
    /// Terminal; no longer blocks the item's calendar
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl BookingStatus {
    /// Whether a booking in this status may be moved to `target`.
    /// Staying in the same status is always allowed.
    pub fn can_become(self, target: BookingStatus) -> bool {
        use BookingStatus::*;

        self == target
            || matches!(
                (self, target),
                (Pending, Confirmed) | (Pending | Confirmed, Cancelled)
            )
    }

    /// Only non-cancelled bookings occupy the item.
    pub fn is_active(self) -> bool {
        self != BookingStatus::Cancelled
    }
}

/// `end_date` must be strictly after `start_date`.
fn check_date_order(
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
) -> Result<(), ValidationError> {
    if end_date > start_date {
        return Ok(());
    }
    let mut err = ValidationError::new("end_date_after_start_date");
    err.message = Some(Cow::Borrowed("end_date must be after start_date"));
    err.add_param(Cow::Borrowed("start_date"), &start_date);
    Err(err)
}

/// The date rule as a standalone check, reported on `end_date`.
pub fn validate_date_range(
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    if let Err(err) = check_date_order(start_date, end_date) {
        errors.add("end_date", err);
    }
    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

/// A reservation of an item for `[start_date, end_date)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Booking {
    pub id: Uuid,
    pub item_id: Uuid,
    /// Renter; users live outside this service
    pub user_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub price: f64,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CreateBooking {
    pub item_id: Uuid,
    pub user_id: Uuid,
    pub start_date: DateTime<Utc>,
    /// Must be after `start_date`
    pub end_date: DateTime<Utc>,
    /// Defaults to 0
    #[serde(default)]
    pub price: Option<f64>,
}

/// Moves a booking. Absent dates keep their stored value; the merged pair
/// is checked again before anything is written.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UpdateBooking {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

impl Validate for CreateBooking {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.price.is_some_and(|price| price.is_nan() || price < 0.0) {
            let mut err = ValidationError::new("range");
            err.add_param(Cow::Borrowed("min"), &0.0);
            errors.add("price", err);
        }
        if let Err(err) = check_date_order(self.start_date, self.end_date) {
            errors.add("end_date", err);
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

impl Validate for UpdateBooking {
    /// Only a patch carrying both dates can be checked on its own.
    fn validate(&self) -> Result<(), ValidationErrors> {
        match (self.start_date, self.end_date) {
            (Some(start_date), Some(end_date)) => validate_date_range(start_date, end_date),
            _ => Ok(()),
        }
    }
}

/// Listing filters. Date and price bounds are inclusive.
#[derive(
    Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate, IntoParams, ToSchema,
)]
#[into_params(parameter_in = Query)]
pub struct BookingFilter {
    pub min_start_date: Option<DateTime<Utc>>,
    pub max_start_date: Option<DateTime<Utc>>,
    pub min_end_date: Option<DateTime<Utc>>,
    pub max_end_date: Option<DateTime<Utc>>,
    /// Bookings priced at least this much
    #[validate(range(min = 0.0))]
    pub min_price: Option<f64>,
    pub status: Option<BookingStatus>,
    pub item_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    /// Page size (default 20, max 100)
    pub limit: Option<i64>,
    /// Rows to skip (default 0)
    pub offset: Option<i64>,
}

impl Booking {
    pub fn new(input: &CreateBooking) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            item_id: input.item_id,
            user_id: input.user_id,
            start_date: input.start_date,
            end_date: input.end_date,
            price: input.price.unwrap_or_default(),
            status: BookingStatus::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Merges the patch; the caller re-checks the dates.
    pub fn apply_update(&mut self, update: &UpdateBooking) {
        if let Some(start_date) = update.start_date {
            self.start_date = start_date;
        }
        if let Some(end_date) = update.end_date {
            self.end_date = end_date;
        }
        self.updated_at = Utc::now();
    }

    pub fn validate_dates(&self) -> Result<(), ValidationErrors> {
        validate_date_range(self.start_date, self.end_date)
    }

    /// Whether this booking blocks `[start_date, end_date)` of its item.
    /// Ranges that only touch at an endpoint do not overlap.
    pub fn overlaps(&self, start_date: DateTime<Utc>, end_date: DateTime<Utc>) -> bool {
        self.status.is_active() && self.start_date < end_date && self.end_date > start_date
    }
}

impl BookingFilter {
    /// In-memory evaluation of the same predicates the SQL filter builds.
    pub fn matches(&self, booking: &Booking) -> bool {
        self.min_start_date
            .is_none_or(|min| booking.start_date >= min)
            && self.max_start_date.is_none_or(|max| booking.start_date <= max)
            && self.min_end_date.is_none_or(|min| booking.end_date >= min)
            && self.max_end_date.is_none_or(|max| booking.end_date <= max)
            && self.min_price.is_none_or(|min| booking.price >= min)
            && self.status.is_none_or(|status| booking.status == status)
            && self.item_id.is_none_or(|id| booking.item_id == id)
            && self.user_id.is_none_or(|id| booking.user_id == id)
    }
}
