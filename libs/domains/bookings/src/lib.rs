//! Bookings Domain
//!
//! Time-bounded reservations of an item by a user. A booking always ends
//! after it starts, and two non-cancelled bookings of the same item never
//! share a moment: the half-open ranges `[start_date, end_date)` may touch
//! but not overlap.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← HTTP endpoints (/api/bookings)
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Service   │  ← Validation, status commands
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │ Repository  │  ← Item lock, overlap check, merge + re-validate
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Models    │  ← Booking, BookingStatus, DTOs
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_bookings::{handlers, BookingService, InMemoryBookingRepository};
//!
//! let service = BookingService::new(InMemoryBookingRepository::new());
//! let router: axum::Router = handlers::router(service);
//! ```

pub mod entity;
pub mod error;
pub mod handlers;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod service;

pub use error::{BookingError, BookingResult};
pub use models::{
    Booking, BookingFilter, BookingStatus, CreateBooking, UpdateBooking, validate_date_range,
};
pub use postgres::PgBookingRepository;
pub use repository::{BookingRepository, InMemoryBookingRepository};
pub use service::BookingService;
