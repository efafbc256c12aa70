use axum::Router;
use domain_bookings::{BookingService, PgBookingRepository, handlers};

pub fn router(state: &crate::state::AppState) -> Router {
    let repository = PgBookingRepository::new(state.db.clone());
    let service = BookingService::new(repository);
    handlers::router(service)
}
