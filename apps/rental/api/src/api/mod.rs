use axum::Router;

pub mod bookings;
pub mod categories;
pub mod health;
pub mod items;

/// API routes without the `/api` prefix, which `create_router` adds.
pub fn routes(state: &crate::state::AppState) -> Router {
    Router::new()
        .nest("/items", items::router(state))
        .nest("/categories", categories::router(state))
        .nest("/bookings", bookings::router(state))
}

/// `/ready`, with a real database ping.
pub fn ready_router(state: crate::state::AppState) -> Router {
    use axum::routing::get;

    Router::new()
        .route("/ready", get(health::ready_handler))
        .with_state(state)
}
