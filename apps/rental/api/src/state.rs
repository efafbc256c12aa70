//! Shared application state.

/// Cloned into the readiness handler; the domain routers get their own
/// repositories built from the same pool.
#[derive(Clone)]
pub struct AppState {
    pub config: crate::config::Config,
    /// PostgreSQL connection pool
    pub db: database::postgres::DatabaseConnection,
}
