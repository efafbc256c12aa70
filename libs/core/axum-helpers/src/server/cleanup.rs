//! Connection cleanup run after the server stops accepting requests.

use tracing::{error, info};

/// Closes a SeaORM pool, logging the outcome.
///
/// ```ignore
/// create_production_app(router, &config.server, timeout, async move {
///     close_postgres(db, "rental").await;
/// })
/// .await?;
/// ```
pub async fn close_postgres(db: sea_orm::DatabaseConnection, name: &str) {
    match db.close().await {
        Ok(_) => info!(pool = name, "PostgreSQL connection pool closed"),
        Err(e) => error!(pool = name, error = %e, "Error closing PostgreSQL connection pool"),
    }
}
