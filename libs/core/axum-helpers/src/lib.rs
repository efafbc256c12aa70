//! # Axum Helpers
//!
//! Shared HTTP plumbing for the rental services.
//!
//! ## Modules
//!
//! - **[`server`]**: router factory (OpenAPI UIs, CORS, timeout, tracing), health
//!   and readiness, graceful shutdown
//! - **[`http`]**: security headers middleware
//! - **[`errors`]**: [`AppError`] and the `{code, error, message, details}` body
//! - **[`extractors`]**: [`UuidPath`], [`ValidatedJson`], [`ValidatedQuery`]
//! - **[`audit`]**: audit events for data-changing requests
//!
//! ## Quick Start
//!
//! ```ignore
//! use axum_helpers::server::{create_production_app, create_router, health_router};
//!
//! let router = create_router::<ApiDoc>(api_routes, Duration::from_secs(60))
//!     .await?
//!     .merge(health_router(app_info!()));
//! create_production_app(router, &config.server, Duration::from_secs(30), async {}).await?;
//! ```

pub mod audit;
pub mod errors;
pub mod extractors;
pub mod http;
pub mod server;

pub use server::{
    HealthCheckFuture, HealthResponse, ShutdownCoordinator, close_postgres,
    create_production_app, create_router, health_router, run_health_checks, shutdown_signal,
};

pub use http::security_headers;

pub use errors::{AppError, ErrorCode, ErrorResponse, validation_details};

pub use extractors::{UuidPath, ValidatedJson, ValidatedQuery};

pub use audit::{AuditEvent, AuditOutcome, extract_ip_from_headers, extract_user_agent};
