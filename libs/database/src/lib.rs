//! Database library: PostgreSQL connectivity plus the persistence building blocks
//! shared by the domain crates.
//!
//! # Features
//!
//! - `postgres` (default) - PostgreSQL support with SeaORM
//! - `config` (default) - `core_config::FromEnv` for [`postgres::PostgresConfig`]
//!
//! # Modules
//!
//! - [`postgres`]: connect (with retry), health checks, migrations
//! - [`repository`]: [`BaseRepository`], single-entity CRUD over any connection
//! - [`transaction`]: [`with_transaction`], the scoped transaction gateway
//! - [`query`]: pagination normalisation and case-insensitive text predicates
//!
//! # Example
//!
//! ```ignore
//! use database::{postgres, with_transaction};
//! use migration::Migrator;
//!
//! let db = postgres::connect_from_config_with_retry(config, None).await?;
//! postgres::run_migrations::<Migrator>(&db, "rental_api").await?;
//!
//! let count = with_transaction(&db, |txn| Box::pin(async move {
//!     do_writes(txn).await
//! }))
//! .await?;
//! ```

pub mod common;

#[cfg(feature = "postgres")]
pub mod postgres;

#[cfg(feature = "postgres")]
pub mod query;

#[cfg(feature = "postgres")]
pub mod repository;

#[cfg(feature = "postgres")]
pub mod transaction;

pub use common::{DatabaseError, DatabaseResult};

#[cfg(feature = "postgres")]
pub use query::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, Page, contains_ci, matches_ci};

#[cfg(feature = "postgres")]
pub use repository::BaseRepository;

#[cfg(feature = "postgres")]
pub use transaction::{TransactionError, TransactionFuture, with_transaction};
