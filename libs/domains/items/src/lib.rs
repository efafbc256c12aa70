//! Items Domain
//!
//! Rental listings and their photos. Each item stores a derived `has_photos`
//! flag that must equal "at least one photo exists" after every committed
//! write, so every photo mutation recounts and rewrites the flag in the same
//! transaction.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← HTTP endpoints (/api/items)
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Service   │  ← Validation, re-read after writes
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │ Repository  │  ← Filter builder, photo-count rule, transactions
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Models    │  ← Item, ItemSummary, ItemDetails, DTOs
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_items::{handlers, InMemoryItemRepository, ItemService};
//!
//! let service = ItemService::new(InMemoryItemRepository::new());
//! let router: axum::Router = handlers::router(service);
//! ```

pub mod entity;
pub mod error;
pub mod handlers;
pub mod models;
pub mod postgres;
pub mod repository;
pub mod service;

pub use error::{ItemError, ItemResult};
pub use models::{
    AddPhotos, CreateItem, DeletePhotos, Item, ItemDetails, ItemFilter, ItemPhoto, ItemSummary,
    PhotoCount, UpdateItem,
};
pub use postgres::PgItemRepository;
pub use repository::{InMemoryItemRepository, ItemRepository};
pub use service::ItemService;
