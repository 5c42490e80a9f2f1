//! SQLite-backed repository implementations.
//!
//! ## Database setup
//!
//! [`Database`] wraps a `sqlx::SqlitePool` configured with:
//! - **WAL mode**: one writer and multiple concurrent readers.
//! - **Foreign keys enabled**, enforced at the connection level.
//! - **Embedded migrations**: `sqlx::migrate!` runs `migrations/0001_initial_schema.sql`
//!   when [`Database::open`] is called.
//!
//! ## Repository types
//!
//! Each `Sqlite*Repository` holds a clone of the pool and implements the
//! corresponding trait from [`crate::persistence::traits`]:
//!
//! | Type | Trait |
//! |------|-------|
//! | [`SqliteIngestRepository`] | `IngestRepository` |
//! | [`SqlitePositionRepository`] | `PositionRepository` |
//! | [`SqliteAnalyticsRepository`] | `AnalyticsRepository` |
//!
//! Scores, sides and evaluation status are stored as `TEXT`/`INTEGER`
//! columns and round-tripped through the helpers in [`helpers`].

mod analytics_repo;
mod database;
mod ingest_repo;
mod position_repo;
#[cfg(test)]
mod integration_tests;
pub(crate) mod helpers;

pub use analytics_repo::SqliteAnalyticsRepository;
pub use database::Database;
pub use ingest_repo::SqliteIngestRepository;
pub use position_repo::SqlitePositionRepository;
