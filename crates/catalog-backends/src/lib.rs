//! # Catalog Backends
//!
//! Storage collaborators for catalog search.
//!
//! - [`SearchBackend`]: the contract the executor depends on
//! - [`PostgresBackend`]: sqlx on a `PgPool` (feature `postgres`)
//! - [`MemoryBackend`]: interprets statements over in-process rows
//!
//! Backends report failures as [`BackendError`](catalog_core::BackendError);
//! none of them retries.

pub mod backend;
pub mod eval;
pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use backend::SearchBackend;
pub use memory::{CallStats, Failure, MemoryBackend};
#[cfg(feature = "postgres")]
pub use postgres::PostgresBackend;
