//! # Catalog Pagination
//!
//! Runs catalog searches and assembles [`Page`](catalog_core::Page)s.
//!
//! [`PagedQueryExecutor`] validates a request, composes its statements
//! through the query layer and runs the count and data statements on a
//! [`SearchBackend`](catalog_backends::SearchBackend). Validation failures
//! never reach storage.
//!
//! ## Execution options
//!
//! - [`Consistency`](catalog_core::Consistency): independent reads (default)
//!   or one read-only snapshot for both statements
//! - [`Strategy`](catalog_core::Strategy): independent reads one after the
//!   other (default) or concurrently
//! - an optional timeout covering the whole storage phase

pub mod executor;
pub mod prepared;

pub use executor::PagedQueryExecutor;
pub use prepared::PreparedSearch;
