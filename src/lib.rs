//! # Catalog Search
//!
//! Query composition and ranking engine for a shared catalog of courses,
//! events and products.
//!
//! A search request carries an optional phrase, named filters, a locale and
//! a page window. The engine turns it into a count statement and a data
//! statement sharing one predicate, runs both on a storage backend and
//! returns a relevance-ordered [`Page`](core::Page).
//!
//! ## Guarantees
//!
//! - **Injection safety**: identifiers are validated at startup; filter
//!   values and the sanitized phrase are only ever bound to `$n`
//!   placeholders, numbered in textual order at render time
//! - **Locale fallback**: localizable fields resolve to the secondary-locale
//!   column when it is non-null and non-empty, otherwise to the base column.
//!   The locale only selects among precompiled expressions
//! - **Consistent totals**: `total` is counted over the exact predicate of
//!   the page
//! - **Deterministic order**: relevance descending, then the entity's
//!   secondary key, then its primary key; without a phrase every record
//!   scores the configured default relevance
//!
//! ## Crates
//!
//! - [`core`]: data model, entity descriptors, requests, pages, errors
//! - [`query`]: field resolution, predicates, ranking, statements
//! - [`backends`]: storage contract, PostgreSQL and in-memory backends
//! - [`conf`]: layered settings
//! - [`pagination`]: the [`PagedQueryExecutor`](pagination::PagedQueryExecutor)
//!
//! ## Feature Flags
//!
//! - `postgres` (default): [`PostgresBackend`](backends::PostgresBackend) on sqlx
//!
//! ## Quick Example
//!
//! ```rust,no_run
//! use catalog_search::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = SearchSettings::load("catalog.toml")?;
//! let backend = PostgresBackend::connect("postgres://localhost/catalog").await?;
//! let executor = PagedQueryExecutor::from_settings(Arc::new(backend), &settings)
//!     .with_entities(builtin::all()?);
//!
//! let request = SearchRequest::new("en")
//!     .phrase("meditation")
//!     .filter("minPrice", 50)
//!     .filter("maxPrice", 200)
//!     .filter("level", "beginner")
//!     .limit(20);
//! let page = executor.search("courses", &request).await?;
//! println!("{} of {} results", page.len(), page.total);
//! # Ok(())
//! # }
//! ```

pub use catalog_backends as backends;
pub use catalog_conf as conf;
pub use catalog_core as core;
pub use catalog_pagination as pagination;
pub use catalog_query as query;

pub mod prelude {
	pub use catalog_backends::{MemoryBackend, SearchBackend};
	#[cfg(feature = "postgres")]
	pub use catalog_backends::PostgresBackend;
	pub use catalog_conf::{SearchSettings, SettingsError};
	pub use catalog_core::{
		Consistency, EntityDescriptor, FieldSpec, FilterSpec, FilterValue, Locale, LocaleTags,
		Page, QueryValue, Row, ScoredRecord, SearchError, SearchRequest, SearchResult, Strategy,
		TextSearchConfig, builtin,
	};
	pub use catalog_pagination::{PagedQueryExecutor, PreparedSearch};
	pub use catalog_query::{RankingComposer, RankingConfig};
}
